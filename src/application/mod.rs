//! Application layer services implementing business logic.
//!
//! Services consume the repository trait and provide a small API for HTTP
//! handlers and the admin CLI.
//!
//! # Available Services
//!
//! - [`services::link_service::LinkService`] - Short link creation, lookup and removal
//! - [`services::auth_service::AuthService`] - Signed user identity cookies

pub mod services;
