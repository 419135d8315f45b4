//! Domain layer containing the link entity, the request context and the
//! storage contract.
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Data access trait definitions
//! - [`context`] - Caller identity, deadline and cancellation
//!
//! The domain layer has no dependencies on infrastructure or presentation
//! layers. Repository traits are implemented in `crate::infrastructure`.

pub mod context;
pub mod entities;
pub mod repositories;
