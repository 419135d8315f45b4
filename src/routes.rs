//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `POST /`        - Shorten a plain text URL
//! - `GET  /ping`    - Store liveness
//! - `GET  /{code}`  - Short link redirect
//! - `/api/*`        - JSON API
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Identity** - Signed `USER_ID` cookie, issued on first visit
//! - **Compression** - Gzip JSON/HTML responses, inflate gzip request bodies

use crate::api;
use crate::api::handlers::{ping_handler, redirect_handler, shorten_text_handler};
use crate::api::middleware::{auth, compression, tracing};
use crate::state::AppState;
use axum::routing::{get, post};
use axum::{Router, middleware};

/// Constructs the application router with all routes and middleware.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/", post(shorten_text_handler))
        .route("/ping", get(ping_handler))
        .route("/{code}", get(redirect_handler))
        .nest("/api", api::routes::api_routes())
        .layer(middleware::from_fn_with_state(state.clone(), auth::layer))
        .with_state(state)
        .layer(compression::decompression_layer())
        .layer(compression::layer())
        .layer(tracing::layer())
}
