//! Handler for storage liveness check.

use axum::{extract::State, http::StatusCode};

use crate::error::AppError;
use crate::state::AppState;

/// Reports whether the link store answers.
///
/// # Endpoint
///
/// `GET /ping`
///
/// # Response Codes
///
/// - **200 OK**: store reachable
/// - **500 Internal Server Error**: store unreachable or timed out
pub async fn ping_handler(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.link_service.ping(&state.context("")).await?;
    Ok(StatusCode::OK)
}
