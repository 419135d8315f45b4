//! Handlers for the caller's own links.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::api::dto::user_urls::UserUrl;
use crate::api::middleware::auth::UserId;
use crate::error::AppError;
use crate::state::AppState;

fn require_user(user: &UserId) -> Result<&str, AppError> {
    if user.is_anonymous() {
        return Err(AppError::unauthorized(
            "Unauthorized",
            json!({ "reason": "User identity is missing" }),
        ));
    }
    Ok(user.as_str())
}

/// Lists links created by the caller.
///
/// # Endpoint
///
/// `GET /api/user/urls`
///
/// # Response Codes
///
/// - **200 OK**: `[{"short_url": "...", "original_url": "..."}]`
/// - **204 No Content**: the caller has no live links
/// - **401 Unauthorized**: no caller identity
pub async fn user_urls_handler(
    State(state): State<AppState>,
    user: UserId,
) -> Result<Response, AppError> {
    let user_id = require_user(&user)?;

    let links = state
        .link_service
        .get_user_links(&state.context(user_id), user_id)
        .await?;

    if links.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let urls: Vec<UserUrl> = links.into_iter().map(UserUrl::from).collect();
    Ok(Json(urls).into_response())
}

/// Deletes links created by the caller.
///
/// # Endpoint
///
/// `DELETE /api/user/urls`
///
/// # Request Body
///
/// ```json
/// ["aB3xY9Qz", "Qm7pL2cV"]
/// ```
///
/// Codes the caller does not own, or that are already deleted, are ignored.
/// Responds `202 Accepted`.
pub async fn delete_user_urls_handler(
    State(state): State<AppState>,
    user: UserId,
    Json(codes): Json<Vec<String>>,
) -> Result<StatusCode, AppError> {
    let user_id = require_user(&user)?;

    state
        .link_service
        .delete_user_links(&state.context(user_id), &codes, user_id)
        .await?;

    Ok(StatusCode::ACCEPTED)
}
