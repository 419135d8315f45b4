//! Handler for short URL redirect.

use axum::{
    extract::{Path, State},
    response::Redirect,
};

use crate::api::middleware::auth::UserId;
use crate::error::AppError;
use crate::state::AppState;

/// Redirects a short code to its original URL.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// # Errors
///
/// Returns 404 Not Found if the code is unknown or its link was deleted.
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
    user: UserId,
) -> Result<Redirect, AppError> {
    let link = state
        .link_service
        .get_full_link_by_short_code(&state.context(user.as_str()), &code)
        .await?;

    Ok(Redirect::temporary(&link.original_url))
}
