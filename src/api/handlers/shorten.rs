//! Handlers for link shortening endpoints.

use axum::{Json, extract::State, http::StatusCode};
use validator::Validate;

use crate::api::dto::shorten::{
    BatchShortenItem, BatchShortenResult, ShortenRequest, ShortenResponse,
};
use crate::api::middleware::auth::UserId;
use crate::application::services::ShortenOutcome;
use crate::domain::entities::Link;
use crate::error::AppError;
use crate::state::AppState;

fn outcome_status(outcome: &ShortenOutcome) -> StatusCode {
    if outcome.is_conflict() {
        StatusCode::CONFLICT
    } else {
        StatusCode::CREATED
    }
}

/// Shortens a URL sent as a plain text body.
///
/// # Endpoint
///
/// `POST /`
///
/// # Response Codes
///
/// - **201 Created**: body is the new short URL
/// - **409 Conflict**: URL was already shortened; body is the existing short URL
/// - **400 Bad Request**: body is not an absolute URL
pub async fn shorten_text_handler(
    State(state): State<AppState>,
    user: UserId,
    body: String,
) -> Result<(StatusCode, String), AppError> {
    let outcome = state
        .link_service
        .generate_short_link(&state.context(user.as_str()), &body)
        .await?;

    Ok((outcome_status(&outcome), outcome.short_url().to_string()))
}

/// Shortens a single URL.
///
/// # Endpoint
///
/// `POST /api/shorten`
///
/// # Request Body
///
/// ```json
/// { "url": "https://example.com" }
/// ```
///
/// # Response
///
/// `201 Created`, or `409 Conflict` when the URL was already shortened:
///
/// ```json
/// { "result": "http://localhost:8080/aB3xY9Qz" }
/// ```
pub async fn shorten_handler(
    State(state): State<AppState>,
    user: UserId,
    Json(payload): Json<ShortenRequest>,
) -> Result<(StatusCode, Json<ShortenResponse>), AppError> {
    payload.validate()?;

    let outcome = state
        .link_service
        .generate_short_link(&state.context(user.as_str()), &payload.url)
        .await?;

    Ok((
        outcome_status(&outcome),
        Json(ShortenResponse {
            result: outcome.short_url().to_string(),
        }),
    ))
}

/// Shortens many URLs in one atomic write.
///
/// # Endpoint
///
/// `POST /api/shorten/batch`
///
/// # Request Body
///
/// ```json
/// [
///   { "correlation_id": "1", "original_url": "https://example.com/a" },
///   { "correlation_id": "2", "original_url": "https://example.com/b" }
/// ]
/// ```
///
/// # Response
///
/// `201 Created` with one item per accepted URL. Items with invalid URLs are
/// left out.
///
/// ```json
/// [
///   { "correlation_id": "1", "short_url": "http://localhost:8080/aB3xY9Qz" },
///   { "correlation_id": "2", "short_url": "http://localhost:8080/Qm7pL2cV" }
/// ]
/// ```
///
/// # Errors
///
/// - 400 Bad Request if the batch is empty or every URL is invalid
/// - 409 Conflict if a URL was already shortened; nothing is stored
pub async fn shorten_batch_handler(
    State(state): State<AppState>,
    user: UserId,
    Json(items): Json<Vec<BatchShortenItem>>,
) -> Result<(StatusCode, Json<Vec<BatchShortenResult>>), AppError> {
    let links = items
        .into_iter()
        .map(|item| Link {
            id: item.correlation_id,
            original_url: item.original_url,
            ..Link::default()
        })
        .collect();

    let created = state
        .link_service
        .generate_batch_short_link(&state.context(user.as_str()), links)
        .await?;

    let results = created
        .into_iter()
        .map(|link| BatchShortenResult {
            correlation_id: link.id,
            short_url: link.short_url,
        })
        .collect();

    Ok((StatusCode::CREATED, Json(results)))
}
