use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};

use crate::application::services::ShortenerError;
use crate::domain::repositories::StoreError;

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

/// Machine-readable error payload.
#[derive(Debug, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Validation { message: String, details: Value },
    #[error("{message}")]
    NotFound { message: String, details: Value },
    #[error("{message}")]
    Conflict { message: String, details: Value },
    #[error("{message}")]
    Unauthorized { message: String, details: Value },
    #[error("{message}")]
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }
    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }
    pub fn conflict(message: impl Into<String>, details: Value) -> Self {
        Self::Conflict {
            message: message.into(),
            details,
        }
    }
    pub fn unauthorized(message: impl Into<String>, details: Value) -> Self {
        Self::Unauthorized {
            message: message.into(),
            details,
        }
    }
    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn to_error_info(&self) -> ErrorInfo {
        let (code, message, details) = match self {
            AppError::Validation { message, details } => ("validation_error", message, details),
            AppError::NotFound { message, details } => ("not_found", message, details),
            AppError::Conflict { message, details } => ("conflict", message, details),
            AppError::Unauthorized { message, details } => ("unauthorized", message, details),
            AppError::Internal { message, details } => ("internal_error", message, details),
        };

        ErrorInfo {
            code,
            message: message.clone(),
            details: details.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_error_info(),
        };

        (self.status(), Json(body)).into_response()
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::bad_request("Validation failed", json!(errors))
    }
}

impl From<ShortenerError> for AppError {
    fn from(e: ShortenerError) -> Self {
        match e {
            ShortenerError::InvalidUrl(url) => {
                AppError::bad_request("Invalid URL format", json!({ "url": url }))
            }
            ShortenerError::IdIsRequired => {
                AppError::bad_request("Short code is required", json!({}))
            }
            ShortenerError::NoLinksInBatch => AppError::bad_request("Batch is empty", json!({})),
            ShortenerError::NoValidLinksInBatch => {
                AppError::bad_request("Batch contains no valid URLs", json!({}))
            }
            ShortenerError::Store(StoreError::KeyNotFound) => {
                AppError::not_found("Short link not found", json!({}))
            }
            ShortenerError::Store(StoreError::OriginalUrlAlreadyExists(existing)) => {
                AppError::conflict(
                    "URL has already been shortened",
                    json!({ "original_url": existing.original_url }),
                )
            }
            other => {
                tracing::error!(error = %other, "request failed");
                AppError::internal("Internal server error", json!({}))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Link;

    #[test]
    fn test_shortener_errors_map_to_status() {
        let cases = [
            (
                ShortenerError::InvalidUrl("x".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (ShortenerError::IdIsRequired, StatusCode::BAD_REQUEST),
            (ShortenerError::NoLinksInBatch, StatusCode::BAD_REQUEST),
            (ShortenerError::NoValidLinksInBatch, StatusCode::BAD_REQUEST),
            (
                ShortenerError::Store(StoreError::KeyNotFound),
                StatusCode::NOT_FOUND,
            ),
            (
                ShortenerError::Store(StoreError::OriginalUrlAlreadyExists(Box::new(
                    Link::new("abc", "https://a.com", ""),
                ))),
                StatusCode::CONFLICT,
            ),
            (
                ShortenerError::CreateShortLink(StoreError::Cancelled),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ShortenerError::Store(StoreError::DeadlineExceeded),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(AppError::from(error).status(), expected);
        }
    }

    #[test]
    fn test_error_info_codes() {
        let info = AppError::unauthorized("nope", json!({})).to_error_info();
        assert_eq!(info.code, "unauthorized");
        assert_eq!(info.message, "nope");

        let info = AppError::not_found("gone", json!({ "code": "abc" })).to_error_info();
        assert_eq!(info.code, "not_found");
        assert_eq!(info.details["code"], "abc");
    }
}
