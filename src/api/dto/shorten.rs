//! DTOs for link shortening endpoints.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to shorten a single URL.
#[derive(Debug, Deserialize, Validate)]
pub struct ShortenRequest {
    #[validate(length(min = 1, message = "URL must not be empty"))]
    pub url: String,
}

/// Short URL produced for a [`ShortenRequest`], also returned on conflict.
#[derive(Debug, Serialize, Deserialize)]
pub struct ShortenResponse {
    pub result: String,
}

/// One item of a batch shortening request.
#[derive(Debug, Deserialize)]
pub struct BatchShortenItem {
    /// Caller-chosen id echoed in the response.
    pub correlation_id: String,
    pub original_url: String,
}

/// One item of a batch shortening response.
#[derive(Debug, Serialize, Deserialize)]
pub struct BatchShortenResult {
    pub correlation_id: String,
    pub short_url: String,
}
