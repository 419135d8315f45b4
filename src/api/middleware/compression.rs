//! Gzip response compression and request decompression.

use axum::http::{Extensions, HeaderMap, StatusCode, Version, header};
use tower_http::CompressionLevel;
use tower_http::compression::predicate::{And, DefaultPredicate, Predicate};
use tower_http::compression::CompressionLayer;
use tower_http::decompression::RequestDecompressionLayer;

type ContentTypePredicate = fn(StatusCode, Version, &HeaderMap, &Extensions) -> bool;

/// Only JSON and HTML bodies are compressed.
fn is_json_or_html(_: StatusCode, _: Version, headers: &HeaderMap, _: &Extensions) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json") || ct.starts_with("text/html"))
}

/// Gzips JSON and HTML responses for clients sending `Accept-Encoding: gzip`.
///
/// Bodies under 32 bytes are sent as is.
pub fn layer() -> CompressionLayer<And<DefaultPredicate, ContentTypePredicate>> {
    CompressionLayer::new()
        .quality(CompressionLevel::Fastest)
        .compress_when(DefaultPredicate::new().and(is_json_or_html as ContentTypePredicate))
}

/// Inflates request bodies sent with `Content-Encoding: gzip`.
pub fn decompression_layer() -> RequestDecompressionLayer {
    RequestDecompressionLayer::new()
}
