//! URL shape validation.
//!
//! A URL is accepted when it parses as an absolute URL with a non-empty
//! scheme and host, e.g. `https://example.com/path`. Relative references,
//! host-less schemes (`mailto:`, `data:`) and blank input are rejected.

use url::Url;

/// Errors that can occur during URL validation.
#[derive(Debug, thiserror::Error)]
pub enum UrlValidationError {
    #[error("URL must not be blank")]
    Blank,

    #[error("Invalid URL format: {0}")]
    InvalidFormat(#[from] url::ParseError),

    #[error("URL must contain a host")]
    MissingHost,
}

/// Parses `input` as an absolute URL with a host.
///
/// The input is not trimmed; callers decide whether surrounding whitespace
/// is acceptable.
///
/// # Errors
///
/// Returns [`UrlValidationError`] describing why the input was rejected.
pub fn parse_absolute_url(input: &str) -> Result<Url, UrlValidationError> {
    if input.trim().is_empty() {
        return Err(UrlValidationError::Blank);
    }

    let url = Url::parse(input)?;

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(UrlValidationError::MissingHost),
    }
}

/// Returns true if `input` is an absolute URL with a scheme and a host.
pub fn is_valid_url(input: &str) -> bool {
    parse_absolute_url(input).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_absolute_urls() {
        assert!(is_valid_url("https://example.com"));
        assert!(is_valid_url("http://localhost:8080/path?q=1#frag"));
        assert!(is_valid_url("ftp://files.example.com/a.txt"));
        assert!(is_valid_url("https://пример.рф/путь"));
    }

    #[test]
    fn test_rejects_blank() {
        assert!(matches!(
            parse_absolute_url(""),
            Err(UrlValidationError::Blank)
        ));
        assert!(matches!(
            parse_absolute_url("   "),
            Err(UrlValidationError::Blank)
        ));
    }

    #[test]
    fn test_rejects_relative_references() {
        assert!(matches!(
            parse_absolute_url("example.com/path"),
            Err(UrlValidationError::InvalidFormat(_))
        ));
        assert!(!is_valid_url("/only/a/path"));
        assert!(!is_valid_url("not-a-url"));
    }

    #[test]
    fn test_rejects_hostless_schemes() {
        assert!(matches!(
            parse_absolute_url("mailto:user@example.com"),
            Err(UrlValidationError::MissingHost)
        ));
        assert!(!is_valid_url("data:text/plain,hello"));
    }
}
