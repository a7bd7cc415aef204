//! Input validation
//!
//! Pure checks run before any session resource is acquired. Nothing here
//! has side effects; the same inputs always produce the same verdict.

use thiserror::Error;
use url::Url;

use crate::proxy::{ProxyConfig, ProxyFormatError};

/// Maximum number of concurrent browser instances
pub const MAX_INSTANCES: u32 = 10;

/// Rejected launch parameters
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("invalid URL format, must include http:// or https://")]
    InvalidUrl,

    #[error(transparent)]
    Proxy(#[from] ProxyFormatError),

    #[error("instance count must be between 1 and {MAX_INSTANCES}")]
    InstanceCount,

    #[error("time values cannot be negative")]
    NegativeTime,

    #[error("minimum time cannot be greater than maximum time")]
    TimeRange,
}

/// Validate the full set of launch parameters.
///
/// The proxy string may be empty (direct connection); when non-empty it
/// must parse as a [`ProxyConfig`].
pub fn validate_inputs(
    url: &str,
    proxy: &str,
    instance_count: u32,
    min_time: f64,
    max_time: f64,
) -> Result<(), ValidationError> {
    let parsed = Url::parse(url).map_err(|_| ValidationError::InvalidUrl)?;
    if parsed.host_str().is_none() {
        return Err(ValidationError::InvalidUrl);
    }

    if !proxy.is_empty() {
        ProxyConfig::parse(proxy)?;
    }

    if !(1..=MAX_INSTANCES).contains(&instance_count) {
        return Err(ValidationError::InstanceCount);
    }

    if !min_time.is_finite() || !max_time.is_finite() || min_time < 0.0 || max_time < 0.0 {
        return Err(ValidationError::NegativeTime);
    }
    if min_time > max_time {
        return Err(ValidationError::TimeRange);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_inputs() {
        assert_eq!(
            validate_inputs("https://example.com", "", 1, 5.0, 15.0),
            Ok(())
        );
        assert_eq!(
            validate_inputs("http://example.com/path", "1.2.3.4:8080", 10, 0.0, 0.0),
            Ok(())
        );
        assert_eq!(
            validate_inputs("https://example.com", "1.2.3.4:8080:bob:secret", 3, 2.5, 2.5),
            Ok(())
        );
    }

    #[test]
    fn rejects_bad_urls() {
        for url in ["example.com", "/just/a/path", "not a url", ""] {
            assert_eq!(
                validate_inputs(url, "", 1, 5.0, 15.0),
                Err(ValidationError::InvalidUrl),
                "url {:?}",
                url
            );
        }
    }

    #[test]
    fn rejects_url_without_host() {
        assert_eq!(
            validate_inputs("file:///etc/hosts", "", 1, 5.0, 15.0),
            Err(ValidationError::InvalidUrl)
        );
    }

    #[test]
    fn rejects_malformed_proxy() {
        let err = validate_inputs("https://example.com", "1.2.3.4", 1, 5.0, 15.0).unwrap_err();
        assert!(matches!(err, ValidationError::Proxy(_)));
    }

    #[test]
    fn rejects_instance_count_out_of_range() {
        for count in [0, 11, 100] {
            assert_eq!(
                validate_inputs("https://example.com", "", count, 5.0, 15.0),
                Err(ValidationError::InstanceCount)
            );
        }
    }

    #[test]
    fn rejects_bad_time_ranges() {
        assert_eq!(
            validate_inputs("https://example.com", "", 1, -1.0, 15.0),
            Err(ValidationError::NegativeTime)
        );
        assert_eq!(
            validate_inputs("https://example.com", "", 1, 5.0, -0.1),
            Err(ValidationError::NegativeTime)
        );
        assert_eq!(
            validate_inputs("https://example.com", "", 1, 20.0, 15.0),
            Err(ValidationError::TimeRange)
        );
        assert_eq!(
            validate_inputs("https://example.com", "", 1, f64::NAN, 15.0),
            Err(ValidationError::NegativeTime)
        );
    }
}
