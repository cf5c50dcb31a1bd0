//! Configuration validation.
//!
//! Semantic checks only; serde handles syntax. All problems are reported
//! at once rather than stopping at the first.

use thiserror::Error;
use url::Url;

use crate::config::schema::RelayConfig;

/// A single semantic problem in a loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("upstream.origin is required")]
    MissingOrigin,

    #[error("upstream.origin {0:?} is not an absolute http(s) URL")]
    InvalidOrigin(String),

    #[error("upstream.origin {0:?} must not carry a path, query or fragment")]
    OriginHasPath(String),

    #[error("upstream.path_prefix {0:?} must start with '/'")]
    InvalidPrefix(String),

    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("upstream.max_response_bytes must be greater than zero")]
    ZeroResponseLimit,
}

/// Validate a configuration, returning every problem found.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let origin = config.upstream.origin.trim_end_matches('/');
    if origin.is_empty() {
        errors.push(ValidationError::MissingOrigin);
    } else {
        match Url::parse(origin) {
            Ok(url) if matches!(url.scheme(), "http" | "https") && url.host_str().is_some() => {
                if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
                    errors.push(ValidationError::OriginHasPath(origin.to_string()));
                }
            }
            _ => errors.push(ValidationError::InvalidOrigin(origin.to_string())),
        }
    }

    if !config.upstream.path_prefix.starts_with('/') {
        errors.push(ValidationError::InvalidPrefix(config.upstream.path_prefix.clone()));
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("connect_secs"));
    }
    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("upstream_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("request_secs"));
    }

    if config.upstream.max_response_bytes == 0 {
        errors.push(ValidationError::ZeroResponseLimit);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
