//! Crate-wide error hierarchy for pr-tracker.

use thiserror::Error;

/// Convenient alias for crate-wide results.
pub type TrackerResult<T> = Result<T, TrackerError>;

/// Root error type for the pr-tracker crate.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Tracker (GitHub) related failure.
    #[error(transparent)]
    Provider(#[from] TrackerProviderError),

    /// Configuration problems (bad/missing tokens, base URL, etc.).
    #[error(transparent)]
    Config(#[from] TrackerConfigError),

    /// Input validation errors (bad repository ids, etc.).
    #[error("validation error: {0}")]
    Validation(String),
}

impl TrackerError {
    /// HTTP status carried by the error, when the tracker answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            TrackerError::Provider(p) => p.status(),
            _ => None,
        }
    }
}

/// Provider-specific error used inside the provider layer.
#[derive(Debug, Error)]
pub enum TrackerProviderError {
    /// Unauthorized (HTTP 401).
    #[error("unauthorized")]
    Unauthorized,

    /// Forbidden (HTTP 403).
    #[error("forbidden")]
    Forbidden,

    /// Not found (HTTP 404).
    #[error("not found")]
    NotFound,

    /// Rate limited (HTTP 429).
    #[error("rate limited")]
    RateLimited {
        /// Optional `Retry-After` hint in seconds when available.
        retry_after_secs: Option<u64>,
    },

    /// Gateway / server error (HTTP 5xx).
    #[error("server error: status {0}")]
    Server(u16),

    /// Other non-2xx HTTP status not covered by specific variants.
    #[error("http status error: status {0}")]
    HttpStatus(u16),

    /// Timeout at transport level.
    #[error("timeout")]
    Timeout,

    /// Network/transport failure without HTTP status (DNS/connect/reset).
    #[error("network error: {0}")]
    Network(String),

    /// Unexpected/invalid shape of provider response.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

impl TrackerProviderError {
    /// Maps a non-2xx status code into the matching variant.
    pub fn from_status(code: u16, retry_after_secs: Option<u64>) -> Self {
        match code {
            401 => TrackerProviderError::Unauthorized,
            403 => TrackerProviderError::Forbidden,
            404 => TrackerProviderError::NotFound,
            429 => TrackerProviderError::RateLimited { retry_after_secs },
            500..=599 => TrackerProviderError::Server(code),
            _ => TrackerProviderError::HttpStatus(code),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            TrackerProviderError::Unauthorized => Some(401),
            TrackerProviderError::Forbidden => Some(403),
            TrackerProviderError::NotFound => Some(404),
            TrackerProviderError::RateLimited { .. } => Some(429),
            TrackerProviderError::Server(c) | TrackerProviderError::HttpStatus(c) => Some(*c),
            _ => None,
        }
    }
}

/// Configuration and setup errors.
#[derive(Debug, Error)]
pub enum TrackerConfigError {
    /// Missing required access token.
    #[error("missing tracker token")]
    MissingToken,

    /// Invalid base API URL.
    #[error("invalid base api url: {0}")]
    InvalidBaseUrl(String),
}

// ===== Conversions for `?` ergonomics at the crate root =====

impl From<reqwest::Error> for TrackerError {
    fn from(e: reqwest::Error) -> Self {
        TrackerError::Provider(TrackerProviderError::from(e))
    }
}

impl From<reqwest::Error> for TrackerProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return TrackerProviderError::Timeout;
        }
        if let Some(status) = e.status() {
            return TrackerProviderError::from_status(status.as_u16(), None);
        }
        if e.is_decode() {
            return TrackerProviderError::InvalidResponse(e.to_string());
        }
        TrackerProviderError::Network(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_variants() {
        assert!(matches!(
            TrackerProviderError::from_status(401, None),
            TrackerProviderError::Unauthorized
        ));
        assert!(matches!(
            TrackerProviderError::from_status(429, Some(7)),
            TrackerProviderError::RateLimited {
                retry_after_secs: Some(7)
            }
        ));
        assert!(matches!(
            TrackerProviderError::from_status(502, None),
            TrackerProviderError::Server(502)
        ));
        assert!(matches!(
            TrackerProviderError::from_status(422, None),
            TrackerProviderError::HttpStatus(422)
        ));
    }

    #[test]
    fn status_round_trips_through_root_error() {
        let err: TrackerError = TrackerProviderError::from_status(404, None).into();
        assert_eq!(err.status(), Some(404));
        let err = TrackerError::Validation("bad".into());
        assert_eq!(err.status(), None);
    }
}
