//! Transport error types

use std::time::Duration;

use thiserror::Error;

/// Errors returned by an [`EutilsTransport`](crate::EutilsTransport)
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection could not be established or was interrupted
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// No response within the per-attempt timeout
    #[error("Request timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// HTTP 429
    #[error("Rate limit exceeded, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    /// HTTP 5xx
    #[error("Server error {status}: {message}")]
    ServerError {
        status: u16,
        message: String,
        retry_after: Option<Duration>,
    },

    /// HTTP 4xx other than 429
    #[error("Client error {status}: {message}")]
    ClientError { status: u16, message: String },

    /// The request could not be built (bad URL, bad header)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl TransportError {
    /// Returns true if this error is retryable
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed(_)
                | Self::Timeout { .. }
                | Self::RateLimited { .. }
                | Self::ServerError { .. }
        )
    }

    /// HTTP status behind the error, if one was received
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::RateLimited { .. } => Some(429),
            Self::ServerError { status, .. } | Self::ClientError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Server-provided `Retry-After` hint
    #[must_use]
    pub const fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } | Self::ServerError { retry_after, .. } => {
                *retry_after
            },
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classes() {
        assert!(TransportError::ConnectionFailed("reset".to_string()).is_retryable());
        assert!(TransportError::Timeout { timeout_secs: 30 }.is_retryable());
        assert!(TransportError::RateLimited { retry_after: None }.is_retryable());
        assert!(
            TransportError::ServerError {
                status: 502,
                message: "bad gateway".to_string(),
                retry_after: None,
            }
            .is_retryable()
        );

        assert!(
            !TransportError::ClientError {
                status: 400,
                message: "bad".to_string()
            }
            .is_retryable()
        );
        assert!(!TransportError::InvalidRequest("url".to_string()).is_retryable());
    }

    #[test]
    fn status_and_retry_after() {
        let err = TransportError::RateLimited {
            retry_after: Some(Duration::from_secs(3)),
        };
        assert_eq!(err.status(), Some(429));
        assert_eq!(err.retry_after(), Some(Duration::from_secs(3)));
        assert_eq!(TransportError::Timeout { timeout_secs: 1 }.status(), None);
    }

    #[test]
    fn display() {
        let err = TransportError::ServerError {
            status: 503,
            message: "maintenance".to_string(),
            retry_after: None,
        };
        assert_eq!(err.to_string(), "Server error 503: maintenance");
    }
}
