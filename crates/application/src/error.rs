//! Application-level errors

use std::time::Duration;

use domain::DomainError;
use thiserror::Error;

/// Errors that can occur in the application layer
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Domain-level error
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Missing or invalid configuration, raised before any I/O
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Network failure, timeout, HTTP 429 or HTTP 5xx
    #[error("Transient failure calling {endpoint}: {reason}")]
    Transient {
        endpoint: String,
        reason: String,
        status: Option<u16>,
        /// Server-provided hint for the next attempt
        retry_after: Option<Duration>,
    },

    /// HTTP 4xx other than 429, or a request the server cannot accept
    #[error("Request to {endpoint} rejected with status {status}: {reason}")]
    ClientRequest {
        endpoint: String,
        status: u16,
        reason: String,
    },

    /// Backing store for the response cache is unreachable or corrupt
    #[error("Cache persistence error: {0}")]
    CachePersistence(String),

    /// The overall request budget was exhausted
    #[error("Request to {endpoint} timed out after {elapsed_ms} ms")]
    Timeout { endpoint: String, elapsed_ms: u64 },

    /// Terminal failure of a request, with the context needed to diagnose it
    #[error("Request to {endpoint} failed after {attempts} attempt(s) [{params}]: {source}")]
    RequestFailed {
        endpoint: String,
        params: String,
        attempts: u32,
        #[source]
        source: Box<ApplicationError>,
    },

    /// Payload could not be turned into the expected typed result
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApplicationError {
    /// Check if this error is retryable
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// Server-provided delay before the next attempt, if any
    pub const fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Transient { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Number of attempts made before a terminal failure
    pub const fn attempts(&self) -> Option<u32> {
        match self {
            Self::RequestFailed { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }

    /// The innermost cause, looking through `RequestFailed` wrappers
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::RequestFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
