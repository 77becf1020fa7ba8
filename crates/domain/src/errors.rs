//! Domain-level errors

use thiserror::Error;

/// Errors that can occur in the domain layer
#[derive(Debug, Error)]
pub enum DomainError {
    /// Invalid contact email address
    #[error("Invalid email address: {0}")]
    InvalidEmailAddress(String),

    /// Invalid database name
    #[error("Invalid database name: {0}")]
    InvalidDatabase(String),

    /// Request descriptor could not be built
    #[error("Invalid request descriptor: {0}")]
    InvalidDescriptor(String),

    /// Payload does not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The service answered with an error message in an otherwise valid envelope
    #[error("E-utilities reported an error: {0}")]
    RemoteError(String),
}

impl DomainError {
    /// Returns true if the error describes a malformed request built locally
    pub const fn is_request_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidEmailAddress(_) | Self::InvalidDatabase(_) | Self::InvalidDescriptor(_)
        )
    }
}
