//! Transport abstraction

use std::time::Duration;

use async_trait::async_trait;

use crate::error::TransportError;

/// A single outbound GET request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    pub url: String,
    /// Query parameters in the order they should be sent
    pub params: Vec<(String, String)>,
    pub timeout: Duration,
}

impl TransportRequest {
    pub const fn new(url: String, params: Vec<(String, String)>, timeout: Duration) -> Self {
        Self {
            url,
            params,
            timeout,
        }
    }

    /// Value of the first parameter named `key`
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// A successful (2xx) response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Sends requests to E-utilities
///
/// Implementations return `Ok` only for 2xx responses and classify every
/// other outcome into a [`TransportError`].
#[async_trait]
pub trait EutilsTransport: Send + Sync {
    async fn send(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError>;
}
