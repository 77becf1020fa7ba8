//! Response cache port
//!
//! Defines the persistent cache consulted by the request pipeline before any
//! network call. Entries are addressed by a fingerprint derived from the
//! descriptor's endpoint and canonical parameters.

use std::collections::BTreeMap;

use async_trait::async_trait;
use domain::{RequestDescriptor, ResponsePayload};
#[cfg(test)]
use mockall::automock;
use serde::Serialize;

use crate::error::ApplicationError;

/// Port for the persistent response cache
///
/// A read that finds an expired or corrupted entry reports a miss.
/// Errors are reserved for an unusable backing store.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ResponseCachePort: Send + Sync {
    /// Look up a fresh, intact payload and record the hit
    async fn get(
        &self,
        descriptor: &RequestDescriptor,
    ) -> Result<Option<ResponsePayload>, ApplicationError>;

    /// Insert or overwrite the payload for a descriptor, resetting its hit count
    async fn put(
        &self,
        descriptor: &RequestDescriptor,
        payload: &ResponsePayload,
    ) -> Result<(), ApplicationError>;

    /// Delete entries older than the configured maximum age
    async fn clear_stale(&self) -> Result<u64, ApplicationError>;

    /// Delete every entry
    async fn clear_all(&self) -> Result<u64, ApplicationError>;

    /// Aggregate statistics over the stored entries
    async fn get_stats(&self) -> Result<CacheStats, ApplicationError>;
}

/// Per-endpoint cache statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EndpointStats {
    pub entries: u64,
    pub hits: u64,
    pub size_bytes: u64,
}

/// Cache statistics for monitoring
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub total_entries: u64,
    pub total_hits: u64,
    pub by_endpoint: BTreeMap<String, EndpointStats>,
    /// Estimated storage used by payloads and parameters
    pub size_bytes: u64,
    /// Size of the backing database (pages allocated), 0 if unknown
    pub database_bytes: u64,
}

impl CacheStats {
    /// Average number of hits per stored entry
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn hits_per_entry(&self) -> f64 {
        if self.total_entries == 0 {
            0.0
        } else {
            // Precision loss is acceptable for statistics display
            self.total_hits as f64 / self.total_entries as f64
        }
    }
}
