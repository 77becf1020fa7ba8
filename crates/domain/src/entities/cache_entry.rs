//! Cached response entries

use chrono::{DateTime, Duration, Utc};

use crate::entities::ResponsePayload;

/// One persisted response, keyed by its request fingerprint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Hex digest of endpoint and canonical parameters
    pub fingerprint: String,
    pub endpoint: String,
    /// Canonical serialized parameters
    pub params: String,
    pub payload: ResponsePayload,
    /// Hex digest of `payload`
    pub checksum: String,
    pub created_at: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
    pub hit_count: u64,
}

impl CacheEntry {
    /// Time elapsed since the entry was written
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.created_at)
    }

    /// An entry is expired once its age strictly exceeds `max_age`
    pub fn is_expired(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        self.age(now) > max_age
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(created_at: DateTime<Utc>) -> CacheEntry {
        CacheEntry {
            fingerprint: "f".repeat(64),
            endpoint: "esearch.fcgi".to_string(),
            params: "{}".to_string(),
            payload: ResponsePayload::from("{}"),
            checksum: "c".repeat(64),
            created_at,
            last_accessed: created_at,
            hit_count: 0,
        }
    }

    #[test]
    fn expiry_is_strict() {
        let now = Utc::now();
        let max_age = Duration::days(30);

        assert!(!entry(now).is_expired(now, max_age));
        assert!(!entry(now - max_age).is_expired(now, max_age));
        assert!(entry(now - max_age - Duration::seconds(1)).is_expired(now, max_age));
    }
}
