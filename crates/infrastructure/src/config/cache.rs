//! Response cache and batching configuration.

use serde::{Deserialize, Serialize};

use super::default_true;
use crate::cache::default_cache_path;

/// Persistent response cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Whether responses are cached (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// SQLite file; `~/.ncbi_cache/ncbi_cache.db` when unset
    #[serde(default)]
    pub path: Option<String>,

    /// Entries older than this many days are stale (default: 30)
    #[serde(default = "default_max_age_days")]
    pub max_age_days: u32,
}

const fn default_max_age_days() -> u32 {
    30
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
            max_age_days: default_max_age_days(),
        }
    }
}

impl CacheConfig {
    /// Configured path, or the default location
    #[must_use]
    pub fn resolved_path(&self) -> String {
        self.path.clone().unwrap_or_else(|| {
            default_cache_path().to_string_lossy().into_owned()
        })
    }

    #[must_use]
    pub fn max_age(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.max_age_days))
    }
}

/// Batch fetch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Identifiers per EFetch request (default: 100, max: 500)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

const fn default_chunk_size() -> usize {
    application::DEFAULT_CHUNK_SIZE
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
        }
    }
}
