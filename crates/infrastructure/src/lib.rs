//! Infrastructure layer - Adapters for external systems
//!
//! Implements the application ports: the E-utilities request pipeline
//! (cache, rate limiter, retry, HTTP transport) and the SQLite-backed
//! response cache. Also hosts configuration loading and log setup.

pub mod adapters;
pub mod cache;
pub mod config;
pub mod persistence;
pub mod rate_limiter;
pub mod retry;
pub mod telemetry;

pub use adapters::*;
pub use cache::{SqliteResponseCache, checksum, default_cache_path, descriptor_fingerprint, fingerprint};
pub use config::{AppConfig, BatchConfig, CacheConfig, LoggingConfig};
pub use persistence::{ConnectionPool, DatabaseError, create_pool};
pub use rate_limiter::RateLimiter;
pub use retry::{RetryConfig, RetryResult, Retryable, retry, with_retry};
pub use telemetry::{TelemetryError, init_logging};
