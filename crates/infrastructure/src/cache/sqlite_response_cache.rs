//! SQLite-backed response cache

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use application::{ApplicationError, CacheStats, EndpointStats, ResponseCachePort};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use domain::{CacheEntry, RequestDescriptor, ResponsePayload};
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};
use tokio::task;
use tracing::{debug, info, instrument, warn};

use super::{checksum, descriptor_fingerprint};
use crate::persistence::{ConnectionPool, DatabaseError, MEMORY_PATH, create_pool};

/// Directory below `$HOME` holding the default cache file
const CACHE_DIR: &str = ".ncbi_cache";

/// File name of the default cache database
const CACHE_FILE: &str = "ncbi_cache.db";

const POOL_SIZE: u32 = 4;

/// Default cache location: `$HOME/.ncbi_cache/ncbi_cache.db`
///
/// Falls back to the working directory when `HOME` is unset.
#[must_use]
pub fn default_cache_path() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_default()
        .join(CACHE_DIR)
        .join(CACHE_FILE)
}

/// Outcome of a single cache lookup
enum Lookup {
    Hit(Vec<u8>),
    Miss,
    Expired { age_ms: i64 },
    Corrupted,
}

/// Persistent response cache stored in a single SQLite file
#[derive(Debug, Clone)]
pub struct SqliteResponseCache {
    pool: Arc<ConnectionPool>,
    max_age: Duration,
}

impl SqliteResponseCache {
    /// Open or create the cache database at `path`
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: &str, max_age: Duration) -> Result<Self, DatabaseError> {
        let pool = create_pool(path, POOL_SIZE)?;
        info!(path, max_age_days = max_age.num_days(), "Opened response cache");
        Ok(Self::from_pool(Arc::new(pool), max_age))
    }

    /// Private in-memory cache, mostly for tests
    ///
    /// # Errors
    ///
    /// Returns an error if SQLite cannot be initialized.
    pub fn in_memory(max_age: Duration) -> Result<Self, DatabaseError> {
        Self::open(MEMORY_PATH, max_age)
    }

    /// Wrap an already migrated pool
    #[must_use]
    pub const fn from_pool(pool: Arc<ConnectionPool>, max_age: Duration) -> Self {
        Self { pool, max_age }
    }

    #[must_use]
    pub const fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Read an entry without recording a hit or checking freshness
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be read.
    pub async fn entry(
        &self,
        descriptor: &RequestDescriptor,
    ) -> Result<Option<CacheEntry>, ApplicationError> {
        let fingerprint = descriptor_fingerprint(descriptor);
        self.with_connection(move |conn| {
            Ok(conn
                .query_row(
                    "SELECT fingerprint, endpoint, params, payload, checksum,
                            created_at, last_accessed, hit_count
                     FROM cache_entries WHERE fingerprint = ?1",
                    [&fingerprint],
                    row_to_entry,
                )
                .optional()?)
        })
        .await
    }

    /// Run `f` on a pooled connection off the async runtime
    async fn with_connection<T, F>(&self, f: F) -> Result<T, ApplicationError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, DatabaseError> + Send + 'static,
    {
        let pool = Arc::clone(&self.pool);

        task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            f(&mut conn)
        })
        .await
        .map_err(|e| ApplicationError::Internal(format!("Cache task failed: {e}")))?
        .map_err(|e| ApplicationError::CachePersistence(e.to_string()))
    }
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

fn millis_to_datetime(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

fn row_to_entry(row: &Row<'_>) -> rusqlite::Result<CacheEntry> {
    let hit_count: i64 = row.get(7)?;
    Ok(CacheEntry {
        fingerprint: row.get(0)?,
        endpoint: row.get(1)?,
        params: row.get(2)?,
        payload: ResponsePayload::new(row.get(3)?),
        checksum: row.get(4)?,
        created_at: millis_to_datetime(row.get(5)?),
        last_accessed: millis_to_datetime(row.get(6)?),
        hit_count: u64::try_from(hit_count).unwrap_or(0),
    })
}

fn to_u64(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

#[async_trait]
impl ResponseCachePort for SqliteResponseCache {
    #[instrument(skip(self, descriptor), fields(endpoint = descriptor.endpoint()))]
    async fn get(
        &self,
        descriptor: &RequestDescriptor,
    ) -> Result<Option<ResponsePayload>, ApplicationError> {
        let fingerprint = descriptor_fingerprint(descriptor);
        let max_age_ms = self.max_age.num_milliseconds();
        let key = fingerprint.clone();

        let lookup = self
            .with_connection(move |conn| {
                let now = now_millis();

                // Plain read: under WAL it never waits on writers
                let row = conn
                    .query_row(
                        "SELECT payload, checksum, created_at FROM cache_entries
                         WHERE fingerprint = ?1",
                        [&key],
                        |row| {
                            Ok((
                                row.get::<_, Vec<u8>>(0)?,
                                row.get::<_, String>(1)?,
                                row.get::<_, i64>(2)?,
                            ))
                        },
                    )
                    .optional()?;

                let lookup = match row {
                    None => Lookup::Miss,
                    Some((_, _, created_at)) if now - created_at > max_age_ms => Lookup::Expired {
                        age_ms: now - created_at,
                    },
                    Some((payload, stored, _)) if checksum(&payload) != stored => {
                        Lookup::Corrupted
                    },
                    Some((payload, stored, created_at)) => {
                        // Single statement, so the counter and timestamp move together;
                        // an entry replaced since the read is left untouched
                        conn.execute(
                            "UPDATE cache_entries
                             SET hit_count = hit_count + 1, last_accessed = ?2
                             WHERE fingerprint = ?1 AND checksum = ?3 AND created_at = ?4",
                            params![key, now, stored, created_at],
                        )?;
                        Lookup::Hit(payload)
                    },
                };

                Ok(lookup)
            })
            .await?;

        match lookup {
            Lookup::Hit(payload) => {
                debug!(fingerprint = %fingerprint, bytes = payload.len(), "Cache hit");
                Ok(Some(ResponsePayload::new(payload)))
            },
            Lookup::Miss => {
                debug!(fingerprint = %fingerprint, "Cache miss");
                Ok(None)
            },
            Lookup::Expired { age_ms } => {
                debug!(fingerprint = %fingerprint, age_ms, "Cache entry expired");
                Ok(None)
            },
            Lookup::Corrupted => {
                warn!(
                    fingerprint = %fingerprint,
                    "Cache entry failed integrity check, treating as miss"
                );
                Ok(None)
            },
        }
    }

    #[instrument(skip(self, descriptor, payload), fields(endpoint = descriptor.endpoint(), bytes = payload.len()))]
    async fn put(
        &self,
        descriptor: &RequestDescriptor,
        payload: &ResponsePayload,
    ) -> Result<(), ApplicationError> {
        let fingerprint = descriptor_fingerprint(descriptor);
        let endpoint = descriptor.endpoint().to_string();
        let params = descriptor.canonical_form();
        let bytes = payload.as_bytes().to_vec();
        let sum = checksum(&bytes);

        self.with_connection(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let now = now_millis();
            tx.execute(
                "INSERT OR REPLACE INTO cache_entries
                 (fingerprint, endpoint, params, payload, checksum, created_at, last_accessed, hit_count)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6, 0)",
                params![fingerprint, endpoint, params, bytes, sum, now],
            )?;
            tx.commit()?;
            debug!(fingerprint = %fingerprint, "Stored response in cache");
            Ok(())
        })
        .await
    }

    #[instrument(skip(self))]
    async fn clear_stale(&self) -> Result<u64, ApplicationError> {
        let max_age_ms = self.max_age.num_milliseconds();

        let removed = self
            .with_connection(move |conn| {
                let cutoff = now_millis() - max_age_ms;
                let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
                let removed = tx.execute("DELETE FROM cache_entries WHERE created_at < ?1", [cutoff])?;
                tx.commit()?;
                Ok(removed as u64)
            })
            .await?;

        info!(removed, "Cleared stale cache entries");
        Ok(removed)
    }

    #[instrument(skip(self))]
    async fn clear_all(&self) -> Result<u64, ApplicationError> {
        let removed = self
            .with_connection(|conn| {
                let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
                let removed = tx.execute("DELETE FROM cache_entries", [])?;
                tx.commit()?;
                Ok(removed as u64)
            })
            .await?;

        info!(removed, "Cleared response cache");
        Ok(removed)
    }

    #[instrument(skip(self))]
    async fn get_stats(&self) -> Result<CacheStats, ApplicationError> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT endpoint,
                        COUNT(*),
                        COALESCE(SUM(hit_count), 0),
                        COALESCE(SUM(LENGTH(payload) + LENGTH(params)), 0)
                 FROM cache_entries
                 GROUP BY endpoint",
            )?;

            let rows = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        EndpointStats {
                            entries: to_u64(row.get(1)?),
                            hits: to_u64(row.get(2)?),
                            size_bytes: to_u64(row.get(3)?),
                        },
                    ))
                })?
                .collect::<Result<BTreeMap<_, _>, _>>()?;

            let page_count: i64 = conn.query_row("PRAGMA page_count", [], |row| row.get(0))?;
            let page_size: i64 = conn.query_row("PRAGMA page_size", [], |row| row.get(0))?;

            let mut stats = CacheStats {
                database_bytes: to_u64(page_count.saturating_mul(page_size)),
                ..Default::default()
            };
            for endpoint in rows.values() {
                stats.total_entries += endpoint.entries;
                stats.total_hits += endpoint.hits;
                stats.size_bytes += endpoint.size_bytes;
            }
            stats.by_endpoint = rows;

            Ok(stats)
        })
        .await
    }
}
