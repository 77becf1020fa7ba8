//! Batch orchestration
//!
//! Splits large identifier lists into fixed-size chunks and fetches them one
//! after another through the [`EutilsPort`]. Chunks are never issued in
//! parallel, so a batch cannot burst past the shared rate limiter and
//! progress events arrive in chunk order.

use std::fmt;
use std::sync::Arc;

use domain::{Database, FetchResult};
use tracing::{debug, info, instrument, warn};

use crate::error::ApplicationError;
use crate::ports::{EutilsPort, EutilsPortExt, FetchOptions};

/// Default number of identifiers per chunk
pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// Largest chunk accepted by the orchestrator
pub const MAX_CHUNK_SIZE: usize = 500;

/// Progress callback: `(completed_chunks, total_chunks)`
pub type ProgressCallback<'a> = &'a mut (dyn FnMut(usize, usize) + Send);

/// Drives chunked EFetch requests
pub struct BatchService {
    eutils: Arc<dyn EutilsPort>,
    default_chunk_size: usize,
}

impl fmt::Debug for BatchService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchService")
            .field("default_chunk_size", &self.default_chunk_size)
            .finish_non_exhaustive()
    }
}

impl BatchService {
    /// Create a batch service with the default chunk size
    pub fn new(eutils: Arc<dyn EutilsPort>) -> Self {
        Self {
            eutils,
            default_chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Override the chunk size used by [`Self::fetch_all`]
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the size is outside `1..=500`.
    pub fn with_default_chunk_size(mut self, chunk_size: usize) -> Result<Self, ApplicationError> {
        validate_chunk_size(chunk_size)?;
        self.default_chunk_size = chunk_size;
        Ok(self)
    }

    pub const fn default_chunk_size(&self) -> usize {
        self.default_chunk_size
    }

    /// Fetch `ids` using the configured default chunk size
    pub async fn fetch_all(
        &self,
        database: &Database,
        ids: &[String],
        options: &FetchOptions,
        progress: Option<ProgressCallback<'_>>,
    ) -> Result<Vec<FetchResult>, ApplicationError> {
        self.fetch_batch(database, ids, self.default_chunk_size, options, progress)
            .await
    }

    /// Fetch `ids` in chunks of at most `chunk_size`
    ///
    /// Returns one result per chunk, in order. The first terminal failure
    /// aborts the batch and is returned; results of earlier chunks are
    /// dropped. `progress` is called after every chunk, including the one
    /// that failed.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an invalid `chunk_size` before any
    /// request is made, or the first chunk's terminal error.
    #[instrument(skip(self, ids, options, progress), fields(db = %database, ids = ids.len()))]
    pub async fn fetch_batch(
        &self,
        database: &Database,
        ids: &[String],
        chunk_size: usize,
        options: &FetchOptions,
        mut progress: Option<ProgressCallback<'_>>,
    ) -> Result<Vec<FetchResult>, ApplicationError> {
        validate_chunk_size(chunk_size)?;

        if ids.is_empty() {
            debug!("Empty identifier list, nothing to fetch");
            return Ok(Vec::new());
        }

        let total = chunk_count(ids.len(), chunk_size);
        info!(chunks = total, chunk_size, "Starting batch fetch");

        let mut results = Vec::with_capacity(total);
        for (index, chunk) in ids.chunks(chunk_size).enumerate() {
            let outcome = self.eutils.fetch(database, chunk, options).await;

            if let Some(report) = progress.as_deref_mut() {
                report(index + 1, total);
            }

            match outcome {
                Ok(result) => {
                    debug!(chunk = index + 1, total, size = chunk.len(), "Chunk fetched");
                    results.push(result);
                },
                Err(e) => {
                    warn!(chunk = index + 1, total, error = %e, "Batch aborted");
                    return Err(e);
                },
            }
        }

        info!(chunks = total, "Batch fetch complete");
        Ok(results)
    }
}

/// Check that a chunk size lies within `1..=MAX_CHUNK_SIZE`
///
/// # Errors
///
/// Returns [`ApplicationError::Configuration`] otherwise.
pub fn validate_chunk_size(chunk_size: usize) -> Result<(), ApplicationError> {
    if chunk_size == 0 || chunk_size > MAX_CHUNK_SIZE {
        return Err(ApplicationError::Configuration(format!(
            "chunk size must be between 1 and {MAX_CHUNK_SIZE}, got {chunk_size}"
        )));
    }
    Ok(())
}

/// Number of chunks needed for `len` identifiers
pub const fn chunk_count(len: usize, chunk_size: usize) -> usize {
    len.div_ceil(chunk_size)
}
