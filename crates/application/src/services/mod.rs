//! Application services - Use case implementations

mod batch_service;

pub use batch_service::{
    BatchService, DEFAULT_CHUNK_SIZE, MAX_CHUNK_SIZE, ProgressCallback, chunk_count,
    validate_chunk_size,
};
