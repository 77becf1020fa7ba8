//! Domain layer for the NCBI E-utilities client
//!
//! Contains the request descriptors, cache entries and typed response values.
//! This layer performs no I/O and defines the vocabulary shared by the
//! application and infrastructure crates.

pub mod entities;
pub mod errors;
pub mod value_objects;

pub use entities::*;
pub use errors::DomainError;
pub use value_objects::*;
