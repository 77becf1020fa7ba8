//! Persistence module
//!
//! SQLite storage backing the response cache.

pub mod connection;
pub mod migrations;

pub use connection::{ConnectionPool, DatabaseError, MEMORY_PATH, PooledConn, create_pool};
