//! Database connection management
//!
//! SQLite connection pooling via r2d2. Every pooled connection is opened in
//! WAL mode with a busy timeout, so concurrent readers never block on the
//! single writer for long.

use std::path::Path;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use thiserror::Error;
use tracing::{debug, info};

/// Path that selects a private in-memory database
pub const MEMORY_PATH: &str = ":memory:";

/// Database errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Cannot prepare database location: {0}")]
    Io(#[from] std::io::Error),
}

/// SQLite connection pool type alias
pub type ConnectionPool = Pool<SqliteConnectionManager>;

/// Pooled connection type alias
pub type PooledConn = PooledConnection<SqliteConnectionManager>;

/// Open (creating if needed) the database at `path` and bring its schema up to date
///
/// An in-memory database exists per connection, so the pool is limited to a
/// single connection for [`MEMORY_PATH`].
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created, the file
/// cannot be opened or a migration fails.
pub fn create_pool(path: &str, max_connections: u32) -> Result<ConnectionPool, DatabaseError> {
    let in_memory = path == MEMORY_PATH;
    let max_size = if in_memory { 1 } else { max_connections.max(1) };
    info!(path, max_connections = max_size, "Creating database connection pool");

    let manager = if in_memory {
        SqliteConnectionManager::memory()
    } else {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        SqliteConnectionManager::file(path)
    }
    .with_init(|conn| configure_connection(conn));

    let pool = Pool::builder().max_size(max_size).build(manager)?;

    {
        let conn = pool.get()?;
        crate::persistence::migrations::run_migrations(&conn)?;
    }

    debug!("Database connection pool created successfully");
    Ok(pool)
}

/// Per-connection settings
fn configure_connection(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_in_memory_pool() {
        let pool = create_pool(MEMORY_PATH, 8).unwrap();
        assert_eq!(pool.max_size(), 1);
        assert!(pool.get().is_ok());
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cache.db");

        let pool = create_pool(path.to_str().unwrap(), 2).unwrap();

        assert!(path.exists());
        assert_eq!(pool.max_size(), 2);
    }

    #[test]
    fn file_database_uses_wal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.db");
        let pool = create_pool(path.to_str().unwrap(), 1).unwrap();

        let conn = pool.get().unwrap();
        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }

    #[test]
    fn database_error_display() {
        let err = DatabaseError::Migration("v1 failed".to_string());
        assert!(err.to_string().contains("v1 failed"));
    }
}
