//! Database migrations
//!
//! The schema is versioned through a single-row `schema_version` table.
//! Each migration is idempotent and runs inside its own transaction.
//!
//! ## Adding New Migrations
//!
//! 1. Increment `SCHEMA_VERSION`
//! 2. Add a `migrate_vX` function
//! 3. Call it from `run_migrations`

use rusqlite::Connection;
use tracing::{debug, error, info};

use super::connection::DatabaseError;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Run all pending migrations
///
/// # Errors
///
/// Returns an error if a migration statement fails; the failing migration
/// is rolled back.
pub fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    let current_version = schema_version(conn)?;

    if current_version > SCHEMA_VERSION {
        return Err(DatabaseError::Migration(format!(
            "database schema version {current_version} is newer than supported version {SCHEMA_VERSION}"
        )));
    }

    if current_version == SCHEMA_VERSION {
        debug!(version = current_version, "Database schema is up to date");
        return Ok(());
    }

    info!(
        from_version = current_version,
        to_version = SCHEMA_VERSION,
        "Running database migrations"
    );

    if current_version < 1 {
        if let Err(e) = migrate_v1(conn) {
            error!(version = 1, error = %e, "Migration V001 (cache entries) failed");
            return Err(e);
        }
    }

    set_schema_version(conn, SCHEMA_VERSION)?;
    info!(version = SCHEMA_VERSION, "Database migrations complete");
    Ok(())
}

/// Current schema version, 0 for a fresh database
///
/// # Errors
///
/// Returns an error if the version table cannot be created or read.
pub fn schema_version(conn: &Connection) -> Result<i32, DatabaseError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        )",
        [],
    )?;

    let version = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?;

    Ok(version)
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<(), DatabaseError> {
    conn.execute_batch("DELETE FROM schema_version")?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Migration to version 1: response cache
///
/// Timestamps are Unix epoch milliseconds (UTC).
fn migrate_v1(conn: &Connection) -> Result<(), DatabaseError> {
    debug!("Applying migration V001: cache entries");

    conn.execute_batch(
        "
        BEGIN;

        CREATE TABLE IF NOT EXISTS cache_entries (
            fingerprint TEXT PRIMARY KEY,
            endpoint TEXT NOT NULL,
            params TEXT NOT NULL,
            payload BLOB NOT NULL,
            checksum TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            last_accessed INTEGER NOT NULL,
            hit_count INTEGER NOT NULL DEFAULT 0 CHECK(hit_count >= 0)
        );

        CREATE INDEX IF NOT EXISTS idx_cache_entries_created ON cache_entries(created_at);
        CREATE INDEX IF NOT EXISTS idx_cache_entries_endpoint ON cache_entries(endpoint);

        COMMIT;
        ",
    )
    .map_err(|e| {
        // Leave no half-applied migration behind
        let _ = conn.execute_batch("ROLLBACK");
        DatabaseError::Migration(format!("V001: {e}"))
    })?;

    Ok(())
}
