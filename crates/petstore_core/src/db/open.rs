//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure the busy timeout that stands in for application-level locking.
//! - Ensure the `pets` schema before returning a usable connection.
//!
//! # Invariants
//! - Returned connections have the schema at the requested version.

use super::schema::{ensure_schema_version, DATABASE_VERSION};
use super::DbResult;
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens (or creates) a pet database file at the current schema version.
///
/// Opening the same file repeatedly is idempotent.
///
/// # Side effects
/// - Creates the file and `pets` table when absent.
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_db_with_version(path, DATABASE_VERSION)
}

/// Opens a pet database file and brings it to `version`.
///
/// A stored version lower than `version` triggers the destructive upgrade.
pub fn open_db_with_version(path: impl AsRef<Path>, version: u32) -> DbResult<Connection> {
    bootstrap("file", version, || Connection::open(path))
}

/// Opens an in-memory pet database at the current schema version.
pub fn open_db_in_memory() -> DbResult<Connection> {
    bootstrap("memory", DATABASE_VERSION, Connection::open_in_memory)
}

fn bootstrap(
    mode: &str,
    version: u32,
    connect: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let mut conn = connect().map_err(|err| {
        error!(
            "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_open_failed error={err}",
            started_at.elapsed().as_millis()
        );
        err
    })?;

    let configured = conn
        .busy_timeout(BUSY_TIMEOUT)
        .map_err(Into::into)
        .and_then(|()| ensure_schema_version(&mut conn, version));

    match configured {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={mode} version={version} duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_bootstrap_failed error={err}",
                started_at.elapsed().as_millis()
            );
            Err(err)
        }
    }
}
