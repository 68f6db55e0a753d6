//! `pets` table definition and schema lifecycle.
//!
//! # Responsibility
//! - Own the DDL for the single `pets` table.
//! - Create the table on a fresh database and recreate it on version bumps.
//!
//! # Invariants
//! - The applied schema version is mirrored to `PRAGMA user_version`.
//! - Create and upgrade run inside one transaction each.
//! - `upgrade` discards every stored row. Replace it with real migrations
//!   before the schema carries data worth keeping across versions.

use crate::db::{DbError, DbResult};
use crate::model::pet::PetColumn;
use log::{info, warn};
use rusqlite::Connection;

/// Name of the only table owned by the store.
pub const TABLE_NAME: &str = "pets";

/// Default database file name used by callers that do not pick one.
pub const DATABASE_FILE_NAME: &str = "pets.db";

/// Current schema version. Bumping it wipes existing data on next open.
pub const DATABASE_VERSION: u32 = 1;

const CREATE_PETS_SQL: &str = "CREATE TABLE IF NOT EXISTS pets (
    _id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    breed TEXT,
    gender INTEGER NOT NULL,
    weight INTEGER NOT NULL DEFAULT 0
);";

const DROP_PETS_SQL: &str = "DROP TABLE IF EXISTS pets;";

/// Ensures the `pets` table exists at [`DATABASE_VERSION`].
pub fn ensure_schema(conn: &mut Connection) -> DbResult<()> {
    ensure_schema_version(conn, DATABASE_VERSION)
}

/// Ensures the `pets` table exists at `target_version`.
///
/// # Contract
/// - Fresh database (`user_version = 0`): creates the table.
/// - Same version: no-op.
/// - Older version: runs the destructive [`upgrade`].
/// - Newer version: returns `DbError::UnsupportedSchemaVersion`.
pub fn ensure_schema_version(conn: &mut Connection, target_version: u32) -> DbResult<()> {
    let current_version = current_user_version(conn)?;

    if current_version > target_version {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: target_version,
        });
    }

    if current_version == target_version {
        return Ok(());
    }

    if current_version == 0 {
        let tx = conn.transaction()?;
        tx.execute_batch(CREATE_PETS_SQL)?;
        tx.execute_batch(&format!("PRAGMA user_version = {target_version};"))?;
        tx.commit()?;
        info!("event=schema_create module=db status=ok version={target_version}");
        return Ok(());
    }

    upgrade(conn, current_version, target_version)
}

/// Drops the `pets` table and recreates it empty at `to_version`.
///
/// All stored pets are lost. Downgrades are rejected.
pub fn upgrade(conn: &mut Connection, from_version: u32, to_version: u32) -> DbResult<()> {
    if to_version < from_version {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from_version,
            latest_supported: to_version,
        });
    }

    warn!(
        "event=schema_upgrade module=db status=start from_version={from_version} to_version={to_version} destructive=true"
    );

    let tx = conn.transaction()?;
    tx.execute_batch(DROP_PETS_SQL)?;
    tx.execute_batch(CREATE_PETS_SQL)?;
    tx.execute_batch(&format!("PRAGMA user_version = {to_version};"))?;
    tx.commit()?;

    info!("event=schema_upgrade module=db status=ok to_version={to_version}");
    Ok(())
}

/// Reads the schema version stored in `PRAGMA user_version`.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

pub(crate) fn table_exists(conn: &Connection, table: &str) -> DbResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

/// Returns the first expected `pets` column that is missing, if any.
pub(crate) fn missing_pet_column(conn: &Connection) -> DbResult<Option<PetColumn>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({TABLE_NAME});"))?;
    let mut rows = stmt.query([])?;
    let mut present = Vec::new();
    while let Some(row) = rows.next()? {
        present.push(row.get::<_, String>(1)?);
    }

    Ok(PetColumn::ALL
        .into_iter()
        .find(|column| !present.iter().any(|name| name == column.as_str())))
}
