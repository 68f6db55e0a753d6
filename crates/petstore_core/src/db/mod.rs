//! SQLite storage bootstrap and schema lifecycle entry points.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the pet store.
//! - Create the `pets` table on first use and upgrade it on version bumps.
//!
//! # Invariants
//! - Schema version is tracked via `PRAGMA user_version`.
//! - Store code must not read/write pet data before `ensure_schema` succeeds.
//! - Upgrades are destructive (drop + recreate); no data is migrated.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod open;
pub mod schema;

pub use open::{open_db, open_db_in_memory, open_db_with_version};
pub use schema::{ensure_schema, ensure_schema_version, upgrade, DATABASE_VERSION};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
