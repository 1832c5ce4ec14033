//! SQLite bootstrap for the key-value backend.
//!
//! # Responsibility
//! - Open file or in-memory connections configured for core use.
//! - Apply schema migrations before any key-value access.
//!
//! # Invariants
//! - Schema version is tracked in `PRAGMA user_version`.
//! - A database written by a newer binary is refused, not downgraded.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failure while opening or migrating the key-value database.
#[derive(Debug)]
pub enum DbError {
    /// SQLite rejected a statement or could not open the file.
    Sqlite(rusqlite::Error),
    /// The file carries a `kv_entries` schema newer than this build knows.
    SchemaTooNew { found: u32, supported: u32 },
    /// The connection was handed over before migrations ran on it.
    SchemaNotMigrated { found: u32, expected: u32 },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite error: {err}"),
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "key-value schema v{found} was written by a newer jotpad (this build reads up to v{supported})"
            ),
            Self::SchemaNotMigrated { found, expected } => write!(
                f,
                "key-value schema is at v{found}, expected v{expected}; open it through open_db"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        if let Self::Sqlite(err) = self {
            Some(err)
        } else {
            None
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
