//! Local key-value storage contracts and backends.
//!
//! # Responsibility
//! - Model the single-key string storage the note collection lives in.
//! - Report quota and backend failures as typed errors.
//!
//! # Invariants
//! - `set` replaces the whole value of a key atomically.
//! - Reading an absent key is `Ok(None)`, not an error.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod memory;
mod sqlite;

pub use memory::MemoryKeyValueStore;
pub use sqlite::SqliteKeyValueStore;

pub type KvResult<T> = Result<T, KvError>;

/// Storage-layer failure.
#[derive(Debug)]
pub enum KvError {
    /// SQLite backend failure.
    Db(DbError),
    /// Value exceeds the configured byte quota.
    QuotaExceeded {
        key: String,
        bytes: usize,
        quota: usize,
    },
    /// Backend refused access.
    Unavailable(String),
}

impl Display for KvError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::QuotaExceeded { key, bytes, quota } => write!(
                f,
                "value for `{key}` is {bytes} bytes, exceeding the {quota} byte quota"
            ),
            Self::Unavailable(message) => write!(f, "storage unavailable: {message}"),
        }
    }
}

impl Error for KvError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::QuotaExceeded { .. } | Self::Unavailable(_) => None,
        }
    }
}

impl From<DbError> for KvError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for KvError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// String key-value store in the shape of browser local storage.
pub trait KeyValueStore {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> KvResult<Option<String>>;
    /// Replaces the value under `key` in one step.
    fn set(&mut self, key: &str, value: &str) -> KvResult<()>;
    /// Removes `key`; removing an absent key succeeds.
    fn remove(&mut self, key: &str) -> KvResult<()>;
}

pub(crate) fn check_quota(key: &str, value: &str, quota: Option<usize>) -> KvResult<()> {
    match quota {
        Some(quota) if value.len() > quota => Err(KvError::QuotaExceeded {
            key: key.to_string(),
            bytes: value.len(),
            quota,
        }),
        _ => Ok(()),
    }
}
