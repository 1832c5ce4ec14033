//! SQLite-backed key-value store.
//!
//! # Invariants
//! - Requires the `kv_entries` table created by migration 1.
//! - `set` is a single upsert statement, so a reader never sees a partial value.

use super::{check_quota, KeyValueStore, KvResult};
use crate::db::migrations::{current_user_version, latest_version};
use crate::db::{open_db, open_db_in_memory, DbError};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// Key-value store persisted in one SQLite table.
pub struct SqliteKeyValueStore {
    conn: Connection,
    quota_bytes: Option<usize>,
}

impl SqliteKeyValueStore {
    /// Wraps a connection that `open_db`/`open_db_in_memory` already migrated.
    pub fn try_new(conn: Connection) -> KvResult<Self> {
        let version = current_user_version(&conn)?;
        if version < latest_version() {
            return Err(DbError::SchemaNotMigrated {
                found: version,
                expected: latest_version(),
            }
            .into());
        }
        Ok(Self {
            conn,
            quota_bytes: None,
        })
    }

    /// Opens (or creates) a database file and wraps it.
    pub fn open(path: impl AsRef<Path>) -> KvResult<Self> {
        Self::try_new(open_db(path)?)
    }

    pub fn open_in_memory() -> KvResult<Self> {
        Self::try_new(open_db_in_memory()?)
    }

    /// Rejects any single value longer than `quota_bytes`.
    pub fn with_quota(mut self, quota_bytes: usize) -> Self {
        self.quota_bytes = Some(quota_bytes);
        self
    }

    /// Borrows the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl KeyValueStore for SqliteKeyValueStore {
    fn get(&self, key: &str) -> KvResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> KvResult<()> {
        check_quota(key, value, self.quota_bytes)?;
        self.conn.execute(
            "INSERT INTO kv_entries (key, value, updated_at)
             VALUES (?1, ?2, strftime('%s', 'now') * 1000)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> KvResult<()> {
        self.conn
            .execute("DELETE FROM kv_entries WHERE key = ?1;", [key])?;
        Ok(())
    }
}
