use jotpad_core::db::migrations::latest_version;
use jotpad_core::db::{open_db, open_db_in_memory, DbError};
use jotpad_core::{KeyValueStore, KvError, SqliteKeyValueStore};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "kv_entries");
}

#[test]
fn opening_same_database_twice_keeps_stored_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("jotpad.db");

    let mut first = SqliteKeyValueStore::open(&path).unwrap();
    first.set("notes", "[]").unwrap();
    drop(first);

    let second = SqliteKeyValueStore::open(&path).unwrap();
    assert_eq!(schema_version(second.connection()), latest_version());
    assert_eq!(second.get("notes").unwrap().as_deref(), Some("[]"));
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::SchemaTooNew { found, supported } => {
            assert_eq!(found, 999);
            assert_eq!(supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn kv_store_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();
    let err = SqliteKeyValueStore::try_new(conn).err().expect("unmigrated db must fail");
    assert!(matches!(
        err,
        KvError::Db(DbError::SchemaNotMigrated { found: 0, .. })
    ));
}

#[test]
fn kv_set_replaces_value_and_remove_is_idempotent() {
    let mut kv = SqliteKeyValueStore::open_in_memory().unwrap();
    assert_eq!(kv.get("notes").unwrap(), None);

    kv.set("notes", "[1]").unwrap();
    kv.set("notes", "[2]").unwrap();
    assert_eq!(kv.get("notes").unwrap().as_deref(), Some("[2]"));

    let rows: i64 = kv
        .connection()
        .query_row("SELECT COUNT(*) FROM kv_entries;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);

    kv.remove("notes").unwrap();
    kv.remove("notes").unwrap();
    assert_eq!(kv.get("notes").unwrap(), None);
}

#[test]
fn kv_quota_rejects_oversized_write() {
    let mut kv = SqliteKeyValueStore::open_in_memory().unwrap().with_quota(4);
    let err = kv.set("notes", "[1,2,3]").unwrap_err();
    assert!(matches!(err, KvError::QuotaExceeded { quota: 4, .. }));
    assert_eq!(kv.get("notes").unwrap(), None);
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
