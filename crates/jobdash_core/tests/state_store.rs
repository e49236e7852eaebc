use jobdash_core::db::migrations::latest_version;
use jobdash_core::db::{open_db, open_db_in_memory, DbError};
use jobdash_core::repo::state_repo::{load_json, save_json};
use jobdash_core::{MemoryStateStore, SqliteStateStore, StateError, StateStore};
use rusqlite::Connection;
use std::collections::BTreeMap;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "kv_state");
}

#[test]
fn reopening_state_file_keeps_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("jobdash.db");

    let first = SqliteStateStore::open(&path).unwrap();
    save_json(&first, "notification_preferences", &BTreeMap::from([("job", false)])).unwrap();
    drop(first);

    let second = SqliteStateStore::open(&path).unwrap();
    let loaded: Option<BTreeMap<String, bool>> =
        load_json(&second, "notification_preferences").unwrap();
    assert_eq!(loaded, Some(BTreeMap::from([("job".to_string(), false)])));
    assert_eq!(second.keys().unwrap(), vec!["notification_preferences"]);
}

#[test]
fn save_replaces_whole_record_and_remove_deletes_it() {
    let store = SqliteStateStore::open_in_memory().unwrap();
    store.save("slice.user", "{\"a\":1}").unwrap();
    store.save("slice.user", "null").unwrap();
    assert_eq!(store.load("slice.user").unwrap().as_deref(), Some("null"));

    store.remove("slice.user").unwrap();
    assert_eq!(store.load("slice.user").unwrap(), None);
    assert!(store.keys().unwrap().is_empty());
}

#[test]
fn unavailable_memory_store_fails_every_call() {
    let store = MemoryStateStore::new();
    store.save("k", "1").unwrap();
    store.set_available(false);

    assert!(matches!(store.load("k"), Err(StateError::Unavailable(_))));
    assert!(matches!(store.save("k", "2"), Err(StateError::Unavailable(_))));

    store.set_available(true);
    assert_eq!(store.load("k").unwrap().as_deref(), Some("1"));
    assert_eq!(store.len(), 1);
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
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
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
