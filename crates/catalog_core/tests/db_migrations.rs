use catalog_core::db::migrations::latest_version;
use catalog_core::db::{open_db, open_db_in_memory, open_with_config, DbError};
use catalog_core::DatabaseConfig;
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "categories");
    assert_table_exists(&conn, "items");
    assert_table_exists(&conn, "groupings");
    assert_table_exists(&conn, "sub_units");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "sub_units");
}

#[test]
fn open_with_config_uses_configured_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("configured.db");
    let config = DatabaseConfig {
        path: Some(path.clone()),
        busy_timeout_ms: 250,
    };

    let conn = open_with_config(&config).unwrap();
    assert_eq!(schema_version(&conn), latest_version());
    assert!(path.exists());
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

#[test]
fn unopenable_file_reports_its_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("catalog.db");

    match open_db(&path).unwrap_err() {
        DbError::Open { target, source } => {
            assert!(target.ends_with("catalog.db"));
            assert!(matches!(source, rusqlite::Error::SqliteFailure(..)));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!path.exists());
}

#[test]
fn live_name_index_ignores_soft_deleted_rows() {
    let conn = open_db_in_memory().unwrap();
    let insert = "INSERT INTO categories (id, created_at, updated_at, is_deleted, name, description, display_color)
                  VALUES (?1, 0, 0, ?2, 'Animals', 'd', 'red')";

    conn.execute(insert, rusqlite::params!["a", 1]).unwrap();
    conn.execute(insert, rusqlite::params!["b", 0]).unwrap();
    let duplicate = conn.execute(insert, rusqlite::params!["c", 0]);
    assert!(duplicate.is_err());
}

#[test]
fn grouping_capacity_check_is_enforced() {
    let conn = open_db_in_memory().unwrap();
    let result = conn.execute(
        "INSERT INTO groupings (id, created_at, updated_at, name, description, core_capacity, total_capacity)
         VALUES ('g', 0, 0, 'Core', 'd', 5, 2)",
        [],
    );
    assert!(result.is_err());
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
