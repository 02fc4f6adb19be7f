use rusqlite::Connection;
use versekit_core::db::migrations::latest_version;
use versekit_core::db::{open_db, open_db_in_memory, DbError};

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "bibles");
    assert_table_exists(&conn, "bible_nodes");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("versekit.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "bible_nodes");
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
fn node_kind_column_rejects_root_rows() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO bibles (bible_uuid, root_uuid, name, created_at, updated_at)
         VALUES ('b', 'r', 'KJV', 0, 0);",
        [],
    )
    .unwrap();

    let result = conn.execute(
        "INSERT INTO bible_nodes (bible_uuid, node_uuid, kind, parent_uuid, sort_order, number)
         VALUES ('b', 'n', 'bible', 'r', 0, 0);",
        [],
    );
    assert!(result.is_err());
}

#[test]
fn deleting_a_bible_cascades_to_nodes() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO bibles (bible_uuid, root_uuid, name, created_at, updated_at)
         VALUES ('b', 'r', 'KJV', 0, 0);
         INSERT INTO bible_nodes (bible_uuid, node_uuid, kind, parent_uuid, sort_order, number, name)
         VALUES ('b', 'n', 'book', 'r', 0, 1, 'Genesis');
         DELETE FROM bibles WHERE bible_uuid = 'b';",
    )
    .unwrap();

    let remaining: i64 = conn
        .query_row("SELECT COUNT(*) FROM bible_nodes;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(remaining, 0);
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
