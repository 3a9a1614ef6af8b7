use rusqlite::Connection;
use studentdesk_core::db::migrations::{current_user_version, latest_version};
use studentdesk_core::db::{open_db, open_db_in_memory, DbError};

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(current_user_version(&conn).unwrap(), latest_version());
    assert_table_exists(&conn, "students");
    assert_table_exists(&conn, "class_rooms");
}

#[test]
fn reopening_file_database_keeps_rows_and_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("desk.sqlite3");

    let first = open_db(&path).unwrap();
    first
        .execute(
            "INSERT INTO students (id, name, email, class, gender, contact, timestamp)
             VALUES ('s-1', 'Amy', 'amy@x.com', '5A', 'female', '555', 10);",
            [],
        )
        .unwrap();
    drop(first);

    let second = open_db(&path).unwrap();
    assert_eq!(current_user_version(&second).unwrap(), latest_version());
    let count: i64 = second
        .query_row("SELECT COUNT(*) FROM students;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn seeded_roster_is_not_duplicated_on_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roster.sqlite3");
    drop(open_db(&path).unwrap());

    let conn = open_db(&path).unwrap();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM class_rooms;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 12);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::SchemaTooNew { found, supported } => {
            assert_eq!(found, 999);
            assert_eq!(supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn opening_database_with_renamed_student_column_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("renamed.sqlite3");
    let conn = open_db(&path).unwrap();
    conn.execute_batch("ALTER TABLE students RENAME COLUMN contact TO phone;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::MissingStudentColumn { column } => assert_eq!(column, "contact"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn opening_database_with_empty_roster_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("no-classes.sqlite3");
    let conn = open_db(&path).unwrap();
    conn.execute_batch("DELETE FROM class_rooms;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    assert!(matches!(err, DbError::EmptyRoster), "unexpected error: {err}");
}

#[test]
fn failing_migration_reports_its_version_and_rolls_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clash.sqlite3");

    // A view named like the roster table makes migration 2 fail.
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("CREATE VIEW class_rooms AS SELECT 1 AS class;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::Migration { version, .. } => assert_eq!(version, 2),
        other => panic!("unexpected error: {other}"),
    }

    let conn = Connection::open(&path).unwrap();
    assert_eq!(current_user_version(&conn).unwrap(), 0);
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
