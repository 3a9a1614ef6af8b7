//! Connection bootstrap for the student database.
//!
//! # Invariants
//! - Returned connections are migrated and pass the schema check.

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

/// Columns of `students` read by the collection, in select order.
pub const STUDENT_COLUMNS: [&str; 10] = [
    "id",
    "name",
    "email",
    "class",
    "gender",
    "subject",
    "contact",
    "year_joined",
    "img",
    "timestamp",
];

/// Opens (creating if needed) the student database file.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_with("file", || Connection::open(path))
}

/// Opens a throwaway in-memory student database.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_with("memory", Connection::open_in_memory)
}

fn open_with(
    mode: &'static str,
    connect: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();

    let result = connect()
        .and_then(|conn| {
            conn.busy_timeout(Duration::from_secs(5))?;
            Ok(conn)
        })
        .map_err(|source| DbError::Connect { mode, source })
        .and_then(|mut conn| {
            apply_migrations(&mut conn)?;
            verify_schema(&conn)?;
            Ok(conn)
        });

    let duration_ms = started_at.elapsed().as_millis();
    match &result {
        Ok(_) => info!("event=db_open module=db status=ok mode={mode} duration_ms={duration_ms}"),
        Err(err) => error!(
            "event=db_open module=db status=error mode={mode} duration_ms={duration_ms} error={err}"
        ),
    }
    result
}

fn verify_schema(conn: &Connection) -> DbResult<()> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info('students');")?;
    let present = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    if let Some(column) = STUDENT_COLUMNS
        .into_iter()
        .find(|column| !present.iter().any(|name| name == column))
    {
        return Err(DbError::MissingStudentColumn { column });
    }

    let classes: i64 = conn.query_row("SELECT COUNT(*) FROM class_rooms;", [], |row| row.get(0))?;
    if classes == 0 {
        return Err(DbError::EmptyRoster);
    }
    Ok(())
}
