//! Student database bootstrap.
//!
//! Opening a database runs pending migrations and then checks that the
//! tables the dashboard reads have the shape this build expects. A file that
//! fails the check is reported, never repaired.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory, STUDENT_COLUMNS};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    /// The connection could not be opened or configured.
    Connect {
        mode: &'static str,
        source: rusqlite::Error,
    },
    /// One migration script failed; the whole run was rolled back.
    Migration {
        version: u32,
        source: rusqlite::Error,
    },
    /// The file was written by a newer build.
    SchemaTooNew { found: u32, supported: u32 },
    /// `students` lacks a column the collection reads.
    MissingStudentColumn { column: &'static str },
    /// `class_rooms` is empty, so the form would offer no class.
    EmptyRoster,
    /// A read or write against a bootstrapped database failed.
    Query(rusqlite::Error),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connect { mode, source } => {
                write!(f, "failed to open {mode} student database: {source}")
            }
            Self::Migration { version, source } => {
                write!(f, "student schema migration {version} failed: {source}")
            }
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "student database is at schema {found}, this build supports up to {supported}"
            ),
            Self::MissingStudentColumn { column } => {
                write!(f, "students table has no `{column}` column")
            }
            Self::EmptyRoster => write!(f, "class roster is empty"),
            Self::Query(err) => write!(f, "student database query failed: {err}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Connect { source, .. } | Self::Migration { source, .. } => Some(source),
            Self::Query(err) => Some(err),
            Self::SchemaTooNew { .. } | Self::MissingStudentColumn { .. } | Self::EmptyRoster => {
                None
            }
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Query(value)
    }
}
