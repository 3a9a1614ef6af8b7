//! Class roster capability.
//!
//! # Responsibility
//! - Provide the closed set of class options offered by the record form.
//!
//! # Invariants
//! - Roster order is stable between calls so the selector does not reshuffle.

use crate::db::{open_db, DbError};
use crate::model::student::ClassRoom;
use crate::store::lock;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::sync::Mutex;

pub type RosterResult<T> = Result<T, RosterError>;

#[derive(Debug)]
pub enum RosterError {
    Db(DbError),
}

impl Display for RosterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "class roster unavailable: {err}"),
        }
    }
}

impl Error for RosterError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
        }
    }
}

impl From<DbError> for RosterError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RosterError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Query(value))
    }
}

/// Source of class options.
pub trait ClassRoster {
    fn list(&self) -> RosterResult<Vec<ClassRoom>>;
}

/// Fixed in-process roster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticClassRoster {
    classes: Vec<ClassRoom>,
}

impl StaticClassRoster {
    pub fn new<I, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            classes: classes.into_iter().map(ClassRoom::new).collect(),
        }
    }
}

impl ClassRoster for StaticClassRoster {
    fn list(&self) -> RosterResult<Vec<ClassRoom>> {
        Ok(self.classes.clone())
    }
}

/// Roster backed by the `class_rooms` table.
pub struct SqliteClassRoster {
    conn: Mutex<Connection>,
}

impl SqliteClassRoster {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    pub fn open(path: impl AsRef<Path>) -> RosterResult<Self> {
        Ok(Self::new(open_db(path)?))
    }
}

impl ClassRoster for SqliteClassRoster {
    fn list(&self) -> RosterResult<Vec<ClassRoom>> {
        let conn = lock(&self.conn);
        let mut stmt =
            conn.prepare("SELECT class FROM class_rooms ORDER BY sort_order ASC, class ASC;")?;
        let classes = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .map(|row| row.map(ClassRoom::new))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(classes)
    }
}
