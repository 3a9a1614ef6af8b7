//! CSV encoder for the student table export.
//!
//! # Invariants
//! - Header row is fixed and always present.
//! - Rows follow snapshot order; the export is a point-in-time copy.
//! - Fields containing `,`, `"`, CR, LF or edge whitespace are quoted and
//!   embedded quotes doubled.

use crate::model::student::StudentRecord;
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const EXPORT_FILE_NAME: &str = "students.csv";
pub const EXPORT_MIME_TYPE: &str = "text/csv;charset=utf-8;";
pub const EXPORT_HEADER: [&str; 8] = [
    "Id",
    "Name",
    "Subject",
    "Class",
    "Email",
    "Gender",
    "Year Joined",
    "Contact",
];

const DELIMITER: &str = ",";
const ROW_SEPARATOR: &str = "\r\n";

#[derive(Debug)]
pub enum ExportError {
    Io { path: PathBuf, source: std::io::Error },
}

impl Display for ExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to save export `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for ExportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
        }
    }
}

/// Encodes records under the fixed header.
pub fn encode_students_csv(records: &[StudentRecord]) -> String {
    let mut out = encode_row(EXPORT_HEADER.iter().copied());
    for record in records {
        out.push_str(ROW_SEPARATOR);
        out.push_str(&encode_row([
            record.id.as_str(),
            record.name.as_str(),
            record.subject.as_str(),
            record.class_name.as_str(),
            record.email.as_str(),
            record.gender.as_str(),
            record.year_joined.as_deref().unwrap_or(""),
            record.contact.as_str(),
        ]));
    }
    out
}

fn encode_row<'a>(fields: impl IntoIterator<Item = &'a str>) -> String {
    fields
        .into_iter()
        .map(csv_quote)
        .collect::<Vec<_>>()
        .join(DELIMITER)
}

fn csv_quote(value: &str) -> String {
    let needs_quotes = value.contains(DELIMITER)
        || value.contains('"')
        || value.contains('\n')
        || value.contains('\r')
        || value.starts_with(char::is_whitespace)
        || value.ends_with(char::is_whitespace);
    if needs_quotes {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Destination of the client-side "save as" side effect.
pub trait DownloadSink {
    /// Saves one payload and returns where it landed.
    fn save(&self, file_name: &str, mime_type: &str, bytes: &[u8]) -> Result<PathBuf, ExportError>;
}

/// Sink writing downloads into one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryDownloadSink {
    dir: PathBuf,
}

impl DirectoryDownloadSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DownloadSink for DirectoryDownloadSink {
    fn save(&self, file_name: &str, mime_type: &str, bytes: &[u8]) -> Result<PathBuf, ExportError> {
        let path = self.dir.join(file_name);
        let written =
            std::fs::create_dir_all(&self.dir).and_then(|()| std::fs::write(&path, bytes));
        match written {
            Ok(()) => {
                info!(
                    "event=export_save module=export status=ok mime={} bytes={}",
                    mime_type,
                    bytes.len()
                );
                Ok(path)
            }
            Err(source) => {
                error!("event=export_save module=export status=error error={source}");
                Err(ExportError::Io { path, source })
            }
        }
    }
}

/// Encodes `records` and saves them as `students.csv` through `sink`.
pub fn export_students<S: DownloadSink + ?Sized>(
    records: &[StudentRecord],
    sink: &S,
) -> Result<PathBuf, ExportError> {
    let payload = encode_students_csv(records);
    info!(
        "event=export_encode module=export status=ok row_count={}",
        records.len()
    );
    sink.save(EXPORT_FILE_NAME, EXPORT_MIME_TYPE, payload.as_bytes())
}
