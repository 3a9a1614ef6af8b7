//! Runtime configuration.
//!
//! # Responsibility
//! - Resolve database, log and export locations plus the log level.
//!
//! # Invariants
//! - Blank environment values count as unset.
//! - Every path falls back to a location under the system temp directory.

use crate::logging::default_log_level;
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "STUDENTDESK_DB_PATH";
pub const LOG_DIR_ENV: &str = "STUDENTDESK_LOG_DIR";
pub const LOG_LEVEL_ENV: &str = "STUDENTDESK_LOG_LEVEL";
pub const EXPORT_DIR_ENV: &str = "STUDENTDESK_EXPORT_DIR";

const DB_FILE_NAME: &str = "studentdesk.sqlite3";
const LOG_DIR_NAME: &str = "studentdesk-logs";
const EXPORT_DIR_NAME: &str = "studentdesk-exports";

/// Resolved settings for one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeskConfig {
    pub db_path: PathBuf,
    pub log_dir: PathBuf,
    pub log_level: String,
    pub export_dir: PathBuf,
}

impl DeskConfig {
    /// Resolves settings from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves settings through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };
        let temp_dir = std::env::temp_dir();

        Self {
            db_path: value(DB_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| temp_dir.join(DB_FILE_NAME)),
            log_dir: value(LOG_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| temp_dir.join(LOG_DIR_NAME)),
            log_level: value(LOG_LEVEL_ENV).unwrap_or_else(|| default_log_level().to_string()),
            export_dir: value(EXPORT_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| temp_dir.join(EXPORT_DIR_NAME)),
        }
    }
}
