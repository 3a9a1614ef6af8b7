//! Core logic for the student records dashboard.
//! This crate owns list sync, search, export and form invariants; UI shells
//! only render what it derives.

pub mod config;
pub mod dashboard;
pub mod db;
pub mod export;
pub mod form;
pub mod logging;
pub mod model;
pub mod roster;
pub mod search;
pub mod session;
pub mod store;
pub mod sync;

pub use config::DeskConfig;
pub use dashboard::listeners::{DocumentEvent, DocumentListeners, ListenerId};
pub use dashboard::page::{
    ClickTarget, DashboardPage, DashboardRow, DashboardView, Notice, NoticeKind, PageEntry,
    PageError, PageResult, EMPTY_TABLE_MESSAGE,
};
pub use export::csv::{
    encode_students_csv, export_students, DirectoryDownloadSink, DownloadSink, ExportError,
    EXPORT_FILE_NAME, EXPORT_HEADER, EXPORT_MIME_TYPE,
};
pub use form::record_form::{
    FormError, FormField, FormResult, FormState, RecordFormController, StudentFormFields,
    SubmitOutcome, SAVE_FAILURE_NOTICE, SAVE_SUCCESS_NOTICE,
};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::student::{
    ClassRoom, Gender, NewStudentDocument, StudentId, StudentRecord, DEFAULT_AVATAR,
};
pub use roster::{ClassRoster, RosterError, RosterResult, SqliteClassRoster, StaticClassRoster};
pub use search::filter::{filter_records, record_matches};
pub use session::{IdentitySource, SessionError, SessionIdentity, StoredIdentity, LOGIN_ROUTE};
pub use store::sqlite_collection::SqliteStudentCollection;
pub use store::{
    OrderKey, RemoteCollection, SnapshotEvent, SnapshotListener, SnapshotOrder, SortDirection,
    StoreError, StoreResult, SubscriptionHandle,
};
pub use sync::list_sync::{ListSyncController, SyncPhase};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
