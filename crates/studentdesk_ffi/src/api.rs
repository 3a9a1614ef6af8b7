//! FFI use-case API for the dashboard screen.
//!
//! # Responsibility
//! - Expose one dashboard session per process to Dart via FRB.
//! - Translate core results into flat response envelopes.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - At most one dashboard page is alive; opening a new one tears down the old.
//! - Snapshot delivery only happens inside `dashboard_tick`.

use log::{info, warn};
use once_cell::sync::Lazy;
use studentdesk_core::{
    core_version as core_version_inner, init_logging as init_logging_inner,
    init_logging_from_config, ping as ping_inner, ClassRoster, ClickTarget, DashboardPage,
    DashboardRow, DeskConfig, DirectoryDownloadSink, Gender, NoticeKind, PageEntry, PageError,
    SqliteClassRoster, SqliteStudentCollection, StoredIdentity, SubmitOutcome,
};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

static DESK_CONFIG: OnceLock<DeskConfig> = OnceLock::new();
static DASHBOARD: Lazy<Mutex<Option<DashboardSession>>> = Lazy::new(|| Mutex::new(None));

struct DashboardSession {
    page: DashboardPage<SqliteStudentCollection>,
    export_sink: DirectoryDownloadSink,
}

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Initializes logging from `STUDENTDESK_LOG_LEVEL` and `STUDENTDESK_LOG_DIR`.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging_from_env() -> String {
    match init_logging_from_config(resolve_config()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Result of entering the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardOpenResponse {
    /// Whether the page is now live.
    pub ok: bool,
    /// Route to navigate to when no identity is present.
    pub redirect_to: Option<String>,
    pub message: String,
}

/// Generic action envelope for dashboard commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardActionResponse {
    pub ok: bool,
    /// Created student id after a successful submit.
    pub student_id: Option<String>,
    /// Saved file path after a successful export.
    pub path: Option<String>,
    /// Human-readable message for diagnostics/UI.
    pub message: String,
}

impl DashboardActionResponse {
    fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            student_id: None,
            path: None,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            student_id: None,
            path: None,
            message: message.into(),
        }
    }
}

/// Result of routing one document pointer-down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointerDownResponse {
    pub ok: bool,
    /// Whether the click closed the "Add Student" modal.
    pub closed: bool,
    pub message: String,
}

/// One table row ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentRowItem {
    pub id: String,
    pub name: String,
    pub avatar: String,
    pub subject: String,
    pub class_name: String,
    pub email: String,
    pub gender: String,
    pub contact: String,
}

impl From<DashboardRow> for StudentRowItem {
    fn from(row: DashboardRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            avatar: row.avatar,
            subject: row.subject,
            class_name: row.class_name,
            email: row.email,
            gender: row.gender,
            contact: row.contact,
        }
    }
}

/// Render model for one dashboard frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardViewResponse {
    /// `false` when no dashboard is open.
    pub ok: bool,
    pub loading: bool,
    pub sync_error: Option<String>,
    pub search_query: String,
    pub rows: Vec<StudentRowItem>,
    pub empty_message: Option<String>,
    pub total_count: u32,
    pub form_open: bool,
    pub message: String,
}

impl DashboardViewResponse {
    fn closed() -> Self {
        Self {
            ok: false,
            loading: false,
            sync_error: None,
            search_query: String::new(),
            rows: Vec::new(),
            empty_message: None,
            total_count: 0,
            form_open: false,
            message: "dashboard is not open".to_string(),
        }
    }
}

/// Select options for the "Add Student" form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormOptionsResponse {
    pub ok: bool,
    pub classes: Vec<String>,
    /// `(value, label)` pairs.
    pub genders: Vec<(String, String)>,
    pub message: String,
}

/// One user-facing alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeItem {
    /// `success|failure`.
    pub kind: String,
    pub message: String,
}

/// Enters the dashboard with the stored identity blob.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Returns `redirect_to` and opens nothing when the blob is absent.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn dashboard_open(identity_blob: Option<String>) -> DashboardOpenResponse {
    open_session(resolve_config(), identity_blob)
}

/// Delivers queued snapshots to the live page. Returns the delivery count.
///
/// # FFI contract
/// - Call once per UI frame or after any write.
/// - Returns 0 when no dashboard is open.
#[flutter_rust_bridge::frb(sync)]
pub fn dashboard_tick() -> u32 {
    let session = lock_dashboard();
    match session.as_ref() {
        Some(session) => {
            let delivered = session.page.collection().flush_notifications();
            u32::try_from(delivered).unwrap_or(u32::MAX)
        }
        None => 0,
    }
}

/// Returns the current render model.
#[flutter_rust_bridge::frb(sync)]
pub fn dashboard_view() -> DashboardViewResponse {
    let session = lock_dashboard();
    let Some(session) = session.as_ref() else {
        return DashboardViewResponse::closed();
    };

    let view = session.page.view();
    DashboardViewResponse {
        ok: true,
        loading: view.loading,
        sync_error: view.sync_error,
        search_query: view.search_query,
        rows: view.rows.into_iter().map(StudentRowItem::from).collect(),
        empty_message: view.empty_message.map(str::to_string),
        total_count: u32::try_from(view.total_count).unwrap_or(u32::MAX),
        form_open: view.form_open,
        message: String::new(),
    }
}

/// Replaces the search text.
#[flutter_rust_bridge::frb(sync)]
pub fn dashboard_set_search(query: String) -> DashboardActionResponse {
    with_page("dashboard_set_search", |page| {
        page.set_search_query(query);
        Ok(DashboardActionResponse::success("Search updated."))
    })
}

/// Reopens the live list after a sync failure.
#[flutter_rust_bridge::frb(sync)]
pub fn dashboard_retry_sync() -> DashboardActionResponse {
    with_page("dashboard_retry_sync", |page| {
        page.retry_sync()?;
        Ok(DashboardActionResponse::success("Sync restarted."))
    })
}

/// Opens the "Add Student" modal if closed, closes it if open.
#[flutter_rust_bridge::frb(sync)]
pub fn dashboard_toggle_form() -> DashboardActionResponse {
    with_page("dashboard_toggle_form", |page| {
        page.toggle_form()?;
        let message = if page.is_form_open() {
            "Form opened."
        } else {
            "Form closed."
        };
        Ok(DashboardActionResponse::success(message))
    })
}

/// Routes a document pointer-down to the outside-click listener.
///
/// # FFI contract
/// - `ok=false` only when no dashboard is open.
/// - `closed` reports whether the click dismissed the modal.
#[flutter_rust_bridge::frb(sync)]
pub fn dashboard_pointer_down(inside_form: bool) -> PointerDownResponse {
    let target = if inside_form {
        ClickTarget::InsideForm
    } else {
        ClickTarget::Outside
    };
    let mut session = lock_dashboard();
    let Some(session) = session.as_mut() else {
        return PointerDownResponse {
            ok: false,
            closed: false,
            message: "dashboard_pointer_down failed: dashboard is not open".to_string(),
        };
    };

    let closed = session.page.on_pointer_down(target);
    PointerDownResponse {
        ok: true,
        closed,
        message: if closed { "Form closed." } else { "Click ignored." }.to_string(),
    }
}

/// Returns class and gender options for the open form.
#[flutter_rust_bridge::frb(sync)]
pub fn form_options() -> FormOptionsResponse {
    let session = lock_dashboard();
    let form = session
        .as_ref()
        .and_then(|session| session.page.form())
        .map(|form| {
            (
                form.class_options()
                    .iter()
                    .map(|room| room.class_name.clone())
                    .collect::<Vec<_>>(),
                form.gender_options(),
            )
        });

    match form {
        Some((classes, genders)) => FormOptionsResponse {
            ok: true,
            classes,
            genders: genders.iter().map(|gender| gender_option(*gender)).collect(),
            message: String::new(),
        },
        None => FormOptionsResponse {
            ok: false,
            classes: Vec::new(),
            genders: Vec::new(),
            message: "student form is not open".to_string(),
        },
    }
}

/// Records one input change by field name (`fullName`, `email`, ...).
#[flutter_rust_bridge::frb(sync)]
pub fn form_set_field(name: String, value: String) -> DashboardActionResponse {
    with_page("form_set_field", |page| {
        page.set_form_field(&name, value)?;
        Ok(DashboardActionResponse::success("Field updated."))
    })
}

/// Submits the open form.
///
/// # FFI contract
/// - Input errors return `ok=false` and keep the modal open.
/// - Store failures return `ok=false` with the failure notice as message.
#[flutter_rust_bridge::frb(sync)]
pub fn form_submit() -> DashboardActionResponse {
    with_page("form_submit", |page| {
        let outcome = page.submit_form()?;
        let notice = outcome.notice();
        Ok(match outcome {
            SubmitOutcome::Saved { id } => DashboardActionResponse {
                student_id: Some(id),
                ..DashboardActionResponse::success(notice)
            },
            SubmitOutcome::Failed { .. } => DashboardActionResponse::failure(notice),
        })
    })
}

/// Writes the full snapshot to `students.csv` in the export directory.
#[flutter_rust_bridge::frb(sync)]
pub fn dashboard_export_csv() -> DashboardActionResponse {
    let mut session = lock_dashboard();
    let Some(session) = session.as_mut() else {
        return DashboardActionResponse::failure(
            "dashboard_export_csv failed: dashboard is not open",
        );
    };

    match session.page.export_csv(&session.export_sink) {
        Ok(path) => DashboardActionResponse {
            path: Some(path.display().to_string()),
            ..DashboardActionResponse::success("Export saved.")
        },
        Err(err) => DashboardActionResponse::failure(format!("dashboard_export_csv failed: {err}")),
    }
}

/// Drains queued alerts in the order they were raised.
#[flutter_rust_bridge::frb(sync)]
pub fn dashboard_take_notices() -> Vec<NoticeItem> {
    let mut session = lock_dashboard();
    let Some(session) = session.as_mut() else {
        return Vec::new();
    };
    session
        .page
        .take_notices()
        .into_iter()
        .map(|notice| NoticeItem {
            kind: match notice.kind {
                NoticeKind::Success => "success",
                NoticeKind::Failure => "failure",
            }
            .to_string(),
            message: notice.message,
        })
        .collect()
}

/// Tears the dashboard down. Safe to call when nothing is open.
#[flutter_rust_bridge::frb(sync)]
pub fn dashboard_close() -> DashboardActionResponse {
    let closed = lock_dashboard().take();
    match closed {
        Some(mut session) => {
            session.page.teardown();
            DashboardActionResponse::success("Dashboard closed.")
        }
        None => DashboardActionResponse::success("Dashboard was not open."),
    }
}

fn resolve_config() -> &'static DeskConfig {
    DESK_CONFIG.get_or_init(DeskConfig::from_env)
}

fn open_session(config: &DeskConfig, identity_blob: Option<String>) -> DashboardOpenResponse {
    // Replace semantics: the previous page unsubscribes before the new one enters.
    if let Some(mut previous) = lock_dashboard().take() {
        previous.page.teardown();
    }

    let collection = match SqliteStudentCollection::open(&config.db_path) {
        Ok(collection) => Arc::new(collection),
        Err(err) => return open_failure(format!("dashboard_open failed: {err}")),
    };
    let roster: Arc<dyn ClassRoster + Send + Sync> = match SqliteClassRoster::open(&config.db_path)
    {
        Ok(roster) => Arc::new(roster),
        Err(err) => return open_failure(format!("dashboard_open failed: {err}")),
    };

    let identity = StoredIdentity::new(identity_blob);
    match DashboardPage::enter(&identity, collection, roster) {
        PageEntry::Redirect { to } => DashboardOpenResponse {
            ok: false,
            redirect_to: Some(to.to_string()),
            message: "No signed-in identity.".to_string(),
        },
        PageEntry::Ready(page) => {
            *lock_dashboard() = Some(DashboardSession {
                page,
                export_sink: DirectoryDownloadSink::new(config.export_dir.clone()),
            });
            info!("event=ffi_dashboard_open module=ffi status=ok");
            DashboardOpenResponse {
                ok: true,
                redirect_to: None,
                message: "Dashboard opened.".to_string(),
            }
        }
    }
}

fn open_failure(message: String) -> DashboardOpenResponse {
    warn!("event=ffi_dashboard_open module=ffi status=error");
    DashboardOpenResponse {
        ok: false,
        redirect_to: None,
        message,
    }
}

fn with_page(
    action: &str,
    f: impl FnOnce(
        &mut DashboardPage<SqliteStudentCollection>,
    ) -> Result<DashboardActionResponse, PageError>,
) -> DashboardActionResponse {
    let mut session = lock_dashboard();
    let Some(session) = session.as_mut() else {
        return DashboardActionResponse::failure(format!("{action} failed: dashboard is not open"));
    };
    match f(&mut session.page) {
        Ok(response) => response,
        Err(err) => DashboardActionResponse::failure(format!("{action} failed: {err}")),
    }
}

fn lock_dashboard() -> MutexGuard<'static, Option<DashboardSession>> {
    DASHBOARD
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn gender_option(gender: Gender) -> (String, String) {
    (gender.as_str().to_string(), gender.label().to_string())
}

#[cfg(test)]
mod tests {
    use super::{
        core_version, dashboard_close, dashboard_export_csv, dashboard_pointer_down,
        dashboard_set_search, dashboard_take_notices, dashboard_tick, dashboard_toggle_form,
        dashboard_view, form_options, form_set_field, form_submit, init_logging, open_session,
        ping,
    };
    use std::sync::Mutex;
    use studentdesk_core::db::open_db;
    use studentdesk_core::{DeskConfig, LOGIN_ROUTE, SAVE_FAILURE_NOTICE, SAVE_SUCCESS_NOTICE};

    // The dashboard session is process-global; tests take turns.
    static SESSION_GUARD: Mutex<()> = Mutex::new(());

    fn temp_config(dir: &tempfile::TempDir) -> DeskConfig {
        DeskConfig {
            db_path: dir.path().join("desk.sqlite3"),
            log_dir: dir.path().join("logs"),
            log_level: "info".to_string(),
            export_dir: dir.path().join("exports"),
        }
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn open_without_identity_redirects_to_login() {
        let _guard = SESSION_GUARD.lock().unwrap_or_else(|p| p.into_inner());
        let dir = tempfile::tempdir().unwrap();

        let response = open_session(&temp_config(&dir), None);
        assert!(!response.ok);
        assert_eq!(response.redirect_to.as_deref(), Some(LOGIN_ROUTE));
        assert!(!dashboard_view().ok);
    }

    #[test]
    fn commands_fail_softly_when_dashboard_is_closed() {
        let _guard = SESSION_GUARD.lock().unwrap_or_else(|p| p.into_inner());
        dashboard_close();

        assert_eq!(dashboard_tick(), 0);
        assert!(!dashboard_set_search("x".to_string()).ok);
        assert!(!form_submit().ok);
        assert!(dashboard_take_notices().is_empty());
        assert!(dashboard_close().ok);
    }

    #[test]
    fn add_student_flow_updates_view_and_exports() {
        let _guard = SESSION_GUARD.lock().unwrap_or_else(|p| p.into_inner());
        let dir = tempfile::tempdir().unwrap();

        let opened = open_session(&temp_config(&dir), Some(r#"{"uid":"t-1"}"#.to_string()));
        assert!(opened.ok, "{}", opened.message);
        assert!(dashboard_view().loading);
        assert_eq!(dashboard_tick(), 1);
        let view = dashboard_view();
        assert!(!view.loading);
        assert_eq!(view.empty_message.as_deref(), Some("No students found!"));

        assert!(dashboard_toggle_form().ok);
        let options = form_options();
        assert!(options.classes.contains(&"5A".to_string()));
        assert_eq!(options.genders[0], ("male".to_string(), "Male".to_string()));

        for (name, value) in [
            ("fullName", "Sam"),
            ("email", "s@x.com"),
            ("class", "5A"),
            ("gender", "male"),
            ("phoneNumber", "12345"),
        ] {
            let response = form_set_field(name.to_string(), value.to_string());
            assert!(response.ok, "{}", response.message);
        }
        let submitted = form_submit();
        assert!(submitted.ok, "{}", submitted.message);
        assert!(submitted.student_id.is_some());
        assert_eq!(submitted.message, SAVE_SUCCESS_NOTICE);

        let notices = dashboard_take_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].kind, "success");

        assert_eq!(dashboard_tick(), 1);
        let view = dashboard_view();
        assert_eq!(view.rows.len(), 1);
        assert_eq!(view.rows[0].name, "Sam");
        assert!(!view.form_open);

        let exported = dashboard_export_csv();
        assert!(exported.ok, "{}", exported.message);
        let path = exported.path.expect("export path");
        assert!(path.ends_with("students.csv"));

        assert!(dashboard_close().ok);
        assert!(!dashboard_view().ok);
    }

    #[test]
    fn failed_submit_reports_failure_and_keeps_form_open() {
        let _guard = SESSION_GUARD.lock().unwrap_or_else(|p| p.into_inner());
        let dir = tempfile::tempdir().unwrap();
        let config = temp_config(&dir);
        open_db(&config.db_path)
            .unwrap()
            .execute_batch(
                "CREATE TRIGGER reject_students BEFORE INSERT ON students
                 BEGIN SELECT RAISE(ABORT, 'students are read-only'); END;",
            )
            .unwrap();

        assert!(open_session(&config, Some("{}".to_string())).ok);
        dashboard_tick();
        assert!(dashboard_toggle_form().ok);
        for (name, value) in [
            ("fullName", "Sam"),
            ("email", "s@x.com"),
            ("class", "5A"),
            ("gender", "male"),
            ("phoneNumber", "12345"),
        ] {
            assert!(form_set_field(name.to_string(), value.to_string()).ok);
        }

        let submitted = form_submit();
        assert!(!submitted.ok);
        assert_eq!(submitted.student_id, None);
        assert_eq!(submitted.message, SAVE_FAILURE_NOTICE);

        let notices = dashboard_take_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].kind, "failure");
        assert!(dashboard_view().form_open);
        assert!(form_options().ok);

        assert_eq!(dashboard_tick(), 0);
        assert_eq!(dashboard_view().total_count, 0);
        dashboard_close();
    }

    #[test]
    fn outside_pointer_down_closes_open_form() {
        let _guard = SESSION_GUARD.lock().unwrap_or_else(|p| p.into_inner());
        let dir = tempfile::tempdir().unwrap();
        assert!(open_session(&temp_config(&dir), Some("{}".to_string())).ok);

        assert!(dashboard_toggle_form().ok);
        let inside = dashboard_pointer_down(true);
        assert!(inside.ok);
        assert!(!inside.closed);
        assert!(dashboard_view().form_open);

        let outside = dashboard_pointer_down(false);
        assert!(outside.ok);
        assert!(outside.closed);
        assert!(!dashboard_view().form_open);

        // With the modal closed the click succeeds but closes nothing.
        let idle = dashboard_pointer_down(false);
        assert!(idle.ok);
        assert!(!idle.closed);

        dashboard_close();
        assert!(!dashboard_pointer_down(false).ok);
    }
}
