//! Student dashboard page.
//!
//! # Responsibility
//! - Gate rendering on a present session identity.
//! - Keep the live list subscription open for the page lifetime.
//! - Wire search, export and the "Add Student" modal to their controllers.
//!
//! # Invariants
//! - Exactly one outside-click listener is attached while the modal is open,
//!   and none otherwise.
//! - Export always uses the full canonical snapshot, never the search view.
//! - Teardown is idempotent and also runs on drop.

use crate::dashboard::listeners::{DocumentEvent, DocumentListeners, ListenerId};
use crate::export::csv::{export_students, DownloadSink, ExportError};
use crate::form::record_form::{FormError, RecordFormController, SubmitOutcome};
use crate::model::student::StudentRecord;
use crate::roster::ClassRoster;
use crate::search::filter::filter_records;
use crate::session::{IdentitySource, SessionIdentity, LOGIN_ROUTE};
use crate::store::{RemoteCollection, StoreError};
use crate::sync::list_sync::ListSyncController;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::sync::Arc;

/// Empty-state text shown when no row survives the search.
pub const EMPTY_TABLE_MESSAGE: &str = "No students found!";

/// Result of entering the page.
pub enum PageEntry<C: RemoteCollection> {
    /// No identity present; navigate away and render nothing.
    Redirect { to: &'static str },
    Ready(DashboardPage<C>),
}

impl<C: RemoteCollection> PageEntry<C> {
    pub fn into_page(self) -> Option<DashboardPage<C>> {
        match self {
            Self::Ready(page) => Some(page),
            Self::Redirect { .. } => None,
        }
    }
}

#[derive(Debug)]
pub enum PageError {
    /// The page was torn down; no further actions are accepted.
    TornDown,
    /// A form action arrived while the modal is closed.
    FormClosed,
    Form(FormError),
    Export(ExportError),
    Store(StoreError),
}

impl Display for PageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TornDown => write!(f, "dashboard page is torn down"),
            Self::FormClosed => write!(f, "student form is not open"),
            Self::Form(err) => write!(f, "{err}"),
            Self::Export(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for PageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::TornDown | Self::FormClosed => None,
            Self::Form(err) => Some(err),
            Self::Export(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<FormError> for PageError {
    fn from(value: FormError) -> Self {
        Self::Form(value)
    }
}

impl From<ExportError> for PageError {
    fn from(value: ExportError) -> Self {
        Self::Export(value)
    }
}

impl From<StoreError> for PageError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

pub type PageResult<T> = Result<T, PageError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Failure,
}

/// Blocking alert-style message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

/// Where a pointer-down landed relative to the open modal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    InsideForm,
    Outside,
}

/// One rendered table row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardRow {
    pub id: String,
    pub name: String,
    pub avatar: String,
    pub subject: String,
    pub class_name: String,
    pub email: String,
    pub gender: String,
    pub contact: String,
}

impl From<&StudentRecord> for DashboardRow {
    fn from(record: &StudentRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            avatar: record.avatar().to_string(),
            subject: record.subject.clone(),
            class_name: record.class_name.clone(),
            email: record.email.clone(),
            gender: record.gender.clone(),
            contact: record.contact.clone(),
        }
    }
}

/// Render model for one frame of the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardView {
    pub loading: bool,
    pub sync_error: Option<String>,
    pub search_query: String,
    pub rows: Vec<DashboardRow>,
    /// Set when the table has no rows and loading is over.
    pub empty_message: Option<&'static str>,
    pub total_count: usize,
    pub form_open: bool,
}

/// Dashboard page instance bound to one collection.
pub struct DashboardPage<C: RemoteCollection> {
    identity: SessionIdentity,
    collection: Arc<C>,
    roster: Arc<dyn ClassRoster + Send + Sync>,
    sync: ListSyncController,
    search_query: String,
    form: Option<RecordFormController>,
    listeners: DocumentListeners,
    outside_click: Option<ListenerId>,
    notices: Vec<Notice>,
    torn_down: bool,
}

impl<C: RemoteCollection> DashboardPage<C> {
    /// Enters the page: checks identity, then opens the live list.
    ///
    /// A subscription failure does not prevent entry; it is surfaced through
    /// [`DashboardView::sync_error`] and can be retried.
    pub fn enter(
        identity_source: &dyn IdentitySource,
        collection: Arc<C>,
        roster: Arc<dyn ClassRoster + Send + Sync>,
    ) -> PageEntry<C> {
        let Some(identity) = identity_source.identity() else {
            info!("event=dashboard_enter module=dashboard status=redirect to={LOGIN_ROUTE}");
            return PageEntry::Redirect { to: LOGIN_ROUTE };
        };

        let mut page = Self {
            identity,
            collection,
            roster,
            sync: ListSyncController::new(),
            search_query: String::new(),
            form: None,
            listeners: DocumentListeners::new(),
            outside_click: None,
            notices: Vec::new(),
            torn_down: false,
        };
        if let Err(err) = page.sync.activate(page.collection.as_ref()) {
            warn!("event=dashboard_enter module=dashboard status=degraded error={err}");
        } else {
            info!("event=dashboard_enter module=dashboard status=ok");
        }
        PageEntry::Ready(page)
    }

    pub fn identity(&self) -> &SessionIdentity {
        &self.identity
    }

    pub fn collection(&self) -> &Arc<C> {
        &self.collection
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    /// Updates the search text; the view is re-derived on next read.
    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
    }

    /// Canonical snapshot held by the list controller.
    pub fn records(&self) -> Arc<[StudentRecord]> {
        self.sync.records()
    }

    /// Snapshot filtered by the current search text.
    pub fn visible_records(&self) -> Vec<StudentRecord> {
        filter_records(&self.sync.records(), &self.search_query)
    }

    pub fn is_loading(&self) -> bool {
        self.sync.is_loading()
    }

    pub fn sync_error(&self) -> Option<String> {
        self.sync.error()
    }

    pub fn sync(&self) -> &ListSyncController {
        &self.sync
    }

    /// Reopens the live list after a subscription failure.
    pub fn retry_sync(&mut self) -> PageResult<()> {
        self.ensure_alive()?;
        self.sync.retry(self.collection.as_ref())?;
        Ok(())
    }

    pub fn is_form_open(&self) -> bool {
        self.form.is_some()
    }

    pub fn form(&self) -> Option<&RecordFormController> {
        self.form.as_ref()
    }

    /// Opens the modal if closed, closes it if open.
    pub fn toggle_form(&mut self) -> PageResult<()> {
        if self.is_form_open() {
            self.close_form();
            Ok(())
        } else {
            self.open_form()
        }
    }

    /// Opens the "Add Student" modal with a fresh form.
    ///
    /// Class options are loaded from the roster on every open; a roster
    /// failure leaves the class selector empty.
    pub fn open_form(&mut self) -> PageResult<()> {
        self.ensure_alive()?;
        if self.is_form_open() {
            return Ok(());
        }

        let class_options = match self.roster.list() {
            Ok(options) => options,
            Err(err) => {
                warn!("event=form_open module=dashboard status=degraded error={err}");
                Vec::new()
            }
        };
        self.form = Some(RecordFormController::new(class_options));
        self.outside_click = Some(self.listeners.add(DocumentEvent::PointerDown));
        Ok(())
    }

    /// Closes the modal and detaches its outside-click listener.
    pub fn close_form(&mut self) {
        self.form = None;
        if let Some(id) = self.outside_click.take() {
            self.listeners.remove(id);
        }
    }

    /// Records one input change in the open form.
    pub fn set_form_field(&mut self, name: &str, value: impl Into<String>) -> PageResult<()> {
        self.open_form_mut()?.set_field_by_name(name, value)?;
        Ok(())
    }

    /// Submits the open form against the collection.
    ///
    /// Success closes the modal; failure keeps it open with fields intact.
    /// Either way a notice is queued. Input errors queue nothing.
    pub fn submit_form(&mut self) -> PageResult<SubmitOutcome> {
        self.ensure_alive()?;
        let collection = Arc::clone(&self.collection);
        let outcome = self.open_form_mut()?.submit(collection.as_ref())?;

        let kind = if outcome.should_close() {
            NoticeKind::Success
        } else {
            NoticeKind::Failure
        };
        self.notices.push(Notice {
            kind,
            message: outcome.notice().to_string(),
        });
        if outcome.should_close() {
            self.close_form();
        }
        Ok(outcome)
    }

    /// Dispatches a document pointer-down. Returns `true` when it closed the
    /// modal.
    pub fn on_pointer_down(&mut self, target: ClickTarget) -> bool {
        let Some(id) = self.outside_click else {
            return false;
        };
        if !self.listeners.is_attached(id) || target == ClickTarget::InsideForm {
            return false;
        }
        self.close_form();
        true
    }

    pub fn listeners(&self) -> &DocumentListeners {
        &self.listeners
    }

    /// Exports the full canonical snapshot as `students.csv`.
    pub fn export_csv<S: DownloadSink + ?Sized>(&self, sink: &S) -> PageResult<PathBuf> {
        self.ensure_alive()?;
        let snapshot = self.sync.records();
        Ok(export_students(&snapshot, sink)?)
    }

    /// Drains queued notices in the order they were raised.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn view(&self) -> DashboardView {
        let loading = self.sync.is_loading();
        let snapshot = self.sync.records();
        let rows = filter_records(&snapshot, &self.search_query)
            .iter()
            .map(DashboardRow::from)
            .collect::<Vec<_>>();
        let empty_message = if !loading && rows.is_empty() {
            Some(EMPTY_TABLE_MESSAGE)
        } else {
            None
        };

        DashboardView {
            loading,
            sync_error: self.sync.error(),
            search_query: self.search_query.clone(),
            rows,
            empty_message,
            total_count: snapshot.len(),
            form_open: self.is_form_open(),
        }
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Closes the subscription and detaches listeners. Safe to repeat.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.close_form();
        self.sync.deactivate();
        self.torn_down = true;
        info!("event=dashboard_teardown module=dashboard status=ok");
    }

    fn ensure_alive(&self) -> PageResult<()> {
        if self.torn_down {
            return Err(PageError::TornDown);
        }
        Ok(())
    }

    fn open_form_mut(&mut self) -> PageResult<&mut RecordFormController> {
        self.ensure_alive()?;
        self.form.as_mut().ok_or(PageError::FormClosed)
    }
}

impl<C: RemoteCollection> Drop for DashboardPage<C> {
    fn drop(&mut self) {
        self.teardown();
    }
}

