//! Live student collection contracts.
//!
//! # Responsibility
//! - Define the collection capability consumed by the dashboard: live ordered
//!   subscriptions and document insertion.
//! - Own subscription handle semantics shared by every implementation.
//!
//! # Invariants
//! - Every delivered snapshot is a complete, freshly ordered materialization.
//! - A handle closes its subscription at most once; later calls are no-ops.
//! - `id` and `timestamp` are assigned by the collection, never by callers.

use crate::db::DbError;
use crate::model::student::{NewStudentDocument, StudentId, StudentRecord};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, MutexGuard, PoisonError};

pub mod sqlite_collection;

pub type StoreResult<T> = Result<T, StoreError>;

/// Collection-level error for subscriptions and writes.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    /// Document rejected by the collection before persistence.
    Rejected(String),
    /// Persisted row cannot be decoded into a record.
    InvalidData(String),
    /// Snapshot materialization failed for a live subscription.
    Snapshot(String),
    /// Collection can no longer serve requests.
    Unavailable(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Rejected(message) => write!(f, "document rejected: {message}"),
            Self::InvalidData(message) => write!(f, "invalid persisted student data: {message}"),
            Self::Snapshot(message) => write!(f, "snapshot failed: {message}"),
            Self::Unavailable(message) => write!(f, "collection unavailable: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Rejected(_) | Self::InvalidData(_) | Self::Snapshot(_) | Self::Unavailable(_) => {
                None
            }
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Query(value))
    }
}

/// Field a live query is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderKey {
    Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Ordering requested by a live subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotOrder {
    pub key: OrderKey,
    pub direction: SortDirection,
}

impl SnapshotOrder {
    /// `timestamp` descending: the ordering used by the dashboard table.
    pub fn newest_first() -> Self {
        Self {
            key: OrderKey::Timestamp,
            direction: SortDirection::Descending,
        }
    }
}

/// Notification delivered to a live subscription listener.
#[derive(Debug)]
pub enum SnapshotEvent {
    /// Full replacement of the matching documents, already ordered.
    Snapshot(Vec<StudentRecord>),
    /// The live query failed; the subscription stays registered.
    Failed(StoreError),
}

/// Callback receiving snapshot notifications in arrival order.
pub type SnapshotListener = Box<dyn FnMut(SnapshotEvent) + Send>;

/// Live ordered collection of student documents.
pub trait RemoteCollection {
    /// Opens a live subscription.
    ///
    /// The initial snapshot is delivered asynchronously through `listener`,
    /// followed by one snapshot per collection change.
    fn subscribe(
        &self,
        order: SnapshotOrder,
        listener: SnapshotListener,
    ) -> StoreResult<SubscriptionHandle>;

    /// Appends one document; the collection assigns `id` and `timestamp`.
    fn insert(&self, document: &NewStudentDocument) -> StoreResult<StudentId>;
}

/// Owner of one open live subscription.
///
/// Dropping the handle closes the subscription.
pub struct SubscriptionHandle {
    id: u64,
    closer: Option<Box<dyn FnOnce() + Send>>,
}

impl SubscriptionHandle {
    pub fn new(id: u64, closer: impl FnOnce() + Send + 'static) -> Self {
        Self {
            id,
            closer: Some(Box::new(closer)),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_open(&self) -> bool {
        self.closer.is_some()
    }

    /// Closes the subscription. Calling this on a closed handle is a no-op.
    pub fn unsubscribe(&mut self) {
        if let Some(closer) = self.closer.take() {
            closer();
        }
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("id", &self.id)
            .field("open", &self.is_open())
            .finish()
    }
}

/// Locks a mutex, recovering the guard when a listener panicked mid-update.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
