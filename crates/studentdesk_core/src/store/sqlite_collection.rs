//! SQLite-backed live student collection.
//!
//! # Responsibility
//! - Persist student documents and assign `id` / `timestamp` on insert.
//! - Serve live ordered subscriptions through a notification queue that the
//!   host event loop drains with [`SqliteStudentCollection::flush_notifications`].
//!
//! # Invariants
//! - Assigned timestamps never decrease relative to the newest stored row.
//! - Notifications are delivered in enqueue order; each carries a fresh query.
//! - No listener callback runs while the connection or hub lock is held.

use crate::db::{open_db, open_db_in_memory};
use crate::model::student::{NewStudentDocument, StudentId, StudentRecord};
use crate::store::{
    lock, RemoteCollection, SnapshotEvent, SnapshotListener, SnapshotOrder, SortDirection,
    StoreError, StoreResult, SubscriptionHandle,
};
use log::{debug, info, warn};
use rusqlite::{params, Connection, Row};
use std::collections::{BTreeMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex, Weak};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

const STUDENT_SELECT_SQL: &str = "SELECT
    id,
    name,
    email,
    class,
    gender,
    subject,
    contact,
    year_joined,
    img,
    timestamp
FROM students";

type SharedListener = Arc<Mutex<SnapshotListener>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Notice {
    InitialLoad(u64),
    Changed,
}

#[derive(Default)]
struct SubscriptionHub {
    next_id: u64,
    listeners: BTreeMap<u64, (SnapshotOrder, SharedListener)>,
    pending: VecDeque<Notice>,
}

impl SubscriptionHub {
    fn remove(&mut self, id: u64) -> bool {
        self.pending.retain(|notice| *notice != Notice::InitialLoad(id));
        self.listeners.remove(&id).is_some()
    }
}

/// Student collection stored in one SQLite connection.
pub struct SqliteStudentCollection {
    conn: Mutex<Connection>,
    hub: Arc<Mutex<SubscriptionHub>>,
}

impl SqliteStudentCollection {
    /// Wraps a connection that already has migrations applied.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            hub: Arc::new(Mutex::new(SubscriptionHub::default())),
        }
    }

    /// Opens (and migrates) a database file.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Ok(Self::new(open_db(path)?))
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self::new(open_db_in_memory()?))
    }

    /// Number of open live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        lock(&self.hub).listeners.len()
    }

    /// Number of queued, undelivered notifications.
    pub fn pending_notifications(&self) -> usize {
        lock(&self.hub).pending.len()
    }

    /// One-shot ordered read, outside any subscription.
    pub fn list(&self, order: SnapshotOrder) -> StoreResult<Vec<StudentRecord>> {
        self.materialize(order)
    }

    /// Delivers every queued notification in order and returns how many
    /// listener callbacks ran.
    ///
    /// Notifications queued by callbacks during the flush are delivered in the
    /// same call.
    pub fn flush_notifications(&self) -> usize {
        let mut delivered = 0;
        loop {
            let (notice, targets) = {
                let mut hub = lock(&self.hub);
                let Some(notice) = hub.pending.pop_front() else {
                    break;
                };
                let targets: Vec<(SnapshotOrder, SharedListener)> = match notice {
                    Notice::InitialLoad(id) => {
                        hub.listeners.get(&id).cloned().into_iter().collect()
                    }
                    Notice::Changed => hub.listeners.values().cloned().collect(),
                };
                (notice, targets)
            };

            for (order, listener) in targets {
                let event = match self.materialize(order) {
                    Ok(records) => SnapshotEvent::Snapshot(records),
                    Err(err) => {
                        warn!(
                            "event=snapshot_materialize module=store status=error error={}",
                            err
                        );
                        SnapshotEvent::Failed(StoreError::Snapshot(err.to_string()))
                    }
                };
                let mut callback = lock(&listener);
                (*callback)(event);
                delivered += 1;
            }
            debug!("event=snapshot_flush module=store status=ok notice={notice:?}");
        }
        delivered
    }

    fn materialize(&self, order: SnapshotOrder) -> StoreResult<Vec<StudentRecord>> {
        let direction = match order.direction {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        };
        let conn = lock(&self.conn);
        let mut stmt = conn.prepare(&format!(
            "{STUDENT_SELECT_SQL} ORDER BY timestamp {direction}, rowid {direction};"
        ))?;
        let mut rows = stmt.query([])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_student_row(row)?);
        }
        Ok(records)
    }
}

impl RemoteCollection for SqliteStudentCollection {
    fn subscribe(
        &self,
        order: SnapshotOrder,
        listener: SnapshotListener,
    ) -> StoreResult<SubscriptionHandle> {
        let id = {
            let mut hub = lock(&self.hub);
            hub.next_id += 1;
            let id = hub.next_id;
            hub.listeners.insert(id, (order, Arc::new(Mutex::new(listener))));
            hub.pending.push_back(Notice::InitialLoad(id));
            id
        };
        info!("event=subscribe module=store status=ok subscription_id={id}");

        let hub: Weak<Mutex<SubscriptionHub>> = Arc::downgrade(&self.hub);
        Ok(SubscriptionHandle::new(id, move || {
            let Some(hub) = hub.upgrade() else {
                return;
            };
            if lock(&hub).remove(id) {
                info!("event=unsubscribe module=store status=ok subscription_id={id}");
            }
        }))
    }

    fn insert(&self, document: &NewStudentDocument) -> StoreResult<StudentId> {
        validate_document(document)?;

        let id = Uuid::new_v4().to_string();
        let timestamp = {
            let mut conn = lock(&self.conn);
            let tx = conn.transaction()?;
            let newest: i64 = tx.query_row(
                "SELECT COALESCE(MAX(timestamp), 0) FROM students;",
                [],
                |row| row.get(0),
            )?;
            let timestamp = now_epoch_ms().max(newest);
            tx.execute(
                "INSERT INTO students (
                    id,
                    name,
                    email,
                    class,
                    gender,
                    subject,
                    contact,
                    timestamp
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
                params![
                    id.as_str(),
                    document.name.as_str(),
                    document.email.as_str(),
                    document.class_name.as_str(),
                    document.gender.as_str(),
                    document.subject.as_str(),
                    document.contact.as_str(),
                    timestamp,
                ],
            )?;
            tx.commit()?;
            timestamp
        };

        {
            let mut hub = lock(&self.hub);
            if !hub.listeners.is_empty() {
                hub.pending.push_back(Notice::Changed);
            }
        }
        info!("event=student_insert module=store status=ok student_id={id} timestamp={timestamp}");
        Ok(id)
    }
}

fn validate_document(document: &NewStudentDocument) -> StoreResult<()> {
    for (field, value) in [
        ("name", &document.name),
        ("email", &document.email),
        ("class", &document.class_name),
        ("contact", &document.contact),
    ] {
        if value.trim().is_empty() {
            return Err(StoreError::Rejected(format!("`{field}` is required")));
        }
    }
    Ok(())
}

fn parse_student_row(row: &Row<'_>) -> StoreResult<StudentRecord> {
    let id: String = row.get("id")?;
    if id.is_empty() {
        return Err(StoreError::InvalidData("empty id in students.id".to_string()));
    }

    Ok(StudentRecord {
        id,
        name: row.get("name")?,
        email: row.get("email")?,
        class_name: row.get("class")?,
        gender: row.get("gender")?,
        subject: row.get::<_, Option<String>>("subject")?.unwrap_or_default(),
        contact: row.get("contact")?,
        year_joined: row.get("year_joined")?,
        img: row.get("img")?,
        timestamp: row.get("timestamp")?,
    })
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
