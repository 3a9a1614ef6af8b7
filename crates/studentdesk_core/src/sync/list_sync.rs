//! Canonical snapshot holder for the dashboard list.
//!
//! # Responsibility
//! - Open exactly one live subscription ordered newest first.
//! - Replace the held snapshot atomically on every notification.
//! - Expose loading and failure state without per-update flicker.
//!
//! # Invariants
//! - `is_loading` goes true -> false once per subscription, on the first
//!   snapshot or failure.
//! - After teardown no notification is applied, including ones already queued.
//! - Readers get `Arc<[StudentRecord]>` views that cannot alias mutable state.

use crate::model::student::StudentRecord;
use crate::store::{
    lock, RemoteCollection, SnapshotEvent, SnapshotOrder, StoreResult, SubscriptionHandle,
};
use log::{debug, error, info};
use std::sync::{Arc, Mutex, Weak};

/// Lifecycle of the list subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncPhase {
    /// Never activated.
    Idle,
    /// Subscribed, waiting for the first snapshot.
    Loading,
    /// At least one snapshot applied.
    Ready,
    /// The live query failed; the last good snapshot is kept.
    Failed { message: String },
    /// Torn down.
    Closed,
}

struct SyncState {
    records: Arc<[StudentRecord]>,
    phase: SyncPhase,
    generation: u64,
    snapshots_applied: u64,
}

/// Owner of the live student subscription and its canonical snapshot.
pub struct ListSyncController {
    state: Arc<Mutex<SyncState>>,
    subscription: Option<SubscriptionHandle>,
}

impl Default for ListSyncController {
    fn default() -> Self {
        Self::new()
    }
}

impl ListSyncController {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SyncState {
                records: Arc::from(Vec::new()),
                phase: SyncPhase::Idle,
                generation: 0,
                snapshots_applied: 0,
            })),
            subscription: None,
        }
    }

    /// Opens the live subscription.
    ///
    /// No-op when a subscription is already open.
    ///
    /// # Errors
    /// - Returns the collection error when subscribing fails; the controller
    ///   moves to `Failed` so loading never stays stuck.
    pub fn activate<C: RemoteCollection + ?Sized>(&mut self, collection: &C) -> StoreResult<()> {
        if self.is_active() {
            return Ok(());
        }

        let generation = {
            let mut state = lock(&self.state);
            state.generation += 1;
            state.phase = SyncPhase::Loading;
            state.generation
        };

        let weak_state: Weak<Mutex<SyncState>> = Arc::downgrade(&self.state);
        let listener = Box::new(move |event: SnapshotEvent| {
            if let Some(state) = weak_state.upgrade() {
                apply_event(&state, generation, event);
            }
        });

        match collection.subscribe(SnapshotOrder::newest_first(), listener) {
            Ok(handle) => {
                info!(
                    "event=list_sync_activate module=sync status=ok subscription_id={} generation={}",
                    handle.id(),
                    generation
                );
                self.subscription = Some(handle);
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=list_sync_activate module=sync status=error generation={} error={}",
                    generation, err
                );
                lock(&self.state).phase = SyncPhase::Failed {
                    message: err.to_string(),
                };
                Err(err)
            }
        }
    }

    /// Closes the current subscription and opens a fresh one.
    pub fn retry<C: RemoteCollection + ?Sized>(&mut self, collection: &C) -> StoreResult<()> {
        self.close_subscription();
        self.activate(collection)
    }

    /// Tears the subscription down. Safe to call repeatedly.
    pub fn deactivate(&mut self) {
        let was_open = self.close_subscription();
        let mut state = lock(&self.state);
        if state.phase == SyncPhase::Closed {
            return;
        }
        state.phase = SyncPhase::Closed;
        if was_open {
            info!("event=list_sync_deactivate module=sync status=ok");
        }
    }

    /// Current canonical snapshot.
    pub fn records(&self) -> Arc<[StudentRecord]> {
        Arc::clone(&lock(&self.state).records)
    }

    pub fn is_loading(&self) -> bool {
        lock(&self.state).phase == SyncPhase::Loading
    }

    pub fn phase(&self) -> SyncPhase {
        lock(&self.state).phase.clone()
    }

    /// User-visible failure message, if the live query failed.
    pub fn error(&self) -> Option<String> {
        match &lock(&self.state).phase {
            SyncPhase::Failed { message } => Some(message.clone()),
            _ => None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.subscription
            .as_ref()
            .is_some_and(SubscriptionHandle::is_open)
    }

    /// Number of snapshots applied since construction.
    pub fn snapshots_applied(&self) -> u64 {
        lock(&self.state).snapshots_applied
    }

    fn close_subscription(&mut self) -> bool {
        // Bumping the generation drops notifications already in flight for
        // the closed subscription.
        lock(&self.state).generation += 1;
        match self.subscription.take() {
            Some(mut handle) => {
                let was_open = handle.is_open();
                handle.unsubscribe();
                was_open
            }
            None => false,
        }
    }
}

impl Drop for ListSyncController {
    fn drop(&mut self) {
        self.deactivate();
    }
}

fn apply_event(state: &Mutex<SyncState>, generation: u64, event: SnapshotEvent) {
    let mut state = lock(state);
    if state.generation != generation || state.phase == SyncPhase::Closed {
        debug!("event=snapshot_apply module=sync status=skipped reason=stale generation={generation}");
        return;
    }

    match event {
        SnapshotEvent::Snapshot(records) => {
            let count = records.len();
            state.records = Arc::from(records);
            state.phase = SyncPhase::Ready;
            state.snapshots_applied += 1;
            debug!("event=snapshot_apply module=sync status=ok record_count={count}");
        }
        SnapshotEvent::Failed(err) => {
            error!("event=snapshot_apply module=sync status=error error={err}");
            state.phase = SyncPhase::Failed {
                message: err.to_string(),
            };
        }
    }
}
