use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use studentdesk_core::{
    ListSyncController, NewStudentDocument, RemoteCollection, SnapshotEvent, SnapshotListener,
    SnapshotOrder, StoreError, StoreResult, StudentId, StudentRecord, SubscriptionHandle,
    SyncPhase,
};

#[derive(Default)]
struct ScriptState {
    next_id: u64,
    listeners: BTreeMap<u64, SnapshotListener>,
    subscribes: usize,
    closes: usize,
    fail_subscribe: bool,
    last_order: Option<SnapshotOrder>,
}

/// Collection double driven by the test.
///
/// `emit` reaches every listener ever registered, closed or not, like
/// notifications already in flight when a subscription closes.
#[derive(Default, Clone)]
struct ScriptedCollection {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedCollection {
    fn failing() -> Self {
        let collection = Self::default();
        collection.state.lock().unwrap().fail_subscribe = true;
        collection
    }

    fn emit(&self, make_event: impl Fn() -> SnapshotEvent) {
        let mut state = self.state.lock().unwrap();
        for listener in state.listeners.values_mut() {
            listener(make_event());
        }
    }

    fn emit_snapshot(&self, records: &[StudentRecord]) {
        self.emit(|| SnapshotEvent::Snapshot(records.to_vec()));
    }

    fn subscribes(&self) -> usize {
        self.state.lock().unwrap().subscribes
    }

    fn closes(&self) -> usize {
        self.state.lock().unwrap().closes
    }
}

impl RemoteCollection for ScriptedCollection {
    fn subscribe(
        &self,
        order: SnapshotOrder,
        listener: SnapshotListener,
    ) -> StoreResult<SubscriptionHandle> {
        let mut state = self.state.lock().unwrap();
        if state.fail_subscribe {
            return Err(StoreError::Unavailable("permission denied".to_string()));
        }
        state.next_id += 1;
        state.subscribes += 1;
        state.last_order = Some(order);
        let id = state.next_id;
        state.listeners.insert(id, listener);

        let shared = Arc::clone(&self.state);
        Ok(SubscriptionHandle::new(id, move || {
            shared.lock().unwrap().closes += 1;
        }))
    }

    fn insert(&self, _document: &NewStudentDocument) -> StoreResult<StudentId> {
        Err(StoreError::Unavailable("read-only double".to_string()))
    }
}

fn record(id: &str, name: &str, timestamp: i64) -> StudentRecord {
    StudentRecord {
        id: id.to_string(),
        name: name.to_string(),
        email: format!("{}@x.com", name.to_lowercase()),
        class_name: "5A".to_string(),
        gender: "female".to_string(),
        subject: String::new(),
        contact: "555".to_string(),
        year_joined: None,
        img: None,
        timestamp,
    }
}

fn ids(controller: &ListSyncController) -> Vec<String> {
    controller
        .records()
        .iter()
        .map(|record| record.id.clone())
        .collect()
}

#[test]
fn first_snapshot_clears_loading_and_sets_records() {
    let collection = ScriptedCollection::default();
    let mut controller = ListSyncController::new();
    assert_eq!(controller.phase(), SyncPhase::Idle);

    controller.activate(&collection).unwrap();
    assert!(controller.is_loading());
    assert!(controller.records().is_empty());
    assert_eq!(
        collection.state.lock().unwrap().last_order,
        Some(SnapshotOrder::newest_first())
    );

    collection.emit_snapshot(&[record("1", "Amy", 10)]);
    assert!(!controller.is_loading());
    assert_eq!(controller.phase(), SyncPhase::Ready);
    assert_eq!(ids(&controller), vec!["1"]);
}

#[test]
fn later_snapshot_replaces_records_without_loading_flicker() {
    let collection = ScriptedCollection::default();
    let mut controller = ListSyncController::new();
    controller.activate(&collection).unwrap();
    collection.emit_snapshot(&[record("1", "Amy", 10)]);

    collection.emit_snapshot(&[record("2", "Ben", 20), record("1", "Amy", 10)]);
    assert!(!controller.is_loading());
    assert_eq!(ids(&controller), vec!["2", "1"]);
    assert_eq!(controller.snapshots_applied(), 2);
}

#[test]
fn held_views_are_not_changed_by_replacement() {
    let collection = ScriptedCollection::default();
    let mut controller = ListSyncController::new();
    controller.activate(&collection).unwrap();
    collection.emit_snapshot(&[record("1", "Amy", 10)]);

    let before = controller.records();
    collection.emit_snapshot(&[]);
    assert_eq!(before.len(), 1);
    assert!(controller.records().is_empty());
}

#[test]
fn activate_twice_keeps_a_single_subscription() {
    let collection = ScriptedCollection::default();
    let mut controller = ListSyncController::new();
    controller.activate(&collection).unwrap();
    controller.activate(&collection).unwrap();
    assert_eq!(collection.subscribes(), 1);
}

#[test]
fn teardown_is_idempotent_and_ignores_late_snapshots() {
    let collection = ScriptedCollection::default();
    let mut controller = ListSyncController::new();
    controller.activate(&collection).unwrap();
    collection.emit_snapshot(&[record("1", "Amy", 10)]);

    controller.deactivate();
    controller.deactivate();
    assert_eq!(collection.closes(), 1);
    assert_eq!(controller.phase(), SyncPhase::Closed);
    assert!(!controller.is_active());

    collection.emit_snapshot(&[record("2", "Ben", 20)]);
    assert_eq!(ids(&controller), vec!["1"]);
    assert_eq!(controller.snapshots_applied(), 1);
}

#[test]
fn dropping_controller_closes_subscription_once() {
    let collection = ScriptedCollection::default();
    let mut controller = ListSyncController::new();
    controller.activate(&collection).unwrap();
    drop(controller);
    assert_eq!(collection.closes(), 1);

    // Listener outlives the controller; emitting must not panic.
    collection.emit_snapshot(&[record("1", "Amy", 10)]);
}

#[test]
fn subscribe_failure_does_not_leave_loading_stuck() {
    let collection = ScriptedCollection::failing();
    let mut controller = ListSyncController::new();

    let err = controller.activate(&collection).unwrap_err();
    assert!(matches!(err, StoreError::Unavailable(_)));
    assert!(!controller.is_loading());
    assert!(controller
        .error()
        .expect("failure should be surfaced")
        .contains("permission denied"));
}

#[test]
fn async_failure_keeps_last_snapshot_and_retry_recovers() {
    let collection = ScriptedCollection::default();
    let mut controller = ListSyncController::new();
    controller.activate(&collection).unwrap();
    collection.emit_snapshot(&[record("1", "Amy", 10)]);

    collection.emit(|| SnapshotEvent::Failed(StoreError::Snapshot("stream reset".to_string())));
    assert!(!controller.is_loading());
    assert!(controller.error().unwrap().contains("stream reset"));
    assert_eq!(ids(&controller), vec!["1"]);

    controller.retry(&collection).unwrap();
    assert_eq!(collection.subscribes(), 2);
    assert_eq!(collection.closes(), 1);
    assert!(controller.is_loading());

    // The double reaches the old listener too; only the new one applies.
    collection.emit_snapshot(&[record("2", "Ben", 20), record("1", "Amy", 10)]);
    assert_eq!(controller.phase(), SyncPhase::Ready);
    assert_eq!(controller.error(), None);
    assert_eq!(ids(&controller), vec!["2", "1"]);
    assert_eq!(controller.snapshots_applied(), 2);
}
