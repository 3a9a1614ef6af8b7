//! Document-level listener registry.
//!
//! Tracks which page-wide listeners are attached so modal-scoped ones can be
//! proven detached after close or teardown.

use std::collections::BTreeMap;

pub type ListenerId = u64;

/// Page-wide events a listener can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentEvent {
    PointerDown,
}

#[derive(Debug, Default)]
pub struct DocumentListeners {
    next_id: ListenerId,
    attached: BTreeMap<ListenerId, DocumentEvent>,
}

impl DocumentListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, event: DocumentEvent) -> ListenerId {
        self.next_id += 1;
        self.attached.insert(self.next_id, event);
        self.next_id
    }

    /// Detaches one listener. Returns `false` when it was not attached.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        self.attached.remove(&id).is_some()
    }

    pub fn is_attached(&self, id: ListenerId) -> bool {
        self.attached.contains_key(&id)
    }

    pub fn count_for(&self, event: DocumentEvent) -> usize {
        self.attached.values().filter(|value| **value == event).count()
    }

    pub fn len(&self) -> usize {
        self.attached.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attached.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{DocumentEvent, DocumentListeners};

    #[test]
    fn add_and_remove_track_attachment() {
        let mut listeners = DocumentListeners::new();
        let first = listeners.add(DocumentEvent::PointerDown);
        let second = listeners.add(DocumentEvent::PointerDown);
        assert_ne!(first, second);
        assert_eq!(listeners.count_for(DocumentEvent::PointerDown), 2);

        assert!(listeners.remove(first));
        assert!(!listeners.remove(first));
        assert!(listeners.is_attached(second));
        assert_eq!(listeners.len(), 1);
    }
}
