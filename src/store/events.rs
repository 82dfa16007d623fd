//! Change notification for UI binding layers.
//!
//! The store never re-renders anything itself. Whatever binds it to a UI
//! subscribes here and redraws when an event arrives; each store operation
//! emits at most one event no matter how many fields it touched.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::path::FieldName;

/// What a notification is about.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    /// One or more values changed.
    Values { names: Vec<FieldName> },
    /// The error state of these serialized names changed.
    Errors { names: Vec<String> },
    /// The whole tree was replaced and errors were cleared.
    Reset,
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub(crate) type Listener = Arc<dyn Fn(&StoreEvent) + Send + Sync>;

#[derive(Default)]
pub(crate) struct Listeners {
    next_id: u64,
    entries: IndexMap<u64, Listener>,
}

impl Listeners {
    pub(crate) fn add(&mut self, listener: Listener) -> SubscriptionId {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.insert(id, listener);
        SubscriptionId(id)
    }

    pub(crate) fn remove(&mut self, id: SubscriptionId) -> bool {
        self.entries.shift_remove(&id.0).is_some()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    /// Snapshot so listeners run without the registry lock held.
    pub(crate) fn snapshot(&self) -> Vec<Listener> {
        self.entries.values().cloned().collect()
    }
}
