//! Listener registries for record change events and session transitions.
//!
//! Listeners are invoked synchronously, in registration order, outside the
//! registry lock. A panicking listener is logged and does not prevent the
//! remaining listeners from running.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::Serialize;
use tracing::error;

use crate::records::ports::Document;

/// Callback stored in a [`ListenerRegistry`].
pub type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

struct Slots<E> {
    next_id: u64,
    listeners: Vec<(u64, Listener<E>)>,
}

/// Ordered set of listeners for events of type `E`.
pub struct ListenerRegistry<E> {
    slots: Arc<Mutex<Slots<E>>>,
}

impl<E> Default for ListenerRegistry<E> {
    fn default() -> Self {
        Self { slots: Arc::new(Mutex::new(Slots { next_id: 0, listeners: Vec::new() })) }
    }
}

impl<E: 'static> ListenerRegistry<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: Listener<E>) -> ListenerHandle {
        let id = {
            let mut slots = self.slots.lock();
            let id = slots.next_id;
            slots.next_id += 1;
            slots.listeners.push((id, listener));
            id
        };

        let weak: Weak<Mutex<Slots<E>>> = Arc::downgrade(&self.slots);
        ListenerHandle::new(move || {
            if let Some(slots) = weak.upgrade() {
                slots.lock().listeners.retain(|(slot_id, _)| *slot_id != id);
            }
        })
    }

    /// Deliver `event` to every listener; returns how many completed
    /// without panicking.
    pub fn emit(&self, event: &E) -> usize {
        let listeners: Vec<Listener<E>> =
            self.slots.lock().listeners.iter().map(|(_, listener)| Arc::clone(listener)).collect();

        let mut delivered = 0;
        for listener in listeners {
            match catch_unwind(AssertUnwindSafe(|| listener(event))) {
                Ok(()) => delivered += 1,
                Err(panic) => {
                    let reason = panic
                        .downcast_ref::<&str>()
                        .map(ToString::to_string)
                        .or_else(|| panic.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".to_string());
                    error!(reason = %reason, "Listener panicked; continuing with remaining listeners");
                }
            }
        }
        delivered
    }

    pub fn len(&self) -> usize {
        self.slots.lock().listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Returned by every `subscribe`; dropping it keeps the listener
/// registered.
pub struct ListenerHandle {
    remove: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl ListenerHandle {
    fn new(remove: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self { remove: Some(Box::new(remove)) }
    }

    /// Handle that removes nothing; for stores without a change feed.
    pub fn detached() -> Self {
        Self { remove: None }
    }

    pub fn unsubscribe(mut self) {
        if let Some(remove) = self.remove.take() {
            remove();
        }
    }
}

impl fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerHandle").field("active", &self.remove.is_some()).finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordEventKind {
    Created,
    Updated,
    Deleted,
}

/// A successful write observed through the record store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordEvent {
    pub kind: RecordEventKind,
    pub collection: String,
    /// The written fields; for deletions only `id`.
    pub record: Document,
}

impl RecordEvent {
    pub fn new(kind: RecordEventKind, collection: impl Into<String>, record: Document) -> Self {
        Self { kind, collection: collection.into(), record }
    }

    pub fn record_id(&self) -> Option<&str> {
        self.record.get("id").and_then(serde_json::Value::as_str)
    }
}
