//! Capability bus: the two-operation event-source contract and an
//! in-process implementation of it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

/// A callback invoked with the arguments of an emitted event.
///
/// Callbacks are compared by pointer identity when unsubscribing.
pub type EventCallback = Rc<dyn Fn(&[Value])>;

/// Anything an entity can subscribe to.
pub trait EventSource {
    /// Registers `callback` for `event`.
    fn subscribe(&self, event: &str, callback: EventCallback);

    /// Removes a previously registered `callback` for `event`.
    ///
    /// Removing a callback that is not registered is a no-op.
    fn unsubscribe(&self, event: &str, callback: &EventCallback);
}

/// A shared, single-threaded event bus.
///
/// Clones share the same subscriber table.
#[derive(Clone, Default)]
pub struct EventBus {
    listeners: Rc<RefCell<HashMap<String, Vec<EventCallback>>>>,
}

impl EventBus {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Invokes every callback subscribed to `event`, in subscription order.
    ///
    /// Callbacks may subscribe or unsubscribe while being invoked; such
    /// changes take effect from the next emit.
    pub fn emit(&self, event: &str, args: &[Value]) {
        let snapshot: Vec<EventCallback> = self
            .listeners
            .borrow()
            .get(event)
            .cloned()
            .unwrap_or_default();
        for callback in snapshot {
            callback(args);
        }
    }

    /// Number of callbacks currently subscribed to `event`.
    #[must_use]
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.borrow().get(event).map_or(0, Vec::len)
    }

    /// Total number of subscriptions across all events.
    #[must_use]
    pub fn total_listeners(&self) -> usize {
        self.listeners.borrow().values().map(Vec::len).sum()
    }
}

impl EventSource for EventBus {
    fn subscribe(&self, event: &str, callback: EventCallback) {
        self.listeners
            .borrow_mut()
            .entry(event.to_string())
            .or_default()
            .push(callback);
    }

    fn unsubscribe(&self, event: &str, callback: &EventCallback) {
        let mut listeners = self.listeners.borrow_mut();
        if let Some(list) = listeners.get_mut(event) {
            if let Some(pos) = list.iter().position(|cb| Rc::ptr_eq(cb, callback)) {
                list.remove(pos);
            }
            if list.is_empty() {
                listeners.remove(event);
            }
        }
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self.listeners.borrow();
        let mut counts: Vec<(&String, usize)> =
            listeners.iter().map(|(k, v)| (k, v.len())).collect();
        counts.sort();
        f.debug_struct("EventBus").field("listeners", &counts).finish()
    }
}
