//! Per-entity bookkeeping of capability-bus subscriptions.
//!
//! Every subscription an entity makes goes through its [`ListenerRegistry`],
//! so the entity's teardown can release all of them whether or not the
//! behavior remembered to.

use std::fmt;
use std::rc::Rc;

use crate::events::{EventCallback, EventSource};

/// One subscription owned by an entity.
pub struct ListenerRecord {
    source: Rc<dyn EventSource>,
    event: String,
    callback: EventCallback,
}

impl ListenerRecord {
    /// The event name this record listens to.
    #[must_use]
    pub fn event(&self) -> &str {
        &self.event
    }
}

impl fmt::Debug for ListenerRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRecord")
            .field("event", &self.event)
            .finish_non_exhaustive()
    }
}

/// The set of live subscriptions owned by one entity.
#[derive(Debug, Default)]
pub struct ListenerRegistry {
    records: Vec<ListenerRecord>,
}

impl ListenerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes `callback` to `event` on `source` and records it.
    pub fn subscribe(
        &mut self,
        source: Rc<dyn EventSource>,
        event: impl Into<String>,
        callback: EventCallback,
    ) {
        let event = event.into();
        source.subscribe(&event, Rc::clone(&callback));
        self.records.push(ListenerRecord {
            source,
            event,
            callback,
        });
    }

    /// Releases the subscriptions to `event` matching `callback`, or every
    /// subscription to `event` when `callback` is `None`.
    ///
    /// Returns the number of subscriptions released.
    pub fn unsubscribe(&mut self, event: &str, callback: Option<&EventCallback>) -> usize {
        let before = self.records.len();
        self.records.retain(|record| {
            let matches = record.event == event
                && callback.is_none_or(|cb| Rc::ptr_eq(cb, &record.callback));
            if matches {
                record.source.unsubscribe(&record.event, &record.callback);
            }
            !matches
        });
        before - self.records.len()
    }

    /// Releases every subscription. Calling it again is a no-op.
    pub fn unsubscribe_all(&mut self) {
        for record in self.records.drain(..) {
            record.source.unsubscribe(&record.event, &record.callback);
        }
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` when no subscription is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates over live subscriptions.
    pub fn iter(&self) -> impl Iterator<Item = &ListenerRecord> {
        self.records.iter()
    }
}
