//! Observable Locations
//!
//! An observable is a location whose reads and writes should be trackable.
//! It keeps the set of dependents currently watching it and notifies them
//! when it fires.
//!
//! # Edge-triggered subscriptions
//!
//! `fire()` snapshots the subscriber set, clears it and only then notifies.
//! A dependent that wants to keep reacting must observe the location again
//! during its next evaluation. This is what lets dependency sets change from
//! one evaluation to the next without explicit bookkeeping.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use super::context::ChangeDetector;
use super::subscriber::{Observer, SubscriberId};

/// A trackable mutation point with a set of subscribers.
pub trait Observable {
    /// Add `observer` to the subscriber set. Subscribing twice is a no-op.
    fn subscribe(&self, observer: Rc<dyn Observer>);

    /// Remove the subscriber with the given ID, if present.
    fn unsubscribe(&self, id: SubscriberId);
}

/// The concrete observable used throughout the runtime.
///
/// Subscribers are held weakly: an observer that has been dropped without
/// unsubscribing is skipped when the property fires.
#[derive(Default)]
pub struct ObservableProperty {
    subscribers: RefCell<IndexMap<SubscriberId, Weak<dyn Observer>>>,
}

impl ObservableProperty {
    /// Create a new shared observable.
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Register this property with the innermost tracked evaluation.
    ///
    /// Outside of any tracked evaluation this does nothing.
    pub fn observed(self: &Rc<Self>) {
        ChangeDetector::observed(self.clone());
    }

    /// Notify and clear all current subscribers.
    pub fn fire(&self) {
        let subscribers = std::mem::take(&mut *self.subscribers.borrow_mut());
        if subscribers.is_empty() {
            return;
        }

        tracing::trace!(count = subscribers.len(), "observable fired");
        for (_, observer) in subscribers {
            if let Some(observer) = observer.upgrade() {
                observer.changed();
            }
        }
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .borrow()
            .values()
            .filter(|observer| observer.strong_count() > 0)
            .count()
    }
}

impl Observable for ObservableProperty {
    fn subscribe(&self, observer: Rc<dyn Observer>) {
        self.subscribers
            .borrow_mut()
            .entry(observer.id())
            .or_insert_with(|| Rc::downgrade(&observer));
    }

    fn unsubscribe(&self, id: SubscriberId) {
        self.subscribers.borrow_mut().shift_remove(&id);
    }
}

impl fmt::Debug for ObservableProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableProperty")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}
