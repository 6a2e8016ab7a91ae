//! Subscriber types for the reactive system.
//!
//! A subscriber is anything that wants to hear about a change of an
//! observable location: the tracked evaluation behind a computed, a watcher
//! or a widget build.

use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a subscriber.
///
/// Observables key their subscriber sets by this ID, which is what keeps a
/// subscriber from being registered twice on the same observable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

/// A dependent that is notified when an observable it watches fires.
pub trait Observer {
    /// The subscriber's unique ID.
    fn id(&self) -> SubscriberId;

    /// One of the observed locations changed.
    ///
    /// Subscriptions are edge-triggered: by the time this runs the observer
    /// has already been dropped from the firing observable's subscriber set.
    fn changed(&self);
}

/// An observer that forwards notifications to a closure.
///
/// Useful for subscribing explicitly, outside of a tracked evaluation.
pub struct Subscriber {
    id: SubscriberId,
    notify: Box<dyn Fn()>,
}

impl Subscriber {
    /// Create a new subscriber with the given notification callback.
    pub fn new<F>(notify: F) -> Self
    where
        F: Fn() + 'static,
    {
        Self {
            id: SubscriberId::new(),
            notify: Box::new(notify),
        }
    }
}

impl Observer for Subscriber {
    fn id(&self) -> SubscriberId {
        self.id
    }

    fn changed(&self) {
        (self.notify)();
    }
}
