//! Reactive Primitives
//!
//! This module implements the core reactive system: observables, the change
//! detector, signals, computeds and watchers. Everything in the widget layer
//! and the reactive store is built on these.
//!
//! # Concepts
//!
//! ## Observables
//!
//! An [`ObservableProperty`] marks a location whose reads and writes should
//! be trackable. Reading it inside a tracked evaluation subscribes the
//! evaluation; firing it notifies and forgets every subscriber.
//!
//! ## Change detector
//!
//! [`ChangeDetector::evaluate`] runs a closure while recording every
//! observable it reads. The returned [`ReactiveHandle`] invokes an
//! invalidation callback once, the first time any of them fires.
//!
//! ## Computeds
//!
//! A [`Computed`] is a derived value that caches its result and recomputes
//! only after a dependency fired. Dependents are notified only when the
//! recomputed value actually differs.
//!
//! ## Watchers
//!
//! A [`Watcher`] runs a callback with the old and new value of a selector
//! whenever it changes. Re-runs are deferred to the event loop.
//!
//! # Implementation Notes
//!
//! The runtime is single-threaded. The tracking stack lives in thread-local
//! storage, and shared state uses `Rc` and interior mutability instead of
//! locks.

mod computed;
mod container;
mod context;
mod late_init;
mod observable;
mod runtime;
mod signal;
mod subscriber;
mod watcher;

pub use computed::{Computed, ComputedState};
pub use container::{Disposable, ReactiveContainer, ReactiveScope};
pub use context::{ChangeDetector, ReactiveHandle};
pub use late_init::LateInit;
pub use observable::{Observable, ObservableProperty};
pub use runtime::Runtime;
pub use signal::Signal;
pub use subscriber::{Observer, Subscriber, SubscriberId};
pub use watcher::Watcher;
