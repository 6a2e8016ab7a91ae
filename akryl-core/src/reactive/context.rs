//! Change Detector
//!
//! The change detector tracks which observables are read while a
//! computation runs. This enables automatic dependency tracking: when an
//! observable is read, it is registered against the computation currently
//! being evaluated.
//!
//! # Implementation
//!
//! We use a thread-local stack of tracking frames. `evaluate` pushes a frame,
//! runs the computation and pops the frame again (also on unwind). Nested
//! evaluations only register reads against the innermost frame, and reads
//! outside of any frame are no-ops.
//!
//! Every frame produces a [`ReactiveHandle`]. When any observable read during
//! the evaluation fires, the handle first unsubscribes from everything it
//! observed and then runs its invalidation callback, exactly once.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use smallvec::SmallVec;

use super::observable::Observable;
use super::subscriber::{Observer, SubscriberId};
use crate::config::Config;
use crate::error::{Error, Result};

thread_local! {
    static STACK: RefCell<Vec<Option<Rc<TrackedObserver>>>> = const { RefCell::new(Vec::new()) };
}

/// The observer behind a [`ReactiveHandle`].
struct TrackedObserver {
    id: SubscriberId,
    dependencies: RefCell<SmallVec<[Rc<dyn Observable>; 4]>>,
    callback: RefCell<Option<Box<dyn FnOnce()>>>,
    active: Cell<bool>,
}

impl TrackedObserver {
    fn new(callback: Box<dyn FnOnce()>) -> Rc<Self> {
        Rc::new(Self {
            id: SubscriberId::new(),
            dependencies: RefCell::new(SmallVec::new()),
            callback: RefCell::new(Some(callback)),
            active: Cell::new(true),
        })
    }

    fn track(self: &Rc<Self>, dependency: Rc<dyn Observable>) {
        if !self.active.get() {
            return;
        }

        let known = self
            .dependencies
            .borrow()
            .iter()
            .any(|existing| std::ptr::addr_eq(Rc::as_ptr(existing), Rc::as_ptr(&dependency)));
        if known {
            return;
        }

        dependency.subscribe(self.clone());
        self.dependencies.borrow_mut().push(dependency);
    }

    fn unsubscribe_all(&self) {
        let dependencies = std::mem::take(&mut *self.dependencies.borrow_mut());
        for dependency in dependencies {
            dependency.unsubscribe(self.id);
        }
    }

    fn dispose(&self) {
        self.active.set(false);
        self.unsubscribe_all();
        self.callback.borrow_mut().take();
    }
}

impl Observer for TrackedObserver {
    fn id(&self) -> SubscriberId {
        self.id
    }

    fn changed(&self) {
        self.active.set(false);
        self.unsubscribe_all();
        let callback = self.callback.borrow_mut().take();
        if let Some(callback) = callback {
            callback();
        }
    }
}

/// A disposable bundle of subscriptions created by one tracked evaluation.
///
/// Dropping the handle disposes it.
pub struct ReactiveHandle {
    observer: Rc<TrackedObserver>,
}

impl ReactiveHandle {
    /// Unsubscribe from every observed location. The invalidation callback
    /// will never run afterwards.
    pub fn dispose(&self) {
        self.observer.dispose();
    }

    /// Whether the handle still waits for an invalidation.
    pub fn is_active(&self) -> bool {
        self.observer.active.get()
    }

    /// Number of observables this handle is subscribed to.
    pub fn dependency_count(&self) -> usize {
        self.observer.dependencies.borrow().len()
    }

    /// The subscriber ID the handle registers under.
    pub fn subscriber_id(&self) -> SubscriberId {
        self.observer.id
    }
}

impl Drop for ReactiveHandle {
    fn drop(&mut self) {
        self.observer.dispose();
    }
}

impl fmt::Debug for ReactiveHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveHandle")
            .field("id", &self.observer.id)
            .field("active", &self.is_active())
            .field("dependency_count", &self.dependency_count())
            .finish()
    }
}

/// Pops the tracking frame when dropped, so the stack stays balanced even
/// if the computation panics.
struct FrameGuard;

impl Drop for FrameGuard {
    fn drop(&mut self) {
        STACK.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// Entry point of dependency tracking.
pub struct ChangeDetector;

impl ChangeDetector {
    /// Run `f` inside a new tracking frame.
    ///
    /// Returns the result of `f` together with a handle subscribed to every
    /// observable `f` read. The first time one of them fires, the handle
    /// disposes itself and then calls `on_invalidate`.
    pub fn evaluate<T, F, C>(f: F, on_invalidate: C) -> Result<(T, ReactiveHandle)>
    where
        F: FnOnce() -> T,
        C: FnOnce() + 'static,
    {
        let limit = Config::with(|config| config.max_tracking_depth);
        let observer = TrackedObserver::new(Box::new(on_invalidate));

        STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.len() >= limit {
                return Err(Error::TrackerOverflow { limit });
            }
            stack.push(Some(observer.clone()));
            Ok(())
        })?;

        let guard = FrameGuard;
        let value = f();
        drop(guard);

        tracing::trace!(
            id = observer.id.raw(),
            dependencies = observer.dependencies.borrow().len(),
            "tracked evaluation finished"
        );
        Ok((value, ReactiveHandle { observer }))
    }

    /// Run `f` with tracking suspended: reads inside it register nowhere.
    pub fn untracked<T>(f: impl FnOnce() -> T) -> T {
        STACK.with(|stack| stack.borrow_mut().push(None));
        let guard = FrameGuard;
        let value = f();
        drop(guard);
        value
    }

    /// Register `dependency` against the innermost tracking frame.
    ///
    /// Outside of any frame this is a no-op.
    pub fn observed(dependency: Rc<dyn Observable>) {
        let current = STACK.with(|stack| stack.borrow().last().cloned().flatten());
        if let Some(observer) = current {
            observer.track(dependency);
        }
    }

    /// Whether reads are currently being tracked.
    pub fn is_tracking() -> bool {
        STACK.with(|stack| matches!(stack.borrow().last(), Some(Some(_))))
    }

    /// Current nesting depth of tracked evaluations.
    pub fn depth() -> usize {
        STACK.with(|stack| stack.borrow().len())
    }
}
