//! Watcher Implementation
//!
//! A Watcher is a side-effecting reaction to a derived value's change.
//!
//! # How Watchers Work
//!
//! 1. When created, the watcher evaluates its selector once to establish a
//!    baseline value and its initial dependencies. The callback does not run.
//!
//! 2. When any dependency fires, the watcher schedules a re-run on the event
//!    loop. Nothing runs synchronously with the mutation.
//!
//! 3. The re-run evaluates the selector again, subscribing to whatever it
//!    reads this time, calls the callback with `(old, new)` and makes the new
//!    value the baseline.
//!
//! # Differences from Computed
//!
//! - Computeds are pulled: reading one recomputes it on demand.
//! - Watchers are pushed: they only run when the event loop drains.
//! - Watchers run at a higher priority value than computeds, so the
//!   computeds they read have settled by the time they run.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use super::container::{Disposable, ReactiveContainer};
use super::context::{ChangeDetector, ReactiveHandle};
use crate::config::Config;
use crate::error::Result;
use crate::scheduler::EventLoop;

type Callback<T> = Box<dyn FnMut(&T, &T)>;

struct WatcherInner<T> {
    selector: Box<dyn Fn() -> T>,
    callback: RefCell<Callback<T>>,
    value: RefCell<Option<T>>,
    handle: RefCell<Option<ReactiveHandle>>,
    disposed: Cell<bool>,
    runs: Cell<usize>,
}

impl<T: Clone + 'static> WatcherInner<T> {
    fn evaluate(self: &Rc<Self>) -> Result<T> {
        drop(self.handle.borrow_mut().take());

        let weak: Weak<Self> = Rc::downgrade(self);
        let (value, handle) = ChangeDetector::evaluate(
            || (self.selector)(),
            move || {
                if let Some(inner) = weak.upgrade() {
                    inner.schedule();
                }
            },
        )?;
        *self.handle.borrow_mut() = Some(handle);
        Ok(value)
    }

    fn schedule(self: &Rc<Self>) {
        if self.disposed.get() {
            return;
        }

        let weak = Rc::downgrade(self);
        let priority = Config::with(|config| config.watcher_priority);
        EventLoop::submit(priority, move || match weak.upgrade() {
            Some(inner) => inner.run(),
            None => Ok(()),
        });
    }

    fn run(self: &Rc<Self>) -> Result<()> {
        if self.disposed.get() {
            return Ok(());
        }

        let new = self.evaluate()?;
        let old = self.value.replace(Some(new.clone()));
        self.runs.set(self.runs.get() + 1);

        if let Some(old) = old {
            (self.callback.borrow_mut())(&old, &new);
        }
        Ok(())
    }
}

impl<T> Disposable for WatcherInner<T> {
    fn dispose(&self) {
        self.disposed.set(true);
        drop(self.handle.borrow_mut().take());
    }
}

/// A side-effecting reaction to changes of a selected value.
///
/// # Example
///
/// ```rust,ignore
/// let count = Signal::new(0);
///
/// let watcher = Watcher::new(
///     move || count.get(),
///     |old, new| println!("count went from {old} to {new}"),
/// )?;
/// ```
pub struct Watcher<T> {
    inner: Rc<WatcherInner<T>>,
}

impl<T: Clone + 'static> Watcher<T> {
    /// Create a watcher and evaluate its selector once.
    ///
    /// # Errors
    ///
    /// Fails if the initial evaluation overflows the change detector stack.
    pub fn new<S, C>(selector: S, callback: C) -> Result<Self>
    where
        S: Fn() -> T + 'static,
        C: FnMut(&T, &T) + 'static,
    {
        let inner = Rc::new(WatcherInner {
            selector: Box::new(selector),
            callback: RefCell::new(Box::new(callback)),
            value: RefCell::new(None),
            handle: RefCell::new(None),
            disposed: Cell::new(false),
            runs: Cell::new(0),
        });

        let baseline = inner.evaluate()?;
        *inner.value.borrow_mut() = Some(baseline);
        Ok(Self { inner })
    }

    /// Create a watcher owned by `container`.
    pub fn in_container<R, S, C>(container: &Rc<R>, selector: S, callback: C) -> Result<Self>
    where
        R: ReactiveContainer + 'static,
        S: Fn() -> T + 'static,
        C: FnMut(&T, &T) + 'static,
    {
        let watcher = Self::new(selector, callback)?;
        container.register_handle(watcher.inner.clone());
        Ok(watcher)
    }

    /// Stop watching. Scheduled re-runs become no-ops.
    pub fn dispose(&self) {
        self.inner.dispose();
    }

    /// Whether the watcher was disposed. A disposed watcher never runs again.
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    /// Number of re-runs since construction.
    pub fn run_count(&self) -> usize {
        self.inner.runs.get()
    }

    /// The current baseline value.
    pub fn value(&self) -> Option<T> {
        self.inner.value.borrow().clone()
    }
}

impl<T> Clone for Watcher<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> fmt::Debug for Watcher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watcher")
            .field("runs", &self.inner.runs.get())
            .field("disposed", &self.inner.disposed.get())
            .finish()
    }
}
