//! Signal Implementation
//!
//! A Signal is the simplest reactive value: one mutable cell paired with the
//! observable that tracks who read it.
//!
//! # How Signals Work
//!
//! 1. When a signal is read inside a tracked evaluation (computed, watcher or
//!    widget build), the signal's observable registers that evaluation.
//!
//! 2. When the signal is set to a different value, the observable fires and
//!    every registered evaluation is invalidated.
//!
//! 3. Setting an equal value is a no-op: nothing fires.
//!
//! Cloning a signal yields another handle to the same cell.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::observable::ObservableProperty;

struct SignalInner<T> {
    value: RefCell<T>,
    observable: Rc<ObservableProperty>,
}

/// A reactive cell holding a value of type `T`.
///
/// # Example
///
/// ```rust,ignore
/// let count = Signal::new(0);
///
/// // Read the value (tracked when inside an evaluation)
/// let value = count.get();
///
/// // Update the value (notifies dependents if it changed)
/// count.set(5);
/// ```
pub struct Signal<T> {
    inner: Rc<SignalInner<T>>,
}

impl<T: 'static> Signal<T> {
    /// Create a new signal with the given initial value.
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(SignalInner {
                value: RefCell::new(value),
                observable: ObservableProperty::new(),
            }),
        }
    }

    /// Get the current value.
    ///
    /// Inside a tracked evaluation this also registers the evaluation as a
    /// dependent of the signal.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.inner.observable.observed();
        self.inner.value.borrow().clone()
    }

    /// Borrow the current value, tracking the read.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.inner.observable.observed();
        f(&self.inner.value.borrow())
    }

    /// Get the current value without registering a dependency.
    pub fn get_untracked(&self) -> T
    where
        T: Clone,
    {
        self.inner.value.borrow().clone()
    }

    /// Set a new value. Dependents are notified only if it differs from the
    /// current one.
    pub fn set(&self, value: T)
    where
        T: PartialEq,
    {
        {
            let mut current = self.inner.value.borrow_mut();
            if *current == value {
                return;
            }
            *current = value;
        }
        self.inner.observable.fire();
    }

    /// Mutate the value in place and notify dependents unconditionally.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        f(&mut self.inner.value.borrow_mut());
        self.inner.observable.fire();
    }

    /// Notify dependents without changing the value.
    pub fn fire(&self) {
        self.inner.observable.fire();
    }

    /// Number of evaluations currently depending on this signal.
    pub fn subscriber_count(&self) -> usize {
        self.inner.observable.subscriber_count()
    }
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("value", &*self.inner.value.borrow())
            .field("subscribers", &self.inner.observable.subscriber_count())
            .finish()
    }
}
