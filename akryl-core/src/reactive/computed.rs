//! Computed Implementation
//!
//! A Computed is a cached derived value that re-evaluates only when one of
//! the observables it read has fired.
//!
//! # How Computeds Work
//!
//! 1. Nothing runs at construction. The derivation runs on first access,
//!    inside the change detector, and the result is cached.
//!
//! 2. Further reads return the cached value as long as the computed is clean.
//!
//! 3. When a dependency fires, the computed turns dirty and schedules its
//!    recomputation on the event loop. A read before the drain recomputes
//!    synchronously instead, so reads are never stale.
//!
//! 4. After recomputing, the computed fires its own observable only if the
//!    new value differs from the cached one. Computeds depending on a
//!    computed whose value did not change are therefore left alone.
//!
//! # Containers
//!
//! A computed created with [`Computed::in_container`] registers itself with
//! the container so it is disposed along with it, and stays dirty until the
//! container reports itself initialized.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use super::container::{Disposable, ReactiveContainer};
use super::context::{ChangeDetector, ReactiveHandle};
use super::observable::ObservableProperty;
use crate::config::Config;
use crate::error::Result;
use crate::scheduler::EventLoop;

/// Dirty state for a computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputedState {
    /// The cached value is up-to-date.
    Clean,

    /// The computed has to evaluate before its value can be read.
    Dirty,
}

struct ComputedInner<T> {
    compute: Box<dyn Fn() -> T>,
    value: RefCell<Option<T>>,
    state: Cell<ComputedState>,
    handle: RefCell<Option<ReactiveHandle>>,
    observable: Rc<ObservableProperty>,
    container: Option<Weak<dyn ReactiveContainer>>,
    disposed: Cell<bool>,
}

impl<T: Clone + PartialEq + 'static> ComputedInner<T> {
    fn container_initialized(&self) -> bool {
        self.container
            .as_ref()
            .and_then(Weak::upgrade)
            .map_or(true, |container| container.is_initialized())
    }

    fn compute(self: &Rc<Self>) -> Result<()> {
        if self.disposed.get() {
            if self.value.borrow().is_none() {
                let value = ChangeDetector::untracked(|| (self.compute)());
                *self.value.borrow_mut() = Some(value);
            }
            return Ok(());
        }
        if self.state.get() == ComputedState::Clean {
            return Ok(());
        }

        drop(self.handle.borrow_mut().take());

        // Decided before evaluating: an invalidation during the evaluation
        // must win over the clean state.
        self.state.set(if self.container_initialized() {
            ComputedState::Clean
        } else {
            ComputedState::Dirty
        });

        let weak = Rc::downgrade(self);
        let evaluated = ChangeDetector::evaluate(
            || (self.compute)(),
            move || {
                if let Some(inner) = weak.upgrade() {
                    inner.invalidate();
                }
            },
        );
        let (value, handle) = match evaluated {
            Ok(evaluated) => evaluated,
            Err(err) => {
                self.state.set(ComputedState::Dirty);
                return Err(err);
            }
        };
        *self.handle.borrow_mut() = Some(handle);

        let changed = self.value.borrow().as_ref() != Some(&value);
        if changed {
            *self.value.borrow_mut() = Some(value);
            self.observable.fire();
        } else {
            tracing::trace!("computed value unchanged, notification suppressed");
        }
        Ok(())
    }

    fn invalidate(self: &Rc<Self>) {
        if self.disposed.get() {
            return;
        }
        self.state.set(ComputedState::Dirty);

        let weak = Rc::downgrade(self);
        let priority = Config::with(|config| config.computed_priority);
        EventLoop::submit(priority, move || match weak.upgrade() {
            Some(inner) => inner.compute(),
            None => Ok(()),
        });
    }
}

impl<T> Disposable for ComputedInner<T> {
    fn dispose(&self) {
        self.disposed.set(true);
        drop(self.handle.borrow_mut().take());
    }
}

/// A cached derived value that recomputes only when its dependencies change.
///
/// The `PartialEq` bound is what suppresses notifications when a
/// recomputation yields the value already cached.
pub struct Computed<T> {
    inner: Rc<ComputedInner<T>>,
}

impl<T: Clone + PartialEq + 'static> Computed<T> {
    /// Create a computed with the given derivation. The derivation runs on
    /// first access.
    pub fn new<F>(compute: F) -> Self
    where
        F: Fn() -> T + 'static,
    {
        Self::build(compute, None)
    }

    /// Create a computed owned by `container`.
    pub fn in_container<C, F>(container: &Rc<C>, compute: F) -> Self
    where
        C: ReactiveContainer + 'static,
        F: Fn() -> T + 'static,
    {
        let container: Rc<dyn ReactiveContainer> = container.clone();
        let computed = Self::build(compute, Some(Rc::downgrade(&container)));
        container.register_handle(computed.inner.clone());
        computed
    }

    fn build<F>(compute: F, container: Option<Weak<dyn ReactiveContainer>>) -> Self
    where
        F: Fn() -> T + 'static,
    {
        Self {
            inner: Rc::new(ComputedInner {
                compute: Box::new(compute),
                value: RefCell::new(None),
                state: Cell::new(ComputedState::Dirty),
                handle: RefCell::new(None),
                observable: ObservableProperty::new(),
                container,
                disposed: Cell::new(false),
            }),
        }
    }

    /// Get the current value, recomputing it first if dirty.
    ///
    /// # Errors
    ///
    /// Fails if the evaluation overflows the change detector stack.
    pub fn try_get(&self) -> Result<T> {
        self.inner.compute()?;
        self.inner.observable.observed();
        Ok(self
            .inner
            .value
            .borrow()
            .clone()
            .expect("computed holds a value after evaluation"))
    }

    /// Get the current value, recomputing it first if dirty.
    ///
    /// # Panics
    ///
    /// Panics if the evaluation overflows the change detector stack. Use
    /// [`Computed::try_get`] to handle that case.
    pub fn get(&self) -> T {
        match self.try_get() {
            Ok(value) => value,
            Err(err) => panic!("computed evaluation failed: {err}"),
        }
    }

    /// Current dirty state.
    pub fn state(&self) -> ComputedState {
        self.inner.state.get()
    }

    /// Whether the derivation ran at least once.
    pub fn has_value(&self) -> bool {
        self.inner.value.borrow().is_some()
    }

    /// Number of evaluations currently depending on this computed.
    pub fn dependent_count(&self) -> usize {
        self.inner.observable.subscriber_count()
    }

    /// Stop reacting to dependencies. The cached value stays readable.
    pub fn dispose(&self) {
        self.inner.dispose();
    }

    /// Whether `dispose` ran, directly or through the owning container.
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }
}

impl<T> Clone for Computed<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Computed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computed")
            .field("value", &*self.inner.value.borrow())
            .field("state", &self.inner.state.get())
            .field("disposed", &self.inner.disposed.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::{ReactiveScope, Signal};

    // -------------------------------------------------------------------------
    // Laziness and memoization
    // -------------------------------------------------------------------------

    #[test]
    fn computed_is_lazy() {
        let called = Rc::new(Cell::new(false));
        let called_clone = called.clone();
        let computed = Computed::new(move || {
            called_clone.set(true);
            "result".to_string()
        });

        assert!(!called.get());
        assert_eq!(computed.get(), "result");
        assert!(called.get());
    }

    #[test]
    fn repeated_reads_evaluate_once() {
        let runs = Rc::new(Cell::new(0));
        let runs_clone = runs.clone();
        let computed = Computed::new(move || {
            runs_clone.set(runs_clone.get() + 1);
            7
        });

        assert_eq!(computed.get(), 7);
        assert_eq!(computed.get(), 7);
        assert_eq!(runs.get(), 1);
        assert_eq!(computed.state(), ComputedState::Clean);
    }

    #[test]
    fn reacts_to_fire_without_drain() {
        let prop = ObservableProperty::new();
        let source = Rc::new(Cell::new(10));

        let (prop_clone, source_clone) = (prop.clone(), source.clone());
        let computed = Computed::new(move || {
            prop_clone.observed();
            source_clone.get()
        });
        assert_eq!(computed.get(), 10);

        source.set(20);
        assert_eq!(computed.get(), 10);

        prop.fire();
        assert_eq!(computed.state(), ComputedState::Dirty);
        assert_eq!(computed.get(), 20);

        EventLoop::clear();
    }

    // -------------------------------------------------------------------------
    // Disposal and containers
    // -------------------------------------------------------------------------

    #[test]
    fn disposed_computed_keeps_last_value() {
        let signal = Signal::new(10);
        let signal_clone = signal.clone();
        let computed = Computed::new(move || signal_clone.get());

        assert_eq!(computed.get(), 10);
        signal.set(20);
        assert_eq!(computed.get(), 20);

        computed.dispose();
        signal.set(30);
        assert_eq!(computed.get(), 20);
        assert_eq!(signal.subscriber_count(), 0);

        EventLoop::clear();
    }

    #[test]
    fn container_registers_and_disposes() {
        let scope = ReactiveScope::new();
        scope.mark_initialized();
        let signal = Signal::new(1);
        let signal_clone = signal.clone();

        let computed = Computed::in_container(&scope, move || signal_clone.get() * 2);
        assert_eq!(computed.get(), 2);
        assert_eq!(scope.handle_count(), 1);

        scope.dispose_all();
        assert!(computed.is_disposed());
        assert_eq!(signal.subscriber_count(), 0);
    }

    #[test]
    fn uninitialized_container_keeps_computed_dirty() {
        let scope = ReactiveScope::new();
        let counter = Rc::new(Cell::new(0));
        let counter_clone = counter.clone();
        let computed = Computed::in_container(&scope, move || {
            counter_clone.set(counter_clone.get() + 1);
            counter_clone.get()
        });

        assert_eq!(computed.get(), 1);
        assert_eq!(computed.get(), 2);
        assert_eq!(computed.get(), 3);

        scope.mark_initialized();
        assert_eq!(computed.get(), 4);
        assert_eq!(computed.get(), 4);
    }

    // -------------------------------------------------------------------------
    // Chains
    // -------------------------------------------------------------------------

    #[test]
    fn computed_of_computed() {
        let a = Signal::new(10);
        let a_clone = a.clone();
        let b = Computed::new(move || a_clone.get());
        let b_clone = b.clone();
        let c = Computed::new(move || b_clone.get() + 10);

        assert_eq!(c.get(), 20);
        assert_eq!(b.dependent_count(), 1);

        a.set(20);
        EventLoop::drain().unwrap();
        assert_eq!(c.get(), 30);
    }

    #[test]
    fn mutation_inside_computed_does_not_loop() {
        let a = Signal::new(0);
        let b = Signal::new(0);
        let (a_clone, b_clone) = (a.clone(), b.clone());
        let computed = Computed::new(move || {
            let value = a_clone.get();
            b_clone.set(value);
            value
        });

        assert_eq!(computed.get(), 0);
        a.set(5);
        EventLoop::drain().unwrap();
        assert_eq!(b.get_untracked(), 5);
        assert_eq!(computed.get(), 5);
    }
}
