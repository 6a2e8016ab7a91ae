//! Reactive containers.
//!
//! A container owns every computed and watcher created on its behalf and
//! disposes all of them when it is torn down. Widget states use a
//! [`ReactiveScope`] for this.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Something that holds subscriptions and can release them.
pub trait Disposable {
    /// Release every subscription. Calling it again does nothing.
    fn dispose(&self);
}

/// An owner of reactive handles.
pub trait ReactiveContainer {
    /// Whether the owner finished constructing. Computeds created in an
    /// uninitialized container stay dirty, so every read re-evaluates.
    fn is_initialized(&self) -> bool {
        true
    }

    /// Take ownership of a handle. It must be disposed no later than the
    /// container itself.
    fn register_handle(&self, handle: Rc<dyn Disposable>);
}

/// The concrete container used by widget states.
#[derive(Default)]
pub struct ReactiveScope {
    initialized: Cell<bool>,
    disposed: Cell<bool>,
    handles: RefCell<Vec<Rc<dyn Disposable>>>,
}

impl ReactiveScope {
    /// An empty, uninitialized scope.
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Flag the owner as fully constructed.
    pub fn mark_initialized(&self) {
        self.initialized.set(true);
    }

    /// Dispose every registered handle. Handles registered afterwards are
    /// disposed immediately.
    pub fn dispose_all(&self) {
        self.disposed.set(true);
        let handles = std::mem::take(&mut *self.handles.borrow_mut());
        tracing::trace!(count = handles.len(), "disposing reactive scope");
        for handle in handles {
            handle.dispose();
        }
    }

    /// Number of handles currently owned.
    pub fn handle_count(&self) -> usize {
        self.handles.borrow().len()
    }

    /// Whether `dispose_all` ran.
    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }
}

impl ReactiveContainer for ReactiveScope {
    fn is_initialized(&self) -> bool {
        self.initialized.get()
    }

    fn register_handle(&self, handle: Rc<dyn Disposable>) {
        if self.disposed.get() {
            handle.dispose();
            return;
        }
        self.handles.borrow_mut().push(handle);
    }
}

impl fmt::Debug for ReactiveScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveScope")
            .field("initialized", &self.initialized.get())
            .field("disposed", &self.disposed.get())
            .field("handles", &self.handle_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter(Rc<Cell<u32>>);

    impl Disposable for Counter {
        fn dispose(&self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn dispose_all_releases_every_handle() {
        let scope = ReactiveScope::new();
        let disposed = Rc::new(Cell::new(0));

        scope.register_handle(Rc::new(Counter(disposed.clone())));
        scope.register_handle(Rc::new(Counter(disposed.clone())));
        assert_eq!(scope.handle_count(), 2);

        scope.dispose_all();
        assert_eq!(disposed.get(), 2);
        assert_eq!(scope.handle_count(), 0);
    }

    #[test]
    fn late_registration_is_disposed_immediately() {
        let scope = ReactiveScope::new();
        let disposed = Rc::new(Cell::new(0));

        scope.dispose_all();
        scope.register_handle(Rc::new(Counter(disposed.clone())));

        assert_eq!(disposed.get(), 1);
        assert_eq!(scope.handle_count(), 0);
    }

    #[test]
    fn initialization_flag() {
        let scope = ReactiveScope::new();
        assert!(!scope.is_initialized());
        scope.mark_initialized();
        assert!(scope.is_initialized());
    }
}
