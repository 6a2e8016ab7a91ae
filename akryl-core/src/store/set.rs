//! Reactive set of atoms.

use std::cell::{OnceCell, RefCell};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexSet;

use super::tracking::Tracking;
use super::value::Atom;

struct SetInner {
    items: RefCell<IndexSet<Atom>>,
    tracking: OnceCell<Tracking<Atom>>,
}

/// A set of [`Atom`]s in insertion order. Membership tests are tracked per
/// atom, iteration and size on the set's shape.
#[derive(Clone)]
pub struct Set(Rc<SetInner>);

impl Set {
    pub fn new() -> Self {
        IndexSet::new().into()
    }

    pub fn contains(&self, atom: impl Into<Atom>) -> bool {
        let atom = atom.into();
        if let Some(tracking) = self.0.tracking.get() {
            tracking.observe(&atom);
        }
        self.0.items.borrow().contains(&atom)
    }

    /// Add `atom`, returning whether it was absent.
    pub fn insert(&self, atom: impl Into<Atom>) -> bool {
        let atom = atom.into();
        let added = self.0.items.borrow_mut().insert(atom.clone());
        if let (true, Some(tracking)) = (added, self.0.tracking.get()) {
            tracking.fire(&atom);
            tracking.fire_shape();
        }
        added
    }

    /// Remove `atom`, returning whether it was present.
    pub fn remove(&self, atom: impl Into<Atom>) -> bool {
        let atom = atom.into();
        let removed = self.0.items.borrow_mut().shift_remove(&atom);
        if let (true, Some(tracking)) = (removed, self.0.tracking.get()) {
            tracking.fire_removed(&atom);
            tracking.fire_shape();
        }
        removed
    }

    pub fn clear(&self) {
        let removed = std::mem::take(&mut *self.0.items.borrow_mut());
        if removed.is_empty() {
            return;
        }
        if let Some(tracking) = self.0.tracking.get() {
            tracking.fire_all();
        }
    }

    pub fn len(&self) -> usize {
        if let Some(tracking) = self.0.tracking.get() {
            tracking.observe_shape();
        }
        self.0.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all atoms in insertion order. Tracks the shape.
    pub fn values(&self) -> Vec<Atom> {
        if let Some(tracking) = self.0.tracking.get() {
            tracking.observe_shape();
        }
        self.0.items.borrow().iter().cloned().collect()
    }

    pub fn is_reactive(&self) -> bool {
        self.0.tracking.get().is_some()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    /// Atoms hold no containers, so only the set itself is instrumented.
    pub(crate) fn wrap_deep(&self) {
        let _ = self.0.tracking.set(Tracking::new());
    }
}

impl Default for Set {
    fn default() -> Self {
        Self::new()
    }
}

impl From<IndexSet<Atom>> for Set {
    fn from(items: IndexSet<Atom>) -> Self {
        Set(Rc::new(SetInner {
            items: RefCell::new(items),
            tracking: OnceCell::new(),
        }))
    }
}

impl FromIterator<Atom> for Set {
    fn from_iter<I: IntoIterator<Item = Atom>>(iter: I) -> Self {
        iter.into_iter().collect::<IndexSet<_>>().into()
    }
}

impl fmt::Debug for Set {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Set")
            .field("len", &self.0.items.borrow().len())
            .field("reactive", &self.is_reactive())
            .finish()
    }
}
