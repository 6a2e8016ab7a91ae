//! Per-key observables shared by every reactive container.

use std::cell::RefCell;
use std::collections::HashMap;
use std::hash::Hash;
use std::ops::Range;
use std::rc::Rc;

use crate::reactive::{ChangeDetector, ObservableProperty};

/// Instrumentation installed into a container by `wrap`.
///
/// Every key gets its own observable, created the first time the key is read
/// inside a tracked evaluation. The shape observable covers everything that
/// depends on the set of keys: length, iteration and absent-key lookups.
pub(crate) struct Tracking<K> {
    props: RefCell<HashMap<K, Rc<ObservableProperty>>>,
    shape: Rc<ObservableProperty>,
}

impl<K: Eq + Hash + Clone> Tracking<K> {
    pub(crate) fn new() -> Self {
        Self {
            props: RefCell::new(HashMap::new()),
            shape: ObservableProperty::new(),
        }
    }

    pub(crate) fn observe(&self, key: &K) {
        if !ChangeDetector::is_tracking() {
            return;
        }
        let prop = self
            .props
            .borrow_mut()
            .entry(key.clone())
            .or_insert_with(ObservableProperty::new)
            .clone();
        prop.observed();
    }

    pub(crate) fn observe_shape(&self) {
        self.shape.observed();
    }

    pub(crate) fn fire(&self, key: &K) {
        let prop = self.props.borrow().get(key).cloned();
        if let Some(prop) = prop {
            prop.fire();
        }
    }

    pub(crate) fn fire_shape(&self) {
        self.shape.fire();
    }

    /// Fire `key` and forget its observable.
    pub(crate) fn fire_removed(&self, key: &K) {
        let prop = self.props.borrow_mut().remove(key);
        if let Some(prop) = prop {
            prop.fire();
        }
    }

    /// Fire every key and the shape.
    pub(crate) fn fire_all(&self) {
        let props: Vec<_> = self.props.borrow_mut().drain().map(|(_, prop)| prop).collect();
        for prop in props {
            prop.fire();
        }
        self.shape.fire();
    }
}

impl Tracking<usize> {
    /// Fire every index in `range`, used when list items shift.
    pub(crate) fn fire_range(&self, range: Range<usize>) {
        let props: Vec<_> = {
            let props = self.props.borrow();
            range.filter_map(|index| props.get(&index).cloned()).collect()
        };
        for prop in props {
            prop.fire();
        }
    }
}
