//! Reactive list.

use std::cell::{OnceCell, RefCell};
use std::fmt;
use std::rc::Rc;

use super::tracking::Tracking;
use super::value::{wrap, Value};

struct ListInner {
    items: RefCell<Vec<Value>>,
    tracking: OnceCell<Tracking<usize>>,
}

/// An ordered sequence of values.
///
/// Reads are tracked per index once the list is reactive. Operations that
/// shift items (insert, remove) fire every index from the affected position
/// to the end, plus the list's shape.
#[derive(Clone)]
pub struct List(Rc<ListInner>);

impl List {
    pub fn new() -> Self {
        Vec::new().into()
    }

    /// The item at `index`. An out-of-range read tracks the shape so that the
    /// reader is notified when the list grows.
    pub fn get(&self, index: usize) -> Option<Value> {
        let value = self.0.items.borrow().get(index).cloned();
        if let Some(tracking) = self.0.tracking.get() {
            if value.is_some() {
                tracking.observe(&index);
            } else {
                tracking.observe_shape();
            }
        }
        value
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

    /// Replace the item at `index`, returning the previous one. Out of
    /// bounds writes leave the list unchanged and return `None`.
    pub fn set(&self, index: usize, value: impl Into<Value>) -> Option<Value> {
        let value = self.prepare(value.into());
        let old = {
            let mut items = self.0.items.borrow_mut();
            let slot = items.get_mut(index)?;
            if *slot == value {
                return Some(value);
            }
            std::mem::replace(slot, value)
        };
        if let Some(tracking) = self.0.tracking.get() {
            tracking.fire(&index);
        }
        Some(old)
    }

    pub fn push(&self, value: impl Into<Value>) {
        let value = self.prepare(value.into());
        let index = {
            let mut items = self.0.items.borrow_mut();
            items.push(value);
            items.len() - 1
        };
        if let Some(tracking) = self.0.tracking.get() {
            tracking.fire(&index);
            tracking.fire_shape();
        }
    }

    pub fn pop(&self) -> Option<Value> {
        let (value, index) = {
            let mut items = self.0.items.borrow_mut();
            let value = items.pop()?;
            (value, items.len())
        };
        if let Some(tracking) = self.0.tracking.get() {
            tracking.fire_removed(&index);
            tracking.fire_shape();
        }
        Some(value)
    }

    /// Insert `value` at `index`, clamped to the current length.
    pub fn insert(&self, index: usize, value: impl Into<Value>) {
        let value = self.prepare(value.into());
        let (index, len) = {
            let mut items = self.0.items.borrow_mut();
            let index = index.min(items.len());
            items.insert(index, value);
            (index, items.len())
        };
        if let Some(tracking) = self.0.tracking.get() {
            tracking.fire_range(index..len);
            tracking.fire_shape();
        }
    }

    pub fn remove(&self, index: usize) -> Option<Value> {
        let (value, len) = {
            let mut items = self.0.items.borrow_mut();
            if index >= items.len() {
                return None;
            }
            let len = items.len();
            (items.remove(index), len)
        };
        if let Some(tracking) = self.0.tracking.get() {
            tracking.fire_range(index..len);
            tracking.fire_shape();
        }
        Some(value)
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

    pub fn extend<V: Into<Value>>(&self, values: impl IntoIterator<Item = V>) {
        let values: Vec<Value> = values
            .into_iter()
            .map(|value| self.prepare(value.into()))
            .collect();
        if values.is_empty() {
            return;
        }
        let range = {
            let mut items = self.0.items.borrow_mut();
            let start = items.len();
            items.extend(values);
            start..items.len()
        };
        if let Some(tracking) = self.0.tracking.get() {
            tracking.fire_range(range);
            tracking.fire_shape();
        }
    }

    /// Snapshot of all items. Tracks the shape and every index.
    pub fn values(&self) -> Vec<Value> {
        let values = self.0.items.borrow().clone();
        if let Some(tracking) = self.0.tracking.get() {
            tracking.observe_shape();
            for index in 0..values.len() {
                tracking.observe(&index);
            }
        }
        values
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

    pub(crate) fn wrap_deep(&self) {
        if self.0.tracking.set(Tracking::new()).is_err() {
            return;
        }
        let values = self.0.items.borrow().clone();
        for value in &values {
            wrap(value);
        }
    }

    fn prepare(&self, value: Value) -> Value {
        if self.is_reactive() {
            wrap(&value)
        } else {
            value
        }
    }
}

impl Default for List {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vec<Value>> for List {
    fn from(items: Vec<Value>) -> Self {
        List(Rc::new(ListInner {
            items: RefCell::new(items),
            tracking: OnceCell::new(),
        }))
    }
}

impl FromIterator<Value> for List {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        iter.into_iter().collect::<Vec<_>>().into()
    }
}

impl fmt::Debug for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("List")
            .field("len", &self.0.items.borrow().len())
            .field("reactive", &self.is_reactive())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::{Computed, ComputedState, Runtime};
    use std::cell::Cell;

    fn reactive(items: &[i64]) -> List {
        let list: List = items.iter().copied().map(Value::from).collect();
        wrap(&Value::from(list.clone()));
        list
    }

    fn sum(list: &List) -> i64 {
        list.values().iter().filter_map(Value::as_int).sum()
    }

    #[test]
    fn index_reads_are_tracked() {
        let list = reactive(&[1, 2, 3]);
        let reader = list.clone();
        let second = Computed::new(move || reader.get(1));
        assert_eq!(second.get(), Some(Value::Int(2)));

        list.set(0, 10i64);
        assert_eq!(second.state(), ComputedState::Clean);

        list.set(1, 20i64);
        assert_eq!(second.get(), Some(Value::Int(20)));
    }

    #[test]
    fn out_of_range_reads_follow_growth() {
        let list = reactive(&[]);
        let reader = list.clone();
        let first = Computed::new(move || reader.get(0));
        assert_eq!(first.get(), None);

        list.push(7i64);
        assert_eq!(first.get(), Some(Value::Int(7)));
    }

    #[test]
    fn set_out_of_bounds_is_ignored() {
        let list = reactive(&[1]);
        assert_eq!(list.set(5, 2i64), None);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn shifting_operations_fire_following_indices() {
        let list = reactive(&[1, 2, 3]);
        let reader = list.clone();
        let last = Computed::new(move || reader.get(2));
        assert_eq!(last.get(), Some(Value::Int(3)));

        list.insert(0, 0i64);
        assert_eq!(last.get(), Some(Value::Int(2)));

        list.remove(0);
        assert_eq!(last.get(), Some(Value::Int(3)));

        assert_eq!(list.pop(), Some(Value::Int(3)));
        assert_eq!(last.get(), None);
    }

    #[test]
    fn aggregate_reads_follow_every_change() {
        let list = reactive(&[1, 2]);
        let reader = list.clone();
        let total = Computed::new(move || sum(&reader));
        assert_eq!(total.get(), 3);

        list.extend([3i64, 4]);
        assert_eq!(total.get(), 10);

        list.set(0, 5i64);
        assert_eq!(total.get(), 14);

        list.clear();
        assert_eq!(total.get(), 0);
        assert!(list.is_empty());
    }

    #[test]
    fn equal_writes_do_not_fire() {
        let list = reactive(&[1]);
        let runs = Rc::new(Cell::new(0));
        let (reader, counter) = (list.clone(), runs.clone());
        let result = Computed::new(move || {
            counter.set(counter.get() + 1);
            reader.get(0)
        });
        result.get();

        list.set(0, 1i64);
        Runtime::flush().unwrap();
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn pushed_containers_are_wrapped() {
        let list = reactive(&[]);
        let item = List::new();
        list.push(item.clone());
        assert!(item.is_reactive());

        let plain = List::new();
        let nested = List::new();
        plain.push(nested.clone());
        assert!(!nested.is_reactive());
    }
}
