//! Keyed containers: string-keyed objects and atom-keyed maps.

use std::cell::{OnceCell, RefCell};
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use indexmap::IndexMap;

use super::tracking::Tracking;
use super::value::{wrap, Atom, Value};

/// Storage and instrumentation shared by [`Object`] and [`Map`].
struct Table<K> {
    entries: RefCell<IndexMap<K, Value>>,
    tracking: OnceCell<Tracking<K>>,
}

impl<K: Eq + Hash + Clone> Table<K> {
    fn new(entries: IndexMap<K, Value>) -> Self {
        Self {
            entries: RefCell::new(entries),
            tracking: OnceCell::new(),
        }
    }

    fn get(&self, key: &K) -> Option<Value> {
        if let Some(tracking) = self.tracking.get() {
            tracking.observe(key);
        }
        self.entries.borrow().get(key).cloned()
    }

    fn contains_key(&self, key: &K) -> bool {
        if let Some(tracking) = self.tracking.get() {
            tracking.observe(key);
        }
        self.entries.borrow().contains_key(key)
    }

    fn insert(&self, key: K, value: Value) -> Option<Value> {
        let Some(tracking) = self.tracking.get() else {
            return self.entries.borrow_mut().insert(key, value);
        };

        let value = wrap(&value);
        let old = self.entries.borrow().get(&key).cloned();
        if old.as_ref() == Some(&value) {
            return old;
        }

        self.entries.borrow_mut().insert(key.clone(), value);
        tracking.fire(&key);
        if old.is_none() {
            tracking.fire_shape();
        }
        old
    }

    fn remove(&self, key: &K) -> Option<Value> {
        let old = self.entries.borrow_mut().shift_remove(key);
        if let (Some(tracking), Some(_)) = (self.tracking.get(), &old) {
            tracking.fire_removed(key);
            tracking.fire_shape();
        }
        old
    }

    fn clear(&self) {
        let removed = std::mem::take(&mut *self.entries.borrow_mut());
        if removed.is_empty() {
            return;
        }
        if let Some(tracking) = self.tracking.get() {
            tracking.fire_all();
        }
    }

    fn len(&self) -> usize {
        if let Some(tracking) = self.tracking.get() {
            tracking.observe_shape();
        }
        self.entries.borrow().len()
    }

    fn keys(&self) -> Vec<K> {
        if let Some(tracking) = self.tracking.get() {
            tracking.observe_shape();
        }
        self.entries.borrow().keys().cloned().collect()
    }

    fn entries(&self) -> Vec<(K, Value)> {
        let entries: Vec<(K, Value)> = self
            .entries
            .borrow()
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        if let Some(tracking) = self.tracking.get() {
            tracking.observe_shape();
            for (key, _) in &entries {
                tracking.observe(key);
            }
        }
        entries
    }

    fn is_reactive(&self) -> bool {
        self.tracking.get().is_some()
    }

    fn wrap_deep(&self) {
        if self.tracking.set(Tracking::new()).is_err() {
            return;
        }
        let values: Vec<Value> = self.entries.borrow().values().cloned().collect();
        for value in &values {
            wrap(value);
        }
    }
}

macro_rules! keyed_container {
    ($(#[$meta:meta])* $name:ident, $key:ty) => {
        $(#[$meta])*
        #[derive(Clone)]
        pub struct $name(Rc<Table<$key>>);

        impl $name {
            pub fn new() -> Self {
                Self(Rc::new(Table::new(IndexMap::new())))
            }

            /// The value under `key`. Tracked per key.
            pub fn get(&self, key: impl Into<$key>) -> Option<Value> {
                self.0.get(&key.into())
            }

            pub fn contains_key(&self, key: impl Into<$key>) -> bool {
                self.0.contains_key(&key.into())
            }

            /// Store `value`, returning the previous one. On a reactive
            /// container the value is wrapped first, and nothing fires if
            /// it equals the stored value.
            pub fn insert(&self, key: impl Into<$key>, value: impl Into<Value>) -> Option<Value> {
                self.0.insert(key.into(), value.into())
            }

            pub fn remove(&self, key: impl Into<$key>) -> Option<Value> {
                self.0.remove(&key.into())
            }

            pub fn clear(&self) {
                self.0.clear()
            }

            /// Number of entries. Tracked on the container's shape.
            pub fn len(&self) -> usize {
                self.0.len()
            }

            pub fn is_empty(&self) -> bool {
                self.len() == 0
            }

            pub fn keys(&self) -> Vec<$key> {
                self.0.keys()
            }

            /// Snapshot of all entries in insertion order. Tracks the shape
            /// and every key.
            pub fn entries(&self) -> Vec<($key, Value)> {
                self.0.entries()
            }

            pub fn is_reactive(&self) -> bool {
                self.0.is_reactive()
            }

            pub fn ptr_eq(&self, other: &Self) -> bool {
                Rc::ptr_eq(&self.0, &other.0)
            }

            pub(crate) fn addr(&self) -> usize {
                Rc::as_ptr(&self.0) as usize
            }

            pub(crate) fn wrap_deep(&self) {
                self.0.wrap_deep()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl<K: Into<$key>, V: Into<Value>> FromIterator<(K, V)> for $name {
            fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
                let entries = iter
                    .into_iter()
                    .map(|(key, value)| (key.into(), value.into()))
                    .collect();
                Self(Rc::new(Table::new(entries)))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("len", &self.0.entries.borrow().len())
                    .field("reactive", &self.is_reactive())
                    .finish()
            }
        }
    };
}

keyed_container!(
    /// A record with string keys, the reactive counterpart of a plain
    /// object or struct.
    Object,
    String
);

keyed_container!(
    /// A map keyed by [`Atom`]s.
    Map,
    Atom
);
