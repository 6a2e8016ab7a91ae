//! Reconciliation keys.
//!
//! A key gives a widget an identity that survives rebuilds independently of
//! its content. Value keys compare by value, so a key rebuilt from the same
//! value matches; unique keys compare by identity, so only the very same
//! key object matches.
//!
//! While an element carrying the key is mounted, the key can hand out that
//! element and its node.

use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

use super::{ElementRef, RenderElement};
use crate::dom::NodeRef;
use crate::error::{Error, Result};

/// Value carried by a value key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyValue {
    Str(String),
    Int(i64),
}

impl From<&str> for KeyValue {
    fn from(value: &str) -> Self {
        KeyValue::Str(value.to_owned())
    }
}

impl From<String> for KeyValue {
    fn from(value: String) -> Self {
        KeyValue::Str(value)
    }
}

impl From<i64> for KeyValue {
    fn from(value: i64) -> Self {
        KeyValue::Int(value)
    }
}

impl From<usize> for KeyValue {
    fn from(value: usize) -> Self {
        KeyValue::Int(value as i64)
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Str(value) => f.write_str(value),
            KeyValue::Int(value) => write!(f, "{value}"),
        }
    }
}

struct KeyInner {
    value: Option<KeyValue>,
    element: RefCell<Option<Weak<dyn RenderElement>>>,
}

/// Identity token used to decide reuse during reconciliation.
#[derive(Clone)]
pub struct Key(Rc<KeyInner>);

impl Key {
    /// A key that matches any other key with an equal value.
    pub fn value(value: impl Into<KeyValue>) -> Self {
        Self::build(Some(value.into()))
    }

    /// A key that only matches itself (and its clones).
    pub fn unique() -> Self {
        Self::build(None)
    }

    fn build(value: Option<KeyValue>) -> Self {
        Key(Rc::new(KeyInner {
            value,
            element: RefCell::new(None),
        }))
    }

    pub fn key_value(&self) -> Option<&KeyValue> {
        self.0.value.as_ref()
    }

    /// The mounted element carrying this key.
    pub fn element(&self) -> Result<ElementRef> {
        self.0
            .element
            .borrow()
            .as_ref()
            .and_then(Weak::upgrade)
            .ok_or(Error::KeyNotMounted)
    }

    /// The node of the mounted element carrying this key.
    pub fn node(&self) -> Result<NodeRef> {
        Ok(self.element()?.node())
    }

    pub fn is_mounted(&self) -> bool {
        self.element().is_ok()
    }

    pub(crate) fn attach(&self, element: Weak<dyn RenderElement>) {
        *self.0.element.borrow_mut() = Some(element);
    }

    pub(crate) fn detach(&self) {
        self.0.element.borrow_mut().take();
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        match (&self.0.value, &other.0.value) {
            (Some(a), Some(b)) => a == b,
            (None, None) => Rc::ptr_eq(&self.0, &other.0),
            _ => false,
        }
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match &self.0.value {
            Some(value) => value.hash(state),
            None => (Rc::as_ptr(&self.0) as usize).hash(state),
        }
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.value {
            Some(value) => write!(f, "Key({value:?})"),
            None => write!(f, "Key(unique@{:p})", Rc::as_ptr(&self.0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn value_keys_compare_by_value() {
        assert_eq!(Key::value("a"), Key::value("a"));
        assert_ne!(Key::value("a"), Key::value("b"));
        assert_ne!(Key::value(1i64), Key::value("1"));
    }

    #[test]
    fn unique_keys_compare_by_identity() {
        let key = Key::unique();
        assert_eq!(key, key.clone());
        assert_ne!(key, Key::unique());
        assert_ne!(key, Key::value("a"));
    }

    #[test]
    fn keys_hash_consistently() {
        let unique = Key::unique();
        let set: HashSet<Key> = [Key::value("a"), Key::value("a"), unique.clone()]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 2);
        assert!(set.contains(&unique));
    }

    #[test]
    fn unmounted_key_has_no_element() {
        let key = Key::value("x");
        assert!(matches!(key.element(), Err(Error::KeyNotMounted)));
        assert!(matches!(key.node(), Err(Error::KeyNotMounted)));
        assert!(!key.is_mounted());
    }
}
