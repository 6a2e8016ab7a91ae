//! Late-initialized slots.

use std::cell::RefCell;
use std::fmt;

use crate::error::{Error, Result};

/// A value assigned after construction. Reading it earlier is an error
/// rather than a default.
pub struct LateInit<T> {
    name: &'static str,
    value: RefCell<Option<T>>,
}

impl<T> LateInit<T> {
    /// Create an empty slot. `name` shows up in the `Uninitialized` error.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            value: RefCell::new(None),
        }
    }

    /// Read the value.
    pub fn get(&self) -> Result<T>
    where
        T: Clone,
    {
        self.value
            .borrow()
            .clone()
            .ok_or(Error::Uninitialized { name: self.name })
    }

    /// Borrow the value.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> Result<R> {
        match &*self.value.borrow() {
            Some(value) => Ok(f(value)),
            None => Err(Error::Uninitialized { name: self.name }),
        }
    }

    /// Assign (or reassign) the value.
    pub fn set(&self, value: T) {
        *self.value.borrow_mut() = Some(value);
    }

    pub fn is_initialized(&self) -> bool {
        self.value.borrow().is_some()
    }
}

impl<T: fmt::Debug> fmt::Debug for LateInit<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LateInit")
            .field("name", &self.name)
            .field("value", &*self.value.borrow())
            .finish()
    }
}
