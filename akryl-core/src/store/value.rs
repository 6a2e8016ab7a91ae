//! Dynamic values held by reactive containers.

use std::fmt;

use super::{List, Map, Object, Set};
use crate::error::{Error, Result};
use crate::reactive::ChangeDetector;

/// Hashable scalar used as map key and set element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Atom {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl From<bool> for Atom {
    fn from(value: bool) -> Self {
        Atom::Bool(value)
    }
}

impl From<i64> for Atom {
    fn from(value: i64) -> Self {
        Atom::Int(value)
    }
}

impl From<&str> for Atom {
    fn from(value: &str) -> Self {
        Atom::Str(value.to_owned())
    }
}

impl From<String> for Atom {
    fn from(value: String) -> Self {
        Atom::Str(value)
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::Bool(value) => write!(f, "{value}"),
            Atom::Int(value) => write!(f, "{value}"),
            Atom::Str(value) => write!(f, "{value:?}"),
        }
    }
}

impl Atom {
    fn json_key(&self) -> String {
        match self {
            Atom::Bool(value) => value.to_string(),
            Atom::Int(value) => value.to_string(),
            Atom::Str(value) => value.clone(),
        }
    }
}

/// A JSON-like value.
///
/// Scalars compare by value. Containers are shared handles and compare by
/// identity, so storing the same container again is not a change.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(List),
    Object(Object),
    Map(Map),
    Set(Set),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a.ptr_eq(b),
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Map(a), Value::Map(b)) => a.ptr_eq(b),
            (Value::Set(a), Value::Set(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Numeric value, converting integers.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(value) => Some(*value),
            Value::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&List> {
        match self {
            Value::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&Set> {
        match self {
            Value::Set(set) => Some(set),
            _ => None,
        }
    }

    /// Whether the value is a container carrying reactive instrumentation.
    pub fn is_reactive(&self) -> bool {
        match self {
            Value::List(list) => list.is_reactive(),
            Value::Object(object) => object.is_reactive(),
            Value::Map(map) => map.is_reactive(),
            Value::Set(set) => set.is_reactive(),
            _ => false,
        }
    }

    fn container_addr(&self) -> Option<usize> {
        match self {
            Value::List(list) => Some(list.addr()),
            Value::Object(object) => Some(object.addr()),
            Value::Map(map) => Some(map.addr()),
            Value::Set(set) => Some(set.addr()),
            _ => None,
        }
    }

    /// Export as JSON. Reads are not tracked.
    ///
    /// Map keys become strings, sets become arrays and non-finite floats
    /// become `null`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cycle`] if a container contains itself.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        ChangeDetector::untracked(|| export(self, &mut Vec::new()))
    }
}

/// Install reactive instrumentation into `value` and everything reachable
/// from it. Scalars are returned as they are. Wrapping a container that is
/// already reactive does nothing, which also makes wrapping cyclic data
/// terminate.
pub fn wrap(value: &Value) -> Value {
    match value {
        Value::List(list) => list.wrap_deep(),
        Value::Object(object) => object.wrap_deep(),
        Value::Map(map) => map.wrap_deep(),
        Value::Set(set) => set.wrap_deep(),
        _ => {}
    }
    value.clone()
}

fn export(value: &Value, path: &mut Vec<usize>) -> Result<serde_json::Value> {
    let addr = value.container_addr();
    if let Some(addr) = addr {
        if path.contains(&addr) {
            return Err(Error::Cycle);
        }
        path.push(addr);
    }

    let json = match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(value) => serde_json::Value::Bool(*value),
        Value::Int(value) => serde_json::Value::from(*value),
        Value::Float(value) => serde_json::Number::from_f64(*value)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Str(value) => serde_json::Value::String(value.clone()),
        Value::List(list) => serde_json::Value::Array(
            list.values()
                .iter()
                .map(|item| export(item, path))
                .collect::<Result<_>>()?,
        ),
        Value::Object(object) => serde_json::Value::Object(
            object
                .entries()
                .into_iter()
                .map(|(key, item)| Ok((key, export(&item, path)?)))
                .collect::<Result<_>>()?,
        ),
        Value::Map(map) => serde_json::Value::Object(
            map.entries()
                .into_iter()
                .map(|(key, item)| Ok((key.json_key(), export(&item, path)?)))
                .collect::<Result<_>>()?,
        ),
        Value::Set(set) => serde_json::Value::Array(
            set.values()
                .into_iter()
                .map(|atom| export(&Value::from(atom), path))
                .collect::<Result<_>>()?,
        ),
    };

    if addr.is_some() {
        path.pop();
    }
    Ok(json)
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(value) => Value::Bool(value),
            serde_json::Value::Number(number) => match number.as_i64() {
                Some(value) => Value::Int(value),
                None => Value::Float(number.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(value) => Value::Str(value),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(entries) => Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<Atom> for Value {
    fn from(atom: Atom) -> Self {
        match atom {
            Atom::Bool(value) => Value::Bool(value),
            Atom::Int(value) => Value::Int(value),
            Atom::Str(value) => Value::Str(value),
        }
    }
}

impl From<List> for Value {
    fn from(list: List) -> Self {
        Value::List(list)
    }
}

impl From<Object> for Value {
    fn from(object: Object) -> Self {
        Value::Object(object)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Map(map)
    }
}

impl From<Set> for Value {
    fn from(set: Set) -> Self {
        Value::Set(set)
    }
}

/// Renders tracked: formatting a reactive value inside a tracked
/// evaluation depends on everything printed.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        display(self, f, &mut Vec::new())
    }
}

fn display(value: &Value, f: &mut fmt::Formatter<'_>, path: &mut Vec<usize>) -> fmt::Result {
    let addr = value.container_addr();
    if let Some(addr) = addr {
        if path.contains(&addr) {
            return f.write_str("<cycle>");
        }
        path.push(addr);
    }

    match value {
        Value::Null => f.write_str("null")?,
        Value::Bool(value) => write!(f, "{value}")?,
        Value::Int(value) => write!(f, "{value}")?,
        Value::Float(value) => write!(f, "{value}")?,
        Value::Str(value) => write!(f, "{value:?}")?,
        Value::List(list) => {
            f.write_str("[")?;
            for (index, item) in list.values().iter().enumerate() {
                if index > 0 {
                    f.write_str(", ")?;
                }
                display(item, f, path)?;
            }
            f.write_str("]")?;
        }
        Value::Object(object) => {
            f.write_str("{")?;
            for (index, (key, item)) in object.entries().iter().enumerate() {
                if index > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{key:?}: ")?;
                display(item, f, path)?;
            }
            f.write_str("}")?;
        }
        Value::Map(map) => {
            f.write_str("{")?;
            for (index, (key, item)) in map.entries().iter().enumerate() {
                if index > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{key}: ")?;
                display(item, f, path)?;
            }
            f.write_str("}")?;
        }
        Value::Set(set) => {
            f.write_str("#{")?;
            for (index, atom) in set.values().iter().enumerate() {
                if index > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{atom}")?;
            }
            f.write_str("}")?;
        }
    }

    if addr.is_some() {
        path.pop();
    }
    Ok(())
}
