//! Reactive Store
//!
//! Dynamic, JSON-like data whose reads can be tracked by the change
//! detector. A [`Value`] is a scalar or one of four shared containers:
//! [`List`], [`Object`], [`Map`] and [`Set`]. Containers start out plain;
//! [`wrap`] instruments a container and everything reachable from it, after
//! which reads subscribe the current evaluation per key or index and writes
//! notify only the readers of what changed.
//!
//! Containers compare by identity, scalars by value. Writing a value equal to
//! the stored one notifies nobody.

mod list;
mod object;
mod set;
mod tracking;
mod value;

pub use list::List;
pub use object::{Map, Object};
pub use set::Set;
pub use value::{wrap, Atom, Value};
