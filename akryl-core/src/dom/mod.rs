//! DOM Abstraction
//!
//! The reconciler never talks to a concrete document. It drives a small set
//! of imperative node primitives, so any backend that implements
//! [`DomNode`] and [`DomFactory`] works: a browser binding, a server-side
//! string builder, or the inspectable [`memory`] backend used in tests.
//!
//! # Ownership
//!
//! Nodes are shared as [`NodeRef`] (`Rc<dyn DomNode>`). A node knows its
//! parent, so `remove` and `replace` are called on the node itself.
//! Backends may assume that every node they are handed was created by their
//! own factory and reject anything else with `Error::Unsupported`.

pub mod memory;

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::error::Result;

pub use memory::{MemoryDom, MemoryNode, NodeSnapshot};

/// Shared handle to a node.
pub type NodeRef = Rc<dyn DomNode>;

/// Event callback attached to a node.
pub type Listener = Rc<dyn Fn(&Event)>;

/// A dispatched event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Event type, e.g. `click`.
    pub kind: String,

    /// Optional payload, e.g. the new value of an input.
    pub value: Option<String>,
}

impl Event {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// Creates nodes for a backend.
pub trait DomFactory {
    /// Create an element node, optionally in an XML namespace.
    fn create_element(&self, tag: &str, namespace: Option<&str>) -> NodeRef;

    /// Create a text node.
    fn create_text(&self, text: &str) -> NodeRef;
}

/// The node primitives the reconciler relies on.
pub trait DomNode {
    /// Access to the concrete node type for backend downcasts.
    fn as_any(&self) -> &dyn Any;

    fn text_content(&self) -> Option<String>;
    fn set_text_content(&self, text: &str);

    /// Raw markup of the node's content.
    fn inner_html(&self) -> String;

    /// Replace the node's content with raw markup.
    fn set_inner_html(&self, html: &str) -> Result<()>;

    /// Append `child` as the last child. The child must be detached.
    fn append_child(&self, child: &NodeRef) -> Result<()>;

    /// Insert `child` at `index`, detaching it from its current parent first.
    fn insert_before(&self, index: usize, child: &NodeRef) -> Result<()>;

    /// Detach this node from its parent.
    fn remove(&self) -> Result<()>;

    /// Put `new_node` at this node's position and detach this node.
    fn replace(&self, new_node: &NodeRef) -> Result<()>;

    /// Detach every child and drop raw markup.
    fn clear(&self);

    fn child_count(&self) -> usize;
    fn child_at(&self, index: usize) -> Option<NodeRef>;

    fn set_attribute(&self, name: &str, value: &str);
    fn remove_attribute(&self, name: &str);

    fn set_style(&self, property: &str, value: &str);
    fn remove_style(&self, property: &str);

    fn add_event_listener(&self, kind: &str, listener: Listener);
    fn remove_event_listener(&self, kind: &str, listener: &Listener);
}

impl fmt::Debug for dyn DomNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomNode")
            .field("children", &self.child_count())
            .finish()
    }
}

/// Whether two handles point at the same node.
pub fn same_node(a: &NodeRef, b: &NodeRef) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

/// Whether two handles point at the same listener.
pub fn same_listener(a: &Listener, b: &Listener) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}
