//! In-memory DOM backend.
//!
//! A small, fully inspectable document used by tests, benchmarks and
//! headless hosts. Besides the [`DomNode`] primitives it can render itself
//! to markup (`to_html`) and produce structural [`NodeSnapshot`]s that
//! compare equal regardless of attribute order.

use std::any::Any;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use serde::Serialize;

use super::{same_listener, DomFactory, DomNode, Event, Listener, NodeRef};
use crate::error::{Error, Result};
use crate::widget::{Widget, STYLE_ATTRIBUTE};

const TEXT_TAG: &str = "text";

/// Factory for [`MemoryNode`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct MemoryDom;

impl MemoryDom {
    /// A fresh detached container element, handy as a mount point.
    pub fn container() -> NodeRef {
        MemoryDom.create_element("div", None)
    }
}

impl DomFactory for MemoryDom {
    fn create_element(&self, tag: &str, namespace: Option<&str>) -> NodeRef {
        MemoryNode::create(tag, namespace.map(str::to_owned), None)
    }

    fn create_text(&self, text: &str) -> NodeRef {
        MemoryNode::create(TEXT_TAG, None, Some(text.to_owned()))
    }
}

/// A node of the in-memory document.
pub struct MemoryNode {
    this: Weak<MemoryNode>,
    tag: String,
    namespace: Option<String>,
    parent: RefCell<Weak<MemoryNode>>,
    children: RefCell<Vec<Rc<MemoryNode>>>,
    attributes: RefCell<IndexMap<String, String>>,
    style: RefCell<IndexMap<String, String>>,
    listeners: RefCell<IndexMap<String, Vec<Listener>>>,
    text: RefCell<Option<String>>,
    markup: RefCell<Option<String>>,
}

impl MemoryNode {
    fn create(tag: &str, namespace: Option<String>, text: Option<String>) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            this: this.clone(),
            tag: tag.to_owned(),
            namespace,
            parent: RefCell::new(Weak::new()),
            children: RefCell::new(Vec::new()),
            attributes: RefCell::new(IndexMap::new()),
            style: RefCell::new(IndexMap::new()),
            listeners: RefCell::new(IndexMap::new()),
            text: RefCell::new(text),
            markup: RefCell::new(None),
        })
    }

    /// Downcast a node handle created by [`MemoryDom`].
    pub fn from_ref(node: &NodeRef) -> Option<Rc<MemoryNode>> {
        node.as_any()
            .downcast_ref::<MemoryNode>()
            .and_then(|node| node.this.upgrade())
    }

    fn expect_memory(node: &NodeRef) -> Result<Rc<MemoryNode>> {
        Self::from_ref(node).ok_or(Error::Unsupported {
            operation: "nodes from another backend",
        })
    }

    fn is_text(&self) -> bool {
        self.tag == TEXT_TAG && self.namespace.is_none()
    }

    fn detach_from_parent(&self) {
        let parent = self.parent.replace(Weak::new());
        if let Some(parent) = parent.upgrade() {
            parent
                .children
                .borrow_mut()
                .retain(|child| !std::ptr::eq(Rc::as_ptr(child), self));
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn parent(&self) -> Option<Rc<MemoryNode>> {
        self.parent.borrow().upgrade()
    }

    pub fn children(&self) -> Vec<Rc<MemoryNode>> {
        self.children.borrow().clone()
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.borrow().get(name).cloned()
    }

    pub fn style_property(&self, property: &str) -> Option<String> {
        self.style.borrow().get(property).cloned()
    }

    pub fn listener_count(&self, kind: &str) -> usize {
        self.listeners.borrow().get(kind).map_or(0, Vec::len)
    }

    /// Call every listener registered for `event.kind`.
    pub fn dispatch(&self, event: &Event) {
        let listeners = self
            .listeners
            .borrow()
            .get(&event.kind)
            .cloned()
            .unwrap_or_default();
        for listener in listeners {
            listener(event);
        }
    }

    /// Render the subtree as markup: `<tag a='v' style='k: v'>...</tag>`,
    /// or `<tag .../>` when empty. Text nodes render their content.
    pub fn to_html(&self) -> String {
        if self.is_text() {
            return self.text.borrow().clone().unwrap_or_default();
        }

        let mut attrs: Vec<String> = self
            .attributes
            .borrow()
            .iter()
            .map(|(k, v)| format!("{k}='{v}'"))
            .collect();
        let style = self.style.borrow();
        if !style.is_empty() {
            let style: Vec<String> = style.iter().map(|(k, v)| format!("{k}: {v}")).collect();
            attrs.push(format!("style='{}'", style.join("; ")));
        }

        let mut out = format!("<{}", self.tag);
        for attr in &attrs {
            out.push(' ');
            out.push_str(attr);
        }

        let inner = self.inner_html();
        if inner.is_empty() {
            out.push_str("/>");
        } else {
            out.push('>');
            out.push_str(&inner);
            out.push_str(&format!("</{}>", self.tag));
        }
        out
    }

    /// Structural copy of the subtree.
    pub fn snapshot(&self) -> NodeSnapshot {
        NodeSnapshot {
            tag: self.tag.clone(),
            namespace: self.namespace.clone(),
            text: if self.is_text() {
                self.text.borrow().clone()
            } else {
                None
            },
            attributes: self.attributes.borrow().clone().into_iter().collect(),
            style: self.style.borrow().clone().into_iter().collect(),
            listeners: self
                .listeners
                .borrow()
                .iter()
                .map(|(k, v)| (k.clone(), v.len()))
                .collect(),
            inner_html: self.markup.borrow().clone(),
            children: self.children.borrow().iter().map(|c| c.snapshot()).collect(),
        }
    }
}

impl DomNode for MemoryNode {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn text_content(&self) -> Option<String> {
        if self.is_text() {
            return self.text.borrow().clone();
        }
        let text: String = self
            .children
            .borrow()
            .iter()
            .filter_map(|child| child.text_content())
            .collect();
        Some(text)
    }

    fn set_text_content(&self, text: &str) {
        if self.is_text() {
            *self.text.borrow_mut() = Some(text.to_owned());
            return;
        }
        self.clear();
        let node = MemoryNode::create(TEXT_TAG, None, Some(text.to_owned()));
        *node.parent.borrow_mut() = self.this.clone();
        self.children.borrow_mut().push(node);
    }

    fn inner_html(&self) -> String {
        if let Some(markup) = &*self.markup.borrow() {
            return markup.clone();
        }
        self.children.borrow().iter().map(|c| c.to_html()).collect()
    }

    fn set_inner_html(&self, html: &str) -> Result<()> {
        if self.is_text() {
            return Err(Error::Unsupported {
                operation: "inner markup on text nodes",
            });
        }
        self.clear();
        *self.markup.borrow_mut() = Some(html.to_owned());
        Ok(())
    }

    fn append_child(&self, child: &NodeRef) -> Result<()> {
        let child = Self::expect_memory(child)?;
        if child.parent().is_some() {
            return Err(Error::Attached);
        }
        self.markup.borrow_mut().take();
        *child.parent.borrow_mut() = self.this.clone();
        self.children.borrow_mut().push(child);
        Ok(())
    }

    fn insert_before(&self, index: usize, child: &NodeRef) -> Result<()> {
        let child = Self::expect_memory(child)?;
        child.detach_from_parent();
        self.markup.borrow_mut().take();

        let mut children = self.children.borrow_mut();
        let index = index.min(children.len());
        *child.parent.borrow_mut() = self.this.clone();
        children.insert(index, child);
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        if self.parent().is_none() {
            return Err(Error::Detached);
        }
        self.detach_from_parent();
        Ok(())
    }

    fn replace(&self, new_node: &NodeRef) -> Result<()> {
        let new_node = Self::expect_memory(new_node)?;
        let parent = self.parent().ok_or(Error::Detached)?;
        if new_node.parent().is_some() {
            return Err(Error::Attached);
        }

        let mut children = parent.children.borrow_mut();
        let index = children
            .iter()
            .position(|child| std::ptr::eq(Rc::as_ptr(child), self))
            .ok_or(Error::Detached)?;
        *new_node.parent.borrow_mut() = Rc::downgrade(&parent);
        children[index] = new_node;
        drop(children);

        *self.parent.borrow_mut() = Weak::new();
        Ok(())
    }

    fn clear(&self) {
        let children = std::mem::take(&mut *self.children.borrow_mut());
        for child in children {
            *child.parent.borrow_mut() = Weak::new();
        }
        self.markup.borrow_mut().take();
    }

    fn child_count(&self) -> usize {
        self.children.borrow().len()
    }

    fn child_at(&self, index: usize) -> Option<NodeRef> {
        self.children
            .borrow()
            .get(index)
            .map(|child| child.clone() as NodeRef)
    }

    fn set_attribute(&self, name: &str, value: &str) {
        tracing::trace!(tag = %self.tag, name, value, "set attribute");
        self.attributes
            .borrow_mut()
            .insert(name.to_owned(), value.to_owned());
    }

    fn remove_attribute(&self, name: &str) {
        tracing::trace!(tag = %self.tag, name, "remove attribute");
        self.attributes.borrow_mut().shift_remove(name);
    }

    fn set_style(&self, property: &str, value: &str) {
        self.style
            .borrow_mut()
            .insert(property.to_owned(), value.to_owned());
    }

    fn remove_style(&self, property: &str) {
        self.style.borrow_mut().shift_remove(property);
    }

    fn add_event_listener(&self, kind: &str, listener: Listener) {
        self.listeners
            .borrow_mut()
            .entry(kind.to_owned())
            .or_default()
            .push(listener);
    }

    fn remove_event_listener(&self, kind: &str, listener: &Listener) {
        let mut listeners = self.listeners.borrow_mut();
        if let Some(registered) = listeners.get_mut(kind) {
            if let Some(index) = registered.iter().position(|l| same_listener(l, listener)) {
                registered.remove(index);
            }
            if registered.is_empty() {
                listeners.shift_remove(kind);
            }
        }
    }
}

impl fmt::Debug for MemoryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_html())
    }
}

impl fmt::Display for MemoryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_html())
    }
}

/// Structural description of a node subtree, used for assertions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeSnapshot {
    pub tag: String,
    pub namespace: Option<String>,
    pub text: Option<String>,
    pub attributes: BTreeMap<String, String>,
    pub style: BTreeMap<String, String>,
    /// Number of listeners per event type.
    pub listeners: BTreeMap<String, usize>,
    pub inner_html: Option<String>,
    pub children: Vec<NodeSnapshot>,
}

impl NodeSnapshot {
    /// The snapshot a freshly created host or text widget would produce.
    ///
    /// Returns `None` for component widgets, whose output depends on their
    /// build.
    pub fn from_widget(widget: &Widget) -> Option<NodeSnapshot> {
        match widget {
            Widget::Text(text) => Some(NodeSnapshot {
                tag: TEXT_TAG.to_owned(),
                namespace: None,
                text: Some(text.value.clone()),
                attributes: BTreeMap::new(),
                style: BTreeMap::new(),
                listeners: BTreeMap::new(),
                inner_html: None,
                children: Vec::new(),
            }),
            Widget::Html(html) => {
                let mut attributes: BTreeMap<String, String> = html
                    .attributes
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                if let Some(prefix) = &html.css_prefix {
                    attributes.insert(STYLE_ATTRIBUTE.to_owned(), prefix.clone());
                }

                let children = html
                    .children
                    .iter()
                    .map(NodeSnapshot::from_widget)
                    .collect::<Option<Vec<_>>>()?;

                Some(NodeSnapshot {
                    tag: html.tag.clone(),
                    namespace: html.namespace.clone(),
                    text: None,
                    attributes,
                    style: html
                        .style
                        .iter()
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect(),
                    listeners: html.listeners.keys().map(|k| (k.clone(), 1)).collect(),
                    inner_html: html.inner_html.clone(),
                    children,
                })
            }
            Widget::Stateless(_) | Widget::Stateful(_) => None,
        }
    }

    /// Serialize the snapshot as pretty JSON, for readable test failures.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}
