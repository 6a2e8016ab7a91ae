//! Host element widgets.
//!
//! An [`HtmlWidget`] describes one element of the host document. Its element
//! applies updates as deltas: attributes, inline style, listeners and
//! children are each diffed against the previous widget and only the
//! differences reach the node.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use super::reconcile::reconcile_children;
use super::{ElementContext, ElementRef, Key, Lifecycle, RenderElement, Widget, STYLE_ATTRIBUTE};
use crate::dom::{same_listener, DomFactory, Event, Listener, NodeRef};
use crate::error::Result;

/// Description of a host element.
///
/// `children` and `inner_html` are mutually exclusive; whichever builder
/// call comes last wins.
///
/// # Example
///
/// ```rust,ignore
/// let form = HtmlWidget::new("div")
///     .child(HtmlWidget::new("label").attr("for", "name").text("name"))
///     .child(HtmlWidget::new("input").attr("id", "name").attr("type", "text"))
///     .child(HtmlWidget::new("button").attr("type", "submit"));
/// ```
#[derive(Clone, Default)]
pub struct HtmlWidget {
    pub tag: String,
    pub namespace: Option<String>,
    pub css_prefix: Option<String>,
    pub key: Option<Key>,
    pub attributes: IndexMap<String, String>,
    pub style: IndexMap<String, String>,
    pub listeners: IndexMap<String, Listener>,
    pub children: Vec<Widget>,
    pub inner_html: Option<String>,
}

impl HtmlWidget {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Scope prefix written to the `data-id` attribute.
    pub fn css_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.css_prefix = Some(prefix.into());
        self
    }

    pub fn key(mut self, key: Key) -> Self {
        self.key = Some(key);
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn style(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.style.insert(property.into(), value.into());
        self
    }

    /// Attach a listener for events of `kind`.
    pub fn on(self, kind: impl Into<String>, listener: impl Fn(&Event) + 'static) -> Self {
        self.listener(kind, Rc::new(listener))
    }

    /// Attach an existing listener handle. Reusing the same handle across
    /// rebuilds keeps the node's listener untouched.
    pub fn listener(mut self, kind: impl Into<String>, listener: Listener) -> Self {
        self.listeners.insert(kind.into(), listener);
        self
    }

    pub fn child(mut self, child: impl Into<Widget>) -> Self {
        self.children.push(child.into());
        self.inner_html = None;
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Widget>) -> Self {
        self.children.extend(children);
        self.inner_html = None;
        self
    }

    /// Replace the children with a single text node.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children = vec![Widget::text(text)];
        self.inner_html = None;
        self
    }

    /// Replace the children with raw markup.
    pub fn inner_html(mut self, html: impl Into<String>) -> Self {
        self.children.clear();
        self.inner_html = Some(html.into());
        self
    }
}

impl fmt::Debug for HtmlWidget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HtmlWidget")
            .field("tag", &self.tag)
            .field("key", &self.key)
            .field("attributes", &self.attributes)
            .field("style", &self.style)
            .field("listeners", &self.listeners.keys().collect::<Vec<_>>())
            .field("children", &self.children)
            .field("inner_html", &self.inner_html)
            .finish()
    }
}

pub(crate) struct HtmlElement {
    this: Weak<HtmlElement>,
    parent: Option<Weak<dyn RenderElement>>,
    factory: Rc<dyn DomFactory>,
    node: NodeRef,
    widget: RefCell<Rc<HtmlWidget>>,
    children: RefCell<Vec<ElementRef>>,
    lifecycle: Lifecycle,
}

impl HtmlElement {
    pub(crate) fn create(widget: Rc<HtmlWidget>, ctx: &ElementContext) -> Result<ElementRef> {
        let node = ctx
            .factory
            .create_element(&widget.tag, widget.namespace.as_deref());

        if let Some(prefix) = &widget.css_prefix {
            node.set_attribute(STYLE_ATTRIBUTE, prefix);
        }
        for (name, value) in &widget.attributes {
            node.set_attribute(name, value);
        }
        for (property, value) in &widget.style {
            node.set_style(property, value);
        }
        for (kind, listener) in &widget.listeners {
            node.add_event_listener(kind, listener.clone());
        }

        let element = Rc::new_cyclic(|this| Self {
            this: this.clone(),
            parent: ctx.parent.clone(),
            factory: ctx.factory.clone(),
            node: node.clone(),
            widget: RefCell::new(widget.clone()),
            children: RefCell::new(Vec::new()),
            lifecycle: Lifecycle::new(),
        });

        let child_ctx = element.child_context();
        let mut children = Vec::with_capacity(widget.children.len());
        for child in &widget.children {
            let child = child.create_element(&child_ctx)?;
            node.append_child(&child.node())?;
            children.push(child);
        }
        *element.children.borrow_mut() = children;

        if let Some(html) = &widget.inner_html {
            node.set_inner_html(html)?;
        }
        Ok(element)
    }

    fn child_context(&self) -> ElementContext {
        ElementContext::child_of(self.this.clone(), self.factory.clone())
    }

    fn update_css_prefix(&self, old: &HtmlWidget, new: &HtmlWidget) {
        if old.css_prefix == new.css_prefix {
            return;
        }
        match &new.css_prefix {
            Some(prefix) => self.node.set_attribute(STYLE_ATTRIBUTE, prefix),
            None => self.node.remove_attribute(STYLE_ATTRIBUTE),
        }
    }

    fn update_attributes(&self, old: &HtmlWidget, new: &HtmlWidget) {
        diff_maps(
            &old.attributes,
            &new.attributes,
            |name, value| self.node.set_attribute(name, value),
            |name| self.node.remove_attribute(name),
        );
    }

    fn update_style(&self, old: &HtmlWidget, new: &HtmlWidget) {
        diff_maps(
            &old.style,
            &new.style,
            |property, value| self.node.set_style(property, value),
            |property| self.node.remove_style(property),
        );
    }

    fn update_listeners(&self, old: &HtmlWidget, new: &HtmlWidget) {
        for (kind, old_listener) in &old.listeners {
            match new.listeners.get(kind) {
                Some(new_listener) if same_listener(old_listener, new_listener) => {}
                Some(new_listener) => {
                    self.node.remove_event_listener(kind, old_listener);
                    self.node.add_event_listener(kind, new_listener.clone());
                }
                None => self.node.remove_event_listener(kind, old_listener),
            }
        }
        for (kind, new_listener) in &new.listeners {
            if !old.listeners.contains_key(kind) {
                self.node.add_event_listener(kind, new_listener.clone());
            }
        }
    }

    fn update_children(&self, old: &HtmlWidget, new: &HtmlWidget, force: bool) -> Result<()> {
        if old.inner_html.is_some() && new.inner_html.is_none() {
            self.node.clear();
        }

        let old_children = std::mem::take(&mut *self.children.borrow_mut());
        let children = reconcile_children(
            &self.node,
            &self.child_context(),
            old_children,
            &new.children,
            force,
            self.lifecycle.is_mounted(),
        )?;
        *self.children.borrow_mut() = children;

        if let Some(html) = &new.inner_html {
            if old.inner_html.as_ref() != Some(html) {
                self.node.set_inner_html(html)?;
            }
        }
        Ok(())
    }
}

/// Apply the delta between two string maps.
fn diff_maps(
    old: &IndexMap<String, String>,
    new: &IndexMap<String, String>,
    mut set: impl FnMut(&str, &str),
    mut remove: impl FnMut(&str),
) {
    for (key, old_value) in old {
        match new.get(key) {
            Some(new_value) if new_value == old_value => {}
            Some(new_value) => set(key, new_value),
            None => remove(key),
        }
    }
    for (key, new_value) in new {
        if !old.contains_key(key) {
            set(key, new_value);
        }
    }
}

impl RenderElement for HtmlElement {
    fn widget(&self) -> Widget {
        Widget::Html(self.widget.borrow().clone())
    }

    fn parent_link(&self) -> Option<Weak<dyn RenderElement>> {
        self.parent.clone()
    }

    fn node(&self) -> NodeRef {
        self.node.clone()
    }

    fn factory(&self) -> Rc<dyn DomFactory> {
        self.factory.clone()
    }

    fn is_mounted(&self) -> bool {
        self.lifecycle.is_mounted()
    }

    fn mount(&self) -> Result<()> {
        self.lifecycle.mount("html")?;
        if let Some(key) = &self.widget.borrow().key {
            key.attach(self.this.clone());
        }
        for child in self.children() {
            child.mount()?;
        }
        Ok(())
    }

    fn unmount(&self) -> Result<()> {
        self.lifecycle.unmount("html")?;
        if let Some(key) = &self.widget.borrow().key {
            key.detach();
        }
        for child in self.children() {
            child.unmount()?;
        }
        Ok(())
    }

    fn update(&self, new_widget: &Widget, force: bool) -> Result<bool> {
        let Widget::Html(new) = new_widget else {
            return Ok(false);
        };
        let old = self.widget.borrow().clone();
        if old.tag != new.tag || old.namespace != new.namespace {
            return Ok(false);
        }

        self.update_css_prefix(&old, new);
        self.update_attributes(&old, new);
        self.update_style(&old, new);
        self.update_listeners(&old, new);
        self.update_children(&old, new, force)?;

        if self.lifecycle.is_mounted() {
            if let Some(key) = &old.key {
                key.detach();
            }
            if let Some(key) = &new.key {
                key.attach(self.this.clone());
            }
        }
        *self.widget.borrow_mut() = new.clone();
        Ok(true)
    }

    fn children(&self) -> Vec<ElementRef> {
        self.children.borrow().clone()
    }
}
