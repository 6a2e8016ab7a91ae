//! Widget Tree
//!
//! Widgets are immutable descriptions of what should be on screen. Render
//! elements are their live counterparts: each one is bound to a DOM node,
//! knows its parent, and holds the widget it currently represents.
//!
//! # Widget kinds
//!
//! - [`HtmlWidget`]: a host element with attributes, inline style,
//!   listeners and children (or raw inner markup).
//! - [`TextWidget`]: a text node.
//! - [`StatelessWidget`]: a component rebuilt from its own fields.
//! - [`StatefulWidget`]: a component with a [`State`] that survives rebuilds.
//!
//! # Element lifecycle
//!
//! `created -> mounted -> unmounted`. Unmounted is terminal: mounting twice
//! or unmounting twice is an error. Mount propagates depth-first pre-order;
//! unmount tears down the element before its subtree.
//!
//! # Reconciliation
//!
//! [`update`] decides per element whether a new widget can be applied in
//! place or whether the element must be replaced. See [`reconcile`].

mod context;
mod html;
mod key;
pub mod reconcile;
mod registry;
mod stateful;
mod stateless;
mod text;

use std::any::Any;
use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::dom::{DomFactory, NodeRef};
use crate::error::{Error, Result};

pub use context::{BuildContext, StateContext};
pub use html::HtmlWidget;
pub use key::{Key, KeyValue};
pub use reconcile::{mount, update, MountRef};
pub use registry::WidgetTypes;
pub use stateful::{AnyStateful, State, StateMixin, StatefulWidget};
pub use stateless::{AnyStateless, StatelessWidget};
pub use text::TextWidget;

/// Attribute carrying the CSS scope prefix of a host element.
pub const STYLE_ATTRIBUTE: &str = "data-id";

/// Shared handle to a render element.
pub type ElementRef = Rc<dyn RenderElement>;

/// An immutable UI description. Cloning is cheap.
#[derive(Clone)]
pub enum Widget {
    Html(Rc<HtmlWidget>),
    Text(Rc<TextWidget>),
    Stateless(Rc<dyn AnyStateless>),
    Stateful(Rc<dyn AnyStateful>),
}

impl Widget {
    /// A text widget.
    pub fn text(value: impl Into<String>) -> Widget {
        Widget::Text(Rc::new(TextWidget::new(value)))
    }

    /// Wrap a stateless component.
    pub fn stateless<W: StatelessWidget>(widget: W) -> Widget {
        Widget::Stateless(Rc::new(widget))
    }

    /// Wrap a stateful component.
    pub fn stateful<W: StatefulWidget>(widget: W) -> Widget {
        Widget::Stateful(Rc::new(widget))
    }

    /// The widget's reconciliation key.
    pub fn key(&self) -> Option<Key> {
        match self {
            Widget::Html(html) => html.key.clone(),
            Widget::Text(_) => None,
            Widget::Stateless(widget) => widget.key(),
            Widget::Stateful(widget) => widget.key(),
        }
    }

    /// Short description of the widget kind, used in logs and errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Widget::Html(_) => "html",
            Widget::Text(_) => "text",
            Widget::Stateless(widget) => widget.type_name(),
            Widget::Stateful(widget) => widget.type_name(),
        }
    }

    /// Whether both handles refer to the same widget instance.
    pub fn ptr_eq(&self, other: &Widget) -> bool {
        match (self, other) {
            (Widget::Html(a), Widget::Html(b)) => Rc::ptr_eq(a, b),
            (Widget::Text(a), Widget::Text(b)) => Rc::ptr_eq(a, b),
            (Widget::Stateless(a), Widget::Stateless(b)) => {
                std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
            }
            (Widget::Stateful(a), Widget::Stateful(b)) => {
                std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
            }
            _ => false,
        }
    }

    /// Create a fresh, unmounted element for this widget.
    pub fn create_element(&self, ctx: &ElementContext) -> Result<ElementRef> {
        match self {
            Widget::Html(html) => html::HtmlElement::create(html.clone(), ctx),
            Widget::Text(text) => text::TextElement::create(text.clone(), ctx),
            Widget::Stateless(widget) => stateless::StatelessElement::create(widget.clone(), ctx),
            Widget::Stateful(widget) => widget.clone().create_element(ctx),
        }
    }
}

impl From<HtmlWidget> for Widget {
    fn from(widget: HtmlWidget) -> Self {
        Widget::Html(Rc::new(widget))
    }
}

impl From<TextWidget> for Widget {
    fn from(widget: TextWidget) -> Self {
        Widget::Text(Rc::new(widget))
    }
}

impl fmt::Debug for Widget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Widget::Html(html) => fmt::Debug::fmt(&**html, f),
            Widget::Text(text) => fmt::Debug::fmt(&**text, f),
            Widget::Stateless(widget) => write!(f, "Stateless({})", widget.type_name()),
            Widget::Stateful(widget) => write!(f, "Stateful({})", widget.type_name()),
        }
    }
}

/// What a new element needs from its surroundings.
#[derive(Clone)]
pub struct ElementContext {
    pub(crate) parent: Option<Weak<dyn RenderElement>>,
    pub(crate) factory: Rc<dyn DomFactory>,
}

impl ElementContext {
    /// Context for a top-level element.
    pub fn root(factory: Rc<dyn DomFactory>) -> Self {
        Self {
            parent: None,
            factory,
        }
    }

    pub(crate) fn child_of(parent: Weak<dyn RenderElement>, factory: Rc<dyn DomFactory>) -> Self {
        Self {
            parent: Some(parent),
            factory,
        }
    }
}

/// The live, mounted counterpart of a widget.
pub trait RenderElement {
    /// The widget the element currently represents.
    fn widget(&self) -> Widget;

    /// Non-owning link to the parent element.
    fn parent_link(&self) -> Option<Weak<dyn RenderElement>>;

    fn parent(&self) -> Option<ElementRef> {
        self.parent_link().and_then(|parent| parent.upgrade())
    }

    /// The DOM node the element is bound to. Component elements report
    /// the node of their built subtree.
    fn node(&self) -> NodeRef;

    /// The factory used to create nodes for new children.
    fn factory(&self) -> Rc<dyn DomFactory>;

    fn is_mounted(&self) -> bool;

    /// Mark the element and its subtree mounted.
    fn mount(&self) -> Result<()>;

    /// Mark the element and its subtree unmounted, releasing every reactive
    /// handle they own.
    fn unmount(&self) -> Result<()>;

    /// Apply `new_widget` in place. Returns `false` if the widget is not
    /// compatible with this element, in which case nothing was changed.
    fn update(&self, new_widget: &Widget, force: bool) -> Result<bool>;

    /// The state object of a stateful element.
    fn state(&self) -> Option<Rc<dyn Any>> {
        None
    }

    /// Direct child elements.
    fn children(&self) -> Vec<ElementRef>;
}

impl fmt::Debug for dyn RenderElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderElement")
            .field("widget", &self.widget())
            .field("mounted", &self.is_mounted())
            .finish()
    }
}

/// Whether two handles point at the same element.
pub fn same_element(a: &ElementRef, b: &ElementRef) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Created,
    Mounted,
    Unmounted,
}

/// Mount state shared by every element kind.
#[derive(Debug)]
pub(crate) struct Lifecycle {
    phase: Cell<Phase>,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        Self {
            phase: Cell::new(Phase::Created),
        }
    }

    pub(crate) fn mount(&self, element: &'static str) -> Result<()> {
        if self.phase.get() != Phase::Created {
            return Err(Error::AlreadyMounted { element });
        }
        tracing::debug!(element, "mount");
        self.phase.set(Phase::Mounted);
        Ok(())
    }

    pub(crate) fn unmount(&self, element: &'static str) -> Result<()> {
        if self.phase.get() != Phase::Mounted {
            return Err(Error::NotMounted { element });
        }
        tracing::debug!(element, "unmount");
        self.phase.set(Phase::Unmounted);
        Ok(())
    }

    pub(crate) fn is_mounted(&self) -> bool {
        self.phase.get() == Phase::Mounted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_is_one_way() {
        let lifecycle = Lifecycle::new();
        assert!(!lifecycle.is_mounted());
        assert_eq!(
            lifecycle.unmount("div"),
            Err(Error::NotMounted { element: "div" })
        );

        lifecycle.mount("div").unwrap();
        assert!(lifecycle.is_mounted());
        assert_eq!(
            lifecycle.mount("div"),
            Err(Error::AlreadyMounted { element: "div" })
        );

        lifecycle.unmount("div").unwrap();
        assert_eq!(
            lifecycle.mount("div"),
            Err(Error::AlreadyMounted { element: "div" })
        );
    }

    #[test]
    fn widget_keys() {
        let html = Widget::from(HtmlWidget::new("div").key(Key::value("a")));
        assert_eq!(html.key(), Some(Key::value("a")));
        assert_eq!(Widget::text("x").key(), None);
        assert_eq!(html.kind_name(), "html");
    }

    #[test]
    fn ptr_eq_distinguishes_instances() {
        let a = Widget::text("x");
        let b = Widget::text("x");
        assert!(a.ptr_eq(&a.clone()));
        assert!(!a.ptr_eq(&b));
    }
}
