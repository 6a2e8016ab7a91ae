//! Text widgets and their elements.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use super::{ElementContext, ElementRef, Lifecycle, RenderElement, Widget};
use crate::dom::{DomFactory, NodeRef};
use crate::error::Result;

/// A text node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextWidget {
    pub value: String,
}

impl TextWidget {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

pub(crate) struct TextElement {
    parent: Option<Weak<dyn RenderElement>>,
    factory: Rc<dyn DomFactory>,
    node: NodeRef,
    widget: RefCell<Rc<TextWidget>>,
    lifecycle: Lifecycle,
}

impl TextElement {
    pub(crate) fn create(widget: Rc<TextWidget>, ctx: &ElementContext) -> Result<ElementRef> {
        let node = ctx.factory.create_text(&widget.value);
        Ok(Rc::new(Self {
            parent: ctx.parent.clone(),
            factory: ctx.factory.clone(),
            node,
            widget: RefCell::new(widget),
            lifecycle: Lifecycle::new(),
        }))
    }
}

impl RenderElement for TextElement {
    fn widget(&self) -> Widget {
        Widget::Text(self.widget.borrow().clone())
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
        self.lifecycle.mount("text")
    }

    fn unmount(&self) -> Result<()> {
        self.lifecycle.unmount("text")
    }

    fn update(&self, new_widget: &Widget, _force: bool) -> Result<bool> {
        let Widget::Text(new) = new_widget else {
            return Ok(false);
        };

        if new.value != self.widget.borrow().value {
            tracing::trace!(value = %new.value, "update text");
            self.node.set_text_content(&new.value);
        }
        *self.widget.borrow_mut() = new.clone();
        Ok(true)
    }

    fn children(&self) -> Vec<ElementRef> {
        Vec::new()
    }
}
