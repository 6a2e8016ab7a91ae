//! Stateless components.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use super::reconcile;
use super::{BuildContext, ElementContext, ElementRef, Key, Lifecycle, RenderElement, Widget, WidgetTypes};
use crate::dom::{DomFactory, NodeRef};
use crate::error::Result;
use crate::reactive::{ChangeDetector, ReactiveHandle};
use crate::scheduler::RebuildScheduler;
use crate::style::{Style, StyleRegistry};

/// A component whose output depends only on its own fields and on the
/// reactive values it reads while building.
///
/// Reactive reads inside [`build`](StatelessWidget::build) are tracked; when
/// one of them changes, the component rebuilds on the next animation frame.
pub trait StatelessWidget: 'static {
    fn key(&self) -> Option<Key> {
        None
    }

    fn style(&self) -> Option<Rc<dyn Style>> {
        None
    }

    fn build(&self, ctx: &BuildContext) -> Widget;
}

/// Object-safe view of a [`StatelessWidget`].
pub trait AnyStateless {
    fn as_any(&self) -> &dyn Any;
    fn type_name(&self) -> &'static str;
    fn key(&self) -> Option<Key>;
    fn build(&self, ctx: &BuildContext) -> Widget;
    fn register_style(&self);
}

impl<W: StatelessWidget> AnyStateless for W {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<W>()
    }

    fn key(&self) -> Option<Key> {
        StatelessWidget::key(self)
    }

    fn build(&self, ctx: &BuildContext) -> Widget {
        StatelessWidget::build(self, ctx)
    }

    fn register_style(&self) {
        WidgetTypes::register::<W>();
        StyleRegistry::register::<W>(self.style().as_deref());
    }
}

pub(crate) struct StatelessElement {
    this: Weak<StatelessElement>,
    parent: Option<Weak<dyn RenderElement>>,
    factory: Rc<dyn DomFactory>,
    widget: RefCell<Rc<dyn AnyStateless>>,
    inner: RefCell<Option<ElementRef>>,
    handle: RefCell<Option<ReactiveHandle>>,
    dirty: Rc<Cell<bool>>,
    scheduler: RebuildScheduler,
    lifecycle: Lifecycle,
}

impl StatelessElement {
    pub(crate) fn create(widget: Rc<dyn AnyStateless>, ctx: &ElementContext) -> Result<ElementRef> {
        let element = Rc::new_cyclic(|this| Self {
            this: this.clone(),
            parent: ctx.parent.clone(),
            factory: ctx.factory.clone(),
            widget: RefCell::new(widget),
            inner: RefCell::new(None),
            handle: RefCell::new(None),
            dirty: Rc::new(Cell::new(false)),
            scheduler: RebuildScheduler::new(),
            lifecycle: Lifecycle::new(),
        });

        let built = element.build()?;
        let inner = built.create_element(&ElementContext::child_of(
            element.this.clone(),
            element.factory.clone(),
        ))?;
        *element.inner.borrow_mut() = Some(inner);
        Ok(element)
    }

    fn inner(&self) -> ElementRef {
        self.inner
            .borrow()
            .clone()
            .expect("component element is built on creation")
    }

    fn build(&self) -> Result<Widget> {
        let widget = self.widget.borrow().clone();
        widget.register_style();

        let ctx = BuildContext::new(self.this.clone());
        let this = self.this.clone();
        let dirty = self.dirty.clone();
        let scheduler = self.scheduler.clone();
        let (built, handle) = ChangeDetector::evaluate(
            || widget.build(&ctx),
            move || {
                dirty.set(true);
                scheduler.schedule(move || match this.upgrade() {
                    Some(element) => element.rebuild_if_dirty(),
                    None => Ok(()),
                });
            },
        )?;

        self.dirty.set(false);
        *self.handle.borrow_mut() = Some(handle);
        Ok(built)
    }

    fn rebuild_if_dirty(&self) -> Result<()> {
        if self.dirty.get() {
            self.rebuild(false)?;
        }
        Ok(())
    }

    fn rebuild(&self, force: bool) -> Result<()> {
        if !self.lifecycle.is_mounted() {
            return Ok(());
        }
        tracing::debug!(widget = self.widget.borrow().type_name(), force, "rebuild");
        let built = self.build()?;
        let inner = reconcile::update(&self.inner(), &built, force)?;
        *self.inner.borrow_mut() = Some(inner);
        Ok(())
    }
}

impl RenderElement for StatelessElement {
    fn widget(&self) -> Widget {
        Widget::Stateless(self.widget.borrow().clone())
    }

    fn parent_link(&self) -> Option<Weak<dyn RenderElement>> {
        self.parent.clone()
    }

    fn node(&self) -> NodeRef {
        self.inner().node()
    }

    fn factory(&self) -> Rc<dyn DomFactory> {
        self.factory.clone()
    }

    fn is_mounted(&self) -> bool {
        self.lifecycle.is_mounted()
    }

    fn mount(&self) -> Result<()> {
        self.lifecycle.mount("stateless")?;
        if let Some(key) = self.widget.borrow().key() {
            key.attach(self.this.clone());
        }
        self.inner().mount()
    }

    fn unmount(&self) -> Result<()> {
        self.lifecycle.unmount("stateless")?;
        if let Some(key) = self.widget.borrow().key() {
            key.detach();
        }
        self.inner().unmount()?;
        self.handle.borrow_mut().take();
        Ok(())
    }

    fn update(&self, new_widget: &Widget, force: bool) -> Result<bool> {
        let Widget::Stateless(new) = new_widget else {
            return Ok(false);
        };
        let old = self.widget.borrow().clone();
        if old.as_any().type_id() != new.as_any().type_id() {
            return Ok(false);
        }

        let changed = !std::ptr::addr_eq(Rc::as_ptr(&old), Rc::as_ptr(new))
            && !WidgetTypes::values_equal(old.as_any(), new.as_any());
        if force || changed {
            *self.widget.borrow_mut() = new.clone();
            self.rebuild(force)?;
        }
        Ok(true)
    }

    fn children(&self) -> Vec<ElementRef> {
        vec![self.inner()]
    }
}
