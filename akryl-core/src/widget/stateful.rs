//! Stateful components.
//!
//! A [`StatefulWidget`] creates a [`State`] once, when its element is
//! created. The state outlives every rebuild of the element and receives
//! lifecycle callbacks:
//!
//! 1. `created` after the first build,
//! 2. `mounted` after the subtree is mounted,
//! 3. `updated` after the parent supplied a different widget,
//! 4. `unmounted` after the subtree is unmounted; the state's reactive scope
//!    is disposed right after.
//!
//! A state can attach [`StateMixin`]s through
//! [`StateContext::use_mixin`]. Mixins see `created`, `mounted` and
//! `updated` before the state does, and `unmounted` after it.

use std::any::{Any, TypeId};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use super::reconcile;
use super::{
    BuildContext, ElementContext, ElementRef, Key, Lifecycle, RenderElement, StateContext, Widget,
    WidgetTypes,
};
use crate::dom::{DomFactory, NodeRef};
use crate::error::{Error, Result};
use crate::reactive::{ChangeDetector, ReactiveHandle, ReactiveScope};
use crate::scheduler::RebuildScheduler;
use crate::style::{Style, StyleRegistry};

/// A component with persistent state.
pub trait StatefulWidget: Sized + 'static {
    type State: State<Widget = Self>;

    fn key(&self) -> Option<Key> {
        None
    }

    fn style(&self) -> Option<Rc<dyn Style>> {
        None
    }

    fn create_state(&self, ctx: &StateContext<Self>) -> Self::State;
}

/// State of a [`StatefulWidget`].
pub trait State: 'static {
    type Widget: StatefulWidget;

    fn build(&self, ctx: &StateContext<Self::Widget>) -> Widget;

    fn created(&self, _ctx: &StateContext<Self::Widget>) {}

    fn mounted(&self, _ctx: &StateContext<Self::Widget>) {}

    /// Called after a rebuild caused by a new widget. `ctx.widget()` is the
    /// new widget.
    fn updated(&self, _ctx: &StateContext<Self::Widget>, _old: &Self::Widget) {}

    fn unmounted(&self, _ctx: &StateContext<Self::Widget>) {}
}

/// Reusable lifecycle behavior shared between states of widget type `W`.
///
/// Every hook receives the mixin's own scope. Computeds and watchers
/// created in it are disposed right after `unmounted`.
///
/// # Example
///
/// ```rust,ignore
/// struct Autosave(Signal<String>);
///
/// impl<W> StateMixin<W> for Autosave {
///     fn created(&self, scope: &Rc<ReactiveScope>) {
///         let draft = self.0.clone();
///         Watcher::in_container(scope, move || draft.get(), |_, new| save(new)).ok();
///     }
/// }
/// ```
pub trait StateMixin<W>: 'static {
    fn created(&self, _scope: &Rc<ReactiveScope>) {}

    fn mounted(&self, _scope: &Rc<ReactiveScope>) {}

    fn updated(&self, _scope: &Rc<ReactiveScope>, _old: &W, _new: &W) {}

    fn unmounted(&self, _scope: &Rc<ReactiveScope>) {}
}

/// Object-safe view of a [`StatefulWidget`].
pub trait AnyStateful {
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Rc<Self>) -> Rc<dyn Any>;
    fn type_name(&self) -> &'static str;
    fn key(&self) -> Option<Key>;
    fn create_element(self: Rc<Self>, ctx: &ElementContext) -> Result<ElementRef>;
}

impl<W: StatefulWidget> AnyStateful for W {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<W>()
    }

    fn key(&self) -> Option<Key> {
        StatefulWidget::key(self)
    }

    fn create_element(self: Rc<Self>, ctx: &ElementContext) -> Result<ElementRef> {
        Ok(StatefulElement::create(self, ctx)?)
    }
}

pub(crate) struct StatefulElement<W: StatefulWidget> {
    this: Weak<StatefulElement<W>>,
    parent: Option<Weak<dyn RenderElement>>,
    factory: Rc<dyn DomFactory>,
    context: StateContext<W>,
    state: RefCell<Option<Rc<W::State>>>,
    inner: RefCell<Option<ElementRef>>,
    handle: RefCell<Option<ReactiveHandle>>,
    dirty: Rc<Cell<bool>>,
    scheduler: RebuildScheduler,
    created: Cell<bool>,
    lifecycle: Lifecycle,
}

impl<W: StatefulWidget> StatefulElement<W> {
    fn create(widget: Rc<W>, ctx: &ElementContext) -> Result<Rc<Self>> {
        let element = Rc::new_cyclic(|this: &Weak<Self>| {
            let build = BuildContext::new(this.clone());
            Self {
                this: this.clone(),
                parent: ctx.parent.clone(),
                factory: ctx.factory.clone(),
                context: StateContext::new(build, widget.clone()),
                state: RefCell::new(None),
                inner: RefCell::new(None),
                handle: RefCell::new(None),
                dirty: Rc::new(Cell::new(false)),
                scheduler: RebuildScheduler::new(),
                created: Cell::new(false),
                lifecycle: Lifecycle::new(),
            }
        });

        let state = ChangeDetector::untracked(|| widget.create_state(&element.context));
        *element.state.borrow_mut() = Some(Rc::new(state));

        let built = element.build()?;
        let inner = built.create_element(&ElementContext::child_of(
            element.this.clone(),
            element.factory.clone(),
        ))?;
        *element.inner.borrow_mut() = Some(inner);

        element.state_created()?;
        Ok(element)
    }

    fn state_name() -> &'static str {
        std::any::type_name::<W::State>()
    }

    fn state_rc(&self) -> Rc<W::State> {
        self.state
            .borrow()
            .clone()
            .expect("state is created before the first build")
    }

    fn inner(&self) -> ElementRef {
        self.inner
            .borrow()
            .clone()
            .expect("component element is built on creation")
    }

    fn state_created(&self) -> Result<()> {
        if self.created.replace(true) {
            return Err(Error::StateAlreadyCreated {
                state: Self::state_name(),
            });
        }
        tracing::debug!(state = Self::state_name(), "state created");
        self.context.mixins_created();
        self.state_rc().created(&self.context);
        self.context.scope().mark_initialized();
        Ok(())
    }

    fn build(&self) -> Result<Widget> {
        let widget = self.context.widget_untracked();
        WidgetTypes::register::<W>();
        StyleRegistry::register::<W>(widget.style().as_deref());

        let state = self.state_rc();
        let this = self.this.clone();
        let dirty = self.dirty.clone();
        let scheduler = self.scheduler.clone();
        let (built, handle) = ChangeDetector::evaluate(
            || state.build(&self.context),
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
        tracing::debug!(state = Self::state_name(), force, "rebuild");
        let built = self.build()?;
        let inner = reconcile::update(&self.inner(), &built, force)?;
        *self.inner.borrow_mut() = Some(inner);
        Ok(())
    }
}

impl<W: StatefulWidget> RenderElement for StatefulElement<W> {
    fn widget(&self) -> Widget {
        Widget::Stateful(self.context.widget_untracked())
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
        self.lifecycle.mount("stateful")?;
        if let Some(key) = StatefulWidget::key(&*self.context.widget_untracked()) {
            key.attach(self.this.clone());
        }
        self.inner().mount()?;

        if !self.created.get() {
            return Err(Error::StateNotCreated {
                state: Self::state_name(),
            });
        }
        self.context.mixins_mounted();
        self.state_rc().mounted(&self.context);
        Ok(())
    }

    fn unmount(&self) -> Result<()> {
        self.lifecycle.unmount("stateful")?;
        if let Some(key) = StatefulWidget::key(&*self.context.widget_untracked()) {
            key.detach();
        }
        self.inner().unmount()?;

        self.state_rc().unmounted(&self.context);
        self.context.mixins_unmounted();
        self.context.scope().dispose_all();
        self.handle.borrow_mut().take();
        Ok(())
    }

    fn update(&self, new_widget: &Widget, force: bool) -> Result<bool> {
        let Widget::Stateful(new) = new_widget else {
            return Ok(false);
        };
        if new.as_any().type_id() != TypeId::of::<W>() {
            return Ok(false);
        }
        let Ok(new) = new.clone().into_any().downcast::<W>() else {
            return Ok(false);
        };

        let old = self.context.widget_untracked();
        let changed =
            !Rc::ptr_eq(&old, &new) && !WidgetTypes::values_equal(old.as_any(), new.as_any());
        if force || changed {
            let old = self.context.swap_widget(new);
            self.rebuild(force)?;

            if !self.lifecycle.is_mounted() {
                return Err(Error::StateNotMounted {
                    state: Self::state_name(),
                });
            }
            self.context.mixins_updated(&old);
            self.state_rc().updated(&self.context, &old);
        }
        Ok(true)
    }

    fn state(&self) -> Option<Rc<dyn Any>> {
        let state: Rc<dyn Any> = self.state.borrow().clone()?;
        Some(state)
    }

    fn children(&self) -> Vec<ElementRef> {
        vec![self.inner()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDom;
    use crate::reactive::Signal;
    use crate::scheduler::AnimationFrame;
    use crate::widget::HtmlWidget;

    struct Counter {
        label: &'static str,
        log: Rc<RefCell<Vec<String>>>,
    }

    struct CounterState {
        count: Signal<i64>,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl StatefulWidget for Counter {
        type State = CounterState;

        fn create_state(&self, _ctx: &StateContext<Self>) -> CounterState {
            CounterState {
                count: Signal::new(0),
                log: self.log.clone(),
            }
        }
    }

    impl State for CounterState {
        type Widget = Counter;

        fn build(&self, ctx: &StateContext<Counter>) -> Widget {
            self.log.borrow_mut().push("build".into());
            HtmlWidget::new("span")
                .text(format!("{}: {}", ctx.widget().label, self.count.get()))
                .into()
        }

        fn created(&self, _ctx: &StateContext<Counter>) {
            self.log.borrow_mut().push("created".into());
        }

        fn mounted(&self, _ctx: &StateContext<Counter>) {
            self.log.borrow_mut().push("mounted".into());
        }

        fn updated(&self, _ctx: &StateContext<Counter>, old: &Counter) {
            self.log.borrow_mut().push(format!("updated from {}", old.label));
        }

        fn unmounted(&self, _ctx: &StateContext<Counter>) {
            self.log.borrow_mut().push("unmounted".into());
        }
    }

    fn counter(label: &'static str, log: &Rc<RefCell<Vec<String>>>) -> Widget {
        Widget::stateful(Counter {
            label,
            log: log.clone(),
        })
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    #[test]
    fn hooks_run_in_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let element = counter("a", &log)
            .create_element(&ElementContext::root(Rc::new(MemoryDom)))
            .unwrap();
        element.mount().unwrap();
        element.update(&counter("b", &log), false).unwrap();
        element.unmount().unwrap();

        assert_eq!(
            *log.borrow(),
            vec!["build", "created", "mounted", "build", "updated from a", "unmounted"]
        );
        assert_eq!(element.node().text_content(), Some("b: 0".to_string()));
    }

    #[test]
    fn state_changes_rebuild_on_next_frame() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let element = counter("n", &log)
            .create_element(&ElementContext::root(Rc::new(MemoryDom)))
            .unwrap();
        element.mount().unwrap();

        let state = element.state().unwrap().downcast::<CounterState>().unwrap();
        state.count.set(5);
        assert_eq!(element.node().text_content(), Some("n: 0".to_string()));

        AnimationFrame::run().unwrap();
        assert_eq!(element.node().text_content(), Some("n: 5".to_string()));
    }

    #[test]
    fn update_requires_mount() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let element = counter("a", &log)
            .create_element(&ElementContext::root(Rc::new(MemoryDom)))
            .unwrap();
        assert!(matches!(
            element.update(&counter("b", &log), false),
            Err(Error::StateNotMounted { .. })
        ));
    }
}
