//! Build contexts handed to component code.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::ops::Deref;
use std::rc::{Rc, Weak};

use super::{ElementRef, RenderElement, StateMixin};
use crate::dom::NodeRef;
use crate::error::{Error, Result};
use crate::reactive::{Computed, ObservableProperty, ReactiveContainer, ReactiveScope, Watcher};

/// Access to the element being built.
#[derive(Clone, Default)]
pub struct BuildContext {
    element: Option<Weak<dyn RenderElement>>,
}

impl BuildContext {
    pub(crate) fn new(element: Weak<dyn RenderElement>) -> Self {
        Self {
            element: Some(element),
        }
    }

    /// A context not bound to any element, used by host bridges.
    pub fn detached() -> Self {
        Self::default()
    }

    pub fn element(&self) -> Option<ElementRef> {
        self.element.as_ref().and_then(Weak::upgrade)
    }

    /// The node of the element, available once it is mounted.
    pub fn node(&self) -> Result<NodeRef> {
        match self.element() {
            Some(element) if element.is_mounted() => Ok(element.node()),
            _ => Err(Error::NotMounted { element: "context" }),
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.element().is_some_and(|element| element.is_mounted())
    }

    /// Walk from the element towards the root and return the first state
    /// accepted by `matches`.
    pub fn ancestor_state_of(&self, matches: impl Fn(&Rc<dyn Any>) -> bool) -> Option<Rc<dyn Any>> {
        let mut current = self.element();
        while let Some(element) = current {
            if let Some(state) = element.state() {
                if matches(&state) {
                    return Some(state);
                }
            }
            current = element.parent();
        }
        None
    }

    /// The nearest state of type `S` on the path to the root.
    pub fn ancestor_state<S: 'static>(&self) -> Option<Rc<S>> {
        self.ancestor_state_of(|state| (**state).is::<S>())
            .and_then(|state| state.downcast::<S>().ok())
    }
}

/// Context of a stateful widget's state.
///
/// Reading the widget through [`StateContext::widget`] is tracked, so a
/// build that depends on widget fields reruns when the parent supplies a
/// new widget.
pub struct StateContext<W> {
    build: BuildContext,
    widget: RefCell<Rc<W>>,
    widget_changed: Rc<ObservableProperty>,
    scope: Rc<ReactiveScope>,
    mixins: RefCell<Vec<MixinSlot<W>>>,
    mixins_started: Cell<bool>,
}

/// A mixin together with the scope owning its reactions.
struct MixinSlot<W> {
    mixin: Rc<dyn StateMixin<W>>,
    scope: Rc<ReactiveScope>,
}

impl<W> Clone for MixinSlot<W> {
    fn clone(&self) -> Self {
        Self {
            mixin: self.mixin.clone(),
            scope: self.scope.clone(),
        }
    }
}

impl<W: 'static> StateContext<W> {
    pub(crate) fn new(build: BuildContext, widget: Rc<W>) -> Self {
        Self {
            build,
            widget: RefCell::new(widget),
            widget_changed: ObservableProperty::new(),
            scope: ReactiveScope::new(),
            mixins: RefCell::new(Vec::new()),
            mixins_started: Cell::new(false),
        }
    }

    /// The current widget, registered as a dependency of the running
    /// evaluation.
    pub fn widget(&self) -> Rc<W> {
        self.widget_changed.observed();
        self.widget.borrow().clone()
    }

    pub fn widget_untracked(&self) -> Rc<W> {
        self.widget.borrow().clone()
    }

    pub(crate) fn swap_widget(&self, widget: Rc<W>) -> Rc<W> {
        let old = self.widget.replace(widget);
        self.widget_changed.fire();
        old
    }

    /// The scope owning every computed and watcher of the state.
    pub fn scope(&self) -> &Rc<ReactiveScope> {
        &self.scope
    }

    /// A computed disposed together with the state.
    pub fn computed<T, F>(&self, compute: F) -> Computed<T>
    where
        T: Clone + PartialEq + 'static,
        F: Fn() -> T + 'static,
    {
        Computed::in_container(&self.scope, compute)
    }

    /// A watcher disposed together with the state.
    pub fn watch<T, S, C>(&self, selector: S, callback: C) -> Result<Watcher<T>>
    where
        T: Clone + 'static,
        S: Fn() -> T + 'static,
        C: FnMut(&T, &T) + 'static,
    {
        Watcher::in_container(&self.scope, selector, callback)
    }

    /// Whether the state finished its first build.
    pub fn is_initialized(&self) -> bool {
        self.scope.is_initialized()
    }

    /// Attach `mixin` to the state. It receives the state's lifecycle hooks
    /// from now on and gets a scope of its own, disposed when it is
    /// unmounted.
    ///
    /// Mixins are normally attached in `create_state`. One attached to a
    /// state that is already created has its `created` hook run right away.
    pub fn use_mixin<M: StateMixin<W>>(&self, mixin: M) -> Rc<M> {
        let mixin = Rc::new(mixin);
        let slot = MixinSlot {
            mixin: mixin.clone(),
            scope: ReactiveScope::new(),
        };
        self.mixins.borrow_mut().push(slot.clone());

        if self.mixins_started.get() {
            slot.scope.mark_initialized();
            slot.mixin.created(&slot.scope);
        }
        mixin
    }

    /// Number of attached mixins.
    pub fn mixin_count(&self) -> usize {
        self.mixins.borrow().len()
    }

    // Hooks run on a snapshot, so a hook may attach further mixins.
    fn mixin_slots(&self) -> Vec<MixinSlot<W>> {
        self.mixins.borrow().clone()
    }

    pub(crate) fn mixins_created(&self) {
        self.mixins_started.set(true);
        for slot in self.mixin_slots() {
            slot.scope.mark_initialized();
            slot.mixin.created(&slot.scope);
        }
    }

    pub(crate) fn mixins_mounted(&self) {
        for slot in self.mixin_slots() {
            slot.mixin.mounted(&slot.scope);
        }
    }

    pub(crate) fn mixins_updated(&self, old: &W) {
        let new = self.widget_untracked();
        for slot in self.mixin_slots() {
            slot.mixin.updated(&slot.scope, old, &new);
        }
    }

    pub(crate) fn mixins_unmounted(&self) {
        for slot in self.mixin_slots() {
            slot.mixin.unmounted(&slot.scope);
            slot.scope.dispose_all();
        }
    }
}

impl<W> Deref for StateContext<W> {
    type Target = BuildContext;

    fn deref(&self) -> &BuildContext {
        &self.build
    }
}
