//! Bridge to external component renderers.
//!
//! A [`HostLibrary`] is a renderer with its own component model, in the
//! style of React: it knows components (render functions), memoized
//! components and elements. [`HostBridge`] translates a widget tree into
//! host elements. Every stateless widget type is wrapped into one host
//! component the first time it is seen; the wrapper builds the widget under
//! the change detector and asks the host to re-render the instance when a
//! tracked value changes.

use std::any::TypeId;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::error::{Error, Result};
use crate::reactive::{ChangeDetector, ReactiveHandle};
use crate::widget::{AnyStateless, BuildContext, HtmlWidget, Widget, WidgetTypes};

/// Per-instance hooks of a host component.
///
/// The host creates one for every mounted component instance and passes it
/// to each render of that instance. `invalidate` must schedule a re-render.
pub struct HostHooks {
    invalidate: Box<dyn Fn()>,
    handle: RefCell<Option<ReactiveHandle>>,
}

impl HostHooks {
    pub fn new(invalidate: impl Fn() + 'static) -> Rc<Self> {
        Rc::new(Self {
            invalidate: Box::new(invalidate),
            handle: RefCell::new(None),
        })
    }

    /// Drop the current subscriptions and ask the host to re-render.
    pub fn invalidate(&self) {
        self.handle.borrow_mut().take();
        (self.invalidate)();
    }

    /// Release the subscriptions of the instance. Hosts call this when the
    /// instance unmounts.
    pub fn dispose(&self) {
        self.handle.borrow_mut().take();
    }

    /// Whether the last render is still subscribed to its dependencies.
    pub fn is_tracking(&self) -> bool {
        self.handle
            .borrow()
            .as_ref()
            .is_some_and(ReactiveHandle::is_active)
    }

    fn track(&self, handle: ReactiveHandle) {
        *self.handle.borrow_mut() = Some(handle);
    }
}

impl fmt::Debug for HostHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostHooks")
            .field("tracking", &self.is_tracking())
            .finish()
    }
}

/// Render function of a wrapped widget type. Receives the widget instance
/// as props.
pub type RenderFn<E> = Rc<dyn Fn(&Widget, &Rc<HostHooks>) -> Result<E>>;

/// Props comparison of a memoized component.
pub type AreEqual = Rc<dyn Fn(&Widget, &Widget) -> bool>;

/// An external renderer.
pub trait HostLibrary: 'static {
    type Component: Clone;
    type Element;

    /// Declare a function component.
    fn component(&self, name: &'static str, render: RenderFn<Self::Element>) -> Self::Component;

    /// Wrap `component` so that it skips rendering when `are_equal` holds
    /// for the old and new props.
    fn memo(&self, component: Self::Component, are_equal: AreEqual) -> Self::Component;

    /// Instantiate `component` with `props`.
    fn create_element(&self, component: &Self::Component, props: Widget) -> Result<Self::Element>;

    /// A host element with already translated children.
    fn element(&self, html: &HtmlWidget, children: Vec<Self::Element>) -> Self::Element;

    fn text(&self, text: &str) -> Self::Element;
}

struct BridgeInner<L: HostLibrary> {
    host: L,
    wrappers: RefCell<HashMap<TypeId, L::Component>>,
}

impl<L: HostLibrary> BridgeInner<L> {
    fn build(self: &Rc<Self>, widget: &Widget) -> Result<L::Element> {
        match widget {
            Widget::Html(html) => {
                let children = html
                    .children
                    .iter()
                    .map(|child| self.build(child))
                    .collect::<Result<Vec<_>>>()?;
                Ok(self.host.element(html, children))
            }
            Widget::Text(text) => Ok(self.host.text(&text.value)),
            Widget::Stateless(component) => {
                let wrapper = self.wrapper(component);
                self.host.create_element(&wrapper, widget.clone())
            }
            Widget::Stateful(_) => Err(Error::Unsupported {
                operation: "stateful widgets in a host bridge",
            }),
        }
    }

    fn wrapper(self: &Rc<Self>, widget: &Rc<dyn AnyStateless>) -> L::Component {
        let type_id = widget.as_any().type_id();
        if let Some(component) = self.wrappers.borrow().get(&type_id) {
            return component.clone();
        }

        let bridge = Rc::downgrade(self);
        let render: RenderFn<L::Element> = Rc::new(move |props: &Widget, hooks: &Rc<HostHooks>| {
            render_wrapped(&bridge, props, hooks)
        });
        let mut component = self.host.component(widget.type_name(), render);
        if WidgetTypes::supports_value_equality(type_id) {
            component = self.host.memo(component, Rc::new(props_equal));
        }
        tracing::debug!(widget = widget.type_name(), "wrap widget type");

        self.wrappers
            .borrow_mut()
            .insert(type_id, component.clone());
        component
    }
}

fn render_wrapped<L: HostLibrary>(
    bridge: &Weak<BridgeInner<L>>,
    props: &Widget,
    hooks: &Rc<HostHooks>,
) -> Result<L::Element> {
    let bridge = bridge.upgrade().ok_or(Error::Unsupported {
        operation: "rendering through a dropped bridge",
    })?;
    let Widget::Stateless(widget) = props else {
        return Err(Error::Unsupported {
            operation: "non-component props",
        });
    };

    widget.register_style();
    let ctx = BuildContext::detached();
    let weak_hooks = Rc::downgrade(hooks);
    let (tree, handle) = ChangeDetector::evaluate(
        || widget.build(&ctx),
        move || {
            if let Some(hooks) = weak_hooks.upgrade() {
                hooks.invalidate();
            }
        },
    )?;
    hooks.track(handle);
    bridge.build(&tree)
}

fn props_equal(a: &Widget, b: &Widget) -> bool {
    match (a, b) {
        (Widget::Stateless(a), Widget::Stateless(b)) => {
            WidgetTypes::values_equal(a.as_any(), b.as_any())
        }
        _ => false,
    }
}

/// Translates widget trees for one host library, caching one wrapper
/// component per widget type.
///
/// The wrapper cache belongs to the bridge rather than the process: it is
/// append-only for the bridge's lifetime, and two bridges over the same
/// host keep separate wrappers. Share one bridge to share wrapper identity.
pub struct HostBridge<L: HostLibrary> {
    inner: Rc<BridgeInner<L>>,
}

impl<L: HostLibrary> HostBridge<L> {
    pub fn new(host: L) -> Self {
        Self {
            inner: Rc::new(BridgeInner {
                host,
                wrappers: RefCell::new(HashMap::new()),
            }),
        }
    }

    pub fn host(&self) -> &L {
        &self.inner.host
    }

    /// Translate `widget` into a host element.
    pub fn build(&self, widget: &Widget) -> Result<L::Element> {
        self.inner.build(widget)
    }

    /// Number of widget types wrapped so far.
    pub fn wrapper_count(&self) -> usize {
        self.inner.wrappers.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Signal;
    use crate::widget::StatelessWidget;
    use std::cell::Cell;

    #[derive(Clone)]
    struct TestComponent {
        render: RenderFn<String>,
        memo: Option<AreEqual>,
    }

    #[derive(Default)]
    struct TestHost {
        components: Cell<usize>,
        invalidations: Rc<Cell<usize>>,
        instances: RefCell<Vec<(TestComponent, Widget, Rc<HostHooks>)>>,
    }

    impl TestHost {
        /// Re-render every invalidated instance the way a host would on its
        /// next commit.
        fn rerender(&self, index: usize) -> Result<String> {
            let (component, props, hooks) = self.instances.borrow()[index].clone();
            (component.render)(&props, &hooks)
        }
    }

    impl HostLibrary for TestHost {
        type Component = TestComponent;
        type Element = String;

        fn component(&self, _name: &'static str, render: RenderFn<String>) -> TestComponent {
            self.components.set(self.components.get() + 1);
            TestComponent { render, memo: None }
        }

        fn memo(&self, component: TestComponent, are_equal: AreEqual) -> TestComponent {
            TestComponent {
                memo: Some(are_equal),
                ..component
            }
        }

        fn create_element(&self, component: &TestComponent, props: Widget) -> Result<String> {
            let counter = self.invalidations.clone();
            let hooks = HostHooks::new(move || counter.set(counter.get() + 1));
            self.instances
                .borrow_mut()
                .push((component.clone(), props.clone(), hooks.clone()));
            (component.render)(&props, &hooks)
        }

        fn element(&self, html: &HtmlWidget, children: Vec<String>) -> String {
            format!("<{0}>{1}</{0}>", html.tag, children.concat())
        }

        fn text(&self, text: &str) -> String {
            text.to_owned()
        }
    }

    struct Greeting(Signal<String>);

    impl StatelessWidget for Greeting {
        fn build(&self, _ctx: &BuildContext) -> Widget {
            HtmlWidget::new("p")
                .text(format!("hello {}", self.0.get()))
                .into()
        }
    }

    #[derive(PartialEq)]
    struct Pure(&'static str);

    impl StatelessWidget for Pure {
        fn build(&self, _ctx: &BuildContext) -> Widget {
            Widget::text(self.0)
        }
    }

    // -------------------------------------------------------------------------
    // Translation
    // -------------------------------------------------------------------------

    #[test]
    fn translates_tree_and_caches_wrappers() {
        let name = Signal::new("world".to_string());
        let bridge = HostBridge::new(TestHost::default());
        let tree: Widget = HtmlWidget::new("div")
            .child(Widget::stateless(Greeting(name.clone())))
            .child(Widget::stateless(Greeting(name.clone())))
            .into();

        let out = bridge.build(&tree).unwrap();
        assert_eq!(out, "<div><p>hello world</p><p>hello world</p></div>");
        assert_eq!(bridge.host().components.get(), 1);
        assert_eq!(bridge.wrapper_count(), 1);
    }

    #[test]
    fn changes_invalidate_instances() {
        let name = Signal::new("world".to_string());
        let bridge = HostBridge::new(TestHost::default());
        bridge
            .build(&Widget::stateless(Greeting(name.clone())))
            .unwrap();
        let hooks = bridge.host().instances.borrow()[0].2.clone();
        assert!(hooks.is_tracking());

        name.set("there".to_string());
        assert_eq!(bridge.host().invalidations.get(), 1);
        assert!(!hooks.is_tracking());

        assert_eq!(bridge.host().rerender(0).unwrap(), "<p>hello there</p>");
        assert!(hooks.is_tracking());

        hooks.dispose();
        name.set("again".to_string());
        assert_eq!(bridge.host().invalidations.get(), 1);
    }

    #[test]
    fn value_equality_selects_memo() {
        WidgetTypes::register_value_equality::<Pure>();
        let bridge = HostBridge::new(TestHost::default());
        bridge.build(&Widget::stateless(Pure("a"))).unwrap();

        let (component, _, _) = bridge.host().instances.borrow()[0].clone();
        let are_equal = component.memo.expect("memoized wrapper");
        assert!(are_equal(
            &Widget::stateless(Pure("a")),
            &Widget::stateless(Pure("a"))
        ));
        assert!(!are_equal(
            &Widget::stateless(Pure("a")),
            &Widget::stateless(Pure("b"))
        ));
    }

    #[test]
    fn stateful_widgets_are_rejected() {
        use crate::widget::{State, StateContext, StatefulWidget};

        struct Stateful;
        struct Empty;

        impl StatefulWidget for Stateful {
            type State = Empty;
            fn create_state(&self, _ctx: &StateContext<Self>) -> Empty {
                Empty
            }
        }

        impl State for Empty {
            type Widget = Stateful;
            fn build(&self, _ctx: &StateContext<Stateful>) -> Widget {
                Widget::text("")
            }
        }

        let bridge = HostBridge::new(TestHost::default());
        assert!(matches!(
            bridge.build(&Widget::stateful(Stateful)),
            Err(Error::Unsupported { .. })
        ));
    }
}
