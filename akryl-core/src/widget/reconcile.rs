//! Reconciliation: applying a new widget tree to live elements.
//!
//! The unit decision is made by [`update`]: reuse the element when the keys
//! match and the element accepts the widget, otherwise create a new element
//! and swap nodes.
//!
//! Children of host elements are reconciled in one of two modes:
//!
//! * **positional** when no old or new child carries a key: the common
//!   prefix is updated index by index, surplus old children are removed from
//!   the tail and surplus new children are appended;
//! * **keyed** otherwise: keyed children are matched by key wherever they
//!   are, unkeyed children are matched in order, leftovers are removed and
//!   nodes are moved into the new order.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use super::{ElementContext, ElementRef, Key, Widget};
use crate::dom::{same_node, DomFactory, NodeRef};
use crate::error::Result;

/// Apply `new_widget` to `old`, returning the element now representing it.
///
/// The returned element is either `old` itself, updated in place, or a new
/// element whose node replaced `old`'s node in the document. In the latter
/// case `old` is unmounted and the new element mounted if `old` was mounted.
pub fn update(old: &ElementRef, new_widget: &Widget, force: bool) -> Result<ElementRef> {
    let new_key = new_widget.key();
    if old.widget().key() == new_key && old.update(new_widget, force)? {
        if let Some(key) = new_key {
            if old.is_mounted() {
                key.attach(Rc::downgrade(old));
            }
        }
        tracing::trace!(widget = new_widget.kind_name(), "reuse element");
        return Ok(old.clone());
    }

    tracing::debug!(
        old = old.widget().kind_name(),
        new = new_widget.kind_name(),
        "replace element"
    );
    let ctx = ElementContext {
        parent: old.parent_link(),
        factory: old.factory(),
    };
    let element = new_widget.create_element(&ctx)?;
    old.node().replace(&element.node())?;

    if old.is_mounted() {
        old.unmount()?;
        element.mount()?;
    }
    Ok(element)
}

pub(crate) fn reconcile_children(
    node: &NodeRef,
    ctx: &ElementContext,
    old: Vec<ElementRef>,
    new: &[Widget],
    force: bool,
    mounted: bool,
) -> Result<Vec<ElementRef>> {
    let keyed = old.iter().any(|element| element.widget().key().is_some())
        || new.iter().any(|widget| widget.key().is_some());
    tracing::debug!(
        keyed,
        old = old.len(),
        new = new.len(),
        "reconcile children"
    );
    if keyed {
        reconcile_keyed(node, ctx, old, new, force, mounted)
    } else {
        reconcile_positional(node, ctx, old, new, force, mounted)
    }
}

fn reconcile_positional(
    node: &NodeRef,
    ctx: &ElementContext,
    mut old: Vec<ElementRef>,
    new: &[Widget],
    force: bool,
    mounted: bool,
) -> Result<Vec<ElementRef>> {
    let common = old.len().min(new.len());
    let mut children = Vec::with_capacity(new.len());

    let surplus = old.split_off(common);
    for (element, widget) in old.iter().zip(new) {
        children.push(update(element, widget, force)?);
    }

    for element in surplus.iter().rev() {
        element.node().remove()?;
        if element.is_mounted() {
            element.unmount()?;
        }
    }

    for widget in &new[common..] {
        let element = widget.create_element(ctx)?;
        node.append_child(&element.node())?;
        if mounted {
            element.mount()?;
        }
        children.push(element);
    }
    Ok(children)
}

fn reconcile_keyed(
    node: &NodeRef,
    ctx: &ElementContext,
    old: Vec<ElementRef>,
    new: &[Widget],
    force: bool,
    mounted: bool,
) -> Result<Vec<ElementRef>> {
    let mut by_key: HashMap<Key, ElementRef> = HashMap::new();
    let mut unkeyed: VecDeque<ElementRef> = VecDeque::new();
    let mut unused: Vec<ElementRef> = Vec::new();
    for element in old {
        match element.widget().key() {
            Some(key) if !by_key.contains_key(&key) => {
                by_key.insert(key, element);
            }
            Some(_) => unused.push(element),
            None => unkeyed.push_back(element),
        }
    }

    let mut children = Vec::with_capacity(new.len());
    let mut fresh = Vec::new();
    for widget in new {
        let matched = match widget.key() {
            Some(key) => by_key.remove(&key),
            None => unkeyed.pop_front(),
        };
        let element = match matched {
            // A replaced child's new node takes the old node's place; the
            // ordering pass below moves it as needed.
            Some(element) => update(&element, widget, force)?,
            None => {
                let element = widget.create_element(ctx)?;
                fresh.push(element.clone());
                element
            }
        };
        children.push(element);
    }

    unused.extend(by_key.into_values());
    unused.extend(unkeyed);
    for element in &unused {
        element.node().remove()?;
        if element.is_mounted() {
            element.unmount()?;
        }
    }

    for (index, element) in children.iter().enumerate() {
        let child = element.node();
        let in_place = node
            .child_at(index)
            .is_some_and(|current| same_node(&current, &child));
        if !in_place {
            node.insert_before(index, &child)?;
        }
    }

    if mounted {
        for element in &fresh {
            element.mount()?;
        }
    }
    Ok(children)
}

/// A mounted widget tree.
pub struct MountRef {
    container: NodeRef,
    element: RefCell<ElementRef>,
}

impl MountRef {
    /// The root element.
    pub fn element(&self) -> ElementRef {
        self.element.borrow().clone()
    }

    /// The node the tree was mounted into.
    pub fn container(&self) -> &NodeRef {
        &self.container
    }

    /// Rebuild the whole tree from `widget`, forcing every component to
    /// rebuild even when its widget compares equal.
    pub fn rebuild(&self, widget: &Widget) -> Result<()> {
        let current = self.element();
        let element = update(&current, widget, true)?;
        *self.element.borrow_mut() = element;
        Ok(())
    }

    /// Remove the tree from the container and unmount it. Does nothing if
    /// it is already unmounted.
    pub fn unmount(&self) -> Result<()> {
        let element = self.element();
        if element.is_mounted() {
            element.node().remove()?;
            element.unmount()?;
        }
        Ok(())
    }
}

/// Build `widget`, append its node to `container` and mount it.
pub fn mount(container: &NodeRef, factory: Rc<dyn DomFactory>, widget: &Widget) -> Result<MountRef> {
    let element = widget.create_element(&ElementContext::root(factory))?;
    container.append_child(&element.node())?;
    element.mount()?;
    tracing::debug!(widget = widget.kind_name(), "mounted tree");
    Ok(MountRef {
        container: container.clone(),
        element: RefCell::new(element),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{DomNode, MemoryDom, MemoryNode};
    use crate::widget::{same_element, HtmlWidget};

    fn setup(widget: HtmlWidget) -> (NodeRef, MountRef) {
        let container = MemoryDom::container();
        let root = mount(&container, Rc::new(MemoryDom), &widget.into()).unwrap();
        (container, root)
    }

    fn html(node: &NodeRef) -> String {
        MemoryNode::from_ref(node).unwrap().inner_html()
    }

    fn list(items: &[&str], keyed: bool) -> HtmlWidget {
        HtmlWidget::new("ul").children(items.iter().map(|item| -> Widget {
            let li = HtmlWidget::new("li").text(*item);
            if keyed {
                li.key(Key::value(*item)).into()
            } else {
                li.into()
            }
        }))
    }

    // -------------------------------------------------------------------------
    // Unit decisions
    // -------------------------------------------------------------------------

    #[test]
    fn same_tag_reuses_element() {
        let (container, root) = setup(HtmlWidget::new("div").attr("a", "1"));
        let before = root.element();
        root.rebuild(&HtmlWidget::new("div").attr("a", "2").into()).unwrap();
        assert!(same_element(&before, &root.element()));
        assert_eq!(html(&container), "<div a='2'/>");
    }

    #[test]
    fn different_tag_replaces_element() {
        let (container, root) = setup(HtmlWidget::new("div"));
        let before = root.element();
        root.rebuild(&HtmlWidget::new("span").into()).unwrap();

        assert!(!same_element(&before, &root.element()));
        assert!(!before.is_mounted());
        assert!(root.element().is_mounted());
        assert_eq!(html(&container), "<span/>");
    }

    #[test]
    fn different_key_replaces_element() {
        let (_, root) = setup(HtmlWidget::new("div").key(Key::value(1i64)));
        let before = root.element();
        root.rebuild(&HtmlWidget::new("div").key(Key::value(2i64)).into())
            .unwrap();
        assert!(!same_element(&before, &root.element()));
    }

    #[test]
    fn unmount_detaches_tree() {
        let (container, root) = setup(HtmlWidget::new("div"));
        root.unmount().unwrap();
        root.unmount().unwrap();
        assert_eq!(container.child_count(), 0);
        assert!(!root.element().is_mounted());
    }

    // -------------------------------------------------------------------------
    // Children
    // -------------------------------------------------------------------------

    #[test]
    fn positional_extend_and_truncate() {
        let (container, root) = setup(list(&["a", "b"], false));
        root.rebuild(&list(&["a", "b", "c"], false).into()).unwrap();
        assert_eq!(html(&container), "<ul><li>a</li><li>b</li><li>c</li></ul>");

        root.rebuild(&list(&["x"], false).into()).unwrap();
        assert_eq!(html(&container), "<ul><li>x</li></ul>");
    }

    #[test]
    fn keyed_children_follow_their_keys() {
        let (container, root) = setup(list(&["a", "b", "c"], true));
        let before = root.element().children();

        root.rebuild(&list(&["c", "a", "d"], true).into()).unwrap();
        assert_eq!(html(&container), "<ul><li>c</li><li>a</li><li>d</li></ul>");

        let after = root.element().children();
        assert!(same_element(&before[2], &after[0]));
        assert!(same_element(&before[0], &after[1]));
        assert!(!before[1].is_mounted());
        assert!(after[2].is_mounted());
    }

    #[test]
    fn keys_resolve_to_mounted_elements() {
        let key = Key::value("target");
        let (_, root) = setup(
            HtmlWidget::new("div").child(HtmlWidget::new("input").key(key.clone())),
        );
        let node = MemoryNode::from_ref(&key.node().unwrap()).unwrap();
        assert_eq!(node.tag(), "input");

        root.unmount().unwrap();
        assert!(key.element().is_err());
    }
}
