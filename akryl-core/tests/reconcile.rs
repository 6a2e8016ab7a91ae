//! Integration Tests for Reconciliation
//!
//! Every rebuild is checked twice: against the identity expectations of the
//! test, and structurally against what a fresh build of the same widget
//! would produce.

use std::rc::Rc;

use akryl_core::dom::{same_node, DomNode, MemoryDom, MemoryNode, NodeRef, NodeSnapshot};
use akryl_core::widget::{mount, same_element, HtmlWidget, Key, MountRef, Widget};

fn mount_test(widget: HtmlWidget) -> (NodeRef, MountRef) {
    let widget: Widget = widget.into();
    let container = MemoryDom::container();
    let root = mount(&container, Rc::new(MemoryDom), &widget).unwrap();
    assert_matches_fresh_build(&root, &widget);
    (container, root)
}

fn rebuild_test(root: &MountRef, widget: HtmlWidget) {
    let widget: Widget = widget.into();
    root.rebuild(&widget).unwrap();
    assert_matches_fresh_build(root, &widget);
}

fn assert_matches_fresh_build(root: &MountRef, widget: &Widget) {
    let expected = NodeSnapshot::from_widget(widget).unwrap();
    let actual = MemoryNode::from_ref(&root.element().node())
        .unwrap()
        .snapshot();
    assert_eq!(actual, expected, "{}", actual.to_json());
}

fn html(container: &NodeRef) -> String {
    MemoryNode::from_ref(container).unwrap().inner_html()
}

fn child_nodes(root: &MountRef) -> Vec<NodeRef> {
    let node = root.element().node();
    (0..node.child_count())
        .filter_map(|index| node.child_at(index))
        .collect()
}

fn div() -> HtmlWidget {
    HtmlWidget::new("div")
}

fn keyed(tag: &str, key: &str) -> HtmlWidget {
    HtmlWidget::new(tag).key(Key::value(key))
}

fn form_children(widget: HtmlWidget, with_append: bool) -> HtmlWidget {
    let widget = widget
        .child(div().attr("class", "prepend"))
        .child(keyed("label", "label").attr("for", "name").text("name"))
        .child(keyed("input", "input").attr("id", "name").attr("type", "text"))
        .child(keyed("button", "button").attr("type", "submit"));
    if with_append {
        widget.child(div().attr("class", "append"))
    } else {
        widget
    }
}

// -----------------------------------------------------------------------------
// Host elements
// -----------------------------------------------------------------------------

#[test]
fn mount_and_replace_root() {
    let (container, root) = mount_test(div());
    assert_eq!(html(&container), "<div/>");

    rebuild_test(&root, HtmlWidget::new("span"));
    assert_eq!(html(&container), "<span/>");
}

#[test]
fn attributes_are_written() {
    let (container, _root) = mount_test(div().attr("id", "test").attr("title", "some title"));
    assert_eq!(container.child_count(), 1);
    assert_eq!(html(&container), "<div id='test' title='some title'/>");
}

#[test]
fn style_is_written() {
    let (container, _root) = mount_test(div().style("width", "30px").style("height", "50%"));
    assert_eq!(html(&container), "<div style='width: 30px; height: 50%'/>");
}

#[test]
fn class_attribute_is_replaced() {
    let (container, root) = mount_test(div().attr("class", "foo baz base-class"));
    rebuild_test(&root, div().attr("class", "bar baz"));
    assert_eq!(html(&container), "<div class='bar baz'/>");
}

#[test]
fn same_tag_preserves_element() {
    let (_, root) = mount_test(div().attr("class", "foo"));
    let before = root.element();
    rebuild_test(&root, div().attr("class", "bar"));
    assert!(same_element(&before, &root.element()));
}

#[test]
fn different_tag_recreates_element() {
    let (_, root) = mount_test(div().attr("class", "foo"));
    let before = root.element();
    rebuild_test(&root, HtmlWidget::new("span").attr("class", "foo"));
    assert!(!same_element(&before, &root.element()));
}

#[test]
fn same_key_preserves_element() {
    let (_, root) = mount_test(keyed("div", "foo"));
    let before = root.element();
    rebuild_test(&root, keyed("div", "foo"));
    assert!(same_element(&before, &root.element()));
}

#[test]
fn different_key_recreates_element() {
    let (_, root) = mount_test(keyed("div", "foo"));
    let before = root.element();
    rebuild_test(&root, keyed("div", "bar"));
    assert!(!same_element(&before, &root.element()));
}

// -----------------------------------------------------------------------------
// Children
// -----------------------------------------------------------------------------

#[test]
fn children_are_replaced() {
    let (container, root) = mount_test(
        div()
            .child(HtmlWidget::new("label").attr("for", "name").text("name"))
            .child(HtmlWidget::new("input").attr("id", "name").attr("type", "text"))
            .child(HtmlWidget::new("button").attr("type", "submit")),
    );
    assert_eq!(
        html(&container),
        "<div><label for='name'>name</label><input id='name' type='text'/><button type='submit'/></div>"
    );
    let old_children = root.element().children();

    rebuild_test(&root, div().child(HtmlWidget::new("span").text("success!")));
    assert_eq!(html(&container), "<div><span>success!</span></div>");
    assert!(old_children.iter().all(|child| !child.is_mounted()));
}

#[test]
fn keyed_children_move_between_unkeyed_ones() {
    let (_, root) = mount_test(form_children(div(), true));
    let before = child_nodes(&root);

    rebuild_test(
        &root,
        div()
            .child(div().attr("class", "prepend"))
            .child(keyed("button", "button").attr("type", "submit"))
            .child(keyed("label", "label").attr("for", "name").text("name"))
            .child(keyed("input", "input").attr("id", "name").attr("type", "text"))
            .child(div().attr("class", "append")),
    );
    let after = child_nodes(&root);

    assert!(same_node(&before[0], &after[0]));
    assert!(same_node(&before[1], &after[2]));
    assert!(same_node(&before[2], &after[3]));
    assert!(same_node(&before[3], &after[1]));
    assert!(same_node(&before[4], &after[4]));
}

#[test]
fn unkeyed_children_match_in_order() {
    let (_, root) = mount_test(form_children(div(), true));
    let before = child_nodes(&root);

    rebuild_test(
        &root,
        div()
            .child(keyed("button", "button").attr("type", "submit"))
            .child(keyed("input", "input").attr("id", "name").attr("type", "text"))
            .child(div().attr("class", "append")),
    );
    let after = child_nodes(&root);

    assert!(same_node(&before[2], &after[1]));
    assert!(same_node(&before[3], &after[0]));
    // The first unkeyed child is reused for the remaining unkeyed widget.
    assert!(!same_node(&before[4], &after[2]));
    assert!(same_node(&before[0], &after[2]));
}

#[test]
fn keyed_reversal_preserves_identity() {
    let list = |keys: &[&str]| {
        keys.iter()
            .fold(div(), |parent, key| parent.child(keyed("div", key).text(*key)))
    };
    let (_, root) = mount_test(list(&["a", "b", "c"]));
    let before = root.element().children();
    let nodes = child_nodes(&root);

    rebuild_test(&root, list(&["c", "b", "a"]));
    let after = root.element().children();

    assert!(same_element(&before[0], &after[2]));
    assert!(same_element(&before[1], &after[1]));
    assert!(same_element(&before[2], &after[0]));
    assert!(same_node(&nodes[0], &child_nodes(&root)[2]));
}

#[test]
fn keyed_children_grow_around_existing() {
    let (_, root) = mount_test(div().child(keyed("div", "a").text("a")));
    let a = root.element().children()[0].clone();

    rebuild_test(
        &root,
        div()
            .child(keyed("div", "c").text("c"))
            .child(keyed("div", "a").text("a"))
            .child(keyed("div", "b").text("b")),
    );
    let children = root.element().children();
    assert!(same_element(&a, &children[1]));
    assert!(children.iter().all(|child| child.is_mounted()));
}

#[test]
fn unkeyed_children_grow_positionally() {
    let (_, root) = mount_test(div().child(div().text("a")));
    let first = root.element().children()[0].clone();

    rebuild_test(
        &root,
        div()
            .child(div().text("c"))
            .child(div().text("a"))
            .child(div().text("b")),
    );
    assert!(same_element(&first, &root.element().children()[0]));
}

#[test]
fn trailing_unkeyed_child_is_dropped() {
    let (_, root) = mount_test(form_children(div(), false));
    let before = child_nodes(&root);

    rebuild_test(
        &root,
        div()
            .child(div().attr("class", "prepend"))
            .child(keyed("button", "button").attr("type", "submit"))
            .child(keyed("input", "input").attr("id", "name").attr("type", "text")),
    );
    let after = child_nodes(&root);

    assert!(same_node(&before[0], &after[0]));
    assert!(same_node(&before[2], &after[2]));
    assert!(same_node(&before[3], &after[1]));
}

#[test]
fn markup_and_children_alternate() {
    let (container, root) = mount_test(div().child(HtmlWidget::new("b").text("x")));
    rebuild_test(&root, div().inner_html("<i>raw</i>"));
    assert_eq!(html(&container), "<div><i>raw</i></div>");

    rebuild_test(&root, div().child(HtmlWidget::new("b").text("y")));
    assert_eq!(html(&container), "<div><b>y</b></div>");
}
