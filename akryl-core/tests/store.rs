//! Integration Tests for the Reactive Store
//!
//! These tests drive computeds and watchers from wrapped containers the way
//! application state is used in practice.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use akryl_core::reactive::{Computed, Runtime, Watcher};
use akryl_core::scheduler::EventLoop;
use akryl_core::store::{wrap, Atom, List, Map, Object, Set, Value};
use serde_json::json;

fn int(value: Option<Value>) -> i64 {
    value.and_then(|value| value.as_int()).unwrap_or_default()
}

/// An integer property feeding a chain of computeds.
#[test]
fn property_parity_chain() {
    let foo = Object::new();
    foo.insert("a", 10i64);
    wrap(&Value::from(foo.clone()));

    let reader = foo.clone();
    let b = Computed::new(move || int(reader.get("a")) % 2);
    let counter = Rc::new(Cell::new(0));
    let (upstream, runs) = (b.clone(), counter.clone());
    let c = Computed::new(move || {
        runs.set(runs.get() + 1);
        upstream.get()
    });
    c.get();

    foo.insert("a", 1i64);
    EventLoop::drain().unwrap();
    assert_eq!(counter.get(), 2);

    foo.insert("a", 3i64);
    EventLoop::drain().unwrap();
    assert_eq!(counter.get(), 2);

    foo.insert("a", 6i64);
    EventLoop::drain().unwrap();
    assert_eq!(counter.get(), 3);
}

/// A watcher over a property fires once per drain with both values.
#[test]
fn property_watcher() {
    let foo: Object = [("a", 1i64)].into_iter().collect();
    wrap(&Value::from(foo.clone()));

    let calls = Rc::new(RefCell::new(Vec::new()));
    let (reader, log) = (foo.clone(), calls.clone());
    let _watcher = Watcher::new(
        move || int(reader.get("a")),
        move |old: &i64, new: &i64| log.borrow_mut().push((*old, *new)),
    )
    .unwrap();

    foo.insert("a", 2i64);
    assert!(calls.borrow().is_empty());

    EventLoop::drain().unwrap();
    assert_eq!(*calls.borrow(), vec![(1, 2)]);
}

/// Wrapping JSON-shaped state instruments every nested container.
#[test]
fn wrapped_json_tree() {
    let state = wrap(&Value::from(json!({
        "todos": [{"title": "write tests", "done": false}],
        "filter": "all",
    })));
    let root = state.as_object().unwrap().clone();
    let todos = root.get("todos").unwrap().as_list().unwrap().clone();
    let first = todos.get(0).unwrap().as_object().unwrap().clone();
    assert!(todos.is_reactive());
    assert!(first.is_reactive());

    let reader = todos.clone();
    let open = Computed::new(move || {
        reader
            .values()
            .iter()
            .filter_map(|todo| todo.as_object()?.get("done")?.as_bool())
            .filter(|done| !done)
            .count()
    });
    assert_eq!(open.get(), 1);

    first.insert("done", true);
    assert_eq!(open.get(), 0);

    let added: Object = [("title", Value::from("ship")), ("done", Value::from(false))]
        .into_iter()
        .collect();
    todos.push(added.clone());
    assert!(added.is_reactive());
    assert_eq!(open.get(), 1);

    assert_eq!(
        state.to_json().unwrap(),
        json!({
            "todos": [
                {"title": "write tests", "done": true},
                {"title": "ship", "done": false},
            ],
            "filter": "all",
        })
    );
}

/// Maps and sets notify through the same runtime.
#[test]
fn maps_and_sets_drive_rebuilds() {
    let map = Map::new();
    let set = Set::new();
    wrap(&Value::from(map.clone()));
    wrap(&Value::from(set.clone()));

    let (map_reader, set_reader) = (map.clone(), set.clone());
    let summary = Computed::new(move || {
        let selected: Vec<String> = set_reader
            .values()
            .iter()
            .filter_map(|atom| map_reader.get(atom.clone()))
            .map(|value| value.to_string())
            .collect();
        selected.join(",")
    });
    assert_eq!(summary.get(), "");

    map.insert(1i64, "one");
    map.insert(2i64, "two");
    set.insert(Atom::Int(2));
    Runtime::flush().unwrap();
    assert_eq!(summary.get(), r#""two""#);

    map.insert(2i64, "deux");
    assert_eq!(summary.get(), r#""deux""#);

    set.insert(Atom::Int(1));
    assert_eq!(summary.get(), r#""deux","one""#);
}

/// Containers that were never wrapped behave like plain collections.
#[test]
fn plain_containers_are_inert() {
    let list: List = vec![Value::from(1i64)].into();
    let reader = list.clone();
    let first = Computed::new(move || reader.get(0));
    first.get();

    list.set(0, 2i64);
    Runtime::flush().unwrap();
    assert_eq!(first.get(), Some(Value::Int(1)));
    assert_eq!(list.get(0), Some(Value::Int(2)));
}

/// Wrapping a value that is already reactive changes nothing: one mutation
/// still notifies each dependent once.
#[test]
fn wrapping_twice_notifies_once() {
    let foo: Object = [("a", 1i64)].into_iter().collect();
    let first = wrap(&Value::from(foo.clone()));
    let second = wrap(&first);
    assert_eq!(first, second);

    let counter = Rc::new(Cell::new(0));
    let (reader, runs) = (foo.clone(), counter.clone());
    let value = Computed::new(move || {
        runs.set(runs.get() + 1);
        int(reader.get("a"))
    });
    assert_eq!(value.get(), 1);

    let calls = Rc::new(RefCell::new(Vec::new()));
    let (reader, log) = (foo.clone(), calls.clone());
    let _watcher = Watcher::new(
        move || int(reader.get("a")),
        move |old: &i64, new: &i64| log.borrow_mut().push((*old, *new)),
    )
    .unwrap();

    foo.insert("a", 2i64);
    Runtime::flush().unwrap();
    assert_eq!(counter.get(), 2);
    assert_eq!(value.get(), 2);
    assert_eq!(*calls.borrow(), vec![(1, 2)]);
}

/// Mutations reached through a cycle notify readers on either side of it.
#[test]
fn wrapped_cycles_stay_reactive() {
    let parent: Object = [("n", 1i64)].into_iter().collect();
    let child = Object::new();
    child.insert("parent", parent.clone());
    parent.insert("child", child.clone());

    wrap(&Value::from(parent.clone()));
    assert!(parent.is_reactive());
    assert!(child.is_reactive());

    let reader = parent.clone();
    let through_cycle = Computed::new(move || {
        let child = reader.get("child")?.as_object()?.clone();
        let parent = child.get("parent")?.as_object()?.clone();
        parent.get("n")?.as_int()
    });
    assert_eq!(through_cycle.get(), Some(1));

    parent.insert("n", 5i64);
    Runtime::flush().unwrap();
    assert_eq!(through_cycle.get(), Some(5));

    child.insert("parent", Object::new());
    Runtime::flush().unwrap();
    assert_eq!(through_cycle.get(), None);
    assert!(Value::from(parent).to_json().is_ok());
}
