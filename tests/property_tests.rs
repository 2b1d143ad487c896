//! Property-based tests for the round-trip, clone and equality guarantees.
//!
//! Value graphs are generated as JSON-like trees, then optionally closed into
//! cycles, so every property also runs against shared and circular references.

use dson::{clone, from_value, is_equal, parse, stringify, to_value, Object, Properties, Value};
use proptest::prelude::*;
use serde::{Deserialize, Serialize};

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        Just(Value::Undefined),
        any::<bool>().prop_map(Value::Bool),
        any::<f64>().prop_map(Value::Number),
        any::<i64>().prop_map(|n| Value::BigInt(n.into())),
        "[a-z]{0,8}".prop_map(Value::String),
    ]
}

fn tree() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::array),
            prop::collection::vec(("[a-z]{1,4}", inner), 0..6).prop_map(|entries| {
                Value::object(entries.into_iter().collect::<Properties>())
            }),
        ]
    })
}

/// Points a container root back at itself.
fn close_cycle(root: &Value) {
    if !root.push(root.clone()) {
        root.set("cycle", root.clone());
    }
}

/// A tree whose root, when it is a container, also points back at itself.
fn cyclic_tree() -> impl Strategy<Value = Value> {
    tree().prop_map(|root| {
        close_cycle(&root);
        root
    })
}

/// Copies a generated tree object by object, without the codec or `clone`.
fn rebuild(value: &Value) -> Value {
    let Some(handle) = value.as_handle() else {
        return value.clone();
    };
    let twin = match &*handle.borrow() {
        Object::Array(items) => Value::array(items.iter().map(rebuild).collect()),
        Object::Plain(plain) => Value::object(
            plain
                .properties
                .iter()
                .map(|(key, value)| (key.clone(), rebuild(value)))
                .collect::<Properties>(),
        ),
        other => panic!("unexpected {} in a generated tree", other.kind_name()),
    };
    twin
}

/// Two separately built cyclic graphs of the same shape and data.
fn cyclic_twins() -> impl Strategy<Value = (Value, Value)> {
    tree().prop_map(|root| {
        let twin = rebuild(&root);
        close_cycle(&root);
        close_cycle(&twin);
        (root, twin)
    })
}

fn round_trip(value: &Value) -> Value {
    parse(&stringify(value).unwrap()).unwrap()
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Record {
    id: u32,
    label: String,
    weights: Vec<i32>,
    parent: Option<u64>,
}

proptest! {
    #[test]
    fn prop_round_trip_is_equal(value in tree()) {
        prop_assert!(is_equal(&round_trip(&value), &value));
    }

    #[test]
    fn prop_cyclic_round_trip_is_equal(value in cyclic_tree()) {
        prop_assert!(is_equal(&round_trip(&value), &value));
    }

    #[test]
    fn prop_clone_is_equal(value in cyclic_tree()) {
        let copy = clone(&value);
        prop_assert!(is_equal(&copy, &value));
        if value.as_handle().is_some() {
            prop_assert!(!copy.same_object(&value));
        }
    }

    #[test]
    fn prop_equal_shapes_are_equal((value, twin) in cyclic_twins()) {
        if value.as_handle().is_some() {
            prop_assert!(!twin.same_object(&value));
        }
        prop_assert!(is_equal(&value, &twin));
        prop_assert!(is_equal(&twin, &value));
    }

    #[test]
    fn prop_stringify_is_deterministic(value in cyclic_tree()) {
        prop_assert_eq!(stringify(&value).unwrap(), stringify(&value).unwrap());
    }

    #[test]
    fn prop_leaf_change_is_detected(a in "[a-z]{1,6}", b in "[a-z]{1,6}") {
        prop_assume!(a != b);
        let left = Value::array(vec![Value::from(a.as_str())]);
        let right = Value::array(vec![Value::from(b.as_str())]);
        prop_assert!(!is_equal(&left, &right));
    }

    #[test]
    fn prop_serde_bridge_round_trip(
        id in any::<u32>(),
        label in ".{0,12}",
        weights in prop::collection::vec(any::<i32>(), 0..10),
        parent in proptest::option::of(any::<u64>()),
    ) {
        let record = Record { id, label, weights, parent };
        let value = round_trip(&to_value(&record).unwrap());
        prop_assert_eq!(from_value::<Record>(&value).unwrap(), record);
    }
}
