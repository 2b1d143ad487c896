use dson::{dson, is_equal, stringify, Object, Value};

#[test]
fn test_macro_null() {
    assert_eq!(dson!(null), Value::Null);
    assert_eq!(dson!(undefined), Value::Undefined);
}

#[test]
fn test_macro_bool() {
    assert_eq!(dson!(true), Value::Bool(true));
    assert_eq!(dson!(false), Value::Bool(false));
}

#[test]
fn test_macro_numbers() {
    assert_eq!(dson!(42), Value::Number(42.0));
    assert_eq!(dson!(0), Value::Number(0.0));
    assert_eq!(dson!(2.5), Value::Number(2.5));
    assert_eq!(dson!((-7)), Value::Number(-7.0));
}

#[test]
fn test_macro_strings() {
    assert_eq!(dson!("hello"), Value::from("hello"));
    assert_eq!(dson!(""), Value::from(""));
    let owned = String::from("owned");
    assert_eq!(dson!(owned), Value::from("owned"));
}

#[test]
fn test_macro_empty_containers() {
    assert_eq!(stringify(&dson!([])).unwrap(), r#"[0,"Array",[]]"#);
    assert_eq!(stringify(&dson!({})).unwrap(), r#"[0,"Object",{}]"#);
}

#[test]
fn test_macro_array() {
    let arr = dson!([1, "two", null, true]);
    match &*arr.as_handle().unwrap().borrow() {
        Object::Array(items) => {
            assert_eq!(items.len(), 4);
            assert_eq!(items[0], Value::from(1));
            assert_eq!(items[1], Value::from("two"));
            assert_eq!(items[2], Value::Null);
            assert_eq!(items[3], Value::Bool(true));
        }
        other => panic!("expected an array, got {}", other.kind_name()),
    };
}

#[test]
fn test_macro_trailing_comma() {
    let arr = dson!([1, 2,]);
    assert_eq!(arr.as_handle().unwrap().len(), Some(2));
    let obj = dson!({ "a": 1, });
    assert_eq!(obj.get("a"), Some(Value::from(1)));
}

#[test]
fn test_macro_nested() {
    let value = dson!({
        "user": {
            "name": "Alice",
            "roles": ["admin", "ops"]
        },
        "count": 2
    });
    let user = value.get("user").unwrap();
    assert_eq!(user.get("name"), Some(Value::from("Alice")));
    assert_eq!(user.get("roles").unwrap().index(1), Some(Value::from("ops")));
    assert_eq!(value.get("count"), Some(Value::from(2)));
}

#[test]
fn test_macro_preserves_key_order() {
    let value = dson!({ "z": 1, "a": 2, "m": 3 });
    assert_eq!(
        stringify(&value).unwrap(),
        r#"[0,"Object",{"z":1,"a":2,"m":3}]"#
    );
}

#[test]
fn test_macro_embeds_values() {
    let shared = dson!({ "id": 1 });
    let pair = dson!([(shared.clone()), (shared.clone())]);
    assert!(pair.index(0).unwrap().same_object(&shared));
    assert!(pair.index(1).unwrap().same_object(&shared));
}

#[test]
fn test_macro_equal_literals_are_deep_equal() {
    let a = dson!({ "list": [1, 2, { "x": null }] });
    let b = dson!({ "list": [1, 2, { "x": null }] });
    assert_ne!(a, b);
    assert!(is_equal(&a, &b));
}
