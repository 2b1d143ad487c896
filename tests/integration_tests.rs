use chrono::{TimeZone, Utc};
use dson::{
    clone, dson, from_value, is_equal, parse, parse_with_options, stringify, stringify_pretty,
    stringify_with_options, to_value, Class, ConstructorMap, Element, ErrorObject, File, FormData,
    Object, ParseOptions, Properties, StringifyOptions, Symbol, TypedArray, Value, ValueMap,
    ValueSet,
};
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

fn round_trip(value: &Value) -> Value {
    let text = stringify(value).unwrap();
    parse(&text).unwrap()
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct User {
    id: u32,
    name: String,
    active: bool,
    tags: Vec<String>,
}

#[test]
fn test_map_of_set_round_trip() {
    let set: ValueSet = vec![Value::from(1), Value::from(2)].into_iter().collect();
    let map: ValueMap = vec![(Value::from("k"), Value::from(set))].into_iter().collect();
    let back = round_trip(&Value::from(map));

    let handle = back.as_handle().unwrap();
    let inner = match &*handle.borrow() {
        Object::Map(map) => map.get(&Value::from("k")).cloned().unwrap(),
        other => panic!("expected a map, got {}", other.kind_name()),
    };
    match &*inner.as_handle().unwrap().borrow() {
        Object::Set(set) => {
            assert_eq!(set.len(), 2);
            assert!(set.contains(&Value::from(1)));
            assert!(set.contains(&Value::from(2)));
        }
        other => panic!("expected a set, got {}", other.kind_name()),
    };
}

#[test]
fn test_regexp_round_trip() {
    let back = round_trip(&Value::regexp("ab+c", "gi"));
    match &*back.as_handle().unwrap().borrow() {
        Object::RegExp(re) => {
            assert_eq!(re.source, "ab+c");
            assert_eq!(re.flags, "gi");
        }
        other => panic!("expected a regexp, got {}", other.kind_name()),
    };
}

#[test]
fn test_array_containing_itself() {
    let a = dson!([1, 2, 3]);
    a.push(a.clone());
    assert_eq!(stringify(&a).unwrap(), r#"[0,"Array",[1,2,3,[null,"ref",0]]]"#);

    let back = round_trip(&a);
    assert_eq!(back.as_handle().unwrap().len(), Some(4));
    assert!(back.index(3).unwrap().same_object(&back));
}

#[test]
fn test_parse_degrades_to_null() {
    assert_eq!(parse("").unwrap(), Value::Null);
    assert_eq!(parse("{").unwrap(), Value::Null);
    assert_eq!(parse(r#"[0,"Map",7]"#).unwrap(), Value::Null);
    assert_eq!(parse(r#"[0,"Array",[[null,"ref",9]]]"#).unwrap(), Value::Null);
}

#[test]
fn test_strict_parse_reports_errors() {
    let strict = ParseOptions::new().strict(true);
    assert_eq!(parse_with_options("", &strict).unwrap(), Value::Null);
    assert!(matches!(
        parse_with_options("{", &strict),
        Err(dson::Error::Syntax { .. })
    ));
    assert!(matches!(
        parse_with_options(r#"[0,"Map",7]"#, &strict),
        Err(dson::Error::MalformedTuple(_))
    ));
    assert!(matches!(
        parse_with_options(r#"[0,"Array",[[null,"ref",9]]]"#, &strict),
        Err(dson::Error::UnresolvedReference(9))
    ));
}

#[test]
fn test_equal_dates_in_distinct_objects() {
    let instant = Utc.with_ymd_and_hms(2023, 6, 1, 12, 0, 0).unwrap();
    let a = dson!({ "date": (Value::date(instant)) });
    let b = dson!({ "date": (Value::date(instant)) });
    assert!(!a.get("date").unwrap().same_object(&b.get("date").unwrap()));
    assert!(is_equal(&a, &b));
}

#[test]
fn test_self_reference_survives_round_trip() {
    let a = Value::empty_object();
    a.set("self", a.clone());
    let back = round_trip(&a);
    assert!(back.get("self").unwrap().same_object(&back));
}

#[test]
fn test_mutual_references() {
    let a = Value::empty_object();
    let b = Value::empty_object();
    a.set("next", b.clone());
    b.set("prev", a.clone());

    let back = round_trip(&a);
    let next = back.get("next").unwrap();
    assert!(next.get("prev").unwrap().same_object(&back));
    assert!(is_equal(&back, &a));
}

#[test]
fn test_shared_reference_is_encoded_once() {
    let shared = dson!({ "n": 1 });
    let root = Value::array(vec![shared.clone(), shared]);
    let text = stringify(&root).unwrap();
    assert_eq!(
        text,
        r#"[0,"Array",[[1,"Object",{"n":1}],[null,"ref",1]]]"#
    );

    let back = parse(&text).unwrap();
    assert!(back.index(0).unwrap().same_object(&back.index(1).unwrap()));
}

#[test]
fn test_clone_independence() {
    let inner = dson!({ "leaf": 1 });
    let root = dson!({});
    root.set("inner", inner.clone());
    root.set("again", inner.clone());
    root.set("root", root.clone());

    let copy = clone(&root);
    assert!(is_equal(&copy, &root));
    assert!(!copy.same_object(&root));
    assert!(!copy.get("inner").unwrap().same_object(&inner));
    assert!(copy.get("inner").unwrap().same_object(&copy.get("again").unwrap()));
    assert!(copy.get("root").unwrap().same_object(&copy));
}

#[test]
fn test_equality_under_cycles() {
    let build = |leaf: i32| {
        let a = dson!({ "v": leaf });
        let b = Value::array(vec![a.clone()]);
        a.set("b", b);
        a
    };
    assert!(is_equal(&build(1), &build(1)));
    assert!(!is_equal(&build(1), &build(2)));
}

#[test]
fn test_exotic_primitives_round_trip() {
    let sym = Symbol::new("tag");
    let root = dson!({
        "u": undefined,
        "nan": (f64::NAN),
        "inf": (f64::INFINITY),
        "ninf": (f64::NEG_INFINITY),
        "negzero": (-0.0)
    });
    root.set("big", Value::BigInt(BigInt::from(u64::MAX) * 3));
    root.set("sym", Value::from(sym.clone()));

    let back = round_trip(&root);
    assert_eq!(back.get("u"), Some(Value::Undefined));
    assert!(back.get("nan").and_then(|v| v.as_f64()).is_some_and(f64::is_nan));
    assert_eq!(back.get("inf"), Some(Value::from(f64::INFINITY)));
    assert_eq!(back.get("ninf"), Some(Value::from(f64::NEG_INFINITY)));
    assert_eq!(back.get("negzero"), Some(Value::from(0)));
    assert_eq!(back.get("big"), Some(Value::BigInt(BigInt::from(u64::MAX) * 3)));

    let back_sym = back.get("sym").unwrap();
    assert_ne!(back_sym, Value::from(sym));
    assert_eq!(back_sym.as_symbol().and_then(|s| s.description()), Some("tag"));
    assert!(is_equal(&back, &root));
}

#[test]
fn test_symbol_keyed_properties_round_trip() {
    let key = Symbol::new("secret");
    let obj = Value::empty_object();
    obj.set("visible", Value::from(1));
    if let Object::Plain(plain) = &mut *obj.as_handle().unwrap().borrow_mut() {
        plain.set_symbol(key, Value::from("hidden"));
    }

    let text = stringify(&obj).unwrap();
    assert!(text.contains(r#""__symbols__":{"secret":"hidden"}"#));

    let back = parse(&text).unwrap();
    assert_eq!(back.get("__symbols__"), None);
    match &*back.as_handle().unwrap().borrow() {
        Object::Plain(plain) => {
            assert_eq!(plain.symbols.len(), 1);
            assert_eq!(plain.symbols[0].0.description(), Some("secret"));
            assert_eq!(plain.symbols[0].1, Value::from("hidden"));
        }
        other => panic!("expected a plain object, got {}", other.kind_name()),
    };
}

#[test]
fn test_builtin_objects_round_trip() {
    let root = Value::empty_object();
    root.set(
        "when",
        Value::date(Utc.with_ymd_and_hms(2020, 2, 29, 23, 59, 59).unwrap()),
    );
    root.set("invalid", Value::new_object(Object::Date(None)));
    root.set(
        "url",
        Value::new_object(Object::Url(url::Url::parse("https://example.com/a?b=c").unwrap())),
    );
    root.set(
        "query",
        Value::new_object(Object::SearchParams(vec![
            ("q".to_string(), "a b".to_string()),
            ("x".to_string(), "&".to_string()),
        ])),
    );
    root.set("floats", Value::typed_array(TypedArray::from_f64(&[1.5, -2.25])));
    root.set("ints", Value::typed_array(TypedArray::from_i32(&[-1, 0, 7])));
    root.set(
        "err",
        Value::new_object(Object::Error(
            ErrorObject::new("TypeError", "bad").with_stack("at line 1"),
        )),
    );
    root.set("weak", Value::new_object(Object::WeakMap));

    let back = round_trip(&root);
    assert!(is_equal(&back, &root));
    assert_eq!(back.get("invalid").unwrap().type_name(), "Date");
    assert_eq!(back.get("floats").unwrap().type_name(), "Float64Array");
    assert_eq!(back.get("weak").unwrap().type_name(), "WeakMap");
}

#[test]
fn test_dom_values_round_trip() {
    let mut form = FormData::new();
    form.append("name", Value::from("alice"));
    form.append("name", Value::from("bob"));
    let file = Value::new_object(Object::File(
        File::from_bytes("a.txt", "text/plain", b"hello".to_vec()).with_last_modified(1_700_000_000_000),
    ));
    form.append("upload", file.clone());

    let root = Value::empty_object();
    root.set("form", Value::new_object(Object::FormData(form)));
    root.set("files", Value::new_object(Object::FileList(vec![file])));
    root.set(
        "el",
        Value::new_object(Object::Element(
            Element::new("div")
                .with_attribute("id", "main")
                .with_inner_html("<b>hi</b>"),
        )),
    );
    root.set("text", Value::new_object(Object::Text("plain".to_string())));

    let back = round_trip(&root);
    assert!(is_equal(&back, &root));

    // The File appears twice but is encoded once.
    let form_file = match &*back.get("form").unwrap().as_handle().unwrap().borrow() {
        Object::FormData(form) => {
            assert_eq!(form.get_all("name").count(), 2);
            form.get_all("upload").next().cloned().unwrap()
        }
        other => panic!("expected form data, got {}", other.kind_name()),
    };
    assert!(back.get("files").unwrap().index(0).unwrap().same_object(&form_file));
}

#[test]
fn test_class_round_trip_with_and_without_constructor() {
    let point = Class::new("Point");
    let mut props = Properties::new();
    props.insert("x".to_string(), Value::from(1));
    props.insert("y".to_string(), Value::from(2));
    let original = Value::instance(&point, props);

    let text = stringify(&original).unwrap();
    assert_eq!(
        text,
        r#"[0,"Class",{"className":"Point","properties":{"x":1,"y":2}}]"#
    );

    let constructors: ConstructorMap = vec![point.clone()].into_iter().collect();
    let options = ParseOptions::new().with_constructors(constructors);
    let revived = parse_with_options(&text, &options).unwrap();
    assert!(revived.as_handle().unwrap().class().is_some_and(|c| c.ptr_eq(&point)));
    assert!(is_equal(&revived, &original));

    let degraded = parse(&text).unwrap();
    assert_eq!(degraded.type_name(), "Object");
    assert_eq!(degraded.get("y"), Some(Value::from(2)));
    assert!(!is_equal(&degraded, &original));
}

#[test]
fn test_functions_are_opt_in() {
    let root = Value::empty_object();
    let f = Value::function("function add(a, b) { return a + b; }");
    root.set("f", f.clone());
    root.set("g", f);
    let text = stringify(&root).unwrap();

    let inert = parse(&text).unwrap();
    assert_eq!(inert.get("f"), Some(Value::Undefined));
    assert_eq!(inert.get("g"), Some(Value::Undefined));

    let revived = parse_with_options(&text, &ParseOptions::new().revive_functions(true)).unwrap();
    let g = revived.get("g").unwrap();
    assert!(revived.get("f").unwrap().same_object(&g));
    assert!(is_equal(&revived, &root));
}

#[test]
fn test_globals_are_skipped() {
    let window = Value::empty_object();
    let root = Value::empty_object();
    root.set("window", window.clone());
    root.set("keep", Value::from(1));

    let options = StringifyOptions::new().with_global(window.as_handle().unwrap().clone());
    let text = stringify_with_options(&root, &options).unwrap();
    assert_eq!(
        text,
        r#"[0,"Object",{"window":[null,"Skip",null],"keep":1}]"#
    );

    let back = parse(&text).unwrap();
    assert_eq!(back.get("window"), None);
    assert_eq!(back.get("keep"), Some(Value::from(1)));
}

#[test]
fn test_depth_limit_truncates() {
    let deep = dson!({ "a": { "b": { "c": 1 } } });
    let options = StringifyOptions::new().with_depth_limit(2);
    let text = stringify_with_options(&deep, &options).unwrap();
    assert_eq!(
        text,
        r#"[0,"Object",{"a":[1,"Object",{"b":[2,"Object",{"c":null}]}]}]"#
    );
}

#[test]
fn test_plain_json_is_dson() {
    let value = parse(r#"{"list":[1,"two",null],"nested":{"ok":true},"pair":[1,"Nope",2]}"#).unwrap();
    assert_eq!(value.type_name(), "Object");
    assert_eq!(value.get("list").unwrap().index(1), Some(Value::from("two")));
    assert_eq!(value.get("nested").unwrap().get("ok"), Some(Value::Bool(true)));
    assert_eq!(value.get("pair").unwrap().as_handle().unwrap().len(), Some(3));
}

#[test]
fn test_pretty_output_parses_back() {
    let root = dson!({ "a": [1, 2], "b": "x" });
    let pretty = stringify_pretty(&root).unwrap();
    assert!(pretty.contains('\n'));
    assert!(pretty.contains("  "));
    assert!(is_equal(&parse(&pretty).unwrap(), &root));
}

#[test]
fn test_serde_bridge_with_graph_codec() {
    let user = User {
        id: 7,
        name: "Alice".to_string(),
        active: true,
        tags: vec!["admin".to_string(), "ops".to_string()],
    };
    let value = to_value(&user).unwrap();
    let back = round_trip(&value);
    let user_back: User = from_value(&back).unwrap();
    assert_eq!(user, user_back);
}
