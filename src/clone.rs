//! Deep copies of value graphs.
//!
//! [`clone`] copies a graph in a single pass, without going through text.
//! The copy of each object is registered under the original's identity
//! *before* its children are copied, so shared and cyclic references come
//! out with the same shape they went in with.

use crate::class::Instance;
use crate::object::{FormData, Handle, Object, PlainObject};
use crate::{Properties, Value};
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

/// Deep-copies `value`.
///
/// The copy is [`is_equal`](crate::is_equal) to the original but shares no
/// object with it. Class instances are rebuilt through their class, so the
/// class initializer runs before the copied properties are assigned.
///
/// An object that is mutably borrowed while the graph is copied cannot be
/// read; it is copied as `undefined` and a warning is logged.
///
/// # Examples
///
/// ```rust
/// use dson::{clone, is_equal, Value};
///
/// let inner = Value::array(vec![Value::from(1)]);
/// let outer = Value::array(vec![inner.clone(), inner]);
///
/// let copy = clone(&outer);
/// assert!(is_equal(&copy, &outer));
/// assert!(!copy.same_object(&outer));
/// assert!(copy.index(0).unwrap().same_object(&copy.index(1).unwrap()));
/// ```
pub fn clone(value: &Value) -> Value {
    let mut cloner = Cloner::default();
    let copy = cloner.value(value);
    debug!(objects = cloner.memory.len(), "cloned value graph");
    copy
}

#[derive(Default)]
struct Cloner {
    /// Original object address to its copy.
    memory: FxHashMap<usize, Handle>,
}

impl Cloner {
    fn value(&mut self, value: &Value) -> Value {
        match value {
            Value::Object(handle) => self.handle(handle).map_or(Value::Undefined, Value::Object),
            primitive => primitive.clone(),
        }
    }

    fn handle(&mut self, original: &Handle) -> Option<Handle> {
        if let Some(copy) = self.memory.get(&original.addr()) {
            return Some(copy.clone());
        }

        // A shallow snapshot: leaf payloads are copied, children are still
        // the original handles.
        let snapshot = match original.try_borrow() {
            Ok(object) => object.clone(),
            Err(_) => {
                warn!(kind = original.kind_name(), "object is mutably borrowed, copying it as undefined");
                return None;
            }
        };

        let copy = Handle::new(Object::Plain(PlainObject::default()));
        self.memory.insert(original.addr(), copy.clone());
        let object = self.object(snapshot);
        copy.replace(object);
        Some(copy)
    }

    fn object(&mut self, object: Object) -> Object {
        match object {
            Object::Plain(plain) => Object::Plain(PlainObject {
                properties: self.properties(plain.properties),
                symbols: plain
                    .symbols
                    .into_iter()
                    .map(|(key, value)| (key, self.value(&value)))
                    .collect(),
            }),
            Object::Array(items) => Object::Array(self.list(items)),
            Object::FileList(items) => Object::FileList(self.list(items)),
            Object::NodeList(items) => Object::NodeList(self.list(items)),
            Object::Map(map) => Object::Map(
                map.iter()
                    .map(|(key, value)| (self.value(key), self.value(value)))
                    .collect(),
            ),
            Object::Set(set) => Object::Set(set.iter().map(|member| self.value(member)).collect()),
            Object::FormData(form) => Object::FormData(FormData {
                entries: form
                    .entries
                    .into_iter()
                    .map(|(name, value)| (name, self.value(&value)))
                    .collect(),
            }),
            Object::Instance(instance) => {
                let mut copy = Instance::construct(&instance.class);
                for (key, value) in instance.properties {
                    copy.properties.insert(key, self.value(&value));
                }
                Object::Instance(copy)
            }
            leaf => leaf,
        }
    }

    fn properties(&mut self, properties: Properties) -> Properties {
        properties
            .into_iter()
            .map(|(key, value)| (key, self.value(&value)))
            .collect()
    }

    fn list(&mut self, items: Vec<Value>) -> Vec<Value> {
        items.iter().map(|item| self.value(item)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{is_equal, Class, RegExp, Symbol, ValueSet};

    #[test]
    fn test_primitives_are_returned_as_is() {
        assert_eq!(clone(&Value::from(1)), Value::from(1));
        let sym = Symbol::new("s");
        assert_eq!(clone(&Value::from(sym.clone())), Value::from(sym));
    }

    #[test]
    fn test_cycle_is_preserved() {
        let a = Value::empty_object();
        a.set("self", a.clone());
        let copy = clone(&a);
        assert!(!copy.same_object(&a));
        assert!(copy.get("self").unwrap().same_object(&copy));
        assert!(is_equal(&copy, &a));
    }

    #[test]
    fn test_no_shared_children() {
        let child = Value::regexp("ab+c", "gi");
        let set: ValueSet = vec![child.clone()].into_iter().collect();
        let root = Value::array(vec![child.clone(), Value::from(set)]);

        let copy = clone(&root);
        let copied_child = copy.index(0).unwrap();
        assert!(!copied_child.same_object(&child));
        match &*copied_child.as_handle().unwrap().borrow() {
            Object::RegExp(re) => assert_eq!(re, &RegExp::new("ab+c", "gi")),
            other => panic!("expected a regexp, got {}", other.kind_name()),
        };

        let copied_set = copy.index(1).unwrap();
        match &*copied_set.as_handle().unwrap().borrow() {
            Object::Set(s) => {
                assert!(s.contains(&copied_child));
                assert!(!s.contains(&child));
            }
            other => panic!("expected a set, got {}", other.kind_name()),
        };
    }

    #[test]
    fn test_copy_is_independent() {
        let original = Value::array(vec![Value::from(1)]);
        let copy = clone(&original);
        copy.push(Value::from(2));
        assert_eq!(original.as_handle().unwrap().len(), Some(1));
    }

    #[test]
    fn test_borrowed_object_is_not_shared() {
        let child = Value::array(vec![Value::from(1)]);
        let root = Value::array(vec![child.clone(), Value::from(2)]);
        let handle = child.as_handle().unwrap();
        let _guard = handle.borrow_mut();

        let copy = clone(&root);
        assert!(!copy.same_object(&root));
        assert_eq!(copy.index(0), Some(Value::Undefined));
        assert_eq!(copy.index(1), Some(Value::from(2)));
    }

    #[test]
    fn test_instance_keeps_class_and_runs_initializer() {
        let class = Class::with_initializer("Counter", |props| {
            props.insert("created".to_string(), Value::from(true));
        });
        let mut props = Properties::new();
        props.insert("count".to_string(), Value::from(3));
        let original = Value::instance(&class, props);
        original.set("created", Value::from(false));

        let copy = clone(&original);
        assert!(copy.as_handle().unwrap().class().is_some_and(|c| c.ptr_eq(&class)));
        assert_eq!(copy.get("count"), Some(Value::from(3)));
        assert_eq!(copy.get("created"), Some(Value::from(false)));
    }
}
