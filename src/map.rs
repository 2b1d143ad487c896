//! Ordered collections used inside DSON objects.
//!
//! - [`Properties`]: string-keyed object properties, a thin wrapper around
//!   [`IndexMap`] that keeps insertion order so encoded output is stable.
//! - [`ValueMap`] / [`ValueSet`]: the payloads of `Map` and `Set` objects.
//!   Keys are compared with SameValueZero: primitives by value (`NaN` equals
//!   `NaN`, `-0` equals `0`), symbols and heap objects by identity.
//!
//! ## Examples
//!
//! ```rust
//! use dson::{Properties, Value, ValueMap};
//!
//! let mut props = Properties::new();
//! props.insert("name".to_string(), Value::from("Alice"));
//! assert_eq!(props.get("name").and_then(|v| v.as_str()), Some("Alice"));
//!
//! let mut map = ValueMap::new();
//! map.insert(Value::from(f64::NAN), Value::from(1));
//! assert!(map.contains_key(&Value::from(f64::NAN)));
//! ```

use crate::Value;
use indexmap::IndexMap;
use num_bigint::BigInt;
use std::collections::HashMap;

/// An ordered map of string keys to values.
///
/// # Examples
///
/// ```rust
/// use dson::{Properties, Value};
///
/// let mut map = Properties::new();
/// map.insert("first".to_string(), Value::from(1));
/// map.insert("second".to_string(), Value::from(2));
///
/// let keys: Vec<_> = map.keys().cloned().collect();
/// assert_eq!(keys, vec!["first", "second"]);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Properties(IndexMap<String, Value>);

impl Properties {
    #[must_use]
    pub fn new() -> Self {
        Properties(IndexMap::new())
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Properties(IndexMap::with_capacity(capacity))
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the map already contained this key, the old value is returned and
    /// the key keeps its original position.
    pub fn insert(&mut self, key: String, value: Value) -> Option<Value> {
        self.0.insert(key, value)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.0.get_mut(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Removes a key, preserving the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the keys of the map, in insertion order.
    pub fn keys(&self) -> indexmap::map::Keys<'_, String, Value> {
        self.0.keys()
    }

    /// Returns an iterator over the values of the map, in insertion order.
    pub fn values(&self) -> indexmap::map::Values<'_, String, Value> {
        self.0.values()
    }

    /// Returns an iterator over the key-value pairs of the map, in insertion order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Value> {
        self.0.iter()
    }
}

impl From<HashMap<String, Value>> for Properties {
    fn from(map: HashMap<String, Value>) -> Self {
        Properties(map.into_iter().collect())
    }
}

impl IntoIterator for Properties {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Properties {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(String, Value)> for Properties {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Properties(IndexMap::from_iter(iter))
    }
}

/// Hashable SameValueZero identity of a value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Key {
    Undefined,
    Null,
    Bool(bool),
    Number(u64),
    String(String),
    BigInt(BigInt),
    Symbol(usize),
    Object(usize),
}

impl Key {
    fn of(value: &Value) -> Key {
        match value {
            Value::Undefined => Key::Undefined,
            Value::Null => Key::Null,
            Value::Bool(b) => Key::Bool(*b),
            Value::Number(n) => Key::Number(normalize_bits(*n)),
            Value::String(s) => Key::String(s.clone()),
            Value::BigInt(b) => Key::BigInt(b.clone()),
            Value::Symbol(s) => Key::Symbol(s.addr()),
            Value::Object(h) => Key::Object(h.addr()),
        }
    }
}

fn normalize_bits(n: f64) -> u64 {
    if n.is_nan() {
        f64::NAN.to_bits()
    } else if n == 0.0 {
        0.0f64.to_bits()
    } else {
        n.to_bits()
    }
}

/// The entries of a `Map` object, in insertion order.
///
/// # Examples
///
/// ```rust
/// use dson::{Value, ValueMap};
///
/// let mut map = ValueMap::new();
/// map.insert(Value::from("k"), Value::from(1));
/// map.insert(Value::from("k"), Value::from(2));
/// assert_eq!(map.len(), 1);
/// assert_eq!(map.get(&Value::from("k")), Some(&Value::from(2)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ValueMap(IndexMap<Key, (Value, Value)>);

impl ValueMap {
    #[must_use]
    pub fn new() -> Self {
        ValueMap(IndexMap::new())
    }

    /// Inserts an entry, replacing the value (but not the position) of an
    /// existing SameValueZero-equal key.
    pub fn insert(&mut self, key: Value, value: Value) -> Option<Value> {
        match self.0.entry(Key::of(&key)) {
            indexmap::map::Entry::Occupied(mut slot) => {
                Some(std::mem::replace(&mut slot.get_mut().1, value))
            }
            indexmap::map::Entry::Vacant(slot) => {
                slot.insert((key, value));
                None
            }
        }
    }

    #[must_use]
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.0.get(&Key::of(key)).map(|(_, v)| v)
    }

    #[must_use]
    pub fn contains_key(&self, key: &Value) -> bool {
        self.0.contains_key(&Key::of(key))
    }

    pub fn remove(&mut self, key: &Value) -> Option<Value> {
        self.0.shift_remove(&Key::of(key)).map(|(_, v)| v)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.0.values().map(|(k, v)| (k, v))
    }
}

impl FromIterator<(Value, Value)> for ValueMap {
    fn from_iter<T: IntoIterator<Item = (Value, Value)>>(iter: T) -> Self {
        let mut map = ValueMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

/// The members of a `Set` object, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct ValueSet(IndexMap<Key, Value>);

impl ValueSet {
    #[must_use]
    pub fn new() -> Self {
        ValueSet(IndexMap::new())
    }

    /// Adds a member; returns `false` if an equal member was already present.
    pub fn insert(&mut self, value: Value) -> bool {
        match self.0.entry(Key::of(&value)) {
            indexmap::map::Entry::Occupied(_) => false,
            indexmap::map::Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
        }
    }

    #[must_use]
    pub fn contains(&self, value: &Value) -> bool {
        self.0.contains_key(&Key::of(value))
    }

    pub fn remove(&mut self, value: &Value) -> bool {
        self.0.shift_remove(&Key::of(value)).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over members in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.0.values()
    }
}

impl FromIterator<Value> for ValueSet {
    fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> Self {
        let mut set = ValueSet::new();
        for v in iter {
            set.insert(v);
        }
        set
    }
}
