//! Dynamic value representation for DSON data.
//!
//! This module provides the [`Value`] enum, which represents any value DSON can
//! carry: JSON primitives, the exotic primitives `undefined`, `BigInt` and
//! `Symbol`, and shared handles to heap objects (see [`Object`]).
//!
//! ## Identity
//!
//! Heap objects live behind a [`Handle`]. Cloning a `Value::Object` clones the
//! handle, not the object: both copies point at the same object, exactly like
//! two JavaScript variables referencing one object. This is what allows a
//! graph to contain shared and circular references.
//!
//! `==` on [`Value`] is strict equality (`===`): handles compare by identity,
//! numbers by IEEE-754 equality. Use [`is_equal`](crate::is_equal) for deep
//! structural comparison.
//!
//! ## Usage Patterns
//!
//! ```rust
//! use dson::{dson, Value};
//!
//! let null = Value::Null;
//! let number = Value::from(42);
//! let text = Value::from("hello");
//!
//! let obj = dson!({
//!     "name": "Alice",
//!     "age": 30
//! });
//! assert_eq!(obj.get("age"), Some(Value::from(30)));
//! ```
//!
//! ### Building a cycle
//!
//! ```rust
//! use dson::Value;
//!
//! let a = Value::empty_object();
//! a.set("self", a.clone());
//! assert_eq!(a.get("self"), Some(a.clone()));
//! ```

mod de;
mod ser;

pub use de::from_value;
pub use ser::{to_value, ValueSerializer};

use crate::class::{Class, Instance};
use crate::object::{ErrorObject, Handle, Object, RegExp, TypedArray};
use crate::{Properties, ValueMap, ValueSet};
use chrono::{DateTime, Utc};
use num_bigint::BigInt;
use std::fmt;
use std::rc::Rc;

/// A dynamically-typed representation of any DSON value.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    Undefined,
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    BigInt(BigInt),
    Symbol(Symbol),
    Object(Handle),
}

/// A unique symbol with an optional description.
///
/// Two symbols are `==` only if they are the same symbol; creating a second
/// symbol with the same description yields a distinct symbol.
///
/// # Examples
///
/// ```rust
/// use dson::Symbol;
///
/// let a = Symbol::new("id");
/// let b = Symbol::new("id");
/// assert_ne!(a, b);
/// assert_eq!(a, a.clone());
/// assert_eq!(a.description(), Some("id"));
/// ```
#[derive(Clone)]
pub struct Symbol(Rc<Option<String>>);

impl Symbol {
    pub fn new(description: impl Into<String>) -> Self {
        Symbol(Rc::new(Some(description.into())))
    }

    /// Creates a symbol without a description (`Symbol()`).
    pub fn anonymous() -> Self {
        Symbol(Rc::new(None))
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.description() {
            Some(desc) => write!(f, "Symbol({})", desc),
            None => write!(f, "Symbol()"),
        }
    }
}

impl Value {
    /// Wraps a heap object in a fresh handle.
    pub fn new_object(object: Object) -> Self {
        Value::Object(Handle::new(object))
    }

    /// Creates an empty plain object (`{}`).
    pub fn empty_object() -> Self {
        Value::new_object(Object::Plain(Default::default()))
    }

    pub fn object(properties: Properties) -> Self {
        Value::new_object(Object::Plain(properties.into()))
    }

    pub fn array(items: Vec<Value>) -> Self {
        Value::new_object(Object::Array(items))
    }

    pub fn date(date: DateTime<Utc>) -> Self {
        Value::new_object(Object::Date(Some(date)))
    }

    pub fn regexp(source: impl Into<String>, flags: impl Into<String>) -> Self {
        Value::new_object(Object::RegExp(RegExp::new(source, flags)))
    }

    /// Creates a function object carrying its source text.
    pub fn function(source: impl Into<String>) -> Self {
        Value::new_object(Object::Function(crate::object::Function::new(source)))
    }

    pub fn error(name: impl Into<String>, message: impl Into<String>) -> Self {
        Value::new_object(Object::Error(ErrorObject::new(name, message)))
    }

    pub fn typed_array(array: TypedArray) -> Self {
        Value::new_object(Object::TypedArray(array))
    }

    /// Constructs an instance of `class`, running its initializer, then
    /// assigns `properties` over the initialized defaults.
    pub fn instance(class: &Class, properties: Properties) -> Self {
        let mut instance = Instance::construct(class);
        for (k, v) in properties {
            instance.properties.insert(k, v);
        }
        Value::new_object(Object::Instance(instance))
    }

    #[inline]
    #[must_use]
    pub const fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns `true` for `null` and `undefined`.
    #[inline]
    #[must_use]
    pub const fn is_nullish(&self) -> bool {
        matches!(self, Value::Null | Value::Undefined)
    }

    #[inline]
    #[must_use]
    pub const fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    /// Returns `true` if the value is an array object.
    #[must_use]
    pub fn is_array(&self) -> bool {
        matches!(self, Value::Object(h) if matches!(&*h.borrow(), Object::Array(_)))
    }

    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// If the value is a number with no fractional part that fits in `i64`,
    /// returns it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dson::Value;
    ///
    /// assert_eq!(Value::from(42).as_i64(), Some(42));
    /// assert_eq!(Value::from(42.5).as_i64(), None);
    /// ```
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(f)
                if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 =>
            {
                Some(*f as i64)
            }
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_bigint(&self) -> Option<&BigInt> {
        match self {
            Value::BigInt(b) => Some(b),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self {
            Value::Symbol(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_handle(&self) -> Option<&Handle> {
        match self {
            Value::Object(h) => Some(h),
            _ => None,
        }
    }

    /// Returns `true` if both values are the same heap object.
    #[must_use]
    pub fn same_object(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Reads a string-keyed property of a plain object or class instance.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.as_handle().and_then(|h| h.get(key))
    }

    /// Writes a string-keyed property of a plain object or class instance.
    /// Returns `false` if the value is not such an object.
    pub fn set(&self, key: &str, value: Value) -> bool {
        match self.as_handle() {
            Some(h) => h.set(key, value),
            None => false,
        }
    }

    /// Reads an element of an array object.
    #[must_use]
    pub fn index(&self, i: usize) -> Option<Value> {
        self.as_handle().and_then(|h| h.index(i))
    }

    /// Appends to an array object. Returns `false` if the value is not an array.
    pub fn push(&self, value: Value) -> bool {
        match self.as_handle() {
            Some(h) => h.push(value),
            None => false,
        }
    }

    /// Name of the value's runtime type, as used in diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::BigInt(_) => "bigint",
            Value::Symbol(_) => "symbol",
            Value::Object(h) => h.kind_name(),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

macro_rules! from_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Number(value as f64)
                }
            }
        )*
    };
}

from_number!(i8, i16, i32, i64, u8, u16, u32, u64, isize, usize, f32, f64);

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<BigInt> for Value {
    fn from(value: BigInt) -> Self {
        Value::BigInt(value)
    }
}

impl From<Symbol> for Value {
    fn from(value: Symbol) -> Self {
        Value::Symbol(value)
    }
}

impl From<Handle> for Value {
    fn from(value: Handle) -> Self {
        Value::Object(value)
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Value::new_object(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::date(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::array(value)
    }
}

impl From<ValueMap> for Value {
    fn from(value: ValueMap) -> Self {
        Value::new_object(Object::Map(value))
    }
}

impl From<ValueSet> for Value {
    fn from(value: ValueSet) -> Self {
        Value::new_object(Object::Set(value))
    }
}

impl From<Properties> for Value {
    fn from(value: Properties) -> Self {
        Value::object(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) if n.is_nan() => write!(f, "NaN"),
            Value::Number(n) if n.is_infinite() => {
                write!(f, "{}", if *n > 0.0 { "Infinity" } else { "-Infinity" })
            }
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::BigInt(b) => write!(f, "{}n", b),
            Value::Symbol(s) => write!(f, "{:?}", s),
            Value::Object(h) => write!(f, "[object {}]", h.kind_name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_equality() {
        assert_eq!(Value::from(1), Value::from(1.0));
        assert_ne!(Value::from(f64::NAN), Value::from(f64::NAN));
        assert_eq!(Value::from(-0.0), Value::from(0.0));

        let a = Value::empty_object();
        let b = Value::empty_object();
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn test_property_access() {
        let obj = Value::empty_object();
        assert!(obj.set("x", Value::from(1)));
        assert_eq!(obj.get("x"), Some(Value::from(1)));
        assert_eq!(obj.get("y"), None);
        assert!(!Value::from(1).set("x", Value::Null));
    }

    #[test]
    fn test_array_push_and_index() {
        let arr = Value::array(vec![Value::from(1)]);
        assert!(arr.push(arr.clone()));
        assert!(arr.is_array());
        assert!(arr.index(1).is_some_and(|v| v.same_object(&arr)));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::from(f64::NEG_INFINITY).to_string(), "-Infinity");
        assert_eq!(Value::BigInt(BigInt::from(7)).to_string(), "7n");
        assert_eq!(Value::array(vec![]).to_string(), "[object Array]");
    }

    #[test]
    fn test_type_name() {
        assert_eq!(Value::Undefined.type_name(), "undefined");
        assert_eq!(Value::regexp("a", "g").type_name(), "RegExp");
    }
}
