use crate::format::INVALID_DATE;
use crate::object::{Handle, Object};
use crate::{Error, Result, Value};
use chrono::SecondsFormat;
use num_traits::ToPrimitive;
use rustc_hash::FxHashSet;
use serde::de::{self, DeserializeOwned, IntoDeserializer};
use serde::forward_to_deserialize_any;
use std::cell::RefCell;

/// Addresses of the objects between the root and the value being visited.
type ActivePath = RefCell<FxHashSet<usize>>;

/// Converts a [`Value`] graph into any `T: Deserialize`.
///
/// The serde data model is a tree, so the graph is read as one: a shared
/// object is visited once per occurrence, and an object that contains itself
/// fails with [`Error::Cycle`].
///
/// Exotic objects read as their nearest serde shape: dates as ISO 8601
/// strings, typed arrays as byte buffers (or sequences of bytes), sets as
/// sequences, and maps and class instances as maps.
///
/// # Examples
///
/// ```rust
/// use dson::{dson, from_value, Error, Value};
/// use serde::Deserialize;
///
/// #[derive(Deserialize, Debug, PartialEq)]
/// struct Point { x: i32, y: i32 }
///
/// let point: Point = from_value(&dson!({"x": 1, "y": 2})).unwrap();
/// assert_eq!(point, Point { x: 1, y: 2 });
///
/// let looped = Value::empty_object();
/// looped.set("me", looped.clone());
/// let result: Result<serde_json::Value, _> = from_value(&looped);
/// assert!(matches!(result, Err(Error::Cycle)));
/// ```
pub fn from_value<T>(value: &Value) -> Result<T>
where
    T: DeserializeOwned,
{
    let path = ActivePath::default();
    T::deserialize(ValueDeserializer::new(value.clone(), &path))
}

/// An object flattened to the closest serde data-model shape.
enum Shape {
    Seq(Vec<Value>),
    Map(Vec<(Value, Value)>),
    Str(String),
    Bytes(Vec<u8>),
    Unit,
}

fn entry(key: &str, value: impl Into<Value>) -> (Value, Value) {
    (Value::from(key), value.into())
}

impl Shape {
    fn of(object: &Object) -> Shape {
        match object {
            Object::Plain(plain) => Shape::Map(
                plain
                    .properties
                    .iter()
                    .map(|(k, v)| (Value::from(k.as_str()), v.clone()))
                    .collect(),
            ),
            Object::Instance(instance) => Shape::Map(
                instance
                    .properties
                    .iter()
                    .map(|(k, v)| (Value::from(k.as_str()), v.clone()))
                    .collect(),
            ),
            Object::Array(items) | Object::FileList(items) | Object::NodeList(items) => {
                Shape::Seq(items.clone())
            }
            Object::Set(set) => Shape::Seq(set.iter().cloned().collect()),
            Object::Map(map) => Shape::Map(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()),
            Object::Date(Some(date)) => Shape::Str(date.to_rfc3339_opts(SecondsFormat::Millis, true)),
            Object::Date(None) => Shape::Str(INVALID_DATE.to_string()),
            Object::RegExp(re) => Shape::Str(format!("/{}/{}", re.source, re.flags)),
            Object::Url(url) => Shape::Str(url.as_str().to_string()),
            Object::SearchParams(pairs) => Shape::Str(
                url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(pairs)
                    .finish(),
            ),
            Object::Function(function) => Shape::Str(function.source.clone()),
            Object::Text(text) | Object::Comment(text) => Shape::Str(text.clone()),
            Object::TypedArray(array) => Shape::Bytes(array.bytes.clone()),
            Object::Error(err) => {
                let mut entries = vec![entry("name", err.name.as_str()), entry("message", err.message.as_str())];
                if let Some(stack) = &err.stack {
                    entries.push(entry("stack", stack.as_str()));
                }
                Shape::Map(entries)
            }
            Object::File(file) => Shape::Map(vec![
                entry("name", file.name.as_str()),
                entry("type", file.mime_type.as_str()),
                entry("lastModified", file.last_modified),
            ]),
            Object::FormData(form) => Shape::Seq(
                form.entries
                    .iter()
                    .map(|(name, value)| Value::array(vec![Value::from(name.as_str()), value.clone()]))
                    .collect(),
            ),
            Object::Element(el) => {
                let attributes = el
                    .attributes
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::from(v.as_str())))
                    .collect::<crate::Properties>();
                Shape::Map(vec![
                    entry("tagName", el.tag_name.as_str()),
                    entry("attributes", attributes),
                    entry("innerHTML", el.inner_html.as_str()),
                ])
            }
            Object::WeakMap | Object::WeakSet => Shape::Unit,
        }
    }

    fn visit<'de, V>(self, path: &ActivePath, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self {
            Shape::Seq(items) => visitor.visit_seq(SeqDeserializer::new(items, path)),
            Shape::Map(entries) => visitor.visit_map(MapDeserializer::new(entries, path)),
            Shape::Str(s) => visitor.visit_string(s),
            Shape::Bytes(bytes) => visitor.visit_byte_buf(bytes),
            Shape::Unit => visitor.visit_unit(),
        }
    }
}

struct ValueDeserializer<'p> {
    value: Value,
    path: &'p ActivePath,
}

impl<'p> ValueDeserializer<'p> {
    fn new(value: Value, path: &'p ActivePath) -> Self {
        ValueDeserializer { value, path }
    }

    /// Runs `f` on the shape of `handle` with `handle` marked as active.
    fn enter<R>(&self, handle: &Handle, f: impl FnOnce(Shape) -> Result<R>) -> Result<R> {
        let addr = handle.addr();
        if !self.path.borrow_mut().insert(addr) {
            return Err(Error::Cycle);
        }
        let shape = handle
            .try_borrow()
            .map(|object| Shape::of(&object))
            .map_err(|e| Error::Borrowed(e.to_string()));
        let result = shape.and_then(f);
        self.path.borrow_mut().remove(&addr);
        result
    }
}

impl<'de> de::Deserializer<'de> for ValueDeserializer<'_> {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let path = self.path;
        match &self.value {
            Value::Undefined | Value::Null => visitor.visit_unit(),
            Value::Bool(b) => visitor.visit_bool(*b),
            Value::Number(n) if n.fract() == 0.0 && n.abs() <= 9_007_199_254_740_991.0 => {
                visitor.visit_i64(*n as i64)
            }
            Value::Number(n) => visitor.visit_f64(*n),
            Value::String(s) => visitor.visit_string(s.clone()),
            Value::BigInt(b) => {
                if let Some(i) = b.to_i64() {
                    visitor.visit_i64(i)
                } else if let Some(u) = b.to_u64() {
                    visitor.visit_u64(u)
                } else if let Some(i) = b.to_i128() {
                    visitor.visit_i128(i)
                } else {
                    visitor.visit_string(b.to_string())
                }
            }
            Value::Symbol(sym) => visitor.visit_string(sym.description().unwrap_or_default().to_string()),
            Value::Object(handle) => self.enter(handle, |shape| shape.visit(path, visitor)),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Undefined | Value::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    /// Typed arrays read as a sequence of bytes here, so `Vec<u8>` works.
    fn deserialize_seq<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let path = self.path;
        match &self.value {
            Value::Object(handle) => self.enter(handle, |shape| match shape {
                Shape::Bytes(bytes) => {
                    let items = bytes.into_iter().map(Value::from).collect();
                    visitor.visit_seq(SeqDeserializer::new(items, path))
                }
                other => other.visit(path, visitor),
            }),
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_tuple<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_seq(visitor)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let path = self.path;
        match &self.value {
            Value::String(s) => visitor.visit_enum(s.clone().into_deserializer()),
            Value::Object(handle) => self.enter(handle, |shape| match shape {
                Shape::Map(entries) if entries.len() == 1 => {
                    let mut entries = entries.into_iter();
                    match entries.next() {
                        Some((Value::String(variant), value)) => {
                            visitor.visit_enum(EnumDeserializer { variant, value, path })
                        }
                        _ => Err(Error::custom("Expected a string enum variant")),
                    }
                }
                _ => Err(Error::custom("Expected an object with a single variant key")),
            }),
            other => Err(Error::custom(format!("Expected enum, found {}", other.type_name()))),
        }
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct map struct identifier ignored_any
    }
}

struct SeqDeserializer<'p> {
    iter: std::vec::IntoIter<Value>,
    path: &'p ActivePath,
}

impl<'p> SeqDeserializer<'p> {
    fn new(vec: Vec<Value>, path: &'p ActivePath) -> Self {
        SeqDeserializer {
            iter: vec.into_iter(),
            path,
        }
    }
}

impl<'de> de::SeqAccess<'de> for SeqDeserializer<'_> {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some(value) => seed.deserialize(ValueDeserializer::new(value, self.path)).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        match self.iter.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(upper),
            _ => None,
        }
    }
}

struct MapDeserializer<'p> {
    iter: std::vec::IntoIter<(Value, Value)>,
    value: Option<Value>,
    path: &'p ActivePath,
}

impl<'p> MapDeserializer<'p> {
    fn new(entries: Vec<(Value, Value)>, path: &'p ActivePath) -> Self {
        MapDeserializer {
            iter: entries.into_iter(),
            value: None,
            path,
        }
    }
}

impl<'de> de::MapAccess<'de> for MapDeserializer<'_> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(ValueDeserializer::new(key, self.path)).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some(value) => seed.deserialize(ValueDeserializer::new(value, self.path)),
            None => Err(Error::custom("next_value_seed called before next_key_seed")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        match self.iter.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(upper),
            _ => None,
        }
    }
}

struct EnumDeserializer<'p> {
    variant: String,
    value: Value,
    path: &'p ActivePath,
}

impl<'de, 'p> de::EnumAccess<'de> for EnumDeserializer<'p> {
    type Error = Error;
    type Variant = ValueDeserializer<'p>;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: de::DeserializeSeed<'de>,
    {
        let variant = seed.deserialize(ValueDeserializer::new(Value::String(self.variant), self.path))?;
        Ok((variant, ValueDeserializer::new(self.value, self.path)))
    }
}

impl<'de> de::VariantAccess<'de> for ValueDeserializer<'_> {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self.value {
            Value::Null | Value::Undefined => Ok(()),
            _ => Err(Error::custom("Expected unit variant")),
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: de::DeserializeSeed<'de>,
    {
        seed.deserialize(self)
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        de::Deserializer::deserialize_seq(self, visitor)
    }

    fn struct_variant<V>(self, _fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        de::Deserializer::deserialize_any(self, visitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::TypedArray;
    use crate::{to_value, ValueMap, ValueSet};
    use chrono::{TimeZone, Utc};
    use num_bigint::BigInt;
    use serde::Deserialize;
    use std::collections::{BTreeMap, HashMap};

    #[derive(Deserialize, Debug, PartialEq)]
    enum Figure {
        Empty,
        Circle(f64),
        Rect { w: u32, h: u32 },
        Pair(i8, i8),
    }

    #[derive(Deserialize, Debug, PartialEq)]
    struct Meters(f64);

    #[test]
    fn test_primitives() {
        assert_eq!(from_value::<i32>(&Value::from(7)).unwrap(), 7);
        assert_eq!(from_value::<f64>(&Value::from(1.25)).unwrap(), 1.25);
        assert_eq!(from_value::<f64>(&Value::from(3)).unwrap(), 3.0);
        assert_eq!(from_value::<Option<u8>>(&Value::Undefined).unwrap(), None);
        assert_eq!(from_value::<Option<u8>>(&Value::from(2)).unwrap(), Some(2));
        assert_eq!(from_value::<Meters>(&Value::from(4.5)).unwrap(), Meters(4.5));
    }

    #[test]
    fn test_enums_round_trip_through_to_value() {
        for json in [r#""Empty""#, r#"{"Circle":2.0}"#, r#"{"Rect":{"w":1,"h":2}}"#, r#"{"Pair":[1,-1]}"#] {
            let expected: Figure = serde_json::from_str(json).unwrap();
            let as_json: serde_json::Value = serde_json::from_str(json).unwrap();
            let value = to_value(&as_json).unwrap();
            assert_eq!(from_value::<Figure>(&value).unwrap(), expected);
        }
    }

    #[test]
    fn test_bigint_narrows_when_it_fits() {
        let fits = Value::BigInt(BigInt::from(1u64 << 60));
        assert_eq!(from_value::<u64>(&fits).unwrap(), 1u64 << 60);

        let huge = Value::BigInt(BigInt::from(u128::MAX) * 2);
        assert_eq!(
            from_value::<String>(&huge).unwrap(),
            "680564733841876926926749214863536422910"
        );
    }

    #[test]
    fn test_exotic_objects() {
        let date = Value::date(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap());
        assert_eq!(from_value::<String>(&date).unwrap(), "2024-01-02T03:04:05.000Z");

        let bytes = Value::typed_array(TypedArray::from_u8(&[9, 8]));
        assert_eq!(from_value::<Vec<u8>>(&bytes).unwrap(), vec![9, 8]);

        let set: ValueSet = vec![Value::from(1), Value::from(2)].into_iter().collect();
        assert_eq!(from_value::<Vec<i32>>(&Value::from(set)).unwrap(), vec![1, 2]);

        let map: ValueMap = vec![(Value::from(1), Value::from("one"))].into_iter().collect();
        let by_id: BTreeMap<u32, String> = from_value(&Value::from(map)).unwrap();
        assert_eq!(by_id.get(&1).map(String::as_str), Some("one"));

        let re = Value::regexp("a+", "g");
        assert_eq!(from_value::<String>(&re).unwrap(), "/a+/g");
    }

    #[test]
    fn test_shared_object_is_read_twice() {
        let shared = Value::array(vec![Value::from(1)]);
        let root = Value::array(vec![shared.clone(), shared]);
        let out: Vec<Vec<i32>> = from_value(&root).unwrap();
        assert_eq!(out, vec![vec![1], vec![1]]);
    }

    #[test]
    fn test_indirect_cycle_is_rejected() {
        let a = Value::empty_object();
        let b = Value::array(vec![a.clone()]);
        a.set("b", b);
        let result: Result<HashMap<String, serde_json::Value>> = from_value(&a);
        assert!(matches!(result, Err(Error::Cycle)));
    }
}
