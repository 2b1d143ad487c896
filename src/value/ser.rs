use crate::object::TypedArray;
use crate::{Error, Properties, Result, Value, ValueMap};
use num_bigint::BigInt;
use serde::{ser, Serialize};

/// Largest integer magnitude an `f64` holds exactly.
const MAX_SAFE_INTEGER: u128 = 9_007_199_254_740_991;

/// Converts any `T: Serialize` into a [`Value`] graph.
///
/// Structs and string-keyed maps become plain objects, maps with other keys
/// become `Map` objects, byte strings become `Uint8Array`s, and integers an
/// `f64` cannot hold exactly become `BigInt`s.
///
/// # Examples
///
/// ```rust
/// use dson::{to_value, Value};
/// use serde::Serialize;
/// use std::collections::BTreeMap;
///
/// #[derive(Serialize)]
/// struct Point { x: i32, y: i32 }
///
/// let value = to_value(&Point { x: 1, y: 2 }).unwrap();
/// assert_eq!(value.get("x"), Some(Value::from(1)));
///
/// let big = to_value(&u64::MAX).unwrap();
/// assert!(big.as_bigint().is_some());
///
/// let by_id: BTreeMap<u8, &str> = [(1, "one")].into_iter().collect();
/// assert_eq!(to_value(&by_id).unwrap().type_name(), "Map");
/// ```
pub fn to_value<T>(value: &T) -> Result<Value>
where
    T: ?Sized + Serialize,
{
    value.serialize(ValueSerializer)
}

/// A serde serializer whose output is a [`Value`].
pub struct ValueSerializer;

pub struct SerializeVec {
    vec: Vec<Value>,
    variant: Option<&'static str>,
}

pub struct SerializeMap {
    entries: Vec<(Value, Value)>,
    next_key: Option<Value>,
}

pub struct SerializeStruct {
    properties: Properties,
    variant: Option<&'static str>,
}

fn integer(v: i128) -> Value {
    if v.unsigned_abs() <= MAX_SAFE_INTEGER {
        Value::Number(v as f64)
    } else {
        Value::BigInt(BigInt::from(v))
    }
}

/// Externally tags `value` with its enum variant: `{variant: value}`.
fn tagged(variant: &str, value: Value) -> Value {
    let mut properties = Properties::with_capacity(1);
    properties.insert(variant.to_string(), value);
    Value::object(properties)
}

impl ser::Serializer for ValueSerializer {
    type Ok = Value;
    type Error = Error;

    type SerializeSeq = SerializeVec;
    type SerializeTuple = SerializeVec;
    type SerializeTupleStruct = SerializeVec;
    type SerializeTupleVariant = SerializeVec;
    type SerializeMap = SerializeMap;
    type SerializeStruct = SerializeStruct;
    type SerializeStructVariant = SerializeStruct;

    fn serialize_bool(self, v: bool) -> Result<Value> {
        Ok(Value::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i16(self, v: i16) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i32(self, v: i32) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i64(self, v: i64) -> Result<Value> {
        Ok(integer(i128::from(v)))
    }

    fn serialize_i128(self, v: i128) -> Result<Value> {
        Ok(integer(v))
    }

    fn serialize_u8(self, v: u8) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u16(self, v: u16) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u32(self, v: u32) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u64(self, v: u64) -> Result<Value> {
        Ok(integer(i128::from(v)))
    }

    fn serialize_u128(self, v: u128) -> Result<Value> {
        match i128::try_from(v) {
            Ok(v) => Ok(integer(v)),
            Err(_) => Ok(Value::BigInt(BigInt::from(v))),
        }
    }

    fn serialize_f32(self, v: f32) -> Result<Value> {
        Ok(Value::Number(f64::from(v)))
    }

    fn serialize_f64(self, v: f64) -> Result<Value> {
        Ok(Value::Number(v))
    }

    fn serialize_char(self, v: char) -> Result<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value> {
        Ok(Value::typed_array(TypedArray::from_u8(v)))
    }

    fn serialize_none(self) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_some<T>(self, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Value> {
        Ok(Value::String(variant.to_string()))
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        Ok(tagged(variant, to_value(value)?))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeVec> {
        Ok(SerializeVec {
            vec: Vec::with_capacity(len.unwrap_or(0)),
            variant: None,
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeVec> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SerializeVec> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeVec> {
        Ok(SerializeVec {
            vec: Vec::with_capacity(len),
            variant: Some(variant),
        })
    }

    fn serialize_map(self, len: Option<usize>) -> Result<SerializeMap> {
        Ok(SerializeMap {
            entries: Vec::with_capacity(len.unwrap_or(0)),
            next_key: None,
        })
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<SerializeStruct> {
        Ok(SerializeStruct {
            properties: Properties::with_capacity(len),
            variant: None,
        })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeStruct> {
        Ok(SerializeStruct {
            properties: Properties::with_capacity(len),
            variant: Some(variant),
        })
    }
}

impl SerializeVec {
    fn finish(self) -> Value {
        let array = Value::array(self.vec);
        match self.variant {
            Some(variant) => tagged(variant, array),
            None => array,
        }
    }
}

impl ser::SerializeSeq for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.vec.push(to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeTuple for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleStruct for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleVariant for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeMap for SerializeMap {
    type Ok = Value;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.next_key = Some(to_value(key)?);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .next_key
            .take()
            .ok_or_else(|| Error::custom("serialize_value called without serialize_key"))?;
        self.entries.push((key, to_value(value)?));
        Ok(())
    }

    /// String keys make a plain object; anything else makes a `Map`.
    fn end(self) -> Result<Value> {
        if self.entries.iter().all(|(k, _)| matches!(k, Value::String(_))) {
            let properties = self
                .entries
                .into_iter()
                .filter_map(|(k, v)| match k {
                    Value::String(s) => Some((s, v)),
                    _ => None,
                })
                .collect::<Properties>();
            Ok(Value::object(properties))
        } else {
            Ok(Value::from(self.entries.into_iter().collect::<ValueMap>()))
        }
    }
}

impl ser::SerializeStruct for SerializeStruct {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.properties.insert(key.to_string(), to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        let object = Value::object(self.properties);
        Ok(match self.variant {
            Some(variant) => tagged(variant, object),
            None => object,
        })
    }
}

impl ser::SerializeStructVariant for SerializeStruct {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeStruct::serialize_field(self, key, value)
    }

    fn end(self) -> Result<Value> {
        ser::SerializeStruct::end(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Object;
    use std::collections::HashMap;

    #[derive(Serialize)]
    enum Shape {
        Empty,
        Circle(f64),
        Rect { w: u32, h: u32 },
        Pair(i8, i8),
    }

    #[test]
    fn test_enums_are_externally_tagged() {
        assert_eq!(to_value(&Shape::Empty).unwrap(), Value::from("Empty"));

        let circle = to_value(&Shape::Circle(1.5)).unwrap();
        assert_eq!(circle.get("Circle"), Some(Value::from(1.5)));

        let rect = to_value(&Shape::Rect { w: 2, h: 3 }).unwrap();
        assert_eq!(rect.get("Rect").and_then(|r| r.get("h")), Some(Value::from(3)));

        let pair = to_value(&Shape::Pair(1, 2)).unwrap();
        assert_eq!(pair.get("Pair").and_then(|p| p.index(1)), Some(Value::from(2)));
    }

    #[test]
    fn test_integer_precision_boundary() {
        assert_eq!(to_value(&9_007_199_254_740_991i64).unwrap().as_f64(), Some(9_007_199_254_740_991.0));
        let big = to_value(&9_007_199_254_740_993i64).unwrap();
        assert_eq!(big.as_bigint(), Some(&BigInt::from(9_007_199_254_740_993i64)));
        assert!(to_value(&u128::MAX).unwrap().as_bigint().is_some());
    }

    #[test]
    fn test_bytes_become_uint8_array() {
        let value = to_value(&serde_bytes_like(&[1, 2, 3])).unwrap();
        match &*value.as_handle().unwrap().borrow() {
            Object::TypedArray(array) => assert_eq!(array.bytes, vec![1, 2, 3]),
            other => panic!("expected a typed array, got {}", other.kind_name()),
        };
    }

    #[test]
    fn test_options_and_units() {
        assert_eq!(to_value(&None::<i32>).unwrap(), Value::Null);
        assert_eq!(to_value(&Some(4)).unwrap(), Value::from(4));
        assert_eq!(to_value(&()).unwrap(), Value::Null);
    }

    #[test]
    fn test_string_keyed_map_is_plain_object() {
        let map: HashMap<String, bool> = [("on".to_string(), true)].into_iter().collect();
        let value = to_value(&map).unwrap();
        assert_eq!(value.type_name(), "Object");
        assert_eq!(value.get("on"), Some(Value::Bool(true)));
    }

    /// Serializes as a byte string rather than a sequence.
    struct Bytes<'a>(&'a [u8]);

    impl Serialize for Bytes<'_> {
        fn serialize<S: ser::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
            serializer.serialize_bytes(self.0)
        }
    }

    fn serde_bytes_like(bytes: &[u8]) -> Bytes<'_> {
        Bytes(bytes)
    }
}
