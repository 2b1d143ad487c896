//! DSON wire format.
//!
//! DSON text is ordinary JSON. Its structure is a tree of *tagged values*:
//!
//! - JSON primitives (`null`, booleans, finite numbers, strings) pass through unchanged.
//! - Every other value is a 3-element tuple `[refId, typeTag, payload]`.
//!
//! `refId` is `null` for values without identity (BigInt, Symbol, the
//! non-finite numbers, `undefined`) and a non-negative integer for heap
//! objects. Ids are unique within one encoded document and are assigned in
//! visiting order, starting at 0.
//!
//! # References
//!
//! `[null, "ref", N]` means "the object already registered under id N". The
//! encoder emits it on every visit after the first, which is how shared
//! references keep their identity and how cycles terminate:
//!
//! ```text
//! a = {}; a.self = a
//! [0,"Object",{"self":[null,"ref",0]}]
//! ```
//!
//! The decoder allocates every id before populating any of them, so a `ref`
//! may point backwards, forwards, or at the object that contains it.
//!
//! # Tags
//!
//! | Tag | refId | Payload |
//! |-----|-------|---------|
//! | `Object` | id | `{key: tagged, ..., "__symbols__": {description: tagged}}` |
//! | `Array` | id | `[tagged, ...]` |
//! | `Map` | id | `[[tagged key, tagged value], ...]` |
//! | `Set` | id | `[tagged, ...]` |
//! | `Date` | id | ISO-8601 string with milliseconds, or `"Invalid Date"` |
//! | `RegExp` | id | `{"source": s, "flags": f}` |
//! | `URL` | id | href string |
//! | `URLSearchParams` | id | `application/x-www-form-urlencoded` string |
//! | `WeakMap`, `WeakSet` | id | `null` (contents are not observable) |
//! | `Function` | id | source text |
//! | `Int8Array` ... `BigUint64Array`, `DataView` | id | `{"buffer": base64, "byteOffset", "byteLength", "length"}` |
//! | `ArrayBuffer` | id | base64 string |
//! | `Error` | id | `{"name", "message", "stack"}` |
//! | `File` | id | `{"name", "type", "size", "lastModified", "data": base64 or null}` |
//! | `FileList`, `NodeList` | id | `[tagged, ...]` |
//! | `FormData` | id | `[[name, tagged], ...]` |
//! | `Element` | id | `{"tagName", "attributes": {name: value}, "innerHTML"}` |
//! | `Text`, `Comment` | id | string |
//! | `Class` | id | `{"className": name, "properties": {key: tagged}}` |
//! | `BigInt` | `null` | decimal string |
//! | `Symbol` | `null` | description, or `null` for `Symbol()` |
//! | `NaN`, `Infinity`, `-Infinity`, `undefined` | `null` | `null` |
//! | `Skip` | `null` | `null` (an environment value that was not encoded) |
//! | `ref` | `null` | id of an earlier-or-later registered object |
//!
//! # Plain JSON
//!
//! A JSON array is read as a tuple only if it has exactly three elements,
//! the first is `null` or a non-negative integer, and the second is one of
//! the tags above. Any other array or object decodes as a plain `Array` or
//! `Object`, so every JSON document is also a DSON document.
//!
//! # Binary payloads
//!
//! Bytes are base64 with the standard alphabet and `=` padding. Typed array
//! elements are little-endian.

use crate::object::TypedArrayKind;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Value as JsonValue};

/// Key of the synthetic bucket that carries symbol-keyed properties.
pub const SYMBOLS_KEY: &str = "__symbols__";

/// Description used for symbol keys that have none.
pub const UNNAMED_SYMBOL: &str = "unnamed_symbol";

/// Date payload for an invalid date.
pub const INVALID_DATE: &str = "Invalid Date";

/// The closed set of type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Object,
    Array,
    Map,
    Set,
    Date,
    RegExp,
    Url,
    UrlSearchParams,
    WeakMap,
    WeakSet,
    Function,
    TypedArray(TypedArrayKind),
    Error,
    File,
    FileList,
    FormData,
    Element,
    Text,
    Comment,
    NodeList,
    Class,
    BigInt,
    Symbol,
    NaN,
    Infinity,
    NegInfinity,
    Undefined,
    Skip,
    Ref,
}

impl Tag {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Tag::Object => "Object",
            Tag::Array => "Array",
            Tag::Map => "Map",
            Tag::Set => "Set",
            Tag::Date => "Date",
            Tag::RegExp => "RegExp",
            Tag::Url => "URL",
            Tag::UrlSearchParams => "URLSearchParams",
            Tag::WeakMap => "WeakMap",
            Tag::WeakSet => "WeakSet",
            Tag::Function => "Function",
            Tag::TypedArray(kind) => kind.as_str(),
            Tag::Error => "Error",
            Tag::File => "File",
            Tag::FileList => "FileList",
            Tag::FormData => "FormData",
            Tag::Element => "Element",
            Tag::Text => "Text",
            Tag::Comment => "Comment",
            Tag::NodeList => "NodeList",
            Tag::Class => "Class",
            Tag::BigInt => "BigInt",
            Tag::Symbol => "Symbol",
            Tag::NaN => "NaN",
            Tag::Infinity => "Infinity",
            Tag::NegInfinity => "-Infinity",
            Tag::Undefined => "undefined",
            Tag::Skip => "Skip",
            Tag::Ref => "ref",
        }
    }

    /// Parses a tag name. Unknown names yield `None`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Tag> {
        let tag = match name {
            "Object" => Tag::Object,
            "Array" => Tag::Array,
            "Map" => Tag::Map,
            "Set" => Tag::Set,
            "Date" => Tag::Date,
            "RegExp" => Tag::RegExp,
            "URL" => Tag::Url,
            "URLSearchParams" => Tag::UrlSearchParams,
            "WeakMap" => Tag::WeakMap,
            "WeakSet" => Tag::WeakSet,
            "Function" => Tag::Function,
            "Error" => Tag::Error,
            "File" => Tag::File,
            "FileList" => Tag::FileList,
            "FormData" => Tag::FormData,
            "Element" => Tag::Element,
            "Text" => Tag::Text,
            "Comment" => Tag::Comment,
            "NodeList" => Tag::NodeList,
            "Class" => Tag::Class,
            "BigInt" => Tag::BigInt,
            "Symbol" => Tag::Symbol,
            "NaN" => Tag::NaN,
            "Infinity" => Tag::Infinity,
            "-Infinity" => Tag::NegInfinity,
            "undefined" => Tag::Undefined,
            "Skip" => Tag::Skip,
            "ref" => Tag::Ref,
            other => return TypedArrayKind::from_name(other).map(Tag::TypedArray),
        };
        Some(tag)
    }

    /// Whether tuples with this tag carry a heap object id.
    #[must_use]
    pub const fn has_identity(&self) -> bool {
        !matches!(
            self,
            Tag::BigInt
                | Tag::Symbol
                | Tag::NaN
                | Tag::Infinity
                | Tag::NegInfinity
                | Tag::Undefined
                | Tag::Skip
                | Tag::Ref
        )
    }
}

/// A recognized `[refId, typeTag, payload]` tuple.
#[derive(Debug, Clone, Copy)]
pub struct Tuple<'a> {
    pub id: Option<u64>,
    pub tag: Tag,
    pub payload: &'a JsonValue,
}

impl<'a> Tuple<'a> {
    /// Recognizes a tuple. Arrays that do not look like one are plain arrays.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dson::format::{Tag, Tuple};
    /// use serde_json::json;
    ///
    /// let t = json!([3, "Set", [1, 2]]);
    /// let tuple = Tuple::recognize(&t).unwrap();
    /// assert_eq!(tuple.id, Some(3));
    /// assert_eq!(tuple.tag, Tag::Set);
    ///
    /// assert!(Tuple::recognize(&json!(["a", "b", "c"])).is_none());
    /// assert!(Tuple::recognize(&json!([1, "NotATag", 2])).is_none());
    /// ```
    #[must_use]
    pub fn recognize(value: &'a JsonValue) -> Option<Tuple<'a>> {
        let items = value.as_array()?;
        if items.len() != 3 {
            return None;
        }
        let id = match &items[0] {
            JsonValue::Null => None,
            other => Some(other.as_u64()?),
        };
        let tag = Tag::from_name(items[1].as_str()?)?;
        Some(Tuple {
            id,
            tag,
            payload: &items[2],
        })
    }
}

/// Builds a tuple.
pub fn tuple(id: Option<u64>, tag: Tag, payload: JsonValue) -> JsonValue {
    json!([id, tag.as_str(), payload])
}

/// Builds a `[null, "ref", id]` tuple.
pub fn reference(id: u64) -> JsonValue {
    tuple(None, Tag::Ref, JsonValue::from(id))
}

/// Encodes bytes as padded standard base64.
pub fn bytes_to_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decodes padded or unpadded standard base64.
///
/// # Errors
///
/// Returns an error if the text contains characters outside the alphabet.
pub fn base64_to_bytes(text: &str) -> crate::Result<Vec<u8>> {
    let trimmed = text.trim_end_matches('=');
    let mut padded = trimmed.to_string();
    while padded.len() % 4 != 0 {
        padded.push('=');
    }
    Ok(STANDARD.decode(padded.as_bytes())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_names_round_trip() {
        let tags = [
            Tag::Object,
            Tag::Url,
            Tag::UrlSearchParams,
            Tag::TypedArray(TypedArrayKind::Float32),
            Tag::NegInfinity,
            Tag::Undefined,
            Tag::Ref,
        ];
        for tag in tags {
            assert_eq!(Tag::from_name(tag.as_str()), Some(tag));
        }
        assert_eq!(Tag::from_name("Headers"), None);
    }

    #[test]
    fn test_reference_shape() {
        assert_eq!(reference(7), json!([null, "ref", 7]));
    }

    #[test]
    fn test_recognize_rejects_negative_ids() {
        assert!(Tuple::recognize(&json!([-1, "Array", []])).is_none());
        assert!(Tuple::recognize(&json!([1.5, "Array", []])).is_none());
        assert!(Tuple::recognize(&json!([null, "BigInt", "1"])).is_some());
    }

    #[test]
    fn test_base64_round_trip() {
        assert_eq!(bytes_to_base64(b""), "");
        assert_eq!(bytes_to_base64(b"hi"), "aGk=");
        assert_eq!(base64_to_bytes("aGk=").unwrap(), b"hi");
        assert_eq!(base64_to_bytes("aGk").unwrap(), b"hi");
        assert!(base64_to_bytes("***").is_err());
    }

    #[test]
    fn test_identity_tags() {
        assert!(Tag::Map.has_identity());
        assert!(!Tag::BigInt.has_identity());
        assert!(!Tag::Ref.has_identity());
    }
}
