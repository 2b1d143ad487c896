//! # dson
//!
//! A JSON superset codec for live value graphs.
//!
//! ## What is DSON?
//!
//! Plain JSON loses three things when it writes out a graph of objects:
//! shared references (two paths to one object come back as two objects),
//! circular references (which make `JSON.stringify` throw), and every type
//! that is not a JSON primitive, array or plain object. DSON keeps all
//! three. Its output is still ordinary JSON text, so it travels over any
//! JSON transport, and every plain JSON document is also a DSON document.
//!
//! ## Key Features
//!
//! - **Identity-preserving**: shared and cyclic references round-trip with
//!   the same shape
//! - **Exotic types**: `undefined`, `NaN`, `BigInt`, symbols, dates, regexps,
//!   maps, sets, typed arrays, errors, URLs, files, form data, DOM nodes and
//!   class instances
//! - **Graph equality and cloning**: [`is_equal`] and [`clone`] handle cycles
//!   directly on the live graph
//! - **Serde bridge**: [`to_value`] / [`from_value`] move between Rust types
//!   and [`Value`] graphs
//! - **Lenient by default**: a value that cannot be encoded or decoded
//!   degrades to `null` and is logged through `tracing`; strict mode turns
//!   the same failures into errors
//!
//! ## Quick Start
//!
//! ```rust
//! use dson::{is_equal, parse, stringify, Value};
//!
//! let node = Value::empty_object();
//! node.set("name", Value::from("root"));
//! node.set("parent", node.clone());
//!
//! let text = stringify(&node).unwrap();
//! assert_eq!(text, r#"[0,"Object",{"name":"root","parent":[null,"ref",0]}]"#);
//!
//! let back = parse(&text).unwrap();
//! assert!(back.get("parent").unwrap().same_object(&back));
//! assert!(is_equal(&back, &node));
//! ```
//!
//! ### Exotic values
//!
//! ```rust
//! use dson::{dson, parse, stringify, ValueSet, Value};
//!
//! let tags: ValueSet = vec![Value::from("a"), Value::from("b")].into_iter().collect();
//! let doc = dson!({ "missing": undefined, "ratio": (f64::NAN) });
//! doc.set("tags", Value::from(tags));
//!
//! let back = parse(&stringify(&doc).unwrap()).unwrap();
//! assert_eq!(back.get("missing"), Some(Value::Undefined));
//! assert!(back.get("ratio").and_then(|r| r.as_f64()).is_some_and(f64::is_nan));
//! assert_eq!(back.get("tags").unwrap().type_name(), "Set");
//! ```
//!
//! ### Class instances
//!
//! ```rust
//! use dson::{parse_with_options, stringify, Class, ParseOptions, Properties, Value};
//!
//! let point = Class::new("Point");
//! let mut props = Properties::new();
//! props.insert("x".to_string(), Value::from(1));
//! let text = stringify(&Value::instance(&point, props)).unwrap();
//!
//! let options = ParseOptions::new().with_constructor(point.clone());
//! let back = parse_with_options(&text, &options).unwrap();
//! assert!(back.as_handle().unwrap().class().is_some_and(|c| c.ptr_eq(&point)));
//! ```
//!
//! ## Wire Format
//!
//! See the [`format`] module for the tuple layout and the tag table.

pub mod class;
mod clone;
pub mod de;
mod equal;
pub mod error;
pub mod format;
pub mod macros;
pub mod map;
pub mod object;
pub mod options;
mod registry;
pub mod ser;
pub mod value;

pub use class::{Class, ConstructorMap, Instance};
pub use clone::clone;
pub use de::Decoder;
pub use equal::is_equal;
pub use error::{Error, Result};
pub use format::Tag;
pub use map::{Properties, ValueMap, ValueSet};
pub use object::{
    Element, ErrorObject, File, FileSource, FormData, Function, Handle, Object, PlainObject,
    RegExp, TypedArray, TypedArrayKind,
};
pub use options::{ParseOptions, Replacer, StringifyOptions};
pub use ser::Encoder;
pub use value::{from_value, to_value, Symbol, Value, ValueSerializer};

use serde_json::Value as JsonValue;
use std::io;

/// Encodes a value graph as compact DSON text.
///
/// # Examples
///
/// ```rust
/// use dson::{stringify, Value};
///
/// assert_eq!(stringify(&Value::from(1)).unwrap(), "1");
/// assert_eq!(stringify(&Value::Undefined).unwrap(), r#"[null,"undefined",null]"#);
/// ```
///
/// # Errors
///
/// In the default lenient mode only a failure at the root is returned (for
/// example a root object that is mutably borrowed); failures further down
/// are written as `null`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn stringify(value: &Value) -> Result<String> {
    stringify_with_options(value, &StringifyOptions::default())
}

/// Encodes a value graph as DSON text indented by two spaces.
///
/// # Errors
///
/// Same as [`stringify`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn stringify_pretty(value: &Value) -> Result<String> {
    stringify_with_options(value, &StringifyOptions::pretty())
}

/// Encodes a value graph as DSON text with custom options.
///
/// # Examples
///
/// ```rust
/// use dson::{dson, stringify_with_options, Replacer, StringifyOptions};
///
/// let options = StringifyOptions::new().with_replacer(Replacer::allow(["keep"]));
/// let text = stringify_with_options(&dson!({"keep": 1, "drop": 2}), &options).unwrap();
/// assert_eq!(text, r#"[0,"Object",{"keep":1}]"#);
/// ```
///
/// # Errors
///
/// With [`StringifyOptions::strict`] set, the first value that cannot be
/// encoded is returned as an error.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn stringify_with_options(value: &Value, options: &StringifyOptions) -> Result<String> {
    let mut buffer = Vec::new();
    to_writer(&mut buffer, value, options)?;
    String::from_utf8(buffer).map_err(Error::custom)
}

/// Encodes a value graph into its tagged tree without rendering it as text.
///
/// # Examples
///
/// ```rust
/// use dson::{to_tagged, StringifyOptions, Value};
/// use serde_json::json;
///
/// let tagged = to_tagged(&Value::from(f64::INFINITY), &StringifyOptions::new()).unwrap();
/// assert_eq!(tagged, json!([null, "Infinity", null]));
/// ```
///
/// # Errors
///
/// Same as [`stringify_with_options`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_tagged(value: &Value, options: &StringifyOptions) -> Result<JsonValue> {
    Encoder::new(options).encode_root(value)
}

/// Writes a value graph to `writer` as DSON text.
///
/// # Examples
///
/// ```rust
/// use dson::{to_writer, StringifyOptions, Value};
///
/// let mut buffer = Vec::new();
/// to_writer(&mut buffer, &Value::from("hi"), &StringifyOptions::new()).unwrap();
/// assert_eq!(buffer, br#""hi""#);
/// ```
///
/// # Errors
///
/// Returns an error if encoding fails (see [`stringify_with_options`]) or
/// writing to the writer fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer<W>(writer: W, value: &Value, options: &StringifyOptions) -> Result<()>
where
    W: io::Write,
{
    let tagged = to_tagged(value, options)?;
    ser::write_json(writer, &tagged, options.indent.as_deref())
}

/// Decodes DSON text into a live value graph.
///
/// Empty input decodes to `null`. Any other input that fails to decode is
/// logged and also decodes to `null`; use [`parse_with_options`] with
/// [`ParseOptions::strict`] to get the error instead.
///
/// # Examples
///
/// ```rust
/// use dson::{parse, Value};
///
/// assert_eq!(parse("").unwrap(), Value::Null);
/// assert_eq!(parse("not json").unwrap(), Value::Null);
/// assert_eq!(parse(r#"{"a":1}"#).unwrap().get("a"), Some(Value::from(1)));
/// ```
///
/// # Errors
///
/// Never fails in the default lenient mode; the `Result` is kept so call
/// sites read the same as [`parse_with_options`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn parse(text: &str) -> Result<Value> {
    parse_with_options(text, &ParseOptions::default())
}

/// Decodes DSON text with custom options.
///
/// # Errors
///
/// With [`ParseOptions::strict`] set, returns a syntax error for text that
/// is not JSON, a malformed-tuple error for a tag whose payload has the
/// wrong shape, and an unresolved-reference error for a `ref` to an id that
/// never appears.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn parse_with_options(text: &str, options: &ParseOptions) -> Result<Value> {
    de::decode_str(text, options)
}

/// Decodes an already-parsed tagged tree.
///
/// # Examples
///
/// ```rust
/// use dson::{from_tagged, ParseOptions};
/// use serde_json::json;
///
/// let value = from_tagged(&json!([null, "BigInt", "12345678901234567890"]), &ParseOptions::new()).unwrap();
/// assert_eq!(value.as_bigint().unwrap().to_string(), "12345678901234567890");
/// ```
///
/// # Errors
///
/// Same as [`parse_with_options`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_tagged(tagged: &JsonValue, options: &ParseOptions) -> Result<Value> {
    de::decode_tagged(tagged, options)
}

/// Decodes DSON from UTF-8 bytes.
///
/// # Examples
///
/// ```rust
/// use dson::{from_slice, ParseOptions};
///
/// let value = from_slice(br#"[0,"Array",[1,2]]"#, &ParseOptions::new()).unwrap();
/// assert!(value.is_array());
/// ```
///
/// # Errors
///
/// Same as [`parse_with_options`]; bytes that are not UTF-8 count as a
/// decode failure.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_slice(bytes: &[u8], options: &ParseOptions) -> Result<Value> {
    de::decode_slice(bytes, options)
}

/// Decodes DSON from an I/O stream.
///
/// # Examples
///
/// ```rust
/// use dson::{from_reader, ParseOptions};
/// use std::io::Cursor;
///
/// let value = from_reader(Cursor::new(b"[null,\"NaN\",null]"), &ParseOptions::new()).unwrap();
/// assert!(value.as_f64().is_some_and(f64::is_nan));
/// ```
///
/// # Errors
///
/// Returns an I/O error if reading fails, in either mode. Decoding then
/// follows [`parse_with_options`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_reader<R>(mut reader: R, options: &ParseOptions) -> Result<Value>
where
    R: io::Read,
{
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    from_slice(&bytes, options)
}
