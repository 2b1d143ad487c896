//! DSON encoding.
//!
//! The [`Encoder`] walks a live value graph once and produces the tagged tree
//! described in [`format`](crate::format). It owns the per-call
//! [`Registry`] and [`ProcessingSet`], so encoders never share state.
//!
//! ## Usage
//!
//! Most users should use the high-level functions in the crate root:
//!
//! ```rust
//! use dson::{stringify, to_tagged, StringifyOptions, Value};
//! use serde_json::json;
//!
//! let list = Value::array(vec![Value::from(1)]);
//! list.push(list.clone());
//!
//! assert_eq!(stringify(&list).unwrap(), r#"[0,"Array",[1,[null,"ref",0]]]"#);
//!
//! let tagged = to_tagged(&list, &StringifyOptions::new()).unwrap();
//! assert_eq!(tagged, json!([0, "Array", [1, [null, "ref", 0]]]));
//! ```
//!
//! ## Failures
//!
//! In the default lenient mode a child that cannot be encoded is written as
//! `null` and a warning is logged; the rest of the document is unaffected.
//! With [`StringifyOptions::strict`] the first such failure is returned.

use crate::format::{self, Tag, INVALID_DATE, SYMBOLS_KEY, UNNAMED_SYMBOL};
use crate::object::{File, FileSource, Handle, Object, TypedArray, TypedArrayKind};
use crate::registry::{ProcessingSet, Registry};
use crate::{Error, Replacer, Result, StringifyOptions, Value};
use chrono::SecondsFormat;
use serde::Serialize;
use serde_json::{json, Map as JsonMap, Value as JsonValue};
use std::fmt::Display;
use std::io;
use tracing::{debug, warn};

/// Largest magnitude below which every integer is exactly representable.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Encodes one value graph into its tagged tree.
pub struct Encoder<'o> {
    options: &'o StringifyOptions,
    registry: Registry,
    processing: ProcessingSet,
}

impl<'o> Encoder<'o> {
    pub fn new(options: &'o StringifyOptions) -> Self {
        Encoder {
            options,
            registry: Registry::new(),
            processing: ProcessingSet::new(),
        }
    }

    /// Encodes `value` as the root of a document and applies the replacer.
    pub fn encode_root(mut self, value: &Value) -> Result<JsonValue> {
        let tagged = self.encode(value, 0)?;
        debug_assert!(self.processing.is_empty());
        debug!(objects = self.registry.len(), "encoded value graph");
        Ok(match &self.options.replacer {
            Some(replacer) => apply_replacer(replacer, tagged),
            None => tagged,
        })
    }

    /// Encodes a value found at nesting `depth`.
    pub fn encode(&mut self, value: &Value, depth: usize) -> Result<JsonValue> {
        if let Value::Object(handle) = value {
            if self.options.is_global(handle) {
                return Ok(format::tuple(None, Tag::Skip, JsonValue::Null));
            }
        }

        if depth > self.options.depth_limit {
            warn!(
                depth,
                limit = self.options.depth_limit,
                "maximum depth reached, truncating to null"
            );
            return Ok(JsonValue::Null);
        }

        match value {
            Value::Undefined => Ok(format::tuple(None, Tag::Undefined, JsonValue::Null)),
            Value::Null => Ok(JsonValue::Null),
            Value::Bool(b) => Ok(JsonValue::Bool(*b)),
            Value::Number(n) => Ok(encode_number(*n)),
            Value::String(s) => Ok(JsonValue::String(s.clone())),
            Value::BigInt(b) => Ok(format::tuple(
                None,
                Tag::BigInt,
                JsonValue::String(b.to_string()),
            )),
            Value::Symbol(s) => Ok(format::tuple(
                None,
                Tag::Symbol,
                s.description().map_or(JsonValue::Null, JsonValue::from),
            )),
            Value::Object(handle) => self.encode_handle(handle, depth),
        }
    }

    fn encode_handle(&mut self, handle: &Handle, depth: usize) -> Result<JsonValue> {
        if let Some(id) = self.registry.lookup(handle) {
            return Ok(format::reference(id));
        }
        if self.processing.contains(handle) {
            // On the stack but unregistered cannot happen; break the cycle anyway.
            return Ok(JsonValue::Null);
        }

        let id = self.registry.register(handle);
        self.processing.enter(handle);
        let result = self.encode_object(id, handle, depth);
        self.processing.leave(handle);
        result
    }

    fn encode_object(&mut self, id: u64, handle: &Handle, depth: usize) -> Result<JsonValue> {
        let object = handle
            .try_borrow()
            .map_err(|_| Error::Borrowed(handle.kind_name().to_string()))?;
        let child = depth + 1;

        let (tag, payload) = match &*object {
            Object::Array(items) => (Tag::Array, self.encode_list(items, child)?),
            Object::Map(map) => {
                let mut entries = Vec::with_capacity(map.len());
                for (i, (k, v)) in map.iter().enumerate() {
                    let key = self.encode_child(k, child, i)?;
                    let value = self.encode_child(v, child, i)?;
                    entries.push(JsonValue::Array(vec![key, value]));
                }
                (Tag::Map, JsonValue::Array(entries))
            }
            Object::Set(set) => {
                let mut members = Vec::with_capacity(set.len());
                for (i, member) in set.iter().enumerate() {
                    members.push(self.encode_child(member, child, i)?);
                }
                (Tag::Set, JsonValue::Array(members))
            }
            Object::Date(date) => {
                let text = match date {
                    Some(dt) => dt.to_rfc3339_opts(SecondsFormat::Millis, true),
                    None => INVALID_DATE.to_string(),
                };
                (Tag::Date, JsonValue::String(text))
            }
            Object::RegExp(re) => (
                Tag::RegExp,
                json!({ "source": re.source, "flags": re.flags }),
            ),
            Object::Url(url) => (Tag::Url, JsonValue::String(url.as_str().to_string())),
            Object::SearchParams(pairs) => {
                let query = url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(pairs.iter())
                    .finish();
                (Tag::UrlSearchParams, JsonValue::String(query))
            }
            Object::WeakMap => (Tag::WeakMap, JsonValue::Null),
            Object::WeakSet => (Tag::WeakSet, JsonValue::Null),
            Object::Function(f) => (Tag::Function, JsonValue::String(f.source.clone())),
            Object::TypedArray(array) => (Tag::TypedArray(array.kind), encode_typed_array(array)),
            Object::Error(e) => (
                Tag::Error,
                json!({ "name": e.name, "message": e.message, "stack": e.stack }),
            ),
            Object::File(file) => (Tag::File, self.encode_file(file)?),
            Object::FileList(files) => (Tag::FileList, self.encode_list(files, child)?),
            Object::FormData(form) => {
                let mut entries = Vec::with_capacity(form.entries.len());
                for (name, value) in &form.entries {
                    let value = self.encode_child(value, child, name)?;
                    entries.push(json!([name, value]));
                }
                (Tag::FormData, JsonValue::Array(entries))
            }
            Object::Element(el) => {
                let attributes: JsonMap<String, JsonValue> = el
                    .attributes
                    .iter()
                    .map(|(k, v)| (k.clone(), JsonValue::String(v.clone())))
                    .collect();
                let payload = json!({
                    "tagName": el.tag_name,
                    "attributes": attributes,
                    "innerHTML": el.inner_html,
                });
                (Tag::Element, payload)
            }
            Object::Text(text) => (Tag::Text, JsonValue::String(text.clone())),
            Object::Comment(text) => (Tag::Comment, JsonValue::String(text.clone())),
            Object::NodeList(nodes) => (Tag::NodeList, self.encode_list(nodes, child)?),
            Object::Instance(instance) => {
                let mut properties = JsonMap::with_capacity(instance.properties.len());
                for (key, value) in &instance.properties {
                    properties.insert(key.clone(), self.encode_child(value, child, key)?);
                }
                let payload = json!({
                    "className": instance.class.name(),
                    "properties": properties,
                });
                (Tag::Class, payload)
            }
            Object::Plain(plain) => {
                let mut result = JsonMap::with_capacity(plain.properties.len());
                for (key, value) in &plain.properties {
                    result.insert(key.clone(), self.encode_child(value, child, key)?);
                }
                if !plain.symbols.is_empty() {
                    let mut symbols = JsonMap::with_capacity(plain.symbols.len());
                    for (symbol, value) in &plain.symbols {
                        let key = symbol.description().unwrap_or(UNNAMED_SYMBOL);
                        symbols.insert(key.to_string(), self.encode_child(value, child, key)?);
                    }
                    result.insert(SYMBOLS_KEY.to_string(), JsonValue::Object(symbols));
                }
                (Tag::Object, JsonValue::Object(result))
            }
        };

        Ok(format::tuple(Some(id), tag, payload))
    }

    fn encode_list(&mut self, items: &[Value], depth: usize) -> Result<JsonValue> {
        let mut out = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            out.push(self.encode_child(item, depth, i)?);
        }
        Ok(JsonValue::Array(out))
    }

    /// Encodes a child, absorbing its failure in lenient mode.
    fn encode_child(&mut self, value: &Value, depth: usize, slot: impl Display) -> Result<JsonValue> {
        match self.encode(value, depth) {
            Err(err) if !self.options.strict => {
                warn!(%slot, error = %err, "failed to encode value, writing null");
                Ok(JsonValue::Null)
            }
            other => other,
        }
    }

    fn encode_file(&self, file: &File) -> Result<JsonValue> {
        let data = match &file.source {
            FileSource::Bytes(bytes) => Some(bytes.clone()),
            FileSource::Path(path) => match std::fs::read(path) {
                Ok(bytes) => Some(bytes),
                Err(err) if self.options.strict => return Err(err.into()),
                Err(err) => {
                    warn!(name = %file.name, path = %path.display(), error = %err, "could not read file content");
                    None
                }
            },
        };
        Ok(json!({
            "name": file.name,
            "type": file.mime_type,
            "size": data.as_ref().map_or(0, Vec::len),
            "lastModified": file.last_modified,
            "data": data.map(|bytes| format::bytes_to_base64(&bytes)),
        }))
    }
}

fn encode_number(n: f64) -> JsonValue {
    if n.is_nan() {
        format::tuple(None, Tag::NaN, JsonValue::Null)
    } else if n.is_infinite() {
        let tag = if n > 0.0 { Tag::Infinity } else { Tag::NegInfinity };
        format::tuple(None, tag, JsonValue::Null)
    } else if n.fract() == 0.0 && n.abs() < MAX_SAFE_INTEGER {
        JsonValue::from(n as i64)
    } else {
        serde_json::Number::from_f64(n).map_or(JsonValue::Null, JsonValue::Number)
    }
}

fn encode_typed_array(array: &TypedArray) -> JsonValue {
    let buffer = format::bytes_to_base64(&array.bytes);
    if array.kind == TypedArrayKind::ArrayBuffer {
        return JsonValue::String(buffer);
    }
    json!({
        "buffer": buffer,
        "byteOffset": 0,
        "byteLength": array.bytes.len(),
        "length": array.len(),
    })
}

/// Runs a replacer over the tagged tree with `JSON.stringify` semantics.
pub(crate) fn apply_replacer(replacer: &Replacer, root: JsonValue) -> JsonValue {
    match replacer {
        Replacer::Function(f) => replace_with(f.as_ref(), "", root).unwrap_or(JsonValue::Null),
        Replacer::Allow(keys) => retain_keys(keys, root),
    }
}

fn replace_with(
    f: &dyn Fn(&str, JsonValue) -> Option<JsonValue>,
    key: &str,
    value: JsonValue,
) -> Option<JsonValue> {
    let replaced = f(key, value)?;
    Some(match replaced {
        JsonValue::Array(items) => JsonValue::Array(
            items
                .into_iter()
                .enumerate()
                .map(|(i, item)| replace_with(f, &i.to_string(), item).unwrap_or(JsonValue::Null))
                .collect(),
        ),
        JsonValue::Object(map) => JsonValue::Object(
            map.into_iter()
                .filter_map(|(k, v)| replace_with(f, &k, v).map(|v| (k, v)))
                .collect(),
        ),
        other => other,
    })
}

fn retain_keys(keys: &[String], value: JsonValue) -> JsonValue {
    match value {
        JsonValue::Array(items) => {
            JsonValue::Array(items.into_iter().map(|v| retain_keys(keys, v)).collect())
        }
        JsonValue::Object(map) => JsonValue::Object(
            map.into_iter()
                .filter(|(k, _)| keys.iter().any(|allowed| allowed == k))
                .map(|(k, v)| (k, retain_keys(keys, v)))
                .collect(),
        ),
        other => other,
    }
}

/// Writes a tagged tree as JSON text, indented when `indent` is set.
pub(crate) fn write_json<W: io::Write>(writer: W, tagged: &JsonValue, indent: Option<&str>) -> Result<()> {
    match indent {
        None => serde_json::to_writer(writer, tagged)?,
        Some(indent) => {
            let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
            let mut ser = serde_json::Serializer::with_formatter(writer, formatter);
            tagged.serialize(&mut ser)?;
        }
    }
    Ok(())
}
