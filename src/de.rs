//! DSON decoding.
//!
//! The [`Decoder`] rebuilds a live value graph from a tagged tree in two
//! passes over it:
//!
//! 1. **Allocate.** Every tuple that carries an id gets its object created
//!    up front: leaf kinds (dates, regexps, URLs, buffers, ...) are built
//!    completely, containers are created empty. The result is the
//!    reconstruction table from id to object.
//! 2. **Populate.** The tree is walked again. Containers are filled with
//!    their decoded children, and each `ref` tuple is replaced by the table
//!    entry for its id. That entry may still be empty at that point, which
//!    is what lets `a.self = a` and forward references resolve to the right
//!    identity.
//!
//! ```rust
//! use dson::parse;
//!
//! let a = parse(r#"[0,"Object",{"self":[null,"ref",0]}]"#).unwrap();
//! assert!(a.get("self").unwrap().same_object(&a));
//! ```
//!
//! Input that is not a tuple is read as plain JSON, so every JSON document
//! decodes.

use crate::class::Instance;
use crate::format::{self, Tag, Tuple, INVALID_DATE, SYMBOLS_KEY};
use crate::object::{
    Element, ErrorObject, File, FileSource, FormData, Function, Handle, Object, PlainObject,
    RegExp, TypedArray, TypedArrayKind,
};
use crate::{Error, ParseOptions, Properties, Result, Symbol, Value, ValueMap, ValueSet};
use chrono::{DateTime, Utc};
use num_bigint::BigInt;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use serde_json::{Map as JsonMap, Value as JsonValue};
use tracing::{debug, error, warn};

/// Rebuilds one value graph from its tagged tree.
pub struct Decoder<'o> {
    options: &'o ParseOptions,
    table: FxHashMap<u64, Value>,
}

impl<'o> Decoder<'o> {
    pub fn new(options: &'o ParseOptions) -> Self {
        Decoder {
            options,
            table: FxHashMap::default(),
        }
    }

    /// Decodes a whole document.
    pub fn decode(mut self, tagged: &JsonValue) -> Result<Value> {
        check_nesting(tagged, self.options.max_nesting)?;
        self.allocate(tagged)?;
        let value = self.populate(tagged)?;
        debug!(objects = self.table.len(), "decoded value graph");
        Ok(value)
    }

    fn allocate(&mut self, json: &JsonValue) -> Result<()> {
        let tuple = match Tuple::recognize(json) {
            Some(tuple) => tuple,
            None => {
                match json {
                    JsonValue::Array(items) => {
                        for item in items {
                            self.allocate(item)?;
                        }
                    }
                    JsonValue::Object(map) => {
                        for value in map.values() {
                            self.allocate(value)?;
                        }
                    }
                    _ => {}
                }
                return Ok(());
            }
        };

        if let (Some(id), true) = (tuple.id, tuple.tag.has_identity()) {
            if self.table.contains_key(&id) {
                return Err(Error::malformed(tuple.tag.as_str(), format!("duplicate id {}", id)));
            }
            let placeholder = self.placeholder(&tuple)?;
            self.table.insert(id, placeholder);
        }

        for child in children(&tuple) {
            match entry_record(tuple.tag, child) {
                Some(record) => self.allocate_record(tuple.tag, record)?,
                None => self.allocate(child)?,
            }
        }
        Ok(())
    }

    /// Registers a list entry written as a bare record under its own id.
    fn allocate_record(&mut self, list: Tag, record: &JsonValue) -> Result<()> {
        if let Some(id) = record.get("id").and_then(JsonValue::as_u64) {
            if self.table.contains_key(&id) {
                return Err(Error::malformed(list.as_str(), format!("duplicate id {}", id)));
            }
            let entry = decode_record(list, record)?;
            self.table.insert(id, entry);
        }
        Ok(())
    }

    fn populate_record(&mut self, list: Tag, record: &JsonValue) -> Result<Value> {
        match record.get("id").and_then(JsonValue::as_u64) {
            Some(id) => self.table.get(&id).cloned().ok_or(Error::UnresolvedReference(id)),
            None => decode_record(list, record),
        }
    }

    fn populate_entries(&mut self, list: Tag, items: &[JsonValue]) -> Result<Vec<Value>> {
        items
            .iter()
            .map(|item| match entry_record(list, item) {
                Some(record) => self.populate_record(list, record),
                None => self.populate(item),
            })
            .collect()
    }

    /// Reads the `{name: value}` form of a form payload. File values may be
    /// inline records or `FileRef`/`FileListRef` markers naming an earlier id.
    fn populate_form_record(
        &mut self,
        map: &JsonMap<String, JsonValue>,
    ) -> Result<Vec<(String, Value)>> {
        let mut entries = Vec::with_capacity(map.len());
        for (name, value) in map {
            if is_skip(value) {
                continue;
            }
            let marker = opt_field_str(value, "_type");
            let target = value.get("_id").and_then(JsonValue::as_u64);
            match (marker, target) {
                (Some("FileRef"), Some(id)) => match self.table.get(&id) {
                    Some(file) => entries.push((name.clone(), file.clone())),
                    None => warn!(id, field = name.as_str(), "form file reference not found"),
                },
                (Some("FileListRef"), Some(id)) => {
                    let files = match self.table.get(&id).and_then(Value::as_handle) {
                        Some(handle) => match &*handle
                            .try_borrow()
                            .map_err(|_| Error::Borrowed(handle.kind_name().to_string()))?
                        {
                            Object::FileList(files) => files.clone(),
                            _ => Vec::new(),
                        },
                        None => {
                            warn!(id, field = name.as_str(), "form file list reference not found");
                            Vec::new()
                        }
                    };
                    entries.extend(files.into_iter().map(|file| (name.clone(), file)));
                }
                (Some("File"), _) => {
                    entries.push((name.clone(), Value::new_object(Object::File(decode_file(value)?))));
                }
                _ => entries.push((name.clone(), self.populate(value)?)),
            }
        }
        Ok(entries)
    }

    fn populate(&mut self, json: &JsonValue) -> Result<Value> {
        let tuple = match Tuple::recognize(json) {
            Some(tuple) => tuple,
            None => return self.populate_plain(json),
        };

        match tuple.tag {
            Tag::Ref => {
                let id = tuple
                    .payload
                    .as_u64()
                    .ok_or_else(|| Error::malformed("ref", "payload is not an id"))?;
                self.table
                    .get(&id)
                    .cloned()
                    .ok_or(Error::UnresolvedReference(id))
            }
            Tag::Skip | Tag::Undefined => Ok(Value::Undefined),
            Tag::NaN => Ok(Value::Number(f64::NAN)),
            Tag::Infinity => Ok(Value::Number(f64::INFINITY)),
            Tag::NegInfinity => Ok(Value::Number(f64::NEG_INFINITY)),
            Tag::BigInt => decode_bigint(tuple.payload).map(Value::BigInt),
            Tag::Symbol => Ok(Value::Symbol(decode_symbol(tuple.payload))),
            _ => {
                let value = match tuple.id {
                    Some(id) => self
                        .table
                        .get(&id)
                        .cloned()
                        .ok_or(Error::UnresolvedReference(id))?,
                    None => self.placeholder(&tuple)?,
                };
                if let Value::Object(handle) = &value {
                    self.fill(handle, &tuple)?;
                }
                Ok(value)
            }
        }
    }

    fn populate_plain(&mut self, json: &JsonValue) -> Result<Value> {
        Ok(match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(*b),
            JsonValue::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            JsonValue::String(s) => Value::String(s.clone()),
            JsonValue::Array(items) => Value::array(self.populate_list(items)?),
            JsonValue::Object(map) => Value::object(self.populate_properties(map)?),
        })
    }

    fn populate_list(&mut self, items: &[JsonValue]) -> Result<Vec<Value>> {
        items.iter().map(|item| self.populate(item)).collect()
    }

    /// Decodes string-keyed properties, dropping keys whose value was skipped.
    fn populate_properties(&mut self, map: &JsonMap<String, JsonValue>) -> Result<Properties> {
        let mut properties = Properties::with_capacity(map.len());
        for (key, value) in map {
            if is_skip(value) {
                continue;
            }
            properties.insert(key.clone(), self.populate(value)?);
        }
        Ok(properties)
    }

    /// Creates the object a tuple's id stands for: complete for leaf kinds,
    /// empty for containers.
    fn placeholder(&self, tuple: &Tuple<'_>) -> Result<Value> {
        let tag = tuple.tag;
        let payload = tuple.payload;
        let object = match tag {
            Tag::Object => Object::Plain(PlainObject::default()),
            Tag::Array => Object::Array(Vec::new()),
            Tag::Map => Object::Map(ValueMap::new()),
            Tag::Set => Object::Set(ValueSet::new()),
            Tag::FileList => Object::FileList(Vec::new()),
            Tag::NodeList => Object::NodeList(Vec::new()),
            Tag::FormData => Object::FormData(FormData::new()),
            Tag::Class => {
                let name = field_str(payload, "className", tag)?;
                match self.options.constructors.get(name) {
                    Some(class) => Object::Instance(Instance::construct(class)),
                    None => {
                        debug!(class = name, "no constructor registered, decoding as plain object");
                        Object::Plain(PlainObject::default())
                    }
                }
            }
            Tag::Date => Object::Date(decode_date(payload)?),
            Tag::RegExp => Object::RegExp(RegExp::new(
                field_str(payload, "source", tag)?,
                opt_field_str(payload, "flags").unwrap_or(""),
            )),
            Tag::Url => Object::Url(url::Url::parse(expect_str(payload, tag)?)?),
            Tag::UrlSearchParams => {
                let query = expect_str(payload, tag)?;
                let query = query.strip_prefix('?').unwrap_or(query);
                Object::SearchParams(url::form_urlencoded::parse(query.as_bytes()).into_owned().collect())
            }
            Tag::WeakMap => Object::WeakMap,
            Tag::WeakSet => Object::WeakSet,
            Tag::Function => {
                let source = expect_str(payload, tag)?;
                if !self.options.revive_functions {
                    warn!("function revival is disabled, decoding function as undefined");
                    return Ok(Value::Undefined);
                }
                Object::Function(Function::new(source))
            }
            Tag::TypedArray(kind) => Object::TypedArray(decode_typed_array(kind, payload)?),
            Tag::Error => {
                let mut err = ErrorObject::new(
                    opt_field_str(payload, "name").unwrap_or("Error"),
                    opt_field_str(payload, "message").unwrap_or(""),
                );
                err.stack = opt_field_str(payload, "stack").map(str::to_string);
                Object::Error(err)
            }
            Tag::File => Object::File(decode_file(payload)?),
            Tag::Element => Object::Element(decode_element(payload)?),
            Tag::Text => Object::Text(opt_str(payload).unwrap_or_default().to_string()),
            Tag::Comment => Object::Comment(opt_str(payload).unwrap_or_default().to_string()),
            Tag::BigInt
            | Tag::Symbol
            | Tag::NaN
            | Tag::Infinity
            | Tag::NegInfinity
            | Tag::Undefined
            | Tag::Skip
            | Tag::Ref => {
                return Err(Error::malformed(tag.as_str(), "tag does not carry an id"));
            }
        };
        Ok(Value::new_object(object))
    }

    /// Fills a container with its decoded children. Children are decoded
    /// before the container is borrowed, since they may refer back to it.
    fn fill(&mut self, handle: &Handle, tuple: &Tuple<'_>) -> Result<()> {
        let tag = tuple.tag;
        let payload = tuple.payload;
        match tag {
            Tag::Object => {
                let map = expect_object(payload, tag)?;
                let mut symbols = Vec::new();
                if let Some(bucket) = map.get(SYMBOLS_KEY) {
                    for (description, value) in expect_object(bucket, tag)? {
                        if is_skip(value) {
                            continue;
                        }
                        symbols.push((Symbol::new(description.clone()), self.populate(value)?));
                    }
                }
                let mut properties = Properties::with_capacity(map.len());
                for (key, value) in map {
                    if key == SYMBOLS_KEY || is_skip(value) {
                        continue;
                    }
                    properties.insert(key.clone(), self.populate(value)?);
                }
                if let Object::Plain(plain) = &mut *handle.borrow_mut() {
                    plain.properties = properties;
                    plain.symbols = symbols;
                }
            }
            Tag::Class => {
                let properties = match payload.get("properties") {
                    Some(JsonValue::Object(map)) => self.populate_properties(map)?,
                    Some(JsonValue::Null) | None => Properties::new(),
                    Some(_) => return Err(Error::malformed("Class", "properties is not an object")),
                };
                if let Some(target) = handle.borrow_mut().properties_mut() {
                    for (key, value) in properties {
                        target.insert(key, value);
                    }
                }
            }
            Tag::Array | Tag::FileList | Tag::NodeList => {
                let items = self.populate_entries(tag, expect_array(payload, tag)?)?;
                match &mut *handle.borrow_mut() {
                    Object::Array(slot) | Object::FileList(slot) | Object::NodeList(slot) => {
                        *slot = items;
                    }
                    _ => {}
                }
            }
            Tag::Set => {
                let members = self.populate_list(expect_array(payload, tag)?)?;
                if let Object::Set(set) = &mut *handle.borrow_mut() {
                    for member in members {
                        set.insert(member);
                    }
                }
            }
            Tag::Map => {
                let mut entries = Vec::new();
                for entry in expect_array(payload, tag)? {
                    let (key, value) = expect_pair(entry, tag)?;
                    entries.push((self.populate(key)?, self.populate(value)?));
                }
                if let Object::Map(map) = &mut *handle.borrow_mut() {
                    for (key, value) in entries {
                        map.insert(key, value);
                    }
                }
            }
            Tag::FormData => {
                let entries = match payload {
                    JsonValue::Object(map) => self.populate_form_record(map)?,
                    _ => {
                        let mut entries = Vec::new();
                        for entry in expect_array(payload, tag)? {
                            let (name, value) = expect_pair(entry, tag)?;
                            let name = expect_str(name, tag)?.to_string();
                            entries.push((name, self.populate(value)?));
                        }
                        entries
                    }
                };
                if let Object::FormData(form) = &mut *handle.borrow_mut() {
                    form.entries = entries;
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// Decodes a tagged tree, applying the strict/lenient policy of `options`.
pub(crate) fn decode_tagged(tagged: &JsonValue, options: &ParseOptions) -> Result<Value> {
    absorb(Decoder::new(options).decode(tagged), options)
}

/// Parses DSON text, applying the strict/lenient policy of `options`.
pub(crate) fn decode_str(text: &str, options: &ParseOptions) -> Result<Value> {
    if text.is_empty() {
        return Ok(Value::Null);
    }
    let result = read_json(text, options.max_nesting)
        .and_then(|tagged| Decoder::new(options).decode(&tagged));
    absorb(result, options)
}

/// Reads JSON text under `max_nesting` instead of serde_json's fixed cap:
/// every level of object depth costs two or three levels of JSON nesting,
/// so the fixed cap would cut documents below the encoder's depth limit.
fn read_json(text: &str, max_nesting: usize) -> Result<JsonValue> {
    check_text_nesting(text, max_nesting)?;
    let mut de = serde_json::Deserializer::from_str(text);
    de.disable_recursion_limit();
    let tagged = JsonValue::deserialize(&mut de)?;
    de.end()?;
    Ok(tagged)
}

/// Scans brackets outside string literals, so over-deep text is refused
/// before anything recursive sees it.
fn check_text_nesting(text: &str, limit: usize) -> Result<()> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for byte in text.bytes() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'[' | b'{' => {
                depth += 1;
                if depth > limit {
                    return Err(Error::NestingLimit(limit));
                }
            }
            b']' | b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    Ok(())
}

/// Same bound as [`check_text_nesting`] for an already built tree, walked
/// with an explicit stack.
fn check_nesting(json: &JsonValue, limit: usize) -> Result<()> {
    let mut stack = vec![(json, 0usize)];
    while let Some((json, depth)) = stack.pop() {
        let nested = matches!(json, JsonValue::Array(_) | JsonValue::Object(_));
        if nested && depth >= limit {
            return Err(Error::NestingLimit(limit));
        }
        match json {
            JsonValue::Array(items) => stack.extend(items.iter().map(|item| (item, depth + 1))),
            JsonValue::Object(map) => stack.extend(map.values().map(|value| (value, depth + 1))),
            _ => {}
        }
    }
    Ok(())
}

/// Parses DSON bytes, which must be UTF-8.
pub(crate) fn decode_slice(bytes: &[u8], options: &ParseOptions) -> Result<Value> {
    match std::str::from_utf8(bytes) {
        Ok(text) => decode_str(text, options),
        Err(err) => absorb(Err(Error::custom(err)), options),
    }
}

fn absorb(result: Result<Value>, options: &ParseOptions) -> Result<Value> {
    match result {
        Err(err) if !options.strict => {
            error!(error = %err, "failed to decode DSON, returning null");
            Ok(Value::Null)
        }
        other => other,
    }
}

/// The payload positions that hold tagged values, for a tuple's tag.
fn children<'a>(tuple: &Tuple<'a>) -> Vec<&'a JsonValue> {
    let payload = tuple.payload;
    match tuple.tag {
        Tag::Object => match payload.as_object() {
            Some(map) => map
                .iter()
                .flat_map(|(key, value)| match (key.as_str(), value) {
                    (SYMBOLS_KEY, JsonValue::Object(bucket)) => bucket.values().collect(),
                    _ => vec![value],
                })
                .collect(),
            None => Vec::new(),
        },
        Tag::Class => match payload.get("properties").and_then(JsonValue::as_object) {
            Some(map) => map.values().collect(),
            None => Vec::new(),
        },
        Tag::Array | Tag::Set | Tag::FileList | Tag::NodeList => {
            payload.as_array().map(|items| items.iter().collect()).unwrap_or_default()
        }
        Tag::Map => pairs(payload).flat_map(|(k, v)| [k, v]).collect(),
        Tag::FormData => match payload.as_object() {
            Some(map) => map.values().collect(),
            None => pairs(payload).map(|(_, v)| v).collect(),
        },
        _ => Vec::new(),
    }
}

fn pairs(payload: &JsonValue) -> impl Iterator<Item = (&JsonValue, &JsonValue)> {
    payload
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|entry| match entry.as_array().map(Vec::as_slice) {
            Some([k, v]) => Some((k, v)),
            _ => None,
        })
}

/// A file or node list entry written as a bare `{id, ...}` record rather
/// than a tuple.
fn entry_record(list: Tag, json: &JsonValue) -> Option<&JsonValue> {
    match list {
        Tag::FileList | Tag::NodeList if json.is_object() => Some(json),
        _ => None,
    }
}

/// Builds the object a list entry record describes: a file for file lists,
/// an element, text or comment node for node lists.
fn decode_record(list: Tag, record: &JsonValue) -> Result<Value> {
    let data = || opt_field_str(record, "data").unwrap_or_default().to_string();
    let object = match list {
        Tag::FileList => Object::File(decode_file(record)?),
        _ => match opt_field_str(record, "type") {
            Some("Element") => Object::Element(decode_element(record)?),
            Some("Text") => Object::Text(data()),
            _ => Object::Comment(data()),
        },
    };
    Ok(Value::new_object(object))
}

fn is_skip(json: &JsonValue) -> bool {
    Tuple::recognize(json).is_some_and(|t| t.tag == Tag::Skip)
}

fn decode_bigint(payload: &JsonValue) -> Result<BigInt> {
    let text = match payload {
        JsonValue::String(s) => s.trim_end_matches('n').to_string(),
        JsonValue::Number(n) => n.to_string(),
        _ => return Err(Error::malformed("BigInt", "payload is not a string")),
    };
    text.parse()
        .map_err(|_| Error::malformed("BigInt", format!("invalid integer {:?}", text)))
}

fn decode_symbol(payload: &JsonValue) -> Symbol {
    match payload.as_str() {
        Some("__undefined__") | None => Symbol::anonymous(),
        Some(description) => Symbol::new(description),
    }
}

fn decode_date(payload: &JsonValue) -> Result<Option<DateTime<Utc>>> {
    match payload {
        JsonValue::String(s) if s == INVALID_DATE => Ok(None),
        JsonValue::String(s) => Ok(DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|date| date.with_timezone(&Utc))),
        JsonValue::Number(n) => Ok(n.as_i64().and_then(DateTime::<Utc>::from_timestamp_millis)),
        _ => Err(Error::malformed("Date", "payload is not a string")),
    }
}

fn decode_typed_array(kind: TypedArrayKind, payload: &JsonValue) -> Result<TypedArray> {
    let tag = kind.as_str();
    let (buffer, record) = match payload {
        JsonValue::String(s) => (s.as_str(), None),
        JsonValue::Object(_) => (field_str(payload, "buffer", Tag::TypedArray(kind))?, Some(payload)),
        _ => return Err(Error::malformed(tag, "payload is neither base64 nor a buffer record")),
    };
    let bytes = format::base64_to_bytes(buffer)?;

    let Some(record) = record else {
        return Ok(TypedArray::new(kind, bytes));
    };
    let offset = opt_usize(record, "byteOffset").unwrap_or(0);
    let byte_length = opt_usize(record, "byteLength")
        .or_else(|| opt_usize(record, "length").map(|n| n * kind.element_size()))
        .unwrap_or_else(|| bytes.len().saturating_sub(offset));
    let end = offset
        .checked_add(byte_length)
        .filter(|end| *end <= bytes.len())
        .ok_or_else(|| Error::malformed(tag, "view exceeds its buffer"))?;
    Ok(TypedArray::new(kind, bytes[offset..end].to_vec()))
}

fn decode_file(payload: &JsonValue) -> Result<File> {
    let bytes = match payload.get("data") {
        Some(JsonValue::String(data)) => format::base64_to_bytes(data)?,
        _ => Vec::new(),
    };
    Ok(File {
        name: opt_field_str(payload, "name").unwrap_or("").to_string(),
        mime_type: opt_field_str(payload, "type").unwrap_or("").to_string(),
        last_modified: payload.get("lastModified").and_then(JsonValue::as_i64).unwrap_or(0),
        source: FileSource::Bytes(bytes),
    })
}

fn decode_element(payload: &JsonValue) -> Result<Element> {
    let mut element = Element::new(field_str(payload, "tagName", Tag::Element)?)
        .with_inner_html(opt_field_str(payload, "innerHTML").unwrap_or(""));
    if let Some(attributes) = payload.get("attributes").and_then(JsonValue::as_object) {
        for (name, value) in attributes {
            let value = expect_str(value, Tag::Element)?;
            element.attributes.insert(name.clone(), value.to_string());
        }
    }
    Ok(element)
}

fn expect_str(json: &JsonValue, tag: Tag) -> Result<&str> {
    json.as_str()
        .ok_or_else(|| Error::malformed(tag.as_str(), "expected a string"))
}

fn opt_str(json: &JsonValue) -> Option<&str> {
    json.as_str()
}

fn expect_array(json: &JsonValue, tag: Tag) -> Result<&Vec<JsonValue>> {
    json.as_array()
        .ok_or_else(|| Error::malformed(tag.as_str(), "expected an array"))
}

fn expect_object(json: &JsonValue, tag: Tag) -> Result<&JsonMap<String, JsonValue>> {
    json.as_object()
        .ok_or_else(|| Error::malformed(tag.as_str(), "expected an object"))
}

fn expect_pair(json: &JsonValue, tag: Tag) -> Result<(&JsonValue, &JsonValue)> {
    match json.as_array().map(Vec::as_slice) {
        Some([first, second]) => Ok((first, second)),
        _ => Err(Error::malformed(tag.as_str(), "expected a [key, value] pair")),
    }
}

fn field_str<'a>(json: &'a JsonValue, key: &str, tag: Tag) -> Result<&'a str> {
    opt_field_str(json, key)
        .ok_or_else(|| Error::malformed(tag.as_str(), format!("missing string field {:?}", key)))
}

fn opt_field_str<'a>(json: &'a JsonValue, key: &str) -> Option<&'a str> {
    json.get(key).and_then(JsonValue::as_str)
}

fn opt_usize(json: &JsonValue, key: &str) -> Option<usize> {
    json.get(key)
        .and_then(JsonValue::as_u64)
        .and_then(|n| usize::try_from(n).ok())
}
