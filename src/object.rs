//! Heap objects and the handles that share them.
//!
//! Every composite value in a DSON graph is an [`Object`] owned by a
//! [`Handle`]. The set of object kinds is closed: it is exactly the set of
//! types the wire format can tag, so the encoder, decoder, cloner and
//! equality engine can all match on it exhaustively.
//!
//! A handle's address is its identity. Two handles are `==` only if they
//! point at the same object.

use crate::class::Instance;
use crate::map::{Properties, ValueMap, ValueSet};
use crate::value::{Symbol, Value};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use std::cell::{BorrowError, Ref, RefCell, RefMut};
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;

/// A shared, identity-bearing reference to a heap [`Object`].
///
/// # Examples
///
/// ```rust
/// use dson::{Handle, Object};
///
/// let h = Handle::new(Object::Array(vec![]));
/// let alias = h.clone();
/// alias.push(1.into());
/// assert_eq!(h.len(), Some(1));
/// assert!(h.ptr_eq(&alias));
/// ```
#[derive(Clone)]
pub struct Handle(Rc<RefCell<Object>>);

impl Handle {
    pub fn new(object: Object) -> Self {
        Handle(Rc::new(RefCell::new(object)))
    }

    /// Immutably borrows the object.
    ///
    /// # Panics
    ///
    /// Panics if the object is currently mutably borrowed.
    pub fn borrow(&self) -> Ref<'_, Object> {
        self.0.borrow()
    }

    /// Mutably borrows the object.
    ///
    /// # Panics
    ///
    /// Panics if the object is currently borrowed.
    pub fn borrow_mut(&self) -> RefMut<'_, Object> {
        self.0.borrow_mut()
    }

    pub fn try_borrow(&self) -> Result<Ref<'_, Object>, BorrowError> {
        self.0.try_borrow()
    }

    /// Replaces the object behind this handle, keeping its identity.
    pub fn replace(&self, object: Object) -> Object {
        self.0.replace(object)
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Handle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    /// Name of the object's type as it appears in the wire format.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self.0.try_borrow() {
            Ok(object) => object.kind_name(),
            Err(_) => "Object",
        }
    }

    /// Reads a property of a plain object or class instance.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.borrow().properties().and_then(|p| p.get(key).cloned())
    }

    /// Writes a property of a plain object or class instance.
    pub fn set(&self, key: &str, value: Value) -> bool {
        match self.borrow_mut().properties_mut() {
            Some(props) => {
                props.insert(key.to_string(), value);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn index(&self, i: usize) -> Option<Value> {
        match &*self.borrow() {
            Object::Array(items) | Object::FileList(items) | Object::NodeList(items) => {
                items.get(i).cloned()
            }
            _ => None,
        }
    }

    pub fn push(&self, value: Value) -> bool {
        match &mut *self.borrow_mut() {
            Object::Array(items) => {
                items.push(value);
                true
            }
            _ => false,
        }
    }

    /// Number of elements, entries, members or properties, for the kinds that
    /// have one.
    #[must_use]
    pub fn len(&self) -> Option<usize> {
        match &*self.borrow() {
            Object::Array(items) | Object::FileList(items) | Object::NodeList(items) => {
                Some(items.len())
            }
            Object::Map(m) => Some(m.len()),
            Object::Set(s) => Some(s.len()),
            Object::Plain(p) => Some(p.properties.len()),
            Object::Instance(i) => Some(i.properties.len()),
            Object::TypedArray(t) => Some(t.len()),
            Object::FormData(f) => Some(f.entries.len()),
            _ => None,
        }
    }
}

impl PartialEq for Handle {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Handle {
    // Objects can be cyclic, so only the kind and identity are printed.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:#x}", self.kind_name(), self.addr())
    }
}

/// The closed set of heap object kinds.
#[derive(Debug, Clone)]
pub enum Object {
    Plain(PlainObject),
    Array(Vec<Value>),
    Map(ValueMap),
    Set(ValueSet),
    /// `None` is an invalid date.
    Date(Option<DateTime<Utc>>),
    RegExp(RegExp),
    Url(url::Url),
    SearchParams(Vec<(String, String)>),
    WeakMap,
    WeakSet,
    Function(Function),
    TypedArray(TypedArray),
    Error(ErrorObject),
    File(File),
    FileList(Vec<Value>),
    FormData(FormData),
    Element(Element),
    Text(String),
    Comment(String),
    NodeList(Vec<Value>),
    Instance(Instance),
}

impl Object {
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Object::Plain(_) => "Object",
            Object::Array(_) => "Array",
            Object::Map(_) => "Map",
            Object::Set(_) => "Set",
            Object::Date(_) => "Date",
            Object::RegExp(_) => "RegExp",
            Object::Url(_) => "URL",
            Object::SearchParams(_) => "URLSearchParams",
            Object::WeakMap => "WeakMap",
            Object::WeakSet => "WeakSet",
            Object::Function(_) => "Function",
            Object::TypedArray(t) => t.kind.as_str(),
            Object::Error(_) => "Error",
            Object::File(_) => "File",
            Object::FileList(_) => "FileList",
            Object::FormData(_) => "FormData",
            Object::Element(_) => "Element",
            Object::Text(_) => "Text",
            Object::Comment(_) => "Comment",
            Object::NodeList(_) => "NodeList",
            Object::Instance(_) => "Class",
        }
    }

    /// String-keyed properties of plain objects and class instances.
    #[must_use]
    pub fn properties(&self) -> Option<&Properties> {
        match self {
            Object::Plain(p) => Some(&p.properties),
            Object::Instance(i) => Some(&i.properties),
            _ => None,
        }
    }

    pub fn properties_mut(&mut self) -> Option<&mut Properties> {
        match self {
            Object::Plain(p) => Some(&mut p.properties),
            Object::Instance(i) => Some(&mut i.properties),
            _ => None,
        }
    }
}

/// A plain object: string-keyed properties plus symbol-keyed properties,
/// which ordinary enumeration does not see.
#[derive(Debug, Clone, Default)]
pub struct PlainObject {
    pub properties: Properties,
    pub symbols: Vec<(Symbol, Value)>,
}

impl From<Properties> for PlainObject {
    fn from(properties: Properties) -> Self {
        PlainObject {
            properties,
            symbols: Vec::new(),
        }
    }
}

impl PlainObject {
    /// Sets a symbol-keyed property, replacing an existing one for the same symbol.
    pub fn set_symbol(&mut self, key: Symbol, value: Value) {
        match self.symbols.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.symbols.push((key, value)),
        }
    }

    #[must_use]
    pub fn get_symbol(&self, key: &Symbol) -> Option<&Value> {
        self.symbols.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegExp {
    pub source: String,
    pub flags: String,
}

impl RegExp {
    pub fn new(source: impl Into<String>, flags: impl Into<String>) -> Self {
        RegExp {
            source: source.into(),
            flags: flags.into(),
        }
    }
}

/// A function, carried as its source text. The crate never evaluates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub source: String,
}

impl Function {
    pub fn new(source: impl Into<String>) -> Self {
        Function {
            source: source.into(),
        }
    }
}

/// The view type of a binary buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypedArrayKind {
    Int8,
    Uint8,
    Uint8Clamped,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Float32,
    Float64,
    BigInt64,
    BigUint64,
    DataView,
    ArrayBuffer,
}

impl TypedArrayKind {
    pub const ALL: [TypedArrayKind; 13] = [
        TypedArrayKind::Int8,
        TypedArrayKind::Uint8,
        TypedArrayKind::Uint8Clamped,
        TypedArrayKind::Int16,
        TypedArrayKind::Uint16,
        TypedArrayKind::Int32,
        TypedArrayKind::Uint32,
        TypedArrayKind::Float32,
        TypedArrayKind::Float64,
        TypedArrayKind::BigInt64,
        TypedArrayKind::BigUint64,
        TypedArrayKind::DataView,
        TypedArrayKind::ArrayBuffer,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            TypedArrayKind::Int8 => "Int8Array",
            TypedArrayKind::Uint8 => "Uint8Array",
            TypedArrayKind::Uint8Clamped => "Uint8ClampedArray",
            TypedArrayKind::Int16 => "Int16Array",
            TypedArrayKind::Uint16 => "Uint16Array",
            TypedArrayKind::Int32 => "Int32Array",
            TypedArrayKind::Uint32 => "Uint32Array",
            TypedArrayKind::Float32 => "Float32Array",
            TypedArrayKind::Float64 => "Float64Array",
            TypedArrayKind::BigInt64 => "BigInt64Array",
            TypedArrayKind::BigUint64 => "BigUint64Array",
            TypedArrayKind::DataView => "DataView",
            TypedArrayKind::ArrayBuffer => "ArrayBuffer",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }

    /// Bytes per element; 1 for the untyped views.
    #[must_use]
    pub const fn element_size(&self) -> usize {
        match self {
            TypedArrayKind::Int16 | TypedArrayKind::Uint16 => 2,
            TypedArrayKind::Int32 | TypedArrayKind::Uint32 | TypedArrayKind::Float32 => 4,
            TypedArrayKind::Float64 | TypedArrayKind::BigInt64 | TypedArrayKind::BigUint64 => 8,
            _ => 1,
        }
    }
}

/// A typed array, `DataView` or `ArrayBuffer`, owning its bytes
/// (little-endian element layout).
///
/// # Examples
///
/// ```rust
/// use dson::{TypedArray, TypedArrayKind};
///
/// let floats = TypedArray::from_f64(&[1.5, -2.0]);
/// assert_eq!(floats.kind, TypedArrayKind::Float64);
/// assert_eq!(floats.len(), 2);
/// assert_eq!(floats.bytes.len(), 16);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedArray {
    pub kind: TypedArrayKind,
    pub bytes: Vec<u8>,
}

impl TypedArray {
    pub fn new(kind: TypedArrayKind, bytes: Vec<u8>) -> Self {
        TypedArray { kind, bytes }
    }

    pub fn from_u8(values: &[u8]) -> Self {
        TypedArray::new(TypedArrayKind::Uint8, values.to_vec())
    }

    pub fn from_i32(values: &[i32]) -> Self {
        let bytes = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        TypedArray::new(TypedArrayKind::Int32, bytes)
    }

    pub fn from_f32(values: &[f32]) -> Self {
        let bytes = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        TypedArray::new(TypedArrayKind::Float32, bytes)
    }

    pub fn from_f64(values: &[f64]) -> Self {
        let bytes = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        TypedArray::new(TypedArrayKind::Float64, bytes)
    }

    /// Number of elements (bytes for the untyped views).
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len() / self.kind.element_size()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorObject {
    pub name: String,
    pub message: String,
    pub stack: Option<String>,
}

impl ErrorObject {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        ErrorObject {
            name: name.into(),
            message: message.into(),
            stack: None,
        }
    }

    #[must_use]
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }
}

/// Where a file's content comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSource {
    Bytes(Vec<u8>),
    /// Read from disk when the file is encoded.
    Path(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    pub name: String,
    pub mime_type: String,
    /// Milliseconds since the Unix epoch.
    pub last_modified: i64,
    pub source: FileSource,
}

impl File {
    pub fn from_bytes(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        File {
            name: name.into(),
            mime_type: mime_type.into(),
            last_modified: 0,
            source: FileSource::Bytes(bytes),
        }
    }

    pub fn from_path(name: impl Into<String>, mime_type: impl Into<String>, path: PathBuf) -> Self {
        File {
            name: name.into(),
            mime_type: mime_type.into(),
            last_modified: 0,
            source: FileSource::Path(path),
        }
    }

    #[must_use]
    pub fn with_last_modified(mut self, millis: i64) -> Self {
        self.last_modified = millis;
        self
    }
}

/// Form entries in submission order. Values are strings or `File` objects.
#[derive(Debug, Clone, Default)]
pub struct FormData {
    pub entries: Vec<(String, Value)>,
}

impl FormData {
    pub fn new() -> Self {
        FormData::default()
    }

    pub fn append(&mut self, name: impl Into<String>, value: Value) {
        self.entries.push((name.into(), value));
    }

    /// All values submitted under `name`.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.entries.iter().filter(move |(k, _)| k == name).map(|(_, v)| v)
    }
}

/// A detached snapshot of a DOM element.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    pub tag_name: String,
    pub attributes: IndexMap<String, String>,
    pub inner_html: String,
}

impl Element {
    pub fn new(tag_name: impl Into<String>) -> Self {
        Element {
            tag_name: tag_name.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_inner_html(mut self, html: impl Into<String>) -> Self {
        self.inner_html = html.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_array_names_round_trip() {
        for kind in TypedArrayKind::ALL {
            assert_eq!(TypedArrayKind::from_name(kind.as_str()), Some(kind));
        }
        assert_eq!(TypedArrayKind::from_name("Array"), None);
    }

    #[test]
    fn test_typed_array_len() {
        let ints = TypedArray::from_i32(&[1, 2, 3]);
        assert_eq!(ints.len(), 3);
        assert_eq!(&ints.bytes[..4], &1i32.to_le_bytes());
    }

    #[test]
    fn test_handle_debug_does_not_recurse() {
        let h = Handle::new(Object::Array(vec![]));
        h.push(Value::Object(h.clone()));
        let printed = format!("{:?}", h);
        assert!(printed.starts_with("Array@"));
    }

    #[test]
    fn test_symbol_properties() {
        let mut obj = PlainObject::default();
        let key = Symbol::new("tag");
        obj.set_symbol(key.clone(), Value::from(1));
        obj.set_symbol(key.clone(), Value::from(2));
        assert_eq!(obj.symbols.len(), 1);
        assert_eq!(obj.get_symbol(&key), Some(&Value::from(2)));
    }

    #[test]
    fn test_form_data_duplicates() {
        let mut form = FormData::new();
        form.append("tag", Value::from("a"));
        form.append("tag", Value::from("b"));
        assert_eq!(form.get_all("tag").count(), 2);
    }
}
