//! Named classes, their instances, and the constructor map used on decode.
//!
//! A [`Class`] plays the role of a constructor: it has a name, an identity,
//! and an optional initializer that sets up default properties. Instances
//! remember their class, so two instances of different classes are never
//! deep-equal even when their properties match.
//!
//! When decoding a `Class` tuple, the decoder looks the class name up in the
//! caller's [`ConstructorMap`]. If it is absent the instance degrades to a
//! plain object with the same properties.
//!
//! ```rust
//! use dson::{parse_with_options, stringify, Class, ConstructorMap, ParseOptions, Properties, Value};
//!
//! let point = Class::new("Point");
//! let mut props = Properties::new();
//! props.insert("x".to_string(), Value::from(1));
//! let p = Value::instance(&point, props);
//!
//! let text = stringify(&p).unwrap();
//! let options = ParseOptions::new().with_constructors(ConstructorMap::new().with(point.clone()));
//! let back = parse_with_options(&text, &options).unwrap();
//! assert_eq!(back.as_handle().and_then(|h| h.class()).map(|c| c.ptr_eq(&point)), Some(true));
//! ```

use crate::map::Properties;
use crate::object::{Handle, Object};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

type Initializer = dyn Fn(&mut Properties);

struct ClassInner {
    name: String,
    init: Option<Box<Initializer>>,
}

/// A named constructor. Cloning a `Class` shares it; identity is preserved.
#[derive(Clone)]
pub struct Class(Rc<ClassInner>);

impl Class {
    pub fn new(name: impl Into<String>) -> Self {
        Class(Rc::new(ClassInner {
            name: name.into(),
            init: None,
        }))
    }

    /// Creates a class whose constructor runs `init` on every new instance.
    pub fn with_initializer<F>(name: impl Into<String>, init: F) -> Self
    where
        F: Fn(&mut Properties) + 'static,
    {
        Class(Rc::new(ClassInner {
            name: name.into(),
            init: Some(Box::new(init)),
        }))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Class) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "class {}", self.0.name)
    }
}

/// An instance of a [`Class`] with its own properties.
#[derive(Debug, Clone)]
pub struct Instance {
    pub class: Class,
    pub properties: Properties,
}

impl Instance {
    /// Runs the class constructor: an empty instance plus whatever the
    /// initializer sets.
    pub fn construct(class: &Class) -> Self {
        let mut properties = Properties::new();
        if let Some(init) = &class.0.init {
            init(&mut properties);
        }
        Instance {
            class: class.clone(),
            properties,
        }
    }
}

impl Handle {
    /// The class of a class instance.
    #[must_use]
    pub fn class(&self) -> Option<Class> {
        match &*self.borrow() {
            Object::Instance(i) => Some(i.class.clone()),
            _ => None,
        }
    }
}

/// Class name to constructor lookup, consulted when decoding `Class` tuples.
#[derive(Clone, Default)]
pub struct ConstructorMap(HashMap<String, Class>);

impl ConstructorMap {
    #[must_use]
    pub fn new() -> Self {
        ConstructorMap(HashMap::new())
    }

    /// Registers a class under its own name, replacing any previous entry.
    pub fn register(&mut self, class: Class) {
        self.0.insert(class.name().to_string(), class);
    }

    #[must_use]
    pub fn with(mut self, class: Class) -> Self {
        self.register(class);
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Class> {
        self.0.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for ConstructorMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.keys()).finish()
    }
}

impl FromIterator<Class> for ConstructorMap {
    fn from_iter<T: IntoIterator<Item = Class>>(iter: T) -> Self {
        let mut map = ConstructorMap::new();
        for class in iter {
            map.register(class);
        }
        map
    }
}
