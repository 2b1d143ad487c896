//! Configuration options for encoding and decoding.
//!
//! - [`StringifyOptions`]: depth limit, strictness, indentation, replacer
//!   and the environment values to skip.
//! - [`ParseOptions`]: class constructors, function revival and strictness.
//! - [`Replacer`]: a `JSON.stringify`-style replacer applied to the tagged tree.
//!
//! ## Examples
//!
//! ```rust
//! use dson::{dson, stringify_with_options, StringifyOptions};
//!
//! let value = dson!({ "a": [1, 2] });
//!
//! let options = StringifyOptions::pretty();
//! let text = stringify_with_options(&value, &options).unwrap();
//! assert!(text.contains("\n  "));
//!
//! let options = StringifyOptions::new().with_depth_limit(0);
//! let text = stringify_with_options(&value, &options).unwrap();
//! assert_eq!(text, r#"[0,"Object",{"a":null}]"#);
//! ```

use crate::class::{Class, ConstructorMap};
use crate::object::Handle;
use serde_json::Value as JsonValue;
use std::fmt;
use std::rc::Rc;

/// Default maximum nesting depth before values are truncated to `null`.
pub const DEFAULT_DEPTH_LIMIT: usize = 100;

/// Default bound on JSON nesting accepted by the decoder. Every object level
/// costs two or three levels of JSON nesting, so this sits well above what
/// the encoder writes at [`DEFAULT_DEPTH_LIMIT`].
pub const DEFAULT_MAX_NESTING: usize = 512;

/// Longest indentation `JSON.stringify` honors.
const MAX_INDENT: usize = 10;

type ReplacerFn = dyn Fn(&str, JsonValue) -> Option<JsonValue>;

/// Filters or rewrites the tagged tree before it is written as text.
///
/// The replacer sees the *tagged* form: tuples appear as three-element
/// arrays and their payloads as plain JSON.
#[derive(Clone)]
pub enum Replacer {
    /// Called for every key/value pair, starting with the root under the
    /// key `""`. Returning `None` omits an object property, or writes `null`
    /// in an array slot.
    Function(Rc<ReplacerFn>),
    /// Keeps only the listed object keys.
    Allow(Vec<String>),
}

impl Replacer {
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&str, JsonValue) -> Option<JsonValue> + 'static,
    {
        Replacer::Function(Rc::new(f))
    }

    pub fn allow<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Replacer::Allow(keys.into_iter().map(Into::into).collect())
    }
}

impl fmt::Debug for Replacer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Replacer::Function(_) => f.write_str("Replacer::Function"),
            Replacer::Allow(keys) => f.debug_tuple("Replacer::Allow").field(keys).finish(),
        }
    }
}

/// Configuration for [`stringify_with_options`](crate::stringify_with_options).
///
/// # Examples
///
/// ```rust
/// use dson::StringifyOptions;
///
/// let options = StringifyOptions::new()
///     .with_depth_limit(10)
///     .with_indent(4)
///     .strict(true);
/// assert_eq!(options.depth_limit, 10);
/// assert_eq!(options.indent.as_deref(), Some("    "));
/// ```
#[derive(Clone, Debug)]
pub struct StringifyOptions {
    pub depth_limit: usize,
    /// Return per-value failures as errors instead of writing `null`.
    pub strict: bool,
    pub indent: Option<String>,
    pub replacer: Option<Replacer>,
    /// Environment objects that are written as `Skip` markers.
    pub globals: Vec<Handle>,
}

impl Default for StringifyOptions {
    fn default() -> Self {
        StringifyOptions {
            depth_limit: DEFAULT_DEPTH_LIMIT,
            strict: false,
            indent: None,
            replacer: None,
            globals: Vec::new(),
        }
    }
}

impl StringifyOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Options for two-space indented output.
    #[must_use]
    pub fn pretty() -> Self {
        Self::new().with_indent(2)
    }

    #[must_use]
    pub fn with_depth_limit(mut self, depth_limit: usize) -> Self {
        self.depth_limit = depth_limit;
        self
    }

    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Indents with `spaces` spaces (at most 10). Zero means compact.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dson::StringifyOptions;
    ///
    /// assert_eq!(StringifyOptions::new().with_indent(40).indent.map(|s| s.len()), Some(10));
    /// assert_eq!(StringifyOptions::new().with_indent(0).indent, None);
    /// ```
    #[must_use]
    pub fn with_indent(self, spaces: usize) -> Self {
        let indent = " ".repeat(spaces.min(MAX_INDENT));
        self.with_indent_str(&indent)
    }

    /// Indents with the first 10 characters of `indent`.
    #[must_use]
    pub fn with_indent_str(mut self, indent: &str) -> Self {
        let indent: String = indent.chars().take(MAX_INDENT).collect();
        self.indent = if indent.is_empty() { None } else { Some(indent) };
        self
    }

    #[must_use]
    pub fn with_replacer(mut self, replacer: Replacer) -> Self {
        self.replacer = Some(replacer);
        self
    }

    /// Marks `global` as part of the environment rather than data.
    #[must_use]
    pub fn with_global(mut self, global: Handle) -> Self {
        self.globals.push(global);
        self
    }

    pub(crate) fn is_global(&self, handle: &Handle) -> bool {
        self.globals.iter().any(|g| g.ptr_eq(handle))
    }
}

/// Configuration for [`parse_with_options`](crate::parse_with_options).
///
/// # Examples
///
/// ```rust
/// use dson::{Class, ParseOptions};
///
/// let options = ParseOptions::new()
///     .with_constructor(Class::new("Point"))
///     .revive_functions(true);
/// assert!(options.constructors.get("Point").is_some());
/// assert!(!options.strict);
/// ```
#[derive(Clone, Debug)]
pub struct ParseOptions {
    pub constructors: ConstructorMap,
    /// Rebuild `Function` tuples as inert function objects. When off they
    /// decode to `undefined`.
    pub revive_functions: bool,
    /// Return decode failures as errors instead of `null`.
    pub strict: bool,
    /// Deepest JSON nesting the decoder accepts. Deeper input is rejected
    /// with [`Error::NestingLimit`](crate::Error::NestingLimit).
    pub max_nesting: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            constructors: ConstructorMap::default(),
            revive_functions: false,
            strict: false,
            max_nesting: DEFAULT_MAX_NESTING,
        }
    }
}

impl ParseOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_constructors(mut self, constructors: ConstructorMap) -> Self {
        self.constructors = constructors;
        self
    }

    #[must_use]
    pub fn with_constructor(mut self, class: Class) -> Self {
        self.constructors.register(class);
        self
    }

    #[must_use]
    pub fn revive_functions(mut self, revive: bool) -> Self {
        self.revive_functions = revive;
        self
    }

    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    #[must_use]
    pub fn with_max_nesting(mut self, max_nesting: usize) -> Self {
        self.max_nesting = max_nesting;
        self
    }
}
