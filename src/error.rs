//! Error types for DSON encoding and decoding.
//!
//! Most failures are absorbed by the lenient default mode and surface only as
//! degraded output plus a diagnostic log line. The variants below are what a
//! caller sees when it opts into strict mode (see
//! [`StringifyOptions::strict`](crate::StringifyOptions) and
//! [`ParseOptions::strict`](crate::ParseOptions)), or when it uses the serde
//! bridge ([`to_value`](crate::to_value) / [`from_value`](crate::from_value)).
//!
//! ## Error Categories
//!
//! - **Syntax Errors**: the input is not JSON at all (line/column included)
//! - **Malformed Tuples**: a known type tag with a payload of the wrong shape
//! - **Nesting Limit**: the input nests deeper than
//!   [`ParseOptions::max_nesting`](crate::ParseOptions)
//! - **Unresolved References**: a `ref` tuple naming an id that never appears
//! - **Borrow Conflicts**: a value was mutably borrowed while being encoded
//! - **I/O Errors**: a file source could not be read
//!
//! ## Examples
//!
//! ```rust
//! use dson::{parse_with_options, Error, ParseOptions};
//!
//! let strict = ParseOptions::new().strict(true);
//! let result = parse_with_options("{", &strict);
//! assert!(matches!(result, Err(Error::Syntax { .. })));
//! ```

use std::fmt;
use thiserror::Error;

/// Represents all possible errors that can occur while encoding or decoding DSON.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// IO error while reading a file source or writing output
    #[error("IO error: {0}")]
    Io(String),

    /// The text is not valid JSON
    #[error("Syntax error at line {line}, column {col}: {msg}")]
    Syntax { line: usize, col: usize, msg: String },

    /// A tagged tuple whose payload does not match its tag
    #[error("Malformed tuple: {0}")]
    MalformedTuple(String),

    /// The input nests deeper than the decoder accepts
    #[error("Input nests deeper than {0} levels")]
    NestingLimit(usize),

    /// A `ref` tuple pointing at an id that was never allocated
    #[error("Unresolved reference to id {0}")]
    UnresolvedReference(u64),

    /// The value is mutably borrowed elsewhere and cannot be read
    #[error("Value is already mutably borrowed: {0}")]
    Borrowed(String),

    /// A binary payload is not valid base64
    #[error("Invalid base64 payload: {0}")]
    Base64(String),

    /// A URL payload could not be parsed
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A cyclic graph reached a tree-shaped consumer
    #[error("Cyclic value cannot be represented in the serde data model")]
    Cycle,

    /// Unsupported type for the requested conversion
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates a malformed-tuple error naming the offending tag.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dson::Error;
    ///
    /// let err = Error::malformed("Map", "payload must be a list of pairs");
    /// assert!(err.to_string().contains("Map"));
    /// ```
    pub fn malformed(tag: &str, msg: impl fmt::Display) -> Self {
        Error::MalformedTuple(format!("{}: {}", tag, msg))
    }

    /// Creates an unsupported type error.
    pub fn unsupported_type(msg: &str) -> Self {
        Error::UnsupportedType(msg.to_string())
    }

    /// Creates a custom error with a display message.
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Creates an I/O error for file reading/writing failures.
    pub fn io(msg: &str) -> Self {
        Error::Io(msg.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            return Error::Io(err.to_string());
        }
        Error::Syntax {
            line: err.line(),
            col: err.column(),
            msg: err.to_string(),
        }
    }
}

impl From<base64::DecodeError> for Error {
    fn from(err: base64::DecodeError) -> Self {
        Error::Base64(err.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
