//! Error types for label marshaling and unmarshaling.
//!
//! Errors come in two flavors:
//!
//! - **Hard errors** ([`Error`]): configuration problems, malformed tags,
//!   invalid inputs and structural violations such as two container fields.
//!   They abort the whole operation.
//! - **Field errors** ([`FieldError`]): a problem with one field, carrying the
//!   dotted field path, the label key and the tag it came from. Field errors
//!   are collected rather than returned one at a time, and surface together
//!   as a single [`ParsingError`].
//!
//! ## Examples
//!
//! ```rust
//! use labeler::{labeled, labels, unmarshal, Error};
//!
//! labeled! {
//!     #[derive(Default)]
//!     pub struct Limits {
//!         #[label = "cpu"]
//!         pub cpu: u32,
//!         #[label = "memory"]
//!         pub memory: u32,
//!         #[label = "*"]
//!         pub rest: std::collections::HashMap<String, String>,
//!     }
//! }
//!
//! let input = labels! { "cpu" => "two", "memory" => "lots" };
//! let mut limits = Limits::default();
//!
//! match unmarshal(&input, &mut limits) {
//!     Err(Error::Parsing(err)) => assert_eq!(err.errors.len(), 2),
//!     other => panic!("expected a parsing error, got {:?}", other),
//! }
//! ```

use std::fmt;
use thiserror::Error;

/// Represents all possible errors that can occur while labeling.
///
/// Most variants describe a hard failure. The per-field conditions
/// ([`Error::UnexportedField`], [`Error::MissingRequiredLabel`],
/// [`Error::Conversion`], ...) are normally found wrapped in a [`FieldError`].
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// A configuration value is empty or otherwise unusable
    #[error("invalid option {option}: {msg}")]
    InvalidOption { option: String, msg: String },

    /// A float or complex format character outside the legal set
    #[error("invalid float format {0:?}, options are: 'b', 'e', 'E', 'f', 'g', 'G', 'x', and 'X'")]
    InvalidFloatFormat(String),

    /// A tag string could not be parsed
    #[error("the label tag {tag:?} is malformed: {msg}")]
    MalformedTag { tag: String, msg: String },

    /// The unmarshal source is neither a label map nor a label getter
    #[error("invalid input {0}: must be a label map or implement Labeled or GenericallyLabeled")]
    InvalidInput(String),

    /// The marshal source or unmarshal target cannot be labeled
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// More than one field was marked as the container
    #[error("there can only be one container field, found {first} and {second}")]
    MultipleContainers { first: String, second: String },

    /// The container field cannot hold a whole label map
    #[error("container field {0} must be a label map or implement a label getter or setter")]
    InvalidContainer(String),

    /// Unmarshal found neither a container field nor a record-level setter
    #[error("{0} has no container field and does not implement a label setter")]
    MissingContainer(String),

    /// A tagged field is not visible outside its record
    #[error("field must be exported")]
    UnexportedField,

    /// A required key is absent and no default is configured
    #[error("value for this field is required")]
    MissingRequiredLabel,

    /// No marshal or unmarshal strategy accepts the field type
    #[error("unsupported type {0}")]
    UnsupportedType(String),

    /// A time value needs a layout and none was configured
    #[error("a format is required for this field")]
    MissingFormat,

    /// A value could not be converted to or from its label text
    #[error("invalid {expected} {value:?}: {reason}")]
    Conversion {
        value: String,
        expected: String,
        reason: String,
    },

    /// User code panicked while a field was processed
    #[error("parsing failed: {0}")]
    Panicked(String),

    /// One or more field errors, reported together
    #[error(transparent)]
    Parsing(#[from] ParsingError),

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates an invalid option error naming the offending option.
    pub fn invalid_option(option: &str, msg: &str) -> Self {
        Error::InvalidOption {
            option: option.to_string(),
            msg: msg.to_string(),
        }
    }

    /// Creates a malformed tag error for the raw tag text.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use labeler::Error;
    ///
    /// let err = Error::malformed_tag("name,", "empty modifier");
    /// assert!(err.to_string().contains("malformed"));
    /// ```
    pub fn malformed_tag(tag: &str, msg: &str) -> Self {
        Error::MalformedTag {
            tag: tag.to_string(),
            msg: msg.to_string(),
        }
    }

    /// Creates a conversion error for a value that could not become `expected`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use labeler::Error;
    ///
    /// let err = Error::conversion("abc", "i32", "invalid digit found in string");
    /// assert_eq!(err.to_string(), "invalid i32 \"abc\": invalid digit found in string");
    /// ```
    pub fn conversion<R: fmt::Display>(value: &str, expected: &str, reason: R) -> Self {
        Error::Conversion {
            value: value.to_string(),
            expected: expected.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Creates an unsupported type error.
    pub fn unsupported_type(type_name: &str) -> Self {
        Error::UnsupportedType(type_name.to_string())
    }

    /// Creates a custom error with a display message.
    ///
    /// Capability implementations use this to report their own failures.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use labeler::Error;
    ///
    /// let err = Error::custom("something went wrong");
    /// assert!(err.to_string().contains("something went wrong"));
    /// ```
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

/// A failure tied to one field of a record.
///
/// `path` is the dotted field path from the top-level record
/// (`"Parent.Child"`), `key` the label key the field maps to and `tag` the raw
/// tag text it was declared with.
#[derive(Debug, Clone, Error)]
#[error("error parsing {path}: {source}")]
pub struct FieldError {
    pub path: String,
    pub key: String,
    pub tag: String,
    pub source: Box<Error>,
}

impl FieldError {
    pub fn new(path: impl Into<String>, key: impl Into<String>, tag: impl Into<String>, source: Error) -> Self {
        FieldError {
            path: path.into(),
            key: key.into(),
            tag: tag.into(),
            source: Box::new(source),
        }
    }

    /// Re-labels an error raised inside a nested record with the name of the
    /// field holding that record.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use labeler::{Error, FieldError};
    ///
    /// let err = FieldError::new("Port", "port", "port", Error::MissingRequiredLabel);
    /// assert_eq!(err.nested("Server").path, "Server.Port");
    /// ```
    #[must_use]
    pub fn nested(mut self, parent: &str) -> Self {
        self.path = format!("{}.{}", parent, self.path);
        self
    }

    /// The underlying cause.
    pub fn cause(&self) -> &Error {
        &self.source
    }
}

/// Every [`FieldError`] collected during one marshal or unmarshal call.
#[derive(Debug, Clone, Error)]
#[error("{} error(s) occurred while parsing ({})", .errors.len(), join_paths(.errors))]
pub struct ParsingError {
    pub errors: Vec<FieldError>,
}

impl ParsingError {
    pub fn new(errors: Vec<FieldError>) -> Self {
        ParsingError { errors }
    }

    /// Looks up the error reported for a field path.
    pub fn field(&self, path: &str) -> Option<&FieldError> {
        self.errors.iter().find(|e| e.path == path)
    }
}

fn join_paths(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.path.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, Error>;
