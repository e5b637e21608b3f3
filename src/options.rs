//! Configuration for marshaling and unmarshaling.
//!
//! This module provides:
//!
//! - [`Options`]: the tag vocabulary and the global defaults
//! - [`Token`]: the modifiers a tag may carry after its key
//!
//! Options are validated before any record is touched, so a bad vocabulary
//! fails fast with [`Error::InvalidOption`](crate::Error::InvalidOption).
//! A container field's tag may override a subset of the defaults for the
//! record it belongs to (see [`Options::with_container_tag`]).
//!
//! ## Examples
//!
//! ```rust
//! use labeler::{Options, Token};
//!
//! let options = Options::new()
//!     .with_tag("env")
//!     .with_separator(";")
//!     .with_token(Token::Default, "fallback")
//!     .case_sensitive()
//!     .require_all();
//!
//! assert!(options.validate().is_ok());
//! assert_eq!(options.token(Token::Default), "fallback");
//! assert!(!options.ignore_case);
//! ```

use crate::error::{Error, Result};
use crate::format::is_float_format;
use crate::tag::Tag;
use serde::{Deserialize, Serialize};

/// A modifier that may follow the key in a tag.
///
/// Flag modifiers stand alone (`required`), valued modifiers carry an
/// assignment (`default:8080`).
///
/// # Examples
///
/// ```rust
/// use labeler::Token;
///
/// assert_eq!(Token::OmitEmpty.default_name(), "omitempty");
/// assert!(Token::Split.takes_value());
/// assert!(!Token::Keep.takes_value());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Token {
    Required,
    NotRequired,
    Keep,
    Discard,
    IgnoreCase,
    CaseSensitive,
    OmitEmpty,
    IncludeEmpty,
    Default,
    Format,
    FloatFormat,
    ComplexFormat,
    TimeFormat,
    Base,
    IntBase,
    UintBase,
    Split,
}

impl Token {
    pub const ALL: [Token; 17] = [
        Token::Required,
        Token::NotRequired,
        Token::Keep,
        Token::Discard,
        Token::IgnoreCase,
        Token::CaseSensitive,
        Token::OmitEmpty,
        Token::IncludeEmpty,
        Token::Default,
        Token::Format,
        Token::FloatFormat,
        Token::ComplexFormat,
        Token::TimeFormat,
        Token::Base,
        Token::IntBase,
        Token::UintBase,
        Token::Split,
    ];

    /// The spelling used when no override is configured.
    #[must_use]
    pub const fn default_name(self) -> &'static str {
        match self {
            Token::Required => "required",
            Token::NotRequired => "notrequired",
            Token::Keep => "keep",
            Token::Discard => "discard",
            Token::IgnoreCase => "ignorecase",
            Token::CaseSensitive => "casesensitive",
            Token::OmitEmpty => "omitempty",
            Token::IncludeEmpty => "includeempty",
            Token::Default => "default",
            Token::Format => "format",
            Token::FloatFormat => "floatformat",
            Token::ComplexFormat => "complexformat",
            Token::TimeFormat => "timeformat",
            Token::Base => "base",
            Token::IntBase => "intbase",
            Token::UintBase => "uintbase",
            Token::Split => "split",
        }
    }

    /// Whether the modifier requires an assigned value.
    #[must_use]
    pub const fn takes_value(self) -> bool {
        matches!(
            self,
            Token::Default
                | Token::Format
                | Token::FloatFormat
                | Token::ComplexFormat
                | Token::TimeFormat
                | Token::Base
                | Token::IntBase
                | Token::UintBase
                | Token::Split
        )
    }
}

/// Tag vocabulary and global defaults.
///
/// Every field is public; the `with_*` methods are shorthands for building a
/// configuration fluently. `Options` also implements `Serialize` and
/// `Deserialize`, with missing fields falling back to their defaults.
///
/// # Examples
///
/// ```rust
/// use labeler::Options;
///
/// let options: Options = serde_json::from_str(r#"{"tag": "env", "keep_labels": false}"#).unwrap();
/// assert_eq!(options.tag, "env");
/// assert_eq!(options.separator, ",");
/// assert!(!options.keep_labels);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Attribute name the field tags are read from.
    pub tag: String,
    /// Splits a tag into its key and modifiers.
    pub separator: String,
    /// Splits a modifier into its name and value.
    pub assignment: String,
    /// Tag key marking the container field.
    pub container_token: String,

    pub required_token: String,
    pub not_required_token: String,
    pub keep_token: String,
    pub discard_token: String,
    pub ignore_case_token: String,
    pub case_sensitive_token: String,
    pub omit_empty_token: String,
    pub include_empty_token: String,
    pub default_token: String,
    pub format_token: String,
    pub float_format_token: String,
    pub complex_format_token: String,
    pub time_format_token: String,
    pub base_token: String,
    pub int_base_token: String,
    pub uint_base_token: String,
    pub split_token: String,

    /// Match modifier names exactly instead of lowercasing them first.
    pub case_sensitive_tokens: bool,
    /// Dotted field path naming the container without tagging it.
    pub container_field: Option<String>,

    /// Match label keys regardless of case.
    pub ignore_case: bool,
    /// Leave consumed keys in the map handed to the container.
    pub keep_labels: bool,
    /// Treat every tagged field as required.
    pub require_all: bool,
    /// Value used when a key is missing; empty means none.
    pub default: String,
    /// chrono strftime layout for time values.
    pub time_format: String,
    pub float_format: char,
    pub complex_format: char,
    /// 0 infers the base from a `0b`, `0o` or `0x` prefix.
    pub int_base: u32,
    pub uint_base: u32,
    /// Element separator for collection fields.
    pub split: String,
    /// Skip empty values when marshaling.
    pub omit_empty: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            tag: "label".to_string(),
            separator: ",".to_string(),
            assignment: ":".to_string(),
            container_token: "*".to_string(),
            required_token: Token::Required.default_name().to_string(),
            not_required_token: Token::NotRequired.default_name().to_string(),
            keep_token: Token::Keep.default_name().to_string(),
            discard_token: Token::Discard.default_name().to_string(),
            ignore_case_token: Token::IgnoreCase.default_name().to_string(),
            case_sensitive_token: Token::CaseSensitive.default_name().to_string(),
            omit_empty_token: Token::OmitEmpty.default_name().to_string(),
            include_empty_token: Token::IncludeEmpty.default_name().to_string(),
            default_token: Token::Default.default_name().to_string(),
            format_token: Token::Format.default_name().to_string(),
            float_format_token: Token::FloatFormat.default_name().to_string(),
            complex_format_token: Token::ComplexFormat.default_name().to_string(),
            time_format_token: Token::TimeFormat.default_name().to_string(),
            base_token: Token::Base.default_name().to_string(),
            int_base_token: Token::IntBase.default_name().to_string(),
            uint_base_token: Token::UintBase.default_name().to_string(),
            split_token: Token::Split.default_name().to_string(),
            case_sensitive_tokens: false,
            container_field: None,
            ignore_case: true,
            keep_labels: true,
            require_all: false,
            default: String::new(),
            time_format: "%Y-%m-%dT%H:%M:%S%:z".to_string(),
            float_format: 'f',
            complex_format: 'f',
            int_base: 10,
            uint_base: 10,
            split: ",".to_string(),
            omit_empty: false,
        }
    }
}

impl Options {
    /// Creates the default configuration.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use labeler::Options;
    ///
    /// let options = Options::new();
    /// assert_eq!(options.tag, "label");
    /// assert!(options.ignore_case);
    /// assert!(options.keep_labels);
    /// assert!(!options.require_all);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the configured spelling of a modifier.
    #[must_use]
    pub fn token(&self, token: Token) -> &str {
        match token {
            Token::Required => &self.required_token,
            Token::NotRequired => &self.not_required_token,
            Token::Keep => &self.keep_token,
            Token::Discard => &self.discard_token,
            Token::IgnoreCase => &self.ignore_case_token,
            Token::CaseSensitive => &self.case_sensitive_token,
            Token::OmitEmpty => &self.omit_empty_token,
            Token::IncludeEmpty => &self.include_empty_token,
            Token::Default => &self.default_token,
            Token::Format => &self.format_token,
            Token::FloatFormat => &self.float_format_token,
            Token::ComplexFormat => &self.complex_format_token,
            Token::TimeFormat => &self.time_format_token,
            Token::Base => &self.base_token,
            Token::IntBase => &self.int_base_token,
            Token::UintBase => &self.uint_base_token,
            Token::Split => &self.split_token,
        }
    }

    fn token_mut(&mut self, token: Token) -> &mut String {
        match token {
            Token::Required => &mut self.required_token,
            Token::NotRequired => &mut self.not_required_token,
            Token::Keep => &mut self.keep_token,
            Token::Discard => &mut self.discard_token,
            Token::IgnoreCase => &mut self.ignore_case_token,
            Token::CaseSensitive => &mut self.case_sensitive_token,
            Token::OmitEmpty => &mut self.omit_empty_token,
            Token::IncludeEmpty => &mut self.include_empty_token,
            Token::Default => &mut self.default_token,
            Token::Format => &mut self.format_token,
            Token::FloatFormat => &mut self.float_format_token,
            Token::ComplexFormat => &mut self.complex_format_token,
            Token::TimeFormat => &mut self.time_format_token,
            Token::Base => &mut self.base_token,
            Token::IntBase => &mut self.int_base_token,
            Token::UintBase => &mut self.uint_base_token,
            Token::Split => &mut self.split_token,
        }
    }

    /// Sets the attribute name tags are read from.
    #[must_use]
    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tag = tag.to_string();
        self
    }

    #[must_use]
    pub fn with_separator(mut self, separator: &str) -> Self {
        self.separator = separator.to_string();
        self
    }

    #[must_use]
    pub fn with_assignment(mut self, assignment: &str) -> Self {
        self.assignment = assignment.to_string();
        self
    }

    #[must_use]
    pub fn with_container_token(mut self, token: &str) -> Self {
        self.container_token = token.to_string();
        self
    }

    /// Renames a modifier.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use labeler::{Options, Token};
    ///
    /// let options = Options::new().with_token(Token::Required, "must");
    /// assert_eq!(options.token(Token::Required), "must");
    /// ```
    #[must_use]
    pub fn with_token(mut self, token: Token, name: &str) -> Self {
        *self.token_mut(token) = name.to_string();
        self
    }

    /// Matches modifier names exactly instead of case-insensitively.
    #[must_use]
    pub fn case_sensitive_tokens(mut self) -> Self {
        self.case_sensitive_tokens = true;
        self
    }

    /// Designates the container by dotted field path instead of by tag.
    #[must_use]
    pub fn with_container_field(mut self, path: &str) -> Self {
        self.container_field = Some(path.to_string());
        self
    }

    /// Matches label keys exactly.
    #[must_use]
    pub fn case_sensitive(mut self) -> Self {
        self.ignore_case = false;
        self
    }

    /// Removes consumed keys from the map handed to the container.
    #[must_use]
    pub fn discard_labels(mut self) -> Self {
        self.keep_labels = false;
        self
    }

    #[must_use]
    pub fn require_all(mut self) -> Self {
        self.require_all = true;
        self
    }

    #[must_use]
    pub fn with_default(mut self, default: &str) -> Self {
        self.default = default.to_string();
        self
    }

    #[must_use]
    pub fn with_time_format(mut self, layout: &str) -> Self {
        self.time_format = layout.to_string();
        self
    }

    #[must_use]
    pub fn with_float_format(mut self, format: char) -> Self {
        self.float_format = format;
        self
    }

    #[must_use]
    pub fn with_complex_format(mut self, format: char) -> Self {
        self.complex_format = format;
        self
    }

    #[must_use]
    pub fn with_int_base(mut self, base: u32) -> Self {
        self.int_base = base;
        self
    }

    #[must_use]
    pub fn with_uint_base(mut self, base: u32) -> Self {
        self.uint_base = base;
        self
    }

    #[must_use]
    pub fn with_split(mut self, split: &str) -> Self {
        self.split = split.to_string();
        self
    }

    #[must_use]
    pub fn omit_empty(mut self) -> Self {
        self.omit_empty = true;
        self
    }

    /// Checks that the vocabulary is usable.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use labeler::{Error, Options, Token};
    ///
    /// let err = Options::new().with_token(Token::Keep, " ").validate().unwrap_err();
    /// assert!(matches!(err, Error::InvalidOption { .. }));
    /// ```
    pub fn validate(&self) -> Result<()> {
        let named = [
            ("tag", &self.tag),
            ("separator", &self.separator),
            ("assignment", &self.assignment),
            ("container_token", &self.container_token),
            ("split", &self.split),
        ];
        for (option, value) in named {
            if value.trim().is_empty() {
                return Err(Error::invalid_option(option, "must not be empty"));
            }
        }
        if self.separator == self.assignment {
            return Err(Error::invalid_option(
                "assignment",
                "must differ from the separator",
            ));
        }

        let mut seen: Vec<(Token, String)> = Vec::with_capacity(Token::ALL.len());
        for token in Token::ALL {
            let name = self.token(token).trim();
            if name.is_empty() {
                return Err(Error::invalid_option(
                    token.default_name(),
                    "token must not be empty",
                ));
            }
            let name = self.normalize_token(name);
            if let Some((other, _)) = seen.iter().find(|(_, n)| *n == name) {
                return Err(Error::invalid_option(
                    token.default_name(),
                    &format!("token {:?} is also used by {}", name, other.default_name()),
                ));
            }
            seen.push((token, name));
        }

        for format in [self.float_format, self.complex_format] {
            if !is_float_format(format) {
                return Err(Error::InvalidFloatFormat(format.to_string()));
            }
        }
        for (option, base) in [("int_base", self.int_base), ("uint_base", self.uint_base)] {
            if !valid_base(base) {
                return Err(Error::invalid_option(option, "base must be 0 or between 2 and 36"));
            }
        }
        if let Some(path) = &self.container_field {
            if path.split('.').any(|segment| segment.trim().is_empty()) {
                return Err(Error::invalid_option(
                    "container_field",
                    "must be a dotted field path",
                ));
            }
        }
        Ok(())
    }

    /// Applies a modifier name's case policy.
    pub(crate) fn normalize_token(&self, name: &str) -> String {
        if self.case_sensitive_tokens {
            name.to_string()
        } else {
            name.to_lowercase()
        }
    }

    /// Returns a copy with every attribute the container tag explicitly sets
    /// taking precedence.
    ///
    /// Only the container's policies propagate: `ignorecase`/`casesensitive`,
    /// `keep`/`discard`, `required`/`notrequired`, the float, complex and time
    /// formats, and the integer bases.
    #[must_use]
    pub fn with_container_tag(&self, tag: &Tag) -> Options {
        let mut options = self.clone();
        if let Some(ignore_case) = tag.ignore_case {
            options.ignore_case = ignore_case;
        }
        if let Some(keep) = tag.keep {
            options.keep_labels = keep;
        }
        if let Some(required) = tag.required {
            options.require_all = required;
        }
        if let Some(format) = tag.float_format {
            options.float_format = format;
        }
        if let Some(format) = tag.complex_format {
            options.complex_format = format;
        }
        if let Some(layout) = tag.time_format.as_ref().or(tag.format.as_ref()) {
            options.time_format = layout.clone();
        }
        if let Some(base) = tag.base {
            options.int_base = base;
            options.uint_base = base;
        }
        if let Some(base) = tag.int_base {
            options.int_base = base;
        }
        if let Some(base) = tag.uint_base {
            options.uint_base = base;
        }
        options
    }
}

pub(crate) fn valid_base(base: u32) -> bool {
    base == 0 || (2..=36).contains(&base)
}
