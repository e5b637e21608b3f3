//! Tag parsing.
//!
//! A tag is the string attached to a field under the configured tag name
//! (`label` by default). Its grammar, with the default vocabulary:
//!
//! ```text
//! tag      = key *( "," modifier )
//! key      = label key | "*"
//! modifier = flag | name ":" value
//! flag     = "required" | "notrequired" | "keep" | "discard"
//!          | "ignorecase" | "casesensitive" | "omitempty" | "includeempty"
//! name     = "default" | "format" | "floatformat" | "complexformat"
//!          | "timeformat" | "base" | "intbase" | "uintbase" | "split"
//! ```
//!
//! Whitespace around the key, modifiers, names and values is ignored.
//! Modifier names are matched case-insensitively unless
//! [`Options::case_sensitive_tokens`] is set. Only the first assignment in a
//! modifier splits it, so values may themselves contain the assignment
//! string (`timeformat:%H:%M`).
//!
//! ## Examples
//!
//! ```rust
//! use labeler::{Options, Tag};
//!
//! let tag = Tag::parse("port, Required, default:8080, base:0", &Options::new()).unwrap();
//! assert_eq!(tag.key, "port");
//! assert_eq!(tag.required, Some(true));
//! assert_eq!(tag.default.as_deref(), Some("8080"));
//! assert_eq!(tag.base, Some(0));
//! assert!(!tag.is_container);
//! ```

use crate::error::{Error, Result};
use crate::format::is_float_format;
use crate::options::{valid_base, Options, Token};

/// The parsed form of a field tag.
///
/// Every modifier is optional; `None` means the tag left the policy to the
/// global [`Options`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tag {
    /// The tag text as written.
    pub raw: String,
    /// The label key, or the container token.
    pub key: String,
    pub is_container: bool,
    pub default: Option<String>,
    pub ignore_case: Option<bool>,
    pub required: Option<bool>,
    pub keep: Option<bool>,
    pub omit_empty: Option<bool>,
    pub format: Option<String>,
    pub time_format: Option<String>,
    pub float_format: Option<char>,
    pub complex_format: Option<char>,
    pub base: Option<u32>,
    pub int_base: Option<u32>,
    pub uint_base: Option<u32>,
    pub split: Option<String>,
}

impl Tag {
    /// Parses a tag using the vocabulary in `options`.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedTag`] when the tag is empty, has an empty key or
    /// modifier, names an unknown modifier, repeats a modifier, gives a flag
    /// a value or a valued modifier none, or carries an invalid base.
    /// [`Error::InvalidFloatFormat`] when a float or complex format is not one
    /// of `b e E f g G x X`.
    pub fn parse(raw: &str, options: &Options) -> Result<Tag> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == options.separator {
            return Err(Error::malformed_tag(raw, "tag is empty"));
        }

        let mut parts = trimmed.split(options.separator.as_str());
        let key = parts.next().unwrap_or_default().trim();
        if key.is_empty() {
            return Err(Error::malformed_tag(raw, "missing key"));
        }

        let mut tag = Tag {
            raw: raw.to_string(),
            key: key.to_string(),
            is_container: key == options.container_token,
            ..Tag::default()
        };
        let mut seen: Vec<Token> = Vec::new();
        for part in parts {
            let token = tag.apply(part, options)?;
            if seen.contains(&token) {
                return Err(Error::malformed_tag(
                    raw,
                    &format!("{} given more than once", options.token(token)),
                ));
            }
            seen.push(token);
        }
        Ok(tag)
    }

    fn apply(&mut self, modifier: &str, options: &Options) -> Result<Token> {
        let modifier = modifier.trim();
        if modifier.is_empty() {
            return Err(Error::malformed_tag(&self.raw, "empty modifier"));
        }

        let (name, value) = match modifier.split_once(options.assignment.as_str()) {
            Some((name, value)) => (name.trim(), Some(value.trim())),
            None => (modifier, None),
        };
        let name = options.normalize_token(name);
        let token = Token::ALL
            .into_iter()
            .find(|t| options.normalize_token(options.token(*t).trim()) == name)
            .ok_or_else(|| {
                Error::malformed_tag(&self.raw, &format!("unknown modifier {:?}", name))
            })?;

        let value = match (token.takes_value(), value) {
            (true, Some(value)) if !value.is_empty() => value,
            (true, _) => {
                return Err(Error::malformed_tag(
                    &self.raw,
                    &format!("{} requires a value", name),
                ))
            }
            (false, Some(_)) => {
                return Err(Error::malformed_tag(
                    &self.raw,
                    &format!("{} does not take a value", name),
                ))
            }
            (false, None) => "",
        };

        match token {
            Token::Required => self.required = Some(true),
            Token::NotRequired => self.required = Some(false),
            Token::Keep => self.keep = Some(true),
            Token::Discard => self.keep = Some(false),
            Token::IgnoreCase => self.ignore_case = Some(true),
            Token::CaseSensitive => self.ignore_case = Some(false),
            Token::OmitEmpty => self.omit_empty = Some(true),
            Token::IncludeEmpty => self.omit_empty = Some(false),
            Token::Default => self.default = Some(value.to_string()),
            Token::Format => self.format = Some(value.to_string()),
            Token::TimeFormat => self.time_format = Some(value.to_string()),
            Token::FloatFormat => self.float_format = Some(float_format(value)?),
            Token::ComplexFormat => self.complex_format = Some(float_format(value)?),
            Token::Base => self.base = Some(self.base_value(value)?),
            Token::IntBase => self.int_base = Some(self.base_value(value)?),
            Token::UintBase => self.uint_base = Some(self.base_value(value)?),
            Token::Split => self.split = Some(value.to_string()),
        }
        Ok(token)
    }

    fn base_value(&self, value: &str) -> Result<u32> {
        value
            .parse::<u32>()
            .ok()
            .filter(|base| valid_base(*base))
            .ok_or_else(|| {
                Error::malformed_tag(
                    &self.raw,
                    &format!("base {:?} must be 0 or between 2 and 36", value),
                )
            })
    }

    /// The float format this tag asks for: `floatformat`, else the first
    /// character of `format`.
    pub(crate) fn float_format_or_format(&self) -> Option<char> {
        self.float_format
            .or_else(|| self.format.as_deref().and_then(|f| f.chars().next()))
    }

    /// The complex format this tag asks for: `complexformat`, else the first
    /// character of `format`.
    pub(crate) fn complex_format_or_format(&self) -> Option<char> {
        self.complex_format
            .or_else(|| self.format.as_deref().and_then(|f| f.chars().next()))
    }

    /// The time layout this tag asks for: `timeformat`, else `format`.
    pub(crate) fn time_format_or_format(&self) -> Option<&str> {
        self.time_format.as_deref().or(self.format.as_deref())
    }
}

fn float_format(value: &str) -> Result<char> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if is_float_format(c) => Ok(c),
        _ => Err(Error::InvalidFloatFormat(value.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> Result<Tag> {
        Tag::parse(raw, &Options::new())
    }

    #[test]
    fn test_key_only() {
        let tag = parse("  name ").unwrap();
        assert_eq!(tag.key, "name");
        assert_eq!(tag.raw, "  name ");
        assert_eq!(tag, Tag { raw: "  name ".into(), key: "name".into(), ..Tag::default() });
    }

    #[test]
    fn test_container() {
        let tag = parse("*, discard").unwrap();
        assert!(tag.is_container);
        assert_eq!(tag.keep, Some(false));
    }

    #[test]
    fn test_flags_toggle_policies() {
        let tag = parse("k,notrequired,casesensitive,omitempty,keep").unwrap();
        assert_eq!(tag.required, Some(false));
        assert_eq!(tag.ignore_case, Some(false));
        assert_eq!(tag.omit_empty, Some(true));
        assert_eq!(tag.keep, Some(true));

        let tag = parse("k,IGNORECASE,IncludeEmpty").unwrap();
        assert_eq!(tag.ignore_case, Some(true));
        assert_eq!(tag.omit_empty, Some(false));
    }

    #[test]
    fn test_values_split_on_first_assignment() {
        let tag = parse("t, timeformat: %H:%M , split:|").unwrap();
        assert_eq!(tag.time_format.as_deref(), Some("%H:%M"));
        assert_eq!(tag.split.as_deref(), Some("|"));
    }

    #[test]
    fn test_formats() {
        let tag = parse("f,floatformat:e,complexformat:G").unwrap();
        assert_eq!(tag.float_format, Some('e'));
        assert_eq!(tag.complex_format, Some('G'));

        let tag = parse("f,format:x").unwrap();
        assert_eq!(tag.float_format_or_format(), Some('x'));
        assert_eq!(tag.time_format_or_format(), Some("x"));

        assert!(matches!(parse("f,floatformat:q"), Err(Error::InvalidFloatFormat(_))));
        assert!(matches!(parse("f,complexformat:ee"), Err(Error::InvalidFloatFormat(_))));
    }

    #[test]
    fn test_bases() {
        let tag = parse("n,base:2,intbase:16,uintbase:0").unwrap();
        assert_eq!((tag.base, tag.int_base, tag.uint_base), (Some(2), Some(16), Some(0)));
        assert!(parse("n,base:1").is_err());
        assert!(parse("n,base:37").is_err());
        assert!(parse("n,base:ten").is_err());
    }

    #[test]
    fn test_malformed() {
        for raw in [
            "",
            "   ",
            ",",
            ",required",
            "name,",
            "name, ,keep",
            "name,bogus",
            "name,default",
            "name,default:",
            "name,default: ",
            "name,required:yes",
            "name,keep,keep",
            "name,keep,Keep",
        ] {
            assert!(
                matches!(parse(raw), Err(Error::MalformedTag { .. })),
                "{:?} should be malformed",
                raw
            );
        }
    }

    #[test]
    fn test_custom_vocabulary() {
        let options = Options::new()
            .with_separator(";")
            .with_assignment("=")
            .with_container_token("ALL")
            .with_token(Token::Default, "def");
        let tag = Tag::parse("ALL;def=a,b", &options).unwrap();
        assert!(tag.is_container);
        assert_eq!(tag.default.as_deref(), Some("a,b"));
    }

    #[test]
    fn test_case_sensitive_tokens() {
        let options = Options::new().case_sensitive_tokens();
        assert!(Tag::parse("k,required", &options).is_ok());
        assert!(Tag::parse("k,Required", &options).is_err());
    }
}
