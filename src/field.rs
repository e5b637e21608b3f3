//! Field resolution.
//!
//! Resolving a field decides what role it plays for one direction:
//!
//! - a **tagged** field maps to one label key
//! - the **container** field carries the whole label map
//! - an untagged record (or pointer to one) is **nested** and traversed
//! - anything else is skipped
//!
//! Tagged fields and the container get their strategy bound here, so a type
//! with no way to be labeled is reported before any value is touched.

use crate::de::{self, Unmarshal};
use crate::error::{Error, FieldError};
use crate::format::Format;
use crate::meta::Meta;
use crate::options::Options;
use crate::reflect::FieldDef;
use crate::ser::{self, Marshal};
use crate::tag::Tag;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Direction {
    Marshal,
    Unmarshal,
}

/// One resolved field of a record tree.
#[derive(Clone)]
pub(crate) struct Field {
    pub(crate) meta: Meta,
    pub(crate) key: String,
    /// `None` for a container named through [`Options::container_field`].
    pub(crate) tag: Option<Tag>,
    pub(crate) is_container: bool,
    /// Declaration indices from the top-level record down to this field.
    pub(crate) position: Vec<usize>,
    pub(crate) marshal: Option<Marshal>,
    pub(crate) unmarshal: Option<Unmarshal>,
    pub(crate) was_set: bool,
}

impl Field {
    pub(crate) fn path(&self) -> &str {
        self.meta.path()
    }

    pub(crate) fn raw_tag(&self) -> &str {
        self.tag.as_ref().map_or("", |tag| tag.raw.as_str())
    }

    pub(crate) fn ignore_case(&self, options: &Options) -> bool {
        self.tag
            .as_ref()
            .and_then(|tag| tag.ignore_case)
            .unwrap_or(options.ignore_case)
    }

    pub(crate) fn keep(&self, options: &Options) -> bool {
        self.tag
            .as_ref()
            .and_then(|tag| tag.keep)
            .unwrap_or(options.keep_labels)
    }

    pub(crate) fn required(&self, options: &Options) -> bool {
        self.tag
            .as_ref()
            .and_then(|tag| tag.required)
            .unwrap_or(options.require_all)
    }

    pub(crate) fn omit_empty(&self, options: &Options) -> bool {
        self.tag
            .as_ref()
            .and_then(|tag| tag.omit_empty)
            .unwrap_or(options.omit_empty)
    }

    /// The tag's default, else a non-empty global default.
    pub(crate) fn default(&self, options: &Options) -> Option<String> {
        self.tag
            .as_ref()
            .and_then(|tag| tag.default.clone())
            .or_else(|| Some(options.default.clone()).filter(|d| !d.is_empty()))
    }

    pub(crate) fn format(&self, options: &Options) -> Format {
        Format::resolve(self.tag.as_ref(), options)
    }

    /// Wraps `source` with this field's path, key and tag.
    pub(crate) fn error(&self, source: Error) -> FieldError {
        FieldError::new(self.path(), self.key.as_str(), self.raw_tag(), source)
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("path", &self.path())
            .field("key", &self.key)
            .field("is_container", &self.is_container)
            .field("was_set", &self.was_set)
            .finish()
    }
}

#[derive(Debug)]
pub(crate) enum Resolved {
    Tagged(Field),
    Container(Field),
    Nested(Meta),
    Skipped,
}

/// Resolves field `def` of the record at `parent`.
///
/// Errors carry the field's local name as their path; the traversal prefixes
/// the names of enclosing fields on the way up.
pub(crate) fn resolve(
    parent: &Meta,
    def: &FieldDef,
    position: Vec<usize>,
    direction: Direction,
    options: &Options,
) -> Result<Resolved, FieldError> {
    let meta = parent.field(def);
    let raw = def.lookup(&options.tag);
    let named_container = options.container_field.as_deref() == Some(meta.path());
    let fail = |key: &str, source: Error| FieldError::new(def.name(), key, raw.unwrap_or(""), source);

    if raw.is_none() && !named_container {
        return Ok(if meta.is_record() && meta.is_exported() {
            Resolved::Nested(meta)
        } else {
            Resolved::Skipped
        });
    }

    if !meta.is_exported() {
        let key = raw.and_then(|raw| raw.split(options.separator.as_str()).next());
        return Err(fail(key.unwrap_or("").trim(), Error::UnexportedField));
    }

    let tag = match raw {
        Some(raw) => Some(Tag::parse(raw, options).map_err(|e| fail("", e))?),
        None => None,
    };
    let is_container = named_container || tag.as_ref().map_or(false, |t| t.is_container);
    let key = match &tag {
        Some(tag) if !tag.is_container => tag.key.clone(),
        _ => options.container_token.clone(),
    };

    let mut field = Field {
        meta,
        key,
        tag,
        is_container,
        position,
        marshal: None,
        unmarshal: None,
        was_set: false,
    };

    if is_container {
        let bound = match direction {
            Direction::Marshal => {
                field.marshal = ser::select(ser::CONTAINER_MARSHALERS, &field.meta);
                field.marshal.is_some()
            }
            Direction::Unmarshal => {
                field.unmarshal = de::select(de::CONTAINER_UNMARSHALERS, &field.meta);
                field.unmarshal.is_some()
            }
        };
        if !bound {
            let path = field.path().to_string();
            return Err(fail(&field.key, Error::InvalidContainer(path)));
        }
        return Ok(Resolved::Container(field));
    }

    let bound = match direction {
        Direction::Marshal => {
            field.marshal = ser::select(ser::FIELD_MARSHALERS, &field.meta);
            field.marshal.is_some()
        }
        Direction::Unmarshal => {
            field.unmarshal = de::select(de::FIELD_UNMARSHALERS, &field.meta);
            field.unmarshal.is_some()
        }
    };
    if !bound {
        let type_name = field.meta.type_name();
        return Err(fail(&field.key, Error::unsupported_type(type_name)));
    }
    Ok(Resolved::Tagged(field))
}
