//! The marshal and unmarshal entry points.
//!
//! A [`Labeler`] owns a validated [`Options`] and runs both directions:
//!
//! **Unmarshal** reads the input as a label map, then resolves the target:
//!
//! 1. A target that unmarshals itself receives the whole map and nothing
//!    else happens.
//! 2. Otherwise its fields are traversed. The container tag, if any,
//!    overrides the options for the rest of the call.
//! 3. Each tagged field takes its key (or its default). Consumed keys are
//!    dropped from the working map unless the field keeps them.
//! 4. The working map goes to the record's own label setter if it has one,
//!    else to the container field.
//!
//! **Marshal** mirrors it: a self-marshaling value produces the map itself;
//! otherwise the record's label getter or its container field provides the
//! base map and every tagged field is rendered on top of it, so a tagged
//! field wins a key collision.

use crate::de::{self, Unmarshal};
use crate::error::{Error, FieldError, ParsingError, Result};
use crate::field::Direction;
use crate::map::Labels;
use crate::meta::Meta;
use crate::options::Options;
use crate::reflect::Reflect;
use crate::ser;
use crate::traverse::{guarded, resolve_record};
use tracing::{debug, trace};

/// Converts between label maps and records.
///
/// # Examples
///
/// ```rust
/// use labeler::{labeled, labels, Labeler, Options};
///
/// labeled! {
///     #[derive(Default)]
///     pub struct Job {
///         #[env = "QUEUE"]
///         pub queue: String,
///         #[env = "WORKERS,default:4"]
///         pub workers: u8,
///         #[env = "*"]
///         pub rest: std::collections::BTreeMap<String, String>,
///     }
/// }
///
/// let labeler = Labeler::with_options(Options::new().with_tag("env").discard_labels()).unwrap();
///
/// let mut job = Job::default();
/// labeler.unmarshal(&labels! { "QUEUE" => "mail", "DEBUG" => "1" }, &mut job).unwrap();
/// assert_eq!(job.queue, "mail");
/// assert_eq!(job.workers, 4);
/// assert_eq!(job.rest.len(), 1);
///
/// let out = labeler.marshal(&job).unwrap();
/// assert_eq!(out.get("WORKERS"), Some("4"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct Labeler {
    options: Options,
}

impl Labeler {
    /// A labeler with the default options.
    #[must_use]
    pub fn new() -> Self {
        Labeler::default()
    }

    /// A labeler with custom options.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidOption`] or [`Error::InvalidFloatFormat`] when the
    /// options do not validate.
    pub fn with_options(options: Options) -> Result<Self> {
        options.validate()?;
        Ok(Labeler { options })
    }

    /// The options this labeler runs with.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Re-checks the options this labeler was built with.
    pub fn validate_options(&self) -> Result<()> {
        self.options.validate()
    }

    /// Produces the labels of `value`.
    pub fn marshal<T: Reflect>(&self, value: &T) -> Result<Labels> {
        let meta = Meta::root(T::shape());
        debug!(record = meta.type_name(), "marshaling");
        let subject = meta
            .value(value)?
            .ok_or_else(|| Error::InvalidValue(format!("{} is empty", meta.type_name())))?;

        if let Some(get) = ser::select_labels(ser::SELF_MARSHALERS, &meta) {
            trace!(record = meta.type_name(), "marshaling itself");
            return guarded_record(&meta, || get(subject, &self.options));
        }
        let getter = ser::select_labels(ser::RECORD_MARSHALERS, &meta);
        if !meta.is_record() {
            return match getter {
                Some(get) => guarded_record(&meta, || get(subject, &self.options)),
                None => Err(not_labelable(&meta)),
            };
        }

        let level = resolve_record(&meta, Direction::Marshal, &self.options)?;
        let options = level.options(&self.options);
        let mut out = Labels::new();
        let mut errors = Vec::new();

        if let Some(get) = getter {
            let labels = guarded_record(&meta, || get(subject, &options))?;
            ser::merge(&mut out, labels, options.omit_empty);
        } else if let Some(container) = &level.container {
            if let Err(error) = guarded(|| ser::marshal_container(container, value, &mut out, &options)) {
                errors.push(container.error(error));
            }
        }

        for field in &level.tagged {
            if let Err(error) = guarded(|| ser::marshal_field(field, value, &mut out, &options)) {
                errors.push(field.error(error));
            }
        }

        if !errors.is_empty() {
            return Err(ParsingError::new(errors).into());
        }
        debug!(record = meta.type_name(), labels = out.len(), "marshaled");
        Ok(out)
    }

    /// Writes the labels found in `input` into `target`.
    ///
    /// `input` is a label map ([`Labels`], `HashMap`, `BTreeMap` or
    /// `IndexMap` of strings) or any type with a label getter.
    pub fn unmarshal<I: Reflect, T: Reflect>(&self, input: &I, target: &mut T) -> Result<()> {
        let labels = self.input_labels(input)?;
        let meta = Meta::root(T::shape());
        debug!(record = meta.type_name(), labels = labels.len(), "unmarshaling");

        if let Some(set) = de::select_labels(de::SELF_UNMARSHALERS, &meta) {
            trace!(record = meta.type_name(), "unmarshaling itself");
            return guarded_record(&meta, || {
                meta.update(target, &mut |slot| set(slot, labels.clone(), &self.options))
            });
        }
        let setter = de::select_labels(de::RECORD_UNMARSHALERS, &meta);
        if !meta.is_record() {
            return match setter {
                Some(set) => guarded_record(&meta, || {
                    meta.update(target, &mut |slot| set(slot, labels.clone(), &self.options))
                }),
                None => Err(not_labelable(&meta)),
            };
        }

        let mut level = resolve_record(&meta, Direction::Unmarshal, &self.options)?;
        if level.container.is_none() && setter.is_none() {
            return Err(Error::MissingContainer(meta.type_name().to_string()));
        }
        let options = level.options(&self.options);

        let mut remaining = labels.clone();
        let mut errors = Vec::new();
        for field in &mut level.tagged {
            match guarded(|| de::unmarshal_field(field, target, &labels, &options)) {
                Ok(Some(key)) if !field.keep(&options) => {
                    trace!(path = field.path(), key = key.as_str(), "discarding label");
                    remaining.remove(&key);
                }
                Ok(_) => {}
                Err(error) => errors.push(field.error(error)),
            }
        }
        if !errors.is_empty() {
            return Err(ParsingError::new(errors).into());
        }

        if let Some(set) = setter {
            guarded_record(&meta, || {
                meta.update(target, &mut |slot| set(slot, remaining.clone(), &options))
            })?;
        } else if let Some(container) = level.container.as_mut() {
            guarded(|| de::unmarshal_container(container, target, remaining, &options))
                .map_err(|error| Error::from(ParsingError::new(vec![container.error(error)])))?;
        }

        debug!(
            record = meta.type_name(),
            set = level.tagged.iter().filter(|field| field.was_set).count(),
            "unmarshaled"
        );
        Ok(())
    }

    fn input_labels<I: Reflect>(&self, input: &I) -> Result<Labels> {
        let meta = Meta::root(I::shape());
        let invalid = || Error::InvalidInput(meta.type_name().to_string());
        let value = meta.value(input)?.ok_or_else(invalid)?;
        match ser::select_labels(ser::INPUT_MARSHALERS, &meta) {
            Some(get) => guarded_record(&meta, || get(value, &self.options)),
            None => Err(invalid()),
        }
    }
}

/// Runs a record-level unit. A panic in it is reported like a field's,
/// under the record's type name.
fn guarded_record<T>(meta: &Meta, work: impl FnOnce() -> Result<T>) -> Result<T> {
    guarded(work).map_err(|error| match error {
        Error::Panicked(_) => {
            ParsingError::new(vec![FieldError::new(meta.type_name(), "", "", error)]).into()
        }
        other => other,
    })
}

fn not_labelable(meta: &Meta) -> Error {
    Error::InvalidValue(format!(
        "{} is not a record and has no label capability",
        meta.type_name()
    ))
}
