//! Concurrent traversal of a record tree.
//!
//! Every field of a record is resolved in its own task on the rayon pool.
//! Nested records are traversed by the task that found them, and each task
//! reports exactly one [`Outcome`] over a bounded channel sized to the field
//! count, so no sender can block. The scope joins every task before the
//! channel is drained.
//!
//! Merging follows two rules:
//!
//! - field errors are collected, never short-circuited, and errors from a
//!   nested record get the holding field's name prefixed to their path
//! - more than one container across a record and the records nested in it
//!   is a hard error, as is any hard error reported by a nested traversal
//!
//! Results are put back into declaration order before they are returned.

use crate::error::{Error, FieldError, ParsingError, Result};
use crate::field::{resolve, Direction, Field, Resolved};
use crate::meta::Meta;
use crate::options::Options;
use crate::reflect::FieldDef;
use crossbeam_channel::bounded;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, trace, warn};

/// The resolved fields of one record and everything nested in it.
#[derive(Debug, Default)]
pub(crate) struct Level {
    pub(crate) tagged: Vec<Field>,
    pub(crate) container: Option<Field>,
    pub(crate) errors: Vec<FieldError>,
}

impl Level {
    /// The options in effect once the container's tag is applied.
    pub(crate) fn options(&self, base: &Options) -> Options {
        match self.container.as_ref().and_then(|c| c.tag.as_ref()) {
            Some(tag) => base.with_container_tag(tag),
            None => base.clone(),
        }
    }
}

enum Outcome {
    Tagged(Field),
    Container(Field),
    Nested {
        name: &'static str,
        position: Vec<usize>,
        level: Result<Level>,
    },
    Failed {
        position: Vec<usize>,
        error: FieldError,
    },
    Skipped,
}

/// Traverses the record at `meta` and reports field errors as a single
/// [`ParsingError`].
pub(crate) fn resolve_record(meta: &Meta, direction: Direction, options: &Options) -> Result<Level> {
    let level = traverse(meta, &[], direction, options)?;
    if !level.errors.is_empty() {
        warn!(
            record = meta.type_name(),
            errors = level.errors.len(),
            "field resolution failed"
        );
        return Err(ParsingError::new(level.errors).into());
    }
    Ok(level)
}

pub(crate) fn traverse(
    meta: &Meta,
    position: &[usize],
    direction: Direction,
    options: &Options,
) -> Result<Level> {
    let defs = meta.record_fields().unwrap_or_default();
    debug!(
        record = meta.type_name(),
        path = meta.path(),
        fields = defs.len(),
        "traversing record"
    );

    let (sender, receiver) = bounded(defs.len());
    rayon::scope(|scope| {
        for (index, def) in defs.iter().enumerate() {
            let sender = sender.clone();
            scope.spawn(move |_| {
                let mut at = position.to_vec();
                at.push(index);
                let outcome = visit(meta, def, at, direction, options);
                // the receiver outlives the scope
                let _ = sender.send(outcome);
            });
        }
    });
    drop(sender);

    let mut level = Level::default();
    let mut containers = Vec::new();
    let mut errors = Vec::new();
    let mut faults = Vec::new();
    for outcome in receiver.try_iter() {
        match outcome {
            Outcome::Tagged(field) => {
                trace!(path = field.path(), key = field.key.as_str(), "tagged field");
                level.tagged.push(field);
            }
            Outcome::Container(field) => {
                trace!(path = field.path(), "container field");
                containers.push(field);
            }
            Outcome::Nested {
                name,
                position,
                level: Ok(child),
            } => {
                level.tagged.extend(child.tagged);
                containers.extend(child.container);
                errors.extend(child.errors.into_iter().map(|error| {
                    let at = position.clone();
                    (at, error.nested(name))
                }));
            }
            Outcome::Nested {
                position,
                level: Err(error),
                ..
            } => faults.push((position, error)),
            Outcome::Failed { position, error } => {
                if is_structural(error.cause()) {
                    faults.push((position, error.cause().clone()));
                } else {
                    errors.push((position, error));
                }
            }
            Outcome::Skipped => {}
        }
    }

    faults.sort_by(|a, b| a.0.cmp(&b.0));
    if let Some((_, fault)) = faults.into_iter().next() {
        warn!(record = meta.type_name(), error = %fault, "traversal aborted");
        return Err(fault);
    }

    containers.sort_by(|a, b| a.position.cmp(&b.position));
    let mut containers = containers.into_iter();
    level.container = containers.next();
    if let (Some(first), Some(second)) = (&level.container, containers.next()) {
        let error = Error::MultipleContainers {
            first: first.path().to_string(),
            second: second.path().to_string(),
        };
        warn!(record = meta.type_name(), error = %error, "traversal aborted");
        return Err(error);
    }

    level.tagged.sort_by(|a, b| a.position.cmp(&b.position));
    errors.sort_by(|a, b| a.0.cmp(&b.0));
    level.errors = errors.into_iter().map(|(_, error)| error).collect();

    debug!(
        record = meta.type_name(),
        tagged = level.tagged.len(),
        container = level.container.is_some(),
        errors = level.errors.len(),
        "traversed record"
    );
    Ok(level)
}

fn visit(
    parent: &Meta,
    def: &FieldDef,
    position: Vec<usize>,
    direction: Direction,
    options: &Options,
) -> Outcome {
    let attempt = guarded(|| {
        Ok(match resolve(parent, def, position.clone(), direction, options) {
            Ok(Resolved::Tagged(field)) => Outcome::Tagged(field),
            Ok(Resolved::Container(field)) => Outcome::Container(field),
            Ok(Resolved::Nested(meta)) => Outcome::Nested {
                name: def.name(),
                position: position.clone(),
                level: traverse(&meta, &position, direction, options),
            },
            Ok(Resolved::Skipped) => Outcome::Skipped,
            Err(error) => Outcome::Failed {
                position: position.clone(),
                error,
            },
        })
    });
    attempt.unwrap_or_else(|error| Outcome::Failed {
        error: FieldError::new(def.name(), "", def.lookup(&options.tag).unwrap_or(""), error),
        position,
    })
}

/// Errors that abort the traversal instead of being collected.
fn is_structural(error: &Error) -> bool {
    matches!(
        error,
        Error::MultipleContainers { .. } | Error::InvalidContainer(_)
    )
}

/// Runs `work`, turning a panic into [`Error::Panicked`].
pub(crate) fn guarded<T>(work: impl FnOnce() -> Result<T>) -> Result<T> {
    panic::catch_unwind(AssertUnwindSafe(work)).unwrap_or_else(|payload| {
        let message = panic_message(payload.as_ref());
        warn!(panic = message.as_str(), "recovered from a panic");
        Err(Error::Panicked(message))
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
