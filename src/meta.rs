//! The reflection facade.
//!
//! A [`Meta`] is a type-level view of one position inside a record tree: the
//! shape found there (with any `Option`/`Box` layers already looked through),
//! the dotted path to it, and the hops that lead from the top-level value to
//! it. Traversal works on metas only, never on values, so it can run on any
//! thread. Values are reached afterwards by replaying the hops against the
//! live record:
//!
//! - [`Meta::value`] follows the hops for reading and stops at the first
//!   empty pointer.
//! - [`Meta::update`] follows them for writing. An empty pointer is bridged
//!   with a freshly allocated value, which is stored back only after the
//!   write succeeded.

use crate::error::{Error, Result};
use crate::reflect::{
    CollectionVTable, Def, FieldDef, Kind, MapVTable, PointerVTable, Project, Shape,
};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) enum Hop {
    Field(Arc<dyn Project>),
    Deref(PointerVTable),
}

#[derive(Clone)]
pub(crate) struct Meta {
    shape: Shape,
    hops: Vec<Hop>,
    path: String,
    exported: bool,
}

impl Meta {
    /// The view of a top-level value of `shape`.
    pub(crate) fn root(shape: Shape) -> Meta {
        Meta {
            shape,
            hops: Vec::new(),
            path: String::new(),
            exported: true,
        }
        .deref()
    }

    /// The view of a field of this record.
    pub(crate) fn field(&self, def: &FieldDef) -> Meta {
        let path = if self.path.is_empty() {
            def.name.to_string()
        } else {
            format!("{}.{}", self.path, def.name)
        };
        let mut hops = self.hops.clone();
        hops.push(Hop::Field(Arc::clone(&def.access)));
        Meta {
            shape: (def.shape)(),
            hops,
            path,
            exported: def.exported,
        }
        .deref()
    }

    /// The view of this collection's element type.
    ///
    /// Elements are reached through the collection itself, so the element
    /// view only carries the hops through pointer elements such as
    /// `Option<T>` or `Box<T>`.
    pub(crate) fn element(&self) -> Option<Meta> {
        let collection = self.collection()?;
        Some(
            Meta {
                shape: (collection.element)(),
                hops: Vec::new(),
                path: self.path.clone(),
                exported: self.exported,
            }
            .deref(),
        )
    }

    fn deref(mut self) -> Meta {
        while let Def::Pointer(pointer) = self.shape.def {
            self.hops.push(Hop::Deref(pointer));
            self.shape = (pointer.pointee)();
        }
        self
    }

    pub(crate) fn shape(&self) -> &Shape {
        &self.shape
    }

    pub(crate) fn kind(&self) -> Kind {
        self.shape.kind()
    }

    pub(crate) fn type_name(&self) -> &'static str {
        self.shape.type_name()
    }

    pub(crate) fn path(&self) -> &str {
        &self.path
    }

    pub(crate) fn is_exported(&self) -> bool {
        self.exported
    }

    pub(crate) fn record_fields(&self) -> Option<Vec<FieldDef>> {
        match self.shape.def {
            Def::Record(fields) => Some(fields()),
            _ => None,
        }
    }

    pub(crate) fn is_record(&self) -> bool {
        matches!(self.shape.def, Def::Record(_))
    }

    pub(crate) fn collection(&self) -> Option<CollectionVTable> {
        match self.shape.def {
            Def::Collection(collection) => Some(collection),
            _ => None,
        }
    }

    pub(crate) fn map(&self) -> Option<MapVTable> {
        match self.shape.def {
            Def::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Reads the value at this position, or `None` when an empty pointer
    /// lies on the way.
    pub(crate) fn value<'a>(&self, root: &'a dyn Any) -> Result<Option<&'a dyn Any>> {
        let mut current = root;
        for hop in &self.hops {
            current = match hop {
                Hop::Field(project) => project.project(current).ok_or_else(|| self.mismatch())?,
                Hop::Deref(pointer) => match (pointer.deref)(current) {
                    Some(inner) => inner,
                    None => return Ok(None),
                },
            };
        }
        Ok(Some(current))
    }

    /// Runs `write` against the value at this position, allocating through
    /// empty pointers.
    pub(crate) fn update(
        &self,
        root: &mut dyn Any,
        write: &mut dyn FnMut(&mut dyn Any) -> Result<()>,
    ) -> Result<()> {
        self.write_through(&self.hops, root, write)
    }

    fn write_through(
        &self,
        hops: &[Hop],
        current: &mut dyn Any,
        write: &mut dyn FnMut(&mut dyn Any) -> Result<()>,
    ) -> Result<()> {
        let Some((hop, rest)) = hops.split_first() else {
            return write(current);
        };
        match hop {
            Hop::Field(project) => {
                let next = project.project_mut(current).ok_or_else(|| self.mismatch())?;
                self.write_through(rest, next, write)
            }
            Hop::Deref(pointer) => {
                if let Some(inner) = (pointer.deref_mut)(current) {
                    return self.write_through(rest, inner, write);
                }
                let mut fresh = (pointer.alloc)()?;
                self.write_through(rest, fresh.as_mut(), write)?;
                (pointer.store)(current, fresh)
            }
        }
    }

    fn mismatch(&self) -> Error {
        Error::InvalidValue(format!(
            "value does not match the record holding {}",
            self.path
        ))
    }
}

impl fmt::Debug for Meta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Meta")
            .field("path", &self.path)
            .field("shape", &self.shape)
            .finish()
    }
}
