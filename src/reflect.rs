//! Type descriptors.
//!
//! Rust has no runtime field reflection, so every type that takes part in
//! labeling describes itself through [`Reflect::shape`]. A [`Shape`] carries:
//!
//! - the type's identity: type id, full type name, and a declaring package
//!   plus short name used to recognize well-known types
//! - its [`Kind`]: a primitive, a record, a pointer, a collection, a map or
//!   an opaque type
//! - the access functions that kind needs (dereferencing and allocating a
//!   pointer, indexing and resizing a collection, reading and replacing a map)
//! - the capability traits the type declares (see [`crate::capability`])
//!
//! Records additionally implement [`Record`], returning one [`FieldDef`] per
//! field. The [`labeled!`](crate::labeled) macro writes both impls from a
//! struct definition.
//!
//! ## Examples
//!
//! ```rust
//! use labeler::{FieldDef, Kind, Labeled, Labels, Record, Reflect, Shape};
//!
//! #[derive(Default)]
//! struct Node {
//!     name: String,
//! }
//!
//! impl Labeled for Node {
//!     fn labels(&self) -> Labels {
//!         [("node", self.name.as_str())].into_iter().collect()
//!     }
//! }
//!
//! impl Record for Node {
//!     fn fields() -> Vec<FieldDef> {
//!         vec![FieldDef::new::<Node, String>("name", |n| &n.name, |n| &mut n.name).tag("label", "name")]
//!     }
//! }
//!
//! impl Reflect for Node {
//!     fn shape() -> Shape {
//!         Shape::builder::<Self>().record().labeled().build()
//!     }
//! }
//!
//! let shape = Node::shape();
//! assert_eq!(shape.kind(), Kind::Record);
//! assert_eq!(shape.name(), "Node");
//! ```

use crate::capability::{
    GenericLabelee, GenericallyLabeled, Labeled, Labelee, MarshalLabels,
    MarshalLabelsWithOptions, StrictLabelee, UnmarshalLabels, UnmarshalLabelsWithOptions,
};
use crate::error::{Error, Result};
use crate::map::Labels;
use crate::options::Options;
use indexmap::IndexMap;
use num_complex::Complex;
use std::any::{type_name, Any, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use std::sync::Arc;

/// A type that can describe itself for labeling.
pub trait Reflect: Any + Sized {
    fn shape() -> Shape;
}

/// A type with labeled fields.
pub trait Record: Reflect {
    fn fields() -> Vec<FieldDef>;
}

/// The broad category of a type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    Isize,
    U8,
    U16,
    U32,
    U64,
    Usize,
    F32,
    F64,
    Complex32,
    Complex64,
    String,
    Record,
    Pointer,
    Collection,
    Map,
    Opaque,
}

/// A capability trait a shape may declare.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Capability {
    Labeled,
    GenericallyLabeled,
    Labelee,
    StrictLabelee,
    GenericLabelee,
    MarshalLabels,
    MarshalLabelsWithOptions,
    UnmarshalLabels,
    UnmarshalLabelsWithOptions,
    Display,
    FromStr,
}

pub(crate) type GetLabels = fn(&dyn Any, &Options) -> Result<Labels>;
pub(crate) type SetLabels = fn(&mut dyn Any, Labels, &Options) -> Result<()>;
pub(crate) type ToText = fn(&dyn Any) -> Result<String>;
pub(crate) type FromText = fn(&mut dyn Any, &str) -> Result<()>;

#[derive(Clone, Copy, Default)]
pub(crate) struct Capabilities {
    pub marshal_with_options: Option<GetLabels>,
    pub marshal: Option<GetLabels>,
    pub generically_labeled: Option<GetLabels>,
    pub labeled: Option<GetLabels>,
    pub unmarshal_with_options: Option<SetLabels>,
    pub unmarshal: Option<SetLabels>,
    pub generic_labelee: Option<SetLabels>,
    pub strict_labelee: Option<SetLabels>,
    pub labelee: Option<SetLabels>,
    pub to_text: Option<ToText>,
    pub from_text: Option<FromText>,
}

/// Access to the value behind `Option<T>` or `Box<T>`.
#[derive(Clone, Copy)]
pub(crate) struct PointerVTable {
    pub pointee: fn() -> Shape,
    pub deref: fn(&dyn Any) -> Option<&dyn Any>,
    pub deref_mut: fn(&mut dyn Any) -> Option<&mut dyn Any>,
    pub alloc: fn() -> Result<Box<dyn Any>>,
    pub store: fn(&mut dyn Any, Box<dyn Any>) -> Result<()>,
}

/// Indexed access to `Vec<T>` and `[T; N]`.
#[derive(Clone, Copy)]
pub(crate) struct CollectionVTable {
    pub element: fn() -> Shape,
    pub len: fn(&dyn Any) -> usize,
    pub get: fn(&dyn Any, usize) -> Option<&dyn Any>,
    pub get_mut: fn(&mut dyn Any, usize) -> Option<&mut dyn Any>,
    pub resize: fn(&mut dyn Any, usize) -> Result<()>,
}

/// Whole-map access to string maps.
#[derive(Clone, Copy)]
pub(crate) struct MapVTable {
    pub get: fn(&dyn Any) -> Result<Labels>,
    pub set: fn(&mut dyn Any, Labels) -> Result<()>,
}

#[derive(Clone, Copy)]
pub(crate) enum Def {
    Scalar,
    Record(fn() -> Vec<FieldDef>),
    Pointer(PointerVTable),
    Collection(CollectionVTable),
    Map(MapVTable),
}

/// The description of a type.
#[derive(Clone)]
pub struct Shape {
    pub(crate) type_id: TypeId,
    pub(crate) type_name: &'static str,
    pub(crate) package: &'static str,
    pub(crate) name: &'static str,
    pub(crate) kind: Kind,
    pub(crate) def: Def,
    pub(crate) caps: Capabilities,
}

impl Shape {
    /// Starts describing `T`.
    #[must_use]
    pub fn builder<T: Any>() -> ShapeBuilder<T> {
        ShapeBuilder::new()
    }

    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// The full type name, as reported by [`std::any::type_name`].
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The declaring package (module path) of the type.
    #[must_use]
    pub fn package(&self) -> &'static str {
        self.package
    }

    /// The short type name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Whether the shape declares `capability`.
    #[must_use]
    pub fn implements(&self, capability: Capability) -> bool {
        let caps = &self.caps;
        match capability {
            Capability::Labeled => caps.labeled.is_some(),
            Capability::GenericallyLabeled => caps.generically_labeled.is_some(),
            Capability::Labelee => caps.labelee.is_some(),
            Capability::StrictLabelee => caps.strict_labelee.is_some(),
            Capability::GenericLabelee => caps.generic_labelee.is_some(),
            Capability::MarshalLabels => caps.marshal.is_some(),
            Capability::MarshalLabelsWithOptions => caps.marshal_with_options.is_some(),
            Capability::UnmarshalLabels => caps.unmarshal.is_some(),
            Capability::UnmarshalLabelsWithOptions => caps.unmarshal_with_options.is_some(),
            Capability::Display => caps.to_text.is_some(),
            Capability::FromStr => caps.from_text.is_some(),
        }
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shape")
            .field("type_name", &self.type_name)
            .field("kind", &self.kind)
            .finish()
    }
}

impl PartialEq for Shape {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

/// Builds a [`Shape`] for `T`.
///
/// Capability methods are only available when `T` implements the matching
/// trait.
pub struct ShapeBuilder<T> {
    shape: Shape,
    marker: PhantomData<fn() -> T>,
}

impl<T: Any> ShapeBuilder<T> {
    fn new() -> Self {
        let full = type_name::<T>();
        let (package, name) = split_type_name(full);
        ShapeBuilder {
            shape: Shape {
                type_id: TypeId::of::<T>(),
                type_name: full,
                package,
                name,
                kind: Kind::Opaque,
                def: Def::Scalar,
                caps: Capabilities::default(),
            },
            marker: PhantomData,
        }
    }

    /// Overrides the package and short name the type is recognized by.
    #[must_use]
    pub fn named(mut self, package: &'static str, name: &'static str) -> Self {
        self.shape.package = package;
        self.shape.name = name;
        self
    }

    pub(crate) fn kind(mut self, kind: Kind) -> Self {
        self.shape.kind = kind;
        self
    }

    pub(crate) fn def(mut self, def: Def) -> Self {
        self.shape.def = def;
        self
    }

    /// Marks `T` as a record whose fields take part in labeling.
    #[must_use]
    pub fn record(self) -> Self
    where
        T: Record,
    {
        self.kind(Kind::Record).def(Def::Record(T::fields))
    }

    #[must_use]
    pub fn labeled(mut self) -> Self
    where
        T: Labeled,
    {
        self.shape.caps.labeled = Some(get_labeled::<T>);
        self
    }

    #[must_use]
    pub fn generically_labeled(mut self) -> Self
    where
        T: GenericallyLabeled,
    {
        self.shape.caps.generically_labeled = Some(get_generically_labeled::<T>);
        self
    }

    #[must_use]
    pub fn labelee(mut self) -> Self
    where
        T: Labelee,
    {
        self.shape.caps.labelee = Some(set_labelee::<T>);
        self
    }

    #[must_use]
    pub fn strict_labelee(mut self) -> Self
    where
        T: StrictLabelee,
    {
        self.shape.caps.strict_labelee = Some(set_strict_labelee::<T>);
        self
    }

    #[must_use]
    pub fn generic_labelee(mut self) -> Self
    where
        T: GenericLabelee,
    {
        self.shape.caps.generic_labelee = Some(set_generic_labelee::<T>);
        self
    }

    #[must_use]
    pub fn marshal_labels(mut self) -> Self
    where
        T: MarshalLabels,
    {
        self.shape.caps.marshal = Some(get_marshal::<T>);
        self
    }

    #[must_use]
    pub fn marshal_labels_with_options(mut self) -> Self
    where
        T: MarshalLabelsWithOptions,
    {
        self.shape.caps.marshal_with_options = Some(get_marshal_with_options::<T>);
        self
    }

    #[must_use]
    pub fn unmarshal_labels(mut self) -> Self
    where
        T: UnmarshalLabels,
    {
        self.shape.caps.unmarshal = Some(set_unmarshal::<T>);
        self
    }

    #[must_use]
    pub fn unmarshal_labels_with_options(mut self) -> Self
    where
        T: UnmarshalLabelsWithOptions,
    {
        self.shape.caps.unmarshal_with_options = Some(set_unmarshal_with_options::<T>);
        self
    }

    /// Renders `T` with its `Display` impl when marshaling.
    #[must_use]
    pub fn display(mut self) -> Self
    where
        T: fmt::Display,
    {
        self.shape.caps.to_text = Some(to_text::<T>);
        self
    }

    /// Parses `T` with its `FromStr` impl when unmarshaling.
    #[must_use]
    pub fn parse(mut self) -> Self
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        self.shape.caps.from_text = Some(from_text::<T>);
        self
    }

    /// Both [`display`](Self::display) and [`parse`](Self::parse).
    #[must_use]
    pub fn text(self) -> Self
    where
        T: fmt::Display + FromStr,
        T::Err: fmt::Display,
    {
        self.display().parse()
    }

    #[must_use]
    pub fn build(self) -> Shape {
        self.shape
    }
}

/// `a::b::Name<c::D>` becomes `("a::b", "Name<c::D>")`.
fn split_type_name(full: &'static str) -> (&'static str, &'static str) {
    let base_len = full.find('<').unwrap_or(full.len());
    match full[..base_len].rfind("::") {
        Some(i) => (&full[..i], &full[i + 2..]),
        None => ("", full),
    }
}

pub(crate) fn downcast_ref<T: Any>(value: &dyn Any) -> Result<&T> {
    value
        .downcast_ref::<T>()
        .ok_or_else(|| Error::InvalidValue(format!("expected a {}", type_name::<T>())))
}

pub(crate) fn downcast_mut<T: Any>(value: &mut dyn Any) -> Result<&mut T> {
    value
        .downcast_mut::<T>()
        .ok_or_else(|| Error::InvalidValue(format!("expected a {}", type_name::<T>())))
}

fn get_labeled<T: Labeled + Any>(value: &dyn Any, _: &Options) -> Result<Labels> {
    Ok(downcast_ref::<T>(value)?.labels())
}

fn get_generically_labeled<T: GenericallyLabeled + Any>(
    value: &dyn Any,
    options: &Options,
) -> Result<Labels> {
    Ok(downcast_ref::<T>(value)?.labels_for(&options.tag))
}

fn get_marshal<T: MarshalLabels + Any>(value: &dyn Any, _: &Options) -> Result<Labels> {
    downcast_ref::<T>(value)?.marshal_labels()
}

fn get_marshal_with_options<T: MarshalLabelsWithOptions + Any>(
    value: &dyn Any,
    options: &Options,
) -> Result<Labels> {
    downcast_ref::<T>(value)?.marshal_labels_with(options)
}

fn set_labelee<T: Labelee + Any>(value: &mut dyn Any, labels: Labels, _: &Options) -> Result<()> {
    downcast_mut::<T>(value)?.set_labels(labels);
    Ok(())
}

fn set_strict_labelee<T: StrictLabelee + Any>(
    value: &mut dyn Any,
    labels: Labels,
    _: &Options,
) -> Result<()> {
    downcast_mut::<T>(value)?.try_set_labels(labels)
}

fn set_generic_labelee<T: GenericLabelee + Any>(
    value: &mut dyn Any,
    labels: Labels,
    options: &Options,
) -> Result<()> {
    downcast_mut::<T>(value)?.set_labels_for(labels, &options.tag)
}

fn set_unmarshal<T: UnmarshalLabels + Any>(
    value: &mut dyn Any,
    labels: Labels,
    _: &Options,
) -> Result<()> {
    downcast_mut::<T>(value)?.unmarshal_labels(&labels)
}

fn set_unmarshal_with_options<T: UnmarshalLabelsWithOptions + Any>(
    value: &mut dyn Any,
    labels: Labels,
    options: &Options,
) -> Result<()> {
    downcast_mut::<T>(value)?.unmarshal_labels_with(&labels, options)
}

fn to_text<T: fmt::Display + Any>(value: &dyn Any) -> Result<String> {
    Ok(downcast_ref::<T>(value)?.to_string())
}

fn from_text<T>(value: &mut dyn Any, text: &str) -> Result<()>
where
    T: FromStr + Any,
    T::Err: fmt::Display,
{
    let parsed = text
        .parse::<T>()
        .map_err(|e| Error::conversion(text, type_name::<T>(), e))?;
    *downcast_mut::<T>(value)? = parsed;
    Ok(())
}

// ---------------------------------------------------------------------------
// record fields

/// Projects a record onto one of its fields.
pub(crate) trait Project: Send + Sync {
    fn project<'a>(&self, record: &'a dyn Any) -> Option<&'a dyn Any>;
    fn project_mut<'a>(&self, record: &'a mut dyn Any) -> Option<&'a mut dyn Any>;
}

struct Projection<S, F> {
    get: fn(&S) -> &F,
    get_mut: fn(&mut S) -> &mut F,
}

impl<S: Any, F: Any> Project for Projection<S, F> {
    fn project<'a>(&self, record: &'a dyn Any) -> Option<&'a dyn Any> {
        let record = record.downcast_ref::<S>()?;
        Some((self.get)(record) as &dyn Any)
    }

    fn project_mut<'a>(&self, record: &'a mut dyn Any) -> Option<&'a mut dyn Any> {
        let record = record.downcast_mut::<S>()?;
        Some((self.get_mut)(record) as &mut dyn Any)
    }
}

/// Describes one field of a [`Record`].
///
/// A field carries any number of `(tag name, tag text)` pairs; the tag read
/// at runtime is the one named by [`Options::tag`].
#[derive(Clone)]
pub struct FieldDef {
    pub(crate) name: &'static str,
    pub(crate) tags: Vec<(&'static str, &'static str)>,
    pub(crate) exported: bool,
    pub(crate) shape: fn() -> Shape,
    pub(crate) access: Arc<dyn Project>,
}

impl FieldDef {
    /// Describes the field of `S` reached through `get` and `get_mut`.
    pub fn new<S: Any, F: Reflect>(
        name: &'static str,
        get: fn(&S) -> &F,
        get_mut: fn(&mut S) -> &mut F,
    ) -> Self {
        FieldDef {
            name,
            tags: Vec::new(),
            exported: true,
            shape: F::shape,
            access: Arc::new(Projection { get, get_mut }),
        }
    }

    /// Attaches a tag.
    #[must_use]
    pub fn tag(mut self, name: &'static str, text: &'static str) -> Self {
        self.tags.push((name, text));
        self
    }

    /// Sets whether the field is visible outside its record. Tagged
    /// unexported fields are rejected.
    #[must_use]
    pub fn exported(mut self, exported: bool) -> Self {
        self.exported = exported;
        self
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn is_exported(&self) -> bool {
        self.exported
    }

    /// The text of the tag called `name`, if the field has one.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&'static str> {
        self.tags
            .iter()
            .find(|(tag, _)| *tag == name)
            .map(|(_, text)| *text)
    }
}

impl fmt::Debug for FieldDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDef")
            .field("name", &self.name)
            .field("tags", &self.tags)
            .field("exported", &self.exported)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// built-in shapes

macro_rules! impl_primitive {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl Reflect for $ty {
                fn shape() -> Shape {
                    Shape::builder::<Self>().kind(Kind::$kind).build()
                }
            }
        )*
    };
}

impl_primitive! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    isize => Isize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    usize => Usize,
    f32 => F32,
    f64 => F64,
    String => String,
    Complex<f32> => Complex32,
    Complex<f64> => Complex64,
}

fn option_deref<T: Any>(value: &dyn Any) -> Option<&dyn Any> {
    value
        .downcast_ref::<Option<T>>()?
        .as_ref()
        .map(|inner| inner as &dyn Any)
}

fn option_deref_mut<T: Any>(value: &mut dyn Any) -> Option<&mut dyn Any> {
    value
        .downcast_mut::<Option<T>>()?
        .as_mut()
        .map(|inner| inner as &mut dyn Any)
}

fn alloc_default<T: Any + Default>() -> Result<Box<dyn Any>> {
    Ok(Box::new(T::default()))
}

fn option_store<T: Any>(slot: &mut dyn Any, fresh: Box<dyn Any>) -> Result<()> {
    let fresh = fresh
        .downcast::<T>()
        .map_err(|_| Error::InvalidValue(format!("expected a {}", type_name::<T>())))?;
    *downcast_mut::<Option<T>>(slot)? = Some(*fresh);
    Ok(())
}

impl<T: Reflect + Default> Reflect for Option<T> {
    fn shape() -> Shape {
        Shape::builder::<Self>()
            .kind(Kind::Pointer)
            .def(Def::Pointer(PointerVTable {
                pointee: T::shape,
                deref: option_deref::<T>,
                deref_mut: option_deref_mut::<T>,
                alloc: alloc_default::<T>,
                store: option_store::<T>,
            }))
            .build()
    }
}

fn box_deref<T: Any>(value: &dyn Any) -> Option<&dyn Any> {
    value
        .downcast_ref::<Box<T>>()
        .map(|inner| &**inner as &dyn Any)
}

fn box_deref_mut<T: Any>(value: &mut dyn Any) -> Option<&mut dyn Any> {
    value
        .downcast_mut::<Box<T>>()
        .map(|inner| &mut **inner as &mut dyn Any)
}

fn box_alloc<T: Any>() -> Result<Box<dyn Any>> {
    Err(Error::InvalidValue(format!(
        "cannot allocate a Box<{}>",
        type_name::<T>()
    )))
}

fn box_store<T: Any>(slot: &mut dyn Any, fresh: Box<dyn Any>) -> Result<()> {
    let fresh = fresh
        .downcast::<T>()
        .map_err(|_| Error::InvalidValue(format!("expected a {}", type_name::<T>())))?;
    *downcast_mut::<Box<T>>(slot)? = fresh;
    Ok(())
}

impl<T: Reflect> Reflect for Box<T> {
    fn shape() -> Shape {
        Shape::builder::<Self>()
            .kind(Kind::Pointer)
            .def(Def::Pointer(PointerVTable {
                pointee: T::shape,
                deref: box_deref::<T>,
                deref_mut: box_deref_mut::<T>,
                alloc: box_alloc::<T>,
                store: box_store::<T>,
            }))
            .build()
    }
}

fn vec_len<T: Any>(value: &dyn Any) -> usize {
    value.downcast_ref::<Vec<T>>().map_or(0, Vec::len)
}

fn vec_get<T: Any>(value: &dyn Any, index: usize) -> Option<&dyn Any> {
    value
        .downcast_ref::<Vec<T>>()?
        .get(index)
        .map(|element| element as &dyn Any)
}

fn vec_get_mut<T: Any>(value: &mut dyn Any, index: usize) -> Option<&mut dyn Any> {
    value
        .downcast_mut::<Vec<T>>()?
        .get_mut(index)
        .map(|element| element as &mut dyn Any)
}

fn vec_resize<T: Any + Default>(value: &mut dyn Any, len: usize) -> Result<()> {
    let elements = downcast_mut::<Vec<T>>(value)?;
    elements.clear();
    elements.resize_with(len, T::default);
    Ok(())
}

impl<T: Reflect + Default> Reflect for Vec<T> {
    fn shape() -> Shape {
        Shape::builder::<Self>()
            .kind(Kind::Collection)
            .def(Def::Collection(CollectionVTable {
                element: T::shape,
                len: vec_len::<T>,
                get: vec_get::<T>,
                get_mut: vec_get_mut::<T>,
                resize: vec_resize::<T>,
            }))
            .build()
    }
}

fn array_len<T: Any, const N: usize>(_: &dyn Any) -> usize {
    N
}

fn array_get<T: Any, const N: usize>(value: &dyn Any, index: usize) -> Option<&dyn Any> {
    value
        .downcast_ref::<[T; N]>()?
        .get(index)
        .map(|element| element as &dyn Any)
}

fn array_get_mut<T: Any, const N: usize>(value: &mut dyn Any, index: usize) -> Option<&mut dyn Any> {
    value
        .downcast_mut::<[T; N]>()?
        .get_mut(index)
        .map(|element| element as &mut dyn Any)
}

fn array_resize<T: Any, const N: usize>(_: &mut dyn Any, len: usize) -> Result<()> {
    if len > N {
        return Err(Error::conversion(
            &len.to_string(),
            type_name::<[T; N]>(),
            format!("too many elements for an array of length {}", N),
        ));
    }
    Ok(())
}

impl<T: Reflect, const N: usize> Reflect for [T; N] {
    fn shape() -> Shape {
        Shape::builder::<Self>()
            .kind(Kind::Collection)
            .def(Def::Collection(CollectionVTable {
                element: T::shape,
                len: array_len::<T, N>,
                get: array_get::<T, N>,
                get_mut: array_get_mut::<T, N>,
                resize: array_resize::<T, N>,
            }))
            .build()
    }
}

fn map_get<M>(value: &dyn Any) -> Result<Labels>
where
    M: Any + Clone,
    Labels: From<M>,
{
    Ok(Labels::from(downcast_ref::<M>(value)?.clone()))
}

fn map_set<M>(value: &mut dyn Any, labels: Labels) -> Result<()>
where
    M: Any + From<Labels>,
{
    *downcast_mut::<M>(value)? = M::from(labels);
    Ok(())
}

macro_rules! impl_map {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Reflect for $ty {
                fn shape() -> Shape {
                    Shape::builder::<Self>()
                        .kind(Kind::Map)
                        .def(Def::Map(MapVTable {
                            get: map_get::<$ty>,
                            set: map_set::<$ty>,
                        }))
                        .build()
                }
            }
        )*
    };
}

impl_map! {
    Labels,
    HashMap<String, String>,
    BTreeMap<String, String>,
    IndexMap<String, String>,
}
