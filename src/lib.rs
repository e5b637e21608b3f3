//! # labeler
//!
//! Tag-driven conversion between flat string label maps and nested Rust
//! records.
//!
//! ## What is it for?
//!
//! Label maps (`map[string]string` in orchestration systems, environment
//! variables, annotations, metadata headers) are flat and stringly typed.
//! Records are nested and typed. `labeler` moves data between the two using
//! per-field tags, in both directions:
//!
//! - **unmarshal** fills a record from a label map, parsing every tagged
//!   field from its key and handing whatever is left to a single container
//!   field
//! - **marshal** renders a record back into a label map
//!
//! ## Key Features
//!
//! - **Tag modifiers**: `required`, `default:...`, `keep`/`discard`,
//!   `ignorecase`/`casesensitive`, `omitempty`, per-field `format`, `base`
//!   and `split`
//! - **Typed values**: integers in any base, floats and complex numbers in Go
//!   formats (`b e E f g G x X`), chrono times with strftime layouts,
//!   durations, big integers, and anything with `Display`/`FromStr`
//! - **Collections**: `Vec<T>` and `[T; N]` split on a separator
//! - **Nested records**: reached through plain fields, `Option` or `Box`,
//!   with `Option` allocated on first write
//! - **Capabilities**: types can produce or consume whole label maps
//!   themselves (see [`capability`])
//! - **Concurrent resolution**: fields are resolved in parallel on the rayon
//!   pool, and every field error is reported together in a [`ParsingError`]
//!
//! ## Quick Start
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! labeler = "0.1"
//! ```
//!
//! ### Unmarshal and marshal
//!
//! ```rust
//! use labeler::{labeled, labels, marshal, unmarshal, Labels};
//!
//! labeled! {
//!     #[derive(Debug, Default)]
//!     pub struct Pod {
//!         #[label = "app,required"]
//!         pub app: String,
//!         #[label = "replicas,default:1"]
//!         pub replicas: u32,
//!         #[label = "ports,split:|"]
//!         pub ports: Vec<u16>,
//!         #[label = "*"]
//!         pub rest: Labels,
//!     }
//! }
//!
//! let input = labels! {
//!     "app" => "checkout",
//!     "ports" => "80|443",
//!     "team" => "payments",
//! };
//!
//! let mut pod = Pod::default();
//! unmarshal(&input, &mut pod).unwrap();
//! assert_eq!(pod.app, "checkout");
//! assert_eq!(pod.replicas, 1);
//! assert_eq!(pod.ports, vec![80, 443]);
//! assert_eq!(pod.rest.get("team"), Some("payments"));
//!
//! let output = marshal(&pod).unwrap();
//! assert_eq!(output.get("ports"), Some("80|443"));
//! assert_eq!(output.get("replicas"), Some("1"));
//! ```
//!
//! ### Nested records
//!
//! Untagged record fields are traversed; their tagged fields map to keys of
//! the same flat map.
//!
//! ```rust
//! use labeler::{labeled, labels, unmarshal};
//! use std::collections::HashMap;
//!
//! labeled! {
//!     #[derive(Debug, Default)]
//!     pub struct Limits {
//!         #[label = "cpu"]
//!         pub cpu: f64,
//!     }
//! }
//!
//! labeled! {
//!     #[derive(Debug, Default)]
//!     pub struct Container {
//!         #[label = "image"]
//!         pub image: String,
//!         pub limits: Option<Limits>,
//!         #[label = "*"]
//!         pub labels: HashMap<String, String>,
//!     }
//! }
//!
//! let mut container = Container::default();
//! unmarshal(&labels! { "image" => "nginx", "cpu" => "0.5" }, &mut container).unwrap();
//! assert_eq!(container.limits.map(|l| l.cpu), Some(0.5));
//! ```
//!
//! ### Custom options
//!
//! ```rust
//! use labeler::{labeled, labels, unmarshal_with_options, Options};
//!
//! labeled! {
//!     #[derive(Default)]
//!     pub struct Flags {
//!         #[env = "VERBOSE;default=false"]
//!         pub verbose: bool,
//!         #[env = "*"]
//!         pub rest: labeler::Labels,
//!     }
//! }
//!
//! let options = Options::new()
//!     .with_tag("env")
//!     .with_separator(";")
//!     .with_assignment("=");
//!
//! let mut flags = Flags::default();
//! unmarshal_with_options(&labels! { "VERBOSE" => "true" }, &mut flags, options).unwrap();
//! assert!(flags.verbose);
//! ```
//!
//! ## Tags
//!
//! ```text
//! tag      := key ("," modifier)*
//! key      := label key | "*"
//! modifier := flag | name ":" value
//! ```
//!
//! The separator, the assignment and every modifier name are configurable
//! through [`Options`]. See [`Tag`] for the modifiers.
//!
//! ## Error Handling
//!
//! Problems with single fields are collected and returned together:
//!
//! ```rust
//! use labeler::{labeled, labels, unmarshal, Error};
//!
//! labeled! {
//!     #[derive(Default)]
//!     pub struct Quota {
//!         #[label = "max,required"]
//!         pub max: u32,
//!         #[label = "min"]
//!         pub min: u32,
//!         #[label = "*"]
//!         pub rest: labeler::Labels,
//!     }
//! }
//!
//! let mut quota = Quota::default();
//! match unmarshal(&labels! { "min" => "low" }, &mut quota) {
//!     Err(Error::Parsing(err)) => {
//!         assert_eq!(err.errors.len(), 2);
//!         assert!(err.field("max").is_some());
//!         assert!(err.field("min").is_some());
//!     }
//!     other => panic!("unexpected result: {:?}", other),
//! }
//! ```

#[macro_use]
mod macros;

pub mod capability;
mod de;
pub mod error;
mod field;
mod format;
mod known;
mod labeler;
pub mod map;
mod meta;
pub mod options;
pub mod reflect;
mod ser;
pub mod tag;
mod traverse;

pub use capability::{
    GenericLabelee, GenericallyLabeled, Labeled, Labelee, MarshalLabels,
    MarshalLabelsWithOptions, StrictLabelee, UnmarshalLabels, UnmarshalLabelsWithOptions,
};
pub use error::{Error, FieldError, ParsingError, Result};
pub use format::Format;
pub use crate::labeler::Labeler;
pub use map::Labels;
pub use options::{Options, Token};
pub use reflect::{Capability, FieldDef, Kind, Record, Reflect, Shape, ShapeBuilder};
pub use tag::Tag;

/// Marshals `value` into a label map with the default options.
///
/// # Examples
///
/// ```rust
/// use labeler::{labeled, marshal};
///
/// labeled! {
///     pub struct Node {
///         #[label = "arch"]
///         pub arch: String,
///         #[label = "cores,base:16"]
///         pub cores: u32,
///     }
/// }
///
/// let node = Node { arch: "arm64".to_string(), cores: 32 };
/// let labels = marshal(&node).unwrap();
/// assert_eq!(labels.get("arch"), Some("arm64"));
/// assert_eq!(labels.get("cores"), Some("20"));
/// ```
///
/// # Errors
///
/// Returns an error if the value is not labelable, if its structure is
/// invalid (two containers) or if any field fails to render.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn marshal<T: Reflect>(value: &T) -> Result<Labels> {
    Labeler::new().marshal(value)
}

/// Marshals `value` into a label map with custom options.
///
/// # Errors
///
/// Returns an error if the options are invalid, or as [`marshal`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn marshal_with_options<T: Reflect>(value: &T, options: Options) -> Result<Labels> {
    Labeler::with_options(options)?.marshal(value)
}

/// Unmarshals the labels in `input` into `target` with the default options.
///
/// `input` is a label map ([`Labels`], `HashMap<String, String>`,
/// `BTreeMap<String, String>` or `IndexMap<String, String>`) or any type
/// declaring [`Labeled`] or [`GenericallyLabeled`].
///
/// # Errors
///
/// Returns an error if the input is not a label map, if the target has no
/// container field and no label setter, if its structure is invalid, or if
/// any field fails to parse.
pub fn unmarshal<I: Reflect, T: Reflect>(input: &I, target: &mut T) -> Result<()> {
    Labeler::new().unmarshal(input, target)
}

/// Unmarshals the labels in `input` into `target` with custom options.
///
/// # Errors
///
/// Returns an error if the options are invalid, or as [`unmarshal`].
pub fn unmarshal_with_options<I: Reflect, T: Reflect>(
    input: &I,
    target: &mut T,
    options: Options,
) -> Result<()> {
    Labeler::with_options(options)?.unmarshal(input, target)
}
