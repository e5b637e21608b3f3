//! Capability traits a type can implement to take part in labeling.
//!
//! Capabilities are declared on a type's [`Shape`](crate::Shape) (see
//! [`ShapeBuilder`](crate::ShapeBuilder) or the `@capabilities(...)` clause of
//! [`labeled!`](crate::labeled)). Implementing a trait without declaring it has
//! no effect, because dispatch looks at the shape, not at the trait.
//!
//! | Trait                          | Used for                                   |
//! |--------------------------------|--------------------------------------------|
//! | [`Labeled`]                    | reading a whole label map out of a value   |
//! | [`GenericallyLabeled`]         | the same, given the configured tag name    |
//! | [`Labelee`]                    | handing a whole label map to a value       |
//! | [`StrictLabelee`]              | the same, allowed to fail                  |
//! | [`GenericLabelee`]             | the same, given the configured tag name    |
//! | [`MarshalLabels`]              | a value marshaling itself                  |
//! | [`MarshalLabelsWithOptions`]   | the same, seeing the active options        |
//! | [`UnmarshalLabels`]            | a value unmarshaling itself                |
//! | [`UnmarshalLabelsWithOptions`] | the same, seeing the active options        |
//!
//! Single values that convert to and from text use `Display` and `FromStr`.
//!
//! ## Examples
//!
//! ```rust
//! use labeler::{labeled, labels, unmarshal, Labelee, Labels};
//!
//! labeled! {
//!     @capabilities(labelee)
//!     #[derive(Default)]
//!     pub struct Pod {
//!         #[label = "app"]
//!         pub app: String,
//!         pub rest: Labels,
//!     }
//! }
//!
//! impl Labelee for Pod {
//!     fn set_labels(&mut self, labels: Labels) {
//!         self.rest = labels;
//!     }
//! }
//!
//! let mut pod = Pod::default();
//! unmarshal(&labels! { "app" => "web", "zone" => "eu" }, &mut pod).unwrap();
//! assert_eq!(pod.app, "web");
//! assert_eq!(pod.rest.get("zone"), Some("eu"));
//! ```

use crate::error::Result;
use crate::map::Labels;
use crate::options::Options;

/// A value that can report all of its labels.
pub trait Labeled {
    fn labels(&self) -> Labels;
}

/// A value that reports labels for a given tag name.
pub trait GenericallyLabeled {
    fn labels_for(&self, tag: &str) -> Labels;
}

/// A value that accepts a whole label map.
pub trait Labelee {
    fn set_labels(&mut self, labels: Labels);
}

/// A value that accepts a whole label map and may reject it.
pub trait StrictLabelee {
    fn try_set_labels(&mut self, labels: Labels) -> Result<()>;
}

/// A value that accepts a label map for a given tag name.
pub trait GenericLabelee {
    fn set_labels_for(&mut self, labels: Labels, tag: &str) -> Result<()>;
}

/// A value that marshals itself, bypassing tag-driven field handling.
pub trait MarshalLabels {
    fn marshal_labels(&self) -> Result<Labels>;
}

/// Like [`MarshalLabels`], with access to the active options.
pub trait MarshalLabelsWithOptions {
    fn marshal_labels_with(&self, options: &Options) -> Result<Labels>;
}

/// A value that unmarshals itself, bypassing tag-driven field handling.
pub trait UnmarshalLabels {
    fn unmarshal_labels(&mut self, labels: &Labels) -> Result<()>;
}

/// Like [`UnmarshalLabels`], with access to the active options.
pub trait UnmarshalLabelsWithOptions {
    fn unmarshal_labels_with(&mut self, labels: &Labels, options: &Options) -> Result<()>;
}
