/// Builds a [`Labels`](crate::Labels) map.
///
/// ```rust
/// use labeler::labels;
///
/// let labels = labels! { "app" => "web", "tier" => "frontend" };
/// assert_eq!(labels.get("tier"), Some("frontend"));
/// assert!(labels! {}.is_empty());
/// ```
#[macro_export]
macro_rules! labels {
    () => {
        $crate::Labels::new()
    };

    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut labels = $crate::Labels::new();
        $(
            labels.insert($key, $value);
        )+
        labels
    }};
}

/// Declares a struct together with its [`Record`](crate::Record) and
/// [`Reflect`](crate::Reflect) impls.
///
/// Field attributes of the form `#[name = "text"]` become tags; the tag read
/// at runtime is the one named by [`Options::tag`](crate::Options::tag)
/// (`label` by default). Doc comments and any other field attribute are
/// kept on the struct. A field is exported when it carries a visibility
/// qualifier. An optional leading `@capabilities(...)` clause declares the
/// capability traits the struct implements, by their
/// [`ShapeBuilder`](crate::ShapeBuilder) method names.
///
/// ```rust
/// use labeler::{labeled, labels, marshal, unmarshal};
///
/// labeled! {
///     #[derive(Debug, Default, PartialEq)]
///     pub struct Service {
///         #[label = "name,required"]
///         pub name: String,
///         #[label = "port,default:8080"]
///         pub port: u16,
///         #[label = "*"]
///         pub labels: labeler::Labels,
///     }
/// }
///
/// let mut service = Service::default();
/// unmarshal(&labels! { "name" => "api", "team" => "core" }, &mut service).unwrap();
/// assert_eq!(service.port, 8080);
/// assert_eq!(service.labels.get("team"), Some("core"));
///
/// let out = marshal(&service).unwrap();
/// assert_eq!(out.get("name"), Some("api"));
/// assert_eq!(out.get("port"), Some("8080"));
/// ```
#[macro_export]
macro_rules! labeled {
    (
        $(@capabilities($($capability:ident),* $(,)?))?
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$($attr:tt)*])*
                $field_vis:vis $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $crate::labeled! {
            @struct [$(#[$meta])* $vis struct $name]
            $([$(#[$($attr)*])*] [$field_vis $field: $ty])*
        }

        impl $crate::Record for $name {
            fn fields() -> ::std::vec::Vec<$crate::FieldDef> {
                ::std::vec![
                    $(
                        $crate::labeled!(@tags
                            $crate::FieldDef::new::<$name, $ty>(
                                ::std::stringify!($field),
                                |record| &record.$field,
                                |record| &mut record.$field,
                            )
                            .exported(!::std::stringify!($field_vis).is_empty());
                            $([$($attr)*])*
                        )
                    ),*
                ]
            }
        }

        impl $crate::Reflect for $name {
            fn shape() -> $crate::Shape {
                $crate::Shape::builder::<Self>()
                    .record()
                    $($(.$capability())*)?
                    .build()
            }
        }
    };

    // Rebuilds the struct one field attribute at a time: tags are dropped,
    // doc comments and every other attribute are kept.
    (@struct [$($head:tt)*]) => {
        $($head)* {}
    };
    (@struct $head:tt [$($attrs:tt)*] [$($decl:tt)*] $($rest:tt)*) => {
        $crate::labeled! { @fields $head [] [] [$($attrs)*] [$($decl)*] $($rest)* }
    };
    (@fields [$($head:tt)*] [$($done:tt)*] [$($kept:tt)*] [] [$($decl:tt)*]) => {
        $($head)* {
            $($done)*
            $($kept)* $($decl)*,
        }
    };
    (@fields $head:tt [$($done:tt)*] [$($kept:tt)*] [] [$($decl:tt)*]
        [$($attrs:tt)*] [$($next:tt)*] $($rest:tt)*) => {
        $crate::labeled! {
            @fields $head [$($done)* $($kept)* $($decl)*,] [] [$($attrs)*] [$($next)*] $($rest)*
        }
    };
    (@fields $head:tt $done:tt [$($kept:tt)*] [#[doc = $doc:literal] $($attrs:tt)*] $($rest:tt)*) => {
        $crate::labeled! { @fields $head $done [$($kept)* #[doc = $doc]] [$($attrs)*] $($rest)* }
    };
    (@fields $head:tt $done:tt $kept:tt [#[$tag:ident = $text:literal] $($attrs:tt)*] $($rest:tt)*) => {
        $crate::labeled! { @fields $head $done $kept [$($attrs)*] $($rest)* }
    };
    (@fields $head:tt $done:tt [$($kept:tt)*] [#[$($other:tt)*] $($attrs:tt)*] $($rest:tt)*) => {
        $crate::labeled! { @fields $head $done [$($kept)* #[$($other)*]] [$($attrs)*] $($rest)* }
    };

    // Chains a `.tag(..)` call per tag attribute onto a field definition.
    (@tags $def:expr;) => {
        $def
    };
    (@tags $def:expr; [doc = $doc:literal] $($rest:tt)*) => {
        $crate::labeled!(@tags $def; $($rest)*)
    };
    (@tags $def:expr; [$tag:ident = $text:literal] $($rest:tt)*) => {
        $crate::labeled!(@tags $def.tag(::std::stringify!($tag), $text); $($rest)*)
    };
    (@tags $def:expr; [$($other:tt)*] $($rest:tt)*) => {
        $crate::labeled!(@tags $def; $($rest)*)
    };
}

/// Implements [`Reflect`](crate::Reflect) for types that convert to and
/// from text through `Display` and `FromStr`.
///
/// ```rust
/// use std::fmt;
/// use std::str::FromStr;
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Version(u32, u32);
///
/// impl fmt::Display for Version {
///     fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
///         write!(f, "v{}.{}", self.0, self.1)
///     }
/// }
///
/// impl FromStr for Version {
///     type Err = String;
///
///     fn from_str(s: &str) -> Result<Self, Self::Err> {
///         let (major, minor) = s
///             .trim_start_matches('v')
///             .split_once('.')
///             .ok_or_else(|| format!("bad version {s}"))?;
///         Ok(Version(
///             major.parse().map_err(|_| s.to_string())?,
///             minor.parse().map_err(|_| s.to_string())?,
///         ))
///     }
/// }
///
/// labeler::text_value!(Version);
///
/// labeler::labeled! {
///     #[derive(Default)]
///     pub struct Release {
///         #[label = "version"]
///         pub version: Version,
///     }
/// }
///
/// let mut release = Release::default();
/// labeler::unmarshal(&labeler::labels! { "version" => "v1.2" }, &mut release).unwrap();
/// assert_eq!(release.version, Version(1, 2));
/// ```
#[macro_export]
macro_rules! text_value {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Reflect for $ty {
                fn shape() -> $crate::Shape {
                    $crate::Shape::builder::<Self>().text().build()
                }
            }
        )+
    };
}
