//! Marshaling: from record fields to labels.
//!
//! A marshal strategy is picked per field from an ordered list of
//! marshalers. Each marshaler looks at the field's [`Meta`] and either
//! declines or returns a bound [`Marshal`]; the first one that accepts wins.
//!
//! | List                  | Order                                                         |
//! |-----------------------|---------------------------------------------------------------|
//! | [`FIELD_MARSHALERS`]  | self-marshal (with options, plain), well-known, `Display`, collection, primitive |
//! | [`ELEMENT_MARSHALERS`]| well-known, `Display`, primitive                              |
//! | [`CONTAINER_MARSHALERS`] | self-marshal (with options, plain), labeled (generic, plain), map |
//! | [`SELF_MARSHALERS`]   | self-marshal (with options, plain)                            |
//! | [`RECORD_MARSHALERS`] | labeled (generic, plain)                                      |
//! | [`INPUT_MARSHALERS`]  | labeled (generic, plain), map                                 |
//!
//! Text strategies render one value for one key. Label strategies produce a
//! whole map, which is merged into the output.

use crate::error::{Error, Result};
use crate::field::Field;
use crate::format::{format_bool, format_complex, format_float, format_int, format_uint, FloatBits, Format};
use crate::known;
use crate::map::Labels;
use crate::meta::Meta;
use crate::options::Options;
use crate::reflect::{downcast_ref, Kind};
use num_complex::Complex;
use std::any::{type_name, Any};
use std::sync::Arc;
use tracing::trace;

pub(crate) type LabelsFn = Arc<dyn Fn(&dyn Any, &Options) -> Result<Labels> + Send + Sync>;
pub(crate) type RenderFn = Arc<dyn Fn(&dyn Any, &Format) -> Result<String> + Send + Sync>;

/// A bound marshal strategy.
#[derive(Clone)]
pub(crate) enum Marshal {
    /// Produces a whole label map.
    Labels(LabelsFn),
    /// Renders the value stored under one key.
    Text(RenderFn),
}

pub(crate) type Marshaler = fn(&Meta) -> Option<Marshal>;

pub(crate) const FIELD_MARSHALERS: &[Marshaler] = &[
    marshal_with_options,
    marshal_self,
    well_known,
    display,
    collection,
    primitive,
];

pub(crate) const ELEMENT_MARSHALERS: &[Marshaler] = &[well_known, display, primitive];

pub(crate) const CONTAINER_MARSHALERS: &[Marshaler] = &[
    marshal_with_options,
    marshal_self,
    generically_labeled,
    labeled,
    map,
];

pub(crate) const SELF_MARSHALERS: &[Marshaler] = &[marshal_with_options, marshal_self];

pub(crate) const RECORD_MARSHALERS: &[Marshaler] = &[generically_labeled, labeled];

pub(crate) const INPUT_MARSHALERS: &[Marshaler] = &[generically_labeled, labeled, map];

/// The first strategy in `list` that accepts `meta`.
pub(crate) fn select(list: &[Marshaler], meta: &Meta) -> Option<Marshal> {
    list.iter().find_map(|marshaler| marshaler(meta))
}

/// Like [`select`], keeping only whole-map strategies.
pub(crate) fn select_labels(list: &[Marshaler], meta: &Meta) -> Option<LabelsFn> {
    match select(list, meta)? {
        Marshal::Labels(get) => Some(get),
        Marshal::Text(_) => None,
    }
}

// ---------------------------------------------------------------------------
// applying strategies

/// Renders a tagged field into `out`.
///
/// An empty pointer on the way to the field renders as the empty string, so
/// the empty-value rules below still apply to it.
pub(crate) fn marshal_field(
    field: &Field,
    root: &dyn Any,
    out: &mut Labels,
    options: &Options,
) -> Result<()> {
    let strategy = field
        .marshal
        .as_ref()
        .ok_or_else(|| Error::unsupported_type(field.meta.type_name()))?;
    let value = field.meta.value(root)?;
    match strategy {
        Marshal::Labels(get) => {
            if let Some(value) = value {
                merge(out, get(value, options)?, field.omit_empty(options));
            }
        }
        Marshal::Text(render) => {
            let mut text = match value {
                Some(value) => render(value, &field.format(options))?,
                None => String::new(),
            };
            if text.is_empty() {
                if field.omit_empty(options) {
                    trace!(path = field.path(), "omitting empty value");
                    return Ok(());
                }
                if let Some(default) = field.default(options) {
                    text = default;
                }
            }
            out.insert(field.key.as_str(), text);
        }
    }
    Ok(())
}

/// Merges the container's labels into `out`.
pub(crate) fn marshal_container(
    field: &Field,
    root: &dyn Any,
    out: &mut Labels,
    options: &Options,
) -> Result<()> {
    let Some(Marshal::Labels(get)) = &field.marshal else {
        return Err(Error::InvalidContainer(field.path().to_string()));
    };
    if let Some(value) = field.meta.value(root)? {
        merge(out, get(value, options)?, field.omit_empty(options));
    }
    Ok(())
}

pub(crate) fn merge(out: &mut Labels, labels: Labels, omit_empty: bool) {
    out.extend(
        labels
            .into_iter()
            .filter(|(_, value)| !(omit_empty && value.is_empty())),
    );
}

// ---------------------------------------------------------------------------
// marshalers

fn labels(get: crate::reflect::GetLabels) -> Marshal {
    Marshal::Labels(Arc::new(get))
}

fn marshal_with_options(meta: &Meta) -> Option<Marshal> {
    meta.shape().caps.marshal_with_options.map(labels)
}

fn marshal_self(meta: &Meta) -> Option<Marshal> {
    meta.shape().caps.marshal.map(labels)
}

fn generically_labeled(meta: &Meta) -> Option<Marshal> {
    meta.shape().caps.generically_labeled.map(labels)
}

fn labeled(meta: &Meta) -> Option<Marshal> {
    meta.shape().caps.labeled.map(labels)
}

fn map(meta: &Meta) -> Option<Marshal> {
    let map = meta.map()?;
    Some(Marshal::Labels(Arc::new(move |value: &dyn Any, _: &Options| {
        (map.get)(value)
    })))
}

fn well_known(meta: &Meta) -> Option<Marshal> {
    let entry = known::lookup(meta.shape())?;
    Some(Marshal::Text(Arc::new(entry.render)))
}

fn display(meta: &Meta) -> Option<Marshal> {
    let to_text = meta.shape().caps.to_text?;
    Some(Marshal::Text(Arc::new(move |value: &dyn Any, _: &Format| {
        to_text(value)
    })))
}

fn collection(meta: &Meta) -> Option<Marshal> {
    let vtable = meta.collection()?;
    let element = meta.element()?;
    let Some(Marshal::Text(render)) = select(ELEMENT_MARSHALERS, &element) else {
        return None;
    };
    Some(Marshal::Text(Arc::new(move |value: &dyn Any, format: &Format| {
        let len = (vtable.len)(value);
        let mut parts = Vec::with_capacity(len);
        for index in 0..len {
            let item = (vtable.get)(value, index)
                .ok_or_else(|| Error::InvalidValue(format!("missing element {}", index)))?;
            // an empty pointer element renders as an empty part
            let part = match element.value(item)? {
                Some(item) => render(item, format)?,
                None => String::new(),
            };
            parts.push(part);
        }
        Ok(parts.join(&format.split))
    })))
}

fn primitive(meta: &Meta) -> Option<Marshal> {
    let render: fn(&dyn Any, &Format) -> Result<String> = match meta.kind() {
        Kind::Bool => render_bool,
        Kind::I8 => render_signed::<i8>,
        Kind::I16 => render_signed::<i16>,
        Kind::I32 => render_signed::<i32>,
        Kind::I64 => render_signed::<i64>,
        Kind::Isize => render_signed::<isize>,
        Kind::U8 => render_unsigned::<u8>,
        Kind::U16 => render_unsigned::<u16>,
        Kind::U32 => render_unsigned::<u32>,
        Kind::U64 => render_unsigned::<u64>,
        Kind::Usize => render_unsigned::<usize>,
        Kind::F32 => render_float::<f32>,
        Kind::F64 => render_float::<f64>,
        Kind::Complex32 => render_complex::<f32>,
        Kind::Complex64 => render_complex::<f64>,
        Kind::String => render_string,
        _ => return None,
    };
    Some(Marshal::Text(Arc::new(render)))
}

fn render_bool(value: &dyn Any, _: &Format) -> Result<String> {
    Ok(format_bool(*downcast_ref::<bool>(value)?))
}

fn render_signed<T>(value: &dyn Any, format: &Format) -> Result<String>
where
    T: Copy + Any + ToString,
    i128: TryFrom<T>,
{
    let value = *downcast_ref::<T>(value)?;
    let wide = i128::try_from(value)
        .map_err(|_| Error::conversion(&value.to_string(), type_name::<T>(), "out of range"))?;
    Ok(format_int(wide, format.int_base))
}

fn render_unsigned<T>(value: &dyn Any, format: &Format) -> Result<String>
where
    T: Copy + Any + ToString,
    u128: TryFrom<T>,
{
    let value = *downcast_ref::<T>(value)?;
    let wide = u128::try_from(value)
        .map_err(|_| Error::conversion(&value.to_string(), type_name::<T>(), "out of range"))?;
    Ok(format_uint(wide, format.uint_base))
}

fn render_float<F: FloatBits + Any>(value: &dyn Any, format: &Format) -> Result<String> {
    format_float(*downcast_ref::<F>(value)?, format.float)
}

fn render_complex<F: FloatBits + Any>(value: &dyn Any, format: &Format) -> Result<String> {
    format_complex(*downcast_ref::<Complex<F>>(value)?, format.complex)
}

fn render_string(value: &dyn Any, _: &Format) -> Result<String> {
    Ok(downcast_ref::<String>(value)?.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::{Reflect, Shape};
    use std::collections::HashMap;

    fn render<T: Reflect>(value: &T, format: &Format) -> String {
        let meta = Meta::root(T::shape());
        match select(FIELD_MARSHALERS, &meta) {
            Some(Marshal::Text(render)) => render(value, format).unwrap(),
            _ => panic!("expected a text strategy for {}", std::any::type_name::<T>()),
        }
    }

    #[test]
    fn test_primitives() {
        let format = Format::default();
        assert_eq!(render(&true, &format), "true");
        assert_eq!(render(&-42i16, &format), "-42");
        assert_eq!(render(&123456789u64, &format), "123456789");
        assert_eq!(render(&1.5f64, &format), "1.5");
        assert_eq!(render(&"web".to_string(), &format), "web");
        assert_eq!(render(&Complex::new(3.0f64, 4.0), &format), "(3+4i)");
    }

    #[test]
    fn test_bases() {
        let format = Format {
            int_base: 2,
            uint_base: 16,
            ..Format::default()
        };
        assert_eq!(render(&7i32, &format), "111");
        assert_eq!(render(&255u32, &format), "ff");
    }

    #[test]
    fn test_collections() {
        let format = Format {
            split: "|".to_string(),
            ..Format::default()
        };
        assert_eq!(render(&vec![1u8, 2, 3], &format), "1|2|3");
        assert_eq!(render(&["a".to_string(), "b".to_string()], &format), "a|b");
        assert_eq!(render(&Vec::<i32>::new(), &format), "");
    }

    #[test]
    fn test_nested_collections_are_unsupported() {
        let meta = Meta::root(<Vec<Vec<u8>>>::shape());
        assert!(select(FIELD_MARSHALERS, &meta).is_none());
    }

    #[test]
    fn test_display_wins_over_primitive() {
        #[derive(Clone, Copy)]
        struct Port(u16);

        impl std::fmt::Display for Port {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, ":{}", self.0)
            }
        }

        impl Reflect for Port {
            fn shape() -> Shape {
                Shape::builder::<Self>().display().build()
            }
        }

        assert_eq!(render(&Port(80), &Format::default()), ":80");
    }

    #[test]
    fn test_container_strategies() {
        let meta = Meta::root(<HashMap<String, String>>::shape());
        assert!(select_labels(CONTAINER_MARSHALERS, &meta).is_some());
        assert!(select_labels(INPUT_MARSHALERS, &meta).is_some());
        assert!(select_labels(RECORD_MARSHALERS, &meta).is_none());

        let meta = Meta::root(String::shape());
        assert!(select_labels(CONTAINER_MARSHALERS, &meta).is_none());
    }

    #[test]
    fn test_merge_omits_empty_values() {
        let mut out = Labels::new();
        let labels: Labels = [("a", "1"), ("b", "")].into_iter().collect();
        merge(&mut out, labels.clone(), true);
        assert_eq!(out.len(), 1);
        merge(&mut out, labels, false);
        assert_eq!(out.get("b"), Some(""));
    }
}
