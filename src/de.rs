//! Unmarshaling: from labels to record fields.
//!
//! The mirror image of [`crate::ser`]. Strategies are chosen from ordered
//! lists of unmarshalers, first acceptance wins:
//!
//! | List                       | Order                                                    |
//! |----------------------------|----------------------------------------------------------|
//! | [`FIELD_UNMARSHALERS`]     | self-unmarshal (with options, plain), well-known, `FromStr`, collection, primitive |
//! | [`ELEMENT_UNMARSHALERS`]   | well-known, `FromStr`, primitive                         |
//! | [`CONTAINER_UNMARSHALERS`] | self-unmarshal (with options, plain), labelee (generic, strict, plain), map |
//! | [`SELF_UNMARSHALERS`]      | self-unmarshal (with options, plain)                     |
//! | [`RECORD_UNMARSHALERS`]    | labelee (generic, strict, plain)                         |
//!
//! Collections are written element by element: the label value is split on
//! the field's separator, the collection is resized to the element count
//! and every element is parsed in place. An empty value yields an empty
//! collection.

use crate::error::{Error, Result};
use crate::field::Field;
use crate::format::{parse_bool, parse_complex, parse_float, parse_int, parse_uint, FloatBits, Format};
use crate::known;
use crate::map::Labels;
use crate::meta::Meta;
use crate::options::Options;
use crate::reflect::{downcast_mut, Kind, SetLabels};
use num_complex::Complex;
use std::any::{type_name, Any};
use std::sync::Arc;
use tracing::trace;

pub(crate) type SetFn = Arc<dyn Fn(&mut dyn Any, Labels, &Options) -> Result<()> + Send + Sync>;
pub(crate) type ParseFn = Arc<dyn Fn(&mut dyn Any, &str, &Format) -> Result<()> + Send + Sync>;

/// A bound unmarshal strategy.
#[derive(Clone)]
pub(crate) enum Unmarshal {
    /// Receives a whole label map.
    Labels(SetFn),
    /// Parses the value found under one key.
    Text(ParseFn),
}

pub(crate) type Unmarshaler = fn(&Meta) -> Option<Unmarshal>;

pub(crate) const FIELD_UNMARSHALERS: &[Unmarshaler] = &[
    unmarshal_with_options,
    unmarshal_self,
    well_known,
    from_str,
    collection,
    primitive,
];

pub(crate) const ELEMENT_UNMARSHALERS: &[Unmarshaler] = &[well_known, from_str, primitive];

pub(crate) const CONTAINER_UNMARSHALERS: &[Unmarshaler] = &[
    unmarshal_with_options,
    unmarshal_self,
    generic_labelee,
    strict_labelee,
    labelee,
    map,
];

pub(crate) const SELF_UNMARSHALERS: &[Unmarshaler] = &[unmarshal_with_options, unmarshal_self];

pub(crate) const RECORD_UNMARSHALERS: &[Unmarshaler] = &[generic_labelee, strict_labelee, labelee];

pub(crate) fn select(list: &[Unmarshaler], meta: &Meta) -> Option<Unmarshal> {
    list.iter().find_map(|unmarshaler| unmarshaler(meta))
}

/// Like [`select`], keeping only whole-map strategies.
pub(crate) fn select_labels(list: &[Unmarshaler], meta: &Meta) -> Option<SetFn> {
    match select(list, meta)? {
        Unmarshal::Labels(set) => Some(set),
        Unmarshal::Text(_) => None,
    }
}

// ---------------------------------------------------------------------------
// applying strategies

/// Writes one tagged field from `labels`.
///
/// Returns the key that was consumed, if any. A missing key falls back to
/// the field's default; a field without one is left untouched unless it is
/// required.
pub(crate) fn unmarshal_field(
    field: &mut Field,
    root: &mut dyn Any,
    labels: &Labels,
    options: &Options,
) -> Result<Option<String>> {
    let strategy = field
        .unmarshal
        .clone()
        .ok_or_else(|| Error::unsupported_type(field.meta.type_name()))?;
    match strategy {
        Unmarshal::Labels(set) => {
            field
                .meta
                .update(root, &mut |slot| set(slot, labels.clone(), options))?;
            field.was_set = true;
            Ok(None)
        }
        Unmarshal::Text(parse) => {
            let (consumed, text) = match labels.find(&field.key, field.ignore_case(options)) {
                Some((key, value)) => (Some(key.to_string()), value.to_string()),
                None => match field.default(options) {
                    Some(default) => (None, default),
                    None if field.required(options) => return Err(Error::MissingRequiredLabel),
                    None => {
                        trace!(path = field.path(), key = field.key.as_str(), "no label");
                        return Ok(None);
                    }
                },
            };
            let format = field.format(options);
            field
                .meta
                .update(root, &mut |slot| parse(slot, &text, &format))?;
            field.was_set = true;
            Ok(consumed)
        }
    }
}

/// Hands the remaining labels to the container.
pub(crate) fn unmarshal_container(
    field: &mut Field,
    root: &mut dyn Any,
    labels: Labels,
    options: &Options,
) -> Result<()> {
    let Some(Unmarshal::Labels(set)) = field.unmarshal.clone() else {
        return Err(Error::InvalidContainer(field.path().to_string()));
    };
    field
        .meta
        .update(root, &mut |slot| set(slot, labels.clone(), options))?;
    field.was_set = true;
    Ok(())
}

// ---------------------------------------------------------------------------
// unmarshalers

fn labels(set: SetLabels) -> Unmarshal {
    Unmarshal::Labels(Arc::new(set))
}

fn unmarshal_with_options(meta: &Meta) -> Option<Unmarshal> {
    meta.shape().caps.unmarshal_with_options.map(labels)
}

fn unmarshal_self(meta: &Meta) -> Option<Unmarshal> {
    meta.shape().caps.unmarshal.map(labels)
}

fn generic_labelee(meta: &Meta) -> Option<Unmarshal> {
    meta.shape().caps.generic_labelee.map(labels)
}

fn strict_labelee(meta: &Meta) -> Option<Unmarshal> {
    meta.shape().caps.strict_labelee.map(labels)
}

fn labelee(meta: &Meta) -> Option<Unmarshal> {
    meta.shape().caps.labelee.map(labels)
}

fn map(meta: &Meta) -> Option<Unmarshal> {
    let map = meta.map()?;
    Some(Unmarshal::Labels(Arc::new(
        move |slot: &mut dyn Any, labels: Labels, _: &Options| (map.set)(slot, labels),
    )))
}

fn well_known(meta: &Meta) -> Option<Unmarshal> {
    let entry = known::lookup(meta.shape())?;
    Some(Unmarshal::Text(Arc::new(entry.parse)))
}

fn from_str(meta: &Meta) -> Option<Unmarshal> {
    let from_text = meta.shape().caps.from_text?;
    Some(Unmarshal::Text(Arc::new(
        move |slot: &mut dyn Any, text: &str, _: &Format| from_text(slot, text),
    )))
}

fn collection(meta: &Meta) -> Option<Unmarshal> {
    let vtable = meta.collection()?;
    let element = meta.element()?;
    let Some(Unmarshal::Text(parse)) = select(ELEMENT_UNMARSHALERS, &element) else {
        return None;
    };
    Some(Unmarshal::Text(Arc::new(
        move |slot: &mut dyn Any, text: &str, format: &Format| {
            let parts: Vec<&str> = if text.is_empty() {
                Vec::new()
            } else {
                text.split(format.split.as_str()).collect()
            };
            (vtable.resize)(slot, parts.len())?;
            for (index, part) in parts.into_iter().enumerate() {
                let item = (vtable.get_mut)(slot, index)
                    .ok_or_else(|| Error::InvalidValue(format!("missing element {}", index)))?;
                element.update(item, &mut |slot| parse(slot, part, format))?;
            }
            Ok(())
        },
    )))
}

fn primitive(meta: &Meta) -> Option<Unmarshal> {
    let parse: fn(&mut dyn Any, &str, &Format) -> Result<()> = match meta.kind() {
        Kind::Bool => parse_bool_into,
        Kind::I8 => parse_signed::<i8>,
        Kind::I16 => parse_signed::<i16>,
        Kind::I32 => parse_signed::<i32>,
        Kind::I64 => parse_signed::<i64>,
        Kind::Isize => parse_signed::<isize>,
        Kind::U8 => parse_unsigned::<u8>,
        Kind::U16 => parse_unsigned::<u16>,
        Kind::U32 => parse_unsigned::<u32>,
        Kind::U64 => parse_unsigned::<u64>,
        Kind::Usize => parse_unsigned::<usize>,
        Kind::F32 => parse_float_into::<f32>,
        Kind::F64 => parse_float_into::<f64>,
        Kind::Complex32 => parse_complex_into::<f32>,
        Kind::Complex64 => parse_complex_into::<f64>,
        Kind::String => parse_string,
        _ => return None,
    };
    Some(Unmarshal::Text(Arc::new(parse)))
}

fn parse_bool_into(slot: &mut dyn Any, text: &str, _: &Format) -> Result<()> {
    *downcast_mut::<bool>(slot)? = parse_bool(text)?;
    Ok(())
}

fn parse_signed<T>(slot: &mut dyn Any, text: &str, format: &Format) -> Result<()>
where
    T: Any + TryFrom<i128>,
{
    let expected = type_name::<T>();
    let wide = parse_int(text, format.int_base, expected)?;
    let value = T::try_from(wide).map_err(|_| Error::conversion(text, expected, "value out of range"))?;
    *downcast_mut::<T>(slot)? = value;
    Ok(())
}

fn parse_unsigned<T>(slot: &mut dyn Any, text: &str, format: &Format) -> Result<()>
where
    T: Any + TryFrom<u128>,
{
    let expected = type_name::<T>();
    let wide = parse_uint(text, format.uint_base, expected)?;
    let value = T::try_from(wide).map_err(|_| Error::conversion(text, expected, "value out of range"))?;
    *downcast_mut::<T>(slot)? = value;
    Ok(())
}

fn parse_float_into<F: FloatBits>(slot: &mut dyn Any, text: &str, _: &Format) -> Result<()> {
    *downcast_mut::<F>(slot)? = parse_float::<F>(text)?;
    Ok(())
}

fn parse_complex_into<F: FloatBits>(slot: &mut dyn Any, text: &str, _: &Format) -> Result<()> {
    *downcast_mut::<Complex<F>>(slot)? = parse_complex::<F>(text)?;
    Ok(())
}

fn parse_string(slot: &mut dyn Any, text: &str, _: &Format) -> Result<()> {
    *downcast_mut::<String>(slot)? = text.to_string();
    Ok(())
}
