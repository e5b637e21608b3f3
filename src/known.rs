//! Well-known types from other packages.
//!
//! These types get a rendering of their own instead of their `Display`
//! impl, because the rendering depends on the field's format:
//!
//! | Type                              | Rendering                             |
//! |-----------------------------------|---------------------------------------|
//! | `chrono::DateTime<Utc>`           | strftime layout (`timeformat`)        |
//! | `chrono::DateTime<FixedOffset>`   | strftime layout (`timeformat`)        |
//! | `chrono::NaiveDateTime`           | strftime layout (`timeformat`)        |
//! | `chrono::Duration`                | `1h2m3.5s`                            |
//! | `std::time::Duration`             | `1h2m3.5s`                            |
//! | `num_bigint::BigInt` / `BigUint`  | digits in the int / uint base         |
//!
//! A type is recognized by the package and name its shape declares, so a
//! user type can opt into a rendering by naming itself the same way.

use crate::error::{Error, Result};
use crate::format::{format_duration, parse_duration, Format};
use crate::reflect::{downcast_mut, downcast_ref, Reflect, Shape};
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use num_bigint::{BigInt, BigUint, Sign};
use std::any::Any;
use std::fmt::Write;
use std::time::Duration;

pub(crate) type Render = fn(&dyn Any, &Format) -> Result<String>;
pub(crate) type Parse = fn(&mut dyn Any, &str, &Format) -> Result<()>;

pub(crate) struct WellKnown {
    pub package: &'static str,
    pub name: &'static str,
    pub render: Render,
    pub parse: Parse,
}

pub(crate) const WELL_KNOWN: &[WellKnown] = &[
    WellKnown {
        package: "chrono",
        name: "DateTime<Utc>",
        render: render_utc,
        parse: parse_utc,
    },
    WellKnown {
        package: "chrono",
        name: "DateTime<FixedOffset>",
        render: render_fixed,
        parse: parse_fixed,
    },
    WellKnown {
        package: "chrono",
        name: "NaiveDateTime",
        render: render_naive,
        parse: parse_naive,
    },
    WellKnown {
        package: "chrono",
        name: "Duration",
        render: render_chrono_duration,
        parse: parse_chrono_duration,
    },
    WellKnown {
        package: "std::time",
        name: "Duration",
        render: render_std_duration,
        parse: parse_std_duration,
    },
    WellKnown {
        package: "num_bigint",
        name: "BigInt",
        render: render_bigint,
        parse: parse_bigint,
    },
    WellKnown {
        package: "num_bigint",
        name: "BigUint",
        render: render_biguint,
        parse: parse_biguint,
    },
];

/// The well-known entry for a shape, matched by package and name.
pub(crate) fn lookup(shape: &Shape) -> Option<&'static WellKnown> {
    WELL_KNOWN
        .iter()
        .find(|known| known.package == shape.package() && known.name == shape.name())
}

impl Reflect for DateTime<Utc> {
    fn shape() -> Shape {
        Shape::builder::<Self>().named("chrono", "DateTime<Utc>").build()
    }
}

impl Reflect for DateTime<FixedOffset> {
    fn shape() -> Shape {
        Shape::builder::<Self>()
            .named("chrono", "DateTime<FixedOffset>")
            .build()
    }
}

impl Reflect for NaiveDateTime {
    fn shape() -> Shape {
        Shape::builder::<Self>().named("chrono", "NaiveDateTime").build()
    }
}

impl Reflect for chrono::Duration {
    fn shape() -> Shape {
        Shape::builder::<Self>().named("chrono", "Duration").build()
    }
}

impl Reflect for Duration {
    fn shape() -> Shape {
        Shape::builder::<Self>().named("std::time", "Duration").build()
    }
}

impl Reflect for BigInt {
    fn shape() -> Shape {
        Shape::builder::<Self>().named("num_bigint", "BigInt").build()
    }
}

impl Reflect for BigUint {
    fn shape() -> Shape {
        Shape::builder::<Self>().named("num_bigint", "BigUint").build()
    }
}

// ---------------------------------------------------------------------------
// times

fn format_time<D: std::fmt::Display>(formatted: D, layout: &str) -> Result<String> {
    let mut out = String::new();
    write!(out, "{}", formatted)
        .map_err(|_| Error::conversion(layout, "time layout", "invalid layout"))?;
    Ok(out)
}

fn render_utc(value: &dyn Any, format: &Format) -> Result<String> {
    let layout = format.time_layout()?;
    format_time(downcast_ref::<DateTime<Utc>>(value)?.format(layout), layout)
}

fn render_fixed(value: &dyn Any, format: &Format) -> Result<String> {
    let layout = format.time_layout()?;
    format_time(
        downcast_ref::<DateTime<FixedOffset>>(value)?.format(layout),
        layout,
    )
}

fn render_naive(value: &dyn Any, format: &Format) -> Result<String> {
    let layout = format.time_layout()?;
    format_time(downcast_ref::<NaiveDateTime>(value)?.format(layout), layout)
}

/// Parses with an offset if the layout has one, as UTC otherwise.
fn parse_with_offset(text: &str, layout: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_str(text, layout).or_else(|with_offset| {
        NaiveDateTime::parse_from_str(text, layout)
            .map(|naive| Utc.from_utc_datetime(&naive).into())
            .map_err(|_| Error::conversion(text, "time", with_offset))
    })
}

fn parse_utc(slot: &mut dyn Any, text: &str, format: &Format) -> Result<()> {
    let parsed = parse_with_offset(text, format.time_layout()?)?;
    *downcast_mut::<DateTime<Utc>>(slot)? = parsed.with_timezone(&Utc);
    Ok(())
}

fn parse_fixed(slot: &mut dyn Any, text: &str, format: &Format) -> Result<()> {
    *downcast_mut::<DateTime<FixedOffset>>(slot)? = parse_with_offset(text, format.time_layout()?)?;
    Ok(())
}

fn parse_naive(slot: &mut dyn Any, text: &str, format: &Format) -> Result<()> {
    let layout = format.time_layout()?;
    *downcast_mut::<NaiveDateTime>(slot)? = NaiveDateTime::parse_from_str(text, layout)
        .map_err(|e| Error::conversion(text, "time", e))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// durations

fn render_chrono_duration(value: &dyn Any, _: &Format) -> Result<String> {
    let duration = downcast_ref::<chrono::Duration>(value)?;
    let nanos = duration
        .num_nanoseconds()
        .map(i128::from)
        .unwrap_or_else(|| i128::from(duration.num_microseconds().unwrap_or(i64::MAX)) * 1_000);
    Ok(format_duration(nanos))
}

fn parse_chrono_duration(slot: &mut dyn Any, text: &str, _: &Format) -> Result<()> {
    let nanos = i64::try_from(parse_duration(text)?)
        .map_err(|_| Error::conversion(text, "duration", "value out of range"))?;
    *downcast_mut::<chrono::Duration>(slot)? = chrono::Duration::nanoseconds(nanos);
    Ok(())
}

fn render_std_duration(value: &dyn Any, _: &Format) -> Result<String> {
    let duration = downcast_ref::<Duration>(value)?;
    Ok(format_duration(duration.as_nanos() as i128))
}

fn parse_std_duration(slot: &mut dyn Any, text: &str, _: &Format) -> Result<()> {
    let nanos = parse_duration(text)?;
    let nanos = u128::try_from(nanos)
        .map_err(|_| Error::conversion(text, "duration", "must not be negative"))?;
    let seconds = u64::try_from(nanos / 1_000_000_000)
        .map_err(|_| Error::conversion(text, "duration", "value out of range"))?;
    *downcast_mut::<Duration>(slot)? = Duration::new(seconds, (nanos % 1_000_000_000) as u32);
    Ok(())
}

// ---------------------------------------------------------------------------
// arbitrary precision integers

fn radix(base: u32) -> u32 {
    if base == 0 {
        10
    } else {
        base
    }
}

fn render_bigint(value: &dyn Any, format: &Format) -> Result<String> {
    Ok(downcast_ref::<BigInt>(value)?.to_str_radix(radix(format.int_base)))
}

fn render_biguint(value: &dyn Any, format: &Format) -> Result<String> {
    Ok(downcast_ref::<BigUint>(value)?.to_str_radix(radix(format.uint_base)))
}

/// Strips a `0b`/`0o`/`0x` prefix when the base is inferred.
fn strip_prefix(digits: &str, base: u32) -> (u32, &str) {
    if base != 0 {
        return (base, digits);
    }
    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(rest) = digits.strip_prefix(prefix) {
            return (radix, rest);
        }
    }
    (10, digits)
}

fn parse_bigint(slot: &mut dyn Any, text: &str, format: &Format) -> Result<()> {
    let (sign, rest) = match text.strip_prefix('-') {
        Some(rest) => (Sign::Minus, rest),
        None => (Sign::Plus, text.strip_prefix('+').unwrap_or(text)),
    };
    let (base, digits) = strip_prefix(rest, format.int_base);
    let magnitude = BigUint::parse_bytes(digits.as_bytes(), base)
        .filter(|_| !digits.starts_with(['+', '-']))
        .ok_or_else(|| Error::conversion(text, "BigInt", "invalid digits"))?;
    *downcast_mut::<BigInt>(slot)? = BigInt::from_biguint(sign, magnitude);
    Ok(())
}

fn parse_biguint(slot: &mut dyn Any, text: &str, format: &Format) -> Result<()> {
    let (base, digits) = strip_prefix(text, format.uint_base);
    let value = BigUint::parse_bytes(digits.as_bytes(), base)
        .filter(|_| !digits.starts_with(['+', '-']))
        .ok_or_else(|| Error::conversion(text, "BigUint", "invalid digits"))?;
    *downcast_mut::<BigUint>(slot)? = value;
    Ok(())
}
