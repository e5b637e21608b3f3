//! Text renderings of scalar values.
//!
//! Every value written into or read from a label passes through one of the
//! functions here. Integers honor a base (0 infers it from a `0b`, `0o` or
//! `0x` prefix when parsing), floats and complex numbers honor a format
//! character, durations use the compact `1h2m3.5s` notation.
//!
//! | format | float rendering                    | `1.5` as f64            |
//! |--------|------------------------------------|-------------------------|
//! | `b`    | binary exponent                    | `6755399441055744p-52`  |
//! | `e`    | decimal exponent                   | `1.5e+00`               |
//! | `f`    | no exponent                        | `1.5`                   |
//! | `g`    | `e` for large exponents, else `f`  | `1.5`                   |
//! | `x`    | hexadecimal mantissa and exponent  | `0x1.8p+00`             |
//!
//! `E`, `G` and `X` are the upper-case variants. All renderings use the
//! fewest digits that read back to the same value at the value's own width.

use crate::error::{Error, Result};
use crate::options::Options;
use crate::tag::Tag;
use num_complex::Complex;
use std::fmt::{Display, LowerExp};
use std::str::FromStr;

const FLOAT_FORMATS: [char; 8] = ['b', 'e', 'E', 'f', 'g', 'G', 'x', 'X'];

pub(crate) fn is_float_format(c: char) -> bool {
    FLOAT_FORMATS.contains(&c)
}

/// Formatting parameters resolved for one field: tag first, options second.
#[derive(Debug, Clone, PartialEq)]
pub struct Format {
    pub float: char,
    pub complex: char,
    /// `None` when neither the tag nor the options name a layout.
    pub time: Option<String>,
    pub int_base: u32,
    pub uint_base: u32,
    pub split: String,
}

impl Format {
    pub(crate) fn resolve(tag: Option<&Tag>, options: &Options) -> Format {
        let time = tag
            .and_then(Tag::time_format_or_format)
            .map(str::to_string)
            .or_else(|| Some(options.time_format.clone()))
            .filter(|layout| !layout.is_empty());
        Format {
            float: tag
                .and_then(Tag::float_format_or_format)
                .unwrap_or(options.float_format),
            complex: tag
                .and_then(Tag::complex_format_or_format)
                .unwrap_or(options.complex_format),
            time,
            int_base: tag
                .and_then(|t| t.int_base.or(t.base))
                .unwrap_or(options.int_base),
            uint_base: tag
                .and_then(|t| t.uint_base.or(t.base))
                .unwrap_or(options.uint_base),
            split: tag
                .and_then(|t| t.split.clone())
                .unwrap_or_else(|| options.split.clone()),
        }
    }

    /// The time layout, or [`Error::MissingFormat`].
    pub fn time_layout(&self) -> Result<&str> {
        self.time.as_deref().ok_or(Error::MissingFormat)
    }
}

impl Default for Format {
    fn default() -> Self {
        Format::resolve(None, &Options::default())
    }
}

// ---------------------------------------------------------------------------
// booleans

pub(crate) fn format_bool(value: bool) -> String {
    if value { "true" } else { "false" }.to_string()
}

pub(crate) fn parse_bool(text: &str) -> Result<bool> {
    match text {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        _ => Err(Error::conversion(text, "bool", "expected true or false")),
    }
}

// ---------------------------------------------------------------------------
// integers

const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Renders an integer in `base`; base 0 renders decimal.
pub(crate) fn format_int(value: i128, base: u32) -> String {
    let mut out = String::new();
    if value < 0 {
        out.push('-');
    }
    out.push_str(&format_magnitude(value.unsigned_abs(), base));
    out
}

pub(crate) fn format_uint(value: u128, base: u32) -> String {
    format_magnitude(value, base)
}

fn format_magnitude(mut value: u128, base: u32) -> String {
    let base = if base == 0 { 10 } else { base };
    if base == 10 {
        return value.to_string();
    }
    let base = u128::from(base);
    let mut digits = Vec::new();
    loop {
        digits.push(DIGITS[(value % base) as usize]);
        value /= base;
        if value == 0 {
            break;
        }
    }
    digits.iter().rev().map(|&d| d as char).collect()
}

/// Splits off a leading sign.
fn split_sign(text: &str) -> (bool, &str) {
    if let Some(rest) = text.strip_prefix('-') {
        (true, rest)
    } else {
        (false, text.strip_prefix('+').unwrap_or(text))
    }
}

/// Resolves base 0 from the digit prefix.
fn split_radix(digits: &str, base: u32) -> (u32, &str) {
    if base != 0 {
        return (base, digits);
    }
    let lower = digits.get(..2).map(str::to_ascii_lowercase);
    match lower.as_deref() {
        Some("0x") => (16, &digits[2..]),
        Some("0o") => (8, &digits[2..]),
        Some("0b") => (2, &digits[2..]),
        _ => (10, digits),
    }
}

fn parse_magnitude(text: &str, digits: &str, base: u32, expected: &str) -> Result<u128> {
    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return Err(Error::conversion(text, expected, "invalid syntax"));
    }
    u128::from_str_radix(digits, base).map_err(|e| Error::conversion(text, expected, e))
}

pub(crate) fn parse_int(text: &str, base: u32, expected: &str) -> Result<i128> {
    let (negative, rest) = split_sign(text);
    let (radix, digits) = split_radix(rest, base);
    let magnitude = parse_magnitude(text, digits, radix, expected)?;
    let out_of_range = || Error::conversion(text, expected, "value out of range");
    if negative {
        if magnitude > i128::MAX as u128 + 1 {
            return Err(out_of_range());
        }
        Ok((magnitude as i128).wrapping_neg())
    } else {
        i128::try_from(magnitude).map_err(|_| out_of_range())
    }
}

pub(crate) fn parse_uint(text: &str, base: u32, expected: &str) -> Result<u128> {
    if text.starts_with(['+', '-']) {
        return Err(Error::conversion(text, expected, "invalid syntax"));
    }
    let (radix, digits) = split_radix(text, base);
    parse_magnitude(text, digits, radix, expected)
}

// ---------------------------------------------------------------------------
// floats

/// The IEEE 754 layout of a binary float.
pub(crate) trait FloatBits: Copy + Display + LowerExp + FromStr + 'static {
    const MANTISSA_BITS: u32;
    const EXPONENT_BITS: u32;
    const BIAS: i32;
    const NAME: &'static str;
    const ZERO: Self;

    fn raw_bits(self) -> u64;
    fn from_raw_bits(bits: u64) -> Self;
    fn is_nan(self) -> bool;
    fn is_infinite(self) -> bool;
    fn is_sign_negative(self) -> bool;
}

impl FloatBits for f32 {
    const MANTISSA_BITS: u32 = 23;
    const EXPONENT_BITS: u32 = 8;
    const BIAS: i32 = -127;
    const NAME: &'static str = "f32";
    const ZERO: Self = 0.0;

    fn raw_bits(self) -> u64 {
        u64::from(self.to_bits())
    }
    fn from_raw_bits(bits: u64) -> Self {
        f32::from_bits(bits as u32)
    }
    fn is_nan(self) -> bool {
        f32::is_nan(self)
    }
    fn is_infinite(self) -> bool {
        f32::is_infinite(self)
    }
    fn is_sign_negative(self) -> bool {
        f32::is_sign_negative(self)
    }
}

impl FloatBits for f64 {
    const MANTISSA_BITS: u32 = 52;
    const EXPONENT_BITS: u32 = 11;
    const BIAS: i32 = -1023;
    const NAME: &'static str = "f64";
    const ZERO: Self = 0.0;

    fn raw_bits(self) -> u64 {
        self.to_bits()
    }
    fn from_raw_bits(bits: u64) -> Self {
        f64::from_bits(bits)
    }
    fn is_nan(self) -> bool {
        f64::is_nan(self)
    }
    fn is_infinite(self) -> bool {
        f64::is_infinite(self)
    }
    fn is_sign_negative(self) -> bool {
        f64::is_sign_negative(self)
    }
}

/// Shortest decimal digits of a finite, non-negative float.
///
/// The value equals `0.d1d2d3... * 10^point`. Zero has no digits.
struct Decimal {
    digits: Vec<u8>,
    point: i32,
}

impl Decimal {
    fn of<F: FloatBits>(value: F) -> Decimal {
        // `{:e}` yields the shortest round-trip digits, e.g. "1.2345e-7".
        let text = format!("{:e}", value);
        let (mantissa, exponent) = text.split_once('e').unwrap_or((text.as_str(), "0"));
        let exponent: i32 = exponent.parse().unwrap_or(0);
        let digits: Vec<u8> = mantissa
            .bytes()
            .filter(u8::is_ascii_digit)
            .collect();
        if digits.iter().all(|&d| d == b'0') {
            return Decimal { digits: Vec::new(), point: 0 };
        }
        Decimal { digits, point: exponent + 1 }
    }

    fn digit(&self, index: i32) -> char {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.digits.get(i))
            .map_or('0', |&d| d as char)
    }

    fn len(&self) -> i32 {
        self.digits.len() as i32
    }

    /// `%f`, shortest.
    fn fixed(&self, out: &mut String) {
        if self.point > 0 {
            for i in 0..self.point {
                out.push(self.digit(i));
            }
        } else {
            out.push('0');
        }
        let precision = (self.len() - self.point).max(0);
        if precision > 0 {
            out.push('.');
            for i in 0..precision {
                out.push(self.digit(self.point + i));
            }
        }
    }

    /// `%e`, shortest.
    fn exponent(&self, out: &mut String, marker: char) {
        out.push(self.digit(0));
        if self.len() > 1 {
            out.push('.');
            for i in 1..self.len() {
                out.push(self.digit(i));
            }
        }
        out.push(marker);
        let exponent = if self.digits.is_empty() { 0 } else { self.point - 1 };
        push_exponent(out, exponent, 2);
    }
}

fn push_exponent(out: &mut String, exponent: i32, width: usize) {
    out.push(if exponent < 0 { '-' } else { '+' });
    out.push_str(&format!("{:0width$}", exponent.unsigned_abs(), width = width));
}

/// Renders a float in one of the `b e E f g G x X` formats.
///
/// # Errors
///
/// [`Error::InvalidFloatFormat`] for any other format character.
pub(crate) fn format_float<F: FloatBits>(value: F, format: char) -> Result<String> {
    if !is_float_format(format) {
        return Err(Error::InvalidFloatFormat(format.to_string()));
    }
    if value.is_nan() {
        return Ok("NaN".to_string());
    }
    if value.is_infinite() {
        return Ok(if value.is_sign_negative() { "-Inf" } else { "+Inf" }.to_string());
    }

    let mut out = String::new();
    match format {
        'b' => format_binary(value, &mut out),
        'x' | 'X' => format_hex(value, format == 'X', &mut out),
        _ => {
            if value.is_sign_negative() {
                out.push('-');
            }
            let decimal = Decimal::of(value);
            match format {
                'f' => decimal.fixed(&mut out),
                'e' => decimal.exponent(&mut out, 'e'),
                'E' => decimal.exponent(&mut out, 'E'),
                _ => {
                    let exponent = decimal.point - 1;
                    let marker = if format == 'G' { 'E' } else { 'e' };
                    if !decimal.digits.is_empty() && (exponent < -4 || exponent >= 6) {
                        decimal.exponent(&mut out, marker);
                    } else {
                        decimal.fixed(&mut out);
                    }
                }
            }
        }
    }
    Ok(out)
}

fn split_bits<F: FloatBits>(value: F) -> (bool, i32, u64) {
    let bits = value.raw_bits();
    let width = F::MANTISSA_BITS + F::EXPONENT_BITS;
    let negative = (bits >> width) & 1 == 1;
    let biased = ((bits >> F::MANTISSA_BITS) & ((1 << F::EXPONENT_BITS) - 1)) as i32;
    let mut mantissa = bits & ((1u64 << F::MANTISSA_BITS) - 1);
    let mut exponent = biased;
    if biased == 0 {
        // denormal
        exponent += 1;
    } else {
        mantissa |= 1u64 << F::MANTISSA_BITS;
    }
    (negative, exponent + F::BIAS, mantissa)
}

/// `-ddddp±ddd`: the raw mantissa times a power of two.
fn format_binary<F: FloatBits>(value: F, out: &mut String) {
    let (negative, exponent, mantissa) = split_bits(value);
    if negative {
        out.push('-');
    }
    out.push_str(&mantissa.to_string());
    out.push('p');
    let exponent = exponent - F::MANTISSA_BITS as i32;
    if exponent >= 0 {
        out.push('+');
    }
    out.push_str(&exponent.to_string());
}

/// `-0x1.hhhhp±dd`, with trailing zero nibbles dropped.
fn format_hex<F: FloatBits>(value: F, upper: bool, out: &mut String) {
    let (negative, mut exponent, mut mantissa) = split_bits(value);
    if mantissa == 0 {
        exponent = 0;
    }
    // leading one at bit 60
    mantissa <<= 60 - F::MANTISSA_BITS;
    while mantissa != 0 && mantissa & (1 << 60) == 0 {
        mantissa <<= 1;
        exponent -= 1;
    }

    let mut text = String::new();
    if negative {
        text.push('-');
    }
    text.push_str("0x");
    text.push(if (mantissa >> 60) & 1 == 1 { '1' } else { '0' });
    mantissa <<= 4;
    if mantissa != 0 {
        text.push('.');
        while mantissa != 0 {
            text.push(DIGITS[((mantissa >> 60) & 0xf) as usize] as char);
            mantissa <<= 4;
        }
    }
    text.push('p');
    if upper {
        text = text.to_uppercase();
    }
    out.push_str(&text);
    push_exponent(out, exponent, 2);
}

/// Parses decimal floats, `Inf`, `NaN` and hex floats such as `-0x1.8p+01`.
pub(crate) fn parse_float<F: FloatBits>(text: &str) -> Result<F> {
    let (negative, unsigned) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    if let Some(hex) = unsigned.strip_prefix("0x").or_else(|| unsigned.strip_prefix("0X")) {
        return parse_hex(negative, hex).map_err(|reason| Error::conversion(text, F::NAME, reason));
    }
    let normalized = match text {
        "+Inf" | "Inf" | "+inf" | "inf" => "inf",
        "-Inf" | "-inf" => "-inf",
        other => other,
    };
    normalized
        .parse::<F>()
        .map_err(|_| Error::conversion(text, F::NAME, "invalid float"))
}

/// `hhh.hhhp±ddd` after the `0x` prefix, rounded to nearest even.
///
/// Fails with the reason on a syntax error or when the value overflows `F`.
fn parse_hex<F: FloatBits>(negative: bool, text: &str) -> std::result::Result<F, &'static str> {
    const INVALID: &str = "invalid float";
    let (mantissa_text, exponent_text) = text.split_once(['p', 'P']).ok_or(INVALID)?;
    let mut exponent: i64 = exponent_text
        .parse::<i64>()
        .map_err(|_| INVALID)?
        .clamp(-100_000, 100_000);

    let mut mantissa: u64 = 0;
    let mut sticky = false;
    let mut digits = 0;
    let mut fraction = false;
    for c in mantissa_text.chars() {
        if c == '.' && !fraction {
            fraction = true;
            continue;
        }
        let digit = u64::from(c.to_digit(16).ok_or(INVALID)?);
        digits += 1;
        if mantissa < 1 << 60 {
            mantissa = mantissa * 16 + digit;
            if fraction {
                exponent -= 4;
            }
        } else {
            sticky |= digit != 0;
            if !fraction {
                exponent += 4;
            }
        }
    }
    if digits == 0 {
        return Err(INVALID);
    }

    let sign = u64::from(negative) << (F::MANTISSA_BITS + F::EXPONENT_BITS);
    if mantissa == 0 {
        return Ok(F::from_raw_bits(sign));
    }

    // the leading one of `wide`, at bit 127, is worth 2^lead
    let shift = mantissa.leading_zeros();
    let wide = u128::from(mantissa << shift) << 64;
    let lead = exponent - i64::from(shift) + 63;

    let precision = i64::from(F::MANTISSA_BITS) + 1;
    let min_exponent = i64::from(F::BIAS) + 1;
    let max_exponent = -i64::from(F::BIAS);
    let keep = if lead < min_exponent {
        precision - (min_exponent - lead)
    } else {
        precision
    };
    if keep < 0 {
        return Ok(F::from_raw_bits(sign));
    }

    let drop = 128 - keep as u32;
    let mut kept = wide.checked_shr(drop).unwrap_or(0) as u64;
    let rest = wide & u128::MAX.checked_shr(128 - drop).unwrap_or(0);
    let half = 1u128 << (drop - 1);
    if rest > half || (rest == half && (sticky || kept & 1 == 1)) {
        kept += 1;
    }

    let bits = if lead < min_exponent {
        // a rounded-up denormal carries into the exponent field by itself
        kept
    } else {
        let mut lead = lead;
        if kept >> (F::MANTISSA_BITS + 1) == 1 {
            kept >>= 1;
            lead += 1;
        }
        if lead > max_exponent {
            return Err("value out of range");
        }
        ((lead - i64::from(F::BIAS)) as u64) << F::MANTISSA_BITS | (kept & ((1 << F::MANTISSA_BITS) - 1))
    };
    Ok(F::from_raw_bits(sign | bits))
}

// ---------------------------------------------------------------------------
// complex numbers

/// Renders `(re±imi)` with both parts in `format`.
pub(crate) fn format_complex<F: FloatBits>(value: Complex<F>, format: char) -> Result<String> {
    let re = format_float(value.re, format)?;
    let mut im = format_float(value.im, format)?;
    if !im.starts_with(['+', '-']) {
        im.insert(0, '+');
    }
    Ok(format!("({}{}i)", re, im))
}

/// Parses `re`, `imi`, `re±imi`, optionally wrapped in parentheses.
pub(crate) fn parse_complex<F: FloatBits>(text: &str) -> Result<Complex<F>> {
    let fail = || Error::conversion(text, &format!("complex<{}>", F::NAME), "invalid complex");
    let mut body = text.trim();
    if let Some(inner) = body.strip_prefix('(') {
        body = inner.strip_suffix(')').ok_or_else(fail)?;
    }
    if body.is_empty() {
        return Err(fail());
    }

    let Some(imaginary) = body.strip_suffix('i') else {
        return Ok(Complex::new(parse_float(body).map_err(|_| fail())?, F::ZERO));
    };

    // the split is the last sign that does not belong to an exponent
    let bytes = imaginary.as_bytes();
    let split = (1..bytes.len())
        .rev()
        .find(|&i| matches!(bytes[i], b'+' | b'-') && !matches!(bytes[i - 1], b'e' | b'E' | b'p' | b'P'));
    let (re, im) = match split {
        Some(i) => (&imaginary[..i], &imaginary[i..]),
        None => ("0", imaginary),
    };
    let im = match im {
        "" | "+" => "1",
        "-" => "-1",
        other => other,
    };
    Ok(Complex::new(
        parse_float(re).map_err(|_| fail())?,
        parse_float(im).map_err(|_| fail())?,
    ))
}

// ---------------------------------------------------------------------------
// durations

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SECOND: u128 = 1_000_000_000;

/// Renders nanoseconds as `72h3m0.5s`, `1.5ms`, `0s`.
pub(crate) fn format_duration(nanos: i128) -> String {
    if nanos == 0 {
        return "0s".to_string();
    }
    let mut out = String::new();
    if nanos < 0 {
        out.push('-');
    }
    let magnitude = nanos.unsigned_abs();
    if magnitude < NANOS_PER_SECOND {
        let (scale, unit) = if magnitude < NANOS_PER_MICRO {
            (1, "ns")
        } else if magnitude < NANOS_PER_MILLI {
            (NANOS_PER_MICRO, "µs")
        } else {
            (NANOS_PER_MILLI, "ms")
        };
        push_fraction(&mut out, magnitude, scale);
        out.push_str(unit);
        return out;
    }

    let seconds = magnitude / NANOS_PER_SECOND;
    let hours = seconds / 3600;
    let minutes = seconds / 60 % 60;
    if hours > 0 {
        out.push_str(&format!("{}h", hours));
    }
    if hours > 0 || minutes > 0 {
        out.push_str(&format!("{}m", minutes));
    }
    push_fraction(&mut out, magnitude % (60 * NANOS_PER_SECOND), NANOS_PER_SECOND);
    out.push('s');
    out
}

fn push_fraction(out: &mut String, value: u128, scale: u128) {
    out.push_str(&(value / scale).to_string());
    let remainder = value % scale;
    if remainder > 0 {
        let width = scale.to_string().len() - 1;
        let fraction = format!("{:0width$}", remainder, width = width);
        out.push('.');
        out.push_str(fraction.trim_end_matches('0'));
    }
}

/// Parses a sequence of decimal numbers with units (`ns`, `us`, `µs`, `ms`,
/// `s`, `m`, `h`), each optionally fractional, with an optional leading sign.
pub(crate) fn parse_duration(text: &str) -> Result<i128> {
    let fail = |reason: &str| Error::conversion(text, "duration", reason);
    let (negative, mut rest) = split_sign(text);
    if rest == "0" {
        return Ok(0);
    }
    if rest.is_empty() {
        return Err(fail("invalid duration"));
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(|| fail("missing unit"))?;
        let (number, tail) = rest.split_at(number_len);
        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_len);
        let scale = match unit {
            "ns" => 1,
            "us" | "µs" | "μs" => NANOS_PER_MICRO,
            "ms" => NANOS_PER_MILLI,
            "s" => NANOS_PER_SECOND,
            "m" => 60 * NANOS_PER_SECOND,
            "h" => 3600 * NANOS_PER_SECOND,
            "" => return Err(fail("missing unit")),
            _ => return Err(fail("unknown unit")),
        };

        let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
        if whole.is_empty() && fraction.is_empty() {
            return Err(fail("invalid duration"));
        }
        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| fail("invalid duration"))?
        };
        let mut part = whole.checked_mul(scale).ok_or_else(|| fail("overflow"))?;
        let mut place = scale;
        for digit in fraction.bytes() {
            if !digit.is_ascii_digit() {
                return Err(fail("invalid duration"));
            }
            place /= 10;
            part += u128::from(digit - b'0') * place;
        }
        total = total.checked_add(part).ok_or_else(|| fail("overflow"))?;
        rest = tail;
    }

    let total = i128::try_from(total).map_err(|_| fail("overflow"))?;
    Ok(if negative { -total } else { total })
}
