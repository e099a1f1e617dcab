//! Parsing of human-readable durations such as `300ms` or `1h15m30.5s`.
//!
//! The grammar is a possibly signed sequence of decimal numbers, each with an
//! optional fraction and a mandatory unit suffix:
//!
//! | Unit            | Meaning      |
//! |-----------------|--------------|
//! | `ns`            | nanoseconds  |
//! | `us`, `µs`, `μs` | microseconds |
//! | `ms`            | milliseconds |
//! | `s`             | seconds      |
//! | `m`             | minutes      |
//! | `h`             | hours        |
//!
//! A bare `0` is the only number accepted without a unit. The total must fit
//! in a signed 64-bit count of nanoseconds, so a negative total may reach one
//! nanosecond further than a positive one.

use crate::{Error, Result};
use core::time::Duration;

const NANOS_PER_MICRO: u64 = 1_000;
const NANOS_PER_MILLI: u64 = 1_000_000;
const NANOS_PER_SEC: u64 = 1_000_000_000;
/// Largest positive duration, in nanoseconds (`i64::MAX`).
const MAX_NANOS: u64 = i64::MAX as u64;
/// Largest magnitude of any term or running total (`i64::MIN` negated).
const MAX_MAGNITUDE: u64 = 1 << 63;

fn unit_nanos(unit: &str) -> Option<u64> {
    Some(match unit {
        "ns" => 1,
        // U+00B5 MICRO SIGN and U+03BC GREEK SMALL LETTER MU
        "us" | "\u{b5}s" | "\u{3bc}s" => NANOS_PER_MICRO,
        "ms" => NANOS_PER_MILLI,
        "s" => NANOS_PER_SEC,
        "m" => 60 * NANOS_PER_SEC,
        "h" => 60 * 60 * NANOS_PER_SEC,
        _ => return None,
    })
}

/// Parses a duration string like `"1.5h"`, `"300ms"` or `"-2h45m"`.
///
/// Negative durations are valid input but cannot be slept on; they parse to
/// [`Duration::ZERO`].
///
/// # Errors
///
/// Returns [`Error::InvalidDuration`] if `input` is empty, contains a number
/// without a unit, uses an unknown unit, or overflows.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let (negative, mut rest) = match input.as_bytes().first() {
        Some(b'-') => (true, &input[1..]),
        Some(b'+') => (false, &input[1..]),
        _ => (false, input),
    };

    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(Error::invalid_duration(input, "empty"));
    }

    let mut total: u64 = 0;
    while !rest.is_empty() {
        let (whole, after_whole) = split_digits(rest);
        let (fraction, after_fraction) = match after_whole.strip_prefix('.') {
            Some(after_dot) => split_digits(after_dot),
            None => ("", after_whole),
        };
        if whole.is_empty() && fraction.is_empty() {
            return Err(Error::invalid_duration(input, "expected a number"));
        }

        let unit_len = after_fraction
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(after_fraction.len());
        if unit_len == 0 {
            return Err(Error::invalid_duration(input, "missing unit"));
        }
        let (unit, remaining) = after_fraction.split_at(unit_len);
        let unit = unit_nanos(unit).ok_or_else(|| Error::invalid_duration(input, "unknown unit"))?;

        let term = term_nanos(whole, fraction, unit)
            .ok_or_else(|| Error::invalid_duration(input, "overflow"))?;
        total = total
            .checked_add(term)
            .filter(|total| *total <= MAX_MAGNITUDE)
            .ok_or_else(|| Error::invalid_duration(input, "overflow"))?;

        rest = remaining;
    }

    if negative {
        return Ok(Duration::ZERO);
    }
    if total > MAX_NANOS {
        return Err(Error::invalid_duration(input, "overflow"));
    }
    Ok(Duration::from_nanos(total))
}

/// Splits `s` after its leading run of ASCII digits.
fn split_digits(s: &str) -> (&str, &str) {
    let end = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    s.split_at(end)
}

/// Computes `whole.fraction * unit` in nanoseconds, truncating sub-nanosecond
/// precision. Returns `None` on overflow.
fn term_nanos(whole: &str, fraction: &str, unit: u64) -> Option<u64> {
    let mut value: u64 = 0;
    for digit in whole.bytes() {
        value = value.checked_mul(10)?.checked_add(u64::from(digit - b'0'))?;
        if value > MAX_MAGNITUDE {
            return None;
        }
    }
    let mut nanos = value.checked_mul(unit).filter(|n| *n <= MAX_MAGNITUDE)?;

    // Digits past what a u64 can scale are below nanosecond precision for
    // every unit and are ignored.
    let mut numerator: u128 = 0;
    let mut scale: u128 = 1;
    for digit in fraction.bytes().take(19) {
        numerator = numerator * 10 + u128::from(digit - b'0');
        scale *= 10;
    }
    if numerator > 0 {
        let extra = u64::try_from(numerator * u128::from(unit) / scale).ok()?;
        nanos = nanos.checked_add(extra).filter(|n| *n <= MAX_MAGNITUDE)?;
    }
    Some(nanos)
}
