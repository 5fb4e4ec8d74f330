//! Duration text in the compact `1h30m0s` grammar.
//!
//! A duration is a sequence of decimal numbers, each with an optional fraction
//! and a required unit: `ns`, `us` (or `µs`/`μs`), `ms`, `s`, `m`, `h`.
//! A bare `0` is also accepted.

use std::fmt::Write;
use std::time::Duration;

use super::{CodecError, CodecOptions, Element};
use crate::node::Scalar;

const NANOS_PER_SEC: u128 = 1_000_000_000;

fn unit_nanos(unit: &str) -> Option<u128> {
    Some(match unit {
        "ns" => 1,
        "us" | "\u{b5}s" | "\u{3bc}s" => 1_000,
        "ms" => 1_000_000,
        "s" => NANOS_PER_SEC,
        "m" => 60 * NANOS_PER_SEC,
        "h" => 3_600 * NANOS_PER_SEC,
        _ => return None,
    })
}

fn split_digits(s: &str) -> (&str, &str) {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s.split_at(end)
}

pub fn parse_duration(raw: &str) -> Result<Duration, CodecError> {
    let fail = |reason: &str| CodecError::new(raw, "duration", reason);

    let mut s = raw.strip_prefix('+').unwrap_or(raw);
    if s.starts_with('-') {
        return Err(fail("negative durations are not supported"));
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }
    if s.is_empty() {
        return Err(fail("empty duration"));
    }

    let mut total: u128 = 0;
    while !s.is_empty() {
        let (whole, rest) = split_digits(s);
        let (fraction, rest) = match rest.strip_prefix('.') {
            Some(after_dot) => split_digits(after_dot),
            None => ("", rest),
        };
        if whole.is_empty() && fraction.is_empty() {
            return Err(fail("expected a number"));
        }

        let unit_end = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let (unit, rest) = rest.split_at(unit_end);
        let scale = match unit_nanos(unit) {
            Some(scale) => scale,
            None if unit.is_empty() => return Err(fail("missing unit")),
            None => return Err(fail(&format!("unknown unit '{unit}'"))),
        };

        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| fail("value out of range"))?
        };
        let mut value = whole
            .checked_mul(scale)
            .ok_or_else(|| fail("value out of range"))?;
        if !fraction.is_empty() {
            // Digits past nanosecond precision cannot change the result.
            let digits = &fraction[..fraction.len().min(18)];
            let numerator: u128 = digits.parse().map_err(|_| fail("invalid fraction"))?;
            value += numerator * scale / 10u128.pow(digits.len() as u32);
        }
        total = total
            .checked_add(value)
            .ok_or_else(|| fail("value out of range"))?;
        s = rest;
    }

    let secs = u64::try_from(total / NANOS_PER_SEC).map_err(|_| fail("value out of range"))?;
    Ok(Duration::new(secs, (total % NANOS_PER_SEC) as u32))
}

/// `whole[.fraction]` of `value / unit`, trailing zeros dropped.
fn fixed_point(value: u128, unit: u128) -> String {
    let whole = value / unit;
    let rem = value % unit;
    if rem == 0 {
        return whole.to_string();
    }
    let width = unit.ilog10() as usize;
    let digits = format!("{rem:0width$}");
    format!("{whole}.{}", digits.trim_end_matches('0'))
}

pub fn format_duration(d: Duration) -> String {
    let nanos = d.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }
    if nanos < 1_000 {
        return format!("{nanos}ns");
    }
    if nanos < 1_000_000 {
        return format!("{}\u{b5}s", fixed_point(nanos, 1_000));
    }
    if nanos < NANOS_PER_SEC {
        return format!("{}ms", fixed_point(nanos, 1_000_000));
    }

    let secs = d.as_secs();
    let hours = secs / 3_600;
    let minutes = (secs / 60) % 60;
    let seconds = u128::from(secs % 60) * NANOS_PER_SEC + u128::from(d.subsec_nanos());

    let mut out = String::new();
    if hours > 0 {
        let _ = write!(out, "{hours}h");
    }
    if hours > 0 || minutes > 0 {
        let _ = write!(out, "{minutes}m");
    }
    let _ = write!(out, "{}s", fixed_point(seconds, NANOS_PER_SEC));
    out
}

impl Element for Duration {
    const KIND: Option<Scalar> = Some(Scalar::Duration);

    fn encode_element(&self, _opts: &CodecOptions) -> String {
        format_duration(*self)
    }

    fn decode_element(raw: &str, _opts: &CodecOptions) -> Result<Self, CodecError> {
        parse_duration(raw)
    }
}
