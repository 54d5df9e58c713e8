//! Go-style duration strings.
//!
//! The backend speaks durations as strings such as `"1h30m0s"` (the interop
//! form). The UI shows them as `"1t 30m"` (the display form). Values are kept
//! as a signed count of nanoseconds.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::{
    fmt,
    iter::Sum,
    ops::{Add, Neg},
    str::FromStr,
};
use thiserror::Error;
use tracing::error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Duration(i64);

pub const NANOSECOND: Duration = Duration(1);
pub const MICROSECOND: Duration = Duration(1000 * NANOSECOND.0);
pub const MILLISECOND: Duration = Duration(1000 * MICROSECOND.0);
pub const SECOND: Duration = Duration(1000 * MILLISECOND.0);
pub const MINUTE: Duration = Duration(60 * SECOND.0);
pub const HOUR: Duration = Duration(60 * MINUTE.0);

const UNITS: &[(&str, u64)] = &[
    ("ns", NANOSECOND.0 as u64),
    ("us", MICROSECOND.0 as u64),
    ("ms", MILLISECOND.0 as u64),
    ("s", SECOND.0 as u64),
    ("m", MINUTE.0 as u64),
    ("h", HOUR.0 as u64),
];

/// Largest magnitude a duration may reach before the sign is applied.
const LIMIT: u64 = 1 << 63;

const CHECK_OVERFLOW: bool = cfg!(not(feature = "wrapping-overflow"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationError {
    #[error("empty duration '{input}'")]
    EmptyInput { input: String },

    #[error("expected number at offset {offset} in duration '{input}', found '{found}'")]
    ExpectedNumber {
        input: String,
        offset: usize,
        found: char,
    },

    #[error("invalid fraction at offset {offset} in duration '{input}'")]
    InvalidFraction { input: String, offset: usize },

    #[error("missing unit at offset {offset} in duration '{input}'")]
    MissingUnit { input: String, offset: usize },

    #[error("unknown unit '{unit}' at offset {offset} in duration '{input}'")]
    UnknownUnit {
        input: String,
        unit: String,
        offset: usize,
    },

    #[error("duration '{input}' overflows at offset {offset}")]
    Overflow { input: String, offset: usize },
}

impl DurationError {
    pub fn offset(&self) -> usize {
        match self {
            DurationError::EmptyInput { .. } => 0,
            DurationError::ExpectedNumber { offset, .. }
            | DurationError::InvalidFraction { offset, .. }
            | DurationError::MissingUnit { offset, .. }
            | DurationError::UnknownUnit { offset, .. }
            | DurationError::Overflow { offset, .. } => *offset,
        }
    }
}

impl Duration {
    pub const ZERO: Duration = Duration(0);

    pub const fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    pub const fn as_nanos(self) -> i64 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Converts fractional hours, rounding to the nearest nanosecond.
    pub fn from_hours_f64(hours: f64) -> Self {
        Self((hours * HOUR.0 as f64).round() as i64)
    }

    /// Interop form, e.g. `"1h30m0s"`.
    pub fn to_interop_string(self) -> String {
        if self.0 == 0 {
            return "0s".to_string();
        }
        let (sign, h, m, s) = self.split();
        format!("{sign}{h}h{m}m{s}s")
    }

    /// Display form, e.g. `"1t 30m"`. Seconds are dropped.
    pub fn to_display_string(self) -> String {
        if self.0 == 0 {
            return "0t".to_string();
        }
        let (sign, h, m, _) = self.split();
        format!("{sign}{h}t {m}m")
    }

    fn split(self) -> (&'static str, u64, u64, u64) {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let hour = HOUR.0 as u64;
        let minute = MINUTE.0 as u64;
        let second = SECOND.0 as u64;
        (
            sign,
            abs / hour,
            abs % hour / minute,
            abs % minute / second,
        )
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_interop_string())
    }
}

impl FromStr for Duration {
    type Err = DurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

impl Add for Duration {
    type Output = Duration;

    fn add(self, rhs: Duration) -> Duration {
        Duration(self.0.saturating_add(rhs.0))
    }
}

impl Neg for Duration {
    type Output = Duration;

    fn neg(self) -> Duration {
        Duration(self.0.saturating_neg())
    }
}

impl Sum for Duration {
    fn sum<I: Iterator<Item = Duration>>(iter: I) -> Self {
        iter.fold(Duration::ZERO, Add::add)
    }
}

/// Parses a duration, logging and discarding the error.
pub fn parse_duration(input: &str) -> Option<Duration> {
    match parse(input) {
        Ok(d) => Some(d),
        Err(err) => {
            error!(input, offset = err.offset(), "parse_duration: {err}");
            None
        }
    }
}

/// Parses a signed sequence of decimal numbers, each with an optional
/// fraction and a unit suffix, such as `"300ms"`, `"-1.5h"` or `"2h45m"`.
pub fn parse(input: &str) -> Result<Duration, DurationError> {
    let bytes = input.as_bytes();
    let mut pos = 0;
    let mut neg = false;

    if let Some(&c) = bytes.first() {
        if c == b'-' || c == b'+' {
            neg = c == b'-';
            pos = 1;
        }
    }

    if &input[pos..] == "0" {
        return Ok(Duration::ZERO);
    }
    if pos == bytes.len() {
        return Err(DurationError::EmptyInput {
            input: input.to_string(),
        });
    }

    let mut total: u64 = 0;
    while pos < bytes.len() {
        let segment_start = pos;
        let c = bytes[pos];
        if !(c == b'.' || c.is_ascii_digit()) {
            return Err(DurationError::ExpectedNumber {
                input: input.to_string(),
                offset: pos,
                found: input[pos..].chars().next().unwrap_or(c as char),
            });
        }

        let (mut v, consumed) = leading_int(&bytes[pos..]).ok_or_else(|| DurationError::Overflow {
            input: input.to_string(),
            offset: segment_start,
        })?;
        pos += consumed;
        let pre = consumed > 0;

        let mut f = 0u64;
        let mut scale = 1f64;
        let mut post = false;
        if bytes.get(pos) == Some(&b'.') {
            pos += 1;
            let (x, sc, consumed) = leading_fraction(&bytes[pos..]);
            f = x;
            scale = sc;
            pos += consumed;
            post = consumed > 0;
        }
        if !pre && !post {
            return Err(DurationError::InvalidFraction {
                input: input.to_string(),
                offset: segment_start,
            });
        }

        let unit_start = pos;
        while pos < bytes.len() && !(bytes[pos] == b'.' || bytes[pos].is_ascii_digit()) {
            pos += 1;
        }
        if pos == unit_start {
            return Err(DurationError::MissingUnit {
                input: input.to_string(),
                offset: unit_start,
            });
        }
        let token = &input[unit_start..pos];
        let unit = lookup_unit(token).ok_or_else(|| DurationError::UnknownUnit {
            input: input.to_string(),
            unit: token.to_string(),
            offset: unit_start,
        })?;

        let overflow = || DurationError::Overflow {
            input: input.to_string(),
            offset: segment_start,
        };
        if CHECK_OVERFLOW && v > LIMIT / unit {
            return Err(overflow());
        }
        v = v.wrapping_mul(unit);
        if f > 0 {
            // f64 keeps nanosecond accuracy for fractions of the largest unit (3.6e12 ns/h).
            v = v.wrapping_add((f as f64 * (unit as f64 / scale)) as u64);
            if CHECK_OVERFLOW && v > LIMIT {
                return Err(overflow());
            }
        }
        total = total.wrapping_add(v);
        if CHECK_OVERFLOW && (total < v || total > LIMIT) {
            return Err(overflow());
        }
    }

    if neg {
        return Ok(Duration((total as i64).wrapping_neg()));
    }
    if CHECK_OVERFLOW && total > LIMIT - 1 {
        return Err(DurationError::Overflow {
            input: input.to_string(),
            offset: 0,
        });
    }
    Ok(Duration(total as i64))
}

/// Converts `"Ht Mm"` (or `"0t"`) into the interop form without re-parsing.
pub fn display_to_interop(display: &str) -> String {
    if display == "0t" {
        return "0s".to_string();
    }
    let compact: String = display.chars().filter(|c| *c != ' ').collect();
    format!("{}0s", compact.replacen('t', "h", 1))
}

fn lookup_unit(token: &str) -> Option<u64> {
    UNITS
        .iter()
        .find(|(name, _)| *name == token)
        .map(|(_, multiplier)| *multiplier)
}

/// Consumes leading ASCII digits. Returns `None` when the value leaves the
/// 63-bit range and overflow checks are enabled.
fn leading_int(bytes: &[u8]) -> Option<(u64, usize)> {
    let mut x: u64 = 0;
    let mut i = 0;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        if CHECK_OVERFLOW && x > (LIMIT - 1) / 10 {
            return None;
        }
        x = x.wrapping_mul(10).wrapping_add(u64::from(bytes[i] - b'0'));
        if CHECK_OVERFLOW && x > LIMIT {
            return None;
        }
        i += 1;
    }
    Some((x, i))
}

/// Consumes leading ASCII digits after a decimal point. Digits that would
/// overflow are consumed but do not contribute.
fn leading_fraction(bytes: &[u8]) -> (u64, f64, usize) {
    let mut x: u64 = 0;
    let mut scale = 1f64;
    let mut overflow = false;
    let mut i = 0;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
        if overflow {
            continue;
        }
        if x > (LIMIT - 1) / 10 {
            overflow = true;
            continue;
        }
        let y = x * 10 + u64::from(bytes[i - 1] - b'0');
        if y > LIMIT {
            overflow = true;
            continue;
        }
        x = y;
        scale *= 10.0;
    }
    (x, scale, i)
}

impl Serialize for Duration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_interop_string())
    }
}

impl<'de> Deserialize<'de> for Duration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Wire::deserialize(deserializer)? {
            Wire::Text(text) => parse(&text).map_err(de::Error::custom),
            Wire::Nanos(nanos) => Ok(Duration(nanos)),
        }
    }
}

/// A duration as the backend may send it: interop string or raw nanoseconds.
#[derive(Deserialize)]
#[serde(untagged)]
enum Wire {
    Text(String),
    Nanos(i64),
}

/// Deserializes an optional duration. Values that fail to parse are logged and
/// become `None`, matching how the pages treat a missing duration.
pub fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Wire>::deserialize(deserializer)? {
        None => None,
        Some(Wire::Nanos(nanos)) => Some(Duration(nanos)),
        Some(Wire::Text(text)) => parse_duration(&text),
    })
}
