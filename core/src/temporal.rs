//! Date and date-time leaf formatting.
//!
//! Patterns use moment-style tokens (`YYYY-MM-DD HH:mm`) and are translated
//! into chrono strftime items. A pattern that already contains `%` is passed
//! to chrono untouched.
//!
//! | Token | Meaning | Token | Meaning |
//! |---|---|---|---|
//! | `YYYY` / `YY` | year | `HH` / `H` | hour (00-23) |
//! | `MMMM` / `MMM` | month name | `hh` / `h` | hour (01-12) |
//! | `MM` / `M` | month number | `mm` / `m` | minute |
//! | `DD` / `D` | day of month | `ss` / `s` | second |
//! | `dddd` / `ddd` | weekday name | `SSS` | milliseconds |
//! | `A` / `a` | AM/PM, am/pm | `ZZ` / `Z` | offset `+0200` / `+02:00` |
//!
//! Text inside `[...]` is copied literally.

use std::fmt::{self, Write};

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime};

use crate::error::{Result, SerializeError};

/// Converts date-times into the user's zone.
///
/// With user-timezone conversion enabled, a date-time is first passed
/// through [`to_local`](Localizer::to_local) and then formatted in the zone
/// it was converted to.
pub trait Localizer {
    /// Re-expresses `value` in the user's zone.
    fn to_local(&self, value: DateTime<FixedOffset>) -> DateTime<FixedOffset>;
}

/// Uses the host's local zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLocalizer;

impl Localizer for SystemLocalizer {
    fn to_local(&self, value: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
        value.with_timezone(&Local).fixed_offset()
    }
}

/// Uses a fixed UTC offset.
///
/// # Examples
///
/// ```
/// use chrono::{DateTime, FixedOffset};
/// use to_dict_core::{FixedLocalizer, Localizer};
///
/// let utc = DateTime::parse_from_rfc3339("2024-01-15T22:30:00Z").unwrap();
/// let localizer = FixedLocalizer(FixedOffset::east_opt(3 * 3600).unwrap());
/// assert_eq!(localizer.to_local(utc).to_rfc3339(), "2024-01-16T01:30:00+03:00");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FixedLocalizer(pub FixedOffset);

impl Localizer for FixedLocalizer {
    fn to_local(&self, value: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
        value.with_timezone(&self.0)
    }
}

/// Translates a moment-style pattern into a strftime pattern.
///
/// # Examples
///
/// ```
/// use to_dict_core::temporal::to_strftime;
///
/// assert_eq!(to_strftime("YYYY-MM-DD HH:mm"), "%Y-%m-%d %H:%M");
/// assert_eq!(to_strftime("[Day] D, h:mm A"), "Day %-d, %-I:%M %p");
/// assert_eq!(to_strftime("%d/%m/%Y"), "%d/%m/%Y");
/// ```
pub fn to_strftime(pattern: &str) -> String {
    if pattern.contains('%') {
        return pattern.to_string();
    }

    // Longest tokens first so that `YYYY` never matches as two `YY`.
    const TOKENS: &[(&str, &str)] = &[
        ("YYYY", "%Y"),
        ("MMMM", "%B"),
        ("dddd", "%A"),
        ("MMM", "%b"),
        ("ddd", "%a"),
        ("SSS", "%3f"),
        ("YY", "%y"),
        ("MM", "%m"),
        ("DD", "%d"),
        ("HH", "%H"),
        ("hh", "%I"),
        ("mm", "%M"),
        ("ss", "%S"),
        ("ZZ", "%z"),
        ("M", "%-m"),
        ("D", "%-d"),
        ("H", "%-H"),
        ("h", "%-I"),
        ("m", "%-M"),
        ("s", "%-S"),
        ("A", "%p"),
        ("a", "%P"),
        ("Z", "%:z"),
    ];

    let mut out = String::with_capacity(pattern.len() * 2);
    let mut rest = pattern;
    'outer: while let Some(c) = rest.chars().next() {
        if c == '[' {
            if let Some(end) = rest.find(']') {
                out.push_str(&rest[1..end]);
                rest = &rest[end + 1..];
                continue;
            }
        }
        for (token, spec) in TOKENS {
            if let Some(tail) = rest.strip_prefix(token) {
                out.push_str(spec);
                rest = tail;
                continue 'outer;
            }
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }
    out
}

fn parse_items<'a>(strftime: &'a str, pattern: &str) -> Result<Vec<Item<'a>>> {
    let items: Vec<Item<'a>> = StrftimeItems::new(strftime).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(invalid(pattern));
    }
    Ok(items)
}

fn invalid(pattern: &str) -> SerializeError {
    SerializeError::InvalidFormat {
        pattern: pattern.to_string(),
    }
}

/// Writes through `write!` so that items a value cannot render surface as
/// an error instead of a panic.
fn render(formatted: impl fmt::Display, pattern: &str) -> Result<String> {
    let mut out = String::new();
    write!(out, "{formatted}").map_err(|_| invalid(pattern))?;
    Ok(out)
}

/// Formats a zone-aware date-time in its own zone.
///
/// # Errors
///
/// Returns [`SerializeError::InvalidFormat`] if chrono rejects the
/// translated pattern.
///
/// # Examples
///
/// ```
/// use chrono::DateTime;
/// use to_dict_core::temporal::format_datetime;
///
/// let dt = DateTime::parse_from_rfc3339("2024-01-15T22:30:00+02:00").unwrap();
/// assert_eq!(format_datetime(&dt, "YYYY-MM-DD HH:mm").unwrap(), "2024-01-15 22:30");
/// assert_eq!(format_datetime(&dt, "YYYY-MM-DD").unwrap(), "2024-01-15");
/// ```
pub fn format_datetime(value: &DateTime<FixedOffset>, pattern: &str) -> Result<String> {
    let strftime = to_strftime(pattern);
    let items = parse_items(&strftime, pattern)?;
    render(value.format_with_items(items.iter()), pattern)
}

/// Formats a date-time without a zone.
///
/// Offset tokens have nothing to render and make the pattern invalid.
pub fn format_naive_datetime(value: &NaiveDateTime, pattern: &str) -> Result<String> {
    let strftime = to_strftime(pattern);
    let items = parse_items(&strftime, pattern)?;
    render(value.format_with_items(items.iter()), pattern)
}

/// Formats a date.
///
/// Time-of-day tokens have nothing to render and make the pattern invalid.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use to_dict_core::temporal::format_date;
///
/// let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
/// assert_eq!(format_date(&date, "DD.MM.YYYY").unwrap(), "09.03.2024");
/// assert_eq!(format_date(&date, "D MMMM YYYY").unwrap(), "9 March 2024");
/// ```
pub fn format_date(value: &NaiveDate, pattern: &str) -> Result<String> {
    let strftime = to_strftime(pattern);
    let items = parse_items(&strftime, pattern)?;
    render(value.format_with_items(items.iter()), pattern)
}

/// Interprets a naive date-time as UTC.
pub(crate) fn assume_utc(value: &NaiveDateTime) -> DateTime<FixedOffset> {
    value.and_utc().fixed_offset()
}
