//! Timestamp codec.
//!
//! Access records are keyed by a colon-delimited wall-clock timestamp and
//! range queries take a digits-only form. Both are encodings of the same
//! [`NaiveDateTime`] instant:
//! - `wire`: `YYYY:M:D:H:M:S.:mmm`, components unpadded, e.g. `2024:1:2:13:30:0.:0`
//! - `sortable`: `YYYYMMDDHHMMSS`, zero-padded, e.g. `20240102133000`
//!
//! No timezone is attached; instants are local wall-clock values.

use std::cmp::Ordering;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::error::{Result, VisitBucketError};

/// Supported timestamp encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimestampEncoding {
    /// Colon-delimited record key (e.g. "2024:1:2:13:30:00.:000")
    #[default]
    Wire,
    /// Concatenated zero-padded digits (e.g. "20240102133000")
    Sortable,
}

impl std::fmt::Display for TimestampEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimestampEncoding::Wire => write!(f, "wire"),
            TimestampEncoding::Sortable => write!(f, "sortable"),
        }
    }
}

impl FromStr for TimestampEncoding {
    type Err = VisitBucketError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "wire" => Ok(TimestampEncoding::Wire),
            "sortable" => Ok(TimestampEncoding::Sortable),
            _ => Err(VisitBucketError::InvalidEncoding(format!(
                "Unknown encoding: '{}'. Expected 'wire' or 'sortable'",
                s
            ))),
        }
    }
}

/// Parse a timestamp string in the given encoding.
///
/// # Examples
///
/// ```
/// use visitbucket_core::timestamp::{parse_timestamp, TimestampEncoding};
/// use chrono::{Datelike, Timelike};
///
/// let dt = parse_timestamp("2024:1:2:13:30:00.:250", TimestampEncoding::Wire).unwrap();
/// assert_eq!((dt.month(), dt.day(), dt.hour()), (1, 2, 13));
///
/// let dt = parse_timestamp("20240102133000", TimestampEncoding::Sortable).unwrap();
/// assert_eq!(dt.minute(), 30);
/// ```
pub fn parse_timestamp(input: &str, encoding: TimestampEncoding) -> Result<NaiveDateTime> {
    let trimmed = input.trim();

    match encoding {
        TimestampEncoding::Wire => parse_wire(trimmed),
        TimestampEncoding::Sortable => parse_sortable(trimmed),
    }
}

/// Format an instant in the given encoding.
///
/// The sortable encoding has whole-second precision; milliseconds are dropped.
pub fn format_timestamp(instant: &NaiveDateTime, encoding: TimestampEncoding) -> String {
    match encoding {
        TimestampEncoding::Wire => format!(
            "{}:{}:{}:{}:{}:{}.:{}",
            instant.year(),
            instant.month(),
            instant.day(),
            instant.hour(),
            instant.minute(),
            instant.second(),
            millis_of(instant)
        ),
        TimestampEncoding::Sortable => format!(
            "{:04}{:02}{:02}{:02}{:02}{:02}",
            instant.year(),
            instant.month(),
            instant.day(),
            instant.hour(),
            instant.minute(),
            instant.second()
        ),
    }
}

/// Compare two encoded timestamps by the instants they denote.
pub fn compare_timestamps(a: &str, b: &str, encoding: TimestampEncoding) -> Result<Ordering> {
    let left = parse_timestamp(a, encoding)?;
    let right = parse_timestamp(b, encoding)?;
    Ok(left.cmp(&right))
}

/// Sort wire timestamps ascending, in place.
///
/// Every entry is parsed once up front, so a malformed entry fails the whole
/// call and leaves the slice untouched. Entries denoting the same instant
/// keep their original relative order.
pub fn sort_timestamps(timestamps: &mut [String]) -> Result<()> {
    let mut keyed = timestamps
        .iter()
        .map(|ts| parse_timestamp(ts, TimestampEncoding::Wire).map(|dt| (dt, ts.clone())))
        .collect::<Result<Vec<_>>>()?;

    keyed.sort_by(|a, b| a.0.cmp(&b.0));

    for (slot, (_, ts)) in timestamps.iter_mut().zip(keyed) {
        *slot = ts;
    }

    Ok(())
}

fn millis_of(instant: &NaiveDateTime) -> u32 {
    // Leap-second nanos (>= 1e9) are clamped into the last millisecond.
    (instant.nanosecond() / 1_000_000).min(999)
}

/// Parse the colon-delimited record key.
///
/// Accepted shapes:
/// - `Y:M:D:H:M:S.:ms` (canonical, seven colon fields)
/// - `Y:M:D:H:M:S.ms`
/// - `Y:M:D:H:M:S`
///
/// The millisecond part is an integer count, so `.:5` is 5 ms, not half a second.
fn parse_wire(input: &str) -> Result<NaiveDateTime> {
    let malformed = |reason: &str| {
        VisitBucketError::MalformedTimestamp(format!(
            "Invalid wire timestamp: '{}'. {}",
            input, reason
        ))
    };

    let fields: Vec<&str> = input.split(':').collect();
    if fields.len() < 6 || fields.len() > 7 {
        return Err(malformed("Expected 'YYYY:M:D:H:MM:SS.:mmm'."));
    }

    let (second_text, millis_text) = match (fields[5].split_once('.'), fields.get(6)) {
        (Some((second, "")), Some(millis)) => (second, Some(*millis)),
        (Some((second, frac)), None) => (second, Some(frac)),
        (None, None) => (fields[5], None),
        _ => return Err(malformed("Unexpected field after seconds.")),
    };

    let year = number(fields[0], "year", input)?;
    let month = number(fields[1], "month", input)?;
    let day = number(fields[2], "day", input)?;
    let hour = number(fields[3], "hour", input)?;
    let minute = number(fields[4], "minute", input)?;
    let second = number(second_text, "second", input)?;
    let millis = match millis_text {
        Some("") => 0,
        Some(text) => number(text, "millisecond", input)?,
        None => 0,
    };

    build(input, year, month, day, hour, minute, second, millis)
}

/// Parse the 14-digit sortable form.
fn parse_sortable(input: &str) -> Result<NaiveDateTime> {
    if input.len() != 14 || !input.bytes().all(|b| b.is_ascii_digit()) {
        return Err(VisitBucketError::MalformedTimestamp(format!(
            "Invalid sortable timestamp: '{}'. Expected 14 digits 'YYYYMMDDHHMMSS'.",
            input
        )));
    }

    let year = number(&input[0..4], "year", input)?;
    let month = number(&input[4..6], "month", input)?;
    let day = number(&input[6..8], "day", input)?;
    let hour = number(&input[8..10], "hour", input)?;
    let minute = number(&input[10..12], "minute", input)?;
    let second = number(&input[12..14], "second", input)?;

    build(input, year, month, day, hour, minute, second, 0)
}

fn number(text: &str, field: &str, input: &str) -> Result<u32> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(VisitBucketError::MalformedTimestamp(format!(
            "Invalid {} '{}' in timestamp '{}'",
            field, text, input
        )));
    }

    text.parse().map_err(|_| {
        VisitBucketError::MalformedTimestamp(format!(
            "{} '{}' out of range in timestamp '{}'",
            field, text, input
        ))
    })
}

#[allow(clippy::too_many_arguments)]
fn build(
    input: &str,
    year: u32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
    millis: u32,
) -> Result<NaiveDateTime> {
    let out_of_range = || {
        VisitBucketError::MalformedTimestamp(format!(
            "Calendar component out of range in timestamp '{}'",
            input
        ))
    };

    if millis > 999 {
        return Err(out_of_range());
    }

    let year = i32::try_from(year).map_err(|_| out_of_range())?;
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_milli_opt(hour, minute, second, millis))
        .ok_or_else(out_of_range)
}
