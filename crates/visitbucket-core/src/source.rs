//! Data-source contract.
//!
//! The reporting service is reached through [`RecordSource`]. Range
//! endpoints are always sortable timestamps. Records come back without their
//! key in the body, so every implementation re-stamps `timestamp` from the
//! key before handing records out ([`records_from_json`] does this for the
//! service's JSON payloads).

use std::collections::HashMap;

use chrono::{Months, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use tracing::debug;

use crate::error::{Result, VisitBucketError};
use crate::models::{AccessRecord, RecordCollection, TimeRange};
use crate::timestamp::{TimestampEncoding, format_timestamp, parse_timestamp};

/// Fetch operations the aggregation core relies on.
///
/// Sortable range endpoints match record timestamps at second precision.
pub trait RecordSource {
    /// Raw wire timestamps of records in `[start, end]`.
    fn fetch_timestamps_in_range(&self, start: &str, end: &str) -> Result<Vec<String>>;

    /// A single record by its wire timestamp, with `timestamp` attached.
    fn fetch_record_by_timestamp(&self, timestamp: &str) -> Result<AccessRecord>;

    /// All records in `[start, end]`, each with `timestamp` attached.
    ///
    /// Sortable endpoints carry no milliseconds, so records match them at
    /// second precision: `2024:1:2:0:0:0.:500` is inside `..=20240102000000`
    /// here, while [`filter_by_range`](crate::filter::filter_by_range) with
    /// the same millisecond-free end drops it.
    fn fetch_records_in_range(&self, start: &str, end: &str) -> Result<RecordCollection>;
}

/// Decode a `{ "<wire timestamp>": { ...record... } }` payload.
pub fn records_from_json(body: &str) -> Result<RecordCollection> {
    let decoded: HashMap<String, AccessRecord> = serde_json::from_str(body)
        .map_err(|e| VisitBucketError::PayloadError(format!("Invalid record map: {}", e)))?;

    Ok(decoded
        .into_iter()
        .map(|(timestamp, record)| {
            let record = stamp(record, &timestamp);
            (timestamp, record)
        })
        .collect())
}

/// Decode a single record body and attach its key.
pub fn record_from_json(timestamp: &str, body: &str) -> Result<AccessRecord> {
    let record: AccessRecord = serde_json::from_str(body)
        .map_err(|e| VisitBucketError::PayloadError(format!("Invalid record: {}", e)))?;
    Ok(stamp(record, timestamp))
}

/// Decode a JSON array of wire timestamps.
pub fn timestamps_from_json(body: &str) -> Result<Vec<String>> {
    serde_json::from_str(body)
        .map_err(|e| VisitBucketError::PayloadError(format!("Invalid timestamp list: {}", e)))
}

fn stamp(mut record: AccessRecord, timestamp: &str) -> AccessRecord {
    record.timestamp = timestamp.to_string();
    record
}

/// Range from `months` calendar months before `now` up to `now`.
///
/// Month arithmetic clamps to the end of shorter months (Mar 31 minus one
/// month is Feb 29 in a leap year). The start never goes below year 0, the
/// earliest instant with a 14-digit sortable form.
pub fn recent_months_range(now: NaiveDateTime, months: u32) -> TimeRange {
    let earliest = earliest_sortable();
    let start = now
        .checked_sub_months(Months::new(months))
        .map_or(earliest, |start| start.max(earliest));
    TimeRange::new(start, now)
}

fn earliest_sortable() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(0, 1, 1)
        .unwrap_or_default()
        .and_time(NaiveTime::MIN)
}

/// Fetch all records of the last `months` months.
pub fn fetch_records_for_recent_months<S>(
    source: &S,
    now: NaiveDateTime,
    months: u32,
) -> Result<RecordCollection>
where
    S: RecordSource + ?Sized,
{
    let range = recent_months_range(now, months);
    let start = format_timestamp(&range.start, TimestampEncoding::Sortable);
    let end = format_timestamp(&range.end, TimestampEncoding::Sortable);

    debug!(%start, %end, months, "Fetching recent records");
    source.fetch_records_in_range(&start, &end)
}

/// In-memory source over an already loaded collection.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    records: RecordCollection,
}

impl MemorySource {
    pub fn new(records: RecordCollection) -> Self {
        Self { records }
    }

    fn matching(&self, start: &str, end: &str) -> Result<Vec<(&String, &AccessRecord)>> {
        let range = TimeRange::parse(start, end, TimestampEncoding::Sortable)?;
        let mut matching = Vec::new();
        for (key, record) in &self.records {
            let instant = parse_timestamp(key, TimestampEncoding::Wire)?;
            // Sortable endpoints have no milliseconds; compare at second precision
            if range.contains(&instant.with_nanosecond(0).unwrap_or(instant)) {
                matching.push((key, record));
            }
        }
        Ok(matching)
    }
}

impl RecordSource for MemorySource {
    fn fetch_timestamps_in_range(&self, start: &str, end: &str) -> Result<Vec<String>> {
        Ok(self
            .matching(start, end)?
            .into_iter()
            .map(|(key, _)| key.clone())
            .collect())
    }

    fn fetch_record_by_timestamp(&self, timestamp: &str) -> Result<AccessRecord> {
        self.records
            .get(timestamp)
            .map(|record| stamp(record.clone(), timestamp))
            .ok_or_else(|| VisitBucketError::TransportError {
                status: Some(404),
                body: format!("No record at '{}'", timestamp),
            })
    }

    fn fetch_records_in_range(&self, start: &str, end: &str) -> Result<RecordCollection> {
        Ok(self
            .matching(start, end)?
            .into_iter()
            .map(|(key, record)| (key.clone(), stamp(record.clone(), key)))
            .collect())
    }
}
