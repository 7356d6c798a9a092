//! Core data types for visitbucket.
//!
//! This module defines the primary types used throughout the library:
//! - [`AccessRecord`] - One logged visit
//! - [`RecordCollection`] - Timestamp-keyed, unordered record set
//! - [`Granularity`] - Bucket width (day/hour)
//! - [`TimeRange`] - Closed query range with an explicit encoding
//! - [`BucketSeries`] - Ordered, gap-filled bucketing result
//! - [`BucketSummary`] - Per-bucket counts for rendering

use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VisitBucketError};
use crate::timestamp::{TimestampEncoding, parse_timestamp};

/// One logged visit as reported by the access-report service.
///
/// The service keys records by their wire timestamp and leaves it out of the
/// record body, so `timestamp` is filled in by the loader after decoding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRecord {
    #[serde(default, skip_deserializing)]
    pub timestamp: String,
    /// ISO region code.
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub source_ip: String,
    /// Stable pseudonymous visitor identifier.
    #[serde(rename = "uuid", default)]
    pub visitor_id: String,
    #[serde(default)]
    pub user_agent: String,
    #[serde(default)]
    pub deploy_time: String,
    /// Requested path.
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub time: String,
    /// 1 when the visitor passed the humanity check, 0 otherwise.
    #[serde(default)]
    pub confirmed: u8,
}

impl AccessRecord {
    pub fn is_human(&self) -> bool {
        self.confirmed == 1
    }
}

/// Records keyed by wire timestamp. Iteration order carries no meaning.
pub type RecordCollection = HashMap<String, AccessRecord>;

/// Bucket key to records, chronological by construction.
pub type BucketSeries = IndexMap<String, Vec<AccessRecord>>;

/// Derived key to records, in first-seen key order.
pub type Groups<K> = IndexMap<K, Vec<AccessRecord>>;

/// Bucket granularity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// One calendar day, key `YYYY/MM/DD`
    #[default]
    Day,
    /// One calendar hour, key `YYYY/MM/DD/HH`
    Hour,
}

impl Granularity {
    /// Start of the unit containing `instant`.
    pub fn floor(self, instant: NaiveDateTime) -> NaiveDateTime {
        match self {
            Granularity::Day => instant.date().and_time(NaiveTime::MIN),
            Granularity::Hour => instant
                .date()
                .and_time(NaiveTime::MIN + Duration::hours(i64::from(instant.hour()))),
        }
    }

    /// Last millisecond of the unit containing `instant`.
    ///
    /// Saturates at [`NaiveDateTime::MAX`] for the last representable unit.
    pub fn ceiling(self, instant: NaiveDateTime) -> NaiveDateTime {
        self.floor(instant)
            .checked_add_signed(self.unit() - Duration::milliseconds(1))
            .unwrap_or(NaiveDateTime::MAX)
    }

    /// Width of one bucket.
    pub fn unit(self) -> Duration {
        match self {
            Granularity::Day => Duration::days(1),
            Granularity::Hour => Duration::hours(1),
        }
    }

    /// Bucket key for the unit containing `instant`.
    pub fn key(self, instant: &NaiveDateTime) -> String {
        match self {
            Granularity::Day => instant.format("%Y/%m/%d").to_string(),
            Granularity::Hour => instant.format("%Y/%m/%d/%H").to_string(),
        }
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Granularity::Day => write!(f, "day"),
            Granularity::Hour => write!(f, "hour"),
        }
    }
}

impl FromStr for Granularity {
    type Err = VisitBucketError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "day" | "daily" => Ok(Granularity::Day),
            "hour" | "hourly" => Ok(Granularity::Hour),
            _ => Err(VisitBucketError::InvalidGranularity(format!(
                "Unknown granularity: '{}'. Expected 'day' or 'hour'",
                s
            ))),
        }
    }
}

/// Closed query range `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// Parse both endpoints with the same encoding.
    pub fn parse(start: &str, end: &str, encoding: TimestampEncoding) -> Result<Self> {
        Ok(Self {
            start: parse_timestamp(start, encoding)?,
            end: parse_timestamp(end, encoding)?,
        })
    }

    pub fn contains(&self, instant: &NaiveDateTime) -> bool {
        self.start <= *instant && *instant <= self.end
    }

    /// Widen the range to whole units of `granularity`.
    pub fn snapped(&self, granularity: Granularity) -> Self {
        Self {
            start: granularity.floor(self.start),
            end: granularity.ceiling(self.end),
        }
    }
}

/// Per-bucket figures a dashboard renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketSummary {
    pub key: String,
    /// Number of records in the bucket.
    pub visits: usize,
    /// Number of distinct visitor ids in the bucket.
    pub unique_visitors: usize,
}

impl BucketSummary {
    pub fn from_bucket(key: &str, records: &[AccessRecord]) -> Self {
        let visitors: HashSet<&str> = records.iter().map(|r| r.visitor_id.as_str()).collect();
        Self {
            key: key.to_string(),
            visits: records.len(),
            unique_visitors: visitors.len(),
        }
    }
}
