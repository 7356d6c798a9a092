//! # visitbucket-core
//!
//! Filtering and calendar bucketing for website access records.
//!
//! Access records arrive as an unordered map keyed by a colon-delimited
//! wall-clock timestamp. This library narrows them (human visitors only,
//! closed time range) and partitions them into gap-filled daily or hourly
//! buckets, or into groups by country, visitor or source address.
//!
//! ## Features
//!
//! - **Two explicit encodings**: the `wire` record key (`2024:1:2:13:30:00.:000`)
//!   and the `sortable` query form (`20240102133000`) of one instant type.
//! - **Gap-filled buckets**: every day or hour of a range gets a key, even
//!   without data.
//! - **Per-visitor bot filtering**: one confirmed-human record clears all of a
//!   visitor's records.
//! - **Pure stages**: every filter and bucketing call returns a fresh collection.
//!
//! ## Example
//!
//! ```rust
//! use visitbucket_core::prelude::*;
//!
//! let payload = r#"{"2024:1:2:13:30:00.:000": {"uuid": "v-1", "country": "DE", "confirmed": 1}}"#;
//! let records = records_from_json(payload).unwrap();
//!
//! let range = TimeRange::parse(
//!     "2024:1:1:00:00:00.:000",
//!     "2024:1:2:23:59:59.:999",
//!     TimestampEncoding::Wire,
//! )
//! .unwrap();
//!
//! let humans = filter_bot_records(&records);
//! let series = bucket_records(&humans, &range, Granularity::Hour).unwrap();
//!
//! assert_eq!(series.len(), 48);
//! assert_eq!(series["2024/01/02/13"].len(), 1);
//! ```

pub mod bucket;
pub mod error;
pub mod filter;
pub mod group;
pub mod models;
pub mod source;
pub mod timestamp;

// Re-export commonly used types at the crate root
pub use bucket::{bucket_records, bucket_records_from_strings, daily_buckets, hourly_buckets, summarize};
pub use error::{Result, VisitBucketError};
pub use filter::{filter_bot_records, filter_by_range, human_visitor_ids};
pub use group::{group_by, group_by_country, group_by_source_ip, group_by_visitor};
pub use models::{
    AccessRecord, BucketSeries, BucketSummary, Granularity, Groups, RecordCollection, TimeRange,
};
pub use source::{MemorySource, RecordSource, records_from_json};
pub use timestamp::{
    TimestampEncoding, compare_timestamps, format_timestamp, parse_timestamp, sort_timestamps,
};

/// Prelude module for convenient imports.
///
/// ```
/// use visitbucket_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::bucket::{bucket_records, daily_buckets, hourly_buckets, summarize};
    pub use crate::error::{Result, VisitBucketError};
    pub use crate::filter::{filter_bot_records, filter_by_range, human_visitor_ids};
    pub use crate::group::*;
    pub use crate::models::*;
    pub use crate::source::{RecordSource, fetch_records_for_recent_months, records_from_json};
    pub use crate::timestamp::{
        TimestampEncoding, compare_timestamps, format_timestamp, parse_timestamp, sort_timestamps,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{
        "2024:1:1:09:15:00.:000": {"country": "DE", "source_ip": "10.0.0.1", "uuid": "alice", "confirmed": 1},
        "2024:1:1:09:40:00.:000": {"country": "DE", "source_ip": "10.0.0.1", "uuid": "alice", "confirmed": 0},
        "2024:1:1:10:05:00.:000": {"country": "US", "source_ip": "10.0.0.9", "uuid": "crawler", "confirmed": 0},
        "2024:1:2:18:00:00.:000": {"country": "FR", "source_ip": "10.0.0.2", "uuid": "bob", "confirmed": 1},
        "2024:1:4:00:00:00.:000": {"country": "FR", "source_ip": "10.0.0.2", "uuid": "bob", "confirmed": 1}
    }"#;

    #[test]
    fn full_workflow_daily_humans() {
        let records = records_from_json(PAYLOAD).unwrap();
        let range = TimeRange::parse("20240101000000", "20240103000000", TimestampEncoding::Sortable)
            .unwrap();

        let humans = filter_bot_records(&records);
        let in_range = filter_by_range(&humans, &range).unwrap();
        let series = daily_buckets(&in_range, &range).unwrap();
        let summary = summarize(&series);

        let rows: Vec<(&str, usize, usize)> = summary
            .iter()
            .map(|s| (s.key.as_str(), s.visits, s.unique_visitors))
            .collect();
        assert_eq!(
            rows,
            [("2024/01/01", 2, 1), ("2024/01/02", 1, 1), ("2024/01/03", 0, 0)]
        );
    }

    #[test]
    fn full_workflow_grouping() {
        let records = records_from_json(PAYLOAD).unwrap();
        let mut timestamps: Vec<String> = records.keys().cloned().collect();
        sort_timestamps(&mut timestamps).unwrap();

        let ordered: Vec<AccessRecord> = timestamps.iter().map(|t| records[t].clone()).collect();
        let by_country = group_by_country(&ordered);

        let keys: Vec<&str> = by_country.keys().map(String::as_str).collect();
        assert_eq!(keys, ["DE", "US", "FR"]);
        assert_eq!(group_by_visitor(&ordered)["bob"].len(), 2);
        assert_eq!(group_by_source_ip(&ordered)["10.0.0.1"].len(), 2);
    }

    #[test]
    fn empty_input_is_never_an_error() {
        let records = RecordCollection::new();
        let range = TimeRange::parse("20240101000000", "20240101000000", TimestampEncoding::Sortable)
            .unwrap();

        assert!(filter_bot_records(&records).is_empty());
        assert!(filter_by_range(&records, &range).unwrap().is_empty());
        let series = hourly_buckets(&records, &range).unwrap();
        assert_eq!(series.len(), 1);
        assert!(human_visitor_ids(records.values()).is_empty());
    }

    #[test]
    fn prelude_exports() {
        use crate::prelude::*;

        let _encoding = TimestampEncoding::Sortable;
        let _granularity = Granularity::Hour;
        let _series = BucketSeries::new();
    }
}
