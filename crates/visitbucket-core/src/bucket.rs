//! Bucket computation logic.
//!
//! The query range is first widened to whole units of the granularity, then
//! walked one unit at a time so that every unit gets a key, even when no
//! record falls into it. Records are assigned by their own timestamp.

use chrono::NaiveDateTime;
use tracing::debug;

use crate::error::Result;
use crate::models::{AccessRecord, BucketSeries, BucketSummary, Granularity, RecordCollection, TimeRange};
use crate::timestamp::{TimestampEncoding, parse_timestamp};

/// Partition `collection` into gap-filled buckets covering `range`.
///
/// The range is snapped outward to whole units: the floor is the start of the
/// unit containing `range.start`, the ceiling the last millisecond of the unit
/// containing `range.end`. A record lands in a bucket when
/// `floor <= timestamp <= ceiling`.
///
/// An `end` earlier than `start` yields an empty series.
///
/// # Examples
///
/// ```
/// use visitbucket_core::bucket::bucket_records;
/// use visitbucket_core::models::{Granularity, RecordCollection, TimeRange};
/// use visitbucket_core::timestamp::TimestampEncoding;
///
/// let range = TimeRange::parse(
///     "2024:1:1:00:00:00.:000",
///     "2024:1:3:12:00:00.:000",
///     TimestampEncoding::Wire,
/// )
/// .unwrap();
/// let series = bucket_records(&RecordCollection::new(), &range, Granularity::Day).unwrap();
///
/// let keys: Vec<_> = series.keys().cloned().collect();
/// assert_eq!(keys, ["2024/01/01", "2024/01/02", "2024/01/03"]);
/// ```
pub fn bucket_records(
    collection: &RecordCollection,
    range: &TimeRange,
    granularity: Granularity,
) -> Result<BucketSeries> {
    let snapped = range.snapped(granularity);

    // Seed every unit between floor and ceiling with an empty bucket
    let mut series = BucketSeries::new();
    let mut cursor = Some(snapped.start);
    while let Some(current) = cursor.filter(|c| *c <= snapped.end) {
        series.insert(granularity.key(&current), Vec::new());
        cursor = current.checked_add_signed(granularity.unit());
    }

    // Parse every key before assigning anything so one bad key aborts the run
    let mut in_range: Vec<(NaiveDateTime, &String, &AccessRecord)> = Vec::new();
    for (key, record) in collection {
        let instant = parse_timestamp(key, TimestampEncoding::Wire)?;
        if snapped.contains(&instant) {
            in_range.push((instant, key, record));
        }
    }
    in_range.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));

    for (instant, _, record) in &in_range {
        series
            .entry(granularity.key(instant))
            .or_default()
            .push((*record).clone());
    }

    debug!(
        %granularity,
        buckets = series.len(),
        assigned = in_range.len(),
        input = collection.len(),
        "Bucketed records"
    );

    Ok(series)
}

/// Daily buckets over `range`.
pub fn daily_buckets(collection: &RecordCollection, range: &TimeRange) -> Result<BucketSeries> {
    bucket_records(collection, range, Granularity::Day)
}

/// Hourly buckets over `range`.
pub fn hourly_buckets(collection: &RecordCollection, range: &TimeRange) -> Result<BucketSeries> {
    bucket_records(collection, range, Granularity::Hour)
}

/// Bucket records from string endpoints.
///
/// Convenience for callers holding raw query parameters: parses `start` and
/// `end` with `encoding`, then runs [`bucket_records`].
pub fn bucket_records_from_strings(
    collection: &RecordCollection,
    start: &str,
    end: &str,
    encoding: TimestampEncoding,
    granularity: Granularity,
) -> Result<BucketSeries> {
    let range = TimeRange::parse(start, end, encoding)?;
    bucket_records(collection, &range, granularity)
}

/// Per-bucket visit and unique-visitor counts, in bucket order.
pub fn summarize(series: &BucketSeries) -> Vec<BucketSummary> {
    series
        .iter()
        .map(|(key, records)| BucketSummary::from_bucket(key, records))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VisitBucketError;
    use crate::timestamp::format_timestamp;
    use chrono::{Duration, NaiveDate};

    fn record(timestamp: &str, visitor: &str) -> (String, AccessRecord) {
        (
            timestamp.to_string(),
            AccessRecord {
                timestamp: timestamp.to_string(),
                visitor_id: visitor.to_string(),
                confirmed: 1,
                ..Default::default()
            },
        )
    }

    fn wire_range(start: &str, end: &str) -> TimeRange {
        TimeRange::parse(start, end, TimestampEncoding::Wire).unwrap()
    }

    #[test]
    fn hourly_two_days_single_record() {
        let records: RecordCollection = vec![record("2024:1:2:13:30:00.:000", "v")]
            .into_iter()
            .collect();
        let range = wire_range("2024:1:1:00:00:00.:000", "2024:1:2:23:59:59.:999");

        let series = hourly_buckets(&records, &range).unwrap();

        assert_eq!(series.len(), 48);
        assert_eq!(series.get_index(0).unwrap().0, "2024/01/01/00");
        assert_eq!(series.get_index(47).unwrap().0, "2024/01/02/23");
        for (key, bucket) in &series {
            if key == "2024/01/02/13" {
                assert_eq!(bucket.len(), 1);
                assert_eq!(bucket[0].timestamp, "2024:1:2:13:30:00.:000");
            } else {
                assert!(bucket.is_empty(), "bucket {key} should be empty");
            }
        }
    }

    #[test]
    fn daily_three_days_no_records() {
        let range = wire_range("2024:1:1:08:00:00.:000", "2024:1:3:02:00:00.:000");
        let series = daily_buckets(&RecordCollection::new(), &range).unwrap();

        let keys: Vec<&str> = series.keys().map(String::as_str).collect();
        assert_eq!(keys, ["2024/01/01", "2024/01/02", "2024/01/03"]);
        assert!(series.values().all(Vec::is_empty));
    }

    #[test]
    fn partial_units_are_widened() {
        // Raw range excludes both records, the snapped range includes them.
        let records: RecordCollection = vec![
            record("2024:1:1:01:00:00.:000", "early"),
            record("2024:1:1:22:00:00.:000", "late"),
        ]
        .into_iter()
        .collect();
        let range = wire_range("2024:1:1:12:00:00.:000", "2024:1:1:12:30:00.:000");

        let series = daily_buckets(&records, &range).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series["2024/01/01"].len(), 2);
    }

    #[test]
    fn ceiling_includes_last_millisecond() {
        let records: RecordCollection = vec![
            record("2024:1:1:10:59:59.:999", "in"),
            record("2024:1:1:11:00:00.:000", "out"),
        ]
        .into_iter()
        .collect();
        let range = wire_range("2024:1:1:10:00:00.:000", "2024:1:1:10:00:00.:000");

        let series = hourly_buckets(&records, &range).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series["2024/01/01/10"].len(), 1);
        assert_eq!(series["2024/01/01/10"][0].visitor_id, "in");
    }

    #[test]
    fn out_of_range_records_are_dropped() {
        let records: RecordCollection = vec![
            record("2023:12:31:23:59:59.:999", "before"),
            record("2024:1:1:00:00:00.:000", "first"),
            record("2024:1:2:00:00:00.:000", "after"),
        ]
        .into_iter()
        .collect();
        let range = wire_range("2024:1:1:00:00:00.:000", "2024:1:1:18:00:00.:000");

        let series = daily_buckets(&records, &range).unwrap();
        let assigned: usize = series.values().map(Vec::len).sum();
        assert_eq!(assigned, 1);
        assert_eq!(series["2024/01/01"][0].visitor_id, "first");
    }

    #[test]
    fn walk_crosses_month_and_leap_day() {
        let range = wire_range("2024:2:28:00:00:00.:000", "2024:3:1:00:00:00.:000");
        let series = daily_buckets(&RecordCollection::new(), &range).unwrap();
        let keys: Vec<&str> = series.keys().map(String::as_str).collect();
        assert_eq!(keys, ["2024/02/28", "2024/02/29", "2024/03/01"]);
    }

    #[test]
    fn walk_crosses_year_hourly() {
        let range = wire_range("2024:12:31:22:15:00.:000", "2025:1:1:01:05:00.:000");
        let series = hourly_buckets(&RecordCollection::new(), &range).unwrap();
        let keys: Vec<&str> = series.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            ["2024/12/31/22", "2024/12/31/23", "2025/01/01/00", "2025/01/01/01"]
        );
    }

    #[test]
    fn bucket_count_matches_unit_span() {
        let floor = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        for hours in [0i64, 1, 5, 23, 24, 100] {
            let end = floor + Duration::hours(hours) + Duration::minutes(17);
            let range = TimeRange::new(floor, end);
            let series = hourly_buckets(&RecordCollection::new(), &range).unwrap();
            assert_eq!(series.len() as i64, hours + 1, "span of {hours} hours");
        }
    }

    #[test]
    fn every_in_range_record_lands_exactly_once() {
        let start = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let records: RecordCollection = (0..200i64)
            .map(|i| {
                let ts = start + Duration::minutes(i * 37);
                record(&format_timestamp(&ts, TimestampEncoding::Wire), "v")
            })
            .collect();
        let range = TimeRange::new(start + Duration::hours(10), start + Duration::hours(60));
        let snapped = range.snapped(Granularity::Hour);

        let series = hourly_buckets(&records, &range).unwrap();

        let mut seen = std::collections::HashSet::new();
        for (key, bucket) in &series {
            for r in bucket {
                let instant = parse_timestamp(&r.timestamp, TimestampEncoding::Wire).unwrap();
                assert!(snapped.contains(&instant));
                assert_eq!(&Granularity::Hour.key(&instant), key);
                assert!(seen.insert(r.timestamp.clone()), "duplicate {}", r.timestamp);
            }
        }
        let expected = records
            .keys()
            .filter(|k| snapped.contains(&parse_timestamp(k, TimestampEncoding::Wire).unwrap()))
            .count();
        assert_eq!(seen.len(), expected);
    }

    #[test]
    fn records_within_bucket_are_chronological() {
        let records: RecordCollection = vec![
            record("2024:1:1:10:30:00.:000", "b"),
            record("2024:1:1:10:05:00.:000", "a"),
            record("2024:1:1:10:59:00.:000", "c"),
        ]
        .into_iter()
        .collect();
        let range = wire_range("2024:1:1:10:00:00.:000", "2024:1:1:10:00:00.:000");

        let series = hourly_buckets(&records, &range).unwrap();
        let order: Vec<&str> = series["2024/01/01/10"]
            .iter()
            .map(|r| r.visitor_id.as_str())
            .collect();
        assert_eq!(order, ["a", "b", "c"]);
    }

    #[test]
    fn reversed_range_yields_no_buckets() {
        let records: RecordCollection = vec![record("2024:1:2:00:00:00.:000", "v")]
            .into_iter()
            .collect();
        let range = wire_range("2024:1:5:00:00:00.:000", "2024:1:1:00:00:00.:000");
        let series = daily_buckets(&records, &range).unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn malformed_key_aborts() {
        let records: RecordCollection = vec![record("2024-01-01T00:00:00Z", "v")]
            .into_iter()
            .collect();
        let range = wire_range("2024:1:1:00:00:00.:000", "2024:1:1:00:00:00.:000");
        let result = daily_buckets(&records, &range);
        assert!(matches!(
            result,
            Err(VisitBucketError::MalformedTimestamp(_))
        ));
    }

    #[test]
    fn malformed_endpoint_fails() {
        let result = bucket_records_from_strings(
            &RecordCollection::new(),
            "2024:1:1",
            "2024:1:2:00:00:00.:000",
            TimestampEncoding::Wire,
            Granularity::Day,
        );
        assert!(result.is_err());
    }

    #[test]
    fn from_strings_with_sortable_endpoints() {
        let records: RecordCollection = vec![record("2024:6:15:09:10:11.:12", "v")]
            .into_iter()
            .collect();
        let series = bucket_records_from_strings(
            &records,
            "20240615000000",
            "20240616000000",
            TimestampEncoding::Sortable,
            Granularity::Day,
        )
        .unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series["2024/06/15"].len(), 1);
        assert!(series["2024/06/16"].is_empty());
    }

    #[test]
    fn summarize_counts_per_bucket() {
        let records: RecordCollection = vec![
            record("2024:1:1:10:00:00.:000", "a"),
            record("2024:1:1:11:00:00.:000", "a"),
            record("2024:1:1:12:00:00.:000", "b"),
        ]
        .into_iter()
        .collect();
        let range = wire_range("2024:1:1:00:00:00.:000", "2024:1:2:00:00:00.:000");
        let summary = summarize(&daily_buckets(&records, &range).unwrap());

        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].key, "2024/01/01");
        assert_eq!(summary[0].visits, 3);
        assert_eq!(summary[0].unique_visitors, 2);
        assert_eq!(summary[1].visits, 0);
    }

    #[test]
    fn last_representable_day_and_hour() {
        let day = format_timestamp(
            &NaiveDate::MAX.and_hms_opt(0, 0, 0).unwrap(),
            TimestampEncoding::Wire,
        );
        let hour = format_timestamp(
            &NaiveDate::MAX.and_hms_opt(23, 0, 0).unwrap(),
            TimestampEncoding::Wire,
        );
        let records: RecordCollection = vec![record(&hour, "v")].into_iter().collect();

        let daily = daily_buckets(&records, &wire_range(&day, &day)).unwrap();
        assert_eq!(daily.len(), 1);
        assert_eq!(daily[0].len(), 1);

        let hourly = hourly_buckets(&records, &wire_range(&hour, &hour)).unwrap();
        assert_eq!(hourly.len(), 1);
        assert_eq!(hourly[0].len(), 1);
    }
}
