//! Record filters.
//!
//! Each filter builds a new collection and leaves its input untouched, so
//! stages can be re-run on the same data.

use std::collections::HashSet;

use tracing::debug;

use crate::error::Result;
use crate::models::{AccessRecord, RecordCollection, TimeRange};
use crate::timestamp::{TimestampEncoding, parse_timestamp};

/// Visitor ids that own at least one confirmed-human record.
pub fn human_visitor_ids<'a, I>(records: I) -> HashSet<String>
where
    I: IntoIterator<Item = &'a AccessRecord>,
{
    records
        .into_iter()
        .filter(|record| record.is_human())
        .map(|record| record.visitor_id.clone())
        .collect()
}

/// Keep every record of every visitor that was ever confirmed human.
///
/// The decision is per visitor: once a visitor has one `confirmed == 1`
/// record, all of that visitor's records pass, including unconfirmed ones.
pub fn filter_bot_records(collection: &RecordCollection) -> RecordCollection {
    let humans = human_visitor_ids(collection.values());

    let filtered: RecordCollection = collection
        .iter()
        .filter(|(_, record)| humans.contains(&record.visitor_id))
        .map(|(key, record)| (key.clone(), record.clone()))
        .collect();

    debug!(
        input = collection.len(),
        kept = filtered.len(),
        humans = humans.len(),
        "Filtered bot records"
    );

    filtered
}

/// Keep records whose key lies in the closed range `[range.start, range.end]`.
///
/// Keys are parsed as wire timestamps; a malformed key fails the whole call.
pub fn filter_by_range(collection: &RecordCollection, range: &TimeRange) -> Result<RecordCollection> {
    let mut in_range = RecordCollection::new();

    for (key, record) in collection {
        let instant = parse_timestamp(key, TimestampEncoding::Wire)?;
        // The end is usually the last observed timestamp, so it stays included.
        if range.contains(&instant) {
            in_range.insert(key.clone(), record.clone());
        }
    }

    debug!(
        input = collection.len(),
        kept = in_range.len(),
        "Filtered records by range"
    );

    Ok(in_range)
}
