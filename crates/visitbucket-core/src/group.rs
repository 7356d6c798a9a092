//! Grouping utilities.

use std::hash::Hash;

use crate::models::{AccessRecord, Groups};

/// Partition `records` by a derived key.
///
/// Keys appear in the order they are first seen; records keep their input
/// order within a group.
pub fn group_by<K, F>(records: &[AccessRecord], key_fn: F) -> Groups<K>
where
    K: Hash + Eq,
    F: Fn(&AccessRecord) -> K,
{
    let mut groups = Groups::new();

    for record in records {
        groups.entry(key_fn(record)).or_insert_with(Vec::new);
    }
    for record in records {
        groups.entry(key_fn(record)).or_default().push(record.clone());
    }

    groups
}

pub fn group_by_country(records: &[AccessRecord]) -> Groups<String> {
    group_by(records, |r| r.country.clone())
}

pub fn group_by_visitor(records: &[AccessRecord]) -> Groups<String> {
    group_by(records, |r| r.visitor_id.clone())
}

pub fn group_by_source_ip(records: &[AccessRecord]) -> Groups<String> {
    group_by(records, |r| r.source_ip.clone())
}
