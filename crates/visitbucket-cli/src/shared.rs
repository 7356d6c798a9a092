use serde::Serialize;
use visitbucket_core::{AccessRecord, Granularity, RecordCollection, TimeRange, TimestampEncoding};

use crate::error::{CliError, CliResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    Country,
    Visitor,
    Ip,
}

pub fn parse_granularity(s: &str) -> CliResult<Granularity> {
    s.parse::<Granularity>()
        .map_err(|_| CliError::input(format!("Invalid granularity '{}'. Expected: day, hour", s)))
}

pub fn parse_encoding(s: &str) -> CliResult<TimestampEncoding> {
    s.parse::<TimestampEncoding>().map_err(|_| {
        CliError::input(format!(
            "Invalid encoding '{}'. Expected: wire, sortable",
            s
        ))
    })
}

pub fn parse_group_key(s: &str) -> CliResult<GroupKey> {
    match s.to_lowercase().as_str() {
        "country" => Ok(GroupKey::Country),
        "visitor" | "uuid" => Ok(GroupKey::Visitor),
        "ip" | "source_ip" => Ok(GroupKey::Ip),
        _ => Err(CliError::input(format!(
            "Invalid group key '{}'. Expected: country, visitor, ip",
            s
        ))),
    }
}

pub fn parse_range(start: &str, end: &str, encoding: TimestampEncoding) -> CliResult<TimeRange> {
    TimeRange::parse(start, end, encoding)
        .map_err(|e| CliError::input(format!("Invalid range: {}", e)))
}

pub fn parse_optional_range(
    start: Option<&str>,
    end: Option<&str>,
    encoding: &str,
) -> CliResult<Option<TimeRange>> {
    match (start, end) {
        (Some(start), Some(end)) => Ok(Some(parse_range(start, end, parse_encoding(encoding)?)?)),
        (None, None) => Ok(None),
        _ => Err(CliError::input("--start and --end must be given together")),
    }
}

/// Records of `collection` in chronological key order.
pub fn chronological(collection: &RecordCollection) -> CliResult<Vec<AccessRecord>> {
    let mut keys: Vec<String> = collection.keys().cloned().collect();
    visitbucket_core::sort_timestamps(&mut keys)?;
    Ok(keys
        .iter()
        .filter_map(|key| collection.get(key).cloned())
        .collect())
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::runtime(format!("Failed to serialize JSON: {}", e)))?;
    println!("{}", json);
    Ok(())
}
