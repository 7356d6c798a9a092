use std::fs;
use std::io::{self, Read};

use anyhow::Context;
use tracing::{debug, info};
use visitbucket_core::{
    Granularity, RecordCollection, RecordSource, TimeRange, TimestampEncoding, format_timestamp,
    records_from_json,
};

use crate::cli::SourceArgs;
use crate::error::{CliError, CliResult};
use crate::http_source::HttpSource;

/// Read a file, or stdin when `path` is `-`.
pub fn read_text(path: &str) -> CliResult<String> {
    read_text_inner(path).map_err(|e| CliError::runtime(format!("{e:#}")))
}

fn read_text_inner(path: &str) -> anyhow::Result<String> {
    if path == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read stdin")?;
        Ok(buffer)
    } else {
        fs::read_to_string(path).with_context(|| format!("Failed to open file '{path}'"))
    }
}

/// Load records from the service (when `--host` is set) or from a payload file.
///
/// Service queries need a range; it is widened to whole `granularity` units
/// when one is given so that partially covered buckets are fetched complete.
pub fn load_records(
    source: &SourceArgs,
    range: Option<&TimeRange>,
    granularity: Option<Granularity>,
) -> CliResult<RecordCollection> {
    if let Some(host) = &source.host {
        let range = range.ok_or_else(|| {
            CliError::input("--start and --end are required when reading from --host")
        })?;
        let range = match granularity {
            Some(granularity) => range.snapped(granularity),
            None => *range,
        };
        let start = format_timestamp(&range.start, TimestampEncoding::Sortable);
        let end = format_timestamp(&range.end, TimestampEncoding::Sortable);

        info!(%host, %start, %end, "Fetching records from service");
        let http = HttpSource::new(host, &source.token)?;
        return Ok(http.fetch_records_in_range(&start, &end)?);
    }

    let body = read_text(&source.input)?;
    let records = records_from_json(&body)?;
    debug!(input = %source.input, count = records.len(), "Loaded records");
    Ok(records)
}
