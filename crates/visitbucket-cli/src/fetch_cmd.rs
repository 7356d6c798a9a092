use std::process::ExitCode;

use chrono::Local;
use indexmap::IndexMap;
use visitbucket_core::source::fetch_records_for_recent_months;
use visitbucket_core::{AccessRecord, RecordSource, TimestampEncoding, sort_timestamps};

use crate::cli::FetchArgs;
use crate::error::{CliError, CliResult, EXIT_SUCCESS, OutputFormat};
use crate::http_source::HttpSource;
use crate::shared::{chronological, parse_range, print_json};

pub fn run_fetch(args: FetchArgs, output_format: OutputFormat) -> CliResult<ExitCode> {
    let source = HttpSource::new(&args.host, &args.token)?;

    if let Some(timestamp) = &args.timestamp {
        let record = source.fetch_record_by_timestamp(timestamp)?;
        print_records(&[record], output_format)?;
        return Ok(ExitCode::from(EXIT_SUCCESS));
    }

    if args.timestamps_only {
        let (start, end) = explicit_range(&args)?;
        let mut timestamps = source.fetch_timestamps_in_range(start, end)?;
        sort_timestamps(&mut timestamps)?;
        match output_format {
            OutputFormat::Json => print_json(&timestamps)?,
            OutputFormat::Text => {
                for timestamp in &timestamps {
                    println!("{}", timestamp);
                }
            }
        }
        return Ok(ExitCode::from(EXIT_SUCCESS));
    }

    let records = match args.recent_months {
        Some(months) => {
            fetch_records_for_recent_months(&source, Local::now().naive_local(), months)?
        }
        None => {
            let (start, end) = explicit_range(&args)?;
            source.fetch_records_in_range(start, end)?
        }
    };

    print_records(&chronological(&records)?, output_format)?;
    Ok(ExitCode::from(EXIT_SUCCESS))
}

/// Validated sortable `--start`/`--end` pair.
fn explicit_range(args: &FetchArgs) -> CliResult<(&str, &str)> {
    match (args.start.as_deref(), args.end.as_deref()) {
        (Some(start), Some(end)) => {
            parse_range(start, end, TimestampEncoding::Sortable)?;
            Ok((start, end))
        }
        _ => Err(CliError::input(
            "Give --start and --end, --recent-months, or --timestamp",
        )),
    }
}

/// Print in the service's payload shape, keyed by timestamp.
fn print_records(records: &[AccessRecord], output_format: OutputFormat) -> CliResult<()> {
    match output_format {
        OutputFormat::Json => {
            let payload: IndexMap<&str, &AccessRecord> = records
                .iter()
                .map(|record| (record.timestamp.as_str(), record))
                .collect();
            print_json(&payload)
        }
        OutputFormat::Text => {
            for record in records {
                println!(
                    "{} {} {} {} {}",
                    record.timestamp,
                    record.visitor_id,
                    record.country,
                    record.source_ip,
                    record.target
                );
            }
            Ok(())
        }
    }
}
