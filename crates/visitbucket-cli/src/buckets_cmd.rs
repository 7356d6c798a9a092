use std::process::ExitCode;

use visitbucket_core::{bucket_records, filter_bot_records, summarize};

use crate::cli::BucketsArgs;
use crate::error::{CliResult, EXIT_SUCCESS, OutputFormat};
use crate::input::load_records;
use crate::shared::{parse_encoding, parse_granularity, parse_range, print_json};

pub fn run_buckets(args: BucketsArgs, output_format: OutputFormat) -> CliResult<ExitCode> {
    let granularity = parse_granularity(&args.granularity)?;
    let encoding = parse_encoding(&args.encoding)?;
    let range = parse_range(&args.start, &args.end, encoding)?;

    let mut records = load_records(&args.source, Some(&range), Some(granularity))?;
    if args.humans_only {
        records = filter_bot_records(&records);
    }

    let series = bucket_records(&records, &range, granularity)?;
    let summary = summarize(&series);

    match output_format {
        OutputFormat::Json => print_json(&summary)?,
        OutputFormat::Text => {
            for row in summary {
                println!(
                    "{}: {} visits, {} unique visitors",
                    row.key, row.visits, row.unique_visitors
                );
            }
        }
    }

    Ok(ExitCode::from(EXIT_SUCCESS))
}
