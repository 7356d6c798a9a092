use std::process::ExitCode;

use visitbucket_core::{filter_bot_records, filter_by_range};

use crate::cli::FilterArgs;
use crate::error::{CliResult, EXIT_SUCCESS, OutputFormat};
use crate::input::load_records;
use crate::shared::{chronological, parse_optional_range, print_json};

pub fn run_filter(args: FilterArgs, output_format: OutputFormat) -> CliResult<ExitCode> {
    let range = parse_optional_range(args.start.as_deref(), args.end.as_deref(), &args.encoding)?;

    let mut records = load_records(&args.source, range.as_ref(), None)?;
    if args.humans_only {
        records = filter_bot_records(&records);
    }
    if let Some(range) = &range {
        records = filter_by_range(&records, range)?;
    }

    let ordered = chronological(&records)?;

    match output_format {
        OutputFormat::Json => print_json(&ordered)?,
        OutputFormat::Text => {
            for record in &ordered {
                println!(
                    "{} {} {} {} {}",
                    record.timestamp,
                    record.visitor_id,
                    record.country,
                    record.source_ip,
                    record.target
                );
            }
        }
    }

    Ok(ExitCode::from(EXIT_SUCCESS))
}
