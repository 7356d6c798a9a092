use std::process::ExitCode;

use visitbucket_core::{
    BucketSummary, filter_bot_records, filter_by_range, group_by_country, group_by_source_ip,
    group_by_visitor,
};

use crate::cli::GroupArgs;
use crate::error::{CliResult, EXIT_SUCCESS, OutputFormat};
use crate::input::load_records;
use crate::shared::{
    GroupKey, chronological, parse_group_key, parse_optional_range, print_json,
};

pub fn run_group(args: GroupArgs, output_format: OutputFormat) -> CliResult<ExitCode> {
    let key = parse_group_key(&args.by)?;
    let range = parse_optional_range(args.start.as_deref(), args.end.as_deref(), &args.encoding)?;

    let mut records = load_records(&args.source, range.as_ref(), None)?;
    if args.humans_only {
        records = filter_bot_records(&records);
    }
    if let Some(range) = &range {
        records = filter_by_range(&records, range)?;
    }

    // First-seen group order follows time, so feed records chronologically
    let ordered = chronological(&records)?;
    let groups = match key {
        GroupKey::Country => group_by_country(&ordered),
        GroupKey::Visitor => group_by_visitor(&ordered),
        GroupKey::Ip => group_by_source_ip(&ordered),
    };

    let rows: Vec<BucketSummary> = groups
        .iter()
        .map(|(key, records)| BucketSummary::from_bucket(key, records))
        .collect();

    match output_format {
        OutputFormat::Json => print_json(&rows)?,
        OutputFormat::Text => {
            for row in rows {
                println!(
                    "{}: {} visits, {} unique visitors",
                    row.key, row.visits, row.unique_visitors
                );
            }
        }
    }

    Ok(ExitCode::from(EXIT_SUCCESS))
}
