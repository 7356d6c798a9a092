use std::process::ExitCode;

use visitbucket_core::sort_timestamps;

use crate::cli::SortArgs;
use crate::error::{CliError, CliResult, EXIT_SUCCESS, OutputFormat};
use crate::input::read_text;
use crate::shared::print_json;

pub fn run_sort(args: SortArgs, output_format: OutputFormat) -> CliResult<ExitCode> {
    let text = read_text(&args.input)?;

    let mut timestamps: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    sort_timestamps(&mut timestamps)
        .map_err(|e| CliError::input(format!("Cannot sort timestamps: {}", e)))?;

    match output_format {
        OutputFormat::Json => print_json(&timestamps)?,
        OutputFormat::Text => {
            for timestamp in &timestamps {
                println!("{}", timestamp);
            }
        }
    }

    Ok(ExitCode::from(EXIT_SUCCESS))
}
