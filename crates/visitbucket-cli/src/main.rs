use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod buckets_cmd;
mod cli;
mod error;
mod fetch_cmd;
mod filter_cmd;
mod group_cmd;
mod http_source;
mod input;
mod shared;
mod sort_cmd;

use buckets_cmd::run_buckets;
use cli::{Cli, Commands};
use error::{CliResult, OutputFormat, output_format_hint, parse_output_format, render_error};
use fetch_cmd::run_fetch;
use filter_cmd::run_filter;
use group_cmd::run_group;
use sort_cmd::run_sort;

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Resolve `--output-format`, then run the command and render any failure in it.
fn dispatch<A>(
    args: A,
    output_format: &str,
    run: fn(A, OutputFormat) -> CliResult<ExitCode>,
) -> ExitCode {
    let fallback = output_format_hint(output_format);
    let output_format = match parse_output_format(output_format) {
        Ok(format) => format,
        Err(err) => return render_error(&err, fallback),
    };

    match run(args, output_format) {
        Ok(code) => code,
        Err(err) => render_error(&err, output_format),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Buckets(args) => {
            let format = args.output_format.clone();
            dispatch(args, &format, run_buckets)
        }
        Commands::Filter(args) => {
            let format = args.output_format.clone();
            dispatch(args, &format, run_filter)
        }
        Commands::Group(args) => {
            let format = args.output_format.clone();
            dispatch(args, &format, run_group)
        }
        Commands::Sort(args) => {
            let format = args.output_format.clone();
            dispatch(args, &format, run_sort)
        }
        Commands::Fetch(args) => {
            let format = args.output_format.clone();
            dispatch(args, &format, run_fetch)
        }
    }
}
