use clap::{Parser, Subcommand};

/// Access-record filtering and time bucketing tool
#[derive(Parser, Debug)]
#[command(name = "visitbucket", version)]
#[command(about = "Access-record filtering and time bucketing tool")]
pub struct Cli {
    /// Enable verbose (debug) logging
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Count records per day or hour over a range
    Buckets(BucketsArgs),
    /// Print records surviving the range and bot filters
    Filter(FilterArgs),
    /// Count records per country, visitor or source address
    Group(GroupArgs),
    /// Sort wire timestamps chronologically
    Sort(SortArgs),
    /// Fetch records from the reporting service
    Fetch(FetchArgs),
}

/// Where records come from: a JSON payload file or the reporting service.
#[derive(clap::Args, Debug)]
pub struct SourceArgs {
    /// Record payload file (use - for stdin)
    #[arg(long, default_value = "-")]
    pub input: String,

    /// Reporting service base URL; overrides --input when set
    #[arg(long, env = "VISITBUCKET_HOST")]
    pub host: Option<String>,

    /// Reporting service access token
    #[arg(long, env = "VISITBUCKET_TOKEN", default_value = "", hide_env_values = true)]
    pub token: String,
}

#[derive(clap::Args, Debug)]
pub struct BucketsArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Bucket granularity: day, hour
    #[arg(short, long, default_value = "day")]
    pub granularity: String,

    /// Start of range (inclusive)
    #[arg(long)]
    pub start: String,

    /// End of range (inclusive)
    #[arg(long)]
    pub end: String,

    /// Encoding of --start/--end: wire, sortable
    #[arg(short, long, default_value = "wire")]
    pub encoding: String,

    /// Drop visitors never confirmed human
    #[arg(long)]
    pub humans_only: bool,

    /// Output format: json, text
    #[arg(long, default_value = "json")]
    pub output_format: String,
}

#[derive(clap::Args, Debug)]
pub struct FilterArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Start of range (inclusive)
    #[arg(long, requires = "end")]
    pub start: Option<String>,

    /// End of range (inclusive)
    #[arg(long, requires = "start")]
    pub end: Option<String>,

    /// Encoding of --start/--end: wire, sortable
    #[arg(short, long, default_value = "wire")]
    pub encoding: String,

    /// Drop visitors never confirmed human
    #[arg(long)]
    pub humans_only: bool,

    /// Output format: json, text
    #[arg(long, default_value = "json")]
    pub output_format: String,
}

#[derive(clap::Args, Debug)]
pub struct GroupArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Grouping key: country, visitor, ip
    #[arg(long, default_value = "country")]
    pub by: String,

    /// Start of range (inclusive)
    #[arg(long, requires = "end")]
    pub start: Option<String>,

    /// End of range (inclusive)
    #[arg(long, requires = "start")]
    pub end: Option<String>,

    /// Encoding of --start/--end: wire, sortable
    #[arg(short, long, default_value = "wire")]
    pub encoding: String,

    /// Drop visitors never confirmed human
    #[arg(long)]
    pub humans_only: bool,

    /// Output format: json, text
    #[arg(long, default_value = "json")]
    pub output_format: String,
}

#[derive(clap::Args, Debug)]
pub struct SortArgs {
    /// File with one wire timestamp per line (use - for stdin)
    #[arg(long, default_value = "-")]
    pub input: String,

    /// Output format: json, text
    #[arg(long, default_value = "text")]
    pub output_format: String,
}

#[derive(clap::Args, Debug)]
pub struct FetchArgs {
    /// Reporting service base URL
    #[arg(long, env = "VISITBUCKET_HOST")]
    pub host: String,

    /// Reporting service access token
    #[arg(long, env = "VISITBUCKET_TOKEN", default_value = "", hide_env_values = true)]
    pub token: String,

    /// Start of range (sortable, YYYYMMDDHHMMSS)
    #[arg(long, requires = "end", conflicts_with_all = ["recent_months", "timestamp"])]
    pub start: Option<String>,

    /// End of range (sortable, YYYYMMDDHHMMSS)
    #[arg(long, requires = "start")]
    pub end: Option<String>,

    /// Fetch the last N months up to now
    #[arg(long, conflicts_with = "timestamp")]
    pub recent_months: Option<u32>,

    /// Fetch a single record by wire timestamp
    #[arg(long)]
    pub timestamp: Option<String>,

    /// List timestamps only (range queries)
    #[arg(long)]
    pub timestamps_only: bool,

    /// Output format: json, text
    #[arg(long, default_value = "json")]
    pub output_format: String,
}
