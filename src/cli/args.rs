//! Command-line argument definitions for deathlog-inspect
//!
//! The binary is a local byte supplier and presenter around the engine:
//! it reads files, hands their bytes to the engine and prints what comes
//! back.

use crate::app::services::stats_aggregator::LeaderboardMetric;
use crate::app::services::timestamp_normalizer::TimestampNormalizer;
use crate::config::EngineConfig;
use crate::constants::{DEFAULT_FORMAT, PRIMARY_DATETIME_FORMAT};
use chrono::{DateTime, Utc};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the death-log inspector
#[derive(Debug, Clone, Parser)]
#[command(
    name = "deathlog-inspect",
    version,
    about = "Parse, inspect and summarise game-server death-log CSV files",
    long_about = "Reads death-log CSV files, detects their delimiter and column layout, \
                  normalizes every row into a structured event and reports per-player \
                  statistics. Malformed rows are reported as diagnostics, never as errors."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        global = true,
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Only show errors and the final output
    #[arg(
        short = 'q',
        long = "quiet",
        global = true,
        help = "Suppress logging and progress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Parse log files and summarise events and diagnostics
    Parse(ParseArgs),
    /// Aggregate player statistics and print a leaderboard
    Stats(StatsArgs),
    /// Show delimiter scores and the detected layout of one file
    Detect(DetectArgs),
}

/// Options shared by commands that read log content
#[derive(Debug, Clone, ClapArgs)]
pub struct SourceArgs {
    /// Files or directories to read; directories are walked for *.csv files
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,

    /// Registered format name
    #[arg(
        short = 'f',
        long = "format",
        value_name = "NAME",
        default_value = DEFAULT_FORMAT,
        help = "Log format to parse with (deadside, extended, legacy, custom)"
    )]
    pub format: String,

    /// Force a delimiter instead of detecting one
    #[arg(
        short = 'd',
        long = "delimiter",
        value_name = "CHAR",
        value_parser = parse_delimiter,
        help = "Delimiter override: a single character, or 'tab'"
    )]
    pub delimiter: Option<char>,

    /// Read files in chunks instead of loading them whole
    #[arg(long = "stream", help = "Stream files in chunks instead of reading them whole")]
    pub stream: bool,
}

/// Event filter options
#[derive(Debug, Clone, Default, ClapArgs)]
pub struct FilterArgs {
    /// Only events at or after this instant
    #[arg(long = "since", value_name = "TIME", value_parser = parse_instant)]
    pub since: Option<DateTime<Utc>>,

    /// Only events at or before this instant
    #[arg(long = "until", value_name = "TIME", value_parser = parse_instant)]
    pub until: Option<DateTime<Utc>>,

    /// Only events involving this player id (killer or victim)
    #[arg(long = "player", value_name = "ID")]
    pub player: Option<String>,

    /// Only events with this weapon (case-insensitive)
    #[arg(long = "weapon", value_name = "NAME")]
    pub weapon: Option<String>,

    #[arg(long = "min-distance", value_name = "METERS")]
    pub min_distance: Option<f64>,

    #[arg(long = "max-distance", value_name = "METERS")]
    pub max_distance: Option<f64>,
}

/// Arguments for the parse command
#[derive(Debug, Clone, Parser)]
pub struct ParseArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub filter: FilterArgs,

    /// Print up to this many events per file
    #[arg(
        short = 'n',
        long = "show-events",
        value_name = "COUNT",
        default_value_t = 0,
        help = "Print the first COUNT events of each file"
    )]
    pub show_events: usize,

    /// Print every diagnostic instead of a per-kind count
    #[arg(long = "diagnostics", help = "List every diagnostic")]
    pub list_diagnostics: bool,

    /// Output format for results
    #[arg(long = "output-format", value_enum, default_value = "human")]
    pub output_format: OutputFormat,
}

/// Arguments for the stats command
#[derive(Debug, Clone, Parser)]
pub struct StatsArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub filter: FilterArgs,

    /// Metric to rank players by
    #[arg(
        short = 'm',
        long = "metric",
        value_name = "METRIC",
        default_value = "kills",
        help = "Ranking metric (kills, deaths, kd, longest_kill, suicides, avg_distance)"
    )]
    pub metric: LeaderboardMetric,

    /// Number of players to show
    #[arg(short = 'l', long = "limit", value_name = "COUNT", default_value_t = 10)]
    pub limit: usize,

    /// Restrict the leaderboard to one platform
    #[arg(short = 'p', long = "platform", value_name = "NAME")]
    pub platform: Option<String>,

    /// Also print the cross-platform comparison
    #[arg(long = "compare-platforms")]
    pub compare_platforms: bool,

    /// Output format for results
    #[arg(long = "output-format", value_enum, default_value = "human")]
    pub output_format: OutputFormat,
}

/// Arguments for the detect command
#[derive(Debug, Clone, Parser)]
pub struct DetectArgs {
    /// File to inspect
    #[arg(value_name = "FILE")]
    pub path: PathBuf,

    /// Registered format name
    #[arg(short = 'f', long = "format", value_name = "NAME", default_value = DEFAULT_FORMAT)]
    pub format: String,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// CSV for further analysis
    Csv,
}

impl Args {
    /// Log level implied by the verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Progress bars are hidden in quiet mode
    pub fn show_progress(&self) -> bool {
        !self.quiet
    }
}

/// Parse a delimiter argument: one character, `tab` or `\t`
pub fn parse_delimiter(s: &str) -> std::result::Result<char, String> {
    match s {
        "tab" | "\\t" | "\t" => return Ok('\t'),
        _ => {}
    }
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(format!("delimiter must be a single character, got '{}'", s)),
    }
}

/// Parse a time bound with the same encodings accepted in log files
pub fn parse_instant(s: &str) -> std::result::Result<DateTime<Utc>, String> {
    TimestampNormalizer::from_config(PRIMARY_DATETIME_FORMAT, &EngineConfig::default())
        .parse(s)
        .ok_or_else(|| format!("unrecognized time '{}'", s))
}
