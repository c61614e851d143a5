//! Command implementations for deathlog-inspect
//!
//! Each command reads files through the filesystem adapter, hands the bytes
//! to a [`LogIngestEngine`] and renders the result.

use crate::app::adapters::filesystem::{collect_sources, open_reader, read_source, source_id};
use crate::app::models::diagnostics::Diagnostics;
use crate::app::models::{Event, EventTimestamp, ParseReport, SchemaVariant};
use crate::app::services::delimiter_detector::DelimiterDetector;
use crate::app::services::event_filter::EventFilter;
use crate::app::services::format_registry::{FormatConfig, FormatRegistry};
use crate::app::services::ingest_engine::LogIngestEngine;
use crate::app::services::ingest_engine::decode::decode;
use crate::app::services::ingest_engine::engine::sample;
use crate::app::services::schema_detector::SchemaDetector;
use crate::app::services::stats_aggregator::{
    LeaderboardEntry, PlatformSummary, StatsAggregator, leaderboard, platform_comparison,
};
use crate::cli::args::{
    Args, Commands, DetectArgs, FilterArgs, OutputFormat, ParseArgs, SourceArgs, StatsArgs,
};
use crate::config::EngineConfig;
use crate::Result;

use anyhow::Context;
use colored::*;
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Totals across every file of one run
#[derive(Debug, Clone, Default)]
pub struct InspectionSummary {
    pub files_read: usize,
    pub lines_examined: usize,
    pub events: usize,
    pub recovered: usize,
    pub diagnostics: usize,
    pub elapsed: Duration,
}

impl InspectionSummary {
    fn record(&mut self, report: &ParseReport) {
        self.files_read += 1;
        self.lines_examined += report.lines_examined;
        self.events += report.events.len();
        self.recovered += report
            .events
            .iter()
            .filter(|e| e.schema_variant == SchemaVariant::Recovered)
            .count();
        self.diagnostics += report.diagnostics.len();
    }
}

/// Main entry point for the CLI
pub fn run(args: Args) -> anyhow::Result<()> {
    setup_logging(&args)?;
    let show_progress = args.show_progress();

    match args.command {
        Some(Commands::Parse(parse_args)) => run_parse(&parse_args, show_progress),
        Some(Commands::Stats(stats_args)) => run_stats(&stats_args, show_progress),
        Some(Commands::Detect(detect_args)) => run_detect(&detect_args),
        None => Ok(()),
    }
}

/// Set up structured logging on stderr
fn setup_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("deathlog_processor={}", log_level)));

    if args.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

/// Progress bar over files, hidden when progress is off
fn create_progress_bar(total: u64, message: &str, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb
}

fn build_engine(format: &str) -> Result<LogIngestEngine> {
    LogIngestEngine::new(
        Arc::new(FormatRegistry::with_defaults()),
        format,
        EngineConfig::default(),
    )
}

fn build_filter(args: &FilterArgs) -> EventFilter {
    let mut filter = EventFilter::new()
        .with_time_range(args.since, args.until)
        .with_distance_range(args.min_distance, args.max_distance);
    if let Some(player) = &args.player {
        filter = filter.with_player(player.clone());
    }
    if let Some(weapon) = &args.weapon {
        filter = filter.with_weapon(weapon.clone());
    }
    filter
}

/// Parse one file, whole or streamed
fn load_report(
    engine: &LogIngestEngine,
    path: &Path,
    source: &SourceArgs,
    format: &FormatConfig,
) -> Result<ParseReport> {
    let id = source_id(path);

    if !source.stream {
        let bytes = read_source(path)?;
        return Ok(engine.parse_source(&id, &bytes, format, source.delimiter));
    }

    if source.delimiter.is_some() {
        warn!("Delimiter override is ignored when streaming '{}'", id);
    }
    let mut stream = engine.stream_reader(&id, open_reader(path)?, format);
    let events: Vec<Event> = stream.by_ref().collect();
    Ok(ParseReport {
        events,
        diagnostics: stream.take_diagnostics(),
        delimiter: stream.delimiter(),
        schema_variant: stream.schema_variant(),
        lines_examined: stream.lines_read(),
    })
}

/// Parse every source, one report per file in path order
fn load_all(
    source: &SourceArgs,
    show_progress: bool,
) -> anyhow::Result<(Vec<(PathBuf, ParseReport)>, InspectionSummary)> {
    let started = Instant::now();
    let engine = build_engine(&source.format)?;
    let format = engine.format().clone();
    let files = collect_sources(&source.paths)?;
    if files.is_empty() {
        anyhow::bail!("no log files found");
    }

    let pb = create_progress_bar(files.len() as u64, "Parsing", show_progress);
    let mut summary = InspectionSummary::default();
    let mut reports = Vec::with_capacity(files.len());

    for path in files {
        pb.set_message(source_id(&path));
        let report = load_report(&engine, &path, source, &format)
            .with_context(|| format!("failed to read {}", path.display()))?;
        info!("{}: {}", path.display(), report.summary());
        summary.record(&report);
        reports.push((path, report));
        pb.inc(1);
    }
    pb.finish_and_clear();

    summary.elapsed = started.elapsed();
    Ok((reports, summary))
}

fn run_parse(args: &ParseArgs, show_progress: bool) -> anyhow::Result<()> {
    let (reports, summary) = load_all(&args.source, show_progress)?;
    let filter = build_filter(&args.filter);

    match args.output_format {
        OutputFormat::Human => {
            for (path, report) in &reports {
                print_report(path, report, &filter, args);
            }
            print_summary(&summary);
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(std::io::stdout());
            for (_, report) in &reports {
                for event in filter.apply(&report.events) {
                    writer.serialize(EventRow::from(&event))?;
                }
            }
            writer.flush()?;
        }
    }
    Ok(())
}

fn print_report(path: &Path, report: &ParseReport, filter: &EventFilter, args: &ParseArgs) {
    let events = filter.apply(&report.events);
    let marker = if report.diagnostics.is_empty() {
        "✔".green()
    } else {
        "!".yellow()
    };
    let layout = match (report.delimiter, report.schema_variant) {
        (Some(delimiter), Some(variant)) => format!("delimiter {:?}, {} layout", delimiter, variant),
        _ => "no content".to_string(),
    };

    println!(
        "{} {}: {} event(s), {} diagnostic(s) ({})",
        marker,
        path.display().to_string().bold(),
        events.len(),
        report.diagnostics.len(),
        layout.dimmed()
    );

    if args.list_diagnostics {
        for diagnostic in report.diagnostics.iter() {
            println!("    {}", diagnostic.to_string().yellow());
        }
    } else if !report.diagnostics.is_empty() {
        for (kind, count) in count_by_kind(&report.diagnostics) {
            println!("    {} × {}", count, kind.yellow());
        }
    }

    for event in events.iter().take(args.show_events) {
        println!("    {}", describe_event(event));
    }
}

fn count_by_kind(diagnostics: &Diagnostics) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for diagnostic in diagnostics.iter() {
        *counts.entry(format!("{:?}", diagnostic.kind)).or_insert(0) += 1;
    }
    counts
}

fn describe_event(event: &Event) -> String {
    let line = format!("{:>5}", event.line_number).dimmed();
    if event.is_suicide {
        return format!(
            "{} {}  {} died ({})",
            line, event.timestamp, event.victim_name.cyan(), event.weapon
        );
    }
    format!(
        "{} {}  {} killed {} with {} at {:.1}m",
        line,
        event.timestamp,
        event.killer_name.cyan(),
        event.victim_name.cyan(),
        event.weapon,
        event.distance
    )
}

fn print_summary(summary: &InspectionSummary) {
    println!();
    println!("{}", "Summary".bright_green().bold());
    println!("   • Files read: {}", summary.files_read);
    println!("   • Lines examined: {}", summary.lines_examined);
    println!("   • Events: {}", summary.events);
    println!("   • Recovered rows: {}", summary.recovered);
    println!("   • Diagnostics: {}", summary.diagnostics);
    println!("   • Time: {}", HumanDuration(summary.elapsed));
}

fn run_stats(args: &StatsArgs, show_progress: bool) -> anyhow::Result<()> {
    let (reports, summary) = load_all(&args.source, show_progress)?;
    let filter = build_filter(&args.filter);

    let mut aggregator = StatsAggregator::new();
    for (_, report) in &reports {
        aggregator.extend(filter.apply(&report.events).iter());
    }
    let stats = aggregator.finish();

    let board = leaderboard(&stats, args.metric, args.limit, args.platform.as_deref());
    let platforms = args.compare_platforms.then(|| platform_comparison(&stats));

    match args.output_format {
        OutputFormat::Human => {
            print_leaderboard(args, &board, stats.len());
            if let Some(platforms) = &platforms {
                print_platforms(platforms);
            }
            print_summary(&summary);
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(std::io::stdout());
            for entry in &board {
                writer.serialize(entry)?;
            }
            writer.flush()?;

            if let Some(platforms) = &platforms {
                println!();
                let mut writer = csv::Writer::from_writer(std::io::stdout());
                for summary in platforms.values() {
                    writer.serialize(PlatformRow::from(summary))?;
                }
                writer.flush()?;
            }
        }
    }
    Ok(())
}

fn print_leaderboard(args: &StatsArgs, board: &[LeaderboardEntry], players: usize) {
    let scope = match &args.platform {
        Some(platform) => format!(" on {}", platform),
        None => String::new(),
    };
    println!(
        "{}",
        format!("Top {} by {}{} ({} players)", args.limit, args.metric, scope, players)
            .bright_green()
            .bold()
    );

    if board.is_empty() {
        println!("   (no players with a non-zero {})", args.metric);
        return;
    }
    for entry in board {
        println!(
            "   {:>3}. {:<24} {:<20} {}",
            entry.rank.to_string().bright_yellow().bold(),
            entry.name,
            entry.player_id.dimmed(),
            format_value(entry.value)
        );
    }
}

fn print_platforms(platforms: &BTreeMap<String, PlatformSummary>) {
    println!();
    println!("{}", "Platforms".bright_green().bold());
    for summary in platforms.values() {
        println!(
            "   {:<10} players {:>4}  kills {:>6}  deaths {:>6}  avg K/D {:.2}  kills most: {}  killed most by: {}",
            summary.platform.bold(),
            summary.players,
            summary.kills,
            summary.deaths,
            summary.average_kd,
            summary.dominant_victim_platform.as_deref().unwrap_or("-"),
            summary.dominant_killer_platform.as_deref().unwrap_or("-"),
        );
    }
}

fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}

fn run_detect(args: &DetectArgs) -> anyhow::Result<()> {
    let registry = FormatRegistry::with_defaults();
    let format = registry.get(&args.format)?;
    let config = EngineConfig::default();

    let bytes = read_source(&args.path)?;
    let id = source_id(&args.path);
    let mut diagnostics = Diagnostics::new();
    let Some(text) = decode(&bytes, None, &mut diagnostics) else {
        anyhow::bail!("{} does not look like text", args.path.display());
    };

    let decision = DelimiterDetector::new(config.heuristics.clone()).detect(
        sample(&text, config.sample_bytes),
        Some(&id),
        format.separator,
    );
    let schema = SchemaDetector::new(&config).detect(decision.delimiter, text.lines(), &format);

    println!("{}", id.bright_green().bold());
    println!("   Delimiter scores:");
    for (candidate, score) in &decision.scores {
        let label = format!("{:?}", candidate);
        if *candidate == decision.delimiter {
            println!("     {:<6} {}", label.bold(), score.to_string().bold());
        } else {
            println!("     {:<6} {}", label, score);
        }
    }
    if decision.no_evidence {
        println!("   {}", "no candidate delimiter found; default used".yellow());
    }
    println!("   Layout: {}", schema.variant());
    println!("   Header line: {}", if schema.first_line_is_header { "yes" } else { "no" });
    if let Some(count) = schema.data_field_count {
        println!("   Fields in first data line: {}", count);
    }
    println!("   Columns: {}", schema.schema.columns.join(", ").dimmed());
    if let Some(warning) = &schema.warning {
        println!("   {}", warning.yellow());
    }
    for diagnostic in diagnostics.iter() {
        println!("   {}", diagnostic.to_string().yellow());
    }
    Ok(())
}

/// Flat event row for CSV output
#[derive(Debug, Serialize)]
struct EventRow<'a> {
    source: &'a str,
    line: usize,
    timestamp: String,
    timestamp_resolved: bool,
    killer_name: &'a str,
    killer_id: &'a str,
    victim_name: &'a str,
    victim_id: &'a str,
    weapon: &'a str,
    distance: f64,
    killer_platform: &'a str,
    victim_platform: &'a str,
    suicide: bool,
    layout: &'static str,
}

impl<'a> From<&'a Event> for EventRow<'a> {
    fn from(event: &'a Event) -> Self {
        let timestamp = match &event.timestamp {
            EventTimestamp::Resolved(instant) => instant.to_rfc3339(),
            EventTimestamp::Unresolved(raw) => raw.clone(),
        };
        Self {
            source: &event.source_id,
            line: event.line_number,
            timestamp,
            timestamp_resolved: !event.timestamp_parse_failed(),
            killer_name: &event.killer_name,
            killer_id: &event.killer_id,
            victim_name: &event.victim_name,
            victim_id: &event.victim_id,
            weapon: &event.weapon,
            distance: event.distance,
            killer_platform: event.killer_platform.as_deref().unwrap_or(""),
            victim_platform: event.victim_platform.as_deref().unwrap_or(""),
            suicide: event.is_suicide,
            layout: event.schema_variant.tag(),
        }
    }
}

/// Flat platform summary row for CSV output
#[derive(Debug, Serialize)]
struct PlatformRow<'a> {
    platform: &'a str,
    players: usize,
    kills: u64,
    deaths: u64,
    suicides: u64,
    average_kd: f64,
    dominant_victim_platform: &'a str,
    dominant_killer_platform: &'a str,
}

impl<'a> From<&'a PlatformSummary> for PlatformRow<'a> {
    fn from(summary: &'a PlatformSummary) -> Self {
        Self {
            platform: &summary.platform,
            players: summary.players,
            kills: summary.kills,
            deaths: summary.deaths,
            suicides: summary.suicides,
            average_kd: summary.average_kd,
            dominant_victim_platform: summary.dominant_victim_platform.as_deref().unwrap_or(""),
            dominant_killer_platform: summary.dominant_killer_platform.as_deref().unwrap_or(""),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const LOG: &str = "2025.05.09-11.58.37;Alpha;A1;Bravo;B1;AKM;120;PS5;XSX\n\
                       2025.05.09-12.00.00;Bravo;B1;Alpha;A1;M4;15;XSX;PS5\n\
                       2025.05.09-12.01.00;Alpha;A1;Charlie\n";

    fn source_args(paths: Vec<PathBuf>, stream: bool) -> SourceArgs {
        SourceArgs {
            paths,
            format: crate::constants::DEFAULT_FORMAT.to_string(),
            delimiter: None,
            stream,
        }
    }

    #[test]
    fn test_load_all_whole_and_streamed_agree() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("2025.05.09-00.00.00.csv"), LOG).unwrap();

        let (whole, summary) =
            load_all(&source_args(vec![dir.path().to_path_buf()], false), false).unwrap();
        let (streamed, _) =
            load_all(&source_args(vec![dir.path().to_path_buf()], true), false).unwrap();

        assert_eq!(summary.files_read, 1);
        assert_eq!(summary.events, 3);
        assert_eq!(summary.recovered, 1);
        assert_eq!(whole[0].1.events, streamed[0].1.events);
    }

    #[test]
    fn test_load_all_without_files() {
        let dir = TempDir::new().unwrap();
        assert!(load_all(&source_args(vec![dir.path().to_path_buf()], false), false).is_err());
    }

    #[test]
    fn test_unknown_format_is_an_error() {
        assert!(build_engine("no-such-format").is_err());
    }

    #[test]
    fn test_build_filter() {
        let args = FilterArgs {
            weapon: Some("akm".to_string()),
            ..FilterArgs::default()
        };
        let filter = build_filter(&args);
        assert!(!filter.is_empty());
        assert!(build_filter(&FilterArgs::default()).is_empty());
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(3.0), "3");
        assert_eq!(format_value(1.5), "1.50");
    }
}
