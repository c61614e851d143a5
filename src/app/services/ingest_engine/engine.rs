//! The ingestion engine: one-shot parse, incremental scan and streaming

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::io::Read;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::cursor::CursorTable;
use super::decode::{decode, is_meaningful};
use crate::app::models::diagnostics::{DiagnosticKind, Diagnostics};
use crate::app::models::{Event, ParseReport, ParserState};
use crate::app::services::delimiter_detector::DelimiterDetector;
use crate::app::services::format_registry::{FormatConfig, FormatRegistry};
use crate::app::services::row_parser::RowParser;
use crate::app::services::schema_detector::{SchemaDecision, SchemaDetector};
use crate::app::services::stats_aggregator::{PlayerStats, StatsAggregator};
use crate::app::services::streaming_parser::{EventStream, ReaderChunks};
use crate::config::EngineConfig;
use crate::constants::{ANONYMOUS_SOURCE, DEFAULT_FORMAT};
use crate::Result;

/// Content decoded and inspected, ready for row parsing
struct Prepared<'a> {
    text: Cow<'a, str>,
    delimiter: char,
    schema: SchemaDecision,
}

impl Prepared<'_> {
    /// Data lines with their 1-based physical line numbers, header excluded
    fn data_lines(&self) -> Vec<(usize, &str)> {
        let mut lines = self.text.lines().enumerate().map(|(i, line)| (i + 1, line));
        if !self.schema.first_line_is_header {
            return lines.collect();
        }

        // the header is the first non-blank line
        let _header = lines.by_ref().find(|(_, line)| !line.trim().is_empty());
        lines.collect()
    }
}

/// Death-log ingestion engine.
///
/// Holds an injected [`FormatRegistry`], the format it scans with, the
/// per-source cursors and the reference instant stamped on rows that carry
/// no timestamp. That instant is fixed when the engine is built, so parsing
/// the same content twice gives the same events. One engine may be shared across threads for `parse`
/// and `stream`; `scan` needs `&mut self`, so concurrent scans of one engine
/// must be serialized by the caller.
#[derive(Debug, Clone)]
pub struct LogIngestEngine {
    registry: Arc<FormatRegistry>,
    format: Arc<FormatConfig>,
    config: EngineConfig,
    delimiter_detector: DelimiterDetector,
    schema_detector: SchemaDetector,
    cursors: CursorTable,
    reference_time: DateTime<Utc>,
}

impl LogIngestEngine {
    /// Create an engine scanning with `format_name` from `registry`
    pub fn new(registry: Arc<FormatRegistry>, format_name: &str, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let format = registry.get(format_name)?;

        info!(
            "Initialized ingest engine with format '{}' ({} registered)",
            format.name,
            registry.len()
        );

        Ok(Self {
            delimiter_detector: DelimiterDetector::new(config.heuristics.clone()),
            schema_detector: SchemaDetector::new(&config),
            registry,
            format,
            config,
            cursors: CursorTable::new(),
            reference_time: Utc::now(),
        })
    }

    /// Engine over the built-in formats with default settings
    pub fn with_defaults() -> Result<Self> {
        Self::new(
            Arc::new(FormatRegistry::with_defaults()),
            DEFAULT_FORMAT,
            EngineConfig::default(),
        )
    }

    /// Replace the instant stamped on rows without a timestamp
    pub fn with_reference_time(mut self, reference_time: DateTime<Utc>) -> Self {
        self.reference_time = reference_time;
        self
    }

    pub fn reference_time(&self) -> DateTime<Utc> {
        self.reference_time
    }

    /// Format used by [`LogIngestEngine::scan`]
    pub fn format(&self) -> &FormatConfig {
        &self.format
    }

    pub fn registry(&self) -> &FormatRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Parse a complete buffer in one go.
    ///
    /// Returns one event per non-header, non-blank line that could be
    /// parsed or recovered; everything else is a diagnostic.
    pub fn parse(
        &self,
        content: impl AsRef<[u8]>,
        format: &FormatConfig,
        delimiter_override: Option<char>,
    ) -> ParseReport {
        self.parse_source(ANONYMOUS_SOURCE, content, format, delimiter_override)
    }

    /// [`LogIngestEngine::parse`] with a source identifier stamped on events
    pub fn parse_source(
        &self,
        source_id: &str,
        content: impl AsRef<[u8]>,
        format: &FormatConfig,
        delimiter_override: Option<char>,
    ) -> ParseReport {
        let mut diagnostics = Diagnostics::new();
        let Some(prepared) = self.prepare(
            content.as_ref(),
            source_id,
            format,
            delimiter_override,
            &mut diagnostics,
        ) else {
            return ParseReport::empty(diagnostics);
        };

        let lines = prepared.data_lines();
        let report = self.parse_lines(source_id, format, &prepared, &lines, diagnostics);
        debug!("Parsed '{}': {}", source_id, report.summary());
        report
    }

    /// Parse a buffer with a registered format looked up by name
    pub fn parse_named(
        &self,
        content: impl AsRef<[u8]>,
        format_name: &str,
        delimiter_override: Option<char>,
    ) -> Result<ParseReport> {
        let format = self.registry.get(format_name)?;
        Ok(self.parse(content, &format, delimiter_override))
    }

    /// Incremental parse against the cursor for `source_id`.
    ///
    /// With `only_new`, data lines already covered by the cursor are skipped.
    /// The cursor then moves to the end of the content, whether or not the
    /// new lines produced events.
    pub fn scan(&mut self, source_id: &str, content: impl AsRef<[u8]>, only_new: bool) -> ParseReport {
        let format = Arc::clone(&self.format);
        let mut diagnostics = Diagnostics::new();

        let Some(prepared) =
            self.prepare(content.as_ref(), source_id, &format, None, &mut diagnostics)
        else {
            // the source was emptied; a later scan starts from its first line
            if let Some(state) = self.cursors.get(source_id) {
                let (delimiter, variant) = (state.last_delimiter, state.last_variant);
                self.cursors.start_line(source_id, 0, only_new, &mut diagnostics);
                self.cursors.advance(source_id, 0, delimiter, variant);
            }
            return ParseReport::empty(diagnostics);
        };

        let lines = prepared.data_lines();
        let total = lines.len();
        let start = self
            .cursors
            .start_line(source_id, total, only_new, &mut diagnostics);

        if start > 0 {
            debug!(
                "Skipping {} already-processed line(s) of '{}'",
                start, source_id
            );
        }

        let report = self.parse_lines(source_id, &format, &prepared, &lines[start..], diagnostics);
        self.cursors
            .advance(source_id, total, prepared.delimiter, prepared.schema.variant());

        info!("Scanned '{}': {}", source_id, report.summary());
        report
    }

    /// Forget the cursor for one source; returns whether one existed
    pub fn reset_cursor(&mut self, source_id: &str) -> bool {
        self.cursors.reset(source_id)
    }

    /// Cursor state for one source
    pub fn state(&self, source_id: &str) -> Option<&ParserState> {
        self.cursors.get(source_id)
    }

    /// Forget every cursor
    pub fn clear(&mut self) {
        self.cursors.clear();
    }

    /// Number of sources with a cursor
    pub fn tracked_sources(&self) -> usize {
        self.cursors.len()
    }

    /// Lazy parse over byte chunks of any size
    pub fn stream<I, B, E>(&self, chunks: I, format: &FormatConfig) -> EventStream<I::IntoIter>
    where
        I: IntoIterator<Item = std::result::Result<B, E>>,
        B: AsRef<[u8]>,
        E: Display,
    {
        self.stream_source(ANONYMOUS_SOURCE, chunks, format)
    }

    /// [`LogIngestEngine::stream`] with a source identifier
    pub fn stream_source<I, B, E>(
        &self,
        source_id: &str,
        chunks: I,
        format: &FormatConfig,
    ) -> EventStream<I::IntoIter>
    where
        I: IntoIterator<Item = std::result::Result<B, E>>,
        B: AsRef<[u8]>,
        E: Display,
    {
        EventStream::new(
            chunks.into_iter(),
            Arc::new(format.clone()),
            self.config.clone(),
            source_id,
            self.reference_time,
        )
    }

    /// Lazy parse over a reader, read in configured chunk sizes
    pub fn stream_reader<R: Read>(
        &self,
        source_id: &str,
        reader: R,
        format: &FormatConfig,
    ) -> EventStream<ReaderChunks<R>> {
        self.stream_source(
            source_id,
            ReaderChunks::new(reader, self.config.stream_chunk_size),
            format,
        )
    }

    /// Fold events into per-player statistics
    pub fn aggregate(&self, events: &[Event]) -> BTreeMap<String, PlayerStats> {
        StatsAggregator::new().aggregate(events)
    }

    /// Decode, check for content, detect delimiter and layout
    fn prepare<'a>(
        &self,
        bytes: &'a [u8],
        source_id: &str,
        format: &FormatConfig,
        delimiter_override: Option<char>,
        diagnostics: &mut Diagnostics,
    ) -> Option<Prepared<'a>> {
        let text = decode(bytes, None, diagnostics)?;

        if !is_meaningful(&text, self.config.min_meaningful_len) {
            diagnostics.record(
                DiagnosticKind::EmptyInput,
                None,
                format!("'{}' has no meaningful content ({} bytes)", source_id, bytes.len()),
            );
            return None;
        }

        let delimiter = match delimiter_override {
            Some(delimiter) => delimiter,
            None => {
                let decision = self.delimiter_detector.detect(
                    sample(&text, self.config.sample_bytes),
                    Some(source_id),
                    format.separator,
                );
                if decision.no_evidence {
                    diagnostics.record(
                        DiagnosticKind::NoDelimiterEvidence,
                        None,
                        format!("no candidate delimiter found; using {:?}", decision.delimiter),
                    );
                }
                decision.delimiter
            }
        };

        let schema = self.schema_detector.detect(delimiter, text.lines(), format);
        if let Some(warning) = &schema.warning {
            diagnostics.record(DiagnosticKind::UnrecognizedSchema, None, warning.clone());
        }

        Some(Prepared {
            text,
            delimiter,
            schema,
        })
    }

    fn parse_lines(
        &self,
        source_id: &str,
        format: &FormatConfig,
        prepared: &Prepared<'_>,
        lines: &[(usize, &str)],
        mut diagnostics: Diagnostics,
    ) -> ParseReport {
        let parser = RowParser::new(
            format,
            &prepared.schema.schema,
            source_id,
            &self.config,
            self.reference_time,
        );

        let events: Vec<Event> = lines
            .iter()
            .filter_map(|&(line_number, line)| {
                parser
                    .parse_line(line, line_number)
                    .into_event(&mut diagnostics)
            })
            .collect();

        ParseReport {
            events,
            diagnostics,
            delimiter: Some(prepared.delimiter),
            schema_variant: Some(prepared.schema.variant()),
            lines_examined: lines.len(),
        }
    }
}

/// Prefix of at most `max_bytes`, cut on a character boundary
pub(crate) fn sample(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
