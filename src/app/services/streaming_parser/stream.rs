//! Lazy event stream over arbitrary byte chunks

use std::collections::VecDeque;
use std::fmt::Display;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::chunks::{drain_complete_lines, trim_line_end};
use crate::app::models::diagnostics::{DiagnosticKind, Diagnostics};
use crate::app::models::{Event, SchemaVariant};
use crate::app::services::delimiter_detector::DelimiterDetector;
use crate::app::services::format_registry::FormatConfig;
use crate::app::services::ingest_engine::decode::{decode_bytes, is_meaningful};
use crate::app::services::row_parser::RowParser;
use crate::app::services::schema_detector::SchemaDetector;
use crate::config::EngineConfig;

/// Detection results fixed by the opening sample
#[derive(Debug, Clone)]
struct Detected {
    delimiter: char,
    variant: SchemaVariant,
    /// Working parser first, alternates after it
    parsers: Vec<RowParser>,
    header_pending: bool,
}

/// Pull-based iterator of events from a chunk source.
///
/// Only the trailing partial line (plus the opening sample) is buffered.
/// Dropping the stream releases the chunk source; no other cleanup is
/// needed.
pub struct EventStream<I> {
    chunks: I,
    format: Arc<FormatConfig>,
    config: EngineConfig,
    source_id: String,
    buffer: Vec<u8>,
    pending: VecDeque<Vec<u8>>,
    detected: Option<Detected>,
    exhausted: bool,
    finished: bool,
    line_number: usize,
    events_emitted: usize,
    decode_failures: usize,
    reference_time: DateTime<Utc>,
    diagnostics: Diagnostics,
}

impl<I, B, E> EventStream<I>
where
    I: Iterator<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
{
    pub fn new(
        chunks: I,
        format: Arc<FormatConfig>,
        config: EngineConfig,
        source_id: impl Into<String>,
        reference_time: DateTime<Utc>,
    ) -> Self {
        Self {
            chunks,
            format,
            config,
            source_id: source_id.into(),
            buffer: Vec::new(),
            pending: VecDeque::new(),
            detected: None,
            exhausted: false,
            finished: false,
            line_number: 0,
            events_emitted: 0,
            decode_failures: 0,
            reference_time,
            diagnostics: Diagnostics::new(),
        }
    }

    /// Diagnostics recorded so far
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Move the recorded diagnostics out, leaving the list empty
    pub fn take_diagnostics(&mut self) -> Diagnostics {
        std::mem::take(&mut self.diagnostics)
    }

    /// Delimiter in use, once the opening sample has been inspected
    pub fn delimiter(&self) -> Option<char> {
        self.detected.as_ref().map(|d| d.delimiter)
    }

    /// Source-level layout, once the opening sample has been inspected
    pub fn schema_variant(&self) -> Option<SchemaVariant> {
        self.detected.as_ref().map(|d| d.variant)
    }

    /// Lines that were not valid UTF-8. Only the first is listed in the
    /// diagnostics; the total is added once the stream ends.
    pub fn decode_failures(&self) -> usize {
        self.decode_failures
    }

    /// Physical lines consumed so far
    pub fn lines_read(&self) -> usize {
        self.line_number
    }

    /// Pull one chunk into the buffer; false once the source is done
    fn pull(&mut self) -> bool {
        if self.exhausted {
            return false;
        }
        match self.chunks.next() {
            Some(Ok(chunk)) => {
                self.buffer.extend_from_slice(chunk.as_ref());
                true
            }
            Some(Err(err)) => {
                self.diagnostics.record(
                    DiagnosticKind::StructuralReadError,
                    Some(self.line_number + self.pending.len() + 1),
                    format!(
                        "chunk source failed after {} event(s): {}",
                        self.events_emitted, err
                    ),
                );
                self.exhausted = true;
                false
            }
            None => {
                self.exhausted = true;
                false
            }
        }
    }

    /// Buffer the opening sample and run detection on it
    fn detect(&mut self) -> Option<Detected> {
        while self.buffer.len() < self.config.stream_sample_bytes && self.pull() {}

        let sample = String::from_utf8_lossy(self.buffer.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(&self.buffer))
            .into_owned();
        if !is_meaningful(&sample, self.config.min_meaningful_len) {
            if self.exhausted {
                self.diagnostics.record(
                    DiagnosticKind::EmptyInput,
                    None,
                    format!("stream '{}' carried no meaningful content", self.source_id),
                );
                return None;
            }
            debug!("Opening sample of '{}' is blank; detecting anyway", self.source_id);
        }

        let decision = DelimiterDetector::new(self.config.heuristics.clone()).detect(
            &sample,
            Some(&self.source_id),
            self.format.separator,
        );
        if decision.no_evidence {
            self.diagnostics.record(
                DiagnosticKind::NoDelimiterEvidence,
                None,
                format!("no delimiter in opening sample; using {:?}", decision.delimiter),
            );
        }

        let schema = SchemaDetector::new(&self.config).detect(decision.delimiter, sample.lines(), &self.format);
        if let Some(warning) = &schema.warning {
            self.diagnostics
                .record(DiagnosticKind::UnrecognizedSchema, None, warning.clone());
        }

        let primary = RowParser::new(
            &self.format,
            &schema.schema,
            self.source_id.clone(),
            &self.config,
            self.reference_time,
        );
        let mut parsers = vec![primary.clone()];
        for candidate in self.format.candidates() {
            if parsers.iter().all(|p| p.separator() != candidate.separator) {
                parsers.push(primary.with_separator(candidate.separator));
            }
        }

        info!(
            "Streaming '{}' with delimiter {:?}, schema {}",
            self.source_id,
            decision.delimiter,
            schema.variant()
        );

        Some(Detected {
            delimiter: decision.delimiter,
            variant: schema.variant(),
            parsers,
            header_pending: schema.first_line_is_header,
        })
    }

    fn process_line(&mut self, raw: Vec<u8>) -> Option<Event> {
        self.line_number += 1;
        let line_number = self.line_number;

        let decoded = decode_bytes(trim_line_end(&raw));
        if let Some(message) = decoded.failure_message() {
            self.decode_failures += 1;
            if self.decode_failures == 1 {
                self.diagnostics
                    .record(DiagnosticKind::DecodeFailure, Some(line_number), message);
            } else {
                debug!("Line {} of '{}': {}", line_number, self.source_id, message);
            }
        }
        let text = decoded.into_text()?;
        if text.trim().is_empty() {
            return None;
        }

        let detected = self.detected.as_mut()?;
        if detected.header_pending {
            detected.header_pending = false;
            debug!("Skipping header line {} of '{}'", line_number, self.source_id);
            return None;
        }

        if !detected.parsers[0].is_complete(&text) {
            if let Some(position) = detected
                .parsers
                .iter()
                .skip(1)
                .position(|parser| parser.is_complete(&text))
            {
                let parser = detected.parsers.remove(position + 1);
                debug!(
                    "Line {} parses with delimiter {:?}; promoting it",
                    line_number,
                    parser.separator()
                );
                detected.parsers.insert(0, parser);
            }
        }

        let outcome = detected.parsers[0].parse_line(&text, line_number);
        outcome.into_event(&mut self.diagnostics)
    }
}

impl<I, B, E> Iterator for EventStream<I>
where
    I: Iterator<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
{
    type Item = Event;

    fn next(&mut self) -> Option<Event> {
        if self.finished {
            return None;
        }

        if self.detected.is_none() {
            match self.detect() {
                Some(detected) => self.detected = Some(detected),
                None => {
                    self.finished = true;
                    return None;
                }
            }
        }

        loop {
            if let Some(line) = self.pending.pop_front() {
                if let Some(event) = self.process_line(line) {
                    self.events_emitted += 1;
                    return Some(event);
                }
                continue;
            }

            let lines = drain_complete_lines(&mut self.buffer);
            if !lines.is_empty() {
                self.pending.extend(lines);
                continue;
            }

            if self.pull() {
                continue;
            }

            // source done: flush the trailing partial line
            if !self.buffer.is_empty() {
                let rest = std::mem::take(&mut self.buffer);
                self.pending.push_back(rest);
                continue;
            }

            if self.decode_failures > 1 {
                self.diagnostics.record(
                    DiagnosticKind::DecodeFailure,
                    None,
                    format!(
                        "{} line(s) of '{}' were not valid UTF-8",
                        self.decode_failures, self.source_id
                    ),
                );
            }

            if self.diagnostics.contains(DiagnosticKind::StructuralReadError) {
                warn!(
                    "Stream '{}' ended early with {} event(s)",
                    self.source_id, self.events_emitted
                );
            } else {
                debug!(
                    "Stream '{}' complete: {} event(s) from {} line(s)",
                    self.source_id, self.events_emitted, self.line_number
                );
            }
            self.finished = true;
            return None;
        }
    }
}
