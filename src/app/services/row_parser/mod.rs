//! Row parsing for death-log lines
//!
//! Turns one raw line into one [`Event`], a recovered event, or an explicit
//! drop signal. Nothing a line contains can make parsing fail.
//!
//! ## Architecture
//!
//! - [`fields`] - Quote-aware splitting and numeric coercion
//! - [`record`] - Alias-aware column mapping and event construction
//! - [`recovery`] - Positional recovery of truncated rows
//!
//! ## Usage
//!
//! ```rust
//! use chrono::Utc;
//! use deathlog_processor::app::models::SchemaVariant;
//! use deathlog_processor::app::services::row_parser::{RowOutcome, RowParser};
//! use deathlog_processor::{EngineConfig, FormatConfig};
//!
//! let format = FormatConfig::deadside();
//! let schema = format.resolve(SchemaVariant::Legacy);
//! let parser = RowParser::new(&format, &schema, "deaths.csv", &EngineConfig::default(), Utc::now());
//! match parser.parse_line("2025.05.09-11.58.37;A;A1;B;B1;AK;10", 1) {
//!     RowOutcome::Parsed(event) => assert_eq!(event.weapon, "AK"),
//!     other => panic!("unexpected {other:?}"),
//! }
//! ```

pub mod fields;
pub mod record;
pub mod recovery;

#[cfg(test)]
mod tests;

use chrono::{DateTime, Utc};

use crate::app::models::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::app::models::{Event, EventTimestamp, SchemaVariant};
use crate::app::services::format_registry::{FormatConfig, ResolvedSchema};
use crate::app::services::timestamp_normalizer::TimestampNormalizer;
use crate::config::EngineConfig;

pub use fields::{coerce_distance, split_fields};
pub use record::{
    ColumnIndex, RequiredColumn, RowContext, build_event, is_suicide, missing_in_event,
    missing_in_fields,
};
pub use recovery::RowRecoverer;

/// Result of parsing one line
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    /// Complete row mapped onto a layout
    Parsed(Event),
    /// Short row rebuilt positionally
    Recovered(Event, Diagnostic),
    /// Row skipped, with the reason
    Dropped(Diagnostic),
    /// Whitespace-only line
    Blank,
}

impl RowOutcome {
    /// Record this outcome's diagnostics and hand back its event, if any
    pub fn into_event(self, diagnostics: &mut Diagnostics) -> Option<Event> {
        let event = match self {
            RowOutcome::Parsed(event) => event,
            RowOutcome::Recovered(event, diagnostic) => {
                diagnostics.push(diagnostic);
                event
            }
            RowOutcome::Dropped(diagnostic) => {
                diagnostics.push(diagnostic);
                return None;
            }
            RowOutcome::Blank => return None,
        };

        if let EventTimestamp::Unresolved(raw) = &event.timestamp {
            diagnostics.record(
                DiagnosticKind::TimestampUnparseable,
                Some(event.line_number),
                format!("timestamp '{raw}' kept as text"),
            );
        }
        Some(event)
    }

    pub fn event(&self) -> Option<&Event> {
        match self {
            RowOutcome::Parsed(event) | RowOutcome::Recovered(event, _) => Some(event),
            _ => None,
        }
    }
}

/// Line parser bound to one source, its detected layout and delimiter.
///
/// Complete rows map onto the source layout whatever their own length, so a
/// row is tagged with the layout of the source it came from.
#[derive(Debug, Clone)]
pub struct RowParser {
    source_id: String,
    separator: char,
    variant: SchemaVariant,
    index: ColumnIndex,
    required: Vec<RequiredColumn>,
    required_min_fields: usize,
    recovery_floor: usize,
    normalizer: TimestampNormalizer,
    recoverer: RowRecoverer,
}

impl RowParser {
    /// Parser for rows laid out per `schema`, a layout of `format`.
    ///
    /// `reference_time` stamps rows too short to carry a timestamp.
    pub fn new(
        format: &FormatConfig,
        schema: &ResolvedSchema,
        source_id: impl Into<String>,
        config: &EngineConfig,
        reference_time: DateTime<Utc>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            separator: schema.separator,
            variant: schema.variant,
            index: ColumnIndex::new(schema),
            required: RequiredColumn::locate(&format.required_columns, schema),
            required_min_fields: config.required_min_fields,
            recovery_floor: config.recovery_floor,
            normalizer: TimestampNormalizer::from_config(schema.datetime_format.clone(), config),
            recoverer: RowRecoverer::new(reference_time),
        }
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    /// Layout complete rows are tagged with
    pub fn variant(&self) -> SchemaVariant {
        self.variant
    }

    /// Same parser splitting on another delimiter
    pub fn with_separator(&self, separator: char) -> Self {
        Self {
            separator,
            ..self.clone()
        }
    }

    /// Fields the line splits into under this parser's delimiter
    pub fn field_count(&self, line: &str) -> usize {
        split_fields(line, self.separator).len()
    }

    /// Whether the line reaches a complete layout
    pub fn is_complete(&self, line: &str) -> bool {
        self.field_count(line) >= self.required_min_fields
    }

    /// Parse one line; `line_number` is its 1-based physical position
    pub fn parse_line(&self, line: &str, line_number: usize) -> RowOutcome {
        let fields = split_fields(line, self.separator);
        if fields.is_empty() {
            return RowOutcome::Blank;
        }

        let ctx = RowContext {
            source_id: &self.source_id,
            line_number,
        };
        let count = fields.len();

        if count < self.recovery_floor {
            return RowOutcome::Dropped(Diagnostic::new(
                DiagnosticKind::RowTooShort,
                Some(line_number),
                format!(
                    "{} field(s), fewer than the {} needed to recover a row: {}",
                    count,
                    self.recovery_floor,
                    preview(line)
                ),
            ));
        }

        if count < self.required_min_fields {
            let Some(event) = self.recoverer.recover(&fields, &self.normalizer, ctx) else {
                return RowOutcome::Dropped(Diagnostic::new(
                    DiagnosticKind::RowTooShort,
                    Some(line_number),
                    format!("{count} field(s) match no recoverable layout: {}", preview(line)),
                ));
            };

            let missing = missing_in_event(&self.required, &event);
            if !missing.is_empty() {
                return missing_required(&missing, line, line_number);
            }

            return RowOutcome::Recovered(
                event,
                Diagnostic::new(
                    DiagnosticKind::RowRecovered,
                    Some(line_number),
                    format!(
                        "{} field(s), fewer than {}; recovered positionally",
                        count, self.required_min_fields
                    ),
                ),
            );
        }

        let missing = missing_in_fields(&self.required, &fields);
        if !missing.is_empty() {
            return missing_required(&missing, line, line_number);
        }

        RowOutcome::Parsed(build_event(
            &fields,
            &self.index,
            self.variant,
            &self.normalizer,
            ctx,
        ))
    }
}

fn missing_required(missing: &[&str], line: &str, line_number: usize) -> RowOutcome {
    RowOutcome::Dropped(Diagnostic::new(
        DiagnosticKind::MissingRequiredColumns,
        Some(line_number),
        format!("required column(s) {} empty: {}", missing.join(", "), preview(line)),
    ))
}

fn preview(line: &str) -> String {
    line.chars().take(80).collect()
}
