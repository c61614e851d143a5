//! Core data structures for death-log ingestion.
//!
//! Defines the normalized [`Event`] record, its tagged timestamp, the schema
//! variant tag, the per-source [`ParserState`] and the [`ParseReport`]
//! returned by every engine entry point.

pub mod diagnostics;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use diagnostics::Diagnostics;

/// Timestamp of an event: either a resolved instant or the raw field text.
///
/// An unparseable timestamp never drops the row; the raw text is kept so a
/// downstream collaborator can still show or re-interpret it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventTimestamp {
    Resolved(DateTime<Utc>),
    Unresolved(String),
}

impl EventTimestamp {
    /// Resolved instant, if any
    pub fn resolved(&self) -> Option<DateTime<Utc>> {
        match self {
            EventTimestamp::Resolved(instant) => Some(*instant),
            EventTimestamp::Unresolved(_) => None,
        }
    }

    /// True when the raw field could not be interpreted
    pub fn parse_failed(&self) -> bool {
        matches!(self, EventTimestamp::Unresolved(_))
    }
}

impl fmt::Display for EventTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventTimestamp::Resolved(instant) => write!(f, "{}", instant.format("%Y-%m-%dT%H:%M:%S")),
            EventTimestamp::Unresolved(raw) => write!(f, "{raw} (unparsed)"),
        }
    }
}

/// Column layout that produced an event or was detected for a source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchemaVariant {
    /// 7-field layout that predates platform columns
    Legacy,
    /// 9-field layout with killer/victim platform columns
    Extended,
    /// Configured layout, used when neither historical layout matched
    Default,
    /// Row rebuilt positionally from fewer fields than required
    Recovered,
}

impl SchemaVariant {
    /// Short tag for logs and reports
    pub fn tag(&self) -> &'static str {
        match self {
            SchemaVariant::Legacy => "legacy",
            SchemaVariant::Extended => "extended",
            SchemaVariant::Default => "default",
            SchemaVariant::Recovered => "recovered",
        }
    }
}

impl fmt::Display for SchemaVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One normalized combat occurrence extracted from a log line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub timestamp: EventTimestamp,
    pub killer_name: String,
    pub killer_id: String,
    pub victim_name: String,
    pub victim_id: String,
    pub weapon: String,
    /// Kill distance; 0.0 when the field was missing or not numeric
    pub distance: f64,
    pub killer_platform: Option<String>,
    pub victim_platform: Option<String>,
    pub is_suicide: bool,
    /// Originating file or stream name
    pub source_id: String,
    pub schema_variant: SchemaVariant,
    /// 1-based physical line number within the source
    pub line_number: usize,
}

impl Event {
    /// True when the timestamp field was kept as raw text
    pub fn timestamp_parse_failed(&self) -> bool {
        self.timestamp.parse_failed()
    }

    /// Aggregation key for the killer (id, or name when the id is blank)
    pub fn killer_key(&self) -> &str {
        player_key(&self.killer_id, &self.killer_name)
    }

    /// Aggregation key for the victim (id, or name when the id is blank)
    pub fn victim_key(&self) -> &str {
        player_key(&self.victim_id, &self.victim_name)
    }
}

fn player_key<'a>(id: &'a str, name: &'a str) -> &'a str {
    if id.is_empty() { name } else { id }
}

/// Per-source incremental state, owned by one engine instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParserState {
    /// Delimiter chosen by the last scan
    pub last_delimiter: char,

    /// Schema variant chosen by the last scan
    pub last_variant: SchemaVariant,

    /// Data lines (after any header) already processed
    pub lines_processed: usize,

    /// Number of scans folded into this state
    pub scans: u64,
}

impl ParserState {
    pub fn new(delimiter: char, variant: SchemaVariant) -> Self {
        Self {
            last_delimiter: delimiter,
            last_variant: variant,
            lines_processed: 0,
            scans: 0,
        }
    }
}

/// Result of a parse or scan: events in source order plus diagnostics
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParseReport {
    /// Events in source line order
    pub events: Vec<Event>,

    /// Soft failures observed while parsing
    pub diagnostics: Diagnostics,

    /// Delimiter used, if the content was not empty
    pub delimiter: Option<char>,

    /// Source-level schema variant, if the content was not empty
    pub schema_variant: Option<SchemaVariant>,

    /// Data lines examined by this call (blank lines included)
    pub lines_examined: usize,
}

impl ParseReport {
    /// Report for input that produced nothing
    pub fn empty(diagnostics: Diagnostics) -> Self {
        Self {
            diagnostics,
            ..Self::default()
        }
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Summary line for logging
    pub fn summary(&self) -> String {
        format!(
            "{} events from {} lines (delimiter: {}, schema: {}, diagnostics: {})",
            self.events.len(),
            self.lines_examined,
            self.delimiter
                .map(|d| format!("{d:?}"))
                .unwrap_or_else(|| "none".to_string()),
            self.schema_variant
                .map(|v| v.tag().to_string())
                .unwrap_or_else(|| "none".to_string()),
            self.diagnostics.len()
        )
    }
}
