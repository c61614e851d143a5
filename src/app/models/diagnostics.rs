//! Soft-failure diagnostics attached to every parse call.
//!
//! Malformed data is never an error: each problem becomes a [`Diagnostic`]
//! in the returned list and is mirrored to `tracing`, so a caller can decide
//! whether a human should be alerted.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Category of a soft failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// Content was blank or below the meaningful length
    EmptyInput,
    /// Bytes were not valid UTF-8; a secondary decoding was used or failed
    DecodeFailure,
    /// No candidate delimiter occurred; default separator used
    NoDelimiterEvidence,
    /// First data line matched no historical layout
    UnrecognizedSchema,
    /// Row had fewer fields than the recovery floor and was dropped
    RowTooShort,
    /// Row had fewer fields than required and was rebuilt positionally
    RowRecovered,
    /// Row left a required column empty and was dropped
    MissingRequiredColumns,
    /// Timestamp kept as raw text
    TimestampUnparseable,
    /// Input source failed partway; earlier events were kept
    StructuralReadError,
    /// Source shrank below the cursor; treated as a new file
    CursorReset,
}

impl DiagnosticKind {
    /// Whether the condition loses or degrades data
    pub fn is_warning(&self) -> bool {
        !matches!(self, DiagnosticKind::EmptyInput | DiagnosticKind::CursorReset)
    }
}

/// One soft failure, optionally tied to a source line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// 1-based physical line number
    pub line: Option<usize>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, line: Option<usize>, message: impl Into<String>) -> Self {
        Self {
            kind,
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "[{:?}] line {}: {}", self.kind, line, self.message),
            None => write!(f, "[{:?}] {}", self.kind, self.message),
        }
    }
}

/// Ordered list of diagnostics for one call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic and mirror it to the log
    pub fn record(&mut self, kind: DiagnosticKind, line: Option<usize>, message: impl Into<String>) {
        self.push(Diagnostic::new(kind, line, message));
    }

    /// Add an already-built diagnostic and mirror it to the log
    pub fn push(&mut self, diagnostic: Diagnostic) {
        if diagnostic.kind.is_warning() {
            warn!("{}", diagnostic);
        } else {
            debug!("{}", diagnostic);
        }
        self.entries.push(diagnostic);
    }

    /// Append every entry of another list
    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// Number of entries of one kind
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.entries.iter().filter(|d| d.kind == kind).count()
    }

    /// True if any entry has this kind
    pub fn contains(&self, kind: DiagnosticKind) -> bool {
        self.entries.iter().any(|d| d.kind == kind)
    }

    /// Entries recorded against a given line
    pub fn for_line(&self, line: usize) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(move |d| d.line == Some(line))
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
