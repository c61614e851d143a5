//! Per-source incremental cursors.
//!
//! A cursor counts the data lines (after any header, blank lines included)
//! already processed for one source identifier. It advances by lines, not
//! events, so dropped rows are never reprocessed.

use std::collections::HashMap;
use tracing::{debug, info};

use crate::app::models::diagnostics::{DiagnosticKind, Diagnostics};
use crate::app::models::{ParserState, SchemaVariant};

/// Cursor state for every source an engine has scanned
#[derive(Debug, Clone, Default)]
pub struct CursorTable {
    states: HashMap<String, ParserState>,
}

impl CursorTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, source_id: &str) -> Option<&ParserState> {
        self.states.get(source_id)
    }

    /// Data lines to skip for this scan.
    ///
    /// Content that shrank below the cursor means the source was rotated or
    /// truncated; the cursor restarts at zero and a `CursorReset` is recorded.
    pub fn start_line(
        &self,
        source_id: &str,
        total_lines: usize,
        only_new: bool,
        diagnostics: &mut Diagnostics,
    ) -> usize {
        if !only_new {
            return 0;
        }
        match self.states.get(source_id) {
            None => 0,
            Some(state) if state.lines_processed <= total_lines => state.lines_processed,
            Some(state) => {
                diagnostics.record(
                    DiagnosticKind::CursorReset,
                    None,
                    format!(
                        "'{}' has {} data lines but {} were already processed; rescanning from the start",
                        source_id, total_lines, state.lines_processed
                    ),
                );
                0
            }
        }
    }

    /// Record a completed scan covering `total_lines` data lines
    pub fn advance(
        &mut self,
        source_id: &str,
        total_lines: usize,
        delimiter: char,
        variant: SchemaVariant,
    ) -> &ParserState {
        let state = self
            .states
            .entry(source_id.to_string())
            .or_insert_with(|| ParserState::new(delimiter, variant));

        state.last_delimiter = delimiter;
        state.last_variant = variant;
        state.lines_processed = total_lines;
        state.scans += 1;

        debug!(
            "Cursor for '{}' now at {} lines after {} scan(s)",
            source_id, state.lines_processed, state.scans
        );
        state
    }

    /// Forget one source; returns whether it was tracked
    pub fn reset(&mut self, source_id: &str) -> bool {
        let removed = self.states.remove(source_id).is_some();
        if removed {
            info!("Reset cursor for '{}'", source_id);
        }
        removed
    }

    pub fn clear(&mut self) {
        self.states.clear();
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.states.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_scan_starts_at_zero() {
        let table = CursorTable::new();
        let mut diagnostics = Diagnostics::new();
        assert_eq!(table.start_line("a", 10, true, &mut diagnostics), 0);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_advance_and_resume() {
        let mut table = CursorTable::new();
        let mut diagnostics = Diagnostics::new();

        table.advance("a", 4, ';', SchemaVariant::Extended);
        assert_eq!(table.start_line("a", 6, true, &mut diagnostics), 4);
        assert_eq!(table.start_line("a", 6, false, &mut diagnostics), 0);

        let state = table.advance("a", 6, ',', SchemaVariant::Legacy);
        assert_eq!(state.scans, 2);
        assert_eq!(state.last_delimiter, ',');
        assert_eq!(state.last_variant, SchemaVariant::Legacy);
    }

    #[test]
    fn test_shrunk_source_resets() {
        let mut table = CursorTable::new();
        let mut diagnostics = Diagnostics::new();

        table.advance("a", 8, ';', SchemaVariant::Extended);
        assert_eq!(table.start_line("a", 3, true, &mut diagnostics), 0);
        assert!(diagnostics.contains(DiagnosticKind::CursorReset));
    }

    #[test]
    fn test_reset_and_clear() {
        let mut table = CursorTable::new();
        table.advance("a", 1, ';', SchemaVariant::Legacy);
        table.advance("b", 1, ';', SchemaVariant::Legacy);

        assert!(table.reset("a"));
        assert!(!table.reset("a"));
        assert_eq!(table.len(), 1);

        table.clear();
        assert!(table.is_empty());
    }
}
