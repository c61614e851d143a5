//! Death-log ingestion engine
//!
//! Bytes in, events and diagnostics out. The engine decodes content,
//! detects the delimiter and column layout, parses or recovers each data
//! line and keeps a per-source cursor so repeated scans of a growing file
//! only emit what was appended.
//!
//! ## Architecture
//!
//! - [`engine`] - [`LogIngestEngine`] entry points
//! - [`cursor`] - Per-source incremental cursors
//! - [`decode`] - Byte decoding and the empty-content check
//!
//! ## Usage
//!
//! ```rust
//! use deathlog_processor::LogIngestEngine;
//!
//! let mut engine = LogIngestEngine::with_defaults().unwrap();
//! let content = "2025.05.09-11.58.37;Player1;ID1;Player2;ID2;AK;10;PS4;PS4\n";
//!
//! let first = engine.scan("2025.05.09-00.00.00.csv", content, true);
//! assert_eq!(first.events.len(), 1);
//!
//! let again = engine.scan("2025.05.09-00.00.00.csv", content, true);
//! assert!(again.events.is_empty());
//! ```

pub mod cursor;
pub mod decode;
pub mod engine;

#[cfg(test)]
mod tests;

pub use cursor::CursorTable;
pub use engine::LogIngestEngine;
