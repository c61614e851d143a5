//! Death-log Processor Library
//!
//! A Rust library for turning raw, inconsistently formatted game-server
//! death-log files into an ordered sequence of structured combat events.
//!
//! This library provides tools for:
//! - Detecting the field delimiter and historical column layout of a log
//! - Normalizing a dozen+ timestamp encodings into UTC instants
//! - Recovering usable events from truncated rows
//! - Incremental re-scans that only emit lines appended since the last scan
//! - Chunk-oriented streaming for very large inputs
//! - Per-player statistics, leaderboards and cross-platform comparisons
//!
//! The engine performs no network I/O and persists nothing: bytes in,
//! events and diagnostics out.

pub mod config;
pub mod constants;

// Core application modules
pub mod app {
    pub mod models;
    pub mod services {
        pub mod delimiter_detector;
        pub mod event_filter;
        pub mod format_registry;
        pub mod ingest_engine;
        pub mod row_parser;
        pub mod schema_detector;
        pub mod stats_aggregator;
        pub mod streaming_parser;
        pub mod timestamp_normalizer;
    }
    pub mod adapters {
        pub mod filesystem;
    }
}

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use app::models::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use app::models::{Event, EventTimestamp, ParseReport, ParserState, SchemaVariant};
pub use app::services::format_registry::{FormatConfig, FormatRegistry};
pub use app::services::ingest_engine::LogIngestEngine;
pub use app::services::stats_aggregator::{PlayerStats, StatsAggregator};
pub use config::EngineConfig;

/// Result type alias for the death-log processor
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for invalid calls into the engine.
///
/// Malformed log *data* never produces one of these; it is reported through
/// [`Diagnostics`] instead.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Requested format is not registered
    #[error("Unknown log format: {name}")]
    UnknownFormat { name: String },

    /// Format definition rejected at registration
    #[error("Invalid format '{name}': {message}")]
    InvalidFormat { name: String, message: String },

    /// File not found
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    /// Directory traversal error
    #[error("Directory traversal error: {message}")]
    DirectoryTraversal {
        message: String,
        #[source]
        source: walkdir::Error,
    },
}

impl Error {
    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an unknown format error
    pub fn unknown_format(name: impl Into<String>) -> Self {
        Self::UnknownFormat { name: name.into() }
    }

    /// Create an invalid format error
    pub fn invalid_format(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a file not found error
    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: "I/O operation failed".to_string(),
            source: error,
        }
    }
}

impl From<walkdir::Error> for Error {
    fn from(error: walkdir::Error) -> Self {
        Self::DirectoryTraversal {
            message: "Directory traversal failed".to_string(),
            source: error,
        }
    }
}
