//! Engine configuration.
//!
//! Provides the tunable parameters of the ingestion engine: sampling sizes,
//! row thresholds, the plausible epoch range and the delimiter-scoring
//! heuristics. No file or environment variable is consulted; callers build
//! an [`EngineConfig`] in code.

use crate::constants::{
    DEFAULT_SAMPLE_BYTES, DEFAULT_STREAM_CHUNK_SIZE, DEFAULT_STREAM_SAMPLE_BYTES,
    EPOCH_SECONDS_MAX, EPOCH_SECONDS_MIN, EXTENDED_MIN_FIELDS, MIN_MEANINGFUL_LEN,
    RECOVERY_FLOOR, REQUIRED_MIN_FIELDS, heuristics,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Delimiter-scoring heuristics.
///
/// The magnitudes are hand-tuned against real server logs and kept
/// configurable for behavioral compatibility; they are not guaranteed to be
/// optimal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelimiterHeuristics {
    /// Multiplier applied to raw `;` occurrences
    pub semicolon_multiplier: u64,

    /// Flat bonus for `;` when the source id has a `.csv` suffix
    pub csv_suffix_bonus: u64,

    /// Flat bonus for `;` when `;;` appears (empty fields)
    pub consecutive_semicolon_bonus: u64,

    /// Flat bonus for `,` when quoted-comma patterns are frequent
    pub quoted_comma_bonus: u64,

    /// Number of `","` occurrences above which the comma bonus applies
    pub quoted_comma_threshold: usize,

    /// Non-blank lines inspected for per-line field counts
    pub sample_lines: usize,
}

impl Default for DelimiterHeuristics {
    fn default() -> Self {
        Self {
            semicolon_multiplier: heuristics::SEMICOLON_MULTIPLIER,
            csv_suffix_bonus: heuristics::CSV_SUFFIX_BONUS,
            consecutive_semicolon_bonus: heuristics::CONSECUTIVE_SEMICOLON_BONUS,
            quoted_comma_bonus: heuristics::QUOTED_COMMA_BONUS,
            quoted_comma_threshold: heuristics::QUOTED_COMMA_THRESHOLD,
            sample_lines: heuristics::SAMPLE_LINES,
        }
    }
}

/// Global configuration for the ingestion engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Bytes of content sampled for one-shot delimiter detection
    pub sample_bytes: usize,

    /// Bytes buffered before a stream runs detection
    pub stream_sample_bytes: usize,

    /// Chunk size used when adapting a reader into a stream
    pub stream_chunk_size: usize,

    /// Trimmed content shorter than this is considered empty
    pub min_meaningful_len: usize,

    /// Field count of a complete row
    pub required_min_fields: usize,

    /// Field count selecting the extended layout
    pub extended_min_fields: usize,

    /// Rows with fewer fields are dropped
    pub recovery_floor: usize,

    /// Lower bound of plausible epoch seconds
    pub epoch_min: i64,

    /// Upper bound of plausible epoch seconds
    pub epoch_max: i64,

    /// Delimiter-scoring heuristics
    pub heuristics: DelimiterHeuristics,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_bytes: DEFAULT_SAMPLE_BYTES,
            stream_sample_bytes: DEFAULT_STREAM_SAMPLE_BYTES,
            stream_chunk_size: DEFAULT_STREAM_CHUNK_SIZE,
            min_meaningful_len: MIN_MEANINGFUL_LEN,
            required_min_fields: REQUIRED_MIN_FIELDS,
            extended_min_fields: EXTENDED_MIN_FIELDS,
            recovery_floor: RECOVERY_FLOOR,
            epoch_min: EPOCH_SECONDS_MIN,
            epoch_max: EPOCH_SECONDS_MAX,
            heuristics: DelimiterHeuristics::default(),
        }
    }
}

impl EngineConfig {
    /// Set the one-shot detection sample size
    pub fn with_sample_bytes(mut self, sample_bytes: usize) -> Self {
        self.sample_bytes = sample_bytes;
        self
    }

    /// Set the streaming detection sample size
    pub fn with_stream_sample_bytes(mut self, sample_bytes: usize) -> Self {
        self.stream_sample_bytes = sample_bytes;
        self
    }

    /// Set the reader chunk size for streaming
    pub fn with_stream_chunk_size(mut self, chunk_size: usize) -> Self {
        self.stream_chunk_size = chunk_size;
        self
    }

    /// Replace the delimiter heuristics
    pub fn with_heuristics(mut self, heuristics: DelimiterHeuristics) -> Self {
        self.heuristics = heuristics;
        self
    }

    /// Set the plausible epoch-seconds range
    pub fn with_epoch_range(mut self, range: RangeInclusive<i64>) -> Self {
        self.epoch_min = *range.start();
        self.epoch_max = *range.end();
        self
    }

    /// Plausible epoch-seconds range
    pub fn epoch_range(&self) -> RangeInclusive<i64> {
        self.epoch_min..=self.epoch_max
    }

    /// Check internal consistency of the thresholds
    pub fn validate(&self) -> Result<()> {
        if self.recovery_floor == 0 {
            return Err(Error::configuration("recovery_floor must be at least 1"));
        }
        if self.recovery_floor > self.required_min_fields {
            return Err(Error::configuration(format!(
                "recovery_floor ({}) exceeds required_min_fields ({})",
                self.recovery_floor, self.required_min_fields
            )));
        }
        if self.required_min_fields > self.extended_min_fields {
            return Err(Error::configuration(format!(
                "required_min_fields ({}) exceeds extended_min_fields ({})",
                self.required_min_fields, self.extended_min_fields
            )));
        }
        if self.epoch_min > self.epoch_max {
            return Err(Error::configuration("epoch range is empty"));
        }
        if self.stream_chunk_size == 0 {
            return Err(Error::configuration("stream_chunk_size must be non-zero"));
        }
        Ok(())
    }
}
