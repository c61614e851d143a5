//! Timestamp normalization.
//!
//! Death logs carry timestamps in a dozen or more encodings depending on the
//! server build and whoever last touched the file. The normalizer tries the
//! format's primary pattern, then a fixed fallback list, then RFC 3339, then
//! plausible Unix-epoch seconds. Naive values are taken as UTC. Anything
//! left over is kept as raw text.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::ops::RangeInclusive;
use tracing::trace;

use crate::app::models::EventTimestamp;
use crate::config::EngineConfig;

/// Date-and-time patterns tried after the primary one, in order.
///
/// `%.f` matches an optional fractional part, so each entry also covers its
/// sub-second form. Year-first patterns come before day-first ones, and
/// day-first before month-first, which settles `01/02/2025` as 1 February.
const DATETIME_FALLBACKS: &[&str] = &[
    // year first, dotted date
    "%Y.%m.%d-%H.%M.%S%.f",
    "%Y.%m.%d-%H:%M:%S%.f",
    "%Y.%m.%d-%H.%M.%S:%f",
    "%Y.%m.%d %H.%M.%S%.f",
    "%Y.%m.%d %H:%M:%S%.f",
    "%Y.%m.%d_%H.%M.%S%.f",
    // year first, hyphenated date
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.fZ",
    "%Y-%m-%d %H:%M:%S%.fZ",
    "%Y-%m-%d-%H.%M.%S%.f",
    "%Y-%m-%d-%H:%M:%S%.f",
    "%Y-%m-%d %H.%M.%S%.f",
    "%Y-%m-%d %H:%M",
    // year first, slashed date
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d-%H.%M.%S%.f",
    "%Y/%m/%d %H:%M",
    // day first
    "%d.%m.%Y-%H.%M.%S%.f",
    "%d.%m.%Y %H:%M:%S%.f",
    "%d.%m.%Y %H.%M.%S%.f",
    "%d-%m-%Y %H:%M:%S%.f",
    "%d-%m-%Y-%H.%M.%S%.f",
    "%d/%m/%Y %H:%M:%S%.f",
    "%d/%m/%Y %H:%M",
    // month first
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %H:%M",
    // compact
    "%Y%m%d%H%M%S",
    "%Y%m%d-%H%M%S",
    "%Y%m%d_%H%M%S",
    "%Y%m%dT%H%M%S",
    // month names
    "%d %B %Y %H:%M:%S",
    "%B %d %Y %H:%M:%S",
    "%d-%b-%Y %H:%M:%S",
    "%B %d, %Y %H:%M:%S",
    // 12-hour clock
    "%Y-%m-%d %I:%M:%S %p",
    "%Y.%m.%d %I:%M:%S %p",
    "%d.%m.%Y %I:%M:%S %p",
];

/// Patterns carrying an explicit UTC offset
const OFFSET_FALLBACKS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f %z", "%Y.%m.%d-%H.%M.%S %z"];

/// Date-only patterns, resolved to midnight UTC
const DATE_FALLBACKS: &[&str] = &["%Y-%m-%d", "%Y.%m.%d", "%Y/%m/%d", "%d.%m.%Y", "%d/%m/%Y", "%Y%m%d"];

/// Normalizer bound to one primary format and epoch range
#[derive(Debug, Clone)]
pub struct TimestampNormalizer {
    primary: String,
    epoch_range: RangeInclusive<i64>,
}

impl TimestampNormalizer {
    pub fn new(primary: impl Into<String>, epoch_range: RangeInclusive<i64>) -> Self {
        Self {
            primary: primary.into(),
            epoch_range,
        }
    }

    /// Normalizer using the engine's epoch range
    pub fn from_config(primary: impl Into<String>, config: &EngineConfig) -> Self {
        Self::new(primary, config.epoch_range())
    }

    /// Normalize a raw field, keeping the text when nothing matches
    pub fn normalize(&self, raw: &str) -> EventTimestamp {
        match self.parse(raw) {
            Some(instant) => EventTimestamp::Resolved(instant),
            None => EventTimestamp::Unresolved(raw.trim().to_string()),
        }
    }

    /// Resolve a raw field to a UTC instant
    pub fn parse(&self, raw: &str) -> Option<DateTime<Utc>> {
        let value = clean(raw);
        if value.is_empty() {
            return None;
        }

        if let Some(instant) = parse_naive(value, &self.primary) {
            return Some(instant);
        }

        let instant = DATETIME_FALLBACKS
            .iter()
            .find_map(|fmt| parse_naive(value, fmt))
            .or_else(|| {
                OFFSET_FALLBACKS.iter().find_map(|fmt| {
                    DateTime::parse_from_str(value, fmt)
                        .ok()
                        .map(|dt| dt.with_timezone(&Utc))
                })
            })
            .or_else(|| {
                DateTime::parse_from_rfc3339(value)
                    .ok()
                    .map(|dt| dt.with_timezone(&Utc))
            })
            .or_else(|| DATE_FALLBACKS.iter().find_map(|fmt| parse_date(value, fmt)))
            .or_else(|| self.parse_epoch(value));

        if instant.is_none() {
            trace!("No timestamp pattern matched '{}'", value);
        }
        instant
    }

    fn parse_epoch(&self, value: &str) -> Option<DateTime<Utc>> {
        let seconds: i64 = value.parse().ok()?;
        if !self.epoch_range.contains(&seconds) {
            return None;
        }
        DateTime::from_timestamp(seconds, 0)
    }
}

fn clean(raw: &str) -> &str {
    raw.trim()
        .trim_start_matches('\u{feff}')
        .trim_matches('"')
        .trim_matches('\'')
        .trim()
}

fn parse_naive(value: &str, fmt: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, fmt)
        .ok()
        .map(|naive| naive.and_utc())
        .or_else(|| parse_date(value, fmt))
}

fn parse_date(value: &str, fmt: &str) -> Option<DateTime<Utc>> {
    NaiveDate::parse_from_str(value, fmt)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
