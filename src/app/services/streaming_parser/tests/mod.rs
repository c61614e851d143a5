//! Test helpers for streaming parser tests

use std::convert::Infallible;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use super::EventStream;
use crate::app::models::Event;
use crate::app::services::format_registry::FormatConfig;
use crate::config::EngineConfig;


/// Instant stamped on rows without a timestamp
pub fn reference_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

/// Split `content` into chunks of `size` bytes
pub fn chunked(content: &str, size: usize) -> Vec<Result<Vec<u8>, Infallible>> {
    content
        .as_bytes()
        .chunks(size)
        .map(|chunk| Ok(chunk.to_vec()))
        .collect()
}

/// Stream `content` in chunks of `size` bytes with a small opening sample
pub fn stream_of(
    content: &str,
    size: usize,
) -> EventStream<std::vec::IntoIter<Result<Vec<u8>, Infallible>>> {
    EventStream::new(
        chunked(content, size).into_iter(),
        Arc::new(FormatConfig::deadside()),
        EngineConfig::default().with_stream_sample_bytes(64),
        "stream.csv",
        reference_time(),
    )
}

/// Numbered extended rows
pub fn extended_rows(count: usize) -> String {
    (1..=count)
        .map(|i| format!("2025.05.09-11.{:02}.00;Killer{i};K{i};Victim{i};V{i};AK;{i};PC;PS5\n", i % 60))
        .collect()
}

pub fn weapons(events: &[Event]) -> Vec<&str> {
    events.iter().map(|e| e.weapon.as_str()).collect()
}
