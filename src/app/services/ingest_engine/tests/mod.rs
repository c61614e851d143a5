//! Test fixtures for the ingestion engine

use crate::app::models::Event;
use crate::app::services::ingest_engine::LogIngestEngine;

mod parse_tests;

pub fn engine() -> LogIngestEngine {
    LogIngestEngine::with_defaults().unwrap()
}

/// One extended row per index, weapon `W<i>`
pub fn extended_row(i: usize) -> String {
    format!(
        "2025.05.{:02}-10.00.00;Killer{i};K{i};Victim{i};V{i};W{i};{i};PC;PS5",
        (i % 28) + 1
    )
}

pub fn rows(range: std::ops::Range<usize>) -> String {
    range.map(|i| extended_row(i) + "\n").collect()
}

pub fn weapons(events: &[Event]) -> Vec<&str> {
    events.iter().map(|e| e.weapon.as_str()).collect()
}
