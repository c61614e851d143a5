//! Shared fixtures for row parser tests

use chrono::{DateTime, TimeZone, Utc};

use super::RowParser;
use crate::app::models::SchemaVariant;
use crate::app::services::format_registry::FormatConfig;
use crate::config::EngineConfig;

mod parser_tests;

/// Fixed clock for recovered rows
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

/// Parser for `format` rows laid out per its `variant` layout
pub fn parser_for(format: &FormatConfig, variant: SchemaVariant) -> RowParser {
    RowParser::new(
        format,
        &format.resolve(variant),
        "2025.05.09-00.00.00.csv",
        &EngineConfig::default(),
        fixed_now(),
    )
}

/// Parser for an extended `;`-separated source
pub fn deadside_parser() -> RowParser {
    parser_for(&FormatConfig::deadside(), SchemaVariant::Extended)
}
