//! Tests for line-level parsing outcomes

use super::*;
use crate::app::models::diagnostics::{DiagnosticKind, Diagnostics};
use crate::app::models::{EventTimestamp, SchemaVariant};
use crate::app::services::row_parser::RowOutcome;

#[test]
fn test_extended_row() {
    let outcome = deadside_parser()
        .parse_line("2025.05.09-11.58.37;Player1;ID1;Player2;ID2;weapon;10;PS4;PS4;", 1);

    let RowOutcome::Parsed(event) = outcome else {
        panic!("expected a parsed row, got {outcome:?}");
    };
    assert_eq!(
        event.timestamp,
        EventTimestamp::Resolved(Utc.with_ymd_and_hms(2025, 5, 9, 11, 58, 37).unwrap())
    );
    assert_eq!(event.killer_name, "Player1");
    assert_eq!(event.killer_id, "ID1");
    assert_eq!(event.victim_name, "Player2");
    assert_eq!(event.victim_id, "ID2");
    assert_eq!(event.weapon, "weapon");
    assert_eq!(event.distance, 10.0);
    assert_eq!(event.killer_platform.as_deref(), Some("PS4"));
    assert_eq!(event.victim_platform.as_deref(), Some("PS4"));
    assert_eq!(event.schema_variant, SchemaVariant::Extended);
    assert_eq!(event.source_id, "2025.05.09-00.00.00.csv");
}

#[test]
fn test_legacy_source_defaults_platforms() {
    let parser = parser_for(&FormatConfig::deadside(), SchemaVariant::Legacy);
    let outcome = parser.parse_line("2025.03.27-10.42.18;Killer;K1;Victim;V1;AK-47;50", 2);
    let event = outcome.event().unwrap();
    assert_eq!(event.schema_variant, SchemaVariant::Legacy);
    assert_eq!(event.killer_platform.as_deref(), Some("Unknown"));
    assert_eq!(event.victim_platform.as_deref(), Some("Unknown"));
}

#[test]
fn test_seven_fields_in_extended_source() {
    let outcome = deadside_parser().parse_line("2025.03.27-10.42.18;Killer;K1;Victim;V1;AK-47;50", 2);
    let event = outcome.event().unwrap();
    assert_eq!(event.schema_variant, SchemaVariant::Extended);
    assert_eq!(event.distance, 50.0);
    assert_eq!(event.killer_platform, None);
    assert_eq!(event.victim_platform, None);
}

#[test]
fn test_eight_fields_keep_killer_platform() {
    let outcome = deadside_parser().parse_line("2025.05.09-11.59.00;C;C1;D;D1;M4;20;PS5", 3);
    let RowOutcome::Parsed(event) = outcome else {
        panic!("expected a parsed row, got {outcome:?}");
    };
    assert_eq!(event.schema_variant, SchemaVariant::Extended);
    assert_eq!(event.killer_platform.as_deref(), Some("PS5"));
    assert_eq!(event.victim_platform, None);
}

#[test]
fn test_empty_required_columns_drop_the_row() {
    let outcome = deadside_parser().parse_line("2025.05.09-11.59.00;;;;;;;;", 4);
    let RowOutcome::Dropped(diagnostic) = &outcome else {
        panic!("expected a drop, got {outcome:?}");
    };
    assert_eq!(diagnostic.kind, DiagnosticKind::MissingRequiredColumns);
    assert_eq!(diagnostic.line, Some(4));
    assert!(diagnostic.message.contains("killer_name, victim_name, weapon"));

    // a blank weapon is enough
    let outcome = deadside_parser().parse_line("2025.05.09-11.59.00;K;K1;V;V1;;20;PC;PC", 5);
    assert!(matches!(outcome, RowOutcome::Dropped(_)));
}

#[test]
fn test_recovered_row_missing_required_column() {
    let mut diagnostics = Diagnostics::new();
    let outcome = deadside_parser().parse_line("Killer;;Knife", 6);
    assert!(outcome.into_event(&mut diagnostics).is_none());
    assert_eq!(diagnostics.count(DiagnosticKind::MissingRequiredColumns), 1);
    assert!(!diagnostics.contains(DiagnosticKind::RowRecovered));
}

#[test]
fn test_extended_row_with_blank_platform() {
    let outcome = deadside_parser().parse_line("2025.03.27-10.42.18;K;K1;V;V1;AK;5;;XSX", 2);
    let event = outcome.event().unwrap();
    assert_eq!(event.killer_platform, None);
    assert_eq!(event.victim_platform.as_deref(), Some("XSX"));
}

#[test]
fn test_non_numeric_distance_defaults_to_zero() {
    let outcome = deadside_parser().parse_line("2025.03.27-10.42.18;K;K1;V;V1;AK;far", 1);
    assert_eq!(outcome.event().unwrap().distance, 0.0);
}

#[test]
fn test_short_row_is_recovered_with_diagnostic() {
    let outcome = deadside_parser().parse_line("Killer;Victim;Knife", 5);
    let RowOutcome::Recovered(event, diagnostic) = &outcome else {
        panic!("expected recovery, got {outcome:?}");
    };
    assert_eq!(event.schema_variant, SchemaVariant::Recovered);
    assert_eq!(event.timestamp.resolved(), Some(fixed_now()));
    assert_eq!(diagnostic.kind, DiagnosticKind::RowRecovered);
    assert_eq!(diagnostic.line, Some(5));

    let mut diagnostics = Diagnostics::new();
    assert!(outcome.into_event(&mut diagnostics).is_some());
    assert_eq!(diagnostics.count(DiagnosticKind::RowRecovered), 1);
}

#[test]
fn test_too_short_row_is_dropped() {
    let outcome = deadside_parser().parse_line("only;two", 9);
    let mut diagnostics = Diagnostics::new();
    assert!(outcome.into_event(&mut diagnostics).is_none());
    assert_eq!(diagnostics.count(DiagnosticKind::RowTooShort), 1);
    assert_eq!(diagnostics.for_line(9).count(), 1);
}

#[test]
fn test_blank_line_is_silent() {
    let mut diagnostics = Diagnostics::new();
    assert_eq!(deadside_parser().parse_line("   ", 3), RowOutcome::Blank);
    assert!(RowOutcome::Blank.into_event(&mut diagnostics).is_none());
    assert!(diagnostics.is_empty());
}

#[test]
fn test_bad_timestamp_keeps_row() {
    let outcome = deadside_parser().parse_line("sometime;K;K1;V;V1;AK;10", 7);
    let mut diagnostics = Diagnostics::new();
    let event = outcome.into_event(&mut diagnostics).unwrap();

    assert_eq!(event.timestamp, EventTimestamp::Unresolved("sometime".to_string()));
    assert!(event.timestamp_parse_failed());
    assert_eq!(diagnostics.count(DiagnosticKind::TimestampUnparseable), 1);
}

#[test]
fn test_suicide_row() {
    let outcome = deadside_parser()
        .parse_line("2025.03.27-10.42.18;Bob;B1;Bob;B1;suicide_by_relocation;0", 1);
    assert!(outcome.event().unwrap().is_suicide);
}

#[test]
fn test_custom_format_maps_aliases() {
    let parser = parser_for(&FormatConfig::custom(), SchemaVariant::Default);
    let outcome = parser.parse_line("2025-05-09 11:58:37,kill,Alice,A1,Bob,B1,M4,north", 1);
    let event = outcome.event().unwrap();

    assert_eq!(event.killer_name, "Alice");
    assert_eq!(event.victim_id, "B1");
    assert_eq!(event.weapon, "M4");
    assert_eq!(event.distance, 0.0);
    assert!(!event.timestamp_parse_failed());
    assert_eq!(event.schema_variant, SchemaVariant::Default);
    assert_eq!(event.killer_platform, None);
}

#[test]
fn test_with_separator() {
    let parser = deadside_parser().with_separator(',');
    assert_eq!(parser.separator(), ',');
    assert!(parser.is_complete("2025-05-09 11:58:37,A,A1,B,B1,AK,10"));
    assert!(!parser.is_complete("2025-05-09 11:58:37;A;A1;B;B1;AK;10"));
}
