//! One-shot parse behavior

use super::*;
use crate::app::models::diagnostics::DiagnosticKind;
use crate::app::models::{EventTimestamp, SchemaVariant};
use crate::app::services::format_registry::{FormatConfig, FormatRegistry};
use crate::config::EngineConfig;
use crate::Error;
use chrono::{TimeZone, Utc};
use std::sync::Arc;

#[test]
fn test_one_event_per_data_line() {
    let content = rows(0..12);
    let report = engine().parse(&content, &FormatConfig::deadside(), None);

    assert_eq!(report.event_count(), 12);
    assert_eq!(report.delimiter, Some(';'));
    assert_eq!(report.schema_variant, Some(SchemaVariant::Extended));
    assert_eq!(report.lines_examined, 12);
    assert!(report.diagnostics.is_empty());
}

#[test]
fn test_blank_lines_are_skipped_but_keep_numbering() {
    let content = format!("{}\n\n{}\n", extended_row(1), extended_row(2));
    let report = engine().parse(&content, &FormatConfig::deadside(), None);

    assert_eq!(weapons(&report.events), vec!["W1", "W2"]);
    assert_eq!(report.events[1].line_number, 3);
}

#[test]
fn test_parse_is_idempotent() {
    let engine = engine();
    let content = format!("{}Killer;Victim;Knife\n{}", rows(0..4), rows(4..8));
    let first = engine.parse(&content, &FormatConfig::deadside(), None);
    std::thread::sleep(std::time::Duration::from_millis(5));
    let second = engine.parse(&content, &FormatConfig::deadside(), None);

    assert_eq!(first.event_count(), 9);
    assert_eq!(first.events, second.events);
    assert_eq!(first.events[4].timestamp.resolved(), Some(engine.reference_time()));
}

#[test]
fn test_reference_time_stamps_short_rows() {
    let instant = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
    let engine = engine().with_reference_time(instant);
    let content = format!("{}\nKiller;Victim;Knife\n", extended_row(1));

    let report = engine.parse(&content, &FormatConfig::deadside(), None);
    assert_eq!(report.events[1].schema_variant, SchemaVariant::Recovered);
    assert_eq!(report.events[1].timestamp.resolved(), Some(instant));
}

#[test]
fn test_short_complete_row_maps_onto_source_layout() {
    let content = format!(
        "{}\n2025.05.09-11.59.00;C;C1;D;D1;M4;20;PS5\n2025.05.09-12.00.00;E;E1;F;F1;AK;5\n",
        extended_row(1)
    );
    let report = engine().parse(&content, &FormatConfig::deadside(), None);
    assert_eq!(report.schema_variant, Some(SchemaVariant::Extended));

    let eight = &report.events[1];
    assert_eq!(eight.schema_variant, SchemaVariant::Extended);
    assert_eq!(eight.killer_platform.as_deref(), Some("PS5"));
    assert_eq!(eight.victim_platform, None);

    let seven = &report.events[2];
    assert_eq!(seven.schema_variant, SchemaVariant::Extended);
    assert_eq!(seven.distance, 5.0);
    assert_eq!(seven.killer_platform, None);
    assert!(report.diagnostics.is_empty());
}

#[test]
fn test_legacy_source_defaults_platforms() {
    let content = "2025.03.27-10.42.18;Killer;K1;Victim;V1;AK-47;50
                   2025.03.27-10.43.18;Other;O1;Victim;V1;M4;20
";
    let report = engine().parse(content, &FormatConfig::deadside(), None);

    assert_eq!(report.schema_variant, Some(SchemaVariant::Legacy));
    for event in &report.events {
        assert_eq!(event.schema_variant, SchemaVariant::Legacy);
        assert_eq!(event.killer_platform.as_deref(), Some("Unknown"));
        assert_eq!(event.victim_platform.as_deref(), Some("Unknown"));
    }
}

#[test]
fn test_row_missing_required_columns_is_dropped() {
    let content = format!("{}\n2025.05.09-11.59.00;;;;;;;;\n{}\n", extended_row(1), extended_row(2));
    let report = engine().parse(&content, &FormatConfig::deadside(), None);

    assert_eq!(weapons(&report.events), vec!["W1", "W2"]);
    assert_eq!(report.diagnostics.count(DiagnosticKind::MissingRequiredColumns), 1);
    assert_eq!(report.diagnostics.for_line(2).count(), 1);
}

#[test]
fn test_empty_and_tiny_content() {
    let engine = engine();
    for content in ["", "   \n  ", "abc"] {
        let report = engine.parse(content, &FormatConfig::deadside(), None);
        assert!(report.is_empty());
        assert!(report.diagnostics.contains(DiagnosticKind::EmptyInput));
        assert_eq!(report.delimiter, None);
    }
}

#[test]
fn test_header_line_is_consumed() {
    let content = "timestamp,killer,killer_id,victim,victim_id,weapon,distance\n\
                   2025-05-09 11:58:37,A,A1,B,B1,AK,10\n\
                   2025-05-09 11:59:37,C,C1,D,D1,M4,20\n";
    let report = engine().parse(content, &FormatConfig::deadside(), None);

    assert_eq!(weapons(&report.events), vec!["AK", "M4"]);
    assert_eq!(report.delimiter, Some(','));
    assert_eq!(report.events[0].line_number, 2);
}

#[test]
fn test_delimiter_override_skips_detection() {
    let content = "2025.05.09-11.58.37|A|A1|B|B1|AK|10\n";
    let report = engine().parse(content, &FormatConfig::deadside(), Some('|'));
    assert_eq!(report.delimiter, Some('|'));
    assert_eq!(report.event_count(), 1);
    assert_eq!(report.events[0].weapon, "AK");
}

#[test]
fn test_no_delimiter_evidence() {
    let content = "nothing to split in this text at all";
    let report = engine().parse(content, &FormatConfig::deadside(), None);

    assert!(report.diagnostics.contains(DiagnosticKind::NoDelimiterEvidence));
    assert_eq!(report.delimiter, Some(';'));
    assert!(report.is_empty());
}

#[test]
fn test_latin1_content_is_decoded() {
    let mut content = b"2025.05.09-11.58.37;J".to_vec();
    content.push(0xF6);
    content.extend_from_slice(b"rg;K1;Victim;V1;AK;10\n");

    let report = engine().parse(&content, &FormatConfig::deadside(), None);
    assert_eq!(report.events[0].killer_name, "Jörg");
    assert!(report.diagnostics.contains(DiagnosticKind::DecodeFailure));
}

#[test]
fn test_unrecognized_schema_warns_and_recovers() {
    let content = "2025.05.09-11.58.37;A;B;AK\n2025.05.09-11.59.37;C;D;M4\n";
    let report = engine().parse(content, &FormatConfig::deadside(), None);

    assert_eq!(report.schema_variant, Some(SchemaVariant::Default));
    assert!(report.diagnostics.contains(DiagnosticKind::UnrecognizedSchema));
    assert_eq!(report.event_count(), 2);
    assert!(report.events.iter().all(|e| e.schema_variant == SchemaVariant::Recovered));
}

#[test]
fn test_parse_named_and_unknown_format() {
    let engine = engine();
    let content = "2025.05.09-11.58.37;Player1;ID1;Player2;ID2;weapon;10;PS4;PS4;";

    let report = engine.parse_named(content, "extended", None).unwrap();
    let event = &report.events[0];
    assert_eq!(
        event.timestamp,
        EventTimestamp::Resolved(Utc.with_ymd_and_hms(2025, 5, 9, 11, 58, 37).unwrap())
    );
    assert_eq!(event.distance, 10.0);

    assert!(matches!(
        engine.parse_named(content, "missing", None),
        Err(Error::UnknownFormat { .. })
    ));
}

#[test]
fn test_engines_with_separate_registries() {
    let mut registry = FormatRegistry::new();
    let mut pipes = FormatConfig::legacy();
    pipes.name = "pipes".to_string();
    pipes.separator = '|';
    registry.register(pipes).unwrap();

    let engine = LogIngestEngine::new(Arc::new(registry), "pipes", EngineConfig::default()).unwrap();
    assert_eq!(engine.format().separator, '|');
    assert!(engine.registry().get("deadside").is_err());

    assert!(LogIngestEngine::new(
        Arc::new(FormatRegistry::with_defaults()),
        "pipes",
        EngineConfig::default()
    )
    .is_err());
}

#[test]
fn test_invalid_config_is_rejected() {
    let mut config = EngineConfig::default();
    config.recovery_floor = 0;
    let result = LogIngestEngine::new(Arc::new(FormatRegistry::with_defaults()), "deadside", config);
    assert!(matches!(result, Err(Error::Configuration { .. })));
}

#[test]
fn test_stream_matches_parse() {
    let engine = engine();
    let content = rows(0..30);
    let parsed = engine.parse(&content, &FormatConfig::deadside(), None);

    let chunks = content
        .as_bytes()
        .chunks(11)
        .map(|c| Ok::<_, std::io::Error>(c.to_vec()))
        .collect::<Vec<_>>();
    let streamed: Vec<_> = engine.stream(chunks, &FormatConfig::deadside()).collect();

    assert_eq!(weapons(&streamed), weapons(&parsed.events));
}

#[test]
fn test_stream_reader() {
    let content = rows(0..5);
    let engine = engine();
    let events: Vec<_> = engine
        .stream_reader("reader.csv", std::io::Cursor::new(content.into_bytes()), engine.format())
        .collect();
    assert_eq!(events.len(), 5);
    assert_eq!(events[0].source_id, "reader.csv");
}
