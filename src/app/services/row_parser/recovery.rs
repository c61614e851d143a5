//! Positional recovery of truncated rows.
//!
//! Rows with fewer fields than a complete layout but at least the recovery
//! floor are reinterpreted by field count:
//!
//! | fields | layout                                            |
//! |--------|---------------------------------------------------|
//! | 3      | killer, victim, weapon (timestamp synthesized)    |
//! | 4      | timestamp, killer, victim, weapon                 |
//! | 5      | timestamp, killer, killer_id, victim, weapon      |
//! | 6      | timestamp, killer, killer_id, victim, victim_id, weapon |
//!
//! Recovered events carry distance 0.0 and no platforms.

use chrono::{DateTime, Utc};

use super::fields::field_at;
use super::record::{PlayerFields, RowContext, assemble, synthesized_timestamp};
use crate::app::models::{Event, SchemaVariant};
use crate::app::services::timestamp_normalizer::TimestampNormalizer;

/// Rebuilds events from short rows
#[derive(Debug, Clone)]
pub struct RowRecoverer {
    reference_time: DateTime<Utc>,
}

impl RowRecoverer {
    /// `reference_time` stamps 3-field rows, which carry no timestamp of
    /// their own
    pub fn new(reference_time: DateTime<Utc>) -> Self {
        Self { reference_time }
    }

    /// Rebuild an event, or `None` when the field count has no known layout
    pub fn recover(
        &self,
        fields: &[String],
        normalizer: &TimestampNormalizer,
        ctx: RowContext<'_>,
    ) -> Option<Event> {
        let f = |i: usize| field_at(fields, Some(i));

        let (timestamp, players) = match fields.len() {
            3 => (
                synthesized_timestamp(self.reference_time),
                PlayerFields {
                    killer_name: f(0),
                    victim_name: f(1),
                    weapon: f(2),
                    ..PlayerFields::default()
                },
            ),
            4 => (
                normalizer.normalize(f(0)),
                PlayerFields {
                    killer_name: f(1),
                    victim_name: f(2),
                    weapon: f(3),
                    ..PlayerFields::default()
                },
            ),
            5 => (
                normalizer.normalize(f(0)),
                PlayerFields {
                    killer_name: f(1),
                    killer_id: f(2),
                    victim_name: f(3),
                    weapon: f(4),
                    ..PlayerFields::default()
                },
            ),
            6 => (
                normalizer.normalize(f(0)),
                PlayerFields {
                    killer_name: f(1),
                    killer_id: f(2),
                    victim_name: f(3),
                    victim_id: f(4),
                    weapon: f(5),
                },
            ),
            _ => return None,
        };

        Some(assemble(
            timestamp,
            players,
            0.0,
            (None, None),
            SchemaVariant::Recovered,
            ctx,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::EventTimestamp;
    use chrono::TimeZone;

    fn recover(line: &str) -> Option<Event> {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let fields: Vec<String> = line.split(';').map(str::to_string).collect();
        RowRecoverer::new(now).recover(
            &fields,
            &TimestampNormalizer::new("%Y.%m.%d-%H.%M.%S", 0..=0),
            RowContext {
                source_id: "s",
                line_number: 5,
            },
        )
    }

    #[test]
    fn test_three_fields_get_synthesized_timestamp() {
        let event = recover("Killer;Victim;AK").unwrap();
        assert_eq!(
            event.timestamp,
            EventTimestamp::Resolved(Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap())
        );
        assert_eq!(event.killer_name, "Killer");
        assert_eq!(event.victim_name, "Victim");
        assert_eq!(event.weapon, "AK");
        assert_eq!(event.schema_variant, SchemaVariant::Recovered);
        assert_eq!(event.distance, 0.0);
        assert!(event.killer_platform.is_none());
    }

    #[test]
    fn test_four_to_six_fields() {
        let event = recover("2025.05.09-11.58.37;K;V;AK").unwrap();
        assert!(!event.timestamp_parse_failed());
        assert_eq!(event.weapon, "AK");

        let event = recover("2025.05.09-11.58.37;K;K1;V;AK").unwrap();
        assert_eq!(event.killer_id, "K1");
        assert_eq!(event.victim_id, "");

        let event = recover("2025.05.09-11.58.37;K;K1;V;V1;AK").unwrap();
        assert_eq!(event.victim_id, "V1");
        assert_eq!(event.weapon, "AK");
    }

    #[test]
    fn test_other_counts_are_not_recovered() {
        assert!(recover("a;b").is_none());
        assert!(recover("a;b;c;d;e;f;g").is_none());
    }
}
