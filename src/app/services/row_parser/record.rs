//! Mapping split fields onto a resolved schema and building events

use chrono::{DateTime, Utc};

use super::fields::{coerce_distance, field_at};
use crate::app::models::{Event, EventTimestamp, SchemaVariant};
use crate::app::services::format_registry::ResolvedSchema;
use crate::app::services::timestamp_normalizer::TimestampNormalizer;
use crate::constants::{ENVIRONMENT_KILLERS, SELF_INFLICTED_CAUSES, UNKNOWN_PLATFORM, columns};

/// Positions of the canonical event columns within one layout.
///
/// Column names are matched through the alias table, so layouts naming a
/// column `attacker_name` or `player1_name` still feed `killer_name`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnIndex {
    pub timestamp: Option<usize>,
    pub killer_name: Option<usize>,
    pub killer_id: Option<usize>,
    pub victim_name: Option<usize>,
    pub victim_id: Option<usize>,
    pub weapon: Option<usize>,
    pub distance: Option<usize>,
    pub killer_platform: Option<usize>,
    pub victim_platform: Option<usize>,
}

impl ColumnIndex {
    pub fn new(schema: &ResolvedSchema) -> Self {
        let find = |canonical: &str| position_of(&schema.columns, canonical);

        // the configured datetime column wins over alias matching
        let timestamp = schema
            .columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(&schema.datetime_column))
            .or_else(|| find(columns::TIMESTAMP));

        Self {
            timestamp,
            killer_name: find(columns::KILLER_NAME),
            killer_id: find(columns::KILLER_ID),
            victim_name: find(columns::VICTIM_NAME),
            victim_id: find(columns::VICTIM_ID),
            weapon: find(columns::WEAPON),
            distance: find(columns::DISTANCE),
            killer_platform: find(columns::KILLER_PLATFORM),
            victim_platform: find(columns::VICTIM_PLATFORM),
        }
    }
}

/// Position of `canonical` in `schema_columns`, exact name first, then aliases
pub(crate) fn position_of(schema_columns: &[String], canonical: &str) -> Option<usize> {
    let aliases = columns::ALIASES
        .iter()
        .find(|(name, _)| *name == canonical)
        .map(|(_, aliases)| *aliases)
        .unwrap_or(&[]);

    schema_columns
        .iter()
        .position(|c| c.eq_ignore_ascii_case(canonical))
        .or_else(|| {
            schema_columns.iter().position(|c| {
                let c = c.to_ascii_lowercase();
                aliases.iter().any(|alias| *alias == c)
            })
        })
}

/// A column the format requires a value for, located in one layout
#[derive(Debug, Clone, PartialEq)]
pub struct RequiredColumn {
    pub name: String,
    /// Position in the layout, `None` when the layout lacks the column
    pub position: Option<usize>,
}

impl RequiredColumn {
    /// Locate each required column in `schema`, through aliases
    pub fn locate(required: &[String], schema: &ResolvedSchema) -> Vec<Self> {
        required
            .iter()
            .map(|name| Self {
                name: name.clone(),
                position: position_of(&schema.columns, name),
            })
            .collect()
    }
}

/// Required columns a mapped row leaves empty
pub fn missing_in_fields<'a>(required: &'a [RequiredColumn], fields: &[String]) -> Vec<&'a str> {
    required
        .iter()
        .filter(|column| field_at(fields, column.position).is_empty())
        .map(|column| column.name.as_str())
        .collect()
}

/// Required columns a recovered event leaves empty.
///
/// Recovered rows only carry the positional fields, so a required distance
/// or non-event column is always missing.
pub fn missing_in_event<'a>(required: &'a [RequiredColumn], event: &Event) -> Vec<&'a str> {
    required
        .iter()
        .filter(|column| !has_value(event, &column.name))
        .map(|column| column.name.as_str())
        .collect()
}

fn has_value(event: &Event, column: &str) -> bool {
    match canonical_of(column) {
        Some(columns::TIMESTAMP) => match &event.timestamp {
            EventTimestamp::Resolved(_) => true,
            EventTimestamp::Unresolved(raw) => !raw.is_empty(),
        },
        Some(columns::KILLER_NAME) => !event.killer_name.is_empty(),
        Some(columns::KILLER_ID) => !event.killer_id.is_empty(),
        Some(columns::VICTIM_NAME) => !event.victim_name.is_empty(),
        Some(columns::VICTIM_ID) => !event.victim_id.is_empty(),
        Some(columns::WEAPON) => !event.weapon.is_empty(),
        Some(columns::KILLER_PLATFORM) => event.killer_platform.is_some(),
        Some(columns::VICTIM_PLATFORM) => event.victim_platform.is_some(),
        _ => false,
    }
}

/// Canonical event column a column name stands for
fn canonical_of(column: &str) -> Option<&'static str> {
    let column = column.to_ascii_lowercase();
    columns::ALIASES
        .iter()
        .find(|(name, aliases)| *name == column || aliases.contains(&column.as_str()))
        .map(|(name, _)| *name)
}

/// Where an event came from
#[derive(Debug, Clone, Copy)]
pub struct RowContext<'a> {
    pub source_id: &'a str,
    pub line_number: usize,
}

/// Build an event from fields laid out per `index`.
///
/// `variant` is the source layout; legacy sources predate platform columns,
/// so their missing platforms read "Unknown". Columns beyond the row's last
/// field read as empty.
pub fn build_event(
    fields: &[String],
    index: &ColumnIndex,
    variant: SchemaVariant,
    normalizer: &TimestampNormalizer,
    ctx: RowContext<'_>,
) -> Event {
    let timestamp = normalizer.normalize(field_at(fields, index.timestamp));
    let platform = |position: Option<usize>| match position.and_then(|i| fields.get(i)) {
        Some(value) if !value.is_empty() => Some(value.clone()),
        _ if variant == SchemaVariant::Legacy => Some(UNKNOWN_PLATFORM.to_string()),
        _ => None,
    };

    assemble(
        timestamp,
        PlayerFields {
            killer_name: field_at(fields, index.killer_name),
            killer_id: field_at(fields, index.killer_id),
            victim_name: field_at(fields, index.victim_name),
            victim_id: field_at(fields, index.victim_id),
            weapon: field_at(fields, index.weapon),
        },
        coerce_distance(field_at(fields, index.distance)),
        (platform(index.killer_platform), platform(index.victim_platform)),
        variant,
        ctx,
    )
}

/// Text fields shared by full and recovered rows
#[derive(Debug, Clone, Copy, Default)]
pub struct PlayerFields<'a> {
    pub killer_name: &'a str,
    pub killer_id: &'a str,
    pub victim_name: &'a str,
    pub victim_id: &'a str,
    pub weapon: &'a str,
}

pub(crate) fn assemble(
    timestamp: EventTimestamp,
    players: PlayerFields<'_>,
    distance: f64,
    (killer_platform, victim_platform): (Option<String>, Option<String>),
    variant: SchemaVariant,
    ctx: RowContext<'_>,
) -> Event {
    let is_suicide = is_suicide(&players);
    Event {
        timestamp,
        killer_name: players.killer_name.to_string(),
        killer_id: players.killer_id.to_string(),
        victim_name: players.victim_name.to_string(),
        victim_id: players.victim_id.to_string(),
        weapon: players.weapon.to_string(),
        distance,
        killer_platform,
        victim_platform,
        is_suicide,
        source_id: ctx.source_id.to_string(),
        schema_variant: variant,
        line_number: ctx.line_number,
    }
}

/// Killer and victim are the same player, the cause is self-inflicted, or
/// the "killer" is the world itself
pub fn is_suicide(players: &PlayerFields<'_>) -> bool {
    let same_id = !players.killer_id.is_empty() && players.killer_id == players.victim_id;
    let same_name =
        !players.killer_name.is_empty() && players.killer_name.eq_ignore_ascii_case(players.victim_name);

    let weapon = players.weapon.trim().to_ascii_lowercase();
    let killer = players.killer_name.trim().to_ascii_lowercase();

    same_id
        || same_name
        || SELF_INFLICTED_CAUSES.contains(&weapon.as_str())
        || ENVIRONMENT_KILLERS.contains(&killer.as_str())
}

/// Timestamp synthesized for rows that carry none
pub fn synthesized_timestamp(now: DateTime<Utc>) -> EventTimestamp {
    EventTimestamp::Resolved(now)
}
