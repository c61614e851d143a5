//! Shared fixtures for statistics tests

use chrono::{TimeZone, Utc};

use crate::app::models::{Event, EventTimestamp, SchemaVariant};


/// Extended-layout kill at `minute` past 12:00 on 2025-05-09
pub fn kill(killer: &str, victim: &str, weapon: &str, distance: f64, minute: u32) -> Event {
    Event {
        timestamp: EventTimestamp::Resolved(Utc.with_ymd_and_hms(2025, 5, 9, 12, minute, 0).unwrap()),
        killer_name: format!("{killer}-name"),
        killer_id: killer.to_string(),
        victim_name: format!("{victim}-name"),
        victim_id: victim.to_string(),
        weapon: weapon.to_string(),
        distance,
        killer_platform: None,
        victim_platform: None,
        is_suicide: killer == victim,
        source_id: "stats.csv".to_string(),
        schema_variant: SchemaVariant::Extended,
        line_number: minute as usize + 1,
    }
}

pub fn on_platforms(mut event: Event, killer: &str, victim: &str) -> Event {
    event.killer_platform = Some(killer.to_string());
    event.victim_platform = Some(victim.to_string());
    event
}
