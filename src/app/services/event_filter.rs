//! Event filtering by time range, player, distance and weapon
//!
//! Filters are built up with `with_*` methods; every criterion left unset
//! matches everything.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::app::models::Event;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFilter {
    since: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
    player_id: Option<String>,
    min_distance: Option<f64>,
    max_distance: Option<f64>,
    weapon: Option<String>,
}

impl EventFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep events at or after `since` and at or before `until`.
    ///
    /// Events whose timestamp could not be resolved never match a time
    /// bound.
    pub fn with_time_range(mut self, since: Option<DateTime<Utc>>, until: Option<DateTime<Utc>>) -> Self {
        self.since = since;
        self.until = until;
        self
    }

    /// Keep events where the player is the killer or the victim
    pub fn with_player(mut self, player_id: impl Into<String>) -> Self {
        self.player_id = Some(player_id.into());
        self
    }

    /// Keep events whose distance lies in the inclusive range
    pub fn with_distance_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_distance = min;
        self.max_distance = max;
        self
    }

    /// Keep events with this weapon, compared case-insensitively
    pub fn with_weapon(mut self, weapon: impl Into<String>) -> Self {
        self.weapon = Some(weapon.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn matches(&self, event: &Event) -> bool {
        if self.since.is_some() || self.until.is_some() {
            let Some(instant) = event.timestamp.resolved() else {
                return false;
            };
            if self.since.is_some_and(|since| instant < since) {
                return false;
            }
            if self.until.is_some_and(|until| instant > until) {
                return false;
            }
        }

        if let Some(player) = &self.player_id {
            if event.killer_key() != player && event.victim_key() != player {
                return false;
            }
        }

        if self.min_distance.is_some_and(|min| event.distance < min) {
            return false;
        }
        if self.max_distance.is_some_and(|max| event.distance > max) {
            return false;
        }

        match &self.weapon {
            Some(weapon) => event.weapon.eq_ignore_ascii_case(weapon),
            None => true,
        }
    }

    /// Matching events, order preserved
    pub fn apply(&self, events: &[Event]) -> Vec<Event> {
        let kept: Vec<Event> = events.iter().filter(|e| self.matches(e)).cloned().collect();
        debug!("Filter kept {} of {} events", kept.len(), events.len());
        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::{EventTimestamp, SchemaVariant};
    use chrono::TimeZone;

    fn event(killer: &str, victim: &str, weapon: &str, distance: f64, hour: u32) -> Event {
        Event {
            timestamp: EventTimestamp::Resolved(Utc.with_ymd_and_hms(2025, 5, 9, hour, 0, 0).unwrap()),
            killer_name: killer.to_lowercase(),
            killer_id: killer.to_string(),
            victim_name: victim.to_lowercase(),
            victim_id: victim.to_string(),
            weapon: weapon.to_string(),
            distance,
            killer_platform: None,
            victim_platform: None,
            is_suicide: false,
            source_id: "filter.csv".to_string(),
            schema_variant: SchemaVariant::Legacy,
            line_number: hour as usize,
        }
    }

    fn events() -> Vec<Event> {
        vec![
            event("A1", "B1", "AKM", 120.0, 1),
            event("B1", "C1", "M4", 15.0, 2),
            event("C1", "A1", "akm", 300.0, 3),
        ]
    }

    #[test]
    fn test_empty_filter_keeps_everything() {
        let filter = EventFilter::new();
        assert!(filter.is_empty());
        assert_eq!(filter.apply(&events()), events());
    }

    #[test]
    fn test_time_range_is_inclusive() {
        let filter = EventFilter::new().with_time_range(
            Some(Utc.with_ymd_and_hms(2025, 5, 9, 2, 0, 0).unwrap()),
            Some(Utc.with_ymd_and_hms(2025, 5, 9, 3, 0, 0).unwrap()),
        );
        let kept = filter.apply(&events());
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].killer_id, "B1");
    }

    #[test]
    fn test_unresolved_timestamp_fails_time_bound() {
        let mut unresolved = event("A1", "B1", "AKM", 1.0, 1);
        unresolved.timestamp = EventTimestamp::Unresolved("soon".to_string());

        let bounded = EventFilter::new().with_time_range(None, Some(Utc::now()));
        assert!(!bounded.matches(&unresolved));
        assert!(EventFilter::new().matches(&unresolved));
    }

    #[test]
    fn test_player_matches_either_side() {
        let kept = EventFilter::new().with_player("A1").apply(&events());
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_distance_and_weapon() {
        let kept = EventFilter::new()
            .with_weapon("AKM")
            .with_distance_range(Some(100.0), None)
            .apply(&events());
        assert_eq!(kept.len(), 2);

        let kept = EventFilter::new()
            .with_weapon("akm")
            .with_distance_range(None, Some(200.0))
            .apply(&events());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].distance, 120.0);
    }
}
