//! Folding events into per-player statistics

use std::collections::BTreeMap;
use tracing::debug;

use super::player_stats::PlayerStats;
use crate::app::models::Event;
use crate::constants::UNKNOWN_PLATFORM;

/// Folds an ordered event sequence into [`PlayerStats`].
///
/// Every non-suicide event updates the killer (kills, weapons, victims) and
/// the victim (deaths, killers). A suicide only adds a death and a suicide
/// to the victim.
#[derive(Debug, Clone, Default)]
pub struct StatsAggregator {
    players: BTreeMap<String, PlayerStats>,
    events_seen: usize,
    suicides_seen: usize,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregate a complete slice in one call
    pub fn aggregate(mut self, events: &[Event]) -> BTreeMap<String, PlayerStats> {
        self.extend(events);
        self.finish()
    }

    /// Fold more events in
    pub fn extend<'a>(&mut self, events: impl IntoIterator<Item = &'a Event>) {
        for event in events {
            self.add(event);
        }
    }

    /// Fold one event in
    pub fn add(&mut self, event: &Event) {
        self.events_seen += 1;
        let instant = event.timestamp.resolved();

        if event.is_suicide {
            self.suicides_seen += 1;
            if let Some(victim) = self.player(event.victim_key()) {
                victim.note_name(&event.victim_name);
                victim.note_seen(instant);
                victim.deaths += 1;
                victim.suicides += 1;
                note_platform(victim, event.victim_platform.as_deref());
            }
            return;
        }

        let killer_key = event.killer_key().to_string();
        let victim_key = event.victim_key().to_string();

        if let Some(killer) = self.player(&killer_key) {
            killer.note_name(&event.killer_name);
            killer.note_seen(instant);
            killer.kills += 1;
            if !event.weapon.is_empty() {
                killer.weapons.add(&event.weapon);
            }
            if !victim_key.is_empty() {
                killer.victims.add(&victim_key);
            }
            killer.total_kill_distance += event.distance;
            if event.distance > killer.longest_kill {
                killer.longest_kill = event.distance;
            }
            note_platform(killer, event.killer_platform.as_deref());
            if let Some(platform) = known_platform(event.victim_platform.as_deref()) {
                killer.kills_by_platform.add(platform);
            }
        }

        if let Some(victim) = self.player(&victim_key) {
            victim.note_name(&event.victim_name);
            victim.note_seen(instant);
            victim.deaths += 1;
            if !killer_key.is_empty() {
                victim.killers.add(&killer_key);
            }
            note_platform(victim, event.victim_platform.as_deref());
            if let Some(platform) = known_platform(event.killer_platform.as_deref()) {
                victim.deaths_by_platform.add(platform);
            }
        }
    }

    /// Compute derived fields and hand back the map
    pub fn finish(mut self) -> BTreeMap<String, PlayerStats> {
        for stats in self.players.values_mut() {
            stats.finalize();
        }
        debug!(
            "Aggregated {} events ({} suicides) into {} players",
            self.events_seen,
            self.suicides_seen,
            self.players.len()
        );
        self.players
    }

    /// Entry for `key`; blank keys are not tracked
    fn player(&mut self, key: &str) -> Option<&mut PlayerStats> {
        if key.is_empty() {
            return None;
        }
        Some(
            self.players
                .entry(key.to_string())
                .or_insert_with(|| PlayerStats::new(key)),
        )
    }
}

fn known_platform(platform: Option<&str>) -> Option<&str> {
    platform.filter(|p| !p.is_empty() && *p != UNKNOWN_PLATFORM)
}

fn note_platform(stats: &mut PlayerStats, platform: Option<&str>) {
    if let Some(platform) = known_platform(platform) {
        stats.platforms.add(platform);
    }
}
