//! Per-player aggregate and the frequency tally it is built from

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// Occurrence counts that remember first-encounter order.
///
/// [`Tally::top`] picks the most frequent key; on a tie the key seen first
/// wins.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Tally {
    entries: Vec<(String, u64)>,
    #[serde(skip)]
    positions: HashMap<String, usize>,
}

impl PartialEq for Tally {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one occurrence of `key`
    pub fn add(&mut self, key: &str) {
        self.add_n(key, 1);
    }

    pub fn add_n(&mut self, key: &str, n: u64) {
        match self.positions.get(key) {
            Some(&position) => self.entries[position].1 += n,
            None => {
                self.positions.insert(key.to_string(), self.entries.len());
                self.entries.push((key.to_string(), n));
            }
        }
    }

    /// Fold another tally in, keeping this tally's order for known keys
    pub fn merge(&mut self, other: &Tally) {
        for (key, count) in &other.entries {
            self.add_n(key, *count);
        }
    }

    pub fn get(&self, key: &str) -> u64 {
        self.positions
            .get(key)
            .map(|&position| self.entries[position].1)
            .unwrap_or(0)
    }

    /// Most frequent key and its count
    pub fn top(&self) -> Option<(&str, u64)> {
        let mut best: Option<(&str, u64)> = None;
        for (key, count) in &self.entries {
            if best.is_none_or(|(_, max)| *count > max) {
                best = Some((key.as_str(), *count));
            }
        }
        best
    }

    /// Keys in first-encounter order
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(key, count)| (key.as_str(), *count))
    }

    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, count)| count).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Values computed once all events are folded in
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DerivedStats {
    /// Kills over deaths, deaths floored at 1
    pub kd_ratio: f64,
    pub average_kill_distance: f64,
    pub favorite_weapon: Option<String>,
    /// Player this player killed most
    pub most_killed: Option<String>,
    /// Player who killed this player most
    pub nemesis: Option<String>,
    /// Platform most often on the other side of this player's fights
    pub dominant_opposing_platform: Option<String>,
    /// Platform this player most often appeared on
    pub platform: Option<String>,
}

/// Aggregate for one player, keyed by id (or name when the id is blank)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlayerStats {
    pub player_id: String,
    /// Most recent non-empty name seen for this key
    pub name: String,
    pub kills: u64,
    pub deaths: u64,
    pub suicides: u64,
    /// Kills per weapon
    pub weapons: Tally,
    /// Kills per victim key
    pub victims: Tally,
    /// Deaths per killer key
    pub killers: Tally,
    pub longest_kill: f64,
    pub total_kill_distance: f64,
    pub first_seen: Option<DateTime<Utc>>,
    pub last_seen: Option<DateTime<Utc>>,
    /// Platforms this player was seen on
    pub platforms: Tally,
    /// Kills per victim platform
    pub kills_by_platform: Tally,
    /// Deaths per killer platform
    pub deaths_by_platform: Tally,
    pub derived: DerivedStats,
}

impl PlayerStats {
    pub fn new(player_id: impl Into<String>) -> Self {
        Self {
            player_id: player_id.into(),
            ..Self::default()
        }
    }

    pub(crate) fn note_name(&mut self, name: &str) {
        if !name.is_empty() {
            self.name = name.to_string();
        }
    }

    pub(crate) fn note_seen(&mut self, instant: Option<DateTime<Utc>>) {
        let Some(instant) = instant else {
            return;
        };
        if self.first_seen.is_none_or(|first| instant < first) {
            self.first_seen = Some(instant);
        }
        if self.last_seen.is_none_or(|last| instant > last) {
            self.last_seen = Some(instant);
        }
    }

    /// Compute the derived fields from the folded counts
    pub fn finalize(&mut self) {
        let mut opponents = self.kills_by_platform.clone();
        opponents.merge(&self.deaths_by_platform);

        self.derived = DerivedStats {
            kd_ratio: self.kills as f64 / self.deaths.max(1) as f64,
            average_kill_distance: if self.kills == 0 {
                0.0
            } else {
                self.total_kill_distance / self.kills as f64
            },
            favorite_weapon: top_key(&self.weapons),
            most_killed: top_key(&self.victims),
            nemesis: top_key(&self.killers),
            dominant_opposing_platform: top_key(&opponents),
            platform: top_key(&self.platforms),
        };
    }

    pub fn kd_ratio(&self) -> f64 {
        self.derived.kd_ratio
    }

    /// Display name, falling back to the key
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.player_id
        } else {
            &self.name
        }
    }
}

fn top_key(tally: &Tally) -> Option<String> {
    tally.top().map(|(key, _)| key.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally_top_prefers_first_on_tie() {
        let mut tally = Tally::new();
        tally.add("AK");
        tally.add("M4");
        tally.add("M4");
        tally.add("AK");
        assert_eq!(tally.top(), Some(("AK", 2)));

        tally.add("M4");
        assert_eq!(tally.top(), Some(("M4", 3)));
        assert_eq!(tally.total(), 5);
        assert_eq!(tally.get("SVD"), 0);
    }

    #[test]
    fn test_empty_tally() {
        assert_eq!(Tally::new().top(), None);
    }

    #[test]
    fn test_finalize_without_deaths() {
        let mut stats = PlayerStats::new("P1");
        stats.kills = 3;
        stats.total_kill_distance = 30.0;
        stats.finalize();

        assert_eq!(stats.kd_ratio(), 3.0);
        assert_eq!(stats.derived.average_kill_distance, 10.0);
        assert_eq!(stats.display_name(), "P1");
    }

    #[test]
    fn test_seen_range() {
        use chrono::TimeZone;
        let mut stats = PlayerStats::new("P1");
        let early = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();

        stats.note_seen(Some(late));
        stats.note_seen(None);
        stats.note_seen(Some(early));

        assert_eq!(stats.first_seen, Some(early));
        assert_eq!(stats.last_seen, Some(late));
    }
}
