//! Rankings and cross-platform summaries over aggregated stats

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::player_stats::{PlayerStats, Tally};
use crate::constants::UNKNOWN_PLATFORM;

/// Value a leaderboard ranks by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LeaderboardMetric {
    Kills,
    Deaths,
    KdRatio,
    LongestKill,
    Suicides,
    AverageDistance,
}

impl LeaderboardMetric {
    pub const ALL: [LeaderboardMetric; 6] = [
        LeaderboardMetric::Kills,
        LeaderboardMetric::Deaths,
        LeaderboardMetric::KdRatio,
        LeaderboardMetric::LongestKill,
        LeaderboardMetric::Suicides,
        LeaderboardMetric::AverageDistance,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            LeaderboardMetric::Kills => "kills",
            LeaderboardMetric::Deaths => "deaths",
            LeaderboardMetric::KdRatio => "kd",
            LeaderboardMetric::LongestKill => "longest_kill",
            LeaderboardMetric::Suicides => "suicides",
            LeaderboardMetric::AverageDistance => "avg_distance",
        }
    }

    /// Metric value for one player
    pub fn value(&self, stats: &PlayerStats) -> f64 {
        match self {
            LeaderboardMetric::Kills => stats.kills as f64,
            LeaderboardMetric::Deaths => stats.deaths as f64,
            LeaderboardMetric::KdRatio => stats.derived.kd_ratio,
            LeaderboardMetric::LongestKill => stats.longest_kill,
            LeaderboardMetric::Suicides => stats.suicides as f64,
            LeaderboardMetric::AverageDistance => stats.derived.average_kill_distance,
        }
    }
}

impl fmt::Display for LeaderboardMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LeaderboardMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|metric| metric.name() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|m| m.name()).collect();
                format!("unknown metric '{}' (expected one of: {})", s, names.join(", "))
            })
    }
}

/// One ranked row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    /// 1-based position
    pub rank: usize,
    pub player_id: String,
    pub name: String,
    pub value: f64,
}

/// Rank players by `metric`, highest first.
///
/// Players with a zero value are left out. With `platform`, only players
/// whose usual platform matches (case-insensitive) are ranked. Equal values
/// are ordered by player id.
pub fn leaderboard(
    stats: &BTreeMap<String, PlayerStats>,
    metric: LeaderboardMetric,
    limit: usize,
    platform: Option<&str>,
) -> Vec<LeaderboardEntry> {
    let mut ranked: Vec<(&PlayerStats, f64)> = stats
        .values()
        .filter(|player| match platform {
            Some(wanted) => player
                .derived
                .platform
                .as_deref()
                .is_some_and(|p| p.eq_ignore_ascii_case(wanted)),
            None => true,
        })
        .map(|player| (player, metric.value(player)))
        .filter(|(_, value)| *value > 0.0)
        .collect();

    ranked.sort_by(|(a, va), (b, vb)| {
        vb.partial_cmp(va)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.player_id.cmp(&b.player_id))
    });

    ranked
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, (player, value))| LeaderboardEntry {
            rank: i + 1,
            player_id: player.player_id.clone(),
            name: player.display_name().to_string(),
            value,
        })
        .collect()
}

/// Totals for the players of one platform
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlatformSummary {
    pub platform: String,
    pub players: usize,
    pub kills: u64,
    pub deaths: u64,
    pub suicides: u64,
    /// Mean of the players' K/D ratios
    pub average_kd: f64,
    pub kills_by_victim_platform: Tally,
    pub deaths_by_killer_platform: Tally,
    pub dominant_victim_platform: Option<String>,
    pub dominant_killer_platform: Option<String>,
}

/// Summarise players grouped by their usual platform.
///
/// Players never seen with a platform are grouped under "Unknown".
pub fn platform_comparison(stats: &BTreeMap<String, PlayerStats>) -> BTreeMap<String, PlatformSummary> {
    let mut summaries: BTreeMap<String, PlatformSummary> = BTreeMap::new();
    let mut kd_totals: BTreeMap<String, f64> = BTreeMap::new();

    for player in stats.values() {
        let platform = player
            .derived
            .platform
            .clone()
            .unwrap_or_else(|| UNKNOWN_PLATFORM.to_string());

        let summary = summaries
            .entry(platform.clone())
            .or_insert_with(|| PlatformSummary {
                platform: platform.clone(),
                ..PlatformSummary::default()
            });
        summary.players += 1;
        summary.kills += player.kills;
        summary.deaths += player.deaths;
        summary.suicides += player.suicides;
        summary.kills_by_victim_platform.merge(&player.kills_by_platform);
        summary.deaths_by_killer_platform.merge(&player.deaths_by_platform);

        *kd_totals.entry(platform).or_default() += player.derived.kd_ratio;
    }

    for (platform, summary) in summaries.iter_mut() {
        let total = kd_totals.get(platform).copied().unwrap_or(0.0);
        summary.average_kd = total / summary.players.max(1) as f64;
        summary.dominant_victim_platform = summary
            .kills_by_victim_platform
            .top()
            .map(|(key, _)| key.to_string());
        summary.dominant_killer_platform = summary
            .deaths_by_killer_platform
            .top()
            .map(|(key, _)| key.to_string());
    }

    summaries
}
