//! Per-player statistics over parsed death events
//!
//! The engine emits events; this module folds them into one
//! [`PlayerStats`] per player key and ranks or groups the results.
//!
//! ```
//! use deathlog_processor::{LogIngestEngine, StatsAggregator};
//!
//! let engine = LogIngestEngine::with_defaults().unwrap();
//! let report = engine.parse(
//!     "2025.05.09-11.58.37;Alpha;A1;Bravo;B1;AKM;120;PS5;XSX\n",
//!     engine.format(),
//!     None,
//! );
//! let stats = StatsAggregator::new().aggregate(&report.events);
//! assert_eq!(stats["A1"].kills, 1);
//! assert_eq!(stats["B1"].deaths, 1);
//! ```

pub mod aggregator;
pub mod leaderboard;
pub mod player_stats;

#[cfg(test)]
mod tests;

pub use aggregator::StatsAggregator;
pub use leaderboard::{
    LeaderboardEntry, LeaderboardMetric, PlatformSummary, leaderboard, platform_comparison,
};
pub use player_stats::{DerivedStats, PlayerStats, Tally};
