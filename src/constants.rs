//! Application constants for the death-log processor
//!
//! This module contains the default values, thresholds and name tables used
//! throughout the ingestion engine. Tunable values are mirrored in
//! [`crate::config::EngineConfig`]; the constants here are their defaults.

// =============================================================================
// Format Names
// =============================================================================

/// Primary game-server death-log format
pub const FORMAT_DEADSIDE: &str = "deadside";

/// Post-update layout with killer/victim platform columns
pub const FORMAT_EXTENDED: &str = "extended";

/// Pre-update 7-column layout
pub const FORMAT_LEGACY: &str = "legacy";

/// Comma-separated generic event layout
pub const FORMAT_CUSTOM: &str = "custom";

/// Format used when none is requested
pub const DEFAULT_FORMAT: &str = FORMAT_DEADSIDE;

/// Source identifier given to content parsed without one
pub const ANONYMOUS_SOURCE: &str = "<inline>";

/// Primary datetime format of the game server (`2025.03.27-10.42.18`)
pub const PRIMARY_DATETIME_FORMAT: &str = "%Y.%m.%d-%H.%M.%S";

/// ISO-like datetime format used by the custom layout
pub const ISO_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// =============================================================================
// Column Names
// =============================================================================

pub mod columns {
    pub const TIMESTAMP: &str = "timestamp";
    pub const KILLER_NAME: &str = "killer_name";
    pub const KILLER_ID: &str = "killer_id";
    pub const VICTIM_NAME: &str = "victim_name";
    pub const VICTIM_ID: &str = "victim_id";
    pub const WEAPON: &str = "weapon";
    pub const DISTANCE: &str = "distance";
    pub const KILLER_PLATFORM: &str = "killer_platform";
    pub const VICTIM_PLATFORM: &str = "victim_platform";

    /// Legacy 7-column layout
    pub const LEGACY: &[&str] = &[
        TIMESTAMP,
        KILLER_NAME,
        KILLER_ID,
        VICTIM_NAME,
        VICTIM_ID,
        WEAPON,
        DISTANCE,
    ];

    /// Extended 9-column layout with platform columns
    pub const EXTENDED: &[&str] = &[
        TIMESTAMP,
        KILLER_NAME,
        KILLER_ID,
        VICTIM_NAME,
        VICTIM_ID,
        WEAPON,
        DISTANCE,
        KILLER_PLATFORM,
        VICTIM_PLATFORM,
    ];

    /// Generic comma-separated event layout
    pub const CUSTOM: &[&str] = &[
        TIMESTAMP,
        "event_type",
        "player1_name",
        "player1_id",
        "player2_name",
        "player2_id",
        "details",
        "location",
    ];

    /// Minimal set for a row to be usable
    pub const REQUIRED: &[&str] = &[KILLER_NAME, VICTIM_NAME, WEAPON];

    /// Column-name aliases, canonical name first
    pub const ALIASES: &[(&str, &[&str])] = &[
        (TIMESTAMP, &["timestamp", "date", "time", "datetime", "event_time"]),
        (KILLER_NAME, &["killer_name", "attacker_name", "player1_name", "source"]),
        (KILLER_ID, &["killer_id", "attacker_id", "player1_id", "source_id"]),
        (VICTIM_NAME, &["victim_name", "target_name", "player2_name", "target"]),
        (VICTIM_ID, &["victim_id", "target_id", "player2_id"]),
        (WEAPON, &["weapon", "weapon_name", "item", "cause", "details"]),
        (DISTANCE, &["distance", "range", "length"]),
        (KILLER_PLATFORM, &["killer_platform", "killer_console", "platform"]),
        (VICTIM_PLATFORM, &["victim_platform", "victim_console"]),
    ];
}

// =============================================================================
// Delimiter Detection
// =============================================================================

/// Candidate delimiters in scoring order; order breaks nothing but keeps
/// detection deterministic
pub const DELIMITER_CANDIDATES: &[char] = &[';', ',', '\t', '|'];

/// Heuristic defaults for delimiter scoring. These magnitudes were tuned by
/// hand against real server logs; they are not derived values.
pub mod heuristics {
    pub const SEMICOLON_MULTIPLIER: u64 = 3;
    pub const CSV_SUFFIX_BONUS: u64 = 20;
    pub const CONSECUTIVE_SEMICOLON_BONUS: u64 = 50;
    pub const QUOTED_COMMA_BONUS: u64 = 20;
    pub const QUOTED_COMMA_THRESHOLD: usize = 5;
    pub const SAMPLE_LINES: usize = 10;
}

// =============================================================================
// Row Thresholds
// =============================================================================

/// Field count of a complete legacy row
pub const REQUIRED_MIN_FIELDS: usize = 7;

/// Field count at which the extended layout applies
pub const EXTENDED_MIN_FIELDS: usize = 9;

/// Rows below this field count are dropped rather than recovered
pub const RECOVERY_FLOOR: usize = 3;

/// Content shorter than this (after trimming) is treated as empty unless it
/// still looks like a single row
pub const MIN_MEANINGFUL_LEN: usize = 10;

/// Default byte sample for one-shot delimiter detection
pub const DEFAULT_SAMPLE_BYTES: usize = 4096;

/// Default byte sample gathered before a stream starts yielding
pub const DEFAULT_STREAM_SAMPLE_BYTES: usize = 16384;

/// Default chunk size for reader-backed streams
pub const DEFAULT_STREAM_CHUNK_SIZE: usize = 8192;

// =============================================================================
// Timestamps
// =============================================================================

/// Plausible Unix-epoch seconds (Sep 2001 to May 2033)
pub const EPOCH_SECONDS_MIN: i64 = 1_000_000_000;
pub const EPOCH_SECONDS_MAX: i64 = 2_000_000_000;

// =============================================================================
// Event Semantics
// =============================================================================

/// Platform value assigned to legacy rows, which predate platform columns
pub const UNKNOWN_PLATFORM: &str = "Unknown";

/// Weapon/cause values (lowercase) that mean the victim killed themselves
pub const SELF_INFLICTED_CAUSES: &[&str] = &[
    "suicide_by_relocation",
    "suicide by relocation",
    "suicide",
    "falling",
    "fall damage",
    "falldamage",
    "killed themselves",
];

/// Killer names (lowercase) that denote the world rather than a player
pub const ENVIRONMENT_KILLERS: &[&str] = &["environment", "world", "game"];
