//! Field-delimiter detection for death-log content.
//!
//! Scores each candidate delimiter from raw occurrence counts, a handful of
//! heuristic boosts and per-line field counts, then picks the highest score.
//! Identical input always yields the identical decision.

use tracing::debug;

use crate::config::DelimiterHeuristics;
use crate::constants::DELIMITER_CANDIDATES;

/// Outcome of delimiter detection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelimiterDecision {
    /// Chosen delimiter
    pub delimiter: char,

    /// Final score per candidate, in candidate order
    pub scores: Vec<(char, u64)>,

    /// No candidate occurred at all; the default separator was used
    pub no_evidence: bool,
}

impl DelimiterDecision {
    /// Score recorded for one candidate
    pub fn score(&self, delimiter: char) -> u64 {
        self.scores
            .iter()
            .find(|(d, _)| *d == delimiter)
            .map(|(_, score)| *score)
            .unwrap_or(0)
    }
}

/// Delimiter detector with tunable heuristics
#[derive(Debug, Clone, Default)]
pub struct DelimiterDetector {
    heuristics: DelimiterHeuristics,
}

impl DelimiterDetector {
    pub fn new(heuristics: DelimiterHeuristics) -> Self {
        Self { heuristics }
    }

    /// Pick the delimiter for `sample`.
    ///
    /// `source_id` feeds the `.csv` suffix boost; `default` wins ties and is
    /// used when no candidate occurs.
    pub fn detect(&self, sample: &str, source_id: Option<&str>, default: char) -> DelimiterDecision {
        let raw: Vec<(char, u64)> = DELIMITER_CANDIDATES
            .iter()
            .map(|&d| (d, sample.matches(d).count() as u64))
            .collect();
        let no_evidence = raw.iter().all(|(_, count)| *count == 0);

        let mut scores = raw;
        self.apply_boosts(&mut scores, sample, source_id);
        self.add_line_scores(&mut scores, sample);

        let mut best = default;
        let mut max = scores
            .iter()
            .find(|(d, _)| *d == default)
            .map(|(_, score)| *score)
            .unwrap_or(0);
        if !no_evidence {
            for &(candidate, score) in &scores {
                if score > max {
                    max = score;
                    best = candidate;
                }
            }
        }

        debug!("Detected delimiter {:?} (scores: {:?})", best, scores);

        DelimiterDecision {
            delimiter: best,
            scores,
            no_evidence,
        }
    }

    fn apply_boosts(&self, scores: &mut [(char, u64)], sample: &str, source_id: Option<&str>) {
        let h = &self.heuristics;

        if let Some(entry) = scores.iter_mut().find(|(d, _)| *d == ';') {
            if entry.1 > 0 {
                entry.1 *= h.semicolon_multiplier;

                let csv_named = source_id
                    .map(|id| id.to_ascii_lowercase().ends_with(".csv"))
                    .unwrap_or(false);
                if csv_named {
                    entry.1 += h.csv_suffix_bonus;
                }
            }
            if sample.contains(";;") {
                entry.1 += h.consecutive_semicolon_bonus;
            }
        }

        if sample.matches("\",\"").count() > h.quoted_comma_threshold {
            if let Some(entry) = scores.iter_mut().find(|(d, _)| *d == ',') {
                entry.1 += h.quoted_comma_bonus;
            }
        }
    }

    /// More fields per line under a candidate is evidence for it
    fn add_line_scores(&self, scores: &mut [(char, u64)], sample: &str) {
        let lines = sample
            .lines()
            .filter(|line| !line.trim().is_empty())
            .take(self.heuristics.sample_lines);

        for line in lines {
            for entry in scores.iter_mut() {
                let fields = line.split(entry.0).count();
                if fields > 1 {
                    entry.1 += fields as u64;
                }
            }
        }
    }
}
