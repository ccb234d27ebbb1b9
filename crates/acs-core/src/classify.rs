//! Status/direction classification of raw scans.

use serde::{Deserialize, Serialize};

use crate::event::Direction;

/// Prefix rules that turn status and direction codes into a [`Direction`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Statuses starting with this prefix are successful scans.
    pub status_success_prefix: String,
    /// Direction codes that mean "entering".
    pub direction_plus_prefixes: Vec<String>,
    /// Direction codes that mean "leaving".
    pub direction_minus_prefixes: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            status_success_prefix: "SUCCESS".to_string(),
            direction_plus_prefixes: vec!["IN".to_string()],
            direction_minus_prefixes: vec!["OUT".to_string()],
        }
    }
}

/// Classifies scans. Prefixes are normalized to uppercase once at construction.
#[derive(Debug, Clone)]
pub struct Classifier {
    success: String,
    plus: Vec<String>,
    minus: Vec<String>,
}

fn normalize(value: &str) -> String {
    value.trim().to_uppercase()
}

impl Classifier {
    pub fn new(config: &ClassifierConfig) -> Self {
        Self {
            success: normalize(&config.status_success_prefix),
            plus: config.direction_plus_prefixes.iter().map(|p| normalize(p)).collect(),
            minus: config.direction_minus_prefixes.iter().map(|p| normalize(p)).collect(),
        }
    }

    /// Classifies a scan. Both inputs are trimmed and uppercased first.
    ///
    /// Enter prefixes are checked before exit prefixes, so a direction
    /// matching both sets classifies as [`Direction::Enter`].
    pub fn classify(&self, status: &str, direction: &str) -> Direction {
        let status = normalize(status);
        if !status.starts_with(&self.success) {
            return Direction::Ignored;
        }
        let direction = normalize(direction);
        if self.plus.iter().any(|p| direction.starts_with(p.as_str())) {
            Direction::Enter
        } else if self.minus.iter().any(|p| direction.starts_with(p.as_str())) {
            Direction::Exit
        } else {
            Direction::Ignored
        }
    }

    /// Returns `(plus, minus)` prefix pairs where one is a prefix of the other.
    ///
    /// Any such pair means some direction codes match both sets.
    pub fn overlapping_prefixes(&self) -> Vec<(String, String)> {
        let mut overlaps = Vec::new();
        for plus in &self.plus {
            for minus in &self.minus {
                if plus.starts_with(minus.as_str()) || minus.starts_with(plus.as_str()) {
                    overlaps.push((plus.clone(), minus.clone()));
                }
            }
        }
        overlaps
    }
}
