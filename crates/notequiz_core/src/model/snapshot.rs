//! Persisted progress snapshot.
//!
//! # Responsibility
//! - Define the storage representation of score and level.
//!
//! # Invariants
//! - Only score and level are persisted; round state never is.
//! - A normalized snapshot has `total_score == pitch_score + note_score` and
//!   `level == level_for_score(total_score)`.

use crate::model::progress::{level_for_score, FIRST_LEVEL};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// JSON shape written under the score storage key.
///
/// Missing numeric fields deserialize to zero (level to 1), matching stores
/// written by older clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSnapshot {
    #[serde(default)]
    pub pitch_score: u32,
    #[serde(default)]
    pub note_score: u32,
    #[serde(default)]
    pub total_score: u32,
    #[serde(default = "first_level")]
    pub level: u32,
    /// RFC 3339 timestamp of the write.
    #[serde(default)]
    pub last_updated: DateTime<Utc>,
}

fn first_level() -> u32 {
    FIRST_LEVEL
}

impl PersistedSnapshot {
    /// Builds a consistent snapshot from per-mode scores.
    pub fn from_scores(pitch_score: u32, note_score: u32, last_updated: DateTime<Utc>) -> Self {
        let total_score = pitch_score.saturating_add(note_score);
        Self {
            pitch_score,
            note_score,
            total_score,
            level: level_for_score(total_score),
            last_updated,
        }
    }

    /// Returns whether derived fields agree with per-mode scores.
    pub fn is_consistent(&self) -> bool {
        let expected_total = self.pitch_score.saturating_add(self.note_score);
        self.total_score == expected_total && self.level == level_for_score(expected_total)
    }

    /// Recomputes derived fields from per-mode scores.
    pub fn normalized(&self) -> Self {
        Self::from_scores(self.pitch_score, self.note_score, self.last_updated)
    }
}
