//! Cumulative score and level tracking.
//!
//! # Responsibility
//! - Own per-mode scores for one player.
//! - Report level transitions as event values.
//!
//! # Invariants
//! - `total_score()` is always `pitch_score + note_score`.
//! - `check_level_up()` reports each crossed boundary range exactly once.
//! - `reset()` and restores never produce a level-up event.

use crate::model::progress::{
    level_for_score, LevelUpEvent, ProgressView, QuizMode, FIRST_LEVEL,
};
use crate::model::snapshot::PersistedSnapshot;
use chrono::{DateTime, Utc};

/// Owned score state for both quiz modes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressionTracker {
    pitch_score: u32,
    note_score: u32,
    last_observed_level: u32,
}

impl ProgressionTracker {
    pub fn new() -> Self {
        Self {
            pitch_score: 0,
            note_score: 0,
            last_observed_level: FIRST_LEVEL,
        }
    }

    /// Restores from a persisted snapshot.
    ///
    /// Only per-mode scores are trusted; total and level are re-derived, and
    /// the restored level counts as already observed.
    pub fn from_snapshot(snapshot: &PersistedSnapshot) -> Self {
        let mut tracker = Self {
            pitch_score: snapshot.pitch_score,
            note_score: snapshot.note_score,
            last_observed_level: FIRST_LEVEL,
        };
        tracker.last_observed_level = tracker.current_level();
        tracker
    }

    /// Adds `points` to `mode`'s score.
    ///
    /// Callers must follow every award with exactly one `check_level_up()`.
    pub fn award(&mut self, mode: QuizMode, points: u32) {
        match mode {
            QuizMode::Pitch => self.pitch_score = self.pitch_score.saturating_add(points),
            QuizMode::Notation => self.note_score = self.note_score.saturating_add(points),
        }
    }

    /// Returns a level-up event when the derived level passed the last
    /// observed one, and records the new level as observed.
    pub fn check_level_up(&mut self) -> Option<LevelUpEvent> {
        let current = self.current_level();
        if current <= self.last_observed_level {
            return None;
        }
        let event = LevelUpEvent {
            old_level: self.last_observed_level,
            new_level: current,
        };
        self.last_observed_level = current;
        Some(event)
    }

    /// Zeroes every score and the observed level in one step.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn pitch_score(&self) -> u32 {
        self.pitch_score
    }

    pub fn note_score(&self) -> u32 {
        self.note_score
    }

    pub fn score_for(&self, mode: QuizMode) -> u32 {
        match mode {
            QuizMode::Pitch => self.pitch_score,
            QuizMode::Notation => self.note_score,
        }
    }

    pub fn total_score(&self) -> u32 {
        self.pitch_score.saturating_add(self.note_score)
    }

    pub fn current_level(&self) -> u32 {
        level_for_score(self.total_score())
    }

    pub fn progress(&self) -> ProgressView {
        ProgressView::from_scores(self.pitch_score, self.note_score)
    }

    /// Serializable view of the current scores stamped with `now`.
    pub fn snapshot(&self, now: DateTime<Utc>) -> PersistedSnapshot {
        PersistedSnapshot::from_scores(self.pitch_score, self.note_score, now)
    }
}

impl Default for ProgressionTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::ProgressionTracker;
    use crate::model::progress::{LevelUpEvent, QuizMode};

    #[test]
    fn award_updates_mode_and_total() {
        let mut tracker = ProgressionTracker::new();
        tracker.award(QuizMode::Pitch, 10);
        tracker.award(QuizMode::Notation, 30);
        assert_eq!(tracker.pitch_score(), 10);
        assert_eq!(tracker.note_score(), 30);
        assert_eq!(tracker.total_score(), 40);
        assert_eq!(tracker.check_level_up(), None);
    }

    #[test]
    fn level_up_fires_once_per_crossing() {
        let mut tracker = ProgressionTracker::new();
        tracker.award(QuizMode::Notation, 100);
        assert_eq!(
            tracker.check_level_up(),
            Some(LevelUpEvent {
                old_level: 1,
                new_level: 2
            })
        );
        assert_eq!(tracker.check_level_up(), None);
    }

    #[test]
    fn large_award_skips_levels_in_one_event() {
        let mut tracker = ProgressionTracker::new();
        tracker.award(QuizMode::Pitch, 250);
        assert_eq!(
            tracker.check_level_up(),
            Some(LevelUpEvent {
                old_level: 1,
                new_level: 3
            })
        );
    }

    #[test]
    fn reset_never_reports_level_up() {
        let mut tracker = ProgressionTracker::new();
        tracker.award(QuizMode::Pitch, 150);
        tracker.check_level_up();
        tracker.reset();
        assert_eq!(tracker.total_score(), 0);
        assert_eq!(tracker.current_level(), 1);
        assert_eq!(tracker.check_level_up(), None);
    }
}
