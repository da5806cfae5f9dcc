//! Scoring and leveling primitives.
//!
//! # Invariants
//! - Level is derived from total score only: `total / 100 + 1`.
//! - A level-up event always carries `new_level > old_level`.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Points granted for one correct answer.
pub const POINTS_PER_CORRECT_ANSWER: u32 = 10;
/// Points needed to advance one level.
pub const POINTS_PER_LEVEL: u32 = 100;
/// Level every fresh or reset progression starts at.
pub const FIRST_LEVEL: u32 = 1;
/// Number of badges shown in the progress view.
pub const BADGE_COUNT: u32 = 6;

/// Quiz mode; each mode keeps its own score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizMode {
    /// Hear a note, name it.
    Pitch,
    /// See a note on the staff, name it.
    Notation,
}

impl QuizMode {
    pub const ALL: [QuizMode; 2] = [QuizMode::Pitch, QuizMode::Notation];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pitch => "pitch",
            Self::Notation => "notation",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pitch" => Some(Self::Pitch),
            "notation" | "note" => Some(Self::Notation),
            _ => None,
        }
    }

    /// Whether answers are gated on the posed note having been played.
    pub fn requires_sound(self) -> bool {
        matches!(self, Self::Pitch)
    }
}

impl Display for QuizMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One-time signal emitted when total score crosses a level boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelUpEvent {
    pub old_level: u32,
    pub new_level: u32,
}

/// Derives the level for a total score.
pub fn level_for_score(total_score: u32) -> u32 {
    total_score / POINTS_PER_LEVEL + FIRST_LEVEL
}

/// Read-only progress projection for progress screens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressView {
    pub level: u32,
    pub pitch_score: u32,
    pub note_score: u32,
    pub total_score: u32,
    /// Points earned since the last level boundary.
    pub points_into_level: u32,
    /// Percentage (0-99) toward the next level.
    pub percent_to_next_level: u32,
    /// Badges earned out of [`BADGE_COUNT`].
    pub badges_earned: u32,
}

impl ProgressView {
    pub fn from_scores(pitch_score: u32, note_score: u32) -> Self {
        let total_score = pitch_score.saturating_add(note_score);
        let level = level_for_score(total_score);
        let points_into_level = total_score % POINTS_PER_LEVEL;
        Self {
            level,
            pitch_score,
            note_score,
            total_score,
            points_into_level,
            percent_to_next_level: points_into_level * 100 / POINTS_PER_LEVEL,
            badges_earned: level.min(BADGE_COUNT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{level_for_score, ProgressView, QuizMode};

    #[test]
    fn level_boundaries() {
        assert_eq!(level_for_score(0), 1);
        assert_eq!(level_for_score(99), 1);
        assert_eq!(level_for_score(100), 2);
        assert_eq!(level_for_score(250), 3);
    }

    #[test]
    fn level_is_non_decreasing() {
        let mut previous = level_for_score(0);
        for score in (0..2_000).step_by(10) {
            let level = level_for_score(score);
            assert!(level >= previous);
            previous = level;
        }
    }

    #[test]
    fn progress_view_caps_badges() {
        let view = ProgressView::from_scores(450, 420);
        assert_eq!(view.total_score, 870);
        assert_eq!(view.level, 9);
        assert_eq!(view.points_into_level, 70);
        assert_eq!(view.percent_to_next_level, 70);
        assert_eq!(view.badges_earned, 6);
    }

    #[test]
    fn mode_parse_accepts_aliases() {
        assert_eq!(QuizMode::parse(" Pitch "), Some(QuizMode::Pitch));
        assert_eq!(QuizMode::parse("note"), Some(QuizMode::Notation));
        assert_eq!(QuizMode::parse("rhythm"), None);
    }
}
