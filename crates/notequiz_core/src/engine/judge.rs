//! Answer judgement.

use crate::model::progress::POINTS_PER_CORRECT_ANSWER;

/// Result of comparing a submitted note id with the posed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Judgement {
    pub is_correct: bool,
    pub points_awarded: u32,
}

/// Judges a submission by exact id identity.
///
/// No octave or enharmonic forgiveness: `C5` is wrong when `C4` was posed,
/// and ids outside the current tier are simply wrong.
pub fn judge(submitted_id: &str, posed_id: &str) -> Judgement {
    let is_correct = submitted_id == posed_id;
    Judgement {
        is_correct,
        points_awarded: if is_correct {
            POINTS_PER_CORRECT_ANSWER
        } else {
            0
        },
    }
}
