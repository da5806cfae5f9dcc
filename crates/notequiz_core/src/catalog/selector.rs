//! Random note selection.
//!
//! # Invariants
//! - Draws are uniform over the given set and independent of prior draws;
//!   consecutive rounds may repeat a note.

use crate::model::note::Note;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Selection failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectError {
    /// Nothing to draw from; indicates a catalog configuration defect.
    EmptyCatalog,
}

impl Display for SelectError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyCatalog => write!(f, "cannot pick a note from an empty catalog"),
        }
    }
}

impl Error for SelectError {}

/// Uniform random picker over a note set.
#[derive(Debug, Clone)]
pub struct NoteSelector {
    rng: StdRng,
}

impl NoteSelector {
    /// Seeds from OS entropy.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic selector for tests and replays.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Picks one note uniformly at random.
    pub fn pick<'a>(&mut self, notes: &'a [Note]) -> Result<&'a Note, SelectError> {
        notes.choose(&mut self.rng).ok_or(SelectError::EmptyCatalog)
    }
}

impl Default for NoteSelector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::{NoteSelector, SelectError};
    use crate::catalog::note_catalog::NoteCatalog;
    use std::collections::HashSet;

    #[test]
    fn empty_set_is_an_error() {
        let mut selector = NoteSelector::seeded(7);
        assert_eq!(selector.pick(&[]), Err(SelectError::EmptyCatalog));
    }

    #[test]
    fn picks_stay_inside_the_set_and_cover_it() {
        let notes = NoteCatalog::standard().notes_for_level(1);
        let mut selector = NoteSelector::seeded(42);
        let mut seen = HashSet::new();
        for _ in 0..500 {
            let note = selector.pick(&notes).expect("non-empty set");
            assert!(notes.contains(note));
            seen.insert(note.id.clone());
        }
        assert_eq!(seen.len(), notes.len());
    }

    #[test]
    fn same_seed_gives_same_sequence() {
        let notes = NoteCatalog::standard().all_notes();
        let mut first = NoteSelector::seeded(3);
        let mut second = NoteSelector::seeded(3);
        for _ in 0..20 {
            assert_eq!(first.pick(&notes), second.pick(&notes));
        }
    }
}
