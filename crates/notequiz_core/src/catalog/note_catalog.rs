//! Level-tiered note catalog.
//!
//! # Responsibility
//! - Map a level to the set of notes a round may pose.
//! - Validate custom tier layouts before they reach a session.
//!
//! # Invariants
//! - Tiers are stored as additions; the set for level `n` is the union of
//!   tiers `1..=n`, so `notes_for_level(n) ⊆ notes_for_level(n + 1)`.
//! - Note ids are unique across all tiers.
//! - Returned sets are ordered by `pitch_rank`, then id.

use crate::model::note::{Note, NoteId};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Validation error for catalog construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    NoTiers,
    /// 1-based level whose tier adds no notes.
    EmptyTier(u32),
    DuplicateNote(NoteId),
    InvalidNoteId(NoteId),
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoTiers => write!(f, "note catalog must define at least one tier"),
            Self::EmptyTier(level) => write!(f, "catalog tier for level {level} adds no notes"),
            Self::DuplicateNote(id) => write!(f, "note `{id}` appears in more than one tier"),
            Self::InvalidNoteId(id) => write!(f, "note id `{id}` is not valid pitch notation"),
        }
    }
}

impl Error for CatalogError {}

/// Cumulative level -> note set mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteCatalog {
    tiers: Vec<Vec<Note>>,
}

impl NoteCatalog {
    /// Builds a catalog where `tiers[i]` lists the notes unlocked at level
    /// `i + 1`.
    ///
    /// # Errors
    /// - `NoTiers` when `tiers` is empty.
    /// - `EmptyTier` when a tier adds nothing.
    /// - `DuplicateNote` / `InvalidNoteId` on malformed note data.
    pub fn from_tiers(tiers: Vec<Vec<Note>>) -> Result<Self, CatalogError> {
        if tiers.is_empty() {
            return Err(CatalogError::NoTiers);
        }

        let mut seen = BTreeSet::new();
        for (index, tier) in tiers.iter().enumerate() {
            if tier.is_empty() {
                return Err(CatalogError::EmptyTier(index as u32 + 1));
            }
            for note in tier {
                if !note.id.is_well_formed() {
                    return Err(CatalogError::InvalidNoteId(note.id.clone()));
                }
                if !seen.insert(note.id.clone()) {
                    return Err(CatalogError::DuplicateNote(note.id.clone()));
                }
            }
        }

        Ok(Self { tiers })
    }

    /// Two-tier catalog: one octave from middle C, then A3-B3 and C5-F5.
    pub fn standard() -> Self {
        Self {
            tiers: vec![
                vec![
                    Note::new("C4", "ド", 60),
                    Note::new("D4", "レ", 62),
                    Note::new("E4", "ミ", 64),
                    Note::new("F4", "ファ", 65),
                    Note::new("G4", "ソ", 67),
                    Note::new("A4", "ラ", 69),
                    Note::new("B4", "シ", 71),
                ],
                vec![
                    Note::new("A3", "低いラ", 57),
                    Note::new("B3", "低いシ", 59),
                    Note::new("C5", "高いド", 72),
                    Note::new("D5", "高いレ", 74),
                    Note::new("E5", "高いミ", 76),
                    Note::new("F5", "高いファ", 77),
                ],
            ],
        }
    }

    pub fn tier_count(&self) -> usize {
        self.tiers.len()
    }

    /// Returns the unlocked note set for `level`, clamping `level` to `>= 1`.
    ///
    /// Levels past the last tier return the maximal set.
    pub fn notes_for_level(&self, level: u32) -> Vec<Note> {
        let unlocked = self.tier_index_for_level(level) + 1;
        sorted_union(self.tiers.iter().take(unlocked))
    }

    /// Returns the maximal note set.
    pub fn all_notes(&self) -> Vec<Note> {
        sorted_union(self.tiers.iter())
    }

    /// Notes that become available when moving from `old_level` to
    /// `new_level`. Empty when both levels resolve to the same tier.
    pub fn newly_unlocked(&self, old_level: u32, new_level: u32) -> Vec<Note> {
        let from = self.tier_index_for_level(old_level) + 1;
        let to = self.tier_index_for_level(new_level) + 1;
        if to <= from {
            return Vec::new();
        }
        sorted_union(self.tiers[from..to].iter())
    }

    /// Looks up a note anywhere in the catalog.
    pub fn find(&self, id: &str) -> Option<&Note> {
        self.tiers.iter().flatten().find(|note| note.id == *id)
    }

    fn tier_index_for_level(&self, level: u32) -> usize {
        let clamped = level.max(1) as usize;
        clamped.min(self.tiers.len()) - 1
    }
}

impl Default for NoteCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

fn sorted_union<'a>(tiers: impl Iterator<Item = &'a Vec<Note>>) -> Vec<Note> {
    let mut notes = tiers.flatten().cloned().collect::<Vec<_>>();
    notes.sort_by(|left, right| {
        left.pitch_rank
            .cmp(&right.pitch_rank)
            .then_with(|| left.id.cmp(&right.id))
    });
    notes
}

#[cfg(test)]
mod tests {
    use super::{CatalogError, NoteCatalog};
    use crate::model::note::Note;

    #[test]
    fn standard_catalog_tiers_have_expected_sizes() {
        let catalog = NoteCatalog::standard();
        assert_eq!(catalog.tier_count(), 2);
        assert_eq!(catalog.notes_for_level(1).len(), 7);
        assert_eq!(catalog.notes_for_level(2).len(), 13);
        assert_eq!(catalog.all_notes().len(), 13);
    }

    #[test]
    fn level_zero_is_clamped_to_first_tier() {
        let catalog = NoteCatalog::standard();
        assert_eq!(catalog.notes_for_level(0), catalog.notes_for_level(1));
    }

    #[test]
    fn notes_are_ordered_low_to_high() {
        let ids = NoteCatalog::standard()
            .notes_for_level(2)
            .into_iter()
            .map(|note| note.id.to_string())
            .collect::<Vec<_>>();
        assert_eq!(
            ids,
            vec!["A3", "B3", "C4", "D4", "E4", "F4", "G4", "A4", "B4", "C5", "D5", "E5", "F5"]
        );
    }

    #[test]
    fn from_tiers_rejects_duplicates_across_tiers() {
        let err = NoteCatalog::from_tiers(vec![
            vec![Note::new("C4", "ド", 60)],
            vec![Note::new("C4", "ド", 60)],
        ])
        .unwrap_err();
        assert_eq!(err, CatalogError::DuplicateNote("C4".into()));
    }

    #[test]
    fn from_tiers_rejects_empty_tier_and_bad_ids() {
        assert_eq!(
            NoteCatalog::from_tiers(vec![vec![Note::new("C4", "ド", 60)], vec![]]).unwrap_err(),
            CatalogError::EmptyTier(2)
        );
        assert_eq!(
            NoteCatalog::from_tiers(vec![vec![Note::new("do", "ド", 60)]]).unwrap_err(),
            CatalogError::InvalidNoteId("do".into())
        );
        assert_eq!(
            NoteCatalog::from_tiers(Vec::new()).unwrap_err(),
            CatalogError::NoTiers
        );
    }

    #[test]
    fn newly_unlocked_lists_only_added_tier() {
        let catalog = NoteCatalog::standard();
        let added = catalog.newly_unlocked(1, 2);
        assert_eq!(added.len(), 6);
        assert!(catalog.newly_unlocked(2, 3).is_empty());
        assert!(catalog.newly_unlocked(3, 2).is_empty());
    }
}
