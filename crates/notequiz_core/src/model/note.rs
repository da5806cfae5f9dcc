//! Note domain model.
//!
//! # Responsibility
//! - Define the immutable note value posed by quiz rounds and offered as
//!   answer choices.
//! - Provide pitch helpers used for display ordering and audio playback.
//!
//! # Invariants
//! - `id` uniquely identifies a pitch class/octave combination.
//! - `pitch_rank` orders notes by frequency and never participates in answer
//!   matching.
//!
//! # See also
//! - crate::catalog::note_catalog

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Scientific pitch notation: letter, optional accidental, octave.
static NOTE_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-G](#|b)?-?[0-9]$").expect("valid note id regex"));

/// Reference pitch used by [`Note::frequency_hz`].
const CONCERT_A_HZ: f64 = 440.0;
/// Pitch rank of A4 (MIDI numbering).
const CONCERT_A_RANK: i32 = 69;

/// Stable note identifier, e.g. `C4` or `F#5`.
///
/// Equality is exact string identity; `C4` and `C5` are different answers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns whether the id is well-formed scientific pitch notation.
    pub fn is_well_formed(&self) -> bool {
        NOTE_ID_RE.is_match(&self.0)
    }

    /// Letter name shown next to solfege labels on answer buttons.
    pub fn letter(&self) -> Option<char> {
        self.0.chars().next()
    }
}

impl Display for NoteId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NoteId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl PartialEq<str> for NoteId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

/// Quiz subject and answer choice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    /// Label shown to the player (solfege in the standard catalog).
    pub display_name: String,
    /// MIDI note number; higher means higher pitch.
    pub pitch_rank: i32,
}

impl Note {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, pitch_rank: i32) -> Self {
        Self {
            id: NoteId::new(id),
            display_name: display_name.into(),
            pitch_rank,
        }
    }

    /// Equal-tempered frequency derived from `pitch_rank`.
    pub fn frequency_hz(&self) -> f64 {
        let semitones = f64::from(self.pitch_rank - CONCERT_A_RANK);
        CONCERT_A_HZ * 2f64.powf(semitones / 12.0)
    }

    /// Button label: display name followed by the letter, e.g. `ド (C)`.
    pub fn choice_label(&self) -> String {
        match self.id.letter() {
            Some(letter) => format!("{} ({letter})", self.display_name),
            None => self.display_name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Note, NoteId};

    #[test]
    fn well_formed_ids_follow_scientific_pitch_notation() {
        assert!(NoteId::from("C4").is_well_formed());
        assert!(NoteId::from("F#5").is_well_formed());
        assert!(NoteId::from("Bb3").is_well_formed());
        assert!(!NoteId::from("H4").is_well_formed());
        assert!(!NoteId::from("c4").is_well_formed());
        assert!(!NoteId::from("C").is_well_formed());
    }

    #[test]
    fn frequency_uses_concert_a_reference() {
        let a4 = Note::new("A4", "ラ", 69);
        let a3 = Note::new("A3", "低いラ", 57);
        assert!((a4.frequency_hz() - 440.0).abs() < 1e-9);
        assert!((a3.frequency_hz() - 220.0).abs() < 1e-9);
    }

    #[test]
    fn choice_label_appends_letter() {
        let note = Note::new("C4", "ド", 60);
        assert_eq!(note.choice_label(), "ド (C)");
    }
}
