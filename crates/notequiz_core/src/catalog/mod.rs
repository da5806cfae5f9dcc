//! Note catalog and random selection.
//!
//! # Responsibility
//! - Own the level -> note set mapping.
//! - Draw the posed note for a round.

pub mod note_catalog;
pub mod selector;
