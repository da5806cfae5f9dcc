//! Quiz domain model.
//!
//! # Responsibility
//! - Define notes, modes, level math and the persisted snapshot shape.
//!
//! # Invariants
//! - Level is always derived from total score, never stored on its own.

pub mod note;
pub mod progress;
pub mod snapshot;
