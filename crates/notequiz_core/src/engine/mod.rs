//! Quiz engine: judgement, progression and the per-mode session.
//!
//! # Responsibility
//! - Hold the rules that must not depend on UI, audio or storage.
//!
//! # Invariants
//! - Engine types never touch persistence; callers own save/load timing.

pub mod judge;
pub mod progression;
pub mod session;
