//! Score persistence contracts and implementations.
//!
//! # Responsibility
//! - Define the `ScoreStore` boundary used by the quiz service.
//! - Keep SQLite and JSON details out of the engine.
//!
//! # Invariants
//! - Every store speaks the same JSON snapshot shape.

pub mod score_store;
pub mod session_store;
