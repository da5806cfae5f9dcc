//! Core quiz logic for the note-reading and ear-training quiz.
//! This crate is the single source of truth for scoring and leveling rules.

pub mod catalog;
pub mod config;
pub mod db;
pub mod engine;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use catalog::note_catalog::{CatalogError, NoteCatalog};
pub use catalog::selector::{NoteSelector, SelectError};
pub use config::{ConfigError, QuizConfig, RoundTiming, DEFAULT_STORAGE_KEY};
pub use engine::judge::{judge, Judgement};
pub use engine::progression::ProgressionTracker;
pub use engine::session::{
    PendingRound, PosedRound, QuizSession, RoundOutcome, RoundState, RoundTicket, SessionError,
    SessionState, SubmitRejection,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::note::{Note, NoteId};
pub use model::progress::{
    level_for_score, LevelUpEvent, ProgressView, QuizMode, POINTS_PER_CORRECT_ANSWER,
    POINTS_PER_LEVEL,
};
pub use model::snapshot::PersistedSnapshot;
pub use repo::score_store::{ScoreStore, SqliteScoreStore, StoreError, StoreResult};
pub use repo::session_store::{DisabledScoreStore, FallbackScoreStore, MemoryScoreStore};
pub use service::audio::{AudioBackend, SilentAudio};
pub use service::quiz_service::{PersistenceStatus, QuizService, STORAGE_NOTICE};

/// Minimal health-check API for adapter integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
