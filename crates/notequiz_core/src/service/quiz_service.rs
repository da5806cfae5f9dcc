//! Quiz use-case service.
//!
//! # Responsibility
//! - Own the single `ProgressionTracker` shared by both quiz modes.
//! - Open, drive and tear down per-mode sessions for an adapter layer.
//! - Persist progress after every scoring event and on teardown.
//!
//! # Invariants
//! - Progress is loaded exactly once, when the service is constructed.
//! - Persistence failures are logged and absorbed; gameplay never stops.
//! - After storage reports `Unavailable`, scoring continues in memory only.
//! - A save that lands only in session storage downgrades `Durable` to
//!   `SessionOnly`, which turns the storage notice on.
//! - A pending round fires only for the session and round that issued it.

use crate::catalog::note_catalog::NoteCatalog;
use crate::catalog::selector::NoteSelector;
use crate::config::QuizConfig;
use crate::engine::progression::ProgressionTracker;
use crate::engine::session::{
    PendingRound, PosedRound, QuizSession, RoundOutcome, SessionError, SubmitRejection,
};
use crate::model::note::Note;
use crate::model::progress::{ProgressView, QuizMode};
use crate::repo::score_store::{ScoreStore, StoreError};
use crate::service::audio::AudioBackend;
use chrono::Utc;
use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::sync::Arc;

/// Notice shown when progress will not survive the session.
pub const STORAGE_NOTICE: &str =
    "Scores can't be saved on this device (private browsing or storage disabled). \
     Your progress lasts until the quiz is closed.";

/// Where progress currently ends up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceStatus {
    /// Saved to storage that outlives the session.
    Durable,
    /// Saved to session-scoped storage only.
    SessionOnly,
    /// Not saved at all; scores live in memory for this session.
    Degraded(String),
}

/// Quiz facade over a score store.
pub struct QuizService<S: ScoreStore> {
    store: S,
    config: QuizConfig,
    catalog: Arc<NoteCatalog>,
    tracker: ProgressionTracker,
    sessions: HashMap<QuizMode, QuizSession>,
    seed: Option<u64>,
    sessions_opened: u64,
    persistence: PersistenceStatus,
}

impl<S: ScoreStore> QuizService<S> {
    /// Creates a service with the standard catalog and restores progress.
    pub fn start(store: S, config: QuizConfig) -> Self {
        Self::with_catalog(store, config, NoteCatalog::standard())
    }

    /// Creates a service with a custom catalog and restores progress.
    pub fn with_catalog(store: S, config: QuizConfig, catalog: NoteCatalog) -> Self {
        let persistence = probe_persistence(&store);
        let tracker = restore_tracker(&store);
        info!(
            "event=service_start module=service status=ok persistence={} level={} total={}",
            persistence_label(&persistence),
            tracker.current_level(),
            tracker.total_score()
        );

        Self {
            store,
            config,
            catalog: Arc::new(catalog),
            tracker,
            sessions: HashMap::new(),
            seed: None,
            sessions_opened: 0,
            persistence,
        }
    }

    /// Makes note selection deterministic for sessions opened afterwards.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Opens a fresh session for `mode` and poses its first round.
    ///
    /// Any previous session for the mode is disposed, invalidating its
    /// pending rounds.
    pub fn open_session(&mut self, mode: QuizMode) -> Result<PosedRound, SessionError> {
        if let Some(mut previous) = self.sessions.remove(&mode) {
            previous.dispose();
        }

        let selector = match self.seed {
            Some(seed) => NoteSelector::seeded(seed.wrapping_add(self.sessions_opened)),
            None => NoteSelector::new(),
        };
        self.sessions_opened += 1;

        let mut session = QuizSession::new(
            mode,
            Arc::clone(&self.catalog),
            selector,
            self.config.timing(mode),
        );
        info!(
            "event=session_open module=service status=ok mode={} session_id={}",
            mode,
            session.id()
        );
        let posed = session.start_round(&self.tracker)?;
        self.sessions.insert(mode, session);
        Ok(posed)
    }

    /// Poses a new round in the open `mode` session immediately.
    pub fn start_round(&mut self, mode: QuizMode) -> Result<PosedRound, SessionError> {
        let session = self
            .sessions
            .get_mut(&mode)
            .ok_or(SessionError::NoSession(mode))?;
        session.start_round(&self.tracker)
    }

    /// Starts the round scheduled by an earlier outcome.
    ///
    /// Returns `None` when the session was closed or another round has
    /// started since, i.e. the timer is stale.
    pub fn resume_round(&mut self, pending: &PendingRound) -> Option<PosedRound> {
        let Some(session) = self.sessions.get_mut(&pending.mode) else {
            debug!(
                "event=round_resume module=service status=skip mode={} reason=no_session",
                pending.mode
            );
            return None;
        };
        if !session.accepts(&pending.ticket) {
            debug!(
                "event=round_resume module=service status=skip mode={} reason=stale_ticket",
                pending.mode
            );
            return None;
        }

        match session.start_round(&self.tracker) {
            Ok(posed) => Some(posed),
            Err(err) => {
                error!(
                    "event=round_resume module=service status=error mode={} error={}",
                    pending.mode, err
                );
                None
            }
        }
    }

    /// Acknowledges that the host finished starting playback of the posed
    /// note. Returns whether this opened the answer gate.
    pub fn mark_sound_played(&mut self, mode: QuizMode) -> bool {
        self.sessions
            .get_mut(&mode)
            .is_some_and(QuizSession::on_sound_played)
    }

    /// Plays the posed note through `audio`, initializing it if needed.
    ///
    /// The answer gate opens only when playback was actually initiated.
    /// Returns whether the note was played.
    pub fn play_current_note(&mut self, mode: QuizMode, audio: &mut dyn AudioBackend) -> bool {
        let Some(session) = self.sessions.get_mut(&mode) else {
            return false;
        };
        let Some(round) = session.round_state() else {
            return false;
        };
        if round.answer_locked {
            return false;
        }
        let note = round.posed.clone();

        if !audio.is_audio_initialized() && !audio.initialize_audio() {
            warn!("event=audio_play module=service status=error mode={mode} reason=audio_uninitialized");
            return false;
        }
        if !audio.play_note(&note) {
            warn!("event=audio_play module=service status=error mode={mode} reason=playback_refused");
            return false;
        }

        session.on_sound_played();
        true
    }

    /// Submits an answer; `None` when the submission was ignored.
    pub fn submit_answer(&mut self, mode: QuizMode, note_id: &str) -> Option<RoundOutcome> {
        self.try_submit_answer(mode, note_id).ok()
    }

    /// Submits an answer and saves progress when it is accepted.
    pub fn try_submit_answer(
        &mut self,
        mode: QuizMode,
        note_id: &str,
    ) -> Result<RoundOutcome, SubmitRejection> {
        let session = self
            .sessions
            .get_mut(&mode)
            .ok_or(SubmitRejection::NoActiveRound)?;
        let outcome = session.try_submit_answer(note_id, &mut self.tracker)?;
        self.save_progress();
        Ok(outcome)
    }

    /// Disposes the `mode` session and saves progress.
    pub fn close_session(&mut self, mode: QuizMode) {
        if let Some(mut session) = self.sessions.remove(&mode) {
            session.dispose();
            self.save_progress();
        }
    }

    /// Disposes every session and saves progress.
    pub fn shutdown(&mut self) {
        for (_, mut session) in self.sessions.drain() {
            session.dispose();
        }
        self.save_progress();
        info!(
            "event=service_shutdown module=service status=ok total={}",
            self.tracker.total_score()
        );
    }

    /// Zeroes all scores and clears persisted progress.
    ///
    /// Never produces a level-up; the next round draws from the first tier.
    pub fn reset_scores(&mut self) -> ProgressView {
        self.tracker.reset();
        if let Err(err) = self.store.clear() {
            warn!("event=score_reset module=service status=error error={err}");
        } else {
            info!("event=score_reset module=service status=ok");
        }
        self.tracker.progress()
    }

    /// Writes the current snapshot; returns whether it was stored.
    pub fn save_progress(&mut self) -> bool {
        if let PersistenceStatus::Degraded(reason) = &self.persistence {
            debug!("event=score_save module=service status=skip reason={reason}");
            return false;
        }

        let snapshot = self.tracker.snapshot(Utc::now());
        match self.store.save(&snapshot) {
            Ok(()) => {
                debug!(
                    "event=score_save module=service status=ok total={}",
                    snapshot.total_score
                );
                self.track_save_durability();
                true
            }
            Err(StoreError::Unavailable(reason)) => {
                warn!("event=storage_degraded module=service status=error reason={reason}");
                self.persistence = PersistenceStatus::Degraded(reason);
                false
            }
            Err(err) => {
                warn!("event=score_save module=service status=error error={err}");
                false
            }
        }
    }

    /// Moves between `Durable` and `SessionOnly` after a successful save.
    fn track_save_durability(&mut self) {
        let durable = self.store.last_save_durable();
        match (&self.persistence, durable) {
            (PersistenceStatus::Durable, false) => {
                warn!("event=storage_degraded module=service status=error reason=session_only_save");
                self.persistence = PersistenceStatus::SessionOnly;
            }
            (PersistenceStatus::SessionOnly, true) => {
                info!("event=storage_restored module=service status=ok");
                self.persistence = PersistenceStatus::Durable;
            }
            _ => {}
        }
    }

    pub fn progress(&self) -> ProgressView {
        self.tracker.progress()
    }

    /// Notes a round would currently be drawn from.
    pub fn active_notes(&self) -> Vec<Note> {
        self.catalog.notes_for_level(self.tracker.current_level())
    }

    pub fn catalog(&self) -> &NoteCatalog {
        &self.catalog
    }

    pub fn tracker(&self) -> &ProgressionTracker {
        &self.tracker
    }

    pub fn session(&self, mode: QuizMode) -> Option<&QuizSession> {
        self.sessions.get(&mode)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &QuizConfig {
        &self.config
    }

    pub fn persistence_status(&self) -> &PersistenceStatus {
        &self.persistence
    }

    /// Informational notice for players whose progress is not durable.
    pub fn storage_notice(&self) -> Option<&'static str> {
        match self.persistence {
            PersistenceStatus::Durable => None,
            PersistenceStatus::SessionOnly | PersistenceStatus::Degraded(_) => {
                Some(STORAGE_NOTICE)
            }
        }
    }
}

fn probe_persistence<S: ScoreStore>(store: &S) -> PersistenceStatus {
    if store.is_durable() {
        PersistenceStatus::Durable
    } else if store.is_available() {
        PersistenceStatus::SessionOnly
    } else {
        PersistenceStatus::Degraded("no writable score storage".to_string())
    }
}

fn restore_tracker<S: ScoreStore>(store: &S) -> ProgressionTracker {
    match store.load() {
        Ok(Some(snapshot)) => {
            if !snapshot.is_consistent() {
                warn!(
                    "event=score_load module=service status=ok normalized=true stored_total={} stored_level={}",
                    snapshot.total_score, snapshot.level
                );
            }
            let tracker = ProgressionTracker::from_snapshot(&snapshot);
            info!(
                "event=score_load module=service status=ok total={} level={}",
                tracker.total_score(),
                tracker.current_level()
            );
            tracker
        }
        Ok(None) => {
            info!("event=score_load module=service status=ok empty=true");
            ProgressionTracker::new()
        }
        Err(err) => {
            warn!("event=score_load module=service status=error error={err}");
            ProgressionTracker::new()
        }
    }
}

fn persistence_label(status: &PersistenceStatus) -> &'static str {
    match status {
        PersistenceStatus::Durable => "durable",
        PersistenceStatus::SessionOnly => "session_only",
        PersistenceStatus::Degraded(_) => "degraded",
    }
}
