//! Per-mode quiz session state machine.
//!
//! # Responsibility
//! - Pose rounds drawn from the catalog tier for the current level.
//! - Accept exactly one answer per round and score it.
//! - Gate pitch-mode answers on the posed note having been played.
//!
//! # Invariants
//! - States cycle `Idle -> RoundActive -> AnswerLocked -> RoundActive ...`;
//!   `Disposed` is terminal.
//! - `answer_locked` is set on acceptance and cleared only by `start_round()`.
//! - Rejected submissions change no state and award nothing.
//! - A `RoundTicket` is honoured only by the session and round that issued it.

use crate::catalog::note_catalog::NoteCatalog;
use crate::catalog::selector::{NoteSelector, SelectError};
use crate::config::RoundTiming;
use crate::engine::judge::judge;
use crate::engine::progression::ProgressionTracker;
use crate::model::note::{Note, NoteId};
use crate::model::progress::{LevelUpEvent, QuizMode};
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Observable session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No round has been posed yet.
    Idle,
    /// A round is posed and waiting for an answer.
    RoundActive,
    /// The round's answer was accepted; waiting for the next round.
    AnswerLocked,
    /// Torn down; accepts nothing.
    Disposed,
}

/// Ephemeral state of the posed round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundState {
    pub posed: Note,
    /// Always `true` in modes that do not require sound.
    pub has_played_sound: bool,
    pub answer_locked: bool,
}

/// Identifies one round of one session; used to cancel stale timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoundTicket {
    pub session_id: Uuid,
    pub round: u64,
}

/// Next round the caller should start after `delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRound {
    pub mode: QuizMode,
    pub delay: Duration,
    /// Ticket of the answered round; stale once another round starts.
    pub ticket: RoundTicket,
}

/// Data a presentation layer needs to show a new round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PosedRound {
    pub mode: QuizMode,
    pub ticket: RoundTicket,
    pub level: u32,
    pub note: Note,
    /// Answer choices: the current tier ordered low to high.
    pub choices: Vec<Note>,
    /// `true` when answers stay disabled until the note is played.
    pub awaiting_sound: bool,
}

/// Result of an accepted answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundOutcome {
    pub mode: QuizMode,
    pub is_correct: bool,
    pub submitted_note_id: NoteId,
    pub correct_note: Note,
    pub points_awarded: u32,
    pub mode_score: u32,
    pub total_score: u32,
    pub level_up: Option<LevelUpEvent>,
    /// Notes unlocked by `level_up`; empty when the tier did not grow.
    pub unlocked_notes: Vec<Note>,
    pub next_round: PendingRound,
}

impl RoundOutcome {
    pub fn correct_note_id(&self) -> &NoteId {
        &self.correct_note.id
    }
}

/// Why a submission was dropped. Never surfaced to players.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitRejection {
    NoActiveRound,
    /// Duplicate or rapid repeat submission for an answered round.
    AnswerLocked,
    /// Pitch round answered before its note was played.
    SoundNotPlayed,
    Disposed,
}

impl SubmitRejection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoActiveRound => "no_active_round",
            Self::AnswerLocked => "answer_locked",
            Self::SoundNotPlayed => "sound_not_played",
            Self::Disposed => "disposed",
        }
    }
}

impl Display for SubmitRejection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "answer submission ignored: {}", self.as_str())
    }
}

impl Error for SubmitRejection {}

/// Session lifecycle error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    Disposed,
    NoSession(QuizMode),
    Select(SelectError),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disposed => write!(f, "quiz session has been disposed"),
            Self::NoSession(mode) => write!(f, "no open {mode} session"),
            Self::Select(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Select(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SelectError> for SessionError {
    fn from(value: SelectError) -> Self {
        Self::Select(value)
    }
}

/// One quiz mode's round loop.
#[derive(Debug)]
pub struct QuizSession {
    id: Uuid,
    mode: QuizMode,
    catalog: Arc<NoteCatalog>,
    selector: NoteSelector,
    timing: RoundTiming,
    round: Option<RoundState>,
    round_number: u64,
    disposed: bool,
}

impl QuizSession {
    pub fn new(
        mode: QuizMode,
        catalog: Arc<NoteCatalog>,
        selector: NoteSelector,
        timing: RoundTiming,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            mode,
            catalog,
            selector,
            timing,
            round: None,
            round_number: 0,
            disposed: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn mode(&self) -> QuizMode {
        self.mode
    }

    pub fn state(&self) -> SessionState {
        if self.disposed {
            return SessionState::Disposed;
        }
        match &self.round {
            None => SessionState::Idle,
            Some(round) if round.answer_locked => SessionState::AnswerLocked,
            Some(_) => SessionState::RoundActive,
        }
    }

    pub fn round_state(&self) -> Option<&RoundState> {
        self.round.as_ref()
    }

    pub fn posed_note(&self) -> Option<&Note> {
        self.round.as_ref().map(|round| &round.posed)
    }

    /// Ticket of the current round, if any.
    pub fn current_ticket(&self) -> Option<RoundTicket> {
        self.round.as_ref().map(|_| self.ticket())
    }

    /// Returns whether `ticket` still refers to this session's current round.
    pub fn accepts(&self, ticket: &RoundTicket) -> bool {
        !self.disposed && ticket.session_id == self.id && ticket.round == self.round_number
    }

    /// Whether an answer would be accepted right now.
    pub fn can_submit(&self) -> bool {
        self.check_submittable().is_ok()
    }

    /// Poses a new round from the tier unlocked at the tracker's level.
    ///
    /// Allowed from any live state; clears the answer lock and sound gate.
    pub fn start_round(
        &mut self,
        tracker: &ProgressionTracker,
    ) -> Result<PosedRound, SessionError> {
        if self.disposed {
            return Err(SessionError::Disposed);
        }

        let level = tracker.current_level();
        let choices = self.catalog.notes_for_level(level);
        let posed = self.selector.pick(&choices)?.clone();

        self.round_number += 1;
        self.round = Some(RoundState {
            posed: posed.clone(),
            has_played_sound: !self.mode.requires_sound(),
            answer_locked: false,
        });

        debug!(
            "event=round_start module=session status=ok mode={} session_id={} round={} level={} choices={}",
            self.mode,
            self.id,
            self.round_number,
            level,
            choices.len()
        );

        Ok(PosedRound {
            mode: self.mode,
            ticket: self.ticket(),
            level,
            note: posed,
            choices,
            awaiting_sound: self.mode.requires_sound(),
        })
    }

    /// Records that the posed note was played, enabling answers.
    ///
    /// Returns `true` when this call opened the gate. Replays, answered
    /// rounds and modes without a sound gate are no-ops.
    pub fn on_sound_played(&mut self) -> bool {
        if self.disposed || !self.mode.requires_sound() {
            return false;
        }
        match self.round.as_mut() {
            Some(round) if !round.answer_locked && !round.has_played_sound => {
                round.has_played_sound = true;
                true
            }
            _ => false,
        }
    }

    /// Accepts, judges and scores one answer.
    ///
    /// # Errors
    /// Returns the rejection reason without touching any state when the round
    /// is locked, not yet played (pitch), missing, or the session is gone.
    pub fn try_submit_answer(
        &mut self,
        note_id: &str,
        tracker: &mut ProgressionTracker,
    ) -> Result<RoundOutcome, SubmitRejection> {
        if let Err(rejection) = self.check_submittable() {
            debug!(
                "event=answer_rejected module=session status=skip mode={} session_id={} round={} reason={}",
                self.mode,
                self.id,
                self.round_number,
                rejection.as_str()
            );
            return Err(rejection);
        }

        let ticket = self.ticket();
        let round = self.round.as_mut().ok_or(SubmitRejection::NoActiveRound)?;
        round.answer_locked = true;
        let correct_note = round.posed.clone();

        let judgement = judge(note_id, correct_note.id.as_str());
        tracker.award(self.mode, judgement.points_awarded);
        let level_up = tracker.check_level_up();
        let unlocked_notes = level_up
            .map(|event| self.catalog.newly_unlocked(event.old_level, event.new_level))
            .unwrap_or_default();

        info!(
            "event=answer_judged module=session status=ok mode={} session_id={} round={} correct={} points={} total={}",
            self.mode,
            self.id,
            self.round_number,
            judgement.is_correct,
            judgement.points_awarded,
            tracker.total_score()
        );
        if let Some(event) = level_up {
            info!(
                "event=level_up module=session status=ok mode={} old_level={} new_level={} unlocked={}",
                self.mode,
                event.old_level,
                event.new_level,
                unlocked_notes.len()
            );
        }

        Ok(RoundOutcome {
            mode: self.mode,
            is_correct: judgement.is_correct,
            submitted_note_id: NoteId::new(note_id),
            correct_note,
            points_awarded: judgement.points_awarded,
            mode_score: tracker.score_for(self.mode),
            total_score: tracker.total_score(),
            level_up,
            unlocked_notes,
            next_round: PendingRound {
                mode: self.mode,
                delay: self.timing.delay_for(judgement.is_correct),
                ticket,
            },
        })
    }

    /// Like [`Self::try_submit_answer`], dropping the rejection reason.
    pub fn submit_answer(
        &mut self,
        note_id: &str,
        tracker: &mut ProgressionTracker,
    ) -> Option<RoundOutcome> {
        self.try_submit_answer(note_id, tracker).ok()
    }

    /// Tears the session down; pending tickets become stale.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.round = None;
        debug!(
            "event=session_close module=session status=ok mode={} session_id={} rounds={}",
            self.mode, self.id, self.round_number
        );
    }

    fn ticket(&self) -> RoundTicket {
        RoundTicket {
            session_id: self.id,
            round: self.round_number,
        }
    }

    fn check_submittable(&self) -> Result<(), SubmitRejection> {
        if self.disposed {
            return Err(SubmitRejection::Disposed);
        }
        let round = self.round.as_ref().ok_or(SubmitRejection::NoActiveRound)?;
        if round.answer_locked {
            return Err(SubmitRejection::AnswerLocked);
        }
        if !round.has_played_sound {
            return Err(SubmitRejection::SoundNotPlayed);
        }
        Ok(())
    }
}
