//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the quiz screens' use cases to Dart via FRB.
//! - Hold the single process-wide quiz service between calls.
//! - Flatten core types into plain view structs.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every call before `quiz_boot` fails with a stable message.
//! - Pending-round timers live on the Dart side; they hand back the ticket
//!   (`session_id` + `round`) they were scheduled with.

use log::{info, warn};
use notequiz_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    DisabledScoreStore, FallbackScoreStore, MemoryScoreStore, Note, PendingRound,
    PersistenceStatus, PosedRound, ProgressView, QuizConfig, QuizMode, QuizService,
    RoundOutcome, RoundTicket, ScoreStore, SqliteScoreStore,
};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use uuid::Uuid;

const QUIZ_DB_FILE_NAME: &str = "notequiz.sqlite3";
const NOT_BOOTED: &str = "quiz not booted; call quiz_boot first";

type FfiScoreStore = FallbackScoreStore<Box<dyn ScoreStore + Send>, MemoryScoreStore>;

static QUIZ: Mutex<Option<QuizService<FfiScoreStore>>> = Mutex::new(None);

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// One answer button or posed note.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteView {
    pub note_id: String,
    pub display_name: String,
    /// Button text, e.g. `ド (C)`.
    pub choice_label: String,
    /// Playback frequency for the host synthesizer.
    pub frequency_hz: f64,
}

/// Round data for the quiz screen.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundView {
    /// `pitch|notation`.
    pub mode: String,
    pub session_id: String,
    pub round: u64,
    pub level: u32,
    pub note: NoteView,
    pub choices: Vec<NoteView>,
    /// Answer buttons stay disabled until `quiz_sound_played` succeeds.
    pub awaiting_sound: bool,
}

/// Feedback for an accepted answer plus the next-round schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct OutcomeView {
    pub is_correct: bool,
    pub submitted_note_id: String,
    pub correct_note: NoteView,
    pub points_awarded: u32,
    pub mode_score: u32,
    pub total_score: u32,
    /// New level when this answer crossed a level boundary.
    pub new_level: Option<u32>,
    pub unlocked_notes: Vec<NoteView>,
    /// Delay before Dart should call `quiz_resume_round`.
    pub next_round_delay_ms: u64,
    pub next_session_id: String,
    pub next_round: u64,
}

/// Progress screen data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSummary {
    pub level: u32,
    pub pitch_score: u32,
    pub note_score: u32,
    pub total_score: u32,
    pub percent_to_next_level: u32,
    pub badges_earned: u32,
}

/// Response envelope for `quiz_boot`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootResponse {
    pub ok: bool,
    /// `durable|session_only|degraded`.
    pub persistence: String,
    pub storage_notice: Option<String>,
    pub progress: Option<ProgressSummary>,
    pub message: String,
}

/// Response envelope for calls that pose a round.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundResponse {
    pub ok: bool,
    pub round: Option<RoundView>,
    pub message: String,
}

/// Response envelope for answer submission.
///
/// `accepted == false` means the tap was ignored (duplicate, no sound yet,
/// no round); the UI shows nothing in that case.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerResponse {
    pub accepted: bool,
    pub outcome: Option<OutcomeView>,
    pub message: String,
}

/// Response envelope for progress reads and resets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressResponse {
    pub ok: bool,
    pub progress: Option<ProgressSummary>,
    pub message: String,
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    pub ok: bool,
    pub message: String,
}

impl RoundResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            round: None,
            message: message.into(),
        }
    }
}

impl ProgressResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            progress: None,
            message: message.into(),
        }
    }
}

impl ActionResponse {
    fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// Loads saved progress and makes the quiz ready for play.
///
/// Input semantics:
/// - `db_path`: score database file; falls back to `NOTEQUIZ_DB_PATH`, then
///   the system temp directory.
/// - `config_json`: optional `QuizConfig` JSON document.
///
/// # FFI contract
/// - Sync call; opens the score database.
/// - An unopenable database is not an error: progress is then kept for the
///   running process only and `storage_notice` is set.
/// - Booting again saves and replaces the previous service.
#[flutter_rust_bridge::frb(sync)]
pub fn quiz_boot(db_path: Option<String>, config_json: Option<String>) -> BootResponse {
    let config = match config_json.as_deref().map(QuizConfig::from_json_str) {
        None => QuizConfig::default(),
        Some(Ok(config)) => config,
        Some(Err(err)) => {
            return BootResponse {
                ok: false,
                persistence: String::new(),
                storage_notice: None,
                progress: None,
                message: format!("quiz_boot failed: {err}"),
            };
        }
    };

    let path = resolve_db_path(db_path);
    let primary: Box<dyn ScoreStore + Send> =
        match SqliteScoreStore::open(&path, config.storage_key.as_str()) {
            Ok(store) => Box::new(store),
            Err(err) => {
                warn!("event=quiz_boot module=ffi status=degraded error={err}");
                Box::new(DisabledScoreStore::new(err.to_string()))
            }
        };
    let service = QuizService::start(
        FallbackScoreStore::new(primary, MemoryScoreStore::new()),
        config,
    );

    let response = BootResponse {
        ok: true,
        persistence: persistence_label(service.persistence_status()).to_string(),
        storage_notice: service.storage_notice().map(str::to_string),
        progress: Some(to_progress_summary(service.progress())),
        message: "Quiz ready.".to_string(),
    };

    let mut guard = match lock_quiz() {
        Ok(guard) => guard,
        Err(message) => {
            return BootResponse {
                ok: false,
                message,
                ..response
            }
        }
    };
    if let Some(mut previous) = guard.replace(service) {
        previous.shutdown();
    }
    info!(
        "event=quiz_boot module=ffi status=ok persistence={}",
        response.persistence
    );
    response
}

/// Opens a quiz screen and poses its first round.
///
/// # FFI contract
/// - `mode`: `pitch|notation`.
/// - Re-entering a screen discards the previous session's pending round.
#[flutter_rust_bridge::frb(sync)]
pub fn quiz_enter(mode: String) -> RoundResponse {
    let mode = match parse_mode(&mode) {
        Ok(mode) => mode,
        Err(message) => return RoundResponse::failure(message),
    };
    match with_quiz(|quiz| quiz.open_session(mode).map_err(|err| err.to_string())) {
        Ok(posed) => RoundResponse {
            ok: true,
            round: Some(to_round_view(&posed)),
            message: "Round started.".to_string(),
        },
        Err(err) => RoundResponse::failure(format!("quiz_enter failed: {err}")),
    }
}

/// Leaves a quiz screen; cancels its pending round and saves progress.
#[flutter_rust_bridge::frb(sync)]
pub fn quiz_leave(mode: String) -> ActionResponse {
    let mode = match parse_mode(&mode) {
        Ok(mode) => mode,
        Err(message) => return ActionResponse::failure(message),
    };
    match with_quiz(|quiz| {
        quiz.close_session(mode);
        Ok(())
    }) {
        Ok(()) => ActionResponse::success("Session closed."),
        Err(err) => ActionResponse::failure(format!("quiz_leave failed: {err}")),
    }
}

/// Acknowledges that the host started playing the posed pitch note.
///
/// Returns `true` only when this call opened the answer gate.
#[flutter_rust_bridge::frb(sync)]
pub fn quiz_sound_played(mode: String) -> bool {
    let Ok(mode) = parse_mode(&mode) else {
        return false;
    };
    with_quiz(|quiz| Ok(quiz.mark_sound_played(mode))).unwrap_or(false)
}

/// Submits the tapped answer for the current round.
///
/// # FFI contract
/// - Ignored taps return `accepted == false` with a diagnostic message.
/// - Accepted answers are saved before this call returns.
#[flutter_rust_bridge::frb(sync)]
pub fn quiz_submit_answer(mode: String, note_id: String) -> AnswerResponse {
    let ignored = |message: String| AnswerResponse {
        accepted: false,
        outcome: None,
        message,
    };
    let mode = match parse_mode(&mode) {
        Ok(mode) => mode,
        Err(message) => return ignored(message),
    };
    match with_quiz(|quiz| Ok(quiz.try_submit_answer(mode, note_id.trim()))) {
        Ok(Ok(outcome)) => AnswerResponse {
            accepted: true,
            outcome: Some(to_outcome_view(&outcome)),
            message: if outcome.is_correct {
                "Correct.".to_string()
            } else {
                "Incorrect.".to_string()
            },
        },
        Ok(Err(rejection)) => ignored(rejection.to_string()),
        Err(err) => ignored(format!("quiz_submit_answer failed: {err}")),
    }
}

/// Starts the round scheduled by an earlier answer.
///
/// # FFI contract
/// - Returns `ok == false` when the timer is stale (screen left, re-entered
///   or another round already started); the UI simply drops it.
#[flutter_rust_bridge::frb(sync)]
pub fn quiz_resume_round(mode: String, session_id: String, round: u64) -> RoundResponse {
    let mode = match parse_mode(&mode) {
        Ok(mode) => mode,
        Err(message) => return RoundResponse::failure(message),
    };
    let session_id = match Uuid::parse_str(session_id.trim()) {
        Ok(id) => id,
        Err(err) => return RoundResponse::failure(format!("invalid session_id: {err}")),
    };
    let pending = PendingRound {
        mode,
        delay: Duration::ZERO,
        ticket: RoundTicket { session_id, round },
    };
    match with_quiz(|quiz| Ok(quiz.resume_round(&pending))) {
        Ok(Some(posed)) => RoundResponse {
            ok: true,
            round: Some(to_round_view(&posed)),
            message: "Round started.".to_string(),
        },
        Ok(None) => RoundResponse::failure("stale round timer ignored"),
        Err(err) => RoundResponse::failure(format!("quiz_resume_round failed: {err}")),
    }
}

/// Reads progress for the progress screen.
#[flutter_rust_bridge::frb(sync)]
pub fn quiz_progress() -> ProgressResponse {
    match with_quiz(|quiz| Ok(quiz.progress())) {
        Ok(progress) => ProgressResponse {
            ok: true,
            progress: Some(to_progress_summary(progress)),
            message: String::new(),
        },
        Err(err) => ProgressResponse::failure(format!("quiz_progress failed: {err}")),
    }
}

/// Zeroes all scores and clears saved progress.
#[flutter_rust_bridge::frb(sync)]
pub fn quiz_reset_scores() -> ProgressResponse {
    match with_quiz(|quiz| Ok(quiz.reset_scores())) {
        Ok(progress) => ProgressResponse {
            ok: true,
            progress: Some(to_progress_summary(progress)),
            message: "Scores reset.".to_string(),
        },
        Err(err) => ProgressResponse::failure(format!("quiz_reset_scores failed: {err}")),
    }
}

/// Notice to show when progress will not be kept across launches.
#[flutter_rust_bridge::frb(sync)]
pub fn quiz_storage_notice() -> Option<String> {
    with_quiz(|quiz| Ok(quiz.storage_notice().map(str::to_string)))
        .ok()
        .flatten()
}

/// Saves progress and drops the service. Safe to call when not booted.
#[flutter_rust_bridge::frb(sync)]
pub fn quiz_shutdown() -> ActionResponse {
    match lock_quiz() {
        Ok(mut guard) => {
            if let Some(mut quiz) = guard.take() {
                quiz.shutdown();
            }
            ActionResponse::success("Quiz shut down.")
        }
        Err(err) => ActionResponse::failure(format!("quiz_shutdown failed: {err}")),
    }
}

fn lock_quiz() -> Result<MutexGuard<'static, Option<QuizService<FfiScoreStore>>>, String> {
    QUIZ.lock()
        .map_err(|_| "quiz state lock poisoned".to_string())
}

fn with_quiz<T>(
    f: impl FnOnce(&mut QuizService<FfiScoreStore>) -> Result<T, String>,
) -> Result<T, String> {
    let mut guard = lock_quiz()?;
    let quiz = guard.as_mut().ok_or_else(|| NOT_BOOTED.to_string())?;
    f(quiz)
}

fn resolve_db_path(explicit: Option<String>) -> PathBuf {
    let from_env = std::env::var("NOTEQUIZ_DB_PATH").ok();
    explicit
        .into_iter()
        .chain(from_env)
        .map(|raw| raw.trim().to_string())
        .find(|raw| !raw.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join(QUIZ_DB_FILE_NAME))
}

fn parse_mode(raw: &str) -> Result<QuizMode, String> {
    QuizMode::parse(raw).ok_or_else(|| format!("unsupported quiz mode `{}`", raw.trim()))
}

fn persistence_label(status: &PersistenceStatus) -> &'static str {
    match status {
        PersistenceStatus::Durable => "durable",
        PersistenceStatus::SessionOnly => "session_only",
        PersistenceStatus::Degraded(_) => "degraded",
    }
}

fn to_note_view(note: &Note) -> NoteView {
    NoteView {
        note_id: note.id.to_string(),
        display_name: note.display_name.clone(),
        choice_label: note.choice_label(),
        frequency_hz: note.frequency_hz(),
    }
}

fn to_round_view(posed: &PosedRound) -> RoundView {
    RoundView {
        mode: posed.mode.as_str().to_string(),
        session_id: posed.ticket.session_id.to_string(),
        round: posed.ticket.round,
        level: posed.level,
        note: to_note_view(&posed.note),
        choices: posed.choices.iter().map(to_note_view).collect(),
        awaiting_sound: posed.awaiting_sound,
    }
}

fn to_outcome_view(outcome: &RoundOutcome) -> OutcomeView {
    OutcomeView {
        is_correct: outcome.is_correct,
        submitted_note_id: outcome.submitted_note_id.to_string(),
        correct_note: to_note_view(&outcome.correct_note),
        points_awarded: outcome.points_awarded,
        mode_score: outcome.mode_score,
        total_score: outcome.total_score,
        new_level: outcome.level_up.map(|event| event.new_level),
        unlocked_notes: outcome.unlocked_notes.iter().map(to_note_view).collect(),
        next_round_delay_ms: u64::try_from(outcome.next_round.delay.as_millis())
            .unwrap_or(u64::MAX),
        next_session_id: outcome.next_round.ticket.session_id.to_string(),
        next_round: outcome.next_round.ticket.round,
    }
}

fn to_progress_summary(progress: ProgressView) -> ProgressSummary {
    ProgressSummary {
        level: progress.level,
        pitch_score: progress.pitch_score,
        note_score: progress.note_score,
        total_score: progress.total_score,
        percent_to_next_level: progress.percent_to_next_level,
        badges_earned: progress.badges_earned,
    }
}
