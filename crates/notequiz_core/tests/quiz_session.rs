use notequiz_core::{
    LevelUpEvent, NoteCatalog, NoteSelector, ProgressionTracker, QuizMode, QuizSession,
    RoundTiming, SessionError, SessionState, SubmitRejection,
};
use std::sync::Arc;
use std::time::Duration;

fn session(mode: QuizMode, seed: u64) -> QuizSession {
    QuizSession::new(
        mode,
        Arc::new(NoteCatalog::standard()),
        NoteSelector::seeded(seed),
        RoundTiming::for_mode(mode),
    )
}

fn wrong_answer_for(posed: &str) -> &'static str {
    if posed == "C4" {
        "D4"
    } else {
        "C4"
    }
}

#[test]
fn new_session_is_idle_and_rejects_answers() {
    let mut tracker = ProgressionTracker::new();
    let mut quiz = session(QuizMode::Notation, 1);

    assert_eq!(quiz.state(), SessionState::Idle);
    assert_eq!(
        quiz.try_submit_answer("C4", &mut tracker).unwrap_err(),
        SubmitRejection::NoActiveRound
    );
    assert_eq!(tracker.total_score(), 0);
}

#[test]
fn only_the_first_of_two_submissions_is_processed() {
    let mut tracker = ProgressionTracker::new();
    let mut quiz = session(QuizMode::Notation, 2);
    let posed = quiz.start_round(&tracker).unwrap();
    let answer = posed.note.id.as_str();

    let first = quiz.submit_answer(answer, &mut tracker);
    let second = quiz.submit_answer(answer, &mut tracker);

    assert!(first.is_some());
    assert!(second.is_none());
    assert_eq!(
        quiz.try_submit_answer(answer, &mut tracker).unwrap_err(),
        SubmitRejection::AnswerLocked
    );
    assert_eq!(tracker.note_score(), 10);
    assert_eq!(quiz.state(), SessionState::AnswerLocked);
}

#[test]
fn pitch_answer_before_sound_changes_nothing() {
    let mut tracker = ProgressionTracker::new();
    let mut quiz = session(QuizMode::Pitch, 3);
    let posed = quiz.start_round(&tracker).unwrap();
    assert!(posed.awaiting_sound);

    let rejected = quiz.try_submit_answer(posed.note.id.as_str(), &mut tracker);

    assert_eq!(rejected.unwrap_err(), SubmitRejection::SoundNotPlayed);
    assert_eq!(quiz.state(), SessionState::RoundActive);
    let round = quiz.round_state().unwrap();
    assert!(!round.has_played_sound);
    assert!(!round.answer_locked);
    assert_eq!(tracker.total_score(), 0);
}

#[test]
fn pitch_answer_after_sound_scores() {
    let mut tracker = ProgressionTracker::new();
    let mut quiz = session(QuizMode::Pitch, 4);
    let posed = quiz.start_round(&tracker).unwrap();

    assert!(quiz.on_sound_played());
    let outcome = quiz
        .submit_answer(posed.note.id.as_str(), &mut tracker)
        .expect("answer accepted after sound");

    assert!(outcome.is_correct);
    assert_eq!(outcome.points_awarded, 10);
    assert_eq!(outcome.mode_score, 10);
    assert_eq!(outcome.total_score, 10);
    assert_eq!(outcome.level_up, None);
    assert_eq!(outcome.correct_note_id(), &posed.note.id);
    assert_eq!(tracker.pitch_score(), 10);
    assert_eq!(tracker.current_level(), 1);
}

#[test]
fn replaying_sound_does_not_change_the_outcome() {
    let mut once_tracker = ProgressionTracker::new();
    let mut many_tracker = ProgressionTracker::new();
    let mut once = session(QuizMode::Pitch, 5);
    let mut many = session(QuizMode::Pitch, 5);
    let posed_once = once.start_round(&once_tracker).unwrap();
    let posed_many = many.start_round(&many_tracker).unwrap();
    assert_eq!(posed_once.note, posed_many.note);

    assert!(once.on_sound_played());
    assert!(many.on_sound_played());
    assert!(!many.on_sound_played());
    assert!(!many.on_sound_played());

    let answer = posed_once.note.id.as_str();
    let a = once.submit_answer(answer, &mut once_tracker).unwrap();
    let b = many.submit_answer(answer, &mut many_tracker).unwrap();
    assert_eq!(a.is_correct, b.is_correct);
    assert_eq!(a.points_awarded, b.points_awarded);
    assert_eq!(once_tracker, many_tracker);
}

#[test]
fn sound_after_answer_does_not_reopen_the_round() {
    let mut tracker = ProgressionTracker::new();
    let mut quiz = session(QuizMode::Pitch, 6);
    let posed = quiz.start_round(&tracker).unwrap();
    quiz.on_sound_played();
    quiz.submit_answer(posed.note.id.as_str(), &mut tracker)
        .unwrap();

    assert!(!quiz.on_sound_played());
    assert!(!quiz.can_submit());
}

#[test]
fn notation_rounds_need_no_sound() {
    let mut tracker = ProgressionTracker::new();
    let mut quiz = session(QuizMode::Notation, 7);
    let posed = quiz.start_round(&tracker).unwrap();

    assert!(!posed.awaiting_sound);
    assert!(!quiz.on_sound_played());
    assert!(quiz.can_submit());
    let wrong = wrong_answer_for(posed.note.id.as_str());
    let outcome = quiz.submit_answer(wrong, &mut tracker).unwrap();
    assert!(!outcome.is_correct);
    assert_eq!(outcome.points_awarded, 0);
    assert_eq!(outcome.submitted_note_id.as_str(), wrong);
}

#[test]
fn answer_outside_current_tier_is_judged_wrong() {
    let mut tracker = ProgressionTracker::new();
    let mut quiz = session(QuizMode::Notation, 8);
    quiz.start_round(&tracker).unwrap();

    let outcome = quiz.submit_answer("F5", &mut tracker).unwrap();

    assert!(!outcome.is_correct);
    assert_eq!(tracker.total_score(), 0);
    assert_eq!(quiz.state(), SessionState::AnswerLocked);
}

#[test]
fn start_round_clears_lock_and_sound_gate() {
    let mut tracker = ProgressionTracker::new();
    let mut quiz = session(QuizMode::Pitch, 9);
    let first = quiz.start_round(&tracker).unwrap();
    quiz.on_sound_played();
    quiz.submit_answer(first.note.id.as_str(), &mut tracker)
        .unwrap();

    let second = quiz.start_round(&tracker).unwrap();

    assert_eq!(quiz.state(), SessionState::RoundActive);
    assert_eq!(second.ticket.round, first.ticket.round + 1);
    let round = quiz.round_state().unwrap();
    assert!(!round.answer_locked);
    assert!(!round.has_played_sound);
}

#[test]
fn next_round_delay_depends_on_mode_and_correctness() {
    let mut tracker = ProgressionTracker::new();

    let mut pitch = session(QuizMode::Pitch, 10);
    let posed = pitch.start_round(&tracker).unwrap();
    pitch.on_sound_played();
    let correct = pitch
        .submit_answer(posed.note.id.as_str(), &mut tracker)
        .unwrap();
    assert_eq!(correct.next_round.delay, Duration::from_millis(1_000));
    let posed = pitch.start_round(&tracker).unwrap();
    pitch.on_sound_played();
    let wrong = pitch
        .submit_answer(wrong_answer_for(posed.note.id.as_str()), &mut tracker)
        .unwrap();
    assert_eq!(wrong.next_round.delay, Duration::from_millis(2_000));

    let mut notation = session(QuizMode::Notation, 11);
    let posed = notation.start_round(&tracker).unwrap();
    let correct = notation
        .submit_answer(posed.note.id.as_str(), &mut tracker)
        .unwrap();
    assert_eq!(correct.next_round.delay, Duration::from_millis(1_500));
    assert_eq!(correct.next_round.mode, QuizMode::Notation);
}

#[test]
fn ninety_to_hundred_levels_up_once_and_unlocks_extended_tier() {
    let mut tracker = ProgressionTracker::new();
    tracker.award(QuizMode::Pitch, 90);
    assert_eq!(tracker.check_level_up(), None);

    let mut quiz = session(QuizMode::Notation, 12);
    let posed = quiz.start_round(&tracker).unwrap();
    assert_eq!(posed.choices.len(), 7);

    let outcome = quiz
        .submit_answer(posed.note.id.as_str(), &mut tracker)
        .unwrap();
    assert_eq!(outcome.total_score, 100);
    assert_eq!(
        outcome.level_up,
        Some(LevelUpEvent {
            old_level: 1,
            new_level: 2
        })
    );
    assert_eq!(outcome.unlocked_notes.len(), 6);
    assert_eq!(tracker.check_level_up(), None);

    let next = quiz.start_round(&tracker).unwrap();
    assert_eq!(next.level, 2);
    assert_eq!(next.choices.len(), 13);
    let again = quiz
        .submit_answer(next.note.id.as_str(), &mut tracker)
        .unwrap();
    assert_eq!(again.level_up, None);
}

#[test]
fn tickets_go_stale_after_next_round_or_dispose() {
    let mut tracker = ProgressionTracker::new();
    let mut quiz = session(QuizMode::Notation, 13);
    let posed = quiz.start_round(&tracker).unwrap();
    let outcome = quiz
        .submit_answer(posed.note.id.as_str(), &mut tracker)
        .unwrap();

    assert!(quiz.accepts(&outcome.next_round.ticket));
    quiz.start_round(&tracker).unwrap();
    assert!(!quiz.accepts(&outcome.next_round.ticket));

    let current = quiz.current_ticket().unwrap();
    quiz.dispose();
    assert!(!quiz.accepts(&current));
    assert_eq!(quiz.state(), SessionState::Disposed);
    assert_eq!(
        quiz.start_round(&tracker).unwrap_err(),
        SessionError::Disposed
    );
    assert_eq!(
        quiz.try_submit_answer("C4", &mut tracker).unwrap_err(),
        SubmitRejection::Disposed
    );
}

#[test]
fn tickets_from_other_sessions_are_rejected() {
    let tracker = ProgressionTracker::new();
    let mut first = session(QuizMode::Notation, 14);
    let mut second = session(QuizMode::Notation, 14);
    let ticket = first.start_round(&tracker).unwrap().ticket;
    second.start_round(&tracker).unwrap();

    assert!(first.accepts(&ticket));
    assert!(!second.accepts(&ticket));
}

#[test]
fn empty_catalog_tier_cannot_be_built() {
    assert!(NoteCatalog::from_tiers(vec![Vec::new()]).is_err());
}
