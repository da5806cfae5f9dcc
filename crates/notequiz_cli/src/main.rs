//! Terminal front end for the note quiz.
//!
//! # Responsibility
//! - Drive the core quiz service from stdin/stdout for local play and
//!   sanity checks.
//! - Share the score database layout with the app so progress can be
//!   inspected or reset from a shell.

use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use notequiz_core::{
    default_log_level, init_logging, DisabledScoreStore, FallbackScoreStore, MemoryScoreStore,
    Note, NoteCatalog, QuizConfig, QuizMode, QuizService, ScoreStore, SilentAudio, SqliteScoreStore,
};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

const DEFAULT_DB_FILE_NAME: &str = "notequiz.sqlite3";
/// Letters in staff order, starting from C.
const STAFF_LETTERS: &str = "CDEFGAB";
/// Diatonic index of E4, the bottom line of the treble staff.
const TREBLE_BOTTOM_LINE: i32 = 4 * 7 + 2;

type CliScoreStore = FallbackScoreStore<Box<dyn ScoreStore>, MemoryScoreStore>;

/// Note quiz: name notes by ear or by sight
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Score database file (defaults to NOTEQUIZ_DB_PATH, then the temp dir)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// JSON quiz configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Absolute directory for rolling log files; logging is off without it
    #[arg(long, global = true)]
    log_dir: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show level, scores and badges
    Status,

    /// List the notes quizzed at a level
    Catalog {
        /// Level to list; all notes when omitted
        #[arg(short, long)]
        level: Option<u32>,
    },

    /// Zero all scores and clear saved progress
    Reset,

    /// Play quiz rounds on the terminal
    ///
    /// Notation rounds show where the note sits on the treble staff. The
    /// terminal has no audio, so pitch rounds only smoke-test the flow.
    Drill(DrillCommand),
}

#[derive(Parser, Debug)]
struct DrillCommand {
    /// Quiz mode
    #[arg(short, long, value_enum, default_value = "notation")]
    mode: ModeArg,

    /// Number of rounds to play
    #[arg(short, long, default_value_t = 10)]
    rounds: u32,

    /// Seed for repeatable note selection
    #[arg(long)]
    seed: Option<u64>,

    /// Skip the pause between rounds
    #[arg(long)]
    no_wait: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Pitch,
    Notation,
}

impl From<ModeArg> for QuizMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Pitch => QuizMode::Pitch,
            ModeArg::Notation => QuizMode::Notation,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir)?;
    }

    let config = match cli.config.as_ref() {
        Some(path) => QuizConfig::load(path).map_err(|err| err.to_string())?,
        None => QuizConfig::default(),
    };

    if let Commands::Catalog { level } = cli.command {
        print_catalog(&NoteCatalog::standard(), level);
        return Ok(());
    }

    let mut service = QuizService::start(open_store(cli.db, &config), config);
    if let Some(notice) = service.storage_notice() {
        eprintln!("note: {notice}");
    }

    match cli.command {
        Commands::Status => print_status(&service),
        Commands::Reset => {
            let progress = service.reset_scores();
            println!("scores reset; level={}", progress.level);
        }
        Commands::Drill(drill) => {
            if let Some(seed) = drill.seed {
                service = service.with_seed(seed);
            }
            let result = run_drill(&mut service, &drill);
            service.shutdown();
            result?;
        }
        Commands::Catalog { .. } => {}
    }
    Ok(())
}

fn open_store(db: Option<PathBuf>, config: &QuizConfig) -> CliScoreStore {
    let path = db
        .or_else(|| {
            std::env::var("NOTEQUIZ_DB_PATH")
                .ok()
                .filter(|raw| !raw.trim().is_empty())
                .map(PathBuf::from)
        })
        .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME));

    let primary: Box<dyn ScoreStore> =
        match SqliteScoreStore::open(&path, config.storage_key.as_str()) {
            Ok(store) => Box::new(store),
            Err(err) => Box::new(DisabledScoreStore::new(format!(
                "cannot open `{}`: {err}",
                path.display()
            ))),
        };
    FallbackScoreStore::new(primary, MemoryScoreStore::new())
}

fn print_catalog(catalog: &NoteCatalog, level: Option<u32>) {
    let notes = match level {
        Some(level) => catalog.notes_for_level(level),
        None => catalog.all_notes(),
    };
    for note in notes {
        println!(
            "{:<4} {:<12} {:>8.2} Hz",
            note.id.as_str(),
            note.choice_label(),
            note.frequency_hz()
        );
    }
}

fn print_status(service: &QuizService<CliScoreStore>) {
    let progress = service.progress();
    println!("level:        {}", progress.level);
    println!("pitch score:  {}", progress.pitch_score);
    println!("note score:   {}", progress.note_score);
    println!("total score:  {}", progress.total_score);
    println!("next level:   {}%", progress.percent_to_next_level);
    println!("badges:       {}", progress.badges_earned);
}

fn run_drill(service: &mut QuizService<CliScoreStore>, drill: &DrillCommand) -> Result<(), String> {
    let mode = QuizMode::from(drill.mode);
    info!(
        "event=drill_start module=cli status=ok mode={mode} rounds={}",
        drill.rounds
    );
    let mut audio = SilentAudio;
    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    let mut posed = service.open_session(mode).map_err(|err| err.to_string())?;
    for _ in 0..drill.rounds {
        let choices = posed
            .choices
            .iter()
            .map(|note| note.id.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        match mode {
            QuizMode::Pitch => {
                service.play_current_note(mode, &mut audio);
                println!("[level {}] listen: (note played)", posed.level);
            }
            QuizMode::Notation => {
                let position = staff_position(&posed.note)
                    .unwrap_or_else(|| "off the treble staff".to_string());
                println!("[level {}] read: {position}", posed.level);
            }
        }
        print!("answer ({choices}): ");
        std::io::stdout().flush().map_err(|err| err.to_string())?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line.map_err(|err| err.to_string())?;
        let Some(outcome) = service.submit_answer(mode, line.trim()) else {
            continue;
        };

        if outcome.is_correct {
            println!("correct! +{} (total {})", outcome.points_awarded, outcome.total_score);
        } else {
            println!("wrong, it was {}", outcome.correct_note.choice_label());
        }
        if let Some(event) = outcome.level_up {
            println!("level up! {} -> {}", event.old_level, event.new_level);
            for note in &outcome.unlocked_notes {
                println!("  new note: {}", note.choice_label());
            }
        }

        if !drill.no_wait {
            std::thread::sleep(outcome.next_round.delay);
        }
        posed = match service.resume_round(&outcome.next_round) {
            Some(next) => next,
            None => break,
        };
    }

    print_status(service);
    Ok(())
}

/// Describes where `note` is drawn on the treble staff, without naming it.
///
/// Lines and spaces count upwards from the bottom (E4 sits on line 1).
/// Ledger lines count outwards from the staff.
fn staff_position(note: &Note) -> Option<String> {
    let id = note.id.as_str();
    let letter = STAFF_LETTERS.find(note.id.letter()?)?;
    let rest = &id[1..];
    let (accidental, octave) = match rest.chars().next() {
        Some('#') => (" with a sharp", &rest[1..]),
        Some('b') => (" with a flat", &rest[1..]),
        _ => ("", rest),
    };
    let octave: i32 = octave.parse().ok()?;
    let steps = octave * 7 + letter as i32 - TREBLE_BOTTOM_LINE;

    let place = if (0..=8).contains(&steps) {
        if steps % 2 == 0 {
            format!("line {}", steps / 2 + 1)
        } else {
            format!("space {}", (steps + 1) / 2)
        }
    } else {
        let (outward, side, edge) = if steps < 0 {
            (-steps, "below", "line 1")
        } else {
            (steps - 8, "above", "line 5")
        };
        if outward % 2 == 0 {
            format!("ledger line {} {side} the staff", outward / 2)
        } else if outward == 1 {
            format!("just {side} {edge}")
        } else {
            format!("just {side} ledger line {} {side} the staff", outward / 2)
        }
    };
    Some(format!("{place}{accidental}"))
}

#[cfg(test)]
mod tests {
    use super::staff_position;
    use notequiz_core::Note;

    fn place(id: &str) -> String {
        staff_position(&Note::new(id, "?", 0)).unwrap()
    }

    #[test]
    fn staff_lines_and_spaces_count_from_the_bottom() {
        assert_eq!(place("E4"), "line 1");
        assert_eq!(place("F4"), "space 1");
        assert_eq!(place("B4"), "line 3");
        assert_eq!(place("C5"), "space 3");
        assert_eq!(place("F5"), "line 5");
    }

    #[test]
    fn notes_outside_the_staff_use_ledger_lines() {
        assert_eq!(place("D4"), "just below line 1");
        assert_eq!(place("C4"), "ledger line 1 below the staff");
        assert_eq!(place("B3"), "just below ledger line 1 below the staff");
        assert_eq!(place("A3"), "ledger line 2 below the staff");
        assert_eq!(place("G5"), "just above line 5");
        assert_eq!(place("A5"), "ledger line 1 above the staff");
    }

    #[test]
    fn accidentals_keep_their_letter_position() {
        assert_eq!(place("F#4"), "space 1 with a sharp");
        assert_eq!(place("Bb4"), "line 3 with a flat");
    }

    #[test]
    fn prompt_never_names_the_note() {
        let note = Note::new("C4", "ド", 60);
        let prompt = staff_position(&note).unwrap();
        assert!(!prompt.contains('C'));
        assert!(!prompt.contains("ド"));
        assert!(!prompt.contains("Hz"));
    }

    #[test]
    fn unparseable_ids_have_no_position() {
        assert_eq!(staff_position(&Note::new("X4", "?", 0)), None);
        assert_eq!(staff_position(&Note::new("C", "?", 0)), None);
    }
}
