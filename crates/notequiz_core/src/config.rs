//! Quiz configuration.
//!
//! # Responsibility
//! - Declare presentation timing and storage settings with defaults.
//! - Parse and validate JSON configuration files.
//!
//! # Invariants
//! - A `QuizConfig` returned by `from_json_str`/`load` has passed `validate()`.
//! - Scoring constants are not configurable.

use crate::model::progress::QuizMode;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::time::Duration;

/// Storage key used when none is configured.
pub const DEFAULT_STORAGE_KEY: &str = "music_quiz_scores";
/// Upper bound for any next-round delay.
pub const MAX_ROUND_DELAY_MS: u64 = 60_000;

static STORAGE_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.\-]{1,64}$").expect("valid storage key regex"));

/// Delay before the next round starts, by answer correctness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundTiming {
    pub correct_delay_ms: u64,
    pub incorrect_delay_ms: u64,
}

impl RoundTiming {
    pub fn for_mode(mode: QuizMode) -> Self {
        match mode {
            QuizMode::Pitch => Self {
                correct_delay_ms: 1_000,
                incorrect_delay_ms: 2_000,
            },
            QuizMode::Notation => Self {
                correct_delay_ms: 1_500,
                incorrect_delay_ms: 2_000,
            },
        }
    }

    pub fn delay_for(&self, is_correct: bool) -> Duration {
        Duration::from_millis(if is_correct {
            self.correct_delay_ms
        } else {
            self.incorrect_delay_ms
        })
    }
}

/// Top-level quiz settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizConfig {
    pub pitch_timing: RoundTiming,
    pub notation_timing: RoundTiming,
    /// Key the progress snapshot is stored under.
    pub storage_key: String,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            pitch_timing: RoundTiming::for_mode(QuizMode::Pitch),
            notation_timing: RoundTiming::for_mode(QuizMode::Notation),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

impl QuizConfig {
    /// Parses and validates a JSON document. Missing fields take defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn timing(&self, mode: QuizMode) -> RoundTiming {
        match mode {
            QuizMode::Pitch => self.pitch_timing,
            QuizMode::Notation => self.notation_timing,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !STORAGE_KEY_RE.is_match(&self.storage_key) {
            return Err(ConfigError::InvalidStorageKey(self.storage_key.clone()));
        }
        for mode in QuizMode::ALL {
            let timing = self.timing(mode);
            for delay_ms in [timing.correct_delay_ms, timing.incorrect_delay_ms] {
                if delay_ms > MAX_ROUND_DELAY_MS {
                    return Err(ConfigError::DelayOutOfRange { mode, delay_ms });
                }
            }
        }
        Ok(())
    }
}

/// Configuration load/validation error.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    InvalidStorageKey(String),
    DelayOutOfRange { mode: QuizMode, delay_ms: u64 },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read config: {err}"),
            Self::Parse(err) => write!(f, "invalid config json: {err}"),
            Self::InvalidStorageKey(key) => write!(
                f,
                "invalid storage key `{key}`; expected 1-64 chars of [A-Za-z0-9_.-]"
            ),
            Self::DelayOutOfRange { mode, delay_ms } => write!(
                f,
                "{mode} round delay {delay_ms}ms exceeds {MAX_ROUND_DELAY_MS}ms"
            ),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, QuizConfig, DEFAULT_STORAGE_KEY};
    use crate::model::progress::QuizMode;
    use std::time::Duration;

    #[test]
    fn defaults_match_presentation_delays() {
        let config = QuizConfig::default();
        assert_eq!(
            config.timing(QuizMode::Pitch).delay_for(true),
            Duration::from_millis(1_000)
        );
        assert_eq!(
            config.timing(QuizMode::Notation).delay_for(true),
            Duration::from_millis(1_500)
        );
        assert_eq!(
            config.timing(QuizMode::Notation).delay_for(false),
            Duration::from_millis(2_000)
        );
        assert_eq!(config.storage_key, DEFAULT_STORAGE_KEY);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = QuizConfig::from_json_str(r#"{"storage_key":"kids.scores"}"#)
            .expect("partial config should parse");
        assert_eq!(config.storage_key, "kids.scores");
        assert_eq!(config.pitch_timing, QuizConfig::default().pitch_timing);
    }

    #[test]
    fn rejects_bad_key_and_long_delay() {
        let err = QuizConfig::from_json_str(r#"{"storage_key":"has space"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidStorageKey(_)));

        let err = QuizConfig::from_json_str(
            r#"{"pitch_timing":{"correct_delay_ms":90000,"incorrect_delay_ms":10}}"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::DelayOutOfRange {
                mode: QuizMode::Pitch,
                delay_ms: 90_000
            }
        ));
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let err = QuizConfig::from_json_str("{").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
