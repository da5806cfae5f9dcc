//! Score persistence contract and SQLite implementation.
//!
//! # Responsibility
//! - Define the best-effort save/load contract the quiz service relies on.
//! - Persist the progress snapshot as one JSON value under a fixed key.
//!
//! # Invariants
//! - `load()` right after a successful `save(s)` returns `s`.
//! - Storage that cannot be written at all reports `StoreError::Unavailable`.
//! - Only `PersistedSnapshot` is stored; round state is never written.

use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::snapshot::PersistedSnapshot;
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Key written and removed by availability probes.
const PROBE_KEY: &str = "__storage_test__";

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence failure. Never fatal to gameplay.
#[derive(Debug)]
pub enum StoreError {
    /// Storage cannot be used this session (read-only, full, locked, absent).
    Unavailable(String),
    Db(DbError),
    Serialization(serde_json::Error),
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(reason) => write!(f, "score storage unavailable: {reason}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Serialization(err) => write!(f, "score snapshot serialization failed: {err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted scores: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::Unavailable(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Unavailable(err) => Self::Unavailable(err.to_string()),
            other => Self::Db(other),
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        DbError::from(value).into()
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Persistence boundary consumed by the quiz service.
pub trait ScoreStore {
    /// Probes whether writes currently succeed.
    fn is_available(&self) -> bool;

    /// Whether saved data survives beyond the current session.
    fn is_durable(&self) -> bool {
        self.is_available()
    }

    fn save(&self, snapshot: &PersistedSnapshot) -> StoreResult<()>;

    /// Whether the most recent successful `save` reached storage that
    /// survives the session. Stores that are durable by construction keep
    /// the default.
    fn last_save_durable(&self) -> bool {
        true
    }

    /// Returns `None` when nothing has been saved under the key.
    fn load(&self) -> StoreResult<Option<PersistedSnapshot>>;

    /// Removes the saved snapshot. Clearing an empty store succeeds.
    fn clear(&self) -> StoreResult<()>;
}

impl<T: ScoreStore + ?Sized> ScoreStore for Box<T> {
    fn is_available(&self) -> bool {
        (**self).is_available()
    }

    fn is_durable(&self) -> bool {
        (**self).is_durable()
    }

    fn save(&self, snapshot: &PersistedSnapshot) -> StoreResult<()> {
        (**self).save(snapshot)
    }

    fn last_save_durable(&self) -> bool {
        (**self).last_save_durable()
    }

    fn load(&self) -> StoreResult<Option<PersistedSnapshot>> {
        (**self).load()
    }

    fn clear(&self) -> StoreResult<()> {
        (**self).clear()
    }
}

/// Durable store backed by the `kv_store` table.
#[derive(Debug)]
pub struct SqliteScoreStore {
    conn: Connection,
    key: String,
}

impl SqliteScoreStore {
    /// Wraps an already migrated connection.
    pub fn new(conn: Connection, key: impl Into<String>) -> Self {
        Self {
            conn,
            key: key.into(),
        }
    }

    /// Opens (and migrates) the database file at `path`.
    pub fn open(path: impl AsRef<Path>, key: impl Into<String>) -> StoreResult<Self> {
        Ok(Self::new(open_db(path)?, key))
    }

    pub fn in_memory(key: impl Into<String>) -> StoreResult<Self> {
        Ok(Self::new(open_db_in_memory()?, key))
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl ScoreStore for SqliteScoreStore {
    fn is_available(&self) -> bool {
        let probe = self
            .conn
            .execute(
                "INSERT OR REPLACE INTO kv_store (key, value) VALUES (?1, ?1);",
                [PROBE_KEY],
            )
            .and_then(|_| {
                self.conn
                    .execute("DELETE FROM kv_store WHERE key = ?1;", [PROBE_KEY])
            });
        if let Err(err) = &probe {
            debug!("event=store_probe module=repo status=error store=sqlite error={err}");
        }
        probe.is_ok()
    }

    fn save(&self, snapshot: &PersistedSnapshot) -> StoreResult<()> {
        let value = serde_json::to_string(snapshot)?;
        self.conn
            .execute(
                "INSERT INTO kv_store (key, value, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at;",
                params![
                    self.key.as_str(),
                    value,
                    snapshot.last_updated.timestamp_millis()
                ],
            )?;
        Ok(())
    }

    fn load(&self) -> StoreResult<Option<PersistedSnapshot>> {
        let raw = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1;",
                [self.key.as_str()],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        match raw {
            Some(value) => parse_snapshot(&value).map(Some),
            None => Ok(None),
        }
    }

    fn clear(&self) -> StoreResult<()> {
        self.conn
            .execute("DELETE FROM kv_store WHERE key = ?1;", [self.key.as_str()])?;
        Ok(())
    }
}

/// Parses a stored JSON value, rejecting anything but an object.
pub(crate) fn parse_snapshot(value: &str) -> StoreResult<PersistedSnapshot> {
    let json: serde_json::Value = serde_json::from_str(value)?;
    if !json.is_object() {
        return Err(StoreError::InvalidData(format!(
            "expected a JSON object, found `{}`",
            json_kind(&json)
        )));
    }
    Ok(serde_json::from_value(json)?)
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
