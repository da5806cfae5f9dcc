//! SQLite bootstrap for durable score storage.
//!
//! # Responsibility
//! - Open file or in-memory connections configured for the quiz store.
//! - Bring the schema up to date before any store touches it.
//!
//! # Invariants
//! - Schema version lives in `PRAGMA user_version`.
//! - A database written by a newer binary is refused, never downgraded.
//! - Failures that mean "cannot write here this session" surface as
//!   `DbError::Unavailable`; everything else stays `DbError::Sqlite`.

use rusqlite::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Connection or schema failure.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// Read-only, full, locked or unopenable score database.
    Unavailable(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite error: {err}"),
            Self::Unavailable(err) => write!(f, "score database unavailable: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "score database schema v{db_version} is newer than supported v{latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) | Self::Unavailable(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl DbError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        let unavailable = matches!(
            &value,
            rusqlite::Error::SqliteFailure(failure, _) if matches!(
                failure.code,
                ErrorCode::ReadOnly
                    | ErrorCode::DiskFull
                    | ErrorCode::CannotOpen
                    | ErrorCode::PermissionDenied
                    | ErrorCode::DatabaseBusy
                    | ErrorCode::DatabaseLocked
            )
        );
        if unavailable {
            Self::Unavailable(value)
        } else {
            Self::Sqlite(value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DbError;
    use rusqlite::ffi;

    fn failure(code: std::os::raw::c_int) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(ffi::Error::new(code), None)
    }

    #[test]
    fn storage_level_failures_are_unavailable() {
        for code in [
            ffi::SQLITE_READONLY,
            ffi::SQLITE_FULL,
            ffi::SQLITE_CANTOPEN,
            ffi::SQLITE_PERM,
            ffi::SQLITE_BUSY,
            ffi::SQLITE_LOCKED,
        ] {
            let err = DbError::from(failure(code));
            assert!(err.is_unavailable(), "code {code} should be unavailable");
            assert!(err.to_string().starts_with("score database unavailable"));
        }
    }

    #[test]
    fn statement_failures_stay_sqlite_errors() {
        assert!(matches!(
            DbError::from(failure(ffi::SQLITE_CONSTRAINT)),
            DbError::Sqlite(_)
        ));
        assert!(matches!(
            DbError::from(rusqlite::Error::QueryReturnedNoRows),
            DbError::Sqlite(_)
        ));
    }
}
