//! Habit database: connection setup and schema.
//!
//! Two tables live here. `habits` holds one row per habit keyed by its
//! UUID text, ordered for the store by `created_at`. `habit_completions`
//! holds at most one row per habit and day; a habit's completions go away
//! with it through `ON DELETE CASCADE`, which is why every connection is
//! opened with `foreign_keys=ON`.
//!
//! The applied schema version is kept in `PRAGMA user_version`. A file
//! written by a newer build is refused instead of being read with a schema
//! this build does not know.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "habit database is at schema v{db_version}, this build only knows up to v{latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
