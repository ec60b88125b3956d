//! Record store capability contract.
//!
//! # Responsibility
//! - Describe the create/fetch/save/delete surface of a persistent object
//!   store, plus its out-of-band change signal.
//! - Define the repository error type shared by all implementations.
//!
//! # Invariants
//! - `fetch_all` returns models in presentation order.
//! - `save` is a whole-record replace keyed by `record_id()`.
//! - `delete` of an absent record is not an error.

use crate::db::DbError;
use crate::model::habit::HabitValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identity of any stored record.
pub type RecordId = Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for record persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(HabitValidationError),
    Db(DbError),
    NotFound(RecordId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "record not found: {id}"),
            Self::InvalidData(details) => write!(f, "invalid persisted data: {details}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<HabitValidationError> for RepoError {
    fn from(value: HabitValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// A model that can be materialized from, and written back to, a stored
/// record.
pub trait StoredModel: Clone + PartialEq {
    fn record_id(&self) -> RecordId;
}

/// Persistent object store consumed by `HabitStore`.
pub trait RecordStore {
    type Model: StoredModel;
    /// Construction input; the store assigns identity and creation time.
    type Draft;

    fn fetch_all(&self) -> RepoResult<Vec<Self::Model>>;
    fn create(&self, draft: &Self::Draft) -> RepoResult<Self::Model>;
    /// Returns `RepoError::NotFound` when no record matches.
    fn save(&self, model: &Self::Model) -> RepoResult<()>;
    /// Returns whether a record was removed.
    fn delete(&self, id: RecordId) -> RepoResult<bool>;
    /// Returns whether the backing contents changed out of band since the
    /// previous poll.
    fn poll_changes(&self) -> RepoResult<bool>;
}
