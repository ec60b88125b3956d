//! Core domain logic for the habit tracker.
//! This crate is the single source of truth for habit invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;

pub use config::StoreConfig;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::completion::{DayState, DayTrack, HabitCompletion, HabitProgress};
pub use model::habit::{
    Frequency, Habit, HabitDraft, HabitId, HabitValidationError, TimeOfDay, DEFAULT_HABIT_NAME,
};
pub use repo::completion_repo::{CompletionRepository, SqliteCompletionRepository};
pub use repo::habit_repo::SqliteHabitRepository;
pub use repo::record_store::{RecordId, RecordStore, RepoError, RepoResult, StoredModel};
pub use service::tracking_service::{TrackingError, TrackingService};
pub use store::diff::diff_rows;
pub use store::dispatch::EventPump;
pub use store::event::{apply_all, ChangeEvent, StoreNotification, WriteOperation};
pub use store::habit_store::{HabitStore, HabitStoreError, HabitStoreResult};
pub use store::subscribers::{Handler, Subscriptions};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
