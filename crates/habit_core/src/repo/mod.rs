//! Record store contracts and SQLite implementations.
//!
//! # Responsibility
//! - Define the capability contract `HabitStore` consumes (`RecordStore`).
//! - Isolate SQLite query details from store/service orchestration.
//!
//! # Invariants
//! - Write paths validate models before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.

pub mod completion_repo;
pub mod habit_repo;
pub mod record_store;
