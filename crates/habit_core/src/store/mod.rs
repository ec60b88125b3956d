//! Habit store: in-memory mirror, row diffing and change notification.
//!
//! # Responsibility
//! - Keep the presentation-facing habit list consistent with the record
//!   store.
//! - Translate record-store changes into ordered row-level events.
//! - Deliver events to subscribers outside of any store mutation.
//!
//! # Invariants
//! - Mirror is ordered by `created_at ASC`, ties in store order.
//! - One mutation produces at most one notification batch.

pub mod diff;
pub mod dispatch;
pub mod event;
pub mod habit_store;
pub mod subscribers;
