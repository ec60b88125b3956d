//! Habit domain model.
//!
//! # Responsibility
//! - Define canonical data structures shared by persistence, store and
//!   tracking code.
//! - Apply construction defaults so a habit is never left without a name or
//!   frequency.
//!
//! # Invariants
//! - Every habit is identified by a stable `HabitId`.
//! - `created_at` is assigned once by the record store and never rewritten.

pub mod completion;
pub mod habit;
