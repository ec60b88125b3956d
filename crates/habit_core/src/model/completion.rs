//! Per-day completion state for habits.
//!
//! # Responsibility
//! - Model persisted check-in counts per habit and calendar day.
//! - Model derived progress and day-tracking header projections.
//!
//! # Invariants
//! - One `HabitCompletion` exists per `(habit_id, day)` pair at most.
//! - `passed_count` never exceeds the habit's per-period total when written
//!   through the tracking service.

use crate::model::habit::HabitId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Persisted check-in count for one habit on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitCompletion {
    pub habit_id: HabitId,
    pub day: NaiveDate,
    pub passed_count: u32,
}

/// Derived progress of one habit within one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitProgress {
    pub passed: u32,
    pub total: u32,
}

impl HabitProgress {
    pub fn is_done(&self) -> bool {
        self.passed >= self.total
    }

    pub fn is_started(&self) -> bool {
        self.passed > 0
    }
}

/// Aggregate state of one day in the tracking header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayState {
    /// No check-ins recorded.
    Normal,
    /// At least one check-in, but not every habit is done.
    Started,
    /// Every habit is done (requires at least one habit).
    Finished,
}

/// One entry of the day-tracking header strip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayTrack {
    pub date: NaiveDate,
    pub is_today: bool,
    pub state: DayState,
    /// `None` for the first entry of the strip.
    pub previous_day_state: Option<DayState>,
    /// `None` for the last entry of the strip.
    pub next_day_state: Option<DayState>,
}
