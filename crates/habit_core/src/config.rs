//! Store and tracking configuration.
//!
//! # Responsibility
//! - Carry construction-time defaults for new habits.
//! - Carry tuning knobs for change-event emission and the tracking header.
//!
//! # Invariants
//! - Config is plain data handed to constructors; no process-wide state.

use crate::model::habit::{TimeOfDay, DEFAULT_HABIT_NAME};
use serde::Deserialize;

const DEFAULT_FULL_RELOAD_THRESHOLD: usize = 64;
const DEFAULT_TRACKING_WINDOW_DAYS: u32 = 7;

/// Configuration for `HabitStore` and `TrackingService`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Name given to habits created without user input.
    pub default_habit_name: String,
    /// Schedule applied to newly created habits.
    pub default_scheduled_times: Vec<TimeOfDay>,
    /// Row-event count above which one `FullReload` replaces the diff.
    pub full_reload_threshold: usize,
    /// Number of days rendered by the day-tracking header.
    pub tracking_window_days: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            default_habit_name: DEFAULT_HABIT_NAME.to_string(),
            // 06:30 is always in range.
            default_scheduled_times: TimeOfDay::new(6, 30).into_iter().collect(),
            full_reload_threshold: DEFAULT_FULL_RELOAD_THRESHOLD,
            tracking_window_days: DEFAULT_TRACKING_WINDOW_DAYS,
        }
    }
}
