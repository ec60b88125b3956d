//! Habit completion tracking use-cases.
//!
//! # Responsibility
//! - Record and undo per-day check-ins.
//! - Derive per-habit progress and the day-tracking header strip from
//!   persisted completions.
//!
//! # Invariants
//! - `passed_count` stays within `0..=habit.total_per_period()`.
//! - Derived values are computed from persisted rows only.

use crate::config::StoreConfig;
use crate::db::DbError;
use crate::model::completion::{DayState, DayTrack, HabitCompletion, HabitProgress};
use crate::model::habit::{Habit, HabitId};
use crate::repo::completion_repo::CompletionRepository;
use crate::repo::record_store::RepoError;
use chrono::{Days, NaiveDate};
use log::info;
use rusqlite::ErrorCode;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for tracking use-cases.
#[derive(Debug)]
pub enum TrackingError {
    /// Check-in target no longer exists in the habit table.
    HabitNotFound(HabitId),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for TrackingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HabitNotFound(id) => write!(f, "habit not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TrackingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::HabitNotFound(_) => None,
        }
    }
}

impl From<RepoError> for TrackingError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Tracking service facade over completion repositories.
pub struct TrackingService<R: CompletionRepository> {
    repo: R,
    window_days: u32,
}

impl<R: CompletionRepository> TrackingService<R> {
    pub fn new(repo: R, config: &StoreConfig) -> Self {
        Self {
            repo,
            window_days: config.tracking_window_days,
        }
    }

    /// Returns progress of `habit` on `day`.
    pub fn progress(&self, habit: &Habit, day: NaiveDate) -> Result<HabitProgress, TrackingError> {
        let passed = self
            .repo
            .get_completion(habit.id, day)?
            .map_or(0, |completion| completion.passed_count);
        Ok(HabitProgress {
            passed: passed.min(habit.total_per_period()),
            total: habit.total_per_period(),
        })
    }

    /// Records one check-in; a finished day stays finished.
    pub fn check_in(&self, habit: &Habit, day: NaiveDate) -> Result<HabitProgress, TrackingError> {
        let current = self.progress(habit, day)?;
        if current.is_done() {
            info!(
                "event=check_in module=tracking status=skip reason=already_done habit_id={} day={}",
                habit.id, day
            );
            return Ok(current);
        }
        self.write(habit, day, current.passed + 1)
    }

    /// Removes one check-in; never goes below zero.
    pub fn undo_check_in(
        &self,
        habit: &Habit,
        day: NaiveDate,
    ) -> Result<HabitProgress, TrackingError> {
        let current = self.progress(habit, day)?;
        if !current.is_started() {
            return Ok(current);
        }
        self.write(habit, day, current.passed - 1)
    }

    /// Builds the header strip: one entry per day of the window ending on
    /// `today`, oldest first.
    pub fn day_strip(&self, habits: &[Habit], today: NaiveDate) -> Result<Vec<DayTrack>, TrackingError> {
        if self.window_days == 0 {
            return Ok(Vec::new());
        }
        let Some(first_day) =
            today.checked_sub_days(Days::new(u64::from(self.window_days - 1)))
        else {
            return Ok(Vec::new());
        };

        let mut passed_by_day: HashMap<(HabitId, NaiveDate), u32> = HashMap::new();
        for completion in self.repo.list_completions(first_day, today)? {
            passed_by_day.insert((completion.habit_id, completion.day), completion.passed_count);
        }

        let states: Vec<(NaiveDate, DayState)> = first_day
            .iter_days()
            .take(self.window_days as usize)
            .map(|day| (day, day_state(habits, day, &passed_by_day)))
            .collect();

        Ok(states
            .iter()
            .enumerate()
            .map(|(index, (date, state))| DayTrack {
                date: *date,
                is_today: *date == today,
                state: *state,
                previous_day_state: index
                    .checked_sub(1)
                    .and_then(|previous| states.get(previous))
                    .map(|(_, state)| *state),
                next_day_state: states.get(index + 1).map(|(_, state)| *state),
            })
            .collect())
    }

    fn write(
        &self,
        habit: &Habit,
        day: NaiveDate,
        passed: u32,
    ) -> Result<HabitProgress, TrackingError> {
        let completion = HabitCompletion {
            habit_id: habit.id,
            day,
            passed_count: passed,
        };
        self.repo
            .put_completion(&completion)
            .map_err(|err| map_write_error(habit.id, err))?;

        let progress = HabitProgress {
            passed,
            total: habit.total_per_period(),
        };
        info!(
            "event=check_in module=tracking status=ok habit_id={} day={} passed={} total={}",
            habit.id, day, progress.passed, progress.total
        );
        Ok(progress)
    }
}

fn day_state(
    habits: &[Habit],
    day: NaiveDate,
    passed_by_day: &HashMap<(HabitId, NaiveDate), u32>,
) -> DayState {
    let mut any_started = false;
    let mut all_done = !habits.is_empty();
    for habit in habits {
        let passed = passed_by_day.get(&(habit.id, day)).copied().unwrap_or(0);
        any_started |= passed > 0;
        all_done &= passed >= habit.total_per_period();
    }

    if all_done {
        DayState::Finished
    } else if any_started {
        DayState::Started
    } else {
        DayState::Normal
    }
}

fn map_write_error(habit_id: HabitId, err: RepoError) -> TrackingError {
    match &err {
        RepoError::Db(DbError::Sqlite(rusqlite::Error::SqliteFailure(failure, _)))
            if failure.code == ErrorCode::ConstraintViolation =>
        {
            TrackingError::HabitNotFound(habit_id)
        }
        _ => TrackingError::Repo(err),
    }
}
