//! Habit domain model.
//!
//! # Responsibility
//! - Define the canonical habit record rendered by list/editing screens.
//! - Provide schedule helpers (`TimeOfDay`, `next_due`) for daily habits.
//!
//! # Invariants
//! - `id` is stable and never reused for another habit.
//! - `name` is never blank after validation.
//! - `TimeOfDay` values are always within `00:00..=23:59`.
//! - `created_at` is the canonical presentation sort key.

use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Stable identifier for every habit.
pub type HabitId = Uuid;

/// Placeholder name applied when a habit is created without user input.
pub const DEFAULT_HABIT_NAME: &str = "New habit";

/// Recurrence kind of a habit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    /// Due every calendar day at each scheduled time.
    #[default]
    Daily,
}

/// Validation errors for habit and schedule values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HabitValidationError {
    EmptyName,
    InvalidTimeOfDay { hour: u32, minute: u32 },
    MalformedTimeOfDay(String),
    NegativeCreatedAt(i64),
}

impl Display for HabitValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "habit name cannot be blank"),
            Self::InvalidTimeOfDay { hour, minute } => {
                write!(f, "time of day {hour}:{minute} is out of range")
            }
            Self::MalformedTimeOfDay(value) => {
                write!(f, "time of day `{value}` is not in HH:MM form")
            }
            Self::NegativeCreatedAt(value) => {
                write!(f, "created_at must be non-negative, got {value}")
            }
        }
    }
}

impl Error for HabitValidationError {}

/// Time of day (hour, minute) at which a habit is due.
///
/// Serialized as `HH:MM` text so config files and persisted rows share one
/// representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    /// Creates a validated time of day.
    pub fn new(hour: u32, minute: u32) -> Result<Self, HabitValidationError> {
        if hour > 23 || minute > 59 {
            return Err(HabitValidationError::InvalidTimeOfDay { hour, minute });
        }
        Ok(Self {
            hour: hour as u8,
            minute: minute as u8,
        })
    }

    pub fn hour(&self) -> u32 {
        u32::from(self.hour)
    }

    pub fn minute(&self) -> u32 {
        u32::from(self.minute)
    }

    /// Seconds elapsed since midnight.
    pub fn seconds_from_midnight(&self) -> u32 {
        self.hour() * 60 * 60 + self.minute() * 60
    }

    pub fn to_naive_time(self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour(), self.minute(), 0).unwrap_or(NaiveTime::MIN)
    }
}

impl Display for TimeOfDay {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TimeOfDay {
    type Err = HabitValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let malformed = || HabitValidationError::MalformedTimeOfDay(value.to_string());
        let (hour, minute) = value.trim().split_once(':').ok_or_else(malformed)?;
        let digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
        if !digits(hour) || !digits(minute) || minute.len() != 2 {
            return Err(malformed());
        }
        let hour = hour.parse::<u32>().map_err(|_| malformed())?;
        let minute = minute.parse::<u32>().map_err(|_| malformed())?;
        Self::new(hour, minute)
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = HabitValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.to_string()
    }
}

/// Construction contract for new habits.
///
/// The record store assigns `id` and `created_at`; everything else comes
/// from the draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitDraft {
    pub name: String,
    pub frequency: Frequency,
    pub scheduled_times: Vec<TimeOfDay>,
}

impl HabitDraft {
    pub fn new(name: impl Into<String>, scheduled_times: Vec<TimeOfDay>) -> Self {
        let name = name_or_default(name.into());
        Self {
            name,
            frequency: Frequency::default(),
            scheduled_times,
        }
    }

    /// Materializes the draft with store-assigned identity.
    pub fn into_habit(self, id: HabitId, created_at: i64) -> Habit {
        Habit {
            id,
            name: self.name,
            frequency: self.frequency,
            scheduled_times: self.scheduled_times,
            created_at,
        }
    }
}

impl Default for HabitDraft {
    fn default() -> Self {
        Self::new(DEFAULT_HABIT_NAME, Vec::new())
    }
}

/// Canonical habit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Habit {
    /// Stable ID assigned at creation.
    pub id: HabitId,
    /// Free-text label shown in the list.
    pub name: String,
    pub frequency: Frequency,
    /// Due times within one recurrence period, in user-defined order.
    pub scheduled_times: Vec<TimeOfDay>,
    /// Unix epoch milliseconds; set once at creation.
    pub created_at: i64,
}

impl Habit {
    /// Creates a habit with a generated stable ID.
    pub fn new(name: impl Into<String>, created_at: i64) -> Self {
        Self::with_id(Uuid::new_v4(), name, created_at)
    }

    /// Creates a habit with a caller-provided stable ID.
    ///
    /// Used by imports where identity already exists.
    /// A blank `name` falls back to [`DEFAULT_HABIT_NAME`].
    pub fn with_id(id: HabitId, name: impl Into<String>, created_at: i64) -> Self {
        let name = name_or_default(name.into());
        Self {
            id,
            name,
            frequency: Frequency::default(),
            scheduled_times: Vec::new(),
            created_at,
        }
    }

    /// Validates invariants that must hold before persistence.
    pub fn validate(&self) -> Result<(), HabitValidationError> {
        if self.name.trim().is_empty() {
            return Err(HabitValidationError::EmptyName);
        }
        if self.created_at < 0 {
            return Err(HabitValidationError::NegativeCreatedAt(self.created_at));
        }
        Ok(())
    }

    /// Number of check-ins needed to finish one recurrence period.
    pub fn total_per_period(&self) -> u32 {
        (self.scheduled_times.len() as u32).max(1)
    }

    /// Returns the next scheduled occurrence strictly after `now`.
    ///
    /// Returns `None` when the habit has no scheduled times.
    pub fn next_due(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        match self.frequency {
            Frequency::Daily => {
                let current = now.time();
                let later_today = self
                    .scheduled_times
                    .iter()
                    .map(|time| time.to_naive_time())
                    .filter(|time| *time > current)
                    .min();
                if let Some(time) = later_today {
                    return Some(now.date().and_time(time));
                }

                let earliest = self
                    .scheduled_times
                    .iter()
                    .map(|time| time.to_naive_time())
                    .min()?;
                now.date()
                    .succ_opt()
                    .map(|tomorrow| tomorrow.and_time(earliest))
            }
        }
    }
}

fn name_or_default(name: String) -> String {
    if name.trim().is_empty() {
        DEFAULT_HABIT_NAME.to_string()
    } else {
        name
    }
}
