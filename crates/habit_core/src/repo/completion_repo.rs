//! Completion repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist per-day check-in counts in `habit_completions`.
//!
//! # Invariants
//! - Rows with `passed_count = 0` are never stored; zero means "no row".
//! - Completion rows are removed with their habit (FK cascade).

use crate::model::completion::HabitCompletion;
use crate::model::habit::HabitId;
use crate::repo::record_store::{RepoError, RepoResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const DAY_FORMAT: &str = "%Y-%m-%d";

/// Repository interface for per-day completion state.
pub trait CompletionRepository {
    fn get_completion(&self, habit_id: HabitId, day: NaiveDate)
        -> RepoResult<Option<HabitCompletion>>;
    /// Writes `passed_count` for the pair; a zero count removes the row.
    fn put_completion(&self, completion: &HabitCompletion) -> RepoResult<()>;
    /// Lists completions with `from <= day <= to`, ordered by day.
    fn list_completions(&self, from: NaiveDate, to: NaiveDate)
        -> RepoResult<Vec<HabitCompletion>>;
}

/// SQLite-backed completion repository.
pub struct SqliteCompletionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCompletionRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl CompletionRepository for SqliteCompletionRepository<'_> {
    fn get_completion(
        &self,
        habit_id: HabitId,
        day: NaiveDate,
    ) -> RepoResult<Option<HabitCompletion>> {
        let mut stmt = self.conn.prepare(
            "SELECT habit_uuid, day, passed_count
             FROM habit_completions
             WHERE habit_uuid = ?1 AND day = ?2;",
        )?;
        let mut rows = stmt.query(params![habit_id.to_string(), day_to_db(day)])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_completion_row(row)?));
        }
        Ok(None)
    }

    fn put_completion(&self, completion: &HabitCompletion) -> RepoResult<()> {
        if completion.passed_count == 0 {
            self.conn.execute(
                "DELETE FROM habit_completions WHERE habit_uuid = ?1 AND day = ?2;",
                params![completion.habit_id.to_string(), day_to_db(completion.day)],
            )?;
            return Ok(());
        }

        self.conn.execute(
            "INSERT INTO habit_completions (habit_uuid, day, passed_count)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (habit_uuid, day) DO UPDATE SET
                passed_count = excluded.passed_count,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![
                completion.habit_id.to_string(),
                day_to_db(completion.day),
                completion.passed_count,
            ],
        )?;
        Ok(())
    }

    fn list_completions(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepoResult<Vec<HabitCompletion>> {
        let mut stmt = self.conn.prepare(
            "SELECT habit_uuid, day, passed_count
             FROM habit_completions
             WHERE day >= ?1 AND day <= ?2
             ORDER BY day ASC, habit_uuid ASC;",
        )?;
        let mut rows = stmt.query(params![day_to_db(from), day_to_db(to)])?;
        let mut completions = Vec::new();
        while let Some(row) = rows.next()? {
            completions.push(parse_completion_row(row)?);
        }
        Ok(completions)
    }
}

fn day_to_db(day: NaiveDate) -> String {
    day.format(DAY_FORMAT).to_string()
}

fn parse_completion_row(row: &Row<'_>) -> RepoResult<HabitCompletion> {
    let uuid_text: String = row.get("habit_uuid")?;
    let habit_id = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid uuid value `{uuid_text}` in habit_completions.habit_uuid"
        ))
    })?;

    let day_text: String = row.get("day")?;
    let day = NaiveDate::parse_from_str(&day_text, DAY_FORMAT).map_err(|_| {
        RepoError::InvalidData(format!("invalid day `{day_text}` in habit_completions.day"))
    })?;

    let passed_count = row.get::<_, i64>("passed_count")?;
    let passed_count = u32::try_from(passed_count).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid passed_count `{passed_count}` in habit_completions.passed_count"
        ))
    })?;

    Ok(HabitCompletion {
        habit_id,
        day,
        passed_count,
    })
}
