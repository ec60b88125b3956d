//! SQLite-backed habit record store.
//!
//! # Responsibility
//! - Provide the `RecordStore` surface over the canonical `habits` table.
//! - Assign identity and monotonic creation timestamps on create.
//! - Detect commits made by other connections (`PRAGMA data_version`).
//!
//! # Invariants
//! - `created_at` is strictly greater than every existing value at insert.
//! - `save` never rewrites `uuid` or `created_at`.
//! - `fetch_all` orders by `created_at ASC, rowid ASC`.

use crate::model::habit::{Frequency, Habit, HabitDraft, TimeOfDay};
use crate::repo::record_store::{RecordId, RecordStore, RepoError, RepoResult, StoredModel};
use chrono::Utc;
use rusqlite::{params, Connection, Row};
use std::cell::Cell;
use uuid::Uuid;

const HABIT_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    frequency,
    scheduled_times,
    created_at
FROM habits";

impl StoredModel for Habit {
    fn record_id(&self) -> RecordId {
        self.id
    }
}

/// SQLite-backed habit repository.
pub struct SqliteHabitRepository<'conn> {
    conn: &'conn Connection,
    data_version: Cell<i64>,
}

impl<'conn> SqliteHabitRepository<'conn> {
    /// Creates a repository bound to a migrated connection.
    ///
    /// The current `data_version` becomes the baseline for `poll_changes`.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let data_version = read_data_version(conn)?;
        Ok(Self {
            conn,
            data_version: Cell::new(data_version),
        })
    }

    /// Gets one habit by ID.
    pub fn get_habit(&self, id: RecordId) -> RepoResult<Option<Habit>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{HABIT_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_habit_row(row)?));
        }
        Ok(None)
    }
}

impl RecordStore for SqliteHabitRepository<'_> {
    type Model = Habit;
    type Draft = HabitDraft;

    fn fetch_all(&self) -> RepoResult<Vec<Habit>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{HABIT_SELECT_SQL} ORDER BY created_at ASC, rowid ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut habits = Vec::new();
        while let Some(row) = rows.next()? {
            habits.push(parse_habit_row(row)?);
        }
        Ok(habits)
    }

    fn create(&self, draft: &HabitDraft) -> RepoResult<Habit> {
        let tx = self.conn.unchecked_transaction()?;
        let latest: i64 = tx.query_row(
            "SELECT COALESCE(MAX(created_at), -1) FROM habits;",
            [],
            |row| row.get(0),
        )?;
        let created_at = Utc::now().timestamp_millis().max(latest + 1);

        let habit = draft.clone().into_habit(Uuid::new_v4(), created_at);
        habit.validate()?;

        tx.execute(
            "INSERT INTO habits (
                uuid,
                name,
                frequency,
                scheduled_times,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                habit.id.to_string(),
                habit.name.as_str(),
                frequency_to_db(habit.frequency),
                scheduled_times_to_db(&habit.scheduled_times),
                habit.created_at,
            ],
        )?;
        tx.commit()?;

        Ok(habit)
    }

    fn save(&self, habit: &Habit) -> RepoResult<()> {
        habit.validate()?;

        let changed = self.conn.execute(
            "UPDATE habits
             SET
                name = ?1,
                frequency = ?2,
                scheduled_times = ?3,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?4;",
            params![
                habit.name.as_str(),
                frequency_to_db(habit.frequency),
                scheduled_times_to_db(&habit.scheduled_times),
                habit.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(habit.id));
        }
        Ok(())
    }

    fn delete(&self, id: RecordId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM habits WHERE uuid = ?1;", [id.to_string()])?;
        Ok(changed > 0)
    }

    fn poll_changes(&self) -> RepoResult<bool> {
        let current = read_data_version(self.conn)?;
        let changed = current != self.data_version.get();
        self.data_version.set(current);
        Ok(changed)
    }
}

fn read_data_version(conn: &Connection) -> RepoResult<i64> {
    let version = conn.query_row("PRAGMA data_version;", [], |row| row.get(0))?;
    Ok(version)
}

fn parse_habit_row(row: &Row<'_>) -> RepoResult<Habit> {
    let uuid_text: String = row.get("uuid")?;
    let id = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{uuid_text}` in habits.uuid"))
    })?;

    let frequency_text: String = row.get("frequency")?;
    let frequency = parse_frequency(&frequency_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid frequency `{frequency_text}` in habits.frequency"
        ))
    })?;

    let times_text: String = row.get("scheduled_times")?;
    let scheduled_times = parse_scheduled_times(&times_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid schedule `{times_text}` in habits.scheduled_times"
        ))
    })?;

    let habit = Habit {
        id,
        name: row.get("name")?,
        frequency,
        scheduled_times,
        created_at: row.get("created_at")?,
    };
    habit.validate()?;
    Ok(habit)
}

fn frequency_to_db(frequency: Frequency) -> &'static str {
    match frequency {
        Frequency::Daily => "daily",
    }
}

fn parse_frequency(value: &str) -> Option<Frequency> {
    match value {
        "daily" => Some(Frequency::Daily),
        _ => None,
    }
}

fn scheduled_times_to_db(times: &[TimeOfDay]) -> String {
    times
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn parse_scheduled_times(value: &str) -> Option<Vec<TimeOfDay>> {
    if value.trim().is_empty() {
        return Some(Vec::new());
    }
    value
        .split(',')
        .map(|part| part.parse::<TimeOfDay>().ok())
        .collect()
}
