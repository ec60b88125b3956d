//! Habit store: single owner of the habit mirror.
//!
//! # Responsibility
//! - Mediate create/update/delete against a `RecordStore`.
//! - Keep an ordered in-memory mirror of the record store contents.
//! - Run the change protocol (re-read, diff, swap, publish) when the record
//!   store reports out-of-band changes.
//!
//! # Invariants
//! - Outside a running operation the mirror equals the record store contents
//!   ordered by `created_at ASC`.
//! - Failed reads keep the mirror and publish nothing.
//! - Failed writes keep the mirror and publish `WriteFailed`.
//! - Every mutation publishes at most one batch.

use crate::config::StoreConfig;
use crate::model::habit::{Habit, HabitDraft, HabitId};
use crate::repo::record_store::{RecordStore, RepoError};
use crate::store::diff::diff_rows;
use crate::store::dispatch::{channel, EventPump, Outbox};
use crate::store::event::{ChangeEvent, StoreNotification, WriteOperation};
use crate::store::subscribers::Subscriptions;
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type HabitStoreResult<T> = Result<T, HabitStoreError>;

/// Error returned by `HabitStore` operations.
#[derive(Debug)]
pub enum HabitStoreError {
    /// `load` has not completed yet.
    NotLoaded,
    /// `update` target is not in the mirror.
    UnknownHabit(HabitId),
    /// The record store rejected a write; the mirror is unchanged.
    Write {
        operation: WriteOperation,
        source: RepoError,
    },
    /// The record store could not be read.
    Read(RepoError),
}

impl Display for HabitStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotLoaded => write!(f, "habit store has not been loaded"),
            Self::UnknownHabit(id) => write!(f, "habit not found: {id}"),
            Self::Write { operation, source } => {
                write!(f, "habit {} failed: {source}", operation.as_str())
            }
            Self::Read(err) => write!(f, "habit read failed: {err}"),
        }
    }
}

impl Error for HabitStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Write { source, .. } => Some(source),
            Self::Read(err) => Some(err),
            Self::NotLoaded | Self::UnknownHabit(_) => None,
        }
    }
}

/// Single source of truth for the habits shown by the presentation layer.
///
/// Mutating operations take `&mut self`, so the owner serializes every
/// mirror change. Notifications are queued and only reach handlers when the
/// paired [`EventPump`] is drained.
pub struct HabitStore<S>
where
    S: RecordStore<Model = Habit, Draft = HabitDraft>,
{
    records: S,
    config: StoreConfig,
    mirror: Vec<Habit>,
    loaded: bool,
    // Set when the record store reported a change that no read has picked
    // up yet.
    pending_refresh: bool,
    subscriptions: Subscriptions,
    outbox: Outbox,
}

impl<S> HabitStore<S>
where
    S: RecordStore<Model = Habit, Draft = HabitDraft>,
{
    /// Creates an unloaded store and the pump that delivers its events.
    pub fn new(records: S, config: StoreConfig) -> (Self, EventPump) {
        let subscriptions = Subscriptions::new();
        let (outbox, pump) = channel(subscriptions.clone());
        let store = Self {
            records,
            config,
            mirror: Vec::new(),
            loaded: false,
            pending_refresh: false,
            subscriptions,
            outbox,
        };
        (store, pump)
    }

    /// Returns a handle to the subscriber registry for the presentation
    /// layer.
    pub fn subscriptions(&self) -> Subscriptions {
        self.subscriptions.clone()
    }

    /// Registers `handler` for future notifications under `subscriber_id`.
    pub fn subscribe<F>(&self, subscriber_id: impl Into<String>, handler: F)
    where
        F: Fn(&StoreNotification) + Send + Sync + 'static,
    {
        self.subscriptions.subscribe(subscriber_id, handler);
    }

    /// Removes the handler registered under `subscriber_id`, if any.
    pub fn unsubscribe(&self, subscriber_id: &str) {
        self.subscriptions.unsubscribe(subscriber_id);
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Current mirror ordered by `created_at ASC`.
    pub fn list(&self) -> &[Habit] {
        &self.mirror
    }

    pub fn get(&self, id: HabitId) -> Option<&Habit> {
        self.mirror.iter().find(|habit| habit.id == id)
    }

    /// Replaces the mirror with the full record store contents.
    ///
    /// Publishes nothing: the loaded contents are the baseline.
    pub fn load(&mut self) -> HabitStoreResult<()> {
        let started_at = Instant::now();
        match self.read_ordered() {
            Ok(habits) => {
                self.mirror = habits;
                self.loaded = true;
                self.pending_refresh = false;
                info!(
                    "event=habit_load module=store status=ok count={} duration_ms={}",
                    self.mirror.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=habit_load module=store status=error duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(HabitStoreError::Read(err))
            }
        }
    }

    /// Creates a habit with configured defaults.
    pub fn create(&mut self) -> HabitStoreResult<Habit> {
        let draft = HabitDraft::new(
            self.config.default_habit_name.clone(),
            self.config.default_scheduled_times.clone(),
        );
        self.create_from(draft)
    }

    /// Creates a habit from an explicit draft.
    pub fn create_from(&mut self, draft: HabitDraft) -> HabitStoreResult<Habit> {
        self.ensure_loaded()?;

        let habit = match self.records.create(&draft) {
            Ok(habit) => habit,
            Err(err) => return Err(self.write_failed(WriteOperation::Create, None, err)),
        };

        let index = self
            .mirror
            .partition_point(|existing| existing.created_at <= habit.created_at);
        self.mirror.insert(index, habit.clone());
        info!(
            "event=habit_create module=store status=ok habit_id={} index={}",
            habit.id, index
        );
        self.publish_changes(vec![ChangeEvent::Insert {
            index,
            row: habit.clone(),
        }]);
        Ok(habit)
    }

    /// Replaces a habit whose id is already in the mirror.
    ///
    /// The stored `created_at` is kept regardless of the passed value.
    /// An id missing from the mirror is reported as `UnknownHabit` without
    /// touching the record store.
    pub fn update(&mut self, habit: Habit) -> HabitStoreResult<()> {
        self.ensure_loaded()?;

        let Some(index) = self.position(habit.id) else {
            info!(
                "event=habit_update module=store status=skip reason=unknown_id habit_id={}",
                habit.id
            );
            return Err(HabitStoreError::UnknownHabit(habit.id));
        };

        let mut habit = habit;
        habit.created_at = self.mirror[index].created_at;

        if let Err(err) = self.records.save(&habit) {
            return Err(self.write_failed(WriteOperation::Update, Some(habit.id), err));
        }

        if self.mirror[index] == habit {
            info!(
                "event=habit_update module=store status=ok habit_id={} changed=false",
                habit.id
            );
            return Ok(());
        }

        self.mirror[index] = habit.clone();
        info!(
            "event=habit_update module=store status=ok habit_id={} index={} changed=true",
            habit.id, index
        );
        self.publish_changes(vec![ChangeEvent::Update { index, row: habit }]);
        Ok(())
    }

    /// Deletes a habit by id. Deleting an unknown id is a no-op.
    pub fn delete(&mut self, id: HabitId) -> HabitStoreResult<()> {
        self.ensure_loaded()?;

        let removed = match self.records.delete(id) {
            Ok(removed) => removed,
            Err(err) => return Err(self.write_failed(WriteOperation::Delete, Some(id), err)),
        };

        let Some(index) = self.position(id) else {
            info!(
                "event=habit_delete module=store status=skip reason=not_in_mirror habit_id={} removed={}",
                id, removed
            );
            return Ok(());
        };

        self.mirror.remove(index);
        info!(
            "event=habit_delete module=store status=ok habit_id={} index={}",
            id, index
        );
        self.publish_changes(vec![ChangeEvent::Delete { index }]);
        Ok(())
    }

    /// Polls the record store and runs [`Self::refresh`] when it reports
    /// out-of-band changes. Returns whether a notification was published.
    ///
    /// A change whose re-read failed stays pending and is retried by the
    /// next call even if the record store reports nothing new.
    pub fn sync(&mut self) -> bool {
        match self.records.poll_changes() {
            Ok(true) => self.pending_refresh = true,
            Ok(false) => {}
            Err(err) => {
                warn!("event=habit_refresh module=store status=error stage=poll error={err}");
            }
        }
        if !self.pending_refresh {
            return false;
        }
        self.refresh()
    }

    /// Runs the change protocol: re-read, diff against the mirror, swap,
    /// publish. Returns whether a notification was published.
    ///
    /// A read failure keeps the mirror and publishes nothing.
    pub fn refresh(&mut self) -> bool {
        let started_at = Instant::now();
        let next = match self.read_ordered() {
            Ok(habits) => habits,
            Err(err) => {
                warn!(
                    "event=habit_refresh module=store status=error stage=read duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                return false;
            }
        };
        self.pending_refresh = false;

        let events = if self.loaded {
            match diff_rows(&self.mirror, &next) {
                Some(events) if events.len() <= self.config.full_reload_threshold => events,
                Some(_) | None => vec![ChangeEvent::FullReload],
            }
        } else {
            vec![ChangeEvent::FullReload]
        };

        self.mirror = next;
        self.loaded = true;

        if events.is_empty() {
            info!(
                "event=habit_refresh module=store status=skip reason=no_changes duration_ms={}",
                started_at.elapsed().as_millis()
            );
            return false;
        }

        info!(
            "event=habit_refresh module=store status=ok events={} full_reload={} duration_ms={}",
            events.len(),
            events == [ChangeEvent::FullReload],
            started_at.elapsed().as_millis()
        );
        self.publish_changes(events);
        true
    }

    fn read_ordered(&self) -> Result<Vec<Habit>, RepoError> {
        let mut habits = self.records.fetch_all()?;
        // Stable: equal timestamps keep record store order.
        habits.sort_by_key(|habit| habit.created_at);
        Ok(habits)
    }

    fn ensure_loaded(&self) -> HabitStoreResult<()> {
        if self.loaded {
            Ok(())
        } else {
            Err(HabitStoreError::NotLoaded)
        }
    }

    fn position(&self, id: HabitId) -> Option<usize> {
        self.mirror.iter().position(|habit| habit.id == id)
    }

    fn publish_changes(&self, events: Vec<ChangeEvent>) {
        self.outbox.publish(StoreNotification::Changes(events));
    }

    fn write_failed(
        &self,
        operation: WriteOperation,
        habit_id: Option<HabitId>,
        err: RepoError,
    ) -> HabitStoreError {
        error!(
            "event=habit_{} module=store status=error habit_id={} error={}",
            operation.as_str(),
            habit_id.map_or_else(|| "-".to_string(), |id| id.to_string()),
            err
        );
        self.outbox.publish(StoreNotification::WriteFailed {
            operation,
            habit_id,
            message: err.to_string(),
        });
        HabitStoreError::Write {
            operation,
            source: err,
        }
    }
}
