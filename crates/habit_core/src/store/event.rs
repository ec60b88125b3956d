//! Change-event vocabulary published to subscribers.

use crate::model::habit::{Habit, HabitId};

/// Row-level change to an ordered list.
///
/// Events are applied sequentially: the first event's indices refer to the
/// list before the mutation, each later event's indices refer to the list as
/// left by the previous event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent<M = Habit> {
    /// `row` now lives at `index`; rows at and after `index` shift down.
    Insert { index: usize, row: M },
    /// Row at `index` is removed.
    Delete { index: usize },
    /// Row at `index` keeps its position but its content is now `row`.
    Update { index: usize, row: M },
    /// Row is removed at `from` and reinserted at `to`.
    Move { from: usize, to: usize },
    /// Cached row state is invalid; re-read the whole list.
    FullReload,
}

impl<M: Clone> ChangeEvent<M> {
    /// Applies this event to a cached copy of the list.
    ///
    /// Returns `false` for `FullReload` or when an index is out of range; the
    /// caller must then rebuild its copy from `HabitStore::list`.
    pub fn apply(&self, rows: &mut Vec<M>) -> bool {
        match self {
            Self::Insert { index, row } if *index <= rows.len() => {
                rows.insert(*index, row.clone());
                true
            }
            Self::Delete { index } if *index < rows.len() => {
                rows.remove(*index);
                true
            }
            Self::Update { index, row } if *index < rows.len() => {
                rows[*index] = row.clone();
                true
            }
            Self::Move { from, to } if *from < rows.len() && *to < rows.len() => {
                let row = rows.remove(*from);
                rows.insert(*to, row);
                true
            }
            _ => false,
        }
    }
}

/// Applies an event sequence in order; stops at the first event that cannot
/// be applied.
pub fn apply_all<M: Clone>(rows: &mut Vec<M>, events: &[ChangeEvent<M>]) -> bool {
    events.iter().all(|event| event.apply(rows))
}

/// Write operation that can fail at the store boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOperation {
    Create,
    Update,
    Delete,
}

impl WriteOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// One delivery to a subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreNotification {
    /// Ordered change sequence produced by one mutation.
    Changes(Vec<ChangeEvent>),
    /// A write could not be persisted; the mirror was left unchanged.
    WriteFailed {
        operation: WriteOperation,
        habit_id: Option<HabitId>,
        message: String,
    },
}
