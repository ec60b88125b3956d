//! Row diff between two ordered snapshots keyed by record identity.
//!
//! Output order is deletes (descending index), moves, updates, inserts
//! (ascending index). Applying the output in order with
//! [`ChangeEvent::apply`](crate::store::event::ChangeEvent::apply) turns the
//! old snapshot into the new one.

use crate::repo::record_store::{RecordId, StoredModel};
use crate::store::event::ChangeEvent;
use std::collections::HashMap;

/// Computes sequential row events turning `old` into `new`.
///
/// Returns `None` when the change cannot be expressed as row events, which
/// happens when either snapshot holds the same id twice.
pub fn diff_rows<M: StoredModel>(old: &[M], new: &[M]) -> Option<Vec<ChangeEvent<M>>> {
    let old_ids = index_by_id(old)?;
    let new_ids = index_by_id(new)?;
    let mut events = Vec::new();

    for (index, row) in old.iter().enumerate().rev() {
        if !new_ids.contains_key(&row.record_id()) {
            events.push(ChangeEvent::Delete { index });
        }
    }

    let mut working: Vec<&M> = old
        .iter()
        .filter(|row| new_ids.contains_key(&row.record_id()))
        .collect();
    let target: Vec<&M> = new
        .iter()
        .filter(|row| old_ids.contains_key(&row.record_id()))
        .collect();

    for to in 0..target.len() {
        let wanted = target[to].record_id();
        if working[to].record_id() == wanted {
            continue;
        }
        // working[..to] already matches target[..to].
        let from = to + 1 + working[to + 1..]
            .iter()
            .position(|row| row.record_id() == wanted)?;
        let row = working.remove(from);
        working.insert(to, row);
        events.push(ChangeEvent::Move { from, to });
    }

    for (index, (current, next)) in working.iter().zip(&target).enumerate() {
        if current != next {
            events.push(ChangeEvent::Update {
                index,
                row: (*next).clone(),
            });
        }
    }

    for (index, row) in new.iter().enumerate() {
        if !old_ids.contains_key(&row.record_id()) {
            events.push(ChangeEvent::Insert {
                index,
                row: row.clone(),
            });
        }
    }

    Some(events)
}

fn index_by_id<M: StoredModel>(rows: &[M]) -> Option<HashMap<RecordId, usize>> {
    let mut ids = HashMap::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        if ids.insert(row.record_id(), index).is_some() {
            return None;
        }
    }
    Some(ids)
}

#[cfg(test)]
mod tests {
    use super::diff_rows;
    use crate::repo::record_store::{RecordId, StoredModel};
    use crate::store::event::{apply_all, ChangeEvent};
    use uuid::Uuid;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: RecordId,
        label: &'static str,
    }

    impl StoredModel for Row {
        fn record_id(&self) -> RecordId {
            self.id
        }
    }

    fn row(n: u128, label: &'static str) -> Row {
        Row {
            id: Uuid::from_u128(n),
            label,
        }
    }

    #[test]
    fn identical_snapshots_produce_no_events() {
        let rows = vec![row(1, "a"), row(2, "b")];
        assert_eq!(diff_rows(&rows, &rows), Some(Vec::new()));
    }

    #[test]
    fn content_change_is_single_update() {
        let old = vec![row(1, "a"), row(2, "b")];
        let new = vec![row(1, "Run"), row(2, "b")];
        assert_eq!(
            diff_rows(&old, &new),
            Some(vec![ChangeEvent::Update {
                index: 0,
                row: row(1, "Run")
            }])
        );
    }

    #[test]
    fn deletes_are_emitted_against_pre_mutation_indices() {
        let old = vec![row(1, "a"), row(2, "b"), row(3, "c")];
        let new = vec![row(2, "b")];
        assert_eq!(
            diff_rows(&old, &new),
            Some(vec![
                ChangeEvent::Delete { index: 2 },
                ChangeEvent::Delete { index: 0 }
            ])
        );
    }

    #[test]
    fn mixed_change_applies_back_to_new_snapshot() {
        let old = vec![row(1, "a"), row(2, "b"), row(3, "c"), row(4, "d")];
        let new = vec![row(5, "e"), row(3, "c"), row(1, "A"), row(6, "f")];
        let events = diff_rows(&old, &new).expect("diffable");

        let mut patched = old.clone();
        assert!(apply_all(&mut patched, &events));
        assert_eq!(patched, new);
    }

    #[test]
    fn duplicate_ids_are_not_diffable() {
        let old = vec![row(1, "a")];
        let new = vec![row(1, "a"), row(1, "b")];
        assert_eq!(diff_rows(&old, &new), None);
    }
}
