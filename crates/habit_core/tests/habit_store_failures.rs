use habit_core::{
    ChangeEvent, Habit, HabitDraft, HabitStore, HabitStoreError, RecordId, RecordStore, RepoError,
    RepoResult, StoreConfig, StoreNotification, WriteOperation,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// In-memory record store whose failures are switched on by the test.
#[derive(Default)]
struct ScriptState {
    rows: RefCell<Vec<Habit>>,
    fail_reads: Cell<bool>,
    fail_writes: Cell<bool>,
    changed: Cell<bool>,
}

impl ScriptState {
    fn seed(&self, id: u128, name: &str, created_at: i64) -> Habit {
        let habit = Habit::with_id(Uuid::from_u128(id), name, created_at);
        self.rows.borrow_mut().push(habit.clone());
        habit
    }

    fn write_guard(&self) -> RepoResult<()> {
        if self.fail_writes.get() {
            return Err(RepoError::InvalidData("scripted write failure".to_string()));
        }
        Ok(())
    }
}

struct ScriptedStore(Rc<ScriptState>);

impl RecordStore for ScriptedStore {
    type Model = Habit;
    type Draft = HabitDraft;

    fn fetch_all(&self) -> RepoResult<Vec<Habit>> {
        if self.0.fail_reads.get() {
            return Err(RepoError::InvalidData("scripted read failure".to_string()));
        }
        Ok(self.0.rows.borrow().clone())
    }

    fn create(&self, draft: &HabitDraft) -> RepoResult<Habit> {
        self.0.write_guard()?;
        let mut rows = self.0.rows.borrow_mut();
        let created_at = rows.iter().map(|habit| habit.created_at).max().unwrap_or(0) + 1;
        let habit = draft.clone().into_habit(Uuid::new_v4(), created_at);
        rows.push(habit.clone());
        Ok(habit)
    }

    fn save(&self, model: &Habit) -> RepoResult<()> {
        self.0.write_guard()?;
        let mut rows = self.0.rows.borrow_mut();
        let row = rows
            .iter_mut()
            .find(|habit| habit.id == model.id)
            .ok_or(RepoError::NotFound(model.id))?;
        *row = model.clone();
        Ok(())
    }

    fn delete(&self, id: RecordId) -> RepoResult<bool> {
        self.0.write_guard()?;
        let mut rows = self.0.rows.borrow_mut();
        let before = rows.len();
        rows.retain(|habit| habit.id != id);
        Ok(rows.len() != before)
    }

    fn poll_changes(&self) -> RepoResult<bool> {
        Ok(self.0.changed.replace(false))
    }
}

type Inbox = Arc<Mutex<Vec<StoreNotification>>>;

fn loaded_store(
    state: &Rc<ScriptState>,
) -> (HabitStore<ScriptedStore>, habit_core::EventPump, Inbox) {
    let (mut store, pump) =
        HabitStore::new(ScriptedStore(Rc::clone(state)), StoreConfig::default());
    store.load().unwrap();
    let inbox = Inbox::default();
    let sink = Arc::clone(&inbox);
    store.subscribe("list", move |notification| {
        sink.lock().unwrap().push(notification.clone())
    });
    (store, pump, inbox)
}

#[test]
fn create_after_existing_habit_appends() {
    let state = Rc::new(ScriptState::default());
    let a = state.seed(0xa, "a", 1);
    let (mut store, pump, inbox) = loaded_store(&state);

    let created = store.create().unwrap();

    assert_eq!(created.created_at, 2);
    assert_eq!(store.list(), [a, created.clone()].as_slice());
    pump.dispatch_pending();
    assert_eq!(
        *inbox.lock().unwrap(),
        vec![StoreNotification::Changes(vec![ChangeEvent::Insert {
            index: 1,
            row: created
        }])]
    );
}

#[test]
fn failed_read_during_refresh_keeps_mirror_and_emits_nothing() {
    let state = Rc::new(ScriptState::default());
    state.seed(1, "a", 1);
    let (mut store, pump, inbox) = loaded_store(&state);
    let before = store.list().to_vec();

    state.seed(2, "b", 2);
    state.fail_reads.set(true);
    state.changed.set(true);

    assert!(!store.sync());
    assert_eq!(store.list(), before.as_slice());
    assert_eq!(pump.dispatch_pending(), 0);
    assert!(inbox.lock().unwrap().is_empty());

    state.fail_reads.set(false);
    assert!(store.refresh());
    assert_eq!(store.list().len(), 2);
}

#[test]
fn change_seen_during_failed_read_is_picked_up_by_next_sync() {
    let state = Rc::new(ScriptState::default());
    state.seed(1, "a", 1);
    let (mut store, pump, inbox) = loaded_store(&state);

    let b = state.seed(2, "b", 2);
    state.fail_reads.set(true);
    state.changed.set(true);
    assert!(!store.sync());
    assert_eq!(store.list().len(), 1);

    // The record store has nothing new to report; the earlier change is
    // still owed to the mirror.
    state.fail_reads.set(false);
    assert!(store.sync());
    assert_eq!(store.list().len(), 2);
    assert_eq!(store.list()[1], b);

    assert!(!store.sync());
    assert_eq!(pump.dispatch_pending(), 1);
    assert_eq!(
        *inbox.lock().unwrap(),
        vec![StoreNotification::Changes(vec![ChangeEvent::Insert {
            index: 1,
            row: b
        }])]
    );
}

#[test]
fn failed_load_is_reported_and_keeps_mirror() {
    let state = Rc::new(ScriptState::default());
    state.seed(1, "a", 1);
    let (mut store, _pump, _inbox) = loaded_store(&state);

    state.fail_reads.set(true);
    let err = store.load().unwrap_err();

    assert!(matches!(err, HabitStoreError::Read(_)));
    assert_eq!(store.list().len(), 1);
}

#[test]
fn failed_writes_are_reported_and_notified() {
    let state = Rc::new(ScriptState::default());
    let a = state.seed(1, "a", 1);
    let (mut store, pump, inbox) = loaded_store(&state);
    state.fail_writes.set(true);

    let create_err = store.create().unwrap_err();
    let mut renamed = a.clone();
    renamed.name = "Run".to_string();
    let update_err = store.update(renamed).unwrap_err();
    let delete_err = store.delete(a.id).unwrap_err();

    assert!(matches!(
        create_err,
        HabitStoreError::Write {
            operation: WriteOperation::Create,
            ..
        }
    ));
    assert!(matches!(
        update_err,
        HabitStoreError::Write {
            operation: WriteOperation::Update,
            ..
        }
    ));
    assert!(matches!(
        delete_err,
        HabitStoreError::Write {
            operation: WriteOperation::Delete,
            ..
        }
    ));
    assert_eq!(store.list(), [a.clone()].as_slice());

    assert_eq!(pump.dispatch_pending(), 3);
    let notifications = inbox.lock().unwrap();
    let failures: Vec<(WriteOperation, Option<Uuid>)> = notifications
        .iter()
        .map(|notification| match notification {
            StoreNotification::WriteFailed {
                operation,
                habit_id,
                message,
            } => {
                assert!(message.contains("scripted write failure"));
                (*operation, *habit_id)
            }
            other => panic!("unexpected notification: {other:?}"),
        })
        .collect();
    assert_eq!(
        failures,
        vec![
            (WriteOperation::Create, None),
            (WriteOperation::Update, Some(a.id)),
            (WriteOperation::Delete, Some(a.id)),
        ]
    );
}

#[test]
fn record_removed_underneath_update_is_a_write_failure() {
    let state = Rc::new(ScriptState::default());
    let a = state.seed(1, "a", 1);
    let (mut store, _pump, _inbox) = loaded_store(&state);
    state.rows.borrow_mut().clear();

    let mut renamed = a.clone();
    renamed.name = "Run".to_string();
    let err = store.update(renamed).unwrap_err();

    assert!(matches!(
        err,
        HabitStoreError::Write {
            source: RepoError::NotFound(id),
            ..
        } if id == a.id
    ));
    assert_eq!(store.list()[0].name, "a");
}

#[test]
fn mirror_is_sorted_by_created_at_with_stable_ties() {
    let state = Rc::new(ScriptState::default());
    let late = state.seed(1, "late", 30);
    let tie_first = state.seed(2, "tie-1", 10);
    let tie_second = state.seed(3, "tie-2", 10);
    let (store, _pump, _inbox) = loaded_store(&state);

    assert_eq!(store.list(), [tie_first, tie_second, late].as_slice());
}

#[test]
fn external_reorder_is_reported_as_move() {
    let state = Rc::new(ScriptState::default());
    let a = state.seed(1, "a", 1);
    let b = state.seed(2, "b", 2);
    let (mut store, pump, inbox) = loaded_store(&state);

    {
        let mut rows = state.rows.borrow_mut();
        rows[0].created_at = 3;
    }
    state.changed.set(true);
    assert!(store.sync());
    pump.dispatch_pending();

    let mut moved = a.clone();
    moved.created_at = 3;
    assert_eq!(store.list(), [b, moved.clone()].as_slice());
    assert_eq!(
        *inbox.lock().unwrap(),
        vec![StoreNotification::Changes(vec![
            ChangeEvent::Move { from: 1, to: 0 },
            ChangeEvent::Update {
                index: 1,
                row: moved
            },
        ])]
    );
}
