//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `habit_core` linkage and store wiring end to end.
//! - Keep output deterministic for quick local sanity checks.

use habit_core::db::open_db_in_memory;
use habit_core::{
    apply_all, Habit, HabitStore, SqliteHabitRepository, StoreConfig, StoreNotification,
};
use log::{info, warn};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

fn main() -> ExitCode {
    println!("habit_core ping={}", habit_core::ping());
    println!("habit_core version={}", habit_core::core_version());

    let log_dir = std::env::temp_dir().join("habit-cli-logs");
    if let Err(err) = habit_core::init_logging(
        habit_core::default_log_level(),
        &log_dir.to_string_lossy(),
    ) {
        eprintln!("logging disabled: {err}");
    }

    match run_store_smoke() {
        Ok(rows) => {
            info!("event=cli_smoke module=cli status=ok rows={rows}");
            println!("habit_store smoke rows={rows}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            warn!("event=cli_smoke module=cli status=error error={err}");
            eprintln!("habit_store smoke failed: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Copy of the habit list kept in step by store notifications, the way a
/// list screen would hold it.
#[derive(Default)]
struct RenderedRows {
    rows: Vec<Habit>,
    // Set when a batch could not be patched in; cleared by `settle`.
    stale: bool,
}

impl RenderedRows {
    fn apply(&mut self, notification: &StoreNotification) {
        if let StoreNotification::Changes(events) = notification {
            if !apply_all(&mut self.rows, events) {
                self.stale = true;
            }
        }
    }

    /// Rebuilds from `current` if a batch failed to apply.
    fn settle(&mut self, current: &[Habit]) {
        if self.stale {
            info!(
                "event=cli_render module=cli status=reload count={}",
                current.len()
            );
            self.rows = current.to_vec();
            self.stale = false;
        }
    }
}

/// Creates one habit in an in-memory store and mirrors it through the event
/// pump.
fn run_store_smoke() -> Result<usize, Box<dyn std::error::Error>> {
    let conn = open_db_in_memory()?;
    let records = SqliteHabitRepository::try_new(&conn)?;
    let (mut store, pump) = HabitStore::new(records, StoreConfig::default());
    store.load()?;

    let rendered = Arc::new(Mutex::new(RenderedRows {
        rows: store.list().to_vec(),
        stale: false,
    }));
    let view = Arc::clone(&rendered);
    store.subscribe("cli", move |notification| {
        if let Ok(mut rendered) = view.lock() {
            rendered.apply(notification);
        }
    });

    store.create()?;
    pump.dispatch_pending();

    let mut rendered = rendered.lock().map_err(|_| "rendered rows lock poisoned")?;
    rendered.settle(store.list());
    Ok(rendered.rows.len())
}

#[cfg(test)]
mod tests {
    use super::{run_store_smoke, RenderedRows};
    use habit_core::{ChangeEvent, Habit, StoreNotification};

    #[test]
    fn store_round_trip_renders_created_habit() {
        assert_eq!(run_store_smoke().unwrap(), 1);
    }

    #[test]
    fn full_reload_is_rebuilt_from_current_rows() {
        let current = vec![Habit::new("Read", 1), Habit::new("Run", 2)];
        let mut rendered = RenderedRows::default();

        rendered.apply(&StoreNotification::Changes(vec![ChangeEvent::FullReload]));
        assert!(rendered.stale);
        rendered.settle(&current);

        assert_eq!(rendered.rows, current);
        assert!(!rendered.stale);
    }

    #[test]
    fn out_of_range_patch_is_rebuilt_from_current_rows() {
        let current = vec![Habit::new("Read", 1)];
        let mut rendered = RenderedRows::default();

        rendered.apply(&StoreNotification::Changes(vec![ChangeEvent::Delete {
            index: 3,
        }]));
        rendered.settle(&current);

        assert_eq!(rendered.rows, current);
    }
}
