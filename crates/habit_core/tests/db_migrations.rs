use habit_core::db::migrations::{latest_version, schema_version};
use habit_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::{params, Connection, ErrorCode};

const HABIT: &str = "00000000-0000-0000-0000-00000000000a";

#[test]
fn fresh_database_gets_habit_and_completion_tables() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn).unwrap(), latest_version());
    assert_table_exists(&conn, "habits");
    assert_table_exists(&conn, "habit_completions");
}

#[test]
fn reopening_a_habit_file_keeps_its_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("habit.db");

    let first = open_db(&path).unwrap();
    insert_habit(&first, HABIT, 1);
    drop(first);

    let second = open_db(&path).unwrap();
    assert_eq!(schema_version(&second).unwrap(), latest_version());
    assert_eq!(count(&second, "habits"), 1);
}

#[test]
fn habits_only_file_is_upgraded_with_completions_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("v1.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(include_str!("../src/db/migrations/0001_habits.sql"))
        .unwrap();
    conn.execute_batch("PRAGMA user_version = 1;").unwrap();
    insert_habit(&conn, HABIT, 1);
    drop(conn);

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn).unwrap(), latest_version());
    assert_table_exists(&conn, "habit_completions");
    assert_eq!(count(&conn, "habits"), 1);

    insert_completion(&conn, HABIT, "2024-03-01", 1).unwrap();
    assert_eq!(count(&conn, "habit_completions"), 1);
}

#[test]
fn file_from_newer_build_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn deleting_a_habit_removes_its_completions() {
    let conn = open_db_in_memory().unwrap();
    let other = "00000000-0000-0000-0000-00000000000b";
    insert_habit(&conn, HABIT, 1);
    insert_habit(&conn, other, 2);
    insert_completion(&conn, HABIT, "2024-03-01", 1).unwrap();
    insert_completion(&conn, HABIT, "2024-03-02", 2).unwrap();
    insert_completion(&conn, other, "2024-03-01", 1).unwrap();

    conn.execute("DELETE FROM habits WHERE uuid = ?1", [HABIT])
        .unwrap();

    let left: Vec<String> = conn
        .prepare("SELECT habit_uuid FROM habit_completions")
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(left, vec![other.to_string()]);
}

#[test]
fn completion_rows_need_a_habit_and_a_positive_count() {
    let conn = open_db_in_memory().unwrap();
    insert_habit(&conn, HABIT, 1);

    let orphan = insert_completion(&conn, "00000000-0000-0000-0000-0000000000ff", "2024-03-01", 1)
        .unwrap_err();
    let zero = insert_completion(&conn, HABIT, "2024-03-01", 0).unwrap_err();

    assert_eq!(orphan.sqlite_error_code(), Some(ErrorCode::ConstraintViolation));
    assert_eq!(zero.sqlite_error_code(), Some(ErrorCode::ConstraintViolation));
    assert_eq!(count(&conn, "habit_completions"), 0);
}

fn insert_habit(conn: &Connection, uuid: &str, created_at: i64) {
    conn.execute(
        "INSERT INTO habits (uuid, name, created_at) VALUES (?1, 'Read', ?2)",
        params![uuid, created_at],
    )
    .unwrap();
}

fn insert_completion(
    conn: &Connection,
    uuid: &str,
    day: &str,
    passed_count: u32,
) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO habit_completions (habit_uuid, day, passed_count) VALUES (?1, ?2, ?3)",
        params![uuid, day, passed_count],
    )
}

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1);",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
