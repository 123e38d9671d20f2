use habitrpg_core::db::migrations::latest_version;
use habitrpg_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

fn user_version(conn: &Connection) -> u32 {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
        .unwrap()
}

fn table_names(conn: &Connection) -> Vec<String> {
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name;")
        .unwrap();
    let names = stmt
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<Vec<String>, _>>()
        .unwrap();
    names
}

fn column_names(conn: &Connection, table: &str) -> Vec<String> {
    let mut stmt = conn
        .prepare(&format!("SELECT name FROM pragma_table_info('{table}');"))
        .unwrap();
    let names = stmt
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<Vec<String>, _>>()
        .unwrap();
    names
}

#[test]
fn fresh_database_is_at_latest_schema() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(user_version(&conn), latest_version());
    let tables = table_names(&conn);
    for expected in ["habit_completions", "habits", "users"] {
        assert!(tables.iter().any(|name| name == expected), "missing {expected}");
    }
}

#[test]
fn habits_require_an_existing_owner() {
    let conn = open_db_in_memory().unwrap();

    let result = conn.execute(
        "INSERT INTO habits (id, user_id, name, xp_reward, is_active, created_at)
         VALUES ('h1', 'missing-user', 'Run', 10, 1, 0);",
        [],
    );
    assert!(result.is_err());
}

#[test]
fn reopening_a_migrated_file_keeps_its_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("habitrpg.db");

    {
        let conn = open_db(&path).unwrap();
        conn.execute(
            "INSERT INTO users (id, username, email, created_at)
             VALUES ('u1', 'hero', 'hero@example.com', 0);",
            [],
        )
        .unwrap();
    }

    let reopened = open_db(&path).unwrap();
    assert_eq!(user_version(&reopened), latest_version());
    let users: i64 = reopened
        .query_row("SELECT COUNT(*) FROM users;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(users, 1);
}

#[test]
fn database_from_a_newer_binary_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("newer.db");
    let newer = latest_version() + 1;

    Connection::open(&path)
        .unwrap()
        .pragma_update(None, "user_version", newer)
        .unwrap();

    let err = open_db(&path).unwrap_err();
    assert!(
        matches!(
            err,
            DbError::UnsupportedSchemaVersion { db_version, latest_supported }
                if db_version == newer && latest_supported == latest_version()
        ),
        "unexpected error: {err}"
    );
}

#[test]
fn version_one_database_gains_schedule_columns() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("v1.db");

    {
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(include_str!("../src/db/migrations/0001_init.sql"))
            .unwrap();
        conn.pragma_update(None, "user_version", 1).unwrap();
        assert!(!column_names(&conn, "habits").contains(&"days_of_week".to_string()));
    }

    let upgraded = open_db(&path).unwrap();
    assert_eq!(user_version(&upgraded), latest_version());
    let columns = column_names(&upgraded, "habits");
    assert!(columns.contains(&"reminder_time".to_string()));
    assert!(columns.contains(&"days_of_week".to_string()));
}
