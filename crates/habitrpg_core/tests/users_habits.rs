use chrono::{NaiveDate, NaiveTime};
use habitrpg_core::db::open_db_in_memory;
use habitrpg_core::{
    FixedClock, GameError, HabitService, HabitUpdate, NewHabit, RepoError, SqliteStore,
    UserService, DEFAULT_XP_REWARD, MAX_XP_REWARD,
};
use rusqlite::Connection;

fn clock() -> FixedClock {
    FixedClock::at_day(NaiveDate::from_ymd_opt(2024, 5, 20).unwrap())
}

#[test]
fn register_creates_level_one_user() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let users = UserService::new(store, clock());

    let user = users.register(" quester ", "quester@example.com").unwrap();
    assert_eq!(user.username, "quester");
    assert_eq!(user.progression.level, 1);
    assert_eq!(user.progression.total_xp, 0);

    assert_eq!(users.get_user(user.id).unwrap(), user);
    assert_eq!(users.find_by_username("quester").unwrap(), Some(user));
    assert_eq!(users.find_by_username("nobody").unwrap(), None);
}

#[test]
fn register_rejects_duplicate_email_and_username() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let users = UserService::new(store, clock());
    users.register("quester", "quester@example.com").unwrap();

    let email_err = users
        .register("someone_else", "Quester@Example.com")
        .unwrap_err();
    assert!(matches!(email_err, GameError::EmailTaken(_)));

    let username_err = users
        .register("quester", "other@example.com")
        .unwrap_err();
    assert!(matches!(username_err, GameError::UsernameTaken(_)));
}

#[test]
fn register_rejects_malformed_input() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let users = UserService::new(store, clock());

    assert!(matches!(
        users.register("   ", "blank@example.com"),
        Err(GameError::Validation(_))
    ));
    assert!(matches!(
        users.register("quester", "not-an-email"),
        Err(GameError::Validation(_))
    ));
}

#[test]
fn create_habit_applies_defaults_and_normalizes_weekdays() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let user = UserService::new(store, clock())
        .register("quester", "quester@example.com")
        .unwrap();
    let habits = HabitService::new(store, clock());

    let plain = habits
        .create_habit(user.id, NewHabit::named("Drink water"))
        .unwrap();
    assert_eq!(plain.xp_reward, DEFAULT_XP_REWARD);
    assert!(plain.is_active);
    assert!(plain.days_of_week.is_empty());

    let scheduled = habits
        .create_habit(
            user.id,
            NewHabit {
                description: Some("5k loop".to_string()),
                reminder_time: NaiveTime::from_hms_opt(7, 30, 0),
                days_of_week: vec![4, 0, 2, 0],
                xp_reward: 25,
                ..NewHabit::named("Run")
            },
        )
        .unwrap();
    assert_eq!(scheduled.days_of_week, vec![0, 2, 4]);

    let stored = habits.get_habit(user.id, scheduled.id).unwrap();
    assert_eq!(stored, scheduled);
}

#[test]
fn create_habit_validates_input_and_owner() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let user = UserService::new(store, clock())
        .register("quester", "quester@example.com")
        .unwrap();
    let habits = HabitService::new(store, clock());

    assert!(matches!(
        habits.create_habit(user.id, NewHabit::named("  ")),
        Err(GameError::Validation(_))
    ));
    assert!(matches!(
        habits.create_habit(
            user.id,
            NewHabit {
                xp_reward: 0,
                ..NewHabit::named("Free")
            }
        ),
        Err(GameError::Validation(_))
    ));
    assert!(matches!(
        habits.create_habit(
            user.id,
            NewHabit {
                xp_reward: i64::MAX,
                ..NewHabit::named("Jackpot")
            }
        ),
        Err(GameError::Validation(_))
    ));
    assert!(habits
        .create_habit(
            user.id,
            NewHabit {
                xp_reward: MAX_XP_REWARD,
                ..NewHabit::named("Marathon")
            }
        )
        .is_ok());
    assert!(matches!(
        habits.create_habit(
            user.id,
            NewHabit {
                days_of_week: vec![7],
                ..NewHabit::named("Someday")
            }
        ),
        Err(GameError::Validation(_))
    ));
    assert!(matches!(
        habits.create_habit(uuid::Uuid::new_v4(), NewHabit::named("Orphan")),
        Err(GameError::NotFound { entity: "user", .. })
    ));
}

#[test]
fn list_habits_is_owner_scoped_and_filters_inactive() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let users = UserService::new(store, clock());
    let owner = users.register("owner", "owner@example.com").unwrap();
    let other = users.register("other", "other@example.com").unwrap();
    let habits = HabitService::new(store, clock());

    let run = habits.create_habit(owner.id, NewHabit::named("Run")).unwrap();
    let read = habits.create_habit(owner.id, NewHabit::named("Read")).unwrap();
    habits.create_habit(other.id, NewHabit::named("Swim")).unwrap();
    habits.deactivate_habit(owner.id, read.id).unwrap();

    let active: Vec<_> = habits
        .list_habits(owner.id, true)
        .unwrap()
        .into_iter()
        .map(|habit| habit.id)
        .collect();
    assert_eq!(active, vec![run.id]);

    let all = habits.list_habits(owner.id, false).unwrap();
    assert_eq!(all.len(), 2);
    assert!(all.iter().all(|habit| habit.user_id == owner.id));
}

#[test]
fn update_habit_changes_only_given_fields() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let user = UserService::new(store, clock())
        .register("quester", "quester@example.com")
        .unwrap();
    let habits = HabitService::new(store, clock());
    let run = habits
        .create_habit(
            user.id,
            NewHabit {
                description: Some("morning".to_string()),
                ..NewHabit::named("Run")
            },
        )
        .unwrap();

    let updated = habits
        .update_habit(
            user.id,
            run.id,
            HabitUpdate {
                name: Some(" Long run ".to_string()),
                xp_reward: Some(40),
                days_of_week: Some(vec![6, 5]),
                ..HabitUpdate::default()
            },
        )
        .unwrap();

    assert_eq!(updated.name, "Long run");
    assert_eq!(updated.xp_reward, 40);
    assert_eq!(updated.days_of_week, vec![5, 6]);
    assert_eq!(updated.description.as_deref(), Some("morning"));
    assert_eq!(updated.created_at, run.created_at);
    assert_eq!(habits.get_habit(user.id, run.id).unwrap(), updated);

    let with_reminder = habits
        .update_habit(
            user.id,
            run.id,
            HabitUpdate {
                reminder_time: Some(NaiveTime::from_hms_opt(6, 0, 0)),
                ..HabitUpdate::default()
            },
        )
        .unwrap();
    assert!(with_reminder.reminder_time.is_some());

    let cleared = habits
        .update_habit(
            user.id,
            run.id,
            HabitUpdate {
                description: Some(None),
                reminder_time: Some(None),
                ..HabitUpdate::default()
            },
        )
        .unwrap();
    assert_eq!(cleared.description, None);
    assert_eq!(cleared.reminder_time, None);
    assert_eq!(cleared.name, "Long run");
    assert_eq!(habits.get_habit(user.id, run.id).unwrap(), cleared);

    assert!(matches!(
        habits.update_habit(
            user.id,
            run.id,
            HabitUpdate {
                xp_reward: Some(-5),
                ..HabitUpdate::default()
            }
        ),
        Err(GameError::Validation(_))
    ));
}

#[test]
fn foreign_habits_look_missing() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let users = UserService::new(store, clock());
    let owner = users.register("owner", "owner@example.com").unwrap();
    let other = users.register("other", "other@example.com").unwrap();
    let habits = HabitService::new(store, clock());
    let run = habits.create_habit(owner.id, NewHabit::named("Run")).unwrap();

    assert!(matches!(
        habits.get_habit(other.id, run.id),
        Err(GameError::NotFound { entity: "habit", .. })
    ));
    assert!(matches!(
        habits.update_habit(other.id, run.id, HabitUpdate::default()),
        Err(GameError::NotFound { entity: "habit", .. })
    ));
    assert!(matches!(
        habits.deactivate_habit(other.id, run.id),
        Err(GameError::NotFound { entity: "habit", .. })
    ));
    assert!(habits.get_habit(owner.id, run.id).unwrap().is_active);
}

#[test]
fn store_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();

    assert!(matches!(
        SqliteStore::try_new(&conn),
        Err(RepoError::UninitializedConnection {
            actual_version: 0,
            ..
        })
    ));
}

#[test]
fn store_rejects_connection_missing_tables() {
    let conn = Connection::open_in_memory().unwrap();
    let latest = habitrpg_core::db::migrations::latest_version();
    conn.execute_batch(&format!("PRAGMA user_version = {latest};"))
        .unwrap();

    assert!(matches!(
        SqliteStore::try_new(&conn),
        Err(RepoError::MissingRequiredTable("users"))
    ));
}
