//! Habit repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist habits and answer owner-scoped lookups.
//! - Keep soft-delete semantics: rows are deactivated, never removed.
//!
//! # Invariants
//! - Every query filters by owning `user_id`.
//! - Lists are ordered `created_at ASC, id ASC`.
//! - `days_of_week` is stored as a JSON array.

use crate::model::habit::{Habit, HabitId};
use crate::model::user::UserId;
use crate::repo::store::{
    bool_to_int, from_epoch_ms, parse_uuid, to_epoch_ms, RepoError, RepoResult, SqliteStore,
};
use rusqlite::{params, Row};

const HABIT_SELECT_SQL: &str = "SELECT
    id,
    user_id,
    name,
    description,
    reminder_time,
    days_of_week,
    xp_reward,
    is_active,
    created_at
FROM habits";

pub trait HabitRepository {
    fn create_habit(&self, habit: &Habit) -> RepoResult<HabitId>;
    /// Resolves a habit only when `user_id` owns it. Inactive habits resolve too.
    fn get_habit_for_owner(&self, habit_id: HabitId, user_id: UserId)
        -> RepoResult<Option<Habit>>;
    fn list_habits(&self, user_id: UserId, active_only: bool) -> RepoResult<Vec<Habit>>;
    /// Rewrites mutable habit fields; identity, owner and `created_at` stay fixed.
    fn update_habit(&self, habit: &Habit) -> RepoResult<()>;
    fn deactivate_habit(&self, habit_id: HabitId, user_id: UserId) -> RepoResult<()>;
    fn count_active_habits(&self, user_id: UserId) -> RepoResult<u64>;
}

impl HabitRepository for SqliteStore<'_> {
    fn create_habit(&self, habit: &Habit) -> RepoResult<HabitId> {
        habit
            .validate()
            .map_err(|err| RepoError::InvalidData(err.to_string()))?;

        self.conn.execute(
            "INSERT INTO habits (
                id,
                user_id,
                name,
                description,
                reminder_time,
                days_of_week,
                xp_reward,
                is_active,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                habit.id.to_string(),
                habit.user_id.to_string(),
                habit.name.as_str(),
                habit.description.as_deref(),
                habit.reminder_time,
                weekdays_to_db(&habit.days_of_week)?,
                habit.xp_reward,
                bool_to_int(habit.is_active),
                to_epoch_ms(habit.created_at),
            ],
        )?;

        Ok(habit.id)
    }

    fn get_habit_for_owner(
        &self,
        habit_id: HabitId,
        user_id: UserId,
    ) -> RepoResult<Option<Habit>> {
        let mut stmt = self.conn.prepare(&format!(
            "{HABIT_SELECT_SQL}
             WHERE id = ?1
               AND user_id = ?2;"
        ))?;
        let mut rows = stmt.query(params![habit_id.to_string(), user_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_habit_row(row)?));
        }
        Ok(None)
    }

    fn list_habits(&self, user_id: UserId, active_only: bool) -> RepoResult<Vec<Habit>> {
        let mut stmt = self.conn.prepare(&format!(
            "{HABIT_SELECT_SQL}
             WHERE user_id = ?1
               AND (?2 = 0 OR is_active = 1)
             ORDER BY created_at ASC, id ASC;"
        ))?;
        let mut rows = stmt.query(params![user_id.to_string(), bool_to_int(active_only)])?;
        let mut habits = Vec::new();
        while let Some(row) = rows.next()? {
            habits.push(parse_habit_row(row)?);
        }
        Ok(habits)
    }

    fn update_habit(&self, habit: &Habit) -> RepoResult<()> {
        habit
            .validate()
            .map_err(|err| RepoError::InvalidData(err.to_string()))?;

        let changed = self.conn.execute(
            "UPDATE habits
             SET
                name = ?1,
                description = ?2,
                reminder_time = ?3,
                days_of_week = ?4,
                xp_reward = ?5,
                is_active = ?6
             WHERE id = ?7
               AND user_id = ?8;",
            params![
                habit.name.as_str(),
                habit.description.as_deref(),
                habit.reminder_time,
                weekdays_to_db(&habit.days_of_week)?,
                habit.xp_reward,
                bool_to_int(habit.is_active),
                habit.id.to_string(),
                habit.user_id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "habit",
                id: habit.id,
            });
        }
        Ok(())
    }

    fn deactivate_habit(&self, habit_id: HabitId, user_id: UserId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE habits
             SET is_active = 0
             WHERE id = ?1
               AND user_id = ?2;",
            params![habit_id.to_string(), user_id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "habit",
                id: habit_id,
            });
        }
        Ok(())
    }

    fn count_active_habits(&self, user_id: UserId) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*)
             FROM habits
             WHERE user_id = ?1
               AND is_active = 1;",
            [user_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count.unsigned_abs())
    }
}

fn parse_habit_row(row: &Row<'_>) -> RepoResult<Habit> {
    let id_text: String = row.get("id")?;
    let user_id_text: String = row.get("user_id")?;
    let days_text: String = row.get("days_of_week")?;
    let days_of_week: Vec<u8> = serde_json::from_str(&days_text).map_err(|err| {
        RepoError::InvalidData(format!(
            "invalid days_of_week `{days_text}` in habits.days_of_week: {err}"
        ))
    })?;

    let is_active = match row.get::<_, i64>("is_active")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_active value `{other}` in habits.is_active"
            )));
        }
    };

    let habit = Habit {
        id: parse_uuid(&id_text, "habits.id")?,
        user_id: parse_uuid(&user_id_text, "habits.user_id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        reminder_time: row.get("reminder_time")?,
        days_of_week,
        xp_reward: row.get("xp_reward")?,
        is_active,
        created_at: from_epoch_ms(row.get("created_at")?, "habits.created_at")?,
    };
    habit
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("habit {id_text}: {err}")))?;
    Ok(habit)
}

fn weekdays_to_db(days: &[u8]) -> RepoResult<String> {
    serde_json::to_string(days)
        .map_err(|err| RepoError::InvalidData(format!("cannot encode days_of_week: {err}")))
}
