//! Completion repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Insert immutable completion records.
//! - Answer the per-user, per-day questions asked by streak and stats.
//!
//! # Invariants
//! - `(user_id, habit_id, date)` is unique; a second insert is a conflict.
//! - No update or delete path exists for completions.

use crate::clock::Day;
use crate::model::completion::HabitCompletion;
use crate::model::habit::HabitId;
use crate::model::user::UserId;
use crate::repo::store::{from_epoch_ms, parse_uuid, to_epoch_ms, RepoResult, SqliteStore};
use rusqlite::{params, Row};

const COMPLETION_SELECT_SQL: &str = "SELECT
    id,
    habit_id,
    user_id,
    date,
    completed_at
FROM habit_completions";

pub trait CompletionRepository {
    fn find_completion(
        &self,
        user_id: UserId,
        habit_id: HabitId,
        date: Day,
    ) -> RepoResult<Option<HabitCompletion>>;
    /// Fails with `RepoError::Conflict` when the day is already taken.
    fn insert_completion(&self, completion: &HabitCompletion) -> RepoResult<()>;
    /// Number of distinct habits the user completed on `date`.
    fn count_completed_habits_on(&self, user_id: UserId, date: Day) -> RepoResult<u64>;
    /// Distinct completion days, newest first.
    fn list_completion_days(&self, user_id: UserId) -> RepoResult<Vec<Day>>;
    /// Most recent completions first, at most `limit` rows.
    fn list_completions(&self, user_id: UserId, limit: u32) -> RepoResult<Vec<HabitCompletion>>;
}

impl CompletionRepository for SqliteStore<'_> {
    fn find_completion(
        &self,
        user_id: UserId,
        habit_id: HabitId,
        date: Day,
    ) -> RepoResult<Option<HabitCompletion>> {
        let mut stmt = self.conn.prepare(&format!(
            "{COMPLETION_SELECT_SQL}
             WHERE user_id = ?1
               AND habit_id = ?2
               AND date = ?3;"
        ))?;
        let mut rows = stmt.query(params![user_id.to_string(), habit_id.to_string(), date])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_completion_row(row)?));
        }
        Ok(None)
    }

    fn insert_completion(&self, completion: &HabitCompletion) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO habit_completions (
                id,
                habit_id,
                user_id,
                date,
                completed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                completion.id.to_string(),
                completion.habit_id.to_string(),
                completion.user_id.to_string(),
                completion.date,
                to_epoch_ms(completion.completed_at),
            ],
        )?;
        Ok(())
    }

    fn count_completed_habits_on(&self, user_id: UserId, date: Day) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(DISTINCT habit_id)
             FROM habit_completions
             WHERE user_id = ?1
               AND date = ?2;",
            params![user_id.to_string(), date],
            |row| row.get(0),
        )?;
        Ok(count.unsigned_abs())
    }

    fn list_completion_days(&self, user_id: UserId) -> RepoResult<Vec<Day>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT date
             FROM habit_completions
             WHERE user_id = ?1
             ORDER BY date DESC;",
        )?;
        let mut rows = stmt.query([user_id.to_string()])?;
        let mut days = Vec::new();
        while let Some(row) = rows.next()? {
            days.push(row.get(0)?);
        }
        Ok(days)
    }

    fn list_completions(&self, user_id: UserId, limit: u32) -> RepoResult<Vec<HabitCompletion>> {
        let mut stmt = self.conn.prepare(&format!(
            "{COMPLETION_SELECT_SQL}
             WHERE user_id = ?1
             ORDER BY completed_at DESC, id ASC
             LIMIT ?2;"
        ))?;
        let mut rows = stmt.query(params![user_id.to_string(), i64::from(limit)])?;
        let mut completions = Vec::new();
        while let Some(row) = rows.next()? {
            completions.push(parse_completion_row(row)?);
        }
        Ok(completions)
    }
}

fn parse_completion_row(row: &Row<'_>) -> RepoResult<HabitCompletion> {
    let id_text: String = row.get("id")?;
    let habit_id_text: String = row.get("habit_id")?;
    let user_id_text: String = row.get("user_id")?;

    Ok(HabitCompletion {
        id: parse_uuid(&id_text, "habit_completions.id")?,
        habit_id: parse_uuid(&habit_id_text, "habit_completions.habit_id")?,
        user_id: parse_uuid(&user_id_text, "habit_completions.user_id")?,
        date: row.get("date")?,
        completed_at: from_epoch_ms(row.get("completed_at")?, "habit_completions.completed_at")?,
    })
}
