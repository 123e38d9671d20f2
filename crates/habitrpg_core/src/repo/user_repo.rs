//! User repository contract and SQLite implementation.
//!
//! # Invariants
//! - Writes call `User::validate()` first.
//! - Reads reject rows whose progression breaks ledger invariants.

use crate::model::progression::Progression;
use crate::model::user::{User, UserId};
use crate::repo::store::{
    from_epoch_ms, parse_uuid, to_epoch_ms, RepoError, RepoResult, SqliteStore,
};
use rusqlite::{params, OptionalExtension, Row};

const USER_SELECT_SQL: &str = "SELECT
    id,
    username,
    email,
    level,
    xp,
    total_xp,
    created_at
FROM users";

pub trait UserRepository {
    fn create_user(&self, user: &User) -> RepoResult<UserId>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    fn find_user_by_username(&self, username: &str) -> RepoResult<Option<User>>;
    /// Overwrites the stored level, xp and total_xp for one user.
    fn update_progression(&self, id: UserId, progression: &Progression) -> RepoResult<()>;
}

impl UserRepository for SqliteStore<'_> {
    fn create_user(&self, user: &User) -> RepoResult<UserId> {
        user.validate()
            .map_err(|err| RepoError::InvalidData(err.to_string()))?;

        self.conn.execute(
            "INSERT INTO users (
                id,
                username,
                email,
                level,
                xp,
                total_xp,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                user.id.to_string(),
                user.username.as_str(),
                user.email.as_str(),
                i64::from(user.progression.level),
                counter_to_db(user.progression.xp)?,
                counter_to_db(user.progression.total_xp)?,
                to_epoch_ms(user.created_at),
            ],
        )?;

        Ok(user.id)
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }
        Ok(None)
    }

    fn find_user_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let id_text: Option<String> = self
            .conn
            .query_row(
                "SELECT id FROM users WHERE username = ?1;",
                [username.trim()],
                |row| row.get(0),
            )
            .optional()?;

        match id_text {
            Some(value) => self.get_user(parse_uuid(&value, "users.id")?),
            None => Ok(None),
        }
    }

    fn update_progression(&self, id: UserId, progression: &Progression) -> RepoResult<()> {
        progression
            .validate()
            .map_err(|err| RepoError::InvalidData(err.to_string()))?;

        let changed = self.conn.execute(
            "UPDATE users
             SET
                level = ?1,
                xp = ?2,
                total_xp = ?3
             WHERE id = ?4;",
            params![
                i64::from(progression.level),
                counter_to_db(progression.xp)?,
                counter_to_db(progression.total_xp)?,
                id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound { entity: "user", id });
        }
        Ok(())
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let id_text: String = row.get("id")?;
    let level: i64 = row.get("level")?;
    let xp: i64 = row.get("xp")?;
    let total_xp: i64 = row.get("total_xp")?;

    let progression = Progression {
        level: u32::try_from(level)
            .map_err(|_| RepoError::InvalidData(format!("invalid level `{level}` in users.level")))?,
        xp: counter_from_db(xp, "users.xp")?,
        total_xp: counter_from_db(total_xp, "users.total_xp")?,
    };

    let user = User {
        id: parse_uuid(&id_text, "users.id")?,
        username: row.get("username")?,
        email: row.get("email")?,
        progression,
        created_at: from_epoch_ms(row.get("created_at")?, "users.created_at")?,
    };
    user.validate()
        .map_err(|err| RepoError::InvalidData(format!("user {id_text}: {err}")))?;
    Ok(user)
}

fn counter_to_db(value: u64) -> RepoResult<i64> {
    i64::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("xp counter `{value}` exceeds storage range")))
}

fn counter_from_db(value: i64, column: &str) -> RepoResult<u64> {
    u64::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid counter `{value}` in {column}")))
}
