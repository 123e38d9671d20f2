//! SQLite-backed store shared by all habit repositories.
//!
//! # Responsibility
//! - Hold the connection every repository trait is implemented on.
//! - Provide the transactional boundaries (`Transactional::atomically`,
//!   `Transactional::snapshot`).
//! - Verify the connection was bootstrapped before any query runs.
//!
//! # Invariants
//! - A store is only constructed over a connection at the latest schema.
//! - A failed atomic unit leaves no partial writes behind.
//! - Timestamps are stored as epoch milliseconds, days as `YYYY-MM-DD`.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::repo::completion_repo::CompletionRepository;
use crate::repo::habit_repo::HabitRepository;
use crate::repo::user_repo::UserRepository;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const REQUIRED_COLUMNS: &[(&str, &[&str])] = &[
    (
        "users",
        &["id", "username", "email", "level", "xp", "total_xp", "created_at"],
    ),
    (
        "habits",
        &[
            "id",
            "user_id",
            "name",
            "description",
            "reminder_time",
            "days_of_week",
            "xp_reward",
            "is_active",
            "created_at",
        ],
    ),
    (
        "habit_completions",
        &["id", "habit_id", "user_id", "date", "completed_at"],
    ),
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence error shared by user, habit and completion repositories.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Row addressed by an update does not exist (or is not owned by the caller).
    NotFound { entity: &'static str, id: Uuid },
    /// A unique constraint rejected the write; carries the failing columns.
    Conflict(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted row cannot be turned back into a valid model.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Conflict(columns) => write!(f, "unique constraint failed: {columns}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "habit store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "habit store requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "habit store requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        match unique_violation(&value) {
            Some(columns) => Self::Conflict(columns.to_string()),
            None => Self::Db(DbError::Sqlite(value)),
        }
    }
}

/// Transactional boundary around a group of repository calls.
pub trait Transactional {
    /// Runs `work` as a single atomic unit.
    ///
    /// Commits when `work` returns `Ok`; rolls back every write made inside
    /// `work` when it returns `Err`. Units do not nest.
    fn atomically<T, E>(&self, work: impl FnOnce(&Self) -> Result<T, E>) -> Result<T, E>
    where
        E: From<RepoError>;

    /// Runs read-only `work` against one consistent view of storage.
    ///
    /// Writers on other connections cannot commit until `work` returns.
    fn snapshot<T, E>(&self, work: impl FnOnce(&Self) -> Result<T, E>) -> Result<T, E>
    where
        E: From<RepoError>;
}

/// Everything the engine needs from storage, behind one bound.
pub trait HabitStore:
    UserRepository + HabitRepository + CompletionRepository + Transactional
{
}

impl<T> HabitStore for T where
    T: UserRepository + HabitRepository + CompletionRepository + Transactional
{
}

/// SQLite implementation of every habit repository trait.
///
/// Cheap to copy; services each hold their own handle to the same connection.
#[derive(Clone, Copy)]
pub struct SqliteStore<'conn> {
    pub(crate) conn: &'conn Connection,
}

impl<'conn> SqliteStore<'conn> {
    /// Wraps a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when the schema version is not current.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` on a foreign schema.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl Transactional for SqliteStore<'_> {
    fn atomically<T, E>(&self, work: impl FnOnce(&Self) -> Result<T, E>) -> Result<T, E>
    where
        E: From<RepoError>,
    {
        // IMMEDIATE takes the write lock up front so check-then-insert cannot
        // interleave with another writer.
        self.in_transaction(TransactionBehavior::Immediate, work)
    }

    fn snapshot<T, E>(&self, work: impl FnOnce(&Self) -> Result<T, E>) -> Result<T, E>
    where
        E: From<RepoError>,
    {
        self.in_transaction(TransactionBehavior::Deferred, work)
    }
}

impl SqliteStore<'_> {
    fn in_transaction<T, E>(
        &self,
        behavior: TransactionBehavior,
        work: impl FnOnce(&Self) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<RepoError>,
    {
        let tx = Transaction::new_unchecked(self.conn, behavior).map_err(RepoError::from)?;
        let value = work(self)?;
        tx.commit().map_err(RepoError::from)?;
        Ok(value)
    }
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for (table, columns) in REQUIRED_COLUMNS {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(*table));
        }
        for column in *columns {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn {
                    table: *table,
                    column: *column,
                });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

fn unique_violation(err: &rusqlite::Error) -> Option<&str> {
    match err {
        rusqlite::Error::SqliteFailure(code, Some(message))
            if code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
        {
            Some(
                message
                    .strip_prefix("UNIQUE constraint failed: ")
                    .unwrap_or(message.as_str()),
            )
        }
        _ => None,
    }
}

pub(crate) fn to_epoch_ms(timestamp: DateTime<Utc>) -> i64 {
    timestamp.timestamp_millis()
}

pub(crate) fn from_epoch_ms(value: i64, column: &str) -> RepoResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(value)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid timestamp `{value}` in {column}")))
}

pub(crate) fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
