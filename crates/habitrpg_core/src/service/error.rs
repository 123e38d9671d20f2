//! Error taxonomy surfaced by engine operations.
//!
//! Every variant is local and non-retryable. Transport layers map them 1:1
//! onto their own status codes.

use crate::clock::Day;
use crate::model::habit::HabitId;
use crate::model::progression::ProgressionError;
use crate::repo::store::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type GameResult<T> = Result<T, GameError>;

#[derive(Debug)]
pub enum GameError {
    /// User or habit does not resolve, or the habit belongs to someone else.
    NotFound { entity: &'static str, id: Uuid },
    /// The habit already has a completion for this user on this day.
    AlreadyCompleted { habit_id: HabitId, date: Day },
    /// Negative or overflowing XP reward reached the ledger.
    InvalidReward(i64),
    /// Input failed model validation.
    Validation(String),
    EmailTaken(String),
    UsernameTaken(String),
    Repo(RepoError),
}

impl GameError {
    pub(crate) fn not_found(entity: &'static str, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }

    /// Stable machine-readable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::AlreadyCompleted { .. } => "already_completed",
            Self::InvalidReward(_) => "invalid_reward",
            Self::Validation(_) => "validation",
            Self::EmailTaken(_) => "email_taken",
            Self::UsernameTaken(_) => "username_taken",
            Self::Repo(_) => "repo",
        }
    }
}

impl Display for GameError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::AlreadyCompleted { habit_id, date } => {
                write!(f, "habit {habit_id} already completed on {date}")
            }
            Self::InvalidReward(amount) => write!(f, "invalid xp reward: {amount}"),
            Self::Validation(message) => write!(f, "validation failed: {message}"),
            Self::EmailTaken(email) => write!(f, "email already registered: {email}"),
            Self::UsernameTaken(username) => write!(f, "username already taken: {username}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for GameError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for GameError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            other => Self::Repo(other),
        }
    }
}

impl From<ProgressionError> for GameError {
    fn from(value: ProgressionError) -> Self {
        match value {
            ProgressionError::InvalidReward(amount) => Self::InvalidReward(amount),
            invalid_state @ ProgressionError::InvalidState { .. } => {
                Self::Repo(RepoError::InvalidData(invalid_state.to_string()))
            }
        }
    }
}
