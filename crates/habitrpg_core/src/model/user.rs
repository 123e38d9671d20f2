//! User domain model.
//!
//! # Responsibility
//! - Carry identity plus the progression counters owned by the ledger.
//!
//! # Invariants
//! - `username` is non-empty after trimming.
//! - `email` has a `local@domain.tld` shape.
//! - `progression` satisfies `Progression::validate()`.

use crate::model::progression::{Progression, ProgressionError};
use chrono::{DateTime, SubsecRound, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

pub type UserId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyUsername,
    InvalidEmail(String),
    Progression(ProgressionError),
}

impl Display for UserValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyUsername => write!(f, "username cannot be empty"),
            Self::InvalidEmail(value) => write!(f, "invalid email address `{value}`"),
            Self::Progression(err) => write!(f, "{err}"),
        }
    }
}

impl Error for UserValidationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Progression(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ProgressionError> for UserValidationError {
    fn from(value: ProgressionError) -> Self {
        Self::Progression(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    #[serde(flatten)]
    pub progression: Progression,
    /// Millisecond precision, matching storage.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Creates a level-1 user with a generated id.
    ///
    /// Username and email are trimmed but not validated here; see `validate`.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into().trim().to_string(),
            email: email.into().trim().to_string(),
            progression: Progression::new(),
            created_at: created_at.trunc_subsecs(3),
        }
    }

    pub fn validate(&self) -> Result<(), UserValidationError> {
        if self.username.trim().is_empty() {
            return Err(UserValidationError::EmptyUsername);
        }
        if !EMAIL_RE.is_match(&self.email) {
            return Err(UserValidationError::InvalidEmail(self.email.clone()));
        }
        self.progression.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{User, UserValidationError};
    use chrono::Utc;

    #[test]
    fn new_user_starts_at_level_one() {
        let user = User::new("  quester ", "q@example.com", Utc::now());
        assert_eq!(user.username, "quester");
        assert_eq!(user.progression.level, 1);
        assert_eq!(user.progression.xp, 0);
        assert_eq!(user.progression.total_xp, 0);
        user.validate().unwrap();
    }

    #[test]
    fn validate_rejects_bad_identity_fields() {
        let blank = User::new("   ", "q@example.com", Utc::now());
        assert_eq!(blank.validate(), Err(UserValidationError::EmptyUsername));

        let bad_email = User::new("quester", "not-an-email", Utc::now());
        assert!(matches!(
            bad_email.validate(),
            Err(UserValidationError::InvalidEmail(_))
        ));
    }
}
