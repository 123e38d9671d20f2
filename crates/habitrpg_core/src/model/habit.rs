//! Habit domain model.
//!
//! # Responsibility
//! - Describe a recurring habit and the XP it pays out.
//! - Provide soft-delete helpers; habits are deactivated, never removed.
//!
//! # Invariants
//! - `name` is non-empty after trimming.
//! - `0 < xp_reward <= MAX_XP_REWARD`.
//! - `days_of_week` is sorted, unique and within `0..=6` (Monday = 0).
//! - `reminder_time` and `days_of_week` are stored metadata only.

use crate::model::user::UserId;
use chrono::{DateTime, NaiveTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Reward used when the caller does not pick one.
pub const DEFAULT_XP_REWARD: i64 = 10;

/// Upper bound on a single habit's reward.
pub const MAX_XP_REWARD: i64 = 1_000_000;

const MAX_WEEKDAY: u8 = 6;

pub type HabitId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HabitValidationError {
    EmptyName,
    NonPositiveReward(i64),
    RewardTooLarge(i64),
    InvalidWeekday(u8),
}

impl Display for HabitValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "habit name cannot be empty"),
            Self::NonPositiveReward(value) => {
                write!(f, "habit xp_reward must be positive, got {value}")
            }
            Self::RewardTooLarge(value) => {
                write!(f, "habit xp_reward {value} exceeds {MAX_XP_REWARD}")
            }
            Self::InvalidWeekday(value) => {
                write!(f, "weekday {value} is out of range 0..={MAX_WEEKDAY}")
            }
        }
    }
}

impl Error for HabitValidationError {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Habit {
    pub id: HabitId,
    pub user_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub reminder_time: Option<NaiveTime>,
    pub days_of_week: Vec<u8>,
    pub xp_reward: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Habit {
    /// Creates an active habit with the default reward.
    pub fn new(user_id: UserId, name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            name: name.into().trim().to_string(),
            description: None,
            reminder_time: None,
            days_of_week: Vec::new(),
            xp_reward: DEFAULT_XP_REWARD,
            is_active: true,
            created_at: created_at.trunc_subsecs(3),
        }
    }

    pub fn validate(&self) -> Result<(), HabitValidationError> {
        if self.name.trim().is_empty() {
            return Err(HabitValidationError::EmptyName);
        }
        if self.xp_reward <= 0 {
            return Err(HabitValidationError::NonPositiveReward(self.xp_reward));
        }
        if self.xp_reward > MAX_XP_REWARD {
            return Err(HabitValidationError::RewardTooLarge(self.xp_reward));
        }
        if let Some(day) = self.days_of_week.iter().find(|day| **day > MAX_WEEKDAY) {
            return Err(HabitValidationError::InvalidWeekday(*day));
        }
        Ok(())
    }

    /// Marks the habit inactive. Completion history is untouched.
    pub fn deactivate(&mut self) {
        self.is_active = false;
    }
}

/// Sorts and deduplicates weekday indexes.
pub fn normalize_weekdays(days: &[u8]) -> Vec<u8> {
    days.iter().copied().collect::<BTreeSet<_>>().into_iter().collect()
}
