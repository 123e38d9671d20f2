//! Habit completion record.
//!
//! # Invariants
//! - `(user_id, habit_id, date)` is unique in storage.
//! - Records are immutable once written.

use crate::clock::Day;
use crate::model::habit::HabitId;
use crate::model::user::UserId;
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type CompletionId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitCompletion {
    pub id: CompletionId,
    pub habit_id: HabitId,
    /// Denormalized owner for per-user day queries.
    pub user_id: UserId,
    /// Calendar day the completion counts for.
    pub date: Day,
    /// Instant the completion was recorded.
    pub completed_at: DateTime<Utc>,
}

impl HabitCompletion {
    pub fn new(habit_id: HabitId, user_id: UserId, date: Day, completed_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            habit_id,
            user_id,
            date,
            completed_at: completed_at.trunc_subsecs(3),
        }
    }
}
