//! Habit catalog use-cases.
//!
//! # Responsibility
//! - Create, read, list and edit habits on behalf of their owner.
//! - Soft-delete habits so completion history survives.
//!
//! # Invariants
//! - Every call is scoped to the owning user; foreign habits look missing.
//! - Weekdays are normalized (sorted, deduplicated) before persistence.

use crate::clock::Clock;
use crate::model::habit::{normalize_weekdays, Habit, HabitId, DEFAULT_XP_REWARD};
use crate::model::user::UserId;
use crate::repo::store::HabitStore;
use crate::service::error::{GameError, GameResult};
use chrono::NaiveTime;
use log::info;

/// Input for creating a habit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHabit {
    pub name: String,
    pub description: Option<String>,
    pub reminder_time: Option<NaiveTime>,
    /// Monday = 0 .. Sunday = 6.
    pub days_of_week: Vec<u8>,
    pub xp_reward: i64,
}

impl NewHabit {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            reminder_time: None,
            days_of_week: Vec::new(),
            xp_reward: DEFAULT_XP_REWARD,
        }
    }
}

/// Partial update; `None` leaves a field unchanged.
///
/// Nullable fields take `Some(None)` to clear the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HabitUpdate {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub reminder_time: Option<Option<NaiveTime>>,
    pub days_of_week: Option<Vec<u8>>,
    pub xp_reward: Option<i64>,
    pub is_active: Option<bool>,
}

pub struct HabitService<S: HabitStore, C: Clock> {
    store: S,
    clock: C,
}

impl<S: HabitStore, C: Clock> HabitService<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    /// Creates a habit for an existing user.
    pub fn create_habit(&self, user_id: UserId, request: NewHabit) -> GameResult<Habit> {
        if self.store.get_user(user_id)?.is_none() {
            return Err(GameError::not_found("user", user_id));
        }

        let mut habit = Habit::new(user_id, request.name, self.clock.now());
        habit.description = request.description;
        habit.reminder_time = request.reminder_time;
        habit.days_of_week = normalize_weekdays(&request.days_of_week);
        habit.xp_reward = request.xp_reward;
        habit
            .validate()
            .map_err(|err| GameError::Validation(err.to_string()))?;

        self.store.create_habit(&habit)?;
        info!(
            "event=habit_create module=service status=ok xp_reward={}",
            habit.xp_reward
        );
        Ok(habit)
    }

    pub fn get_habit(&self, user_id: UserId, habit_id: HabitId) -> GameResult<Habit> {
        self.store
            .get_habit_for_owner(habit_id, user_id)?
            .ok_or_else(|| GameError::not_found("habit", habit_id))
    }

    pub fn list_habits(&self, user_id: UserId, active_only: bool) -> GameResult<Vec<Habit>> {
        Ok(self.store.list_habits(user_id, active_only)?)
    }

    /// Applies a partial update and returns the stored result.
    pub fn update_habit(
        &self,
        user_id: UserId,
        habit_id: HabitId,
        update: HabitUpdate,
    ) -> GameResult<Habit> {
        let mut habit = self.get_habit(user_id, habit_id)?;

        if let Some(name) = update.name {
            habit.name = name.trim().to_string();
        }
        if let Some(description) = update.description {
            habit.description = description;
        }
        if let Some(reminder_time) = update.reminder_time {
            habit.reminder_time = reminder_time;
        }
        if let Some(days) = update.days_of_week {
            habit.days_of_week = normalize_weekdays(&days);
        }
        if let Some(xp_reward) = update.xp_reward {
            habit.xp_reward = xp_reward;
        }
        if let Some(is_active) = update.is_active {
            habit.is_active = is_active;
        }
        habit
            .validate()
            .map_err(|err| GameError::Validation(err.to_string()))?;

        self.store.update_habit(&habit)?;
        Ok(habit)
    }

    /// Soft-deletes a habit. Repeating the call is harmless.
    pub fn deactivate_habit(&self, user_id: UserId, habit_id: HabitId) -> GameResult<()> {
        self.store.deactivate_habit(habit_id, user_id)?;
        info!("event=habit_deactivate module=service status=ok");
        Ok(())
    }
}
