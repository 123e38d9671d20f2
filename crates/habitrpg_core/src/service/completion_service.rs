//! Completion recorder and completion history.
//!
//! # Responsibility
//! - Record at most one completion per habit, user and calendar day.
//! - Pay the habit's XP reward through the progression ledger.
//! - List recent completions for a user.
//!
//! # Invariants
//! - The completion insert and the user progression update commit together
//!   or not at all.
//! - A duplicate day, whether caught by the pre-check or by the unique index,
//!   surfaces as `GameError::AlreadyCompleted` and mutates nothing.

use crate::clock::{floor_to_day, Clock};
use crate::model::completion::HabitCompletion;
use crate::model::habit::HabitId;
use crate::model::user::UserId;
use crate::repo::store::{HabitStore, RepoError};
use crate::service::error::{GameError, GameResult};
use chrono::{DateTime, Utc};
use log::{info, warn};
use std::time::Instant;

const COMPLETIONS_DEFAULT_LIMIT: u32 = 100;
const COMPLETIONS_LIMIT_MAX: u32 = 500;

pub struct CompletionService<S: HabitStore, C: Clock> {
    store: S,
    clock: C,
}

impl<S: HabitStore, C: Clock> CompletionService<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    /// Records one completion of `habit_id` by `user_id`.
    ///
    /// `date` is truncated to its UTC day; `None` means the clock's today.
    ///
    /// # Errors
    /// - `NotFound` when the user is missing or does not own the habit.
    /// - `AlreadyCompleted` when the day is already recorded.
    /// - `InvalidReward` when the stored reward cannot be applied.
    pub fn record(
        &self,
        user_id: UserId,
        habit_id: HabitId,
        date: Option<DateTime<Utc>>,
    ) -> GameResult<HabitCompletion> {
        let started_at = Instant::now();
        let day = floor_to_day(date.unwrap_or_else(|| self.clock.now()));

        let result = self.store.atomically(|store| -> GameResult<_> {
            let user = store
                .get_user(user_id)?
                .ok_or_else(|| GameError::not_found("user", user_id))?;
            let habit = store
                .get_habit_for_owner(habit_id, user_id)?
                .ok_or_else(|| GameError::not_found("habit", habit_id))?;

            let already_completed = GameError::AlreadyCompleted {
                habit_id,
                date: day,
            };
            if store.find_completion(user_id, habit_id, day)?.is_some() {
                return Err(already_completed);
            }

            let completion = HabitCompletion::new(habit.id, user.id, day, self.clock.now());
            store
                .insert_completion(&completion)
                .map_err(|err| match err {
                    RepoError::Conflict(_) => already_completed,
                    other => GameError::from(other),
                })?;

            let progression = user.progression.award(habit.xp_reward)?;
            store.update_progression(user.id, &progression)?;

            Ok((completion, user.progression.level, progression.level))
        });

        match result {
            Ok((completion, level_before, level_after)) => {
                info!(
                    "event=habit_complete module=service status=ok duration_ms={} level_before={} level_after={}",
                    started_at.elapsed().as_millis(),
                    level_before,
                    level_after
                );
                Ok(completion)
            }
            Err(err) => {
                warn!(
                    "event=habit_complete module=service status=error duration_ms={} error_code={}",
                    started_at.elapsed().as_millis(),
                    err.code()
                );
                Err(err)
            }
        }
    }

    /// Lists the user's completions, newest `completed_at` first.
    ///
    /// `limit` defaults to 100 (also for `Some(0)`) and is clamped to 500.
    pub fn list_completions(
        &self,
        user_id: UserId,
        limit: Option<u32>,
    ) -> GameResult<Vec<HabitCompletion>> {
        if self.store.get_user(user_id)?.is_none() {
            return Err(GameError::not_found("user", user_id));
        }
        Ok(self
            .store
            .list_completions(user_id, normalize_completions_limit(limit))?)
    }
}

/// Normalizes completion history limit.
pub fn normalize_completions_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) | None => COMPLETIONS_DEFAULT_LIMIT,
        Some(value) => value.min(COMPLETIONS_LIMIT_MAX),
    }
}
