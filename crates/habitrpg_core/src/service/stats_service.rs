//! Read-only progression summary for one user.

use crate::clock::Clock;
use crate::model::user::UserId;
use crate::repo::store::HabitStore;
use crate::service::error::{GameError, GameResult};
use crate::service::streak::current_streak_from_days;
use log::debug;
use serde::{Deserialize, Serialize};

/// Snapshot of a user's RPG state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub level: u32,
    pub xp: u64,
    pub total_xp: u64,
    pub xp_to_next_level: u64,
    /// Active habits only.
    pub total_habits: u64,
    /// Distinct habits completed on the clock's today.
    pub completed_today: u64,
    pub current_streak: u32,
}

pub struct StatsService<S: HabitStore, C: Clock> {
    store: S,
    clock: C,
}

impl<S: HabitStore, C: Clock> StatsService<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    /// Builds the stats view from one consistent read. Never writes.
    pub fn stats(&self, user_id: UserId) -> GameResult<UserStats> {
        let today = self.clock.today();
        let stats = self.store.snapshot(|store| -> GameResult<_> {
            let user = store
                .get_user(user_id)?
                .ok_or_else(|| GameError::not_found("user", user_id))?;
            let days = store.list_completion_days(user_id)?;

            Ok(UserStats {
                level: user.progression.level,
                xp: user.progression.xp,
                total_xp: user.progression.total_xp,
                xp_to_next_level: user.progression.xp_to_next_level(),
                total_habits: store.count_active_habits(user_id)?,
                completed_today: store.count_completed_habits_on(user_id, today)?,
                current_streak: current_streak_from_days(today, days),
            })
        })?;

        debug!(
            "event=user_stats module=service status=ok level={} streak={}",
            stats.level, stats.current_streak
        );
        Ok(stats)
    }
}
