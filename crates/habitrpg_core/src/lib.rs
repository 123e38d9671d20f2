//! Gamification engine for HabitRPG.
//! Owns the rules for XP, levels, streaks and daily completions.

pub mod clock;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use clock::{floor_to_day, Clock, Day, FixedClock, SystemClock};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::completion::{CompletionId, HabitCompletion};
pub use model::habit::{
    Habit, HabitId, HabitValidationError, DEFAULT_XP_REWARD, MAX_XP_REWARD,
};
pub use model::progression::{
    level_threshold, Progression, ProgressionError, MAX_XP_COUNTER, XP_PER_LEVEL,
};
pub use model::user::{User, UserId, UserValidationError};
pub use repo::completion_repo::CompletionRepository;
pub use repo::habit_repo::HabitRepository;
pub use repo::store::{HabitStore, RepoError, RepoResult, SqliteStore, Transactional};
pub use repo::user_repo::UserRepository;
pub use service::completion_service::CompletionService;
pub use service::error::{GameError, GameResult};
pub use service::habit_service::{HabitService, HabitUpdate, NewHabit};
pub use service::stats_service::{StatsService, UserStats};
pub use service::streak::{current_streak, current_streak_from_days};
pub use service::user_service::UserService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
