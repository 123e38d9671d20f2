//! User registration and lookup.
//!
//! # Invariants
//! - Email and username are unique; collisions surface as `EmailTaken` /
//!   `UsernameTaken`, never as raw storage errors.
//! - New users start at level 1 with zero XP.

use crate::clock::Clock;
use crate::model::user::{User, UserId};
use crate::repo::store::{HabitStore, RepoError};
use crate::service::error::{GameError, GameResult};
use log::info;

pub struct UserService<S: HabitStore, C: Clock> {
    store: S,
    clock: C,
}

impl<S: HabitStore, C: Clock> UserService<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    /// Registers a new user.
    ///
    /// # Errors
    /// - `Validation` for an empty username or malformed email.
    /// - `EmailTaken` / `UsernameTaken` on collisions.
    pub fn register(&self, username: &str, email: &str) -> GameResult<User> {
        let user = User::new(username, email, self.clock.now());
        user.validate()
            .map_err(|err| GameError::Validation(err.to_string()))?;

        self.store.create_user(&user).map_err(|err| match err {
            RepoError::Conflict(columns) if columns.contains("users.email") => {
                GameError::EmailTaken(user.email.clone())
            }
            RepoError::Conflict(columns) if columns.contains("users.username") => {
                GameError::UsernameTaken(user.username.clone())
            }
            other => GameError::from(other),
        })?;

        info!("event=user_register module=service status=ok");
        Ok(user)
    }

    pub fn get_user(&self, user_id: UserId) -> GameResult<User> {
        self.store
            .get_user(user_id)?
            .ok_or_else(|| GameError::not_found("user", user_id))
    }

    /// Resolves a user by exact username. Returns `None` when absent.
    pub fn find_by_username(&self, username: &str) -> GameResult<Option<User>> {
        Ok(self.store.find_user_by_username(username)?)
    }
}
