//! Progression ledger: XP accrual and level-up resolution.
//!
//! # Responsibility
//! - Turn an XP award into the next `(level, xp, total_xp)` state.
//!
//! # Invariants
//! - `level >= 1`.
//! - `xp < level * XP_PER_LEVEL` after every award.
//! - `total_xp` never decreases and equals the sum of all awards.
//!
//! The ledger is pure. Callers persist the returned state.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// XP needed per level step; level `n` needs `n * XP_PER_LEVEL` to advance.
pub const XP_PER_LEVEL: u64 = 100;

/// Largest value `xp` and `total_xp` may hold; storage keeps them as `i64`.
pub const MAX_XP_COUNTER: u64 = i64::MAX as u64;

/// Errors raised by ledger arithmetic or state checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressionError {
    /// Reward is negative or would overflow the counters.
    InvalidReward(i64),
    /// Persisted state breaks the ledger invariants.
    InvalidState { level: u32, xp: u64 },
}

impl Display for ProgressionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidReward(amount) => write!(f, "invalid xp reward: {amount}"),
            Self::InvalidState { level, xp } => {
                write!(f, "invalid progression state: level={level} xp={xp}")
            }
        }
    }
}

impl Error for ProgressionError {}

/// RPG progression counters carried by every user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progression {
    pub level: u32,
    /// Progress inside the current level.
    pub xp: u64,
    /// Lifetime XP, never reset.
    pub total_xp: u64,
}

impl Default for Progression {
    fn default() -> Self {
        Self::new()
    }
}

impl Progression {
    /// Starting state for a freshly registered user.
    pub const fn new() -> Self {
        Self {
            level: 1,
            xp: 0,
            total_xp: 0,
        }
    }

    /// Applies one XP award and resolves any level-ups it triggers.
    ///
    /// The threshold is re-evaluated after every level gained, so a single
    /// large award can cross several levels. `amount == 0` returns `self`.
    ///
    /// # Errors
    /// - `InvalidReward` when `amount` is negative or a counter would overflow.
    pub fn award(self, amount: i64) -> Result<Self, ProgressionError> {
        let gained = u64::try_from(amount).map_err(|_| ProgressionError::InvalidReward(amount))?;
        if gained == 0 {
            return Ok(self);
        }

        let overflow = || ProgressionError::InvalidReward(amount);
        let accrue = |counter: u64| {
            counter
                .checked_add(gained)
                .filter(|sum| *sum <= MAX_XP_COUNTER)
                .ok_or_else(overflow)
        };
        let mut next = Self {
            level: self.level,
            xp: accrue(self.xp)?,
            total_xp: accrue(self.total_xp)?,
        };

        let mut needed = level_threshold(next.level);
        while next.xp >= needed {
            next.xp -= needed;
            next.level = next.level.checked_add(1).ok_or_else(overflow)?;
            needed = level_threshold(next.level);
        }

        Ok(next)
    }

    /// XP still missing before the next level-up.
    pub fn xp_to_next_level(&self) -> u64 {
        level_threshold(self.level).saturating_sub(self.xp)
    }

    /// Checks the ledger invariants on state loaded from elsewhere.
    pub fn validate(&self) -> Result<(), ProgressionError> {
        if self.level == 0 || self.xp >= level_threshold(self.level) {
            return Err(ProgressionError::InvalidState {
                level: self.level,
                xp: self.xp,
            });
        }
        Ok(())
    }
}

/// XP required to leave `level`.
pub fn level_threshold(level: u32) -> u64 {
    u64::from(level) * XP_PER_LEVEL
}

#[cfg(test)]
mod tests {
    use super::{level_threshold, Progression, ProgressionError, MAX_XP_COUNTER};

    fn state(level: u32, xp: u64, total_xp: u64) -> Progression {
        Progression {
            level,
            xp,
            total_xp,
        }
    }

    #[test]
    fn zero_award_is_a_no_op() {
        let start = state(3, 42, 342);
        assert_eq!(start.award(0).unwrap(), start);
    }

    #[test]
    fn award_below_threshold_only_accrues() {
        let next = Progression::new().award(60).unwrap();
        assert_eq!(next, state(1, 60, 60));
    }

    #[test]
    fn exact_threshold_advances_one_level_and_resets_xp() {
        let start = state(4, 150, 750);
        let next = start.award(250).unwrap();
        assert_eq!(next, state(5, 0, 1000));
    }

    #[test]
    fn double_threshold_advances_two_levels() {
        let start = state(2, 30, 130);
        // 170 closes level 2, another 300 closes level 3.
        let next = start.award(170 + 300).unwrap();
        assert_eq!(next.level, 4);
        assert_eq!(next.xp, 0);
        assert_eq!(next.total_xp, 600);
    }

    #[test]
    fn negative_reward_is_rejected() {
        let err = Progression::new().award(-5).unwrap_err();
        assert_eq!(err, ProgressionError::InvalidReward(-5));
    }

    #[test]
    fn overflowing_reward_is_rejected() {
        let start = state(1, 0, u64::MAX - 1);
        assert!(matches!(
            start.award(10),
            Err(ProgressionError::InvalidReward(10))
        ));
    }

    #[test]
    fn total_xp_stays_within_storage_range() {
        let start = state(1, 0, MAX_XP_COUNTER - 10);
        assert_eq!(
            start.award(50).unwrap_err(),
            ProgressionError::InvalidReward(50)
        );

        let at_limit = start.award(10).unwrap();
        assert_eq!(at_limit.total_xp, MAX_XP_COUNTER);
        assert_eq!(at_limit.xp, 10);
    }

    #[test]
    fn invariants_hold_over_a_sequence_of_awards() {
        let awards = [0_i64, 5, 95, 250, 1, 999, 10_000, 37, 100, 0, 420];
        let mut current = Progression::new();
        for amount in awards {
            current = current.award(amount).unwrap();
            assert!(current.level >= 1);
            assert!(current.xp < level_threshold(current.level));
            current.validate().unwrap();
        }
        assert_eq!(current.total_xp, awards.iter().sum::<i64>() as u64);
    }

    #[test]
    fn xp_to_next_level_is_remaining_threshold() {
        assert_eq!(state(1, 60, 60).xp_to_next_level(), 40);
        assert_eq!(state(2, 20, 120).xp_to_next_level(), 180);
    }

    #[test]
    fn validate_rejects_out_of_range_state() {
        assert!(state(0, 0, 0).validate().is_err());
        assert!(state(2, 200, 300).validate().is_err());
        assert!(state(2, 199, 299).validate().is_ok());
    }
}
