//! Current-streak derivation over completion history.
//!
//! # Invariants
//! - The walk starts at `today`; an empty today yields 0 even when
//!   yesterday had completions.
//! - The walk stops at the first empty day, so it costs O(streak) lookups.
//! - Which habit was completed is irrelevant; any completion counts.

use crate::clock::Day;
use std::collections::HashSet;
use std::convert::Infallible;

/// Counts consecutive days ending at `today` for which `has_completion_on`
/// answers `true`.
///
/// Lookup errors abort the walk and are returned unchanged.
pub fn current_streak<E>(
    today: Day,
    mut has_completion_on: impl FnMut(Day) -> Result<bool, E>,
) -> Result<u32, E> {
    let mut streak = 0;
    let mut day = today;

    while has_completion_on(day)? {
        streak += 1;
        match day.pred_opt() {
            Some(previous) => day = previous,
            None => break,
        }
    }

    Ok(streak)
}

/// Streak over an already loaded set of completion days.
pub fn current_streak_from_days(today: Day, days: impl IntoIterator<Item = Day>) -> u32 {
    let completed: HashSet<Day> = days.into_iter().collect();
    match current_streak(today, |day| Ok::<_, Infallible>(completed.contains(&day))) {
        Ok(streak) => streak,
        Err(never) => match never {},
    }
}
