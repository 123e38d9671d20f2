//! Calendar-day normalization and the injectable time source.
//!
//! # Responsibility
//! - Provide the single `floor_to_day` truncation used for completion dates
//!   and streak anchoring.
//! - Abstract "now" behind `Clock` so day-sensitive logic is deterministic
//!   under test.
//!
//! # Invariants
//! - All days are UTC calendar days.
//! - Engine code never calls `Utc::now()` directly; it asks a `Clock`.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

/// A UTC calendar day with no time-of-day component.
pub type Day = NaiveDate;

/// Truncates a timestamp to the start of its UTC calendar day.
pub fn floor_to_day(timestamp: DateTime<Utc>) -> Day {
    timestamp.date_naive()
}

/// Source of the current instant.
pub trait Clock {
    /// Current wall-clock instant in UTC.
    fn now(&self) -> DateTime<Utc>;

    /// Current UTC calendar day.
    fn today(&self) -> Day {
        floor_to_day(self.now())
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Reads the operating system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always reports the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock {
    instant: DateTime<Utc>,
}

impl FixedClock {
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self { instant }
    }

    /// Fixed clock pinned to noon of `day`.
    pub fn at_day(day: Day) -> Self {
        Self::new(day.and_time(NaiveTime::MIN).and_utc() + Duration::hours(12))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.instant
    }
}

#[cfg(test)]
mod tests {
    use super::{floor_to_day, Clock, FixedClock};
    use chrono::{NaiveDate, TimeZone, Utc};

    #[test]
    fn floor_to_day_strips_time_of_day() {
        let late = Utc.with_ymd_and_hms(2024, 3, 9, 23, 59, 59).unwrap();
        let early = Utc.with_ymd_and_hms(2024, 3, 9, 0, 0, 0).unwrap();

        let expected = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(floor_to_day(late), expected);
        assert_eq!(floor_to_day(early), expected);
    }

    #[test]
    fn fixed_clock_today_uses_floor_to_day() {
        let day = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let clock = FixedClock::at_day(day);

        assert_eq!(clock.today(), day);
        assert_eq!((&clock).today(), day);
    }
}
