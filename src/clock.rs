//! Time source shared by the cache, the rate limiter and the query engine
//!
//! Freshness and cooldown checks read the current time through the [`Clock`]
//! trait so tests can move time forward without sleeping.

use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use std::fmt::Debug;
use std::sync::Mutex;

/// Provides the current instant and the current calendar date
pub trait Clock: Debug + Send + Sync {
    /// Current instant
    fn now(&self) -> DateTime<Utc>;

    /// Current calendar date used to resolve "today"
    fn today(&self) -> NaiveDate;

    /// Current instant as Unix seconds
    fn epoch_secs(&self) -> i64 {
        self.now().timestamp()
    }
}

/// Wall clock; "today" follows the local timezone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock that only moves when told to
///
/// "today" is the UTC date of the held instant.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Creates a clock frozen at `now`
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Creates a clock frozen at midday of the given date
    pub fn at_date(date: NaiveDate) -> Self {
        let noon = date
            .and_hms_opt(12, 0, 0)
            .unwrap_or_default()
            .and_utc();
        Self::new(noon)
    }

    /// Moves the clock forward by `secs` seconds
    pub fn advance(&self, secs: i64) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += Duration::seconds(secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::at_date(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        let start = clock.epoch_secs();

        clock.advance(90);

        assert_eq!(clock.epoch_secs() - start, 90);
    }

    #[test]
    fn test_manual_clock_today_rolls_over_midnight() {
        let clock = ManualClock::at_date(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());

        // noon + 12h lands exactly on the next midnight
        clock.advance(12 * 3600);

        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2025, 6, 2).unwrap());
    }
}
