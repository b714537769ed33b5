//! Settable clock for tests and replays.

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, Utc};
use mockable::Clock;
use std::sync::{Arc, PoisonError, RwLock};

/// Clock that only moves when told to.
///
/// Clones share the same instant, so a test can hold one handle while the
/// services under test hold others.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<RwLock<DateTime<Utc>>>,
}

impl ManualClock {
    /// Creates a clock fixed at `now`.
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(RwLock::new(now)),
        }
    }

    /// Creates a clock fixed at midnight UTC on `date`.
    #[must_use]
    pub fn on(date: NaiveDate) -> Self {
        Self::new(date.and_time(NaiveTime::MIN).and_utc())
    }

    /// Returns the current instant.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.now
            .read()
            .map_or_else(|poisoned| *poisoned.into_inner(), |guard| *guard)
    }

    /// Returns the current UTC date.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    /// Moves the clock to `now`.
    pub fn set(&self, now: DateTime<Utc>) {
        let mut guard = self.now.write().unwrap_or_else(PoisonError::into_inner);
        *guard = now;
    }

    /// Moves the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        self.set(self.now() + by);
    }

    /// Moves the clock forward by whole days.
    pub fn advance_days(&self, days: i64) {
        self.advance(Duration::days(days));
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn local(&self) -> DateTime<Local> {
        self.now().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.now()
    }
}
