//! Core traits for testability and abstraction.

use chrono::{DateTime, Local, NaiveDate, Utc};

/// Source of the current time.
///
/// Views such as "today" and "this week" are relative to the clock, so tests
/// inject a fixed one.
pub trait Clock {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;

    /// The current calendar day in the evaluation time zone.
    fn today(&self) -> NaiveDate;
}

/// Clock backed by the system time, evaluating days in the local time zone.
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

/// Clock that always reports the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<Utc>,
    today: NaiveDate,
}

impl FixedClock {
    /// A clock pinned to noon UTC on the given day.
    #[must_use]
    pub fn on(today: NaiveDate) -> Self {
        let now = today.and_hms_opt(12, 0, 0).map_or_else(Utc::now, |dt| dt.and_utc());
        Self { now, today }
    }

    /// A clock pinned to an explicit instant and calendar day.
    #[must_use]
    pub const fn new(now: DateTime<Utc>, today: NaiveDate) -> Self {
        Self { now, today }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn today(&self) -> NaiveDate {
        self.today
    }
}
