//! Wall-clock access for attendance calculations
//!
//! Every date the engine reasons about is a UTC calendar day, so the clock
//! only needs to hand out the current instant.

use chrono::{DateTime, NaiveDate, Timelike, Utc};

/// Source of the current time
pub trait Clock: Send + Sync {
    /// Current instant
    fn now(&self) -> DateTime<Utc>;

    /// Current UTC calendar day
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    /// Current UTC hour, 0-23
    fn current_hour(&self) -> u8 {
        // hour() is always below 24
        self.now().hour() as u8
    }
}

/// Clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(any(test, feature = "test-util"))]
pub use fixed::FixedClock;

#[cfg(any(test, feature = "test-util"))]
mod fixed {
    use super::Clock;
    use chrono::{DateTime, Duration, NaiveDate, Utc};
    use std::sync::Mutex;

    /// Settable clock for deterministic tests
    #[derive(Debug)]
    pub struct FixedClock {
        now: Mutex<DateTime<Utc>>,
    }

    impl FixedClock {
        pub fn new(now: DateTime<Utc>) -> Self {
            Self {
                now: Mutex::new(now),
            }
        }

        /// Clock pinned to `hour`:00 UTC on `date`
        pub fn at(date: NaiveDate, hour: u32) -> Self {
            let now = date
                .and_hms_opt(hour, 0, 0)
                .unwrap_or_default()
                .and_utc();
            Self::new(now)
        }

        pub fn set(&self, now: DateTime<Utc>) {
            *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
        }

        pub fn advance(&self, by: Duration) {
            let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
            *now += by;
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap_or_else(|e| e.into_inner())
        }
    }
}
