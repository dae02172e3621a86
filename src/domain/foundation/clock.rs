//! Clock port for injectable time.
//!
//! All date arithmetic in the billing domain is relative to an injected
//! clock rather than the system time. This keeps access-window checks and
//! extension rules deterministic under test.

use std::sync::Mutex;

use super::Timestamp;

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Returns the current moment.
    fn now(&self) -> Timestamp;
}

/// Production clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// Manually controlled clock for deterministic tests.
///
/// Starts at a fixed instant and only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    current: Mutex<Timestamp>,
}

impl ManualClock {
    /// Creates a clock frozen at the given instant.
    pub fn fixed_at(instant: Timestamp) -> Self {
        Self {
            current: Mutex::new(instant),
        }
    }

    /// Moves the clock forward by whole days.
    pub fn advance_days(&self, days: i64) {
        let mut current = self.current.lock().unwrap();
        *current = current.add_days(days);
    }

    /// Moves the clock forward (or backward) by seconds.
    pub fn advance_secs(&self, secs: i64) {
        let mut current = self.current.lock().unwrap();
        *current = current.add_secs(secs);
    }

    /// Jumps the clock to an absolute instant.
    pub fn set(&self, instant: Timestamp) {
        *self.current.lock().unwrap() = instant;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.current.lock().unwrap()
    }
}
