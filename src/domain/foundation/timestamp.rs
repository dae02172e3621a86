//! Timestamp value object for immutable points in time.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Immutable point in time, always UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp for the current moment.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a timestamp from a DateTime<Utc>.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Creates a timestamp from Unix seconds.
    pub fn from_unix_secs(secs: i64) -> Option<Self> {
        use chrono::TimeZone;
        Utc.timestamp_opt(secs, 0).single().map(Self)
    }

    /// Returns the inner DateTime.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Checks if this timestamp is before another.
    pub fn is_before(&self, other: &Timestamp) -> bool {
        self.0 < other.0
    }

    /// Checks if this timestamp is after another.
    pub fn is_after(&self, other: &Timestamp) -> bool {
        self.0 > other.0
    }

    /// Returns the duration from another timestamp to this one.
    ///
    /// Negative if `other` is after `self`.
    pub fn duration_since(&self, other: &Timestamp) -> Duration {
        self.0.signed_duration_since(other.0)
    }

    /// Creates a new timestamp by adding the specified number of days.
    ///
    /// Negative values subtract days.
    pub fn add_days(&self, days: i64) -> Self {
        Self(self.0 + Duration::days(days))
    }

    /// Creates a new timestamp by subtracting the specified number of days.
    pub fn minus_days(&self, days: i64) -> Self {
        Self(self.0 - Duration::days(days))
    }

    /// Creates a new timestamp by adding the specified number of seconds.
    pub fn add_secs(&self, secs: i64) -> Self {
        Self(self.0 + Duration::seconds(secs))
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_creates_current_time() {
        let before = Utc::now();
        let ts = Timestamp::now();
        let after = Utc::now();

        assert!(ts.as_datetime() >= &before);
        assert!(ts.as_datetime() <= &after);
    }

    #[test]
    fn add_days_moves_forward() {
        let ts = Timestamp::now();
        let later = ts.add_days(14);

        assert!(later.is_after(&ts));
        assert_eq!(later.duration_since(&ts), Duration::days(14));
    }

    #[test]
    fn minus_days_moves_backward() {
        let ts = Timestamp::now();
        let earlier = ts.minus_days(1);

        assert!(earlier.is_before(&ts));
    }

    #[test]
    fn add_secs_handles_negative_offsets() {
        let ts = Timestamp::now();
        assert!(ts.add_secs(-1).is_before(&ts));
        assert!(ts.add_secs(1).is_after(&ts));
    }

    #[test]
    fn from_unix_secs_roundtrip() {
        let ts = Timestamp::from_unix_secs(1_704_067_200).unwrap();
        assert_eq!(ts.as_datetime().timestamp(), 1_704_067_200);
    }

    #[test]
    fn ordering_follows_chronology() {
        let a = Timestamp::now();
        let b = a.add_days(1);
        assert!(a < b);
    }
}
