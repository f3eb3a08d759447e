//! Timestamp value object for immutable points in time.

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, TimeZone, Utc};
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

    /// Creates a timestamp at midnight UTC for the given calendar date.
    ///
    /// Returns `None` if the date does not exist (e.g. February 30).
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        let date = NaiveDate::from_ymd_opt(year, month, day)?;
        Some(Self(date.and_hms_opt(0, 0, 0)?.and_utc()))
    }

    /// Returns the inner DateTime.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Returns the calendar day-of-month (1-31).
    pub fn day_of_month(&self) -> u32 {
        self.0.day()
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

    /// Creates a new timestamp by adding whole calendar months.
    ///
    /// Day-of-month is clamped to the target month's length, matching
    /// calendar billing semantics (Jan 31 + 1 month = Feb 28/29).
    pub fn add_calendar_months(&self, months: u32) -> Self {
        self.0
            .checked_add_months(Months::new(months))
            .map(Self)
            .unwrap_or(*self)
    }

    /// Creates a new timestamp by adding the specified number of seconds.
    pub fn plus_secs(&self, secs: u64) -> Self {
        Self(self.0 + Duration::seconds(secs as i64))
    }

    /// Creates a timestamp from Unix seconds.
    pub fn from_unix_secs(secs: u64) -> Self {
        Self(Utc.timestamp_opt(secs as i64, 0).single().unwrap_or_default())
    }

    /// Returns the timestamp as Unix seconds.
    pub fn as_unix_secs(&self) -> u64 {
        self.0.timestamp().max(0) as u64
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
    use chrono::Datelike;

    #[test]
    fn from_ymd_builds_midnight_utc() {
        let ts = Timestamp::from_ymd(2024, 2, 10).unwrap();
        assert_eq!(ts.as_datetime().year(), 2024);
        assert_eq!(ts.as_datetime().month(), 2);
        assert_eq!(ts.day_of_month(), 10);
        assert_eq!(ts.as_datetime().time().to_string(), "00:00:00");
    }

    #[test]
    fn from_ymd_rejects_impossible_dates() {
        assert!(Timestamp::from_ymd(2024, 2, 30).is_none());
        assert!(Timestamp::from_ymd(2024, 13, 1).is_none());
    }

    #[test]
    fn add_calendar_months_clamps_day() {
        let ts = Timestamp::from_ymd(2024, 1, 31).unwrap();
        let next = ts.add_calendar_months(1);
        // 2024 is a leap year
        assert_eq!(next.as_datetime().month(), 2);
        assert_eq!(next.day_of_month(), 29);
    }

    #[test]
    fn add_days_moves_forward_and_back() {
        let ts = Timestamp::from_ymd(2024, 3, 1).unwrap();
        assert_eq!(ts.add_days(1).day_of_month(), 2);
        assert_eq!(ts.add_days(-1).as_datetime().month(), 2);
    }

    #[test]
    fn ordering_follows_time() {
        let earlier = Timestamp::from_ymd(2024, 1, 1).unwrap();
        let later = Timestamp::from_ymd(2024, 1, 2).unwrap();
        assert!(earlier.is_before(&later));
        assert!(later.is_after(&earlier));
        assert!(earlier < later);
    }

    #[test]
    fn unix_secs_round_trips() {
        let secs = 1_705_276_800_u64; // 2024-01-15T00:00:00Z
        let ts = Timestamp::from_unix_secs(secs);
        assert_eq!(ts.as_unix_secs(), secs);
        assert_eq!(ts.day_of_month(), 15);
    }

    #[test]
    fn plus_secs_adds() {
        let ts = Timestamp::from_unix_secs(1000);
        assert_eq!(ts.plus_secs(60).as_unix_secs(), 1060);
    }

    #[test]
    fn serializes_as_rfc3339() {
        let ts = Timestamp::from_ymd(2024, 1, 15).unwrap();
        let json = serde_json::to_string(&ts).unwrap();
        assert!(json.contains("2024-01-15"));
        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ts);
    }
}
