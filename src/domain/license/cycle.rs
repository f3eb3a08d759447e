//! Billing cycle calculation.
//!
//! Pure calendar arithmetic: given the anchor day-of-month a license was
//! created on, find the quota cycle containing a reference instant. No I/O,
//! no reads of the system clock.

use chrono::{Datelike, Months, NaiveDate};

use crate::domain::foundation::Timestamp;

/// Highest permitted anchor day.
///
/// Days 29-31 are clamped down so every month of the year contains the
/// anchor and cycle starts never shift in short months.
pub const MAX_CYCLE_START_DAY: u8 = 28;

/// One quota cycle: a calendar month anchored on a fixed day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingCycle {
    /// First instant of the cycle (midnight UTC on the anchor day).
    pub start: Timestamp,
    /// Last day of the cycle (midnight UTC; the cycle runs through this day).
    pub end: Timestamp,
}

impl BillingCycle {
    /// Computes the cycle containing `reference` for the given anchor day.
    ///
    /// The start is the most recent date whose day-of-month equals the
    /// (clamped) anchor day and which is not after the reference; when the
    /// reference's day-of-month is smaller than the anchor, the start rolls
    /// back one month. The end is `start + 1 month - 1 day`.
    pub fn containing(cycle_start_day: u8, reference: Timestamp) -> Self {
        let day = u32::from(cycle_start_day.clamp(1, MAX_CYCLE_START_DAY));
        let ref_date = reference.as_datetime().date_naive();

        let (year, month) = if ref_date.day() >= day {
            (ref_date.year(), ref_date.month())
        } else if ref_date.month() == 1 {
            (ref_date.year() - 1, 12)
        } else {
            (ref_date.year(), ref_date.month() - 1)
        };

        // day <= 28, so this date exists in every month
        let start_date = NaiveDate::from_ymd_opt(year, month, day)
            .unwrap_or(ref_date);
        let end_date = start_date
            .checked_add_months(Months::new(1))
            .and_then(|d| d.pred_opt())
            .unwrap_or(start_date);

        Self {
            start: midnight(start_date),
            end: midnight(end_date),
        }
    }

    /// First instant of the following cycle.
    pub fn next_rollover(&self) -> Timestamp {
        self.start.add_calendar_months(1)
    }

    /// Whether an instant falls inside this cycle.
    pub fn contains(&self, instant: Timestamp) -> bool {
        instant >= self.start && instant < self.next_rollover()
    }
}

fn midnight(date: NaiveDate) -> Timestamp {
    let dt = date
        .and_hms_opt(0, 0, 0)
        .map(|d| d.and_utc())
        .unwrap_or_default();
    Timestamp::from_datetime(dt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ts(year: i32, month: u32, day: u32) -> Timestamp {
        Timestamp::from_ymd(year, month, day).unwrap()
    }

    #[test]
    fn reference_after_anchor_stays_in_month() {
        let cycle = BillingCycle::containing(15, ts(2024, 2, 20));
        assert_eq!(cycle.start, ts(2024, 2, 15));
        assert_eq!(cycle.end, ts(2024, 3, 14));
    }

    #[test]
    fn reference_before_anchor_rolls_back_a_month() {
        // Scenario: anchor day 15, reference 2024-02-10
        let cycle = BillingCycle::containing(15, ts(2024, 2, 10));
        assert_eq!(cycle.start, ts(2024, 1, 15));
        assert_eq!(cycle.end, ts(2024, 2, 14));
    }

    #[test]
    fn january_rolls_back_into_previous_year() {
        let cycle = BillingCycle::containing(20, ts(2024, 1, 5));
        assert_eq!(cycle.start, ts(2023, 12, 20));
        assert_eq!(cycle.end, ts(2024, 1, 19));
    }

    #[test]
    fn anchor_day_equal_to_reference_day_starts_today() {
        let cycle = BillingCycle::containing(10, ts(2024, 6, 10));
        assert_eq!(cycle.start, ts(2024, 6, 10));
    }

    #[test]
    fn out_of_range_anchor_is_clamped() {
        let clamped = BillingCycle::containing(31, ts(2024, 3, 30));
        let explicit = BillingCycle::containing(28, ts(2024, 3, 30));
        assert_eq!(clamped, explicit);

        let low = BillingCycle::containing(0, ts(2024, 3, 30));
        assert_eq!(low.start.day_of_month(), 1);
    }

    #[test]
    fn contains_covers_the_whole_month() {
        let cycle = BillingCycle::containing(15, ts(2024, 2, 10));
        assert!(cycle.contains(ts(2024, 1, 15)));
        assert!(cycle.contains(ts(2024, 2, 10)));
        assert!(cycle.contains(ts(2024, 2, 14)));
        assert!(!cycle.contains(ts(2024, 2, 15)));
        assert!(!cycle.contains(ts(2024, 1, 14)));
    }

    #[test]
    fn next_rollover_is_one_calendar_month_after_start() {
        let cycle = BillingCycle::containing(28, ts(2024, 1, 30));
        assert_eq!(cycle.next_rollover(), ts(2024, 2, 28));
    }

    proptest! {
        #[test]
        fn start_day_matches_anchor_and_brackets_reference(
            day in 1u8..=28,
            secs in 0u64..4_102_444_800, // through 2099
        ) {
            let reference = Timestamp::from_unix_secs(secs);
            let cycle = BillingCycle::containing(day, reference);

            prop_assert_eq!(cycle.start.day_of_month(), u32::from(day));
            prop_assert!(cycle.start <= reference);
            prop_assert!(reference < cycle.next_rollover());
        }

        #[test]
        fn end_is_the_day_before_the_next_start(
            day in 1u8..=28,
            secs in 0u64..4_102_444_800,
        ) {
            let reference = Timestamp::from_unix_secs(secs);
            let cycle = BillingCycle::containing(day, reference);
            prop_assert_eq!(cycle.end.add_days(1), cycle.next_rollover());
        }
    }
}
