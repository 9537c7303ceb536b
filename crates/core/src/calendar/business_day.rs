//! Business-day arithmetic over weekends and a holiday exception set.
//!
//! Carry-forward propagation moves balances from one business day to the
//! next, so "next day" here always means "next business day": weekends and
//! configured holidays are skipped.

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate, Weekday};
use thiserror::Error;

/// Upper bound for a business-day scan, in calendar days.
///
/// Two full weeks is far beyond any legal holiday block; hitting the bound
/// means the holiday set is misconfigured.
const MAX_SCAN_DAYS: u32 = 14;

/// Errors from business-day scans.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CalendarError {
    /// The bounded scan ran out of candidate days.
    #[error("no business day found within {limit} days of {from}; check the holiday set")]
    ScanExhausted {
        /// Date the scan started from.
        from: NaiveDate,
        /// Scan bound in calendar days.
        limit: u32,
    },
}

/// Calendar that classifies dates as business days or not.
///
/// A date is a business day when it is Monday through Friday and not in the
/// holiday set. The set holds only active holidays; loading from storage
/// filters inactive ones out.
#[derive(Debug, Clone, Default)]
pub struct BusinessDayCalendar {
    holidays: BTreeSet<NaiveDate>,
}

impl BusinessDayCalendar {
    /// Creates a calendar from the given holiday dates.
    #[must_use]
    pub fn new(holidays: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            holidays: holidays.into_iter().collect(),
        }
    }

    /// Returns true if the date is in the holiday set.
    #[must_use]
    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&date)
    }

    /// Returns true if the date is a weekday and not a holiday.
    #[must_use]
    pub fn is_business_day(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !self.is_holiday(date)
    }

    /// Finds the next business day at or after `date`.
    ///
    /// With `include_self` set, `date` itself is returned when it is a
    /// business day; otherwise the scan starts the day after.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::ScanExhausted`] if no business day exists
    /// within [`MAX_SCAN_DAYS`] calendar days.
    pub fn next_business_day(
        &self,
        date: NaiveDate,
        include_self: bool,
    ) -> Result<NaiveDate, CalendarError> {
        let exhausted = CalendarError::ScanExhausted {
            from: date,
            limit: MAX_SCAN_DAYS,
        };
        let mut candidate = if include_self {
            date
        } else {
            date.succ_opt().ok_or(exhausted)?
        };

        for _ in 0..=MAX_SCAN_DAYS {
            if self.is_business_day(candidate) {
                return Ok(candidate);
            }
            candidate = candidate.succ_opt().ok_or(CalendarError::ScanExhausted {
                from: date,
                limit: MAX_SCAN_DAYS,
            })?;
        }

        Err(CalendarError::ScanExhausted {
            from: date,
            limit: MAX_SCAN_DAYS,
        })
    }

    /// Finds the closest business day at or before `date`.
    ///
    /// Mirror image of [`Self::next_business_day`], scanning backwards.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::ScanExhausted`] if no business day exists
    /// within [`MAX_SCAN_DAYS`] calendar days.
    pub fn previous_business_day(
        &self,
        date: NaiveDate,
        include_self: bool,
    ) -> Result<NaiveDate, CalendarError> {
        let exhausted = CalendarError::ScanExhausted {
            from: date,
            limit: MAX_SCAN_DAYS,
        };
        let mut candidate = if include_self {
            date
        } else {
            date.pred_opt().ok_or(exhausted)?
        };

        for _ in 0..=MAX_SCAN_DAYS {
            if self.is_business_day(candidate) {
                return Ok(candidate);
            }
            candidate = candidate.pred_opt().ok_or(CalendarError::ScanExhausted {
                from: date,
                limit: MAX_SCAN_DAYS,
            })?;
        }

        Err(CalendarError::ScanExhausted {
            from: date,
            limit: MAX_SCAN_DAYS,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[rstest]
    #[case(date(2026, 3, 2), true)] // Monday
    #[case(date(2026, 3, 6), true)] // Friday
    #[case(date(2026, 3, 7), false)] // Saturday
    #[case(date(2026, 3, 8), false)] // Sunday
    fn test_weekday_classification(#[case] d: NaiveDate, #[case] expected: bool) {
        let calendar = BusinessDayCalendar::default();
        assert_eq!(calendar.is_business_day(d), expected);
    }

    #[test]
    fn test_holiday_is_not_business_day() {
        // March 23 2026, a Monday (Colombian St. Joseph's Day observance)
        let calendar = BusinessDayCalendar::new([date(2026, 3, 23)]);
        assert!(calendar.is_holiday(date(2026, 3, 23)));
        assert!(!calendar.is_business_day(date(2026, 3, 23)));
        assert!(calendar.is_business_day(date(2026, 3, 24)));
    }

    #[test]
    fn test_next_business_day_from_friday_is_monday() {
        let calendar = BusinessDayCalendar::default();
        let friday = date(2026, 3, 6);
        assert_eq!(
            calendar.next_business_day(friday, false).unwrap(),
            date(2026, 3, 9)
        );
    }

    #[test]
    fn test_next_business_day_skips_holiday_monday() {
        let calendar = BusinessDayCalendar::new([date(2026, 3, 23)]);
        let friday = date(2026, 3, 20);
        assert_eq!(
            calendar.next_business_day(friday, false).unwrap(),
            date(2026, 3, 24)
        );
    }

    #[test]
    fn test_next_business_day_include_self() {
        let calendar = BusinessDayCalendar::default();
        let tuesday = date(2026, 3, 3);
        assert_eq!(
            calendar.next_business_day(tuesday, true).unwrap(),
            tuesday
        );
        assert_eq!(
            calendar.next_business_day(tuesday, false).unwrap(),
            date(2026, 3, 4)
        );
    }

    #[test]
    fn test_previous_business_day_from_monday_is_friday() {
        let calendar = BusinessDayCalendar::default();
        let monday = date(2026, 3, 9);
        assert_eq!(
            calendar.previous_business_day(monday, false).unwrap(),
            date(2026, 3, 6)
        );
    }

    #[test]
    fn test_previous_business_day_skips_weekend_and_holiday() {
        // Friday the 20th is a holiday: Monday's previous business day is Thursday
        let calendar = BusinessDayCalendar::new([date(2026, 3, 20)]);
        assert_eq!(
            calendar.previous_business_day(date(2026, 3, 23), false).unwrap(),
            date(2026, 3, 19)
        );
    }

    #[test]
    fn test_scan_exhausted_on_pathological_holiday_block() {
        // Every day of March marked as a holiday: the bounded scan gives up
        let holidays = (1..=31).map(|d| date(2026, 3, d));
        let calendar = BusinessDayCalendar::new(holidays);
        let result = calendar.next_business_day(date(2026, 3, 2), false);
        assert!(matches!(result, Err(CalendarError::ScanExhausted { .. })));
    }
}
