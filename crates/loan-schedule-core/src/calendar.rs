use chrono::{Datelike, Months, NaiveDate, Weekday};

use crate::error::LoanScheduleError;
use crate::LoanScheduleResult;

/// Shift a Saturday or Sunday forward to the following Monday when
/// `adjust` is set. Weekdays pass through unchanged.
pub fn adjust_for_weekend(date: NaiveDate, adjust: bool) -> NaiveDate {
    if !adjust {
        return date;
    }
    match date.weekday() {
        Weekday::Sat => date + chrono::Duration::days(2),
        Weekday::Sun => date + chrono::Duration::days(1),
        _ => date,
    }
}

/// Calendar days from `start` to `end` (negative when `end` precedes `start`).
pub fn days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub fn days_in_year(year: i32) -> u32 {
    if is_leap_year(year) {
        366
    } else {
        365
    }
}

/// Add whole months, clamping the day to the end of shorter months
/// (Jan 31 + 1 month = Feb 28/29).
pub fn add_months(date: NaiveDate, months: u32) -> LoanScheduleResult<NaiveDate> {
    date.checked_add_months(Months::new(months)).ok_or_else(|| {
        LoanScheduleError::DateError(format!("{date} + {months} months is out of range"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_saturday_moves_to_monday() {
        // 2024-06-15 is a Saturday
        assert_eq!(adjust_for_weekend(d(2024, 6, 15), true), d(2024, 6, 17));
    }

    #[test]
    fn test_sunday_moves_to_monday() {
        assert_eq!(adjust_for_weekend(d(2024, 6, 16), true), d(2024, 6, 17));
    }

    #[test]
    fn test_weekday_unchanged() {
        // Wednesday
        assert_eq!(adjust_for_weekend(d(2024, 6, 12), true), d(2024, 6, 12));
    }

    #[test]
    fn test_adjustment_disabled() {
        assert_eq!(adjust_for_weekend(d(2024, 6, 15), false), d(2024, 6, 15));
    }

    #[test]
    fn test_days_between() {
        assert_eq!(days_between(d(2024, 1, 15), d(2024, 2, 15)), 31);
        assert_eq!(days_between(d(2024, 2, 15), d(2024, 3, 15)), 29);
        assert_eq!(days_between(d(2024, 3, 15), d(2024, 2, 15)), -29);
    }

    #[test]
    fn test_leap_years() {
        assert!(is_leap_year(2024));
        assert!(is_leap_year(2000));
        assert!(!is_leap_year(1900));
        assert!(!is_leap_year(2023));
        assert_eq!(days_in_year(2024), 366);
        assert_eq!(days_in_year(2025), 365);
    }

    #[test]
    fn test_add_months_clamps_day() {
        assert_eq!(add_months(d(2024, 1, 31), 1).unwrap(), d(2024, 2, 29));
        assert_eq!(add_months(d(2023, 1, 31), 1).unwrap(), d(2023, 2, 28));
        assert_eq!(add_months(d(2024, 1, 31), 3).unwrap(), d(2024, 4, 30));
    }
}
