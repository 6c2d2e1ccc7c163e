//! Calendar arithmetic on plain dates.
//!
//! Ledger dates are [`NaiveDate`]s: no time-of-day and no timezone, so a
//! date read back from the store is always the date that was written.

use chrono::{Datelike, NaiveDate};

/// Number of days in `month` (1-12) of `year`. Returns 0 for an invalid month.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Shifts `date` by `n` calendar months, clamping the day to the length of
/// the target month: Jan 31 + 1 month is the last day of February.
///
/// Returns `None` only when the target year is out of chrono's range.
pub fn shift_months(date: NaiveDate, n: i32) -> Option<NaiveDate> {
    let month0 = i64::from(date.month0()) + i64::from(n);
    let year = i64::from(date.year()) + month0.div_euclid(12);
    let month = u32::try_from(month0.rem_euclid(12)).ok()? + 1;
    let year = i32::try_from(year).ok()?;
    let day = date.day().min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Shifts `date` by `n` years keeping month and day; Feb 29 lands on Feb 28
/// in a non-leap target year.
pub fn shift_years(date: NaiveDate, n: i32) -> Option<NaiveDate> {
    let year = date.year().checked_add(n)?;
    let day = date.day().min(days_in_month(year, date.month()));
    NaiveDate::from_ymd_opt(year, date.month(), day)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn month_end_clamps_to_february() {
        assert_eq!(shift_months(d("2024-01-31"), 1), Some(d("2024-02-29")));
        assert_eq!(shift_months(d("2023-01-31"), 1), Some(d("2023-02-28")));
    }

    #[test]
    fn clamping_does_not_carry_into_later_months() {
        // Every step is computed from the seed, not from the previous result.
        assert_eq!(shift_months(d("2023-01-31"), 2), Some(d("2023-03-31")));
        assert_eq!(shift_months(d("2023-01-31"), 3), Some(d("2023-04-30")));
    }

    #[test]
    fn crosses_year_boundaries() {
        assert_eq!(shift_months(d("2024-11-15"), 2), Some(d("2025-01-15")));
        assert_eq!(shift_months(d("2024-12-31"), 12), Some(d("2025-12-31")));
        assert_eq!(shift_months(d("2024-01-10"), -1), Some(d("2023-12-10")));
        assert_eq!(shift_months(d("2024-03-31"), -13), Some(d("2023-02-28")));
    }

    #[test]
    fn zero_shift_is_identity() {
        assert_eq!(shift_months(d("2024-05-17"), 0), Some(d("2024-05-17")));
    }

    #[test]
    fn leap_day_year_shift() {
        assert_eq!(shift_years(d("2024-02-29"), 1), Some(d("2025-02-28")));
        assert_eq!(shift_years(d("2024-02-29"), 4), Some(d("2028-02-29")));
        assert_eq!(shift_years(d("2023-06-01"), 1), Some(d("2024-06-01")));
    }

    #[test]
    fn days_in_month_handles_centuries() {
        assert_eq!(days_in_month(1900, 2), 28);
        assert_eq!(days_in_month(2000, 2), 29);
        assert_eq!(days_in_month(2023, 4), 30);
        assert_eq!(days_in_month(2023, 13), 0);
    }
}
