//! Two-digit year disambiguation.

use chrono::{Datelike, Local, NaiveDate};

/// Years this far past `today` are moved back one century.
const YEARS_FORWARD: i32 = 10;
/// Years this far before `today` are moved forward one century.
const YEARS_BACK: i32 = 90;

/// Expands a possibly two-digit year relative to `today`.
///
/// - Years outside 0..=136 (including all four-digit years) pass through.
/// - 100..=136 are years counted from 1900 (100 is 2000).
/// - 0..=99 take the century of `today` and are then shifted so that the
///   date lies within 90 years before and 10 years after `today`.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use esptrace_calendar::disambiguate_year;
///
/// let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
/// assert_eq!(disambiguate_year(95, 5, 1, today), 1995);
/// assert_eq!(disambiguate_year(2, 5, 1, today), 2002);
/// assert_eq!(disambiguate_year(1995, 5, 1, today), 1995);
/// ```
pub fn disambiguate_year(year: i32, month: i32, day: i32, today: NaiveDate) -> i32 {
    if !(0..=136).contains(&year) {
        return year;
    }
    if year >= 100 {
        return 1900 + year;
    }

    let this_year = today.year();
    let now = (today.month() as i32, today.day() as i32);
    let candidate = this_year - this_year.rem_euclid(100) + year;

    if (candidate, month, day) > (this_year + YEARS_FORWARD, now.0, now.1) {
        candidate - 100
    } else if (candidate, month, day) <= (this_year - YEARS_BACK, now.0, now.1) {
        candidate + 100
    } else {
        candidate
    }
}

/// [`disambiguate_year`] anchored on the local wall-clock date.
pub fn disambiguate_year_now(year: i32, month: i32, day: i32) -> i32 {
    disambiguate_year(year, month, day, Local::now().date_naive())
}
