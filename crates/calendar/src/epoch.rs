//! Day counts relative to the 1900-01-01 epoch.
//!
//! Day 1 is 1900-01-01. Years are located with the 400-year Gregorian
//! period (146 097 days), so dates before the epoch yield zero or negative
//! day numbers rather than failing.

use crate::month::{day_of_year, days_in_year, month_day_from_doy};

/// Number of days in one 400-year Gregorian cycle.
pub const DAYS_PER_400_YEARS: i64 = 146_097;

/// First year of the epoch.
pub const EPOCH_YEAR: i32 = 1900;

/// Days from 1900-01-01 to January 1 of `year`.
///
/// Within each 400-year cycle starting at a year congruent to 1900, the
/// cycle's first year and the years at offsets 200 and 300 are the only
/// multiples of four that are not leap years.
fn days_before_year(year: i32) -> i64 {
    let offset = i64::from(year) - i64::from(EPOCH_YEAR);
    let cycles = offset.div_euclid(400);
    let rem = offset.rem_euclid(400);
    let leap_days = if rem == 0 {
        0
    } else {
        (rem + 3) / 4 - 1 - i64::from(rem > 200) - i64::from(rem > 300)
    };
    cycles * DAYS_PER_400_YEARS + rem * 365 + leap_days
}

/// Converts a calendar date into its day number since the epoch (1900-01-01 is day 1).
///
/// # Examples
///
/// ```
/// use esptrace_calendar::days_since_epoch_1900;
///
/// assert_eq!(days_since_epoch_1900(1900, 1, 1), 1);
/// assert_eq!(days_since_epoch_1900(2002, 5, 1), 37376);
/// ```
pub fn days_since_epoch_1900(year: i32, month: i32, day: i32) -> i32 {
    let days = days_before_year(year) + i64::from(day_of_year(year, month, day));
    days as i32
}

/// Converts an epoch day number back into `(year, month, day)`.
///
/// The year is found by estimating from the 400-year identity and then
/// stepping until the day falls inside it. In 1752, whose table is eleven
/// days short, the trailing day numbers spill into January 1753.
pub fn date_from_days_since_epoch(julian_day: i32) -> (i32, i32, i32) {
    let offset = i64::from(julian_day) - 1;
    let cycles = offset.div_euclid(DAYS_PER_400_YEARS);
    let rem = offset.rem_euclid(DAYS_PER_400_YEARS);

    let mut year = (i64::from(EPOCH_YEAR) + cycles * 400 + rem * 400 / DAYS_PER_400_YEARS) as i32;
    while days_before_year(year + 1) <= offset {
        year += 1;
    }
    while days_before_year(year) > offset {
        year -= 1;
    }

    let doy = (offset - days_before_year(year) + 1) as i32;
    match month_day_from_doy(year, doy) {
        Some((month, day)) => (year, month, day),
        None => (year + 1, 1, doy - days_in_year(year)),
    }
}
