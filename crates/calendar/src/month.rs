//! Legacy month-length table and day-of-year arithmetic.
//!
//! The table follows the Gregorian leap rule with two overrides inherited
//! from the producers of trace files: 1800 and 1900 are never leap years,
//! and September 1752 has 19 days (the Julian to Gregorian switch).

/// Number of days in each month of a common year (index 0 unused).
pub(crate) const DAYS_PER_MONTH: [i32; 13] = [0, 31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Returns `true` if February of `year` has 29 days.
pub fn is_leap_year(year: i32) -> bool {
    if year == 1800 || year == 1900 {
        return false;
    }
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// Returns the number of days in `month` of `year`.
///
/// `month` is clamped into 1..=12 so that the function never panics on
/// malformed header words.
///
/// # Examples
///
/// ```
/// use esptrace_calendar::days_in_month;
///
/// assert_eq!(days_in_month(2000, 2), 29);
/// assert_eq!(days_in_month(1900, 2), 28);
/// assert_eq!(days_in_month(1752, 9), 19);
/// ```
pub fn days_in_month(year: i32, month: i32) -> i32 {
    let month = month.clamp(1, 12);
    match (year, month) {
        (1752, 9) => 19,
        (_, 2) if is_leap_year(year) => 29,
        _ => DAYS_PER_MONTH[month as usize],
    }
}

/// Returns the number of days in `year` according to [`days_in_month`].
pub fn days_in_year(year: i32) -> i32 {
    (1..=12).map(|m| days_in_month(year, m)).sum()
}

/// Returns the 1-based day-of-year of `(year, month, day)`.
///
/// No range checking is applied to `day`; callers that need a valid date
/// clamp first.
pub fn day_of_year(year: i32, month: i32, day: i32) -> i32 {
    let month = month.clamp(1, 12);
    (1..month).map(|m| days_in_month(year, m)).sum::<i32>() + day
}

/// Splits a 1-based day-of-year into `(month, day)` using the legacy table.
///
/// Returns `None` when `doy` lies beyond the last day of `year`.
pub(crate) fn month_day_from_doy(year: i32, doy: i32) -> Option<(i32, i32)> {
    let mut remaining = doy;
    for month in 1..=12 {
        let dim = days_in_month(year, month);
        if remaining <= dim {
            return Some((month, remaining));
        }
        remaining -= dim;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn february_leap_years() {
        assert_eq!(days_in_month(2000, 2), 29);
        assert_eq!(days_in_month(2004, 2), 29);
        assert_eq!(days_in_month(1996, 2), 29);
    }

    #[test]
    fn february_common_years() {
        assert_eq!(days_in_month(2001, 2), 28);
        assert_eq!(days_in_month(2100, 2), 28);
        assert_eq!(days_in_month(1700, 2), 28);
    }

    #[test]
    fn century_overrides() {
        assert_eq!(days_in_month(1800, 2), 28);
        assert_eq!(days_in_month(1900, 2), 28);
        assert!(!is_leap_year(1900));
        assert!(is_leap_year(2000));
    }

    #[test]
    fn september_1752() {
        assert_eq!(days_in_month(1752, 9), 19);
        assert_eq!(days_in_month(1753, 9), 30);
        assert_eq!(days_in_year(1752), 355);
    }

    #[test]
    fn month_is_clamped() {
        assert_eq!(days_in_month(2001, 0), 31);
        assert_eq!(days_in_month(2001, 13), 31);
    }

    #[test]
    fn days_in_year_totals() {
        assert_eq!(days_in_year(1999), 365);
        assert_eq!(days_in_year(2000), 366);
        assert_eq!(days_in_year(1900), 365);
    }

    #[test]
    fn day_of_year_known_dates() {
        assert_eq!(day_of_year(2001, 1, 1), 1);
        assert_eq!(day_of_year(2001, 3, 1), 60);
        assert_eq!(day_of_year(2000, 3, 1), 61);
        assert_eq!(day_of_year(2000, 12, 31), 366);
        assert_eq!(day_of_year(1752, 10, 1), 264);
    }

    #[test]
    fn month_day_from_doy_inverts_day_of_year() {
        for year in [1900, 1999, 2000, 2024] {
            for doy in 1..=days_in_year(year) {
                let (m, d) = month_day_from_doy(year, doy).unwrap();
                assert_eq!(day_of_year(year, m, d), doy, "year {year} doy {doy}");
            }
        }
    }

    #[test]
    fn month_day_from_doy_past_year_end() {
        assert_eq!(month_day_from_doy(2001, 366), None);
        assert_eq!(month_day_from_doy(2000, 366), Some((12, 31)));
    }
}
