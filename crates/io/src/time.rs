//! Bridges between Julian day/hour words and `chrono` timestamps.
//!
//! Trace time axes use `NaiveDateTime` with hours 0..=23. Header words
//! and month blocks use the 1..=24 hour convention, where midnight belongs
//! to the day that is ending.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use esptrace_calendar::{
    CalendarHour, ClampPolicy, JulianHour, ZoneShift, calendar_from_julian, julian_day_hour,
};

use crate::error::IoError;

/// Midnight starting `(year, month, day)`.
fn midnight(year: i32, month: i32, day: i32) -> Result<NaiveDateTime, IoError> {
    u32::try_from(month)
        .ok()
        .zip(u32::try_from(day).ok())
        .and_then(|(m, d)| NaiveDate::from_ymd_opt(year, m, d))
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| IoError::InvalidTime {
            reason: format!("{year:04}-{month:02}-{day:02} is not a calendar date"),
        })
}

/// Converts a 1..=24 calendar hour into a timestamp; hour 24 becomes 00:00 of the next day.
pub(crate) fn datetime_from_calendar(cal: CalendarHour) -> Result<NaiveDateTime, IoError> {
    Ok(midnight(cal.year, cal.month, cal.day)? + Duration::hours(i64::from(cal.hour)))
}

/// Converts a timestamp into the 1..=24 convention; 00:00 becomes hour 24 of the previous day.
pub(crate) fn calendar_from_datetime(t: NaiveDateTime) -> CalendarHour {
    let (date, hour) = if t.hour() == 0 {
        (t.date() - Duration::days(1), 24)
    } else {
        (t.date(), t.hour() as i32)
    };
    CalendarHour::new(date.year(), date.month() as i32, date.day() as i32, hour)
}

/// Converts stored Julian words into a timestamp, reading them as local time.
pub(crate) fn datetime_from_julian(julian: JulianHour) -> Result<NaiveDateTime, IoError> {
    datetime_from_calendar(calendar_from_julian(julian, ZoneShift::NONE))
}

/// Converts a timestamp into Julian words with no zone shift.
pub(crate) fn julian_from_datetime(
    t: NaiveDateTime,
    policy: ClampPolicy,
) -> Result<JulianHour, IoError> {
    Ok(julian_day_hour(
        calendar_from_datetime(t),
        ZoneShift::NONE,
        policy,
    )?)
}

/// Advances `(year, month)` by `n` months.
///
/// # Errors
///
/// Returns [`IoError::InvalidTime`] if the result does not fit in an `i32` year.
pub(crate) fn add_months(year: i32, month: i32, n: i32) -> Result<(i32, i32), IoError> {
    year.checked_mul(12)
        .and_then(|index| index.checked_add(month.checked_sub(1)?))
        .and_then(|index| index.checked_add(n))
        .map(|index| (index.div_euclid(12), index.rem_euclid(12) + 1))
        .ok_or_else(|| IoError::InvalidTime {
            reason: format!("{year}-{month:02} plus {n} months is out of range"),
        })
}

/// Midnight at the start of day 1 of `(year, month)`.
pub(crate) fn first_of_month(year: i32, month: i32) -> Result<NaiveDateTime, IoError> {
    midnight(year, month, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn hour_24_is_next_midnight() {
        let t = datetime_from_calendar(CalendarHour::new(2002, 4, 30, 24)).unwrap();
        assert_eq!(t, at(2002, 5, 1, 0));
    }

    #[test]
    fn midnight_is_previous_hour_24() {
        assert_eq!(
            calendar_from_datetime(at(2002, 5, 1, 0)),
            CalendarHour::new(2002, 4, 30, 24)
        );
        assert_eq!(
            calendar_from_datetime(at(2002, 5, 1, 6)),
            CalendarHour::new(2002, 5, 1, 6)
        );
    }

    #[test]
    fn julian_round_trip() {
        for t in [at(2002, 5, 1, 0), at(2000, 2, 29, 18), at(1999, 12, 31, 23)] {
            let jh = julian_from_datetime(t, ClampPolicy::Strict).unwrap();
            assert_eq!(datetime_from_julian(jh).unwrap(), t);
        }
    }

    #[test]
    fn add_months_carries_years() {
        assert_eq!(add_months(2002, 11, 1).unwrap(), (2002, 12));
        assert_eq!(add_months(2002, 12, 1).unwrap(), (2003, 1));
        assert_eq!(add_months(2002, 1, -1).unwrap(), (2001, 12));
        assert_eq!(add_months(2002, 5, 25).unwrap(), (2004, 6));
    }

    #[test]
    fn add_months_rejects_overflow() {
        for (year, month) in [(300_000_000, 5), (i32::MAX, 1), (2002, i32::MIN)] {
            assert!(matches!(
                add_months(year, month, 1).unwrap_err(),
                IoError::InvalidTime { .. }
            ));
        }
    }

    #[test]
    fn invalid_date_is_error() {
        let err = datetime_from_calendar(CalendarHour::new(2001, 2, 30, 1)).unwrap_err();
        assert!(matches!(err, IoError::InvalidTime { .. }));
    }
}
