//! Julian day/hour pairs relative to the 1900-01-01 epoch.
//!
//! Hours run 1..=24: midnight at the end of a day is hour 24 of that day,
//! never hour 0 of the next.

use tracing::warn;

use crate::epoch::{date_from_days_since_epoch, days_since_epoch_1900};
use crate::error::CalendarError;
use crate::month::days_in_month;

/// How out-of-range calendar inputs are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClampPolicy {
    /// Coerce month, day and hour into range and log a warning.
    #[default]
    Legacy,
    /// Reject out-of-range inputs with a [`CalendarError`].
    Strict,
}

/// Time-zone shift applied between local calendar hours and stored Julian hours.
///
/// `number` is the zone offset in hours east of the reference zone; the
/// daylight flag adds one more hour. Trace files use the zero shift.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ZoneShift {
    number: i32,
    daylight: bool,
}

impl ZoneShift {
    /// The zero shift used throughout trace files.
    pub const NONE: Self = Self {
        number: 0,
        daylight: false,
    };

    /// Creates a shift of `number` hours, plus one if `daylight` is set.
    pub fn new(number: i32, daylight: bool) -> Self {
        Self { number, daylight }
    }

    /// Returns the total offset in hours.
    pub fn offset_hours(self) -> i32 {
        self.number + i32::from(self.daylight)
    }
}

/// A calendar date with an hour in the 1..=24 (or 0..=24 on input) convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CalendarHour {
    /// Four-digit year.
    pub year: i32,
    /// Month (1..=12).
    pub month: i32,
    /// Day of month.
    pub day: i32,
    /// Hour of day.
    pub hour: i32,
}

impl CalendarHour {
    /// Creates a new `CalendarHour` without validation.
    pub fn new(year: i32, month: i32, day: i32, hour: i32) -> Self {
        Self {
            year,
            month,
            day,
            hour,
        }
    }
}

/// A day number since the epoch paired with an hour in 1..=24.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JulianHour {
    /// Day number; 1900-01-01 is day 1.
    pub day: i32,
    /// Hour of the day, 1..=24.
    pub hour: i32,
}

impl JulianHour {
    /// Creates a pair and carries whole days so that the hour lies in 1..=24.
    pub fn new(day: i32, hour: i32) -> Self {
        let (day, hour) = carry_hours(day, hour);
        Self { day, hour }
    }

    /// Total hours since the start of the epoch day zero.
    pub fn total_hours(self) -> i64 {
        i64::from(self.day) * 24 + i64::from(self.hour)
    }
}

/// Moves whole days between `day` and `hour` until `hour` is in 1..=24.
fn carry_hours(day: i32, hour: i32) -> (i32, i32) {
    let shifted = hour - 1;
    (day + shifted.div_euclid(24), shifted.rem_euclid(24) + 1)
}

/// Converts a local calendar hour into a Julian day/hour pair.
///
/// Month is clamped to 1..=12, day to the valid days of that month and hour
/// to 0..=24 before conversion. Under [`ClampPolicy::Legacy`] any clamping is
/// logged and processing continues; under [`ClampPolicy::Strict`] it is an
/// error. Hour 0 becomes hour 24 of the previous day.
///
/// # Errors
///
/// Returns [`CalendarError`] only under [`ClampPolicy::Strict`] when an input
/// is out of range.
///
/// # Examples
///
/// ```
/// use esptrace_calendar::{CalendarHour, ClampPolicy, ZoneShift, julian_day_hour};
///
/// let jh = julian_day_hour(
///     CalendarHour::new(2002, 5, 1, 0),
///     ZoneShift::NONE,
///     ClampPolicy::Legacy,
/// )
/// .unwrap();
/// assert_eq!((jh.day, jh.hour), (37375, 24));
/// ```
pub fn julian_day_hour(
    local: CalendarHour,
    zone: ZoneShift,
    policy: ClampPolicy,
) -> Result<JulianHour, CalendarError> {
    let month = local.month.clamp(1, 12);
    let max_day = days_in_month(local.year, month);
    let day = local.day.clamp(1, max_day);
    let hour = local.hour.clamp(0, 24);

    if (month, day, hour) != (local.month, local.day, local.hour) {
        if policy == ClampPolicy::Strict {
            return Err(if month != local.month {
                CalendarError::InvalidMonth { month: local.month }
            } else if day != local.day {
                CalendarError::InvalidDay {
                    day: local.day,
                    month,
                    year: local.year,
                    max_day,
                }
            } else {
                CalendarError::InvalidHour { hour: local.hour }
            });
        }
        warn!(
            year = local.year,
            month = local.month,
            day = local.day,
            hour = local.hour,
            clamped_month = month,
            clamped_day = day,
            clamped_hour = hour,
            "calendar input out of range, clamped"
        );
    }

    let julian_day = days_since_epoch_1900(local.year, month, day);
    Ok(JulianHour::new(julian_day, hour - zone.offset_hours()))
}

/// Converts a Julian day/hour pair back into a local calendar hour.
///
/// The returned hour is in 1..=24; callers that index with 0..=23 hours
/// turn hour 24 into hour 0 of the following day themselves.
pub fn calendar_from_julian(julian: JulianHour, zone: ZoneShift) -> CalendarHour {
    let (day, hour) = carry_hours(julian.day, julian.hour + zone.offset_hours());
    let (year, month, day) = date_from_days_since_epoch(day);
    CalendarHour {
        year,
        month,
        day,
        hour,
    }
}
