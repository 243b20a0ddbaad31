//! Error types for the esptrace-calendar crate.

/// Error type for all fallible operations in the esptrace-calendar crate.
///
/// Under the default [`ClampPolicy::Legacy`](crate::ClampPolicy) out-of-range
/// inputs are coerced and logged instead, so these variants only surface
/// when a caller opts into [`ClampPolicy::Strict`](crate::ClampPolicy).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[allow(clippy::enum_variant_names)]
pub enum CalendarError {
    /// Returned when a month number is outside the valid range 1..=12.
    #[error("invalid month: {month} (must be 1..=12)")]
    InvalidMonth {
        /// The invalid month number that was provided.
        month: i32,
    },

    /// Returned when a day number is outside the days of the given month.
    #[error("invalid day: {day} for {year}-{month:02} (max {max_day})")]
    InvalidDay {
        /// The invalid day number that was provided.
        day: i32,
        /// The month for which the day is invalid.
        month: i32,
        /// The year for which the day is invalid.
        year: i32,
        /// The maximum valid day for the given month.
        max_day: i32,
    },

    /// Returned when an hour is outside the valid range 0..=24.
    #[error("invalid hour: {hour} (must be 0..=24)")]
    InvalidHour {
        /// The invalid hour that was provided.
        hour: i32,
    },
}
