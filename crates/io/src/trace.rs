//! A single regular-interval trace of an ensemble.

use chrono::{Duration, NaiveDateTime};

use crate::error::IoError;

/// Sentinel stored for missing values.
pub const MISSING: f64 = -999.0;

/// Lower bound of the band treated as missing.
const MISSING_LOW: f64 = -999.1;
/// Upper bound of the band treated as missing.
const MISSING_HIGH: f64 = -997.9;

/// Returns `true` if `value` falls in the missing-value tolerance band.
///
/// ```
/// use esptrace_io::is_missing;
///
/// assert!(is_missing(-999.0));
/// assert!(is_missing(-998.5));
/// assert!(!is_missing(-997.0));
/// ```
pub fn is_missing(value: f64) -> bool {
    (MISSING_LOW..=MISSING_HIGH).contains(&value)
}

/// One historical-year replicate of an ensemble.
///
/// The time axis runs from `start` to `end` inclusive in steps of
/// `interval_hours`; every step holds one value, initially [`MISSING`].
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    /// Historical year whose inputs drove this trace.
    historical_year: i32,
    /// Location identifier.
    location_id: String,
    /// Data-type code.
    data_type: String,
    /// Units of the values.
    units: String,
    /// Free-text description.
    description: String,
    /// First time step.
    start: NaiveDateTime,
    /// Step length in hours.
    interval_hours: u32,
    /// One value per time step.
    values: Vec<f64>,
}

impl Trace {
    /// Creates an all-missing trace covering `[start, end]`.
    ///
    /// If `end` is not on the step grid the axis stops at the last step
    /// before it.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Validation`] if `interval_hours` is zero and
    /// [`IoError::InvalidTime`] if `end` precedes `start`.
    pub fn new(
        historical_year: i32,
        start: NaiveDateTime,
        end: NaiveDateTime,
        interval_hours: u32,
    ) -> Result<Self, IoError> {
        if interval_hours == 0 {
            return Err(IoError::Validation {
                count: 1,
                details: "trace interval must be greater than 0".to_string(),
            });
        }
        if end < start {
            return Err(IoError::InvalidTime {
                reason: format!("trace end {end} precedes start {start}"),
            });
        }
        let steps = (end - start).num_hours() / i64::from(interval_hours);
        Ok(Self {
            historical_year,
            location_id: String::new(),
            data_type: String::new(),
            units: String::new(),
            description: String::new(),
            start,
            interval_hours,
            values: vec![MISSING; steps as usize + 1],
        })
    }

    /// Creates a trace from a full set of values starting at `start`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Validation`] if `values` is empty or
    /// `interval_hours` is zero.
    pub fn from_values(
        historical_year: i32,
        start: NaiveDateTime,
        interval_hours: u32,
        values: Vec<f64>,
    ) -> Result<Self, IoError> {
        if values.is_empty() || interval_hours == 0 {
            return Err(IoError::Validation {
                count: 1,
                details: "trace needs at least one value and a positive interval".to_string(),
            });
        }
        let mut trace = Self::new(historical_year, start, start, interval_hours)?;
        trace.values = values;
        Ok(trace)
    }

    /// Sets the location identifier.
    pub fn with_location_id(mut self, id: impl Into<String>) -> Self {
        self.location_id = id.into();
        self
    }

    /// Sets the data-type code.
    pub fn with_data_type(mut self, code: impl Into<String>) -> Self {
        self.data_type = code.into();
        self
    }

    /// Sets the units.
    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = units.into();
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Returns the historical year.
    pub fn historical_year(&self) -> i32 {
        self.historical_year
    }

    /// Returns the location identifier.
    pub fn location_id(&self) -> &str {
        &self.location_id
    }

    /// Returns the data-type code.
    pub fn data_type(&self) -> &str {
        &self.data_type
    }

    /// Returns the units.
    pub fn units(&self) -> &str {
        &self.units
    }

    /// Returns the description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Identifier composed of location, data type, interval and historical year.
    pub fn identifier(&self) -> String {
        format!(
            "{}.{}.{}.{}",
            self.location_id, self.data_type, self.interval_hours, self.historical_year
        )
    }

    /// Returns the first time step.
    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    /// Returns the last time step.
    pub fn end(&self) -> NaiveDateTime {
        self.start + self.step() * (self.values.len() as i32 - 1)
    }

    /// Returns the step length in hours.
    pub fn interval_hours(&self) -> u32 {
        self.interval_hours
    }

    fn step(&self) -> Duration {
        Duration::hours(i64::from(self.interval_hours))
    }

    /// Returns the values, one per time step.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Returns the values mutably.
    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    /// Returns the number of time steps.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the trace has no time steps.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over the time steps.
    pub fn times(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        (0..self.values.len()).map(move |i| self.start + self.step() * i as i32)
    }

    /// Index of `time` on the axis, or `None` if outside the period or off-grid.
    pub fn index_of(&self, time: NaiveDateTime) -> Option<usize> {
        if time < self.start {
            return None;
        }
        let hours = (time - self.start).num_hours();
        let step = i64::from(self.interval_hours);
        if hours % step != 0 || (time - self.start) != Duration::hours(hours) {
            return None;
        }
        let index = (hours / step) as usize;
        (index < self.values.len()).then_some(index)
    }

    /// Value at `time`, or `None` if `time` is not on the axis.
    pub fn value_at(&self, time: NaiveDateTime) -> Option<f64> {
        self.index_of(time).map(|i| self.values[i])
    }

    /// Stores `value` at `time`; returns `false` (and does nothing) if `time`
    /// is not on the axis.
    pub fn set_value(&mut self, time: NaiveDateTime, value: f64) -> bool {
        match self.index_of(time) {
            Some(i) => {
                self.values[i] = value;
                true
            }
            None => false,
        }
    }

    /// Number of values outside the missing band.
    pub fn count_present(&self) -> usize {
        self.values.iter().filter(|v| !is_missing(**v)).count()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn at(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2002, 5, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn missing_band() {
        assert!(is_missing(-999.0));
        assert!(is_missing(-998.5));
        assert!(is_missing(-999.1));
        assert!(!is_missing(-997.0));
        assert!(!is_missing(-999.2));
        assert!(!is_missing(0.0));
    }

    #[test]
    fn new_is_all_missing() {
        let trace = Trace::new(1995, at(1, 6), at(2, 0), 6).unwrap();
        assert_eq!(trace.len(), 4);
        assert!(trace.values().iter().all(|v| *v == MISSING));
        assert_eq!(trace.end(), at(2, 0));
        assert_eq!(trace.count_present(), 0);
    }

    #[test]
    fn new_truncates_off_grid_end() {
        let trace = Trace::new(1995, at(1, 6), at(1, 20), 6).unwrap();
        assert_eq!(trace.len(), 3);
        assert_eq!(trace.end(), at(1, 18));
    }

    #[test]
    fn new_rejects_reversed_period() {
        let err = Trace::new(1995, at(2, 0), at(1, 0), 6).unwrap_err();
        assert!(matches!(err, IoError::InvalidTime { .. }));
    }

    #[test]
    fn new_rejects_zero_interval() {
        let err = Trace::new(1995, at(1, 0), at(2, 0), 0).unwrap_err();
        assert!(matches!(err, IoError::Validation { .. }));
    }

    #[test]
    fn set_and_get_on_grid() {
        let mut trace = Trace::new(1995, at(1, 6), at(2, 0), 6).unwrap();
        assert!(trace.set_value(at(1, 12), 3.5));
        assert_eq!(trace.value_at(at(1, 12)), Some(3.5));
        assert_eq!(trace.count_present(), 1);
    }

    #[test]
    fn set_outside_period_is_ignored() {
        let mut trace = Trace::new(1995, at(1, 6), at(2, 0), 6).unwrap();
        assert!(!trace.set_value(at(1, 0), 1.0));
        assert!(!trace.set_value(at(2, 6), 1.0));
        assert!(!trace.set_value(at(1, 9), 1.0));
        assert_eq!(trace.count_present(), 0);
    }

    #[test]
    fn times_follow_interval() {
        let trace = Trace::new(1995, at(1, 6), at(2, 0), 6).unwrap();
        let times: Vec<_> = trace.times().collect();
        assert_eq!(times, vec![at(1, 6), at(1, 12), at(1, 18), at(2, 0)]);
    }

    #[test]
    fn identifier_and_metadata() {
        let trace = Trace::new(1995, at(1, 6), at(2, 0), 6)
            .unwrap()
            .with_location_id("FTSC1")
            .with_data_type("QINE")
            .with_units("CMS")
            .with_description("FORT SEWARD");
        assert_eq!(trace.identifier(), "FTSC1.QINE.6.1995");
        assert_eq!(trace.units(), "CMS");
        assert_eq!(trace.description(), "FORT SEWARD");
    }

    #[test]
    fn from_values_sets_axis() {
        let trace = Trace::from_values(1996, at(1, 6), 6, vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(trace.end(), at(1, 18));
        assert_eq!(trace.value_at(at(1, 18)), Some(3.0));
    }
}
