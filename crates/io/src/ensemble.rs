//! Ensemble files: header plus one trace per historical year.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::{Path, PathBuf};

use chrono::{Duration, Local, NaiveDateTime};
use esptrace_calendar::{ClampPolicy, days_in_month, days_since_epoch_1900};
use tracing::{debug, info};

use crate::cursor::{ByteOrder, DEFAULT_RECORD_WORDS, RecordCursor};
use crate::error::IoError;
use crate::header::{
    CreationStamp, EnsembleHeader, FORMAT_VERSION, MAX_TRACES, MAX_YEAR, SimulationMode,
};
use crate::time::{add_months, calendar_from_datetime, julian_from_datetime};
use crate::trace::Trace;
use crate::transfer::{read_traces, write_traces};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Checks that a record length can hold the header and whole day groups.
fn validate_record_words(record_words: usize) -> Result<(), IoError> {
    if record_words < DEFAULT_RECORD_WORDS || record_words % 31 != 0 {
        return Err(IoError::Validation {
            count: 1,
            details: format!(
                "record_words must be a multiple of 31 and at least {DEFAULT_RECORD_WORDS}, got {record_words}"
            ),
        });
    }
    Ok(())
}

/// Configuration for opening a trace file.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Whether to read all month blocks during `open`.
    read_data: bool,
    /// Whether to keep the file handle for later reads and dumps.
    keep_open: bool,
    /// Record length in words.
    record_words: usize,
    /// Treatment of out-of-range calendar words.
    clamp: ClampPolicy,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            read_data: true,
            keep_open: false,
            record_words: DEFAULT_RECORD_WORDS,
            clamp: ClampPolicy::Legacy,
        }
    }
}

impl ReaderConfig {
    /// Read the month blocks during `open`, or defer to [`EnsembleFile::read_data`].
    pub fn with_read_data(mut self, read: bool) -> Self {
        self.read_data = read;
        self
    }

    /// Keep the file handle open after `open` returns.
    pub fn with_keep_open(mut self, keep: bool) -> Self {
        self.keep_open = keep;
        self
    }

    /// Set the record length in words.
    pub fn with_record_words(mut self, words: usize) -> Self {
        self.record_words = words;
        self
    }

    /// Set the clamp policy for calendar words.
    pub fn with_clamp_policy(mut self, policy: ClampPolicy) -> Self {
        self.clamp = policy;
        self
    }

    /// Validate that the configuration is internally consistent.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Validation`] if the record length cannot hold the
    /// header or is not a whole number of 31-word day groups.
    pub fn validate(&self) -> Result<(), IoError> {
        validate_record_words(self.record_words)
    }
}

/// Configuration for writing a trace file.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Byte order of every numeric word.
    byte_order: ByteOrder,
    /// Record length in words.
    record_words: usize,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            byte_order: ByteOrder::Big,
            record_words: DEFAULT_RECORD_WORDS,
        }
    }
}

impl WriterConfig {
    /// Sets the byte order.
    pub fn with_byte_order(mut self, order: ByteOrder) -> Self {
        self.byte_order = order;
        self
    }

    /// Sets the record length in words.
    pub fn with_record_words(mut self, words: usize) -> Self {
        self.record_words = words;
        self
    }

    /// Returns the byte order.
    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Validates this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Validation`] for an unusable record length.
    pub fn validate(&self) -> Result<(), IoError> {
        validate_record_words(self.record_words)
    }
}

/// Header properties supplied when building an ensemble from traces.
///
/// Unset properties are derived from the first trace where it carries a
/// counterpart, and are blank (or zero) otherwise.
#[derive(Debug, Clone, Default)]
pub struct EnsembleProperties {
    segment_id: Option<String>,
    segment_description: Option<String>,
    forecast_group: Option<String>,
    carryover_group: Option<String>,
    rfc: Option<String>,
    latitude: Option<f32>,
    longitude: Option<f32>,
    source_file: Option<String>,
    comment: Option<String>,
    prsf: Option<bool>,
    adjust_count: Option<i32>,
    time_zone: Option<i32>,
    daylight: Option<bool>,
    dimension: Option<String>,
    time_scale: Option<String>,
    version: Option<f32>,
    clamp: ClampPolicy,
}

impl EnsembleProperties {
    /// Sets the segment identifier.
    pub fn with_segment_id(mut self, id: impl Into<String>) -> Self {
        self.segment_id = Some(id.into());
        self
    }

    /// Sets the segment description.
    pub fn with_segment_description(mut self, text: impl Into<String>) -> Self {
        self.segment_description = Some(text.into());
        self
    }

    /// Sets the forecast group.
    pub fn with_forecast_group(mut self, id: impl Into<String>) -> Self {
        self.forecast_group = Some(id.into());
        self
    }

    /// Sets the carryover group.
    pub fn with_carryover_group(mut self, id: impl Into<String>) -> Self {
        self.carryover_group = Some(id.into());
        self
    }

    /// Sets the river forecast centre name.
    pub fn with_rfc(mut self, name: impl Into<String>) -> Self {
        self.rfc = Some(name.into());
        self
    }

    /// Sets latitude and longitude in degrees.
    pub fn with_lat_lon(mut self, latitude: f32, longitude: f32) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    /// Sets the original source file name.
    pub fn with_source_file(mut self, name: impl Into<String>) -> Self {
        self.source_file = Some(name.into());
        self
    }

    /// Sets the free-text comment.
    pub fn with_comment(mut self, text: impl Into<String>) -> Self {
        self.comment = Some(text.into());
        self
    }

    /// Sets the PRSF marker.
    pub fn with_prsf(mut self, prsf: bool) -> Self {
        self.prsf = Some(prsf);
        self
    }

    /// Sets the adjustment counter.
    pub fn with_adjust_count(mut self, count: i32) -> Self {
        self.adjust_count = Some(count);
        self
    }

    /// Sets the time-zone number and daylight flag.
    pub fn with_time_zone(mut self, number: i32, daylight: bool) -> Self {
        self.time_zone = Some(number);
        self.daylight = Some(daylight);
        self
    }

    /// Sets the dimension and time-scale codes.
    pub fn with_codes(mut self, dimension: impl Into<String>, time_scale: impl Into<String>) -> Self {
        self.dimension = Some(dimension.into());
        self.time_scale = Some(time_scale.into());
        self
    }

    /// Sets the format version.
    pub fn with_version(mut self, version: f32) -> Self {
        self.version = Some(version);
        self
    }

    /// Sets the clamp policy used when converting trace times to Julian words.
    pub fn with_clamp_policy(mut self, policy: ClampPolicy) -> Self {
        self.clamp = policy;
        self
    }
}

/// Returns `value` or `fallback`, logging when the fallback is used.
fn or_default<T>(value: &Option<T>, name: &'static str, fallback: impl FnOnce() -> T) -> T
where
    T: Clone + std::fmt::Debug,
{
    match value {
        Some(v) => v.clone(),
        None => {
            let v = fallback();
            debug!(property = name, value = ?v, "property not supplied, using default");
            v
        }
    }
}

// ---------------------------------------------------------------------------
// Derivation rules
// ---------------------------------------------------------------------------

/// Returns `true` if any of `count` months from `(year, month)` is a 29-day February.
fn leap_day_in_span(year: i32, month: i32, count: i32) -> bool {
    (0..count).any(|n| {
        add_months(year, month, n).is_ok_and(|(y, m)| m == 2 && days_in_month(y, m) == 29)
    })
}

/// Number of conditional months needed for a forecast period.
///
/// Counts the calendar months spanned by `[start, end]` in the 1..=24 hour
/// convention, plus one more when the period ends on the last day of a
/// month and a 29-day February lies within the spanned forecast months.
/// The extension looks at the forecast calendar only; the historical
/// calendars of the traces do not enter into it.
///
/// ```
/// use chrono::NaiveDate;
/// use esptrace_io::conditional_month_count;
///
/// let at = |m, d, h| NaiveDate::from_ymd_opt(2004, m, d).unwrap().and_hms_opt(h, 0, 0).unwrap();
/// // January through March 2004, ending on March 31 with a leap February.
/// assert_eq!(conditional_month_count(at(1, 1, 6), at(4, 1, 0)), 4);
/// assert_eq!(conditional_month_count(at(1, 1, 6), at(3, 15, 0)), 3);
/// ```
pub fn conditional_month_count(start: NaiveDateTime, end: NaiveDateTime) -> usize {
    let s = calendar_from_datetime(start);
    let e = calendar_from_datetime(end);
    let months = ((e.year - s.year) * 12 + (e.month - s.month) + 1).max(1);

    let ends_on_last_day = e.day == days_in_month(e.year, e.month);
    if ends_on_last_day && leap_day_in_span(s.year, s.month, months) {
        months as usize + 1
    } else {
        months as usize
    }
}

/// Checks that traces form a consecutive-year ensemble sharing one axis.
fn validate_traces(traces: &[Trace]) -> Result<(), IoError> {
    let Some(first) = traces.first() else {
        return Err(IoError::Validation {
            count: 1,
            details: "at least one trace is required".to_string(),
        });
    };

    let mut problems = Vec::new();
    if traces.len() > MAX_TRACES {
        problems.push(format!(
            "{} traces exceed the maximum of {MAX_TRACES}",
            traces.len()
        ));
    }
    let first_year = first.historical_year();
    let last_year = i32::try_from(traces.len() - 1)
        .ok()
        .and_then(|n| first_year.checked_add(n));
    if !(1..=MAX_YEAR).contains(&first_year) || last_year.is_none_or(|y| y > MAX_YEAR) {
        problems.push(format!(
            "historical years from {first_year} fall outside 1..={MAX_YEAR}"
        ));
        return Err(IoError::Validation {
            count: problems.len(),
            details: problems.join("; "),
        });
    }
    let interval = first.interval_hours();
    if !(1..=24).contains(&interval) || 24 % interval != 0 {
        problems.push(format!("interval {interval} h does not divide 24"));
    }
    for (i, trace) in traces.iter().enumerate().skip(1) {
        if trace.historical_year() != first.historical_year() + i as i32 {
            problems.push(format!(
                "trace {i} has historical year {}, expected {}",
                trace.historical_year(),
                first.historical_year() + i as i32
            ));
        }
        if trace.interval_hours() != interval
            || trace.start() != first.start()
            || trace.len() != first.len()
        {
            problems.push(format!("trace {i} does not share the time axis of trace 0"));
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(IoError::Validation {
            count: problems.len(),
            details: problems.join("; "),
        })
    }
}

// ---------------------------------------------------------------------------
// EnsembleFile
// ---------------------------------------------------------------------------

/// A conditional trace ensemble: decoded header plus its traces.
///
/// Traces are ordered by historical year; trace `i` belongs to year
/// `header().start_year + i`.
#[derive(Debug)]
pub struct EnsembleFile {
    header: EnsembleHeader,
    traces: Vec<Trace>,
    byte_order: ByteOrder,
    record_words: usize,
    path: Option<PathBuf>,
    handle: Option<RecordCursor<BufReader<File>>>,
    data_loaded: bool,
}

impl EnsembleFile {
    /// Opens a trace file and decodes its header.
    ///
    /// Traces are allocated with the header's forecast period before any
    /// data is read. Data is read immediately unless the configuration
    /// defers it.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::FileNotFound`] if `path` does not exist,
    /// [`IoError::UnsupportedFormat`] for non-conditional files,
    /// [`IoError::InvalidHeader`] for unusable header words, and
    /// [`IoError::Transfer`] if a month block cannot be read.
    pub fn open(path: &Path, config: &ReaderConfig) -> Result<Self, IoError> {
        config.validate()?;
        if !path.exists() {
            return Err(IoError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        info!(path = %path.display(), "opening trace ensemble");

        let file = File::open(path)?;
        let mut cursor =
            RecordCursor::new(BufReader::new(file), ByteOrder::Big, config.record_words);
        let mut ensemble = Self::decode(&mut cursor, config)?;
        ensemble.path = Some(path.to_path_buf());
        if config.keep_open {
            ensemble.handle = Some(cursor);
        }
        Ok(ensemble)
    }

    /// Decodes an ensemble from any seekable stream.
    ///
    /// The stream is not retained, so deferred reads and dumps are not
    /// available on the result.
    ///
    /// # Errors
    ///
    /// As for [`EnsembleFile::open`], minus the file checks.
    pub fn from_reader<S: Read + Seek>(stream: S, config: &ReaderConfig) -> Result<Self, IoError> {
        config.validate()?;
        let mut cursor = RecordCursor::new(stream, ByteOrder::Big, config.record_words);
        Self::decode(&mut cursor, config)
    }

    fn decode<S: Read + Seek>(
        cursor: &mut RecordCursor<S>,
        config: &ReaderConfig,
    ) -> Result<Self, IoError> {
        let byte_order = cursor.detect_byte_order()?;
        let header = EnsembleHeader::decode(cursor)?;
        header.validate()?;
        if config.clamp == ClampPolicy::Strict {
            check_julian_words(&header)?;
        }

        let start = header.forecast_start()?;
        let end = header.forecast_end_time()?;
        let traces = (0..header.trace_count)
            .map(|i| {
                Trace::new(
                    header.start_year + i as i32,
                    start,
                    end,
                    header.interval as u32,
                )
                .map(|t| {
                    t.with_location_id(&header.location_id)
                        .with_data_type(&header.data_type)
                        .with_units(&header.units)
                        .with_description(&header.segment_description)
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            location = %header.location_id,
            byte_order = %byte_order,
            traces = traces.len(),
            start = %start,
            end = %end,
            "decoded ensemble header"
        );

        let mut ensemble = Self {
            header,
            traces,
            byte_order,
            record_words: cursor.record_words(),
            path: None,
            handle: None,
            data_loaded: false,
        };
        if config.read_data {
            read_traces(cursor, &ensemble.header, &mut ensemble.traces)?;
            ensemble.data_loaded = true;
        }
        Ok(ensemble)
    }

    /// Reads the month blocks if `open` deferred them.
    ///
    /// Uses the kept-open handle if there is one and reopens the file
    /// otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Validation`] if the ensemble has no backing file,
    /// and [`IoError::Transfer`] if a block cannot be read.
    pub fn read_data(&mut self) -> Result<(), IoError> {
        if self.data_loaded {
            return Ok(());
        }
        let keep = self.handle.is_some();
        let mut cursor = self.take_cursor()?;
        let result = read_traces(&mut cursor, &self.header, &mut self.traces);
        self.restore_cursor(cursor, keep);
        result?;
        self.data_loaded = true;
        Ok(())
    }

    /// Opens a fresh cursor on the backing file with the detected byte order.
    pub(crate) fn reopen(&self) -> Result<RecordCursor<BufReader<File>>, IoError> {
        let path = self.path.as_ref().ok_or_else(|| IoError::Validation {
            count: 1,
            details: "ensemble has no backing file".to_string(),
        })?;
        let file = File::open(path)?;
        Ok(RecordCursor::new(
            BufReader::new(file),
            self.byte_order,
            self.record_words,
        ))
    }

    /// Builds an ensemble from fully populated traces.
    ///
    /// Location, data type, units and interval come from the first trace;
    /// all traces must share its time axis and carry consecutive historical
    /// years.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Validation`] for an empty, oversized or
    /// inconsistent trace set, and [`IoError::Calendar`] if a period bound
    /// is rejected under a strict clamp policy.
    pub fn from_traces(traces: Vec<Trace>, properties: &EnsembleProperties) -> Result<Self, IoError> {
        validate_traces(&traces)?;
        let first = &traces[0];
        let interval = first.interval_hours() as i32;
        let start = first.start();
        let end = first.end();
        let carryover = start - Duration::hours(i64::from(interval));

        let forecast_month = calendar_from_datetime(start);
        let start_year = first.historical_year();
        let start_month = forecast_month.month;
        let month_count = conditional_month_count(start, end);

        let (last_year, last_month) = add_months(
            start_year + traces.len() as i32 - 1,
            start_month,
            month_count as i32 - 1,
        )?;

        let p = properties;
        let header = EnsembleHeader {
            version: or_default(&p.version, "version", || FORMAT_VERSION),
            segment_id: or_default(&p.segment_id, "segment_id", || first.location_id().to_string()),
            location_id: first.location_id().to_string(),
            data_type: first.data_type().to_string(),
            interval,
            simulation_mode: SimulationMode::Conditional,
            units: first.units().to_string(),
            created: CreationStamp::default(),
            start_month,
            start_year,
            first_run_day: days_since_epoch_1900(start_year, start_month, 1),
            last_run_day: days_since_epoch_1900(
                last_year,
                last_month,
                days_in_month(last_year, last_month),
            ),
            carryover: julian_from_datetime(carryover, p.clamp)?,
            forecast_end: julian_from_datetime(end, p.clamp)?,
            trace_count: traces.len(),
            month_count,
            time_zone: or_default(&p.time_zone, "time_zone", || 0),
            daylight: i32::from(or_default(&p.daylight, "daylight", || false)),
            first_data_record: 2,
            dimension: or_default(&p.dimension, "dimension", String::new),
            time_scale: or_default(&p.time_scale, "time_scale", String::new),
            segment_description: or_default(&p.segment_description, "segment_description", || {
                first.description().to_string()
            }),
            latitude: or_default(&p.latitude, "latitude", || 0.0),
            longitude: or_default(&p.longitude, "longitude", || 0.0),
            forecast_group: or_default(&p.forecast_group, "forecast_group", String::new),
            carryover_group: or_default(&p.carryover_group, "carryover_group", String::new),
            rfc: or_default(&p.rfc, "rfc", String::new),
            source_file: or_default(&p.source_file, "source_file", String::new),
            prsf: or_default(&p.prsf, "prsf", || false),
            comment: or_default(&p.comment, "comment", String::new),
            adjust_count: or_default(&p.adjust_count, "adjust_count", || 0),
        };
        header.validate()?;

        debug!(
            traces = header.trace_count,
            months = header.month_count,
            first_year = header.start_year,
            "built ensemble header from traces"
        );
        Ok(Self {
            header,
            traces,
            byte_order: ByteOrder::Big,
            record_words: DEFAULT_RECORD_WORDS,
            path: None,
            handle: None,
            data_loaded: true,
        })
    }

    /// Writes the header and every month block to a new file at `path`.
    ///
    /// An existing file at `path` is replaced, never appended to.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Validation`] for an invalid configuration or if
    /// trace data was never read, [`IoError::Io`] if the file cannot be
    /// created, and [`IoError::Transfer`] if a block cannot be written.
    pub fn write(&self, path: &Path, config: &WriterConfig) -> Result<(), IoError> {
        config.validate()?;
        self.ensure_loaded()?;
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer, config, Local::now().naive_local())?;
        writer.flush()?;
        info!(
            path = %path.display(),
            byte_order = %config.byte_order,
            traces = self.traces.len(),
            "wrote trace ensemble"
        );
        Ok(())
    }

    /// Writes the ensemble to any seekable stream, stamped with `written_at`.
    ///
    /// # Errors
    ///
    /// As for [`EnsembleFile::write`], minus file creation.
    pub fn write_to<S: Write + Seek>(
        &self,
        stream: S,
        config: &WriterConfig,
        written_at: NaiveDateTime,
    ) -> Result<(), IoError> {
        config.validate()?;
        self.ensure_loaded()?;
        let mut cursor = RecordCursor::new(stream, config.byte_order, config.record_words);
        self.header
            .encode(&mut cursor, CreationStamp::from_datetime(written_at))?;
        write_traces(&mut cursor, &self.header, &self.traces)?;
        cursor.flush()?;
        Ok(())
    }

    fn ensure_loaded(&self) -> Result<(), IoError> {
        if self.data_loaded {
            Ok(())
        } else {
            Err(IoError::Validation {
                count: 1,
                details: "trace data has not been read".to_string(),
            })
        }
    }

    /// Returns the header.
    pub fn header(&self) -> &EnsembleHeader {
        &self.header
    }

    /// Returns the traces in historical-year order.
    pub fn traces(&self) -> &[Trace] {
        &self.traces
    }

    /// Returns the trace for `historical_year`, if present.
    pub fn trace_for_year(&self, historical_year: i32) -> Option<&Trace> {
        historical_year
            .checked_sub(self.header.start_year)
            .and_then(|index| usize::try_from(index).ok())
            .and_then(|i| self.traces.get(i))
    }

    /// Returns the byte order detected on read (big-endian for built ensembles).
    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Returns the record length in words.
    pub fn record_words(&self) -> usize {
        self.record_words
    }

    /// Returns `true` if trace data has been read or supplied.
    pub fn is_loaded(&self) -> bool {
        self.data_loaded
    }

    /// Returns `true` if the file handle was kept open.
    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    /// Releases the kept-open file handle.
    pub fn close(&mut self) {
        self.handle = None;
    }

    /// Takes the kept-open handle, or opens a fresh one on the backing file.
    pub(crate) fn take_cursor(&mut self) -> Result<RecordCursor<BufReader<File>>, IoError> {
        match self.handle.take() {
            Some(cursor) => Ok(cursor),
            None => self.reopen(),
        }
    }

    /// Returns a handle taken with [`EnsembleFile::take_cursor`].
    pub(crate) fn restore_cursor(&mut self, cursor: RecordCursor<BufReader<File>>, keep: bool) {
        if keep {
            self.handle = Some(cursor);
        }
    }
}

/// Rejects Julian hour words outside 1..=24 under the strict policy.
fn check_julian_words(header: &EnsembleHeader) -> Result<(), IoError> {
    for (field, jh) in [
        ("carryover", header.carryover),
        ("forecast_end", header.forecast_end),
    ] {
        if !(1..=24).contains(&jh.hour) {
            return Err(IoError::InvalidHeader {
                field,
                reason: format!("hour {} outside 1..=24", jh.hour),
            });
        }
    }
    Ok(())
}
