//! Record 1 of a trace file: the ensemble header.
//!
//! The header is a fixed sequence of 4-byte words. Numeric fields are
//! stored as floats (integers are recovered with a 0.1 nudge before
//! truncation) and text fields as blank-padded character blocks:
//!
//! | Word(s) | Field |
//! |---------|-------|
//! | 1 | format version |
//! | 2-3 | segment id |
//! | 4-5 | location id |
//! | 6 | data type |
//! | 7 | interval (hours) |
//! | 8 | simulation mode |
//! | 9 | units |
//! | 10-14 | creation stamp |
//! | 15-16 | historical start month, year |
//! | 17-18 | first, last day of the historical run |
//! | 19-20 | carryover day, hour |
//! | 21-22 | forecast end day, hour |
//! | 23-24 | trace count, conditional month count |
//! | 25-26 | time zone, daylight flag |
//! | 27 | first data record |
//! | 28-29 | dimension, time scale |
//! | 30-34 | segment description |
//! | 35-36 | latitude, longitude |
//! | 37-42 | forecast group, carryover group, RFC |
//! | 43-62 | source file name |
//! | 63-82 | PRSF marker |
//! | 83-102 | comment |
//! | 103 | adjustment count |
//! | 104.. | blank filler to the end of the record |

use std::fmt;
use std::io::{Read, Seek, Write};

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use esptrace_calendar::JulianHour;
use tracing::{debug, trace};

use crate::cursor::RecordCursor;
use crate::error::IoError;
use crate::time::{add_months, datetime_from_julian};

/// Simulation-mode word for conditional (ESP) traces.
pub const CONDITIONAL_FLAG: i32 = 3;
/// Simulation-mode word for historical simulations.
pub const HISTORICAL_FLAG: i32 = 1;
/// Largest number of traces a file may hold.
pub const MAX_TRACES: usize = 100;
/// Number of words holding defined header fields.
pub const HEADER_WORDS: usize = 103;
/// Largest number of conditional months per trace.
pub const MAX_MONTH_COUNT: usize = 120;
/// Latest year a header may refer to.
pub const MAX_YEAR: i32 = 9999;
/// Julian day of 9999-12-31, the last day a header may refer to.
pub const MAX_JULIAN_DAY: i32 = 2_958_464;
/// Slots per month block, one per possible day of month.
pub const DAY_SLOTS: usize = 31;
/// Format version written by this crate.
pub const FORMAT_VERSION: f32 = 1.0;

const PRSF_MARKER: &str = "PRSF";
const BLANK_WORD: &str = "    ";

/// Simulation mode stored in header word 8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationMode {
    /// Forecast traces conditioned on current state.
    Conditional,
    /// Historical simulation; the layout of such files is not supported.
    Historical,
    /// Any other flag value.
    Unknown(i32),
}

impl SimulationMode {
    /// Maps a decoded flag word onto a mode.
    pub fn from_flag(flag: i32) -> Self {
        match flag {
            CONDITIONAL_FLAG => Self::Conditional,
            HISTORICAL_FLAG => Self::Historical,
            other => Self::Unknown(other),
        }
    }

    /// Returns the flag word for this mode.
    pub fn flag(self) -> i32 {
        match self {
            Self::Conditional => CONDITIONAL_FLAG,
            Self::Historical => HISTORICAL_FLAG,
            Self::Unknown(flag) => flag,
        }
    }
}

/// Creation timestamp as stored in words 10-14.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreationStamp {
    /// Month (1..=12).
    pub month: i32,
    /// Day of month.
    pub day: i32,
    /// Four-digit year.
    pub year: i32,
    /// Hours and minutes as `HHMM`.
    pub hour_minute: i32,
    /// Seconds and hundredths as `SSHH`.
    pub second_hundredths: i32,
}

impl CreationStamp {
    /// Builds a stamp from a wall-clock timestamp.
    pub fn from_datetime(t: NaiveDateTime) -> Self {
        Self {
            month: t.month() as i32,
            day: t.day() as i32,
            year: t.year(),
            hour_minute: (t.hour() * 100 + t.minute()) as i32,
            second_hundredths: (t.second() * 100 + t.nanosecond() / 10_000_000) as i32,
        }
    }

    /// Reassembles the stamp, or `None` if the stored words are not a valid time.
    pub fn to_datetime(self) -> Option<NaiveDateTime> {
        let date = NaiveDate::from_ymd_opt(
            self.year,
            u32::try_from(self.month).ok()?,
            u32::try_from(self.day).ok()?,
        )?;
        let hm = u32::try_from(self.hour_minute).ok()?;
        let sh = u32::try_from(self.second_hundredths).ok()?;
        date.and_hms_milli_opt(hm / 100, hm % 100, sh / 100, (sh % 100) * 10)
    }
}

/// Decoded contents of record 1.
#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleHeader {
    /// Format version.
    pub version: f32,
    /// Segment identifier (8 characters).
    pub segment_id: String,
    /// Location identifier (8 characters).
    pub location_id: String,
    /// Data-type code (4 characters).
    pub data_type: String,
    /// Time step in hours; divides 24.
    pub interval: i32,
    /// Simulation mode.
    pub simulation_mode: SimulationMode,
    /// Units of the data values (4 characters).
    pub units: String,
    /// When the file was written.
    pub created: CreationStamp,
    /// First historical month (`im`).
    pub start_month: i32,
    /// First historical year (`iy`), the year of trace 0.
    pub start_year: i32,
    /// First Julian day of the historical run (`idarun`).
    pub first_run_day: i32,
    /// Last Julian day of the historical run (`ldarun`).
    pub last_run_day: i32,
    /// Carryover Julian day/hour (`ijdlst`, `ihlst`).
    pub carryover: JulianHour,
    /// Forecast-end Julian day/hour (`ljdlst`, `lhlst`).
    pub forecast_end: JulianHour,
    /// Number of traces.
    pub trace_count: usize,
    /// Number of conditional months per trace (`ncm`).
    pub month_count: usize,
    /// Time-zone number.
    pub time_zone: i32,
    /// Daylight-saving flag word.
    pub daylight: i32,
    /// 1-based record holding the first month block (`irec`).
    pub first_data_record: usize,
    /// Dimension code (4 characters).
    pub dimension: String,
    /// Measurement time-scale code (4 characters).
    pub time_scale: String,
    /// Segment description (20 characters).
    pub segment_description: String,
    /// Latitude in degrees.
    pub latitude: f32,
    /// Longitude in degrees.
    pub longitude: f32,
    /// Forecast group identifier (8 characters).
    pub forecast_group: String,
    /// Carryover group identifier (8 characters).
    pub carryover_group: String,
    /// River forecast centre name (8 characters).
    pub rfc: String,
    /// Original source file name (80 characters).
    pub source_file: String,
    /// Whether the PRSF marker is set.
    pub prsf: bool,
    /// Free-text comment (80 characters).
    pub comment: String,
    /// Adjustment counter.
    pub adjust_count: i32,
}

impl EnsembleHeader {
    /// Carryover timestamp (state-initialisation time).
    ///
    /// # Errors
    ///
    /// Returns [`IoError::InvalidTime`] if the stored words are not a date.
    pub fn carryover_time(&self) -> Result<NaiveDateTime, IoError> {
        datetime_from_julian(self.carryover)
    }

    /// First forecast time step: carryover plus one interval.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::InvalidTime`] if the stored words are not a date.
    pub fn forecast_start(&self) -> Result<NaiveDateTime, IoError> {
        Ok(self.carryover_time()? + Duration::hours(i64::from(self.interval)))
    }

    /// Last forecast time step.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::InvalidTime`] if the stored words are not a date.
    pub fn forecast_end_time(&self) -> Result<NaiveDateTime, IoError> {
        datetime_from_julian(self.forecast_end)
    }

    /// Number of values per day.
    pub fn values_per_day(&self) -> usize {
        (24 / self.interval.max(1)) as usize
    }

    /// Number of value slots in one month block.
    pub fn block_len(&self) -> usize {
        DAY_SLOTS * self.values_per_day()
    }

    /// Checks the header invariants shared by the read and write paths.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::UnsupportedFormat`] for any mode other than
    /// conditional. Returns [`IoError::InvalidHeader`] for:
    ///
    /// - an interval that does not divide 24;
    /// - a trace count above [`MAX_TRACES`];
    /// - a month count of zero or above [`MAX_MONTH_COUNT`];
    /// - a first data record below 2;
    /// - a start month outside 1..=12, or historical years outside
    ///   1..=[`MAX_YEAR`];
    /// - Julian days outside 1..=[`MAX_JULIAN_DAY`] or hours outside 0..=24;
    /// - a forecast end before its start, or a forecast period longer than
    ///   `month_count` blocks of 31 days.
    pub fn validate(&self) -> Result<(), IoError> {
        if self.simulation_mode != SimulationMode::Conditional {
            return Err(IoError::UnsupportedFormat {
                flag: self.simulation_mode.flag(),
            });
        }
        if !(1..=24).contains(&self.interval) || 24 % self.interval != 0 {
            return Err(IoError::InvalidHeader {
                field: "interval",
                reason: format!("{} hours does not divide 24", self.interval),
            });
        }
        if self.trace_count > MAX_TRACES {
            return Err(IoError::InvalidHeader {
                field: "trace_count",
                reason: format!("{} exceeds the maximum of {MAX_TRACES}", self.trace_count),
            });
        }
        if self.month_count == 0 {
            return Err(IoError::InvalidHeader {
                field: "month_count",
                reason: "at least one conditional month is required".to_string(),
            });
        }
        if self.month_count > MAX_MONTH_COUNT {
            return Err(IoError::InvalidHeader {
                field: "month_count",
                reason: format!(
                    "{} exceeds the maximum of {MAX_MONTH_COUNT}",
                    self.month_count
                ),
            });
        }
        if self.first_data_record < 2 {
            return Err(IoError::InvalidHeader {
                field: "first_data_record",
                reason: format!("{} is inside the header record", self.first_data_record),
            });
        }
        self.validate_historical_period()?;
        for (field, julian) in [
            ("carryover", self.carryover),
            ("forecast_end", self.forecast_end),
        ] {
            if !(1..=MAX_JULIAN_DAY).contains(&julian.day) || !(0..=24).contains(&julian.hour) {
                return Err(IoError::InvalidHeader {
                    field,
                    reason: format!("day {} hour {} is out of range", julian.day, julian.hour),
                });
            }
        }

        let start = self.forecast_start()?;
        let end = self.forecast_end_time()?;
        if end < start {
            return Err(IoError::InvalidHeader {
                field: "forecast_end",
                reason: "forecast end precedes forecast start".to_string(),
            });
        }
        if end - start > Duration::days(DAY_SLOTS as i64 * self.month_count as i64) {
            return Err(IoError::InvalidHeader {
                field: "forecast_end",
                reason: format!(
                    "forecast period {start} .. {end} does not fit in {} month blocks",
                    self.month_count
                ),
            });
        }
        Ok(())
    }

    /// Checks `im`/`iy` and that the last trace's final month is a usable year.
    fn validate_historical_period(&self) -> Result<(), IoError> {
        if !(1..=12).contains(&self.start_month) {
            return Err(IoError::InvalidHeader {
                field: "start_month",
                reason: format!("{} is not a month", self.start_month),
            });
        }
        if !(1..=MAX_YEAR).contains(&self.start_year) {
            return Err(IoError::InvalidHeader {
                field: "start_year",
                reason: format!("{} is outside 1..={MAX_YEAR}", self.start_year),
            });
        }
        // trace_count and month_count are already bounded.
        let (last_year, _) = add_months(
            self.start_year + self.trace_count.saturating_sub(1) as i32,
            self.start_month,
            self.month_count as i32 - 1,
        )?;
        if last_year > MAX_YEAR {
            return Err(IoError::InvalidHeader {
                field: "start_year",
                reason: format!(
                    "{} traces of {} months from {} run past {MAX_YEAR}",
                    self.trace_count, self.month_count, self.start_year
                ),
            });
        }
        Ok(())
    }

    /// Decodes record 1 from the start of the stream.
    ///
    /// The cursor's byte order must already be set. Decoding stops with
    /// [`IoError::UnsupportedFormat`] as soon as the simulation-mode word is
    /// read if it is not the conditional flag.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Io`] on short reads and [`IoError::UnsupportedFormat`]
    /// for non-conditional files.
    pub fn decode<S: Read + Seek>(cursor: &mut RecordCursor<S>) -> Result<Self, IoError> {
        cursor.seek_record(1)?;

        let version = cursor.read_f32()?;
        let segment_id = cursor.read_fixed_string(8)?;
        let location_id = cursor.read_fixed_string(8)?;
        let data_type = cursor.read_fixed_string(4)?;
        let interval = cursor.read_word_int()?;
        let flag = cursor.read_word_int()?;
        let simulation_mode = SimulationMode::from_flag(flag);
        if simulation_mode != SimulationMode::Conditional {
            return Err(IoError::UnsupportedFormat { flag });
        }
        let units = cursor.read_fixed_string(4)?;

        let created = CreationStamp {
            month: cursor.read_word_int()?,
            day: cursor.read_word_int()?,
            year: cursor.read_word_int()?,
            hour_minute: cursor.read_word_int()?,
            second_hundredths: cursor.read_word_int()?,
        };

        let start_month = cursor.read_word_int()?;
        let start_year = cursor.read_word_int()?;
        let first_run_day = cursor.read_word_int()?;
        let last_run_day = cursor.read_word_int()?;
        let carryover_day = cursor.read_word_int()?;
        let carryover_hour = cursor.read_word_int()?;
        let end_day = cursor.read_word_int()?;
        let end_hour = cursor.read_word_int()?;
        let trace_count = non_negative("trace_count", cursor.read_word_int()?)?;
        let month_count = non_negative("month_count", cursor.read_word_int()?)?;
        let time_zone = cursor.read_word_int()?;
        let daylight = cursor.read_word_int()?;
        let first_data_record = non_negative("first_data_record", cursor.read_word_int()?)?;

        let dimension = cursor.read_fixed_string(4)?;
        let time_scale = cursor.read_fixed_string(4)?;
        let segment_description = cursor.read_fixed_string(20)?;
        let latitude = cursor.read_f32()?;
        let longitude = cursor.read_f32()?;
        let forecast_group = cursor.read_fixed_string(8)?;
        let carryover_group = cursor.read_fixed_string(8)?;
        let rfc = cursor.read_fixed_string(8)?;
        let source_file = cursor.read_fixed_string(80)?;
        let prsf = cursor.read_fixed_string(80)? == PRSF_MARKER;
        let comment = cursor.read_fixed_string(80)?;
        let adjust_count = cursor.read_word_int()?;

        let header = Self {
            version,
            segment_id,
            location_id,
            data_type,
            interval,
            simulation_mode,
            units,
            created,
            start_month,
            start_year,
            first_run_day,
            last_run_day,
            carryover: JulianHour {
                day: carryover_day,
                hour: carryover_hour,
            },
            forecast_end: JulianHour {
                day: end_day,
                hour: end_hour,
            },
            trace_count,
            month_count,
            time_zone,
            daylight,
            first_data_record,
            dimension,
            time_scale,
            segment_description,
            latitude,
            longitude,
            forecast_group,
            carryover_group,
            rfc,
            source_file,
            prsf,
            comment,
            adjust_count,
        };
        trace!(?header, "decoded header words");
        debug!(
            location = %header.location_id,
            data_type = %header.data_type,
            interval = header.interval,
            traces = header.trace_count,
            months = header.month_count,
            "decoded header"
        );
        Ok(header)
    }

    /// Encodes record 1 at the start of the stream.
    ///
    /// `created` replaces the header's own creation stamp so the file
    /// records when it was written. Words after the last defined field are
    /// blank filler up to the cursor's record length.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Io`] if the stream rejects a write.
    pub fn encode<S: Write + Seek>(
        &self,
        cursor: &mut RecordCursor<S>,
        created: CreationStamp,
    ) -> Result<(), IoError> {
        cursor.seek_record(1)?;

        cursor.write_f32(self.version)?;
        cursor.write_fixed_string(&self.segment_id, 8)?;
        cursor.write_fixed_string(&self.location_id, 8)?;
        cursor.write_fixed_string(&self.data_type, 4)?;
        cursor.write_word_int(self.interval)?;
        cursor.write_word_int(self.simulation_mode.flag())?;
        cursor.write_fixed_string(&self.units, 4)?;

        cursor.write_word_int(created.month)?;
        cursor.write_word_int(created.day)?;
        cursor.write_word_int(created.year)?;
        cursor.write_word_int(created.hour_minute)?;
        cursor.write_word_int(created.second_hundredths)?;

        cursor.write_word_int(self.start_month)?;
        cursor.write_word_int(self.start_year)?;
        cursor.write_word_int(self.first_run_day)?;
        cursor.write_word_int(self.last_run_day)?;
        cursor.write_word_int(self.carryover.day)?;
        cursor.write_word_int(self.carryover.hour)?;
        cursor.write_word_int(self.forecast_end.day)?;
        cursor.write_word_int(self.forecast_end.hour)?;
        cursor.write_word_int(self.trace_count as i32)?;
        cursor.write_word_int(self.month_count as i32)?;
        cursor.write_word_int(self.time_zone)?;
        cursor.write_word_int(self.daylight)?;
        cursor.write_word_int(self.first_data_record as i32)?;

        cursor.write_fixed_string(&self.dimension, 4)?;
        cursor.write_fixed_string(&self.time_scale, 4)?;
        cursor.write_fixed_string(&self.segment_description, 20)?;
        cursor.write_f32(self.latitude)?;
        cursor.write_f32(self.longitude)?;
        cursor.write_fixed_string(&self.forecast_group, 8)?;
        cursor.write_fixed_string(&self.carryover_group, 8)?;
        cursor.write_fixed_string(&self.rfc, 8)?;
        cursor.write_fixed_string(&self.source_file, 80)?;
        cursor.write_fixed_string(if self.prsf { PRSF_MARKER } else { "" }, 80)?;
        cursor.write_fixed_string(&self.comment, 80)?;
        cursor.write_word_int(self.adjust_count)?;

        for _ in HEADER_WORDS..cursor.record_words() {
            cursor.write_fixed_string(BLANK_WORD, 4)?;
        }
        debug!(
            location = %self.location_id,
            traces = self.trace_count,
            months = self.month_count,
            byte_order = %cursor.byte_order(),
            "encoded header"
        );
        Ok(())
    }
}

fn non_negative(field: &'static str, value: i32) -> Result<usize, IoError> {
    usize::try_from(value).map_err(|_| IoError::InvalidHeader {
        field,
        reason: format!("{value} is negative"),
    })
}

impl fmt::Display for EnsembleHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let time = |r: Result<NaiveDateTime, IoError>| {
            r.map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|_| "invalid".to_string())
        };
        let created = self
            .created
            .to_datetime()
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "invalid".to_string());

        writeln!(f, "version             {:.2}", self.version)?;
        writeln!(f, "segment             {}", self.segment_id)?;
        writeln!(f, "location            {}", self.location_id)?;
        writeln!(f, "data type           {}", self.data_type)?;
        writeln!(f, "interval            {} h", self.interval)?;
        writeln!(f, "simulation flag     {}", self.simulation_mode.flag())?;
        writeln!(f, "units               {}", self.units)?;
        writeln!(f, "created             {created}")?;
        writeln!(
            f,
            "historical start    {:04}-{:02}",
            self.start_year, self.start_month
        )?;
        writeln!(
            f,
            "historical run days {} .. {}",
            self.first_run_day, self.last_run_day
        )?;
        writeln!(
            f,
            "carryover           {} (day {} hour {})",
            time(self.carryover_time()),
            self.carryover.day,
            self.carryover.hour
        )?;
        writeln!(f, "forecast start      {}", time(self.forecast_start()))?;
        writeln!(
            f,
            "forecast end        {} (day {} hour {})",
            time(self.forecast_end_time()),
            self.forecast_end.day,
            self.forecast_end.hour
        )?;
        writeln!(f, "traces              {}", self.trace_count)?;
        writeln!(f, "conditional months  {}", self.month_count)?;
        writeln!(
            f,
            "time zone           {} (daylight {})",
            self.time_zone, self.daylight
        )?;
        writeln!(f, "first data record   {}", self.first_data_record)?;
        writeln!(f, "dimension           {}", self.dimension)?;
        writeln!(f, "time scale          {}", self.time_scale)?;
        writeln!(f, "description         {}", self.segment_description)?;
        writeln!(
            f,
            "lat/lon             {:.4} {:.4}",
            self.latitude, self.longitude
        )?;
        writeln!(f, "forecast group      {}", self.forecast_group)?;
        writeln!(f, "carryover group     {}", self.carryover_group)?;
        writeln!(f, "rfc                 {}", self.rfc)?;
        writeln!(f, "source file         {}", self.source_file)?;
        writeln!(f, "prsf                {}", self.prsf)?;
        writeln!(f, "comment             {}", self.comment)?;
        write!(f, "adjustments         {}", self.adjust_count)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::cursor::{ByteOrder, DEFAULT_RECORD_WORDS};

    pub(crate) fn sample_header() -> EnsembleHeader {
        EnsembleHeader {
            version: FORMAT_VERSION,
            segment_id: "FTSC1".to_string(),
            location_id: "FTSC1".to_string(),
            data_type: "QINE".to_string(),
            interval: 6,
            simulation_mode: SimulationMode::Conditional,
            units: "CMS".to_string(),
            created: CreationStamp::default(),
            start_month: 5,
            start_year: 1995,
            first_run_day: 34819,
            last_run_day: 35215,
            // 2002-05-01 hour 6, i.e. forecast start 2002-05-01 12:00
            carryover: JulianHour {
                day: 37376,
                hour: 6,
            },
            forecast_end: JulianHour {
                day: 37376,
                hour: 24,
            },
            trace_count: 2,
            month_count: 1,
            time_zone: -8,
            daylight: 0,
            first_data_record: 2,
            dimension: "L3/T".to_string(),
            time_scale: "MEAN".to_string(),
            segment_description: "EEL RIVER AT FTSC1".to_string(),
            latitude: 40.2,
            longitude: 123.6,
            forecast_group: "EELFG".to_string(),
            carryover_group: "NCCG".to_string(),
            rfc: "CNRFC".to_string(),
            source_file: "/ofs/files/espts/ftsc1.qine.06.cs".to_string(),
            prsf: true,
            comment: "test ensemble".to_string(),
            adjust_count: 0,
        }
    }

    fn stamp() -> CreationStamp {
        CreationStamp {
            month: 10,
            day: 16,
            year: 2026,
            hour_minute: 1432,
            second_hundredths: 1250,
        }
    }

    fn encoded(header: &EnsembleHeader, order: ByteOrder) -> Vec<u8> {
        let mut cursor = RecordCursor::new(Cursor::new(Vec::new()), order, DEFAULT_RECORD_WORDS);
        header.encode(&mut cursor, stamp()).unwrap();
        cursor.into_inner().into_inner()
    }

    fn decoded(bytes: Vec<u8>) -> Result<EnsembleHeader, IoError> {
        let mut cursor =
            RecordCursor::new(Cursor::new(bytes), ByteOrder::Big, DEFAULT_RECORD_WORDS);
        cursor.detect_byte_order()?;
        EnsembleHeader::decode(&mut cursor)
    }

    #[test]
    fn encode_fills_exactly_one_record() {
        let bytes = encoded(&sample_header(), ByteOrder::Big);
        assert_eq!(bytes.len(), DEFAULT_RECORD_WORDS * 4);
        assert_eq!(&bytes[HEADER_WORDS * 4..HEADER_WORDS * 4 + 4], b"    ");
    }

    #[test]
    fn round_trip_replaces_creation_stamp() {
        let header = sample_header();
        for order in [ByteOrder::Big, ByteOrder::Little] {
            let back = decoded(encoded(&header, order)).unwrap();
            let expected = EnsembleHeader {
                created: stamp(),
                ..header.clone()
            };
            assert_eq!(back, expected, "{order}");
        }
    }

    #[test]
    fn interval_word_position() {
        let bytes = encoded(&sample_header(), ByteOrder::Big);
        assert_eq!(&bytes[24..28], &6.0_f32.to_be_bytes());
    }

    #[test]
    fn historical_flag_rejected() {
        let header = EnsembleHeader {
            simulation_mode: SimulationMode::Historical,
            ..sample_header()
        };
        let err = decoded(encoded(&header, ByteOrder::Big)).unwrap_err();
        assert!(matches!(err, IoError::UnsupportedFormat { flag: 1 }));
    }

    #[test]
    fn unknown_flag_rejected() {
        let header = EnsembleHeader {
            simulation_mode: SimulationMode::Unknown(7),
            ..sample_header()
        };
        let err = decoded(encoded(&header, ByteOrder::Little)).unwrap_err();
        assert!(matches!(err, IoError::UnsupportedFormat { flag: 7 }));
    }

    #[test]
    fn derived_times() {
        let header = sample_header();
        let start = header.forecast_start().unwrap();
        let end = header.forecast_end_time().unwrap();
        assert_eq!(start.to_string(), "2002-05-01 12:00:00");
        assert_eq!(end.to_string(), "2002-05-02 00:00:00");
        assert_eq!(header.carryover_time().unwrap().to_string(), "2002-05-01 06:00:00");
    }

    #[test]
    fn block_geometry() {
        let header = sample_header();
        assert_eq!(header.values_per_day(), 4);
        assert_eq!(header.block_len(), 124);
        let hourly = EnsembleHeader {
            interval: 1,
            ..sample_header()
        };
        assert_eq!(hourly.block_len(), 744);
    }

    #[test]
    fn validate_accepts_sample() {
        assert!(sample_header().validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_interval() {
        let header = EnsembleHeader {
            interval: 5,
            ..sample_header()
        };
        assert!(matches!(
            header.validate().unwrap_err(),
            IoError::InvalidHeader {
                field: "interval",
                ..
            }
        ));
    }

    #[test]
    fn validate_rejects_too_many_traces() {
        let header = EnsembleHeader {
            trace_count: MAX_TRACES + 1,
            ..sample_header()
        };
        assert!(header.validate().is_err());
    }

    #[test]
    fn validate_rejects_header_overlap_and_zero_months() {
        let overlap = EnsembleHeader {
            first_data_record: 1,
            ..sample_header()
        };
        assert!(overlap.validate().is_err());
        let empty = EnsembleHeader {
            month_count: 0,
            ..sample_header()
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn validate_rejects_reversed_period() {
        let header = EnsembleHeader {
            forecast_end: JulianHour {
                day: 37376,
                hour: 6,
            },
            ..sample_header()
        };
        assert!(matches!(
            header.validate().unwrap_err(),
            IoError::InvalidHeader {
                field: "forecast_end",
                ..
            }
        ));
    }

    fn rejected_field(header: EnsembleHeader) -> &'static str {
        match header.validate().unwrap_err() {
            IoError::InvalidHeader { field, .. } => field,
            other => panic!("expected InvalidHeader, got {other:?}"),
        }
    }

    #[test]
    fn validate_rejects_historical_start_out_of_range() {
        for start_month in [0, 13, i32::MIN] {
            let header = EnsembleHeader {
                start_month,
                ..sample_header()
            };
            assert_eq!(rejected_field(header), "start_month");
        }
        for start_year in [0, MAX_YEAR + 1, 300_000_000, i32::MAX] {
            let header = EnsembleHeader {
                start_year,
                ..sample_header()
            };
            assert_eq!(rejected_field(header), "start_year");
        }
        // The last trace's final month runs into year 10000.
        let late = EnsembleHeader {
            start_year: MAX_YEAR,
            start_month: 12,
            month_count: 2,
            ..sample_header()
        };
        assert_eq!(rejected_field(late), "start_year");
    }

    #[test]
    fn max_julian_day_is_last_day_of_9999() {
        assert_eq!(
            esptrace_calendar::days_since_epoch_1900(MAX_YEAR, 12, 31),
            MAX_JULIAN_DAY
        );
    }

    #[test]
    fn validate_rejects_julian_words_out_of_range() {
        let far = EnsembleHeader {
            forecast_end: JulianHour {
                day: MAX_JULIAN_DAY + 1,
                hour: 24,
            },
            ..sample_header()
        };
        assert_eq!(rejected_field(far), "forecast_end");
        let hour = EnsembleHeader {
            carryover: JulianHour {
                day: 37376,
                hour: i32::MIN,
            },
            ..sample_header()
        };
        assert_eq!(rejected_field(hour), "carryover");
    }

    #[test]
    fn validate_bounds_forecast_period_by_month_count() {
        // 2002-05-01 12:00 .. 2002-06-02 00:00 is longer than one 31-day block.
        let long = EnsembleHeader {
            forecast_end: JulianHour {
                day: 37376 + 31,
                hour: 24,
            },
            ..sample_header()
        };
        assert_eq!(rejected_field(long.clone()), "forecast_end");
        assert!(
            EnsembleHeader {
                month_count: 2,
                ..long
            }
            .validate()
            .is_ok()
        );

        let too_many = EnsembleHeader {
            month_count: MAX_MONTH_COUNT + 1,
            ..sample_header()
        };
        assert_eq!(rejected_field(too_many), "month_count");
    }

    #[test]
    fn creation_stamp_round_trip() {
        let t = NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_milli_opt(14, 32, 12, 500)
            .unwrap();
        let stamp = CreationStamp::from_datetime(t);
        assert_eq!(stamp, self::stamp());
        assert_eq!(stamp.to_datetime(), Some(t));
    }

    #[test]
    fn overlong_text_is_truncated() {
        let header = EnsembleHeader {
            location_id: "LOCATIONTOOLONG".to_string(),
            ..sample_header()
        };
        let back = decoded(encoded(&header, ByteOrder::Big)).unwrap();
        assert_eq!(back.location_id, "LOCATION");
        assert_eq!(back.data_type, "QINE");
    }

    #[test]
    fn display_lists_fields() {
        let text = sample_header().to_string();
        assert!(text.contains("location            FTSC1"));
        assert!(text.contains("forecast start      2002-05-01 12:00"));
        assert!(text.contains("prsf                true"));
    }
}
