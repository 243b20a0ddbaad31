//! Diagnostic text dump of a trace file.
//!
//! The dump walks the raw month blocks directly instead of going through
//! the traces, and keeps going past the header's month count until the
//! stream runs out. Comparing the number of blocks printed with
//! `trace_count * month_count` shows whether a file's layout matches its
//! header.

use std::io::{self, Read, Seek, Write};

use tracing::{debug, info};

use crate::cursor::RecordCursor;
use crate::ensemble::EnsembleFile;
use crate::error::IoError;
use crate::header::{DAY_SLOTS, EnsembleHeader};
use crate::trace::is_missing;
use crate::transfer::{data_start_word, historical_month};

/// Linear unit conversion applied to dumped values: `value * multiply + add`.
///
/// Missing values are printed unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitConversion {
    /// Scale factor.
    pub multiply: f64,
    /// Offset added after scaling.
    pub add: f64,
}

impl Default for UnitConversion {
    fn default() -> Self {
        Self {
            multiply: 1.0,
            add: 0.0,
        }
    }
}

impl UnitConversion {
    /// Creates a conversion.
    pub fn new(multiply: f64, add: f64) -> Self {
        Self { multiply, add }
    }

    /// Applies the conversion to one value.
    ///
    /// ```
    /// use esptrace_io::UnitConversion;
    ///
    /// let cfs = UnitConversion::new(35.3147, 0.0);
    /// assert!((cfs.apply(2.0) - 70.6294).abs() < 1e-9);
    /// assert_eq!(cfs.apply(-999.0), -999.0);
    /// ```
    pub fn apply(&self, value: f64) -> f64 {
        if is_missing(value) {
            value
        } else {
            value * self.multiply + self.add
        }
    }
}

/// Counts gathered while dumping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DumpSummary {
    /// Complete blocks found in the stream, excluding record padding.
    pub blocks: usize,
    /// Trailing all-missing blocks past the header's blocks that fit in
    /// the padding of the last record.
    pub padding_blocks: usize,
    /// Blocks the header accounts for.
    pub expected_blocks: usize,
}

impl DumpSummary {
    /// Returns `true` if the stream held exactly the blocks the header
    /// describes, ignoring record padding.
    pub fn matches_header(&self) -> bool {
        self.blocks == self.expected_blocks
    }
}

impl EnsembleFile {
    /// Writes the header and every month block as text to `out`.
    ///
    /// Each block prints one row per day slot: trace index, historical
    /// year, month and day, then that day's converted values. Slots past
    /// the end of a short month are printed as stored.
    ///
    /// Uses the kept-open handle if there is one and reopens the backing
    /// file otherwise; a kept-open handle stays open afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Validation`] if the ensemble has no backing file,
    /// and [`IoError::Io`] if reading the stream or writing `out` fails.
    pub fn dump<W: Write>(
        &mut self,
        out: &mut W,
        conversion: UnitConversion,
    ) -> Result<DumpSummary, IoError> {
        let keep = self.is_open();
        let mut cursor = self.take_cursor()?;
        let result = dump_blocks(&mut cursor, self.header(), out, conversion);
        self.restore_cursor(cursor, keep);
        let summary = result?;

        if summary.matches_header() {
            info!(
                blocks = summary.blocks,
                padding = summary.padding_blocks,
                "dump complete"
            );
        } else {
            info!(
                blocks = summary.blocks,
                expected = summary.expected_blocks,
                "block count differs from header"
            );
        }
        Ok(summary)
    }
}

fn dump_blocks<S: Read + Seek, W: Write>(
    cursor: &mut RecordCursor<S>,
    header: &EnsembleHeader,
    out: &mut W,
    conversion: UnitConversion,
) -> Result<DumpSummary, IoError> {
    writeln!(out, "{header}")?;
    writeln!(out)?;

    let per_day = header.values_per_day();
    let months = header.month_count.max(1);
    let mut block = vec![0.0_f32; header.block_len()];
    cursor.seek_word(data_start_word(header, cursor.record_words()))?;

    let expected_blocks = header.trace_count * header.month_count;
    let mut blocks = 0;
    let mut trailing_missing = 0;
    loop {
        match cursor.read_f32_block(&mut block) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        }
        if blocks >= expected_blocks && block.iter().all(|v| is_missing(f64::from(*v))) {
            trailing_missing += 1;
        } else {
            trailing_missing = 0;
        }

        let trace = blocks / months;
        let (year, month) = historical_month(header, trace, blocks % months)?;
        writeln!(out, "# block {blocks}: trace {trace} {year:04}-{month:02}")?;
        for day in 0..DAY_SLOTS {
            write!(out, "{trace:3} {year:04} {month:02} {:02}", day + 1)?;
            for value in &block[day * per_day..(day + 1) * per_day] {
                write!(out, " {:12.4}", conversion.apply(f64::from(*value)))?;
            }
            writeln!(out)?;
        }
        blocks += 1;
    }
    debug!(blocks, trailing_missing, "reached end of stream");

    // Padding never fills a whole record.
    let padding_blocks = if trailing_missing * block.len() < cursor.record_words() {
        trailing_missing
    } else {
        0
    };
    Ok(DumpSummary {
        blocks: blocks - padding_blocks,
        padding_blocks,
        expected_blocks,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::cursor::{ByteOrder, DEFAULT_RECORD_WORDS};
    use crate::header::tests::sample_header;

    #[test]
    fn conversion_defaults_to_identity() {
        let c = UnitConversion::default();
        assert_eq!(c.apply(12.5), 12.5);
    }

    #[test]
    fn conversion_leaves_missing_alone() {
        let c = UnitConversion::new(2.0, 1.0);
        assert_eq!(c.apply(3.0), 7.0);
        assert_eq!(c.apply(-999.0), -999.0);
        assert_eq!(c.apply(-998.5), -998.5);
    }

    fn stream_with_blocks(header: &EnsembleHeader, blocks: usize, extra_words: usize) -> Vec<u8> {
        let mut cursor =
            RecordCursor::new(Cursor::new(Vec::new()), ByteOrder::Big, DEFAULT_RECORD_WORDS);
        cursor.seek_word(DEFAULT_RECORD_WORDS as u64).unwrap();
        for b in 0..blocks {
            cursor
                .write_f32_block(&vec![b as f32 + 0.5; header.block_len()])
                .unwrap();
        }
        cursor.write_f32_block(&vec![0.0; extra_words]).unwrap();
        cursor.into_inner().into_inner()
    }

    #[test]
    fn walks_past_header_month_count() {
        let header = sample_header();
        let bytes = stream_with_blocks(&header, 3, 10);
        let mut cursor = RecordCursor::new(Cursor::new(bytes), ByteOrder::Big, DEFAULT_RECORD_WORDS);
        let mut out = Vec::new();
        let summary =
            dump_blocks(&mut cursor, &header, &mut out, UnitConversion::default()).unwrap();
        assert_eq!(summary.blocks, 3);
        assert_eq!(summary.expected_blocks, 2);
        assert!(!summary.matches_header());

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("version"));
        assert!(text.contains("# block 2: trace 2 1997-05"));
        assert_eq!(text.lines().filter(|l| l.starts_with("  0 1995 05")).count(), 31);
    }

    #[test]
    fn trailing_missing_blocks_in_last_record_are_padding() {
        let header = EnsembleHeader {
            interval: 24,
            ..sample_header()
        };
        let mut cursor =
            RecordCursor::new(Cursor::new(Vec::new()), ByteOrder::Big, DEFAULT_RECORD_WORDS);
        cursor.seek_word(DEFAULT_RECORD_WORDS as u64).unwrap();
        cursor.write_f32_block(&[1.0; 2 * DAY_SLOTS]).unwrap();
        cursor.write_f32_block(&[-999.0; 2 * DAY_SLOTS]).unwrap();
        let bytes = cursor.into_inner().into_inner();

        let mut reader =
            RecordCursor::new(Cursor::new(bytes), ByteOrder::Big, DEFAULT_RECORD_WORDS);
        let summary =
            dump_blocks(&mut reader, &header, &mut Vec::new(), UnitConversion::default()).unwrap();
        assert_eq!(summary.blocks, 2);
        assert_eq!(summary.padding_blocks, 2);
        assert!(summary.matches_header());
    }

    #[test]
    fn missing_blocks_filling_a_record_are_not_padding() {
        let header = EnsembleHeader {
            interval: 24,
            ..sample_header()
        };
        let mut cursor =
            RecordCursor::new(Cursor::new(Vec::new()), ByteOrder::Big, DEFAULT_RECORD_WORDS);
        cursor.seek_word(DEFAULT_RECORD_WORDS as u64).unwrap();
        cursor.write_f32_block(&[1.0; 2 * DAY_SLOTS]).unwrap();
        cursor
            .write_f32_block(&[-999.0; DEFAULT_RECORD_WORDS])
            .unwrap();
        let bytes = cursor.into_inner().into_inner();

        let mut reader =
            RecordCursor::new(Cursor::new(bytes), ByteOrder::Big, DEFAULT_RECORD_WORDS);
        let summary =
            dump_blocks(&mut reader, &header, &mut Vec::new(), UnitConversion::default()).unwrap();
        assert_eq!(summary.blocks, 6);
        assert_eq!(summary.padding_blocks, 0);
        assert!(!summary.matches_header());
    }

    #[test]
    fn applies_conversion_to_rows() {
        let header = sample_header();
        let bytes = stream_with_blocks(&header, 1, 0);
        let mut cursor = RecordCursor::new(Cursor::new(bytes), ByteOrder::Big, DEFAULT_RECORD_WORDS);
        let mut out = Vec::new();
        dump_blocks(&mut cursor, &header, &mut out, UnitConversion::new(2.0, 1.0)).unwrap();
        let text = String::from_utf8(out).unwrap();
        let row = text
            .lines()
            .find(|l| l.starts_with("  0 1995 05 01"))
            .unwrap();
        assert_eq!(row.split_whitespace().filter(|v| *v == "2.0000").count(), 4);
    }
}
