//! Month-block transfer between the record stream and trace time axes.
//!
//! Every trace stores `month_count` blocks of `31 * 24 / interval` floats,
//! back to back from the first data record. How many leading slots of a
//! block hold data is set by the trace's historical calendar (its year is
//! `start_year + index`); where those values land on the time axis is set
//! by the forecast calendar, restarting at day 1 of each forecast month.

use std::io::{self, Read, Seek, Write};

use chrono::{Duration, NaiveDateTime};
use esptrace_calendar::days_in_month;
use tracing::debug;

use crate::cursor::{RecordCursor, WORD_BYTES};
use crate::error::IoError;
use crate::header::EnsembleHeader;
use crate::time::{add_months, calendar_from_datetime, first_of_month};
use crate::trace::{MISSING, Trace};

/// Where one month block comes from and where its values go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BlockPlan {
    /// Historical year of the block.
    pub historical_year: i32,
    /// Historical month of the block.
    pub historical_month: i32,
    /// Leading slots holding real data.
    pub valid_slots: usize,
    /// Time of the first slot on the forecast axis.
    pub first_time: NaiveDateTime,
}

/// Historical `(year, month)` of block `month` of trace `trace` (both 0-based).
pub(crate) fn historical_month(
    header: &EnsembleHeader,
    trace: usize,
    month: usize,
) -> Result<(i32, i32), IoError> {
    let year = i32::try_from(trace)
        .ok()
        .and_then(|t| header.start_year.checked_add(t));
    match (year, i32::try_from(month)) {
        (Some(year), Ok(offset)) => add_months(year, header.start_month, offset),
        _ => Err(IoError::InvalidTime {
            reason: format!("block {month} of trace {trace} is out of range"),
        }),
    }
}

/// Plans block `month` of trace `trace` (both 0-based).
pub(crate) fn block_plan(
    header: &EnsembleHeader,
    trace: usize,
    month: usize,
) -> Result<BlockPlan, IoError> {
    let (historical_year, historical_month) = historical_month(header, trace, month)?;
    let valid_slots =
        days_in_month(historical_year, historical_month) as usize * header.values_per_day();

    // The forecast start is taken in the 1..=24 convention so that a start
    // at midnight belongs to the month that is ending.
    let start = calendar_from_datetime(header.forecast_start()?);
    let (year, month_of_year) = add_months(start.year, start.month, month as i32)?;
    let first_time =
        first_of_month(year, month_of_year)? + Duration::hours(i64::from(header.interval));

    Ok(BlockPlan {
        historical_year,
        historical_month,
        valid_slots,
        first_time,
    })
}

/// Word offset of the first month block.
pub(crate) fn data_start_word(header: &EnsembleHeader, record_words: usize) -> u64 {
    (header.first_data_record.saturating_sub(1) * record_words) as u64
}

/// Runs `step` for every block in file order, attributing failures to the block.
fn for_each_block<F>(header: &EnsembleHeader, traces: usize, mut step: F) -> Result<(), IoError>
where
    F: FnMut(usize, &BlockPlan) -> io::Result<()>,
{
    for t in 0..traces {
        for m in 0..header.month_count {
            let plan = block_plan(header, t, m)?;
            step(t, &plan).map_err(|e| IoError::Transfer {
                trace: t,
                month: m,
                reason: e.to_string(),
            })?;
        }
        debug!(trace = t, months = header.month_count, "transferred trace");
    }
    Ok(())
}

/// Fills `traces` from the month blocks of the stream.
///
/// Slots past the historical month length are skipped, and values whose
/// time lies outside a trace's period are dropped.
///
/// # Errors
///
/// Returns [`IoError::Transfer`] on the first short read or seek failure;
/// the traces are then only partly filled and must be discarded.
pub(crate) fn read_traces<S: Read + Seek>(
    cursor: &mut RecordCursor<S>,
    header: &EnsembleHeader,
    traces: &mut [Trace],
) -> Result<(), IoError> {
    let interval = Duration::hours(i64::from(header.interval));
    let mut block = vec![0.0_f32; header.block_len()];

    cursor
        .seek_word(data_start_word(header, cursor.record_words()))
        .map_err(|e| IoError::Transfer {
            trace: 0,
            month: 0,
            reason: e.to_string(),
        })?;

    for_each_block(header, traces.len(), |t, plan| {
        cursor.read_f32_block(&mut block)?;
        let mut time = plan.first_time;
        for &value in &block[..plan.valid_slots] {
            traces[t].set_value(time, f64::from(value));
            time += interval;
        }
        Ok(())
    })
}

/// Writes the month blocks of `traces` to the stream.
///
/// Slots past the historical month length, and slots whose time falls
/// outside a trace's period, are written as [`MISSING`]. The last record is
/// padded with [`MISSING`] so the file ends on a record boundary.
///
/// # Errors
///
/// Returns [`IoError::Transfer`] on the first write failure.
pub(crate) fn write_traces<S: Write + Seek>(
    cursor: &mut RecordCursor<S>,
    header: &EnsembleHeader,
    traces: &[Trace],
) -> Result<(), IoError> {
    let interval = Duration::hours(i64::from(header.interval));
    let mut block = vec![MISSING as f32; header.block_len()];

    cursor
        .seek_word(data_start_word(header, cursor.record_words()))
        .map_err(|e| IoError::Transfer {
            trace: 0,
            month: 0,
            reason: e.to_string(),
        })?;

    for_each_block(header, traces.len(), |t, plan| {
        block.fill(MISSING as f32);
        let mut time = plan.first_time;
        for slot in &mut block[..plan.valid_slots] {
            if let Some(value) = traces[t].value_at(time) {
                *slot = value as f32;
            }
            time += interval;
        }
        cursor.write_f32_block(&block)
    })?;

    let record_bytes = cursor.record_words() as u64 * WORD_BYTES;
    let tail = cursor.position() % record_bytes;
    if tail != 0 {
        let pad = ((record_bytes - tail) / WORD_BYTES) as usize;
        cursor
            .write_f32_block(&vec![MISSING as f32; pad])
            .map_err(|e| IoError::Transfer {
                trace: traces.len().saturating_sub(1),
                month: header.month_count.saturating_sub(1),
                reason: e.to_string(),
            })?;
    }
    Ok(())
}
