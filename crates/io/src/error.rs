//! Error types for esptrace-io.

use std::path::PathBuf;

/// Error type for all fallible operations in the esptrace-io crate.
///
/// Covers I/O failures, rejected header contents, failures while streaming
/// month blocks, calendar conversion issues, and invalid configuration or
/// trace sets supplied for writing.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when a required file does not exist on disk.
    #[error("file not found: {}", path.display())]
    FileNotFound {
        /// Path that could not be found.
        path: PathBuf,
    },

    /// Wraps an error from the underlying stream outside of block transfer.
    #[error("i/o error: {reason}")]
    Io {
        /// Description of the underlying I/O failure.
        reason: String,
    },

    /// Returned when the simulation-mode word is not the conditional flag.
    #[error("unsupported simulation mode flag {flag} (only conditional traces are supported)")]
    UnsupportedFormat {
        /// The decoded simulation-mode word.
        flag: i32,
    },

    /// Returned when a month block cannot be read or written.
    ///
    /// Any trace data already transferred by the failing call is unusable.
    #[error("transfer failed at trace {trace}, month {month}: {reason}")]
    Transfer {
        /// Zero-based trace index.
        trace: usize,
        /// Zero-based conditional month index.
        month: usize,
        /// Description of the underlying failure.
        reason: String,
    },

    /// Returned when a decoded or derived header field is not usable.
    #[error("invalid header field '{field}': {reason}")]
    InvalidHeader {
        /// Name of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// Returned when header words or trace bounds do not form a usable timestamp.
    #[error("invalid time: {reason}")]
    InvalidTime {
        /// Description of the time conversion issue.
        reason: String,
    },

    /// Wraps an error originating from the esptrace-calendar crate.
    #[error("calendar error: {reason}")]
    Calendar {
        /// Description of the underlying calendar failure.
        reason: String,
    },

    /// Returned when one or more validation checks fail.
    #[error("{count} validation error(s): {details}")]
    Validation {
        /// Number of accumulated validation failures.
        count: usize,
        /// Human-readable summary of the failures.
        details: String,
    },
}

impl From<std::io::Error> for IoError {
    fn from(e: std::io::Error) -> Self {
        IoError::Io {
            reason: e.to_string(),
        }
    }
}

impl From<esptrace_calendar::CalendarError> for IoError {
    fn from(e: esptrace_calendar::CalendarError) -> Self {
        IoError::Calendar {
            reason: e.to_string(),
        }
    }
}
