//! # esptrace-io
//!
//! Read and write ESP conditional trace ensembles: a 1-record header
//! followed by fixed-length month blocks of 4-byte floats, in either byte
//! order. Bridges the record layout into regular-interval [`Trace`] time
//! series keyed by historical year.
//!
//! ## Architecture
//!
//! ```mermaid
//! graph LR
//!     F["trace file"] -->|"detect_byte_order()"| C["RecordCursor"]
//!     C -->|"EnsembleHeader::decode()"| H["EnsembleHeader"]
//!     H -->|"read month blocks"| T["Vec of Trace"]
//!     T -->|"EnsembleFile::from_traces()"| E["EnsembleFile"]
//!     E -->|"write()"| F
//!     E -->|"dump()"| D["text rows"]
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use esptrace_io::{ByteOrder, EnsembleFile, ReaderConfig, WriterConfig};
//!
//! let ensemble = EnsembleFile::open(Path::new("ftsc1.qine.06.cs"), &ReaderConfig::default())?;
//! for trace in ensemble.traces() {
//!     println!("{} has {} values", trace.identifier(), trace.count_present());
//! }
//! ensemble.write(
//!     Path::new("ftsc1.le.cs"),
//!     &WriterConfig::default().with_byte_order(ByteOrder::Little),
//! )?;
//! # Ok::<(), esptrace_io::IoError>(())
//! ```
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `cursor` | Word and record access with byte-order detection |
//! | `header` | Record 1 fields and their codec |
//! | `trace` | Regular-interval trace and missing-value sentinel |
//! | `transfer` | Month blocks to and from trace time axes |
//! | `ensemble` | Open, build and write whole ensembles |
//! | `dump` | Diagnostic text dump |
//! | `time` | Julian words to `chrono` timestamps |
//! | `error` | Error types |

mod cursor;
mod dump;
mod ensemble;
mod error;
mod header;
mod time;
mod trace;
mod transfer;

pub use cursor::{ByteOrder, DEFAULT_RECORD_WORDS, RecordCursor, WORD_BYTES};
pub use dump::{DumpSummary, UnitConversion};
pub use ensemble::{
    EnsembleFile, EnsembleProperties, ReaderConfig, WriterConfig, conditional_month_count,
};
pub use error::IoError;
pub use header::{
    CONDITIONAL_FLAG, CreationStamp, DAY_SLOTS, EnsembleHeader, FORMAT_VERSION, HEADER_WORDS,
    HISTORICAL_FLAG, MAX_JULIAN_DAY, MAX_MONTH_COUNT, MAX_TRACES, MAX_YEAR, SimulationMode,
};
pub use trace::{MISSING, Trace, is_missing};
