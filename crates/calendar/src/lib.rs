//! # esptrace-calendar
//!
//! Calendar arithmetic for the Julian day/hour words stored in ESP trace
//! files. Day 1 is 1900-01-01 and hours run 1..=24.
//!
//! ## Architecture
//!
//! ```mermaid
//! graph LR
//!     A["(year, month, day)"] -->|"days_since_epoch_1900()"| B["julian day"]
//!     B -->|"date_from_days_since_epoch()"| A
//!     C["CalendarHour"] -->|"julian_day_hour()"| D["JulianHour"]
//!     D -->|"calendar_from_julian()"| C
//!     E["two-digit year"] -->|"disambiguate_year()"| A
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use esptrace_calendar::{
//!     CalendarHour, ClampPolicy, ZoneShift, calendar_from_julian, days_in_month,
//!     julian_day_hour,
//! };
//!
//! assert_eq!(days_in_month(1900, 2), 28);
//!
//! let local = CalendarHour::new(2002, 5, 1, 6);
//! let jh = julian_day_hour(local, ZoneShift::NONE, ClampPolicy::Legacy).unwrap();
//! assert_eq!(calendar_from_julian(jh, ZoneShift::NONE), local);
//! ```
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `month` | Legacy month-length table and day-of-year |
//! | `epoch` | Day numbers since 1900-01-01 |
//! | `julian` | Julian day/hour pairs, zone shift and clamp policy |
//! | `century` | Two-digit year expansion |
//! | `error` | Error types |

mod century;
mod epoch;
mod error;
mod julian;
mod month;

pub use century::{disambiguate_year, disambiguate_year_now};
pub use epoch::{
    DAYS_PER_400_YEARS, EPOCH_YEAR, date_from_days_since_epoch, days_since_epoch_1900,
};
pub use error::CalendarError;
pub use julian::{
    CalendarHour, ClampPolicy, JulianHour, ZoneShift, calendar_from_julian, julian_day_hour,
};
pub use month::{day_of_year, days_in_month, days_in_year, is_leap_year};
