//! Time normalization onto the canonical axis.
//!
//! Input times arrive as `value` + unit string (`"seconds since 2018-01-01T00:00:00"`).
//! Everything inside the integrator runs on a single linear axis: **days since
//! J2000** (`2000-01-01T12:00:00`).
//!
//! # Example
//!
//! ```
//! use advect_rs::time::TimeUnits;
//!
//! let units = TimeUnits::parse("hours since 2000-01-01T12:00:00").unwrap();
//! assert_eq!(units.to_days(36.0), 1.5);
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{AdvectError, Result};
use crate::types::TimeValues;

/// Seconds per canonical time unit (one day).
pub const SECONDS_PER_DAY: f64 = 86400.0;

/// Unix timestamp of the J2000 epoch (2000-01-01T12:00:00).
pub const J2000_UNIX_SECONDS: i64 = 946_728_000;

/// Epoch assumed when a unit string carries no `since` clause.
pub const DEFAULT_EPOCH: &str = "2018-01-01T00:00:00";

/// Unit string assumed for request times when none is given.
pub const DEFAULT_TIME_UNITS: &str = "seconds since 2018-01-01T00:00:00";

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Elapsed-time unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeUnit {
    Microseconds,
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
    Weeks,
}

impl TimeUnit {
    /// Length of one unit in seconds.
    pub fn seconds(&self) -> f64 {
        match self {
            TimeUnit::Microseconds => 1e-6,
            TimeUnit::Milliseconds => 1e-3,
            TimeUnit::Seconds => 1.0,
            TimeUnit::Minutes => 60.0,
            TimeUnit::Hours => 3600.0,
            TimeUnit::Days => SECONDS_PER_DAY,
            TimeUnit::Weeks => 7.0 * SECONDS_PER_DAY,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TimeUnit::Microseconds => "microseconds",
            TimeUnit::Milliseconds => "milliseconds",
            TimeUnit::Seconds => "seconds",
            TimeUnit::Minutes => "minutes",
            TimeUnit::Hours => "hours",
            TimeUnit::Days => "days",
            TimeUnit::Weeks => "weeks",
        }
    }
}

impl FromStr for TimeUnit {
    type Err = AdvectError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "microsecond" | "microseconds" | "us" => Ok(TimeUnit::Microseconds),
            "millisecond" | "milliseconds" | "ms" => Ok(TimeUnit::Milliseconds),
            "second" | "seconds" | "sec" | "secs" | "s" => Ok(TimeUnit::Seconds),
            "minute" | "minutes" | "min" | "mins" => Ok(TimeUnit::Minutes),
            "hour" | "hours" | "hr" | "hrs" | "h" => Ok(TimeUnit::Hours),
            "day" | "days" | "d" => Ok(TimeUnit::Days),
            "week" | "weeks" => Ok(TimeUnit::Weeks),
            other => Err(AdvectError::invalid_time(
                s,
                format!("unknown time unit '{}'", other),
            )),
        }
    }
}

/// A parsed `<unit> since <epoch>` specification.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeUnits {
    /// Elapsed-time unit
    pub unit: TimeUnit,
    /// Reference epoch of the input values
    pub epoch: NaiveDateTime,
    /// Offset of `epoch` from J2000 in seconds
    epoch_offset: f64,
}

impl TimeUnits {
    /// Parse a CF-style unit string.
    ///
    /// Accepts `"<unit> since <date>[ <time>]"` (date and time may also be
    /// joined by `T`, with optional fractional seconds and a trailing `Z` or
    /// `UTC`) as well as a bare `"<unit>"`, which assumes [`DEFAULT_EPOCH`].
    ///
    /// # Errors
    ///
    /// `InvalidTimeSpecification` if either the unit or the epoch is unparsable.
    pub fn parse(units: &str) -> Result<Self> {
        let trimmed = units.trim();
        let lower = trimmed.to_ascii_lowercase();

        let (unit_str, epoch_str) = match lower.find(" since ") {
            Some(idx) => (&trimmed[..idx], trimmed[idx + " since ".len()..].trim()),
            None => (trimmed, DEFAULT_EPOCH),
        };

        let unit = unit_str.parse::<TimeUnit>().map_err(|_| {
            AdvectError::invalid_time(units, format!("unknown time unit '{}'", unit_str.trim()))
        })?;
        let epoch = parse_epoch(epoch_str).ok_or_else(|| {
            AdvectError::invalid_time(units, format!("unparsable epoch '{}'", epoch_str))
        })?;

        Ok(Self::new(unit, epoch))
    }

    /// Build from an already-parsed unit and epoch.
    pub fn new(unit: TimeUnit, epoch: NaiveDateTime) -> Self {
        let utc = epoch.and_utc();
        let epoch_offset = (utc.timestamp() - J2000_UNIX_SECONDS) as f64
            + f64::from(utc.timestamp_subsec_nanos()) * 1e-9;
        Self {
            unit,
            epoch,
            epoch_offset,
        }
    }

    /// Convert one value to days since J2000.
    #[inline]
    pub fn to_days(&self, value: f64) -> f64 {
        (value * self.unit.seconds() + self.epoch_offset) / SECONDS_PER_DAY
    }

    /// Convert a scalar or array, preserving its shape.
    pub fn normalize(&self, values: &TimeValues) -> TimeValues {
        values.map(|v| self.to_days(v))
    }
}

impl FromStr for TimeUnits {
    type Err = AdvectError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for TimeUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} since {}",
            self.unit.name(),
            self.epoch.format("%Y-%m-%dT%H:%M:%S")
        )
    }
}

/// Convert time values in `units` to days since J2000.
pub fn normalize_time(values: &TimeValues, units: &str) -> Result<TimeValues> {
    Ok(TimeUnits::parse(units)?.normalize(values))
}

fn parse_epoch(s: &str) -> Option<NaiveDateTime> {
    let mut s = s.trim();
    for suffix in ["UTC", "utc", "Z", "z"] {
        if let Some(stripped) = s.strip_suffix(suffix) {
            s = stripped.trim_end();
            break;
        }
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
