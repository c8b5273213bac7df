//! Date handling: archive availability, requested date spans and CF time axes.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Parse a calendar date given as `YYYY-MM-DD`.
pub fn parse_date(s: &str) -> Result<NaiveDate, TimeParseError> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| TimeParseError::InvalidFormat(s.to_string()))
}

/// The range of dates a provider can serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    /// First date with published data.
    pub first: NaiveDate,
    /// Last date with published data, if the dataset is closed.
    pub last: Option<NaiveDate>,
    /// Days between an analysis time and its publication.
    #[serde(default)]
    pub publication_lag_days: u32,
}

impl AvailabilityWindow {
    /// ERA-Interim daily analyses: 1979-01-01 through 2019-08-31.
    pub fn era_interim() -> Self {
        Self {
            first: NaiveDate::from_ymd_opt(1979, 1, 1).unwrap_or(NaiveDate::MIN),
            last: NaiveDate::from_ymd_opt(2019, 8, 31),
            publication_lag_days: 0,
        }
    }

    /// Latest requestable date as seen from `today`.
    pub fn latest(&self, today: NaiveDate) -> NaiveDate {
        let published = today - Duration::days(self.publication_lag_days as i64);
        match self.last {
            Some(last) => last.min(published),
            None => published,
        }
    }

    /// Check that `date` can be requested on `today`.
    pub fn check(&self, date: NaiveDate, today: NaiveDate) -> Result<(), TimeParseError> {
        let latest = self.latest(today);
        if date < self.first || date > latest {
            return Err(TimeParseError::OutOfRange {
                date,
                first: self.first,
                last: latest,
            });
        }
        Ok(())
    }
}

impl Default for AvailabilityWindow {
    fn default() -> Self {
        Self::era_interim()
    }
}

/// An inclusive span of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateSpan {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateSpan {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, TimeParseError> {
        if end < start {
            return Err(TimeParseError::InvertedSpan { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn single(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    /// Number of days covered, inclusive.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Format as the archive's `date` keyword: "start/to/end".
    pub fn to_mars(&self) -> String {
        format!(
            "{}/to/{}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

/// Unit of a CF time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    fn seconds(&self) -> f64 {
        match self {
            TimeUnit::Seconds => 1.0,
            TimeUnit::Minutes => 60.0,
            TimeUnit::Hours => 3600.0,
            TimeUnit::Days => 86400.0,
        }
    }
}

/// A decoded CF `units` attribute such as "hours since 1900-01-01 00:00:00.0".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CfTimeUnits {
    pub unit: TimeUnit,
    pub epoch: NaiveDateTime,
}

impl CfTimeUnits {
    pub fn parse(units: &str) -> Result<Self, TimeParseError> {
        let invalid = || TimeParseError::InvalidUnits(units.to_string());

        let (unit_str, epoch_str) = units.trim().split_once(" since ").ok_or_else(invalid)?;
        let unit = match unit_str.trim().to_ascii_lowercase().as_str() {
            "seconds" | "second" | "secs" | "s" => TimeUnit::Seconds,
            "minutes" | "minute" | "mins" => TimeUnit::Minutes,
            "hours" | "hour" | "hrs" | "h" => TimeUnit::Hours,
            "days" | "day" | "d" => TimeUnit::Days,
            _ => return Err(invalid()),
        };

        let epoch_str = epoch_str
            .trim()
            .trim_end_matches("UTC")
            .trim_end_matches('Z')
            .trim();
        let epoch = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(epoch_str, fmt).ok())
            .or_else(|| {
                NaiveDate::parse_from_str(epoch_str, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
            .ok_or_else(invalid)?;

        Ok(Self { unit, epoch })
    }

    /// Convert an axis value to a timestamp (gregorian calendar).
    pub fn to_datetime(&self, value: f64) -> Option<NaiveDateTime> {
        if !value.is_finite() {
            return None;
        }
        let millis = (value * self.unit.seconds() * 1000.0).round();
        if millis.abs() >= i64::MAX as f64 {
            return None;
        }
        self.epoch
            .checked_add_signed(Duration::try_milliseconds(millis as i64)?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TimeParseError {
    #[error("Invalid date: '{0}'. Expected YYYY-MM-DD")]
    InvalidFormat(String),

    #[error("{date} is outside the available range {first} to {last}")]
    OutOfRange {
        date: NaiveDate,
        first: NaiveDate,
        last: NaiveDate,
    },

    #[error("End date {end} precedes start date {start}")]
    InvertedSpan { start: NaiveDate, end: NaiveDate },

    #[error("Unsupported time units: '{0}'")]
    InvalidUnits(String),
}
