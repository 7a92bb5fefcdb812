//! Rental periods, reporting windows and business timezone handling
//!
//! Two kinds of time span appear in the engine:
//!
//! - [`RentalPeriod`]: a half-open `[start, end)` pair of UTC timestamps. A
//!   booking ending at the instant another begins does not overlap it.
//! - [`DateRange`]: an inclusive pair of calendar dates used for reporting
//!   windows. It is turned into UTC bounds through a [`Timezone`].

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;
use thiserror::Error;

const SECONDS_PER_DAY: i64 = 86_400;

/// Number of whole days covering `duration`, rounding any partial day up
///
/// Zero and negative durations yield zero.
pub fn ceil_days(duration: Duration) -> i64 {
    let secs = duration.num_seconds();
    if secs <= 0 {
        return 0;
    }
    (secs + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY
}

/// Timezone wrapper for the business calendar
///
/// Wraps chrono_tz::Tz with string serialization (`"Asia/Beirut"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timezone(pub Tz);

impl Serialize for Timezone {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.0.name())
    }
}

impl<'de> Deserialize<'de> for Timezone {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Timezone::parse(&s).map_err(serde::de::Error::custom)
    }
}

impl Timezone {
    pub fn new(tz: Tz) -> Self {
        Self(tz)
    }

    /// Parses an IANA timezone name
    pub fn parse(name: &str) -> Result<Self, TemporalError> {
        Tz::from_str(name)
            .map(Timezone)
            .map_err(|_| TemporalError::UnknownTimezone(name.to_string()))
    }

    /// Returns the calendar date of `instant` in this timezone
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.0).date_naive()
    }

    /// Gets local midnight of `date` as UTC
    ///
    /// When midnight does not exist locally (a DST gap), the date is taken at
    /// UTC midnight instead.
    pub fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        let naive = date.and_time(NaiveTime::MIN);
        self.0
            .from_local_datetime(&naive)
            .earliest()
            .map(|local| local.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
    }
}

impl Default for Timezone {
    fn default() -> Self {
        Self(chrono_tz::UTC)
    }
}

/// Errors related to temporal operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemporalError {
    #[error("Invalid period: start {start} must be before end {end}")]
    InvalidPeriod {
        start: String,
        end: String,
    },

    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),
}

/// A half-open `[start, end)` rental interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalPeriod {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl RentalPeriod {
    /// Creates a period, rejecting `end <= start`
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, TemporalError> {
        if end <= start {
            return Err(TemporalError::InvalidPeriod {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Returns true if `instant` lies in `[start, end)`
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }

    /// Half-open overlap test: `s1 < e2 && s2 < e1`
    pub fn overlaps(&self, other: &RentalPeriod) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Length of the intersection with `other`, zero when disjoint
    pub fn overlap_duration(&self, other: &RentalPeriod) -> Duration {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        if end > start {
            end - start
        } else {
            Duration::zero()
        }
    }

    /// Calendar span in days, partial days counted as whole
    pub fn calendar_days(&self) -> i64 {
        ceil_days(self.end - self.start)
    }

    /// Returns the period with its end moved `days` calendar days later
    pub fn extended_by_days(&self, days: u32) -> Self {
        Self {
            start: self.start,
            end: self.end + Duration::days(i64::from(days)),
        }
    }
}

/// An inclusive range of calendar dates used for reporting windows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, TemporalError> {
        if start > end {
            return Err(TemporalError::InvalidPeriod {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Number of calendar days in the window, both ends included
    pub fn days_inclusive(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Converts to a half-open UTC period from local midnight of `start` to
    /// local midnight after `end`
    pub fn to_period(&self, tz: &Timezone) -> Result<RentalPeriod, TemporalError> {
        let start = tz.start_of_day(self.start);
        let end = tz.start_of_day(self.end + Duration::days(1));
        RentalPeriod::new(start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_touching_periods_do_not_overlap() {
        let a = RentalPeriod::new(utc(2026, 3, 1), utc(2026, 3, 5)).unwrap();
        let b = RentalPeriod::new(utc(2026, 3, 5), utc(2026, 3, 10)).unwrap();

        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn test_period_rejects_empty_range() {
        let at = utc(2026, 3, 1);
        assert!(matches!(
            RentalPeriod::new(at, at),
            Err(TemporalError::InvalidPeriod { .. })
        ));
    }

    #[test]
    fn test_ceil_days_rounds_partial_days_up() {
        assert_eq!(ceil_days(Duration::hours(1)), 1);
        assert_eq!(ceil_days(Duration::days(3)), 3);
        assert_eq!(ceil_days(Duration::days(3) + Duration::seconds(1)), 4);
        assert_eq!(ceil_days(Duration::zero()), 0);
        assert_eq!(ceil_days(Duration::hours(-5)), 0);
    }

    #[test]
    fn test_date_range_to_period_in_beirut() {
        let tz = Timezone::parse("Asia/Beirut").unwrap();
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
        )
        .unwrap();

        let period = range.to_period(&tz).unwrap();
        assert_eq!(range.days_inclusive(), 31);
        assert_eq!(period.calendar_days(), 31);
        assert_eq!(period.start(), Utc.with_ymd_and_hms(2025, 12, 31, 22, 0, 0).unwrap());
    }
}
