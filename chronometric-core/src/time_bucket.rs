// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Classification and conversion of time buckets
//!
//! The precision of a bucket is never stored. It is recovered from the magnitude of the
//! value each time it is needed, so the integer written to storage stays exactly the one
//! handed in by the producer.

use std::fmt;

use jiff::Timestamp;
use jiff::civil::DateTime;
use jiff::tz::TimeZone;

use crate::error::InvalidPrecisionState;

const MINUTES_PER_HOUR: u64 = 60;
const MINUTES_PER_DAY: u64 = 24 * MINUTES_PER_HOUR;

/// The granularity a metric is aggregated at.
///
/// Ordered from finest to coarsest, so `Precision::Minute < Precision::Month`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Precision {
    /// `YYYYMMDDhhmm`
    Minute,
    /// `YYYYMMDDhh`
    Hour,
    /// `YYYYMMDD`
    Day,
    /// `YYYYMM`
    Month,
}

impl Precision {
    /// Classify a raw bucket value by its magnitude.
    ///
    /// The ranges are open intervals, so a value sitting exactly on a power-of-ten boundary
    /// (e.g. `100000000000`) is not minute, hour or day and falls through to [`Precision::Month`].
    /// Calendar-dependent operations on such a value then fail with [`InvalidPrecisionState`].
    pub const fn classify(raw: u64) -> Self {
        if raw > 100_000_000_000 && raw < 999_999_999_999 {
            Precision::Minute
        } else if raw > 1_000_000_000 && raw < 9_999_999_999 {
            Precision::Hour
        } else if raw > 10_000_000 && raw < 99_999_999 {
            Precision::Day
        } else {
            Precision::Month
        }
    }

    /// The lower-case name of this precision.
    pub const fn as_str(self) -> &'static str {
        match self {
            Precision::Minute => "minute",
            Precision::Hour => "hour",
            Precision::Day => "day",
            Precision::Month => "month",
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A calendar moment encoded as decimal digits, whose digit count implies its [`Precision`].
///
/// This is a transparent wrapper: [`TimeBucket::get`] always returns the value it was built
/// from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TimeBucket(u64);

impl TimeBucket {
    /// Wrap a raw bucket value.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw bucket value.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// The precision implied by the magnitude of this bucket. See [`Precision::classify`].
    pub const fn precision(self) -> Precision {
        Precision::classify(self.0)
    }

    /// Encode `datetime` at the given precision, dropping every finer field.
    ///
    /// Years are expected to have four digits. Negative years are clamped to 0 and produce a
    /// bucket that does not classify to `precision`.
    pub fn of(datetime: DateTime, precision: Precision) -> Self {
        let month = u64::from(datetime.year().max(0) as u16) * 100 + datetime.month() as u64;
        let day = month * 100 + datetime.day() as u64;
        let hour = day * 100 + datetime.hour() as u64;
        let minute = hour * 100 + datetime.minute() as u64;
        Self(match precision {
            Precision::Month => month,
            Precision::Day => day,
            Precision::Hour => hour,
            Precision::Minute => minute,
        })
    }

    /// Encode the wall-clock time of `timestamp` in `time_zone` at the given precision.
    pub fn from_timestamp(
        timestamp: Timestamp,
        time_zone: &TimeZone,
        precision: Precision,
    ) -> Self {
        Self::of(timestamp.to_zoned(time_zone.clone()).datetime(), precision)
    }

    /// Convert a minute bucket to its hour bucket.
    pub fn to_hour(self) -> Result<Self, InvalidPrecisionState> {
        match self.precision() {
            Precision::Minute => Ok(Self(self.0 / 100)),
            _ => Err(InvalidPrecisionState::new(self, "to_hour")),
        }
    }

    /// Convert a minute or hour bucket to its day bucket.
    pub fn to_day(self) -> Result<Self, InvalidPrecisionState> {
        match self.precision() {
            Precision::Minute => Ok(Self(self.0 / 10_000)),
            Precision::Hour => Ok(Self(self.0 / 100)),
            _ => Err(InvalidPrecisionState::new(self, "to_day")),
        }
    }

    /// Convert a minute, hour or day bucket to its month bucket.
    pub fn to_month(self) -> Result<Self, InvalidPrecisionState> {
        match self.precision() {
            Precision::Minute => Ok(Self(self.0 / 1_000_000)),
            Precision::Hour => Ok(Self(self.0 / 10_000)),
            Precision::Day => Ok(Self(self.0 / 100)),
            Precision::Month => Err(InvalidPrecisionState::new(self, "to_month")),
        }
    }

    /// Convert this bucket to the given coarser precision.
    ///
    /// There is no conversion towards [`Precision::Minute`], so that target always fails.
    pub fn convert(self, target: Precision) -> Result<Self, InvalidPrecisionState> {
        match target {
            Precision::Minute => Err(InvalidPrecisionState::new(self, "to_minute")),
            Precision::Hour => self.to_hour(),
            Precision::Day => self.to_day(),
            Precision::Month => self.to_month(),
        }
    }

    /// Decode the first minute covered by this bucket.
    ///
    /// Fails when the digits do not name a real calendar moment, e.g. `201813` or a boundary
    /// value that classified as a month.
    pub fn start(self) -> Result<DateTime, InvalidPrecisionState> {
        let raw = self.0;
        let (head, day, hour, minute) = match self.precision() {
            Precision::Minute => (
                raw / 100_000_000 * 100 + raw / 1_000_000 % 100,
                raw / 10_000 % 100,
                raw / 100 % 100,
                raw % 100,
            ),
            Precision::Hour => (raw / 10_000, raw / 100 % 100, raw % 100, 0),
            Precision::Day => (raw / 100, raw % 100, 0, 0),
            Precision::Month => (raw, 1, 0, 0),
        };
        let invalid = || InvalidPrecisionState::new(self, "start");
        let year = i16::try_from(head / 100).map_err(|_| invalid())?;
        DateTime::new(
            year,
            (head % 100) as i8,
            day as i8,
            hour as i8,
            minute as i8,
            0,
            0,
        )
        .map_err(|_| invalid())
    }

    /// The number of minutes this bucket spans.
    ///
    /// Month buckets are calendar aware (`201802` spans 28 days, `201602` spans 29). The finer
    /// precisions depend only on the classification.
    pub fn duration_in_minutes(self) -> Result<u64, InvalidPrecisionState> {
        match self.precision() {
            Precision::Minute => Ok(1),
            Precision::Hour => Ok(MINUTES_PER_HOUR),
            Precision::Day => Ok(MINUTES_PER_DAY),
            Precision::Month => {
                let start = self
                    .start()
                    .map_err(|_| InvalidPrecisionState::new(self, "duration_in_minutes"))?;
                Ok(start.date().days_in_month() as u64 * MINUTES_PER_DAY)
            }
        }
    }
}

impl From<u64> for TimeBucket {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl From<TimeBucket> for u64 {
    fn from(bucket: TimeBucket) -> Self {
        bucket.0
    }
}

impl fmt::Display for TimeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
