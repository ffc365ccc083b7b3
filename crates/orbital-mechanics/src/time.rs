//! Julian dates and sidereal time

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Julian date of 1970-01-01T00:00:00Z
const UNIX_EPOCH_JD: f64 = 2_440_587.5;

/// Julian date of J2000.0 (2000-01-01T12:00:00 TT, taken as UT1 here)
const J2000_JD: f64 = 2_451_545.0;

const SECONDS_PER_DAY: f64 = 86_400.0;
const MINUTES_PER_DAY: f64 = 1_440.0;

/// Julian date split into a whole-day part (ending in .5) and a day fraction,
/// which keeps sub-millisecond resolution that a single f64 would lose.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JulianDate {
    pub day: f64,
    pub fraction: f64,
}

impl JulianDate {
    pub fn from_datetime(time: DateTime<Utc>) -> Self {
        let secs = time.timestamp();
        let days = secs.div_euclid(86_400);
        let rem = secs.rem_euclid(86_400) as f64 + time.timestamp_subsec_nanos() as f64 * 1e-9;

        Self {
            day: UNIX_EPOCH_JD + days as f64,
            fraction: rem / SECONDS_PER_DAY,
        }
    }

    pub fn from_naive_utc(time: NaiveDateTime) -> Self {
        Self::from_datetime(DateTime::<Utc>::from_naive_utc_and_offset(time, Utc))
    }

    pub fn value(&self) -> f64 {
        self.day + self.fraction
    }

    /// Minutes elapsed from `earlier` to `self`
    pub fn minutes_since(&self, earlier: &JulianDate) -> f64 {
        ((self.day - earlier.day) + (self.fraction - earlier.fraction)) * MINUTES_PER_DAY
    }

    /// Greenwich mean sidereal time in radians (IAU-82), in [0, 2π)
    pub fn gmst(&self) -> f64 {
        let t = ((self.day - J2000_JD) + self.fraction) / 36_525.0;
        let seconds = -6.2e-6 * t * t * t
            + 0.093104 * t * t
            + (876_600.0 * 3_600.0 + 8_640_184.812866) * t
            + 67_310.54841;
        // 240 seconds of sidereal time per degree
        (seconds / 240.0).to_radians().rem_euclid(TAU)
    }
}

impl From<DateTime<Utc>> for JulianDate {
    fn from(time: DateTime<Utc>) -> Self {
        Self::from_datetime(time)
    }
}
