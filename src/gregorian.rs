// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Proleptic Gregorian calendar arithmetic.
//!
//! Both directions use integer Julian Day Number algorithms whose divisions
//! truncate toward zero, which is exactly Rust's `i32` division. Results are
//! identical to the published tables back to year 0.

use serde::{Deserialize, Serialize};

/// Seconds in one civil or atomic day.
pub const SECONDS_PER_DAY: f64 = 86_400.0;
pub(crate) const SECONDS_PER_HOUR: f64 = 3_600.0;
pub(crate) const SECONDS_PER_MINUTE: f64 = 60.0;

const DAYS_IN_MONTH: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// A broken-down UTC calendar date.
///
/// `second` is 60 only while a leap second is being inserted, in which case
/// `is_leap_second` is also set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GregorianDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub millisecond: f64,
    pub is_leap_second: bool,
}

impl GregorianDate {
    /// A whole-second calendar date that is not a leap second (unless
    /// `second` is 60).
    pub fn new(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
            millisecond: 0.0,
            is_leap_second: second == 60,
        }
    }

    /// Same date with a millisecond component.
    pub fn with_millisecond(mut self, millisecond: f64) -> Self {
        self.millisecond = millisecond;
        self
    }

    /// Whether this date lies in a calendar leap year.
    pub fn is_in_leap_year(&self) -> bool {
        is_leap_year(self.year)
    }
}

/// Gregorian leap-year rule.
#[inline]
pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Number of days in `month` (1-based) of `year`.
#[inline]
pub fn days_in_month(year: i32, month: u32) -> u32 {
    if month == 2 && is_leap_year(year) {
        29
    } else {
        DAYS_IN_MONTH[(month as usize).clamp(1, 12) - 1]
    }
}

/// Noon-based Julian day number and seconds past noon for a calendar
/// date/time (Fliegel & Van Flandern).
///
/// The returned seconds are not normalised: `minute` and `second` may carry
/// fractions, and callers pass the pair straight into
/// [`JulianDate`](crate::JulianDate) construction.
pub(crate) fn julian_day_components(
    year: i32,
    month: i32,
    day: i32,
    hour: i32,
    minute: f64,
    second: f64,
    millisecond: f64,
) -> (i32, f64) {
    let a = (month - 14) / 12;
    let b = year + 4800 + a;
    let mut day_number = (1461 * b) / 4 + (367 * (month - 2 - 12 * a)) / 12
        - (3 * ((b + 100) / 100)) / 4
        + day
        - 32075;

    // Julian days begin at noon.
    let mut hour = hour - 12;
    if hour < 0 {
        hour += 24;
    }

    let seconds_of_day = second
        + (f64::from(hour) * SECONDS_PER_HOUR
            + minute * SECONDS_PER_MINUTE
            + millisecond * 0.001);

    if seconds_of_day >= 43_200.0 {
        day_number -= 1;
    }

    (day_number, seconds_of_day)
}

/// Calendar date for a midnight-based Julian day number.
///
/// Explanatory Supplement to the Astronomical Almanac (Seidelmann 1992), p. 604.
pub(crate) fn calendar_from_julian_day_number(julian_day_number: i32) -> (i32, u32, u32) {
    let mut l = julian_day_number + 68569;
    let n = (4 * l) / 146097;
    l -= (146097 * n + 3) / 4;
    let i = (4000 * (l + 1)) / 1461001;
    l = l - (1461 * i) / 4 + 31;
    let j = (80 * l) / 2447;
    let day = l - (2447 * j) / 80;
    l = j / 11;
    let month = j + 2 - 12 * l;
    let year = 100 * (n - 49) + i + l;
    (year, month as u32, day as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn j2000_noon_is_day_2451545() {
        let (day, seconds) = julian_day_components(2000, 1, 1, 12, 0.0, 0.0, 0.0);
        assert_eq!(day, 2_451_545);
        assert_eq!(seconds, 0.0);
    }

    #[test]
    fn midnight_belongs_to_previous_julian_day() {
        let (day, seconds) = julian_day_components(2012, 7, 1, 0, 0.0, 0.0, 0.0);
        assert_eq!(day, 2_456_109);
        assert_eq!(seconds, 43_200.0);
    }

    #[test]
    fn year_zero_is_proleptic() {
        // 0000-03-01 is JDN 1 721 120.
        let (day, _) = julian_day_components(0, 3, 1, 12, 0.0, 0.0, 0.0);
        assert_eq!(day, 1_721_120);
        assert_eq!(calendar_from_julian_day_number(1_721_120), (0, 3, 1));
    }

    #[test]
    fn calendar_roundtrip_over_four_centuries() {
        let mut jdn = 2_305_448; // 1600-01-01
        while jdn < 2_451_545 + 400 {
            let (y, m, d) = calendar_from_julian_day_number(jdn);
            let (back, _) = julian_day_components(y, m as i32, d as i32, 12, 0.0, 0.0, 0.0);
            assert_eq!(back, jdn, "{y}-{m}-{d}");
            jdn += 37;
        }
    }

    #[test]
    fn leap_years() {
        assert!(is_leap_year(2000));
        assert!(!is_leap_year(1900));
        assert!(is_leap_year(2024));
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2023, 12), 31);
    }
}
