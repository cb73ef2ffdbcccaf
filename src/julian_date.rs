// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Leap-second aware instants.
//!
//! [`JulianDate`] splits an instant into a whole, noon-based Julian day number
//! and the seconds elapsed since that noon. Keeping the two apart preserves
//! sub-microsecond resolution that a single `f64` Julian date cannot hold.
//!
//! Internally every value lives on **TAI**, which is continuous. UTC appears
//! only at the edges: construction with [`TimeStandard::Utc`], calendar
//! conversion, and ISO 8601 text. All of those route through a
//! [`LeapSecondTable`], by default the process-wide
//! [`LeapSecondTable::global`].

use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use qtty::Days;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::epoch::{Epoch, TimeScale};
use crate::gregorian::{
    calendar_from_julian_day_number, julian_day_components, GregorianDate, SECONDS_PER_DAY,
    SECONDS_PER_HOUR, SECONDS_PER_MINUTE,
};
use crate::leap_seconds::LeapSecondTable;
use crate::scales::TAI;

/// The time standard in which construction components are expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeStandard {
    /// Coordinated Universal Time; converted to TAI on construction.
    Utc,
    /// International Atomic Time; stored as given.
    Tai,
}

/// An absolute instant on TAI, stored as (day number, seconds of day).
///
/// After construction `0 ≤ seconds_of_day < 86 400`, and ordering is
/// lexicographic on the pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(from = "JulianDateParts", rename_all = "camelCase")]
pub struct JulianDate {
    day_number: i32,
    seconds_of_day: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JulianDateParts {
    day_number: i32,
    seconds_of_day: f64,
}

impl From<JulianDateParts> for JulianDate {
    fn from(parts: JulianDateParts) -> Self {
        Self::from_tai_components(parts.day_number, parts.seconds_of_day)
    }
}

impl JulianDate {
    // ── constructors ──────────────────────────────────────────────────

    /// Components that are already normalised TAI.
    pub(crate) const fn from_normalized(day_number: i32, seconds_of_day: f64) -> Self {
        Self {
            day_number,
            seconds_of_day,
        }
    }

    /// Build from a (possibly fractional) Julian day number and extra seconds
    /// in `standard`, converting UTC through the global leap-second table.
    pub fn new(julian_day_number: f64, seconds_of_day: f64, standard: TimeStandard) -> Self {
        Self::new_with_table(
            julian_day_number,
            seconds_of_day,
            standard,
            &LeapSecondTable::global(),
        )
    }

    /// Like [`new`](Self::new), using an explicit leap-second table.
    pub fn new_with_table(
        julian_day_number: f64,
        seconds_of_day: f64,
        standard: TimeStandard,
        table: &LeapSecondTable,
    ) -> Self {
        debug_assert!(julian_day_number.is_finite(), "julian day number must be finite");
        debug_assert!(seconds_of_day.is_finite(), "seconds of day must be finite");

        let whole_days = julian_day_number.trunc();
        let seconds = seconds_of_day + (julian_day_number - whole_days) * SECONDS_PER_DAY;
        let date = Self::from_tai_components(whole_days as i32, seconds);
        match standard {
            TimeStandard::Tai => date,
            TimeStandard::Utc => table.utc_to_tai(date),
        }
    }

    /// Normalise raw TAI components so that `0 ≤ seconds < 86 400`.
    ///
    /// The day number saturates at the `i32` range.
    pub fn from_tai_components(whole_days: i32, seconds_of_day: f64) -> Self {
        let extra_days = (seconds_of_day / SECONDS_PER_DAY).trunc();
        let mut day_number = whole_days.saturating_add(extra_days as i32);
        let mut seconds = seconds_of_day - SECONDS_PER_DAY * extra_days;
        if seconds < 0.0 {
            day_number = day_number.saturating_sub(1);
            seconds += SECONDS_PER_DAY;
        }
        if seconds >= SECONDS_PER_DAY {
            day_number = day_number.saturating_add(1);
            seconds -= SECONDS_PER_DAY;
        }
        Self {
            day_number,
            // canonicalise -0.0
            seconds_of_day: seconds + 0.0,
        }
    }

    /// Build from a single Julian date value.
    pub fn from_total_days(total_days: f64, standard: TimeStandard) -> Self {
        Self::new(total_days, 0.0, standard)
    }

    /// Build from a UTC calendar date. A `second` of 60 denotes the inserted
    /// leap second itself.
    pub fn from_gregorian(date: &GregorianDate) -> Self {
        Self::from_gregorian_with_table(date, &LeapSecondTable::global())
    }

    /// Like [`from_gregorian`](Self::from_gregorian), using an explicit table.
    pub fn from_gregorian_with_table(date: &GregorianDate, table: &LeapSecondTable) -> Self {
        let is_leap_second = date.is_leap_second || date.second == 60;
        let second = if is_leap_second {
            date.second.saturating_sub(1)
        } else {
            date.second
        };
        let (day_number, seconds) = julian_day_components(
            date.year,
            date.month as i32,
            date.day as i32,
            date.hour as i32,
            f64::from(date.minute),
            f64::from(second),
            date.millisecond,
        );
        let tai = Self::new_with_table(f64::from(day_number), seconds, TimeStandard::Utc, table);
        if is_leap_second {
            tai.add_seconds(1.0)
        } else {
            tai
        }
    }

    /// Build from a `chrono` UTC timestamp. chrono encodes a leap second as a
    /// nanosecond field ≥ 10⁹ on second 59, which maps to second 60 here.
    pub fn from_datetime(datetime: DateTime<Utc>) -> Self {
        let nanos = datetime.nanosecond();
        let (second, nanos) = if nanos >= 1_000_000_000 {
            (60, nanos - 1_000_000_000)
        } else {
            (datetime.second(), nanos)
        };
        let naive = datetime.naive_utc();
        let date = GregorianDate {
            year: chrono::Datelike::year(&naive),
            month: chrono::Datelike::month(&naive),
            day: chrono::Datelike::day(&naive),
            hour: naive.hour(),
            minute: naive.minute(),
            second,
            millisecond: f64::from(nanos) / 1e6,
            is_leap_second: second == 60,
        };
        Self::from_gregorian(&date)
    }

    /// The current system time.
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    // ── accessors ─────────────────────────────────────────────────────

    /// Whole, noon-based Julian day number (TAI).
    #[inline]
    pub const fn day_number(&self) -> i32 {
        self.day_number
    }

    /// Seconds elapsed since noon of [`day_number`](Self::day_number) (TAI).
    #[inline]
    pub const fn seconds_of_day(&self) -> f64 {
        self.seconds_of_day
    }

    /// The instant as a single fractional Julian date (TAI).
    #[inline]
    pub fn total_days(&self) -> f64 {
        f64::from(self.day_number) + self.seconds_of_day / SECONDS_PER_DAY
    }

    /// Fold into a continuous [`Epoch`] on scale `S`.
    pub fn to_epoch<S: TimeScale>(&self) -> Epoch<S> {
        Epoch::<TAI>::from_days(Days::new(self.total_days())).to::<S>()
    }

    // ── arithmetic ────────────────────────────────────────────────────

    /// A new instant `seconds` later.
    #[inline]
    pub fn add_seconds(&self, seconds: f64) -> Self {
        debug_assert!(seconds.is_finite(), "seconds must be finite");
        Self::from_tai_components(self.day_number, self.seconds_of_day + seconds)
    }

    /// A new instant `minutes` later.
    #[inline]
    pub fn add_minutes(&self, minutes: f64) -> Self {
        self.add_seconds(minutes * SECONDS_PER_MINUTE)
    }

    /// A new instant `hours` later.
    #[inline]
    pub fn add_hours(&self, hours: f64) -> Self {
        self.add_seconds(hours * SECONDS_PER_HOUR)
    }

    /// A new instant `days` later. Whole days are added to the day number so
    /// they cost no precision.
    pub fn add_days(&self, days: f64) -> Self {
        debug_assert!(days.is_finite(), "days must be finite");
        let whole = days.trunc();
        Self::from_tai_components(
            self.day_number.saturating_add(whole as i32),
            self.seconds_of_day + (days - whole) * SECONDS_PER_DAY,
        )
    }

    /// `self − other` in seconds.
    #[inline]
    pub fn seconds_difference(&self, other: &Self) -> f64 {
        f64::from(self.day_number - other.day_number) * SECONDS_PER_DAY
            + (self.seconds_of_day - other.seconds_of_day)
    }

    /// `self − other` in days.
    #[inline]
    pub fn days_difference(&self, other: &Self) -> f64 {
        f64::from(self.day_number - other.day_number)
            + (self.seconds_of_day - other.seconds_of_day) / SECONDS_PER_DAY
    }

    /// Chronological ordering.
    #[inline]
    pub fn compare(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }

    /// Whether the two instants are within `epsilon` seconds of each other.
    #[inline]
    pub fn equals_epsilon(&self, other: &Self, epsilon: f64) -> bool {
        self.seconds_difference(other).abs() <= epsilon
    }

    // ── UTC views ─────────────────────────────────────────────────────

    /// `TAI − UTC` in effect at this instant, from the global table.
    pub fn tai_minus_utc(&self) -> f64 {
        LeapSecondTable::global().offset_at(self)
    }

    /// The calendar date in UTC.
    ///
    /// Inside an inserted leap second there is no UTC instant, so the
    /// conversion is done one second earlier and `second` is reported as 60.
    pub fn to_gregorian(&self) -> GregorianDate {
        self.to_gregorian_with_table(&LeapSecondTable::global())
    }

    /// Like [`to_gregorian`](Self::to_gregorian), using an explicit table.
    pub fn to_gregorian_with_table(&self, table: &LeapSecondTable) -> GregorianDate {
        let (utc, is_leap_second) = match table.tai_to_utc(self) {
            Some(utc) => (utc, false),
            None => {
                // Only reachable strictly inside a leap second, where the
                // preceding second always converts.
                let earlier = self.add_seconds(-1.0);
                (table.tai_to_utc(&earlier).unwrap_or(earlier), true)
            }
        };

        let mut julian_day_number = utc.day_number;
        let seconds_of_day = utc.seconds_of_day;
        if seconds_of_day >= 43_200.0 {
            julian_day_number += 1;
        }
        let (year, month, day) = calendar_from_julian_day_number(julian_day_number);

        let mut hour = (seconds_of_day / SECONDS_PER_HOUR) as u32;
        let mut remaining = seconds_of_day - f64::from(hour) * SECONDS_PER_HOUR;
        let minute = (remaining / SECONDS_PER_MINUTE) as u32;
        remaining -= f64::from(minute) * SECONDS_PER_MINUTE;
        let mut second = remaining as u32;
        let millisecond = (remaining - f64::from(second)) * 1000.0;

        // Julian days begin at noon.
        hour += 12;
        if hour > 23 {
            hour -= 24;
        }
        if is_leap_second {
            second += 1;
        }

        GregorianDate {
            year,
            month,
            day,
            hour,
            minute,
            second,
            millisecond,
            is_leap_second,
        }
    }

    /// Convert to a `chrono` UTC timestamp. A leap second is carried in
    /// chrono's nanosecond overflow. Returns `None` outside chrono's range.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        let g = self.to_gregorian();
        let date = NaiveDate::from_ymd_opt(g.year, g.month, g.day)?;
        let millis = g.millisecond.clamp(0.0, 999.999_999);
        let mut nanos = (millis * 1e6).round() as u32;
        let second = if g.is_leap_second {
            nanos += 1_000_000_000;
            59
        } else {
            g.second
        };
        let time = NaiveTime::from_hms_nano_opt(g.hour, g.minute, second, nanos)?;
        Some(date.and_time(time).and_utc())
    }
}

// ── Equality and ordering ─────────────────────────────────────────────────

impl PartialEq for JulianDate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for JulianDate {}

impl PartialOrd for JulianDate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for JulianDate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.day_number
            .cmp(&other.day_number)
            .then_with(|| self.seconds_of_day.total_cmp(&other.seconds_of_day))
    }
}

impl std::fmt::Display for JulianDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601(None))
    }
}
