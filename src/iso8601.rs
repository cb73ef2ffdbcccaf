// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! ISO 8601 text interchange for [`JulianDate`].
//!
//! Accepted date forms (extended or basic):
//!
//! | Form | Examples |
//! |------|----------|
//! | calendar date | `2012-07-01`, `20120701` |
//! | calendar month | `2012-07` |
//! | year | `2012` |
//! | ordinal date | `2012-183`, `2012183` |
//! | week date | `2012-W26`, `2012W266`, `2012-W26-7` |
//!
//! The optional time part follows a mandatory `T` and may be `hh`, `hh:mm`
//! or `hh:mm:ss`, each with a decimal fraction (`.` or `,`) on its last
//! component and an optional `Z`, `±hh`, `±hhmm` or `±hh:mm` designator.
//! A seconds value of `60` denotes an inserted leap second. Times without a
//! designator are read as UTC.

use chrono::{Datelike, NaiveDate};
use std::str::FromStr;

use crate::error::Iso8601Error;
use crate::gregorian::{days_in_month, is_leap_year, julian_day_components};
use crate::julian_date::{JulianDate, TimeStandard};
use crate::leap_seconds::LeapSecondTable;

/// Minimal anchored cursor over ASCII input.
struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(s: &'a str) -> Self {
        Self {
            bytes: s.as_bytes(),
            pos: 0,
        }
    }

    /// Exactly `n` ASCII digits.
    fn digits(&mut self, n: usize) -> Option<u32> {
        let end = self.pos + n;
        let slice = self.bytes.get(self.pos..end)?;
        if !slice.iter().all(u8::is_ascii_digit) {
            return None;
        }
        self.pos = end;
        Some(slice.iter().fold(0, |acc, b| acc * 10 + u32::from(b - b'0')))
    }

    fn eat(&mut self, c: u8) -> bool {
        if self.bytes.get(self.pos) == Some(&c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_any(&mut self, set: &[u8]) -> Option<u8> {
        let c = *self.bytes.get(self.pos)?;
        if set.contains(&c) {
            self.pos += 1;
            Some(c)
        } else {
            None
        }
    }

    /// `(\.\d+)?` as a fraction in `[0, 1)`.
    fn fraction(&mut self) -> Option<f64> {
        let start = self.pos;
        if !self.eat(b'.') {
            return None;
        }
        let digits_start = self.pos;
        while self.bytes.get(self.pos).is_some_and(u8::is_ascii_digit) {
            self.pos += 1;
        }
        if self.pos == digits_start {
            self.pos = start;
            return None;
        }
        let text = std::str::from_utf8(&self.bytes[digits_start..self.pos]).ok()?;
        format!("0.{text}").parse().ok()
    }

    fn done(&self) -> bool {
        self.pos == self.bytes.len()
    }
}

/// Date components before validation.
struct DateFields {
    year: i32,
    month: u32,
    day: u32,
    /// `Some(true)` for extended, `Some(false)` for basic, `None` when the
    /// form has no separators either way.
    extended: Option<bool>,
}

/// Time components before offset application.
struct TimeFields {
    hour: i32,
    minute: f64,
    second: f64,
    millisecond: f64,
    offset: UtcOffset,
    extended: Option<bool>,
}

enum UtcOffset {
    Utc,
    East { hours: u32, minutes: u32 },
    West { hours: u32, minutes: u32 },
}

fn parse_date(input: &str, date: &str) -> Result<DateFields, Iso8601Error> {
    let err = |reason| Iso8601Error::new(input, reason);
    let dash_count = date.matches('-').count();

    // YYYY-MM-DD | YYYYMMDD
    let mut c = Cursor::new(date);
    if let (Some(y), _, Some(m), _, Some(d), true) = (
        c.digits(4),
        c.eat(b'-'),
        c.digits(2),
        c.eat(b'-'),
        c.digits(2),
        c.done(),
    ) {
        if dash_count > 0 && dash_count != 2 {
            return Err(err("mixed basic and extended calendar date"));
        }
        return Ok(DateFields {
            year: y as i32,
            month: m,
            day: d,
            extended: Some(dash_count == 2),
        });
    }

    // YYYY-MM (YYYYMM is not allowed)
    let mut c = Cursor::new(date);
    if let (Some(y), true, Some(m), true) = (c.digits(4), c.eat(b'-'), c.digits(2), c.done()) {
        return Ok(DateFields {
            year: y as i32,
            month: m,
            day: 1,
            extended: Some(true),
        });
    }

    // YYYY
    let mut c = Cursor::new(date);
    if let (Some(y), true) = (c.digits(4), c.done()) {
        return Ok(DateFields {
            year: y as i32,
            month: 1,
            day: 1,
            extended: None,
        });
    }

    // YYYY-DDD | YYYYDDD
    let mut c = Cursor::new(date);
    if let (Some(y), _, Some(day_of_year), true) =
        (c.digits(4), c.eat(b'-'), c.digits(3), c.done())
    {
        let year = y as i32;
        let max = if is_leap_year(year) { 366 } else { 365 };
        if day_of_year < 1 || day_of_year > max {
            return Err(err("day of year out of range"));
        }
        return ordinal_to_calendar(input, year, i64::from(day_of_year), dash_count > 0);
    }

    // YYYY-Www | YYYYWww | YYYY-Www-D | YYYYWwwD
    let mut c = Cursor::new(date);
    if let (Some(y), dashed_week, true, Some(week)) =
        (c.digits(4), c.eat(b'-'), c.eat(b'W'), c.digits(2))
    {
        let dashed_day = c.eat(b'-');
        let day_of_week = c.digits(1);
        if !c.done() {
            return Err(err("unrecognised week date"));
        }
        if dashed_day && day_of_week.is_none() {
            return Err(err("week date missing day of week"));
        }
        if day_of_week.is_some() && dashed_week != dashed_day {
            return Err(err("mixed basic and extended week date"));
        }
        let year = y as i32;
        let january_4 =
            NaiveDate::from_ymd_opt(year, 1, 4).ok_or_else(|| err("year out of range"))?;
        let day_of_year = i64::from(week) * 7 + i64::from(day_of_week.unwrap_or(0))
            - i64::from(january_4.weekday().number_from_monday())
            - 3;
        return ordinal_to_calendar(input, year, day_of_year, dashed_week);
    }

    Err(err("unrecognised date form"))
}

/// Split an ordinal day (which may spill into adjacent years) into a
/// calendar date.
fn ordinal_to_calendar(
    input: &str,
    year: i32,
    day_of_year: i64,
    extended: bool,
) -> Result<DateFields, Iso8601Error> {
    let date = NaiveDate::from_ymd_opt(year, 1, 1)
        .and_then(|jan_1| jan_1.checked_add_signed(chrono::Duration::days(day_of_year - 1)))
        .ok_or_else(|| Iso8601Error::new(input, "ordinal date out of range"))?;
    Ok(DateFields {
        year: date.year(),
        month: date.month(),
        day: date.day(),
        extended: Some(extended),
    })
}

/// The zone designator, which must end the input: nothing, `Z`, or a sign
/// followed by `hh`, `hhmm` or `hh:mm`.
fn parse_offset(c: &mut Cursor<'_>) -> Option<UtcOffset> {
    if c.done() {
        return Some(UtcOffset::Utc);
    }
    let offset = match c.eat_any(b"Z+-")? {
        b'Z' => UtcOffset::Utc,
        sign => {
            let hours = c.digits(2)?;
            let minutes = if c.eat(b':') {
                c.digits(2)?
            } else {
                c.digits(2).unwrap_or(0)
            };
            if sign == b'+' {
                UtcOffset::East { hours, minutes }
            } else {
                UtcOffset::West { hours, minutes }
            }
        }
    };
    c.done().then_some(offset)
}

fn parse_time(input: &str, time: &str) -> Result<TimeFields, Iso8601Error> {
    let err = |reason| Iso8601Error::new(input, reason);

    // hh:mm:ss(.f)
    let mut c = Cursor::new(time);
    if let (Some(h), first_colon, Some(m), second_colon, Some(s)) = (
        c.digits(2),
        c.eat(b':'),
        c.digits(2),
        c.eat(b':'),
        c.digits(2),
    ) {
        let fraction = c.fraction().unwrap_or(0.0);
        if let Some(offset) = parse_offset(&mut c) {
            if first_colon != second_colon {
                return Err(err("mixed basic and extended time"));
            }
            return Ok(TimeFields {
                hour: h as i32,
                minute: f64::from(m),
                second: f64::from(s),
                millisecond: fraction * 1000.0,
                offset,
                extended: Some(first_colon),
            });
        }
    }

    // hh:mm(.f)
    let mut c = Cursor::new(time);
    if let (Some(h), colon, Some(m)) = (c.digits(2), c.eat(b':'), c.digits(2)) {
        let fraction = c.fraction().unwrap_or(0.0);
        if let Some(offset) = parse_offset(&mut c) {
            return Ok(TimeFields {
                hour: h as i32,
                minute: f64::from(m),
                second: fraction * 60.0,
                millisecond: 0.0,
                offset,
                extended: Some(colon),
            });
        }
    }

    // hh(.f)
    let mut c = Cursor::new(time);
    if let Some(h) = c.digits(2) {
        let fraction = c.fraction().unwrap_or(0.0);
        if let Some(offset) = parse_offset(&mut c) {
            return Ok(TimeFields {
                hour: h as i32,
                minute: fraction * 60.0,
                second: 0.0,
                millisecond: 0.0,
                offset,
                extended: None,
            });
        }
    }

    Err(err("unrecognised time form"))
}

impl JulianDate {
    /// Parse an ISO 8601 date/time using the global leap-second table.
    pub fn from_iso8601(text: &str) -> Result<Self, Iso8601Error> {
        Self::from_iso8601_with_table(text, &LeapSecondTable::global())
    }

    /// Parse an ISO 8601 date/time using an explicit leap-second table.
    pub fn from_iso8601_with_table(
        text: &str,
        table: &LeapSecondTable,
    ) -> Result<Self, Iso8601Error> {
        let err = |reason| Iso8601Error::new(text, reason);
        if !text.is_ascii() {
            return Err(err("non-ASCII input"));
        }

        // Comma and full stop are both decimal signs.
        let normalized = text.replace(',', ".");
        let (date, time) = match normalized.split_once('T') {
            Some((date, time)) => (date, Some(time)),
            None => (normalized.as_str(), None),
        };
        if date.is_empty() {
            return Err(err("missing date"));
        }
        if time.is_some_and(|t| t.contains('T')) {
            return Err(err("more than one time designator"));
        }

        let DateFields {
            mut year,
            mut month,
            day,
            extended: date_extended,
        } = parse_date(text, date)?;

        if !(1..=12).contains(&month) || day < 1 || day > days_in_month(year, month) {
            return Err(err("date component out of range"));
        }

        let mut day = day as i32;
        let (mut hour, mut minute, mut second, millisecond) = match time {
            None => (0, 0.0, 0.0, 0.0),
            Some(time) => {
                let t = parse_time(text, time)?;
                if let (Some(date_extended), Some(time_extended)) = (date_extended, t.extended) {
                    if date_extended != time_extended {
                        return Err(err("mixed basic and extended date and time"));
                    }
                }
                if t.minute >= 60.0
                    || t.second >= 61.0
                    || t.hour > 24
                    || (t.hour == 24 && (t.minute > 0.0 || t.second > 0.0 || t.millisecond > 0.0))
                {
                    return Err(err("time component out of range"));
                }
                let (hour, minute) = match t.offset {
                    UtcOffset::Utc => (t.hour, t.minute),
                    UtcOffset::East { hours, minutes } => {
                        (t.hour - hours as i32, t.minute - f64::from(minutes))
                    }
                    UtcOffset::West { hours, minutes } => {
                        (t.hour + hours as i32, t.minute + f64::from(minutes))
                    }
                };
                (hour, minute, t.second, t.millisecond)
            }
        };

        // Build the UTC instant one second early and restore the leap second
        // once on the continuous scale.
        let is_leap_second = second == 60.0;
        if is_leap_second {
            second -= 1.0;
        }

        // Offsets and 24:00 can push components out of range.
        while minute >= 60.0 {
            minute -= 60.0;
            hour += 1;
        }
        while hour >= 24 {
            hour -= 24;
            day += 1;
        }
        while day > days_in_month(year, month) as i32 {
            day -= days_in_month(year, month) as i32;
            month += 1;
            if month > 12 {
                month -= 12;
                year += 1;
            }
        }
        while minute < 0.0 {
            minute += 60.0;
            hour -= 1;
        }
        while hour < 0 {
            hour += 24;
            day -= 1;
        }
        while day < 1 {
            month -= 1;
            if month < 1 {
                month += 12;
                year -= 1;
            }
            day += days_in_month(year, month) as i32;
        }

        let (day_number, seconds) = julian_day_components(
            year,
            month as i32,
            day,
            hour,
            minute,
            second,
            millisecond,
        );
        let tai = Self::new_with_table(f64::from(day_number), seconds, TimeStandard::Utc, table);
        Ok(if is_leap_second {
            tai.add_seconds(1.0)
        } else {
            tai
        })
    }

    /// Format as ISO 8601 extended UTC (`YYYY-MM-DDThh:mm:ss[.f]Z`).
    ///
    /// With `precision = None` the fractional seconds are printed in full
    /// and omitted when zero; `Some(0)` always omits them; `Some(n)` prints
    /// exactly `n` fractional digits.
    pub fn to_iso8601(&self, precision: Option<usize>) -> String {
        self.to_iso8601_with_table(precision, &LeapSecondTable::global())
    }

    /// Like [`to_iso8601`](Self::to_iso8601), using an explicit table.
    pub fn to_iso8601_with_table(&self, precision: Option<usize>, table: &LeapSecondTable) -> String {
        let g = self.to_gregorian_with_table(table);
        let (mut year, mut month, mut day, mut hour) = (g.year, g.month, g.day, g.hour);
        let (minute, second, millisecond) = (g.minute, g.second, g.millisecond);

        // Maximum sentinel: the first instant of year 10000 prints as 24:00.
        if year == 10000 && month == 1 && day == 1 && hour == 0 && minute == 0 && second == 0 && millisecond == 0.0 {
            year = 9999;
            month = 12;
            day = 31;
            hour = 24;
        }

        let stem = format!("{year:04}-{month:02}-{day:02}T{hour:02}:{minute:02}:{second:02}");
        match precision {
            None if millisecond != 0.0 => {
                let digits = format!("{}", millisecond * 0.01).replacen('.', "", 1);
                format!("{stem}.{digits}Z")
            }
            None | Some(0) => format!("{stem}Z"),
            Some(precision) => {
                let digits = format!("{:.precision$}", millisecond * 0.01).replacen('.', "", 1);
                let digits: String = digits.chars().take(precision).collect();
                format!("{stem}.{digits}Z")
            }
        }
    }
}

impl FromStr for JulianDate {
    type Err = Iso8601Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_iso8601(s)
    }
}
