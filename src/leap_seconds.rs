// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! # Leap-second table: the UTC ↔ TAI bridge
//!
//! A [`LeapSecondTable`] is an ordered list of [`LeapSecond`] entries, each
//! the TAI instant at which a new `TAI − UTC` offset takes effect. The table
//! is **append-only**: entries may be inserted (in order) when Earth
//! orientation data reveals a leap second this build does not know about,
//! but never removed or reordered.
//!
//! The process-wide default returned by [`LeapSecondTable::global`] is seeded
//! with [`HISTORICAL_LEAP_SECONDS`]. Tests and embedders that need isolation
//! build their own with [`LeapSecondTable::historical`].
//!
//! ## Conversion rules
//! * UTC → TAI: find the first entry at or after the UTC instant; if that
//!   entry's UTC moment (TAI minus its offset) is still in the future, step
//!   back one. At the exact boundary the post-leap offset wins.
//! * TAI → UTC: undefined (`None`) for instants strictly inside the inserted
//!   second, i.e. in `(entry − 1 s, entry)`.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock, PoisonError, RwLock, RwLockReadGuard};

use crate::julian_date::JulianDate;

/// A `TAI − UTC` offset and the TAI instant it takes effect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LeapSecond {
    /// First TAI instant at which `offset` applies.
    pub date: JulianDate,
    /// Cumulative `TAI − UTC` in seconds.
    pub offset: f64,
}

impl LeapSecond {
    pub const fn new(date: JulianDate, offset: f64) -> Self {
        Self { date, offset }
    }
}

const fn entry(day_number: i32, seconds_of_day: f64, offset: f64) -> LeapSecond {
    LeapSecond::new(JulianDate::from_normalized(day_number, seconds_of_day), offset)
}

/// Every leap second announced since UTC adopted integral offsets.
///
/// Each date is 00:00:00 UTC of the named day, expressed on TAI. These
/// values are an interchange contract and must stay bit-identical.
#[rustfmt::skip]
pub const HISTORICAL_LEAP_SECONDS: [LeapSecond; 28] = [
    entry(2_441_317, 43_210.0, 10.0), // 1972-01-01
    entry(2_441_499, 43_211.0, 11.0), // 1972-07-01
    entry(2_441_683, 43_212.0, 12.0), // 1973-01-01
    entry(2_442_048, 43_213.0, 13.0), // 1974-01-01
    entry(2_442_413, 43_214.0, 14.0), // 1975-01-01
    entry(2_442_778, 43_215.0, 15.0), // 1976-01-01
    entry(2_443_144, 43_216.0, 16.0), // 1977-01-01
    entry(2_443_509, 43_217.0, 17.0), // 1978-01-01
    entry(2_443_874, 43_218.0, 18.0), // 1979-01-01
    entry(2_444_239, 43_219.0, 19.0), // 1980-01-01
    entry(2_444_786, 43_220.0, 20.0), // 1981-07-01
    entry(2_445_151, 43_221.0, 21.0), // 1982-07-01
    entry(2_445_516, 43_222.0, 22.0), // 1983-07-01
    entry(2_446_247, 43_223.0, 23.0), // 1985-07-01
    entry(2_447_161, 43_224.0, 24.0), // 1988-01-01
    entry(2_447_892, 43_225.0, 25.0), // 1990-01-01
    entry(2_448_257, 43_226.0, 26.0), // 1991-01-01
    entry(2_448_804, 43_227.0, 27.0), // 1992-07-01
    entry(2_449_169, 43_228.0, 28.0), // 1993-07-01
    entry(2_449_534, 43_229.0, 29.0), // 1994-07-01
    entry(2_450_083, 43_230.0, 30.0), // 1996-01-01
    entry(2_450_630, 43_231.0, 31.0), // 1997-07-01
    entry(2_451_179, 43_232.0, 32.0), // 1999-01-01
    entry(2_453_736, 43_233.0, 33.0), // 2006-01-01
    entry(2_454_832, 43_234.0, 34.0), // 2009-01-01
    entry(2_456_109, 43_235.0, 35.0), // 2012-07-01
    entry(2_457_204, 43_236.0, 36.0), // 2015-07-01
    entry(2_457_754, 43_237.0, 37.0), // 2017-01-01
];

/// Ordered, append-only `TAI − UTC` history.
///
/// Interior mutability lets a shared (`Arc`) table grow while it is being
/// read; every mutation goes through [`insert`](Self::insert).
#[derive(Debug)]
pub struct LeapSecondTable {
    entries: RwLock<Vec<LeapSecond>>,
}

static GLOBAL: OnceLock<Arc<LeapSecondTable>> = OnceLock::new();

impl LeapSecondTable {
    /// A table holding exactly `entries`, sorted by date. Entries that repeat
    /// an instant keep the first occurrence.
    pub fn from_entries(entries: impl IntoIterator<Item = LeapSecond>) -> Self {
        let mut entries: Vec<LeapSecond> = entries.into_iter().collect();
        entries.sort_by(|a, b| a.date.cmp(&b.date));
        entries.dedup_by(|later, earlier| later.date == earlier.date);
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// A fresh, private copy of the historical record.
    pub fn historical() -> Self {
        Self::from_entries(HISTORICAL_LEAP_SECONDS)
    }

    /// The process-wide table used by every conversion that does not take an
    /// explicit one. Seeded with the historical record on first use.
    pub fn global() -> Arc<Self> {
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(Self::historical())))
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<LeapSecond>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Snapshot of the entries in order.
    pub fn entries(&self) -> Vec<LeapSecond> {
        self.read().clone()
    }

    /// Insert `leap_second` at its sorted position. Returns `false` (and
    /// changes nothing) when an entry already exists at that instant.
    pub fn insert(&self, leap_second: LeapSecond) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        match entries.binary_search_by(|e| e.date.cmp(&leap_second.date)) {
            Ok(_) => false,
            Err(index) => {
                tracing::info!(
                    day_number = leap_second.date.day_number(),
                    seconds_of_day = leap_second.date.seconds_of_day(),
                    offset = leap_second.offset,
                    "registered leap second"
                );
                entries.insert(index, leap_second);
                true
            }
        }
    }

    /// `TAI − UTC` in effect at the TAI instant `date`: the offset of the
    /// latest entry at or before it, or the first entry's offset for earlier
    /// instants. An empty table yields 0.
    pub fn offset_at(&self, date: &JulianDate) -> f64 {
        let entries = self.read();
        let index = match entries.binary_search_by(|e| e.date.cmp(date)) {
            Ok(index) => index,
            Err(index) => index.saturating_sub(1),
        };
        entries.get(index).map_or(0.0, |e| e.offset)
    }

    /// Shift UTC components (held in a [`JulianDate`]) onto TAI.
    pub fn utc_to_tai(&self, utc: JulianDate) -> JulianDate {
        let entries = self.read();
        if entries.is_empty() {
            return utc;
        }

        let mut index = match entries.binary_search_by(|e| e.date.cmp(&utc)) {
            Ok(index) | Err(index) => index.min(entries.len() - 1),
        };
        let mut offset = entries[index].offset;

        // `index` is the first entry at or after the UTC value read as TAI.
        // If the UTC moment of that entry is still ahead, the previous
        // offset is the one in force.
        if index > 0 {
            let difference = entries[index].date.seconds_difference(&utc);
            if difference > offset {
                index -= 1;
                offset = entries[index].offset;
            }
        }

        utc.add_seconds(offset)
    }

    /// UTC components for the TAI instant `tai`, or `None` when `tai` lies
    /// inside an inserted leap second.
    pub fn tai_to_utc(&self, tai: &JulianDate) -> Option<JulianDate> {
        let entries = self.read();
        let Some(first) = entries.first() else {
            return Some(*tai);
        };

        let index = match entries.binary_search_by(|e| e.date.cmp(tai)) {
            Ok(index) | Err(index) => index,
        };
        if index == 0 {
            return Some(tai.add_seconds(-first.offset));
        }
        if index >= entries.len() {
            return Some(tai.add_seconds(-entries[index - 1].offset));
        }

        let difference = entries[index].date.seconds_difference(tai);
        if difference == 0.0 {
            return Some(tai.add_seconds(-entries[index].offset));
        }
        if difference <= 1.0 {
            return None;
        }
        Some(tai.add_seconds(-entries[index - 1].offset))
    }
}

impl Default for LeapSecondTable {
    fn default() -> Self {
        Self::historical()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn historical_table_is_strictly_ascending() {
        for pair in HISTORICAL_LEAP_SECONDS.windows(2) {
            assert!(pair[0].date < pair[1].date);
            assert!(pair[0].offset < pair[1].offset);
        }
    }

    #[test]
    fn offset_is_piecewise_constant_and_non_decreasing() {
        let table = LeapSecondTable::historical();
        let mut date = JulianDate::from_normalized(2_441_000, 0.0);
        let mut previous = table.offset_at(&date);
        assert_eq!(previous, 10.0);
        while date.day_number() < 2_460_000 {
            date = date.add_days(17.25);
            let offset = table.offset_at(&date);
            assert!(offset >= previous);
            assert!(offset - previous <= 1.0);
            previous = offset;
        }
        assert_eq!(previous, 37.0);
    }

    #[test]
    fn offset_switches_exactly_at_entry() {
        let table = LeapSecondTable::historical();
        let entry = HISTORICAL_LEAP_SECONDS[25];
        assert_eq!(table.offset_at(&entry.date), 35.0);
        assert_eq!(table.offset_at(&entry.date.add_seconds(-1e-6)), 34.0);
    }

    #[test]
    fn insert_keeps_order_and_ignores_duplicates() {
        let table = LeapSecondTable::historical();
        let future = LeapSecond::new(JulianDate::from_normalized(2_462_000, 43_238.0), 38.0);
        assert!(table.insert(future));
        assert!(!table.insert(future));
        assert!(!table.insert(HISTORICAL_LEAP_SECONDS[3]));
        assert_eq!(table.len(), 29);
        assert_eq!(table.entries().last(), Some(&future));

        let far_future = JulianDate::from_normalized(2_470_000, 0.0);
        assert_eq!(table.offset_at(&far_future), 38.0);
    }

    #[test]
    fn inserted_entries_do_not_leak_between_tables() {
        let a = LeapSecondTable::historical();
        let b = LeapSecondTable::historical();
        a.insert(LeapSecond::new(JulianDate::from_normalized(2_462_000, 43_238.0), 38.0));
        assert_eq!(b.len(), HISTORICAL_LEAP_SECONDS.len());
    }

    #[test]
    fn tai_to_utc_is_undefined_inside_leap_second() {
        let table = LeapSecondTable::historical();
        let entry = HISTORICAL_LEAP_SECONDS[26].date; // 2015-07-01 on TAI
        assert!(table.tai_to_utc(&entry.add_seconds(-0.5)).is_none());
        assert!(table.tai_to_utc(&entry.add_seconds(-1.0)).is_none());

        let before = table.tai_to_utc(&entry.add_seconds(-1.5)).unwrap();
        assert_eq!(before.seconds_of_day(), 43_199.5);
        let at = table.tai_to_utc(&entry).unwrap();
        assert_eq!(at.seconds_of_day(), 43_200.0);
    }

    #[test]
    fn utc_tai_roundtrip_away_from_boundaries() {
        let table = LeapSecondTable::historical();
        for utc_seconds in [0.0, 1_000.0, 43_199.0, 43_200.0, 80_000.0] {
            for day in [2_440_000, 2_450_000, 2_456_109, 2_457_754, 2_461_000] {
                let utc = JulianDate::from_tai_components(day, utc_seconds);
                let tai = table.utc_to_tai(utc);
                assert_eq!(table.tai_to_utc(&tai), Some(utc));
            }
        }
    }

    #[test]
    fn empty_table_is_identity() {
        let table = LeapSecondTable::from_entries([]);
        let date = JulianDate::from_normalized(2_451_545, 10.0);
        assert_eq!(table.utc_to_tai(date), date);
        assert_eq!(table.tai_to_utc(&date), Some(date));
        assert_eq!(table.offset_at(&date), 0.0);
    }
}
