// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! # Earth orientation parameters
//!
//! Polar motion, celestial pole offsets and `UT1 − UTC`, tabulated per day
//! and linearly interpolated in between.
//!
//! ## Source format
//!
//! ```json
//! {
//!   "columnNames": ["dateIso8601", "modifiedJulianDateUtc", "xPoleWanderRadians", ...],
//!   "samples": ["1992-01-01T00:00:00Z", 48622.0, 1.9e-7, ...]
//! }
//! ```
//!
//! `samples` is row-major with one value per column. The seven columns in
//! [`REQUIRED_COLUMNS`] must be present and numeric; anything else is
//! ignored.
//!
//! ## Loading
//!
//! [`EarthOrientationParameters::load`] returns a future that installs the
//! table when it completes. If several loads overlap, the most recently
//! issued one wins; completions of superseded loads are discarded. Until a
//! load succeeds [`compute`](EarthOrientation::compute) returns `None`.
//!
//! When [`EopConfig::add_new_leap_seconds`] is set, every change of
//! `taiMinusUtcSeconds` between adjacent rows is registered in the
//! provider's [`LeapSecondTable`] at install time.

use futures::future::LocalBoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use crate::error::EopError;
use crate::fetch::JsonFetcher;
use crate::julian_date::{JulianDate, TimeStandard};
use crate::leap_seconds::{LeapSecond, LeapSecondTable};
use crate::scales::MJD_EPOCH;

/// Column names an Earth orientation record must provide.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "modifiedJulianDateUtc",
    "xPoleWanderRadians",
    "yPoleWanderRadians",
    "ut1MinusUtcSeconds",
    "xCelestialPoleOffsetRadians",
    "yCelestialPoleOffsetRadians",
    "taiMinusUtcSeconds",
];

/// Construction options for [`EarthOrientationParameters`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EopConfig {
    /// Register leap seconds found in loaded data that the table lacks.
    pub add_new_leap_seconds: bool,
}

impl Default for EopConfig {
    fn default() -> Self {
        Self {
            add_new_leap_seconds: true,
        }
    }
}

/// Interpolated Earth orientation at one instant. Angles in radians,
/// `ut1_minus_utc` in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EopSample {
    pub x_pole_wander: f64,
    pub y_pole_wander: f64,
    pub x_pole_offset: f64,
    pub y_pole_offset: f64,
    pub ut1_minus_utc: f64,
}

/// Anything that can report Earth orientation at an instant.
///
/// `None` means the data is not available yet; callers retry later.
pub trait EarthOrientation {
    fn compute(&self, date: &JulianDate) -> Option<EopSample>;
}

/// Provider that reports zero for every parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoEop;

impl EarthOrientation for NoEop {
    fn compute(&self, _date: &JulianDate) -> Option<EopSample> {
        Some(EopSample::default())
    }
}

// ── Parsed table ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
struct EopRow {
    date: JulianDate,
    x_pole_wander: f64,
    y_pole_wander: f64,
    ut1_minus_utc: f64,
    x_pole_offset: f64,
    y_pole_offset: f64,
    tai_minus_utc: f64,
}

impl EopRow {
    fn sample(&self) -> EopSample {
        EopSample {
            x_pole_wander: self.x_pole_wander,
            y_pole_wander: self.y_pole_wander,
            x_pole_offset: self.x_pole_offset,
            y_pole_offset: self.y_pole_offset,
            ut1_minus_utc: self.ut1_minus_utc,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EopRecord {
    column_names: Option<Vec<String>>,
    samples: Option<Vec<Value>>,
}

fn parse_rows(value: &Value, table: &LeapSecondTable) -> Result<Vec<EopRow>, EopError> {
    let record = EopRecord::deserialize(value).map_err(|e| EopError::Malformed(e.to_string()))?;
    let column_names = record.column_names.ok_or(EopError::MissingColumnNames)?;
    let samples = record.samples.ok_or(EopError::MissingSamples)?;

    let mut columns = [0usize; REQUIRED_COLUMNS.len()];
    let mut missing = Vec::new();
    for (slot, name) in columns.iter_mut().zip(REQUIRED_COLUMNS) {
        match column_names.iter().position(|c| c == name) {
            Some(index) => *slot = index,
            None => missing.push(name),
        }
    }
    if !missing.is_empty() {
        return Err(EopError::MissingColumns { missing });
    }

    let stride = column_names.len();
    if samples.len() % stride != 0 {
        return Err(EopError::RaggedSamples {
            len: samples.len(),
            stride,
        });
    }

    samples
        .chunks_exact(stride)
        .enumerate()
        .map(|(row, values)| {
            let mut numbers = [0.0; REQUIRED_COLUMNS.len()];
            for ((number, &column), name) in numbers.iter_mut().zip(&columns).zip(REQUIRED_COLUMNS)
            {
                *number = values[column].as_f64().ok_or_else(|| {
                    EopError::Malformed(format!("row {row}: {name} is not a number"))
                })?;
            }
            let [mjd, x_pole_wander, y_pole_wander, ut1_minus_utc, x_pole_offset, y_pole_offset, tai_minus_utc] =
                numbers;
            let date = JulianDate::new_with_table(
                mjd + MJD_EPOCH.value(),
                tai_minus_utc,
                TimeStandard::Tai,
                table,
            );
            Ok(EopRow {
                date,
                x_pole_wander,
                y_pole_wander,
                ut1_minus_utc,
                x_pole_offset,
                y_pole_offset,
                tai_minus_utc,
            })
        })
        .collect()
}

#[derive(Debug)]
struct EopData {
    rows: Vec<EopRow>,
    last_index: Option<usize>,
}

impl EopData {
    fn bracket(&mut self, date: &JulianDate) -> (usize, usize) {
        let rows = &self.rows;
        if let Some(last) = self.last_index {
            let next = rows.get(last + 1).map(|r| r.date);
            let is_after_previous = rows[last].date <= *date;
            let is_before_next = next.map_or(true, |n| n >= *date);
            if is_after_previous && is_before_next {
                let before = if next == Some(*date) { last + 1 } else { last };
                return (before, before + 1);
            }
        }

        let (before, after) = match rows.binary_search_by(|r| r.date.cmp(date)) {
            Ok(mut index) => {
                if rows.get(index + 1).is_some_and(|r| r.date == *date) {
                    index += 1;
                }
                (index, index)
            }
            Err(after) => (after.saturating_sub(1), after),
        };
        tracing::trace!(before, after, "EOP bracket cache miss");
        self.last_index = Some(before);
        (before, after)
    }

    fn interpolate(&self, date: &JulianDate, before: usize, after: usize) -> EopSample {
        let rows = &self.rows;
        let previous = &rows[before];
        if *date == previous.date {
            return previous.sample();
        }
        let Some(next) = rows.get(after) else {
            return EopSample::default();
        };
        if previous.date == next.date {
            return previous.sample();
        }
        if *date == next.date {
            return next.sample();
        }

        let factor = date.seconds_difference(&previous.date)
            / next.date.seconds_difference(&previous.date);

        // Across a leap second UT1 − UTC jumps by about a second; shift one
        // endpoint so the interpolation stays continuous.
        let mut before_ut1 = previous.ut1_minus_utc;
        let mut after_ut1 = next.ut1_minus_utc;
        let offset_difference = after_ut1 - before_ut1;
        if (offset_difference > 0.5 || offset_difference < -0.5)
            && previous.tai_minus_utc != next.tai_minus_utc
        {
            if next.date == *date {
                before_ut1 = after_ut1;
            } else {
                after_ut1 -= next.tai_minus_utc - previous.tai_minus_utc;
            }
        }

        let lerp = |a: f64, b: f64| a + factor * (b - a);
        EopSample {
            x_pole_wander: lerp(previous.x_pole_wander, next.x_pole_wander),
            y_pole_wander: lerp(previous.y_pole_wander, next.y_pole_wander),
            x_pole_offset: lerp(previous.x_pole_offset, next.x_pole_offset),
            y_pole_offset: lerp(previous.y_pole_offset, next.y_pole_offset),
            ut1_minus_utc: lerp(before_ut1, after_ut1),
        }
    }
}

#[derive(Debug, Default)]
struct EopState {
    data: Option<EopData>,
    error: Option<EopError>,
    generation: u64,
}

// ── Provider ─────────────────────────────────────────────────────────────

/// Tabulated Earth orientation parameters.
///
/// Cloning yields another handle to the same table, so an engine and the
/// code that loads data can share one provider.
#[derive(Debug, Clone)]
pub struct EarthOrientationParameters {
    config: EopConfig,
    table: Arc<LeapSecondTable>,
    state: Rc<RefCell<EopState>>,
}

impl EarthOrientationParameters {
    /// An empty provider registering leap seconds into the global table.
    pub fn new(config: EopConfig) -> Self {
        Self::with_table(config, LeapSecondTable::global())
    }

    /// An empty provider bound to an explicit leap-second table.
    pub fn with_table(config: EopConfig, table: Arc<LeapSecondTable>) -> Self {
        Self {
            config,
            table,
            state: Rc::new(RefCell::new(EopState::default())),
        }
    }

    /// A provider initialised synchronously from an in-memory record.
    pub fn from_value(value: &Value, config: EopConfig) -> Result<Self, EopError> {
        let provider = Self::new(config);
        provider.install(value)?;
        Ok(provider)
    }

    pub fn config(&self) -> &EopConfig {
        &self.config
    }

    pub fn leap_seconds(&self) -> &Arc<LeapSecondTable> {
        &self.table
    }

    /// Whether a table has been installed.
    pub fn is_ready(&self) -> bool {
        self.state.borrow().data.is_some()
    }

    /// Number of installed rows.
    pub fn len(&self) -> usize {
        self.state.borrow().data.as_ref().map_or(0, |d| d.rows.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Error from the most recent load, if it failed.
    pub fn load_error(&self) -> Option<EopError> {
        self.state.borrow().error.clone()
    }

    /// Parse and install `value` immediately, superseding any pending load.
    pub fn install(&self, value: &Value) -> Result<(), EopError> {
        let generation = self.next_generation();
        self.finish(generation, parse_rows(value, &self.table))
    }

    /// Fetch `url` and install the result when the returned future
    /// completes. The future does not borrow `self`; it can be spawned.
    pub fn load(
        &self,
        fetcher: &dyn JsonFetcher,
        url: &str,
    ) -> LocalBoxFuture<'static, Result<(), EopError>> {
        let generation = self.next_generation();
        tracing::debug!(url, generation, "requesting EOP data");
        let request = fetcher.fetch_json(url);
        let this = self.clone();
        async move {
            let parsed = match request.await {
                Ok(value) => parse_rows(&value, &this.table),
                Err(e) => Err(EopError::from(e)),
            };
            this.finish(generation, parsed)
        }
        .boxed_local()
    }

    fn next_generation(&self) -> u64 {
        let mut state = self.state.borrow_mut();
        state.generation += 1;
        state.generation
    }

    fn finish(&self, generation: u64, parsed: Result<Vec<EopRow>, EopError>) -> Result<(), EopError> {
        if self.state.borrow().generation != generation {
            tracing::warn!(generation, "discarding EOP load superseded by a newer request");
            return parsed.map(drop);
        }
        match parsed {
            Ok(rows) => {
                if self.config.add_new_leap_seconds {
                    self.register_leap_seconds(&rows);
                }
                tracing::info!(rows = rows.len(), "installed Earth orientation parameters");
                let mut state = self.state.borrow_mut();
                state.data = Some(EopData {
                    rows,
                    last_index: None,
                });
                state.error = None;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load Earth orientation parameters");
                self.state.borrow_mut().error = Some(e.clone());
                Err(e)
            }
        }
    }

    fn register_leap_seconds(&self, rows: &[EopRow]) {
        for pair in rows.windows(2) {
            if pair[1].tai_minus_utc != pair[0].tai_minus_utc {
                self.table
                    .insert(LeapSecond::new(pair[1].date, pair[1].tai_minus_utc));
            }
        }
    }
}

impl Default for EarthOrientationParameters {
    fn default() -> Self {
        Self::new(EopConfig::default())
    }
}

impl EarthOrientation for EarthOrientationParameters {
    fn compute(&self, date: &JulianDate) -> Option<EopSample> {
        let mut state = self.state.borrow_mut();
        let data = state.data.as_mut()?;
        if data.rows.is_empty() {
            return Some(EopSample::default());
        }
        let (before, after) = data.bracket(date);
        Some(data.interpolate(date, before, after))
    }
}

impl<T: EarthOrientation + ?Sized> EarthOrientation for Rc<T> {
    fn compute(&self, date: &JulianDate) -> Option<EopSample> {
        (**self).compute(date)
    }
}
