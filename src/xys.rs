// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! # IAU 2006 XYS precession-nutation series
//!
//! The CIP coordinates `X`, `Y` and the CIO locator `s` are tabulated on a
//! fixed TT grid (one sample per day from 1975) and split into JSON chunks
//! of [`XysConfig::samples_per_xys_file`] samples each. Values between grid
//! points come from a Lagrange polynomial of degree
//! [`XysConfig::interpolation_order`] over the samples centred on the query.
//!
//! ## Polling
//!
//! [`PrecessionNutation::compute_xys_radians`] never waits. If any sample
//! of the interpolation window is missing it schedules the owning chunk on
//! the provider's executor and returns `None`; the caller asks again on a
//! later frame. Each chunk has at most one request in flight, shared by
//! every poller and by [`PrecessionNutation::preload`]. A chunk whose
//! request fails is forgotten, so the next poll retries it.

use futures::future::{self, LocalBoxFuture, Shared};
use futures::task::{LocalSpawn, LocalSpawnExt};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::error::XysError;
use crate::fetch::JsonFetcher;
use crate::gregorian::SECONDS_PER_DAY;
use crate::julian_date::{JulianDate, TimeStandard};

/// Placeholder in [`XysConfig::url_template`] replaced by the chunk index.
pub const CHUNK_INDEX_PLACEHOLDER: &str = "{0}";

/// Table geometry and asset location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct XysConfig {
    /// Chunk URL with `{0}` standing for the chunk index.
    pub url_template: String,
    /// Degree of the interpolating polynomial; the window holds one more
    /// sample than this.
    pub interpolation_order: usize,
    /// TT Julian date of sample 0.
    pub sample_zero_julian_ephemeris_date: f64,
    /// Grid spacing in days.
    pub step_size_days: f64,
    pub samples_per_xys_file: usize,
    pub total_samples: usize,
}

impl Default for XysConfig {
    fn default() -> Self {
        Self {
            url_template: "Assets/IAU2006_XYS/IAU2006_XYS_{0}.json".to_owned(),
            interpolation_order: 9,
            sample_zero_julian_ephemeris_date: 2_442_396.5,
            step_size_days: 1.0,
            samples_per_xys_file: 1000,
            total_samples: 27_426,
        }
    }
}

impl XysConfig {
    /// URL of chunk `index`.
    pub fn chunk_url(&self, index: usize) -> String {
        self.url_template
            .replace(CHUNK_INDEX_PLACEHOLDER, &index.to_string())
    }

    /// Number of chunks covering the table.
    pub fn chunk_count(&self) -> usize {
        self.total_samples.div_ceil(self.samples_per_xys_file)
    }
}

/// CIP `X`, `Y` and CIO locator `s`, all in radians.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct XysSample {
    pub x: f64,
    pub y: f64,
    pub s: f64,
}

/// Source of interpolated precession-nutation angles.
pub trait PrecessionNutation {
    /// `(X, Y, s)` at the TT instant `day_tt` + `second_tt`, or `None` while
    /// the covering samples are unavailable.
    fn compute_xys_radians(&self, day_tt: i32, second_tt: f64) -> Option<XysSample>;

    /// Request every chunk needed to interpolate between two TT instants.
    /// The returned future resolves once all of them have arrived.
    fn preload(
        &self,
        start_tt: &JulianDate,
        stop_tt: &JulianDate,
    ) -> LocalBoxFuture<'static, Result<(), XysError>>;
}

type ChunkRequest = Shared<LocalBoxFuture<'static, Result<(), XysError>>>;

#[derive(Debug, Deserialize)]
struct XysChunk {
    samples: Vec<f64>,
}

struct XysState {
    samples: Vec<Option<XysSample>>,
    loaded_chunks: HashSet<usize>,
    in_flight: HashMap<usize, ChunkRequest>,
}

impl XysState {
    /// Fill indices `[chunk · per_file, (chunk + 1) · per_file)` from a
    /// chunk document. Rewriting a chunk stores the same values again.
    fn write_chunk(&mut self, chunk: usize, per_file: usize, value: &Value) -> Result<(), XysError> {
        let total = self.samples.len();
        let count = total.div_ceil(per_file);
        if chunk >= count {
            return Err(XysError::ChunkOutOfRange { chunk, count });
        }
        let parsed = XysChunk::deserialize(value).map_err(|e| XysError::Malformed {
            chunk,
            message: e.to_string(),
        })?;
        if parsed.samples.len() % 3 != 0 {
            return Err(XysError::SampleCountMismatch {
                chunk,
                len: parsed.samples.len(),
            });
        }

        let start = chunk * per_file;
        let capacity = per_file.min(total - start);
        let samples = parsed.samples.len() / 3;
        if samples > capacity {
            return Err(XysError::TooManySamples {
                chunk,
                samples,
                capacity,
            });
        }
        for (slot, triple) in self.samples[start..start + capacity]
            .iter_mut()
            .zip(parsed.samples.chunks_exact(3))
        {
            *slot = Some(XysSample {
                x: triple[0],
                y: triple[1],
                s: triple[2],
            });
        }
        self.loaded_chunks.insert(chunk);
        tracing::debug!(chunk, samples, "XYS chunk loaded");
        Ok(())
    }
}

/// Chunk-loaded IAU 2006 XYS table.
///
/// Clones share the table and the in-flight requests.
#[derive(Clone)]
pub struct Iau2006Xys {
    config: Rc<XysConfig>,
    sample_zero: JulianDate,
    denominators: Rc<[f64]>,
    x_table: Rc<[f64]>,
    fetcher: Rc<dyn JsonFetcher>,
    spawner: Rc<dyn LocalSpawn>,
    state: Rc<RefCell<XysState>>,
}

impl std::fmt::Debug for Iau2006Xys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Iau2006Xys")
            .field("config", &self.config)
            .field("loaded_chunks", &state.loaded_chunks)
            .field("in_flight", &state.in_flight.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Iau2006Xys {
    /// A provider that fetches chunks through `fetcher` and drives the
    /// requests on `spawner`.
    pub fn new(
        config: XysConfig,
        fetcher: Rc<dyn JsonFetcher>,
        spawner: impl LocalSpawn + 'static,
    ) -> Self {
        debug_assert!(config.step_size_days > 0.0, "step size must be positive");
        debug_assert!(config.samples_per_xys_file > 0, "chunks must hold samples");

        let order = config.interpolation_order;
        let step = config.step_size_days;
        let step_n = step.powi(order as i32);
        let mut denominators = Vec::with_capacity(order + 1);
        let mut x_table = Vec::with_capacity(order + 1);
        for i in 0..=order {
            let mut denominator = step_n;
            for j in (0..=order).filter(|&j| j != i) {
                denominator *= i as f64 - j as f64;
            }
            denominators.push(1.0 / denominator);
            x_table.push(i as f64 * step);
        }

        let sample_zero = JulianDate::new(
            config.sample_zero_julian_ephemeris_date,
            0.0,
            TimeStandard::Tai,
        );
        let samples = vec![None; config.total_samples];

        Self {
            config: Rc::new(config),
            sample_zero,
            denominators: denominators.into(),
            x_table: x_table.into(),
            fetcher,
            spawner: Rc::new(spawner),
            state: Rc::new(RefCell::new(XysState {
                samples,
                loaded_chunks: HashSet::new(),
                in_flight: HashMap::new(),
            })),
        }
    }

    pub fn config(&self) -> &XysConfig {
        &self.config
    }

    /// TT instant of sample 0.
    pub fn sample_zero(&self) -> JulianDate {
        self.sample_zero
    }

    /// Install a chunk document directly, bypassing the fetcher.
    pub fn load_chunk(&self, chunk: usize, value: &Value) -> Result<(), XysError> {
        self.state
            .borrow_mut()
            .write_chunk(chunk, self.config.samples_per_xys_file, value)
    }

    pub fn is_chunk_loaded(&self, chunk: usize) -> bool {
        self.state.borrow().loaded_chunks.contains(&chunk)
    }

    /// Chunks with a request outstanding, ascending.
    pub fn chunks_in_flight(&self) -> Vec<usize> {
        let mut chunks: Vec<usize> = self.state.borrow().in_flight.keys().copied().collect();
        chunks.sort_unstable();
        chunks
    }

    fn request_chunk(&self, chunk: usize) -> ChunkRequest {
        {
            let state = self.state.borrow();
            if state.loaded_chunks.contains(&chunk) {
                return future::ready(Ok(())).boxed_local().shared();
            }
            if let Some(pending) = state.in_flight.get(&chunk) {
                return pending.clone();
            }
        }

        let url = self.config.chunk_url(chunk);
        tracing::debug!(chunk, url = %url, "requesting XYS chunk");
        let response = self.fetcher.fetch_json(&url);
        let state = Rc::clone(&self.state);
        let per_file = self.config.samples_per_xys_file;
        let request = async move {
            let result = match response.await {
                Ok(value) => state.borrow_mut().write_chunk(chunk, per_file, &value),
                Err(e) => Err(XysError::from(e)),
            };
            state.borrow_mut().in_flight.remove(&chunk);
            if let Err(e) = &result {
                tracing::warn!(chunk, error = %e, "XYS chunk request failed; will retry on next use");
            }
            result
        }
        .boxed_local()
        .shared();

        self.state
            .borrow_mut()
            .in_flight
            .insert(chunk, request.clone());
        match self.spawner.spawn_local(request.clone().map(drop)) {
            Ok(()) => request,
            Err(e) => {
                tracing::warn!(chunk, error = %e, "could not schedule XYS chunk request");
                self.state.borrow_mut().in_flight.remove(&chunk);
                future::ready(Err(XysError::Spawn {
                    chunk,
                    message: e.to_string(),
                }))
                .boxed_local()
                .shared()
            }
        }
    }
}

impl PrecessionNutation for Iau2006Xys {
    fn compute_xys_radians(&self, day_tt: i32, second_tt: f64) -> Option<XysSample> {
        let config = &*self.config;
        let days_since_epoch = f64::from(day_tt - self.sample_zero.day_number())
            + (second_tt - self.sample_zero.seconds_of_day()) / SECONDS_PER_DAY;
        if days_since_epoch < 0.0 {
            return None;
        }

        let center_index = (days_since_epoch / config.step_size_days).trunc() as usize;
        if center_index >= config.total_samples {
            return None;
        }

        let degree = config.interpolation_order;
        let mut first_index = center_index.saturating_sub(degree / 2);
        let mut last_index = first_index + degree;
        if last_index >= config.total_samples {
            last_index = config.total_samples - 1;
            first_index = last_index.saturating_sub(degree);
        }

        let window: Vec<XysSample> = {
            let state = self.state.borrow();
            state.samples[first_index..=last_index]
                .iter()
                .copied()
                .collect::<Option<_>>()
                .unwrap_or_default()
        };
        if window.len() != last_index - first_index + 1 {
            let per_file = config.samples_per_xys_file;
            let missing: HashSet<usize> = {
                let state = self.state.borrow();
                (first_index..=last_index)
                    .filter(|&i| state.samples[i].is_none())
                    .map(|i| i / per_file)
                    .collect()
            };
            // The spawned request fills the table; the next poll sees it.
            for chunk in missing {
                drop(self.request_chunk(chunk));
            }
            return None;
        }

        let x = days_since_epoch - first_index as f64 * config.step_size_days;
        let work: Vec<f64> = self.x_table.iter().map(|node| x - node).collect();

        let mut result = XysSample::default();
        for (i, sample) in window.iter().enumerate() {
            let mut coefficient = self.denominators[i];
            for (j, w) in work.iter().enumerate() {
                if j != i {
                    coefficient *= w;
                }
            }
            result.x += coefficient * sample.x;
            result.y += coefficient * sample.y;
            result.s += coefficient * sample.s;
        }
        Some(result)
    }

    fn preload(
        &self,
        start_tt: &JulianDate,
        stop_tt: &JulianDate,
    ) -> LocalBoxFuture<'static, Result<(), XysError>> {
        let config = &*self.config;
        let half_order = config.interpolation_order as f64 / 2.0;
        let start_days = start_tt.days_difference(&self.sample_zero);
        let stop_days = stop_tt.days_difference(&self.sample_zero);

        let start_index = (start_days / config.step_size_days - half_order)
            .trunc()
            .max(0.0) as usize;
        let stop_index = ((stop_days / config.step_size_days - half_order).trunc()
            + config.interpolation_order as f64)
            .max(0.0) as usize;
        let stop_index = stop_index.min(config.total_samples.saturating_sub(1));

        let per_file = config.samples_per_xys_file;
        let requests: Vec<ChunkRequest> = (start_index / per_file..=stop_index / per_file)
            .map(|chunk| self.request_chunk(chunk))
            .collect();

        future::join_all(requests)
            .map(|results| results.into_iter().collect())
            .boxed_local()
    }
}

impl<T: PrecessionNutation + ?Sized> PrecessionNutation for Rc<T> {
    fn compute_xys_radians(&self, day_tt: i32, second_tt: f64) -> Option<XysSample> {
        (**self).compute_xys_radians(day_tt, second_tt)
    }

    fn preload(
        &self,
        start_tt: &JulianDate,
        stop_tt: &JulianDate,
    ) -> LocalBoxFuture<'static, Result<(), XysError>> {
        (**self).preload(start_tt, stop_tt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::MemoryFetcher;
    use futures::executor::LocalPool;
    use serde_json::json;

    fn small_config() -> XysConfig {
        XysConfig {
            url_template: "xys/{0}.json".to_owned(),
            samples_per_xys_file: 20,
            total_samples: 60,
            ..XysConfig::default()
        }
    }

    /// Quadratic in the sample index, so degree-9 interpolation is exact.
    fn value_at(index: f64) -> XysSample {
        XysSample {
            x: 1e-3 + 2e-6 * index + 3e-9 * index * index,
            y: -4e-4 + 1e-7 * index,
            s: 5e-8 * index * index,
        }
    }

    fn chunk_document(chunk: usize, per_file: usize) -> Value {
        let samples: Vec<f64> = (chunk * per_file..(chunk + 1) * per_file)
            .flat_map(|i| {
                let v = value_at(i as f64);
                [v.x, v.y, v.s]
            })
            .collect();
        json!({ "samples": samples })
    }

    fn fixture(config: XysConfig) -> (LocalPool, Rc<MemoryFetcher>, Iau2006Xys) {
        let pool = LocalPool::new();
        let fetcher = Rc::new(MemoryFetcher::new());
        for chunk in 0..config.chunk_count() {
            fetcher.insert(
                config.chunk_url(chunk),
                chunk_document(chunk, config.samples_per_xys_file),
            );
        }
        let xys = Iau2006Xys::new(config, fetcher.clone(), pool.spawner());
        (pool, fetcher, xys)
    }

    /// Day/second pair `days` after sample zero.
    fn at(xys: &Iau2006Xys, days: f64) -> (i32, f64) {
        let zero = xys.sample_zero();
        (zero.day_number(), zero.seconds_of_day() + days * SECONDS_PER_DAY)
    }

    #[test]
    fn default_grid_starts_in_1975() {
        let config = XysConfig::default();
        assert_eq!(config.chunk_url(27), "Assets/IAU2006_XYS/IAU2006_XYS_27.json");
        assert_eq!(config.chunk_count(), 28);
        let pool = LocalPool::new();
        let xys = Iau2006Xys::new(config, Rc::new(MemoryFetcher::new()), pool.spawner());
        assert_eq!(xys.sample_zero().day_number(), 2_442_396);
        assert_eq!(xys.sample_zero().seconds_of_day(), 43_200.0);
    }

    #[test]
    fn lagrange_weights_partition_unity() {
        let pool = LocalPool::new();
        let xys = Iau2006Xys::new(XysConfig::default(), Rc::new(MemoryFetcher::new()), pool.spawner());
        let x = 4.37;
        let work: Vec<f64> = xys.x_table.iter().map(|n| x - n).collect();
        let total: f64 = (0..work.len())
            .map(|i| {
                let mut c = xys.denominators[i];
                for (j, w) in work.iter().enumerate() {
                    if j != i {
                        c *= w;
                    }
                }
                c
            })
            .sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn polls_until_chunk_arrives() {
        let (mut pool, fetcher, xys) = fixture(small_config());
        let (day, second) = at(&xys, 5.25);

        assert!(xys.compute_xys_radians(day, second).is_none());
        assert!(xys.compute_xys_radians(day, second).is_none());
        assert_eq!(fetcher.requests(), vec!["xys/0.json"]);
        assert_eq!(xys.chunks_in_flight(), vec![0]);

        pool.run_until_stalled();
        assert!(xys.chunks_in_flight().is_empty());
        let sample = xys.compute_xys_radians(day, second).unwrap();
        let expected = value_at(5.25);
        assert!((sample.x - expected.x).abs() < 1e-15);
        assert!((sample.y - expected.y).abs() < 1e-15);
        assert!((sample.s - expected.s).abs() < 1e-15);
        assert_eq!(fetcher.request_count(), 1);
    }

    #[test]
    fn window_straddling_chunks_requests_both() {
        let (mut pool, fetcher, xys) = fixture(small_config());
        let (day, second) = at(&xys, 20.5);
        assert!(xys.compute_xys_radians(day, second).is_none());
        let mut requests = fetcher.requests();
        requests.sort();
        assert_eq!(requests, vec!["xys/0.json", "xys/1.json"]);

        pool.run_until_stalled();
        assert!(xys.compute_xys_radians(day, second).is_some());
    }

    #[test]
    fn continuous_across_chunk_boundary() {
        let config = small_config();
        let (_pool, _fetcher, xys) = fixture(config.clone());
        for chunk in 0..config.chunk_count() {
            xys.load_chunk(chunk, &chunk_document(chunk, config.samples_per_xys_file))
                .unwrap();
        }
        let epsilon = 1e-6 / SECONDS_PER_DAY;
        let (d0, s0) = at(&xys, 20.0 - epsilon);
        let (d1, s1) = at(&xys, 20.0 + epsilon);
        let below = xys.compute_xys_radians(d0, s0).unwrap();
        let above = xys.compute_xys_radians(d1, s1).unwrap();
        assert!((below.x - above.x).abs() < 1e-14);
        assert!((below.y - above.y).abs() < 1e-14);
        assert!((below.s - above.s).abs() < 1e-14);
    }

    #[test]
    fn window_is_clamped_at_table_edges() {
        let config = small_config();
        let (_pool, _fetcher, xys) = fixture(config.clone());
        for chunk in 0..config.chunk_count() {
            xys.load_chunk(chunk, &chunk_document(chunk, config.samples_per_xys_file))
                .unwrap();
        }
        for days in [0.0, 0.5, 58.5, 59.9] {
            let (day, second) = at(&xys, days);
            let sample = xys.compute_xys_radians(day, second).unwrap();
            assert!((sample.x - value_at(days).x).abs() < 1e-13, "{days}");
        }
    }

    #[test]
    fn outside_table_is_none_without_requests() {
        let (_pool, fetcher, xys) = fixture(small_config());
        let (day, second) = at(&xys, -0.5);
        assert!(xys.compute_xys_radians(day, second).is_none());
        let (day, second) = at(&xys, 60.0);
        assert!(xys.compute_xys_radians(day, second).is_none());
        assert_eq!(fetcher.request_count(), 0);
    }

    #[test]
    fn preload_covers_interval_and_dedups() {
        let (mut pool, fetcher, xys) = fixture(small_config());
        let zero = xys.sample_zero();
        let done = xys.preload(&zero.add_days(12.0), &zero.add_days(30.0));
        let again = xys.preload(&zero.add_days(12.0), &zero.add_days(30.0));

        let mut requests = fetcher.requests();
        requests.sort();
        assert_eq!(requests, vec!["xys/0.json", "xys/1.json"]);

        let results = pool.run_until(future::join(done, again));
        assert_eq!(results, (Ok(()), Ok(())));
        assert!(xys.is_chunk_loaded(0) && xys.is_chunk_loaded(1));
        assert!(!xys.is_chunk_loaded(2));

        // Loaded chunks are not fetched again.
        pool.run_until(xys.preload(&zero, &zero.add_days(3.0))).unwrap();
        assert_eq!(fetcher.request_count(), 2);
    }

    #[test]
    fn failed_chunk_is_retried() {
        let config = small_config();
        let mut pool = LocalPool::new();
        let fetcher = Rc::new(MemoryFetcher::new());
        let xys = Iau2006Xys::new(config.clone(), fetcher.clone(), pool.spawner());
        let (day, second) = at(&xys, 3.0);

        assert!(xys.compute_xys_radians(day, second).is_none());
        pool.run_until_stalled();
        assert!(xys.chunks_in_flight().is_empty());
        assert!(!xys.is_chunk_loaded(0));

        fetcher.insert(config.chunk_url(0), chunk_document(0, config.samples_per_xys_file));
        assert!(xys.compute_xys_radians(day, second).is_none());
        pool.run_until_stalled();
        assert!(xys.compute_xys_radians(day, second).is_some());
        assert_eq!(fetcher.request_count(), 2);
    }

    #[test]
    fn malformed_chunks_are_rejected() {
        let (_pool, _fetcher, xys) = fixture(small_config());
        assert!(matches!(
            xys.load_chunk(0, &json!({ "values": [] })),
            Err(XysError::Malformed { chunk: 0, .. })
        ));
        assert_eq!(
            xys.load_chunk(1, &json!({ "samples": [1.0, 2.0] })),
            Err(XysError::SampleCountMismatch { chunk: 1, len: 2 })
        );
    }

    #[test]
    fn oversized_and_out_of_range_chunks_are_rejected() {
        let config = small_config();
        let (_pool, _fetcher, xys) = fixture(config.clone());
        let oversized = chunk_document(0, config.samples_per_xys_file + 1);
        assert_eq!(
            xys.load_chunk(0, &oversized),
            Err(XysError::TooManySamples {
                chunk: 0,
                samples: 21,
                capacity: 20
            })
        );
        assert!(!xys.is_chunk_loaded(0));
        assert!(xys.state.borrow().samples.iter().all(Option::is_none));

        assert_eq!(
            xys.load_chunk(3, &chunk_document(3, config.samples_per_xys_file)),
            Err(XysError::ChunkOutOfRange { chunk: 3, count: 3 })
        );
    }

    #[test]
    fn chunk_writes_are_idempotent_and_order_free() {
        let config = small_config();
        let per_file = config.samples_per_xys_file;
        let (_pool, _fetcher, in_order) = fixture(config.clone());
        let (_pool, _fetcher, shuffled) = fixture(config);

        for chunk in [0, 1] {
            in_order.load_chunk(chunk, &chunk_document(chunk, per_file)).unwrap();
        }
        for chunk in [1, 0, 1] {
            shuffled.load_chunk(chunk, &chunk_document(chunk, per_file)).unwrap();
        }

        assert_eq!(in_order.state.borrow().samples, shuffled.state.borrow().samples);
        let samples = shuffled.state.borrow().samples.clone();
        assert!(samples[..40].iter().all(Option::is_some));
        assert!(samples[40..].iter().all(Option::is_none));
        assert_eq!(samples[20], Some(value_at(20.0)));
    }

    #[test]
    fn config_from_partial_json() {
        let config: XysConfig =
            serde_json::from_value(json!({ "urlTemplate": "x/{0}", "interpolationOrder": 5 }))
                .unwrap();
        assert_eq!(config.url_template, "x/{0}");
        assert_eq!(config.interpolation_order, 5);
        assert_eq!(config.total_samples, 27_426);
    }
}
