// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Geochron
//!
//! Leap-second aware time and ICRF ↔ Earth-fixed reference-frame transforms.
//!
//! # Core types
//!
//! - [`JulianDate`]: an instant as (day number, seconds of day) on TAI.
//! - [`LeapSecondTable`]: append-only `TAI − UTC` history with a
//!   process-wide default ([`LeapSecondTable::global`]).
//! - [`GregorianDate`]: broken-down UTC calendar date, leap seconds included.
//! - [`Epoch<S>`]: single-`f64` day count on a continuous [`TimeScale`].
//! - [`EarthOrientationParameters`]: tabulated polar motion and `UT1 − UTC`.
//! - [`Iau2006Xys`]: chunk-loaded IAU 2006 precession-nutation series.
//! - [`Transforms`]: rotation matrices between ICRF and body-fixed frames.
//!
//! # Polling
//!
//! Data-driven computations never block. While Earth orientation or XYS
//! data is still loading they return `None`; the XYS provider schedules the
//! missing chunk as a side effect, so asking again later succeeds:
//!
//! ```
//! use futures::executor::LocalPool;
//! use geochron::{Iau2006Xys, JulianDate, MemoryFetcher, Transforms, XysConfig};
//! use std::rc::Rc;
//!
//! let pool = LocalPool::new();
//! let fetcher = Rc::new(MemoryFetcher::new());
//! let xys = Rc::new(Iau2006Xys::new(XysConfig::default(), fetcher.clone(), pool.spawner()));
//! let transforms = Transforms::new(xys);
//!
//! let date: JulianDate = "2020-06-01T00:00:00Z".parse().unwrap();
//! assert!(transforms.compute_icrf_to_fixed_matrix(&date).is_none());
//! assert_eq!(fetcher.request_count(), 1);
//! ```
//!
//! # Time scales
//!
//! | Marker | Scale |
//! |--------|-------|
//! | [`JD`] | Julian Date (TT) |
//! | [`TT`] | Terrestrial Time |
//! | [`TAI`] | International Atomic Time |
//! | [`TDB`] | Barycentric Dynamical Time |

mod eop;
mod epoch;
mod error;
mod fetch;
pub mod frames;
mod gregorian;
mod iso8601;
mod julian_date;
mod leap_seconds;
pub(crate) mod scales;
mod xys;

// ── Re-exports ────────────────────────────────────────────────────────────

pub use eop::{
    EarthOrientation, EarthOrientationParameters, EopConfig, EopSample, NoEop, REQUIRED_COLUMNS,
};
pub use epoch::{Epoch, TimeScale};
pub use error::{EopError, FetchError, FrameError, Iso8601Error, XysError};
pub use fetch::{DirectoryFetcher, JsonFetcher, MemoryFetcher};
pub use frames::{CentralBody, Ellipsoid, HeadingPitchRoll, LocalAxis, Transforms};
pub use gregorian::{days_in_month, is_leap_year, GregorianDate, SECONDS_PER_DAY};
pub use julian_date::{JulianDate, TimeStandard};
pub use leap_seconds::{LeapSecond, LeapSecondTable, HISTORICAL_LEAP_SECONDS};
pub use scales::{JD, TAI, TDB, TT, TT_MINUS_TAI_SECONDS};
pub use xys::{Iau2006Xys, PrecessionNutation, XysConfig, XysSample};
