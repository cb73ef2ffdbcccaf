// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Time-scale marker types.
//!
//! Each zero-sized type identifies a continuous time scale and encodes how
//! values in that scale relate to the canonical **Julian Date in TT**
//! (Terrestrial Time). These markers parameterise [`Epoch<S>`](crate::Epoch),
//! the single-`f64` day count used by the analytic models (sidereal time,
//! `s'`, lunar orientation) where sub-microsecond resolution is not needed.
//! Tabulated data keyed by Modified Julian Date is shifted with
//! `MJD_EPOCH` directly.
//!
//! The civil scale (UTC) is deliberately absent: it is discontinuous, so it
//! only exists as a [`TimeStandard`](crate::TimeStandard) tag on
//! [`JulianDate`](crate::JulianDate) construction and formatting.
//!
//! | Marker | Description | Offset to JD(TT) |
//! |--------|-------------|------------------|
//! | [`JD`] | Julian Date on the TT axis | 0 |
//! | [`TT`] | Terrestrial Time | 0 |
//! | [`TAI`] | International Atomic Time | + 32.184 s |
//! | [`TDB`] | Barycentric Dynamical Time | − periodic ≈1.7 ms term |

use crate::epoch::TimeScale;
use qtty::Days;

// ---------------------------------------------------------------------------
// Epoch counters
// ---------------------------------------------------------------------------

/// Julian Date — the identity scale.
///
/// `to_jd_tt(v) = v`, i.e. the quantity *is* a Julian Day number on TT.
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd)]
pub struct JD;

impl TimeScale for JD {
    #[inline(always)]
    fn to_jd_tt(value: Days) -> Days {
        value
    }

    #[inline(always)]
    fn from_jd_tt(jd_tt: Days) -> Days {
        jd_tt
    }
}

/// The constant offset between JD and MJD: `JD = MJD + MJD_EPOCH`.
pub(crate) const MJD_EPOCH: Days = Days::new(2_400_000.5);

// ---------------------------------------------------------------------------
// Physical scales
// ---------------------------------------------------------------------------

/// Terrestrial Time — the argument of the IAU 2006 precession-nutation series.
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd)]
pub struct TT;

impl TimeScale for TT {
    #[inline(always)]
    fn to_jd_tt(value: Days) -> Days {
        value
    }

    #[inline(always)]
    fn from_jd_tt(jd_tt: Days) -> Days {
        jd_tt
    }
}

/// International Atomic Time.
///
/// `TT = TAI + 32.184 s`.
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd)]
pub struct TAI;

/// `TT − TAI` in seconds.
pub const TT_MINUS_TAI_SECONDS: f64 = 32.184;

/// `TT = TAI + 32.184 s` expressed in days.
const TT_MINUS_TAI: Days = Days::new(TT_MINUS_TAI_SECONDS / 86_400.0);

impl TimeScale for TAI {
    #[inline(always)]
    fn to_jd_tt(value: Days) -> Days {
        value + TT_MINUS_TAI
    }

    #[inline(always)]
    fn from_jd_tt(jd_tt: Days) -> Days {
        jd_tt - TT_MINUS_TAI
    }
}

/// Barycentric Dynamical Time.
///
/// Unlike a pure epoch counter, this scale applies the periodic
/// `TDB − TT` correction (Fairhead & Bretagnon largest terms, ≈1.7 ms
/// amplitude). The inverse evaluates the correction at the TDB value, which
/// is exact to well below a nanosecond because the term varies by less than
/// 10⁻⁹ s per second.
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd)]
pub struct TDB;

impl TimeScale for TDB {
    #[inline]
    fn to_jd_tt(value: Days) -> Days {
        value - tdb_minus_tt(value)
    }

    #[inline]
    fn from_jd_tt(jd_tt: Days) -> Days {
        jd_tt + tdb_minus_tt(jd_tt)
    }
}

/// `TDB − TT` in days for a Julian day near either axis.
///
/// Accuracy: better than 30 μs for dates within ±10 000 years of J2000.
///
/// ## References
/// * Fairhead & Bretagnon (1990), A&A 229, 240
/// * USNO Circular 179, eq. 2.6
fn tdb_minus_tt(jd: Days) -> Days {
    let t = (jd.value() - 2_451_545.0) / 36_525.0;

    // Earth's mean anomaly (radians)
    let m_e = (357.5291092 + 35999.0502909 * t).to_radians();
    // Mean anomaly of Jupiter (radians)
    let m_j = (246.4512 + 3035.2335 * t).to_radians();
    // Mean elongation of the Moon from the Sun (radians)
    let d = (297.8502042 + 445267.1115168 * t).to_radians();
    // Mean longitude of lunar ascending node (radians)
    let om = (125.0445550 - 1934.1362091 * t).to_radians();

    let dt_sec = 0.001_657 * (m_e + 0.01671 * m_e.sin()).sin()
        + 0.000_022 * (d - m_e).sin()
        + 0.000_014 * (2.0 * d).sin()
        + 0.000_005 * m_j.sin()
        + 0.000_005 * om.sin();

    Days::new(dt_sec / 86_400.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epoch::Epoch;
    use qtty::{Day, Second, Seconds};

    #[test]
    fn mjd_epoch_is_half_a_day_off_a_noon_day_number() {
        assert_eq!(MJD_EPOCH.value() + 51_544.5, 2_451_545.0);
        assert_eq!(Epoch::<JD>::new(2_451_545.0).julian_day(), Days::new(2_451_545.0));
    }

    #[test]
    fn tai_tt_offset() {
        let tai = Epoch::<TAI>::new(2_451_545.0);
        let tt: Epoch<TT> = tai.to::<TT>();
        let expected_offset = Seconds::new(32.184).to::<Day>();
        assert!((tt.quantity() - (tai.quantity() + expected_offset)).abs() < Days::new(1e-12));
    }

    #[test]
    fn tdb_differs_from_tt_by_milliseconds() {
        let tt = Epoch::<TT>::new(2_455_000.25);
        let tdb = tt.to::<TDB>();
        let offset = (tdb.quantity() - tt.quantity()).to::<Second>();
        assert!(offset.abs() < Seconds::new(0.002), "TDB − TT = {offset}");
    }

    #[test]
    fn tdb_roundtrip() {
        let tt = Epoch::<TT>::new(2_458_000.75);
        let back: Epoch<TT> = tt.to::<TDB>().to::<TT>();
        assert!((back.quantity() - tt.quantity()).abs() < Days::new(1e-12));
    }
}
