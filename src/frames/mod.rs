// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! # Reference-frame transforms
//!
//! [`Transforms`] combines Earth orientation ([`EarthOrientation`]), the
//! IAU 2006 precession-nutation series ([`PrecessionNutation`]) and the
//! leap-second table into rotations between ICRF and the Earth-fixed frame:
//!
//! ```text
//! fixed → ICRF = Q(X, Y, s) · R_z(ERA) · W(x_p, y_p, s')
//! ```
//!
//! with `Q` the CIO-based precession-nutation matrix, `ERA` the Earth
//! rotation angle from UT1 and `W` the polar-motion matrix.
//!
//! Until the providers have the data for an instant the full transform is
//! `None`; [`Transforms::compute_icrf_to_central_body_fixed_matrix`] then
//! falls back to the TEME approximation, which needs no data at all.
//!
//! All matrices are `glam` column-major `DMat3`, applied as `m * v`.

mod ellipsoid;
mod local;
mod moon;

pub use ellipsoid::Ellipsoid;
pub use local::{
    east_north_up_to_fixed_frame, fixed_frame_to_heading_pitch_roll,
    heading_pitch_roll_quaternion, heading_pitch_roll_to_fixed_frame,
    local_frame_to_fixed_frame_generator, north_east_down_to_fixed_frame,
    north_up_east_to_fixed_frame, north_west_up_to_fixed_frame,
    rotation_matrix_from_position_velocity, HeadingPitchRoll, LocalAxis, LocalFrameGenerator,
    EAST_NORTH_UP, NORTH_EAST_DOWN, NORTH_UP_EAST, NORTH_WEST_UP,
};
pub use moon::{compute_icrf_to_moon_fixed_matrix, compute_moon_fixed_to_icrf_matrix, moon_orientation};

use futures::future::LocalBoxFuture;
use glam::{DMat3, DVec3};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use std::rc::Rc;
use std::sync::Arc;

use crate::eop::{EarthOrientation, NoEop};
use crate::epoch::Epoch;
use crate::error::XysError;
use crate::gregorian::SECONDS_PER_DAY;
use crate::julian_date::JulianDate;
use crate::leap_seconds::LeapSecondTable;
use crate::scales::{JD, TT, TT_MINUS_TAI_SECONDS};
use crate::xys::PrecessionNutation;

const J2000_DAY_NUMBER: i32 = 2_451_545;

// ── Greenwich mean sidereal time (seconds, IAU 1982) ──
const GMST_CONSTANT_0: f64 = 6.0 * 3600.0 + 41.0 * 60.0 + 50.548_41;
const GMST_CONSTANT_1: f64 = 8_640_184.812_866;
const GMST_CONSTANT_2: f64 = 0.093_104;
const GMST_CONSTANT_3: f64 = -6.2e-6;
const RATE_COEFFICIENT: f64 = 1.177_275_838_466_8e-19;
const WGS84_PRECESSING_ROTATION_RATE: f64 = 7.292_115_855_3e-5;

/// Body whose fixed frame
/// [`compute_icrf_to_central_body_fixed_matrix`](Transforms::compute_icrf_to_central_body_fixed_matrix)
/// targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CentralBody {
    #[default]
    Earth,
    Moon,
}

impl CentralBody {
    pub const fn ellipsoid(self) -> Ellipsoid {
        match self {
            CentralBody::Earth => Ellipsoid::WGS84,
            CentralBody::Moon => Ellipsoid::MOON,
        }
    }
}

/// ICRF ↔ body-fixed rotation engine.
///
/// Providers are shared handles and can be swapped at any time.
#[derive(Clone)]
pub struct Transforms {
    earth_orientation: Rc<dyn EarthOrientation>,
    precession_nutation: Rc<dyn PrecessionNutation>,
    leap_seconds: Arc<LeapSecondTable>,
    central_body: CentralBody,
}

impl std::fmt::Debug for Transforms {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transforms")
            .field("central_body", &self.central_body)
            .field("leap_seconds", &self.leap_seconds.len())
            .finish_non_exhaustive()
    }
}

impl Transforms {
    /// An Earth-centred engine with zero Earth orientation and the global
    /// leap-second table.
    pub fn new(precession_nutation: Rc<dyn PrecessionNutation>) -> Self {
        Self {
            earth_orientation: Rc::new(NoEop),
            precession_nutation,
            leap_seconds: LeapSecondTable::global(),
            central_body: CentralBody::Earth,
        }
    }

    pub fn with_earth_orientation(mut self, provider: Rc<dyn EarthOrientation>) -> Self {
        self.earth_orientation = provider;
        self
    }

    pub fn with_leap_seconds(mut self, table: Arc<LeapSecondTable>) -> Self {
        self.leap_seconds = table;
        self
    }

    pub fn with_central_body(mut self, body: CentralBody) -> Self {
        self.central_body = body;
        self
    }

    pub fn set_earth_orientation(&mut self, provider: Rc<dyn EarthOrientation>) {
        self.earth_orientation = provider;
    }

    pub fn set_precession_nutation(&mut self, provider: Rc<dyn PrecessionNutation>) {
        self.precession_nutation = provider;
    }

    pub fn set_central_body(&mut self, body: CentralBody) {
        self.central_body = body;
    }

    pub fn central_body(&self) -> CentralBody {
        self.central_body
    }

    pub fn leap_seconds(&self) -> &Arc<LeapSecondTable> {
        &self.leap_seconds
    }

    // ── ICRF ↔ Earth-fixed ───────────────────────────────────────────────

    /// Rotation from the Earth-fixed frame to ICRF, or `None` while Earth
    /// orientation or XYS data for `date` is unavailable.
    pub fn compute_fixed_to_icrf_matrix(&self, date: &JulianDate) -> Option<DMat3> {
        let eop = self.earth_orientation.compute(date)?;

        // TT as TAI components plus the fixed offset; the seconds may exceed
        // one day, which the interpolation tolerates.
        let day_tt = date.day_number();
        let second_tt = date.seconds_of_day() + TT_MINUS_TAI_SECONDS;
        let xys = self
            .precession_nutation
            .compute_xys_radians(day_tt, second_tt)?;

        // Precession-nutation (CIO based).
        let x = xys.x + eop.x_pole_offset;
        let y = xys.y + eop.y_pole_offset;
        let a = 1.0 / (1.0 + (1.0 - x * x - y * y).sqrt());
        let rotation1 = DMat3::from_cols(
            DVec3::new(1.0 - a * x * x, -a * x * y, -x),
            DVec3::new(-a * x * y, 1.0 - a * y * y, -y),
            DVec3::new(x, y, 1.0 - a * (x * x + y * y)),
        );
        let matrix_q = rotation1 * DMat3::from_rotation_z(-xys.s);

        // Earth rotation angle. Whole days since J2000 are whole turns of
        // the (1 + b) factor, so only b multiplies them.
        let ut1_seconds =
            date.seconds_of_day() - self.leap_seconds.offset_at(date) + eop.ut1_minus_utc;
        let days_since_j2000 = f64::from(day_tt - J2000_DAY_NUMBER);
        let fraction_of_day = ut1_seconds / SECONDS_PER_DAY;
        let era = 0.779_057_273_264
            + fraction_of_day
            + 0.002_737_811_911_354_48 * (days_since_j2000 + fraction_of_day);
        let era = (era % 1.0) * TAU;
        let pseudo_fixed_to_icrf = matrix_q * DMat3::from_rotation_z(era);

        // Polar motion, with s' ≈ −47 µas per century.
        let ttt = date.to_epoch::<TT>().julian_centuries().value();
        let sp = (-47.0e-6 * ttt).to_radians() / 3600.0;
        let (sin_xp, cos_xp) = eop.x_pole_wander.sin_cos();
        let (sin_yp, cos_yp) = eop.y_pole_wander.sin_cos();
        let (sin_sp, cos_sp) = sp.sin_cos();
        let fixed_to_pseudo_fixed = DMat3::from_cols_array(&[
            cos_xp * cos_sp,
            cos_xp * sin_sp,
            sin_xp,
            -cos_yp * sin_sp + sin_yp * sin_xp * cos_sp,
            cos_yp * cos_sp + sin_yp * sin_xp * sin_sp,
            -sin_yp * cos_xp,
            -sin_yp * sin_sp - cos_yp * sin_xp * cos_sp,
            sin_yp * cos_sp - cos_yp * sin_xp * sin_sp,
            cos_yp * cos_xp,
        ]);

        Some(pseudo_fixed_to_icrf * fixed_to_pseudo_fixed)
    }

    /// Rotation from ICRF to the Earth-fixed frame; the transpose of
    /// [`compute_fixed_to_icrf_matrix`](Self::compute_fixed_to_icrf_matrix).
    pub fn compute_icrf_to_fixed_matrix(&self, date: &JulianDate) -> Option<DMat3> {
        self.compute_fixed_to_icrf_matrix(date)
            .map(|m| m.transpose())
    }

    /// Rotation from TEME to a pseudo-fixed frame, using GMST with UT1
    /// approximated by UTC. Needs no external data and never fails, even
    /// during a leap second.
    pub fn compute_teme_to_pseudo_fixed_matrix(&self, date: &JulianDate) -> DMat3 {
        let utc = date.add_seconds(-self.leap_seconds.offset_at(date));
        let utc_day_number = utc.day_number();
        let utc_seconds_into_day = utc.seconds_of_day();

        // Centuries to 0h UT of the civil day.
        let midnight = if utc_seconds_into_day >= 43_200.0 {
            f64::from(utc_day_number) + 0.5
        } else {
            f64::from(utc_day_number) - 0.5
        };
        let t = Epoch::<JD>::new(midnight).julian_centuries().value();

        let gmst0 = GMST_CONSTANT_0
            + t * (GMST_CONSTANT_1 + t * (GMST_CONSTANT_2 + t * GMST_CONSTANT_3));
        let angle = (gmst0 * TAU / SECONDS_PER_DAY) % TAU;
        let ratio = WGS84_PRECESSING_ROTATION_RATE
            + RATE_COEFFICIENT * (f64::from(utc_day_number) - 2_451_545.5);
        let seconds_since_midnight =
            (utc_seconds_into_day + SECONDS_PER_DAY * 0.5) % SECONDS_PER_DAY;
        let gha = angle + ratio * seconds_since_midnight;

        DMat3::from_rotation_z(-gha)
    }

    /// ICRF to the central body's fixed frame. For the Earth this is the
    /// full transform when available, TEME otherwise; for the Moon it is
    /// the analytic model.
    pub fn compute_icrf_to_central_body_fixed_matrix(&self, date: &JulianDate) -> DMat3 {
        match self.central_body {
            CentralBody::Earth => self.compute_icrf_to_fixed_matrix(date).unwrap_or_else(|| {
                tracing::trace!("ICRF data unavailable, using TEME approximation");
                self.compute_teme_to_pseudo_fixed_matrix(date)
            }),
            CentralBody::Moon => compute_icrf_to_moon_fixed_matrix(date),
        }
    }

    /// Moon-fixed to ICRF at `date`.
    pub fn compute_moon_fixed_to_icrf_matrix(&self, date: &JulianDate) -> DMat3 {
        compute_moon_fixed_to_icrf_matrix(date)
    }

    /// ICRF to Moon-fixed at `date`.
    pub fn compute_icrf_to_moon_fixed_matrix(&self, date: &JulianDate) -> DMat3 {
        compute_icrf_to_moon_fixed_matrix(date)
    }

    /// Request the XYS data needed for ICRF ↔ fixed between two instants.
    pub fn preload_icrf_fixed(
        &self,
        start: &JulianDate,
        stop: &JulianDate,
    ) -> LocalBoxFuture<'static, Result<(), XysError>> {
        let start_tt = start.add_seconds(TT_MINUS_TAI_SECONDS);
        let stop_tt = stop.add_seconds(TT_MINUS_TAI_SECONDS);
        self.precession_nutation.preload(&start_tt, &stop_tt)
    }
}
