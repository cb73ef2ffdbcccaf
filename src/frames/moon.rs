// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Analytic Moon-fixed orientation.
//!
//! Low-precision IAU rotational elements of the Moon expressed as
//! heading/pitch/roll of the Moon's principal axes, driven by days since
//! J2000 on TDB. No tables are involved, so the result is always available.

use glam::DMat3;

use super::local::HeadingPitchRoll;
use crate::julian_date::JulianDate;
use crate::scales::TDB;

/// Heading/pitch/roll of the Moon-fixed frame relative to ICRF, in radians,
/// at `d` days since J2000 TDB.
pub fn moon_orientation(d: f64) -> HeadingPitchRoll {
    let e1 = (12.112 - 0.052_992 * d).to_radians();
    let e2 = (24.224 - 0.105_984 * d).to_radians();
    let e3 = (227.645 + 13.012 * d).to_radians();
    let e4 = (261.105 + 13.340_716 * d).to_radians();
    let e5 = (358.0 + 0.985_6 * d).to_radians();

    let pitch = 180.0 - 3.878 * e1.sin() - 0.12 * e2.sin() + 0.07 * e3.sin() - 0.017 * e4.sin();
    let roll = (66.53 - 90.0) + 1.543 * e1.cos() + 0.24 * e2.cos() - 0.028 * e3.cos()
        + 0.007 * e4.cos();
    let heading = (244.375 - 90.0)
        + 13.176_358_31 * d
        + 3.558 * e1.sin()
        + 0.121 * e2.sin()
        - 0.064 * e3.sin()
        + 0.016 * e4.sin()
        + 0.025 * e5.sin();

    HeadingPitchRoll::from_degrees(heading, pitch, roll)
}

/// Rotation taking Moon-fixed vectors to ICRF at `date`.
pub fn compute_moon_fixed_to_icrf_matrix(date: &JulianDate) -> DMat3 {
    let d = date.to_epoch::<TDB>().days_since_j2000().value();
    moon_orientation(d).to_matrix3()
}

/// Rotation taking ICRF vectors to the Moon-fixed frame at `date`.
pub fn compute_icrf_to_moon_fixed_matrix(date: &JulianDate) -> DMat3 {
    compute_moon_fixed_to_icrf_matrix(date).transpose()
}
