// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Triaxial reference ellipsoids.

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// A centred ellipsoid `x²/a² + y²/b² + z²/c² = 1` with radii in metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ellipsoid {
    radii: DVec3,
}

impl Ellipsoid {
    /// WGS 84.
    pub const WGS84: Self = Self::new(6_378_137.0, 6_378_137.0, 6_356_752.314_245_179_3);

    /// Mean lunar sphere.
    pub const MOON: Self = Self::new(1_737_400.0, 1_737_400.0, 1_737_400.0);

    pub const UNIT_SPHERE: Self = Self::new(1.0, 1.0, 1.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            radii: DVec3::new(x, y, z),
        }
    }

    pub const fn radii(&self) -> DVec3 {
        self.radii
    }

    pub fn radii_squared(&self) -> DVec3 {
        self.radii * self.radii
    }

    pub fn one_over_radii_squared(&self) -> DVec3 {
        DVec3::ONE / self.radii_squared()
    }

    /// Outward normal of the ellipsoid surface through `position`.
    ///
    /// Undefined at the centre, where the result is NaN.
    pub fn geodetic_surface_normal(&self, position: DVec3) -> DVec3 {
        (position * self.one_over_radii_squared()).normalize()
    }

    /// Surface normal at geodetic `longitude`/`latitude` (radians).
    pub fn geodetic_surface_normal_cartographic(&self, longitude: f64, latitude: f64) -> DVec3 {
        let cos_latitude = latitude.cos();
        DVec3::new(
            cos_latitude * longitude.cos(),
            cos_latitude * longitude.sin(),
            latitude.sin(),
        )
        .normalize()
    }

    /// Cartesian position of a geodetic coordinate; `height` is in metres
    /// above the surface along the normal.
    pub fn cartographic_to_cartesian(&self, longitude: f64, latitude: f64, height: f64) -> DVec3 {
        let normal = self.geodetic_surface_normal_cartographic(longitude, latitude);
        let k = self.radii_squared() * normal;
        let gamma = normal.dot(k).sqrt();
        k / gamma + normal * height
    }
}

impl Default for Ellipsoid {
    fn default() -> Self {
        Self::WGS84
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equator_and_pole_positions() {
        let equator = Ellipsoid::WGS84.cartographic_to_cartesian(0.0, 0.0, 0.0);
        assert!((equator - DVec3::new(6_378_137.0, 0.0, 0.0)).length() < 1e-6);

        let pole = Ellipsoid::WGS84.cartographic_to_cartesian(0.0, std::f64::consts::FRAC_PI_2, 10.0);
        assert!((pole.z - 6_356_762.314_245_179).abs() < 1e-6);
        assert!(pole.x.abs() < 1e-6);
    }

    #[test]
    fn surface_normal_matches_geodetic_latitude() {
        let (longitude, latitude) = (0.3, 0.7);
        let position = Ellipsoid::WGS84.cartographic_to_cartesian(longitude, latitude, 0.0);
        let normal = Ellipsoid::WGS84.geodetic_surface_normal(position);
        let expected = Ellipsoid::WGS84.geodetic_surface_normal_cartographic(longitude, latitude);
        assert!((normal - expected).length() < 1e-12);
    }

    #[test]
    fn sphere_normal_is_radial() {
        let p = DVec3::new(3.0, -4.0, 12.0);
        let n = Ellipsoid::UNIT_SPHERE.geodetic_surface_normal(p);
        assert!((n - p / 13.0).length() < 1e-15);
        assert_eq!(Ellipsoid::MOON.radii().x, 1_737_400.0);
    }
}
