// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Local tangent frames and heading/pitch/roll orientation.
//!
//! A local frame at a point on (or near) an ellipsoid is named by two of the
//! six directions east, north, up, west, south and down. The third axis
//! completes a right-handed system. Every valid pair has one
//! [`LocalFrameGenerator`], built once and looked up by
//! [`local_frame_to_fixed_frame_generator`].
//!
//! On the polar axis east is undefined, so fixed directions are used there
//! instead of the ellipsoid normal (mirrored for the southern hemisphere).

use glam::{DMat3, DMat4, DQuat, DVec3};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;

use super::ellipsoid::Ellipsoid;
use crate::error::FrameError;

const EPSILON14: f64 = 1e-14;
const EPSILON6: f64 = 1e-6;

/// A named direction in a local tangent frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocalAxis {
    East,
    North,
    Up,
    West,
    South,
    Down,
}

impl LocalAxis {
    pub const ALL: [LocalAxis; 6] = [
        LocalAxis::East,
        LocalAxis::North,
        LocalAxis::Up,
        LocalAxis::West,
        LocalAxis::South,
        LocalAxis::Down,
    ];

    /// Axis completing `self` × `second` to a right-handed frame, or `None`
    /// when the two are not perpendicular.
    pub const fn third(self, second: LocalAxis) -> Option<LocalAxis> {
        use LocalAxis::*;
        let third = match (self, second) {
            (Up, South) => East,
            (Up, North) => West,
            (Up, West) => South,
            (Up, East) => North,
            (Down, South) => West,
            (Down, North) => East,
            (Down, West) => North,
            (Down, East) => South,
            (South, Up) => West,
            (South, Down) => East,
            (South, West) => Down,
            (South, East) => Up,
            (North, Up) => East,
            (North, Down) => West,
            (North, West) => Up,
            (North, East) => Down,
            (West, Up) => North,
            (West, Down) => South,
            (West, North) => Down,
            (West, South) => Up,
            (East, Up) => South,
            (East, Down) => North,
            (East, North) => Up,
            (East, South) => Down,
            _ => return None,
        };
        Some(third)
    }

    /// Direction used on the polar axis and at the centre.
    const fn degenerate(self) -> DVec3 {
        match self {
            LocalAxis::North => DVec3::new(-1.0, 0.0, 0.0),
            LocalAxis::East => DVec3::new(0.0, 1.0, 0.0),
            LocalAxis::Up => DVec3::new(0.0, 0.0, 1.0),
            LocalAxis::South => DVec3::new(1.0, 0.0, 0.0),
            LocalAxis::West => DVec3::new(0.0, -1.0, 0.0),
            LocalAxis::Down => DVec3::new(0.0, 0.0, -1.0),
        }
    }

    const fn is_east_west(self) -> bool {
        matches!(self, LocalAxis::East | LocalAxis::West)
    }
}

// ── Generators ───────────────────────────────────────────────────────────

/// Builds local-to-fixed transforms for one axis pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalFrameGenerator {
    first: LocalAxis,
    second: LocalAxis,
    third: LocalAxis,
}

/// East-north-up.
pub const EAST_NORTH_UP: LocalFrameGenerator =
    LocalFrameGenerator::from_parts(LocalAxis::East, LocalAxis::North, LocalAxis::Up);
/// North-east-down.
pub const NORTH_EAST_DOWN: LocalFrameGenerator =
    LocalFrameGenerator::from_parts(LocalAxis::North, LocalAxis::East, LocalAxis::Down);
/// North-up-east.
pub const NORTH_UP_EAST: LocalFrameGenerator =
    LocalFrameGenerator::from_parts(LocalAxis::North, LocalAxis::Up, LocalAxis::East);
/// North-west-up.
pub const NORTH_WEST_UP: LocalFrameGenerator =
    LocalFrameGenerator::from_parts(LocalAxis::North, LocalAxis::West, LocalAxis::Up);

static GENERATORS: OnceLock<HashMap<(LocalAxis, LocalAxis), LocalFrameGenerator>> =
    OnceLock::new();

fn generators() -> &'static HashMap<(LocalAxis, LocalAxis), LocalFrameGenerator> {
    GENERATORS.get_or_init(|| {
        let mut map = HashMap::new();
        for first in LocalAxis::ALL {
            for second in LocalAxis::ALL {
                if let Some(third) = first.third(second) {
                    map.insert(
                        (first, second),
                        LocalFrameGenerator::from_parts(first, second, third),
                    );
                }
            }
        }
        map
    })
}

/// The generator whose frame has `first` as its x axis and `second` as its
/// y axis.
pub fn local_frame_to_fixed_frame_generator(
    first: LocalAxis,
    second: LocalAxis,
) -> Result<&'static LocalFrameGenerator, FrameError> {
    generators()
        .get(&(first, second))
        .ok_or(FrameError::InvalidAxisPair { first, second })
}

impl LocalFrameGenerator {
    const fn from_parts(first: LocalAxis, second: LocalAxis, third: LocalAxis) -> Self {
        Self {
            first,
            second,
            third,
        }
    }

    pub const fn axes(&self) -> [LocalAxis; 3] {
        [self.first, self.second, self.third]
    }

    /// Transform from the local frame at `origin` to the fixed frame.
    /// Columns are the three axes followed by `origin`.
    pub fn to_fixed_frame(&self, origin: DVec3, ellipsoid: &Ellipsoid) -> DMat4 {
        let [first, second, third] = self.axes().map(|axis| direction(axis, origin, ellipsoid));
        DMat4::from_cols(
            first.extend(0.0),
            second.extend(0.0),
            third.extend(0.0),
            origin.extend(1.0),
        )
    }
}

fn direction(axis: LocalAxis, origin: DVec3, ellipsoid: &Ellipsoid) -> DVec3 {
    if origin.abs().max_element() <= EPSILON14 {
        return axis.degenerate();
    }
    if origin.x.abs() <= EPSILON14 && origin.y.abs() <= EPSILON14 {
        let degenerate = axis.degenerate();
        return if axis.is_east_west() {
            degenerate
        } else {
            degenerate * origin.z.signum()
        };
    }

    let up = ellipsoid.geodetic_surface_normal(origin);
    let east = DVec3::new(-origin.y, origin.x, 0.0).normalize();
    let north = up.cross(east);
    match axis {
        LocalAxis::East => east,
        LocalAxis::North => north,
        LocalAxis::Up => up,
        LocalAxis::West => -east,
        LocalAxis::South => -north,
        LocalAxis::Down => -up,
    }
}

/// East-north-up frame at `origin`.
pub fn east_north_up_to_fixed_frame(origin: DVec3, ellipsoid: &Ellipsoid) -> DMat4 {
    EAST_NORTH_UP.to_fixed_frame(origin, ellipsoid)
}

/// North-east-down frame at `origin`.
pub fn north_east_down_to_fixed_frame(origin: DVec3, ellipsoid: &Ellipsoid) -> DMat4 {
    NORTH_EAST_DOWN.to_fixed_frame(origin, ellipsoid)
}

/// North-up-east frame at `origin`.
pub fn north_up_east_to_fixed_frame(origin: DVec3, ellipsoid: &Ellipsoid) -> DMat4 {
    NORTH_UP_EAST.to_fixed_frame(origin, ellipsoid)
}

/// North-west-up frame at `origin`.
pub fn north_west_up_to_fixed_frame(origin: DVec3, ellipsoid: &Ellipsoid) -> DMat4 {
    NORTH_WEST_UP.to_fixed_frame(origin, ellipsoid)
}

// ── Heading / pitch / roll ───────────────────────────────────────────────

/// Orientation as successive rotations about the local z (heading), y
/// (pitch) and x (roll) axes, in radians. Positive heading turns from the
/// first axis toward the negative second axis, i.e. clockwise seen from
/// above in an east-north-up frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HeadingPitchRoll {
    pub heading: f64,
    pub pitch: f64,
    pub roll: f64,
}

impl HeadingPitchRoll {
    pub const fn new(heading: f64, pitch: f64, roll: f64) -> Self {
        Self {
            heading,
            pitch,
            roll,
        }
    }

    pub fn from_degrees(heading: f64, pitch: f64, roll: f64) -> Self {
        Self::new(heading.to_radians(), pitch.to_radians(), roll.to_radians())
    }

    /// `Rz(−heading) · Ry(−pitch) · Rx(roll)`.
    pub fn to_matrix3(&self) -> DMat3 {
        let (sin_theta, cos_theta) = (-self.pitch).sin_cos();
        let (sin_psi, cos_psi) = (-self.heading).sin_cos();
        let (sin_phi, cos_phi) = self.roll.sin_cos();

        DMat3::from_cols(
            DVec3::new(cos_theta * cos_psi, cos_theta * sin_psi, -sin_theta),
            DVec3::new(
                -cos_phi * sin_psi + sin_phi * sin_theta * cos_psi,
                cos_phi * cos_psi + sin_phi * sin_theta * sin_psi,
                sin_phi * cos_theta,
            ),
            DVec3::new(
                sin_phi * sin_psi + cos_phi * sin_theta * cos_psi,
                -sin_phi * cos_psi + cos_phi * sin_theta * sin_psi,
                cos_phi * cos_theta,
            ),
        )
    }

    pub fn to_quaternion(&self) -> DQuat {
        DQuat::from_mat3(&self.to_matrix3())
    }

    /// Angles of a pure rotation matrix.
    pub fn from_matrix3(rotation: &DMat3) -> Self {
        let (m00, m10, m20) = (rotation.x_axis.x, rotation.x_axis.y, rotation.x_axis.z);
        let (m21, m22) = (rotation.y_axis.z, rotation.z_axis.z);
        Self {
            heading: -m10.atan2(m00),
            pitch: m20.clamp(-1.0, 1.0).asin(),
            roll: m21.atan2(m22),
        }
    }
}

/// Transform placing a body at `origin` with orientation `hpr` relative to
/// the local frame of `generator`.
pub fn heading_pitch_roll_to_fixed_frame(
    origin: DVec3,
    hpr: &HeadingPitchRoll,
    ellipsoid: &Ellipsoid,
    generator: &LocalFrameGenerator,
) -> DMat4 {
    generator.to_fixed_frame(origin, ellipsoid) * DMat4::from_mat3(hpr.to_matrix3())
}

/// Rotation part of [`heading_pitch_roll_to_fixed_frame`] as a quaternion.
pub fn heading_pitch_roll_quaternion(
    origin: DVec3,
    hpr: &HeadingPitchRoll,
    ellipsoid: &Ellipsoid,
    generator: &LocalFrameGenerator,
) -> DQuat {
    let transform = heading_pitch_roll_to_fixed_frame(origin, hpr, ellipsoid, generator);
    DQuat::from_mat3(&DMat3::from_mat4(transform)).normalize()
}

/// Heading, pitch and roll of `transform` relative to the local frame at
/// its translation. Scale is ignored; a transform at the centre reports
/// zero angles.
pub fn fixed_frame_to_heading_pitch_roll(
    transform: &DMat4,
    ellipsoid: &Ellipsoid,
    generator: &LocalFrameGenerator,
) -> HeadingPitchRoll {
    let origin = transform.w_axis.truncate();
    if origin == DVec3::ZERO {
        return HeadingPitchRoll::default();
    }

    let to_local = generator.to_fixed_frame(origin, ellipsoid).inverse();
    let rotation = DMat3::from_mat4(*transform);
    let unscaled = DMat3::from_cols(
        rotation.x_axis.normalize(),
        rotation.y_axis.normalize(),
        rotation.z_axis.normalize(),
    );
    let local = DMat3::from_mat4(to_local * DMat4::from_mat3(unscaled));
    HeadingPitchRoll::from_matrix3(&local)
}

/// Rotation whose columns are the direction of travel, the right-hand side
/// and the local up of a body at `position` moving with `velocity`.
pub fn rotation_matrix_from_position_velocity(
    position: DVec3,
    velocity: DVec3,
    ellipsoid: &Ellipsoid,
) -> DMat3 {
    let forward = velocity.normalize();
    let normal = ellipsoid.geodetic_surface_normal(position);
    let mut right = forward.cross(normal);
    if right.abs().max_element() <= EPSILON6 {
        right = DVec3::X;
    }
    let up = right.cross(forward).normalize();
    let right = (-forward.cross(up)).normalize();
    DMat3::from_cols(forward, right, up)
}
