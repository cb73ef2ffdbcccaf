// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Continuous, scale-tagged day counts.
//!
//! [`Epoch<S>`] stores a single [`Days`] quantity whose *meaning* is fixed by
//! the compile-time marker `S: TimeScale`. It is the lightweight companion of
//! [`JulianDate`](crate::JulianDate): a `JulianDate` keeps whole days and
//! seconds apart for full precision, while an `Epoch<S>` folds them into one
//! `f64` (≈20 μs resolution near the present) for analytic series whose
//! argument is Julian centuries or days since J2000.

use qtty::*;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::marker::PhantomData;
use std::ops::Sub;

use crate::scales::{JD, TDB, TT};

// ═══════════════════════════════════════════════════════════════════════════
// TimeScale trait
// ═══════════════════════════════════════════════════════════════════════════

/// Marker trait for continuous time scales.
///
/// A **time scale** defines a pair of conversion functions between the
/// scale's native quantity (in [`Days`]) and **Julian Date in TT**, the
/// canonical intermediate.
pub trait TimeScale: Copy + Clone + std::fmt::Debug + PartialEq + PartialOrd + 'static {
    /// Convert a quantity in this scale's native unit to an absolute JD(TT).
    fn to_jd_tt(value: Days) -> Days;

    /// Convert an absolute JD(TT) back to this scale's native quantity.
    fn from_jd_tt(jd_tt: Days) -> Days;
}

// ═══════════════════════════════════════════════════════════════════════════
// Epoch<S>
// ═══════════════════════════════════════════════════════════════════════════

/// A point on time scale `S`, as a single day count.
///
/// `PhantomData` is zero-sized, so `Epoch<S>` is layout-identical to `Days`.
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd)]
pub struct Epoch<S: TimeScale> {
    quantity: Days,
    _scale: PhantomData<S>,
}

impl<S: TimeScale> Epoch<S> {
    /// Create from a raw scalar (days on the scale's own axis).
    #[inline]
    pub const fn new(value: f64) -> Self {
        Self {
            quantity: Days::new(value),
            _scale: PhantomData,
        }
    }

    /// Create from a [`Days`] quantity.
    #[inline]
    pub const fn from_days(days: Days) -> Self {
        Self {
            quantity: days,
            _scale: PhantomData,
        }
    }

    /// The underlying quantity in days.
    #[inline]
    pub const fn quantity(&self) -> Days {
        self.quantity
    }

    /// The underlying scalar value in days.
    #[inline]
    pub const fn value(&self) -> f64 {
        self.quantity.value()
    }

    /// Absolute Julian Day (TT) corresponding to this epoch.
    #[inline]
    pub fn julian_day(&self) -> Days {
        S::to_jd_tt(self.quantity)
    }

    /// Build an epoch from an absolute Julian Day (TT).
    #[inline]
    pub fn from_julian_day(jd: Days) -> Self {
        Self::from_days(S::from_jd_tt(jd))
    }

    /// Convert this epoch to another time scale, routing through JD(TT).
    #[inline]
    pub fn to<T: TimeScale>(&self) -> Epoch<T> {
        Epoch::<T>::from_julian_day(S::to_jd_tt(self.quantity))
    }
}

/// Epoch constants and century counts for scales whose native value is a
/// Julian day number.
macro_rules! impl_julian_day_scale {
    ($($scale:ty),+ $(,)?) => {
        $(
            impl Epoch<$scale> {
                /// J2000.0 epoch: 2000-01-01T12:00:00 on this scale (JD 2 451 545.0).
                pub const J2000: Self = Self::new(2_451_545.0);

                /// One Julian century expressed in days.
                pub const JULIAN_CENTURY: Days = Days::new(36_525.0);

                /// Days elapsed since J2000.0 on this scale.
                #[inline]
                pub fn days_since_j2000(&self) -> Days {
                    *self - Self::J2000
                }

                /// Julian centuries since J2000.0.
                #[inline]
                pub fn julian_centuries(&self) -> Centuries {
                    Centuries::new(
                        (self.days_since_j2000() / Self::JULIAN_CENTURY)
                            .simplify()
                            .value(),
                    )
                }
            }
        )+
    };
}

impl_julian_day_scale!(JD, TT, TDB);

// ── Serde ─────────────────────────────────────────────────────────────────

impl<S: TimeScale> Serialize for Epoch<S> {
    fn serialize<Ser>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error>
    where
        Ser: Serializer,
    {
        serializer.serialize_f64(self.value())
    }
}

impl<'de, S: TimeScale> Deserialize<'de> for Epoch<S> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let v = f64::deserialize(deserializer)?;
        Ok(Self::new(v))
    }
}

// ── Arithmetic ────────────────────────────────────────────────────────────

impl<S: TimeScale> Sub for Epoch<S> {
    type Output = Days;
    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        self.quantity - rhs.quantity
    }
}
