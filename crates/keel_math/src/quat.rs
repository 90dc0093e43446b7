use serde::{Deserialize, Serialize};

use crate::Vec3;

// -----------------------------------------------------------------------------
// Quat

/// A unit quaternion representing a rotation.
///
/// Components are stored as `x`, `y`, `z`, `w`; persisted documents write the
/// scalar part first, but that ordering is a concern of the wire codec, not of
/// this type.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Quat {
    /// The identity rotation.
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    /// Creates a quaternion from its components.
    #[inline]
    pub const fn from_xyzw(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Creates a rotation of `angle` radians around `axis`.
    ///
    /// `axis` must be normalized.
    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Self {
        let (s, c) = (angle * 0.5).sin_cos();
        Self {
            x: axis.x * s,
            y: axis.y * s,
            z: axis.z * s,
            w: c,
        }
    }

    /// Squared length of the quaternion.
    #[inline]
    pub fn length_squared(self) -> f32 {
        self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w
    }

    /// Length of the quaternion.
    #[inline]
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Returns a normalized copy, or [`Quat::IDENTITY`] for a zero quaternion.
    pub fn normalize_or_identity(self) -> Self {
        let len = self.length();
        if len > f32::EPSILON {
            let inv = 1.0 / len;
            Self {
                x: self.x * inv,
                y: self.y * inv,
                z: self.z * inv,
                w: self.w * inv,
            }
        } else {
            Self::IDENTITY
        }
    }
}

impl Default for Quat {
    /// See [`Quat::IDENTITY`].
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

// -----------------------------------------------------------------------------
// Tests
