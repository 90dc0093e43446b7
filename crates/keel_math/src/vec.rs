use core::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

// -----------------------------------------------------------------------------
// Shared impl macros

/// Implement the parts shared by every vector type:
/// constructors, constants, component access and the element-wise operators.
macro_rules! vec_common {
    ($name:ident, $t:ty, $n:literal, ($($comp:ident),+)) => {
        impl $name {
            /// All components set to zero.
            pub const ZERO: Self = Self { $($comp: 0 as $t),+ };

            /// All components set to one.
            pub const ONE: Self = Self { $($comp: 1 as $t),+ };

            /// Creates a new vector from its components.
            #[inline]
            pub const fn new($($comp: $t),+) -> Self {
                Self { $($comp),+ }
            }

            /// Creates a vector with every component set to `value`.
            #[inline]
            pub const fn splat(value: $t) -> Self {
                Self { $($comp: value),+ }
            }

            /// Returns the components as an array.
            #[inline]
            pub const fn to_array(self) -> [$t; $n] {
                [$(self.$comp),+]
            }

            /// Creates a vector from a component array.
            #[inline]
            pub const fn from_array(a: [$t; $n]) -> Self {
                let [$($comp),+] = a;
                Self { $($comp),+ }
            }

            /// Dot product of `self` and `rhs`.
            #[inline]
            pub fn dot(self, rhs: Self) -> $t {
                0 as $t $(+ self.$comp * rhs.$comp)+
            }
        }

        impl Add for $name {
            type Output = Self;
            #[inline]
            fn add(self, rhs: Self) -> Self {
                Self { $($comp: self.$comp + rhs.$comp),+ }
            }
        }

        impl AddAssign for $name {
            #[inline]
            fn add_assign(&mut self, rhs: Self) {
                $(self.$comp += rhs.$comp;)+
            }
        }

        impl Sub for $name {
            type Output = Self;
            #[inline]
            fn sub(self, rhs: Self) -> Self {
                Self { $($comp: self.$comp - rhs.$comp),+ }
            }
        }

        impl SubAssign for $name {
            #[inline]
            fn sub_assign(&mut self, rhs: Self) {
                $(self.$comp -= rhs.$comp;)+
            }
        }

        impl Mul<$t> for $name {
            type Output = Self;
            #[inline]
            fn mul(self, rhs: $t) -> Self {
                Self { $($comp: self.$comp * rhs),+ }
            }
        }
    };
}

/// Negation for signed component types.
macro_rules! vec_signed {
    ($name:ident, ($($comp:ident),+)) => {
        impl Neg for $name {
            type Output = Self;
            #[inline]
            fn neg(self) -> Self {
                Self { $($comp: -self.$comp),+ }
            }
        }
    };
}

/// Length helpers for `f32` component types.
macro_rules! vec_float {
    ($name:ident, ($($comp:ident),+)) => {
        impl $name {
            /// Squared euclidean length.
            #[inline]
            pub fn length_squared(self) -> f32 {
                self.dot(self)
            }

            /// Euclidean length.
            #[inline]
            pub fn length(self) -> f32 {
                self.length_squared().sqrt()
            }
        }
    };
}

// -----------------------------------------------------------------------------
// f32 vectors

/// A 2-component `f32` vector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

/// A 3-component `f32` vector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// A 4-component `f32` vector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

vec_common!(Vec2, f32, 2, (x, y));
vec_common!(Vec3, f32, 3, (x, y, z));
vec_common!(Vec4, f32, 4, (x, y, z, w));

vec_signed!(Vec2, (x, y));
vec_signed!(Vec3, (x, y, z));
vec_signed!(Vec4, (x, y, z, w));

vec_float!(Vec2, (x, y));
vec_float!(Vec3, (x, y, z));
vec_float!(Vec4, (x, y, z, w));

impl Vec3 {
    /// Cross product of `self` and `rhs`.
    #[inline]
    pub fn cross(self, rhs: Self) -> Self {
        Self {
            x: self.y * rhs.z - self.z * rhs.y,
            y: self.z * rhs.x - self.x * rhs.z,
            z: self.x * rhs.y - self.y * rhs.x,
        }
    }
}

// -----------------------------------------------------------------------------
// i32 vectors

/// A 2-component `i32` vector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IVec2 {
    pub x: i32,
    pub y: i32,
}

/// A 3-component `i32` vector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IVec3 {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

/// A 4-component `i32` vector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IVec4 {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub w: i32,
}

vec_common!(IVec2, i32, 2, (x, y));
vec_common!(IVec3, i32, 3, (x, y, z));
vec_common!(IVec4, i32, 4, (x, y, z, w));

vec_signed!(IVec2, (x, y));
vec_signed!(IVec3, (x, y, z));
vec_signed!(IVec4, (x, y, z, w));

impl Eq for IVec2 {}
impl Eq for IVec3 {}
impl Eq for IVec4 {}

// -----------------------------------------------------------------------------
// u32 vectors

/// A 2-component `u32` vector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UVec2 {
    pub x: u32,
    pub y: u32,
}

/// A 3-component `u32` vector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UVec3 {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

/// A 4-component `u32` vector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UVec4 {
    pub x: u32,
    pub y: u32,
    pub z: u32,
    pub w: u32,
}

vec_common!(UVec2, u32, 2, (x, y));
vec_common!(UVec3, u32, 3, (x, y, z));
vec_common!(UVec4, u32, 4, (x, y, z, w));

impl Eq for UVec2 {}
impl Eq for UVec3 {}
impl Eq for UVec4 {}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{IVec3, UVec2, Vec2, Vec3};

    #[test]
    fn constants() {
        assert_eq!(Vec2::ZERO, Vec2::new(0.0, 0.0));
        assert_eq!(IVec3::ONE, IVec3::new(1, 1, 1));
    }

    #[test]
    fn arithmetic() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::splat(2.0);
        assert_eq!(a + b, Vec3::new(3.0, 4.0, 5.0));
        assert_eq!(a - b, Vec3::new(-1.0, 0.0, 1.0));
        assert_eq!(a * 2.0, Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(-a, Vec3::new(-1.0, -2.0, -3.0));
    }

    #[test]
    fn dot_and_cross() {
        let a = Vec3::new(1.0, 0.0, 0.0);
        let b = Vec3::new(0.0, 1.0, 0.0);
        assert_eq!(a.dot(b), 0.0);
        assert_eq!(a.cross(b), Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(UVec2::new(2, 3).dot(UVec2::new(4, 5)), 23);
    }

    #[test]
    fn arrays() {
        let v = Vec2::new(1.5, -2.5);
        assert_eq!(v.to_array(), [1.5, -2.5]);
        assert_eq!(Vec2::from_array([1.5, -2.5]), v);
    }

    #[test]
    fn length() {
        assert_eq!(Vec2::new(3.0, 4.0).length(), 5.0);
    }
}
