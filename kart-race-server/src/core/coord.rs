//! World-space Vectors and Coordinates
//!
//! Plain `f32` vector math for kart simulation. Angles are in degrees,
//! heading 0 faces +Y and grows counter-clockwise around +Z.

use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use serde::{Serialize, Deserialize};

/// 3D vector with `f32` components.
#[derive(Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component (lateral in kart space)
    pub x: f32,
    /// Y component (longitudinal in kart space)
    pub y: f32,
    /// Z component (vertical)
    pub z: f32,
}

impl Vec3 {
    /// Zero vector
    pub const ZERO: Self = Self { x: 0.0, y: 0.0, z: 0.0 };

    /// Create a new vector.
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Scale by a scalar.
    #[inline]
    pub fn scale(self, s: f32) -> Self {
        Self::new(self.x * s, self.y * s, self.z * s)
    }

    /// Length of the full 3D vector.
    #[inline]
    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Squared length of the XY projection.
    #[inline]
    pub fn planar_length_squared(self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    /// Squared XY distance to another point (Z ignored).
    #[inline]
    pub fn planar_distance_squared(self, other: Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Normalize the XY projection, dropping Z.
    /// Returns ZERO if the planar length is zero.
    #[inline]
    pub fn planar_normalize(self) -> Self {
        let len = self.planar_length_squared().sqrt();
        if len <= 0.0 {
            return Self::ZERO;
        }
        Self::new(self.x / len, self.y / len, 0.0)
    }

    /// Heading (degrees) of the XY direction, 0 = +Y.
    #[inline]
    pub fn heading(self) -> f32 {
        (-self.x).atan2(self.y).to_degrees()
    }
}

impl Add for Vec3 {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sub for Vec3 {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl SubAssign for Vec3 {
    fn sub_assign(&mut self, other: Self) {
        *self = *self - other;
    }
}

impl Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl fmt::Debug for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vec3({:.3}, {:.3}, {:.3})", self.x, self.y, self.z)
    }
}

/// Translation plus heading/pitch/roll.
///
/// Used for both kart position and kart velocity; for velocity, `xyz` is in
/// kart space (`xyz.y` is signed forward speed) and `hpr` holds angular rates
/// in degrees per second.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Coord {
    /// Translation
    pub xyz: Vec3,
    /// Heading, pitch, roll (degrees)
    pub hpr: Vec3,
}

impl Coord {
    /// All-zero coordinate.
    pub const ZERO: Self = Self { xyz: Vec3::ZERO, hpr: Vec3::ZERO };

    /// Create from translation and heading.
    pub const fn at(xyz: Vec3, heading: f32) -> Self {
        Self { xyz, hpr: Vec3::new(heading, 0.0, 0.0) }
    }

    /// Offset from this coordinate by `length` along `heading + angle`,
    /// measured toward the rear of the kart.
    ///
    /// Produces the ground contact point used for wheel-side effects.
    pub fn rear_offset(&self, length: f32, angle: f32) -> Vec3 {
        let a = (self.hpr.x + angle).to_radians();
        Vec3::new(
            self.xyz.x + length * a.sin(),
            self.xyz.y - length * a.cos(),
            self.xyz.z,
        )
    }

    /// Rotate a kart-space vector into world space using this heading.
    pub fn to_world(&self, local: Vec3) -> Vec3 {
        let h = self.hpr.x.to_radians();
        let (s, c) = h.sin_cos();
        Vec3::new(
            local.x * c - local.y * s,
            local.x * s + local.y * c,
            local.z,
        )
    }

    /// Set every component to zero.
    pub fn clear(&mut self) {
        *self = Self::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_planar_distance_ignores_z() {
        let a = Vec3::new(0.0, 0.0, 10.0);
        let b = Vec3::new(3.0, 4.0, -2.0);
        assert!(close(a.planar_distance_squared(b), 25.0));
    }

    #[test]
    fn test_planar_normalize() {
        let n = Vec3::new(3.0, 4.0, 7.0).planar_normalize();
        assert!(close(n.x, 0.6));
        assert!(close(n.y, 0.8));
        assert_eq!(n.z, 0.0);
        assert_eq!(Vec3::ZERO.planar_normalize(), Vec3::ZERO);
    }

    #[test]
    fn test_forward_is_plus_y_at_zero_heading() {
        let c = Coord::at(Vec3::ZERO, 0.0);
        let w = c.to_world(Vec3::new(0.0, 1.0, 0.0));
        assert!(close(w.x, 0.0));
        assert!(close(w.y, 1.0));

        // 90 degrees left turn: forward now faces -X
        let c = Coord::at(Vec3::ZERO, 90.0);
        let w = c.to_world(Vec3::new(0.0, 1.0, 0.0));
        assert!(close(w.x, -1.0));
        assert!(close(w.y, 0.0));
    }

    #[test]
    fn test_heading_matches_to_world() {
        for h in [0.0f32, 45.0, 90.0, -135.0] {
            let c = Coord::at(Vec3::ZERO, h);
            let fwd = c.to_world(Vec3::new(0.0, 1.0, 0.0));
            let back = fwd.heading();
            let diff = (back - h).rem_euclid(360.0);
            assert!(diff < 1e-3 || diff > 360.0 - 1e-3, "h={h} back={back}");
        }
    }

    #[test]
    fn test_rear_offset_is_behind() {
        let c = Coord::at(Vec3::new(1.0, 1.0, 2.0), 0.0);
        let p = c.rear_offset(0.57, 0.0);
        assert!(close(p.x, 1.0));
        assert!(close(p.y, 1.0 - 0.57));
        assert!(close(p.z, 2.0));
    }
}
