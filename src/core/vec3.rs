//! Fixed-Point 3D Vector
//!
//! Deterministic 3D vector operations for combatant physics.
//! Y is up; the horizontal plane is XZ.

use std::fmt;
use std::ops::{Add, Sub, Neg};
use serde::{Serialize, Deserialize};

use super::fixed::{
    Fixed, FIXED_ONE, FIXED_SCALE,
    fixed_mul, fixed_mul_sat, fixed_div, fixed_sqrt_wide, to_float,
};

/// 3D vector with fixed-point components.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FixedVec3 {
    /// X component (Q16.16 fixed-point)
    pub x: Fixed,
    /// Y component (Q16.16 fixed-point), up
    pub y: Fixed,
    /// Z component (Q16.16 fixed-point)
    pub z: Fixed,
}

impl FixedVec3 {
    /// Zero vector
    pub const ZERO: Self = Self { x: 0, y: 0, z: 0 };

    /// Unit vector pointing up (+Y)
    pub const UP: Self = Self { x: 0, y: FIXED_ONE, z: 0 };

    /// Unit vector along +Z (default facing)
    pub const FORWARD: Self = Self { x: 0, y: 0, z: FIXED_ONE };

    /// Create a new vector from fixed-point components.
    #[inline]
    pub const fn new(x: Fixed, y: Fixed, z: Fixed) -> Self {
        Self { x, y, z }
    }

    /// Create a vector from integer components.
    #[inline]
    pub const fn from_ints(x: i32, y: i32, z: i32) -> Self {
        Self {
            x: x << FIXED_SCALE,
            y: y << FIXED_SCALE,
            z: z << FIXED_SCALE,
        }
    }

    /// Add another vector.
    #[inline]
    pub fn add(self, other: Self) -> Self {
        Self {
            x: self.x.wrapping_add(other.x),
            y: self.y.wrapping_add(other.y),
            z: self.z.wrapping_add(other.z),
        }
    }

    /// Subtract another vector.
    #[inline]
    pub fn sub(self, other: Self) -> Self {
        Self {
            x: self.x.wrapping_sub(other.x),
            y: self.y.wrapping_sub(other.y),
            z: self.z.wrapping_sub(other.z),
        }
    }

    /// Scale by a fixed-point scalar.
    #[inline]
    pub fn scale(self, scalar: Fixed) -> Self {
        Self {
            x: fixed_mul(self.x, scalar),
            y: fixed_mul(self.y, scalar),
            z: fixed_mul(self.z, scalar),
        }
    }

    /// Rescale so that `length()` is exactly `target`, keeping direction.
    ///
    /// Components are rounded to nearest, then the largest one is stepped
    /// by one unit until the floor square root lands on `target`. One step
    /// moves the squared length by at most `2 * target + 1`.
    pub fn with_length(self, target: Fixed) -> Self {
        let len = self.length();
        if len == 0 || target <= 0 {
            return Self::ZERO;
        }
        let den = len as i64;
        let round = |c: Fixed| {
            let p = (c as i64) * (target as i64);
            let q = if p >= 0 { (p + den / 2) / den } else { (p - den / 2) / den };
            q as Fixed
        };
        let mut out = Self {
            x: round(self.x),
            y: round(self.y),
            z: round(self.z),
        };

        let axis = if self.x.unsigned_abs() >= self.y.unsigned_abs()
            && self.x.unsigned_abs() >= self.z.unsigned_abs()
        {
            0
        } else if self.y.unsigned_abs() >= self.z.unsigned_abs() {
            1
        } else {
            2
        };
        let sign: Fixed = if *out.axis_mut(axis) < 0 { -1 } else { 1 };

        // Rounding leaves the squared length within a few windows of the target
        for _ in 0..64 {
            let current = out.length();
            if current == target {
                break;
            }
            let c = out.axis_mut(axis);
            if current < target {
                *c = c.wrapping_add(sign);
            } else {
                *c = c.wrapping_sub(sign);
            }
        }
        out
    }

    fn axis_mut(&mut self, axis: usize) -> &mut Fixed {
        match axis {
            0 => &mut self.x,
            1 => &mut self.y,
            _ => &mut self.z,
        }
    }

    /// Divide by a fixed-point scalar.
    #[inline]
    pub fn div_scalar(self, scalar: Fixed) -> Self {
        Self {
            x: fixed_div(self.x, scalar),
            y: fixed_div(self.y, scalar),
            z: fixed_div(self.z, scalar),
        }
    }

    /// Squared length (saturating; prefer this for comparisons).
    #[inline]
    pub fn length_squared(self) -> Fixed {
        fixed_mul_sat(self.x, self.x)
            .saturating_add(fixed_mul_sat(self.y, self.y))
            .saturating_add(fixed_mul_sat(self.z, self.z))
    }

    /// Length (magnitude), exact floor of the true length.
    #[inline]
    pub fn length(self) -> Fixed {
        let wide = (self.x as i64) * (self.x as i64)
            + (self.y as i64) * (self.y as i64)
            + (self.z as i64) * (self.z as i64);
        fixed_sqrt_wide(wide)
    }

    /// Squared distance to another point (saturating).
    #[inline]
    pub fn distance_squared(self, other: Self) -> Fixed {
        self.sub(other).length_squared()
    }

    /// Normalize to unit length.
    /// Returns ZERO if length is zero.
    #[inline]
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len == 0 {
            return Self::ZERO;
        }
        self.div_scalar(len)
    }

    /// Dot product with another vector.
    #[inline]
    pub fn dot(self, other: Self) -> Fixed {
        fixed_mul(self.x, other.x)
            .wrapping_add(fixed_mul(self.y, other.y))
            .wrapping_add(fixed_mul(self.z, other.z))
    }

    /// Cross product.
    #[inline]
    pub fn cross(self, other: Self) -> Self {
        Self {
            x: fixed_mul(self.y, other.z).wrapping_sub(fixed_mul(self.z, other.y)),
            y: fixed_mul(self.z, other.x).wrapping_sub(fixed_mul(self.x, other.z)),
            z: fixed_mul(self.x, other.y).wrapping_sub(fixed_mul(self.y, other.x)),
        }
    }

    /// Projection onto the horizontal XZ plane (Y zeroed).
    #[inline]
    pub fn horizontal(self) -> Self {
        Self { x: self.x, y: 0, z: self.z }
    }

    /// Squared length of the horizontal component.
    #[inline]
    pub fn horizontal_length_squared(self) -> Fixed {
        fixed_mul_sat(self.x, self.x).saturating_add(fixed_mul_sat(self.z, self.z))
    }

    /// Replace the Y component.
    #[inline]
    pub fn with_y(self, y: Fixed) -> Self {
        Self { y, ..self }
    }

    /// Check for the zero vector.
    #[inline]
    pub fn is_zero(self) -> bool {
        self.x == 0 && self.y == 0 && self.z == 0
    }

    /// Convert to floats (for display only).
    pub fn to_floats(self) -> (f32, f32, f32) {
        (to_float(self.x), to_float(self.y), to_float(self.z))
    }
}

impl Add for FixedVec3 {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        FixedVec3::add(self, rhs)
    }
}

impl Sub for FixedVec3 {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        FixedVec3::sub(self, rhs)
    }
}

impl Neg for FixedVec3 {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self {
            x: self.x.wrapping_neg(),
            y: self.y.wrapping_neg(),
            z: self.z.wrapping_neg(),
        }
    }
}

impl fmt::Debug for FixedVec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (x, y, z) = self.to_floats();
        write!(f, "Vec3({:.4}, {:.4}, {:.4})", x, y, z)
    }
}
