//! Vector, rotation and rigid-transform math shared by every module.
//!
//! Everything is `f64`: orbital state vectors lose too much precision in
//! single precision once the container is a few thousand kilometres from
//! the body centre.

use serde::{Deserialize, Serialize};

/// 3D vector
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0, z: 0.0 };
    pub const ONE: Self = Self { x: 1.0, y: 1.0, z: 1.0 };
    pub const UP: Self = Self { x: 0.0, y: 1.0, z: 0.0 };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn splat(v: f64) -> Self {
        Self { x: v, y: v, z: v }
    }

    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(&self, other: &Self) -> Self {
        Self {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    pub fn length_squared(&self) -> f64 {
        self.dot(self)
    }

    pub fn length(&self) -> f64 {
        self.length_squared().sqrt()
    }

    pub fn distance(&self, other: &Self) -> f64 {
        (*self - *other).length()
    }

    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > 0.0 {
            *self * (1.0 / len)
        } else {
            Self::ZERO
        }
    }

    /// Component-wise minimum.
    pub fn min(&self, other: &Self) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y), self.z.min(other.z))
    }

    /// Component-wise maximum.
    pub fn max(&self, other: &Self) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y), self.z.max(other.z))
    }

    pub fn abs(&self) -> Self {
        Self::new(self.x.abs(), self.y.abs(), self.z.abs())
    }

    /// Product of the three components (box volume when `self` is a size).
    pub fn product(&self) -> f64 {
        self.x * self.y * self.z
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Components sorted ascending, used for orientation-free size comparison.
    pub fn sorted(&self) -> [f64; 3] {
        let mut c = [self.x, self.y, self.z];
        c.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        c
    }

    pub fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        (*self - *other).length() <= tolerance
    }
}

impl std::ops::Add for Vec3 {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl std::ops::AddAssign for Vec3 {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

impl std::ops::SubAssign for Vec3 {
    fn sub_assign(&mut self, other: Self) {
        *self = *self - other;
    }
}

impl std::ops::Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl std::ops::Mul<f64> for Vec3 {
    type Output = Self;
    fn mul(self, scalar: f64) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
            z: self.z * scalar,
        }
    }
}

impl std::ops::Div<f64> for Vec3 {
    type Output = Self;
    fn div(self, scalar: f64) -> Self {
        self * (1.0 / scalar)
    }
}

impl std::fmt::Display for Vec3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{},{}", self.x, self.y, self.z)
    }
}

impl std::str::FromStr for Vec3 {
    type Err = String;

    /// Parses `"x,y,z"` (whitespace tolerated around components).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(format!("expected 3 components, got {}", parts.len()));
        }
        let mut c = [0.0; 3];
        for (slot, part) in c.iter_mut().zip(&parts) {
            *slot = part
                .parse::<f64>()
                .map_err(|e| format!("bad component '{}': {}", part, e))?;
        }
        Ok(Vec3::new(c[0], c[1], c[2]))
    }
}

/// Unit quaternion rotation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Quat {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quat {
    pub const IDENTITY: Self = Self {
        w: 1.0,
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    /// Rotation of `angle` radians about `axis`.
    pub fn from_axis_angle(axis: Vec3, angle: f64) -> Self {
        let a = axis.normalize();
        let (s, c) = (angle * 0.5).sin_cos();
        Self::new(c, a.x * s, a.y * s, a.z * s)
    }

    pub fn norm(&self) -> f64 {
        (self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Normalized copy; identity for a degenerate quaternion.
    pub fn normalize(&self) -> Self {
        let n = self.norm();
        if n <= f64::EPSILON {
            Self::IDENTITY
        } else {
            Self::new(self.w / n, self.x / n, self.y / n, self.z / n)
        }
    }

    /// Inverse of a unit quaternion.
    pub fn inverse(&self) -> Self {
        Self::new(self.w, -self.x, -self.y, -self.z)
    }

    pub fn rotate(&self, v: Vec3) -> Vec3 {
        let u = Vec3::new(self.x, self.y, self.z);
        let t = u.cross(&v) * 2.0;
        v + t * self.w + u.cross(&t)
    }

    /// Angle between two rotations in radians.
    pub fn angle_to(&self, other: &Self) -> f64 {
        let d = (self.w * other.w + self.x * other.x + self.y * other.y + self.z * other.z).abs();
        2.0 * d.min(1.0).acos()
    }
}

impl std::ops::Mul for Quat {
    type Output = Self;
    fn mul(self, o: Self) -> Self {
        Self {
            w: self.w * o.w - self.x * o.x - self.y * o.y - self.z * o.z,
            x: self.w * o.x + self.x * o.w + self.y * o.z - self.z * o.y,
            y: self.w * o.y - self.x * o.z + self.y * o.w + self.z * o.x,
            z: self.w * o.z + self.x * o.y - self.y * o.x + self.z * o.w,
        }
    }
}

impl std::ops::Mul<Vec3> for Quat {
    type Output = Vec3;
    fn mul(self, v: Vec3) -> Vec3 {
        self.rotate(v)
    }
}

/// Rigid transform: rotation followed by translation.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }

    /// Local point to parent space.
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        self.position + self.rotation.rotate(p)
    }

    /// Local direction to parent space (no translation).
    pub fn transform_direction(&self, d: Vec3) -> Vec3 {
        self.rotation.rotate(d)
    }

    pub fn inverse_transform_point(&self, p: Vec3) -> Vec3 {
        self.rotation.inverse().rotate(p - self.position)
    }

    pub fn inverse_transform_direction(&self, d: Vec3) -> Vec3 {
        self.rotation.inverse().rotate(d)
    }

    /// World transform of `child`, which is expressed in this transform's space.
    pub fn then(&self, child: &Transform) -> Transform {
        Transform {
            position: self.transform_point(child.position),
            rotation: (self.rotation * child.rotation).normalize(),
        }
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Tight bounds of a point cloud; `None` for an empty cloud.
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let first = *points.first()?;
        let mut b = Bounds::new(first, first);
        for p in &points[1..] {
            b.encapsulate(*p);
        }
        Some(b)
    }

    pub fn encapsulate(&mut self, p: Vec3) {
        self.min = self.min.min(&p);
        self.max = self.max.max(&p);
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn contains(&self, p: &Vec3, tolerance: f64) -> bool {
        p.x >= self.min.x - tolerance
            && p.x <= self.max.x + tolerance
            && p.y >= self.min.y - tolerance
            && p.y <= self.max.y + tolerance
            && p.z >= self.min.z - tolerance
            && p.z <= self.max.z + tolerance
    }

    /// The eight corners, bit i of the index selecting max on axis i.
    pub fn corners(&self) -> [Vec3; 8] {
        let mut out = [Vec3::ZERO; 8];
        for (i, c) in out.iter_mut().enumerate() {
            *c = Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
        }
        out
    }
}

/// The twelve box edges as index pairs into [`Bounds::corners`].
pub const BOX_EDGES: [(usize, usize); 12] = [
    (0, 1),
    (2, 3),
    (4, 5),
    (6, 7),
    (0, 2),
    (1, 3),
    (4, 6),
    (5, 7),
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_quat_rotates_x_into_y() {
        let q = Quat::from_axis_angle(Vec3::new(0.0, 0.0, 1.0), FRAC_PI_2);
        let v = q * Vec3::new(1.0, 0.0, 0.0);
        assert!(v.approx_eq(&Vec3::new(0.0, 1.0, 0.0), 1e-12));
    }

    #[test]
    fn test_transform_inverse_roundtrip() {
        let t = Transform::new(
            Vec3::new(3.0, -2.0, 5.0),
            Quat::from_axis_angle(Vec3::new(1.0, 1.0, 0.0), 0.7),
        );
        let p = Vec3::new(0.5, 4.0, -1.0);
        let back = t.inverse_transform_point(t.transform_point(p));
        assert!(back.approx_eq(&p, 1e-12));
    }

    #[test]
    fn test_transform_then_composes() {
        let parent = Transform::new(
            Vec3::new(10.0, 0.0, 0.0),
            Quat::from_axis_angle(Vec3::UP, FRAC_PI_2),
        );
        let child = Transform::from_position(Vec3::new(1.0, 0.0, 0.0));
        let world = parent.then(&child);
        assert!(world.position.approx_eq(&Vec3::new(10.0, 0.0, -1.0), 1e-12));
    }

    #[test]
    fn test_vec3_parse() {
        let v: Vec3 = "1, 2.5,-3".parse().unwrap();
        assert_eq!(v, Vec3::new(1.0, 2.5, -3.0));
        assert!("1,2".parse::<Vec3>().is_err());
        assert!("a,b,c".parse::<Vec3>().is_err());
    }

    #[test]
    fn test_bounds_from_points() {
        let b = Bounds::from_points(&[Vec3::new(1.0, 2.0, 3.0), Vec3::new(-1.0, 0.0, 5.0)]).unwrap();
        assert_eq!(b.size(), Vec3::new(2.0, 2.0, 2.0));
        assert_eq!(b.center(), Vec3::new(0.0, 1.0, 4.0));
        assert!(Bounds::from_points(&[]).is_none());
    }
}
