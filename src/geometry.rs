//! Minimal plane and bounding-box primitives on top of glam.

use glam::Vec3;

/// A plane stored as a unit normal and offset; points `p` on the plane
/// satisfy `normal.dot(p) == w`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub w: f32,
}

impl Plane {
    /// Plane through three points. The normal follows the right-hand rule on
    /// `(b - a) x (c - a)`, so the winding of the points fixes orientation.
    #[inline]
    pub fn from_points(a: Vec3, b: Vec3, c: Vec3) -> Self {
        let normal = (b - a).cross(c - a).normalize();
        Self {
            normal,
            w: normal.dot(a),
        }
    }

    /// Signed distance from `p` to the plane, positive on the normal side.
    #[inline]
    pub fn plane_dot(&self, p: Vec3) -> f32 {
        self.normal.dot(p) - self.w
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_points(points: &[Vec3]) -> Self {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for &p in points {
            min = min.min(p);
            max = max.max(p);
        }
        Self { min, max }
    }

    /// Box spanning the segment from `a` to `b`.
    #[inline]
    pub fn from_segment(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    #[inline]
    pub fn inflate(self, r: f32) -> Self {
        Self {
            min: self.min - Vec3::splat(r),
            max: self.max + Vec3::splat(r),
        }
    }

    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }
}
