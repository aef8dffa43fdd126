//! Convex cuboid occluders: face derivation and load-time validation.
//!
//! A cuboid is stored as eight vertices plus six faces, each face carrying an
//! outward unit normal and a perimeter of four vertex indices. Perimeters
//! wrap counter-clockwise as seen from outside the cuboid, so every directed
//! edge `(a, b)` appears in exactly one face and its reverse `(b, a)` in
//! exactly one neighbouring face. The silhouette extraction in the frustum
//! test cancels interior edges through that pairing; a cuboid that violates
//! it would silently corrupt occlusion results, which is why everything is
//! checked when the world is loaded rather than trusted per tick.

use glam::Vec3;
use rustc_hash::FxHashSet;

use crate::error::CullingError;
use crate::geometry::{Aabb, Plane};
use crate::types::CuboidSpec;

pub const CUBOID_V: usize = 8;
pub const CUBOID_F: usize = 6;
pub const FACE_V: usize = 4;

/// Vertices of a face may drift off-plane by this much (world units).
const PLANAR_EPS: f32 = 1e-2;

/// A vertex may sit outside a face plane by this much before the cuboid is
/// rejected as non-convex.
const CONVEX_EPS: f32 = 1e-2;

/// Fixed perimeter table for the [`CuboidSpec`] vertex convention
/// (0..=3 top ring CCW from above, 4..=7 the same ring at the bottom).
const FACE_PERIMETERS: [[u8; FACE_V]; CUBOID_F] = [
    [0, 1, 2, 3], // top
    [4, 7, 6, 5], // bottom
    [1, 0, 4, 5],
    [2, 1, 5, 6],
    [3, 2, 6, 7],
    [0, 3, 7, 4],
];

#[derive(Debug, Clone, Copy)]
pub struct Face {
    /// Outward unit normal.
    pub normal: Vec3,
    /// Vertex indices, CCW seen from outside.
    pub perimeter: [u8; FACE_V],
}

#[derive(Debug, Clone)]
pub struct Cuboid {
    pub vertices: [Vec3; CUBOID_V],
    pub faces: [Face; CUBOID_F],
}

impl Cuboid {
    /// Derive faces from a raw vertex block and validate the result.
    ///
    /// `index` is only used to label diagnostics.
    pub fn from_spec(index: usize, spec: &CuboidSpec) -> Result<Self, CullingError> {
        let mut vertices = [Vec3::ZERO; CUBOID_V];
        for (i, v) in vertices.iter_mut().enumerate() {
            *v = spec.vertex(i);
        }

        let mut seen: FxHashSet<[u32; 3]> = FxHashSet::default();
        for v in &vertices {
            let bits = [v.x.to_bits(), v.y.to_bits(), v.z.to_bits()];
            if !seen.insert(bits) {
                return Err(CullingError::DuplicateVertices { cuboid: index });
            }
        }

        let mut faces = [Face {
            normal: Vec3::ZERO,
            perimeter: [0; FACE_V],
        }; CUBOID_F];

        for (fi, perimeter) in FACE_PERIMETERS.iter().enumerate() {
            let [a, b, c, d] = perimeter.map(|k| vertices[k as usize]);
            // Diagonal cross product: robust for planar quads, and its sign
            // encodes the winding.
            let raw = (c - a).cross(d - b);
            if raw.length_squared() < 1e-6 {
                return Err(CullingError::DegenerateFace {
                    cuboid: index,
                    face: fi,
                });
            }
            let normal = raw.normalize();
            let plane = Plane {
                normal,
                w: normal.dot(a),
            };
            for v in [a, b, c, d] {
                if plane.plane_dot(v).abs() > PLANAR_EPS {
                    return Err(CullingError::NonPlanarFace {
                        cuboid: index,
                        face: fi,
                    });
                }
            }
            faces[fi] = Face {
                normal,
                perimeter: *perimeter,
            };
        }

        // Convexity: every vertex on or behind every face plane. An inverted
        // winding flips a normal inward and fails here immediately.
        for (fi, face) in faces.iter().enumerate() {
            let anchor = vertices[face.perimeter[0] as usize];
            for (vi, v) in vertices.iter().enumerate() {
                if (*v - anchor).dot(face.normal) > CONVEX_EPS {
                    return Err(CullingError::NonConvex {
                        cuboid: index,
                        face: fi,
                        vertex: vi,
                    });
                }
            }
        }

        Ok(Self { vertices, faces })
    }

    /// First perimeter vertex of face `fi`; any face vertex works as a plane
    /// anchor for the between-test.
    #[inline]
    pub fn face_anchor(&self, fi: usize) -> Vec3 {
        self.vertices[self.faces[fi].perimeter[0] as usize]
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_points(&self.vertices)
    }
}
