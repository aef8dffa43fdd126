//! Per-character bounding volumes.

use glam::{Mat4, Vec3};

/// Corner sign pattern shared by the top and bottom rings. Matches the
/// cuboid vertex convention so index `k` lines up between the two rings.
const CORNER_SIGNS: [(f32, f32); 4] = [(1.0, 1.0), (-1.0, 1.0), (-1.0, -1.0), (1.0, -1.0)];

/// Conservative bounds for one living character.
///
/// The radii bracket the bounding box: `inner_radius` is the largest sphere
/// the box encloses, `outer_radius` the smallest sphere enclosing it. Both
/// are functions of the capsule half-extents only, so they are computed once
/// per tick from constants while the corner vertices go through the actor
/// transform.
///
/// Invariant: `bottom_vertices[k]` is directly below `top_vertices[k]` for
/// upright transforms. The frustum test checks only the top corners for
/// peeks from above (and only the bottom corners for peeks from below),
/// which is sound exactly because of this alignment.
#[derive(Debug, Clone, Copy)]
pub struct CharacterBounds {
    pub camera: Vec3,
    pub center: Vec3,
    pub inner_radius: f32,
    pub outer_radius: f32,
    pub top_vertices: [Vec3; 4],
    pub bottom_vertices: [Vec3; 4],
}

impl CharacterBounds {
    pub fn new(camera: Vec3, transform: &Mat4, half_width: f32, half_height: f32) -> Self {
        let center = transform.transform_point3(Vec3::ZERO);
        let mut top_vertices = [Vec3::ZERO; 4];
        let mut bottom_vertices = [Vec3::ZERO; 4];
        for (k, (sx, sy)) in CORNER_SIGNS.iter().enumerate() {
            let x = sx * half_width;
            let y = sy * half_width;
            top_vertices[k] = transform.transform_point3(Vec3::new(x, y, half_height));
            bottom_vertices[k] = transform.transform_point3(Vec3::new(x, y, -half_height));
        }
        Self {
            camera,
            center,
            inner_radius: half_width.min(half_height),
            outer_radius: (2.0 * half_width * half_width + half_height * half_height).sqrt(),
            top_vertices,
            bottom_vertices,
        }
    }
}
