//! Input and scheduling types for the culling engine.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

/// One ordered (viewer, target) pair pending visibility evaluation this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bundle {
    pub viewer: usize,
    pub target: usize,
}

/// Per-player state handed in by the host every tick.
///
/// `transform` is the actor transform (translation plus yaw). Characters are
/// assumed upright: the engine's upper/lower peek optimization relies on each
/// bottom bounding-box corner sitting directly below its top counterpart,
/// which a rolling or pitching transform would break.
#[derive(Debug, Clone, Copy)]
pub struct PlayerPose {
    /// First-person camera location, world space.
    pub camera: Vec3,
    pub transform: Mat4,
    pub alive: bool,
}

/// World snapshot for one server tick.
///
/// `players` must have one entry per character in the roster the engine was
/// built with, in stable character-index order. Dead players keep their slot.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub players: &'a [PlayerPose],
    /// Host tick counter. Must be strictly increasing across calls.
    pub tick: u64,
}

/// Raw cuboid occluder input: eight vertices with a stable layout so hosts
/// can hand occluder blocks in zero-copy.
///
/// Vertex order convention, validated on load:
/// - vertices 0..=3: top face, counter-clockwise when viewed from above (+Z);
/// - vertices 4..=7: bottom face, with vertex `k + 4` directly below vertex
///   `k` (the same winding, translated down).
///
/// "Directly below" is not enforced exactly; any convex prism whose faces
/// come out planar under this indexing is accepted.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct CuboidSpec {
    pub vertices: [[f32; 3]; 8],
}

impl CuboidSpec {
    /// Axis-aligned box helper, mostly for tests and benches.
    pub fn axis_aligned(center: Vec3, half_extents: Vec3) -> Self {
        let c = center;
        let h = half_extents;
        // Top ring CCW from above, then the same ring at the bottom.
        let ring: [(f32, f32); 4] = [(1.0, 1.0), (-1.0, 1.0), (-1.0, -1.0), (1.0, -1.0)];
        let mut vertices = [[0.0f32; 3]; 8];
        for (k, (sx, sy)) in ring.iter().enumerate() {
            vertices[k] = [c.x + sx * h.x, c.y + sy * h.y, c.z + h.z];
            vertices[k + 4] = [c.x + sx * h.x, c.y + sy * h.y, c.z - h.z];
        }
        Self { vertices }
    }

    #[inline]
    pub(crate) fn vertex(&self, i: usize) -> Vec3 {
        Vec3::from_array(self.vertices[i])
    }
}

/// A spherical occluder for the optional fast pre-check stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereOccluder {
    pub center: Vec3,
    pub radius: f32,
}
