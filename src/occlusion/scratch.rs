//! Reusable per-worker scratch for bundle evaluation.

use crate::cuboid::{CUBOID_F, CUBOID_V};
use crate::geometry::Plane;

/// Scratch buffers for one worker evaluating bundles.
///
/// Allocated once and reused across every cuboid test; when the cuboid stage
/// runs in parallel each worker carries its own.
#[derive(Default)]
pub struct CullScratch {
    /// Directed-edge matrix for silhouette cancellation: `edge_set[a][b]`
    /// is set when some between-face traverses vertex `a` to `b`.
    pub edge_set: [[bool; CUBOID_V]; CUBOID_V],
    /// Indices of faces sitting between the peek and the enemy.
    pub faces_between: Vec<usize>,
    /// Shadow-frustum planes for the current peek.
    pub frustum: Vec<Plane>,
}

impl CullScratch {
    pub fn new() -> Self {
        Self {
            edge_set: [[false; CUBOID_V]; CUBOID_V],
            faces_between: Vec::with_capacity(CUBOID_F),
            // At most 6 silhouette edges for a convex hexahedron.
            frustum: Vec::with_capacity(6),
        }
    }

    /// Must run before each between-face accumulation; the matrix is shared
    /// across peeks and cuboids. The whole-array write clears all 64 slots
    /// regardless of how the matrix is laid out.
    #[inline]
    pub fn clear_edges(&mut self) {
        self.edge_set = [[false; CUBOID_V]; CUBOID_V];
    }
}
