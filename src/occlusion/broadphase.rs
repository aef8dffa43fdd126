//! Conservative candidate selection for the cuboid stage.

use glam::Vec3;

use crate::cuboid::Cuboid;
use crate::geometry::Aabb;

/// Slack added to the peek envelope so boxes grazing the segment stay in.
const PAD_EPS: f32 = 1.0;

/// Precomputed cuboid bounding boxes queried per bundle.
///
/// A cuboid that blocks a pair intersects every peek-to-enemy-center
/// segment, and all peeks lie within the peek envelope of the camera, so
/// testing against the inflated camera-to-enemy segment box can only
/// over-approximate. No true blocker is ever dropped.
pub(crate) struct BroadPhase {
    aabbs: Vec<Aabb>,
}

impl BroadPhase {
    pub fn new(cuboids: &[Cuboid]) -> Self {
        Self {
            aabbs: cuboids.iter().map(|c| c.aabb()).collect(),
        }
    }

    /// Indices of cuboids that may occlude the segment from `camera` to
    /// `enemy_center`, with `pad` covering the peek displacement.
    pub fn candidates(&self, camera: Vec3, enemy_center: Vec3, pad: f32, out: &mut Vec<u32>) {
        out.clear();
        let query = Aabb::from_segment(camera, enemy_center).inflate(pad + PAD_EPS);
        for (i, aabb) in self.aabbs.iter().enumerate() {
            if query.overlaps(aabb) {
                out.push(i as u32);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CuboidSpec;

    fn boxes(specs: &[(Vec3, Vec3)]) -> Vec<Cuboid> {
        specs
            .iter()
            .enumerate()
            .map(|(i, (c, h))| Cuboid::from_spec(i, &CuboidSpec::axis_aligned(*c, *h)).unwrap())
            .collect()
    }

    #[test]
    fn keeps_blockers_drops_distant_boxes() {
        let cuboids = boxes(&[
            (Vec3::new(250.0, 0.0, 90.0), Vec3::new(10.0, 200.0, 90.0)),
            (Vec3::new(250.0, 5000.0, 90.0), Vec3::new(10.0, 200.0, 90.0)),
            // Near the segment but off it by less than the pad.
            (Vec3::new(250.0, 230.0, 90.0), Vec3::new(10.0, 10.0, 90.0)),
        ]);
        let bp = BroadPhase::new(&cuboids);
        let mut out = Vec::new();
        bp.candidates(
            Vec3::new(0.0, 0.0, 170.0),
            Vec3::new(500.0, 0.0, 90.0),
            25.0,
            &mut out,
        );
        assert!(out.contains(&0));
        assert!(!out.contains(&1));
        assert!(!out.contains(&2));
    }

    #[test]
    fn pad_covers_peek_displacement() {
        // A thin wall only overlapping the sightline once peeks are
        // accounted for must stay a candidate.
        let cuboids = boxes(&[(Vec3::new(250.0, 215.0, 90.0), Vec3::new(10.0, 10.0, 90.0))]);
        let bp = BroadPhase::new(&cuboids);
        let mut out = Vec::new();
        bp.candidates(
            Vec3::new(0.0, 200.0, 170.0),
            Vec3::new(500.0, 200.0, 90.0),
            25.0,
            &mut out,
        );
        assert_eq!(out, vec![0]);
    }
}
