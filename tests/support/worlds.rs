#![allow(dead_code)]

use glam::{Mat4, Vec3};
use sightline::{CullingConfig, CullingEngine, CuboidSpec, PlayerPose, Snapshot, SphereOccluder};

/// A standing character at `position` (bounding-box center) with the camera
/// at eye height above it.
pub fn standing_pose(position: Vec3) -> PlayerPose {
    PlayerPose {
        camera: position + Vec3::new(0.0, 0.0, 80.0),
        transform: Mat4::from_translation(position),
        alive: true,
    }
}

pub fn dead_pose(position: Vec3) -> PlayerPose {
    PlayerPose {
        alive: false,
        ..standing_pose(position)
    }
}

/// Axis-aligned wall occluder.
pub fn wall(center: Vec3, half_extents: Vec3) -> CuboidSpec {
    CuboidSpec::axis_aligned(center, half_extents)
}

pub fn engine_with(
    walls: &[CuboidSpec],
    spheres: &[SphereOccluder],
    teams: &[u8],
) -> CullingEngine {
    CullingEngine::new(walls, spheres, teams, CullingConfig::default())
        .expect("test world should validate")
}

/// Tick the engine once and collect the revealed (viewer, target) pairs.
pub fn tick_reveals(
    engine: &mut CullingEngine,
    players: &[PlayerPose],
    tick: u64,
) -> Vec<(usize, usize)> {
    let mut revealed = Vec::new();
    engine.tick(&Snapshot { players, tick }, |viewer, target| {
        revealed.push((viewer, target));
    });
    revealed
}
