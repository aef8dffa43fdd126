//! Conservative sphere-occluder pre-check.
//!
//! A sphere blocks a peek when the enemy's outer bounding sphere sits
//! entirely inside the tangent cone cast from the peek around the occluder,
//! and every enemy point lies beyond the occluder's far side. Both
//! conditions are sufficient but not necessary, so the stage can only ever
//! err toward "visible"; it must never cull a pair the cuboid stage would
//! have revealed.

use glam::Vec3;

use super::frustum::NUM_PEEKS;
use crate::bounds::CharacterBounds;
use crate::types::SphereOccluder;

fn blocks_peek(peek: Vec3, sphere: &SphereOccluder, enemy: &CharacterBounds) -> bool {
    let to_occluder = sphere.center - peek;
    let occluder_dist = to_occluder.length();
    if occluder_dist <= sphere.radius {
        // Camera inside the occluder; no cone exists.
        return false;
    }

    let to_enemy = enemy.center - peek;
    let enemy_dist = to_enemy.length();
    // Range margin: every enemy point must be farther than any point of the
    // occluder, so a sight ray that enters the sphere also exits it before
    // reaching the enemy.
    if enemy_dist - enemy.outer_radius < occluder_dist + sphere.radius {
        return false;
    }

    let half_angle = (sphere.radius / occluder_dist).asin();
    let enemy_half_angle = (enemy.outer_radius / enemy_dist).min(1.0).asin();
    let cos_offset = to_occluder.dot(to_enemy) / (occluder_dist * enemy_dist);
    let offset = cos_offset.clamp(-1.0, 1.0).acos();
    offset + enemy_half_angle <= half_angle
}

/// Whether `sphere` occludes the enemy from every peek position.
pub(crate) fn blocks_all_peeks(
    peeks: &[Vec3; NUM_PEEKS],
    sphere: &SphereOccluder,
    enemy: &CharacterBounds,
) -> bool {
    peeks.iter().all(|&p| blocks_peek(p, sphere, enemy))
}
