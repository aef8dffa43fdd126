//! Shadow-frustum occlusion test over convex cuboids.
//!
//! For each hypothetical peek camera, the faces of the candidate cuboid that
//! sit between the peek and the enemy are collected, their perimeter edges
//! are poured into a directed-edge matrix, and edges whose reverse is absent
//! survive as the silhouette boundary. Interior edges cancel because
//! neighbouring faces traverse a shared edge in opposite directions. A plane
//! through the peek and each silhouette edge bounds the shadow volume; the
//! enemy is occluded for that peek when its bounds sit inside every plane.

use glam::Vec3;

use super::scratch::CullScratch;
use crate::bounds::CharacterBounds;
use crate::cuboid::{Cuboid, FACE_V};
use crate::geometry::Plane;

/// Number of hypothetical latency-compensating camera positions per bundle.
pub const NUM_PEEKS: usize = 4;

/// A face whose sign test lands within this of zero is edge-on and treated
/// as not between; it contributes no useful occlusion.
const FACE_EPS: f32 = 1e-3;

/// Below this squared length the camera-to-enemy direction has no usable
/// horizontal component and peek generation falls back to the +X axis.
const FLAT_DIR_EPS_SQ: f32 = 1e-6;

/// Worst-case camera positions the viewer could reach within the latency
/// horizon, ordered `(+H,+V), (-H,+V), (-H,-V), (+H,-V)`.
///
/// The first two are upper peeks and the last two lower peeks;
/// [`is_blocking`] checks top box corners for the former and bottom corners
/// for the latter, relying on this order.
pub(crate) fn peek_positions(
    camera: Vec3,
    enemy_center: Vec3,
    delta_h: f32,
    delta_v: f32,
) -> [Vec3; NUM_PEEKS] {
    let to_enemy = enemy_center - camera;
    let planar = Vec3::new(to_enemy.x, to_enemy.y, 0.0);
    let h = if planar.length_squared() > FLAT_DIR_EPS_SQ {
        let dir = planar.normalize();
        Vec3::new(-dir.y, dir.x, 0.0) * delta_h
    } else {
        Vec3::new(delta_h, 0.0, 0.0)
    };
    let v = Vec3::new(0.0, 0.0, delta_v);
    [camera + h + v, camera - h + v, camera - h - v, camera + h - v]
}

/// Faces visible to the peek camera and hidden from the enemy center, i.e.
/// the candidate occluding surface. Back faces and faces the enemy can see
/// never contribute silhouette edges worth testing.
fn collect_faces_between(peek: Vec3, enemy_center: Vec3, cuboid: &Cuboid, out: &mut Vec<usize>) {
    out.clear();
    for (fi, face) in cuboid.faces.iter().enumerate() {
        let anchor = cuboid.face_anchor(fi);
        let peek_side = (anchor - peek).dot(face.normal);
        let enemy_side = (anchor - enemy_center).dot(face.normal);
        if peek_side < -FACE_EPS && enemy_side > FACE_EPS {
            out.push(fi);
        }
    }
}

/// Build the shadow-frustum planes for one peek from the faces already
/// collected in `scratch.faces_between`.
fn build_shadow_frustum(peek: Vec3, cuboid: &Cuboid, scratch: &mut CullScratch) {
    scratch.clear_edges();
    let CullScratch {
        edge_set,
        faces_between,
        frustum,
    } = scratch;
    frustum.clear();

    for &fi in faces_between.iter() {
        let p = cuboid.faces[fi].perimeter;
        edge_set[p[0] as usize][p[1] as usize] = true;
        edge_set[p[1] as usize][p[2] as usize] = true;
        edge_set[p[2] as usize][p[3] as usize] = true;
        edge_set[p[3] as usize][p[0] as usize] = true;
    }

    for &fi in faces_between.iter() {
        let p = cuboid.faces[fi].perimeter;
        for k in 0..FACE_V {
            let a = p[k] as usize;
            let b = p[(k + 1) % FACE_V] as usize;
            // Interior edges appear in both directions and cancel; only the
            // silhouette boundary survives.
            if !edge_set[b][a] {
                frustum.push(Plane::from_points(peek, cuboid.vertices[a], cuboid.vertices[b]));
            }
        }
    }
}

/// Is the enemy inside every shadow plane for this peek?
///
/// `-plane_dot(center)` is the signed distance of the enemy center into the
/// shadow. A distance beyond the outer radius satisfies the plane outright;
/// one below the inner radius means the inscribed sphere pokes out and the
/// enemy may be visible. In between, the relevant box corners decide.
fn peek_blocked(enemy: &CharacterBounds, corners: &[Vec3; 4], frustum: &[Plane]) -> bool {
    for plane in frustum {
        let d = -plane.plane_dot(enemy.center);
        if d > enemy.outer_radius {
            continue;
        }
        if d < enemy.inner_radius {
            return false;
        }
        if corners.iter().any(|&c| plane.plane_dot(c) > 0.0) {
            return false;
        }
    }
    true
}

/// Whether `cuboid` occludes the enemy from every peek position.
///
/// Each peek is evaluated independently against this single cuboid; a peek
/// with no between-faces, or one where the enemy escapes a plane, makes the
/// whole test fail.
pub(crate) fn is_blocking(
    peeks: &[Vec3; NUM_PEEKS],
    cuboid: &Cuboid,
    enemy: &CharacterBounds,
    scratch: &mut CullScratch,
) -> bool {
    for (peek_index, &peek) in peeks.iter().enumerate() {
        collect_faces_between(peek, enemy.center, cuboid, &mut scratch.faces_between);
        if scratch.faces_between.is_empty() {
            return false;
        }
        build_shadow_frustum(peek, cuboid, scratch);
        // Upper peeks only need the top corners: each bottom corner sits
        // directly below its top counterpart, so it is at least as deep in
        // the shadow. Lower peeks mirror this with the bottom corners.
        let corners = if peek_index < 2 {
            &enemy.top_vertices
        } else {
            &enemy.bottom_vertices
        };
        if !peek_blocked(enemy, corners, &scratch.frustum) {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CuboidSpec;
    use glam::Mat4;

    fn wall(center: Vec3, half_extents: Vec3) -> Cuboid {
        Cuboid::from_spec(0, &CuboidSpec::axis_aligned(center, half_extents)).unwrap()
    }

    fn standing(pos: Vec3) -> CharacterBounds {
        CharacterBounds::new(
            Vec3::new(pos.x, pos.y, pos.z + 80.0),
            &Mat4::from_translation(pos),
            35.0,
            90.0,
        )
    }

    /// Silhouette edge count from a pure front-facing criterion (every face
    /// visible from the eye), independent of any enemy.
    fn silhouette_edge_count(cuboid: &Cuboid, eye: Vec3) -> usize {
        let mut scratch = CullScratch::new();
        scratch.faces_between.clear();
        for (fi, face) in cuboid.faces.iter().enumerate() {
            if (cuboid.face_anchor(fi) - eye).dot(face.normal) < 0.0 {
                scratch.faces_between.push(fi);
            }
        }
        build_shadow_frustum(eye, cuboid, &mut scratch);
        scratch.frustum.len()
    }

    #[test]
    fn silhouette_law_face_edge_corner() {
        let cuboid = wall(Vec3::ZERO, Vec3::new(10.0, 20.0, 30.0));
        // Face-on: one visible face, quad silhouette.
        assert_eq!(silhouette_edge_count(&cuboid, Vec3::new(100.0, 0.0, 0.0)), 4);
        // Edge-on: two visible faces, hexagonal silhouette.
        assert_eq!(
            silhouette_edge_count(&cuboid, Vec3::new(100.0, 100.0, 0.0)),
            6
        );
        // Corner-on: three visible faces, still hexagonal.
        assert_eq!(
            silhouette_edge_count(&cuboid, Vec3::new(100.0, 100.0, 100.0)),
            6
        );
    }

    #[test]
    fn silhouette_law_random_external_eyes() {
        use rand::Rng;
        use rand::SeedableRng;
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(2024);
        let cuboid = wall(Vec3::ZERO, Vec3::new(15.0, 25.0, 40.0));
        for _ in 0..200 {
            let eye = Vec3::new(
                rng.gen_range(-500.0..500.0),
                rng.gen_range(-500.0..500.0),
                rng.gen_range(-500.0..500.0),
            );
            if eye.x.abs() <= 16.0 && eye.y.abs() <= 26.0 && eye.z.abs() <= 41.0 {
                continue;
            }
            let count = silhouette_edge_count(&cuboid, eye);
            assert!(
                count == 4 || count == 6,
                "silhouette of a box from {:?} had {} edges",
                eye,
                count
            );
        }
    }

    #[test]
    fn open_sight_is_not_blocking() {
        // Occluder far off to the side of the sightline.
        let cuboid = wall(Vec3::new(250.0, 400.0, 90.0), Vec3::new(10.0, 50.0, 90.0));
        let enemy = standing(Vec3::new(500.0, 0.0, 90.0));
        let peeks = peek_positions(Vec3::new(0.0, 0.0, 170.0), enemy.center, 20.0, 5.0);
        let mut scratch = CullScratch::new();
        assert!(!is_blocking(&peeks, &cuboid, &enemy, &mut scratch));
    }

    #[test]
    fn occluder_behind_viewer_is_not_blocking() {
        let cuboid = wall(Vec3::new(-250.0, 0.0, 90.0), Vec3::new(10.0, 200.0, 90.0));
        let enemy = standing(Vec3::new(500.0, 0.0, 90.0));
        let peeks = peek_positions(Vec3::new(0.0, 0.0, 170.0), enemy.center, 20.0, 5.0);
        let mut scratch = CullScratch::new();
        assert!(!is_blocking(&peeks, &cuboid, &enemy, &mut scratch));
    }

    #[test]
    fn wide_wall_blocks_every_peek() {
        let cuboid = wall(Vec3::new(250.0, 0.0, 90.0), Vec3::new(10.0, 200.0, 90.0));
        let enemy = standing(Vec3::new(500.0, 0.0, 90.0));
        let peeks = peek_positions(Vec3::new(0.0, 0.0, 170.0), enemy.center, 20.0, 5.0);
        let mut scratch = CullScratch::new();
        assert!(is_blocking(&peeks, &cuboid, &enemy, &mut scratch));
    }

    #[test]
    fn narrow_wall_is_defeated_by_horizontal_peek() {
        // Blocked from the resting camera, but the +H peek clears the
        // corner of a narrow wall.
        let cuboid = wall(Vec3::new(250.0, 0.0, 90.0), Vec3::new(10.0, 30.0, 90.0));
        let enemy = standing(Vec3::new(500.0, 15.0, 90.0));
        let camera = Vec3::new(0.0, 0.0, 170.0);
        let mut scratch = CullScratch::new();

        let resting = peek_positions(camera, enemy.center, 0.0, 0.0);
        assert!(is_blocking(&resting, &cuboid, &enemy, &mut scratch));

        let peeks = peek_positions(camera, enemy.center, 20.0, 5.0);
        assert!(!is_blocking(&peeks, &cuboid, &enemy, &mut scratch));
    }

    #[test]
    fn growing_an_occluder_never_reveals() {
        // Monotonicity: enlarging a blocking cuboid keeps it blocking.
        let camera = Vec3::new(0.0, 0.0, 170.0);
        let enemy = standing(Vec3::new(500.0, 0.0, 90.0));
        let peeks = peek_positions(camera, enemy.center, 20.0, 5.0);
        let mut scratch = CullScratch::new();

        let base = wall(Vec3::new(250.0, 0.0, 90.0), Vec3::new(10.0, 200.0, 90.0));
        assert!(is_blocking(&peeks, &base, &enemy, &mut scratch));

        for grow in [1.0f32, 20.0, 60.0] {
            let bigger = wall(
                Vec3::new(250.0, 0.0, 90.0),
                Vec3::new(10.0 + grow, 200.0 + grow, 90.0 + grow),
            );
            assert!(
                is_blocking(&peeks, &bigger, &enemy, &mut scratch),
                "grow {} flipped the verdict",
                grow
            );
        }
    }

    #[test]
    fn mirrored_scene_gives_the_same_verdict() {
        // Peek symmetry: reflecting the scene in Y cannot change the outcome.
        let camera = Vec3::new(0.0, 0.0, 170.0);
        let mut scratch = CullScratch::new();
        for enemy_y in [15.0f32, 60.0, 120.0] {
            let cuboid = wall(Vec3::new(250.0, 0.0, 90.0), Vec3::new(10.0, 30.0, 90.0));
            let enemy = standing(Vec3::new(500.0, enemy_y, 90.0));
            let peeks = peek_positions(camera, enemy.center, 20.0, 5.0);
            let verdict = is_blocking(&peeks, &cuboid, &enemy, &mut scratch);

            let mirrored_enemy = standing(Vec3::new(500.0, -enemy_y, 90.0));
            let mirrored_peeks = peek_positions(camera, mirrored_enemy.center, 20.0, 5.0);
            let mirrored = is_blocking(&mirrored_peeks, &cuboid, &mirrored_enemy, &mut scratch);
            assert_eq!(verdict, mirrored, "asymmetric outcome at y={}", enemy_y);
        }
    }

    #[test]
    fn degenerate_direction_falls_back_to_axis_basis() {
        let camera = Vec3::new(0.0, 0.0, 170.0);
        // Enemy directly above: no horizontal component.
        let peeks = peek_positions(camera, Vec3::new(0.0, 0.0, 400.0), 20.0, 5.0);
        assert_eq!(peeks[0], Vec3::new(20.0, 0.0, 175.0));
        assert_eq!(peeks[1], Vec3::new(-20.0, 0.0, 175.0));
        assert_eq!(peeks[2], Vec3::new(-20.0, 0.0, 165.0));
        assert_eq!(peeks[3], Vec3::new(20.0, 0.0, 165.0));
    }
}
