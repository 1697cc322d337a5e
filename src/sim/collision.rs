//! Circle-vs-grid and circle-vs-circle predicates
//!
//! Wall tests sample points around a circle's circumference instead of
//! clipping the circle against tile polygons. A wall feature thin enough to
//! fit between two adjacent samples can be missed; with 64 px tiles and the
//! radii in play that cannot happen, so the approximation is accepted and
//! cheap enough to run for every mover every frame.
//!
//! All probes here go through the non-generating dungeon lookup: an absent
//! room is solid, and collision can never materialize rooms mid-frame.

use glam::Vec2;

use crate::consts::{EPSILON, MOVER_SAMPLES, PROJECTILE_SAMPLES};
use crate::dungeon::Dungeon;

/// True if any of `samples` circumference points lands on a solid tile
pub fn circle_hits_wall(dungeon: &Dungeon, center: Vec2, radius: f32, samples: u32) -> bool {
    let step = std::f32::consts::TAU / samples as f32;
    (0..samples).any(|i| {
        let angle = i as f32 * step;
        dungeon.probe_wall_at_pixel(center + Vec2::new(angle.cos(), angle.sin()) * radius)
    })
}

/// Coarse 8-sample test for players and enemies
pub fn mover_hits_wall(dungeon: &Dungeon, center: Vec2, radius: f32) -> bool {
    circle_hits_wall(dungeon, center, radius, MOVER_SAMPLES)
}

/// Finer 16-sample test for small, fast projectiles
pub fn projectile_hits_wall(dungeon: &Dungeon, center: Vec2, radius: f32) -> bool {
    circle_hits_wall(dungeon, center, radius, PROJECTILE_SAMPLES)
}

/// Resolve a displacement one axis at a time against the walls.
///
/// Testing X and Y separately rather than the combined diagonal gives wall
/// sliding: a mover pushing diagonally into a wall keeps its speed along
/// the open axis. A blocked axis reverts exactly to its pre-move value,
/// never to a partial illegal position.
pub fn try_axis_move(dungeon: &Dungeon, pos: Vec2, radius: f32, delta: Vec2) -> Vec2 {
    let mut out = pos;
    let x_try = Vec2::new(pos.x + delta.x, out.y);
    if !mover_hits_wall(dungeon, x_try, radius) {
        out.x = x_try.x;
    }
    let y_try = Vec2::new(out.x, pos.y + delta.y);
    if !mover_hits_wall(dungeon, y_try, radius) {
        out.y = y_try.y;
    }
    out
}

/// Circle overlap test
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    a.distance_squared(b) < (ra + rb) * (ra + rb)
}

/// Minimum distance from a point to a segment, via the clamped projection
/// parameter t in `[0, 1]`
pub fn point_segment_distance(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}
