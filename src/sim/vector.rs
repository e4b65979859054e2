//! 2D vector helpers
//!
//! `Vector2` is a plain value type (`glam::Vec2`): add/subtract/scale/dot/length
//! come from glam's operators. This module adds the few geometric queries the
//! integrator and planner share.

use glam::Vec2;

pub type Vector2 = Vec2;

/// Unit vector in the direction of `v`, or zero when `v` has no length.
///
/// Callers treat a zero result as "no direction available".
#[inline]
pub fn normalize(v: Vec2) -> Vec2 {
    v.normalize_or_zero()
}

/// Kinetic energy of a body (½mv²)
#[inline]
pub fn kinetic_energy(mass: f32, velocity: Vec2) -> f32 {
    0.5 * mass * velocity.length_squared()
}

/// Closest point to `p` on the segment `a`-`b`, with its parameter along
/// the segment (clamped to [0, 1])
pub fn closest_point_on_segment(p: Vec2, a: Vec2, b: Vec2) -> (Vec2, f32) {
    let seg = b - a;
    let len_sq = seg.length_squared();
    if len_sq < 1e-8 {
        return (a, 0.0); // Degenerate segment
    }
    let t = ((p - a).dot(seg) / len_sq).clamp(0.0, 1.0);
    (a + seg * t, t)
}

/// Does a circle centered at `p` come within `clearance` of the open segment `a`-`b`?
///
/// Only points whose projection falls strictly inside the segment count; a
/// center behind `a` or past `b` never blocks.
pub fn segment_blocked_by(a: Vec2, b: Vec2, p: Vec2, clearance: f32) -> bool {
    let (closest, t) = closest_point_on_segment(p, a, b);
    if t <= 0.0 || t >= 1.0 {
        return false;
    }
    p.distance(closest) < clearance
}
