//! Integrator and collision resolver
//!
//! One call to `advance` is one simulation tick. The tick is split into
//! equal sub-steps; each sub-step runs, in order:
//! translate + damp -> cushions -> ball pairs. Pocket capture runs once
//! after the last sub-step.
//!
//! Nothing here fails: pocketed or non-finite bodies are skipped.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::{Body, CUE_ID, Pocket};
use crate::consts::*;

/// Axis-aligned playing surface (cushion noses)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TableBounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl TableBounds {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// Is a ball of `radius` at `pos` fully on the table? (small tolerance)
    pub fn contains(&self, pos: Vec2, radius: f32) -> bool {
        const EPS: f32 = 1e-3;
        pos.x - radius >= self.min.x - EPS
            && pos.x + radius <= self.max.x + EPS
            && pos.y - radius >= self.min.y - EPS
            && pos.y + radius <= self.max.y + EPS
    }

    /// Nearest center position that keeps the ball on the table
    pub fn clamp(&self, pos: Vec2, radius: f32) -> Vec2 {
        pos.clamp(self.min + Vec2::splat(radius), self.max - Vec2::splat(radius))
    }
}

/// Integrator tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsParams {
    pub substeps: u32,
    /// Velocity retained per sub-step
    pub damping: f32,
    /// Speeds below this snap to zero
    pub rest_epsilon: f32,
    pub wall_restitution: f32,
    pub ball_restitution: f32,
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self {
            substeps: SUBSTEPS,
            damping: DAMPING,
            rest_epsilon: REST_EPSILON,
            wall_restitution: WALL_RESTITUTION,
            ball_restitution: BALL_RESTITUTION,
        }
    }
}

/// Result of one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdvanceReport {
    /// Any ball on the table still has velocity
    pub still_moving: bool,
    /// Pocketed this tick, in capture order
    pub newly_pocketed: Vec<u8>,
    /// First ball the cue touched this tick
    pub first_cue_contact: Option<u8>,
}

/// Advance all bodies by one tick
pub fn advance(
    bodies: &mut [Body],
    pockets: &[Pocket],
    bounds: &TableBounds,
    params: &PhysicsParams,
) -> AdvanceReport {
    let substeps = params.substeps.max(1);
    let frac = 1.0 / substeps as f32;
    let mut report = AdvanceReport::default();

    for _ in 0..substeps {
        integrate(bodies, frac, params);
        resolve_walls(bodies, bounds, params.wall_restitution);
        let contacts = resolve_pairs(bodies, params.ball_restitution);
        if report.first_cue_contact.is_none() {
            report.first_cue_contact = contacts.iter().find_map(|&(a, b)| match (a, b) {
                (CUE_ID, other) | (other, CUE_ID) => Some(other),
                _ => None,
            });
        }
        // Pair separation can push a ball back past a cushion
        for body in bodies.iter_mut().filter(|b| is_live(b)) {
            body.pos = bounds.clamp(body.pos, body.radius);
        }
    }

    report.newly_pocketed = capture_pocketed(bodies, pockets);
    report.still_moving = bodies.iter().any(Body::is_moving);
    report
}

/// Bodies that take part in simulation
#[inline]
fn is_live(body: &Body) -> bool {
    !body.pocketed && body.pos.is_finite() && body.vel.is_finite()
}

/// Translate by a fraction of the tick, apply rolling friction, snap to rest
fn integrate(bodies: &mut [Body], frac: f32, params: &PhysicsParams) {
    for body in bodies.iter_mut() {
        if body.pocketed {
            continue;
        }
        if !body.vel.is_finite() {
            body.vel = Vec2::ZERO;
            continue;
        }
        body.pos += body.vel * frac;
        body.vel *= params.damping;
        if body.vel.length() < params.rest_epsilon {
            body.vel = Vec2::ZERO;
        }
    }
}

/// Cushion reflection: clamp onto the bound, flip the inbound component
pub(crate) fn resolve_walls(bodies: &mut [Body], bounds: &TableBounds, restitution: f32) {
    for body in bodies.iter_mut().filter(|b| is_live(b)) {
        let r = body.radius;

        if body.pos.x - r < bounds.min.x {
            body.pos.x = bounds.min.x + r;
            if body.vel.x < 0.0 {
                body.vel.x = -body.vel.x * restitution;
            }
        } else if body.pos.x + r > bounds.max.x {
            body.pos.x = bounds.max.x - r;
            if body.vel.x > 0.0 {
                body.vel.x = -body.vel.x * restitution;
            }
        }

        if body.pos.y - r < bounds.min.y {
            body.pos.y = bounds.min.y + r;
            if body.vel.y < 0.0 {
                body.vel.y = -body.vel.y * restitution;
            }
        } else if body.pos.y + r > bounds.max.y {
            body.pos.y = bounds.max.y - r;
            if body.vel.y > 0.0 {
                body.vel.y = -body.vel.y * restitution;
            }
        }
    }
}

/// Pairwise ball collisions, order independent.
///
/// Every pair is tested against the positions and velocities at the start
/// of the pass; corrections are accumulated and applied together. A ball
/// struck by several others in one pass shares its impulse between them:
/// each pair's velocity change is divided by the larger impulse count of its
/// two balls, which keeps momentum and never adds energy. Returns the
/// touching pairs as (lower id, higher id).
pub(crate) fn resolve_pairs(bodies: &mut [Body], restitution: f32) -> Vec<(u8, u8)> {
    let mut dpos = vec![Vec2::ZERO; bodies.len()];
    let mut load = vec![0u32; bodies.len()];
    let mut impulses = Vec::new();
    let mut contacts = Vec::new();

    for i in 0..bodies.len() {
        if !is_live(&bodies[i]) {
            continue;
        }
        for j in (i + 1)..bodies.len() {
            if !is_live(&bodies[j]) {
                continue;
            }
            let (a, b) = (&bodies[i], &bodies[j]);

            let delta = b.pos - a.pos;
            let dist = delta.length();
            let min_dist = a.radius + b.radius;
            if dist >= min_dist {
                continue;
            }

            // Coincident centers: pick a fixed axis so the result is deterministic
            let normal = if dist > 1e-6 { delta / dist } else { Vec2::X };

            let half_overlap = (min_dist - dist) * 0.5;
            dpos[i] -= normal * half_overlap;
            dpos[j] += normal * half_overlap;

            // Normal components only; tangents pass through untouched
            let u1 = a.vel.dot(normal);
            let u2 = b.vel.dot(normal);
            if u1 > u2 {
                let (v1, v2) = collide_1d(a.mass, u1, b.mass, u2, restitution);
                impulses.push((i, j, normal * (v1 - u1), normal * (v2 - u2)));
                load[i] += 1;
                load[j] += 1;
            }

            contacts.push((a.id.min(b.id), a.id.max(b.id)));
        }
    }

    for (i, j, dv_i, dv_j) in impulses {
        let share = 1.0 / load[i].max(load[j]) as f32;
        bodies[i].vel += dv_i * share;
        bodies[j].vel += dv_j * share;
    }
    for (body, dp) in bodies.iter_mut().zip(dpos) {
        body.pos += dp;
    }
    contacts
}

/// 1-D collision of unequal masses with restitution `e` (1.0 = elastic)
#[inline]
pub fn collide_1d(m1: f32, u1: f32, m2: f32, u2: f32, e: f32) -> (f32, f32) {
    let total = m1 + m2;
    let momentum = m1 * u1 + m2 * u2;
    let v1 = (momentum + m2 * e * (u2 - u1)) / total;
    let v2 = (momentum + m1 * e * (u1 - u2)) / total;
    (v1, v2)
}

/// Take every ball whose center lies inside a pocket off the table
fn capture_pocketed(bodies: &mut [Body], pockets: &[Pocket]) -> Vec<u8> {
    let mut captured = Vec::new();
    for body in bodies.iter_mut().filter(|b| is_live(b)) {
        let in_pocket = pockets
            .iter()
            .any(|p| body.pos.distance(p.pos) < p.capture_radius);
        if in_pocket {
            body.pocket();
            captured.push(body.id);
            log::debug!("Ball {} pocketed", body.id);
        }
    }
    captured
}
