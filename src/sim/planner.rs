//! Computer opponent shot planning
//!
//! Greedy one-ply search: for every (legal target, pocket) pair, aim the cue
//! at the ghost-ball position, drop candidates with a blocked path, and keep
//! the one whose target sits closest to its pocket. No banks, combinations
//! or position play.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::rules::is_legal_first_contact;
use super::state::{Body, MatchState, Pocket};
use super::vector::{normalize, segment_blocked_by};
use crate::consts::*;

/// A stroke to play
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Shot {
    /// Unit aim direction for the cue
    pub aim: Vec2,
    /// Normalized power in [0, 1]
    pub power: f32,
    /// Intended object ball
    pub target: u8,
    /// Index into the pocket list, None for a contact-only fallback
    pub pocket: Option<usize>,
}

/// Planner tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlannerParams {
    pub power: f32,
    pub fallback_power: f32,
}

impl Default for PlannerParams {
    fn default() -> Self {
        Self {
            power: PLANNER_POWER,
            fallback_power: FALLBACK_POWER,
        }
    }
}

/// Ghost-ball position: where the cue's center must be at contact for
/// `target` to leave toward `pocket`. None if the target sits on the pocket.
pub fn ghost_ball(target: &Body, cue_radius: f32, pocket: Vec2) -> Option<Vec2> {
    let to_pocket = normalize(pocket - target.pos);
    if to_pocket == Vec2::ZERO {
        return None;
    }
    Some(target.pos - to_pocket * (target.radius + cue_radius))
}

/// Object balls the player on turn may strike first: their own group, any
/// group ball on an open table, or the eight once their group is cleared
pub fn legal_targets<'a>(bodies: &'a [Body], state: &MatchState) -> Vec<&'a Body> {
    bodies
        .iter()
        .filter(|b| !b.pocketed && !b.is_cue() && is_legal_first_contact(b.id, state))
        .collect()
}

/// Best shot for the player on turn, or None when nothing is legal to hit
pub fn find_best_shot(
    bodies: &[Body],
    pockets: &[Pocket],
    state: &MatchState,
    params: &PlannerParams,
) -> Option<Shot> {
    let cue = bodies.iter().find(|b| b.is_cue() && !b.pocketed)?;
    let targets = legal_targets(bodies, state);
    if targets.is_empty() {
        return None;
    }

    let mut best: Option<(f32, Shot)> = None;
    for target in &targets {
        for (index, pocket) in pockets.iter().enumerate() {
            let Some((score, ghost)) = score_candidate(bodies, cue, target, pocket) else {
                continue;
            };
            if best.is_none_or(|(s, _)| score > s) {
                best = Some((
                    score,
                    Shot {
                        aim: normalize(ghost - cue.pos),
                        power: params.power,
                        target: target.id,
                        pocket: Some(index),
                    },
                ));
            }
        }
    }

    if let Some((score, shot)) = best {
        log::debug!(
            "Planner: ball {} to pocket {:?} (score {:.4}, aim {:.1} deg)",
            shot.target,
            shot.pocket,
            score,
            crate::angle_of(shot.aim).to_degrees()
        );
        return Some(shot);
    }

    // No clear pocketing line: at least hit a legal ball
    let fallback = targets
        .iter()
        .filter(|t| normalize(t.pos - cue.pos) != Vec2::ZERO)
        .min_by(|a, b| {
            a.pos
                .distance_squared(cue.pos)
                .partial_cmp(&b.pos.distance_squared(cue.pos))
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;
    log::debug!("Planner: no pocketing line, playing safe at ball {}", fallback.id);
    Some(Shot {
        aim: normalize(fallback.pos - cue.pos),
        power: params.fallback_power,
        target: fallback.id,
        pocket: None,
    })
}

/// Score and ghost position for sending `target` into `pocket`, or None if the shot is not on
fn score_candidate(
    bodies: &[Body],
    cue: &Body,
    target: &Body,
    pocket: &Pocket,
) -> Option<(f32, Vec2)> {
    let ghost = ghost_ball(target, cue.radius, pocket.pos)?;
    let aim = normalize(ghost - cue.pos);
    if aim == Vec2::ZERO {
        return None;
    }
    // Cut of 90 degrees or more: the cue cannot reach the ghost position
    let departure = normalize(pocket.pos - target.pos);
    if aim.dot(departure) <= 0.0 {
        return None;
    }

    let others = || {
        bodies
            .iter()
            .filter(|b| !b.pocketed && !b.is_cue() && b.id != target.id)
    };
    if others().any(|b| segment_blocked_by(cue.pos, ghost, b.pos, b.radius + cue.radius)) {
        return None;
    }
    if others().any(|b| segment_blocked_by(target.pos, pocket.pos, b.pos, b.radius + target.radius)) {
        return None;
    }

    Some((1.0 / target.pos.distance(pocket.pos), ghost))
}
