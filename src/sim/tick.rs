//! Stroke execution and the per-frame state machine
//!
//! The host calls `fire` (or `play_computer_turn`) when the player on turn
//! acts, then `tick` once per frame. `tick` walks
//! `StrokeInFlight -> Resolving -> Idle | GameOver`.

use glam::Vec2;

use super::error::EngineError;
use super::physics::advance;
use super::planner::{Shot, find_best_shot};
use super::rules::{StrokeOutcome, resolve_stroke};
use super::state::{GameEvent, GameState, Phase, Player};
use super::vector::normalize;

/// Can `player` act right now?
fn check_can_act(state: &GameState, player: Player) -> Result<(), EngineError> {
    if state.phase == Phase::GameOver || state.match_state.winner.is_some() {
        return Err(EngineError::GameOver);
    }
    if state.phase != Phase::Idle || state.match_state.motion_active {
        return Err(EngineError::MotionActive);
    }
    let expected = state.match_state.turn;
    if player != expected {
        return Err(EngineError::NotYourTurn {
            expected,
            got: player,
        });
    }
    Ok(())
}

/// Strike the cue ball. Rejected without touching state if `player` may not
/// act or the shot is unusable.
pub fn fire(state: &mut GameState, player: Player, aim: Vec2, power: f32) -> Result<(), EngineError> {
    if let Err(err) = check_can_act(state, player) {
        log::debug!("Rejected stroke from {player}: {err}");
        return Err(err);
    }
    if state.cue().pocketed {
        return Err(EngineError::CuePocketed);
    }
    if !power.is_finite() || !(0.0..=1.0).contains(&power) {
        return Err(EngineError::InvalidShot {
            reason: "power must be in [0, 1]",
        });
    }
    let dir = if aim.is_finite() { normalize(aim) } else { Vec2::ZERO };
    if dir == Vec2::ZERO {
        return Err(EngineError::InvalidShot {
            reason: "aim has no direction",
        });
    }

    let speed = power * state.settings.max_shot_speed;
    state.cue_mut().vel = dir * speed;

    let ms = &mut state.match_state;
    ms.potted_this_stroke.clear();
    ms.first_contact = None;
    ms.motion_active = true;
    ms.strokes += 1;
    state.phase = Phase::StrokeInFlight;

    log::debug!(
        "Stroke {} by {player}: aim ({:.3}, {:.3}) power {:.2}",
        state.match_state.strokes,
        dir.x,
        dir.y,
        power
    );
    Ok(())
}

/// Give up the turn without striking (no legal ball left to hit)
pub fn pass_turn(state: &mut GameState, player: Player) -> Result<(), EngineError> {
    check_can_act(state, player)?;
    state.match_state.turn = player.opponent();
    log::info!("{player} passes");
    Ok(())
}

/// Plan and fire for a computer player. Passes the turn and returns None
/// when the planner finds nothing to hit.
pub fn play_computer_turn(state: &mut GameState, player: Player) -> Result<Option<Shot>, EngineError> {
    check_can_act(state, player)?;
    let params = state.settings.planner_params();
    match find_best_shot(&state.bodies, &state.pockets, &state.match_state, &params) {
        Some(shot) => {
            fire(state, player, shot.aim, shot.power)?;
            Ok(Some(shot))
        }
        None => {
            pass_turn(state, player)?;
            Ok(None)
        }
    }
}

/// Advance the match by one frame. Returns the outcome on the frame a stroke resolves.
pub fn tick(state: &mut GameState) -> Option<StrokeOutcome> {
    match state.phase {
        Phase::Idle | Phase::GameOver => None,
        Phase::StrokeInFlight => {
            let params = state.settings.physics_params();
            let report = advance(&mut state.bodies, &state.pockets, &state.bounds, &params);

            let ms = &mut state.match_state;
            if ms.first_contact.is_none() {
                ms.first_contact = report.first_cue_contact;
            }
            for id in report.newly_pocketed {
                ms.potted_this_stroke.push(id);
                state.events.push(GameEvent::BallPocketed { id });
            }
            if !report.still_moving {
                state.phase = Phase::Resolving;
            }
            None
        }
        Phase::Resolving => Some(resolve(state)),
    }
}

fn resolve(state: &mut GameState) -> StrokeOutcome {
    let potted = state.match_state.potted_this_stroke.clone();
    let (next, outcome) = resolve_stroke(&potted, &state.match_state);
    state.match_state = next;

    if state.match_state.cue_respot_pending {
        state.respot_cue();
        state.match_state.cue_respot_pending = false;
    }

    log::info!(
        "Stroke resolved: {} potted {:?}, foul {:?}, next {}",
        outcome.shooter,
        outcome.potted,
        outcome.foul,
        outcome.next_turn
    );
    state.events.push(GameEvent::StrokeResolved(outcome.clone()));

    match outcome.winner {
        Some(winner) => {
            log::info!("Game over: {winner} wins");
            state.phase = Phase::GameOver;
            state.events.push(GameEvent::GameOver { winner });
        }
        None => state.phase = Phase::Idle,
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::settings::Settings;
    use crate::sim::rules::Foul;
    use crate::sim::state::{Body, Group, head_spot};

    fn ball(id: u8, x: f32, y: f32) -> Body {
        let mass = if id == 0 { CUE_MASS } else { OBJECT_MASS };
        Body::new(id, Vec2::new(x, y), BALL_RADIUS, mass).unwrap()
    }

    fn layout(bodies: Vec<Body>) -> GameState {
        GameState::with_bodies(Settings::default(), bodies).unwrap()
    }

    /// Tick until the stroke resolves
    fn play_out(state: &mut GameState) -> StrokeOutcome {
        for _ in 0..20_000 {
            if let Some(outcome) = tick(state) {
                return outcome;
            }
        }
        panic!("stroke never resolved");
    }

    #[test]
    fn test_fire_sets_cue_velocity() {
        let mut state = layout(vec![ball(0, 200.0, 200.0), ball(1, 600.0, 200.0)]);
        state.match_state.potted_this_stroke.push(3);
        fire(&mut state, Player::A, Vec2::new(2.0, 0.0), 0.5).unwrap();

        let expected = MAX_SHOT_SPEED * 0.5;
        assert!((state.cue().vel.x - expected).abs() < 1e-4);
        assert_eq!(state.cue().vel.y, 0.0);
        assert!(state.match_state.motion_active);
        assert!(state.match_state.potted_this_stroke.is_empty());
        assert_eq!(state.match_state.strokes, 1);
        assert_eq!(state.phase, Phase::StrokeInFlight);
    }

    #[test]
    fn test_fire_rejects_without_mutation() {
        let mut state = layout(vec![ball(0, 200.0, 200.0), ball(1, 600.0, 200.0)]);

        let before = state.match_state.clone();
        assert_eq!(
            fire(&mut state, Player::B, Vec2::X, 0.5),
            Err(EngineError::NotYourTurn {
                expected: Player::A,
                got: Player::B
            })
        );
        assert!(matches!(
            fire(&mut state, Player::A, Vec2::ZERO, 0.5),
            Err(EngineError::InvalidShot { .. })
        ));
        assert!(fire(&mut state, Player::A, Vec2::X, 1.5).is_err());
        assert!(fire(&mut state, Player::A, Vec2::new(f32::NAN, 0.0), 0.5).is_err());
        assert_eq!(state.match_state, before);
        assert_eq!(state.cue().vel, Vec2::ZERO);
        assert_eq!(state.phase, Phase::Idle);

        // Second stroke while the first is rolling
        fire(&mut state, Player::A, Vec2::X, 0.5).unwrap();
        let vel = state.cue().vel;
        assert_eq!(
            fire(&mut state, Player::A, Vec2::Y, 1.0),
            Err(EngineError::MotionActive)
        );
        assert_eq!(state.cue().vel, vel);
        assert_eq!(state.match_state.strokes, 1);
    }

    #[test]
    fn test_phases_and_single_resolution_event() {
        let mut state = layout(vec![ball(0, 200.0, 200.0), ball(1, 450.0, 200.0)]);
        fire(&mut state, Player::A, Vec2::X, 0.6).unwrap();

        let mut saw_resolving = false;
        let mut outcome = None;
        for _ in 0..20_000 {
            if state.phase == Phase::Resolving {
                saw_resolving = true;
            }
            if let Some(o) = tick(&mut state) {
                outcome = Some(o);
                break;
            }
        }
        let outcome = outcome.unwrap();
        assert!(saw_resolving);
        assert_eq!(state.phase, Phase::Idle);
        assert!(!state.match_state.motion_active);
        // Hit the 1-ball first, nothing dropped: clean miss, turn passes
        assert_eq!(outcome.foul, None);
        assert_eq!(state.match_state.turn, Player::B);

        // Further ticks while idle do nothing
        assert!(tick(&mut state).is_none());
        let resolved = state
            .take_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::StrokeResolved(_)))
            .count();
        assert_eq!(resolved, 1);
    }

    #[test]
    fn test_scratch_respots_cue() {
        let mut state = layout(vec![ball(0, 50.0, 50.0), ball(1, 600.0, 200.0)]);
        fire(&mut state, Player::A, Vec2::new(-1.0, -1.0), 0.3).unwrap();
        let outcome = play_out(&mut state);

        assert_eq!(outcome.foul, Some(Foul::Scratch));
        assert_eq!(outcome.potted, vec![0]);
        assert_eq!(state.match_state.turn, Player::B);
        let cue = state.cue();
        assert!(!cue.pocketed);
        assert_eq!(cue.pos, head_spot(&state.bounds));
        assert!(!state.match_state.cue_respot_pending);
        assert!(
            state
                .take_events()
                .contains(&GameEvent::BallPocketed { id: 0 })
        );
    }

    #[test]
    fn test_pocketing_own_ball_keeps_turn() {
        // 3-ball a short way from the bottom-right corner, cue behind it on the line
        let mut state = layout(vec![ball(0, 500.0, 100.0), ball(3, 700.0, 300.0)]);
        let shot = play_computer_turn(&mut state, Player::A).unwrap().unwrap();
        assert_eq!(shot.target, 3);
        let outcome = play_out(&mut state);

        assert_eq!(outcome.potted, vec![3]);
        assert_eq!(outcome.foul, None);
        assert!(outcome.turn_continues);
        assert_eq!(state.match_state.player_a_group, Some(Group::Solids));
        assert_eq!(state.match_state.turn, Player::A);
    }

    #[test]
    fn test_game_over_blocks_further_strokes() {
        let mut state = layout(vec![ball(0, 500.0, 100.0), ball(8, 700.0, 300.0), ball(2, 100.0, 300.0)]);
        state.match_state.assign_groups(Player::A, Group::Solids);
        let shot = play_computer_turn(&mut state, Player::A).unwrap().unwrap();
        // 2-ball still up, so the planner goes for it rather than the eight
        assert_eq!(shot.target, 2);

        // Sink the eight early by hand
        let mut state = layout(vec![ball(0, 500.0, 100.0), ball(8, 700.0, 300.0), ball(2, 100.0, 300.0)]);
        state.match_state.assign_groups(Player::A, Group::Solids);
        fire(&mut state, Player::A, Vec2::new(1.0, 1.0), 0.8).unwrap();
        let outcome = play_out(&mut state);
        assert_eq!(outcome.winner, Some(Player::B));
        assert_eq!(state.phase, Phase::GameOver);
        assert_eq!(fire(&mut state, Player::B, Vec2::X, 0.5), Err(EngineError::GameOver));
        assert!(state.take_events().contains(&GameEvent::GameOver { winner: Player::B }));
    }

    #[test]
    fn test_closing_eight_wins_for_cleared_player() {
        // Solids all gone from the layout: A's only legal ball is the eight
        let mut state = layout(vec![ball(0, 500.0, 100.0), ball(8, 700.0, 300.0), ball(12, 200.0, 200.0)]);
        state.match_state.assign_groups(Player::A, Group::Solids);
        assert!(state.match_state.has_cleared(Player::A));

        let shot = play_computer_turn(&mut state, Player::A).unwrap().unwrap();
        assert_eq!(shot.target, 8);
        let outcome = play_out(&mut state);

        assert_eq!(outcome.potted, vec![8]);
        assert_eq!(outcome.foul, None);
        assert_eq!(outcome.winner, Some(Player::A));
        assert_eq!(state.phase, Phase::GameOver);
    }

    #[test]
    fn test_computer_passes_with_nothing_to_hit() {
        let mut state = layout(vec![ball(0, 200.0, 200.0), ball(8, 600.0, 200.0)]);
        state.match_state.assign_groups(Player::A, Group::Solids);
        state.body_mut(8).unwrap().pocket();
        assert_eq!(play_computer_turn(&mut state, Player::A), Ok(None));
        assert_eq!(state.match_state.turn, Player::B);
        assert_eq!(state.phase, Phase::Idle);
    }
}
