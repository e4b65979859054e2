//! 8-ball turn and foul rules
//!
//! `resolve_stroke` is a pure transition: the match state before the stroke
//! plus the balls pocketed during it give the match state after it.

use serde::{Deserialize, Serialize};

use super::state::{CUE_ID, EIGHT_ID, Group, MatchState, Player, group_of_id};

/// Why a stroke was a foul
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Foul {
    /// Cue ball pocketed
    Scratch,
    /// Cue touched nothing and nothing dropped
    NoContact,
    /// Cue touched a ball the shooter may not hit first
    WrongBallFirst(u8),
}

/// Everything the host needs to announce a finished stroke
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeOutcome {
    pub shooter: Player,
    /// Pocket order during the stroke
    pub potted: Vec<u8>,
    pub foul: Option<Foul>,
    /// Group handed to the shooter on this stroke (open table only)
    pub assigned: Option<Group>,
    pub turn_continues: bool,
    /// Player on turn after the stroke
    pub next_turn: Player,
    pub winner: Option<Player>,
    pub cue_respot: bool,
}

impl StrokeOutcome {
    #[inline]
    pub fn is_foul(&self) -> bool {
        self.foul.is_some()
    }
}

/// Apply the rules to a finished stroke
pub fn resolve_stroke(stroke_potted: &[u8], state: &MatchState) -> (MatchState, StrokeOutcome) {
    let shooter = state.turn;
    let open_at_start = state.is_open();
    let shooter_group = state.group_of(shooter);
    let mut next = state.clone();

    // Scratch
    let scratch = stroke_potted.contains(&CUE_ID);
    let foul = if scratch {
        Some(Foul::Scratch)
    } else {
        contact_foul(stroke_potted, state)
    };
    next.cue_respot_pending = scratch;

    let mut outcome = StrokeOutcome {
        shooter,
        potted: stroke_potted.to_vec(),
        foul,
        assigned: None,
        turn_continues: false,
        next_turn: shooter,
        winner: None,
        cue_respot: scratch,
    };

    // Eight-ball ends the match either way
    if stroke_potted.contains(&EIGHT_ID) {
        let winner = if state.has_cleared(shooter) {
            shooter
        } else {
            shooter.opponent()
        };
        next.winner = Some(winner);
        outcome.winner = Some(winner);
        end_stroke(&mut next);
        return (next, outcome);
    }

    // Open table: first group ball down decides, unless the stroke was a foul
    if open_at_start && foul.is_none() {
        if let Some(group) = stroke_potted.iter().find_map(|&id| group_of_id(id)) {
            next.assign_groups(shooter, group);
            outcome.assigned = Some(group);
        }
    }

    let scored_own = stroke_potted.iter().any(|&id| match group_of_id(id) {
        Some(group) => open_at_start || Some(group) == shooter_group,
        None => false,
    });
    outcome.turn_continues = foul.is_none() && scored_own;
    if !outcome.turn_continues {
        next.turn = shooter.opponent();
    }
    outcome.next_turn = next.turn;

    for &id in stroke_potted {
        if id != CUE_ID && id != EIGHT_ID {
            next.credit(id);
        }
    }

    end_stroke(&mut next);
    (next, outcome)
}

/// Is `id` a legal first contact for the player on turn?
pub fn is_legal_first_contact(id: u8, state: &MatchState) -> bool {
    let shooter = state.turn;
    match state.group_of(shooter) {
        None => group_of_id(id).is_some(),
        Some(group) => {
            group_of_id(id) == Some(group) || (id == EIGHT_ID && state.has_cleared(shooter))
        }
    }
}

fn contact_foul(stroke_potted: &[u8], state: &MatchState) -> Option<Foul> {
    match state.first_contact {
        Some(id) if !is_legal_first_contact(id, state) => Some(Foul::WrongBallFirst(id)),
        Some(_) => None,
        // A ball dropped, so the cue must have hit something
        None if stroke_potted.iter().any(|&id| id != CUE_ID) => None,
        None => Some(Foul::NoContact),
    }
}

fn end_stroke(state: &mut MatchState) {
    state.potted_this_stroke.clear();
    state.first_contact = None;
    state.motion_active = false;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stroke_state(turn: Player) -> MatchState {
        MatchState {
            turn,
            motion_active: true,
            ..MatchState::new()
        }
    }

    /// Groups assigned, A on solids
    fn assigned(turn: Player) -> MatchState {
        let mut state = stroke_state(turn);
        state.assign_groups(Player::A, Group::Solids);
        state
    }

    #[test]
    fn test_open_table_assigns_first_group() {
        let (next, outcome) = resolve_stroke(&[3], &stroke_state(Player::A));
        assert_eq!(next.player_a_group, Some(Group::Solids));
        assert_eq!(next.player_b_group, Some(Group::Stripes));
        assert_eq!(next.turn, Player::A);
        assert!(outcome.turn_continues);
        assert_eq!(outcome.assigned, Some(Group::Solids));
        assert!(next.potted_a.contains(&3));
        assert!(!next.motion_active);
        assert!(next.potted_this_stroke.is_empty());
    }

    #[test]
    fn test_assignment_follows_pocket_order() {
        let (next, _) = resolve_stroke(&[12, 2, 5], &stroke_state(Player::B));
        assert_eq!(next.player_b_group, Some(Group::Stripes));
        assert_eq!(next.player_a_group, Some(Group::Solids));
        // Same-stroke balls credited under the new assignment
        assert!(next.potted_b.contains(&12));
        assert!(next.potted_a.contains(&2));
        assert!(next.potted_a.contains(&5));
        assert_eq!(next.turn, Player::B);
    }

    #[test]
    fn test_scratch_passes_turn_and_respots() {
        for state in [stroke_state(Player::A), assigned(Player::A)] {
            let (next, outcome) = resolve_stroke(&[0], &state);
            assert_eq!(outcome.foul, Some(Foul::Scratch));
            assert!(outcome.cue_respot);
            assert!(next.cue_respot_pending);
            assert_eq!(next.turn, Player::B);
            assert!(!outcome.turn_continues);
        }
    }

    #[test]
    fn test_scratch_on_open_table_does_not_assign() {
        let (next, outcome) = resolve_stroke(&[4, 0], &stroke_state(Player::A));
        assert!(next.is_open());
        assert_eq!(outcome.assigned, None);
        assert!(next.unclaimed.contains(&4));
        assert_eq!(next.turn, Player::B);

        // Held ball is credited once B claims a group
        let mut state = next;
        state.motion_active = true;
        let (after, _) = resolve_stroke(&[10], &state);
        assert_eq!(after.player_b_group, Some(Group::Stripes));
        assert!(after.potted_a.contains(&4));
        assert!(after.potted_b.contains(&10));
        assert!(after.unclaimed.is_empty());
    }

    #[test]
    fn test_eight_wins_when_cleared() {
        let mut state = assigned(Player::A);
        state.potted_a.extend(1..=7);
        let (next, outcome) = resolve_stroke(&[8], &state);
        assert_eq!(next.winner, Some(Player::A));
        assert_eq!(outcome.winner, Some(Player::A));
    }

    #[test]
    fn test_early_eight_loses() {
        let mut state = assigned(Player::A);
        state.potted_a.extend(1..=6);
        let (next, _) = resolve_stroke(&[8], &state);
        assert_eq!(next.winner, Some(Player::B));

        // On the open table too
        let (next, _) = resolve_stroke(&[8], &stroke_state(Player::B));
        assert_eq!(next.winner, Some(Player::A));
    }

    #[test]
    fn test_opponent_ball_only_passes_turn() {
        let mut state = assigned(Player::A);
        state.first_contact = Some(2);
        let (next, outcome) = resolve_stroke(&[11], &state);
        assert!(!outcome.turn_continues);
        assert!(!outcome.is_foul());
        assert_eq!(next.turn, Player::B);
        assert!(next.potted_b.contains(&11));
    }

    #[test]
    fn test_own_ball_continues() {
        let mut state = assigned(Player::B);
        state.first_contact = Some(13);
        let (next, outcome) = resolve_stroke(&[13], &state);
        assert!(outcome.turn_continues);
        assert_eq!(next.turn, Player::B);
        assert!(next.potted_b.contains(&13));
    }

    #[test]
    fn test_wrong_ball_first_is_foul() {
        let mut state = assigned(Player::A);
        state.first_contact = Some(9);
        let (next, outcome) = resolve_stroke(&[1], &state);
        assert_eq!(outcome.foul, Some(Foul::WrongBallFirst(9)));
        assert!(!outcome.turn_continues);
        assert_eq!(next.turn, Player::B);
        // Ball still counts for its owner
        assert!(next.potted_a.contains(&1));
        assert!(!next.cue_respot_pending);
    }

    #[test]
    fn test_eight_first_on_open_table_is_foul() {
        let mut state = stroke_state(Player::A);
        state.first_contact = Some(EIGHT_ID);
        let (next, outcome) = resolve_stroke(&[], &state);
        assert_eq!(outcome.foul, Some(Foul::WrongBallFirst(EIGHT_ID)));
        assert_eq!(next.turn, Player::B);
    }

    #[test]
    fn test_eight_first_legal_once_cleared() {
        let mut state = assigned(Player::A);
        state.potted_a.extend(1..=7);
        assert!(is_legal_first_contact(EIGHT_ID, &state));
        state.first_contact = Some(EIGHT_ID);
        let (_, outcome) = resolve_stroke(&[], &state);
        assert_eq!(outcome.foul, None);
    }

    #[test]
    fn test_no_contact_is_foul() {
        let (next, outcome) = resolve_stroke(&[], &assigned(Player::A));
        assert_eq!(outcome.foul, Some(Foul::NoContact));
        assert_eq!(next.turn, Player::B);
    }

    #[test]
    fn test_legal_miss_passes_turn_without_foul() {
        let mut state = assigned(Player::A);
        state.first_contact = Some(4);
        let (next, outcome) = resolve_stroke(&[], &state);
        assert!(!outcome.is_foul());
        assert_eq!(next.turn, Player::B);
        assert_eq!(next.first_contact, None);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let mut state = assigned(Player::B);
        state.potted_a.insert(2);
        state.first_contact = Some(14);
        let first = resolve_stroke(&[14, 3, 0], &state);
        let second = resolve_stroke(&[14, 3, 0], &state);
        assert_eq!(first, second);
    }
}
