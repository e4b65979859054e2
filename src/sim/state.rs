//! Game state and core simulation types
//!
//! The body registry, pockets and match bookkeeping for one rack, held
//! together in a single `GameState` context that every operation takes by
//! reference.

use std::collections::BTreeSet;
use std::fmt;

use glam::Vec2;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::error::EngineError;
use super::physics::TableBounds;
use super::rules::StrokeOutcome;
use crate::consts::*;
use crate::settings::Settings;

/// Identity of the cue ball
pub const CUE_ID: u8 = 0;
/// Identity of the eight-ball
pub const EIGHT_ID: u8 = 8;
/// Highest ball identity on the table
pub const MAX_ID: u8 = 15;
/// Slack allowed when checking a layout for touching balls
const OVERLAP_TOLERANCE: f32 = 1e-3;

/// The two players of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    A,
    B,
}

impl Player {
    pub fn opponent(self) -> Player {
        match self {
            Player::A => Player::B,
            Player::B => Player::A,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::A => write!(f, "player A"),
            Player::B => write!(f, "player B"),
        }
    }
}

/// Solids (1-7) or stripes (9-15)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Group {
    Solids,
    Stripes,
}

impl Group {
    pub fn other(self) -> Group {
        match self {
            Group::Solids => Group::Stripes,
            Group::Stripes => Group::Solids,
        }
    }

    /// Ball identities belonging to this group
    pub fn members(self) -> std::ops::RangeInclusive<u8> {
        match self {
            Group::Solids => 1..=7,
            Group::Stripes => 9..=15,
        }
    }
}

/// What a ball is, derived once from its identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BallKind {
    Cue,
    Solid,
    Eight,
    Stripe,
}

impl BallKind {
    pub fn from_id(id: u8) -> Option<BallKind> {
        match id {
            CUE_ID => Some(BallKind::Cue),
            1..=7 => Some(BallKind::Solid),
            EIGHT_ID => Some(BallKind::Eight),
            9..=MAX_ID => Some(BallKind::Stripe),
            _ => None,
        }
    }

    /// Group membership; the cue and the eight belong to neither
    pub fn group(self) -> Option<Group> {
        match self {
            BallKind::Solid => Some(Group::Solids),
            BallKind::Stripe => Some(Group::Stripes),
            BallKind::Cue | BallKind::Eight => None,
        }
    }
}

/// Group of a ball identity (None for cue, eight and out-of-range ids)
pub fn group_of_id(id: u8) -> Option<Group> {
    BallKind::from_id(id).and_then(BallKind::group)
}

/// A ball on the table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub id: u8,
    pub kind: BallKind,
    pub group: Option<Group>,
    pub pos: Vec2,
    /// Table units per tick
    pub vel: Vec2,
    pub radius: f32,
    pub mass: f32,
    pub pocketed: bool,
}

impl Body {
    /// Build a ball at rest, rejecting degenerate geometry up front
    pub fn new(id: u8, pos: Vec2, radius: f32, mass: f32) -> Result<Self, EngineError> {
        let kind = BallKind::from_id(id).ok_or(EngineError::InvalidBody {
            id,
            reason: "identity must be 0..=15",
        })?;
        if !(radius.is_finite() && radius > 0.0) {
            return Err(EngineError::InvalidBody {
                id,
                reason: "radius must be positive",
            });
        }
        if !(mass.is_finite() && mass > 0.0) {
            return Err(EngineError::InvalidBody {
                id,
                reason: "mass must be positive",
            });
        }
        if !pos.is_finite() {
            return Err(EngineError::InvalidBody {
                id,
                reason: "position must be finite",
            });
        }
        Ok(Self {
            id,
            kind,
            group: kind.group(),
            pos,
            vel: Vec2::ZERO,
            radius,
            mass,
            pocketed: false,
        })
    }

    #[inline]
    pub fn is_cue(&self) -> bool {
        self.kind == BallKind::Cue
    }

    /// On the table and moving
    #[inline]
    pub fn is_moving(&self) -> bool {
        !self.pocketed && self.vel != Vec2::ZERO
    }

    #[inline]
    pub fn kinetic_energy(&self) -> f32 {
        super::vector::kinetic_energy(self.mass, self.vel)
    }

    /// Take the ball off the table
    pub fn pocket(&mut self) {
        self.pocketed = true;
        self.vel = Vec2::ZERO;
    }
}

/// A pocket (fixed for the lifetime of a rack)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pocket {
    pub pos: Vec2,
    pub capture_radius: f32,
}

impl Pocket {
    /// Four corner pockets and two side pockets on the long rails
    pub fn for_table(bounds: &TableBounds, capture_radius: f32) -> Vec<Pocket> {
        let (min, max) = (bounds.min, bounds.max);
        let mid_x = (min.x + max.x) / 2.0;
        [
            Vec2::new(min.x, min.y),
            Vec2::new(mid_x, min.y),
            Vec2::new(max.x, min.y),
            Vec2::new(min.x, max.y),
            Vec2::new(mid_x, max.y),
            Vec2::new(max.x, max.y),
        ]
        .into_iter()
        .map(|pos| Pocket {
            pos,
            capture_radius,
        })
        .collect()
    }
}

/// Turn, group and win bookkeeping for one match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchState {
    pub turn: Player,
    /// None while the table is open
    pub player_a_group: Option<Group>,
    pub player_b_group: Option<Group>,
    pub potted_a: BTreeSet<u8>,
    pub potted_b: BTreeSet<u8>,
    /// Object balls pocketed while the table was open, credited on assignment
    pub unclaimed: BTreeSet<u8>,
    /// Pocket order for the stroke in flight
    pub potted_this_stroke: Vec<u8>,
    /// First object ball the cue touched this stroke
    pub first_contact: Option<u8>,
    pub winner: Option<Player>,
    pub motion_active: bool,
    /// Cue must be put back on the head spot at stroke end
    pub cue_respot_pending: bool,
    /// Strokes fired so far
    pub strokes: u32,
}

impl Default for MatchState {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchState {
    /// Fresh match: open table, player A breaks
    pub fn new() -> Self {
        Self {
            turn: Player::A,
            player_a_group: None,
            player_b_group: None,
            potted_a: BTreeSet::new(),
            potted_b: BTreeSet::new(),
            unclaimed: BTreeSet::new(),
            potted_this_stroke: Vec::new(),
            first_contact: None,
            winner: None,
            motion_active: false,
            cue_respot_pending: false,
            strokes: 0,
        }
    }

    /// Fresh match for a custom layout. Object balls missing from the table
    /// count as already pocketed, held until groups are assigned.
    pub fn for_layout(bodies: &[Body]) -> Self {
        let on_table: BTreeSet<u8> = bodies.iter().filter(|b| !b.pocketed).map(|b| b.id).collect();
        Self {
            unclaimed: Group::Solids
                .members()
                .chain(Group::Stripes.members())
                .filter(|id| !on_table.contains(id))
                .collect(),
            ..Self::new()
        }
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.player_a_group.is_none()
    }

    pub fn group_of(&self, player: Player) -> Option<Group> {
        match player {
            Player::A => self.player_a_group,
            Player::B => self.player_b_group,
        }
    }

    /// Assign `group` to `player` and the complement to the opponent, then
    /// credit the balls held while the table was open
    pub fn assign_groups(&mut self, player: Player, group: Group) {
        let (a, b) = match player {
            Player::A => (group, group.other()),
            Player::B => (group.other(), group),
        };
        self.player_a_group = Some(a);
        self.player_b_group = Some(b);
        for id in std::mem::take(&mut self.unclaimed) {
            self.credit(id);
        }
    }

    /// Credit a pocketed object ball to its group's owner, or hold it while open
    pub fn credit(&mut self, id: u8) {
        let Some(group) = group_of_id(id) else {
            return;
        };
        match self.owner_of(group) {
            Some(player) => {
                self.potted_for_mut(player).insert(id);
            }
            None => {
                self.unclaimed.insert(id);
            }
        }
    }

    /// Player who owns a group, if groups are assigned
    pub fn owner_of(&self, group: Group) -> Option<Player> {
        if self.player_a_group == Some(group) {
            Some(Player::A)
        } else if self.player_b_group == Some(group) {
            Some(Player::B)
        } else {
            None
        }
    }

    pub fn potted_for(&self, player: Player) -> &BTreeSet<u8> {
        match player {
            Player::A => &self.potted_a,
            Player::B => &self.potted_b,
        }
    }

    pub fn potted_for_mut(&mut self, player: Player) -> &mut BTreeSet<u8> {
        match player {
            Player::A => &mut self.potted_a,
            Player::B => &mut self.potted_b,
        }
    }

    /// Has the player pocketed every ball of their assigned group?
    ///
    /// The one test for "cleared": the rules use it to decide the eight, and
    /// the planner only aims at balls the rules accept as a first contact.
    pub fn has_cleared(&self, player: Player) -> bool {
        match self.group_of(player) {
            Some(group) => {
                let potted = self.potted_for(player);
                group.members().filter(|id| potted.contains(id)).count() == GROUP_SIZE
            }
            None => false,
        }
    }
}

/// Match lifecycle driven once per frame by `tick`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Waiting for the player on turn to fire
    Idle,
    /// Balls moving; each tick advances the integrator
    StrokeInFlight,
    /// Everything at rest; next tick applies the rules
    Resolving,
    /// Winner decided
    GameOver,
}

/// Events for the host (sound, announcements); drained with `take_events`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    BallPocketed { id: u8 },
    StrokeResolved(StrokeOutcome),
    GameOver { winner: Player },
}

/// Read-only view of one ball for rendering
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodySnapshot {
    pub id: u8,
    pub pos: Vec2,
    pub pocketed: bool,
}

/// Read-only view of the whole table for rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub phase: Phase,
    pub bodies: Vec<BodySnapshot>,
    pub match_state: MatchState,
}

/// Complete engine context for one rack (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub settings: Settings,
    pub bounds: TableBounds,
    /// Sorted by id; index 0 is the cue
    pub bodies: Vec<Body>,
    pub pockets: Vec<Pocket>,
    pub match_state: MatchState,
    pub phase: Phase,
    #[serde(skip)]
    pub events: Vec<GameEvent>,
}

impl GameState {
    /// Rack fifteen balls and place the cue on the head spot
    pub fn new(settings: Settings) -> Result<Self, EngineError> {
        settings.validate()?;
        let bounds = table_bounds(&settings)?;
        let r = settings.ball_radius;

        let mut bodies = Vec::with_capacity(16);
        bodies.push(Body::new(CUE_ID, head_spot(&bounds), r, settings.cue_mass)?);
        for (pos, id) in rack_positions(foot_spot(&bounds), r, RACK_GAP)
            .into_iter()
            .zip(rack_order(settings.rack_seed))
        {
            bodies.push(Body::new(id, pos, r, settings.object_mass)?);
        }

        log::info!(
            "Racked {} table ({}x{}), seed {}",
            settings.table_size.as_str(),
            bounds.width(),
            bounds.height(),
            settings.rack_seed
        );
        Self::with_bodies(settings, bodies)
    }

    /// Custom layout (practice positions, tests). Requires exactly one cue,
    /// unique ids, and every ball still in play on the table and clear of the others.
    pub fn with_bodies(settings: Settings, mut bodies: Vec<Body>) -> Result<Self, EngineError> {
        settings.validate()?;
        let bounds = table_bounds(&settings)?;

        bodies.sort_by_key(|b| b.id);
        if bodies.windows(2).any(|w| w[0].id == w[1].id) {
            return Err(EngineError::InvalidTable {
                reason: "duplicate ball identity",
            });
        }
        if bodies.first().map(|b| b.id) != Some(CUE_ID) {
            return Err(EngineError::InvalidTable {
                reason: "exactly one cue ball required",
            });
        }
        for body in &bodies {
            if !(body.radius > 0.0 && body.mass > 0.0) {
                return Err(EngineError::InvalidBody {
                    id: body.id,
                    reason: "radius and mass must be positive",
                });
            }
        }

        let live: Vec<&Body> = bodies.iter().filter(|b| !b.pocketed).collect();
        for (i, a) in live.iter().enumerate() {
            if !bounds.contains(a.pos, a.radius) {
                return Err(EngineError::InvalidBody {
                    id: a.id,
                    reason: "ball is off the table",
                });
            }
            if let Some(b) = live[i + 1..]
                .iter()
                .find(|b| a.pos.distance(b.pos) < a.radius + b.radius - OVERLAP_TOLERANCE)
            {
                log::debug!("Balls {} and {} overlap in layout", a.id, b.id);
                return Err(EngineError::InvalidBody {
                    id: b.id,
                    reason: "ball overlaps another",
                });
            }
        }

        let pockets = Pocket::for_table(&bounds, settings.pocket_capture_radius());
        let match_state = MatchState::for_layout(&bodies);
        Ok(Self {
            settings,
            bounds,
            bodies,
            pockets,
            match_state,
            phase: Phase::Idle,
            events: Vec::new(),
        })
    }

    /// The cue ball (always index 0)
    pub fn cue(&self) -> &Body {
        &self.bodies[0]
    }

    pub fn cue_mut(&mut self) -> &mut Body {
        &mut self.bodies[0]
    }

    pub fn body(&self, id: u8) -> Option<&Body> {
        self.bodies.iter().find(|b| b.id == id)
    }

    pub fn body_mut(&mut self, id: u8) -> Option<&mut Body> {
        self.bodies.iter_mut().find(|b| b.id == id)
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    /// Put the cue back on the head spot, sliding toward the head rail if occupied
    pub fn respot_cue(&mut self) {
        let r = self.cue().radius;
        let step = 2.0 * r + RACK_GAP;
        let spot = head_spot(&self.bounds);
        let is_clear = |pos: Vec2, bodies: &[Body]| {
            bodies
                .iter()
                .filter(|b| !b.pocketed && !b.is_cue())
                .all(|b| b.pos.distance(pos) >= b.radius + r + RACK_GAP)
        };

        let min_x = self.bounds.min.x + r;
        let max_x = self.bounds.max.x - r;
        let candidates = (0..)
            .map(|i| spot - Vec2::X * step * i as f32)
            .take_while(|p| p.x >= min_x)
            .chain(
                (1..)
                    .map(|i| spot + Vec2::X * step * i as f32)
                    .take_while(|p| p.x <= max_x),
            );
        let mut chosen = spot;
        for pos in candidates {
            if is_clear(pos, &self.bodies) {
                chosen = pos;
                break;
            }
        }

        let cue = self.cue_mut();
        cue.pos = chosen;
        cue.vel = Vec2::ZERO;
        cue.pocketed = false;
        log::debug!("Cue respotted at ({:.1}, {:.1})", chosen.x, chosen.y);
    }

    /// Drain queued events
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Read-only view for rendering
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            bodies: self
                .bodies
                .iter()
                .map(|b| BodySnapshot {
                    id: b.id,
                    pos: b.pos,
                    pocketed: b.pocketed,
                })
                .collect(),
            match_state: self.match_state.clone(),
        }
    }
}

fn table_bounds(settings: &Settings) -> Result<TableBounds, EngineError> {
    let (w, h) = settings.table_size.dimensions();
    // Room for the full rack plus the cue along the long axis
    if w < 20.0 * settings.ball_radius || h < 12.0 * settings.ball_radius {
        return Err(EngineError::InvalidTable {
            reason: "table too small for ball radius",
        });
    }
    Ok(TableBounds::new(Vec2::ZERO, Vec2::new(w, h)))
}

/// Cue re-entry point: a quarter of the way along the long axis
pub fn head_spot(bounds: &TableBounds) -> Vec2 {
    Vec2::new(
        bounds.min.x + bounds.width() * 0.25,
        bounds.min.y + bounds.height() * 0.5,
    )
}

/// Rack apex: three quarters of the way along the long axis
pub fn foot_spot(bounds: &TableBounds) -> Vec2 {
    Vec2::new(
        bounds.min.x + bounds.width() * 0.75,
        bounds.min.y + bounds.height() * 0.5,
    )
}

/// Triangle positions, apex first, rows of 1..=5 extending toward +x
pub fn rack_positions(apex: Vec2, radius: f32, gap: f32) -> Vec<Vec2> {
    let spacing = 2.0 * radius + gap;
    let row_step = spacing * 3f32.sqrt() / 2.0;
    let mut positions = Vec::with_capacity(15);
    for row in 0..5 {
        for col in 0..=row {
            let x = apex.x + row as f32 * row_step;
            let y = apex.y + (col as f32 - row as f32 / 2.0) * spacing;
            positions.push(Vec2::new(x, y));
        }
    }
    positions
}

/// Ball identities for each rack slot: eight in the middle of the third row,
/// one solid and one stripe in the back corners, the rest shuffled.
pub fn rack_order(seed: u64) -> Vec<u8> {
    const EIGHT_SLOT: usize = 4;
    const BACK_LEFT: usize = 10;
    const BACK_RIGHT: usize = 14;

    let mut rng = Pcg32::seed_from_u64(seed);
    let mut solids: Vec<u8> = Group::Solids.members().collect();
    let mut stripes: Vec<u8> = Group::Stripes.members().collect();
    solids.shuffle(&mut rng);
    stripes.shuffle(&mut rng);

    let corner_solid = solids.pop().unwrap_or(1);
    let corner_stripe = stripes.pop().unwrap_or(9);
    let (left, right) = if rng.random_bool(0.5) {
        (corner_solid, corner_stripe)
    } else {
        (corner_stripe, corner_solid)
    };

    let mut rest: Vec<u8> = solids.into_iter().chain(stripes).collect();
    rest.shuffle(&mut rng);
    let mut rest = rest.into_iter();

    (0..15)
        .map(|slot| match slot {
            EIGHT_SLOT => EIGHT_ID,
            BACK_LEFT => left,
            BACK_RIGHT => right,
            _ => rest.next().unwrap_or(EIGHT_ID),
        })
        .collect()
}
