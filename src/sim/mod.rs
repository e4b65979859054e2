//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed tick only, sub-stepped internally
//! - Seeded RNG only (rack shuffle)
//! - Stable iteration order (by ball id)
//! - No rendering or platform dependencies

pub mod error;
pub mod physics;
pub mod planner;
pub mod rules;
pub mod state;
pub mod tick;
pub mod vector;

pub use error::EngineError;
pub use physics::{AdvanceReport, PhysicsParams, TableBounds, advance};
pub use planner::{Shot, find_best_shot};
pub use rules::{Foul, StrokeOutcome, resolve_stroke};
pub use state::{
    BallKind, Body, BodySnapshot, GameEvent, GameState, Group, MatchState, Phase, Player, Pocket,
    Snapshot, CUE_ID, EIGHT_ID,
};
pub use tick::{fire, pass_turn, play_computer_turn, tick};
pub use vector::Vector2;
