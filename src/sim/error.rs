//! Engine error taxonomy
//!
//! Precondition violations and construction-time rejections. The integrator
//! never produces these: invalid bodies are skipped during simulation.

use std::fmt;

use super::state::Player;

#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// A stroke is still in flight
    MotionActive,
    /// Input arrived for the player who is not on turn
    NotYourTurn { expected: Player, got: Player },
    /// The match already has a winner
    GameOver,
    /// The cue is off the table awaiting respot
    CuePocketed,
    /// Aim or power unusable (non-finite, zero-length, out of range)
    InvalidShot { reason: &'static str },
    /// Body rejected at construction
    InvalidBody { id: u8, reason: &'static str },
    /// Table geometry rejected at construction
    InvalidTable { reason: &'static str },
    /// Settings could not be read or parsed
    Config(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MotionActive => write!(f, "balls are still moving"),
            Self::NotYourTurn { expected, got } => {
                write!(f, "not your turn: expected {expected}, got {got}")
            }
            Self::GameOver => write!(f, "match is over"),
            Self::CuePocketed => write!(f, "cue ball is not on the table"),
            Self::InvalidShot { reason } => write!(f, "invalid shot: {reason}"),
            Self::InvalidBody { id, reason } => write!(f, "invalid ball {id}: {reason}"),
            Self::InvalidTable { reason } => write!(f, "invalid table: {reason}"),
            Self::Config(msg) => write!(f, "settings error: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}
