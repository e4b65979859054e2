//! Eight Ball - 2D billiards simulation and opponent shot planning
//!
//! Core modules:
//! - `sim`: Deterministic simulation (bodies, integrator, rules, planner)
//! - `settings`: Data-driven tuning loaded from JSON

pub mod settings;
pub mod sim;

pub use settings::{Settings, TableSize};

use glam::Vec2;

/// Engine configuration constants (defaults for `Settings`)
pub mod consts {
    /// Table playing surface (cushion to cushion), long axis along x
    pub const TABLE_WIDTH: f32 = 800.0;
    pub const TABLE_HEIGHT: f32 = 400.0;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 10.0;
    /// Cue ball is slightly heavier than object balls
    pub const CUE_MASS: f32 = 1.1;
    pub const OBJECT_MASS: f32 = 1.0;
    /// Gap left between balls in the rack so nothing starts overlapped
    pub const RACK_GAP: f32 = 0.1;

    /// Pocket capture radius as a multiple of ball radius.
    /// Must exceed sqrt(2) so a ball pressed into a corner is captured.
    pub const POCKET_CAPTURE_FACTOR: f32 = 1.8;

    /// Integration sub-steps per tick (tunneling guard)
    pub const SUBSTEPS: u32 = 8;
    /// Velocity retained per sub-step (rolling/sliding friction)
    pub const DAMPING: f32 = 0.994;
    /// Speed (units/tick) under which a ball is considered at rest
    pub const REST_EPSILON: f32 = 0.02;
    /// Cushion restitution
    pub const WALL_RESTITUTION: f32 = 0.8;
    /// Ball-ball restitution (1.0 = perfectly elastic)
    pub const BALL_RESTITUTION: f32 = 1.0;

    /// Cue speed (units/tick) at power 1.0
    pub const MAX_SHOT_SPEED: f32 = 28.0;
    /// Planner power for a pocketing shot
    pub const PLANNER_POWER: f32 = 0.8;
    /// Planner power for a contact-only fallback shot
    pub const FALLBACK_POWER: f32 = 0.3;

    /// Balls per group (solids 1-7, stripes 9-15)
    pub const GROUP_SIZE: usize = 7;
}

/// Unit direction for an angle in radians (0 = +x, counter-clockwise)
#[inline]
pub fn direction_from_angle(theta: f32) -> Vec2 {
    Vec2::new(theta.cos(), theta.sin())
}

/// Angle of a direction in radians, in [-π, π]
#[inline]
pub fn angle_of(dir: Vec2) -> f32 {
    dir.y.atan2(dir.x)
}
