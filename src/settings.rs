//! Engine settings and tuning
//!
//! Loaded from JSON by the host; anything missing falls back to `consts`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::sim::EngineError;
use crate::sim::physics::PhysicsParams;
use crate::sim::planner::PlannerParams;

/// Table size presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TableSize {
    /// 7-foot bar box
    Bar,
    #[default]
    Standard,
    /// 9-foot table
    Tournament,
}

impl TableSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableSize::Bar => "Bar",
            TableSize::Standard => "Standard",
            TableSize::Tournament => "Tournament",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "bar" | "7ft" => Some(TableSize::Bar),
            "standard" | "8ft" => Some(TableSize::Standard),
            "tournament" | "9ft" => Some(TableSize::Tournament),
            _ => None,
        }
    }

    /// Playing surface (width, height); always 2:1
    pub fn dimensions(&self) -> (f32, f32) {
        match self {
            TableSize::Bar => (700.0, 350.0),
            TableSize::Standard => (TABLE_WIDTH, TABLE_HEIGHT),
            TableSize::Tournament => (900.0, 450.0),
        }
    }
}

/// Engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub table_size: TableSize,

    // === Balls ===
    pub ball_radius: f32,
    pub cue_mass: f32,
    pub object_mass: f32,
    /// Pocket capture radius in ball radii
    pub pocket_capture_factor: f32,

    // === Integrator ===
    pub substeps: u32,
    /// Velocity retained per sub-step
    pub damping: f32,
    pub rest_epsilon: f32,
    pub wall_restitution: f32,
    pub ball_restitution: f32,

    // === Strokes ===
    /// Cue speed at power 1.0
    pub max_shot_speed: f32,
    pub planner_power: f32,
    pub fallback_power: f32,

    /// Seed for the rack shuffle
    pub rack_seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            table_size: TableSize::Standard,

            ball_radius: BALL_RADIUS,
            cue_mass: CUE_MASS,
            object_mass: OBJECT_MASS,
            pocket_capture_factor: POCKET_CAPTURE_FACTOR,

            substeps: SUBSTEPS,
            damping: DAMPING,
            rest_epsilon: REST_EPSILON,
            wall_restitution: WALL_RESTITUTION,
            ball_restitution: BALL_RESTITUTION,

            max_shot_speed: MAX_SHOT_SPEED,
            planner_power: PLANNER_POWER,
            fallback_power: FALLBACK_POWER,

            rack_seed: 0,
        }
    }
}

impl Settings {
    /// Create settings for a table preset
    pub fn from_preset(size: TableSize) -> Self {
        Self {
            table_size: size,
            ..Self::default()
        }
    }

    /// Pocket capture radius in table units
    pub fn pocket_capture_radius(&self) -> f32 {
        self.ball_radius * self.pocket_capture_factor
    }

    /// Integrator parameters derived from these settings
    pub fn physics_params(&self) -> PhysicsParams {
        PhysicsParams {
            substeps: self.substeps,
            damping: self.damping,
            rest_epsilon: self.rest_epsilon,
            wall_restitution: self.wall_restitution,
            ball_restitution: self.ball_restitution,
        }
    }

    /// Shot planner parameters derived from these settings
    pub fn planner_params(&self) -> PlannerParams {
        PlannerParams {
            power: self.planner_power,
            fallback_power: self.fallback_power,
        }
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), EngineError> {
        let bad = |msg: &str| Err(EngineError::Config(msg.to_string()));

        if !positive(self.ball_radius) {
            return bad("ball_radius must be positive");
        }
        if !positive(self.cue_mass) || !positive(self.object_mass) {
            return bad("ball masses must be positive");
        }
        if !positive(self.pocket_capture_factor - std::f32::consts::SQRT_2) {
            return bad("pocket_capture_factor must exceed sqrt(2)");
        }
        if self.substeps == 0 {
            return bad("substeps must be at least 1");
        }
        if !positive(self.damping) || self.damping > 1.0 {
            return bad("damping must be in (0, 1]");
        }
        if !(self.rest_epsilon.is_finite() && self.rest_epsilon >= 0.0) {
            return bad("rest_epsilon must be non-negative");
        }
        if !(0.0..=1.0).contains(&self.wall_restitution)
            || !(0.0..=1.0).contains(&self.ball_restitution)
        {
            return bad("restitution must be in [0, 1]");
        }
        if !positive(self.max_shot_speed) {
            return bad("max_shot_speed must be positive");
        }
        if !(0.0..=1.0).contains(&self.planner_power) || !(0.0..=1.0).contains(&self.fallback_power)
        {
            return bad("planner powers must be in [0, 1]");
        }
        Ok(())
    }

    /// Parse and validate settings from JSON
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let settings: Settings =
            serde_json::from_str(json).map_err(|e| EngineError::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, EngineError> {
        serde_json::to_string_pretty(self).map_err(|e| EngineError::Config(e.to_string()))
    }

    /// Load settings from a JSON file
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("{}: {e}", path.display())))?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load settings, falling back to defaults on any error
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(settings) => settings,
            Err(err) => {
                log::warn!("Using default settings ({err})");
                Self::default()
            }
        }
    }
}

#[inline]
fn positive(x: f32) -> bool {
    x.is_finite() && x > 0.0
}
