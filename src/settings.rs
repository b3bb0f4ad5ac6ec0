//! Physics tuning
//!
//! Every constant the engine reads lives in [`PhysicsConfig`], which is passed
//! to the engine at construction. Separate arenas (or tests) can run with
//! different tuning side by side.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::sim::body::ProjectileKind;

/// Errors raised while loading a config
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Per-kind projectile drag coefficients
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileDrag {
    pub bullet: f64,
    pub plasma: f64,
    pub sniper: f64,
    pub multishot: f64,
    pub turret: f64,
    pub grenade: f64,
}

impl Default for ProjectileDrag {
    fn default() -> Self {
        Self {
            bullet: 0.995,
            plasma: 0.99,
            sniper: 0.998,
            multishot: 0.992,
            turret: 0.99,
            grenade: 0.985,
        }
    }
}

impl ProjectileDrag {
    /// Drag coefficient for a projectile kind
    pub fn for_kind(&self, kind: ProjectileKind) -> f64 {
        match kind {
            ProjectileKind::Bullet => self.bullet,
            ProjectileKind::Plasma => self.plasma,
            ProjectileKind::Sniper => self.sniper,
            ProjectileKind::Multishot => self.multishot,
            ProjectileKind::Turret => self.turret,
            ProjectileKind::Grenade => self.grenade,
        }
    }

    fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> {
        [
            ("bullet", self.bullet),
            ("plasma", self.plasma),
            ("sniper", self.sniper),
            ("multishot", self.multishot),
            ("turret", self.turret),
            ("grenade", self.grenade),
        ]
        .into_iter()
    }
}

/// Engine tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    // === Integration ===
    /// Downward acceleration for bodies with `has_gravity` (0 = top-down)
    pub gravity: f64,
    /// Per-second drag coefficient for bots
    pub drag: f64,
    /// Per-second friction coefficient for bots
    pub friction: f64,
    /// Legacy "units per 60fps frame" position scale
    pub velocity_scale: f64,

    // === Spatial index ===
    pub cell_size: f64,

    // === Bot collisions ===
    pub bot_restitution: f64,
    pub collision_damping: f64,

    // === Projectiles ===
    pub projectile_drag: ProjectileDrag,
    pub wall_restitution: f64,
    pub bounce_damage_decay: f64,
    pub max_bounces: u32,
    pub wall_margin: f64,

    // === Forces ===
    pub default_max_speed: f64,

    // === Degenerate input floors ===
    pub min_mass: f64,
    pub min_radius: f64,

    // === Timestep ===
    pub fixed_dt_ms: f64,
    pub max_substeps: u32,
    pub max_frame_ms: f64,

    /// Seed for the degenerate-overlap separation RNG
    pub rng_seed: u64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 0.0,
            drag: 0.98,
            friction: 0.95,
            velocity_scale: VELOCITY_SCALE,

            cell_size: CELL_SIZE,

            bot_restitution: BOT_RESTITUTION,
            collision_damping: COLLISION_DAMPING,

            projectile_drag: ProjectileDrag::default(),
            wall_restitution: WALL_RESTITUTION,
            bounce_damage_decay: BOUNCE_DAMAGE_DECAY,
            max_bounces: MAX_BOUNCES,
            wall_margin: WALL_MARGIN,

            default_max_speed: DEFAULT_MAX_SPEED,

            min_mass: 0.01,
            min_radius: 0.5,

            fixed_dt_ms: SIM_DT_MS,
            max_substeps: MAX_SUBSTEPS,
            max_frame_ms: MAX_FRAME_MS,

            rng_seed: 0x5EED_A7E4A,
        }
    }
}

impl PhysicsConfig {
    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded physics config from {}", path.display());
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject tuning that would break the simulation invariants
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("cell_size", self.cell_size)?;
        positive("fixed_dt_ms", self.fixed_dt_ms)?;
        positive("max_frame_ms", self.max_frame_ms)?;
        positive("velocity_scale", self.velocity_scale)?;
        positive("default_max_speed", self.default_max_speed)?;
        positive("min_mass", self.min_mass)?;
        positive("min_radius", self.min_radius)?;

        if !self.gravity.is_finite() || self.gravity < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "gravity must be finite and non-negative, got {}",
                self.gravity
            )));
        }
        if self.wall_margin < 0.0 || !self.wall_margin.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "wall_margin must be finite and non-negative, got {}",
                self.wall_margin
            )));
        }
        if self.max_substeps == 0 {
            return Err(ConfigError::Invalid("max_substeps must be at least 1".into()));
        }

        unit_interval("drag", self.drag)?;
        unit_interval("friction", self.friction)?;
        unit_interval("bot_restitution", self.bot_restitution)?;
        unit_interval("collision_damping", self.collision_damping)?;
        unit_interval("wall_restitution", self.wall_restitution)?;
        unit_interval("bounce_damage_decay", self.bounce_damage_decay)?;
        for (name, coeff) in self.projectile_drag.iter() {
            unit_interval(name, coeff)?;
        }
        Ok(())
    }
}

fn positive(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{name} must be positive, got {value}")))
    }
}

fn unit_interval(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{name} must be in (0, 1], got {value}")))
    }
}
