//! Arena Physics - deterministic physics core for top-down arena combat
//!
//! Core modules:
//! - `sim`: Deterministic simulation (integration, ballistics, collisions, forces)
//! - `settings`: Data-driven physics tuning

pub mod settings;
pub mod sim;

pub use settings::{ConfigError, PhysicsConfig, ProjectileDrag};
pub use sim::{Arena, PhysicsEngine};

use glam::DVec2;

/// Engine-wide constants
pub mod consts {
    /// Fixed simulation timestep chosen by the host loop (60 Hz)
    pub const SIM_DT_MS: f64 = 1000.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame the accumulator accepts (ms)
    pub const MAX_FRAME_MS: f64 = 100.0;

    /// Velocities are expressed in units per 60fps frame
    pub const VELOCITY_SCALE: f64 = 60.0;

    /// Spatial grid cell size (world units)
    pub const CELL_SIZE: f64 = 64.0;

    /// Health assumed for bodies that don't report one
    pub const DEFAULT_HEALTH: f64 = 100.0;
    /// Radius that maps to unit mass
    pub const REFERENCE_RADIUS: f64 = 20.0;
    /// Speed cap applied by continuous forces when a body has no stat
    pub const DEFAULT_MAX_SPEED: f64 = 10.0;

    /// Bot-vs-bot restitution
    pub const BOT_RESTITUTION: f64 = 0.6;
    /// Uniform post-impulse velocity damping (jitter suppression)
    pub const COLLISION_DAMPING: f64 = 0.8;

    /// Projectile wall restitution
    pub const WALL_RESTITUTION: f64 = 0.8;
    /// Damage multiplier applied on every bounce
    pub const BOUNCE_DAMAGE_DECAY: f64 = 0.9;
    /// Projectiles deactivate once bounce_count exceeds this
    pub const MAX_BOUNCES: u32 = 5;
    /// Gap left between a bounced projectile and the wall
    pub const WALL_MARGIN: f64 = 1.0;
}

/// Returns `v` if both components are finite, otherwise zero
#[inline]
pub fn finite_or_zero(v: DVec2) -> DVec2 {
    if v.is_finite() { v } else { DVec2::ZERO }
}

/// Unit vector at `angle` radians
#[inline]
pub fn unit_from_angle(angle: f64) -> DVec2 {
    DVec2::new(angle.cos(), angle.sin())
}

/// Clamp a vector's length to `max_len`, leaving shorter vectors untouched
#[inline]
pub fn clamp_length(v: DVec2, max_len: f64) -> DVec2 {
    let len_sq = v.length_squared();
    if len_sq > max_len * max_len && len_sq > 0.0 {
        v * (max_len / len_sq.sqrt())
    } else {
        v
    }
}
