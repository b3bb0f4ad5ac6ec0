//! Per-body motion integration
//!
//! Velocities are in units per 60fps frame, so positions advance by
//! `v * dt_seconds * velocity_scale`. Tuned constants assume this.

use glam::DVec2;

use super::body::{Arena, PhysicsBody};
use crate::settings::PhysicsConfig;

/// Which walls a body was clamped against this step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WallContact {
    pub left: bool,
    pub right: bool,
    pub top: bool,
    pub bottom: bool,
}

impl WallContact {
    pub fn any(&self) -> bool {
        self.left || self.right || self.top || self.bottom
    }
}

/// Milliseconds to seconds, treating garbage as a zero-length step
#[inline]
pub fn dt_seconds(dt_ms: f64) -> f64 {
    if dt_ms.is_finite() && dt_ms > 0.0 {
        dt_ms / 1000.0
    } else {
        0.0
    }
}

/// Apply gravity, drag and friction to a velocity
///
/// Coefficients are per second: `v *= coeff^dt`.
pub fn apply_damping(
    vel: DVec2,
    has_gravity: bool,
    drag: Option<f64>,
    friction: Option<f64>,
    gravity: f64,
    dt: f64,
) -> DVec2 {
    let mut vel = vel;
    if has_gravity && gravity > 0.0 {
        vel.y += gravity * dt;
    }
    if let Some(drag) = drag {
        vel *= drag.powf(dt);
    }
    if let Some(friction) = friction {
        vel *= friction.powf(dt);
    }
    vel
}

/// Advance a bot-like body one step and keep it inside the arena
pub fn integrate<B: PhysicsBody + ?Sized>(
    body: &mut B,
    dt_ms: f64,
    arena: &Arena,
    config: &PhysicsConfig,
) -> WallContact {
    let vel = body.velocity();
    if vel.x == 0.0 && vel.y == 0.0 {
        return WallContact::default();
    }

    let dt = dt_seconds(dt_ms);
    let flags = body.motion();
    let vel = apply_damping(
        vel,
        flags.has_gravity,
        flags.has_drag.then_some(config.drag),
        flags.has_friction.then_some(config.friction),
        config.gravity,
        dt,
    );

    let mut pos = body.position() + vel * dt * config.velocity_scale;
    let mut vel = vel;
    let radius = body.radius().max(config.min_radius);
    let contact = clamp_to_arena(&mut pos, &mut vel, radius, arena);

    if !pos.is_finite() || !vel.is_finite() {
        log::warn!("Body {} produced non-finite state, stopping it", body.id());
        body.set_velocity(DVec2::ZERO);
        return contact;
    }

    body.set_position(pos);
    body.set_velocity(vel);
    contact
}

/// Clamp a circle inside the arena, zeroing only the outward velocity
///
/// The inward component survives so bodies slide along walls.
pub fn clamp_to_arena(pos: &mut DVec2, vel: &mut DVec2, radius: f64, arena: &Arena) -> WallContact {
    let mut contact = WallContact::default();

    if pos.x - radius < 0.0 {
        pos.x = radius;
        vel.x = vel.x.max(0.0);
        contact.left = true;
    } else if pos.x + radius > arena.width {
        pos.x = arena.width - radius;
        vel.x = vel.x.min(0.0);
        contact.right = true;
    }

    if pos.y - radius < 0.0 {
        pos.y = radius;
        vel.y = vel.y.max(0.0);
        contact.top = true;
    } else if pos.y + radius > arena.height {
        pos.y = arena.height - radius;
        vel.y = vel.y.min(0.0);
        contact.bottom = true;
    }

    contact
}
