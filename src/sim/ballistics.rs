//! Projectile flight: type drag, wall ricochet and termination
//!
//! Walls are checked per axis. Both axes can fire in one step when a shot
//! clips a corner, and each counts as a bounce.

use glam::DVec2;

use super::body::{Arena, Ballistic};
use super::integrate::{apply_damping, dt_seconds};
use crate::settings::PhysicsConfig;

/// What happened to a projectile during one step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlightOutcome {
    /// Wall bounces performed this step
    pub bounces: u32,
    /// The projectile went inactive this step
    pub expired: bool,
}

/// Reflect a velocity off an arbitrary surface: R = I - 2(I·N)N
///
/// The normal is normalized here; a zero or non-finite normal leaves the
/// velocity untouched.
pub fn ricochet_velocity(incident: DVec2, normal: DVec2) -> DVec2 {
    let n = normal.normalize_or_zero();
    if n == DVec2::ZERO {
        return incident;
    }
    incident - 2.0 * incident.dot(n) * n
}

/// Ricochet angle off a surface, in radians (`atan2` of the reflected vector)
pub fn ricochet_angle(incident: DVec2, normal: DVec2) -> f64 {
    let r = ricochet_velocity(incident, normal);
    r.y.atan2(r.x)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    X,
    Y,
}

/// Advance an active projectile one step
pub fn update_projectile<P: Ballistic + ?Sized>(
    projectile: &mut P,
    dt_ms: f64,
    arena: &Arena,
    config: &PhysicsConfig,
) -> FlightOutcome {
    let mut outcome = FlightOutcome::default();
    if !projectile.is_active() {
        return outcome;
    }

    let dt = dt_seconds(dt_ms);
    let flags = projectile.motion();
    let drag = config.projectile_drag.for_kind(projectile.kind());
    let vel = apply_damping(
        projectile.velocity(),
        flags.has_gravity,
        flags.has_drag.then_some(drag),
        flags.has_friction.then_some(config.friction),
        config.gravity,
        dt,
    );
    let pos = projectile.position() + vel * dt * config.velocity_scale;

    if !pos.is_finite() || !vel.is_finite() {
        log::warn!("Projectile {} went non-finite, deactivating", projectile.id());
        projectile.deactivate();
        outcome.expired = true;
        return outcome;
    }

    projectile.set_velocity(vel);
    projectile.set_position(pos);

    for axis in [Axis::X, Axis::Y] {
        if !projectile.is_active() {
            break;
        }
        if resolve_wall(projectile, axis, arena, config) {
            outcome.bounces += 1;
        }
    }

    // Heading reflects the post-bounce direction
    let vel = projectile.velocity();
    if vel != DVec2::ZERO {
        projectile.set_heading(vel.y.atan2(vel.x));
    }

    outcome.expired = !projectile.is_active();
    outcome
}

/// Handle wall penetration along one axis; returns true on a bounce
fn resolve_wall<P: Ballistic + ?Sized>(
    projectile: &mut P,
    axis: Axis,
    arena: &Arena,
    config: &PhysicsConfig,
) -> bool {
    let radius = projectile.radius().max(config.min_radius);
    let mut pos = projectile.position();
    let mut vel = projectile.velocity();

    let (coord, extent) = match axis {
        Axis::X => (pos.x, arena.width),
        Axis::Y => (pos.y, arena.height),
    };

    let snapped = if coord - radius < 0.0 {
        radius + config.wall_margin
    } else if coord + radius > extent {
        extent - radius - config.wall_margin
    } else {
        return false;
    };

    if !projectile.bounce_eligible() {
        log::debug!("Projectile {} hit a wall and was consumed", projectile.id());
        projectile.deactivate();
        return false;
    }

    match axis {
        Axis::X => {
            vel.x = -vel.x * config.wall_restitution;
            pos.x = snapped;
        }
        Axis::Y => {
            vel.y = -vel.y * config.wall_restitution;
            pos.y = snapped;
        }
    }
    projectile.set_velocity(vel);
    projectile.set_position(pos);
    projectile.set_damage(projectile.damage() * config.bounce_damage_decay);

    let bounces = projectile.bounce_count().saturating_add(1);
    projectile.set_bounce_count(bounces);
    if bounces > config.max_bounces {
        log::debug!("Projectile {} expired after {} bounces", projectile.id(), bounces);
        projectile.deactivate();
    }
    true
}
