//! Forces, impulses and explosions
//!
//! Called by hazards, abilities and explosions outside the frame step. All
//! three write velocity directly.

use glam::DVec2;

use super::body::{PhysicsBody, derived_mass};
use super::integrate::dt_seconds;
use crate::settings::PhysicsConfig;
use crate::{clamp_length, finite_or_zero};

fn mass_of<B: PhysicsBody + ?Sized>(body: &B, config: &PhysicsConfig) -> f64 {
    derived_mass(
        body.health(),
        body.radius().max(config.min_radius),
        config.min_mass,
    )
}

/// Continuous force over `dt_ms`, capped at the body's top speed
pub fn apply_force<B: PhysicsBody + ?Sized>(
    body: &mut B,
    force: DVec2,
    dt_ms: f64,
    config: &PhysicsConfig,
) {
    let accel = force / mass_of(body, config);
    let vel = body.velocity() + accel * dt_seconds(dt_ms);
    let max_speed = body
        .max_speed()
        .filter(|s| s.is_finite() && *s > 0.0)
        .unwrap_or(config.default_max_speed);
    body.set_velocity(finite_or_zero(clamp_length(vel, max_speed)));
}

/// Instantaneous velocity change `impulse / mass`, deliberately uncapped
pub fn apply_impulse<B: PhysicsBody + ?Sized>(
    body: &mut B,
    impulse: DVec2,
    config: &PhysicsConfig,
) {
    let vel = body.velocity() + impulse / mass_of(body, config);
    if vel.is_finite() {
        body.set_velocity(vel);
    } else {
        log::warn!("Discarding non-finite impulse on body {}", body.id());
    }
}

/// Radial falloff for an explosion: `(1 - d/r)^2` inside the radius, else 0
#[inline]
pub fn explosion_falloff(distance: f64, radius: f64) -> f64 {
    if radius <= 0.0 || !distance.is_finite() || distance >= radius {
        return 0.0;
    }
    let t = 1.0 - distance / radius;
    t * t
}

/// Push every body within `radius` of `center` away from it
///
/// Bodies exactly at the center have no direction and are skipped. Returns
/// how many bodies were pushed.
pub fn apply_explosion_force<B: PhysicsBody>(
    center: DVec2,
    force: f64,
    radius: f64,
    bodies: &mut [B],
    config: &PhysicsConfig,
) -> usize {
    let mut pushed = 0;
    for body in bodies.iter_mut() {
        let delta = body.position() - center;
        let dist = delta.length();
        if dist <= 0.0 || dist >= radius {
            continue;
        }
        let strength = force * explosion_falloff(dist, radius);
        apply_impulse(body, delta / dist * strength, config);
        pushed += 1;
    }
    log::debug!("Explosion at ({:.1}, {:.1}) pushed {} bodies", center.x, center.y, pushed);
    pushed
}
