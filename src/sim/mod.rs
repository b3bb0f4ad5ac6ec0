//! Deterministic simulation module
//!
//! This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (caller order, grid queries sorted)
//! - No rendering, networking or combat rules

pub mod ballistics;
pub mod body;
pub mod collision;
pub mod forces;
pub mod grid;
pub mod integrate;
pub mod state;
pub mod tick;

pub use ballistics::{FlightOutcome, ricochet_angle, ricochet_velocity, update_projectile};
pub use body::{
    Arena, Ballistic, Collidable, MotionFlags, PhysicsBody, ProjectileKind, derived_mass,
};
pub use collision::{CollisionResolver, CollisionResult, Contact, circle_collision, circles_overlap};
pub use forces::{apply_explosion_force, apply_force, apply_impulse, explosion_falloff};
pub use grid::{BodyRef, SpatialGrid};
pub use integrate::{WallContact, integrate};
pub use state::{Bot, Projectile, World};
pub use tick::{DebugInfo, FixedTimestep, PhysicsEngine};
