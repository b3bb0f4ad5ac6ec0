//! Body contracts shared by bots and projectiles
//!
//! The engine never owns entities. The combat layer hands it anything that
//! implements [`PhysicsBody`] and the engine mutates position, velocity and
//! projectile fields in place.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_HEALTH, REFERENCE_RADIUS};

/// Arena bounds, supplied per call (may change between maps)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    pub width: f64,
    pub height: f64,
}

impl Arena {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Which integration terms apply to a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionFlags {
    pub has_gravity: bool,
    pub has_drag: bool,
    pub has_friction: bool,
    pub can_bounce: bool,
}

impl Default for MotionFlags {
    fn default() -> Self {
        Self {
            has_gravity: false,
            has_drag: true,
            has_friction: true,
            can_bounce: false,
        }
    }
}

/// Projectile types (select drag coefficient and bounce eligibility)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectileKind {
    #[default]
    Bullet,
    Plasma,
    Sniper,
    Multishot,
    Turret,
    Grenade,
}

impl ProjectileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectileKind::Bullet => "bullet",
            ProjectileKind::Plasma => "plasma",
            ProjectileKind::Sniper => "sniper",
            ProjectileKind::Multishot => "multishot",
            ProjectileKind::Turret => "turret",
            ProjectileKind::Grenade => "grenade",
        }
    }

    /// Parse the combat layer's type name; unknown names yield `None`
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "bullet" => Some(ProjectileKind::Bullet),
            "plasma" => Some(ProjectileKind::Plasma),
            "sniper" => Some(ProjectileKind::Sniper),
            "multishot" => Some(ProjectileKind::Multishot),
            "turret" => Some(ProjectileKind::Turret),
            "grenade" => Some(ProjectileKind::Grenade),
            _ => None,
        }
    }

    /// Kinds that ricochet off walls regardless of `can_bounce`
    pub fn bounces_off_walls(&self) -> bool {
        matches!(
            self,
            ProjectileKind::Plasma | ProjectileKind::Sniper | ProjectileKind::Grenade
        )
    }
}

/// Mass derived from health and size: `(health / 100) * (radius / 20)`
///
/// Missing health counts as 100. The result never drops below `min_mass`,
/// so dead or zero-radius bodies still divide safely.
#[inline]
pub fn derived_mass(health: Option<f64>, radius: f64, min_mass: f64) -> f64 {
    let health = health.unwrap_or(DEFAULT_HEALTH);
    let mass = (health / DEFAULT_HEALTH) * (radius / REFERENCE_RADIUS);
    if mass.is_finite() {
        mass.max(min_mass)
    } else {
        min_mass
    }
}

/// The only entity shape the engine understands
pub trait PhysicsBody {
    /// Stable id, used for canonical pair keys
    fn id(&self) -> u32;

    fn position(&self) -> DVec2;
    fn set_position(&mut self, pos: DVec2);

    /// Velocity in units per 60fps frame
    fn velocity(&self) -> DVec2;
    fn set_velocity(&mut self, vel: DVec2);

    /// Collision and bucketing extent (floored by the engine)
    fn radius(&self) -> f64;

    /// Current health, if the body has any
    fn health(&self) -> Option<f64> {
        None
    }

    fn motion(&self) -> MotionFlags {
        MotionFlags::default()
    }

    /// Configured top speed from stats (engine falls back to its default)
    fn max_speed(&self) -> Option<f64> {
        None
    }
}

/// Bodies that take part in bot-vs-bot contact resolution
pub trait Collidable: PhysicsBody {
    fn is_alive(&self) -> bool;
}

/// Projectile-only state
pub trait Ballistic: PhysicsBody {
    fn kind(&self) -> ProjectileKind;

    fn damage(&self) -> f64;
    fn set_damage(&mut self, damage: f64);

    fn bounce_count(&self) -> u32;
    fn set_bounce_count(&mut self, count: u32);

    fn is_active(&self) -> bool;
    fn deactivate(&mut self);

    /// Facing angle for trail rendering (output only)
    fn set_heading(&mut self, _angle: f64) {}

    /// Whether walls reflect this projectile instead of consuming it
    fn bounce_eligible(&self) -> bool {
        self.kind().bounces_off_walls() || self.motion().can_bounce
    }
}
