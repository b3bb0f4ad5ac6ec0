//! Concrete entity types
//!
//! Hosts may implement the body traits on their own types; these are the
//! ready-made versions used by the demo binary and tests.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::body::{Ballistic, Collidable, MotionFlags, PhysicsBody, ProjectileKind};

/// Default bot radius
pub const BOT_RADIUS: f64 = 20.0;
/// Default projectile radius
pub const PROJECTILE_RADIUS: f64 = 4.0;

/// A combat bot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bot {
    pub id: u32,
    pub pos: DVec2,
    pub vel: DVec2,
    pub radius: f64,
    pub health: f64,
    #[serde(default)]
    pub flags: MotionFlags,
    /// Top speed from stats
    #[serde(default)]
    pub max_speed: Option<f64>,
}

impl Bot {
    pub fn new(id: u32, pos: DVec2) -> Self {
        Self {
            id,
            pos,
            vel: DVec2::ZERO,
            radius: BOT_RADIUS,
            health: 100.0,
            flags: MotionFlags::default(),
            max_speed: None,
        }
    }

    pub fn with_velocity(mut self, vel: DVec2) -> Self {
        self.vel = vel;
        self
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_health(mut self, health: f64) -> Self {
        self.health = health;
        self
    }
}

impl PhysicsBody for Bot {
    fn id(&self) -> u32 {
        self.id
    }
    fn position(&self) -> DVec2 {
        self.pos
    }
    fn set_position(&mut self, pos: DVec2) {
        self.pos = pos;
    }
    fn velocity(&self) -> DVec2 {
        self.vel
    }
    fn set_velocity(&mut self, vel: DVec2) {
        self.vel = vel;
    }
    fn radius(&self) -> f64 {
        self.radius
    }
    fn health(&self) -> Option<f64> {
        Some(self.health)
    }
    fn motion(&self) -> MotionFlags {
        self.flags
    }
    fn max_speed(&self) -> Option<f64> {
        self.max_speed
    }
}

impl Collidable for Bot {
    fn is_alive(&self) -> bool {
        self.health > 0.0
    }
}

/// A projectile in flight
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    pub kind: ProjectileKind,
    pub pos: DVec2,
    pub vel: DVec2,
    pub radius: f64,
    pub damage: f64,
    pub bounce_count: u32,
    pub active: bool,
    #[serde(default)]
    pub flags: MotionFlags,
    /// Facing angle for trail rendering
    #[serde(skip)]
    pub heading: f64,
}

impl Projectile {
    pub fn new(id: u32, kind: ProjectileKind, pos: DVec2, vel: DVec2, damage: f64) -> Self {
        Self {
            id,
            kind,
            pos,
            vel,
            radius: PROJECTILE_RADIUS,
            damage,
            bounce_count: 0,
            active: true,
            // Projectiles coast: only type drag slows them
            flags: MotionFlags {
                has_friction: false,
                ..MotionFlags::default()
            },
            heading: vel.y.atan2(vel.x),
        }
    }

    pub fn bouncy(mut self) -> Self {
        self.flags.can_bounce = true;
        self
    }
}

impl PhysicsBody for Projectile {
    fn id(&self) -> u32 {
        self.id
    }
    fn position(&self) -> DVec2 {
        self.pos
    }
    fn set_position(&mut self, pos: DVec2) {
        self.pos = pos;
    }
    fn velocity(&self) -> DVec2 {
        self.vel
    }
    fn set_velocity(&mut self, vel: DVec2) {
        self.vel = vel;
    }
    fn radius(&self) -> f64 {
        self.radius
    }
    fn motion(&self) -> MotionFlags {
        self.flags
    }
}

impl Collidable for Projectile {
    fn is_alive(&self) -> bool {
        self.active
    }
}

impl Ballistic for Projectile {
    fn kind(&self) -> ProjectileKind {
        self.kind
    }
    fn damage(&self) -> f64 {
        self.damage
    }
    fn set_damage(&mut self, damage: f64) {
        self.damage = damage;
    }
    fn bounce_count(&self) -> u32 {
        self.bounce_count
    }
    fn set_bounce_count(&mut self, count: u32) {
        self.bounce_count = count;
    }
    fn is_active(&self) -> bool {
        self.active
    }
    fn deactivate(&mut self) {
        self.active = false;
    }
    fn set_heading(&mut self, angle: f64) {
        self.heading = angle;
    }
}

/// Entity container with stable id allocation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct World {
    /// Bots (sorted by id for determinism)
    pub bots: Vec<Bot>,
    /// Projectiles (sorted by id for determinism)
    pub projectiles: Vec<Projectile>,
    #[serde(default)]
    next_id: u32,
}

impl World {
    pub fn new() -> Self {
        Self {
            bots: Vec::new(),
            projectiles: Vec::new(),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        id
    }

    pub fn spawn_bot(&mut self, pos: DVec2) -> &mut Bot {
        let id = self.next_entity_id();
        self.bots.push(Bot::new(id, pos));
        let last = self.bots.len() - 1;
        &mut self.bots[last]
    }

    pub fn spawn_projectile(
        &mut self,
        kind: ProjectileKind,
        pos: DVec2,
        vel: DVec2,
        damage: f64,
    ) -> &mut Projectile {
        let id = self.next_entity_id();
        self.projectiles.push(Projectile::new(id, kind, pos, vel, damage));
        let last = self.projectiles.len() - 1;
        &mut self.projectiles[last]
    }

    /// Drop dead bots and spent projectiles (the engine itself never deletes)
    pub fn retain_live(&mut self) {
        self.bots.retain(|b| b.is_alive());
        self.projectiles.retain(|p| p.active);
    }

    /// Ensure entities are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.bots.sort_by_key(|b| b.id);
        self.projectiles.sort_by_key(|p| p.id);
    }
}
