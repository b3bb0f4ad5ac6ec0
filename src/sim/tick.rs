//! Fixed timestep frame driver
//!
//! One `step` = clear the grid, integrate and index every live bot, advance
//! and index every active projectile, then resolve bot contacts once.
//! Integration of all bodies finishes before any contact is resolved.

use glam::DVec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::ballistics::update_projectile;
use super::body::{Arena, Ballistic, Collidable, PhysicsBody};
use super::collision::{CollisionResolver, ResolveStats};
use super::forces;
use super::grid::{BodyRef, SpatialGrid};
use super::integrate::integrate;
use crate::settings::PhysicsConfig;

/// Accumulator that turns variable frame times into fixed steps
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    step_ms: f64,
    max_substeps: u32,
    max_frame_ms: f64,
    accumulator: f64,
}

impl FixedTimestep {
    pub fn new(step_ms: f64, max_substeps: u32, max_frame_ms: f64) -> Self {
        Self {
            step_ms,
            max_substeps: max_substeps.max(1),
            max_frame_ms,
            accumulator: 0.0,
        }
    }

    pub fn from_config(config: &PhysicsConfig) -> Self {
        Self::new(config.fixed_dt_ms, config.max_substeps, config.max_frame_ms)
    }

    pub fn step_ms(&self) -> f64 {
        self.step_ms
    }

    /// Feed one frame's elapsed time; returns how many fixed steps to run
    ///
    /// Time beyond `max_substeps` worth of steps is dropped to prevent a
    /// spiral of death.
    pub fn advance(&mut self, frame_ms: f64) -> u32 {
        if self.step_ms.is_nan() || self.step_ms <= 0.0 {
            return 0;
        }
        let frame_ms = if frame_ms.is_finite() {
            frame_ms.clamp(0.0, self.max_frame_ms)
        } else {
            0.0
        };
        self.accumulator += frame_ms;

        let mut steps = 0;
        while self.accumulator >= self.step_ms && steps < self.max_substeps {
            self.accumulator -= self.step_ms;
            steps += 1;
        }
        if steps == self.max_substeps && self.accumulator >= self.step_ms {
            log::debug!("Dropping {:.2}ms of backlog", self.accumulator);
            self.accumulator %= self.step_ms;
        }
        steps
    }

    /// Fraction of a step left in the accumulator (for render interpolation)
    pub fn alpha(&self) -> f64 {
        if self.step_ms > 0.0 {
            self.accumulator / self.step_ms
        } else {
            0.0
        }
    }
}

/// Read-only diagnostics for debug overlays
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugInfo {
    pub grid_cols: i32,
    pub grid_rows: i32,
    pub cell_size: f64,
    pub occupied_cells: usize,
    pub indexed_bodies: usize,
    pub pairs_checked: usize,
    pub contacts: usize,
    pub frame: u64,
    pub gravity: f64,
    pub drag: f64,
    pub friction: f64,
    pub bot_restitution: f64,
    pub collision_damping: f64,
    pub wall_restitution: f64,
    pub velocity_scale: f64,
    pub fixed_dt_ms: f64,
}

/// Frame-level physics driver
#[derive(Debug, Clone)]
pub struct PhysicsEngine {
    config: PhysicsConfig,
    grid: SpatialGrid,
    resolver: CollisionResolver,
    timestep: FixedTimestep,
    rng: Pcg32,
    frame: u64,
}

impl PhysicsEngine {
    /// Build an engine, replacing a config that fails validation with the
    /// defaults
    pub fn new(config: PhysicsConfig) -> Self {
        let config = match config.validate() {
            Ok(()) => config,
            Err(e) => {
                log::warn!("Rejected physics config ({e}), using defaults");
                PhysicsConfig::default()
            }
        };
        log::info!(
            "Physics engine ready: cell={} dt={:.3}ms seed={}",
            config.cell_size,
            config.fixed_dt_ms,
            config.rng_seed
        );
        Self {
            grid: SpatialGrid::new(config.cell_size).with_min_radius(config.min_radius),
            resolver: CollisionResolver::new(),
            timestep: FixedTimestep::from_config(&config),
            rng: Pcg32::seed_from_u64(config.rng_seed),
            frame: 0,
            config,
        }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Advance every body by one fixed step
    pub fn step<B, P>(&mut self, bots: &mut [B], projectiles: &mut [P], dt_ms: f64, arena: &Arena)
    where
        B: Collidable,
        P: Ballistic,
    {
        self.frame += 1;
        self.grid.clear(arena.width, arena.height);
        self.resolver.begin_frame();

        for (i, bot) in bots.iter_mut().enumerate() {
            if !bot.is_alive() {
                continue;
            }
            integrate(bot, dt_ms, arena, &self.config);
            self.grid.insert(BodyRef::Bot(i), &*bot);
        }

        let mut expired = 0usize;
        for (i, projectile) in projectiles.iter_mut().enumerate() {
            if !projectile.is_active() {
                continue;
            }
            if update_projectile(projectile, dt_ms, arena, &self.config).expired {
                expired += 1;
                continue;
            }
            self.grid.insert(BodyRef::Projectile(i), &*projectile);
        }

        let stats = self
            .resolver
            .resolve_bots(bots, &self.grid, &self.config, &mut self.rng);

        log::trace!(
            "frame {}: {} indexed, {} contacts, {} projectiles expired",
            self.frame,
            self.grid.len(),
            stats.contacts,
            expired
        );
    }

    /// Feed a variable frame time and run as many fixed steps as it covers
    pub fn run_frame<B, P>(
        &mut self,
        bots: &mut [B],
        projectiles: &mut [P],
        frame_ms: f64,
        arena: &Arena,
    ) -> u32
    where
        B: Collidable,
        P: Ballistic,
    {
        let steps = self.timestep.advance(frame_ms);
        let dt_ms = self.timestep.step_ms();
        for _ in 0..steps {
            self.step(bots, projectiles, dt_ms, arena);
        }
        steps
    }

    /// Render interpolation fraction left over from the last `run_frame`
    pub fn alpha(&self) -> f64 {
        self.timestep.alpha()
    }

    /// Continuous force over one step, capped at the body's top speed
    pub fn apply_force<B: PhysicsBody + ?Sized>(&self, body: &mut B, force: DVec2, dt_ms: f64) {
        forces::apply_force(body, force, dt_ms, &self.config);
    }

    /// Instantaneous, uncapped velocity change
    pub fn apply_impulse<B: PhysicsBody + ?Sized>(&self, body: &mut B, impulse: DVec2) {
        forces::apply_impulse(body, impulse, &self.config);
    }

    /// Radial knockback with quadratic falloff; returns bodies pushed
    pub fn apply_explosion_force<B: PhysicsBody>(
        &self,
        center: DVec2,
        force: f64,
        radius: f64,
        bodies: &mut [B],
    ) -> usize {
        forces::apply_explosion_force(center, force, radius, bodies, &self.config)
    }

    /// Contact statistics from the most recent step
    pub fn last_stats(&self) -> ResolveStats {
        self.resolver.stats()
    }

    pub fn get_debug_info(&self) -> DebugInfo {
        let (grid_cols, grid_rows) = self.grid.dimensions();
        let stats = self.resolver.stats();
        DebugInfo {
            grid_cols,
            grid_rows,
            cell_size: self.grid.cell_size(),
            occupied_cells: self.grid.occupied_cells(),
            indexed_bodies: self.grid.len(),
            pairs_checked: stats.pairs_checked,
            contacts: stats.contacts,
            frame: self.frame,
            gravity: self.config.gravity,
            drag: self.config.drag,
            friction: self.config.friction,
            bot_restitution: self.config.bot_restitution,
            collision_damping: self.config.collision_damping,
            wall_restitution: self.config.wall_restitution,
            velocity_scale: self.config.velocity_scale,
            fixed_dt_ms: self.config.fixed_dt_ms,
        }
    }
}

impl Default for PhysicsEngine {
    fn default() -> Self {
        Self::new(PhysicsConfig::default())
    }
}
