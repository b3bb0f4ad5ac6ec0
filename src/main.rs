//! Arena Physics headless demo
//!
//! Runs a seeded skirmish through the fixed-timestep driver and prints the
//! final debug snapshot. Usage: `arena-sim [config.json]`

use std::f64::consts::TAU;
use std::process::ExitCode;

use arena_physics::PhysicsConfig;
use arena_physics::sim::{Arena, PhysicsEngine, ProjectileKind, World};
use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Simulated wall-clock frames (variable-rate host at ~50 fps)
const FRAMES: u32 = 600;
const FRAME_MS: f64 = 20.0;
/// Frame on which a grenade goes off in the middle of the arena
const EXPLOSION_FRAME: u32 = 200;

fn spawn_skirmish(world: &mut World, arena: &Arena, seed: u64) {
    let mut rng = Pcg32::seed_from_u64(seed);
    let center = DVec2::new(arena.width / 2.0, arena.height / 2.0);

    for i in 0..16 {
        let angle = i as f64 * TAU / 16.0;
        let dir = DVec2::new(angle.cos(), angle.sin());
        let bot = world.spawn_bot(center + dir * 200.0);
        bot.vel = -dir * rng.random_range(2.0f64..6.0);
        bot.health = rng.random_range(40.0..120.0);
    }

    let kinds = [
        ProjectileKind::Bullet,
        ProjectileKind::Plasma,
        ProjectileKind::Sniper,
        ProjectileKind::Multishot,
        ProjectileKind::Turret,
        ProjectileKind::Grenade,
    ];
    for (i, kind) in kinds.iter().cycle().take(24).enumerate() {
        let pos = DVec2::new(
            rng.random_range(20.0..arena.width - 20.0),
            rng.random_range(20.0..arena.height - 20.0),
        );
        let angle = rng.random_range(0.0..TAU);
        let vel = DVec2::new(angle.cos(), angle.sin()) * rng.random_range(6.0f64..14.0);
        let shot = world.spawn_projectile(*kind, pos, vel, 25.0);
        if i % 5 == 0 {
            shot.flags.can_bounce = true;
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> ExitCode {
    env_logger::init();
    log::info!("Arena Physics demo starting...");

    let config = match std::env::args().nth(1) {
        Some(path) => match PhysicsConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("Could not load {path}: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => PhysicsConfig::default(),
    };

    let arena = Arena::new(1024.0, 768.0);
    let mut world = World::new();
    spawn_skirmish(&mut world, &arena, config.rng_seed);
    world.normalize_order();
    let mut engine = PhysicsEngine::new(config);

    let mut steps = 0u32;
    for frame in 0..FRAMES {
        steps += engine.run_frame(&mut world.bots, &mut world.projectiles, FRAME_MS, &arena);

        if frame == EXPLOSION_FRAME {
            let center = DVec2::new(arena.width / 2.0, arena.height / 2.0);
            let pushed = engine.apply_explosion_force(center, 30.0, 250.0, &mut world.bots);
            log::info!("Explosion pushed {pushed} bots");
        }

        if frame % 100 == 0 {
            let live_shots = world.projectiles.iter().filter(|p| p.active).count();
            log::info!(
                "frame {frame}: {steps} steps, {live_shots} projectiles in flight, {} contacts",
                engine.last_stats().contacts
            );
        }
        world.retain_live();
    }

    match serde_json::to_string_pretty(&engine.get_debug_info()) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("Failed to serialize debug info: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The engine is a library on the web; the host drives it directly
}
