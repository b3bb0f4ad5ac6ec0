//! Circle contact detection and response
//!
//! Bot pairs come from the spatial grid, are keyed by (min id, max id) so each
//! pair is handled once per frame, then get positional correction weighted by
//! mass followed by a restitution impulse.

use std::collections::HashSet;
use std::f64::consts::TAU;

use glam::DVec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::body::{Collidable, PhysicsBody, derived_mass};
use super::grid::{BodyRef, SpatialGrid};
use crate::settings::PhysicsConfig;
use crate::{finite_or_zero, unit_from_angle};

/// Result of a circle-circle check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether the circles overlap
    pub hit: bool,
    /// Contact point on the surface of the first circle
    pub point: DVec2,
    /// Unit normal pointing from the first circle toward the second
    pub normal: DVec2,
    /// Overlap depth
    pub penetration: f64,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            point: DVec2::ZERO,
            normal: DVec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Exact overlap test between two bodies (`distance < r1 + r2`)
///
/// Exposed for the combat layer's projectile hit checks. Coincident centers
/// report a hit with a zero normal.
pub fn circle_collision<A, B>(a: &A, b: &B) -> CollisionResult
where
    A: PhysicsBody + ?Sized,
    B: PhysicsBody + ?Sized,
{
    let delta = b.position() - a.position();
    let dist = delta.length();
    let reach = a.radius().max(0.0) + b.radius().max(0.0);

    if !dist.is_finite() || dist >= reach {
        return CollisionResult::miss();
    }

    let normal = if dist > 0.0 {
        finite_or_zero(delta / dist)
    } else {
        DVec2::ZERO
    };
    CollisionResult {
        hit: true,
        point: a.position() + normal * a.radius(),
        normal,
        penetration: reach - dist,
    }
}

/// Shortcut for [`circle_collision`] when only the verdict matters
#[inline]
pub fn circles_overlap<A, B>(a: &A, b: &B) -> bool
where
    A: PhysicsBody + ?Sized,
    B: PhysicsBody + ?Sized,
{
    let reach = a.radius().max(0.0) + b.radius().max(0.0);
    a.position().distance_squared(b.position()) < reach * reach
}

/// How a single pair was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contact {
    /// Not touching
    Apart,
    /// Coincident centers, pushed apart along a random direction
    Degenerate,
    /// Overlap corrected, but already moving apart so no impulse
    Separating,
    /// Overlap corrected and impulse applied
    Impulse,
}

/// Canonical key for an unordered pair of ids
#[inline]
pub fn pair_key(a: u32, b: u32) -> (u32, u32) {
    (a.min(b), a.max(b))
}

/// Two distinct mutable elements of one slice
fn pair_mut<T>(items: &mut [T], i: usize, j: usize) -> (&mut T, &mut T) {
    debug_assert!(i < j);
    let (head, tail) = items.split_at_mut(j);
    (&mut head[i], &mut tail[0])
}

/// Per-frame statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveStats {
    pub pairs_checked: usize,
    pub contacts: usize,
    pub impulses: usize,
    pub degenerate: usize,
}

/// Bot-vs-bot contact resolution
#[derive(Debug, Clone, Default)]
pub struct CollisionResolver {
    resolved: HashSet<(u32, u32)>,
    stats: ResolveStats,
}

impl CollisionResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget pairs handled in the previous frame
    pub fn begin_frame(&mut self) {
        self.resolved.clear();
        self.stats = ResolveStats::default();
    }

    /// Statistics accumulated since [`begin_frame`](Self::begin_frame)
    pub fn stats(&self) -> ResolveStats {
        self.stats
    }

    /// Resolve every overlapping live bot pair the grid reports
    ///
    /// Pairs already handled this frame are skipped, so calling this twice
    /// within one frame never applies a second impulse.
    pub fn resolve_bots<B: Collidable>(
        &mut self,
        bots: &mut [B],
        grid: &SpatialGrid,
        config: &PhysicsConfig,
        rng: &mut Pcg32,
    ) -> ResolveStats {
        for i in 0..bots.len() {
            if !bots[i].is_alive() {
                continue;
            }
            for other in grid.query_neighbors(BodyRef::Bot(i)) {
                let BodyRef::Bot(j) = other else {
                    continue;
                };
                if j == i || j >= bots.len() || !bots[j].is_alive() {
                    continue;
                }
                if !self.resolved.insert(pair_key(bots[i].id(), bots[j].id())) {
                    continue;
                }
                self.stats.pairs_checked += 1;

                let (a, b) = pair_mut(bots, i.min(j), i.max(j));
                match resolve_pair(a, b, config, rng) {
                    Contact::Apart => {}
                    Contact::Degenerate => {
                        self.stats.contacts += 1;
                        self.stats.degenerate += 1;
                    }
                    Contact::Separating => self.stats.contacts += 1,
                    Contact::Impulse => {
                        self.stats.contacts += 1;
                        self.stats.impulses += 1;
                    }
                }
            }
        }

        log::trace!(
            "collision pass: {} pairs, {} contacts, {} impulses",
            self.stats.pairs_checked,
            self.stats.contacts,
            self.stats.impulses
        );
        self.stats
    }
}

/// Resolve one pair: depenetrate, then exchange momentum along the normal
pub fn resolve_pair<A, B>(
    a: &mut A,
    b: &mut B,
    config: &PhysicsConfig,
    rng: &mut Pcg32,
) -> Contact
where
    A: PhysicsBody + ?Sized,
    B: PhysicsBody + ?Sized,
{
    let ra = a.radius().max(config.min_radius);
    let rb = b.radius().max(config.min_radius);
    let reach = ra + rb;

    let delta = b.position() - a.position();
    let dist = delta.length();
    if !dist.is_finite() || dist >= reach {
        return Contact::Apart;
    }

    let normal = if dist > 0.0 {
        delta / dist
    } else {
        DVec2::ZERO
    };
    if normal == DVec2::ZERO || !normal.is_finite() {
        let dir = unit_from_angle(rng.random_range(0.0..TAU));
        log::debug!("Bodies {} and {} coincide, splitting apart", a.id(), b.id());
        let half = reach / 2.0;
        a.set_position(a.position() - dir * half);
        b.set_position(b.position() + dir * half);
        return Contact::Degenerate;
    }

    let ma = derived_mass(a.health(), ra, config.min_mass);
    let mb = derived_mass(b.health(), rb, config.min_mass);
    let total = ma + mb;

    // Heavier body moves less
    let overlap = reach - dist;
    a.set_position(a.position() - normal * (overlap * mb / total));
    b.set_position(b.position() + normal * (overlap * ma / total));

    let va = a.velocity();
    let vb = b.velocity();
    let dvn = (vb - va).dot(normal);
    if dvn > 0.0 {
        return Contact::Separating;
    }

    let j = -(1.0 + config.bot_restitution) * dvn / (1.0 / ma + 1.0 / mb);
    let damping = config.collision_damping;
    let new_va = (va - normal * (j / ma)) * damping;
    let new_vb = (vb + normal * (j / mb)) * damping;
    if !new_va.is_finite() || !new_vb.is_finite() {
        log::warn!("Impulse between bodies {} and {} went non-finite, zeroing", a.id(), b.id());
    }
    a.set_velocity(finite_or_zero(new_va));
    b.set_velocity(finite_or_zero(new_vb));
    Contact::Impulse
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::body::ProjectileKind;
    use crate::sim::state::{Bot, Projectile};
    use rand::SeedableRng;

    fn rng() -> Pcg32 {
        Pcg32::seed_from_u64(7)
    }

    fn grid_for(bots: &[Bot]) -> SpatialGrid {
        let mut grid = SpatialGrid::new(64.0);
        grid.clear(800.0, 600.0);
        for (i, bot) in bots.iter().enumerate() {
            grid.insert(BodyRef::Bot(i), bot);
        }
        grid
    }

    #[test]
    fn test_circle_collision() {
        let a = Bot::new(1, DVec2::new(100.0, 100.0));
        let b = Bot::new(2, DVec2::new(130.0, 100.0));
        let result = circle_collision(&a, &b);
        assert!(result.hit);
        assert!((result.penetration - 10.0).abs() < 1e-9);
        assert_eq!(result.normal, DVec2::X);
        assert_eq!(result.point, DVec2::new(120.0, 100.0));

        let far = Bot::new(3, DVec2::new(140.0, 100.0));
        assert!(!circle_collision(&a, &far).hit, "touching is not overlapping");
        assert!(!circles_overlap(&a, &far));
        assert!(circles_overlap(&a, &b));
    }

    #[test]
    fn test_projectile_vs_bot_primitive() {
        let bot = Bot::new(1, DVec2::new(100.0, 100.0));
        let pos = DVec2::new(122.0, 100.0);
        let shot = Projectile::new(2, ProjectileKind::Bullet, pos, DVec2::X, 10.0);
        assert!(circle_collision(&shot, &bot).hit);
    }

    #[test]
    fn test_head_on_equal_mass() {
        let config = PhysicsConfig::default();
        let mut a = Bot::new(1, DVec2::new(100.0, 100.0)).with_velocity(DVec2::new(5.0, 0.0));
        let mut b = Bot::new(2, DVec2::new(130.0, 100.0)).with_velocity(DVec2::new(-5.0, 0.0));

        let contact = resolve_pair(&mut a, &mut b, &config, &mut rng());
        assert_eq!(contact, Contact::Impulse);

        // Equal masses share the 10 unit overlap
        assert!((a.pos.x - 95.0).abs() < 1e-9);
        assert!((b.pos.x - 135.0).abs() < 1e-9);

        // (1 + e) exchange leaves each at e * 5 reversed, then damped: 5 * 0.6 * 0.8
        assert!((a.vel.x + 2.4).abs() < 1e-9);
        assert!((b.vel.x - 2.4).abs() < 1e-9);
        assert_eq!(a.vel.y, 0.0);
        let ratio = b.vel.length() / 5.0;
        assert!((ratio - 0.48).abs() < 1e-9);
    }

    #[test]
    fn test_heavier_body_moves_less() {
        let config = PhysicsConfig::default();
        let mut heavy = Bot::new(1, DVec2::new(100.0, 100.0)).with_radius(40.0);
        let mut light = Bot::new(2, DVec2::new(150.0, 100.0));
        // Masses 2 and 1, overlap 10
        resolve_pair(&mut heavy, &mut light, &config, &mut rng());
        assert!((heavy.pos.x - (100.0 - 10.0 / 3.0)).abs() < 1e-9);
        assert!((light.pos.x - (150.0 + 20.0 / 3.0)).abs() < 1e-9);
        assert!((light.pos.x - heavy.pos.x - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_separating_pair_gets_no_impulse() {
        let config = PhysicsConfig::default();
        let mut a = Bot::new(1, DVec2::new(100.0, 100.0)).with_velocity(DVec2::new(-3.0, 0.0));
        let mut b = Bot::new(2, DVec2::new(130.0, 100.0)).with_velocity(DVec2::new(3.0, 0.0));
        let contact = resolve_pair(&mut a, &mut b, &config, &mut rng());
        assert_eq!(contact, Contact::Separating);
        assert_eq!(a.vel, DVec2::new(-3.0, 0.0));
        assert_eq!(b.vel, DVec2::new(3.0, 0.0));
        assert!((b.pos.x - a.pos.x - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_overlap_separates_exactly() {
        let config = PhysicsConfig::default();
        let mut a = Bot::new(1, DVec2::new(300.0, 300.0)).with_velocity(DVec2::new(1.0, 1.0));
        let mut b = Bot::new(2, DVec2::new(300.0, 300.0)).with_radius(10.0);
        let contact = resolve_pair(&mut a, &mut b, &config, &mut rng());
        assert_eq!(contact, Contact::Degenerate);
        assert!((a.pos.distance(b.pos) - 30.0).abs() < 1e-9);
        assert!(a.vel.is_finite() && b.vel.is_finite());
        // Impulse math skipped
        assert_eq!(a.vel, DVec2::new(1.0, 1.0));
        assert_eq!(b.vel, DVec2::ZERO);
    }

    #[test]
    fn test_degenerate_direction_is_seeded() {
        let config = PhysicsConfig::default();
        let run = || {
            let mut a = Bot::new(1, DVec2::new(300.0, 300.0));
            let mut b = Bot::new(2, DVec2::new(300.0, 300.0));
            resolve_pair(&mut a, &mut b, &config, &mut rng());
            (a.pos, b.pos)
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_dead_bodies_floor_mass() {
        let config = PhysicsConfig::default();
        let mut dead = Bot::new(1, DVec2::new(100.0, 100.0))
            .with_health(0.0)
            .with_velocity(DVec2::X);
        let mut b = Bot::new(2, DVec2::new(130.0, 100.0));
        resolve_pair(&mut dead, &mut b, &config, &mut rng());
        assert!(dead.pos.is_finite() && dead.vel.is_finite());
        assert!(b.vel.is_finite());
    }

    #[test]
    fn test_resolver_handles_each_pair_once() {
        let config = PhysicsConfig::default();
        // Both bots straddle the same four cells
        let mut bots = vec![
            Bot::new(1, DVec2::new(60.0, 64.0)).with_velocity(DVec2::new(4.0, 0.0)),
            Bot::new(2, DVec2::new(90.0, 64.0)).with_velocity(DVec2::new(-4.0, 0.0)),
        ];
        let grid = grid_for(&bots);
        let mut resolver = CollisionResolver::new();
        resolver.begin_frame();
        let stats = resolver.resolve_bots(&mut bots, &grid, &config, &mut rng());
        assert_eq!(stats.pairs_checked, 1);
        assert_eq!(stats.impulses, 1);

        let after_first = (bots[0].vel, bots[1].vel);
        let stats = resolver.resolve_bots(&mut bots, &grid, &config, &mut rng());
        assert_eq!(stats.impulses, 1, "no second impulse within the frame");
        assert_eq!((bots[0].vel, bots[1].vel), after_first);
    }

    #[test]
    fn test_resolver_skips_dead_and_distant() {
        let config = PhysicsConfig::default();
        let mut bots = vec![
            Bot::new(1, DVec2::new(100.0, 100.0)),
            Bot::new(2, DVec2::new(110.0, 100.0)).with_health(0.0),
            Bot::new(3, DVec2::new(145.0, 100.0)),
        ];
        let grid = grid_for(&bots);
        let mut resolver = CollisionResolver::new();
        resolver.begin_frame();
        let stats = resolver.resolve_bots(&mut bots, &grid, &config, &mut rng());
        // Live pair (1, 3) shares cells but is 45 apart
        assert_eq!(stats.pairs_checked, 1);
        assert_eq!(stats.contacts, 0);
        assert_eq!(bots[1].pos, DVec2::new(110.0, 100.0));
    }

    #[test]
    fn test_non_finite_impulse_is_scrubbed() {
        let config = PhysicsConfig::default();
        let huge = DVec2::new(f64::MAX, 0.0);
        let mut a = Bot::new(1, DVec2::new(100.0, 100.0)).with_velocity(huge);
        let mut b = Bot::new(2, DVec2::new(130.0, 100.0)).with_velocity(-huge);
        let contact = resolve_pair(&mut a, &mut b, &config, &mut rng());
        assert_eq!(contact, Contact::Impulse);
        assert!(a.vel.is_finite() && b.vel.is_finite());
        assert!(a.pos.is_finite() && b.pos.is_finite());
    }

    #[test]
    fn test_pair_key_is_symmetric() {
        assert_eq!(pair_key(9, 3), pair_key(3, 9));
        assert_eq!(pair_key(3, 9), (3, 9));
    }
}
