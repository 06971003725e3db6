//! Circle collision between bullets, enemies and the player
//!
//! Every shape collides as a circle derived from its bounding box. The pass
//! runs once per frame after movement, in three phases:
//!
//! 1. player bullets against enemies
//! 2. enemy bullets against the player
//! 3. the player against enemy bodies
//!
//! Cheap rejections (off-screen culling and a Manhattan pre-filter) run
//! before the exact test, and exact tests are capped per frame. Pairs past
//! the cap are deferred to the next frame.

use std::f32::consts::SQRT_2;

use glam::Vec2;

use super::bullet::BulletManager;
use super::enemy::{Enemy, EnemyManager, EnemyTier};
use super::enemy_bullet::EnemyBulletManager;
use super::player::Player;
use super::pool::Handle;
use crate::Bounds;
use crate::tuning::CollisionTuning;

/// A collision circle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hitbox {
    pub center: Vec2,
    pub radius: f32,
}

impl Hitbox {
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Circle inscribed in a box, shrunk by `divisor`
    pub fn from_box(center: Vec2, size: Vec2, divisor: f32) -> Self {
        Self {
            center,
            radius: size.min_element() / divisor,
        }
    }
}

/// Exact circle test on squared distances
#[inline]
pub fn circle_overlap(a: Hitbox, b: Hitbox) -> bool {
    let reach = a.radius + b.radius;
    a.center.distance_squared(b.center) < reach * reach
}

/// True if the pair is certainly apart
///
/// Manhattan distance is at most √2 times the Euclidean distance, so
/// anything overlapping always passes.
#[inline]
pub fn rough_reject(a: Hitbox, b: Hitbox) -> bool {
    let d = (a.center - b.center).abs();
    d.x + d.y > SQRT_2 * (a.radius + b.radius)
}

/// Geometry of the most recent hit, for the debug overlay
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactSample {
    pub point_a: Vec2,
    pub point_b: Vec2,
    pub distance_sq: f32,
    pub combined_radius: f32,
}

impl ContactSample {
    fn between(a: Hitbox, b: Hitbox) -> Self {
        Self {
            point_a: a.center,
            point_b: b.center,
            distance_sq: a.center.distance_squared(b.center),
            combined_radius: a.radius + b.radius,
        }
    }

    pub fn distance(&self) -> f32 {
        self.distance_sq.sqrt()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollisionStats {
    /// Exact circle tests performed
    pub checks: u64,
    pub collisions: u64,
    /// Pairs rejected by the Manhattan pre-filter
    pub prefiltered: u64,
    /// Bullets removed for being off-screen, untested
    pub culled: u64,
    /// Pairs skipped once the per-frame budget ran out
    pub deferred: u64,
}

impl CollisionStats {
    fn accumulate(&mut self, frame: &CollisionStats) {
        self.checks += frame.checks;
        self.collisions += frame.collisions;
        self.prefiltered += frame.prefiltered;
        self.culled += frame.culled;
        self.deferred += frame.deferred;
    }
}

/// Receives visual side effects of collisions
pub trait EffectSink {
    fn explosion(&mut self, pos: Vec2);
    fn damage(&mut self, pos: Vec2);
    fn particle_burst(&mut self, pos: Vec2);
}

/// Receives experience for destroyed enemies
pub trait ExperienceSink {
    fn award(&mut self, tier: EnemyTier);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DestroyedEnemy {
    pub tier: EnemyTier,
    pub pos: Vec2,
}

/// Outcome of one collision pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollisionReport {
    pub player_hits: u32,
    pub player_died: bool,
    pub destroyed: Vec<DestroyedEnemy>,
    pub bullets_removed: u32,
    pub enemy_bullets_removed: u32,
}

/// Everything a collision pass reads or mutates
pub struct Participants<'a> {
    pub player: &'a mut Player,
    pub bullets: &'a mut BulletManager,
    pub enemies: &'a mut EnemyManager,
    pub enemy_bullets: &'a mut EnemyBulletManager,
    pub bounds: Bounds,
}

#[derive(Debug, Clone)]
pub struct CollisionEngine {
    tuning: CollisionTuning,
    /// Player-bullet off-screen margin
    bullet_margin: f32,
    frame: CollisionStats,
    total: CollisionStats,
    budget_warned: bool,
    /// Record a [`ContactSample`] for every hit
    pub debug: bool,
    last_contact: Option<ContactSample>,
    // Reused per frame
    bullet_removals: Vec<Handle>,
    enemy_removals: Vec<Handle>,
    enemy_bullet_removals: Vec<Handle>,
}

impl CollisionEngine {
    pub fn new(tuning: &CollisionTuning, bullet_margin: f32) -> Self {
        Self {
            tuning: tuning.clone(),
            bullet_margin,
            frame: CollisionStats::default(),
            total: CollisionStats::default(),
            budget_warned: false,
            debug: false,
            last_contact: None,
            bullet_removals: Vec::new(),
            enemy_removals: Vec::new(),
            enemy_bullet_removals: Vec::new(),
        }
    }

    pub fn frame_stats(&self) -> CollisionStats {
        self.frame
    }

    pub fn total_stats(&self) -> CollisionStats {
        self.total
    }

    pub fn last_contact(&self) -> Option<ContactSample> {
        self.last_contact
    }

    pub fn enemy_hitbox(&self, enemy: &Enemy) -> Hitbox {
        let divisor = match enemy.tier {
            EnemyTier::Small => self.tuning.small_divisor,
            EnemyTier::Medium => self.tuning.medium_divisor,
            EnemyTier::Large => self.tuning.large_divisor,
        };
        Hitbox::from_box(enemy.pos, enemy.size, divisor)
    }

    pub fn player_hitbox(&self, player: &Player) -> Hitbox {
        Hitbox::new(player.pos, player.hitbox_radius)
    }

    /// Pre-filter and budget gate, then the exact test
    fn test_pair(&mut self, a: Hitbox, b: Hitbox) -> bool {
        if self.tuning.rough_filter && rough_reject(a, b) {
            self.frame.prefiltered += 1;
            return false;
        }
        if self.frame.checks >= u64::from(self.tuning.max_checks_per_frame) {
            self.frame.deferred += 1;
            if !self.budget_warned {
                self.budget_warned = true;
                log::warn!(
                    "Collision budget of {} checks exhausted, deferring pairs",
                    self.tuning.max_checks_per_frame
                );
            }
            return false;
        }

        self.frame.checks += 1;
        if !circle_overlap(a, b) {
            return false;
        }
        self.frame.collisions += 1;
        if self.debug {
            self.last_contact = Some(ContactSample::between(a, b));
        }
        true
    }

    fn on_screen(&self, bounds: Bounds, pos: Vec2, margin: f32) -> bool {
        !self.tuning.screen_culling || bounds.contains(pos, margin)
    }

    /// Run all three phases and apply their side effects
    pub fn process(
        &mut self,
        world: Participants<'_>,
        effects: &mut dyn EffectSink,
        experience: &mut dyn ExperienceSink,
    ) -> CollisionReport {
        self.frame = CollisionStats::default();
        self.budget_warned = false;
        self.bullet_removals.clear();
        self.enemy_removals.clear();
        self.enemy_bullet_removals.clear();

        let Participants {
            player,
            bullets,
            enemies,
            enemy_bullets,
            bounds,
        } = world;
        let mut report = CollisionReport::default();

        self.bullets_vs_enemies(bullets, enemies, bounds, effects, experience, &mut report);

        if player.is_vulnerable() {
            self.enemy_bullets_vs_player(player, enemy_bullets, bounds, effects, &mut report);
        }
        if player.is_vulnerable() {
            self.player_vs_enemies(player, enemies, bounds, effects, experience, &mut report);
        }

        for &handle in &self.bullet_removals {
            if bullets.release(handle) {
                report.bullets_removed += 1;
            }
        }
        for &handle in &self.enemy_bullet_removals {
            if enemy_bullets.release(handle) {
                report.enemy_bullets_removed += 1;
            }
        }
        for &handle in &self.enemy_removals {
            enemies.release(handle);
        }

        self.total.accumulate(&self.frame);
        report
    }

    fn bullets_vs_enemies(
        &mut self,
        bullets: &BulletManager,
        enemies: &mut EnemyManager,
        bounds: Bounds,
        effects: &mut dyn EffectSink,
        experience: &mut dyn ExperienceSink,
        report: &mut CollisionReport,
    ) {
        let divisor = self.tuning.player_bullet_divisor;

        'bullets: for &bullet_handle in bullets.pool().active_handles() {
            let Some(bullet) = bullets.pool().get(bullet_handle) else {
                continue;
            };
            if !bullet.active {
                continue;
            }
            if !self.on_screen(bounds, bullet.pos, self.bullet_margin) {
                self.frame.culled += 1;
                self.bullet_removals.push(bullet_handle);
                continue;
            }
            let shot = Hitbox::from_box(bullet.pos, bullet.size, divisor);

            for i in 0..enemies.active_len() {
                let enemy_handle = enemies.active_handles()[i];
                let Some(enemy) = enemies.get(enemy_handle) else {
                    continue;
                };
                // Destroyed earlier this pass
                if !enemy.active {
                    continue;
                }
                if !self.on_screen(bounds, enemy.pos, enemy.size.max_element()) {
                    continue;
                }
                let body = self.enemy_hitbox(enemy);
                if !self.test_pair(shot, body) {
                    continue;
                }

                self.bullet_removals.push(bullet_handle);
                let Some(enemy) = enemies.get_mut(enemy_handle) else {
                    continue 'bullets;
                };
                if enemy.take_damage(bullet.damage) {
                    let destroyed = DestroyedEnemy {
                        tier: enemy.tier,
                        pos: enemy.pos,
                    };
                    effects.explosion(destroyed.pos);
                    experience.award(destroyed.tier);
                    report.destroyed.push(destroyed);
                    self.enemy_removals.push(enemy_handle);
                    log::debug!("{:?} enemy destroyed", destroyed.tier);
                } else {
                    effects.damage(enemy.pos);
                }
                continue 'bullets;
            }
        }
    }

    fn enemy_bullets_vs_player(
        &mut self,
        player: &mut Player,
        enemy_bullets: &EnemyBulletManager,
        bounds: Bounds,
        effects: &mut dyn EffectSink,
        report: &mut CollisionReport,
    ) {
        let divisor = self.tuning.enemy_bullet_divisor;
        let ship = self.player_hitbox(player);

        for &handle in enemy_bullets.pool().active_handles() {
            let Some(bullet) = enemy_bullets.pool().get(handle) else {
                continue;
            };
            if !bullet.active {
                continue;
            }
            if !self.on_screen(bounds, bullet.pos, bullet.size.max_element()) {
                self.frame.culled += 1;
                self.enemy_bullet_removals.push(handle);
                continue;
            }
            let shot = Hitbox::from_box(bullet.pos, bullet.size, divisor);
            if !self.test_pair(shot, ship) {
                continue;
            }

            self.enemy_bullet_removals.push(handle);
            self.hit_player(player, effects, report);
            break;
        }
    }

    fn player_vs_enemies(
        &mut self,
        player: &mut Player,
        enemies: &mut EnemyManager,
        bounds: Bounds,
        effects: &mut dyn EffectSink,
        experience: &mut dyn ExperienceSink,
        report: &mut CollisionReport,
    ) {
        let ship = self.player_hitbox(player);

        for i in 0..enemies.active_len() {
            let handle = enemies.active_handles()[i];
            let Some(enemy) = enemies.get(handle) else {
                continue;
            };
            if !enemy.active || !self.on_screen(bounds, enemy.pos, enemy.size.max_element()) {
                continue;
            }
            let body = self.enemy_hitbox(enemy);
            if !self.test_pair(ship, body) {
                continue;
            }

            self.hit_player(player, effects, report);
            let Some(enemy) = enemies.get_mut(handle) else {
                break;
            };
            // Small enemies are rammed apart; bigger ones shrug it off
            if enemy.tier == EnemyTier::Small {
                let hp = enemy.hp;
                if enemy.take_damage(hp) {
                    let destroyed = DestroyedEnemy {
                        tier: enemy.tier,
                        pos: enemy.pos,
                    };
                    effects.explosion(destroyed.pos);
                    experience.award(destroyed.tier);
                    report.destroyed.push(destroyed);
                    self.enemy_removals.push(handle);
                }
            } else {
                effects.damage(enemy.pos);
            }
            break;
        }
    }

    fn hit_player(
        &mut self,
        player: &mut Player,
        effects: &mut dyn EffectSink,
        report: &mut CollisionReport,
    ) {
        report.player_hits += 1;
        if player.take_damage() {
            report.player_died = true;
            effects.explosion(player.pos);
            effects.particle_burst(player.pos);
        } else {
            effects.damage(player.pos);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::{BulletTuning, EnemyBulletTuning, EnemyTuning, PlayerTuning};

    #[derive(Default)]
    struct Recorder {
        explosions: Vec<Vec2>,
        damage: Vec<Vec2>,
        bursts: usize,
        awards: Vec<EnemyTier>,
    }

    impl EffectSink for Recorder {
        fn explosion(&mut self, pos: Vec2) {
            self.explosions.push(pos);
        }
        fn damage(&mut self, pos: Vec2) {
            self.damage.push(pos);
        }
        fn particle_burst(&mut self, _pos: Vec2) {
            self.bursts += 1;
        }
    }

    impl ExperienceSink for Recorder {
        fn award(&mut self, tier: EnemyTier) {
            self.awards.push(tier);
        }
    }

    struct World {
        engine: CollisionEngine,
        player: Player,
        bullets: BulletManager,
        enemies: EnemyManager,
        enemy_bullets: EnemyBulletManager,
        bounds: Bounds,
    }

    impl World {
        fn new(tuning: CollisionTuning) -> Self {
            let bounds = Bounds::default();
            Self {
                engine: CollisionEngine::new(&tuning, 20.0),
                player: Player::new(&PlayerTuning::default(), bounds),
                bullets: BulletManager::new(&BulletTuning::default()),
                enemies: EnemyManager::new(&EnemyTuning::default()),
                enemy_bullets: EnemyBulletManager::new(&EnemyBulletTuning::default()),
                bounds,
            }
        }

        fn shoot(&mut self, pos: Vec2) {
            // Each call lands in its own fire window
            let now = self.bullets.stats().fired as f64;
            self.bullets.fire_single(now, pos, Vec2::ZERO);
        }

        fn run(&mut self, sink: &mut Recorder) -> CollisionReport {
            let mut awards = Recorder::default();
            let report = self.engine.process(
                Participants {
                    player: &mut self.player,
                    bullets: &mut self.bullets,
                    enemies: &mut self.enemies,
                    enemy_bullets: &mut self.enemy_bullets,
                    bounds: self.bounds,
                },
                sink,
                &mut awards,
            );
            sink.awards.extend(awards.awards);
            report
        }
    }

    #[test]
    fn test_bullet_destroys_small_enemy() {
        let mut world = World::new(CollisionTuning::default());
        let at = Vec2::new(100.0, 100.0);
        world.enemies.spawn_at(EnemyTier::Small, at);
        world.shoot(at + Vec2::new(3.0, 0.0));

        let mut sink = Recorder::default();
        let report = world.run(&mut sink);

        assert_eq!(report.destroyed.len(), 1);
        assert_eq!(report.bullets_removed, 1);
        assert_eq!(sink.explosions, vec![at]);
        assert_eq!(sink.awards, vec![EnemyTier::Small]);
        assert_eq!(world.enemies.active_len(), 0);
        assert_eq!(world.bullets.active_len(), 0);
    }

    #[test]
    fn test_surviving_enemy_gets_damage_effect() {
        let mut world = World::new(CollisionTuning::default());
        let at = Vec2::new(100.0, 100.0);
        world.enemies.spawn_at(EnemyTier::Medium, at);
        world.shoot(at);

        let mut sink = Recorder::default();
        let report = world.run(&mut sink);

        assert!(report.destroyed.is_empty());
        assert_eq!(sink.damage, vec![at]);
        assert!(sink.awards.is_empty());
        assert_eq!(world.enemies.iter_active().next().unwrap().hp, 2);
    }

    #[test]
    fn test_one_bullet_hits_one_enemy() {
        let mut world = World::new(CollisionTuning::default());
        let at = Vec2::new(100.0, 100.0);
        world.enemies.spawn_at(EnemyTier::Small, at);
        world.enemies.spawn_at(EnemyTier::Small, at);
        world.shoot(at);

        let report = world.run(&mut Recorder::default());
        assert_eq!(report.destroyed.len(), 1);
        assert_eq!(world.enemies.active_len(), 1);
    }

    #[test]
    fn test_offscreen_bullet_culled_without_test() {
        let mut world = World::new(CollisionTuning::default());
        world.enemies.spawn_at(EnemyTier::Small, Vec2::new(100.0, 100.0));
        world.shoot(Vec2::new(100.0, -50.0));

        let report = world.run(&mut Recorder::default());
        let stats = world.engine.frame_stats();
        assert_eq!(stats.culled, 1);
        assert_eq!(stats.checks, 0);
        assert_eq!(report.bullets_removed, 1);
    }

    #[test]
    fn test_far_pairs_are_prefiltered() {
        let mut world = World::new(CollisionTuning::default());
        world.enemies.spawn_at(EnemyTier::Small, Vec2::new(100.0, 100.0));
        world.shoot(Vec2::new(300.0, 400.0));

        world.run(&mut Recorder::default());
        let stats = world.engine.frame_stats();
        // Bullet/enemy and player/enemy
        assert_eq!(stats.prefiltered, 2);
        assert_eq!(stats.checks, 0);
    }

    #[test]
    fn test_check_budget_defers_pairs() {
        let tuning = CollisionTuning {
            max_checks_per_frame: 1,
            ..Default::default()
        };
        let mut world = World::new(tuning);
        let at = Vec2::new(100.0, 100.0);
        world.enemies.spawn_at(EnemyTier::Large, at);
        world.shoot(at);
        world.shoot(at);

        world.run(&mut Recorder::default());
        let stats = world.engine.frame_stats();
        assert_eq!(stats.checks, 1);
        assert_eq!(stats.deferred, 1);
        // The deferred bullet survives for the next frame
        assert_eq!(world.bullets.active_len(), 1);

        world.run(&mut Recorder::default());
        assert_eq!(world.bullets.active_len(), 0);
        assert_eq!(world.engine.total_stats().checks, 2);
    }

    #[test]
    fn test_enemy_bullet_hits_player() {
        let mut world = World::new(CollisionTuning::default());
        let ship = world.player.pos;
        world.enemy_bullets.spawn_straight(ship, Vec2::ZERO);
        world.enemy_bullets.spawn_straight(ship, Vec2::ZERO);

        let mut sink = Recorder::default();
        let report = world.run(&mut sink);
        assert_eq!(report.player_hits, 1);
        assert_eq!(world.player.lives, 2);
        assert_eq!(report.enemy_bullets_removed, 1);
        assert_eq!(world.enemy_bullets.active_len(), 1);
    }

    #[test]
    fn test_invincible_player_takes_no_damage() {
        let mut world = World::new(CollisionTuning::default());
        world.player.invincible_timer = 1.0;
        let ship = world.player.pos;
        for i in 0..8 {
            let offset = Vec2::new(i as f32 - 4.0, (i % 3) as f32 - 1.0);
            world.enemy_bullets.spawn_straight(ship + offset, Vec2::ZERO);
        }
        for tier in [EnemyTier::Small, EnemyTier::Medium, EnemyTier::Large] {
            world.enemies.spawn_at(tier, ship);
        }

        let mut sink = Recorder::default();
        for _ in 0..3 {
            let report = world.run(&mut sink);
            assert_eq!(report.player_hits, 0);
            assert!(report.destroyed.is_empty());
            assert_eq!(report.enemy_bullets_removed, 0);
        }
        assert_eq!(world.player.lives, 3);
        assert_eq!(world.enemy_bullets.active_len(), 8);
        assert_eq!(world.enemies.active_len(), 3);
        assert!(sink.damage.is_empty());
        assert_eq!(sink.bursts, 0);
    }

    #[test]
    fn test_ramming_small_enemy_destroys_it() {
        let mut world = World::new(CollisionTuning::default());
        let ship = world.player.pos;
        world.enemies.spawn_at(EnemyTier::Small, ship);

        let mut sink = Recorder::default();
        let report = world.run(&mut sink);
        assert_eq!(report.player_hits, 1);
        assert_eq!(report.destroyed.len(), 1);
        assert_eq!(sink.awards, vec![EnemyTier::Small]);
        assert_eq!(world.enemies.active_len(), 0);
    }

    #[test]
    fn test_ramming_large_enemy_survives() {
        let mut world = World::new(CollisionTuning::default());
        let ship = world.player.pos;
        world.enemies.spawn_at(EnemyTier::Large, ship);

        let report = world.run(&mut Recorder::default());
        assert_eq!(report.player_hits, 1);
        assert!(report.destroyed.is_empty());
        assert_eq!(world.enemies.active_len(), 1);
    }

    #[test]
    fn test_last_life_reports_death() {
        let mut world = World::new(CollisionTuning::default());
        world.player.lives = 1;
        let ship = world.player.pos;
        world.enemy_bullets.spawn_straight(ship, Vec2::ZERO);

        let mut sink = Recorder::default();
        let report = world.run(&mut sink);
        assert!(report.player_died);
        assert!(!world.player.alive);
        assert_eq!(sink.bursts, 1);
    }

    #[test]
    fn test_debug_records_contact() {
        let mut world = World::new(CollisionTuning::default());
        world.engine.debug = true;
        let at = Vec2::new(100.0, 100.0);
        world.enemies.spawn_at(EnemyTier::Small, at);
        world.shoot(at + Vec2::new(3.0, 4.0));

        world.run(&mut Recorder::default());
        let contact = world.engine.last_contact().unwrap();
        assert!((contact.distance() - 5.0).abs() < 1e-4);
        assert!(contact.distance_sq < contact.combined_radius * contact.combined_radius);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn hitbox() -> impl Strategy<Value = Hitbox> {
            (-500.0f32..500.0, -500.0f32..500.0, 0.5f32..40.0)
                .prop_map(|(x, y, r)| Hitbox::new(Vec2::new(x, y), r))
        }

        proptest! {
            #[test]
            fn test_overlap_is_symmetric(a in hitbox(), b in hitbox()) {
                prop_assert_eq!(circle_overlap(a, b), circle_overlap(b, a));
            }

            #[test]
            fn test_prefilter_never_rejects_a_hit(a in hitbox(), b in hitbox()) {
                if circle_overlap(a, b) {
                    prop_assert!(!rough_reject(a, b));
                }
            }
        }
    }
}
