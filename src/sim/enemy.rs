//! Tiered enemies and the spawn director

use glam::Vec2;
use rand::Rng;

use super::enemy_bullet::EnemyBulletManager;
use super::pool::{Handle, Pool, Poolable};
use crate::tuning::{EnemyTuning, TierTuning};
use crate::{Bounds, bearing};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum EnemyTier {
    #[default]
    Small,
    Medium,
    Large,
}

impl EnemyTier {
    pub const ALL: [EnemyTier; 3] = [EnemyTier::Small, EnemyTier::Medium, EnemyTier::Large];

    pub fn stats(self, tuning: &EnemyTuning) -> &TierTuning {
        match self {
            EnemyTier::Small => &tuning.small,
            EnemyTier::Medium => &tuning.medium,
            EnemyTier::Large => &tuning.large,
        }
    }

    /// Small enemies never fire
    pub fn shoots(self) -> bool {
        self != EnemyTier::Small
    }
}

#[derive(Debug, Clone, Default)]
pub struct Enemy {
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: Vec2,
    pub tier: EnemyTier,
    pub hp: i32,
    pub max_hp: i32,
    /// Seconds until the next shot
    pub shoot_timer: f32,
    /// Volleys fired so far
    pub volleys: u32,
    pub destroyed: bool,
    pub active: bool,
}

impl Poolable for Enemy {
    fn reset(&mut self) {
        let active = self.active;
        *self = Self::default();
        self.active = active;
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

impl Enemy {
    /// Apply damage; true exactly when this hit destroyed the enemy
    pub fn take_damage(&mut self, amount: i32) -> bool {
        if self.destroyed {
            return false;
        }
        self.hp -= amount.max(0);
        if self.hp <= 0 {
            self.hp = 0;
            self.destroyed = true;
            self.active = false;
            return true;
        }
        false
    }

    /// Top edge has left the bottom of the screen
    fn is_past_bottom(&self, bounds: Bounds) -> bool {
        self.pos.y - self.size.y / 2.0 > bounds.height + self.size.y
    }

    fn fire(&mut self, target: Vec2, tuning: &EnemyTuning, bullets: &mut EnemyBulletManager) {
        let aim = bearing(self.pos, target);
        self.volleys += 1;
        match self.tier {
            EnemyTier::Small => {}
            EnemyTier::Medium => {
                let speed = bullets.tuning().homing_speed;
                bullets.spawn_homing(self.pos, aim, speed);
            }
            EnemyTier::Large if tuning.ring_every > 0 && self.volleys % tuning.ring_every == 0 => {
                let speed = bullets.tuning().spread_speed;
                bullets.spawn_ring(self.pos, tuning.ring_count, speed);
            }
            EnemyTier::Large => {
                let speed = bullets.tuning().spread_speed;
                bullets.spawn_fan(
                    self.pos,
                    aim,
                    tuning.spread_angle,
                    tuning.spread_count,
                    speed,
                );
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TierCounts {
    pub small: usize,
    pub medium: usize,
    pub large: usize,
}

#[derive(Debug, Clone)]
pub struct EnemyManager {
    pool: Pool<Enemy>,
    tuning: EnemyTuning,
    /// Seconds until the next spawn attempt
    spawn_timer: f32,
    spawned: u64,
}

impl EnemyManager {
    pub fn new(tuning: &EnemyTuning) -> Self {
        Self {
            pool: Pool::new("enemy", tuning.pool_size, tuning.max_active),
            tuning: tuning.clone(),
            spawn_timer: tuning.first_spawn_delay,
            spawned: 0,
        }
    }

    pub fn pool(&self) -> &Pool<Enemy> {
        &self.pool
    }

    pub fn iter_active(&self) -> impl Iterator<Item = &Enemy> + '_ {
        self.pool.iter_active()
    }

    pub fn active_len(&self) -> usize {
        self.pool.active_len()
    }

    pub fn active_handles(&self) -> &[Handle] {
        self.pool.active_handles()
    }

    pub fn get(&self, handle: Handle) -> Option<&Enemy> {
        self.pool.get(handle)
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut Enemy> {
        self.pool.get_mut(handle)
    }

    pub fn release(&mut self, handle: Handle) -> bool {
        self.pool.release(handle)
    }

    pub fn spawned(&self) -> u64 {
        self.spawned
    }

    pub fn tuning(&self) -> &EnemyTuning {
        &self.tuning
    }

    pub fn tier_counts(&self) -> TierCounts {
        let mut counts = TierCounts::default();
        for enemy in self.pool.iter_active() {
            match enemy.tier {
                EnemyTier::Small => counts.small += 1,
                EnemyTier::Medium => counts.medium += 1,
                EnemyTier::Large => counts.large += 1,
            }
        }
        counts
    }

    /// Weighted tier draw; all-zero weights always give `Small`
    pub fn roll_tier<R: Rng>(&self, rng: &mut R) -> EnemyTier {
        let w = self.tuning.weights;
        let total = w.small + w.medium + w.large;
        if total == 0 {
            return EnemyTier::Small;
        }
        let roll = rng.random_range(0..total);
        if roll < w.small {
            EnemyTier::Small
        } else if roll < w.small + w.medium {
            EnemyTier::Medium
        } else {
            EnemyTier::Large
        }
    }

    fn fire_delay<R: Rng>(stats: &TierTuning, rng: &mut R) -> f32 {
        roll_between(rng, stats.fire_interval_min, stats.fire_interval_max)
    }

    /// Place an enemy of `tier` centered at `pos`
    pub fn spawn_at(&mut self, tier: EnemyTier, pos: Vec2) -> Option<Handle> {
        let stats = tier.stats(&self.tuning).clone();
        let handle = self.pool.acquire()?;
        let enemy = self.pool.get_mut(handle)?;
        enemy.tier = tier;
        enemy.pos = pos;
        enemy.vel = Vec2::new(0.0, stats.speed);
        enemy.size = stats.size;
        enemy.hp = stats.hp;
        enemy.max_hp = stats.hp;
        enemy.shoot_timer = stats.fire_interval_min;
        self.spawned += 1;
        Some(handle)
    }

    /// Random tier at a random x just above the top edge
    pub fn spawn_random<R: Rng>(&mut self, bounds: Bounds, rng: &mut R) -> Option<Handle> {
        let tier = self.roll_tier(rng);
        let stats = tier.stats(&self.tuning).clone();
        let margin = self.tuning.spawn_margin;
        let x = if bounds.width > margin * 2.0 {
            rng.random_range(margin..=bounds.width - margin)
        } else {
            bounds.width / 2.0
        };
        let pos = Vec2::new(x, -stats.size.y / 2.0);

        let handle = self.spawn_at(tier, pos)?;
        let delay = Self::fire_delay(&stats, rng);
        if let Some(enemy) = self.pool.get_mut(handle) {
            enemy.shoot_timer = delay;
        }
        log::debug!("Spawned {:?} enemy at x={:.0}", tier, x);
        Some(handle)
    }

    /// Run the spawn timer, then move, shoot and cull every enemy
    pub fn update<R: Rng>(
        &mut self,
        dt: f32,
        bounds: Bounds,
        target: Option<Vec2>,
        bullets: &mut EnemyBulletManager,
        rng: &mut R,
    ) {
        self.spawn_timer -= dt;
        if self.spawn_timer <= 0.0 {
            if !self.pool.is_saturated() {
                self.spawn_random(bounds, rng);
            }
            self.spawn_timer = roll_between(
                rng,
                self.tuning.spawn_interval_min,
                self.tuning.spawn_interval_max,
            );
        }

        let tuning = &self.tuning;
        self.pool.retain_active(|enemy| {
            if !enemy.active {
                return false;
            }
            enemy.pos += enemy.vel * dt;

            if enemy.tier.shoots() {
                enemy.shoot_timer -= dt;
                if enemy.shoot_timer <= 0.0 {
                    // Only shoot once on screen and with someone to aim at
                    if let Some(target) = target.filter(|_| bounds.contains(enemy.pos, 0.0)) {
                        enemy.fire(target, tuning, bullets);
                    }
                    enemy.shoot_timer = Self::fire_delay(enemy.tier.stats(tuning), rng);
                }
            }

            !enemy.is_past_bottom(bounds)
        });
    }

    pub fn clear(&mut self) {
        self.pool.clear();
        self.spawn_timer = self.tuning.first_spawn_delay;
    }
}

/// Uniform roll in a band whose ends may arrive swapped
fn roll_between<R: Rng>(rng: &mut R, a: f32, b: f32) -> f32 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    rng.random_range(lo..=hi)
}
