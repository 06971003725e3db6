//! Player bullets and the fire-rate gate

use glam::Vec2;

use super::patterns::pattern_for_level;
use super::pool::{Handle, Pool, Poolable};
use crate::Bounds;
use crate::consts::{MAX_LEVEL, MIN_LEVEL};
use crate::tuning::BulletTuning;

#[derive(Debug, Clone, Default)]
pub struct Bullet {
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: Vec2,
    pub damage: i32,
    pub active: bool,
}

impl Poolable for Bullet {
    fn reset(&mut self) {
        self.pos = Vec2::ZERO;
        self.vel = Vec2::ZERO;
        self.size = Vec2::ZERO;
        self.damage = 1;
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

impl Bullet {
    pub fn update(&mut self, dt: f32) {
        self.pos += self.vel * dt;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulletStats {
    pub fired: u64,
    pub recycled: u64,
}

#[derive(Debug, Clone)]
pub struct BulletManager {
    pool: Pool<Bullet>,
    tuning: BulletTuning,
    level: u32,
    fire_interval: f32,
    /// Simulation time of the last accepted fire event
    last_fire_time: Option<f64>,
    auto_fire: bool,
    stats: BulletStats,
}

impl BulletManager {
    pub fn new(tuning: &BulletTuning) -> Self {
        Self {
            pool: Pool::new("bullet", tuning.pool_size, tuning.pool_size),
            tuning: tuning.clone(),
            level: MIN_LEVEL,
            fire_interval: tuning.fire_interval.max(tuning.min_fire_interval),
            last_fire_time: None,
            auto_fire: false,
            stats: BulletStats::default(),
        }
    }

    pub fn pool(&self) -> &Pool<Bullet> {
        &self.pool
    }

    pub fn iter_active(&self) -> impl Iterator<Item = &Bullet> + '_ {
        self.pool.iter_active()
    }

    pub fn active_len(&self) -> usize {
        self.pool.active_len()
    }

    pub fn stats(&self) -> BulletStats {
        self.stats
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn fire_interval(&self) -> f32 {
        self.fire_interval
    }

    /// Clamped to the configured floor
    pub fn set_fire_interval(&mut self, interval: f32) {
        self.fire_interval = interval.max(self.tuning.min_fire_interval);
    }

    /// Clamp to the level range and retune the fire interval
    pub fn set_level(&mut self, level: u32) {
        let level = level.clamp(MIN_LEVEL, MAX_LEVEL);
        if level == self.level {
            return;
        }
        self.level = level;
        let interval = self
            .tuning
            .level_intervals
            .get(level as usize - 1)
            .copied()
            .unwrap_or(self.tuning.fire_interval);
        self.set_fire_interval(interval);
        log::info!(
            "Shot level {} (interval {:.2}s)",
            self.level,
            self.fire_interval
        );
    }

    pub fn can_fire(&self, now: f64) -> bool {
        match self.last_fire_time {
            Some(last) => now - last >= self.fire_interval as f64,
            None => true,
        }
    }

    /// Ungated spawn
    fn spawn(&mut self, pos: Vec2, vel: Vec2, size: Vec2) -> Option<Handle> {
        let damage = self.tuning.damage;
        let handle = self.pool.acquire()?;
        let bullet = self.pool.get_mut(handle)?;
        bullet.pos = pos;
        bullet.vel = vel;
        bullet.size = size;
        bullet.damage = damage;
        self.stats.fired += 1;
        Some(handle)
    }

    /// One gated bullet
    pub fn fire_single(&mut self, now: f64, pos: Vec2, vel: Vec2) -> Option<Handle> {
        if !self.can_fire(now) {
            return None;
        }
        let handle = self.spawn(pos, vel, self.tuning.size)?;
        self.last_fire_time = Some(now);
        Some(handle)
    }

    /// Fire the current level's volley as one gated event
    ///
    /// Entries that find no free slot are skipped; the gate only closes if
    /// something actually spawned.
    pub fn fire_pattern(&mut self, now: f64, origin: Vec2) -> usize {
        if !self.can_fire(now) {
            return 0;
        }

        let mut spawned = 0;
        for shot in pattern_for_level(self.level) {
            let size = (self.tuning.size * shot.size_mult).round();
            if self.spawn(origin + shot.offset, shot.vel, size).is_some() {
                spawned += 1;
            }
        }

        if spawned > 0 {
            self.last_fire_time = Some(now);
        }
        spawned
    }

    pub fn start_auto_fire(&mut self) {
        self.auto_fire = true;
    }

    pub fn stop_auto_fire(&mut self) {
        self.auto_fire = false;
    }

    pub fn is_auto_firing(&self) -> bool {
        self.auto_fire
    }

    /// Fire a volley if the latch is held and the gate is open
    pub fn update_auto_fire(&mut self, now: f64, origin: Vec2) -> usize {
        if !self.auto_fire {
            return 0;
        }
        self.fire_pattern(now, origin)
    }

    /// Integrate and recycle bullets that left the screen or were spent
    pub fn update(&mut self, dt: f32, bounds: Bounds) {
        let margin = self.tuning.offscreen_margin;
        let mut recycled = 0;
        self.pool.retain_active(|bullet| {
            bullet.update(dt);
            let keep = bullet.active && bounds.contains(bullet.pos, margin);
            if !keep {
                recycled += 1;
            }
            keep
        });
        self.stats.recycled += recycled;
    }

    pub fn release(&mut self, handle: Handle) -> bool {
        let released = self.pool.release(handle);
        if released {
            self.stats.recycled += 1;
        }
        released
    }

    pub fn clear(&mut self) {
        self.pool.clear();
        self.last_fire_time = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> BulletManager {
        BulletManager::new(&BulletTuning::default())
    }

    #[test]
    fn test_fire_rate_gate() {
        let mut bullets = manager();
        let vel = Vec2::new(0.0, -400.0);
        assert!(bullets.fire_single(0.0, Vec2::ZERO, vel).is_some());
        assert!(bullets.fire_single(0.15, Vec2::ZERO, vel).is_none());
        assert!(bullets.fire_single(0.21, Vec2::ZERO, vel).is_some());
        assert_eq!(bullets.active_len(), 2);
    }

    #[test]
    fn test_fire_interval_floor() {
        let mut bullets = manager();
        bullets.set_fire_interval(0.001);
        assert_eq!(bullets.fire_interval(), 0.05);
    }

    #[test]
    fn test_set_level_clamps_and_retunes() {
        let mut bullets = manager();
        bullets.set_level(9);
        assert_eq!(bullets.level(), 5);
        assert_eq!(bullets.fire_interval(), 0.12);
        bullets.set_level(0);
        assert_eq!(bullets.level(), 1);
        assert_eq!(bullets.fire_interval(), 0.2);
    }

    #[test]
    fn test_pattern_spawns_whole_volley_once() {
        let mut bullets = manager();
        bullets.set_level(3);
        let origin = Vec2::new(100.0, 500.0);
        assert_eq!(bullets.fire_pattern(0.0, origin), 3);
        // Gate closed for the whole volley
        assert_eq!(bullets.fire_pattern(0.01, origin), 0);

        let mut xs: Vec<f32> = bullets.iter_active().map(|b| b.pos.x).collect();
        xs.sort_by(|a, b| a.total_cmp(b));
        assert_eq!(xs, vec![92.0, 100.0, 108.0]);
        assert!(bullets.iter_active().all(|b| b.pos.y == 490.0));
    }

    #[test]
    fn test_level_four_scales_bullets() {
        let mut bullets = manager();
        bullets.set_level(4);
        bullets.fire_pattern(0.0, Vec2::ZERO);
        assert!(bullets.iter_active().all(|b| b.size == Vec2::new(9.0, 21.0)));
    }

    #[test]
    fn test_partial_volley_still_closes_gate() {
        let tuning = BulletTuning {
            pool_size: 2,
            ..Default::default()
        };
        let mut bullets = BulletManager::new(&tuning);
        bullets.set_level(3);
        assert_eq!(bullets.fire_pattern(0.0, Vec2::ZERO), 2);
        assert!(!bullets.can_fire(0.1));
    }

    #[test]
    fn test_empty_volley_keeps_gate_open() {
        let tuning = BulletTuning {
            pool_size: 1,
            ..Default::default()
        };
        let mut bullets = BulletManager::new(&tuning);
        assert_eq!(bullets.fire_pattern(0.0, Vec2::ZERO), 1);
        assert_eq!(bullets.fire_pattern(1.0, Vec2::ZERO), 0);
        assert!(bullets.can_fire(1.0));
    }

    #[test]
    fn test_offscreen_bullets_recycled() {
        let mut bullets = manager();
        let bounds = Bounds::new(480.0, 720.0);
        bullets.fire_single(0.0, Vec2::new(240.0, 10.0), Vec2::new(0.0, -400.0));
        bullets.update(0.05, bounds);
        assert_eq!(bullets.active_len(), 1);
        bullets.update(0.05, bounds);
        assert_eq!(bullets.active_len(), 0);
        assert_eq!(bullets.stats().recycled, 1);
        assert_eq!(bullets.pool().free_len(), bullets.pool().capacity());
    }

    #[test]
    fn test_auto_fire_latch() {
        let mut bullets = manager();
        assert_eq!(bullets.update_auto_fire(0.0, Vec2::ZERO), 0);
        bullets.start_auto_fire();
        assert_eq!(bullets.update_auto_fire(0.0, Vec2::ZERO), 1);
        bullets.stop_auto_fire();
        assert_eq!(bullets.update_auto_fire(1.0, Vec2::ZERO), 0);
    }
}
