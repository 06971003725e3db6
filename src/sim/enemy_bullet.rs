//! Enemy projectiles: straight, homing and spread shots

use std::f32::consts::TAU;

use glam::Vec2;

use super::pool::{Handle, Pool, Poolable};
use crate::tuning::EnemyBulletTuning;
use crate::{Bounds, bearing, heading, normalize_angle};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum EnemyBulletKind {
    #[default]
    Straight,
    /// Re-aims at the player until its homing window runs out
    Homing,
    Spread,
}

#[derive(Debug, Clone, Default)]
pub struct EnemyBullet {
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: Vec2,
    pub kind: EnemyBulletKind,
    /// Heading in radians (homing only)
    pub angle: f32,
    pub speed: f32,
    /// Maximum turn in rad/s
    pub turn_rate: f32,
    pub homing_elapsed: f32,
    pub homing_duration: f32,
    /// Still set after a homing shot goes straight
    pub was_homing: bool,
    pub active: bool,
}

impl Poolable for EnemyBullet {
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

impl EnemyBullet {
    pub fn is_homing(&self) -> bool {
        self.kind == EnemyBulletKind::Homing
    }

    pub fn update(&mut self, dt: f32, target: Option<Vec2>) {
        if self.is_homing() {
            self.homing_elapsed += dt;
            if self.homing_elapsed >= self.homing_duration {
                // One-way: never re-enters homing
                self.kind = EnemyBulletKind::Straight;
            } else if let Some(target) = target {
                self.steer_toward(target, dt);
            }
        }
        self.pos += self.vel * dt;
    }

    fn steer_toward(&mut self, target: Vec2, dt: f32) {
        let desired = bearing(self.pos, target);
        let max_turn = self.turn_rate * dt;
        let turn = normalize_angle(desired - self.angle).clamp(-max_turn, max_turn);
        self.angle = normalize_angle(self.angle + turn);
        self.vel = heading(self.angle) * self.speed;
    }
}

#[derive(Debug, Clone)]
pub struct EnemyBulletManager {
    pool: Pool<EnemyBullet>,
    tuning: EnemyBulletTuning,
}

impl EnemyBulletManager {
    pub fn new(tuning: &EnemyBulletTuning) -> Self {
        Self {
            pool: Pool::new("enemy bullet", tuning.pool_size, tuning.max_active),
            tuning: tuning.clone(),
        }
    }

    pub fn pool(&self) -> &Pool<EnemyBullet> {
        &self.pool
    }

    pub fn iter_active(&self) -> impl Iterator<Item = &EnemyBullet> + '_ {
        self.pool.iter_active()
    }

    pub fn active_len(&self) -> usize {
        self.pool.active_len()
    }

    pub fn tuning(&self) -> &EnemyBulletTuning {
        &self.tuning
    }

    fn spawn(&mut self, kind: EnemyBulletKind, pos: Vec2, vel: Vec2) -> Option<Handle> {
        let size = self.tuning.size;
        let handle = self.pool.acquire()?;
        let bullet = self.pool.get_mut(handle)?;
        bullet.kind = kind;
        bullet.pos = pos;
        bullet.vel = vel;
        bullet.size = size;
        bullet.speed = vel.length();
        bullet.angle = vel.y.atan2(vel.x);
        Some(handle)
    }

    pub fn spawn_straight(&mut self, pos: Vec2, vel: Vec2) -> Option<Handle> {
        self.spawn(EnemyBulletKind::Straight, pos, vel)
    }

    pub fn spawn_homing(&mut self, pos: Vec2, angle: f32, speed: f32) -> Option<Handle> {
        let turn_rate = self.tuning.turn_rate;
        let duration = self.tuning.homing_duration;
        let handle = self.spawn(EnemyBulletKind::Homing, pos, heading(angle) * speed)?;
        let bullet = self.pool.get_mut(handle)?;
        bullet.angle = angle;
        bullet.speed = speed;
        bullet.turn_rate = turn_rate;
        bullet.homing_duration = duration;
        bullet.was_homing = true;
        Some(handle)
    }

    pub fn spawn_spread(&mut self, pos: Vec2, angle: f32, speed: f32) -> Option<Handle> {
        self.spawn(EnemyBulletKind::Spread, pos, heading(angle) * speed)
    }

    /// `count` spread shots evenly across `spread` radians centered on
    /// `center`; returns how many spawned
    pub fn spawn_fan(
        &mut self,
        pos: Vec2,
        center: f32,
        spread: f32,
        count: u32,
        speed: f32,
    ) -> usize {
        match count {
            0 => 0,
            1 => usize::from(self.spawn_spread(pos, center, speed).is_some()),
            _ => {
                let step = spread / (count - 1) as f32;
                let start = center - spread / 2.0;
                (0..count)
                    .filter(|&i| {
                        self.spawn_spread(pos, start + step * i as f32, speed)
                            .is_some()
                    })
                    .count()
            }
        }
    }

    /// `count` straight shots evenly around a full circle
    pub fn spawn_ring(&mut self, pos: Vec2, count: u32, speed: f32) -> usize {
        if count == 0 {
            return 0;
        }
        let step = TAU / count as f32;
        (0..count)
            .filter(|&i| {
                self.spawn_straight(pos, heading(step * i as f32) * speed)
                    .is_some()
            })
            .count()
    }

    /// Move every bullet and recycle the ones far enough off-screen
    pub fn update(&mut self, dt: f32, bounds: Bounds, target: Option<Vec2>) {
        let margin = self.tuning.offscreen_margin;
        self.pool.retain_active(|bullet| {
            bullet.update(dt, target);
            bullet.active && bounds.contains(bullet.pos, margin)
        });
    }

    pub fn release(&mut self, handle: Handle) -> bool {
        self.pool.release(handle)
    }

    pub fn clear(&mut self) {
        self.pool.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, FRAC_PI_8};

    fn manager() -> EnemyBulletManager {
        EnemyBulletManager::new(&EnemyBulletTuning::default())
    }

    fn sorted_angles(manager: &EnemyBulletManager) -> Vec<f32> {
        let mut angles: Vec<f32> = manager.iter_active().map(|b| b.angle).collect();
        angles.sort_by(|a, b| a.total_cmp(b));
        angles
    }

    #[test]
    fn test_fan_angles() {
        let mut bullets = manager();
        assert_eq!(bullets.spawn_fan(Vec2::ZERO, 0.0, FRAC_PI_2, 5, 100.0), 5);
        let expected = [-FRAC_PI_4, -FRAC_PI_8, 0.0, FRAC_PI_8, FRAC_PI_4];
        for (got, want) in sorted_angles(&bullets).iter().zip(expected) {
            assert!((got - want).abs() < 1e-5, "{got} != {want}");
        }
    }

    #[test]
    fn test_fan_degenerate_counts() {
        let mut bullets = manager();
        assert_eq!(bullets.spawn_fan(Vec2::ZERO, 1.0, FRAC_PI_2, 0, 100.0), 0);
        assert_eq!(bullets.spawn_fan(Vec2::ZERO, 1.0, FRAC_PI_2, 1, 100.0), 1);
        let angles = sorted_angles(&bullets);
        assert!((angles[0] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_ring_is_evenly_spaced() {
        let mut bullets = manager();
        assert_eq!(bullets.spawn_ring(Vec2::ZERO, 4, 50.0), 4);
        let sum: Vec2 = bullets.iter_active().map(|b| b.vel).sum();
        assert!(sum.length() < 1e-3);
    }

    #[test]
    fn test_homing_turn_is_rate_limited() {
        let mut bullets = manager();
        // Heading right, target straight down
        bullets.spawn_homing(Vec2::ZERO, 0.0, 80.0);
        bullets.update(0.1, Bounds::new(1000.0, 1000.0), Some(Vec2::new(0.0, 500.0)));
        let b = bullets.iter_active().next().unwrap();
        assert!((b.angle - 0.3).abs() < 1e-5);
        assert!((b.vel.length() - 80.0).abs() < 1e-3);
    }

    #[test]
    fn test_homing_window_expires_once() {
        let mut bullets = manager();
        let bounds = Bounds::new(10_000.0, 10_000.0);
        bullets.spawn_homing(Vec2::new(5000.0, 5000.0), 0.0, 80.0);
        for _ in 0..130 {
            bullets.update(1.0 / 60.0, bounds, Some(Vec2::new(5000.0, 9000.0)));
        }
        let b = bullets.iter_active().next().unwrap();
        assert_eq!(b.kind, EnemyBulletKind::Straight);
        assert!(b.was_homing);

        // Flies straight from here on
        let vel = b.vel;
        bullets.update(0.5, bounds, Some(Vec2::new(0.0, 0.0)));
        let b = bullets.iter_active().next().unwrap();
        assert_eq!(b.vel, vel);
        assert_eq!(b.kind, EnemyBulletKind::Straight);
    }

    #[test]
    fn test_max_active_ceiling() {
        let tuning = EnemyBulletTuning {
            pool_size: 10,
            max_active: 3,
            ..Default::default()
        };
        let mut bullets = EnemyBulletManager::new(&tuning);
        assert_eq!(bullets.spawn_ring(Vec2::ZERO, 8, 10.0), 3);
    }

    #[test]
    fn test_offscreen_cleanup() {
        let mut bullets = manager();
        let bounds = Bounds::new(480.0, 720.0);
        bullets.spawn_straight(Vec2::new(240.0, 700.0), Vec2::new(0.0, 100.0));
        bullets.update(0.5, bounds, None);
        assert_eq!(bullets.active_len(), 1);
        bullets.update(0.5, bounds, None);
        assert_eq!(bullets.active_len(), 0);
    }
}
