//! Short-lived particle effects (explosions, hit flashes, sparks)
//!
//! Purely cosmetic: nothing here feeds back into gameplay. Effects age on
//! simulation time and free themselves when their duration runs out.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_8, TAU};

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::collision::EffectSink;
use super::pool::{Handle, Pool, Poolable};
use crate::heading;
use crate::tuning::EffectTuning;

/// Most particles any effect kind emits
const MAX_PARTICLES: usize = 8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum EffectKind {
    #[default]
    Explosion,
    /// Hit flash on something that survived
    Damage,
    Particle,
}

impl EffectKind {
    fn particle_count(self) -> usize {
        match self {
            EffectKind::Explosion => 8,
            EffectKind::Damage => 4,
            EffectKind::Particle => 6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
    pub max_size: f32,
    /// 1.0 fresh, 0.0 gone; doubles as draw alpha
    pub life: f32,
    /// Life lost per second
    pub decay: f32,
    /// Palette index for the renderer
    pub shade: u8,
}

#[derive(Debug, Clone)]
pub struct Effect {
    pub pos: Vec2,
    pub kind: EffectKind,
    pub elapsed: f32,
    pub duration: f32,
    pub particles: Vec<Particle>,
    pub active: bool,
}

impl Default for Effect {
    fn default() -> Self {
        Self {
            pos: Vec2::ZERO,
            kind: EffectKind::default(),
            elapsed: 0.0,
            duration: 0.0,
            particles: Vec::with_capacity(MAX_PARTICLES),
            active: false,
        }
    }
}

impl Poolable for Effect {
    fn reset(&mut self) {
        self.pos = Vec2::ZERO;
        self.kind = EffectKind::default();
        self.elapsed = 0.0;
        self.duration = 0.0;
        // Keep the allocation
        self.particles.clear();
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

impl Effect {
    /// Remaining fraction of the effect's lifetime
    pub fn remaining(&self) -> f32 {
        if self.duration <= 0.0 {
            return 0.0;
        }
        (1.0 - self.elapsed / self.duration).clamp(0.0, 1.0)
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    fn emit<R: Rng>(&mut self, rng: &mut R, count: usize) {
        for i in 0..count {
            let (angle, speed, size, decay) = match self.kind {
                EffectKind::Explosion => (
                    TAU * i as f32 / count as f32,
                    rng.random_range(50.0..150.0),
                    rng.random_range(2.0..5.0),
                    rng.random_range(0.8..1.2),
                ),
                EffectKind::Damage => (
                    -FRAC_PI_2 + rng.random_range(-FRAC_PI_8..FRAC_PI_8),
                    rng.random_range(30.0..80.0),
                    rng.random_range(1.0..3.0),
                    1.2,
                ),
                EffectKind::Particle => (
                    rng.random_range(0.0..TAU),
                    rng.random_range(20.0..60.0),
                    rng.random_range(1.0..3.0),
                    0.6,
                ),
            };
            let shade = match self.kind {
                EffectKind::Explosion => rng.random_range(0..4u8),
                _ => 0,
            };
            self.particles.push(Particle {
                pos: self.pos,
                vel: heading(angle) * speed,
                size,
                max_size: size,
                life: 1.0,
                decay,
                shade,
            });
        }
    }

    pub fn update(&mut self, dt: f32, gravity: f32) {
        self.elapsed += dt;
        if self.is_finished() {
            self.active = false;
            return;
        }
        let falls = self.kind == EffectKind::Explosion;
        for p in &mut self.particles {
            p.pos += p.vel * dt;
            p.life = (p.life - p.decay * dt).max(0.0);
            p.size = p.max_size * p.life;
            if falls {
                p.vel.y += gravity * dt;
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct EffectsManager {
    pool: Pool<Effect>,
    tuning: EffectTuning,
    rng: Pcg32,
    /// Emit particles at all (quality setting)
    pub particles_enabled: bool,
}

impl EffectsManager {
    /// `capacity` comes from the quality preset
    pub fn new(tuning: &EffectTuning, capacity: usize, seed: u64) -> Self {
        Self {
            pool: Pool::new("effect", capacity, capacity),
            tuning: tuning.clone(),
            rng: Pcg32::seed_from_u64(seed),
            particles_enabled: true,
        }
    }

    pub fn pool(&self) -> &Pool<Effect> {
        &self.pool
    }

    pub fn iter_active(&self) -> impl Iterator<Item = &Effect> + '_ {
        self.pool.iter_active()
    }

    pub fn active_len(&self) -> usize {
        self.pool.active_len()
    }

    fn duration(&self, kind: EffectKind) -> f32 {
        match kind {
            EffectKind::Explosion => self.tuning.explosion_duration,
            EffectKind::Damage => self.tuning.damage_duration,
            EffectKind::Particle => self.tuning.particle_duration,
        }
    }

    pub fn spawn(&mut self, kind: EffectKind, pos: Vec2) -> Option<Handle> {
        let duration = self.duration(kind);
        let count = if self.particles_enabled {
            kind.particle_count()
        } else {
            0
        };
        let handle = self.pool.acquire()?;
        let effect = self.pool.get_mut(handle)?;
        effect.kind = kind;
        effect.pos = pos;
        effect.duration = duration;
        effect.emit(&mut self.rng, count);
        Some(handle)
    }

    pub fn update(&mut self, dt: f32) {
        let gravity = self.tuning.gravity;
        self.pool.retain_active(|effect| {
            effect.update(dt, gravity);
            effect.active
        });
    }

    pub fn clear(&mut self) {
        self.pool.clear();
    }
}

impl EffectSink for EffectsManager {
    fn explosion(&mut self, pos: Vec2) {
        self.spawn(EffectKind::Explosion, pos);
    }

    fn damage(&mut self, pos: Vec2) {
        self.spawn(EffectKind::Damage, pos);
    }

    fn particle_burst(&mut self, pos: Vec2) {
        self.spawn(EffectKind::Particle, pos);
    }
}
