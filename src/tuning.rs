//! Data-driven game balance
//!
//! Every gameplay constant lives here so balance passes never touch the
//! simulation code. Units: pixels, pixels/second, seconds.
//!
//! A tuning file may specify any subset of fields; missing ones take their
//! defaults. Out-of-range values are clamped by [`Tuning::sanitize`] rather
//! than rejected.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::MAX_LEVEL;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Tuning {
    pub player: PlayerTuning,
    pub bullets: BulletTuning,
    pub enemies: EnemyTuning,
    pub enemy_bullets: EnemyBulletTuning,
    pub effects: EffectTuning,
    pub collision: CollisionTuning,
    pub experience: ExperienceTuning,
    pub stages: StageTuning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    pub size: Vec2,
    /// Collision circle, deliberately smaller than the sprite
    pub hitbox_radius: f32,
    pub lives: u8,
    pub invincible_duration: f32,
    pub blink_interval: f32,
    /// Pointer-follow speed (px/s)
    pub follow_speed: f32,
    /// Stop following once this close to the pointer
    pub follow_deadzone: f32,
    pub keyboard_speed: f32,
    /// Spawn height above the bottom edge
    pub spawn_offset: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            size: Vec2::new(24.0, 32.0),
            hitbox_radius: 8.0,
            lives: 3,
            invincible_duration: 2.0,
            blink_interval: 0.1,
            follow_speed: 480.0,
            follow_deadzone: 5.0,
            keyboard_speed: 200.0,
            spawn_offset: 80.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BulletTuning {
    pub pool_size: usize,
    pub size: Vec2,
    pub damage: i32,
    pub fire_interval: f32,
    /// Hard floor for any configured fire interval
    pub min_fire_interval: f32,
    /// Fire interval per player level, index 0 = level 1
    pub level_intervals: Vec<f32>,
    pub offscreen_margin: f32,
}

impl Default for BulletTuning {
    fn default() -> Self {
        Self {
            pool_size: 100,
            size: Vec2::new(6.0, 14.0),
            damage: 1,
            fire_interval: 0.2,
            min_fire_interval: 0.05,
            level_intervals: vec![0.2, 0.18, 0.16, 0.14, 0.12],
            offscreen_margin: 20.0,
        }
    }
}

/// Per-tier enemy stats
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierTuning {
    pub hp: i32,
    pub size: Vec2,
    /// Descent speed (px/s)
    pub speed: f32,
    /// Shoot-timer jitter band (seconds); ignored by tiers that never shoot
    pub fire_interval_min: f32,
    pub fire_interval_max: f32,
    pub score: u64,
}

impl Default for TierTuning {
    fn default() -> Self {
        Self {
            hp: 1,
            size: Vec2::new(16.0, 16.0),
            speed: 150.0,
            fire_interval_min: 1.0,
            fire_interval_max: 1.0,
            score: 100,
        }
    }
}

/// Relative spawn weights; need not sum to 100
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierWeights {
    pub small: u32,
    pub medium: u32,
    pub large: u32,
}

impl Default for TierWeights {
    fn default() -> Self {
        Self {
            small: 70,
            medium: 25,
            large: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTuning {
    pub pool_size: usize,
    pub max_active: usize,
    pub first_spawn_delay: f32,
    pub spawn_interval_min: f32,
    pub spawn_interval_max: f32,
    /// Horizontal spawn margin from either edge
    pub spawn_margin: f32,
    pub weights: TierWeights,
    pub small: TierTuning,
    pub medium: TierTuning,
    pub large: TierTuning,
    /// Large-tier volley shape
    pub spread_count: u32,
    pub spread_angle: f32,
    /// Every Nth large-tier volley is a full ring instead of a fan (0 = never)
    pub ring_every: u32,
    pub ring_count: u32,
}

impl Default for EnemyTuning {
    fn default() -> Self {
        Self {
            pool_size: 20,
            max_active: 8,
            first_spawn_delay: 2.0,
            spawn_interval_min: 0.8,
            spawn_interval_max: 2.3,
            spawn_margin: 20.0,
            weights: TierWeights::default(),
            small: TierTuning::default(),
            medium: TierTuning {
                hp: 3,
                size: Vec2::new(24.0, 24.0),
                speed: 100.0,
                fire_interval_min: 1.5,
                fire_interval_max: 2.5,
                score: 300,
            },
            large: TierTuning {
                hp: 8,
                size: Vec2::new(36.0, 32.0),
                speed: 60.0,
                fire_interval_min: 2.0,
                fire_interval_max: 3.5,
                score: 1000,
            },
            spread_count: 5,
            spread_angle: std::f32::consts::FRAC_PI_3,
            ring_every: 3,
            ring_count: 12,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyBulletTuning {
    pub pool_size: usize,
    pub max_active: usize,
    pub size: Vec2,
    pub straight_speed: f32,
    pub homing_speed: f32,
    pub spread_speed: f32,
    /// Maximum homing turn (rad/s)
    pub turn_rate: f32,
    /// Homing window before the bullet flies straight
    pub homing_duration: f32,
    pub offscreen_margin: f32,
}

impl Default for EnemyBulletTuning {
    fn default() -> Self {
        Self {
            pool_size: 200,
            max_active: 100,
            size: Vec2::new(6.0, 6.0),
            straight_speed: 100.0,
            homing_speed: 80.0,
            spread_speed: 100.0,
            turn_rate: 3.0,
            homing_duration: 2.0,
            offscreen_margin: 50.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectTuning {
    pub pool_size: usize,
    pub explosion_duration: f32,
    pub damage_duration: f32,
    pub particle_duration: f32,
    /// Downward pull on explosion debris (px/s²)
    pub gravity: f32,
}

impl Default for EffectTuning {
    fn default() -> Self {
        Self {
            pool_size: 50,
            explosion_duration: 0.5,
            damage_duration: 0.3,
            particle_duration: 0.8,
            gravity: 100.0,
        }
    }
}

/// Collision radius policy and scan budget
///
/// Radii are `min(width, height) / divisor`; the player uses its explicit
/// hitbox radius instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionTuning {
    pub player_bullet_divisor: f32,
    pub enemy_bullet_divisor: f32,
    pub small_divisor: f32,
    pub medium_divisor: f32,
    pub large_divisor: f32,
    pub max_checks_per_frame: u32,
    pub screen_culling: bool,
    pub rough_filter: bool,
}

impl Default for CollisionTuning {
    fn default() -> Self {
        Self {
            player_bullet_divisor: 2.5,
            enemy_bullet_divisor: 2.2,
            small_divisor: 2.2,
            medium_divisor: 2.5,
            large_divisor: 3.0,
            max_checks_per_frame: 500,
            screen_culling: true,
            rough_filter: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperienceTuning {
    /// Experience needed to leave each level, index 0 = level 1
    pub exp_to_next: Vec<u32>,
    pub small: u32,
    pub medium: u32,
    pub large: u32,
}

impl Default for ExperienceTuning {
    fn default() -> Self {
        Self {
            exp_to_next: vec![10, 30, 60, 100],
            small: 1,
            medium: 3,
            large: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageTuning {
    pub stage_count: u32,
    pub stage_duration: f32,
}

impl Default for StageTuning {
    fn default() -> Self {
        Self {
            stage_count: 3,
            stage_duration: 60.0,
        }
    }
}

impl Tuning {
    /// Parse a (possibly partial) tuning document and clamp it
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut tuning: Tuning = serde_json::from_str(json)?;
        tuning.sanitize();
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Clamp every value into a range the simulation can run with
    pub fn sanitize(&mut self) {
        let p = &mut self.player;
        p.size = p.size.max(Vec2::ONE);
        p.hitbox_radius = p.hitbox_radius.max(0.5);
        p.lives = p.lives.max(1);
        p.invincible_duration = p.invincible_duration.max(0.0);
        p.blink_interval = p.blink_interval.max(0.01);
        p.follow_speed = p.follow_speed.max(0.0);
        p.follow_deadzone = p.follow_deadzone.max(0.0);
        p.keyboard_speed = p.keyboard_speed.max(0.0);

        let b = &mut self.bullets;
        b.pool_size = b.pool_size.max(1);
        b.size = b.size.max(Vec2::ONE);
        b.damage = b.damage.max(1);
        b.min_fire_interval = b.min_fire_interval.max(0.001);
        b.fire_interval = b.fire_interval.max(b.min_fire_interval);
        let floor = b.min_fire_interval;
        b.level_intervals.truncate(MAX_LEVEL as usize);
        for interval in &mut b.level_intervals {
            *interval = interval.max(floor);
        }
        b.offscreen_margin = b.offscreen_margin.max(0.0);

        let e = &mut self.enemies;
        e.pool_size = e.pool_size.max(1);
        e.max_active = e.max_active.clamp(1, e.pool_size);
        e.first_spawn_delay = e.first_spawn_delay.max(0.0);
        e.spawn_interval_min = e.spawn_interval_min.max(0.05);
        e.spawn_interval_max = e.spawn_interval_max.max(e.spawn_interval_min);
        e.spawn_margin = e.spawn_margin.max(0.0);
        for tier in [&mut e.small, &mut e.medium, &mut e.large] {
            tier.hp = tier.hp.max(1);
            tier.size = tier.size.max(Vec2::ONE);
            tier.speed = tier.speed.max(0.0);
            tier.fire_interval_min = tier.fire_interval_min.max(0.1);
            tier.fire_interval_max = tier.fire_interval_max.max(tier.fire_interval_min);
        }
        e.spread_count = e.spread_count.max(1);
        e.spread_angle = e.spread_angle.clamp(0.0, std::f32::consts::TAU);
        e.ring_count = e.ring_count.max(1);

        let eb = &mut self.enemy_bullets;
        eb.pool_size = eb.pool_size.max(1);
        eb.max_active = eb.max_active.clamp(1, eb.pool_size);
        eb.size = eb.size.max(Vec2::ONE);
        eb.straight_speed = eb.straight_speed.max(0.0);
        eb.homing_speed = eb.homing_speed.max(0.0);
        eb.spread_speed = eb.spread_speed.max(0.0);
        eb.turn_rate = eb.turn_rate.max(0.0);
        eb.homing_duration = eb.homing_duration.max(0.0);
        eb.offscreen_margin = eb.offscreen_margin.max(0.0);

        let fx = &mut self.effects;
        fx.pool_size = fx.pool_size.max(1);
        fx.explosion_duration = fx.explosion_duration.max(0.01);
        fx.damage_duration = fx.damage_duration.max(0.01);
        fx.particle_duration = fx.particle_duration.max(0.01);

        let c = &mut self.collision;
        for divisor in [
            &mut c.player_bullet_divisor,
            &mut c.enemy_bullet_divisor,
            &mut c.small_divisor,
            &mut c.medium_divisor,
            &mut c.large_divisor,
        ] {
            *divisor = divisor.max(1.0);
        }
        c.max_checks_per_frame = c.max_checks_per_frame.max(1);

        let x = &mut self.experience;
        x.exp_to_next.truncate(MAX_LEVEL as usize - 1);
        for exp in &mut x.exp_to_next {
            *exp = (*exp).max(1);
        }

        let s = &mut self.stages;
        s.stage_count = s.stage_count.max(1);
        s.stage_duration = s.stage_duration.max(1.0);
    }
}
