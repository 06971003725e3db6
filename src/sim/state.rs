//! Game state and run bookkeeping
//!
//! `GameState` owns every manager; nothing in the simulation is global.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::bullet::BulletManager;
use super::collision::{CollisionEngine, CollisionStats};
use super::effects::EffectsManager;
use super::enemy::{EnemyManager, EnemyTier};
use super::enemy_bullet::EnemyBulletManager;
use super::experience::ExperienceTracker;
use super::player::Player;
use crate::Bounds;
use crate::tuning::Tuning;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Playing,
    Paused,
    /// Player ran out of lives
    GameOver,
    /// Every stage survived
    Clear,
}

/// Something the driver may want to react to (UI, sound, persistence)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    EnemyDestroyed { tier: EnemyTier, pos: Vec2, score: u64 },
    PlayerHit { lives_left: u8 },
    LevelUp { level: u32 },
    StageStart { stage: u32 },
    StageClear { stage: u32 },
    GameOver { score: u64 },
}

/// Snapshot for the debug overlay
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DebugInfo {
    pub bullets: usize,
    pub enemies: usize,
    pub enemy_bullets: usize,
    pub effects: usize,
    pub collision_frame: CollisionStats,
    pub collision_total: CollisionStats,
}

#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub tuning: Tuning,
    pub bounds: Bounds,
    pub phase: GamePhase,
    pub score: u64,
    /// Current stage, 1-based
    pub stage: u32,
    /// Seconds spent in the current stage
    pub stage_time: f32,
    /// Simulation clock (seconds)
    pub time: f64,
    pub frame: u64,
    pub player: Player,
    pub bullets: BulletManager,
    pub enemies: EnemyManager,
    pub enemy_bullets: EnemyBulletManager,
    pub effects: EffectsManager,
    pub experience: ExperienceTracker,
    pub collision: CollisionEngine,
    pub rng: Pcg32,
    /// Drained by the driver every frame
    pub events: Vec<GameEvent>,
}

impl GameState {
    /// `tuning` is clamped first, so values built in code are held to the
    /// same ranges as a loaded tuning file
    pub fn new(seed: u64, tuning: &Tuning, bounds: Bounds) -> Self {
        let mut tuning = tuning.clone();
        tuning.sanitize();
        let mut state = Self {
            seed,
            bounds,
            phase: GamePhase::Playing,
            score: 0,
            stage: 1,
            stage_time: 0.0,
            time: 0.0,
            frame: 0,
            player: Player::new(&tuning.player, bounds),
            bullets: BulletManager::new(&tuning.bullets),
            enemies: EnemyManager::new(&tuning.enemies),
            enemy_bullets: EnemyBulletManager::new(&tuning.enemy_bullets),
            // Separate stream so cosmetic effects never shift gameplay rolls
            effects: EffectsManager::new(
                &tuning.effects,
                tuning.effects.pool_size,
                seed.wrapping_add(1),
            ),
            experience: ExperienceTracker::new(&tuning.experience),
            collision: CollisionEngine::new(&tuning.collision, tuning.bullets.offscreen_margin),
            rng: Pcg32::seed_from_u64(seed),
            events: Vec::new(),
            tuning,
        };
        state.events.push(GameEvent::StageStart { stage: 1 });
        log::info!("New run (seed {seed})");
        state
    }

    /// Rebuild the effect pool for a quality preset
    pub fn configure_effects(&mut self, capacity: usize, particles: bool) {
        let mut effects = EffectsManager::new(
            &self.tuning.effects,
            capacity,
            self.seed.wrapping_add(1),
        );
        effects.particles_enabled = particles;
        self.effects = effects;
    }

    /// Start a fresh run with the same tuning and effect settings
    pub fn restart(&mut self, seed: u64) {
        let capacity = self.effects.pool().capacity();
        let particles = self.effects.particles_enabled;
        let debug = self.collision.debug;
        let tuning = self.tuning.clone();
        *self = Self::new(seed, &tuning, self.bounds);
        self.configure_effects(capacity, particles);
        self.collision.debug = debug;
    }

    /// Playfield changed size (window resize)
    pub fn resize(&mut self, bounds: Bounds) {
        self.bounds = bounds;
        self.player.pos = bounds.clamp_box(self.player.pos, self.player.size / 2.0);
    }

    pub fn score_for(&self, tier: EnemyTier) -> u64 {
        tier.stats(&self.tuning.enemies).score
    }

    /// Fraction of the current stage elapsed
    pub fn stage_progress(&self) -> f32 {
        (self.stage_time / self.tuning.stages.stage_duration).clamp(0.0, 1.0)
    }

    pub fn is_over(&self) -> bool {
        matches!(self.phase, GamePhase::GameOver | GamePhase::Clear)
    }

    pub fn drain_events(&mut self) -> std::vec::Drain<'_, GameEvent> {
        self.events.drain(..)
    }

    pub fn debug_info(&self) -> DebugInfo {
        DebugInfo {
            bullets: self.bullets.active_len(),
            enemies: self.enemies.active_len(),
            enemy_bullets: self.enemy_bullets.active_len(),
            effects: self.effects.active_len(),
            collision_frame: self.collision.frame_stats(),
            collision_total: self.collision.total_stats(),
        }
    }
}
