//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Explicit `dt` only, no wall clock
//! - Seeded RNG only
//! - Fixed-capacity pools, no per-frame entity allocation
//! - No rendering or platform dependencies

pub mod bullet;
pub mod clock;
pub mod collision;
pub mod effects;
pub mod enemy;
pub mod enemy_bullet;
pub mod experience;
pub mod patterns;
pub mod player;
pub mod pool;
pub mod state;
pub mod tick;

pub use bullet::{Bullet, BulletManager, BulletStats};
pub use clock::FrameClock;
pub use collision::{
    CollisionEngine, CollisionReport, CollisionStats, ContactSample, DestroyedEnemy, EffectSink,
    ExperienceSink, Hitbox, Participants, circle_overlap, rough_reject,
};
pub use effects::{Effect, EffectKind, EffectsManager, Particle};
pub use enemy::{Enemy, EnemyManager, EnemyTier, TierCounts};
pub use enemy_bullet::{EnemyBullet, EnemyBulletKind, EnemyBulletManager};
pub use experience::ExperienceTracker;
pub use patterns::{ShotSpec, pattern_for_level};
pub use player::Player;
pub use pool::{Handle, Pool, PoolStats, Poolable};
pub use state::{DebugInfo, GameEvent, GamePhase, GameState};
pub use tick::{TickInput, tick};
