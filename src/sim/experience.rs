//! Experience and player level

use super::collision::ExperienceSink;
use super::enemy::EnemyTier;
use crate::consts::{MAX_LEVEL, MIN_LEVEL};
use crate::tuning::ExperienceTuning;

#[derive(Debug, Clone)]
pub struct ExperienceTracker {
    level: u32,
    /// Experience toward the next level
    exp: u32,
    total: u64,
    tuning: ExperienceTuning,
}

impl ExperienceTracker {
    pub fn new(tuning: &ExperienceTuning) -> Self {
        Self {
            level: MIN_LEVEL,
            exp: 0,
            total: 0,
            tuning: tuning.clone(),
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn exp(&self) -> u32 {
        self.exp
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Experience needed to leave the current level; `None` at the top
    pub fn exp_to_next(&self) -> Option<u32> {
        if self.level >= MAX_LEVEL {
            return None;
        }
        self.tuning
            .exp_to_next
            .get((self.level - MIN_LEVEL) as usize)
            .copied()
    }

    pub fn is_max_level(&self) -> bool {
        self.exp_to_next().is_none()
    }

    /// Fraction of the way to the next level, 1.0 at the top
    pub fn progress(&self) -> f32 {
        match self.exp_to_next() {
            Some(need) if need > 0 => (self.exp as f32 / need as f32).min(1.0),
            _ => 1.0,
        }
    }

    pub fn exp_for(&self, tier: EnemyTier) -> u32 {
        match tier {
            EnemyTier::Small => self.tuning.small,
            EnemyTier::Medium => self.tuning.medium,
            EnemyTier::Large => self.tuning.large,
        }
    }

    /// Add experience; returns how many levels were gained
    ///
    /// Leftover experience carries into the next level. Nothing is gained
    /// once the top level is reached.
    pub fn gain(&mut self, amount: u32) -> u32 {
        if self.is_max_level() {
            return 0;
        }
        self.exp += amount;
        self.total += u64::from(amount);

        let mut gained = 0;
        while let Some(need) = self.exp_to_next() {
            if self.exp < need {
                break;
            }
            self.exp -= need;
            self.level += 1;
            gained += 1;
            log::info!("Level up! Now level {}", self.level);
        }
        if self.is_max_level() {
            self.exp = 0;
        }
        gained
    }

    pub fn reset(&mut self) {
        self.level = MIN_LEVEL;
        self.exp = 0;
        self.total = 0;
    }
}

impl ExperienceSink for ExperienceTracker {
    fn award(&mut self, tier: EnemyTier) {
        let amount = self.exp_for(tier);
        self.gain(amount);
    }
}
