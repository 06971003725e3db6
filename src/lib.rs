//! Cyber Shooter - A neon top-down bullet-hell shooter
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entity pools, collisions, game state)
//! - `renderer`: Immediate-mode 2D canvas drawing of the simulation
//! - `platform`: Browser/native platform abstraction (input, storage)
//! - `tuning`: Data-driven game balance
//! - `settings` / `highscores`: Persisted player preferences and scores

pub mod highscores;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use highscores::HighScores;
pub use settings::{QualityPreset, Settings};
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Target frame interval (60 Hz)
    pub const FRAME_DT: f32 = 1.0 / 60.0;
    /// Largest step handed to the simulation (tab switches, debugger pauses)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Default logical playfield size
    pub const SCREEN_WIDTH: f32 = 480.0;
    pub const SCREEN_HEIGHT: f32 = 720.0;

    /// Player levels
    pub const MIN_LEVEL: u32 = 1;
    pub const MAX_LEVEL: u32 = 5;
}

/// Playfield bounds in pixels, origin at the top-left corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            width: consts::SCREEN_WIDTH,
            height: consts::SCREEN_HEIGHT,
        }
    }
}

impl Bounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
        }
    }

    /// True if `pos` lies inside the bounds grown by `margin` on every side
    #[inline]
    pub fn contains(&self, pos: Vec2, margin: f32) -> bool {
        pos.x >= -margin
            && pos.x <= self.width + margin
            && pos.y >= -margin
            && pos.y <= self.height + margin
    }

    /// Clamp a centered box of `half` extents into the bounds
    pub fn clamp_box(&self, pos: Vec2, half: Vec2) -> Vec2 {
        Vec2::new(
            pos.x.clamp(half.x, (self.width - half.x).max(half.x)),
            pos.y.clamp(half.y, (self.height - half.y).max(half.y)),
        )
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    // rem_euclid may round up to TAU for inputs just below a multiple
    if wrapped >= PI { -PI } else { wrapped }
}

/// Unit vector pointing along `angle` (radians, 0 = +x, screen y grows down)
#[inline]
pub fn heading(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// Bearing from `from` toward `to`
#[inline]
pub fn bearing(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x)
}
