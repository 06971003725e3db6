//! Per-level player shot patterns

use glam::Vec2;

/// One projectile of a volley, relative to the muzzle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShotSpec {
    pub offset: Vec2,
    /// Launch velocity (px/s, negative y is up-screen)
    pub vel: Vec2,
    /// Scales the bullet box
    pub size_mult: f32,
}

const fn shot(ox: f32, oy: f32, vx: f32, vy: f32, size_mult: f32) -> ShotSpec {
    ShotSpec {
        offset: Vec2::new(ox, oy),
        vel: Vec2::new(vx, vy),
        size_mult,
    }
}

const LEVEL_1: [ShotSpec; 1] = [shot(0.0, -10.0, 0.0, -400.0, 1.0)];

const LEVEL_2: [ShotSpec; 2] = [
    shot(-6.0, -10.0, 0.0, -400.0, 1.0),
    shot(6.0, -10.0, 0.0, -400.0, 1.0),
];

const LEVEL_3: [ShotSpec; 3] = [
    shot(0.0, -10.0, 0.0, -400.0, 1.0),
    shot(-8.0, -10.0, -60.0, -400.0, 1.0),
    shot(8.0, -10.0, 60.0, -400.0, 1.0),
];

const LEVEL_4: [ShotSpec; 3] = [
    shot(0.0, -10.0, 0.0, -450.0, 1.5),
    shot(-8.0, -10.0, -70.0, -450.0, 1.5),
    shot(8.0, -10.0, 70.0, -450.0, 1.5),
];

// Level 4 plus a rearward shot
const LEVEL_5: [ShotSpec; 4] = [
    shot(0.0, -10.0, 0.0, -450.0, 1.5),
    shot(-8.0, -10.0, -70.0, -450.0, 1.5),
    shot(8.0, -10.0, 70.0, -450.0, 1.5),
    shot(0.0, 10.0, 0.0, 300.0, 1.2),
];

/// Volley for `level`; undefined levels use level 1
pub fn pattern_for_level(level: u32) -> &'static [ShotSpec] {
    match level {
        2 => &LEVEL_2,
        3 => &LEVEL_3,
        4 => &LEVEL_4,
        5 => &LEVEL_5,
        _ => &LEVEL_1,
    }
}
