//! The player ship

use glam::Vec2;

use super::tick::TickInput;
use crate::Bounds;
use crate::tuning::PlayerTuning;

#[derive(Debug, Clone)]
pub struct Player {
    /// Ship center
    pub pos: Vec2,
    pub size: Vec2,
    pub hitbox_radius: f32,
    pub lives: u8,
    pub alive: bool,
    /// Seconds of invincibility left (0 = vulnerable)
    pub invincible_timer: f32,
    /// Blink state while invincible
    pub visible: bool,
    blink_timer: f32,
    following_pointer: bool,
    tuning: PlayerTuning,
}

impl Player {
    pub fn new(tuning: &PlayerTuning, bounds: Bounds) -> Self {
        Self {
            pos: Self::spawn_point(tuning, bounds),
            size: tuning.size,
            hitbox_radius: tuning.hitbox_radius,
            lives: tuning.lives,
            alive: true,
            invincible_timer: 0.0,
            visible: true,
            blink_timer: 0.0,
            following_pointer: false,
            tuning: tuning.clone(),
        }
    }

    /// Bottom-center of the playfield
    fn spawn_point(tuning: &PlayerTuning, bounds: Bounds) -> Vec2 {
        Vec2::new(bounds.width / 2.0, bounds.height - tuning.spawn_offset)
    }

    pub fn is_invincible(&self) -> bool {
        self.invincible_timer > 0.0
    }

    /// True while enemy bullets and bodies can hurt the ship
    pub fn is_vulnerable(&self) -> bool {
        self.alive && !self.is_invincible()
    }

    pub fn is_following_pointer(&self) -> bool {
        self.following_pointer
    }

    /// Where shots leave the ship
    pub fn muzzle(&self) -> Vec2 {
        self.pos
    }

    pub fn update(&mut self, dt: f32, input: &TickInput, bounds: Bounds) {
        if !self.alive {
            return;
        }

        if self.is_invincible() {
            self.invincible_timer = (self.invincible_timer - dt).max(0.0);
            self.blink_timer += dt;
            if self.blink_timer >= self.tuning.blink_interval {
                self.visible = !self.visible;
                self.blink_timer = 0.0;
            }
            if !self.is_invincible() {
                self.visible = true;
            }
        }

        self.follow_pointer(dt, input);
        self.apply_movement(dt, input.movement);

        self.pos = bounds.clamp_box(self.pos, self.size / 2.0);
    }

    fn follow_pointer(&mut self, dt: f32, input: &TickInput) {
        let target = match input.pointer {
            Some(target) if input.pointer_down => target,
            _ => {
                self.following_pointer = false;
                return;
            }
        };
        self.following_pointer = true;

        let to_target = target - self.pos;
        let distance = to_target.length();
        if distance > self.tuning.follow_deadzone {
            // Never overshoot the pointer
            let step = (self.tuning.follow_speed * dt).min(distance);
            self.pos += to_target / distance * step;
        }
    }

    fn apply_movement(&mut self, dt: f32, movement: Vec2) {
        if movement == Vec2::ZERO {
            return;
        }
        let direction = movement.clamp_length_max(1.0);
        self.pos += direction * self.tuning.keyboard_speed * dt;
    }

    /// Lose a life; returns true if this hit killed the player
    ///
    /// Ignored while invincible or already dead.
    pub fn take_damage(&mut self) -> bool {
        if !self.is_vulnerable() {
            return false;
        }

        self.lives = self.lives.saturating_sub(1);
        if self.lives == 0 {
            self.alive = false;
            log::info!("Player destroyed");
            return true;
        }

        self.invincible_timer = self.tuning.invincible_duration;
        self.blink_timer = 0.0;
        log::debug!("Player hit, {} lives left", self.lives);
        false
    }

    /// Restore lives and position for a new run
    pub fn revive(&mut self, bounds: Bounds) {
        self.pos = Self::spawn_point(&self.tuning, bounds);
        self.lives = self.tuning.lives;
        self.alive = true;
        self.invincible_timer = 0.0;
        self.visible = true;
        self.blink_timer = 0.0;
        self.following_pointer = false;
    }
}
