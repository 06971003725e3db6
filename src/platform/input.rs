//! Raw input events to per-frame `TickInput`
//!
//! Browser callbacks feed events in as they arrive; the frame loop calls
//! [`InputState::sample`] once per simulated step.

use glam::Vec2;

use crate::sim::TickInput;

/// Logical action bound to a physical key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
    Shoot,
    Pause,
    Restart,
    Debug,
}

const ACTION_COUNT: usize = 8;

impl Action {
    fn index(self) -> usize {
        self as usize
    }

    /// Map a `KeyboardEvent.code`
    pub fn from_code(code: &str) -> Option<Self> {
        Some(match code {
            "ArrowUp" | "KeyW" => Action::Up,
            "ArrowDown" | "KeyS" => Action::Down,
            "ArrowLeft" | "KeyA" => Action::Left,
            "ArrowRight" | "KeyD" => Action::Right,
            "Space" | "KeyX" => Action::Shoot,
            "KeyP" | "Escape" => Action::Pause,
            "KeyR" => Action::Restart,
            "F3" | "Backquote" => Action::Debug,
            _ => return None,
        })
    }

    /// Keys whose browser default (scrolling) should be suppressed
    pub fn blocks_default(self) -> bool {
        matches!(
            self,
            Action::Up | Action::Down | Action::Left | Action::Right | Action::Shoot
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct InputState {
    held: [bool; ACTION_COUNT],
    /// Went down since the last sample
    pressed: [bool; ACTION_COUNT],
    pointer_down: bool,
    pointer: Option<Vec2>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the bound action, if any, so the caller can block defaults
    pub fn key_down(&mut self, code: &str) -> Option<Action> {
        let action = Action::from_code(code)?;
        let i = action.index();
        // Ignore auto-repeat
        if !self.held[i] {
            self.pressed[i] = true;
        }
        self.held[i] = true;
        Some(action)
    }

    pub fn key_up(&mut self, code: &str) -> Option<Action> {
        let action = Action::from_code(code)?;
        self.held[action.index()] = false;
        Some(action)
    }

    pub fn pointer_down(&mut self, pos: Vec2) {
        self.pointer_down = true;
        self.pointer = Some(pos);
    }

    pub fn pointer_move(&mut self, pos: Vec2) {
        self.pointer = Some(pos);
    }

    pub fn pointer_up(&mut self) {
        self.pointer_down = false;
    }

    pub fn is_held(&self, action: Action) -> bool {
        self.held[action.index()]
    }

    /// Register a one-shot press without holding the key
    pub fn trigger(&mut self, action: Action) {
        self.pressed[action.index()] = true;
    }

    /// Drop everything held (window blur, tab hidden)
    pub fn release_all(&mut self) {
        self.held = [false; ACTION_COUNT];
        self.pressed = [false; ACTION_COUNT];
        self.pointer_down = false;
    }

    /// Snapshot for one simulation step; consumes just-pressed edges
    pub fn sample(&mut self) -> TickInput {
        let axis = |neg: Action, pos: Action| {
            f32::from(u8::from(self.is_held(pos))) - f32::from(u8::from(self.is_held(neg)))
        };
        let movement = Vec2::new(
            axis(Action::Left, Action::Right),
            axis(Action::Up, Action::Down),
        );

        let input = TickInput {
            pointer_down: self.pointer_down,
            pointer: self.pointer,
            shoot: self.is_held(Action::Shoot),
            movement,
            pause: self.pressed[Action::Pause.index()],
            toggle_debug: self.pressed[Action::Debug.index()],
            restart: self.pressed[Action::Restart.index()],
        };
        self.pressed = [false; ACTION_COUNT];
        input
    }
}
