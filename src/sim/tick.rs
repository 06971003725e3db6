//! Per-frame simulation step
//!
//! Order within a frame: player, shooting, player bullets, enemies (which
//! may fire), enemy bullets, collision, level sync, effects, stage timer.
//! Anything spawned by a step is only seen by the steps after it.

use glam::Vec2;

use super::collision::Participants;
use super::state::{GameEvent, GamePhase, GameState};
use crate::consts::MAX_FRAME_DT;

/// Input sampled once per frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickInput {
    /// Touch or mouse button held
    pub pointer_down: bool,
    /// Pointer position in playfield coordinates
    pub pointer: Option<Vec2>,
    /// Fire key held
    pub shoot: bool,
    /// Keyboard direction, each axis in -1..=1
    pub movement: Vec2,
    /// Pause toggle pressed this frame
    pub pause: bool,
    /// Debug overlay toggle pressed this frame
    pub toggle_debug: bool,
    /// Start a new run after game over or clear
    pub restart: bool,
}

/// Advance the game by `dt` seconds
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    if input.toggle_debug {
        state.collision.debug = !state.collision.debug;
        log::info!("Debug mode {}", if state.collision.debug { "on" } else { "off" });
    }

    if input.pause {
        match state.phase {
            GamePhase::Playing => {
                state.phase = GamePhase::Paused;
                state.bullets.stop_auto_fire();
                return;
            }
            GamePhase::Paused => state.phase = GamePhase::Playing,
            _ => {}
        }
    }

    match state.phase {
        GamePhase::Playing => {}
        GamePhase::Paused => return,
        GamePhase::GameOver | GamePhase::Clear => {
            if input.restart {
                let seed = state.seed.wrapping_add(1);
                state.restart(seed);
            }
            return;
        }
    }

    let dt = dt.clamp(0.0, MAX_FRAME_DT);
    state.time += dt as f64;
    state.frame += 1;
    let bounds = state.bounds;

    state.player.update(dt, input, bounds);
    handle_shooting(state, input);
    state.bullets.update(dt, bounds);

    let target = state.player.alive.then_some(state.player.pos);
    state
        .enemies
        .update(dt, bounds, target, &mut state.enemy_bullets, &mut state.rng);
    state.enemy_bullets.update(dt, bounds, target);

    let report = state.collision.process(
        Participants {
            player: &mut state.player,
            bullets: &mut state.bullets,
            enemies: &mut state.enemies,
            enemy_bullets: &mut state.enemy_bullets,
            bounds,
        },
        &mut state.effects,
        &mut state.experience,
    );

    for destroyed in &report.destroyed {
        let score = state.score_for(destroyed.tier);
        state.score += score;
        state.events.push(GameEvent::EnemyDestroyed {
            tier: destroyed.tier,
            pos: destroyed.pos,
            score,
        });
    }
    if report.player_hits > 0 {
        state.events.push(GameEvent::PlayerHit {
            lives_left: state.player.lives,
        });
    }

    let level = state.experience.level();
    let previous = state.bullets.level();
    if level != previous {
        state.bullets.set_level(level);
        // One event per level, even when a single pass crosses several
        for reached in (previous + 1)..=level {
            state.events.push(GameEvent::LevelUp { level: reached });
        }
    }

    state.effects.update(dt);

    if report.player_died {
        state.phase = GamePhase::GameOver;
        state.bullets.stop_auto_fire();
        state.events.push(GameEvent::GameOver { score: state.score });
        log::info!("Game over, score {}", state.score);
        return;
    }

    advance_stage(state, dt);
}

fn handle_shooting(state: &mut GameState, input: &TickInput) {
    if !state.player.alive {
        state.bullets.stop_auto_fire();
        return;
    }
    if input.pointer_down || input.shoot {
        state.bullets.start_auto_fire();
        state
            .bullets
            .update_auto_fire(state.time, state.player.muzzle());
    } else {
        state.bullets.stop_auto_fire();
    }
}

fn advance_stage(state: &mut GameState, dt: f32) {
    state.stage_time += dt;
    if state.stage_time < state.tuning.stages.stage_duration {
        return;
    }

    state.events.push(GameEvent::StageClear { stage: state.stage });
    if state.stage >= state.tuning.stages.stage_count {
        state.phase = GamePhase::Clear;
        state.bullets.stop_auto_fire();
        log::info!("All stages clear, score {}", state.score);
        return;
    }

    state.stage += 1;
    state.stage_time = 0.0;
    state.events.push(GameEvent::StageStart { stage: state.stage });
    log::info!("Stage {} started", state.stage);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Bounds;
    use crate::sim::enemy::EnemyTier;
    use crate::tuning::Tuning;

    const DT: f32 = 1.0 / 60.0;

    fn state() -> GameState {
        let mut state = GameState::new(7, &Tuning::default(), Bounds::default());
        state.events.clear();
        state
    }

    fn firing() -> TickInput {
        TickInput {
            shoot: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_pause_freezes_simulation() {
        let mut state = state();
        tick(
            &mut state,
            &TickInput {
                pause: true,
                ..Default::default()
            },
            DT,
        );
        assert_eq!(state.phase, GamePhase::Paused);
        let time = state.time;
        for _ in 0..10 {
            tick(&mut state, &firing(), DT);
        }
        assert_eq!(state.time, time);
        assert_eq!(state.bullets.active_len(), 0);

        tick(
            &mut state,
            &TickInput {
                pause: true,
                ..Default::default()
            },
            DT,
        );
        assert_eq!(state.phase, GamePhase::Playing);
        assert!(state.time > time);
    }

    #[test]
    fn test_holding_fire_spawns_volleys() {
        let mut state = state();
        // One second at level 1 is five volleys
        for _ in 0..60 {
            tick(&mut state, &firing(), DT);
        }
        let fired = state.bullets.stats().fired;
        assert!((5..=6).contains(&fired), "fired {fired}");

        tick(&mut state, &TickInput::default(), DT);
        assert!(!state.bullets.is_auto_firing());
    }

    #[test]
    fn test_kill_scores_and_levels_up() {
        let mut state = state();
        let above = state.player.pos - Vec2::new(0.0, 60.0);
        state.enemies.spawn_at(EnemyTier::Large, above);
        for _ in 0..8 {
            // Hold the target still under the gun
            let handle = state.enemies.active_handles().first().copied();
            if let Some(enemy) = handle.and_then(|h| state.enemies.get_mut(h)) {
                enemy.pos = above;
            }
            state.bullets.fire_single(state.time, above, Vec2::ZERO);
            state.time += 1.0;
            tick(&mut state, &TickInput::default(), DT);
        }
        assert_eq!(state.score, 1000);
        assert_eq!(state.experience.level(), 2);
        assert_eq!(state.bullets.level(), 2);
        assert!(state.events.contains(&GameEvent::LevelUp { level: 2 }));
    }

    #[test]
    fn test_double_level_up_announces_each_level() {
        let mut state = state();
        // 10 + 30 exp crosses levels 2 and 3 in one frame
        assert_eq!(state.experience.gain(40), 2);
        tick(&mut state, &TickInput::default(), DT);

        let levels: Vec<u32> = state
            .drain_events()
            .filter_map(|event| match event {
                GameEvent::LevelUp { level } => Some(level),
                _ => None,
            })
            .collect();
        assert_eq!(levels, vec![2, 3]);
        assert_eq!(state.bullets.level(), 3);
    }

    #[test]
    fn test_death_ends_run() {
        let mut state = state();
        state.player.lives = 1;
        let ship = state.player.pos;
        state.enemy_bullets.spawn_straight(ship, Vec2::ZERO);
        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert!(state.events.contains(&GameEvent::GameOver { score: 0 }));

        // Frozen until restart
        let frame = state.frame;
        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.frame, frame);

        tick(
            &mut state,
            &TickInput {
                restart: true,
                ..Default::default()
            },
            DT,
        );
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.player.lives, 3);
    }

    #[test]
    fn test_stages_advance_then_clear() {
        let tuning = Tuning {
            stages: crate::tuning::StageTuning {
                stage_count: 2,
                stage_duration: 1.0,
            },
            ..Default::default()
        };
        let mut state = GameState::new(3, &tuning, Bounds::default());
        state.player.invincible_timer = 100.0;
        for _ in 0..11 {
            tick(&mut state, &TickInput::default(), 0.1);
        }
        assert_eq!(state.stage, 2);
        assert_eq!(state.phase, GamePhase::Playing);
        for _ in 0..11 {
            tick(&mut state, &TickInput::default(), 0.1);
        }
        assert_eq!(state.phase, GamePhase::Clear);
        assert!(state.events.contains(&GameEvent::StageClear { stage: 2 }));
    }

    #[test]
    fn test_large_dt_is_clamped() {
        let mut state = state();
        tick(&mut state, &TickInput::default(), 5.0);
        assert!((state.time - MAX_FRAME_DT as f64).abs() < 1e-9);
    }

    #[test]
    fn test_same_seed_same_run() {
        let mut a = state();
        let mut b = state();
        let input = firing();
        for _ in 0..600 {
            tick(&mut a, &input, DT);
            tick(&mut b, &input, DT);
        }
        assert_eq!(a.score, b.score);
        assert_eq!(a.enemies.spawned(), b.enemies.spawned());
        let pa: Vec<Vec2> = a.enemies.iter_active().map(|e| e.pos).collect();
        let pb: Vec<Vec2> = b.enemies.iter_active().map(|e| e.pos).collect();
        assert_eq!(pa, pb);
    }

    #[test]
    fn test_debug_toggle() {
        let mut state = state();
        let input = TickInput {
            toggle_debug: true,
            ..Default::default()
        };
        tick(&mut state, &input, DT);
        assert!(state.collision.debug);
    }
}
