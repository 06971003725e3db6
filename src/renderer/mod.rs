//! Immediate-mode 2D rendering
//!
//! Draws a [`GameState`] onto anything implementing [`Canvas`]. The pass is
//! read-only: it walks each active list front to back and never touches the
//! simulation.

#[cfg(target_arch = "wasm32")]
mod canvas;

use glam::Vec2;

use crate::sim::{EffectKind, EnemyBulletKind, EnemyTier, GamePhase, GameState};

/// Neon palette (CSS colors)
pub mod palette {
    pub const BACKGROUND: &str = "#0a0014";
    pub const GRID: &str = "#1a0a33";
    pub const PLAYER: &str = "#00fff7";
    pub const PLAYER_BULLET: &str = "#7dfcff";
    pub const ENEMY_SMALL: &str = "#ff2a6d";
    pub const ENEMY_MEDIUM: &str = "#ff9e00";
    pub const ENEMY_LARGE: &str = "#b300ff";
    pub const BULLET_STRAIGHT: &str = "#ff5577";
    pub const BULLET_HOMING: &str = "#ffe600";
    pub const BULLET_SPREAD: &str = "#ff66ff";
    pub const HP_BAR: &str = "#39ff14";
    pub const HUD_TEXT: &str = "#e0e0ff";
    pub const EXP_BAR: &str = "#2de2e6";
    pub const EXP_TRACK: &str = "#22224a";
    pub const HITBOX: &str = "#7fff00";
    pub const CONTACT: &str = "#ff0000";
    pub const OVERLAY: &str = "#000000";

    /// Particle colors, indexed by `Particle::shade`
    pub const SPARKS: [&str; 4] = ["#ffffff", "#fff3a0", "#ffb347", "#ff4f81"];
}

/// Text alignment for [`Canvas::fill_text`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// Minimal drawing surface
pub trait Canvas {
    fn clear(&mut self, width: f32, height: f32, color: &str);
    /// Global alpha for following draws, 0.0..=1.0
    fn set_alpha(&mut self, alpha: f32);
    /// Glow halo for following draws; `blur` of 0 turns it off
    fn set_glow(&mut self, blur: f32, color: &str);
    fn fill_rect(&mut self, pos: Vec2, size: Vec2, color: &str);
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: &str);
    fn stroke_circle(&mut self, center: Vec2, radius: f32, width: f32, color: &str);
    fn fill_text(&mut self, text: &str, pos: Vec2, size: f32, align: Align, color: &str);
}

/// Presentation options that do not affect the simulation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    pub glow: bool,
    /// Frames per second to show, if any
    pub fps: Option<f32>,
    pub reduced_motion: bool,
    /// Best score on the board, for the end screens
    pub high_score: Option<u64>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            glow: true,
            fps: None,
            reduced_motion: false,
            high_score: None,
        }
    }
}

const GLOW_BLUR: f32 = 12.0;
const HUD_FONT: f32 = 16.0;
const GRID_SPACING: f32 = 40.0;

fn enemy_color(tier: EnemyTier) -> &'static str {
    match tier {
        EnemyTier::Small => palette::ENEMY_SMALL,
        EnemyTier::Medium => palette::ENEMY_MEDIUM,
        EnemyTier::Large => palette::ENEMY_LARGE,
    }
}

fn enemy_bullet_color(kind: EnemyBulletKind) -> &'static str {
    match kind {
        EnemyBulletKind::Straight => palette::BULLET_STRAIGHT,
        EnemyBulletKind::Homing => palette::BULLET_HOMING,
        EnemyBulletKind::Spread => palette::BULLET_SPREAD,
    }
}

/// Draw one frame
pub fn draw_frame(canvas: &mut dyn Canvas, state: &GameState, options: &RenderOptions) {
    let bounds = state.bounds;
    canvas.set_alpha(1.0);
    canvas.set_glow(0.0, palette::BACKGROUND);
    canvas.clear(bounds.width, bounds.height, palette::BACKGROUND);
    draw_grid(canvas, state);

    for enemy in state.enemies.iter_active() {
        let color = enemy_color(enemy.tier);
        glow(canvas, options, color);
        canvas.fill_rect(enemy.pos - enemy.size / 2.0, enemy.size, color);

        // Only tiers that can take more than one hit get a health bar
        if enemy.max_hp > 1 {
            canvas.set_glow(0.0, color);
            let frac = (enemy.hp.max(0) as f32) / (enemy.max_hp as f32);
            let top_left = enemy.pos - enemy.size / 2.0 - Vec2::new(0.0, 6.0);
            canvas.fill_rect(
                top_left,
                Vec2::new(enemy.size.x * frac, 3.0),
                palette::HP_BAR,
            );
        }
    }

    glow(canvas, options, palette::PLAYER_BULLET);
    for bullet in state.bullets.iter_active() {
        canvas.fill_rect(
            bullet.pos - bullet.size / 2.0,
            bullet.size,
            palette::PLAYER_BULLET,
        );
    }

    for bullet in state.enemy_bullets.iter_active() {
        let color = enemy_bullet_color(bullet.kind);
        glow(canvas, options, color);
        canvas.fill_circle(bullet.pos, bullet.size.min_element() / 2.0, color);
    }

    draw_player(canvas, state, options);

    canvas.set_glow(0.0, palette::BACKGROUND);
    for effect in state.effects.iter_active() {
        if effect.kind == EffectKind::Damage && options.reduced_motion {
            continue;
        }
        for particle in &effect.particles {
            if particle.life <= 0.0 {
                continue;
            }
            let color = palette::SPARKS[usize::from(particle.shade) % palette::SPARKS.len()];
            canvas.set_alpha(particle.life.clamp(0.0, 1.0));
            canvas.fill_circle(particle.pos, particle.size.max(0.5), color);
        }
    }
    canvas.set_alpha(1.0);

    if state.collision.debug {
        draw_debug(canvas, state);
    }
    draw_hud(canvas, state, options);
    draw_phase_overlay(canvas, state, options);
}

fn glow(canvas: &mut dyn Canvas, options: &RenderOptions, color: &str) {
    if options.glow {
        canvas.set_glow(GLOW_BLUR, color);
    }
}

fn draw_grid(canvas: &mut dyn Canvas, state: &GameState) {
    let bounds = state.bounds;
    // Scrolls with simulation time for a sense of forward motion
    let offset = ((state.time as f32) * 60.0) % GRID_SPACING;
    let mut y = offset - GRID_SPACING;
    while y < bounds.height {
        canvas.fill_rect(Vec2::new(0.0, y), Vec2::new(bounds.width, 1.0), palette::GRID);
        y += GRID_SPACING;
    }
    let mut x = 0.0;
    while x < bounds.width {
        canvas.fill_rect(Vec2::new(x, 0.0), Vec2::new(1.0, bounds.height), palette::GRID);
        x += GRID_SPACING;
    }
}

fn draw_player(canvas: &mut dyn Canvas, state: &GameState, options: &RenderOptions) {
    let player = &state.player;
    if !player.alive {
        return;
    }
    if !player.visible && !options.reduced_motion {
        return;
    }

    glow(canvas, options, palette::PLAYER);
    if player.is_invincible() && options.reduced_motion {
        canvas.set_alpha(0.5);
    }
    canvas.fill_rect(player.pos - player.size / 2.0, player.size, palette::PLAYER);
    canvas.set_alpha(1.0);
}

fn draw_debug(canvas: &mut dyn Canvas, state: &GameState) {
    let collision = &state.collision;
    canvas.set_glow(0.0, palette::HITBOX);

    for enemy in state.enemies.iter_active() {
        let hitbox = collision.enemy_hitbox(enemy);
        canvas.stroke_circle(hitbox.center, hitbox.radius, 1.0, palette::HITBOX);
    }
    if state.player.alive {
        let hitbox = collision.player_hitbox(&state.player);
        canvas.stroke_circle(hitbox.center, hitbox.radius, 1.0, palette::HITBOX);
    }

    if let Some(contact) = collision.last_contact() {
        canvas.stroke_circle(contact.point_a, 2.0, 1.0, palette::CONTACT);
        canvas.stroke_circle(contact.point_b, contact.combined_radius, 1.0, palette::CONTACT);
    }

    let info = state.debug_info();
    let frame = info.collision_frame;
    let tiers = state.enemies.tier_counts();
    let lines = [
        format!(
            "bullets {}  enemies {}/{}/{}  enemy bullets {}  fx {}",
            info.bullets,
            tiers.small,
            tiers.medium,
            tiers.large,
            info.enemy_bullets,
            info.effects
        ),
        format!(
            "checks {}  hits {}  pre {}  culled {}  deferred {}",
            frame.checks, frame.collisions, frame.prefiltered, frame.culled, frame.deferred
        ),
        format!("total checks {}", info.collision_total.checks),
    ];
    let base = state.bounds.height - 10.0 - HUD_FONT * (lines.len() as f32 - 1.0);
    for (i, line) in lines.iter().enumerate() {
        canvas.fill_text(
            line,
            Vec2::new(8.0, base + HUD_FONT * i as f32),
            HUD_FONT * 0.75,
            Align::Left,
            palette::HITBOX,
        );
    }
}

fn draw_hud(canvas: &mut dyn Canvas, state: &GameState, options: &RenderOptions) {
    let width = state.bounds.width;
    canvas.set_glow(0.0, palette::HUD_TEXT);

    canvas.fill_text(
        &format!("SCORE {}", state.score),
        Vec2::new(8.0, 22.0),
        HUD_FONT,
        Align::Left,
        palette::HUD_TEXT,
    );
    canvas.fill_text(
        &format!("LIVES {}", state.player.lives),
        Vec2::new(width - 8.0, 22.0),
        HUD_FONT,
        Align::Right,
        palette::HUD_TEXT,
    );
    canvas.fill_text(
        &format!("STAGE {}/{}", state.stage, state.tuning.stages.stage_count),
        Vec2::new(width / 2.0, 22.0),
        HUD_FONT,
        Align::Center,
        palette::HUD_TEXT,
    );

    // Experience bar
    let experience = &state.experience;
    let bar_pos = Vec2::new(8.0, 32.0);
    let bar_size = Vec2::new(width - 16.0, 4.0);
    canvas.fill_rect(bar_pos, bar_size, palette::EXP_TRACK);
    canvas.fill_rect(
        bar_pos,
        Vec2::new(bar_size.x * experience.progress(), bar_size.y),
        palette::EXP_BAR,
    );
    let level = if experience.is_max_level() {
        "LV MAX".to_string()
    } else {
        format!("LV {}", experience.level())
    };
    canvas.fill_text(
        &level,
        Vec2::new(8.0, 52.0),
        HUD_FONT * 0.75,
        Align::Left,
        palette::EXP_BAR,
    );

    if let Some(fps) = options.fps {
        canvas.fill_text(
            &format!("{fps:.0} FPS"),
            Vec2::new(width - 8.0, 52.0),
            HUD_FONT * 0.75,
            Align::Right,
            palette::HUD_TEXT,
        );
    }
}

fn draw_phase_overlay(canvas: &mut dyn Canvas, state: &GameState, options: &RenderOptions) {
    let title = match state.phase {
        GamePhase::Playing => return,
        GamePhase::Paused => "PAUSED",
        GamePhase::GameOver => "GAME OVER",
        GamePhase::Clear => "STAGE CLEAR",
    };

    let bounds = state.bounds;
    let center = bounds.center();
    canvas.set_alpha(0.6);
    canvas.fill_rect(
        Vec2::ZERO,
        Vec2::new(bounds.width, bounds.height),
        palette::OVERLAY,
    );
    canvas.set_alpha(1.0);

    glow(canvas, options, palette::PLAYER);
    canvas.fill_text(title, center, HUD_FONT * 2.5, Align::Center, palette::PLAYER);
    canvas.set_glow(0.0, palette::PLAYER);

    let hint = match state.phase {
        GamePhase::Paused => "P to resume".to_string(),
        _ => {
            if let Some(best) = options.high_score {
                canvas.fill_text(
                    &format!("BEST {best}"),
                    center + Vec2::new(0.0, 32.0),
                    HUD_FONT,
                    Align::Center,
                    palette::HUD_TEXT,
                );
            }
            "R to play again".to_string()
        }
    };
    canvas.fill_text(
        &hint,
        center + Vec2::new(0.0, 60.0),
        HUD_FONT,
        Align::Center,
        palette::HUD_TEXT,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Bounds;
    use crate::sim::EffectKind;
    use crate::tuning::Tuning;

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Clear,
        Rect(Vec2, Vec2, String),
        Circle(Vec2, String),
        Stroke(Vec2),
        Text(String),
    }

    #[derive(Default)]
    struct RecordingCanvas {
        ops: Vec<Op>,
        alpha: f32,
    }

    impl RecordingCanvas {
        fn rects_of(&self, color: &str) -> usize {
            self.ops
                .iter()
                .filter(|op| matches!(op, Op::Rect(_, _, c) if c == color))
                .count()
        }

        fn circles_of(&self, color: &str) -> usize {
            self.ops
                .iter()
                .filter(|op| matches!(op, Op::Circle(_, c) if c == color))
                .count()
        }

        fn has_text(&self, needle: &str) -> bool {
            self.ops
                .iter()
                .any(|op| matches!(op, Op::Text(t) if t.contains(needle)))
        }
    }

    impl Canvas for RecordingCanvas {
        fn clear(&mut self, _width: f32, _height: f32, _color: &str) {
            self.ops.push(Op::Clear);
        }

        fn set_alpha(&mut self, alpha: f32) {
            self.alpha = alpha;
        }

        fn set_glow(&mut self, _blur: f32, _color: &str) {}

        fn fill_rect(&mut self, pos: Vec2, size: Vec2, color: &str) {
            self.ops.push(Op::Rect(pos, size, color.to_string()));
        }

        fn fill_circle(&mut self, center: Vec2, _radius: f32, color: &str) {
            self.ops.push(Op::Circle(center, color.to_string()));
        }

        fn stroke_circle(&mut self, center: Vec2, _radius: f32, _width: f32, _color: &str) {
            self.ops.push(Op::Stroke(center));
        }

        fn fill_text(&mut self, text: &str, _pos: Vec2, _size: f32, _align: Align, _color: &str) {
            self.ops.push(Op::Text(text.to_string()));
        }
    }

    fn populated() -> GameState {
        let mut state = GameState::new(5, &Tuning::default(), Bounds::default());
        state.enemies.spawn_at(EnemyTier::Small, Vec2::new(100.0, 100.0));
        state.enemies.spawn_at(EnemyTier::Large, Vec2::new(300.0, 150.0));
        state
            .bullets
            .fire_single(0.0, Vec2::new(200.0, 400.0), Vec2::new(0.0, -600.0));
        state
            .enemy_bullets
            .spawn_straight(Vec2::new(50.0, 300.0), Vec2::new(0.0, 200.0));
        state
            .enemy_bullets
            .spawn_homing(Vec2::new(60.0, 300.0), 0.0, 150.0);
        state.effects.spawn(EffectKind::Explosion, Vec2::new(240.0, 240.0));
        state
    }

    #[test]
    fn test_draws_each_active_entity() {
        let state = populated();
        let mut canvas = RecordingCanvas::default();
        draw_frame(&mut canvas, &state, &RenderOptions::default());

        assert_eq!(canvas.ops.first(), Some(&Op::Clear));
        assert_eq!(canvas.rects_of(palette::ENEMY_SMALL), 1);
        assert_eq!(canvas.rects_of(palette::ENEMY_LARGE), 1);
        // Large enemies carry a health bar, small ones do not
        assert_eq!(canvas.rects_of(palette::HP_BAR), 1);
        assert_eq!(canvas.rects_of(palette::PLAYER_BULLET), 1);
        assert_eq!(canvas.circles_of(palette::BULLET_STRAIGHT), 1);
        assert_eq!(canvas.circles_of(palette::BULLET_HOMING), 1);
        assert_eq!(canvas.rects_of(palette::PLAYER), 1);
        assert!(canvas.has_text("SCORE 0"));
        assert!(canvas.has_text("LIVES 3"));
        assert_eq!(canvas.alpha, 1.0);
    }

    #[test]
    fn test_render_leaves_state_untouched() {
        let state = populated();
        let before = format!("{:?}", state);
        let mut canvas = RecordingCanvas::default();
        draw_frame(&mut canvas, &state, &RenderOptions::default());
        assert_eq!(format!("{:?}", state), before);
    }

    #[test]
    fn test_blinking_player_skipped_unless_reduced_motion() {
        let mut state = populated();
        state.player.visible = false;

        let mut canvas = RecordingCanvas::default();
        draw_frame(&mut canvas, &state, &RenderOptions::default());
        assert_eq!(canvas.rects_of(palette::PLAYER), 0);

        let mut canvas = RecordingCanvas::default();
        let options = RenderOptions {
            reduced_motion: true,
            ..Default::default()
        };
        draw_frame(&mut canvas, &state, &options);
        assert_eq!(canvas.rects_of(palette::PLAYER), 1);
    }

    #[test]
    fn test_debug_overlay_outlines_hitboxes() {
        let mut state = populated();
        state.collision.debug = true;
        let mut canvas = RecordingCanvas::default();
        draw_frame(&mut canvas, &state, &RenderOptions::default());
        // Two enemies plus the player, no contact yet
        let strokes = canvas
            .ops
            .iter()
            .filter(|op| matches!(op, Op::Stroke(_)))
            .count();
        assert_eq!(strokes, 3);
        assert!(canvas.has_text("checks"));
    }

    #[test]
    fn test_phase_overlays() {
        let mut state = populated();
        let mut canvas = RecordingCanvas::default();
        draw_frame(&mut canvas, &state, &RenderOptions::default());
        assert!(!canvas.has_text("PAUSED"));

        state.phase = GamePhase::Paused;
        let mut canvas = RecordingCanvas::default();
        draw_frame(&mut canvas, &state, &RenderOptions::default());
        assert!(canvas.has_text("PAUSED"));

        state.phase = GamePhase::GameOver;
        let mut canvas = RecordingCanvas::default();
        let options = RenderOptions {
            high_score: Some(4200),
            ..Default::default()
        };
        draw_frame(&mut canvas, &state, &options);
        assert!(canvas.has_text("GAME OVER"));
        assert!(canvas.has_text("BEST 4200"));
    }

    #[test]
    fn test_fps_counter_optional() {
        let state = populated();
        let mut canvas = RecordingCanvas::default();
        draw_frame(&mut canvas, &state, &RenderOptions::default());
        assert!(!canvas.has_text("FPS"));

        let mut canvas = RecordingCanvas::default();
        let options = RenderOptions {
            fps: Some(59.6),
            ..Default::default()
        };
        draw_frame(&mut canvas, &state, &options);
        assert!(canvas.has_text("60 FPS"));
    }
}
