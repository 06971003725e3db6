//! Cyber Shooter entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{
        CanvasRenderingContext2d, HtmlCanvasElement, KeyboardEvent, PointerEvent, TouchEvent,
    };

    use cyber_shooter::highscores::HighScoreEntry;
    use cyber_shooter::platform::{Action, InputState, LocalStore};
    use cyber_shooter::renderer::{RenderOptions, draw_frame};
    use cyber_shooter::sim::{FrameClock, GameEvent, GamePhase, GameState, tick};
    use cyber_shooter::{Bounds, HighScores, QualityPreset, Settings, Tuning};

    thread_local! {
        /// Set by the panic hook; the frame loop stops rescheduling
        static HALTED: Cell<bool> = const { Cell::new(false) };
    }

    /// Game instance holding all state
    struct Game {
        state: GameState,
        clock: FrameClock,
        input: InputState,
        settings: Settings,
        high_scores: HighScores,
        store: Option<LocalStore>,
        ctx: CanvasRenderingContext2d,
        // FPS tracking
        frame_times: [f64; 60],
        frame_index: usize,
        fps: f32,
        /// Current run already written to the leaderboard
        recorded: bool,
    }

    impl Game {
        fn new(seed: u64, bounds: Bounds, ctx: CanvasRenderingContext2d) -> Self {
            let store = LocalStore::open();
            if store.is_none() {
                log::warn!("LocalStorage unavailable, progress will not be saved");
            }
            let settings = store
                .as_ref()
                .map(|s| Settings::load(s))
                .unwrap_or_default();
            let high_scores = store
                .as_ref()
                .map(|s| HighScores::load(s))
                .unwrap_or_default();

            let mut game = Self {
                state: GameState::new(seed, &Tuning::default(), bounds),
                clock: FrameClock::default(),
                input: InputState::new(),
                settings,
                high_scores,
                store,
                ctx,
                frame_times: [0.0; 60],
                frame_index: 0,
                fps: 0.0,
                recorded: false,
            };
            game.apply_settings();
            game
        }

        fn apply_settings(&mut self) {
            self.state.configure_effects(
                self.settings.effect_pool_size(),
                self.settings.effective_particles(),
            );
            self.state.collision.debug = self.settings.debug_overlay;
            log::info!(
                "Quality {} ({} effects, particles {})",
                self.settings.quality.as_str(),
                self.settings.effect_pool_size(),
                self.settings.effective_particles()
            );
        }

        fn save_settings(&mut self) {
            if let Some(store) = self.store.as_mut() {
                self.settings.save(store);
            }
        }

        /// One animation frame: at most one simulation step, then draw
        fn frame(&mut self, time: f64) {
            self.track_fps(time);

            if let Some(dt) = self.clock.advance(time / 1000.0) {
                let input = self.input.sample();
                tick(&mut self.state, &input, dt);
                self.handle_events();

                if self.state.collision.debug != self.settings.debug_overlay {
                    self.settings.debug_overlay = self.state.collision.debug;
                    self.save_settings();
                }
            }

            if self.state.is_over() {
                if !self.recorded {
                    self.record_run();
                    self.recorded = true;
                }
            } else {
                self.recorded = false;
            }

            self.render();
        }

        fn handle_events(&mut self) {
            for event in self.state.drain_events() {
                match event {
                    GameEvent::EnemyDestroyed { tier, score, .. } => {
                        log::debug!("{tier:?} destroyed (+{score})");
                    }
                    GameEvent::PlayerHit { lives_left } => {
                        log::info!("Player hit, {lives_left} lives left");
                    }
                    GameEvent::LevelUp { level } => log::info!("Level up: {level}"),
                    GameEvent::StageStart { stage } => log::info!("Stage {stage}"),
                    GameEvent::StageClear { stage } => log::info!("Stage {stage} clear"),
                    GameEvent::GameOver { score } => log::info!("Game over at {score}"),
                }
            }
        }

        fn record_run(&mut self) {
            let entry = HighScoreEntry {
                score: self.state.score,
                level: self.state.experience.level(),
                stage: self.state.stage,
                timestamp: js_sys::Date::now(),
            };
            let Some(rank) = self.high_scores.add_score(entry) else {
                return;
            };
            log::info!("New high score, rank {rank}");
            if let Some(store) = self.store.as_mut() {
                self.high_scores.save(store);
            }
        }

        fn track_fps(&mut self, time: f64) {
            self.frame_times[self.frame_index] = time;
            self.frame_index = (self.frame_index + 1) % self.frame_times.len();

            // Oldest sample is the one about to be overwritten
            let oldest = self.frame_times[self.frame_index];
            if oldest > 0.0 && time > oldest {
                let frames = (self.frame_times.len() - 1) as f64;
                self.fps = (frames * 1000.0 / (time - oldest)) as f32;
            }
        }

        fn render(&mut self) {
            let options = RenderOptions {
                glow: self.settings.quality.glow_enabled(),
                fps: self.settings.show_fps.then_some(self.fps),
                reduced_motion: self.settings.reduced_motion,
                high_score: self.high_scores.top_score(),
            };
            draw_frame(&mut self.ctx, &self.state, &options);
        }

        /// Pause on focus loss and drop anything held
        fn auto_pause(&mut self, reason: &str) {
            self.input.release_all();
            if self.state.phase == GamePhase::Playing {
                self.input.trigger(Action::Pause);
                log::info!("Auto-paused ({reason})");
            }
        }
    }

    /// Size the backing store for the device pixel ratio; returns the
    /// playfield in CSS pixels
    fn fit_canvas(canvas: &HtmlCanvasElement, ctx: &CanvasRenderingContext2d) -> Bounds {
        let dpr = web_sys::window().map_or(1.0, |w| w.device_pixel_ratio());
        let client_w = canvas.client_width().max(1);
        let client_h = canvas.client_height().max(1);
        canvas.set_width((client_w as f64 * dpr) as u32);
        canvas.set_height((client_h as f64 * dpr) as u32);
        let _ = ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0);
        Bounds::new(client_w as f32, client_h as f32)
    }

    /// Visible fault message; the canvas stops updating after a panic
    fn show_fault(message: &str) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        let Some(body) = document.body() else {
            return;
        };
        let Ok(overlay) = document.create_element("div") else {
            return;
        };
        let _ = overlay.set_attribute("id", "fault");
        let _ = overlay.set_attribute(
            "style",
            "position:fixed;inset:0;display:flex;align-items:center;justify-content:center;\
             background:rgba(10,0,20,0.92);color:#ff2a6d;font:16px monospace;\
             padding:2em;text-align:center;z-index:10",
        );
        overlay.set_text_content(Some(&format!("Something went wrong.\n{message}")));
        let _ = body.append_child(&overlay);
    }

    fn install_panic_hook() {
        std::panic::set_hook(Box::new(|info| {
            console_error_panic_hook::hook(info);
            HALTED.with(|halted| halted.set(true));
            show_fault(&info.to_string());
        }));
    }

    /// `?quality=low|medium|high` overrides and persists the preset
    fn quality_from_query() -> Option<QualityPreset> {
        let search = web_sys::window()?.location().search().ok()?;
        let value = search
            .trim_start_matches('?')
            .split('&')
            .find_map(|pair| pair.strip_prefix("quality="))?;
        match value.parse() {
            Ok(preset) => Some(preset),
            Err(err) => {
                log::warn!("{err}");
                None
            }
        }
    }

    pub fn run() {
        install_panic_hook();
        let _ = console_log::init_with_level(log::Level::Info);

        log::info!("Cyber Shooter starting...");

        let Some(window) = web_sys::window() else {
            return;
        };
        let Some(document) = window.document() else {
            return;
        };

        // Hide loading indicator
        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let Some(canvas) = document
            .get_element_by_id("canvas")
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
        else {
            log::error!("No <canvas id=\"canvas\"> found");
            return;
        };
        let Some(ctx) = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())
        else {
            log::error!("2D canvas context unavailable");
            return;
        };

        let bounds = fit_canvas(&canvas, &ctx);
        let seed = js_sys::Date::now() as u64;
        let mut game = Game::new(seed, bounds, ctx);
        if let Some(preset) = quality_from_query() {
            game.settings.apply_preset(preset);
            game.apply_settings();
            game.save_settings();
        }
        let game = Rc::new(RefCell::new(game));

        log::info!("Game initialized with seed: {}", seed);

        setup_input_handlers(&canvas, game.clone());
        setup_resize(&canvas, game.clone());
        setup_auto_pause(game.clone());

        request_animation_frame(game);

        log::info!("Cyber Shooter running!");
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        // Pointer events cover mouse, pen and touch
        {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                let _ = canvas_clone.set_pointer_capture(event.pointer_id());
                let Ok(mut g) = game.try_borrow_mut() else {
                    return;
                };
                g.input
                    .pointer_down(Vec2::new(event.offset_x() as f32, event.offset_y() as f32));
            });
            let _ = canvas
                .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                let Ok(mut g) = game.try_borrow_mut() else {
                    return;
                };
                g.input
                    .pointer_move(Vec2::new(event.offset_x() as f32, event.offset_y() as f32));
            });
            let _ = canvas
                .add_event_listener_with_callback("pointermove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        for kind in ["pointerup", "pointercancel"] {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: PointerEvent| {
                if let Ok(mut g) = game.try_borrow_mut() {
                    g.input.pointer_up();
                }
            });
            let _ = canvas.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keep touches from scrolling or zooming the page
        for kind in ["touchstart", "touchmove"] {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
            });
            let _ = canvas.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref());
            closure.forget();
        }

        let Some(window) = web_sys::window() else {
            return;
        };

        // Keyboard
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let Ok(mut g) = game.try_borrow_mut() else {
                    return;
                };
                if let Some(action) = g.input.key_down(&event.code()) {
                    if action.blocks_default() {
                        event.prevent_default();
                    }
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if let Ok(mut g) = game.try_borrow_mut() {
                    g.input.key_up(&event.code());
                }
            });
            let _ =
                window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_resize(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let canvas = canvas.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let Ok(mut g) = game.try_borrow_mut() else {
                return;
            };
            let bounds = fit_canvas(&canvas, &g.ctx);
            g.state.resize(bounds);
            log::info!("Playfield resized to {}x{}", bounds.width, bounds.height);
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_auto_pause(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let Some(document) = window.document() else {
            return;
        };

        // Visibility change (tab switch, minimize)
        {
            let game = game.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() != web_sys::VisibilityState::Hidden {
                    return;
                }
                if let Ok(mut g) = game.try_borrow_mut() {
                    g.auto_pause("tab hidden");
                    // Don't replay the hidden time as one long step
                    g.clock.reset();
                }
            });
            let _ = document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        // Window blur (click outside)
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                if let Ok(mut g) = game.try_borrow_mut() {
                    g.auto_pause("window blur");
                }
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        if HALTED.with(Cell::get) {
            log::error!("Game loop halted after a fault");
            return;
        }
        {
            let Ok(mut g) = game.try_borrow_mut() else {
                return;
            };
            g.frame(time);
        }
        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Cyber Shooter (native) starting...");
    log::info!("Native mode runs a headless session - use `trunk serve` for the web version");

    use clap::Parser;

    let options = headless::Options::parse();
    headless::run(&options);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Scripted session for profiling pools and the collision engine
#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use clap::Parser;
    use glam::Vec2;

    use cyber_shooter::consts::FRAME_DT;
    use cyber_shooter::highscores::HighScoreEntry;
    use cyber_shooter::platform::MemoryStore;
    use cyber_shooter::sim::{GameEvent, GameState, TickInput, tick};
    use cyber_shooter::{Bounds, HighScores, Tuning};

    #[derive(Parser, Debug)]
    #[command(name = "cyber-shooter")]
    #[command(about = "Run a scripted headless session and print pool and collision stats")]
    pub struct Options {
        /// RNG seed for the run
        #[arg(long, default_value_t = 42)]
        pub seed: u64,
        /// Simulated seconds to play
        #[arg(long, default_value_t = 60.0)]
        pub seconds: f32,
        /// JSON tuning file; missing fields keep their defaults
        #[arg(long)]
        pub tuning: Option<String>,
    }

    fn load_tuning(path: Option<&str>) -> Tuning {
        let Some(path) = path else {
            return Tuning::default();
        };
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(err) => {
                log::warn!("Can't read {path}: {err}, using default tuning");
                return Tuning::default();
            }
        };
        match Tuning::from_json(&json) {
            Ok(tuning) => {
                log::info!("Loaded tuning from {path}");
                tuning
            }
            Err(err) => {
                log::warn!("Bad tuning in {path}: {err}, using defaults");
                Tuning::default()
            }
        }
    }

    pub fn run(options: &Options) {
        let tuning = load_tuning(options.tuning.as_deref());
        let bounds = Bounds::default();
        let mut state = GameState::new(options.seed, &tuning, bounds);

        let frames = (options.seconds / FRAME_DT).ceil() as u64;
        let mut kills = 0u64;
        let mut peak_enemy_bullets = 0;
        for frame in 0..frames {
            // Sweep side to side while holding fire
            let t = frame as f32 * FRAME_DT;
            let x = bounds.width / 2.0 + (t * 0.8).sin() * bounds.width * 0.35;
            let input = TickInput {
                pointer_down: true,
                pointer: Some(Vec2::new(x, bounds.height * 0.85)),
                ..Default::default()
            };
            tick(&mut state, &input, FRAME_DT);

            peak_enemy_bullets = peak_enemy_bullets.max(state.enemy_bullets.active_len());
            for event in state.drain_events() {
                match event {
                    GameEvent::EnemyDestroyed { .. } => kills += 1,
                    GameEvent::LevelUp { level } => log::info!("[{t:6.2}s] level {level}"),
                    GameEvent::StageStart { stage } => log::info!("[{t:6.2}s] stage {stage}"),
                    GameEvent::PlayerHit { lives_left } => {
                        log::info!("[{t:6.2}s] hit, {lives_left} lives left")
                    }
                    _ => {}
                }
            }
            if state.is_over() {
                break;
            }
        }

        let total = state.collision.total_stats();
        println!("seed {}: {:?} after {:.1}s", options.seed, state.phase, state.time);
        println!(
            "score {}  kills {}  level {}  stage {}",
            state.score,
            kills,
            state.experience.level(),
            state.stage
        );
        println!(
            "enemies spawned {}  peak enemy bullets {}  player shots {}",
            state.enemies.spawned(),
            peak_enemy_bullets,
            state.bullets.stats().fired
        );
        for (name, stats) in [
            ("bullets", state.bullets.pool().stats()),
            ("enemies", state.enemies.pool().stats()),
            ("enemy bullets", state.enemy_bullets.pool().stats()),
            ("effects", state.effects.pool().stats()),
        ] {
            println!(
                "pool {name:<14} acquired {:>6}  released {:>6}  rejected {:>4}",
                stats.acquired, stats.released, stats.rejected
            );
        }
        println!(
            "collision checks {}  hits {}  prefiltered {}  culled {}  deferred {}",
            total.checks, total.collisions, total.prefiltered, total.culled, total.deferred
        );

        let mut store = MemoryStore::new();
        let mut scores = HighScores::load(&store);
        let entry = HighScoreEntry {
            score: state.score,
            level: state.experience.level(),
            stage: state.stage,
            timestamp: 0.0,
        };
        if let Some(rank) = scores.add_score(entry) {
            scores.save(&mut store);
            println!("high score rank {rank}");
        }
    }

}
