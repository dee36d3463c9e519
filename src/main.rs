//! Mosquito Swat entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;

    use mosquito_swat::Tuning;
    use mosquito_swat::sim::{FrameClock, GamePhase, SessionController, rng};
    use mosquito_swat::surface::dom::{DomSurface, target_id_from_event};
    use mosquito_swat::surface::{RenderSurface, Snapshot};
    use rand_pcg::Pcg32;

    struct Game {
        controller: SessionController<FrameClock, Pcg32>,
        surface: DomSurface,
        last_time: f64,
    }

    impl Game {
        /// Run due timer callbacks and redraw if anything moved
        fn update(&mut self, time: f64) {
            let dt = if self.last_time > 0.0 {
                time - self.last_time
            } else {
                0.0
            };
            self.last_time = time;

            self.controller.pump(dt);
            let changed = self.controller.drain_events().count() > 0;
            if changed || self.controller.phase() == GamePhase::Playing {
                self.render();
            }
        }

        fn render(&mut self) {
            let snapshot = Snapshot::new(self.controller.session(), self.controller.surface());
            self.surface.present(&snapshot);
        }

        fn fit_to_area(&mut self) {
            let (w, h) = self.surface.size();
            self.controller.resize(w, h);
        }
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialized".into());
        }

        log::info!("Mosquito Swat starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        let tuning = Tuning::load();
        let seed = js_sys::Date::now() as u64;
        let surface = DomSurface::new(document, "game-area")?;
        let (w, h) = surface.size();

        let controller = SessionController::new(
            tuning.clone(),
            tuning.surface(w, h),
            FrameClock::new(),
            rng::seeded(seed),
        );
        log::info!("Play area {}x{}, seed {}", w, h, seed);

        let game = Rc::new(RefCell::new(Game {
            controller,
            surface,
            last_time: 0.0,
        }));
        game.borrow_mut().render();

        setup_pointer(game.clone())?;
        setup_buttons(game.clone())?;
        setup_resize(game.clone())?;

        request_animation_frame(game);

        log::info!("Mosquito Swat running!");
        Ok(())
    }

    fn setup_pointer(game: Rc<RefCell<Game>>) -> Result<(), JsValue> {
        let area = game.borrow().surface.area().clone();
        // mouseover bubbles, so one listener covers every mosquito
        let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::MouseEvent| {
            let Some(id) = target_id_from_event(&event) else {
                return;
            };
            let mut g = game.borrow_mut();
            let alive = g
                .controller
                .session()
                .target(id)
                .is_some_and(|t| t.alive);
            if alive && g.controller.hit(id) {
                g.render();
            }
        });
        area.add_event_listener_with_callback("mouseover", closure.as_ref().unchecked_ref())?;
        closure.forget();
        Ok(())
    }

    fn setup_buttons(game: Rc<RefCell<Game>>) -> Result<(), JsValue> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or("no document")?;

        let buttons: [(&str, fn(&mut Game)); 3] = [
            ("start-btn", |g| g.controller.start()),
            ("end-btn", |g| g.controller.end()),
            ("reset-btn", |g| g.controller.reset()),
        ];

        for (id, action) in buttons {
            let Some(btn) = document.get_element_by_id(id) else {
                log::warn!("Missing #{}", id);
                continue;
            };
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                let mut g = game.borrow_mut();
                g.fit_to_area();
                action(&mut g);
                g.render();
            });
            btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }
        Ok(())
    }

    fn setup_resize(game: Rc<RefCell<Game>>) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or("no window")?;
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            game.borrow_mut().fit_to_area();
        });
        window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())?;
        closure.forget();
        Ok(())
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
        game.borrow_mut().update(time);
        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run()
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use mosquito_swat::Tuning;
    use mosquito_swat::autoplay::run_demo;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Mosquito Swat (native) starting...");
    log::info!("Native mode plays a headless demo - run with `trunk serve` for the web version");

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(12345);

    let report = run_demo(seed, Tuning::load(), 600.0, 0.2);
    println!("{}", report.hud);
    println!(
        "seed {}: {} mosquitos, {} swatted, score {}, {} lives left ({:?})",
        seed,
        report.spawned,
        report.swats,
        report.score,
        report.lives,
        report.reason
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
