//! wasm32 binding: a `WebGame` object the JavaScript host drives
//!
//! The host captures DOM input itself, forwards it with `setAction` /
//! `setAxis`, calls `frame(dt)` from `requestAnimationFrame`, and renders
//! the JSON snapshot.

use glam::Vec2;
use wasm_bindgen::prelude::*;

use crate::config::GameConfig;
use crate::sim::Level;

use super::Runner;

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    // Fails only when a logger is already installed
    let _ = console_log::init_with_level(log::Level::Info);
    log::info!("Megabot simulation core loaded");
}

#[wasm_bindgen]
pub struct WebGame {
    runner: Runner,
}

#[wasm_bindgen]
impl WebGame {
    /// `config_json` and `level_json` are optional; without a config the
    /// run is seeded from the clock
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>, level_json: Option<String>) -> Result<WebGame, JsValue> {
        let config = match config_json {
            Some(json) => GameConfig::from_json(&json).map_err(to_js)?,
            None => {
                let mut config = GameConfig::default();
                config.game.seed = js_sys::Date::now() as u64;
                config
            }
        };
        let level = match level_json {
            Some(json) => Level::from_json(&json).map_err(to_js)?,
            None => Level::demo(&config.game),
        };
        log::info!("Started new game with seed: {}", config.game.seed);
        Ok(WebGame {
            runner: Runner::new(config, level),
        })
    }

    #[wasm_bindgen(js_name = setAction)]
    pub fn set_action(&mut self, name: &str, held: bool) -> bool {
        self.runner.set_action_named(name, held)
    }

    #[wasm_bindgen(js_name = setAxis)]
    pub fn set_axis(&mut self, x: f32, y: f32) {
        self.runner.set_axis(Some(Vec2::new(x, y)));
    }

    #[wasm_bindgen(js_name = clearAxis)]
    pub fn clear_axis(&mut self) {
        self.runner.set_axis(None);
    }

    /// Window blur / tab hidden: drop held buttons
    #[wasm_bindgen(js_name = releaseAll)]
    pub fn release_all(&mut self) {
        self.runner.release_all();
    }

    /// Advance by the host frame time in seconds; returns ticks run
    pub fn frame(&mut self, dt: f32) -> u32 {
        self.runner.advance(dt)
    }

    pub fn phase(&self) -> String {
        format!("{:?}", self.runner.state().phase)
    }

    #[wasm_bindgen(js_name = snapshotJson)]
    pub fn snapshot_json(&self) -> Result<String, JsValue> {
        self.runner.snapshot_json().map_err(to_js)
    }

    #[wasm_bindgen(js_name = drainEventsJson)]
    pub fn drain_events_json(&mut self) -> Result<String, JsValue> {
        serde_json::to_string(&self.runner.drain_events()).map_err(to_js)
    }
}
