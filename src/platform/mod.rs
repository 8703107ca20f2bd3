//! Host integration layer
//!
//! [`Runner`] is what a host drives: it turns "buttons currently held" into
//! per-tick input edges and feeds the simulation fixed `SIM_DT` steps from
//! whatever frame time the host measures. The wasm32 binding in [`web`]
//! wraps it for JavaScript.

use glam::Vec2;

use crate::config::GameConfig;
use crate::consts::{MAX_SUBSTEPS, SIM_DT};
use crate::sim::{Action, GameEvent, GameState, InputTracker, Level, tick};

#[cfg(target_arch = "wasm32")]
pub mod web;

/// Fixed-timestep driver around a [`GameState`]
pub struct Runner {
    state: GameState,
    tracker: InputTracker,
    accumulator: f32,
}

impl Runner {
    pub fn new(config: GameConfig, level: Level) -> Self {
        Self {
            state: GameState::new(config, level),
            tracker: InputTracker::default(),
            accumulator: 0.0,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn set_action(&mut self, action: Action, held: bool) {
        self.tracker.set_action(action, held);
    }

    /// Set an action by name; unknown names are logged and ignored
    pub fn set_action_named(&mut self, name: &str, held: bool) -> bool {
        match Action::from_name(name) {
            Some(action) => {
                self.set_action(action, held);
                true
            }
            None => {
                log::warn!("Unknown input action '{}'", name);
                false
            }
        }
    }

    /// Analog movement; `None` falls back to the Left/Right buttons
    pub fn set_axis(&mut self, axis: Option<Vec2>) {
        self.tracker.set_axis(axis);
    }

    /// Release every held action (focus loss)
    pub fn release_all(&mut self) {
        for action in Action::ALL {
            self.tracker.set_action(action, false);
        }
    }

    /// Run exactly one simulation tick
    pub fn step(&mut self) {
        let input = self.tracker.frame();
        tick(&mut self.state, &input, SIM_DT);
    }

    /// Accumulate `frame_dt` seconds of host time and run the fixed steps it
    /// covers, at most `MAX_SUBSTEPS`. Returns the number of ticks run.
    pub fn advance(&mut self, frame_dt: f32) -> u32 {
        let frame_dt = if frame_dt.is_finite() { frame_dt.clamp(0.0, 0.1) } else { 0.0 };
        self.accumulator += frame_dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.step();
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        if substeps == MAX_SUBSTEPS {
            // Drop the backlog rather than spiral
            self.accumulator = self.accumulator.min(SIM_DT);
        }
        substeps
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.state.drain_events()
    }

    pub fn snapshot_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.state.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameSettings;
    use crate::sim::WeaponKind;

    fn runner() -> Runner {
        Runner::new(GameConfig::default(), Level::flat(&GameSettings::default()))
    }

    #[test]
    fn test_advance_runs_fixed_steps() {
        let mut runner = runner();
        assert_eq!(runner.advance(SIM_DT * 0.5), 0);
        assert_eq!(runner.advance(SIM_DT * 0.6), 1);
        assert_eq!(runner.state().tick_count(), 1);
    }

    #[test]
    fn test_advance_caps_substeps() {
        let mut runner = runner();
        assert_eq!(runner.advance(1.0), MAX_SUBSTEPS);
        assert!(runner.advance(0.0) <= 1);
    }

    #[test]
    fn test_press_edge_reaches_only_one_tick() {
        let mut runner = runner();
        runner.set_action_named("switch_weapon", true);
        runner.advance(SIM_DT * 3.5);
        // Held across three ticks, but only the first saw the press
        assert_eq!(runner.state().player.data.weapon, WeaponKind::Rapid);
    }

    #[test]
    fn test_unknown_action_name() {
        let mut runner = runner();
        assert!(!runner.set_action_named("teleport", true));
    }

    #[test]
    fn test_snapshot_json() {
        let mut runner = runner();
        runner.step();
        let json = runner.snapshot_json().unwrap();
        assert!(json.contains("\"tick\":1"));
    }
}
