//! Megabot - simulation core for a browser 2D platformer
//!
//! Core modules:
//! - `sim`: Deterministic simulation (state machines, physics, collisions, weapons, particles)
//! - `config`: Data-driven tunables loaded from JSON
//! - `platform`: Fixed-step host runner plus the wasm32 `WebGame` binding
//! - `error`: Error types surfaced to callers

pub mod config;
pub mod error;
pub mod platform;
pub mod sim;

pub use config::GameConfig;
pub use error::{ConfigError, FsmError};

/// Engine timing constants
pub mod consts {
    /// Reference frame rate: velocities and timers are expressed per 1/60 s frame
    pub const FRAME_RATE: f32 = 60.0;
    /// Nominal tick length in seconds
    pub const SIM_DT: f32 = 1.0 / FRAME_RATE;
    /// Largest delta-time the simulation accepts (50 ms)
    pub const MAX_DT: f32 = 0.05;
    /// Max fixed-step ticks a host runs per rendered frame
    pub const MAX_SUBSTEPS: u32 = 4;
}

/// Convert a delta-time in seconds to frame-normalized units (1.0 = one 60 Hz frame)
#[inline]
pub fn frames(dt: f32) -> f32 {
    dt * consts::FRAME_RATE
}

/// Clamp a raw host delta-time into the range the simulation is stable for
#[inline]
pub fn clamp_dt(dt: f32, max_dt: f32) -> f32 {
    if !dt.is_finite() || dt <= 0.0 {
        0.0
    } else {
        dt.min(max_dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_normalization() {
        assert!((frames(consts::SIM_DT) - 1.0).abs() < 1e-5);
        assert!((frames(0.5) - 30.0).abs() < 1e-4);
    }

    #[test]
    fn test_clamp_dt() {
        assert_eq!(clamp_dt(0.2, consts::MAX_DT), consts::MAX_DT);
        assert_eq!(clamp_dt(-1.0, consts::MAX_DT), 0.0);
        assert_eq!(clamp_dt(f32::NAN, consts::MAX_DT), 0.0);
        assert!((clamp_dt(0.01, consts::MAX_DT) - 0.01).abs() < 1e-6);
    }
}
