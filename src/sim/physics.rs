//! Rigid-box integration
//!
//! Velocities are in pixels per 60 Hz frame, so every step first converts
//! `dt` (seconds) into frame units.

use crate::config::GameSettings;
use crate::frames;

use super::body::Body;

/// Gravity, friction, clamping and level-bounds integration
#[derive(Debug, Clone)]
pub struct PhysicsIntegrator {
    pub gravity: f32,
    pub terminal_velocity: f32,
    pub friction: f32,
    pub friction_snap: f32,
    pub max_velocity_x: f32,
    pub max_velocity_y: f32,
    pub level_width: f32,
    pub level_height: f32,
}

impl PhysicsIntegrator {
    pub fn from_settings(settings: &GameSettings) -> Self {
        Self {
            gravity: settings.gravity,
            terminal_velocity: settings.terminal_velocity,
            friction: settings.friction,
            friction_snap: settings.friction_snap,
            max_velocity_x: settings.max_velocity_x,
            max_velocity_y: settings.max_velocity_y,
            level_width: settings.level_width,
            level_height: settings.level_height,
        }
    }

    /// Advance one body by `dt` seconds.
    ///
    /// Returns `true` when the body has fallen past the bottom of the level;
    /// the caller decides what that means. `grounded` is cleared on exit and
    /// must be re-established by collision resolution.
    pub fn step(&self, body: &mut Body, dt: f32) -> bool {
        let dt = frames(dt);

        if body.gravity_scale != 0.0 {
            body.vel.y += self.gravity * body.gravity_scale * dt;
        }
        body.vel.y = body.vel.y.min(self.terminal_velocity);

        body.pos += body.vel * dt;

        if body.grounded {
            body.vel.x *= (1.0 - self.friction * dt).max(0.0);
            if body.vel.x.abs() < self.friction_snap {
                body.vel.x = 0.0;
            }
        }

        body.vel.x = body.vel.x.clamp(-self.max_velocity_x, self.max_velocity_x);
        body.vel.y = body.vel.y.clamp(-self.max_velocity_y, self.max_velocity_y);

        let fell = self.clamp_to_level(body);
        body.grounded = false;
        fell
    }

    fn clamp_to_level(&self, body: &mut Body) -> bool {
        let max_x = (self.level_width - body.size.x).max(0.0);
        if body.pos.x <= 0.0 {
            body.pos.x = 0.0;
            if body.vel.x < 0.0 {
                body.vel.x = 0.0;
            }
        } else if body.pos.x >= max_x {
            body.pos.x = max_x;
            if body.vel.x > 0.0 {
                body.vel.x = 0.0;
            }
        }

        if body.pos.y <= 0.0 {
            body.pos.y = 0.0;
            if body.vel.y < 0.0 {
                body.vel.y = 0.0;
            }
        }

        body.pos.y > self.level_height
    }
}
