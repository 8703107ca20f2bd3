//! Polled input for a single tick
//!
//! The simulation never sees raw device events. Hosts fill a [`TickInput`]
//! (usually through an [`InputTracker`], which derives the just-pressed and
//! just-released edges between frames) and states query it through the
//! [`InputContext`] trait.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Named actions the simulation understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Jump,
    Shoot,
    Slide,
    Left,
    Right,
    Pause,
    SwitchWeapon,
}

impl Action {
    pub const ALL: [Action; 7] = [
        Action::Jump,
        Action::Shoot,
        Action::Slide,
        Action::Left,
        Action::Right,
        Action::Pause,
        Action::SwitchWeapon,
    ];

    #[inline]
    fn bit(self) -> u8 {
        1 << (self as u8)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "jump" => Some(Action::Jump),
            "shoot" => Some(Action::Shoot),
            "slide" => Some(Action::Slide),
            "left" => Some(Action::Left),
            "right" => Some(Action::Right),
            "pause" => Some(Action::Pause),
            "switchweapon" | "switch_weapon" | "switch" => Some(Action::SwitchWeapon),
            _ => None,
        }
    }
}

/// Set of actions packed into a byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActionSet(u8);

impl ActionSet {
    pub fn with(mut self, action: Action) -> Self {
        self.insert(action);
        self
    }

    pub fn insert(&mut self, action: Action) {
        self.0 |= action.bit();
    }

    pub fn remove(&mut self, action: Action) {
        self.0 &= !action.bit();
    }

    pub fn set(&mut self, action: Action, held: bool) {
        if held {
            self.insert(action);
        } else {
            self.remove(action);
        }
    }

    #[inline]
    pub fn contains(self, action: Action) -> bool {
        self.0 & action.bit() != 0
    }
}

/// Query interface the states read input through
pub trait InputContext {
    /// Movement axes, each in -1..=1
    fn movement_vector(&self) -> Vec2;
    fn is_action_pressed(&self, action: Action) -> bool;
    fn was_action_just_pressed(&self, action: Action) -> bool;
    fn was_action_just_released(&self, action: Action) -> bool;
}

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TickInput {
    /// Analog movement; when `None` the axis is derived from Left/Right
    pub axis: Option<Vec2>,
    pub held: ActionSet,
    pub pressed: ActionSet,
    pub released: ActionSet,
}

impl TickInput {
    /// Input where `actions` are held and were pressed this tick
    pub fn press(actions: &[Action]) -> Self {
        let mut input = Self::default();
        for &a in actions {
            input.held.insert(a);
            input.pressed.insert(a);
        }
        input
    }

    /// Input where `actions` are held (without a fresh press edge)
    pub fn hold(actions: &[Action]) -> Self {
        let mut input = Self::default();
        for &a in actions {
            input.held.insert(a);
        }
        input
    }

    /// Input where `actions` were released this tick
    pub fn release(actions: &[Action]) -> Self {
        let mut input = Self::default();
        for &a in actions {
            input.released.insert(a);
        }
        input
    }
}

impl InputContext for TickInput {
    fn movement_vector(&self) -> Vec2 {
        if let Some(axis) = self.axis {
            return axis.clamp(Vec2::splat(-1.0), Vec2::splat(1.0));
        }
        let mut x = 0.0;
        if self.held.contains(Action::Left) {
            x -= 1.0;
        }
        if self.held.contains(Action::Right) {
            x += 1.0;
        }
        Vec2::new(x, 0.0)
    }

    fn is_action_pressed(&self, action: Action) -> bool {
        self.held.contains(action)
    }

    fn was_action_just_pressed(&self, action: Action) -> bool {
        self.pressed.contains(action)
    }

    fn was_action_just_released(&self, action: Action) -> bool {
        self.released.contains(action)
    }
}

/// Turns per-frame "currently held" snapshots into [`TickInput`]s with edges
#[derive(Debug, Clone, Default)]
pub struct InputTracker {
    held: ActionSet,
    last: ActionSet,
    axis: Option<Vec2>,
}

impl InputTracker {
    pub fn set_action(&mut self, action: Action, held: bool) {
        self.held.set(action, held);
    }

    pub fn set_axis(&mut self, axis: Option<Vec2>) {
        self.axis = axis;
    }

    /// Produce this frame's input and remember the held set for the next edge
    pub fn frame(&mut self) -> TickInput {
        let input = TickInput {
            axis: self.axis,
            held: self.held,
            pressed: ActionSet(self.held.0 & !self.last.0),
            released: ActionSet(self.last.0 & !self.held.0),
        };
        self.last = self.held;
        input
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_edges() {
        let mut tracker = InputTracker::default();
        tracker.set_action(Action::Jump, true);
        let first = tracker.frame();
        assert!(first.was_action_just_pressed(Action::Jump));
        assert!(first.is_action_pressed(Action::Jump));

        let second = tracker.frame();
        assert!(!second.was_action_just_pressed(Action::Jump));
        assert!(second.is_action_pressed(Action::Jump));

        tracker.set_action(Action::Jump, false);
        let third = tracker.frame();
        assert!(third.was_action_just_released(Action::Jump));
        assert!(!third.is_action_pressed(Action::Jump));
    }

    #[test]
    fn test_movement_from_buttons() {
        let input = TickInput::hold(&[Action::Left]);
        assert_eq!(input.movement_vector(), Vec2::new(-1.0, 0.0));
        let both = TickInput::hold(&[Action::Left, Action::Right]);
        assert_eq!(both.movement_vector(), Vec2::ZERO);
    }

    #[test]
    fn test_analog_axis_is_clamped() {
        let input = TickInput {
            axis: Some(Vec2::new(3.0, -0.5)),
            ..Default::default()
        };
        assert_eq!(input.movement_vector(), Vec2::new(1.0, -0.5));
    }

    #[test]
    fn test_action_names() {
        assert_eq!(Action::from_name("Jump"), Some(Action::Jump));
        assert_eq!(Action::from_name("switch_weapon"), Some(Action::SwitchWeapon));
        assert_eq!(Action::from_name("dance"), None);
    }
}
