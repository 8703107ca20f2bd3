//! Shared entity geometry
//!
//! Every simulated entity is composed around a [`Body`]: an axis-aligned box
//! with a velocity and the handful of flags physics and collision need.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Stable identifier for a simulated entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Horizontal facing direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

impl Facing {
    /// -1.0 for left, 1.0 for right
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }

    /// Facing implied by a horizontal value; `None` for zero
    pub fn from_sign(x: f32) -> Option<Self> {
        if x < 0.0 {
            Some(Facing::Left)
        } else if x > 0.0 {
            Some(Facing::Right)
        } else {
            None
        }
    }
}

/// Axis-aligned bounding box (top-left origin, y grows downward)
///
/// Serialized as `{x, y, w, h}`; loading goes through [`Aabb::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "Rect", into = "Rect")]
pub struct Aabb {
    pub pos: Vec2,
    pub size: Vec2,
}

#[derive(Serialize, Deserialize)]
struct Rect {
    x: f32,
    y: f32,
    w: f32,
    h: f32,
}

impl From<Rect> for Aabb {
    fn from(r: Rect) -> Self {
        Aabb::new(r.x, r.y, r.w, r.h)
    }
}

impl From<Aabb> for Rect {
    fn from(b: Aabb) -> Self {
        Rect {
            x: b.pos.x,
            y: b.pos.y,
            w: b.size.x,
            h: b.size.y,
        }
    }
}

impl Aabb {
    /// Create a box; negative extents are clamped to zero
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            size: Vec2::new(w.max(0.0), h.max(0.0)),
        }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.pos.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.pos.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    /// Strict overlap test; boxes that merely touch do not intersect
    #[inline]
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.left() && p.x <= self.right() && p.y >= self.top() && p.y <= self.bottom()
    }
}

/// Physical state of an entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub id: EntityId,
    pub pos: Vec2,
    pub size: Vec2,
    pub vel: Vec2,
    /// Supported by a platform this tick (set by collision, cleared by physics)
    pub grounded: bool,
    /// Multiplier on world gravity; 0 disables gravity
    pub gravity_scale: f32,
    pub mass: f32,
    /// Reports overlaps without being pushed or pushing
    pub is_trigger: bool,
    /// Wants `TriggerEnter` events when it overlaps a trigger
    pub reports_triggers: bool,
}

impl Body {
    pub fn new(id: EntityId, pos: Vec2, size: Vec2) -> Self {
        Self {
            id,
            pos,
            size: size.max(Vec2::ZERO),
            vel: Vec2::ZERO,
            grounded: false,
            gravity_scale: 1.0,
            mass: 1.0,
            is_trigger: false,
            reports_triggers: false,
        }
    }

    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    pub fn with_gravity_scale(mut self, scale: f32) -> Self {
        self.gravity_scale = scale;
        self
    }

    /// Mark as a trigger volume
    pub fn trigger(mut self) -> Self {
        self.is_trigger = true;
        self
    }

    pub fn aabb(&self) -> Aabb {
        Aabb {
            pos: self.pos,
            size: self.size,
        }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    /// Inverse mass; zero or negative mass counts as immovable
    #[inline]
    pub fn inv_mass(&self) -> f32 {
        if self.mass > 0.0 { 1.0 / self.mass } else { 0.0 }
    }
}

/// Unit vector from `from` toward `to`, or zero when the points coincide
pub fn direction_to(from: Vec2, to: Vec2) -> Vec2 {
    let delta = to - from;
    let len = delta.length();
    if len <= f32::EPSILON {
        Vec2::ZERO
    } else {
        delta / len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touching_boxes_do_not_intersect() {
        let a = Aabb::new(0.0, 0.0, 10.0, 10.0);
        let b = Aabb::new(10.0, 0.0, 10.0, 10.0);
        assert!(!a.intersects(&b));
        let c = Aabb::new(9.9, 0.0, 10.0, 10.0);
        assert!(a.intersects(&c));
    }

    #[test]
    fn test_negative_size_is_clamped() {
        let a = Aabb::new(0.0, 0.0, -4.0, 3.0);
        assert_eq!(a.size, Vec2::new(0.0, 3.0));
        let body = Body::new(EntityId(1), Vec2::ZERO, Vec2::new(-1.0, -1.0));
        assert_eq!(body.size, Vec2::ZERO);
    }

    #[test]
    fn test_direction_to_zero_distance() {
        let p = Vec2::new(5.0, 5.0);
        assert_eq!(direction_to(p, p), Vec2::ZERO);
        let d = direction_to(Vec2::ZERO, Vec2::new(3.0, 4.0));
        assert!((d.length() - 1.0).abs() < 1e-6);
        assert!((d.x - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_facing_sign() {
        assert_eq!(Facing::Left.sign(), -1.0);
        assert_eq!(Facing::from_sign(2.0), Some(Facing::Right));
        assert_eq!(Facing::from_sign(0.0), None);
    }
}
