//! AABB collision detection and response
//!
//! Overlaps are separated along the axis with the smaller penetration.
//! Horizontal wins only when its overlap is strictly smaller, so equal
//! overlaps resolve vertically; boxes meeting exactly at a corner can
//! therefore catch on a ledge for a frame.

use std::collections::HashMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::body::{Aabb, Body, EntityId};

/// Axis a collision was resolved on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Side of the other box that the mover ran into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Top,
    Bottom,
    Left,
    Right,
}

/// Outcome of a resolved collision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub side: Side,
    pub axis: Axis,
    /// Penetration removed along `axis`
    pub depth: f32,
}

/// Pair-level collision notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollisionEvent {
    CollisionEnter { a: EntityId, b: EntityId },
    CollisionExit { a: EntityId, b: EntityId },
    /// Delivered to `receiver`, which asked for trigger reports
    TriggerEnter { receiver: EntityId, other: EntityId },
    TriggerExit { a: EntityId, b: EntityId },
}

/// Per-axis penetration of two boxes, or `None` if they do not strictly overlap
pub fn overlap(a: &Aabb, b: &Aabb) -> Option<Vec2> {
    if !a.intersects(b) {
        return None;
    }
    let x = a.right().min(b.right()) - a.left().max(b.left());
    let y = a.bottom().min(b.bottom()) - a.top().max(b.top());
    Some(Vec2::new(x, y))
}

#[inline]
fn pick_axis(o: Vec2) -> Axis {
    if o.x < o.y { Axis::Horizontal } else { Axis::Vertical }
}

/// Push a moving body fully out of a static box.
///
/// The velocity component pointing into the platform is zeroed; landing on
/// top sets `grounded`.
pub fn resolve_static(body: &mut Body, platform: &Aabb) -> Option<Contact> {
    let o = overlap(&body.aabb(), platform)?;
    let center = body.center();
    let pc = platform.center();

    let contact = match pick_axis(o) {
        Axis::Horizontal => {
            if center.x < pc.x {
                body.pos.x = platform.left() - body.size.x;
                body.vel.x = body.vel.x.min(0.0);
                Contact { side: Side::Left, axis: Axis::Horizontal, depth: o.x }
            } else {
                body.pos.x = platform.right();
                body.vel.x = body.vel.x.max(0.0);
                Contact { side: Side::Right, axis: Axis::Horizontal, depth: o.x }
            }
        }
        Axis::Vertical => {
            if center.y < pc.y {
                body.pos.y = platform.top() - body.size.y;
                body.vel.y = body.vel.y.min(0.0);
                body.grounded = true;
                Contact { side: Side::Top, axis: Axis::Vertical, depth: o.y }
            } else {
                body.pos.y = platform.bottom();
                body.vel.y = body.vel.y.max(0.0);
                Contact { side: Side::Bottom, axis: Axis::Vertical, depth: o.y }
            }
        }
    };
    Some(contact)
}

/// Resolve a body against every platform; returns how many it touched
pub fn resolve_platforms(body: &mut Body, platforms: &[Aabb]) -> usize {
    platforms
        .iter()
        .filter(|p| resolve_static(body, p).is_some())
        .count()
}

/// Separate two dynamic bodies 50/50 and exchange a 1D impulse along the
/// resolved axis. The returned contact is from `a`'s point of view.
pub fn resolve_dynamic(a: &mut Body, b: &mut Body, restitution: f32) -> Option<Contact> {
    let o = overlap(&a.aabb(), &b.aabb())?;
    let ca = a.center();
    let cb = b.center();
    let axis = pick_axis(o);

    // Unit normal pointing from b toward a
    let (normal, depth, side) = match axis {
        Axis::Horizontal => {
            if ca.x < cb.x {
                (Vec2::NEG_X, o.x, Side::Left)
            } else {
                (Vec2::X, o.x, Side::Right)
            }
        }
        Axis::Vertical => {
            if ca.y < cb.y {
                (Vec2::NEG_Y, o.y, Side::Top)
            } else {
                (Vec2::Y, o.y, Side::Bottom)
            }
        }
    };

    let half = normal * (depth * 0.5);
    a.pos += half;
    b.pos -= half;

    let inv_sum = a.inv_mass() + b.inv_mass();
    let v_rel = (a.vel - b.vel).dot(normal);
    if v_rel < 0.0 && inv_sum > 0.0 {
        let j = -(1.0 + restitution) * v_rel / inv_sum;
        a.vel += normal * (j * a.inv_mass());
        b.vel -= normal * (j * b.inv_mass());
    }

    if axis == Axis::Vertical {
        if normal.y < 0.0 {
            a.grounded = true;
        } else {
            b.grounded = true;
        }
    }

    Some(Contact { side, axis, depth })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PairKind {
    Solid,
    Trigger,
}

fn pair_key(a: EntityId, b: EntityId) -> (EntityId, EntityId) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Entity-pair collision resolution with enter/exit tracking
#[derive(Debug, Clone, Default)]
pub struct CollisionResolver {
    pub restitution: f32,
    previous: HashMap<(EntityId, EntityId), PairKind>,
    current: HashMap<(EntityId, EntityId), PairKind>,
    events: Vec<CollisionEvent>,
}

impl CollisionResolver {
    pub fn new(restitution: f32) -> Self {
        Self {
            restitution,
            ..Default::default()
        }
    }

    /// Start a new frame of pair tests
    pub fn begin_frame(&mut self) {
        self.current.clear();
    }

    /// Test and resolve one entity pair.
    ///
    /// Trigger pairs are never separated; each side that reports triggers
    /// gets a `TriggerEnter` on the first overlapping frame.
    pub fn resolve_pair(&mut self, a: &mut Body, b: &mut Body) -> Option<Contact> {
        if !a.aabb().intersects(&b.aabb()) {
            return None;
        }
        let key = pair_key(a.id, b.id);
        let is_new = !self.previous.contains_key(&key);

        if a.is_trigger || b.is_trigger {
            self.current.insert(key, PairKind::Trigger);
            if is_new {
                if a.reports_triggers {
                    self.events.push(CollisionEvent::TriggerEnter { receiver: a.id, other: b.id });
                }
                if b.reports_triggers {
                    self.events.push(CollisionEvent::TriggerEnter { receiver: b.id, other: a.id });
                }
            }
            return None;
        }

        let contact = resolve_dynamic(a, b, self.restitution)?;
        self.current.insert(key, PairKind::Solid);
        if is_new {
            self.events.push(CollisionEvent::CollisionEnter { a: a.id, b: b.id });
        }
        Some(contact)
    }

    /// Close the frame: emit exits for pairs that separated and drain all events
    pub fn end_frame(&mut self) -> Vec<CollisionEvent> {
        let mut exits: Vec<_> = self
            .previous
            .iter()
            .filter(|(key, _)| !self.current.contains_key(*key))
            .map(|(&(a, b), kind)| match kind {
                PairKind::Solid => CollisionEvent::CollisionExit { a, b },
                PairKind::Trigger => CollisionEvent::TriggerExit { a, b },
            })
            .collect();
        // HashMap order is arbitrary; keep event order deterministic
        exits.sort_by_key(|e| match *e {
            CollisionEvent::CollisionExit { a, b } | CollisionEvent::TriggerExit { a, b } => (a, b),
            _ => (EntityId(0), EntityId(0)),
        });
        self.events.extend(exits);
        self.previous = std::mem::take(&mut self.current);
        std::mem::take(&mut self.events)
    }

    /// Forget all tracked pairs (respawn or level reset)
    pub fn clear(&mut self) {
        self.previous.clear();
        self.current.clear();
        self.events.clear();
    }
}
