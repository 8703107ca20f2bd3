//! Collectible pickups
//!
//! A pickup is a trigger body: it never pushes anything, and the collision
//! resolver reports a `TriggerEnter` to the player when the two overlap.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::body::{Body, EntityId};
use super::weapon::WeaponKind;

pub const PICKUP_SIZE: f32 = 16.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PickupKind {
    Health { amount: i32 },
    Weapon(WeaponKind),
}

#[derive(Debug, Clone)]
pub struct Pickup {
    pub kind: PickupKind,
    pub body: Body,
}

impl Pickup {
    /// Floating trigger box with its top-left corner at `pos`
    pub fn new(id: EntityId, kind: PickupKind, pos: Vec2) -> Self {
        let body = Body::new(id, pos, Vec2::splat(PICKUP_SIZE))
            .with_gravity_scale(0.0)
            .trigger();
        Self { kind, body }
    }

    pub fn id(&self) -> EntityId {
        self.body.id
    }
}
