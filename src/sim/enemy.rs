//! Regular enemies
//!
//! Enemies are plain records updated by [`EnemySystem`] rather than state
//! machines: a walker paces back and forth and turns at walls, ledges and
//! the level edge, while a hopper jumps toward the player at a fixed
//! interval.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::{EnemiesConfig, EnemyParams};
use crate::frames;

use super::body::{Aabb, Body, EntityId, Facing};

/// Enemy archetypes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EnemyKind {
    Walker,
    Hopper,
}

impl EnemyKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "walker" => Some(EnemyKind::Walker),
            "hopper" => Some(EnemyKind::Hopper),
            _ => None,
        }
    }

    fn params(self, config: &EnemiesConfig) -> &EnemyParams {
        match self {
            EnemyKind::Walker => &config.walker,
            EnemyKind::Hopper => &config.hopper,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Enemy {
    pub kind: EnemyKind,
    pub body: Body,
    pub health: i32,
    pub facing: Facing,
    pub contact_damage: i32,
    speed: f32,
    jump_force: f32,
    jump_interval: f32,
    jump_timer: f32,
}

impl Enemy {
    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Returns true when this hit killed the enemy
    pub fn take_damage(&mut self, amount: i32) -> bool {
        if amount <= 0 || self.health <= 0 {
            return false;
        }
        self.health = (self.health - amount).max(0);
        self.health == 0
    }

    fn update_walker(&mut self, platforms: &[Aabb], level_width: f32) {
        if self.body.grounded {
            let front = match self.facing {
                Facing::Right => self.body.pos.x + self.body.size.x + 1.0,
                Facing::Left => self.body.pos.x - 1.0,
            };
            let feet = self.body.pos.y + self.body.size.y;
            let ahead_wall = Vec2::new(front, self.body.center().y);
            let ahead_ground = Vec2::new(front, feet + 1.0);

            let at_edge = front <= 0.0 || front >= level_width;
            let blocked = platforms.iter().any(|p| p.contains_point(ahead_wall));
            let ledge = !platforms.iter().any(|p| p.contains_point(ahead_ground));
            if at_edge || blocked || ledge {
                self.facing = match self.facing {
                    Facing::Left => Facing::Right,
                    Facing::Right => Facing::Left,
                };
            }
        }
        self.body.vel.x = self.facing.sign() * self.speed;
    }

    fn update_hopper(&mut self, target: Option<Vec2>, f: f32) {
        self.jump_timer -= f;
        if !self.body.grounded {
            return;
        }
        if let Some(facing) = target.and_then(|t| Facing::from_sign(t.x - self.body.center().x)) {
            self.facing = facing;
        }
        if self.jump_timer <= 0.0 {
            self.body.vel = Vec2::new(self.facing.sign() * self.speed, -self.jump_force);
            self.jump_timer = self.jump_interval;
        } else {
            self.body.vel.x = 0.0;
        }
    }
}

/// Owns and drives every regular enemy
#[derive(Debug, Clone, Default)]
pub struct EnemySystem {
    config: EnemiesConfig,
    enemies: Vec<Enemy>,
}

impl EnemySystem {
    pub fn new(config: EnemiesConfig) -> Self {
        Self {
            config,
            enemies: Vec::new(),
        }
    }

    /// Create an enemy with its feet-left corner at `pos`
    pub fn spawn(&mut self, id: EntityId, kind: EnemyKind, pos: Vec2) -> EntityId {
        let params = kind.params(&self.config);
        let body = Body::new(id, pos, Vec2::new(params.width, params.height));
        self.enemies.push(Enemy {
            kind,
            body,
            health: params.max_health,
            facing: Facing::Left,
            contact_damage: params.contact_damage,
            speed: params.speed,
            jump_force: params.jump_force,
            jump_interval: params.jump_interval,
            jump_timer: params.jump_interval,
        });
        log::debug!("Spawned {:?} {:?} at ({}, {})", kind, id, pos.x, pos.y);
        id
    }

    /// Spawn by archetype name; unknown names are logged and skipped
    pub fn spawn_named(&mut self, id: EntityId, name: &str, pos: Vec2) -> Option<EntityId> {
        match EnemyKind::from_name(name) {
            Some(kind) => Some(self.spawn(id, kind, pos)),
            None => {
                log::warn!("Unknown enemy type '{}'", name);
                None
            }
        }
    }

    /// Run enemy behaviour for one tick (before physics)
    pub fn update(&mut self, platforms: &[Aabb], level_width: f32, target: Option<Vec2>, dt: f32) {
        let f = frames(dt);
        for enemy in &mut self.enemies {
            match enemy.kind {
                EnemyKind::Walker => enemy.update_walker(platforms, level_width),
                EnemyKind::Hopper => enemy.update_hopper(target, f),
            }
        }
    }

    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    pub fn enemies_mut(&mut self) -> &mut [Enemy] {
        &mut self.enemies
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Enemy> {
        self.enemies.iter_mut().find(|e| e.body.id == id)
    }

    /// Remove dead enemies, returning them
    pub fn remove_dead(&mut self) -> Vec<Enemy> {
        let (dead, alive) = std::mem::take(&mut self.enemies)
            .into_iter()
            .partition(|e| !e.is_alive());
        self.enemies = alive;
        dead
    }

    /// Remove one enemy (e.g. fell off the level)
    pub fn remove(&mut self, id: EntityId) -> Option<Enemy> {
        let idx = self.enemies.iter().position(|e| e.body.id == id)?;
        Some(self.enemies.remove(idx))
    }

    pub fn len(&self) -> usize {
        self.enemies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.enemies.is_empty()
    }

    pub fn clear(&mut self) {
        self.enemies.clear();
    }
}
