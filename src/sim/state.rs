//! Game state and the renderer-facing snapshot
//!
//! [`GameState`] owns every entity and shared system. It is advanced only by
//! [`tick`](super::tick::tick).

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::GameConfig;

use super::body::{Aabb, EntityId, Facing};
use super::boss::Boss;
use super::collision::CollisionResolver;
use super::context::{GameEvent, SimContext};
use super::enemy::{EnemyKind, EnemySystem};
use super::fsm::StateName;
use super::level::Level;
use super::particles::Particle;
use super::physics::PhysicsIntegrator;
use super::pickup::{Pickup, PickupKind};
use super::player::Player;
use super::weapon::{Projectile, WeaponKind};

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GamePhase {
    /// Active gameplay
    Playing,
    /// Game is paused
    Paused,
    /// Boss defeated
    Victory,
    /// Out of lives
    GameOver,
}

impl GamePhase {
    pub fn is_finished(self) -> bool {
        matches!(self, GamePhase::Victory | GamePhase::GameOver)
    }
}

/// Complete simulation state
pub struct GameState {
    pub phase: GamePhase,
    pub level: Level,
    pub player: Player,
    pub boss: Option<Boss>,
    pub enemies: EnemySystem,
    /// Active pickups (in spawn order)
    pub pickups: Vec<Pickup>,
    pub ctx: SimContext,
    /// Events published by completed ticks, drained by the host
    pub events: Vec<GameEvent>,
    pub(crate) physics: PhysicsIntegrator,
    pub(crate) collisions: CollisionResolver,
    pub(crate) incoming: Vec<Projectile>,
    next_id: u32,
}

fn allocate(next: &mut u32) -> EntityId {
    let id = EntityId(*next);
    *next += 1;
    id
}

impl GameState {
    /// Build a fresh run of `level`
    pub fn new(config: GameConfig, level: Level) -> Self {
        let mut ctx = SimContext::new(config.validated());
        let mut next_id = 1;

        let player = Player::new(allocate(&mut next_id), &mut ctx);
        let boss = level
            .boss
            .then(|| Boss::new(allocate(&mut next_id), &mut ctx));

        let mut enemies = EnemySystem::new(ctx.config.enemies.clone());
        for spawn in &level.enemies {
            enemies.spawn(allocate(&mut next_id), spawn.kind, spawn.pos);
        }
        let pickups = level
            .pickups
            .iter()
            .map(|spawn| Pickup::new(allocate(&mut next_id), spawn.kind, spawn.pos))
            .collect();

        log::info!(
            "Level '{}' loaded: {} platforms, {} enemies, boss: {}",
            level.name,
            level.platforms.len(),
            enemies.len(),
            boss.is_some()
        );

        // Construction-time transitions are not gameplay events
        let mut state = Self {
            phase: GamePhase::Playing,
            physics: PhysicsIntegrator::from_settings(&ctx.config.game),
            collisions: CollisionResolver::new(ctx.config.game.restitution),
            level,
            player,
            boss,
            enemies,
            pickups,
            ctx,
            events: Vec::new(),
            incoming: Vec::new(),
            next_id,
        };
        state.player.drain_transitions();
        if let Some(boss) = state.boss.as_mut() {
            boss.drain_transitions();
        }
        state.ctx.events.clear();
        state
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        allocate(&mut self.next_id)
    }

    pub fn tick_count(&self) -> u64 {
        self.ctx.tick
    }

    pub fn config(&self) -> &GameConfig {
        &self.ctx.config
    }

    /// Spawn an enemy mid-run
    pub fn spawn_enemy(&mut self, kind: EnemyKind, pos: Vec2) -> EntityId {
        let id = self.next_entity_id();
        self.enemies.spawn(id, kind, pos)
    }

    /// Drop a pickup mid-run
    pub fn spawn_pickup(&mut self, kind: PickupKind, pos: Vec2) -> EntityId {
        let id = self.next_entity_id();
        self.pickups.push(Pickup::new(id, kind, pos));
        id
    }

    /// Queue a projectile built outside the weapon system; it joins the
    /// simulation on the next weapon update
    pub fn inject_projectile(&mut self, projectile: Projectile) {
        self.incoming.push(projectile);
    }

    /// Take every event published since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn set_phase(&mut self, phase: GamePhase) {
        if self.phase == phase {
            return;
        }
        log::info!("Phase {:?} -> {:?}", self.phase, phase);
        self.ctx.emit(GameEvent::PhaseChanged {
            from: self.phase,
            to: phase,
        });
        self.phase = phase;
    }

    /// Serializable view of everything a renderer draws
    pub fn snapshot(&self) -> Snapshot {
        let mut entities = Vec::with_capacity(2 + self.enemies.len() + self.pickups.len());

        let p = &self.player.data;
        entities.push(EntitySnapshot {
            id: p.body.id,
            kind: "player",
            x: p.body.pos.x,
            y: p.body.pos.y,
            width: p.body.size.x,
            height: p.body.size.y,
            vx: p.body.vel.x,
            vy: p.body.vel.y,
            health: p.health,
            grounded: p.body.grounded,
            facing: p.facing,
            current_animation: p.animation.as_str(),
            state: self.player.state(),
        });

        if let Some(boss) = &self.boss {
            let b = &boss.data;
            entities.push(EntitySnapshot {
                id: b.body.id,
                kind: "boss",
                x: b.body.pos.x,
                y: b.body.pos.y,
                width: b.body.size.x,
                height: b.body.size.y,
                vx: b.body.vel.x,
                vy: b.body.vel.y,
                health: b.health,
                grounded: b.body.grounded,
                facing: b.facing,
                current_animation: b.animation.as_str(),
                state: boss.state(),
            });
        }

        for e in self.enemies.enemies() {
            let (kind, animation) = match e.kind {
                EnemyKind::Walker => ("walker", "walk"),
                EnemyKind::Hopper if e.body.grounded => ("hopper", "idle"),
                EnemyKind::Hopper => ("hopper", "jump"),
            };
            entities.push(EntitySnapshot {
                id: e.body.id,
                kind,
                x: e.body.pos.x,
                y: e.body.pos.y,
                width: e.body.size.x,
                height: e.body.size.y,
                vx: e.body.vel.x,
                vy: e.body.vel.y,
                health: e.health,
                grounded: e.body.grounded,
                facing: e.facing,
                current_animation: animation,
                state: None,
            });
        }

        for pickup in &self.pickups {
            let kind = match pickup.kind {
                PickupKind::Health { .. } => "healthPickup",
                PickupKind::Weapon(_) => "weaponPickup",
            };
            entities.push(EntitySnapshot {
                id: pickup.body.id,
                kind,
                x: pickup.body.pos.x,
                y: pickup.body.pos.y,
                width: pickup.body.size.x,
                height: pickup.body.size.y,
                vx: 0.0,
                vy: 0.0,
                health: 0,
                grounded: false,
                facing: Facing::Right,
                current_animation: "idle",
                state: None,
            });
        }

        Snapshot {
            tick: self.ctx.tick,
            phase: self.phase,
            lives: p.lives,
            weapon: p.weapon,
            charge: p.charge_timer,
            platforms: self.level.platforms.clone(),
            entities,
            projectiles: self.ctx.weapons.projectiles().to_vec(),
            particles: self.ctx.particles.snapshot(),
        }
    }
}

/// One drawable entity
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub kind: &'static str,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub vx: f32,
    pub vy: f32,
    pub health: i32,
    pub grounded: bool,
    pub facing: Facing,
    pub current_animation: &'static str,
    pub state: Option<StateName>,
}

/// Renderer view of one tick
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub tick: u64,
    pub phase: GamePhase,
    pub lives: u32,
    pub weapon: WeaponKind,
    pub charge: f32,
    pub platforms: Vec<Aabb>,
    pub entities: Vec<EntitySnapshot>,
    pub projectiles: Vec<Projectile>,
    pub particles: Vec<Particle>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameSettings;

    #[test]
    fn test_new_state_spawns_level() {
        let config = GameConfig::default();
        let level = Level::demo(&config.game);
        let state = GameState::new(config, level);
        assert_eq!(state.phase, GamePhase::Playing);
        assert!(state.boss.is_some());
        assert_eq!(state.enemies.len(), 2);
        assert_eq!(state.pickups.len(), 2);
        assert!(state.ctx.events.is_empty());
        assert!(state.events.is_empty());

        // Ids are unique and sequential
        let snapshot = state.snapshot();
        let mut ids: Vec<_> = snapshot.entities.iter().map(|e| e.id.0).collect();
        ids.sort_unstable();
        assert_eq!(ids, (1..=6).collect::<Vec<_>>());
    }

    #[test]
    fn test_snapshot_serializes() {
        let state = GameState::new(GameConfig::default(), Level::flat(&GameSettings::default()));
        let json = serde_json::to_string(&state.snapshot()).unwrap();
        assert!(json.contains("\"kind\":\"player\""));
        assert!(json.contains("\"phase\":\"playing\""));
        assert!(json.contains("\"state\":\"idle\""));
        assert!(json.contains("\"currentAnimation\":\"idle\""));
        assert!(json.contains("\"platforms\":[{\"x\":0.0,"));
    }

    #[test]
    fn test_set_phase_emits_once() {
        let mut state = GameState::new(GameConfig::default(), Level::flat(&GameSettings::default()));
        state.set_phase(GamePhase::Paused);
        state.set_phase(GamePhase::Paused);
        assert_eq!(state.ctx.events.len(), 1);
        assert!(!state.phase.is_finished());
    }
}
