//! Per-tick context shared by every state machine
//!
//! States receive the entity they drive plus this context. It carries the
//! input snapshot, the shared systems a state may call into, and the event
//! queue the host drains after the tick.

use glam::Vec2;
use serde::Serialize;

use crate::config::GameConfig;

use super::body::EntityId;
use super::fsm::StateName;
use super::input::TickInput;
use super::particles::{ParticleEmitter, ParticleSystem, PooledParticleSystem};
use super::pickup::PickupKind;
use super::state::GamePhase;
use super::weapon::{ChargeLevel, Owner, WeaponKind, WeaponSystem};

/// Gameplay notifications published to the host
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GameEvent {
    StateChanged {
        entity: EntityId,
        from: Option<StateName>,
        to: StateName,
    },
    Damaged {
        entity: EntityId,
        amount: i32,
        health: i32,
    },
    Died {
        entity: EntityId,
    },
    CollisionEnter {
        a: EntityId,
        b: EntityId,
    },
    TriggerEnter {
        receiver: EntityId,
        other: EntityId,
    },
    ProjectileFired {
        owner: Owner,
        kind: WeaponKind,
        charged: ChargeLevel,
    },
    PickupCollected {
        entity: EntityId,
        pickup: PickupKind,
    },
    FellOffLevel {
        entity: EntityId,
    },
    Enraged {
        entity: EntityId,
    },
    PhaseChanged {
        from: GamePhase,
        to: GamePhase,
    },
}

/// Everything a state may touch besides its own entity
pub struct SimContext {
    pub config: GameConfig,
    pub input: TickInput,
    pub weapons: WeaponSystem,
    pub particles: Box<dyn ParticleEmitter>,
    pub events: Vec<GameEvent>,
    /// Center of the player, when one is alive (boss and enemy targeting)
    pub target: Option<Vec2>,
    pub tick: u64,
}

impl SimContext {
    pub fn new(config: GameConfig) -> Self {
        let weapons = WeaponSystem::new(config.weapons.clone(), &config.game);
        let seed = config.game.seed;
        let particles: Box<dyn ParticleEmitter> = if config.game.pooled_particles {
            Box::new(PooledParticleSystem::new(config.particles.clone(), seed))
        } else {
            Box::new(ParticleSystem::new(config.particles.clone(), seed))
        };
        Self {
            config,
            input: TickInput::default(),
            weapons,
            particles,
            events: Vec::new(),
            target: None,
            tick: 0,
        }
    }

    #[inline]
    pub fn emit(&mut self, event: GameEvent) {
        log::trace!("{:?}", event);
        self.events.push(event);
    }
}
