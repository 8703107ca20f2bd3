//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Caller-supplied `dt`, clamped to `game.maxDelta`
//! - Seeded RNG only
//! - Stable iteration order (spawn order, projectile ids)
//! - No rendering or platform dependencies

pub mod body;
pub mod boss;
pub mod collision;
pub mod context;
pub mod enemy;
pub mod fsm;
pub mod input;
pub mod level;
pub mod particles;
pub mod physics;
pub mod pickup;
pub mod player;
pub mod pool;
pub mod state;
pub mod tick;
pub mod weapon;

pub use body::{Aabb, Body, EntityId, Facing, direction_to};
pub use boss::{Boss, BossAnimation, BossData};
pub use collision::{CollisionEvent, CollisionResolver, Contact, Side, overlap, resolve_dynamic, resolve_static};
pub use context::{GameEvent, SimContext};
pub use enemy::{Enemy, EnemyKind, EnemySystem};
pub use fsm::{State, StateChange, StateMachine, StateName, Transition};
pub use input::{Action, ActionSet, InputContext, InputTracker, TickInput};
pub use level::{EnemySpawn, Level, PickupSpawn};
pub use particles::{EffectKind, EffectOverrides, Particle, ParticleEmitter, ParticleSystem, PooledParticleSystem};
pub use physics::PhysicsIntegrator;
pub use pickup::{Pickup, PickupKind};
pub use player::{Player, PlayerAnimation, PlayerData};
pub use pool::{ObjectPool, PoolHandle};
pub use state::{EntitySnapshot, GamePhase, GameState, Snapshot};
pub use tick::tick;
pub use weapon::{ChargeLevel, Owner, Projectile, WeaponKind, WeaponSystem};
