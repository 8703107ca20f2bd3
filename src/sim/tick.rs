//! Fixed-order simulation tick
//!
//! Stage order per tick: input snapshot, player and boss state machines,
//! enemy behaviour, physics, collision, weapons and hits, particles, then
//! cleanup and phase changes.

use glam::Vec2;

use crate::clamp_dt;

use super::body::EntityId;
use super::collision::{CollisionEvent, resolve_platforms};
use super::context::{GameEvent, SimContext};
use super::fsm::StateChange;
use super::input::{Action, InputContext, TickInput};
use super::particles::{EffectKind, EffectOverrides};
use super::pickup::{Pickup, PickupKind};
use super::player::Player;
use super::state::{GamePhase, GameState};

/// Advance the game state by one step of `dt` seconds
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    let dt = clamp_dt(dt, state.ctx.config.game.max_delta);

    if input.was_action_just_pressed(Action::Pause) {
        match state.phase {
            GamePhase::Playing => state.set_phase(GamePhase::Paused),
            GamePhase::Paused => state.set_phase(GamePhase::Playing),
            _ => {}
        }
    }
    if state.phase != GamePhase::Playing {
        publish(state);
        return;
    }

    state.ctx.input = input.clone();
    state.ctx.tick += 1;
    if input.was_action_just_pressed(Action::SwitchWeapon) {
        state.player.cycle_weapon();
    }

    update_state_machines(state, dt);
    let target = state.ctx.target;
    state
        .enemies
        .update(&state.level.platforms, state.ctx.config.game.level_width, target, dt);

    let player_fell = integrate(state, dt);
    collide(state);
    update_weapons(state, dt);
    state.ctx.particles.update(dt);
    cleanup(state, player_fell);

    publish(state);
}

fn update_state_machines(state: &mut GameState, dt: f32) {
    state.ctx.target = state
        .player
        .is_alive()
        .then(|| state.player.data.body.center());
    state.player.update(&mut state.ctx, dt);
    if let Some(boss) = state.boss.as_mut() {
        boss.update(&mut state.ctx, dt);
    }
}

/// Integrate every dynamic body. Returns whether the player fell off the level.
fn integrate(state: &mut GameState, dt: f32) -> bool {
    let physics = &state.physics;
    let player_fell = physics.step(&mut state.player.data.body, dt);

    if let Some(boss) = state.boss.as_mut() {
        if physics.step(&mut boss.data.body, dt) {
            let cfg = &state.ctx.config.boss;
            log::warn!("Boss fell off the level, returning it to its spawn point");
            boss.data.body.pos = Vec2::new(cfg.spawn_x, cfg.spawn_y);
            boss.data.body.vel = Vec2::ZERO;
            state.ctx.emit(GameEvent::FellOffLevel { entity: boss.id() });
        }
    }

    let mut fallen = Vec::new();
    for enemy in state.enemies.enemies_mut() {
        if physics.step(&mut enemy.body, dt) {
            fallen.push(enemy.body.id);
        }
    }
    for id in fallen {
        state.enemies.remove(id);
        state.ctx.emit(GameEvent::FellOffLevel { entity: id });
    }
    player_fell
}

fn collide(state: &mut GameState) {
    let platforms = &state.level.platforms;
    let ctx = &mut state.ctx;
    let player = &mut state.player;

    resolve_platforms(&mut player.data.body, platforms);
    if let Some(boss) = state.boss.as_mut() {
        resolve_platforms(&mut boss.data.body, platforms);
    }
    for enemy in state.enemies.enemies_mut() {
        resolve_platforms(&mut enemy.body, platforms);
    }

    state.collisions.begin_frame();
    if let Some(boss) = state.boss.as_mut() {
        if state
            .collisions
            .resolve_pair(&mut player.data.body, &mut boss.data.body)
            .is_some()
        {
            let damage = ctx.config.boss.contact_damage;
            player.take_damage(damage, boss.data.body.center(), ctx);
        }
    }
    for enemy in state.enemies.enemies_mut() {
        if state
            .collisions
            .resolve_pair(&mut player.data.body, &mut enemy.body)
            .is_some()
        {
            player.take_damage(enemy.contact_damage, enemy.body.center(), ctx);
        }
    }
    for pickup in &mut state.pickups {
        state
            .collisions
            .resolve_pair(&mut player.data.body, &mut pickup.body);
    }

    for event in state.collisions.end_frame() {
        match event {
            CollisionEvent::CollisionEnter { a, b } => ctx.emit(GameEvent::CollisionEnter { a, b }),
            CollisionEvent::TriggerEnter { receiver, other } => {
                ctx.emit(GameEvent::TriggerEnter { receiver, other });
                if receiver == player.id() {
                    collect_pickup(player, &mut state.pickups, other, ctx);
                }
            }
            CollisionEvent::CollisionExit { .. } | CollisionEvent::TriggerExit { .. } => {}
        }
    }
}

fn collect_pickup(player: &mut Player, pickups: &mut Vec<Pickup>, id: EntityId, ctx: &mut SimContext) {
    let Some(idx) = pickups.iter().position(|p| p.id() == id) else {
        return;
    };
    let pickup = pickups.remove(idx);
    match pickup.kind {
        PickupKind::Health { amount } => {
            let data = &mut player.data;
            data.health = (data.health + amount.max(0)).min(data.max_health);
        }
        PickupKind::Weapon(kind) => {
            player.data.weapon = kind;
            player.data.charging = false;
            player.data.charge_timer = 0.0;
        }
    }
    ctx.particles
        .create_effect(EffectKind::Pickup, pickup.body.center(), &EffectOverrides::default());
    ctx.emit(GameEvent::PickupCollected {
        entity: player.id(),
        pickup: pickup.kind,
    });
}

fn update_weapons(state: &mut GameState, dt: f32) {
    let ctx = &mut state.ctx;
    ctx.weapons
        .update_projectiles(&mut state.incoming, &state.level.platforms, dt);
    for shot in ctx.weapons.drain_fired() {
        ctx.emit(GameEvent::ProjectileFired {
            owner: shot.owner,
            kind: shot.kind,
            charged: shot.charged,
        });
    }

    let player = &mut state.player;
    if player.is_alive() {
        let bounds = player.data.body.aabb();
        for hit in ctx.weapons.resolve_hits(player.id(), &bounds, true) {
            player.take_damage(hit.damage, hit.pos, ctx);
        }
    }

    if let Some(boss) = state.boss.as_mut() {
        let bounds = boss.data.body.aabb();
        for hit in ctx.weapons.resolve_hits(boss.id(), &bounds, false) {
            boss.take_damage(hit.damage, ctx);
        }
    }

    for enemy in state.enemies.enemies_mut() {
        let bounds = enemy.body.aabb();
        for hit in ctx.weapons.resolve_hits(enemy.body.id, &bounds, false) {
            ctx.particles
                .create_effect(EffectKind::Hit, hit.pos, &EffectOverrides::default());
            if enemy.take_damage(hit.damage) {
                ctx.emit(GameEvent::Died { entity: enemy.body.id });
                ctx.particles.create_effect(
                    EffectKind::Explosion,
                    enemy.body.center(),
                    &EffectOverrides::default(),
                );
            }
        }
    }
}

fn cleanup(state: &mut GameState, player_fell: bool) {
    let removed = state.enemies.remove_dead();
    if !removed.is_empty() {
        log::debug!("Removed {} defeated enemies", removed.len());
    }

    if player_fell {
        let id = state.player.id();
        state.ctx.emit(GameEvent::FellOffLevel { entity: id });
        lose_life(state);
    } else if !state.player.is_alive() {
        lose_life(state);
    }

    if state.boss.as_ref().is_some_and(|b| !b.is_alive()) {
        if let Some(mut boss) = state.boss.take() {
            let changes = boss.drain_transitions();
            publish_transitions(&mut state.ctx, boss.id(), changes);
        }
        if state.phase == GamePhase::Playing {
            state.set_phase(GamePhase::Victory);
        }
    }
}

fn lose_life(state: &mut GameState) {
    let data = &mut state.player.data;
    data.lives = data.lives.saturating_sub(1);
    log::info!("Player lost a life, {} remaining", data.lives);
    if data.lives == 0 {
        data.health = 0;
        state.set_phase(GamePhase::GameOver);
    } else {
        state.ctx.weapons.clear();
        state.collisions.clear();
        state.player.respawn(&mut state.ctx);
    }
}

fn publish_transitions(ctx: &mut SimContext, entity: EntityId, changes: Vec<StateChange>) {
    for change in changes {
        ctx.emit(GameEvent::StateChanged {
            entity,
            from: change.from,
            to: change.to,
        });
    }
}

/// Move this tick's events into the host-facing queue
fn publish(state: &mut GameState) {
    let changes = state.player.drain_transitions();
    publish_transitions(&mut state.ctx, state.player.id(), changes);
    if let Some(boss) = state.boss.as_mut() {
        let changes = boss.drain_transitions();
        publish_transitions(&mut state.ctx, boss.id(), changes);
    }
    state.events.append(&mut state.ctx.events);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GameConfig, GameSettings};
    use crate::consts::SIM_DT;
    use crate::sim::enemy::EnemyKind;
    use crate::sim::level::Level;
    use crate::sim::player;
    use crate::sim::weapon::{Owner, Projectile, WeaponKind};

    fn flat_state(config: GameConfig) -> GameState {
        let level = Level::flat(&config.game);
        GameState::new(config, level)
    }

    fn run(state: &mut GameState, input: &TickInput, ticks: usize) {
        for _ in 0..ticks {
            tick(state, input, SIM_DT);
        }
    }

    fn floor_top(state: &GameState) -> f32 {
        state.level.platforms[0].top()
    }

    #[test]
    fn test_player_lands_and_idles() {
        let mut state = flat_state(GameConfig::default());
        run(&mut state, &TickInput::default(), 90);
        let body = &state.player.data.body;
        assert!(body.grounded);
        assert_eq!(body.pos.y + body.size.y, floor_top(&state));
        assert!(state.player.is_in_state(player::IDLE));

        let events = state.drain_events();
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::StateChanged { to: "jumping", .. }
        )));
        assert!(events.iter().any(|e| matches!(e, GameEvent::StateChanged { to: "idle", .. })));
    }

    #[test]
    fn test_walk_right() {
        let mut state = flat_state(GameConfig::default());
        run(&mut state, &TickInput::default(), 90);
        let start = state.player.data.body.pos.x;
        run(&mut state, &TickInput::hold(&[Action::Right]), 30);
        assert!(state.player.data.body.pos.x > start + 50.0);
        assert!(state.player.is_in_state(player::WALKING));
    }

    #[test]
    fn test_determinism() {
        let config = GameConfig::default();
        let mut a = GameState::new(config.clone(), Level::demo(&config.game));
        let mut b = GameState::new(config.clone(), Level::demo(&config.game));

        let script = [
            TickInput::hold(&[Action::Right]),
            TickInput::press(&[Action::Jump, Action::Right]),
            TickInput::press(&[Action::Shoot]),
            TickInput::hold(&[Action::Shoot]),
            TickInput::release(&[Action::Shoot]),
            TickInput::press(&[Action::Slide]),
        ];
        for (i, input) in script.iter().cycle().take(600).enumerate() {
            tick(&mut a, input, SIM_DT);
            tick(&mut b, input, SIM_DT);
            if i % 100 == 0 {
                let sa = serde_json::to_string(&a.snapshot()).unwrap();
                let sb = serde_json::to_string(&b.snapshot()).unwrap();
                assert_eq!(sa, sb);
            }
        }
        assert_eq!(a.drain_events(), b.drain_events());
    }

    #[test]
    fn test_pause_freezes_simulation() {
        let mut state = flat_state(GameConfig::default());
        run(&mut state, &TickInput::default(), 5);
        tick(&mut state, &TickInput::press(&[Action::Pause]), SIM_DT);
        assert_eq!(state.phase, GamePhase::Paused);
        let frozen = state.tick_count();
        let pos = state.player.data.body.pos;
        run(&mut state, &TickInput::default(), 10);
        assert_eq!(state.tick_count(), frozen);
        assert_eq!(state.player.data.body.pos, pos);

        tick(&mut state, &TickInput::press(&[Action::Pause]), SIM_DT);
        assert_eq!(state.phase, GamePhase::Playing);
        let events = state.drain_events();
        let phase_changes = events
            .iter()
            .filter(|e| matches!(e, GameEvent::PhaseChanged { .. }))
            .count();
        assert_eq!(phase_changes, 2);
    }

    #[test]
    fn test_falling_off_costs_a_life() {
        let config = GameConfig::default();
        let mut state = GameState::new(config.clone(), Level::default());
        // One fall from the spawn point takes under 30 ticks
        run(&mut state, &TickInput::default(), 40);
        assert_eq!(state.player.data.lives, config.player.lives - 1);
        assert_eq!(state.phase, GamePhase::Playing);
        assert!(state
            .drain_events()
            .iter()
            .any(|e| matches!(e, GameEvent::FellOffLevel { .. })));
    }

    #[test]
    fn test_last_life_is_game_over() {
        let mut config = GameConfig::default();
        config.player.lives = 1;
        let mut state = GameState::new(config, Level::default());
        run(&mut state, &TickInput::default(), 120);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert_eq!(state.player.data.lives, 0);

        // Finished runs no longer advance
        let t = state.tick_count();
        run(&mut state, &TickInput::default(), 5);
        assert_eq!(state.tick_count(), t);
    }

    #[test]
    fn test_pickup_is_collected() {
        let mut state = flat_state(GameConfig::default());
        let at = state.player.data.body.pos + Vec2::new(8.0, 8.0);
        state.spawn_pickup(PickupKind::Weapon(WeaponKind::Laser), at);
        tick(&mut state, &TickInput::default(), SIM_DT);

        assert!(state.pickups.is_empty());
        assert_eq!(state.player.data.weapon, WeaponKind::Laser);
        assert!(state
            .drain_events()
            .iter()
            .any(|e| matches!(e, GameEvent::PickupCollected { .. })));
    }

    #[test]
    fn test_health_pickup_caps_at_max() {
        let mut state = flat_state(GameConfig::default());
        state.player.data.health = 90;
        let at = state.player.data.body.pos;
        state.spawn_pickup(PickupKind::Health { amount: 25 }, at);
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.player.data.health, 100);
    }

    #[test]
    fn test_enemy_contact_damages_player() {
        let mut state = flat_state(GameConfig::default());
        let at = state.player.data.body.pos + Vec2::new(10.0, 20.0);
        state.spawn_enemy(EnemyKind::Walker, at);
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.player.data.health, 90);
        assert!(state.player.data.invulnerable > 0.0);
    }

    #[test]
    fn test_shooting_the_boss_wins() {
        let config = GameConfig::default();
        let mut state = GameState::new(config.clone(), Level::demo(&config.game));
        state.enemies.clear();
        state.pickups.clear();
        state.player.data.body.pos.x = 1200.0;
        if let Some(boss) = state.boss.as_mut() {
            boss.data.health = 1;
        }

        // Land first; the boss idles for its first second
        run(&mut state, &TickInput::default(), 30);
        tick(&mut state, &TickInput::press(&[Action::Shoot]), SIM_DT);
        run(&mut state, &TickInput::default(), 20);

        assert_eq!(state.phase, GamePhase::Victory);
        assert!(state.boss.is_none());
        let events = state.drain_events();
        assert!(events.iter().any(|e| matches!(e, GameEvent::ProjectileFired { .. })));
        assert!(events.iter().any(|e| matches!(e, GameEvent::Died { .. })));
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::PhaseChanged {
                to: GamePhase::Victory,
                ..
            }
        )));
    }

    #[test]
    fn test_injected_projectile_hits_player() {
        let mut state = flat_state(GameConfig::default());
        let center = state.player.data.body.center();
        state.inject_projectile(Projectile::straight(
            Owner::Enemy,
            center - Vec2::new(40.0, 3.0),
            Vec2::new(6.0, 0.0),
            Vec2::new(8.0, 6.0),
            15,
            60.0,
        ));
        run(&mut state, &TickInput::default(), 8);
        assert_eq!(state.player.data.health, 85);
        assert!(state.ctx.weapons.projectiles().is_empty());
    }

    #[test]
    fn test_switch_weapon_action() {
        let mut state = flat_state(GameConfig::default());
        tick(&mut state, &TickInput::press(&[Action::SwitchWeapon]), SIM_DT);
        assert_eq!(state.player.data.weapon, WeaponKind::Rapid);
    }

    #[test]
    fn test_large_dt_is_clamped() {
        let mut a = flat_state(GameConfig::default());
        let mut b = flat_state(GameConfig::default());
        tick(&mut a, &TickInput::default(), 10.0);
        tick(&mut b, &TickInput::default(), GameSettings::default().max_delta);
        assert_eq!(a.player.data.body.pos, b.player.data.body.pos);
    }
}
