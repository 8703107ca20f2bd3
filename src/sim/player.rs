//! Player entity and its state graph
//!
//! ```text
//! idle <-> walking
//! idle | walking -> jumping | sliding | shooting -> idle | walking
//! ```
//!
//! A global state ticks the cooldowns and the weapon charge every frame.
//! Shooting works in three steps: pressing Shoot fires an uncharged shot at
//! once, holding it accumulates charge, and releasing it above the charge
//! threshold fires a charged shot.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::PlayerConfig;
use crate::frames;

use super::body::{Body, EntityId, Facing};
use super::context::{GameEvent, SimContext};
use super::fsm::{State, StateChange, StateMachine, StateName, Transition};
use super::input::{Action, InputContext};
use super::particles::{EffectKind, EffectOverrides};
use super::weapon::WeaponKind;

pub const IDLE: StateName = "idle";
pub const WALKING: StateName = "walking";
pub const JUMPING: StateName = "jumping";
pub const SLIDING: StateName = "sliding";
pub const SHOOTING: StateName = "shooting";

/// Animation tag reported to the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlayerAnimation {
    #[default]
    Idle,
    Walk,
    Jump,
    Fall,
    Slide,
    Shoot,
}

impl PlayerAnimation {
    pub fn as_str(self) -> &'static str {
        match self {
            PlayerAnimation::Idle => "idle",
            PlayerAnimation::Walk => "walk",
            PlayerAnimation::Jump => "jump",
            PlayerAnimation::Fall => "fall",
            PlayerAnimation::Slide => "slide",
            PlayerAnimation::Shoot => "shoot",
        }
    }
}

/// Everything the player states read and write
#[derive(Debug, Clone)]
pub struct PlayerData {
    pub body: Body,
    pub health: i32,
    pub max_health: i32,
    pub lives: u32,
    pub facing: Facing,
    pub animation: PlayerAnimation,
    pub weapon: WeaponKind,
    pub charge_timer: f32,
    pub charging: bool,
    pub shoot_cooldown: f32,
    pub slide_cooldown: f32,
    /// Remaining invulnerability in frames
    pub invulnerable: f32,
    pub spawn: Vec2,
}

impl PlayerData {
    fn new(id: EntityId, config: &PlayerConfig) -> Self {
        let spawn = Vec2::new(config.spawn_x, config.spawn_y);
        let mut body = Body::new(id, spawn, Vec2::new(config.width, config.height)).with_mass(config.mass);
        body.reports_triggers = true;
        Self {
            body,
            health: config.max_health,
            max_health: config.max_health,
            lives: config.lives,
            facing: Facing::Right,
            animation: PlayerAnimation::Idle,
            weapon: WeaponKind::Normal,
            charge_timer: 0.0,
            charging: false,
            shoot_cooldown: 0.0,
            slide_cooldown: 0.0,
            invulnerable: 0.0,
            spawn,
        }
    }

    /// Point projectiles leave from: the leading edge at chest height
    pub fn muzzle(&self) -> Vec2 {
        let x = match self.facing {
            Facing::Right => self.body.pos.x + self.body.size.x,
            Facing::Left => self.body.pos.x,
        };
        Vec2::new(x, self.body.center().y)
    }

    fn face_toward(&mut self, x: f32) {
        if let Some(facing) = Facing::from_sign(x) {
            self.facing = facing;
        }
    }

    fn jump(&mut self, ctx: &SimContext) {
        self.body.vel.y = -ctx.config.player.jump_force;
    }

    fn feet(&self) -> Vec2 {
        Vec2::new(self.body.center().x, self.body.pos.y + self.body.size.y)
    }

    fn fire(&mut self, ctx: &mut SimContext, charge: f32) {
        let muzzle = self.muzzle();
        let max_charge = ctx.config.weapons.max_charge;
        self.shoot_cooldown = ctx
            .weapons
            .create_weapon(self.weapon, muzzle.x, muzzle.y, self.facing.sign(), charge, max_charge);
        ctx.particles
            .create_effect(EffectKind::Muzzle, muzzle, &EffectOverrides::default());
    }

    /// Handle Shoot presses and releases; true when a shot went out
    fn shoot_input(&mut self, ctx: &mut SimContext) -> bool {
        if ctx.input.was_action_just_pressed(Action::Shoot) {
            self.charging = true;
            self.charge_timer = 0.0;
            if self.shoot_cooldown <= 0.0 {
                self.fire(ctx, 0.0);
                return true;
            }
            return false;
        }

        if ctx.input.was_action_just_released(Action::Shoot) && self.charging {
            let charge = self.charge_timer;
            self.charging = false;
            self.charge_timer = 0.0;
            if charge >= ctx.config.weapons.charge_threshold && self.shoot_cooldown <= 0.0 {
                self.fire(ctx, charge);
                return true;
            }
        }
        false
    }

    fn wants_slide(&self, ctx: &SimContext) -> bool {
        ctx.input.was_action_just_pressed(Action::Slide) && self.slide_cooldown <= 0.0
    }
}

fn moving(ctx: &SimContext) -> bool {
    ctx.input.movement_vector().x.abs() > ctx.config.player.move_deadzone
}

/// Where a grounded state settles once its own action is over
fn ground_state(ctx: &SimContext) -> Transition {
    if moving(ctx) {
        Transition::To(WALKING)
    } else {
        Transition::To(IDLE)
    }
}

/// Transitions shared by idle and walking, in priority order
fn grounded_actions(player: &mut PlayerData, ctx: &mut SimContext) -> Option<Transition> {
    if !player.body.grounded {
        return Some(Transition::To(JUMPING));
    }
    if ctx.input.was_action_just_pressed(Action::Jump) {
        player.jump(ctx);
        return Some(Transition::To(JUMPING));
    }
    if player.wants_slide(ctx) {
        return Some(Transition::To(SLIDING));
    }
    if player.shoot_input(ctx) {
        return Some(Transition::To(SHOOTING));
    }
    None
}

struct Cooldowns;

impl State<PlayerData, SimContext> for Cooldowns {
    fn update(&mut self, player: &mut PlayerData, ctx: &mut SimContext, dt: f32) -> Transition {
        let f = frames(dt);
        player.shoot_cooldown = (player.shoot_cooldown - f).max(0.0);
        player.slide_cooldown = (player.slide_cooldown - f).max(0.0);
        player.invulnerable = (player.invulnerable - f).max(0.0);

        if player.charging {
            if ctx.input.is_action_pressed(Action::Shoot) {
                let max_charge = ctx.config.weapons.max_charge;
                let was_full = player.charge_timer >= max_charge;
                player.charge_timer = (player.charge_timer + f).min(max_charge);
                if !was_full && player.charge_timer >= max_charge {
                    let center = player.body.center();
                    ctx.particles
                        .create_effect(EffectKind::Charge, center, &EffectOverrides::default());
                }
            } else if !ctx.input.was_action_just_released(Action::Shoot) {
                // Released while in a state that ignores Shoot
                player.charging = false;
                player.charge_timer = 0.0;
            }
        }
        Transition::Stay
    }
}

struct Idle;

impl State<PlayerData, SimContext> for Idle {
    fn enter(&mut self, player: &mut PlayerData, _ctx: &mut SimContext) {
        player.animation = PlayerAnimation::Idle;
    }

    fn update(&mut self, player: &mut PlayerData, ctx: &mut SimContext, _dt: f32) -> Transition {
        if let Some(next) = grounded_actions(player, ctx) {
            return next;
        }
        if moving(ctx) {
            return Transition::To(WALKING);
        }
        Transition::Stay
    }
}

struct Walking;

impl State<PlayerData, SimContext> for Walking {
    fn enter(&mut self, player: &mut PlayerData, _ctx: &mut SimContext) {
        player.animation = PlayerAnimation::Walk;
    }

    fn update(&mut self, player: &mut PlayerData, ctx: &mut SimContext, _dt: f32) -> Transition {
        let axis = ctx.input.movement_vector().x;
        if moving(ctx) {
            player.body.vel.x = axis * ctx.config.player.walk_speed;
            player.face_toward(axis);
        }
        if let Some(next) = grounded_actions(player, ctx) {
            return next;
        }
        if !moving(ctx) {
            return Transition::To(IDLE);
        }
        Transition::Stay
    }
}

struct Jumping;

impl State<PlayerData, SimContext> for Jumping {
    fn enter(&mut self, player: &mut PlayerData, _ctx: &mut SimContext) {
        player.animation = if player.body.vel.y < 0.0 {
            PlayerAnimation::Jump
        } else {
            PlayerAnimation::Fall
        };
    }

    fn exit(&mut self, player: &mut PlayerData, ctx: &mut SimContext) {
        let feet = player.feet();
        ctx.particles
            .create_effect(EffectKind::Dust, feet, &EffectOverrides::default());
    }

    fn update(&mut self, player: &mut PlayerData, ctx: &mut SimContext, _dt: f32) -> Transition {
        let cfg = &ctx.config.player;
        let axis = ctx.input.movement_vector().x;
        if axis.abs() > cfg.move_deadzone {
            player.body.vel.x = axis * cfg.walk_speed * cfg.air_control;
            player.face_toward(axis);
        }
        if ctx.input.was_action_just_released(Action::Jump) && player.body.vel.y < 0.0 {
            player.body.vel.y *= cfg.jump_cut;
        }

        // Air shots keep the jump pose
        player.shoot_input(ctx);

        player.animation = if player.body.vel.y < 0.0 {
            PlayerAnimation::Jump
        } else {
            PlayerAnimation::Fall
        };

        if player.body.grounded && player.body.vel.y >= 0.0 {
            return ground_state(ctx);
        }
        Transition::Stay
    }
}

#[derive(Default)]
struct Sliding {
    remaining: f32,
}

impl State<PlayerData, SimContext> for Sliding {
    fn enter(&mut self, player: &mut PlayerData, ctx: &mut SimContext) {
        self.remaining = ctx.config.player.slide_duration;
        player.animation = PlayerAnimation::Slide;
        if let Some(facing) = Facing::from_sign(ctx.input.movement_vector().x) {
            player.facing = facing;
        }
        player.body.vel.x = player.facing.sign() * ctx.config.player.slide_speed;
        let feet = player.feet();
        ctx.particles
            .create_effect(EffectKind::Dust, feet, &EffectOverrides::default());
    }

    fn exit(&mut self, player: &mut PlayerData, ctx: &mut SimContext) {
        player.slide_cooldown = ctx.config.player.slide_cooldown;
    }

    fn update(&mut self, player: &mut PlayerData, ctx: &mut SimContext, dt: f32) -> Transition {
        self.remaining -= frames(dt);
        player.body.vel.x = player.facing.sign() * ctx.config.player.slide_speed;

        if !player.body.grounded {
            return Transition::To(JUMPING);
        }
        if ctx.input.was_action_just_pressed(Action::Jump) {
            player.jump(ctx);
            return Transition::To(JUMPING);
        }
        if self.remaining <= 0.0 {
            return ground_state(ctx);
        }
        Transition::Stay
    }
}

#[derive(Default)]
struct Shooting {
    pose: f32,
}

impl State<PlayerData, SimContext> for Shooting {
    fn enter(&mut self, player: &mut PlayerData, ctx: &mut SimContext) {
        self.pose = ctx.config.player.shoot_pose_frames;
        player.animation = PlayerAnimation::Shoot;
    }

    fn update(&mut self, player: &mut PlayerData, ctx: &mut SimContext, dt: f32) -> Transition {
        self.pose -= frames(dt);
        let axis = ctx.input.movement_vector().x;
        if moving(ctx) {
            player.body.vel.x = axis * ctx.config.player.walk_speed;
            player.face_toward(axis);
        }

        if !player.body.grounded {
            return Transition::To(JUMPING);
        }
        if ctx.input.was_action_just_pressed(Action::Jump) {
            player.jump(ctx);
            return Transition::To(JUMPING);
        }
        if player.shoot_input(ctx) {
            self.pose = ctx.config.player.shoot_pose_frames;
        }
        if self.pose <= 0.0 {
            return ground_state(ctx);
        }
        Transition::Stay
    }
}

/// The player: its data record plus the machine driving it
pub struct Player {
    pub data: PlayerData,
    machine: StateMachine<PlayerData, SimContext>,
}

impl Player {
    /// Build the player at its spawn point and enter `idle`
    pub fn new(id: EntityId, ctx: &mut SimContext) -> Self {
        let data = PlayerData::new(id, &ctx.config.player);
        let mut machine = StateMachine::new();
        machine.register_state(IDLE, Idle);
        machine.register_state(WALKING, Walking);
        machine.register_state(JUMPING, Jumping);
        machine.register_state(SLIDING, Sliding::default());
        machine.register_state(SHOOTING, Shooting::default());
        machine.set_global_state(Cooldowns);

        let mut player = Self { data, machine };
        player.machine.change_state(IDLE, &mut player.data, ctx);
        player
    }

    pub fn id(&self) -> EntityId {
        self.data.body.id
    }

    pub fn state(&self) -> Option<StateName> {
        self.machine.current_state()
    }

    pub fn is_in_state(&self, name: &str) -> bool {
        self.machine.is_in_state(name)
    }

    pub fn is_alive(&self) -> bool {
        self.data.health > 0
    }

    pub fn update(&mut self, ctx: &mut SimContext, dt: f32) {
        self.machine.update(&mut self.data, ctx, dt);
    }

    /// Switch to the next weapon archetype, dropping any held charge
    pub fn cycle_weapon(&mut self) -> WeaponKind {
        self.data.weapon = self.data.weapon.next();
        self.data.charging = false;
        self.data.charge_timer = 0.0;
        log::debug!("Player weapon: {}", self.data.weapon.as_str());
        self.data.weapon
    }

    /// Apply damage from a source at `from`.
    ///
    /// Ignored while invulnerable or already dead. Returns true when this
    /// hit killed the player.
    pub fn take_damage(&mut self, amount: i32, from: Vec2, ctx: &mut SimContext) -> bool {
        if amount <= 0 || self.data.invulnerable > 0.0 || self.data.health <= 0 {
            return false;
        }
        let cfg = &ctx.config.player;
        let data = &mut self.data;
        data.health = (data.health - amount).max(0);
        data.invulnerable = cfg.invulnerability_frames;

        let away = if from.x > data.body.center().x { -1.0 } else { 1.0 };
        data.body.vel = Vec2::new(away * cfg.knockback, -cfg.knockback * 0.5);

        let (id, health, center) = (data.body.id, data.health, data.body.center());
        ctx.emit(GameEvent::Damaged { entity: id, amount, health });
        ctx.particles
            .create_effect(EffectKind::Hit, center, &EffectOverrides::default());

        if health == 0 {
            ctx.emit(GameEvent::Died { entity: id });
            ctx.particles
                .create_effect(EffectKind::Explosion, center, &EffectOverrides::default());
            return true;
        }
        false
    }

    /// Put the player back at the spawn point with full health
    pub fn respawn(&mut self, ctx: &mut SimContext) {
        let data = &mut self.data;
        data.body.pos = data.spawn;
        data.body.vel = Vec2::ZERO;
        data.body.grounded = false;
        data.health = data.max_health;
        data.invulnerable = ctx.config.player.invulnerability_frames;
        data.charging = false;
        data.charge_timer = 0.0;
        data.facing = Facing::Right;
        self.machine.change_state(IDLE, &mut self.data, ctx);
    }

    /// Transitions since the last drain, for publishing
    pub fn drain_transitions(&mut self) -> Vec<StateChange> {
        self.machine.drain_transitions()
    }
}
