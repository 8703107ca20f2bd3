//! Boss entity and its state graph
//!
//! ```text
//! idle -> patrol <-> attacking
//! any non-enraged state -> enraged   (forced by take_damage)
//! ```
//!
//! `enraged` never transitions out.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::BossConfig;
use crate::frames;

use super::body::{Body, EntityId, Facing};
use super::context::{GameEvent, SimContext};
use super::fsm::{State, StateChange, StateMachine, StateName, Transition};
use super::particles::{EffectKind, EffectOverrides};
use super::weapon::Owner;

pub const IDLE: StateName = "idle";
pub const PATROL: StateName = "patrol";
pub const ATTACKING: StateName = "attacking";
pub const ENRAGED: StateName = "enraged";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BossAnimation {
    #[default]
    Idle,
    Walk,
    Attack,
    Enraged,
}

impl BossAnimation {
    pub fn as_str(self) -> &'static str {
        match self {
            BossAnimation::Idle => "idle",
            BossAnimation::Walk => "walk",
            BossAnimation::Attack => "attack",
            BossAnimation::Enraged => "enraged",
        }
    }
}

#[derive(Debug, Clone)]
pub struct BossData {
    pub body: Body,
    pub health: i32,
    pub max_health: i32,
    pub facing: Facing,
    pub animation: BossAnimation,
    /// Frames until the next attack is allowed
    pub attack_cooldown: f32,
    pub patrol_left: f32,
    pub patrol_right: f32,
    pub enraged: bool,
}

impl BossData {
    fn new(id: EntityId, config: &BossConfig) -> Self {
        let body = Body::new(
            id,
            Vec2::new(config.spawn_x, config.spawn_y),
            Vec2::new(config.width, config.height),
        )
        .with_mass(config.mass);
        Self {
            body,
            health: config.max_health,
            max_health: config.max_health,
            facing: Facing::Left,
            animation: BossAnimation::Idle,
            attack_cooldown: 0.0,
            patrol_left: config.patrol_left.min(config.patrol_right),
            patrol_right: config.patrol_left.max(config.patrol_right),
            enraged: false,
        }
    }

    /// Walk along the patrol segment, turning around at either end
    fn patrol(&mut self, speed: f32) {
        if self.body.pos.x <= self.patrol_left {
            self.facing = Facing::Right;
        } else if self.body.pos.x + self.body.size.x >= self.patrol_right {
            self.facing = Facing::Left;
        }
        self.body.vel.x = self.facing.sign() * speed;
    }

    fn target_in_range(&self, ctx: &SimContext) -> Option<Vec2> {
        let target = ctx.target?;
        (self.body.center().distance(target) <= ctx.config.boss.attack_range).then_some(target)
    }

    fn face(&mut self, target: Vec2) {
        if let Some(facing) = Facing::from_sign(target.x - self.body.center().x) {
            self.facing = facing;
        }
    }
}

struct Cooldown;

impl State<BossData, SimContext> for Cooldown {
    fn update(&mut self, boss: &mut BossData, _ctx: &mut SimContext, dt: f32) -> Transition {
        boss.attack_cooldown = (boss.attack_cooldown - frames(dt)).max(0.0);
        Transition::Stay
    }
}

#[derive(Default)]
struct Idle {
    remaining: f32,
}

impl State<BossData, SimContext> for Idle {
    fn enter(&mut self, boss: &mut BossData, ctx: &mut SimContext) {
        self.remaining = ctx.config.boss.idle_duration;
        boss.body.vel.x = 0.0;
        boss.animation = BossAnimation::Idle;
    }

    fn update(&mut self, _boss: &mut BossData, _ctx: &mut SimContext, dt: f32) -> Transition {
        self.remaining -= frames(dt);
        if self.remaining <= 0.0 {
            Transition::To(PATROL)
        } else {
            Transition::Stay
        }
    }
}

struct Patrol;

impl State<BossData, SimContext> for Patrol {
    fn enter(&mut self, boss: &mut BossData, _ctx: &mut SimContext) {
        boss.animation = BossAnimation::Walk;
    }

    fn update(&mut self, boss: &mut BossData, ctx: &mut SimContext, _dt: f32) -> Transition {
        boss.patrol(ctx.config.boss.patrol_speed);
        if boss.attack_cooldown <= 0.0 && boss.target_in_range(ctx).is_some() {
            return Transition::To(ATTACKING);
        }
        Transition::Stay
    }
}

#[derive(Default)]
struct Attacking {
    remaining: f32,
}

impl State<BossData, SimContext> for Attacking {
    fn enter(&mut self, boss: &mut BossData, ctx: &mut SimContext) {
        self.remaining = ctx.config.boss.attack_duration;
        boss.body.vel.x = 0.0;
        boss.animation = BossAnimation::Attack;
        if let Some(target) = ctx.target {
            boss.face(target);
            let cfg = &ctx.config.boss;
            let (speed, damage) = (cfg.projectile_speed, cfg.projectile_damage);
            ctx.weapons
                .fire_aimed(Owner::Boss, boss.body.center(), target, speed, damage);
        }
    }

    fn exit(&mut self, boss: &mut BossData, ctx: &mut SimContext) {
        boss.attack_cooldown = ctx.config.boss.attack_cooldown;
    }

    fn update(&mut self, boss: &mut BossData, _ctx: &mut SimContext, dt: f32) -> Transition {
        boss.body.vel.x = 0.0;
        self.remaining -= frames(dt);
        if self.remaining <= 0.0 {
            Transition::To(PATROL)
        } else {
            Transition::Stay
        }
    }
}

struct Enraged;

impl State<BossData, SimContext> for Enraged {
    fn enter(&mut self, boss: &mut BossData, ctx: &mut SimContext) {
        boss.enraged = true;
        boss.animation = BossAnimation::Enraged;
        boss.attack_cooldown = 0.0;
        ctx.particles
            .create_effect(EffectKind::Enrage, boss.body.center(), &EffectOverrides::default());
    }

    fn update(&mut self, boss: &mut BossData, ctx: &mut SimContext, _dt: f32) -> Transition {
        let cfg = &ctx.config.boss;
        boss.patrol(cfg.patrol_speed * cfg.enrage_speed_multiplier);

        if boss.attack_cooldown > 0.0 {
            return Transition::Stay;
        }
        if let Some(target) = boss.target_in_range(ctx) {
            let cfg = &ctx.config.boss;
            let (count, spread, speed, damage, cooldown) = (
                cfg.volley_size,
                cfg.volley_spread,
                cfg.projectile_speed,
                cfg.projectile_damage,
                cfg.enraged_attack_cooldown,
            );
            ctx.weapons
                .fire_volley(Owner::Boss, boss.body.center(), target, count, spread, speed, damage);
            boss.attack_cooldown = cooldown;
        }
        Transition::Stay
    }
}

/// The boss: its data record plus the machine driving it
pub struct Boss {
    pub data: BossData,
    machine: StateMachine<BossData, SimContext>,
}

impl Boss {
    /// Build the boss at its spawn point and enter `idle`
    pub fn new(id: EntityId, ctx: &mut SimContext) -> Self {
        let data = BossData::new(id, &ctx.config.boss);
        let mut machine = StateMachine::new();
        machine.register_state(IDLE, Idle::default());
        machine.register_state(PATROL, Patrol);
        machine.register_state(ATTACKING, Attacking::default());
        machine.register_state(ENRAGED, Enraged);
        machine.set_global_state(Cooldown);

        let mut boss = Self { data, machine };
        boss.machine.change_state(IDLE, &mut boss.data, ctx);
        boss
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

    /// Apply damage. Dropping strictly below the enrage threshold forces the
    /// boss into `enraged` from whatever state it is in. Returns true when
    /// this hit killed the boss.
    pub fn take_damage(&mut self, amount: i32, ctx: &mut SimContext) -> bool {
        if amount <= 0 || self.data.health <= 0 {
            return false;
        }
        let data = &mut self.data;
        data.health = (data.health - amount).max(0);
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

        let threshold = self.data.max_health as f32 * ctx.config.boss.enrage_threshold;
        if !self.data.enraged && (health as f32) < threshold {
            log::info!("Boss enraged at {}/{}", health, self.data.max_health);
            self.machine.change_state(ENRAGED, &mut self.data, ctx);
            ctx.emit(GameEvent::Enraged { entity: id });
        }
        false
    }

    pub fn drain_transitions(&mut self) -> Vec<StateChange> {
        self.machine.drain_transitions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::consts::SIM_DT;

    fn setup() -> (Boss, SimContext) {
        let mut ctx = SimContext::new(GameConfig::default());
        let boss = Boss::new(EntityId(2), &mut ctx);
        (boss, ctx)
    }

    fn run(boss: &mut Boss, ctx: &mut SimContext, ticks: usize) {
        for _ in 0..ticks {
            boss.update(ctx, SIM_DT);
        }
    }

    #[test]
    fn test_idle_then_patrol() {
        let (mut boss, mut ctx) = setup();
        assert!(boss.is_in_state(IDLE));
        run(&mut boss, &mut ctx, 61);
        assert!(boss.is_in_state(PATROL));
        run(&mut boss, &mut ctx, 1);
        assert_ne!(boss.data.body.vel.x, 0.0);
    }

    #[test]
    fn test_patrol_turns_at_bounds() {
        let (mut boss, mut ctx) = setup();
        run(&mut boss, &mut ctx, 61);
        boss.data.body.pos.x = boss.data.patrol_left - 1.0;
        run(&mut boss, &mut ctx, 1);
        assert_eq!(boss.data.facing, Facing::Right);
        assert!(boss.data.body.vel.x > 0.0);

        boss.data.body.pos.x = boss.data.patrol_right;
        run(&mut boss, &mut ctx, 1);
        assert_eq!(boss.data.facing, Facing::Left);
    }

    #[test]
    fn test_attacks_target_in_range() {
        let (mut boss, mut ctx) = setup();
        run(&mut boss, &mut ctx, 61);
        ctx.target = Some(boss.data.body.center() - Vec2::new(200.0, 0.0));
        run(&mut boss, &mut ctx, 1);
        assert!(boss.is_in_state(ATTACKING));
        assert_eq!(ctx.weapons.projectiles().len(), 1);
        assert!(ctx.weapons.projectiles()[0].vel.x < 0.0);

        run(&mut boss, &mut ctx, 31);
        assert!(boss.is_in_state(PATROL));
        assert!(boss.data.attack_cooldown > 0.0, "cooldown set on leaving attack");
    }

    #[test]
    fn test_out_of_range_target_is_ignored() {
        let (mut boss, mut ctx) = setup();
        run(&mut boss, &mut ctx, 61);
        ctx.target = Some(boss.data.body.center() - Vec2::new(900.0, 0.0));
        run(&mut boss, &mut ctx, 5);
        assert!(boss.is_in_state(PATROL));
        assert!(ctx.weapons.projectiles().is_empty());
    }

    #[test]
    fn test_enrage_below_threshold() {
        let (mut boss, mut ctx) = setup();
        run(&mut boss, &mut ctx, 61);
        assert!(boss.is_in_state(PATROL));

        assert!(!boss.take_damage(101, &mut ctx));
        assert_eq!(boss.data.health, 99);
        assert!(boss.is_in_state(ENRAGED));
        assert!(boss.data.enraged);
        assert!(ctx.events.iter().any(|e| matches!(e, GameEvent::Enraged { .. })));
    }

    #[test]
    fn test_exact_threshold_does_not_enrage() {
        let (mut boss, mut ctx) = setup();
        boss.take_damage(100, &mut ctx);
        assert_eq!(boss.data.health, 100);
        assert!(boss.is_in_state(IDLE));
    }

    #[test]
    fn test_enrage_from_idle_and_never_leaves() {
        let (mut boss, mut ctx) = setup();
        boss.take_damage(150, &mut ctx);
        assert!(boss.is_in_state(ENRAGED));
        run(&mut boss, &mut ctx, 300);
        assert!(boss.is_in_state(ENRAGED));

        // A second hit below threshold does not re-enter
        boss.drain_transitions();
        boss.take_damage(10, &mut ctx);
        assert!(boss.drain_transitions().is_empty());
    }

    #[test]
    fn test_enraged_fires_volley() {
        let (mut boss, mut ctx) = setup();
        boss.take_damage(150, &mut ctx);
        ctx.target = Some(boss.data.body.center() - Vec2::new(150.0, 0.0));
        run(&mut boss, &mut ctx, 1);
        assert_eq!(ctx.weapons.projectiles().len(), 3);
        assert!(boss.data.attack_cooldown > 0.0);
    }

    #[test]
    fn test_damage_clamps_and_kills() {
        let (mut boss, mut ctx) = setup();
        assert!(boss.take_damage(1000, &mut ctx));
        assert_eq!(boss.data.health, 0);
        assert!(!boss.is_alive());
        assert!(!boss.take_damage(10, &mut ctx));
    }
}
