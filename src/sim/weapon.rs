//! Weapons and projectiles
//!
//! `create_weapon` spawns one archetype's projectiles and returns the
//! cooldown the caller should wait before firing again. Burst fire is
//! scheduled on a tick-keyed queue processed inside `update_projectiles`,
//! so replays with identical input produce identical shots.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::{GameSettings, ShotParams, WeaponsConfig};
use crate::frames;

use super::body::{Aabb, EntityId, direction_to};
use super::collision::overlap;

/// Weapon archetypes the player can equip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WeaponKind {
    #[default]
    Normal,
    Rapid,
    Spread,
    Laser,
    Wave,
    Bounce,
}

impl WeaponKind {
    pub const ALL: [WeaponKind; 6] = [
        WeaponKind::Normal,
        WeaponKind::Rapid,
        WeaponKind::Spread,
        WeaponKind::Laser,
        WeaponKind::Wave,
        WeaponKind::Bounce,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WeaponKind::Normal => "normal",
            WeaponKind::Rapid => "rapid",
            WeaponKind::Spread => "spread",
            WeaponKind::Laser => "laser",
            WeaponKind::Wave => "wave",
            WeaponKind::Bounce => "bounce",
        }
    }

    /// Look up a weapon by name; unknown names fall back to `Normal`
    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "normal" => WeaponKind::Normal,
            "rapid" => WeaponKind::Rapid,
            "spread" => WeaponKind::Spread,
            "laser" => WeaponKind::Laser,
            "wave" => WeaponKind::Wave,
            "bounce" => WeaponKind::Bounce,
            other => {
                log::warn!("Unknown weapon type '{}', using normal shot", other);
                WeaponKind::Normal
            }
        }
    }

    /// Next weapon in the cycle order
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|k| *k == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

/// Charge tier of a normal shot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChargeLevel {
    #[default]
    None,
    Medium,
    Full,
}

/// Faction that fired a projectile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Owner {
    Player,
    Boss,
    Enemy,
}

impl Owner {
    /// Whether shots from this owner damage the player (rather than foes)
    pub fn hostile_to_player(self) -> bool {
        !matches!(self, Owner::Player)
    }
}

/// Per-archetype movement rule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Motion {
    Straight,
    /// Stationary beam that only burns down its lifetime
    Laser,
    Wave { amplitude: f32, frequency: f32, base_y: f32, phase: f32 },
    Bounce { bounces_left: u32, gravity: f32 },
}

/// A live projectile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u64,
    pub owner: Owner,
    pub kind: WeaponKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: Vec2,
    pub damage: i32,
    /// Remaining lifetime in frames
    pub lifetime: f32,
    pub piercing: bool,
    pub charged: ChargeLevel,
    pub motion: Motion,
    /// Targets already damaged (piercing shots hit each target once)
    #[serde(skip)]
    pub hits: Vec<EntityId>,
    #[serde(skip)]
    dead: bool,
}

impl Projectile {
    /// Straight-flying projectile built outside the weapon system; its id is
    /// assigned when it is handed to [`WeaponSystem::update_projectiles`]
    pub fn straight(owner: Owner, pos: Vec2, vel: Vec2, size: Vec2, damage: i32, lifetime: f32) -> Self {
        Self {
            id: 0,
            owner,
            kind: WeaponKind::Normal,
            pos,
            vel,
            size,
            damage,
            lifetime,
            piercing: false,
            charged: ChargeLevel::None,
            motion: Motion::Straight,
            hits: Vec::new(),
            dead: false,
        }
    }

    pub fn aabb(&self) -> Aabb {
        Aabb {
            pos: self.pos,
            size: self.size,
        }
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    pub fn is_alive(&self) -> bool {
        !self.dead && self.lifetime > 0.0
    }
}

/// Record of a shot being fired, drained by the tick driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShotFired {
    pub owner: Owner,
    pub kind: WeaponKind,
    pub charged: ChargeLevel,
}

/// Damage dealt to one target during hit resolution
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub damage: i32,
    pub pos: Vec2,
}

#[derive(Debug, Clone)]
struct ScheduledShot {
    due_tick: u64,
    owner: Owner,
    origin: Vec2,
    direction: f32,
}

/// Spawns, moves and culls projectiles
#[derive(Debug, Clone)]
pub struct WeaponSystem {
    config: WeaponsConfig,
    level_width: f32,
    level_height: f32,
    margin: f32,
    max_projectiles: usize,
    projectiles: Vec<Projectile>,
    scheduled: Vec<ScheduledShot>,
    tick: u64,
    next_id: u64,
    fired: Vec<ShotFired>,
}

impl WeaponSystem {
    pub fn new(config: WeaponsConfig, settings: &GameSettings) -> Self {
        Self {
            config,
            level_width: settings.level_width,
            level_height: settings.level_height,
            margin: settings.projectile_margin,
            max_projectiles: settings.max_projectiles,
            projectiles: Vec::new(),
            scheduled: Vec::new(),
            tick: 0,
            next_id: 1,
            fired: Vec::new(),
        }
    }

    pub fn config(&self) -> &WeaponsConfig {
        &self.config
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn pending_shots(&self) -> usize {
        self.scheduled.len()
    }

    /// Take the log of shots fired since the last drain
    pub fn drain_fired(&mut self) -> Vec<ShotFired> {
        std::mem::take(&mut self.fired)
    }

    /// Remove every projectile and cancel scheduled bursts
    pub fn clear(&mut self) {
        self.projectiles.clear();
        self.scheduled.clear();
    }

    /// Charge tier for a held charge timer
    pub fn charge_level(&self, charge_timer: f32, max_charge: f32) -> ChargeLevel {
        if charge_timer >= max_charge {
            ChargeLevel::Full
        } else if charge_timer >= self.config.medium_charge_threshold {
            ChargeLevel::Medium
        } else {
            ChargeLevel::None
        }
    }

    /// Fire a player weapon from muzzle point (`x`, `y`) toward `direction`
    /// (sign of x). Returns the cooldown in frames.
    pub fn create_weapon(
        &mut self,
        kind: WeaponKind,
        x: f32,
        y: f32,
        direction: f32,
        charge_timer: f32,
        max_charge: f32,
    ) -> f32 {
        let dir = if direction < 0.0 { -1.0 } else { 1.0 };
        let origin = Vec2::new(x, y);
        match kind {
            WeaponKind::Normal => self.fire_normal(origin, dir, charge_timer, max_charge),
            WeaponKind::Rapid => self.fire_rapid(origin, dir),
            WeaponKind::Spread => self.fire_spread(origin, dir),
            WeaponKind::Laser => self.fire_laser(origin, dir),
            WeaponKind::Wave => self.fire_wave(origin, dir),
            WeaponKind::Bounce => self.fire_bounce(origin, dir),
        }
    }

    fn fire_normal(&mut self, origin: Vec2, dir: f32, charge_timer: f32, max_charge: f32) -> f32 {
        let params = self.config.normal.clone();
        let charged = self.charge_level(charge_timer, max_charge);
        let (damage_mult, speed_mult, size_mult) = match charged {
            ChargeLevel::None => (1.0, 1.0, 1.0),
            ChargeLevel::Medium => (
                self.config.medium_damage_multiplier,
                1.0,
                1.0 + (self.config.charged_size_multiplier - 1.0) * 0.5,
            ),
            ChargeLevel::Full => (
                self.config.charged_damage_multiplier,
                self.config.full_charge_speed_multiplier,
                self.config.charged_size_multiplier,
            ),
        };
        let size = Vec2::new(params.width, params.height) * size_mult;
        let projectile = self.build(
            Owner::Player,
            WeaponKind::Normal,
            muzzle_pos(origin, size, dir),
            Vec2::new(params.speed * speed_mult * dir, 0.0),
            size,
            scale_damage(params.damage, damage_mult),
            params.lifetime,
            Motion::Straight,
        );
        let projectile = Projectile {
            piercing: charged == ChargeLevel::Full,
            charged,
            ..projectile
        };
        self.push(projectile);
        params.cooldown
    }

    fn fire_rapid(&mut self, origin: Vec2, dir: f32) -> f32 {
        let rapid = self.config.rapid.clone();
        self.spawn_shot(Owner::Player, WeaponKind::Rapid, &rapid.shot, origin, Vec2::new(dir, 0.0));
        for i in 1..rapid.burst_count.max(1) as u64 {
            self.scheduled.push(ScheduledShot {
                due_tick: self.tick.saturating_add(i.saturating_mul(rapid.burst_interval.max(1))),
                owner: Owner::Player,
                origin,
                direction: dir,
            });
        }
        rapid.shot.cooldown
    }

    fn fire_spread(&mut self, origin: Vec2, dir: f32) -> f32 {
        let spread = self.config.spread.clone();
        let count = spread.count.max(1);
        let mid = (count - 1) as f32 / 2.0;
        for i in 0..count {
            let angle = (i as f32 - mid) * spread.angle;
            let heading = Vec2::new(angle.cos() * dir, angle.sin());
            self.spawn_shot(Owner::Player, WeaponKind::Spread, &spread.shot, origin, heading);
        }
        spread.shot.cooldown
    }

    fn fire_laser(&mut self, origin: Vec2, dir: f32) -> f32 {
        let laser = self.config.laser.clone();
        let size = Vec2::new(laser.length, laser.height);
        let projectile = self.build(
            Owner::Player,
            WeaponKind::Laser,
            muzzle_pos(origin, size, dir),
            Vec2::ZERO,
            size,
            laser.damage,
            laser.lifetime,
            Motion::Laser,
        );
        self.push(Projectile {
            piercing: true,
            ..projectile
        });
        laser.cooldown
    }

    fn fire_wave(&mut self, origin: Vec2, dir: f32) -> f32 {
        let wave = self.config.wave.clone();
        let size = Vec2::new(wave.shot.width, wave.shot.height);
        let pos = muzzle_pos(origin, size, dir);
        let projectile = self.build(
            Owner::Player,
            WeaponKind::Wave,
            pos,
            Vec2::new(wave.shot.speed * dir, 0.0),
            size,
            wave.shot.damage,
            wave.shot.lifetime,
            Motion::Wave {
                amplitude: wave.amplitude,
                frequency: wave.frequency,
                base_y: pos.y,
                phase: 0.0,
            },
        );
        self.push(projectile);
        wave.shot.cooldown
    }

    fn fire_bounce(&mut self, origin: Vec2, dir: f32) -> f32 {
        let bounce = self.config.bounce.clone();
        let size = Vec2::new(bounce.shot.width, bounce.shot.height);
        let projectile = self.build(
            Owner::Player,
            WeaponKind::Bounce,
            muzzle_pos(origin, size, dir),
            Vec2::new(bounce.shot.speed * dir, -bounce.lift),
            size,
            bounce.shot.damage,
            bounce.shot.lifetime,
            Motion::Bounce {
                bounces_left: bounce.max_bounces,
                gravity: bounce.gravity,
            },
        );
        self.push(projectile);
        bounce.shot.cooldown
    }

    /// Fire a straight shot from `origin` (center) toward `target`.
    /// Returns false when the two points coincide and no direction exists.
    pub fn fire_aimed(&mut self, owner: Owner, origin: Vec2, target: Vec2, speed: f32, damage: i32) -> bool {
        let heading = direction_to(origin, target);
        if heading == Vec2::ZERO {
            log::debug!("Aimed shot skipped: target coincides with origin");
            return false;
        }
        let params = ShotParams {
            damage,
            speed,
            ..self.config.normal.clone()
        };
        let size = Vec2::new(params.width, params.height);
        let projectile = self.build(
            owner,
            WeaponKind::Normal,
            origin - size * 0.5,
            heading * speed,
            size,
            damage,
            params.lifetime,
            Motion::Straight,
        );
        self.push(projectile);
        true
    }

    /// Fire `count` aimed shots fanned `spread` radians apart around the line to `target`
    pub fn fire_volley(
        &mut self,
        owner: Owner,
        origin: Vec2,
        target: Vec2,
        count: u32,
        spread: f32,
        speed: f32,
        damage: i32,
    ) -> u32 {
        let heading = direction_to(origin, target);
        if heading == Vec2::ZERO {
            return 0;
        }
        let count = count.max(1);
        let mid = (count - 1) as f32 / 2.0;
        let mut fired = 0;
        for i in 0..count {
            let rotated = Vec2::from_angle((i as f32 - mid) * spread).rotate(heading);
            if self.fire_aimed(owner, origin, origin + rotated, speed, damage) {
                fired += 1;
            }
        }
        fired
    }

    fn spawn_shot(&mut self, owner: Owner, kind: WeaponKind, params: &ShotParams, origin: Vec2, heading: Vec2) {
        let size = Vec2::new(params.width, params.height);
        let dir = if heading.x < 0.0 { -1.0 } else { 1.0 };
        let projectile = self.build(
            owner,
            kind,
            muzzle_pos(origin, size, dir),
            heading * params.speed,
            size,
            params.damage,
            params.lifetime,
            Motion::Straight,
        );
        self.push(projectile);
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        &mut self,
        owner: Owner,
        kind: WeaponKind,
        pos: Vec2,
        vel: Vec2,
        size: Vec2,
        damage: i32,
        lifetime: f32,
        motion: Motion,
    ) -> Projectile {
        let id = self.next_id;
        self.next_id += 1;
        Projectile {
            id,
            owner,
            kind,
            pos,
            vel,
            size,
            damage,
            lifetime,
            piercing: false,
            charged: ChargeLevel::None,
            motion,
            hits: Vec::new(),
            dead: false,
        }
    }

    fn push(&mut self, projectile: Projectile) {
        self.fired.push(ShotFired {
            owner: projectile.owner,
            kind: projectile.kind,
            charged: projectile.charged,
        });
        self.projectiles.push(projectile);
    }

    /// Advance all projectiles one tick.
    ///
    /// `external` is drained into the system-owned list first. Projectiles
    /// are culled when their lifetime runs out, their bounce budget is
    /// spent, they leave the level (plus margin), or a straight/wave shot
    /// hits a platform. The oldest are dropped beyond `max_projectiles`.
    pub fn update_projectiles(&mut self, external: &mut Vec<Projectile>, platforms: &[Aabb], dt: f32) {
        self.tick += 1;
        self.spawn_due_shots();

        // Ids from other systems are not ours; renumber so age order holds
        for mut p in external.drain(..) {
            p.id = self.next_id;
            self.next_id += 1;
            self.projectiles.push(p);
        }

        let f = frames(dt);
        for p in &mut self.projectiles {
            p.lifetime -= f;
            match &mut p.motion {
                Motion::Straight => {
                    p.pos += p.vel * f;
                    let bbox = Aabb { pos: p.pos, size: p.size };
                    if platforms.iter().any(|plat| bbox.intersects(plat)) {
                        p.dead = true;
                    }
                }
                Motion::Laser => {}
                Motion::Wave {
                    amplitude,
                    frequency,
                    base_y,
                    phase,
                } => {
                    *phase += *frequency * f;
                    p.pos.x += p.vel.x * f;
                    p.pos.y = *base_y + *amplitude * phase.sin();
                    let bbox = Aabb { pos: p.pos, size: p.size };
                    if platforms.iter().any(|plat| bbox.intersects(plat)) {
                        p.dead = true;
                    }
                }
                Motion::Bounce { bounces_left, gravity } => {
                    p.vel.y += *gravity * f;
                    p.pos += p.vel * f;
                    for plat in platforms {
                        let bbox = Aabb { pos: p.pos, size: p.size };
                        let Some(o) = overlap(&bbox, plat) else {
                            continue;
                        };
                        if *bounces_left == 0 {
                            p.dead = true;
                            break;
                        }
                        *bounces_left -= 1;
                        let center = bbox.center();
                        let pc = plat.center();
                        if o.x < o.y {
                            p.pos.x += if center.x < pc.x { -o.x } else { o.x };
                            p.vel.x = -p.vel.x;
                        } else {
                            p.pos.y += if center.y < pc.y { -o.y } else { o.y };
                            p.vel.y = -p.vel.y;
                        }
                    }
                }
            }
        }

        let (w, h, m) = (self.level_width, self.level_height, self.margin);
        self.projectiles.retain(|p| {
            p.is_alive()
                && p.pos.x + p.size.x >= -m
                && p.pos.x <= w + m
                && p.pos.y + p.size.y >= -m
                && p.pos.y <= h + m
        });

        if self.projectiles.len() > self.max_projectiles {
            self.projectiles.sort_by_key(|p| p.id);
            let excess = self.projectiles.len() - self.max_projectiles;
            self.projectiles.drain(..excess);
        }
    }

    fn spawn_due_shots(&mut self) {
        if self.scheduled.is_empty() {
            return;
        }
        let now = self.tick;
        let (due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.scheduled)
            .into_iter()
            .partition(|s| s.due_tick <= now);
        self.scheduled = waiting;
        let params = self.config.rapid.shot.clone();
        for shot in due {
            self.spawn_shot(
                shot.owner,
                WeaponKind::Rapid,
                &params,
                shot.origin,
                Vec2::new(shot.direction, 0.0),
            );
        }
    }

    /// Apply projectile hits against one target box.
    ///
    /// `player_side` selects which projectiles can hurt the target. Single-hit
    /// projectiles are consumed; piercing ones remember the target.
    pub fn resolve_hits(&mut self, target: EntityId, bounds: &Aabb, player_side: bool) -> Vec<Hit> {
        let mut hits = Vec::new();
        for p in &mut self.projectiles {
            if p.dead || p.owner.hostile_to_player() != player_side {
                continue;
            }
            if !p.aabb().intersects(bounds) || p.hits.contains(&target) {
                continue;
            }
            hits.push(Hit {
                damage: p.damage,
                pos: p.center(),
            });
            if p.piercing {
                p.hits.push(target);
            } else {
                p.dead = true;
            }
        }
        self.projectiles.retain(|p| !p.dead);
        hits
    }
}

#[inline]
fn muzzle_pos(origin: Vec2, size: Vec2, dir: f32) -> Vec2 {
    let x = if dir < 0.0 { origin.x - size.x } else { origin.x };
    Vec2::new(x, origin.y - size.y * 0.5)
}

#[inline]
fn scale_damage(base: i32, multiplier: f32) -> i32 {
    (base as f32 * multiplier).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;

    fn system() -> WeaponSystem {
        WeaponSystem::new(WeaponsConfig::default(), &GameSettings::default())
    }

    #[test]
    fn test_full_charge_shot() {
        let mut weapons = system();
        let cooldown = weapons.create_weapon(WeaponKind::Normal, 100.0, 100.0, 1.0, 60.0, 60.0);
        assert_eq!(cooldown, weapons.config().normal.cooldown);

        let p = &weapons.projectiles()[0];
        let cfg = weapons.config();
        assert!(p.piercing);
        assert_eq!(p.charged, ChargeLevel::Full);
        assert_eq!(p.damage, scale_damage(cfg.normal.damage, cfg.charged_damage_multiplier));
        assert_eq!(p.vel.x, cfg.normal.speed * cfg.full_charge_speed_multiplier);
    }

    #[test]
    fn test_charge_tiers() {
        let mut weapons = system();
        weapons.create_weapon(WeaponKind::Normal, 100.0, 100.0, -1.0, 5.0, 60.0);
        weapons.create_weapon(WeaponKind::Normal, 100.0, 100.0, -1.0, 45.0, 60.0);
        let base = weapons.config().normal.damage;
        let shots = weapons.projectiles();
        assert_eq!(shots[0].charged, ChargeLevel::None);
        assert_eq!(shots[0].damage, base);
        assert!(!shots[0].piercing);
        assert!(shots[0].vel.x < 0.0);
        assert_eq!(shots[1].charged, ChargeLevel::Medium);
        assert_eq!(shots[1].damage, base * 2);
    }

    #[test]
    fn test_unknown_weapon_name_falls_back() {
        assert_eq!(WeaponKind::from_name("plasma-cannon"), WeaponKind::Normal);
        assert_eq!(WeaponKind::from_name("Spread"), WeaponKind::Spread);
        assert_eq!(WeaponKind::Bounce.next(), WeaponKind::Normal);
    }

    #[test]
    fn test_spread_fans_out() {
        let mut weapons = system();
        weapons.create_weapon(WeaponKind::Spread, 100.0, 100.0, 1.0, 0.0, 60.0);
        let shots = weapons.projectiles();
        assert_eq!(shots.len(), 3);
        assert!(shots[0].vel.y < 0.0);
        assert!(shots[1].vel.y.abs() < 1e-6);
        assert!(shots[2].vel.y > 0.0);
    }

    #[test]
    fn test_rapid_burst_uses_tick_queue() {
        let mut weapons = system();
        weapons.create_weapon(WeaponKind::Rapid, 100.0, 100.0, 1.0, 0.0, 60.0);
        assert_eq!(weapons.projectiles().len(), 1);
        assert_eq!(weapons.pending_shots(), 2);

        let interval = weapons.config().rapid.burst_interval;
        for _ in 0..interval - 1 {
            weapons.update_projectiles(&mut Vec::new(), &[], SIM_DT);
        }
        assert_eq!(weapons.projectiles().len(), 1);
        weapons.update_projectiles(&mut Vec::new(), &[], SIM_DT);
        assert_eq!(weapons.projectiles().len(), 2);
        for _ in 0..interval {
            weapons.update_projectiles(&mut Vec::new(), &[], SIM_DT);
        }
        assert_eq!(weapons.projectiles().len(), 3);
        assert_eq!(weapons.pending_shots(), 0);
    }

    #[test]
    fn test_laser_is_stationary_and_expires() {
        let mut weapons = system();
        weapons.create_weapon(WeaponKind::Laser, 100.0, 100.0, 1.0, 0.0, 60.0);
        let start = weapons.projectiles()[0].pos;
        let lifetime = weapons.config().laser.lifetime as usize;
        for _ in 0..lifetime - 1 {
            weapons.update_projectiles(&mut Vec::new(), &[], SIM_DT);
        }
        assert_eq!(weapons.projectiles()[0].pos, start);
        weapons.update_projectiles(&mut Vec::new(), &[], SIM_DT);
        weapons.update_projectiles(&mut Vec::new(), &[], SIM_DT);
        assert!(weapons.projectiles().is_empty());
    }

    #[test]
    fn test_wave_oscillates_vertically() {
        let mut weapons = system();
        weapons.create_weapon(WeaponKind::Wave, 100.0, 300.0, 1.0, 0.0, 60.0);
        let base_y = weapons.projectiles()[0].pos.y;
        let mut max_offset: f32 = 0.0;
        for _ in 0..20 {
            weapons.update_projectiles(&mut Vec::new(), &[], SIM_DT);
            max_offset = max_offset.max((weapons.projectiles()[0].pos.y - base_y).abs());
        }
        assert!(max_offset > 10.0);
        assert!(max_offset <= weapons.config().wave.amplitude + 1e-3);
    }

    #[test]
    fn test_bounce_budget_is_exhausted() {
        let mut weapons = system();
        let floor = [Aabb::new(0.0, 120.0, 1600.0, 40.0)];
        weapons.create_weapon(WeaponKind::Bounce, 100.0, 100.0, 1.0, 0.0, 60.0);
        let mut alive_ticks = 0;
        while !weapons.projectiles().is_empty() && alive_ticks < 1000 {
            weapons.update_projectiles(&mut Vec::new(), &floor, SIM_DT);
            alive_ticks += 1;
        }
        assert!(weapons.projectiles().is_empty());
        assert!(alive_ticks < 1000);
    }

    #[test]
    fn test_straight_shot_stops_at_platform() {
        let mut weapons = system();
        let wall = [Aabb::new(120.0, 0.0, 20.0, 600.0)];
        weapons.create_weapon(WeaponKind::Normal, 100.0, 100.0, 1.0, 0.0, 60.0);
        for _ in 0..5 {
            weapons.update_projectiles(&mut Vec::new(), &wall, SIM_DT);
        }
        assert!(weapons.projectiles().is_empty());
    }

    #[test]
    fn test_out_of_bounds_culled() {
        let mut weapons = system();
        weapons.create_weapon(WeaponKind::Normal, 5.0, 100.0, -1.0, 0.0, 60.0);
        for _ in 0..20 {
            weapons.update_projectiles(&mut Vec::new(), &[], SIM_DT);
        }
        assert!(weapons.projectiles().is_empty());
    }

    #[test]
    fn test_cap_drops_oldest() {
        let settings = GameSettings {
            max_projectiles: 5,
            ..Default::default()
        };
        let mut weapons = WeaponSystem::new(WeaponsConfig::default(), &settings);
        for _ in 0..8 {
            weapons.create_weapon(WeaponKind::Normal, 800.0, 100.0, 1.0, 0.0, 60.0);
        }
        weapons.update_projectiles(&mut Vec::new(), &[], SIM_DT);
        let ids: Vec<u64> = weapons.projectiles().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_external_projectiles_are_merged() {
        let mut weapons = system();
        let mut other = system();
        other.fire_aimed(Owner::Enemy, Vec2::new(500.0, 100.0), Vec2::new(0.0, 100.0), 4.0, 5);
        let mut external = other.projectiles().to_vec();
        weapons.update_projectiles(&mut external, &[], SIM_DT);
        assert!(external.is_empty());
        assert_eq!(weapons.projectiles().len(), 1);
        assert_eq!(weapons.projectiles()[0].owner, Owner::Enemy);
    }

    #[test]
    fn test_merged_projectiles_are_renumbered_for_cap() {
        let settings = GameSettings {
            max_projectiles: 3,
            ..Default::default()
        };
        let mut weapons = WeaponSystem::new(WeaponsConfig::default(), &settings);
        for _ in 0..3 {
            weapons.create_weapon(WeaponKind::Normal, 800.0, 100.0, 1.0, 0.0, 60.0);
        }
        weapons.update_projectiles(&mut Vec::new(), &[], SIM_DT);

        // Another system's shot arrives carrying id 1, which collides with ours
        let mut other = system();
        other.fire_aimed(Owner::Enemy, Vec2::new(500.0, 100.0), Vec2::new(0.0, 100.0), 4.0, 5);
        let mut external = other.projectiles().to_vec();
        assert_eq!(external[0].id, 1);
        weapons.update_projectiles(&mut external, &[], SIM_DT);

        let projectiles = weapons.projectiles();
        assert_eq!(projectiles.len(), 3);
        let ids: Vec<u64> = projectiles.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 3, 4]);
        assert_eq!(projectiles[2].owner, Owner::Enemy);
    }

    #[test]
    fn test_huge_burst_interval_does_not_overflow() {
        let mut config = WeaponsConfig::default();
        config.rapid.burst_interval = u64::MAX;
        let mut weapons = WeaponSystem::new(config, &GameSettings::default());
        weapons.create_weapon(WeaponKind::Rapid, 100.0, 100.0, 1.0, 0.0, 60.0);
        for _ in 0..5 {
            weapons.update_projectiles(&mut Vec::new(), &[], SIM_DT);
        }
        assert_eq!(weapons.projectiles().len(), 1);
    }

    #[test]
    fn test_aimed_shot_zero_distance() {
        let mut weapons = system();
        let p = Vec2::new(10.0, 10.0);
        assert!(!weapons.fire_aimed(Owner::Boss, p, p, 5.0, 10));
        assert!(weapons.projectiles().is_empty());
        assert_eq!(weapons.fire_volley(Owner::Boss, p, p, 3, 0.2, 5.0, 10), 0);
    }

    #[test]
    fn test_piercing_hits_each_target_once() {
        let mut weapons = system();
        weapons.create_weapon(WeaponKind::Normal, 100.0, 100.0, 1.0, 60.0, 60.0);
        let target = Aabb::new(90.0, 80.0, 60.0, 60.0);
        let first = weapons.resolve_hits(EntityId(7), &target, false);
        assert_eq!(first.len(), 1);
        let second = weapons.resolve_hits(EntityId(7), &target, false);
        assert!(second.is_empty());
        assert_eq!(weapons.projectiles().len(), 1, "piercing shot survives");
        let other = weapons.resolve_hits(EntityId(8), &target, false);
        assert_eq!(other.len(), 1);
    }

    #[test]
    fn test_single_hit_is_consumed_and_factions_respected() {
        let mut weapons = system();
        weapons.create_weapon(WeaponKind::Normal, 100.0, 100.0, 1.0, 0.0, 60.0);
        let target = Aabb::new(90.0, 80.0, 60.0, 60.0);
        assert!(weapons.resolve_hits(EntityId(1), &target, true).is_empty());
        let hits = weapons.resolve_hits(EntityId(2), &target, false);
        assert_eq!(hits.len(), 1);
        assert!(weapons.projectiles().is_empty());
    }

    #[test]
    fn test_fired_log() {
        let mut weapons = system();
        weapons.create_weapon(WeaponKind::Spread, 100.0, 100.0, 1.0, 0.0, 60.0);
        assert_eq!(weapons.drain_fired().len(), 3);
        assert!(weapons.drain_fired().is_empty());
    }
}
