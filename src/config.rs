//! Game configuration
//!
//! All tunables are data-driven. The JSON layout mirrors the top-level keys
//! `game`, `player`, `boss`, `enemies`, `weapons` and `particles`; every
//! section is optional and falls back to the defaults below.
//!
//! Units: distances in pixels, velocities in pixels per 60 Hz frame,
//! timers and lifetimes in frames.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Complete configuration tree
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameConfig {
    pub game: GameSettings,
    pub player: PlayerConfig,
    pub boss: BossConfig,
    pub enemies: EnemiesConfig,
    pub weapons: WeaponsConfig,
    pub particles: ParticlesConfig,
}

impl GameConfig {
    /// Parse a JSON document; missing keys take their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        Ok(config.validated())
    }

    /// Read and parse a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json(&text)?;
        log::info!("Loaded config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Repair values the simulation cannot run with, logging each repair
    pub fn validated(mut self) -> Self {
        let defaults = GameSettings::default();
        let game = &mut self.game;
        if game.level_width <= 0.0 || game.level_height <= 0.0 {
            log::warn!(
                "Level size {}x{} is degenerate, using {}x{}",
                game.level_width,
                game.level_height,
                defaults.level_width,
                defaults.level_height
            );
            game.level_width = defaults.level_width;
            game.level_height = defaults.level_height;
        }
        if game.max_delta <= 0.0 {
            log::warn!("game.maxDelta must be positive, using {}", defaults.max_delta);
            game.max_delta = defaults.max_delta;
        }
        if game.max_velocity_x < 0.0 || game.max_velocity_y < 0.0 {
            log::warn!("Negative velocity caps, using absolute values");
            game.max_velocity_x = game.max_velocity_x.abs();
            game.max_velocity_y = game.max_velocity_y.abs();
        }

        if self.weapons.max_charge <= 0.0 {
            let fallback = WeaponsConfig::default().max_charge;
            log::warn!("weapons.maxCharge must be positive, using {}", fallback);
            self.weapons.max_charge = fallback;
        }

        for (name, effect) in self.particles.effects_mut() {
            effect.repair(name);
        }

        self.player.width = non_negative("player.width", self.player.width);
        self.player.height = non_negative("player.height", self.player.height);
        self.boss.width = non_negative("boss.width", self.boss.width);
        self.boss.height = non_negative("boss.height", self.boss.height);
        self
    }
}

fn non_negative(key: &str, value: f32) -> f32 {
    if value < 0.0 {
        log::warn!("{} is negative ({}), clamping to 0", key, value);
        0.0
    } else {
        value
    }
}

/// World-level physics and limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameSettings {
    pub gravity: f32,
    pub terminal_velocity: f32,
    pub friction: f32,
    /// Horizontal speed below which grounded friction snaps to zero
    pub friction_snap: f32,
    pub max_velocity_x: f32,
    pub max_velocity_y: f32,
    pub level_width: f32,
    pub level_height: f32,
    pub max_projectiles: usize,
    /// Distance outside the level a projectile may travel before it is culled
    pub projectile_margin: f32,
    /// Coefficient of restitution for dynamic-vs-dynamic impulses
    pub restitution: f32,
    /// Largest accepted delta-time in seconds
    pub max_delta: f32,
    pub seed: u64,
    /// Use the pooled particle system
    pub pooled_particles: bool,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            gravity: 0.5,
            terminal_velocity: 12.0,
            friction: 0.2,
            friction_snap: 0.1,
            max_velocity_x: 10.0,
            max_velocity_y: 15.0,
            level_width: 1600.0,
            level_height: 600.0,
            max_projectiles: 50,
            projectile_margin: 50.0,
            restitution: 0.5,
            max_delta: crate::consts::MAX_DT,
            seed: 42,
            pooled_particles: true,
        }
    }
}

/// Player tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlayerConfig {
    pub width: f32,
    pub height: f32,
    pub mass: f32,
    pub walk_speed: f32,
    pub jump_force: f32,
    /// Fraction of walk speed available while airborne
    pub air_control: f32,
    /// Upward velocity multiplier applied when jump is released early
    pub jump_cut: f32,
    pub slide_speed: f32,
    pub slide_duration: f32,
    pub slide_cooldown: f32,
    pub max_health: i32,
    pub lives: u32,
    pub invulnerability_frames: f32,
    pub knockback: f32,
    /// How long the shooting pose holds after the last shot
    pub shoot_pose_frames: f32,
    /// Movement axis magnitude treated as "no input"
    pub move_deadzone: f32,
    pub spawn_x: f32,
    pub spawn_y: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            width: 32.0,
            height: 48.0,
            mass: 1.0,
            walk_speed: 4.0,
            jump_force: 11.0,
            air_control: 0.8,
            jump_cut: 0.5,
            slide_speed: 8.0,
            slide_duration: 20.0,
            slide_cooldown: 30.0,
            max_health: 100,
            lives: 3,
            invulnerability_frames: 60.0,
            knockback: 5.0,
            shoot_pose_frames: 12.0,
            move_deadzone: 0.2,
            spawn_x: 100.0,
            spawn_y: 400.0,
        }
    }
}

/// Boss tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BossConfig {
    pub width: f32,
    pub height: f32,
    pub mass: f32,
    pub max_health: i32,
    pub patrol_speed: f32,
    pub patrol_left: f32,
    pub patrol_right: f32,
    /// Health fraction below which the boss enrages
    pub enrage_threshold: f32,
    pub enrage_speed_multiplier: f32,
    pub idle_duration: f32,
    pub attack_range: f32,
    pub attack_cooldown: f32,
    pub attack_duration: f32,
    pub enraged_attack_cooldown: f32,
    pub contact_damage: i32,
    pub projectile_speed: f32,
    pub projectile_damage: i32,
    /// Shots per enraged volley
    pub volley_size: u32,
    /// Angle between volley shots (radians)
    pub volley_spread: f32,
    pub spawn_x: f32,
    pub spawn_y: f32,
}

impl Default for BossConfig {
    fn default() -> Self {
        Self {
            width: 64.0,
            height: 80.0,
            mass: 4.0,
            max_health: 200,
            patrol_speed: 2.0,
            patrol_left: 1000.0,
            patrol_right: 1500.0,
            enrage_threshold: 0.5,
            enrage_speed_multiplier: 1.6,
            idle_duration: 60.0,
            attack_range: 400.0,
            attack_cooldown: 90.0,
            attack_duration: 30.0,
            enraged_attack_cooldown: 45.0,
            contact_damage: 20,
            projectile_speed: 6.0,
            projectile_damage: 10,
            volley_size: 3,
            volley_spread: 0.3,
            spawn_x: 1300.0,
            spawn_y: 400.0,
        }
    }
}

/// Tunables shared by all enemy kinds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EnemyParams {
    pub width: f32,
    pub height: f32,
    pub max_health: i32,
    pub speed: f32,
    pub contact_damage: i32,
    /// Upward impulse for hopping enemies (0 = never jumps)
    pub jump_force: f32,
    pub jump_interval: f32,
}

impl Default for EnemyParams {
    fn default() -> Self {
        Self {
            width: 28.0,
            height: 28.0,
            max_health: 20,
            speed: 1.5,
            contact_damage: 10,
            jump_force: 0.0,
            jump_interval: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EnemiesConfig {
    pub walker: EnemyParams,
    pub hopper: EnemyParams,
}

impl Default for EnemiesConfig {
    fn default() -> Self {
        Self {
            walker: EnemyParams::default(),
            hopper: EnemyParams {
                width: 24.0,
                height: 24.0,
                max_health: 15,
                speed: 2.0,
                contact_damage: 8,
                jump_force: 9.0,
                jump_interval: 70.0,
            },
        }
    }
}

/// Base parameters of a straight-flying shot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ShotParams {
    pub damage: i32,
    pub speed: f32,
    pub cooldown: f32,
    pub lifetime: f32,
    pub width: f32,
    pub height: f32,
}

impl Default for ShotParams {
    fn default() -> Self {
        Self {
            damage: 10,
            speed: 8.0,
            cooldown: 10.0,
            lifetime: 90.0,
            width: 8.0,
            height: 6.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RapidParams {
    pub shot: ShotParams,
    pub burst_count: u32,
    /// Ticks between burst shots
    pub burst_interval: u64,
}

impl Default for RapidParams {
    fn default() -> Self {
        Self {
            shot: ShotParams {
                damage: 5,
                speed: 10.0,
                cooldown: 24.0,
                lifetime: 60.0,
                width: 6.0,
                height: 4.0,
            },
            burst_count: 3,
            burst_interval: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpreadParams {
    pub shot: ShotParams,
    pub count: u32,
    /// Angle between adjacent shots (radians)
    pub angle: f32,
}

impl Default for SpreadParams {
    fn default() -> Self {
        Self {
            shot: ShotParams {
                damage: 7,
                speed: 7.0,
                cooldown: 18.0,
                lifetime: 60.0,
                width: 6.0,
                height: 6.0,
            },
            count: 3,
            angle: 0.26,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LaserParams {
    pub damage: i32,
    pub cooldown: f32,
    pub lifetime: f32,
    pub length: f32,
    pub height: f32,
}

impl Default for LaserParams {
    fn default() -> Self {
        Self {
            damage: 3,
            cooldown: 40.0,
            lifetime: 20.0,
            length: 320.0,
            height: 4.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WaveParams {
    pub shot: ShotParams,
    pub amplitude: f32,
    /// Radians of phase advanced per frame
    pub frequency: f32,
}

impl Default for WaveParams {
    fn default() -> Self {
        Self {
            shot: ShotParams {
                damage: 8,
                speed: 6.0,
                cooldown: 14.0,
                lifetime: 100.0,
                width: 10.0,
                height: 10.0,
            },
            amplitude: 20.0,
            frequency: 0.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BounceParams {
    pub shot: ShotParams,
    pub max_bounces: u32,
    pub gravity: f32,
    /// Initial upward velocity
    pub lift: f32,
}

impl Default for BounceParams {
    fn default() -> Self {
        Self {
            shot: ShotParams {
                damage: 9,
                speed: 6.0,
                cooldown: 16.0,
                lifetime: 150.0,
                width: 8.0,
                height: 8.0,
            },
            max_bounces: 3,
            gravity: 0.3,
            lift: 3.0,
        }
    }
}

/// Weapon archetypes and the charge curve
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WeaponsConfig {
    /// Minimum held charge that fires on release
    pub charge_threshold: f32,
    pub medium_charge_threshold: f32,
    pub max_charge: f32,
    pub medium_damage_multiplier: f32,
    pub charged_damage_multiplier: f32,
    pub full_charge_speed_multiplier: f32,
    /// Projectile size multiplier for a fully charged shot
    pub charged_size_multiplier: f32,
    pub normal: ShotParams,
    pub rapid: RapidParams,
    pub spread: SpreadParams,
    pub laser: LaserParams,
    pub wave: WaveParams,
    pub bounce: BounceParams,
}

impl Default for WeaponsConfig {
    fn default() -> Self {
        Self {
            charge_threshold: 15.0,
            medium_charge_threshold: 30.0,
            max_charge: 60.0,
            medium_damage_multiplier: 2.0,
            charged_damage_multiplier: 3.0,
            full_charge_speed_multiplier: 1.5,
            charged_size_multiplier: 2.0,
            normal: ShotParams::default(),
            rapid: RapidParams::default(),
            spread: SpreadParams::default(),
            laser: LaserParams::default(),
            wave: WaveParams::default(),
            bounce: BounceParams::default(),
        }
    }
}

/// Emission parameters for one particle effect
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EffectConfig {
    pub count: u32,
    pub speed_min: f32,
    pub speed_max: f32,
    pub lifetime_min: f32,
    pub lifetime_max: f32,
    pub size_min: f32,
    pub size_max: f32,
    /// Emission cone (radians, 0 = +x, y grows downward)
    pub angle_min: f32,
    pub angle_max: f32,
    pub gravity: f32,
    pub color: String,
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            count: 8,
            speed_min: 1.0,
            speed_max: 3.0,
            lifetime_min: 15.0,
            lifetime_max: 30.0,
            size_min: 2.0,
            size_max: 4.0,
            angle_min: 0.0,
            angle_max: std::f32::consts::TAU,
            gravity: 0.0,
            color: "#ffffff".to_string(),
        }
    }
}

impl EffectConfig {
    fn with(count: u32, speed: (f32, f32), lifetime: (f32, f32), size: (f32, f32), gravity: f32, color: &str) -> Self {
        Self {
            count,
            speed_min: speed.0,
            speed_max: speed.1,
            lifetime_min: lifetime.0,
            lifetime_max: lifetime.1,
            size_min: size.0,
            size_max: size.1,
            gravity,
            color: color.to_string(),
            ..Default::default()
        }
    }

    fn repair(&mut self, name: &str) {
        for (lo, hi) in [
            (&mut self.speed_min, &mut self.speed_max),
            (&mut self.lifetime_min, &mut self.lifetime_max),
            (&mut self.size_min, &mut self.size_max),
            (&mut self.angle_min, &mut self.angle_max),
        ] {
            if *lo > *hi {
                log::warn!("particles.{}: range min > max, swapping", name);
                std::mem::swap(lo, hi);
            }
        }
        if self.size_min < 0.0 {
            log::warn!("particles.{}: negative size, clamping to 0", name);
            self.size_min = 0.0;
            self.size_max = self.size_max.max(0.0);
        }
    }
}

/// Particle effect table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParticlesConfig {
    pub max_particles: usize,
    pub explosion: EffectConfig,
    pub hit: EffectConfig,
    pub dust: EffectConfig,
    pub muzzle: EffectConfig,
    pub charge: EffectConfig,
    pub enrage: EffectConfig,
    pub pickup: EffectConfig,
}

impl Default for ParticlesConfig {
    fn default() -> Self {
        use std::f32::consts::PI;
        Self {
            max_particles: 400,
            explosion: EffectConfig::with(24, (2.0, 6.0), (20.0, 45.0), (3.0, 6.0), 0.1, "#ff8800"),
            hit: EffectConfig::with(6, (1.0, 3.0), (8.0, 15.0), (2.0, 3.0), 0.0, "#ffff66"),
            dust: EffectConfig {
                // Upward half-circle
                angle_min: PI,
                angle_max: 2.0 * PI,
                ..EffectConfig::with(6, (0.5, 1.5), (10.0, 20.0), (2.0, 4.0), 0.05, "#c8b89a")
            },
            muzzle: EffectConfig::with(4, (1.0, 2.0), (4.0, 8.0), (2.0, 3.0), 0.0, "#aaddff"),
            charge: EffectConfig::with(3, (0.5, 1.0), (10.0, 16.0), (1.0, 2.0), 0.0, "#66ccff"),
            enrage: EffectConfig::with(40, (3.0, 7.0), (30.0, 60.0), (3.0, 7.0), 0.0, "#ff2222"),
            pickup: EffectConfig::with(10, (1.0, 2.5), (15.0, 25.0), (2.0, 3.0), -0.05, "#66ff66"),
        }
    }
}

impl ParticlesConfig {
    fn effects_mut(&mut self) -> [(&'static str, &mut EffectConfig); 7] {
        [
            ("explosion", &mut self.explosion),
            ("hit", &mut self.hit),
            ("dust", &mut self.dust),
            ("muzzle", &mut self.muzzle),
            ("charge", &mut self.charge),
            ("enrage", &mut self.enrage),
            ("pickup", &mut self.pickup),
        ]
    }
}
