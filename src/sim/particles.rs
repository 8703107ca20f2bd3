//! Visual particle effects
//!
//! Particles never affect gameplay. Two interchangeable emitters exist: a
//! plain `Vec`-backed one and a pooled one that recycles particle objects.
//! Both consume the RNG identically, so the same seed and calls yield the
//! same particles from either.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::config::{EffectConfig, ParticlesConfig};
use crate::frames;

use super::pool::{ObjectPool, PoolHandle};

/// Named particle effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EffectKind {
    Explosion,
    Hit,
    Dust,
    Muzzle,
    Charge,
    Enrage,
    Pickup,
}

impl EffectKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "explosion" => Some(EffectKind::Explosion),
            "hit" => Some(EffectKind::Hit),
            "dust" => Some(EffectKind::Dust),
            "muzzle" => Some(EffectKind::Muzzle),
            "charge" => Some(EffectKind::Charge),
            "enrage" => Some(EffectKind::Enrage),
            "pickup" => Some(EffectKind::Pickup),
            _ => None,
        }
    }

    pub fn config<'a>(&self, particles: &'a ParticlesConfig) -> &'a EffectConfig {
        match self {
            EffectKind::Explosion => &particles.explosion,
            EffectKind::Hit => &particles.hit,
            EffectKind::Dust => &particles.dust,
            EffectKind::Muzzle => &particles.muzzle,
            EffectKind::Charge => &particles.charge,
            EffectKind::Enrage => &particles.enrage,
            EffectKind::Pickup => &particles.pickup,
        }
    }
}

/// Per-call adjustments to an effect's configured parameters
#[derive(Debug, Clone, Default)]
pub struct EffectOverrides {
    pub count: Option<u32>,
    pub color: Option<[u8; 4]>,
    pub speed_scale: Option<f32>,
    /// Added to every particle's velocity (e.g. inherit the emitter's motion)
    pub inherit_velocity: Option<Vec2>,
}

/// A single visual particle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
    pub color: [u8; 4],
    /// Remaining life in frames
    pub life: f32,
    pub max_life: f32,
    pub gravity: f32,
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            size: 0.0,
            color: [255, 255, 255, 255],
            life: 0.0,
            max_life: 0.0,
            gravity: 0.0,
        }
    }
}

impl Particle {
    fn integrate(&mut self, f: f32) {
        self.vel.y += self.gravity * f;
        self.pos += self.vel * f;
        self.life -= f;
    }
}

/// Parse `#rrggbb` or `#rrggbbaa`; anything else is white
pub fn parse_color(hex: &str) -> [u8; 4] {
    let digits = hex.trim_start_matches('#');
    let channel = |i: usize| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok();
    let parsed = match digits.len() {
        6 => channel(0).zip(channel(2)).zip(channel(4)).map(|((r, g), b)| [r, g, b, 255]),
        8 => channel(0)
            .zip(channel(2))
            .zip(channel(4))
            .zip(channel(6))
            .map(|(((r, g), b), a)| [r, g, b, a]),
        _ => None,
    };
    parsed.unwrap_or_else(|| {
        log::warn!("Invalid particle color '{}', using white", hex);
        [255, 255, 255, 255]
    })
}

#[inline]
fn in_range(rng: &mut Pcg32, min: f32, max: f32) -> f32 {
    min + (max - min) * rng.random::<f32>()
}

/// Generate `count` particles for an effect, honoring the remaining capacity
fn emit(
    config: &EffectConfig,
    overrides: &EffectOverrides,
    pos: Vec2,
    capacity: usize,
    rng: &mut Pcg32,
    mut sink: impl FnMut(Particle),
) -> usize {
    let count = (overrides.count.unwrap_or(config.count) as usize).min(capacity);
    let color = overrides.color.unwrap_or_else(|| parse_color(&config.color));
    let speed_scale = overrides.speed_scale.unwrap_or(1.0);
    let inherit = overrides.inherit_velocity.unwrap_or(Vec2::ZERO);

    for _ in 0..count {
        let angle = in_range(rng, config.angle_min, config.angle_max);
        let speed = in_range(rng, config.speed_min, config.speed_max) * speed_scale;
        let life = in_range(rng, config.lifetime_min, config.lifetime_max);
        let size = in_range(rng, config.size_min, config.size_max);
        sink(Particle {
            pos,
            vel: Vec2::from_angle(angle) * speed + inherit,
            size,
            color,
            life,
            max_life: life,
            gravity: config.gravity,
        });
    }
    count
}

/// Common interface of the particle emitters
pub trait ParticleEmitter {
    /// Spawn an effect at `pos`; returns the number of particles created
    fn create_effect(&mut self, kind: EffectKind, pos: Vec2, overrides: &EffectOverrides) -> usize;

    /// Spawn an effect by name; unknown names spawn nothing
    fn create_effect_named(&mut self, name: &str, pos: Vec2, overrides: &EffectOverrides) -> usize {
        match EffectKind::from_name(name) {
            Some(kind) => self.create_effect(kind, pos, overrides),
            None => {
                log::warn!("Unknown particle effect '{}'", name);
                0
            }
        }
    }

    /// Integrate live particles and drop expired ones
    fn update(&mut self, dt: f32);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn clear(&mut self);

    /// Copy of the live particles in spawn order
    fn snapshot(&self) -> Vec<Particle>;
}

/// `Vec`-backed particle emitter
#[derive(Debug, Clone)]
pub struct ParticleSystem {
    config: ParticlesConfig,
    rng: Pcg32,
    particles: Vec<Particle>,
}

impl ParticleSystem {
    pub fn new(config: ParticlesConfig, seed: u64) -> Self {
        Self {
            config,
            rng: Pcg32::seed_from_u64(seed),
            particles: Vec::new(),
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }
}

impl ParticleEmitter for ParticleSystem {
    fn create_effect(&mut self, kind: EffectKind, pos: Vec2, overrides: &EffectOverrides) -> usize {
        let capacity = self.config.max_particles.saturating_sub(self.particles.len());
        let particles = &mut self.particles;
        emit(kind.config(&self.config), overrides, pos, capacity, &mut self.rng, |p| {
            particles.push(p)
        })
    }

    fn update(&mut self, dt: f32) {
        let f = frames(dt);
        for p in &mut self.particles {
            p.integrate(f);
        }
        self.particles.retain(|p| p.life > 0.0);
    }

    fn len(&self) -> usize {
        self.particles.len()
    }

    fn clear(&mut self) {
        self.particles.clear();
    }

    fn snapshot(&self) -> Vec<Particle> {
        self.particles.clone()
    }
}

/// Particle emitter that recycles particles through an [`ObjectPool`]
pub struct PooledParticleSystem {
    config: ParticlesConfig,
    rng: Pcg32,
    pool: ObjectPool<Particle>,
    active: Vec<PoolHandle>,
}

impl PooledParticleSystem {
    pub fn new(config: ParticlesConfig, seed: u64) -> Self {
        let prealloc = config.max_particles.min(128);
        Self {
            config,
            rng: Pcg32::seed_from_u64(seed),
            pool: ObjectPool::with_capacity(prealloc, Particle::default, |p| *p = Particle::default()),
            active: Vec::new(),
        }
    }

    pub fn pool(&self) -> &ObjectPool<Particle> {
        &self.pool
    }
}

impl ParticleEmitter for PooledParticleSystem {
    fn create_effect(&mut self, kind: EffectKind, pos: Vec2, overrides: &EffectOverrides) -> usize {
        let capacity = self.config.max_particles.saturating_sub(self.active.len());
        let pool = &mut self.pool;
        let active = &mut self.active;
        emit(kind.config(&self.config), overrides, pos, capacity, &mut self.rng, |p| {
            let handle = pool.get();
            if let Some(slot) = pool.get_mut(handle) {
                *slot = p;
            }
            active.push(handle);
        })
    }

    fn update(&mut self, dt: f32) {
        let f = frames(dt);
        let pool = &mut self.pool;
        self.active.retain(|&handle| {
            let alive = match pool.get_mut(handle) {
                Some(p) => {
                    p.integrate(f);
                    p.life > 0.0
                }
                None => false,
            };
            if !alive {
                pool.release(handle);
            }
            alive
        });
    }

    fn len(&self) -> usize {
        self.active.len()
    }

    fn clear(&mut self) {
        self.pool.release_all();
        self.active.clear();
    }

    fn snapshot(&self) -> Vec<Particle> {
        self.active
            .iter()
            .filter_map(|&h| self.pool.get_ref(h).copied())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;

    fn config() -> ParticlesConfig {
        ParticlesConfig::default()
    }

    #[test]
    fn test_effect_spawns_configured_count() {
        let mut system = ParticleSystem::new(config(), 7);
        let n = system.create_effect(EffectKind::Explosion, Vec2::new(10.0, 10.0), &EffectOverrides::default());
        assert_eq!(n, config().explosion.count as usize);
        assert_eq!(system.len(), n);
        let cfg = config().explosion;
        for p in system.particles() {
            assert!(p.size >= cfg.size_min && p.size <= cfg.size_max);
            assert!(p.life >= cfg.lifetime_min && p.life <= cfg.lifetime_max);
            let speed = p.vel.length();
            assert!(speed >= cfg.speed_min - 1e-3 && speed <= cfg.speed_max + 1e-3);
        }
    }

    #[test]
    fn test_unknown_effect_spawns_nothing() {
        let mut system = ParticleSystem::new(config(), 7);
        assert_eq!(system.create_effect_named("confetti", Vec2::ZERO, &EffectOverrides::default()), 0);
        assert!(system.is_empty());
        assert!(system.create_effect_named("Dust", Vec2::ZERO, &EffectOverrides::default()) > 0);
    }

    #[test]
    fn test_overrides() {
        let mut system = ParticleSystem::new(config(), 7);
        let overrides = EffectOverrides {
            count: Some(2),
            color: Some([1, 2, 3, 4]),
            ..Default::default()
        };
        system.create_effect(EffectKind::Hit, Vec2::ZERO, &overrides);
        assert_eq!(system.len(), 2);
        assert!(system.particles().iter().all(|p| p.color == [1, 2, 3, 4]));
    }

    #[test]
    fn test_particles_expire() {
        let mut system = ParticleSystem::new(config(), 7);
        system.create_effect(EffectKind::Muzzle, Vec2::ZERO, &EffectOverrides::default());
        let max_life = config().muzzle.lifetime_max as usize + 1;
        for _ in 0..max_life {
            system.update(SIM_DT);
        }
        assert!(system.is_empty());
    }

    #[test]
    fn test_capacity_is_enforced() {
        let cfg = ParticlesConfig {
            max_particles: 10,
            ..config()
        };
        let mut system = ParticleSystem::new(cfg, 1);
        system.create_effect(EffectKind::Explosion, Vec2::ZERO, &EffectOverrides::default());
        assert_eq!(system.len(), 10);
        assert_eq!(system.create_effect(EffectKind::Hit, Vec2::ZERO, &EffectOverrides::default()), 0);
    }

    #[test]
    fn test_pooled_matches_unpooled() {
        let mut plain = ParticleSystem::new(config(), 99);
        let mut pooled = PooledParticleSystem::new(config(), 99);
        let effects = [EffectKind::Explosion, EffectKind::Dust, EffectKind::Hit, EffectKind::Enrage];

        for (i, kind) in effects.iter().enumerate() {
            let pos = Vec2::new(i as f32 * 10.0, 50.0);
            plain.create_effect(*kind, pos, &EffectOverrides::default());
            pooled.create_effect(*kind, pos, &EffectOverrides::default());
            for _ in 0..12 {
                plain.update(SIM_DT);
                pooled.update(SIM_DT);
            }
            assert_eq!(plain.snapshot(), pooled.snapshot());
        }
    }

    #[test]
    fn test_pooled_recycles_particles() {
        let mut pooled = PooledParticleSystem::new(config(), 3);
        let constructed = pooled.pool().len();
        for _ in 0..5 {
            pooled.create_effect(EffectKind::Hit, Vec2::ZERO, &EffectOverrides::default());
            for _ in 0..30 {
                pooled.update(SIM_DT);
            }
        }
        assert!(pooled.is_empty());
        assert_eq!(pooled.pool().len(), constructed);
        assert_eq!(pooled.pool().active_count(), 0);

        pooled.create_effect(EffectKind::Hit, Vec2::ZERO, &EffectOverrides::default());
        pooled.clear();
        assert_eq!(pooled.pool().active_count(), 0);
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#ff8800"), [255, 136, 0, 255]);
        assert_eq!(parse_color("00000080"), [0, 0, 0, 128]);
        assert_eq!(parse_color("red"), [255, 255, 255, 255]);
    }
}
