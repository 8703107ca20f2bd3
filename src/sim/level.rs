//! Level layout: static platforms plus initial spawns

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::GameSettings;
use crate::error::ConfigError;

use super::body::Aabb;
use super::enemy::EnemyKind;
use super::pickup::PickupKind;
use super::weapon::WeaponKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnemySpawn {
    pub kind: EnemyKind,
    pub pos: Vec2,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupSpawn {
    pub kind: PickupKind,
    pub pos: Vec2,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Level {
    pub name: String,
    pub platforms: Vec<Aabb>,
    pub enemies: Vec<EnemySpawn>,
    pub pickups: Vec<PickupSpawn>,
    /// Whether the boss is spawned (its position comes from the boss config)
    pub boss: bool,
}

impl Level {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// A single floor with nothing on it
    pub fn flat(settings: &GameSettings) -> Self {
        Self {
            name: "flat".to_string(),
            platforms: vec![floor(settings)],
            ..Default::default()
        }
    }

    /// Small arena: floor, a few ledges, two enemies, two pickups and the boss
    pub fn demo(settings: &GameSettings) -> Self {
        let floor_y = settings.level_height - 40.0;
        Self {
            name: "demo".to_string(),
            platforms: vec![
                floor(settings),
                Aabb::new(300.0, floor_y - 120.0, 160.0, 20.0),
                Aabb::new(560.0, floor_y - 200.0, 120.0, 20.0),
                Aabb::new(780.0, floor_y - 120.0, 160.0, 20.0),
            ],
            enemies: vec![
                EnemySpawn {
                    kind: EnemyKind::Walker,
                    pos: Vec2::new(480.0, floor_y - 28.0),
                },
                EnemySpawn {
                    kind: EnemyKind::Hopper,
                    pos: Vec2::new(820.0, floor_y - 24.0),
                },
            ],
            pickups: vec![
                PickupSpawn {
                    kind: PickupKind::Weapon(WeaponKind::Spread),
                    pos: Vec2::new(360.0, floor_y - 160.0),
                },
                PickupSpawn {
                    kind: PickupKind::Health { amount: 25 },
                    pos: Vec2::new(610.0, floor_y - 240.0),
                },
            ],
            boss: true,
        }
    }
}

fn floor(settings: &GameSettings) -> Aabb {
    Aabb::new(0.0, settings.level_height - 40.0, settings.level_width, 40.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_level_fits_settings() {
        let settings = GameSettings::default();
        let level = Level::demo(&settings);
        assert!(level.boss);
        for p in &level.platforms {
            assert!(p.right() <= settings.level_width);
            assert!(p.bottom() <= settings.level_height);
        }
    }

    #[test]
    fn test_level_from_json() {
        let json = r#"{
            "name": "test",
            "platforms": [{"x": 0, "y": 560, "w": 1600, "h": 40}],
            "enemies": [{"kind": "walker", "pos": [200.0, 500.0]}],
            "pickups": [{"kind": {"weapon": "laser"}, "pos": [50.0, 50.0]}]
        }"#;
        let level = Level::from_json(json).unwrap();
        assert_eq!(level.platforms, vec![Aabb::new(0.0, 560.0, 1600.0, 40.0)]);
        assert_eq!(level.enemies[0].kind, EnemyKind::Walker);
        assert_eq!(level.pickups[0].kind, PickupKind::Weapon(WeaponKind::Laser));
        assert!(!level.boss);
    }

    #[test]
    fn test_negative_platform_size_is_clamped() {
        let level = Level::from_json(r#"{"platforms": [{"x": 0, "y": 560, "w": -50, "h": 40}]}"#).unwrap();
        assert_eq!(level.platforms[0].size, Vec2::new(0.0, 40.0));
    }

    #[test]
    fn test_platforms_serialize_as_rects() {
        let level = Level {
            platforms: vec![Aabb::new(10.0, 20.0, 30.0, 40.0)],
            ..Default::default()
        };
        let json = serde_json::to_string(&level).unwrap();
        assert!(json.contains(r#"{"x":10.0,"y":20.0,"w":30.0,"h":40.0}"#));
        let back = Level::from_json(&json).unwrap();
        assert_eq!(back.platforms, level.platforms);
    }

    #[test]
    fn test_bad_level_json_is_an_error() {
        assert!(matches!(Level::from_json("{\"platforms\": 3}"), Err(ConfigError::Parse(_))));
    }
}
