//! Data-driven game balance
//!
//! Everything a level supplies at start: grid size, movement speed,
//! ability costs, horse/portal/particle tables and the transformation
//! ladder. The simulation never validates these - malformed tables are
//! the loader's problem.

use serde::{Deserialize, Serialize};

use crate::sim::abilities::AbilityId;
use crate::sim::particles::ParticleKind;
use crate::sim::state::{HorseKind, PortalKind};

/// Per-ability parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AbilitySpec {
    /// Fire meter cost
    pub cost: f32,
    /// Cooldown after a successful activation (seconds)
    pub cooldown: f32,
    pub damage: f32,
    /// Reach in grid cells (rays and dashes)
    pub range: u32,
    /// Effect duration (seconds, shield-style abilities)
    pub duration: f32,
    /// Blast radius in grid cells
    pub radius: u32,
}

/// What touching a horse does to the snake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HorseEffect {
    SpeedBoost,
    TransformBoost,
    ChasePlayer,
    DropTreasures,
    CreatePath,
    DangerWarning,
    Formation,
}

/// Per-horse-kind parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HorseSpec {
    /// Movement speed in cells/second
    pub speed: f32,
    pub effect: HorseEffect,
    /// Duration of the granted effect (seconds)
    pub duration: f32,
    /// Spawn weight (higher = more common)
    pub rarity: u32,
}

/// Per-portal-kind parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PortalSpec {
    /// Cooldown armed after each use (seconds)
    pub cooldown: f32,
    /// Only the entry half of the pair teleports
    pub one_way: bool,
    /// Entry portal is removed after first use
    pub temporary: bool,
}

/// Abilities a transformation stage makes available
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageUnlocks {
    /// Wildcard: every ability id
    All,
    Only(Vec<AbilityId>),
}

impl StageUnlocks {
    pub fn contains(&self, id: AbilityId) -> bool {
        match self {
            StageUnlocks::All => true,
            StageUnlocks::Only(ids) => ids.contains(&id),
        }
    }
}

/// One rung of the transformation ladder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageSpec {
    pub name: String,
    /// Cumulative collectibles required to reach this stage
    pub threshold: u32,
    pub unlocks: StageUnlocks,
}

/// Per-particle-kind parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticleSpec {
    /// 0x00RRGGBB entries; one is chosen per particle at spawn
    pub palette: Vec<u32>,
    /// Size range (world units)
    pub size: (f32, f32),
    /// Lifetime range (seconds)
    pub lifetime: (f32, f32),
    /// Emission rate range (particles per second of requested duration)
    pub emission: (f32, f32),
    /// Vertical kinematic bias (positive = rises)
    pub rise: f32,
}

/// Complete level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelTuning {
    pub grid_cols: i32,
    pub grid_rows: i32,
    /// Snake speed in cells/second
    pub snake_speed: f32,

    pub fire_max: f32,
    /// Fire meter regeneration per second
    pub fire_regen: f32,

    pub flame_breath: AbilitySpec,
    pub fire_shield: AbilitySpec,
    pub phoenix_dash: AbilitySpec,
    pub inferno_burst: AbilitySpec,

    pub mustang: HorseSpec,
    pub unicorn: HorseSpec,
    pub nightmare: HorseSpec,
    pub clydesdale: HorseSpec,
    pub pegasus: HorseSpec,
    pub sentinel: HorseSpec,
    pub pony: HorseSpec,

    pub stable_portal: PortalSpec,
    pub arch_portal: PortalSpec,
    pub flicker_portal: PortalSpec,
    pub ancient_portal: PortalSpec,

    pub fire_particles: ParticleSpec,
    pub smoke_particles: ParticleSpec,
    pub portal_particles: ParticleSpec,
    pub transformation_particles: ParticleSpec,

    /// Transformation ladder, thresholds non-decreasing
    pub stages: Vec<StageSpec>,

    pub obstacle_count: u32,
    pub collectible_count: u32,
    pub horse_count: u32,
    pub portal_pairs: u32,

    /// Score granted per collectible
    pub collectible_value: u32,
    /// Counter bonus from a transform-boost horse
    pub transform_boost_bonus: u32,
    /// Collectibles dropped by a treasure horse
    pub treasure_drop_count: u32,
    /// Speed multiplier from a speed-boost horse
    pub speed_boost_factor: f32,

    /// Score at which the level is won
    pub victory_score: u64,
    /// Whether an active fire shield converts hostile horse contact into
    /// defeating the horse (policy left open by the original rules)
    pub shield_blocks_hostiles: bool,
}

impl LevelTuning {
    pub fn ability(&self, id: AbilityId) -> &AbilitySpec {
        match id {
            AbilityId::FlameBreath => &self.flame_breath,
            AbilityId::FireShield => &self.fire_shield,
            AbilityId::PhoenixDash => &self.phoenix_dash,
            AbilityId::InfernoBurst => &self.inferno_burst,
        }
    }

    pub fn horse(&self, kind: HorseKind) -> &HorseSpec {
        match kind {
            HorseKind::Mustang => &self.mustang,
            HorseKind::Unicorn => &self.unicorn,
            HorseKind::Nightmare => &self.nightmare,
            HorseKind::Clydesdale => &self.clydesdale,
            HorseKind::Pegasus => &self.pegasus,
            HorseKind::Sentinel => &self.sentinel,
            HorseKind::Pony => &self.pony,
        }
    }

    pub fn portal(&self, kind: PortalKind) -> &PortalSpec {
        match kind {
            PortalKind::Stable => &self.stable_portal,
            PortalKind::Arch => &self.arch_portal,
            PortalKind::Flicker => &self.flicker_portal,
            PortalKind::Ancient => &self.ancient_portal,
        }
    }

    pub fn particles(&self, kind: ParticleKind) -> &ParticleSpec {
        match kind {
            ParticleKind::Fire => &self.fire_particles,
            ParticleKind::Smoke => &self.smoke_particles,
            ParticleKind::Portal => &self.portal_particles,
            ParticleKind::Transformation => &self.transformation_particles,
        }
    }
}

impl Default for LevelTuning {
    fn default() -> Self {
        Self {
            grid_cols: 32,
            grid_rows: 24,
            snake_speed: 8.0,

            fire_max: 100.0,
            fire_regen: 5.0,

            flame_breath: AbilitySpec {
                cost: 20.0,
                cooldown: 3.0,
                damage: 1.0,
                range: 5,
                duration: 0.0,
                radius: 0,
            },
            fire_shield: AbilitySpec {
                cost: 35.0,
                cooldown: 10.0,
                damage: 0.0,
                range: 0,
                duration: 6.0,
                radius: 0,
            },
            phoenix_dash: AbilitySpec {
                cost: 25.0,
                cooldown: 5.0,
                damage: 1.0,
                range: 4,
                duration: 0.0,
                radius: 0,
            },
            inferno_burst: AbilitySpec {
                cost: 60.0,
                cooldown: 15.0,
                damage: 3.0,
                range: 0,
                duration: 0.0,
                radius: 2,
            },

            mustang: HorseSpec {
                speed: 4.0,
                effect: HorseEffect::SpeedBoost,
                duration: 5.0,
                rarity: 30,
            },
            unicorn: HorseSpec {
                speed: 3.0,
                effect: HorseEffect::TransformBoost,
                duration: 0.0,
                rarity: 8,
            },
            nightmare: HorseSpec {
                speed: 5.0,
                effect: HorseEffect::ChasePlayer,
                duration: 0.0,
                rarity: 15,
            },
            clydesdale: HorseSpec {
                speed: 2.0,
                effect: HorseEffect::DropTreasures,
                duration: 0.0,
                rarity: 12,
            },
            pegasus: HorseSpec {
                speed: 6.0,
                effect: HorseEffect::CreatePath,
                duration: 0.0,
                rarity: 10,
            },
            sentinel: HorseSpec {
                speed: 3.0,
                effect: HorseEffect::DangerWarning,
                duration: 2.0,
                rarity: 10,
            },
            pony: HorseSpec {
                speed: 3.5,
                effect: HorseEffect::Formation,
                duration: 0.0,
                rarity: 15,
            },

            stable_portal: PortalSpec {
                cooldown: 2.0,
                one_way: false,
                temporary: false,
            },
            arch_portal: PortalSpec {
                cooldown: 3.0,
                one_way: true,
                temporary: false,
            },
            flicker_portal: PortalSpec {
                cooldown: 1.0,
                one_way: false,
                temporary: true,
            },
            ancient_portal: PortalSpec {
                cooldown: 8.0,
                one_way: false,
                temporary: false,
            },

            fire_particles: ParticleSpec {
                palette: vec![0x00ff4500, 0x00ff8c00, 0x00ffd700, 0x00ff6347],
                size: (2.0, 6.0),
                lifetime: (0.3, 0.9),
                emission: (20.0, 40.0),
                rise: 30.0,
            },
            smoke_particles: ParticleSpec {
                palette: vec![0x00555555, 0x00777777, 0x00999999],
                size: (3.0, 8.0),
                lifetime: (0.8, 1.6),
                emission: (8.0, 16.0),
                rise: 18.0,
            },
            portal_particles: ParticleSpec {
                palette: vec![0x008a2be2, 0x009370db, 0x0000bfff],
                size: (2.0, 5.0),
                lifetime: (0.5, 1.2),
                emission: (15.0, 25.0),
                rise: 0.0,
            },
            transformation_particles: ParticleSpec {
                palette: vec![0x00ffd700, 0x00ffffff, 0x00ffa500],
                size: (3.0, 7.0),
                lifetime: (0.6, 1.4),
                emission: (25.0, 45.0),
                rise: 12.0,
            },

            stages: vec![
                StageSpec {
                    name: "Serpent".into(),
                    threshold: 0,
                    unlocks: StageUnlocks::Only(vec![AbilityId::FlameBreath]),
                },
                StageSpec {
                    name: "Horned Serpent".into(),
                    threshold: 5,
                    unlocks: StageUnlocks::Only(vec![
                        AbilityId::FlameBreath,
                        AbilityId::FireShield,
                    ]),
                },
                StageSpec {
                    name: "Winged Wyrm".into(),
                    threshold: 15,
                    unlocks: StageUnlocks::Only(vec![
                        AbilityId::FlameBreath,
                        AbilityId::FireShield,
                        AbilityId::PhoenixDash,
                    ]),
                },
                StageSpec {
                    name: "Young Dragon".into(),
                    threshold: 30,
                    unlocks: StageUnlocks::Only(vec![
                        AbilityId::FlameBreath,
                        AbilityId::FireShield,
                        AbilityId::PhoenixDash,
                        AbilityId::InfernoBurst,
                    ]),
                },
                StageSpec {
                    name: "Elder Dragon".into(),
                    threshold: 50,
                    unlocks: StageUnlocks::All,
                },
            ],

            obstacle_count: 20,
            collectible_count: 6,
            horse_count: 4,
            portal_pairs: 2,

            collectible_value: 10,
            transform_boost_bonus: 3,
            treasure_drop_count: 3,
            speed_boost_factor: 1.5,

            victory_score: 500,
            shield_blocks_hostiles: true,
        }
    }
}
