//! Balance constants grouped by the part of the simulation they steer.
//!
//! Every number that shapes a run lives here so adapters can load overrides
//! from configuration instead of recompiling. [`Tuning::default`] reproduces
//! the reference balance.

use serde::{Deserialize, Serialize};

use crate::Archetype;

/// Complete balance sheet consumed by the simulation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Playfield dimensions and confinement margins.
    pub arena: ArenaTuning,
    /// Player stats, leveling curve, and healing aura shape.
    pub player: PlayerTuning,
    /// Enemy stat profiles and shaman behavior.
    pub enemies: EnemyTuning,
    /// Allied unit behavior and flocking parameters.
    pub allies: AllyTuning,
    /// Wave pacing, quotas, and spawn placement.
    pub waves: WaveTuning,
    /// Projectile extent, lifetime, and speed.
    pub projectiles: ProjectileTuning,
    /// Frame pacing and card-offer sizing.
    pub session: SessionTuning,
}

/// Playfield dimensions and confinement margins.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaTuning {
    /// Playfield width in world units.
    pub width: f32,
    /// Playfield height in world units.
    pub height: f32,
    /// Inset applied when clamping the player and testing projectile exit.
    pub padding: f32,
    /// Inset enemies and allies keep from every edge while moving.
    pub confine_margin: f32,
}

impl Default for ArenaTuning {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
            padding: 0.0,
            confine_margin: 5.0,
        }
    }
}

/// Player stats, leveling curve, and healing aura shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    /// Side length of the player's square body.
    pub size: f32,
    /// Health the player starts with and heals toward.
    pub max_health: f32,
    /// Damage carried by each player projectile.
    pub damage: f32,
    /// Movement speed in world units per second.
    pub speed: f32,
    /// Seconds between player shots while the attack control is held.
    pub attack_cooldown: f32,
    /// Army slots available before score is counted.
    pub base_army_capacity: u32,
    /// Extra army slots granted per score point, truncated after scaling.
    pub capacity_per_point: f32,
    /// Experience required to reach level two.
    pub experience_to_level: f32,
    /// Multiplier applied to the experience requirement at each level.
    pub level_growth: f32,

    // === Healing aura ===
    /// Aura radius before health scaling is added.
    pub aura_base_radius: f32,
    /// Aura radius gained per point of maximum health.
    pub aura_radius_per_health: f32,
    /// Healing per second before health scaling is added.
    pub aura_base_power: f32,
    /// Healing per second gained per point of maximum health.
    pub aura_power_per_health: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            size: 32.0,
            max_health: 100.0,
            damage: 8.0,
            speed: 120.0,
            attack_cooldown: 0.6,
            base_army_capacity: 1,
            capacity_per_point: 1.5,
            experience_to_level: 100.0,
            level_growth: 1.5,
            aura_base_radius: 80.0,
            aura_radius_per_health: 0.5,
            aura_base_power: 5.0,
            aura_power_per_health: 0.1,
        }
    }
}

/// Stat profile stamped onto an enemy at spawn time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchetypeProfile {
    /// Body side length as a multiple of the shared base size.
    pub size_multiplier: f32,
    /// Starting and maximum health.
    pub health: f32,
    /// Damage dealt per melee strike or carried per projectile.
    pub damage: f32,
    /// Movement speed in world units per second.
    pub speed: f32,
    /// Experience rewarded when the enemy is defeated.
    pub experience: u32,
    /// Center distance at which melee strikes connect.
    pub attack_range: f32,
    /// Seconds between melee strikes.
    pub attack_cooldown: f32,
}

impl Default for ArchetypeProfile {
    fn default() -> Self {
        Self {
            size_multiplier: 1.0,
            health: 30.0,
            damage: 5.0,
            speed: 80.0,
            experience: 10,
            attack_range: 32.0,
            attack_cooldown: 1.0,
        }
    }
}

/// Enemy stat profiles and shaman behavior.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTuning {
    /// Body side length multiplied by each profile's size factor.
    pub base_size: f32,
    /// Profile for the baseline melee chaser.
    pub warrior: ArchetypeProfile,
    /// Profile for the oversized bruiser.
    pub tank: ArchetypeProfile,
    /// Profile for the ranged caster.
    pub shaman: ArchetypeProfile,
    /// Profile for the fast melee striker.
    pub assassin: ArchetypeProfile,

    // === Shaman behavior ===
    /// Distance below which a shaman retreats from its target.
    pub shaman_preferred_distance: f32,
    /// Speed of shaman projectiles in world units per second.
    pub shaman_projectile_speed: f32,
    /// Seconds between shaman shots.
    pub shaman_projectile_cooldown: f32,
}

impl EnemyTuning {
    /// Profile for one archetype.
    #[must_use]
    pub fn profile(&self, archetype: Archetype) -> &ArchetypeProfile {
        match archetype {
            Archetype::Warrior => &self.warrior,
            Archetype::Tank => &self.tank,
            Archetype::Shaman => &self.shaman,
            Archetype::Assassin => &self.assassin,
        }
    }
}

impl Default for EnemyTuning {
    fn default() -> Self {
        Self {
            base_size: 28.0,
            warrior: ArchetypeProfile {
                size_multiplier: 1.0,
                health: 30.0,
                damage: 5.0,
                speed: 80.0,
                experience: 10,
                attack_range: 32.0,
                attack_cooldown: 1.0,
            },
            tank: ArchetypeProfile {
                size_multiplier: 2.0,
                health: 90.0,
                damage: 8.0,
                speed: 40.0,
                experience: 30,
                attack_range: 40.0,
                attack_cooldown: 1.5,
            },
            shaman: ArchetypeProfile {
                size_multiplier: 0.9,
                health: 25.0,
                damage: 7.0,
                speed: 60.0,
                experience: 25,
                attack_range: 200.0,
                attack_cooldown: 2.0,
            },
            assassin: ArchetypeProfile {
                size_multiplier: 0.8,
                health: 21.0,
                damage: 6.0,
                speed: 120.0,
                experience: 20,
                attack_range: 28.0,
                attack_cooldown: 0.7,
            },
            shaman_preferred_distance: 150.0,
            shaman_projectile_speed: 150.0,
            shaman_projectile_cooldown: 2.0,
        }
    }
}

/// Allied unit behavior and flocking parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllyTuning {
    /// Fraction of the source enemy's damage kept on conversion, truncated.
    pub damage_scale: f32,
    /// Center distance beyond which an ally closes on the player.
    pub follow_distance: f32,
    /// Maximum center distance at which an ally acquires an enemy.
    pub detection_range: f32,
    /// Center distance at which ally melee strikes connect.
    pub attack_range: f32,
    /// Seconds between ally melee strikes.
    pub attack_cooldown: f32,
    /// Smoothing factor applied per frame while tracking the player.
    pub follow_smoothing: f32,

    // === Separation ===
    /// Center distance below which allies push each other apart.
    pub separation_radius: f32,
    /// Peak strength of the separation push.
    pub separation_force: f32,

    // === Shaman escorts ===
    /// Seconds between shots from a converted shaman.
    pub shaman_fire_cooldown: f32,
    /// Speed of ally projectiles in world units per second.
    pub shaman_projectile_speed: f32,
}

impl Default for AllyTuning {
    fn default() -> Self {
        Self {
            damage_scale: 0.7,
            follow_distance: 80.0,
            detection_range: 400.0,
            attack_range: 32.0,
            attack_cooldown: 1.2,
            follow_smoothing: 0.08,
            separation_radius: 40.0,
            separation_force: 80.0,
            shaman_fire_cooldown: 2.0,
            shaman_projectile_speed: 150.0,
        }
    }
}

/// Wave pacing, quotas, and spawn placement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveTuning {
    /// Quota of the first wave before growth is applied.
    pub enemies_per_wave: u32,
    /// Multiplier applied to the quota for each subsequent wave.
    pub growth: f32,
    /// Seconds of rest between a wave completing and the next starting.
    pub time_between_waves: f32,
    /// Seconds before the first wave starts.
    pub first_wave_delay: f32,
    /// Seconds between spawn attempts while a wave is in progress.
    pub spawn_interval: f32,
    /// Distance off the playfield edge at which enemies appear.
    pub edge_padding: f32,
    /// Optional cap on how long a wave may run before force-completing.
    pub max_wave_duration: Option<f32>,
}

impl Default for WaveTuning {
    fn default() -> Self {
        Self {
            enemies_per_wave: 5,
            growth: 1.3,
            time_between_waves: 5.0,
            first_wave_delay: 3.0,
            spawn_interval: 0.5,
            edge_padding: 20.0,
            max_wave_duration: None,
        }
    }
}

/// Projectile extent, lifetime, and speed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileTuning {
    /// Side length of every projectile's square body.
    pub size: f32,
    /// Seconds a projectile flies before expiring.
    pub lifetime: f32,
    /// Speed of player projectiles in world units per second.
    pub player_speed: f32,
}

impl Default for ProjectileTuning {
    fn default() -> Self {
        Self {
            size: 8.0,
            lifetime: 3.0,
            player_speed: 400.0,
        }
    }
}

/// Frame pacing and card-offer sizing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionTuning {
    /// Largest frame delta the simulation will integrate, in seconds.
    pub max_frame_delta: f32,
    /// Number of cards presented per level-up offer.
    pub cards_per_offer: u32,
}

impl Default for SessionTuning {
    fn default() -> Self {
        Self {
            max_frame_delta: 0.1,
            cards_per_offer: 3,
        }
    }
}
