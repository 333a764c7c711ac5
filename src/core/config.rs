//! Balance configuration consumed by every engine call.
//!
//! The engine never reads configuration from a global; callers build a
//! [`GameConfig`] once (usually [`GameConfig::default`], optionally with a
//! partial JSON override on top) and pass `&GameConfig` into each call.
//!
//! Every section is `#[serde(default)]`, so an override document only has
//! to name the fields it changes:
//!
//! ```
//! use infinity_warrior::core::config::GameConfig;
//!
//! let config = GameConfig::from_json_str(r#"{ "combat": { "minDamage": 3 } }"#).unwrap();
//! assert_eq!(config.combat.min_damage, 3.0);
//! assert_eq!(config.combat.effective_range_hex, 1);
//! ```

use crate::combat::types::RarityTier;
use crate::world::biome::Biome;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Reasons a configuration document is rejected.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    #[error("rarity tier chances must sum to a positive value")]
    EmptyRarityTable,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameConfig {
    pub timing: TimingConfig,
    pub progression: ProgressionConfig,
    pub combat: CombatConfig,
    pub rewards: RewardsConfig,
    pub cultivation: CultivationConfig,
    pub persistence: PersistenceConfig,
    pub world: WorldConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TimingConfig {
    pub simulation_dt_ms: f64,
    pub autosave_ms: f64,
    pub offline_cap_hours: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            simulation_dt_ms: 100.0,
            autosave_ms: 10_000.0,
            offline_cap_hours: 8.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProgressionConfig {
    pub strength_xp_per_damage: f64,
    pub endurance_xp_per_damage: f64,
    pub strength_xp_boost_per_prestige_level: f64,
    pub endurance_xp_boost_per_prestige_level: f64,
    pub run_xp_base: f64,
    pub run_xp_growth_rate: f64,
    pub prestige_xp_base: f64,
    pub prestige_xp_growth_rate: f64,
    /// Fraction of run XP from combat that also feeds the prestige track.
    pub strength_prestige_gain: f64,
    pub endurance_prestige_gain: f64,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            strength_xp_per_damage: 1.0,
            endurance_xp_per_damage: 1.0,
            strength_xp_boost_per_prestige_level: 0.02,
            endurance_xp_boost_per_prestige_level: 0.02,
            run_xp_base: 20.0,
            run_xp_growth_rate: 0.15,
            prestige_xp_base: 120.0,
            prestige_xp_growth_rate: 0.25,
            strength_prestige_gain: 0.08,
            endurance_prestige_gain: 0.08,
        }
    }
}

/// Per-biome enemy stat multipliers. Omitted multipliers stay neutral.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BiomeModifier {
    pub hp: f64,
    pub attack: f64,
}

impl Default for BiomeModifier {
    fn default() -> Self {
        Self {
            hp: 1.0,
            attack: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CombatConfig {
    pub player_attack_interval_ms: f64,
    pub enemy_attack_interval_ms: f64,
    pub min_attack_interval_ms: f64,
    pub movement_interval_ms: f64,
    pub starting_hex_gap: i32,
    pub effective_range_hex: i32,
    pub player_base_attack: f64,
    pub strength_attack_per_level: f64,
    pub strength_attack_growth_rate: f64,
    pub player_base_hp: f64,
    pub endurance_hp_per_level: f64,
    pub endurance_hp_growth_rate: f64,
    pub enemy_hp_base: f64,
    pub enemy_hp_log_factor: f64,
    pub enemy_hp_depth_factor: f64,
    pub enemy_hp_exp: f64,
    pub enemy_attack_base: f64,
    pub enemy_attack_log_factor: f64,
    pub enemy_attack_depth_factor: f64,
    pub enemy_attack_exp: f64,
    pub min_damage: f64,
    /// Keyed by [`Biome::key`]. Missing biomes use 1.0/1.0.
    pub biome_modifiers: BTreeMap<String, BiomeModifier>,
    /// Ordered most common first; chances are walked cumulatively.
    pub rarity_tiers: Vec<RarityTier>,
}

impl Default for CombatConfig {
    fn default() -> Self {
        let biome_modifiers = [
            ("verdant", 1.0, 1.0),
            ("ashen", 1.1, 1.15),
            ("frost", 1.25, 0.95),
            ("mire", 1.35, 1.05),
            ("void", 1.5, 1.3),
        ]
        .into_iter()
        .map(|(key, hp, attack)| (key.to_string(), BiomeModifier { hp, attack }))
        .collect();

        Self {
            player_attack_interval_ms: 650.0,
            enemy_attack_interval_ms: 950.0,
            min_attack_interval_ms: 180.0,
            movement_interval_ms: 280.0,
            starting_hex_gap: 8,
            effective_range_hex: 1,
            player_base_attack: 6.0,
            strength_attack_per_level: 1.6,
            strength_attack_growth_rate: 0.035,
            player_base_hp: 90.0,
            endurance_hp_per_level: 13.0,
            endurance_hp_growth_rate: 0.03,
            enemy_hp_base: 30.0,
            enemy_hp_log_factor: 0.55,
            enemy_hp_depth_factor: 0.06,
            enemy_hp_exp: 1.35,
            enemy_attack_base: 4.0,
            enemy_attack_log_factor: 1.1,
            enemy_attack_depth_factor: 0.12,
            enemy_attack_exp: 1.18,
            min_damage: 1.0,
            biome_modifiers,
            rarity_tiers: RarityTier::default_table(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RewardsConfig {
    pub essence_base: f64,
    pub essence_exp: f64,
}

impl Default for RewardsConfig {
    fn default() -> Self {
        Self {
            essence_base: 10.0,
            essence_exp: 1.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CultivationConfig {
    pub body_essence_base: f64,
    pub body_essence_exp: f64,
    pub mind_essence_base: f64,
    pub mind_essence_exp: f64,
    pub spirit_essence_base: f64,
    pub spirit_essence_exp: f64,
    pub max_flow_essence_per_second: f64,
    pub essence_xp_boost_per_prestige_level: f64,
    /// Share of channeled cultivation XP credited to the prestige track.
    /// Read by both the live flow and offline catch-up.
    pub cultivation_prestige_gain: f64,
    pub hp_regen_base_per_second: f64,
    pub hp_regen_per_body_level: f64,
    pub hp_regen_body_growth_rate: f64,
    pub mind_speed_log_factor: f64,
    pub mind_speed_per_level: f64,
    pub max_attack_speed_multiplier: f64,
    pub ki_max_base: f64,
    pub ki_max_per_spirit_level: f64,
    pub ki_spirit_growth_rate: f64,
    pub ki_base_regen_per_second: f64,
    pub ki_regen_per_spirit_level: f64,
}

impl Default for CultivationConfig {
    fn default() -> Self {
        Self {
            body_essence_base: 25.0,
            body_essence_exp: 1.6,
            mind_essence_base: 30.0,
            mind_essence_exp: 1.65,
            spirit_essence_base: 28.0,
            spirit_essence_exp: 1.6,
            max_flow_essence_per_second: 6.0,
            essence_xp_boost_per_prestige_level: 0.05,
            cultivation_prestige_gain: 1.0,
            hp_regen_base_per_second: 0.6,
            hp_regen_per_body_level: 0.35,
            hp_regen_body_growth_rate: 0.04,
            mind_speed_log_factor: 0.22,
            mind_speed_per_level: 0.01,
            max_attack_speed_multiplier: 2.5,
            ki_max_base: 10.0,
            ki_max_per_spirit_level: 4.0,
            ki_spirit_growth_rate: 0.04,
            ki_base_regen_per_second: 0.2,
            ki_regen_per_spirit_level: 0.002,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PersistenceConfig {
    pub offline_essence_per_second_base: f64,
    pub offline_essence_per_best_depth: f64,
    pub offline_essence_per_prestige_level: f64,
    pub offline_flow_efficiency: f64,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            offline_essence_per_second_base: 0.5,
            offline_essence_per_best_depth: 0.04,
            offline_essence_per_prestige_level: 0.1,
            offline_flow_efficiency: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorldConfig {
    pub biome_band_size: i32,
    pub reveal_spawn_chance_base: f64,
    pub reveal_spawn_chance_miss_increment: f64,
    pub reveal_spawn_chance_cap: f64,
    /// A reveal after this many consecutive misses always spawns.
    pub reveal_spawn_guarantee_misses: u32,
    pub consecutive_enemies_base: u32,
    pub consecutive_enemies_depth_step: u32,
    pub biomes: Vec<Biome>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            biome_band_size: 8,
            reveal_spawn_chance_base: 0.25,
            reveal_spawn_chance_miss_increment: 0.075,
            reveal_spawn_chance_cap: 0.9,
            reveal_spawn_guarantee_misses: 12,
            consecutive_enemies_base: 1,
            consecutive_enemies_depth_step: 10,
            biomes: Biome::default_list(),
        }
    }
}

impl GameConfig {
    /// Parses a (possibly partial) JSON override on top of the defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a JSON override file from disk.
    pub fn from_json_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Rejects values that would stall the fixed-step loop or divide by zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("timing.simulationDtMs", self.timing.simulation_dt_ms),
            (
                "combat.playerAttackIntervalMs",
                self.combat.player_attack_interval_ms,
            ),
            (
                "combat.enemyAttackIntervalMs",
                self.combat.enemy_attack_interval_ms,
            ),
            ("combat.minAttackIntervalMs", self.combat.min_attack_interval_ms),
            ("combat.movementIntervalMs", self.combat.movement_interval_ms),
            ("world.biomeBandSize", self.world.biome_band_size as f64),
            (
                "cultivation.maxAttackSpeedMultiplier",
                self.cultivation.max_attack_speed_multiplier,
            ),
        ];
        for (field, value) in positive {
            if !(value > 0.0) {
                return Err(ConfigError::NonPositive { field, value });
            }
        }

        let total_chance: f64 = self
            .combat
            .rarity_tiers
            .iter()
            .map(|tier| tier.chance.max(0.0))
            .sum();
        if !(total_chance > 0.0) {
            return Err(ConfigError::EmptyRarityTable);
        }

        Ok(())
    }

    /// Modifier for a biome key, defaulting to neutral.
    pub fn biome_modifier(&self, biome_key: &str) -> BiomeModifier {
        self.combat
            .biome_modifiers
            .get(biome_key)
            .copied()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(GameConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_override_keeps_other_defaults() {
        let config = GameConfig::from_json_str(
            r#"{ "world": { "revealSpawnChanceBase": 0.5 }, "timing": { "offlineCapHours": 2 } }"#,
        )
        .expect("partial override should parse");

        assert_eq!(config.world.reveal_spawn_chance_base, 0.5);
        assert_eq!(config.world.reveal_spawn_chance_cap, 0.9);
        assert_eq!(config.timing.offline_cap_hours, 2.0);
        assert_eq!(config.timing.simulation_dt_ms, 100.0);
        assert_eq!(config.world.biomes.len(), Biome::default_list().len());
    }

    #[test]
    fn test_zero_tick_size_rejected() {
        let err = GameConfig::from_json_str(r#"{ "timing": { "simulationDtMs": 0 } }"#)
            .expect_err("zero dt must be rejected");
        assert!(matches!(
            err,
            ConfigError::NonPositive {
                field: "timing.simulationDtMs",
                ..
            }
        ));
    }

    #[test]
    fn test_empty_rarity_table_rejected() {
        let err = GameConfig::from_json_str(r#"{ "combat": { "rarityTiers": [] } }"#)
            .expect_err("empty rarity table must be rejected");
        assert!(matches!(err, ConfigError::EmptyRarityTable));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = GameConfig::from_json_str("{ not json").expect_err("should fail");
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_unknown_biome_modifier_is_neutral() {
        let config = GameConfig::default();
        assert_eq!(config.biome_modifier("nowhere"), BiomeModifier::default());
        assert_eq!(config.biome_modifier("void").hp, 1.5);
    }

    #[test]
    fn test_partial_biome_modifier_fills_neutral() {
        let config = GameConfig::from_json_str(
            r#"{ "combat": { "biomeModifiers": { "ashen": { "hp": 1.2 } } } }"#,
        )
        .expect("partial biome modifier should parse");

        let ashen = config.biome_modifier("ashen");
        assert_eq!(ashen.hp, 1.2);
        assert_eq!(ashen.attack, 1.0);
    }
}
