use crate::core::constants::FALLBACK_RARITY_KEY;
use crate::world::biome::Biome;
use serde::{Deserialize, Serialize};

/// One row of the rarity table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RarityTier {
    pub key: String,
    pub name: String,
    /// Probability mass of this tier; walked cumulatively in table order.
    pub chance: f64,
    pub hp: f64,
    pub attack: f64,
    pub essence: f64,
    /// Display tint, passed through untouched.
    pub color: String,
}

impl Default for RarityTier {
    fn default() -> Self {
        Self::new(FALLBACK_RARITY_KEY, "Common", 1.0, (1.0, 1.0, 1.0), "#e5e7eb")
    }
}

impl RarityTier {
    pub fn new(
        key: &str,
        name: &str,
        chance: f64,
        (hp, attack, essence): (f64, f64, f64),
        color: &str,
    ) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            chance,
            hp,
            attack,
            essence,
            color: color.to_string(),
        }
    }

    pub fn default_table() -> Vec<RarityTier> {
        vec![
            RarityTier::new("common", "Common", 0.60, (1.0, 1.0, 1.0), "#e5e7eb"),
            RarityTier::new("uncommon", "Uncommon", 0.25, (1.3, 1.15, 1.5), "#4ade80"),
            RarityTier::new("rare", "Rare", 0.10, (1.7, 1.35, 2.2), "#60a5fa"),
            RarityTier::new("epic", "Epic", 0.04, (2.4, 1.7, 3.5), "#c084fc"),
            RarityTier::new("legendary", "Legendary", 0.01, (3.5, 2.2, 6.0), "#fbbf24"),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enemy {
    pub hp: f64,
    pub max_hp: f64,
    pub attack: f64,
    pub biome: Biome,
    pub rarity: RarityTier,
    /// Hex distance from the origin where the enemy spawned (≥ 1).
    pub distance: u32,
}

impl Enemy {
    pub fn is_alive(&self) -> bool {
        self.hp > 0.0
    }

    pub fn take_damage(&mut self, amount: f64) {
        self.hp = (self.hp - amount).max(0.0);
    }
}

/// Interval accumulators for the two attackers.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CombatTimers {
    pub player_ms: f64,
    pub enemy_ms: f64,
}

impl CombatTimers {
    pub fn reset(&mut self) {
        self.player_ms = 0.0;
        self.enemy_ms = 0.0;
    }
}
