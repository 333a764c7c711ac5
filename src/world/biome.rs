//! Radial biome banding with a directional skew.

use super::hex::{distance, Hex};
use crate::core::config::WorldConfig;
use crate::core::constants::{UNKNOWN_BIOME_COLOR, UNKNOWN_BIOME_KEY};
use serde::{Deserialize, Serialize};

/// A world region. Colour fields are opaque to the engine and only passed
/// through to whoever renders the map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Biome {
    pub key: String,
    pub name: String,
    pub enemy_color: String,
    pub tile_color: String,
}

impl Default for Biome {
    fn default() -> Self {
        Self::unknown()
    }
}

impl Biome {
    pub fn new(key: &str, name: &str, enemy_color: &str, tile_color: &str) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            enemy_color: enemy_color.to_string(),
            tile_color: tile_color.to_string(),
        }
    }

    /// Placeholder used when no biomes are configured.
    pub fn unknown() -> Self {
        Self::new(
            UNKNOWN_BIOME_KEY,
            "Unknown",
            UNKNOWN_BIOME_COLOR,
            UNKNOWN_BIOME_COLOR,
        )
    }

    pub fn default_list() -> Vec<Biome> {
        vec![
            Biome::new("verdant", "Verdant Reach", "#84cc16", "#1a2e12"),
            Biome::new("ashen", "Ashen Wastes", "#f97316", "#2b1a12"),
            Biome::new("frost", "Frostbound Steppe", "#38bdf8", "#12222e"),
            Biome::new("mire", "Sunken Mire", "#a3a635", "#1c2418"),
            Biome::new("void", "Voidscar", "#c084fc", "#1d1230"),
        ]
    }
}

/// Index into the biome list for a hex, or `None` with no biomes.
pub fn region_index(hex: Hex, band_size: i32, biome_count: usize) -> Option<usize> {
    if biome_count == 0 {
        return None;
    }

    let band_size = band_size.max(1) as i64;
    let radial = distance(hex, Hex::ORIGIN) as i64 / band_size;
    let directional_shift = (2 * hex.q as i64 + hex.r as i64).div_euclid(band_size);
    let band_index = radial + directional_shift;

    Some(band_index.rem_euclid(biome_count as i64) as usize)
}

/// The biome a hex belongs to.
pub fn world_region(hex: Hex, config: &WorldConfig) -> Biome {
    region_index(hex, config.biome_band_size, config.biomes.len())
        .map(|index| config.biomes[index].clone())
        .unwrap_or_else(Biome::unknown)
}
