// Movement
pub const HEADING_WANDER_CHANCE: f64 = 0.2;
pub const HEX_DIRECTION_COUNT: usize = 6;

// Fixed-step driver: a single frame never feeds more than this into the accumulator
pub const MAX_FRAME_MS: f64 = 100.0;

// Offline catch-up
pub const MIN_OFFLINE_MS: f64 = 1000.0;
pub const MS_PER_HOUR: f64 = 60.0 * 60.0 * 1000.0;

// Save system
pub const SAVE_VERSION: u32 = 1;
pub const SAVE_FILE_NAME: &str = "save.json";

// Starting cultivation split (body, mind, spirit)
pub const DEFAULT_FLOW_RATES: (f64, f64, f64) = (0.34, 0.33, 0.33);

// Fallback descriptors when the configured tables are empty
pub const UNKNOWN_BIOME_KEY: &str = "unknown";
pub const UNKNOWN_BIOME_COLOR: &str = "#f97316";
pub const FALLBACK_RARITY_KEY: &str = "common";
