//! Save envelopes, hydration and the on-disk save manager.
//!
//! A save is a JSON envelope `{ version, savedAt, checksum, state }`. The
//! checksum is the hex SHA-256 of the serialized state. On load the stored
//! state is merged field by field over a freshly initialized state. A field
//! that is missing or will not deserialize keeps its fresh value and the
//! rest of the save still loads. The absence since `savedAt` is then
//! credited through offline catch-up.

use super::config::GameConfig;
use super::constants::{SAVE_FILE_NAME, SAVE_VERSION};
use super::game_state::{create_initial_state, SimulationState};
use super::offline::{apply_offline_progress, OfflineReport};
use crate::world::exploration::encounter_hex;
use chrono::Utc;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("save file I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("save data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported save version {found} (expected {expected})")]
    Version { found: u32, expected: u32 },

    #[error("save checksum mismatch")]
    Checksum,

    #[error("save envelope has no state")]
    MissingState,

    #[error("could not determine save directory")]
    NoSaveDir,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveEnvelope {
    pub version: u32,
    /// Unix milliseconds.
    #[serde(default)]
    pub saved_at: Option<i64>,
    #[serde(default)]
    pub checksum: String,
    #[serde(default)]
    pub state: Value,
}

/// Where a loaded state came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LoadSource {
    /// No usable save (none stored, or an older version).
    New,
    Save,
    /// The save was unreadable or failed verification.
    Error,
}

#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub state: SimulationState,
    pub offline_report: Option<OfflineReport>,
    pub source: LoadSource,
}

impl LoadOutcome {
    fn fresh(config: &GameConfig, source: LoadSource) -> Self {
        Self {
            state: create_initial_state(config),
            offline_report: None,
            source,
        }
    }
}

/// Hex SHA-256 of a state document.
pub fn state_checksum(state: &Value) -> Result<String, SaveError> {
    let bytes = serde_json::to_vec(state)?;
    let digest = Sha256::digest(&bytes);
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(hex, "{byte:02x}");
    }
    Ok(hex)
}

/// Serializes `state` into a save envelope stamped with `saved_at_ms`.
pub fn encode_save(state: &SimulationState, saved_at_ms: i64) -> Result<String, SaveError> {
    let state = serde_json::to_value(state)?;
    let envelope = SaveEnvelope {
        version: SAVE_VERSION,
        saved_at: Some(saved_at_ms),
        checksum: state_checksum(&state)?,
        state,
    };
    Ok(serde_json::to_string(&envelope)?)
}

/// Verifies an envelope and hydrates its state over fresh defaults.
/// Returns the state and the save timestamp.
pub fn decode_save(raw: &str, config: &GameConfig) -> Result<(SimulationState, Option<i64>), SaveError> {
    let envelope: SaveEnvelope = serde_json::from_str(raw)?;
    if envelope.version != SAVE_VERSION {
        return Err(SaveError::Version {
            found: envelope.version,
            expected: SAVE_VERSION,
        });
    }
    if envelope.state.is_null() {
        return Err(SaveError::MissingState);
    }
    if state_checksum(&envelope.state)? != envelope.checksum {
        return Err(SaveError::Checksum);
    }

    let fresh = serde_json::to_value(create_initial_state(config))?;
    let merged = merge_defined(fresh.clone(), &envelope.state);
    let mut state = hydrate_state(fresh, merged)?;
    reconcile_encounter(&mut state, config);
    Ok((state, envelope.saved_at))
}

fn deserializes(state: &Value) -> bool {
    SimulationState::deserialize(state).is_ok()
}

/// Deserializes `merged`, falling back per field to `fresh` for any value
/// the typed state rejects.
fn hydrate_state(fresh: Value, merged: Value) -> Result<SimulationState, SaveError> {
    if let Ok(state) = SimulationState::deserialize(&merged) {
        return Ok(state);
    }

    let mut hydrated = fresh;
    if let Value::Object(fields) = &merged {
        overlay_fields(&mut hydrated, "", fields);
    }
    Ok(serde_json::from_value(hydrated)?)
}

/// Copies each field of `incoming` into the object at `pointer`, keeping a
/// copy only if the whole state still deserializes. Rejected objects are
/// retried one level down.
fn overlay_fields(root: &mut Value, pointer: &str, incoming: &Map<String, Value>) {
    for (key, value) in incoming {
        if try_set_field(root, pointer, key, value) {
            continue;
        }
        let Value::Object(fields) = value else {
            continue;
        };
        let child = format!("{pointer}/{}", key.replace('~', "~0").replace('/', "~1"));
        if matches!(root.pointer(&child), Some(Value::Object(_))) {
            overlay_fields(root, &child, fields);
        }
    }
}

fn try_set_field(root: &mut Value, pointer: &str, key: &str, value: &Value) -> bool {
    let Some(Value::Object(object)) = root.pointer_mut(pointer) else {
        return false;
    };
    let previous = object.insert(key.to_string(), value.clone());
    if deserializes(root) {
        return true;
    }

    if let Some(Value::Object(object)) = root.pointer_mut(pointer) {
        match previous {
            Some(previous) => object.insert(key.to_string(), previous),
            None => object.remove(key),
        };
    }
    false
}

/// Restores the enemy/position/chain invariants a partially recovered save
/// may have broken.
fn reconcile_encounter(state: &mut SimulationState, config: &GameConfig) {
    if state.enemy.is_none() {
        state.clear_combat();
        state.world.pending_encounters = 0;
    } else if state.battle_positions.enemy_hex.is_none() {
        let positions = &state.battle_positions;
        let hex = encounter_hex(positions.player_hex, state.world.move_direction_index, config);
        state.battle_positions.enemy_hex = Some(hex);
    }
}

/// Overlays `incoming` on `base`, keeping `base` wherever `incoming` is
/// missing or holds a different kind of JSON value.
///
/// Objects merge recursively (extra incoming keys are kept); arrays are
/// replaced whole; a `null` base accepts anything.
pub fn merge_defined(base: Value, incoming: &Value) -> Value {
    match (base, incoming) {
        (Value::Object(base), Value::Object(incoming)) => {
            let mut merged = Map::new();
            for (key, value) in base {
                let next = match incoming.get(&key) {
                    Some(update) => merge_defined(value, update),
                    None => value,
                };
                merged.insert(key, next);
            }
            for (key, value) in incoming {
                if !merged.contains_key(key) && !value.is_null() {
                    merged.insert(key.clone(), value.clone());
                }
            }
            Value::Object(merged)
        }
        (Value::Null, incoming) => incoming.clone(),
        (base, incoming) if same_kind(&base, incoming) => incoming.clone(),
        (base, _) => base,
    }
}

fn same_kind(base: &Value, incoming: &Value) -> bool {
    match (base, incoming) {
        (Value::Bool(_), Value::Bool(_)) => true,
        (Value::String(_), Value::String(_)) => true,
        (Value::Array(_), Value::Array(_)) => true,
        (Value::Number(base), Value::Number(incoming)) => {
            let integral = |n: &serde_json::Number| n.is_u64() || n.is_i64();
            !integral(base) || integral(incoming)
        }
        _ => false,
    }
}

/// Loads a save and credits the time since it was written.
///
/// Never fails: anything unusable yields a fresh state, tagged with why.
pub fn load_game(raw: Option<&str>, now_ms: i64, config: &GameConfig) -> LoadOutcome {
    let Some(raw) = raw else {
        return LoadOutcome::fresh(config, LoadSource::New);
    };

    match decode_save(raw, config) {
        Ok((state, saved_at)) => {
            let elapsed_ms = saved_at.map_or(0, |saved_at| now_ms.saturating_sub(saved_at).max(0));
            let outcome = apply_offline_progress(&state, elapsed_ms as f64, config);
            LoadOutcome {
                state: outcome.state,
                offline_report: outcome.report,
                source: LoadSource::Save,
            }
        }
        Err(err @ (SaveError::Version { .. } | SaveError::MissingState)) => {
            warn!(error = %err, "ignoring save");
            LoadOutcome::fresh(config, LoadSource::New)
        }
        Err(err) => {
            warn!(error = %err, "rejected save");
            LoadOutcome::fresh(config, LoadSource::Error)
        }
    }
}

/// Reads and writes the save file in the per-user config directory.
#[derive(Debug, Clone)]
pub struct SaveManager {
    save_path: PathBuf,
}

impl SaveManager {
    pub fn new() -> Result<Self, SaveError> {
        let project_dirs =
            ProjectDirs::from("", "", "infinity-warrior").ok_or(SaveError::NoSaveDir)?;
        let config_dir = project_dirs.config_dir();
        fs::create_dir_all(config_dir)?;
        Ok(Self {
            save_path: config_dir.join(SAVE_FILE_NAME),
        })
    }

    pub fn at_path(save_path: PathBuf) -> Self {
        Self { save_path }
    }

    pub fn path(&self) -> &Path {
        &self.save_path
    }

    pub fn save_exists(&self) -> bool {
        self.save_path.exists()
    }

    pub fn save(&self, state: &SimulationState) -> Result<(), SaveError> {
        let json = encode_save(state, Utc::now().timestamp_millis())?;
        fs::write(&self.save_path, json)?;
        Ok(())
    }

    pub fn load(&self, config: &GameConfig) -> LoadOutcome {
        let now_ms = Utc::now().timestamp_millis();
        match fs::read_to_string(&self.save_path) {
            Ok(raw) => load_game(Some(&raw), now_ms, config),
            Err(err) if err.kind() == io::ErrorKind::NotFound => load_game(None, now_ms, config),
            Err(err) => {
                warn!(error = %err, path = %self.save_path.display(), "could not read save");
                LoadOutcome::fresh(config, LoadSource::Error)
            }
        }
    }
}
