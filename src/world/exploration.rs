//! Walking the hex grid: forward movement, reveals, encounter spawns and
//! closing the distance once an enemy is on the board.

use super::biome::world_region;
use super::hex::{direction, distance, neighbor, step_toward, Hex};
use crate::combat::logic::{create_enemy, roll_rarity};
use crate::core::config::{GameConfig, WorldConfig};
use crate::core::constants::{HEADING_WANDER_CHANCE, HEX_DIRECTION_COUNT};
use crate::core::game_state::{ActivityMode, BattlePositions, SimulationState};
use crate::core::tick::TickEvent;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Why an enemy appeared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SpawnReason {
    /// A reveal roll succeeded.
    Reveal,
    /// Next enemy of a chain encounter after a victory.
    Chain,
    /// The miss streak reached the guarantee threshold.
    Guarantee,
}

fn clamp_chance(chance: f64, cap: f64) -> f64 {
    if chance.is_nan() {
        return 0.0;
    }
    chance.min(cap).max(0.0)
}

/// Reveal spawn chance after `miss_streak` consecutive misses.
pub fn spawn_chance(miss_streak: u32, world: &WorldConfig) -> f64 {
    clamp_chance(
        world.reveal_spawn_chance_base + miss_streak as f64 * world.reveal_spawn_chance_miss_increment,
        world.reveal_spawn_chance_cap,
    )
}

/// Chance that a chain encounter continues after a victory.
pub fn chain_spawn_chance(world: &WorldConfig) -> f64 {
    clamp_chance(world.reveal_spawn_chance_base, world.reveal_spawn_chance_cap)
}

/// Enemies in one encounter started at `travel_depth`.
pub fn encounter_count(travel_depth: u32, world: &WorldConfig) -> u32 {
    world.consecutive_enemies_base + travel_depth / world.consecutive_enemies_depth_step.max(1)
}

fn guarantee_reached(miss_streak: u32, world: &WorldConfig) -> bool {
    world.reveal_spawn_guarantee_misses > 0 && miss_streak >= world.reveal_spawn_guarantee_misses
}

fn within_range(a: Hex, b: Hex, range: i32) -> bool {
    distance(a, b) as i64 <= range as i64
}

/// Where a new enemy stands: ahead of the player along the heading.
pub fn encounter_hex(player_hex: Hex, heading: usize, config: &GameConfig) -> Hex {
    let combat = &config.combat;
    let gap = combat
        .effective_range_hex
        .saturating_add(1)
        .max(combat.starting_hex_gap);
    player_hex.offset(direction(heading), gap)
}

/// Places a fresh enemy ahead of the player and resets the attack timers.
pub fn spawn_encounter(
    state: &mut SimulationState,
    config: &GameConfig,
    reason: SpawnReason,
    rng: &mut impl Rng,
) -> TickEvent {
    let enemy_hex = encounter_hex(
        state.battle_positions.player_hex,
        state.world.move_direction_index,
        config,
    );
    let encounter_distance = distance(enemy_hex, Hex::ORIGIN).max(1);
    let biome = world_region(enemy_hex, &config.world);
    let rarity = roll_rarity(&config.combat.rarity_tiers, rng);
    let enemy = create_enemy(
        encounter_distance,
        state.world.travel_depth.max(1),
        biome,
        rarity,
        config,
    );

    debug!(
        ?reason,
        depth = state.world.travel_depth,
        distance = encounter_distance,
        rarity = %enemy.rarity.key,
        biome = %enemy.biome.key,
        pending = state.world.pending_encounters,
        "enemy spawned"
    );

    let event = TickEvent::SpawnEnemy {
        reason,
        depth: state.world.travel_depth,
        distance: encounter_distance,
        pending_encounters: state.world.pending_encounters,
        rarity: enemy.rarity.key.clone(),
        biome: enemy.biome.key.clone(),
        enemy_hex,
    };

    state.enemy = Some(enemy);
    state.battle_positions.enemy_hex = Some(enemy_hex);
    state.combat_timers.reset();
    event
}

/// Rolls for the next enemy of a chain. A miss ends the chain and clears
/// the board.
pub fn try_chain_spawn(state: &mut SimulationState, config: &GameConfig, rng: &mut impl Rng) -> TickEvent {
    let chance = chain_spawn_chance(&config.world);
    if rng.gen::<f64>() < chance {
        return spawn_encounter(state, config, SpawnReason::Chain, rng);
    }

    debug!(depth = state.world.travel_depth, chance, "chain spawn missed");
    state.world.pending_encounters = 0;
    state.clear_combat();
    TickEvent::ChainSpawnMiss {
        depth: state.world.travel_depth,
        spawn_chance: chance,
    }
}

/// One closing step: the player moves first, the enemy only if still out
/// of range.
pub fn close_distance(positions: &mut BattlePositions, range: i32) {
    let Some(enemy_hex) = positions.enemy_hex else {
        return;
    };
    if within_range(positions.player_hex, enemy_hex, range) {
        return;
    }

    positions.player_hex = step_toward(positions.player_hex, enemy_hex);
    if !within_range(positions.player_hex, enemy_hex, range) {
        positions.enemy_hex = Some(step_toward(enemy_hex, positions.player_hex));
    }
}

/// Advances one hex along the heading, occasionally wandering off it.
pub fn move_forward(state: &mut SimulationState, rng: &mut impl Rng) {
    let mut heading = state.world.move_direction_index % HEX_DIRECTION_COUNT;
    state.battle_positions.player_hex = neighbor(state.battle_positions.player_hex, heading);

    if rng.gen::<f64>() < HEADING_WANDER_CHANCE {
        heading = (heading + rng.gen_range(1..=2usize)) % HEX_DIRECTION_COUNT;
    }
    state.world.move_direction_index = heading;
}

/// Reveals the hex the player now stands on and rolls for an encounter.
pub fn reveal_next_hex(
    state: &mut SimulationState,
    config: &GameConfig,
    rng: &mut impl Rng,
    events: &mut Vec<TickEvent>,
) {
    let world = &mut state.world;
    world.revealed_hexes += 1;
    world.travel_depth = distance(state.battle_positions.player_hex, Hex::ORIGIN);
    world.best_depth = world.best_depth.max(world.travel_depth);

    let depth = world.travel_depth;
    let chance = spawn_chance(world.spawn_miss_streak, &config.world);
    let reason = if guarantee_reached(world.spawn_miss_streak, &config.world) {
        Some(SpawnReason::Guarantee)
    } else if rng.gen::<f64>() < chance {
        Some(SpawnReason::Reveal)
    } else {
        None
    };

    match reason {
        Some(reason) => {
            world.spawn_miss_streak = 0;
            world.pending_encounters = encounter_count(depth, &config.world).saturating_sub(1);
            events.push(spawn_encounter(state, config, reason, rng));
            events.push(TickEvent::RevealHex {
                spawned: true,
                depth,
                spawn_chance: chance,
            });
        }
        None => {
            world.spawn_miss_streak = world.spawn_miss_streak.saturating_add(1);
            events.push(TickEvent::RevealHex {
                spawned: false,
                depth,
                spawn_chance: chance,
            });
        }
    }
}

/// Movement phase of a tick.
///
/// Cultivating with the board empty freezes movement entirely. Otherwise
/// every whole movement interval either closes on the current enemy or,
/// in battle mode with no enemy, steps forward and reveals a hex.
pub fn tick_movement(
    state: &mut SimulationState,
    dt_ms: f64,
    config: &GameConfig,
    rng: &mut impl Rng,
    events: &mut Vec<TickEvent>,
) {
    let exploring = state.activity_mode == ActivityMode::Battle;
    if !exploring && state.enemy.is_none() {
        return;
    }

    let interval = config.combat.movement_interval_ms.max(1.0);
    state.battle_positions.movement_ms += dt_ms;

    while state.battle_positions.movement_ms >= interval {
        state.battle_positions.movement_ms -= interval;
        if state.enemy.is_some() {
            close_distance(&mut state.battle_positions, config.combat.effective_range_hex);
        } else if exploring {
            move_forward(state, rng);
            reveal_next_hex(state, config, rng, events);
        }
    }
}
