//! The per-tick orchestration function.
//!
//! [`tick`] advances a [`SimulationState`] by `dt_ms` and returns the new
//! state together with every [`TickEvent`] it produced, in order. The
//! presentation layer maps events to log lines and effects; the engine
//! never touches presentation types.
//!
//! Phase order inside one tick:
//! 1. movement, reveals and spawns
//! 2. combat timers (at most one attack per side)
//! 3. outcome: defeat first, then victory
//! 4. HP and Ki regeneration, cultivation flow
//! 5. level-up drains and high-water marks

use crate::character::cultivation::process_cultivation_flow;
use crate::character::derived_stats::{hp_regen_per_second, ki_regen_per_second, max_hp, max_ki};
use crate::character::progression::{resolve_level_ups, update_highest_levels};
use crate::combat::logic::{encounter_outcome, essence_reward, tick_combat, EncounterOutcome};
use crate::core::config::GameConfig;
use crate::core::game_state::{BattlePositions, SimulationState, Stat};
use crate::world::exploration::{tick_movement, try_chain_spawn, SpawnReason};
use crate::world::hex::Hex;
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info};

/// A single event produced by a tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum TickEvent {
    // ── Combat ──────────────────────────────────────────────────
    PlayerHit {
        damage: f64,
        strength_xp_gain: f64,
        strength_prestige_xp_gain: f64,
        enemy_hp: f64,
    },

    EnemyHit {
        damage: f64,
        endurance_xp_gain: f64,
        endurance_prestige_xp_gain: f64,
        player_hp: f64,
    },

    Victory {
        reward: f64,
        depth: u32,
        distance: u32,
        rarity: String,
    },

    /// The run ended; the next life starts at the origin.
    Defeat {
        depth: u32,
        best_depth: u32,
        total_deaths: u64,
    },

    // ── Exploration ─────────────────────────────────────────────
    RevealHex {
        spawned: bool,
        depth: u32,
        spawn_chance: f64,
    },

    SpawnEnemy {
        reason: SpawnReason,
        depth: u32,
        distance: u32,
        pending_encounters: u32,
        rarity: String,
        biome: String,
        enemy_hex: Hex,
    },

    /// A chain encounter ended early.
    ChainSpawnMiss { depth: u32, spawn_chance: f64 },

    // ── Progression ─────────────────────────────────────────────
    LevelUp { stat: Stat, level: u32 },

    PrestigeLevelUp { stat: Stat, level: u32 },
}

/// New state plus the events that produced it.
#[derive(Debug, Clone)]
pub struct TickResult {
    pub state: SimulationState,
    pub events: Vec<TickEvent>,
}

/// Advances the simulation by `dt_ms`.
///
/// A non-finite or non-positive `dt_ms` returns an identical state and no
/// events.
pub fn tick(state: &SimulationState, dt_ms: f64, config: &GameConfig, rng: &mut impl Rng) -> TickResult {
    let mut next = state.clone();
    let mut events = Vec::new();

    if !dt_ms.is_finite() || dt_ms <= 0.0 {
        return TickResult {
            state: next,
            events,
        };
    }

    tick_movement(&mut next, dt_ms, config, rng, &mut events);
    events.extend(tick_combat(&mut next, dt_ms, config));

    match encounter_outcome(&next) {
        Some(EncounterOutcome::Defeat) => events.push(apply_defeat(&mut next, config)),
        Some(EncounterOutcome::Victory) => apply_victory(&mut next, config, rng, &mut events),
        None => {}
    }

    apply_regen(&mut next, dt_ms, config);
    process_cultivation_flow(&mut next, dt_ms, config);

    events.extend(resolve_level_ups(
        &mut next.run,
        &mut next.persistent,
        &mut next.statistics,
        config,
    ));
    update_highest_levels(&mut next.statistics, &next.run, &next.persistent);

    next.elapsed_ms += dt_ms;
    TickResult {
        state: next,
        events,
    }
}

/// Pays out the kill, then either chains into the next enemy or clears
/// the board.
fn apply_victory(
    state: &mut SimulationState,
    config: &GameConfig,
    rng: &mut impl Rng,
    events: &mut Vec<TickEvent>,
) {
    let Some(enemy) = state.enemy.as_ref() else {
        return;
    };
    let reward = essence_reward(enemy.distance, &enemy.rarity, config);
    let distance = enemy.distance;
    let rarity = enemy.rarity.key.clone();

    state.resources.essence += reward;
    debug!(reward, distance, rarity = %rarity, "enemy defeated");
    events.push(TickEvent::Victory {
        reward,
        depth: state.world.travel_depth,
        distance,
        rarity: rarity.clone(),
    });

    if state.world.pending_encounters > 0 {
        state.world.pending_encounters -= 1;
        events.push(try_chain_spawn(state, config, rng));
    } else {
        state.clear_combat();
    }

    state.run.hp = (state.run.hp + hp_regen_per_second(&state.run, config)).min(max_hp(&state.run, config));
    state.statistics.record_enemy_defeated(&rarity);
}

/// Ends the run. Cultivation prestige, combat prestige, best depth and
/// statistics survive; everything else restarts.
fn apply_defeat(state: &mut SimulationState, config: &GameConfig) -> TickEvent {
    let depth = state.world.travel_depth;

    state.run = state.run.next_life();
    state.run.hp = max_hp(&state.run, config);
    state.world = state.world.after_defeat();
    state.unlocks.cultivation = true;
    state.clear_combat();
    state.battle_positions = BattlePositions::default();
    state.statistics.total_deaths += 1;

    info!(
        depth,
        best_depth = state.world.best_depth,
        total_deaths = state.statistics.total_deaths,
        "player defeated"
    );

    TickEvent::Defeat {
        depth,
        best_depth: state.world.best_depth,
        total_deaths: state.statistics.total_deaths,
    }
}

fn apply_regen(state: &mut SimulationState, dt_ms: f64, config: &GameConfig) {
    if state.run.hp <= 0.0 {
        return;
    }
    let seconds = dt_ms / 1000.0;
    let run = &state.run;
    let hp = (run.hp + hp_regen_per_second(run, config) * seconds).min(max_hp(run, config));
    let ki = (run.ki + ki_regen_per_second(run, config) * seconds).min(max_ki(run, config));
    state.run.hp = hp.max(0.0);
    state.run.ki = ki.max(0.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::logic::create_enemy;
    use crate::combat::types::RarityTier;
    use crate::core::game_state::{create_initial_state, ActivityMode, Track};
    use crate::world::biome::Biome;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn test_rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    fn engaged(config: &GameConfig, gap: i32) -> SimulationState {
        let mut state = create_initial_state(config);
        state.enemy = Some(create_enemy(5, 5, Biome::unknown(), RarityTier::default(), config));
        state.battle_positions.enemy_hex = Some(Hex::new(gap, 0));
        state
    }

    fn chain_config(chance: f64) -> GameConfig {
        let mut config = GameConfig::default();
        config.world.reveal_spawn_chance_base = chance;
        config.world.reveal_spawn_chance_cap = 1.0;
        config
    }

    #[test]
    fn test_zero_dt_is_a_no_op() {
        let config = GameConfig::default();
        let state = engaged(&config, 1);
        for dt in [0.0, -50.0, f64::NAN, f64::INFINITY] {
            let result = tick(&state, dt, &config, &mut test_rng());
            assert_eq!(result.state, state);
            assert!(result.events.is_empty());
        }
    }

    #[test]
    fn test_elapsed_time_accumulates() {
        let config = GameConfig::default();
        let state = create_initial_state(&config);
        let result = tick(&state, 100.0, &config, &mut test_rng());
        assert_eq!(result.state.elapsed_ms, 100.0);
    }

    #[test]
    fn test_out_of_range_enemy_never_fights() {
        let mut config = GameConfig::default();
        config.combat.movement_interval_ms = 1_000_000.0;
        let mut state = engaged(&config, 2);

        for _ in 0..50 {
            let result = tick(&state, 100.0, &config, &mut test_rng());
            assert!(!result.events.iter().any(|e| matches!(
                e,
                TickEvent::PlayerHit { .. } | TickEvent::EnemyHit { .. }
            )));
            assert_eq!(result.state.combat_timers.player_ms, 0.0);
            assert_eq!(result.state.combat_timers.enemy_ms, 0.0);
            state = result.state;
        }
    }

    #[test]
    fn test_defeat_resets_run_but_keeps_prestige() {
        let config = GameConfig::default();
        let mut state = engaged(&config, 1);
        state.run.hp = 1.0;
        state.run.body.progress = Track { level: 4, xp: 2.0 };
        state.run.body.prestige = Track { level: 3, xp: 5.0 };
        state.persistent.strength_prestige.level = 2;
        state.world.travel_depth = 12;
        state.world.best_depth = 15;
        state.resources.essence = 40.0;
        state.combat_timers.enemy_ms = config.combat.enemy_attack_interval_ms - 1.0;

        let result = tick(&state, 1.0, &config, &mut test_rng());
        let next = &result.state;

        assert!(result.events.iter().any(|e| matches!(
            e,
            TickEvent::Defeat {
                depth: 12,
                best_depth: 15,
                total_deaths: 1
            }
        )));
        assert_eq!(next.run.body.prestige.level, 3);
        assert_eq!(next.run.body.progress.level, 0);
        assert_eq!(next.persistent.strength_prestige.level, 2);
        assert!(next.unlocks.cultivation);
        assert_eq!(next.world.travel_depth, 0);
        assert_eq!(next.world.best_depth, 15);
        assert_eq!(next.run.hp, max_hp(&next.run, &config));
        assert!(next.enemy.is_none());
        assert_eq!(next.battle_positions.player_hex, Hex::ORIGIN);
        assert_eq!(next.resources.essence, 40.0);
        assert_eq!(next.statistics.total_deaths, 1);
    }

    #[test]
    fn test_victory_pays_essence_and_clears_board() {
        let config = GameConfig::default();
        let mut state = engaged(&config, 1);
        if let Some(enemy) = state.enemy.as_mut() {
            enemy.hp = 1.0;
        }
        state.combat_timers.player_ms = config.combat.player_attack_interval_ms;

        let result = tick(&state, 1.0, &config, &mut test_rng());
        let next = &result.state;
        let expected = essence_reward(5, &RarityTier::default(), &config);

        assert_eq!(next.resources.essence, expected);
        assert!(next.enemy.is_none());
        assert!(next.battle_positions.enemy_hex.is_none());
        assert_eq!(next.statistics.total_enemies_defeated, 1);
        assert_eq!(next.statistics.enemies_defeated_by_rarity["common"], 1);
        assert!(result
            .events
            .iter()
            .any(|e| matches!(e, TickEvent::Victory { distance: 5, .. })));
    }

    #[test]
    fn test_victory_chains_into_next_enemy() {
        let config = chain_config(1.0);
        let mut state = engaged(&config, 1);
        state.world.pending_encounters = 2;
        if let Some(enemy) = state.enemy.as_mut() {
            enemy.hp = 1.0;
        }
        state.combat_timers.player_ms = config.combat.player_attack_interval_ms;

        let result = tick(&state, 1.0, &config, &mut test_rng());
        let next = &result.state;

        assert_eq!(next.world.pending_encounters, 1);
        let enemy = next.enemy.as_ref().expect("chain spawned a new enemy");
        assert_eq!(enemy.hp, enemy.max_hp);
        assert_eq!(next.combat_timers.player_ms, 0.0);

        let victory = result
            .events
            .iter()
            .position(|e| matches!(e, TickEvent::Victory { .. }));
        let spawn = result.events.iter().position(|e| {
            matches!(
                e,
                TickEvent::SpawnEnemy {
                    reason: SpawnReason::Chain,
                    ..
                }
            )
        });
        let victory = victory.expect("victory event");
        assert_eq!(spawn, Some(victory + 1));
    }

    #[test]
    fn test_chain_miss_ends_encounter() {
        let config = chain_config(0.0);
        let mut state = engaged(&config, 1);
        state.world.pending_encounters = 2;
        if let Some(enemy) = state.enemy.as_mut() {
            enemy.hp = 1.0;
        }
        state.combat_timers.player_ms = config.combat.player_attack_interval_ms;

        let result = tick(&state, 1.0, &config, &mut test_rng());
        assert_eq!(result.state.world.pending_encounters, 0);
        assert!(result.state.enemy.is_none());

        let victory = result
            .events
            .iter()
            .position(|e| matches!(e, TickEvent::Victory { .. }))
            .expect("victory event");
        assert!(matches!(
            result.events.get(victory + 1),
            Some(TickEvent::ChainSpawnMiss { .. })
        ));
    }

    #[test]
    fn test_regen_never_exceeds_max() {
        let config = GameConfig::default();
        let mut state = create_initial_state(&config);
        state.activity_mode = ActivityMode::Cultivation;
        state.unlocks.cultivation = true;
        state.run.hp = 1.0;

        let result = tick(&state, 10_000_000.0, &config, &mut test_rng());
        assert_eq!(result.state.run.hp, max_hp(&result.state.run, &config));
        assert!(result.state.run.ki <= max_ki(&result.state.run, &config));
    }

    #[test]
    fn test_cultivation_tick_levels_body() {
        let config = GameConfig::default();
        let mut state = create_initial_state(&config);
        state.unlocks.cultivation = true;
        state.activity_mode = ActivityMode::Cultivation;
        state.set_flow_rates(1.0, 0.0, 0.0);
        state.resources.essence = 1_000.0;

        let mut rng = test_rng();
        for _ in 0..100 {
            state = tick(&state, 100.0, &config, &mut rng).state;
        }

        assert!(state.resources.essence < 1_000.0);
        assert!(state.run.body.progress.level >= 1);
        assert_eq!(state.run.mind.progress.xp, 0.0);
        assert_eq!(state.statistics.highest_levels.body, state.run.body.progress.level);
        assert_eq!(state.battle_positions.player_hex, Hex::ORIGIN);
    }

    #[test]
    fn test_events_serialize_with_type_tag() {
        let event = TickEvent::LevelUp {
            stat: Stat::Mind,
            level: 3,
        };
        let json = serde_json::to_value(&event).expect("event serializes");
        assert_eq!(json["type"], "levelUp");
        assert_eq!(json["stat"], "mind");
        assert_eq!(json["level"], 3);
    }
}
