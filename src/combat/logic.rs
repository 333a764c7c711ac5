//! Enemy generation, damage formulas and attack scheduling.
//!
//! Combat only runs while the player and an enemy are within
//! `effective_range_hex`. Out of range both interval accumulators are
//! zeroed, so no partial credit carries across a range change.

use super::types::{Enemy, RarityTier};
use crate::character::derived_stats::{player_attack_interval_ms, player_damage};
use crate::core::config::GameConfig;
use crate::core::game_state::SimulationState;
use crate::core::tick::TickEvent;
use crate::world::biome::Biome;
use crate::world::hex::distance;
use rand::Rng;

fn log_depth(depth: f64) -> f64 {
    depth.max(0.0).ln_1p()
}

/// Base enemy HP at an exploration depth, before biome and rarity.
pub fn enemy_max_hp(depth: u32, config: &GameConfig) -> f64 {
    let combat = &config.combat;
    let depth = depth.max(1) as f64;
    let scale = 1.0 + log_depth(depth) * combat.enemy_hp_log_factor + depth * combat.enemy_hp_depth_factor;
    (combat.enemy_hp_base * scale.max(0.0).powf(combat.enemy_hp_exp)).floor()
}

/// Base enemy attack at an exploration depth, before biome and rarity.
pub fn enemy_attack(depth: u32, config: &GameConfig) -> f64 {
    let combat = &config.combat;
    let depth = depth.max(1) as f64;
    let ramp = log_depth(depth) * combat.enemy_attack_log_factor + depth * combat.enemy_attack_depth_factor;
    (combat.enemy_attack_base + ramp.max(0.0).powf(combat.enemy_attack_exp)).floor()
}

/// Damage the player takes from one enemy hit.
pub fn incoming_damage(enemy_attack: f64, config: &GameConfig) -> f64 {
    enemy_attack.floor().max(config.combat.min_damage)
}

/// Walks `roll` (in `[0, 1)`) against the cumulative chances.
///
/// A roll past the last boundary (chances summing below 1, or rounding)
/// lands on the last tier. An empty table yields a neutral common tier.
pub fn rarity_for_roll(tiers: &[RarityTier], roll: f64) -> RarityTier {
    let mut cumulative = 0.0;
    for tier in tiers {
        cumulative += tier.chance.max(0.0);
        if roll <= cumulative {
            return tier.clone();
        }
    }
    tiers.last().cloned().unwrap_or_default()
}

pub fn roll_rarity(tiers: &[RarityTier], rng: &mut impl Rng) -> RarityTier {
    rarity_for_roll(tiers, rng.gen::<f64>())
}

/// Builds a full-HP enemy.
///
/// `distance` is where it spawned; stats scale with `current_depth`, the
/// player's exploration depth at spawn time.
pub fn create_enemy(
    distance: u32,
    current_depth: u32,
    biome: Biome,
    rarity: RarityTier,
    config: &GameConfig,
) -> Enemy {
    let modifier = config.biome_modifier(&biome.key);
    let max_hp = (enemy_max_hp(current_depth, config) * modifier.hp * rarity.hp)
        .floor()
        .max(1.0);
    let attack = (enemy_attack(current_depth, config) * modifier.attack * rarity.attack)
        .floor()
        .max(1.0);

    Enemy {
        hp: max_hp,
        max_hp,
        attack,
        biome,
        rarity,
        distance: distance.max(1),
    }
}

/// Essence granted for a kill.
pub fn essence_reward(distance: u32, rarity: &RarityTier, config: &GameConfig) -> f64 {
    let rewards = &config.rewards;
    let depth = distance.max(1) as f64;
    (rewards.essence_base * depth.powf(rewards.essence_exp) * rarity.essence)
        .floor()
        .max(0.0)
}

pub fn strength_xp_gain(damage_dealt: f64, strength_prestige_level: u32, config: &GameConfig) -> f64 {
    let progression = &config.progression;
    let multiplier =
        1.0 + strength_prestige_level as f64 * progression.strength_xp_boost_per_prestige_level;
    (damage_dealt * progression.strength_xp_per_damage * multiplier).floor()
}

pub fn endurance_xp_gain(damage_taken: f64, endurance_prestige_level: u32, config: &GameConfig) -> f64 {
    let progression = &config.progression;
    let multiplier =
        1.0 + endurance_prestige_level as f64 * progression.endurance_xp_boost_per_prestige_level;
    (damage_taken * progression.endurance_xp_per_damage * multiplier).floor()
}

/// Prestige side-gain from run XP: at least 1 whenever anything is gained.
pub fn prestige_xp_gain(run_xp_gain: f64, gain_rate: f64) -> f64 {
    if !(run_xp_gain > 0.0) || !(gain_rate > 0.0) {
        return 0.0;
    }
    (run_xp_gain * gain_rate).floor().max(1.0)
}

pub fn is_within_effective_range(state: &SimulationState, config: &GameConfig) -> bool {
    match (&state.enemy, state.battle_positions.enemy_hex) {
        (Some(_), Some(enemy_hex)) => {
            let gap = distance(state.battle_positions.player_hex, enemy_hex);
            gap as i64 <= config.combat.effective_range_hex as i64
        }
        _ => false,
    }
}

fn apply_player_attack(state: &mut SimulationState, config: &GameConfig) -> Option<TickEvent> {
    let enemy = state.enemy.as_mut()?;
    let damage = player_damage(state.run.strength.level, config);
    let strength_xp = strength_xp_gain(damage, state.persistent.strength_prestige.level, config);
    let strength_prestige_xp =
        prestige_xp_gain(strength_xp, config.progression.strength_prestige_gain);

    state.run.strength.xp += strength_xp;
    state.persistent.strength_prestige.xp += strength_prestige_xp;
    enemy.take_damage(damage);

    Some(TickEvent::PlayerHit {
        damage,
        strength_xp_gain: strength_xp,
        strength_prestige_xp_gain: strength_prestige_xp,
        enemy_hp: enemy.hp,
    })
}

fn apply_enemy_attack(state: &mut SimulationState, config: &GameConfig) -> Option<TickEvent> {
    let enemy = state.enemy.as_ref()?;
    let damage = incoming_damage(enemy.attack, config);
    let endurance_xp = endurance_xp_gain(damage, state.persistent.endurance_prestige.level, config);
    let endurance_prestige_xp =
        prestige_xp_gain(endurance_xp, config.progression.endurance_prestige_gain);

    state.run.endurance.xp += endurance_xp;
    state.persistent.endurance_prestige.xp += endurance_prestige_xp;
    state.run.hp = (state.run.hp - damage).max(0.0);

    Some(TickEvent::EnemyHit {
        damage,
        endurance_xp_gain: endurance_xp,
        endurance_prestige_xp_gain: endurance_prestige_xp,
        player_hp: state.run.hp,
    })
}

/// Advances both attack timers and resolves at most one attack per side.
///
/// A timer that crosses its interval fires once and keeps its overflow; a
/// huge `dt_ms` under-counts attacks rather than firing several.
pub fn tick_combat(state: &mut SimulationState, dt_ms: f64, config: &GameConfig) -> Vec<TickEvent> {
    let mut events = Vec::new();

    if !is_within_effective_range(state, config) {
        state.combat_timers.reset();
        return events;
    }

    state.combat_timers.player_ms += dt_ms;
    state.combat_timers.enemy_ms += dt_ms;

    let player_interval = player_attack_interval_ms(&state.run, config);
    if state.combat_timers.player_ms >= player_interval {
        state.combat_timers.player_ms -= player_interval;
        events.extend(apply_player_attack(state, config));
    }

    if !state.enemy.as_ref().is_some_and(Enemy::is_alive) {
        return events;
    }

    let enemy_interval = config.combat.enemy_attack_interval_ms;
    if state.combat_timers.enemy_ms >= enemy_interval {
        state.combat_timers.enemy_ms -= enemy_interval;
        events.extend(apply_enemy_attack(state, config));
    }

    events
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncounterOutcome {
    Victory,
    Defeat,
}

/// Defeat is checked first, so it wins when both sides drop together.
pub fn encounter_outcome(state: &SimulationState) -> Option<EncounterOutcome> {
    if state.run.hp <= 0.0 {
        return Some(EncounterOutcome::Defeat);
    }
    match &state.enemy {
        Some(enemy) if !enemy.is_alive() => Some(EncounterOutcome::Victory),
        _ => None,
    }
}
