//! Stats derived from levels: max HP, damage, Ki, regen, attack speed.
//!
//! Level-scaled terms share one shape, `progress * per_level *
//! (1 + growth)^progress`, so early levels feel linear and later ones
//! compound.

use crate::core::config::GameConfig;
use crate::core::game_state::RunState;

/// `progress * per_level * (1 + growth)^progress`, with negative progress
/// treated as zero.
pub fn compounding_gain(progress: f64, per_level: f64, growth_rate: f64) -> f64 {
    let progress = progress.max(0.0);
    progress * per_level * (1.0 + growth_rate).powf(progress)
}

pub fn max_hp(run: &RunState, config: &GameConfig) -> f64 {
    let combat = &config.combat;
    let progress = run.endurance.level.saturating_sub(1) as f64;
    (combat.player_base_hp
        + compounding_gain(
            progress,
            combat.endurance_hp_per_level,
            combat.endurance_hp_growth_rate,
        ))
    .floor()
}

/// Damage per player hit at a given strength level.
pub fn player_damage(strength_level: u32, config: &GameConfig) -> f64 {
    let combat = &config.combat;
    let progress = strength_level.saturating_sub(1) as f64;
    let raw = combat.player_base_attack
        + compounding_gain(
            progress,
            combat.strength_attack_per_level,
            combat.strength_attack_growth_rate,
        );
    raw.floor().max(combat.min_damage)
}

pub fn max_ki(run: &RunState, config: &GameConfig) -> f64 {
    let cultivation = &config.cultivation;
    cultivation.ki_max_base
        + compounding_gain(
            run.spirit.progress.level as f64,
            cultivation.ki_max_per_spirit_level,
            cultivation.ki_spirit_growth_rate,
        )
}

pub fn hp_regen_per_second(run: &RunState, config: &GameConfig) -> f64 {
    let cultivation = &config.cultivation;
    cultivation.hp_regen_base_per_second
        + compounding_gain(
            run.body.progress.level as f64,
            cultivation.hp_regen_per_body_level,
            cultivation.hp_regen_body_growth_rate,
        )
}

pub fn ki_regen_per_second(run: &RunState, config: &GameConfig) -> f64 {
    let cultivation = &config.cultivation;
    cultivation.ki_base_regen_per_second
        + run.spirit.progress.level as f64 * cultivation.ki_regen_per_spirit_level
}

/// Attack-speed multiplier from mind, capped at the configured maximum.
pub fn mind_attack_speed_multiplier(mind_level: u32, config: &GameConfig) -> f64 {
    let cultivation = &config.cultivation;
    let level = mind_level as f64;
    let raw = 1.0
        + level.ln_1p() * cultivation.mind_speed_log_factor
        + level * cultivation.mind_speed_per_level;
    raw.min(cultivation.max_attack_speed_multiplier)
}

/// Time between player attacks, never below the configured floor.
pub fn player_attack_interval_ms(run: &RunState, config: &GameConfig) -> f64 {
    let multiplier = mind_attack_speed_multiplier(run.mind.progress.level, config);
    let interval = if multiplier > 0.0 {
        config.combat.player_attack_interval_ms / multiplier
    } else {
        config.combat.player_attack_interval_ms
    };
    interval.max(config.combat.min_attack_interval_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_one_has_base_values() {
        let config = GameConfig::default();
        let run = RunState::baseline();

        assert_eq!(max_hp(&run, &config), config.combat.player_base_hp.floor());
        assert_eq!(player_damage(1, &config), config.combat.player_base_attack);
        assert_eq!(max_ki(&run, &config), config.cultivation.ki_max_base);
        assert_eq!(
            hp_regen_per_second(&run, &config),
            config.cultivation.hp_regen_base_per_second
        );
        assert_eq!(mind_attack_speed_multiplier(0, &config), 1.0);
    }

    #[test]
    fn test_player_damage_formula() {
        let mut config = GameConfig::default();
        config.combat.player_base_attack = 6.0;
        config.combat.strength_attack_per_level = 2.0;
        config.combat.strength_attack_growth_rate = 0.1;

        // 6 + 3 * 2 * 1.1^3 = 6 + 7.986 = 13.986
        assert_eq!(player_damage(4, &config), 13.0);
    }

    #[test]
    fn test_player_damage_respects_min_damage() {
        let mut config = GameConfig::default();
        config.combat.player_base_attack = 0.0;
        config.combat.min_damage = 2.0;
        assert_eq!(player_damage(1, &config), 2.0);
    }

    #[test]
    fn test_damage_and_hp_are_monotonic() {
        let config = GameConfig::default();
        let mut run = RunState::baseline();
        let mut last_hp = max_hp(&run, &config);
        let mut last_damage = player_damage(1, &config);

        for level in 2..60 {
            run.endurance.level = level;
            let hp = max_hp(&run, &config);
            let damage = player_damage(level, &config);
            assert!(hp >= last_hp);
            assert!(damage >= last_damage);
            last_hp = hp;
            last_damage = damage;
        }
    }

    #[test]
    fn test_mind_multiplier_is_capped() {
        let config = GameConfig::default();
        let cap = config.cultivation.max_attack_speed_multiplier;
        assert_eq!(mind_attack_speed_multiplier(10_000, &config), cap);
        assert!(mind_attack_speed_multiplier(5, &config) < cap);
        assert!(mind_attack_speed_multiplier(5, &config) > 1.0);
    }

    #[test]
    fn test_attack_interval_has_floor() {
        let mut config = GameConfig::default();
        config.cultivation.max_attack_speed_multiplier = 100.0;
        config.cultivation.mind_speed_per_level = 1.0;
        let mut run = RunState::baseline();
        run.mind.progress.level = 500;

        assert_eq!(
            player_attack_interval_ms(&run, &config),
            config.combat.min_attack_interval_ms
        );
    }

    #[test]
    fn test_regen_grows_with_body() {
        let config = GameConfig::default();
        let mut run = RunState::baseline();
        let base = hp_regen_per_second(&run, &config);
        run.body.progress.level = 5;
        assert!(hp_regen_per_second(&run, &config) > base);
    }

    #[test]
    fn test_ki_regen_per_spirit_level() {
        let config = GameConfig::default();
        let mut run = RunState::baseline();
        run.spirit.progress.level = 10;
        let expected = config.cultivation.ki_base_regen_per_second
            + 10.0 * config.cultivation.ki_regen_per_spirit_level;
        assert!((ki_regen_per_second(&run, &config) - expected).abs() < 1e-12);
    }
}
