//! XP thresholds and level-up resolution.
//!
//! Every track drains in a loop: one large injection (offline catch-up,
//! a big hit at low level) can cross several thresholds at once.

use super::derived_stats::max_hp;
use crate::core::config::GameConfig;
use crate::core::game_state::{PersistentState, RunState, Stat, Statistics, Track};
use crate::core::tick::TickEvent;

/// XP for the next run level (strength, endurance).
pub fn run_xp_threshold(level: u32, config: &GameConfig) -> f64 {
    let progression = &config.progression;
    let exponent = level.saturating_sub(1) as f64;
    clamp_threshold(progression.run_xp_base * (1.0 + progression.run_xp_growth_rate).powf(exponent))
}

/// XP for the next prestige level (all five prestige tracks).
pub fn prestige_xp_threshold(level: u32, config: &GameConfig) -> f64 {
    let progression = &config.progression;
    clamp_threshold(
        progression.prestige_xp_base * (1.0 + progression.prestige_xp_growth_rate).powf(level as f64),
    )
}

/// XP for the next cultivation level of `stat`.
pub fn cultivation_xp_threshold(stat: Stat, level: u32, config: &GameConfig) -> f64 {
    let cultivation = &config.cultivation;
    let (base, exponent) = match stat {
        Stat::Body => (cultivation.body_essence_base, cultivation.body_essence_exp),
        Stat::Mind => (cultivation.mind_essence_base, cultivation.mind_essence_exp),
        Stat::Spirit => (cultivation.spirit_essence_base, cultivation.spirit_essence_exp),
        Stat::Strength | Stat::Endurance => return run_xp_threshold(level, config),
    };
    clamp_threshold(base * (level as f64 + 1.0).powf(exponent))
}

/// Floor-truncated, at least 1, so a drain loop always makes progress.
fn clamp_threshold(raw: f64) -> f64 {
    if raw.is_finite() {
        raw.floor().max(1.0)
    } else {
        f64::MAX
    }
}

/// Drains `track` against `threshold`, returning every level reached.
pub fn drain_track(track: &mut Track, threshold: impl Fn(u32) -> f64) -> Vec<u32> {
    let mut reached = Vec::new();
    loop {
        let required = threshold(track.level);
        if track.xp < required {
            break;
        }
        track.xp -= required;
        track.level += 1;
        reached.push(track.level);
    }
    reached
}

fn drain_into(
    track: &mut Track,
    stat: Stat,
    prestige: bool,
    threshold: impl Fn(u32) -> f64,
    statistics: &mut Statistics,
    events: &mut Vec<TickEvent>,
) {
    for level in drain_track(track, threshold) {
        *statistics.total_levels_gained.get_mut(stat, prestige) += 1;
        events.push(if prestige {
            TickEvent::PrestigeLevelUp { stat, level }
        } else {
            TickEvent::LevelUp { stat, level }
        });
    }
}

/// Resolves every pending level-up and reclamps HP to the new maximum.
///
/// Order: strength, endurance, their prestige tracks, then body, mind and
/// spirit each followed by its prestige track.
pub fn resolve_level_ups(
    run: &mut RunState,
    persistent: &mut PersistentState,
    statistics: &mut Statistics,
    config: &GameConfig,
) -> Vec<TickEvent> {
    let mut events = Vec::new();
    let run_threshold = |level| run_xp_threshold(level, config);
    let prestige_threshold = |level| prestige_xp_threshold(level, config);

    drain_into(&mut run.strength, Stat::Strength, false, run_threshold, statistics, &mut events);
    drain_into(&mut run.endurance, Stat::Endurance, false, run_threshold, statistics, &mut events);
    drain_into(
        &mut persistent.strength_prestige,
        Stat::Strength,
        true,
        prestige_threshold,
        statistics,
        &mut events,
    );
    drain_into(
        &mut persistent.endurance_prestige,
        Stat::Endurance,
        true,
        prestige_threshold,
        statistics,
        &mut events,
    );

    for (stat, cultivation) in [
        (Stat::Body, &mut run.body),
        (Stat::Mind, &mut run.mind),
        (Stat::Spirit, &mut run.spirit),
    ] {
        drain_into(
            &mut cultivation.progress,
            stat,
            false,
            |level| cultivation_xp_threshold(stat, level, config),
            statistics,
            &mut events,
        );
        drain_into(&mut cultivation.prestige, stat, true, prestige_threshold, statistics, &mut events);
    }

    run.hp = run.hp.min(max_hp(run, config));
    events
}

/// Raises every all-time high-water mark to the current levels.
pub fn update_highest_levels(statistics: &mut Statistics, run: &RunState, persistent: &PersistentState) {
    let highest = &mut statistics.highest_levels;
    highest.raise(Stat::Strength, false, run.strength.level);
    highest.raise(Stat::Endurance, false, run.endurance.level);
    highest.raise(Stat::Strength, true, persistent.strength_prestige.level);
    highest.raise(Stat::Endurance, true, persistent.endurance_prestige.level);

    for stat in [Stat::Body, Stat::Mind, Stat::Spirit] {
        if let Some(cultivation) = run.cultivation(stat) {
            highest.raise(stat, false, cultivation.progress.level);
            highest.raise(stat, true, cultivation.prestige.level);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain_config() -> GameConfig {
        let mut config = GameConfig::default();
        config.progression.run_xp_base = 10.0;
        config.progression.run_xp_growth_rate = 0.15;
        config
    }

    #[test]
    fn test_run_threshold_values() {
        let config = drain_config();
        assert_eq!(run_xp_threshold(1, &config), 10.0);
        assert_eq!(run_xp_threshold(2, &config), 11.0);
        assert_eq!(run_xp_threshold(3, &config), 13.0);
        assert_eq!(run_xp_threshold(4, &config), 15.0);
    }

    #[test]
    fn test_large_injection_cascades_through_levels() {
        let config = drain_config();
        let mut run = RunState::baseline();
        let mut persistent = PersistentState::default();
        let mut stats = Statistics::new(&config);
        run.strength.xp = 35.0;

        let events = resolve_level_ups(&mut run, &mut persistent, &mut stats, &config);

        // 35 - 10 - 11 - 13 = 1, below threshold(4) = 15
        assert_eq!(run.strength.level, 4);
        assert_eq!(run.strength.xp, 1.0);
        assert_eq!(stats.total_levels_gained.strength, 3);
        let levels: Vec<u32> = events
            .iter()
            .filter_map(|e| match e {
                TickEvent::LevelUp {
                    stat: Stat::Strength,
                    level,
                } => Some(*level),
                _ => None,
            })
            .collect();
        assert_eq!(levels, vec![2, 3, 4]);
    }

    #[test]
    fn test_prestige_threshold_uses_level_exponent() {
        let mut config = GameConfig::default();
        config.progression.prestige_xp_base = 100.0;
        config.progression.prestige_xp_growth_rate = 0.5;
        assert_eq!(prestige_xp_threshold(0, &config), 100.0);
        assert_eq!(prestige_xp_threshold(1, &config), 150.0);
        assert_eq!(prestige_xp_threshold(2, &config), 225.0);
    }

    #[test]
    fn test_cultivation_threshold_formula() {
        let mut config = GameConfig::default();
        config.cultivation.body_essence_base = 25.0;
        config.cultivation.body_essence_exp = 2.0;
        assert_eq!(cultivation_xp_threshold(Stat::Body, 0, &config), 25.0);
        assert_eq!(cultivation_xp_threshold(Stat::Body, 2, &config), 225.0);
    }

    #[test]
    fn test_zero_threshold_still_terminates() {
        let mut config = GameConfig::default();
        config.progression.run_xp_base = 0.0;
        let mut track = Track { level: 1, xp: 3.5 };
        let reached = drain_track(&mut track, |level| run_xp_threshold(level, &config));
        assert_eq!(reached, vec![2, 3, 4]);
        assert_eq!(track.xp, 0.5);
    }

    #[test]
    fn test_prestige_level_up_emits_prestige_event() {
        let config = GameConfig::default();
        let mut run = RunState::baseline();
        let mut persistent = PersistentState::default();
        let mut stats = Statistics::new(&config);
        run.spirit.prestige.xp = prestige_xp_threshold(0, &config);

        let events = resolve_level_ups(&mut run, &mut persistent, &mut stats, &config);
        assert_eq!(run.spirit.prestige.level, 1);
        assert!(events.contains(&TickEvent::PrestigeLevelUp {
            stat: Stat::Spirit,
            level: 1
        }));
        assert_eq!(stats.total_levels_gained.spirit_prestige, 1);
    }

    #[test]
    fn test_level_up_never_raises_hp() {
        let config = GameConfig::default();
        let mut run = RunState::baseline();
        let mut persistent = PersistentState::default();
        let mut stats = Statistics::new(&config);
        run.hp = 12.0;
        run.endurance.xp = 500.0;

        resolve_level_ups(&mut run, &mut persistent, &mut stats, &config);
        assert!(run.endurance.level > 1);
        assert_eq!(run.hp, 12.0);
    }

    #[test]
    fn test_hp_reclamped_to_max() {
        let config = GameConfig::default();
        let mut run = RunState::baseline();
        let mut persistent = PersistentState::default();
        let mut stats = Statistics::new(&config);
        run.hp = 10_000.0;

        resolve_level_ups(&mut run, &mut persistent, &mut stats, &config);
        assert_eq!(run.hp, max_hp(&run, &config));
    }

    #[test]
    fn test_highest_levels_only_rise() {
        let config = GameConfig::default();
        let mut stats = Statistics::new(&config);
        let mut run = RunState::baseline();
        let persistent = PersistentState::default();

        run.strength.level = 7;
        run.mind.progress.level = 3;
        update_highest_levels(&mut stats, &run, &persistent);
        assert_eq!(stats.highest_levels.strength, 7);
        assert_eq!(stats.highest_levels.mind, 3);

        let reset = run.next_life();
        update_highest_levels(&mut stats, &reset, &persistent);
        assert_eq!(stats.highest_levels.strength, 7);
        assert_eq!(stats.highest_levels.mind, 3);
    }
}
