//! Cultivation: channeling essence into body, mind and spirit.
//!
//! Both the live tick and offline catch-up credit essence through
//! [`channel_essence`], so the two paths read the same config constants.

use crate::core::config::GameConfig;
use crate::core::constants::DEFAULT_FLOW_RATES;
use crate::core::game_state::{ActivityMode, CultivationStat, RunState, SimulationState};
use serde::{Deserialize, Serialize};

/// Player-chosen split of channeled essence. Stored raw, normalized on read.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CultivationFlow {
    pub body: f64,
    pub mind: f64,
    pub spirit: f64,
}

impl Default for CultivationFlow {
    fn default() -> Self {
        let (body, mind, spirit) = DEFAULT_FLOW_RATES;
        Self { body, mind, spirit }
    }
}

impl CultivationFlow {
    pub fn equal() -> Self {
        Self {
            body: 1.0 / 3.0,
            mind: 1.0 / 3.0,
            spirit: 1.0 / 3.0,
        }
    }

    /// Rates scaled to sum to 1. Negative or non-finite rates count as 0;
    /// if nothing is left the split falls back to equal thirds.
    pub fn normalized(&self) -> Self {
        let body = sanitize_rate(self.body);
        let mind = sanitize_rate(self.mind);
        let spirit = sanitize_rate(self.spirit);
        let total = body + mind + spirit;

        if !(total > 0.0) || !total.is_finite() {
            return Self::equal();
        }

        Self {
            body: body / total,
            mind: mind / total,
            spirit: spirit / total,
        }
    }

    pub fn total(&self) -> f64 {
        self.body + self.mind + self.spirit
    }
}

fn sanitize_rate(rate: f64) -> f64 {
    if rate.is_finite() {
        rate.max(0.0)
    } else {
        0.0
    }
}

/// Essence converted to XP, boosted by the stat's prestige level.
pub fn cultivation_xp(allocated_essence: f64, prestige_level: u32, config: &GameConfig) -> f64 {
    if !(allocated_essence > 0.0) {
        return 0.0;
    }
    let multiplier =
        1.0 + prestige_level as f64 * config.cultivation.essence_xp_boost_per_prestige_level;
    allocated_essence * multiplier
}

fn credit(stat: &mut CultivationStat, allocated_essence: f64, config: &GameConfig) {
    let gained = cultivation_xp(allocated_essence, stat.prestige.level, config);
    stat.progress.xp += gained;
    stat.prestige.xp += gained * config.cultivation.cultivation_prestige_gain.max(0.0);
}

/// Splits `essence` across the three stats and credits run and prestige XP.
/// `flow` is expected to be normalized.
pub fn channel_essence(run: &mut RunState, essence: f64, flow: &CultivationFlow, config: &GameConfig) {
    if !(essence > 0.0) {
        return;
    }
    credit(&mut run.body, essence * flow.body, config);
    credit(&mut run.mind, essence * flow.mind, config);
    credit(&mut run.spirit, essence * flow.spirit, config);
}

/// Whether the live flow runs this tick.
pub fn flow_active(state: &SimulationState) -> bool {
    state.unlocks.cultivation
        && state.activity_mode == ActivityMode::Cultivation
        && state.enemy.is_none()
}

/// Draws essence for `dt_ms` of channeling and credits it. Returns the
/// essence spent.
pub fn process_cultivation_flow(state: &mut SimulationState, dt_ms: f64, config: &GameConfig) -> f64 {
    if !flow_active(state) {
        return 0.0;
    }

    let flow = state.cultivation.normalized();
    state.cultivation = flow;

    let requested = (dt_ms / 1000.0) * config.cultivation.max_flow_essence_per_second.max(0.0);
    let spent = requested.min(state.resources.essence).max(0.0);
    state.resources.essence -= spent;

    channel_essence(&mut state.run, spent, &flow, config);
    spent
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::game_state::create_initial_state;

    #[test]
    fn test_normalized_sums_to_one() {
        let flow = CultivationFlow {
            body: 2.0,
            mind: 1.0,
            spirit: 1.0,
        }
        .normalized();
        assert!((flow.total() - 1.0).abs() < 1e-12);
        assert!((flow.body - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_all_zero_falls_back_to_thirds() {
        let flow = CultivationFlow {
            body: 0.0,
            mind: 0.0,
            spirit: 0.0,
        }
        .normalized();
        assert_eq!(flow, CultivationFlow::equal());
    }

    #[test]
    fn test_negative_and_nan_rates_are_zeroed() {
        let flow = CultivationFlow {
            body: -5.0,
            mind: f64::NAN,
            spirit: 3.0,
        }
        .normalized();
        assert_eq!(flow.body, 0.0);
        assert_eq!(flow.mind, 0.0);
        assert_eq!(flow.spirit, 1.0);
    }

    #[test]
    fn test_infinite_rate_is_zeroed() {
        let flow = CultivationFlow {
            body: f64::INFINITY,
            mind: 0.0,
            spirit: 0.0,
        }
        .normalized();
        assert_eq!(flow, CultivationFlow::equal());
    }

    #[test]
    fn test_prestige_boosts_cultivation_xp() {
        let mut config = GameConfig::default();
        config.cultivation.essence_xp_boost_per_prestige_level = 0.1;
        assert!((cultivation_xp(10.0, 0, &config) - 10.0).abs() < 1e-12);
        assert!((cultivation_xp(10.0, 3, &config) - 13.0).abs() < 1e-12);
        assert_eq!(cultivation_xp(-4.0, 3, &config), 0.0);
    }

    #[test]
    fn test_channel_feeds_run_and_prestige_equally() {
        let config = GameConfig::default();
        let mut run = RunState::baseline();
        run.mind.prestige.level = 2;

        let flow = CultivationFlow {
            body: 0.5,
            mind: 0.5,
            spirit: 0.0,
        };
        channel_essence(&mut run, 100.0, &flow, &config);

        let boost = 1.0 + 2.0 * config.cultivation.essence_xp_boost_per_prestige_level;
        assert!((run.body.progress.xp - 50.0).abs() < 1e-9);
        assert!((run.body.prestige.xp - 50.0).abs() < 1e-9);
        assert!((run.mind.progress.xp - 50.0 * boost).abs() < 1e-9);
        assert!((run.mind.prestige.xp - run.mind.progress.xp).abs() < 1e-9);
        assert_eq!(run.spirit.progress.xp, 0.0);
    }

    #[test]
    fn test_flow_idle_in_battle_mode() {
        let config = GameConfig::default();
        let mut state = create_initial_state(&config);
        state.unlocks.cultivation = true;
        state.resources.essence = 100.0;

        assert_eq!(process_cultivation_flow(&mut state, 1000.0, &config), 0.0);
        assert_eq!(state.resources.essence, 100.0);
    }

    #[test]
    fn test_flow_draw_capped_by_rate_and_pool() {
        let config = GameConfig::default();
        let mut state = create_initial_state(&config);
        state.unlocks.cultivation = true;
        state.activity_mode = ActivityMode::Cultivation;
        state.resources.essence = 100.0;

        let spent = process_cultivation_flow(&mut state, 1000.0, &config);
        assert!((spent - config.cultivation.max_flow_essence_per_second).abs() < 1e-9);
        assert!((state.resources.essence - (100.0 - spent)).abs() < 1e-9);

        state.resources.essence = 1.5;
        let spent = process_cultivation_flow(&mut state, 1000.0, &config);
        assert!((spent - 1.5).abs() < 1e-12);
        assert_eq!(state.resources.essence, 0.0);
    }

    #[test]
    fn test_flow_stores_normalized_rates() {
        let config = GameConfig::default();
        let mut state = create_initial_state(&config);
        state.unlocks.cultivation = true;
        state.activity_mode = ActivityMode::Cultivation;
        state.set_flow_rates(0.0, 0.0, 0.0);

        process_cultivation_flow(&mut state, 100.0, &config);
        assert_eq!(state.cultivation, CultivationFlow::equal());
    }
}
