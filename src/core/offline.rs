//! Offline catch-up.
//!
//! Time away is credited in one coarse step instead of replaying ticks:
//! passive essence from depth and prestige, then (once cultivation is
//! unlocked) a reduced-efficiency cultivation flow. No combat or
//! exploration happens offline.

use super::config::GameConfig;
use super::constants::{MIN_OFFLINE_MS, MS_PER_HOUR};
use super::game_state::SimulationState;
use crate::character::cultivation::channel_essence;
use crate::character::progression::{resolve_level_ups, update_highest_levels};
use serde::Serialize;
use tracing::info;

/// Summary shown to the player after returning.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfflineReport {
    pub away_seconds: u64,
    pub passive_essence_gain: u64,
    pub flow_essence_spent: u64,
    /// Run and prestige levels gained from the offline flow.
    pub total_level_ups: u32,
}

#[derive(Debug, Clone)]
pub struct OfflineOutcome {
    pub state: SimulationState,
    /// `None` when the absence was too short to count.
    pub report: Option<OfflineReport>,
}

/// Clamps an absence to `[0, offline_cap_hours]`. Non-finite input counts
/// as no time at all.
pub fn capped_offline_ms(elapsed_ms: f64, config: &GameConfig) -> f64 {
    if !elapsed_ms.is_finite() {
        return 0.0;
    }
    let cap_ms = (config.timing.offline_cap_hours * MS_PER_HOUR).max(0.0);
    elapsed_ms.min(cap_ms).max(0.0)
}

/// Essence per second earned while away.
pub fn passive_essence_per_second(state: &SimulationState, config: &GameConfig) -> f64 {
    let persistence = &config.persistence;
    persistence.offline_essence_per_second_base
        + state.world.best_depth as f64 * persistence.offline_essence_per_best_depth
        + state.persistent.total_prestige_levels() as f64
            * persistence.offline_essence_per_prestige_level
}

/// Credits `elapsed_ms` of absence to a copy of `state`.
pub fn apply_offline_progress(
    state: &SimulationState,
    elapsed_ms: f64,
    config: &GameConfig,
) -> OfflineOutcome {
    let mut next = state.clone();
    let capped_ms = capped_offline_ms(elapsed_ms, config);
    if capped_ms <= MIN_OFFLINE_MS {
        return OfflineOutcome {
            state: next,
            report: None,
        };
    }

    let seconds_away = capped_ms / 1000.0;
    let passive_gain = (seconds_away * passive_essence_per_second(&next, config))
        .floor()
        .max(0.0);
    next.resources.essence += passive_gain;

    let mut flow_spent = 0.0;
    let mut total_level_ups = 0;
    if next.unlocks.cultivation {
        let flow = next.cultivation.normalized();
        next.cultivation = flow;

        let max_spend = seconds_away
            * config.cultivation.max_flow_essence_per_second
            * config.persistence.offline_flow_efficiency;
        flow_spent = max_spend.min(next.resources.essence).max(0.0);
        next.resources.essence -= flow_spent;

        channel_essence(&mut next.run, flow_spent, &flow, config);
        total_level_ups = resolve_level_ups(
            &mut next.run,
            &mut next.persistent,
            &mut next.statistics,
            config,
        )
        .len() as u32;
        update_highest_levels(&mut next.statistics, &next.run, &next.persistent);
    }

    next.elapsed_ms += capped_ms;

    let report = OfflineReport {
        away_seconds: seconds_away.floor() as u64,
        passive_essence_gain: passive_gain as u64,
        flow_essence_spent: flow_spent.floor() as u64,
        total_level_ups,
    };
    info!(
        away_seconds = report.away_seconds,
        passive_essence = report.passive_essence_gain,
        flow_essence = report.flow_essence_spent,
        level_ups = report.total_level_ups,
        "offline progress applied"
    );

    OfflineOutcome {
        state: next,
        report: Some(report),
    }
}
