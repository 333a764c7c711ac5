//! Fixed-timestep driving for the interactive loop and the headless
//! simulator.
//!
//! Hosts feed variable frame times; [`FixedStepDriver`] turns them into
//! whole `simulation_dt_ms` ticks and carries the remainder to the next
//! frame.

use super::config::GameConfig;
use super::constants::MAX_FRAME_MS;
use super::game_state::{create_initial_state, SimulationState};
use super::tick::{tick, TickEvent, TickResult};
use rand::Rng;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FixedStepDriver {
    accumulator_ms: f64,
}

impl FixedStepDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frame time not yet consumed by a whole tick.
    pub fn accumulator_ms(&self) -> f64 {
        self.accumulator_ms
    }

    /// Runs every whole tick that fits into the accumulated frame time.
    ///
    /// A single frame contributes at most [`MAX_FRAME_MS`]; a stalled host
    /// loses that time instead of bursting through hundreds of ticks.
    pub fn advance(
        &mut self,
        state: &SimulationState,
        frame_ms: f64,
        config: &GameConfig,
        rng: &mut impl Rng,
    ) -> TickResult {
        let frame_ms = if frame_ms.is_finite() {
            frame_ms.clamp(0.0, MAX_FRAME_MS)
        } else {
            0.0
        };
        self.accumulator_ms += frame_ms;

        let mut result = TickResult {
            state: state.clone(),
            events: Vec::new(),
        };
        let dt_ms = config.timing.simulation_dt_ms;
        if !(dt_ms > 0.0) {
            return result;
        }

        while self.accumulator_ms >= dt_ms {
            self.accumulator_ms -= dt_ms;
            let step = tick(&result.state, dt_ms, config, rng);
            result.state = step.state;
            result.events.extend(step.events);
        }
        result
    }
}

/// Something that can be stepped frame by frame.
pub trait GameLoop {
    /// Feeds one frame of wall time. Returns the events it produced.
    fn step(&mut self, frame_ms: f64, rng: &mut impl Rng) -> Vec<TickEvent>;

    fn state(&self) -> &SimulationState;

    fn state_mut(&mut self) -> &mut SimulationState;
}

/// Owned state, config and driver: the usual way to host the engine.
#[derive(Debug, Clone)]
pub struct Simulation {
    state: SimulationState,
    config: GameConfig,
    driver: FixedStepDriver,
}

impl Simulation {
    pub fn new(config: GameConfig) -> Self {
        Self::with_state(create_initial_state(&config), config)
    }

    pub fn with_state(state: SimulationState, config: GameConfig) -> Self {
        Self {
            state,
            config,
            driver: FixedStepDriver::new(),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn into_state(self) -> SimulationState {
        self.state
    }
}

impl GameLoop for Simulation {
    fn step(&mut self, frame_ms: f64, rng: &mut impl Rng) -> Vec<TickEvent> {
        let result = self.driver.advance(&self.state, frame_ms, &self.config, rng);
        self.state = result.state;
        result.events
    }

    fn state(&self) -> &SimulationState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut SimulationState {
        &mut self.state
    }
}
