//! Infinity Warrior - idle hex-crawler simulation engine
//!
//! The engine is a pure reducer: [`tick`] takes a state, a time step, a
//! config and an RNG and returns the next state plus the events that
//! happened. Offline catch-up and save hydration build on the same state
//! type. Nothing here touches a clock, a terminal or the filesystem except
//! [`SaveManager`](crate::core::persistence::SaveManager).

pub mod character;
pub mod combat;
pub mod core;
pub mod world;

pub use crate::core::config::GameConfig;
pub use crate::core::game_state::{create_initial_state, SimulationState};
pub use crate::core::offline::{apply_offline_progress, OfflineOutcome, OfflineReport};
pub use crate::core::tick::{tick, TickEvent, TickResult};
