//! Engine state, configuration and the tick/offline/persistence entry points.

#![allow(unused_imports)]

pub mod config;
pub mod constants;
pub mod game_loop;
pub mod game_state;
pub mod offline;
pub mod persistence;
pub mod tick;

pub use config::*;
pub use constants::*;
pub use game_loop::*;
pub use game_state::*;
pub use offline::*;
pub use persistence::*;
pub use tick::*;
