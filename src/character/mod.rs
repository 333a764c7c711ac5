//! Character progression: derived stats, level thresholds and cultivation.

#![allow(unused_imports)]

pub mod cultivation;
pub mod derived_stats;
pub mod progression;

pub use cultivation::*;
pub use derived_stats::*;
pub use progression::*;
