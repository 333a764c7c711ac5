//! The hex world: geometry, biome regions and exploration.

#![allow(unused_imports)]

pub mod biome;
pub mod exploration;
pub mod hex;

pub use biome::*;
pub use exploration::*;
pub use hex::*;
