//! Axial hex-grid coordinates.
//!
//! Positions are `(q, r)`; the third cube coordinate is implied as
//! `s = -q - r`. All functions here are pure.

use crate::core::constants::HEX_DIRECTION_COUNT;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Hex {
    pub q: i32,
    pub r: i32,
}

/// Unit offsets in enumeration order.
///
/// The order is load-bearing: [`step_toward`] keeps the first strictly
/// improving neighbour, and the exploration heading indexes into this table.
pub const HEX_DIRECTIONS: [Hex; HEX_DIRECTION_COUNT] = [
    Hex { q: 1, r: 0 },
    Hex { q: -1, r: 0 },
    Hex { q: 0, r: 1 },
    Hex { q: 0, r: -1 },
    Hex { q: 1, r: -1 },
    Hex { q: -1, r: 1 },
];

impl Hex {
    pub const ORIGIN: Hex = Hex { q: 0, r: 0 };

    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// Implied cube coordinate.
    pub const fn s(&self) -> i32 {
        -self.q - self.r
    }

    pub const fn offset(&self, delta: Hex, times: i32) -> Hex {
        Hex {
            q: self.q + delta.q * times,
            r: self.r + delta.r * times,
        }
    }

    pub fn distance_to(&self, other: Hex) -> u32 {
        distance(*self, other)
    }
}

/// Hex distance between two axial coordinates.
pub fn distance(a: Hex, b: Hex) -> u32 {
    let dq = (a.q - b.q).unsigned_abs();
    let dr = (a.r - b.r).unsigned_abs();
    let ds = ((a.q + a.r) - (b.q + b.r)).unsigned_abs();
    (dq + dr + ds) / 2
}

/// Unit offset for a heading; indices wrap.
pub fn direction(index: usize) -> Hex {
    HEX_DIRECTIONS[index % HEX_DIRECTION_COUNT]
}

pub fn neighbor(hex: Hex, direction_index: usize) -> Hex {
    hex.offset(direction(direction_index), 1)
}

/// One greedy step from `from` toward `to`.
///
/// Returns `from` unchanged when it already equals `to`.
pub fn step_toward(from: Hex, to: Hex) -> Hex {
    let mut best = from;
    let mut best_distance = distance(from, to);

    for dir in HEX_DIRECTIONS {
        let candidate = from.offset(dir, 1);
        let candidate_distance = distance(candidate, to);
        if candidate_distance < best_distance {
            best = candidate;
            best_distance = candidate_distance;
        }
    }

    best
}
