//! Deterministic polynomial hash over a grid's row-major cell sequence.
//!
//! Used as the memoization key and as the equality proxy for cycle detection.
//! Not collision-free: boards of different shapes with the same flattened
//! sequence always collide, so callers must only compare hashes of boards
//! with identical dimensions.

use crate::grid::Grid;
use crate::types::{ALIVE_CELL_VALUE, DEAD_CELL_VALUE, HASH_MULTIPLIER, HASH_SEED};

pub type StateHash = u32;

/// `hash = seed; for cell: hash = hash * 31 + cell`, wrapping at 32 bits.
pub fn board_hash(grid: &Grid) -> StateHash {
    hash_cells(grid.cells())
}

#[inline]
pub fn hash_cells(cells: &[bool]) -> StateHash {
    cells.iter().fold(HASH_SEED, |hash, &alive| {
        let value = if alive { ALIVE_CELL_VALUE } else { DEAD_CELL_VALUE };
        hash.wrapping_mul(HASH_MULTIPLIER).wrapping_add(value)
    })
}
