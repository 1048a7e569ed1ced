//! Conway's survival/birth rule on a bounded (non-toroidal) board.

use crate::error::RuleError;
use crate::grid::Grid;
use crate::types::{
    MAX_SURVIVAL_NEIGHBORS, MIN_SURVIVAL_NEIGHBORS, NEIGHBOR_OFFSETS, REQUIRED_REPRODUCTION_NEIGHBORS,
};

/// Number of live cells among the 8 neighbors of `(x, y)` (row `x`, column `y`).
/// Neighbors outside the board count as dead.
pub fn count_alive_neighbors(grid: &Grid, x: i64, y: i64) -> Result<u8, RuleError> {
    let in_bounds = x >= 0 && y >= 0 && (x as u64) < grid.rows() as u64 && (y as u64) < grid.cols() as u64;
    if !in_bounds {
        return Err(RuleError::OutOfBounds { x, y });
    }
    Ok(alive_neighbors(grid, x as usize, y as usize))
}

/// Value of `(x, y)` in the next generation.
pub fn next_cell_value(grid: &Grid, x: i64, y: i64) -> Result<bool, RuleError> {
    let neighbors = count_alive_neighbors(grid, x, y)?;
    Ok(apply_rule(grid.alive_at(x as usize, y as usize), neighbors))
}

/// B3/S23
#[inline(always)]
pub fn apply_rule(alive: bool, neighbors: u8) -> bool {
    if alive {
        (MIN_SURVIVAL_NEIGHBORS..=MAX_SURVIVAL_NEIGHBORS).contains(&neighbors)
    } else {
        neighbors == REQUIRED_REPRODUCTION_NEIGHBORS
    }
}

/// In-bounds fast path used by the engine.
#[inline]
pub(crate) fn alive_neighbors(grid: &Grid, row: usize, col: usize) -> u8 {
    let rows = grid.rows() as isize;
    let cols = grid.cols() as isize;
    let mut count = 0u8;

    for &(dr, dc) in &NEIGHBOR_OFFSETS {
        let nr = row as isize + dr;
        let nc = col as isize + dc;
        if nr >= 0 && nr < rows && nc >= 0 && nc < cols && grid.alive_at(nr as usize, nc as usize) {
            count += 1;
        }
    }
    count
}

/// Next value of the in-bounds cell `(row, col)`.
#[inline]
pub(crate) fn next_value_at(grid: &Grid, row: usize, col: usize) -> bool {
    apply_rule(grid.alive_at(row, col), alive_neighbors(grid, row, col))
}
