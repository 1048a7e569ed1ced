//! Whole-board transition with optional memoization.
//!
//! The memo cache is owned by the engine instance; there is no ambient
//! global. Eviction is FIFO over insertion order, bounded by the configured
//! capacity (0 disables memoization).

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::ComputeError;
use crate::grid::{BoardLimits, Grid};
use crate::hasher::{board_hash, StateHash};
use crate::rules::next_value_at;
use crate::types::{CacheStats, GameOfLifeSettings};

// =============================================================================
// STATE CACHE
// =============================================================================

/// Shape is part of the key so equal flattened sequences of different
/// dimensions never share an entry.
pub type CacheKey = (usize, usize, StateHash);

#[derive(Default)]
struct CacheInner {
    entries: HashMap<CacheKey, Arc<Grid>>,
    insertion_order: VecDeque<CacheKey>,
}

/// Thread-safe, bounded map from a generation's key to its successor.
pub struct StateCache {
    capacity: usize,
    inner: RwLock<CacheInner>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl StateCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: RwLock::new(CacheInner::default()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_enabled(&self) -> bool {
        self.capacity > 0
    }

    pub fn get(&self, key: &CacheKey) -> Option<Arc<Grid>> {
        let found = self
            .inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .get(key)
            .cloned();

        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    /// Racing writers for the same key compute the same successor, so the
    /// last write simply wins.
    pub fn insert(&self, key: CacheKey, next: Arc<Grid>) {
        if !self.is_enabled() {
            return;
        }

        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = inner.entries.get_mut(&key) {
            *slot = next;
            return;
        }

        while inner.entries.len() >= self.capacity {
            match inner.insertion_order.pop_front() {
                Some(oldest) => {
                    inner.entries.remove(&oldest);
                }
                None => break,
            }
        }
        inner.entries.insert(key, next);
        inner.insertion_order.push_back(key);
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len() as u64,
            capacity: self.capacity as u64,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

// =============================================================================
// COMPUTE ENGINE
// =============================================================================

pub struct ComputeEngine {
    limits: BoardLimits,
    cache: StateCache,
}

impl ComputeEngine {
    pub fn new(limits: BoardLimits, cache_capacity: usize) -> Self {
        Self {
            limits,
            cache: StateCache::new(cache_capacity),
        }
    }

    pub fn from_settings(settings: &GameOfLifeSettings) -> Self {
        Self::new(BoardLimits::from(settings), settings.memo_cache_capacity as usize)
    }

    pub fn cache(&self) -> &StateCache {
        &self.cache
    }

    /// One generation forward. Cache hits return the same `Arc` that was
    /// stored on the miss.
    pub fn compute_next_state(&self, grid: &Grid) -> Result<Arc<Grid>, ComputeError> {
        grid.check_limits(&self.limits).map_err(ComputeError::InvalidBoard)?;

        let key = (grid.rows(), grid.cols(), board_hash(grid));
        if let Some(next) = self.cache.get(&key) {
            return Ok(next);
        }

        let next = Arc::new(step(grid));
        self.cache.insert(key, Arc::clone(&next));
        Ok(next)
    }
}

// =============================================================================
// TRANSITION
// =============================================================================

/// Each output row reads only the input grid, so rows are independent and
/// written into disjoint chunks.
#[cfg(feature = "parallel")]
pub fn step(grid: &Grid) -> Grid {
    let cols = grid.cols();
    let mut cells = vec![false; grid.rows() * cols];
    cells
        .par_chunks_mut(cols)
        .enumerate()
        .for_each(|(row, out)| fill_row(grid, row, out));
    Grid::with_cells(grid.rows(), cols, cells)
}

#[cfg(not(feature = "parallel"))]
pub fn step(grid: &Grid) -> Grid {
    step_sequential(grid)
}

pub fn step_sequential(grid: &Grid) -> Grid {
    let cols = grid.cols();
    let mut cells = vec![false; grid.rows() * cols];
    for (row, out) in cells.chunks_mut(cols).enumerate() {
        fill_row(grid, row, out);
    }
    Grid::with_cells(grid.rows(), cols, cells)
}

#[inline]
fn fill_row(grid: &Grid, row: usize, out: &mut [bool]) {
    for (col, cell) in out.iter_mut().enumerate() {
        *cell = next_value_at(grid, row, col);
    }
}
