//! Iterate a board until a generation repeats (fixed point or cycle) or the
//! attempt budget runs out.

use std::collections::HashSet;
use std::sync::Arc;

use crate::engine::ComputeEngine;
use crate::error::ResolutionError;
use crate::grid::Grid;
use crate::hasher::{board_hash, StateHash};
use crate::types::{DEFAULT_MAX_ALLOWED_ATTEMPTS, MIN_ALLOWED_ATTEMPTS};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    /// The generation whose hash was seen for the second time
    pub final_grid: Arc<Grid>,
    pub completed: bool,
    /// Loop iteration that detected the repeat, which is also the number of
    /// steps taken from the initial grid.
    pub attempts: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FinalStateResolver {
    max_allowed_attempts: u32,
}

impl Default for FinalStateResolver {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ALLOWED_ATTEMPTS)
    }
}

impl FinalStateResolver {
    pub fn new(max_allowed_attempts: u32) -> Self {
        Self { max_allowed_attempts }
    }

    pub fn max_allowed_attempts(&self) -> u32 {
        self.max_allowed_attempts
    }

    pub fn check_attempts(&self, max_attempts: u32) -> Result<(), ResolutionError> {
        if !(MIN_ALLOWED_ATTEMPTS..=self.max_allowed_attempts).contains(&max_attempts) {
            return Err(ResolutionError::InvalidMaxAttempts {
                min: MIN_ALLOWED_ATTEMPTS,
                max: self.max_allowed_attempts,
            });
        }
        Ok(())
    }

    /// Each iteration hashes the current generation; a hash seen before ends
    /// the run successfully, otherwise it is recorded and the board advances.
    /// A fixed point is therefore detected one iteration after it first
    /// appears, and a period-2 oscillator two iterations after its start.
    pub fn resolve(
        &self,
        engine: &ComputeEngine,
        initial: Grid,
        max_attempts: u32,
    ) -> Result<Resolution, ResolutionError> {
        self.check_attempts(max_attempts)?;

        let mut current = Arc::new(initial);
        let mut seen: HashSet<StateHash> = HashSet::new();

        for attempt in 0..max_attempts {
            if !seen.insert(board_hash(&current)) {
                return Ok(Resolution {
                    final_grid: current,
                    completed: true,
                    attempts: attempt,
                });
            }
            current = engine.compute_next_state(&current)?;
        }

        Err(ResolutionError::NoFinalStateReached { attempts: max_attempts })
    }
}
