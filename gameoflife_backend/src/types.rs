use candid::{CandidType, Deserialize};
use ic_stable_structures::storable::Bound;
use ic_stable_structures::Storable;
use serde::Serialize;
use std::borrow::Cow;

use crate::error::GameOfLifeError;

// =============================================================================
// COMPUTE CONSTANTS
// =============================================================================

// Polynomial state hash
pub const HASH_SEED: u32 = 17;
pub const HASH_MULTIPLIER: u32 = 31;
pub const ALIVE_CELL_VALUE: u32 = 1;
pub const DEAD_CELL_VALUE: u32 = 0;

// Conway's B3/S23
pub const MIN_SURVIVAL_NEIGHBORS: u8 = 2;
pub const MAX_SURVIVAL_NEIGHBORS: u8 = 3;
pub const REQUIRED_REPRODUCTION_NEIGHBORS: u8 = 3;
pub const TOTAL_NEIGHBORS: usize = 8;

/// (row_delta, col_delta) for the Moore neighborhood, row-major order.
pub const NEIGHBOR_OFFSETS: [(isize, isize); TOTAL_NEIGHBORS] = [
    (-1, -1), // NW
    (-1, 0),  // N
    (-1, 1),  // NE
    (0, -1),  // W
    (0, 1),   // E
    (1, -1),  // SW
    (1, 0),   // S
    (1, 1),   // SE
];

/// Lower bound of the attempt budget for final-state requests.
pub const MIN_ALLOWED_ATTEMPTS: u32 = 1;

// =============================================================================
// SETTINGS
// =============================================================================

pub const DEFAULT_MAX_ATTEMPTS: u32 = 200;
pub const DEFAULT_MAX_ALLOWED_ATTEMPTS: u32 = 1000;
pub const DEFAULT_MAX_BOARD_WIDTH: u32 = 500;
pub const DEFAULT_MAX_BOARD_HEIGHT: u32 = 500;
pub const DEFAULT_MEMO_CACHE_CAPACITY: u32 = 256;

/// Canister configuration, passed as the optional init/upgrade argument.
#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct GameOfLifeSettings {
    /// Attempt budget used when a final-state request doesn't name one
    pub default_max_attempts: u32,
    pub max_allowed_attempts: u32,
    pub max_board_width: u32,
    pub max_board_height: u32,
    /// Maximum memoized transitions. 0 disables memoization.
    pub memo_cache_capacity: u32,
}

impl Default for GameOfLifeSettings {
    fn default() -> Self {
        Self {
            default_max_attempts: DEFAULT_MAX_ATTEMPTS,
            max_allowed_attempts: DEFAULT_MAX_ALLOWED_ATTEMPTS,
            max_board_width: DEFAULT_MAX_BOARD_WIDTH,
            max_board_height: DEFAULT_MAX_BOARD_HEIGHT,
            memo_cache_capacity: DEFAULT_MEMO_CACHE_CAPACITY,
        }
    }
}

impl GameOfLifeSettings {
    pub fn validate(&self) -> Result<(), GameOfLifeError> {
        let invalid = |reason: &str| GameOfLifeError::InvalidSettings {
            reason: reason.to_string(),
        };

        if self.max_board_width == 0 || self.max_board_height == 0 {
            return Err(invalid("board limits must be greater than zero"));
        }
        if self.max_allowed_attempts < MIN_ALLOWED_ATTEMPTS {
            return Err(invalid("max_allowed_attempts must be at least 1"));
        }
        if self.default_max_attempts < MIN_ALLOWED_ATTEMPTS
            || self.default_max_attempts > self.max_allowed_attempts
        {
            return Err(invalid(
                "default_max_attempts must be between 1 and max_allowed_attempts",
            ));
        }
        Ok(())
    }
}

impl Storable for GameOfLifeSettings {
    fn to_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Owned(
            candid::encode_one(self).expect(
                "CRITICAL: Failed to encode GameOfLifeSettings. \
                 This indicates a bug in candid serialization.",
            ),
        )
    }

    fn into_bytes(self) -> Vec<u8> {
        self.to_bytes().into_owned()
    }

    fn from_bytes(bytes: Cow<'_, [u8]>) -> Self {
        candid::decode_one(&bytes).expect(
            "CRITICAL: Failed to decode GameOfLifeSettings from stable storage. \
             This indicates storage corruption or an incompatible canister upgrade.",
        )
    }

    const BOUND: Bound = Bound::Unbounded;
}

// =============================================================================
// API TYPES
// =============================================================================

/// Opaque board identifier. Issued from 1 upwards; 0 is never valid.
pub type BoardId = u64;

/// Raw board as accepted by `upload_board`.
#[derive(CandidType, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum BoardInput {
    Cells(Vec<Vec<bool>>),
    /// 0 = dead, 1 = alive. Anything else is rejected.
    Bits(Vec<Vec<u8>>),
}

/// Board returned to callers
#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct BoardView {
    pub id: BoardId,
    pub rows: u32,
    pub cols: u32,
    pub cells: Vec<Vec<bool>>,
    pub generation: u64,
    pub updated_at_ns: u64,
}

#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct FinalStateResult {
    pub board: BoardView,
    pub completed: bool,
    /// Iteration on which the repeated state was detected
    pub attempts: u32,
}

#[derive(CandidType, Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: u64,
    pub capacity: u64,
    pub hits: u64,
    pub misses: u64,
}
