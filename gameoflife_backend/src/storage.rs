//! Board repository keyed by `BoardId`.

use candid::{CandidType, Deserialize};
use ic_stable_structures::storable::Bound;
use ic_stable_structures::{Memory, StableBTreeMap, StableCell, Storable};
use std::borrow::Cow;

use crate::error::ValidationError;
use crate::grid::Grid;
use crate::types::{BoardId, BoardView};

const FIRST_BOARD_ID: BoardId = 1;

// =============================================================================
// STORED BOARD
// =============================================================================

/// Persisted board record. Cells are row-major.
#[derive(CandidType, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct StoredBoard {
    pub id: BoardId,
    pub rows: u32,
    pub cols: u32,
    pub cells: Vec<bool>,
    pub generation: u64,
    pub created_at_ns: u64,
    pub updated_at_ns: u64,
}

impl StoredBoard {
    pub fn new(id: BoardId, grid: &Grid, now_ns: u64) -> Self {
        Self {
            id,
            rows: grid.rows() as u32,
            cols: grid.cols() as u32,
            cells: grid.cells().to_vec(),
            generation: 0,
            created_at_ns: now_ns,
            updated_at_ns: now_ns,
        }
    }

    pub fn grid(&self) -> Result<Grid, ValidationError> {
        Grid::from_flat(self.rows as usize, self.cols as usize, self.cells.clone())
    }

    /// Replace the cells with a generation `steps` ahead of the current one.
    pub fn advance(&mut self, grid: &Grid, steps: u64, now_ns: u64) {
        self.rows = grid.rows() as u32;
        self.cols = grid.cols() as u32;
        self.cells = grid.cells().to_vec();
        self.generation += steps;
        self.updated_at_ns = now_ns;
    }

    pub fn view(&self) -> BoardView {
        let cols = (self.cols as usize).max(1);
        BoardView {
            id: self.id,
            rows: self.rows,
            cols: self.cols,
            cells: self.cells.chunks(cols).map(<[bool]>::to_vec).collect(),
            generation: self.generation,
            updated_at_ns: self.updated_at_ns,
        }
    }
}

impl Storable for StoredBoard {
    fn to_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Owned(
            candid::encode_one(self).expect(
                "CRITICAL: Failed to encode StoredBoard. \
                 This indicates a bug in candid serialization.",
            ),
        )
    }

    fn into_bytes(self) -> Vec<u8> {
        self.to_bytes().into_owned()
    }

    fn from_bytes(bytes: Cow<'_, [u8]>) -> Self {
        candid::decode_one(&bytes).expect(
            "CRITICAL: Failed to decode StoredBoard from stable storage. \
             This indicates storage corruption or an incompatible canister upgrade.",
        )
    }

    const BOUND: Bound = Bound::Unbounded;
}

// =============================================================================
// REPOSITORY
// =============================================================================

pub trait BoardStore {
    /// Next unused id. Never returns 0.
    fn allocate_id(&mut self) -> BoardId;
    fn save(&mut self, board: StoredBoard);
    fn get(&self, id: BoardId) -> Option<StoredBoard>;
    fn len(&self) -> u64;
}

/// Stable-memory repository; survives upgrades without pre/post hooks.
pub struct StableBoardStore<M: Memory> {
    boards: StableBTreeMap<BoardId, StoredBoard, M>,
    next_id: StableCell<BoardId, M>,
}

impl<M: Memory> StableBoardStore<M> {
    pub fn init(boards_memory: M, counter_memory: M) -> Self {
        Self {
            boards: StableBTreeMap::init(boards_memory),
            next_id: StableCell::init(counter_memory, FIRST_BOARD_ID),
        }
    }
}

impl<M: Memory> BoardStore for StableBoardStore<M> {
    fn allocate_id(&mut self) -> BoardId {
        let id = (*self.next_id.get()).max(FIRST_BOARD_ID);
        let _ = self.next_id.set(id + 1);
        id
    }

    fn save(&mut self, board: StoredBoard) {
        self.boards.insert(board.id, board);
    }

    fn get(&self, id: BoardId) -> Option<StoredBoard> {
        self.boards.get(&id)
    }

    fn len(&self) -> u64 {
        self.boards.len()
    }
}
