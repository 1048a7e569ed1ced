//! Error taxonomy shared by the engine and the canister API.
//!
//! Every error derives `CandidType` so callers receive typed variants rather
//! than free-form strings.

use candid::{CandidType, Deserialize};
use serde::Serialize;
use thiserror::Error;

use crate::types::BoardId;

/// Structural problems with a submitted or stored board.
#[derive(CandidType, Deserialize, Serialize, Error, Clone, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("the board cannot be null or empty")]
    NullOrEmptyBoard,

    #[error("row {row} is null or inconsistent in size")]
    InconsistentRowSize { row: u32 },

    #[error("board contains an invalid value at ({row}, {col}); only 0 and 1 are allowed")]
    InvalidCellValue { row: u32, col: u32 },

    #[error("board size exceeds limit; max allowed size is {max_height} x {max_width}")]
    BoardSizeExceeded { max_height: u32, max_width: u32 },

    /// Upload-time only: at least one cell must be alive.
    #[error("the board cannot be empty")]
    EmptyBoard,
}

#[derive(CandidType, Deserialize, Serialize, Error, Clone, Debug, PartialEq, Eq)]
pub enum RuleError {
    #[error("the provided cell coordinates (x: {x}, y: {y}) are out of bounds")]
    OutOfBounds { x: i64, y: i64 },
}

#[derive(CandidType, Deserialize, Serialize, Error, Clone, Debug, PartialEq, Eq)]
pub enum ComputeError {
    #[error("invalid board: {0}")]
    InvalidBoard(ValidationError),
}

#[derive(CandidType, Deserialize, Serialize, Error, Clone, Debug, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("maxAttempts must be between {min} and {max}")]
    InvalidMaxAttempts { min: u32, max: u32 },

    /// Budget exhausted without a repeat. An expected outcome, not a fault.
    #[error("no final state reached within {attempts} attempts")]
    NoFinalStateReached { attempts: u32 },

    #[error(transparent)]
    Compute(#[from] ComputeError),
}

/// Errors surfaced by the canister endpoints.
#[derive(CandidType, Deserialize, Serialize, Error, Clone, Debug, PartialEq, Eq)]
pub enum GameOfLifeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("the provided board id is invalid")]
    InvalidBoardId,

    #[error("board {id} not found")]
    BoardNotFound { id: BoardId },

    #[error(transparent)]
    Compute(#[from] ComputeError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error("invalid settings: {reason}")]
    InvalidSettings { reason: String },
}
