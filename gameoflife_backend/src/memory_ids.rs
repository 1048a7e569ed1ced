//! Central registry for stable memory IDs.
//!
//! All memory IDs must be unique across the canister; the test below guards it.
//!
//! Allocation strategy:
//! - 0-9: Board repository (boards, id counter)
//! - 10-19: Configuration

// Board repository (0-9)
pub const BOARDS_MEMORY_ID: u8 = 0;
pub const NEXT_BOARD_ID_MEMORY_ID: u8 = 1;

// Configuration (10-19)
pub const SETTINGS_MEMORY_ID: u8 = 10;
