//! Game of Life: deterministic board evolution as a canister.
//!
//! Boards are uploaded once, stored in stable memory, and advanced either one
//! generation at a time or until the sequence of generations repeats. Every
//! transition goes through a shared memoizing compute engine.

use ic_cdk::{init, post_upgrade, pre_upgrade, query, update};
use ic_stable_structures::memory_manager::{MemoryId, MemoryManager, VirtualMemory};
use ic_stable_structures::{DefaultMemoryImpl, StableCell};
use std::cell::RefCell;

// =============================================================================
// MODULE DECLARATIONS
// =============================================================================

pub mod benchmarks;
pub mod engine;
pub mod error;
pub mod grid;
pub mod hasher;
pub mod logging;
pub mod memory_ids;
pub mod resolver;
pub mod rules;
pub mod service;
pub mod storage;
pub mod types;

// =============================================================================
// RE-EXPORTS
// =============================================================================

pub use benchmarks::BenchmarkReport;
pub use engine::ComputeEngine;
pub use error::GameOfLifeError;
pub use grid::{BoardLimits, Grid};
pub use resolver::FinalStateResolver;
pub use service::GameOfLifeService;
pub use types::{BoardId, BoardInput, BoardView, CacheStats, FinalStateResult, GameOfLifeSettings};

use memory_ids::{BOARDS_MEMORY_ID, NEXT_BOARD_ID_MEMORY_ID, SETTINGS_MEMORY_ID};
use storage::{BoardStore, StableBoardStore};

// =============================================================================
// MEMORY MANAGEMENT
// =============================================================================

pub type Memory = VirtualMemory<DefaultMemoryImpl>;

thread_local! {
    static MEMORY_MANAGER: RefCell<MemoryManager<DefaultMemoryImpl>> =
        RefCell::new(MemoryManager::init(DefaultMemoryImpl::default()));

    static SETTINGS: RefCell<StableCell<GameOfLifeSettings, Memory>> = RefCell::new(
        StableCell::init(memory(SETTINGS_MEMORY_ID), GameOfLifeSettings::default())
    );

    static SERVICE: RefCell<GameOfLifeService<StableBoardStore<Memory>>> = RefCell::new(
        GameOfLifeService::new(
            StableBoardStore::init(memory(BOARDS_MEMORY_ID), memory(NEXT_BOARD_ID_MEMORY_ID)),
            SETTINGS.with(|s| s.borrow().get().clone()),
        )
    );
}

fn memory(id: u8) -> Memory {
    MEMORY_MANAGER.with(|m| m.borrow().get(MemoryId::new(id)))
}

/// Validate, persist and apply settings. Invalid settings trap so a bad
/// install or upgrade argument is rejected as a whole.
fn configure(settings: GameOfLifeSettings) {
    if let Err(e) = SERVICE.with(|s| s.borrow_mut().apply_settings(settings.clone())) {
        ic_cdk::trap(format!("Invalid settings: {}", e));
    }
    SETTINGS.with(|s| {
        let _ = s.borrow_mut().set(settings);
    });
}

// =============================================================================
// LIFECYCLE HOOKS
// =============================================================================

#[init]
fn init(settings: Option<GameOfLifeSettings>) {
    configure(settings.unwrap_or_default());
    log_info!("Game of Life Backend Initialized");
}

#[pre_upgrade]
fn pre_upgrade() {
    // Boards, id counter and settings live in stable structures already
}

#[post_upgrade]
fn post_upgrade(settings: Option<GameOfLifeSettings>) {
    if let Some(settings) = settings {
        configure(settings);
    }
    let boards = SERVICE.with(|s| s.borrow().store().len());
    log_info!("Game of Life Backend upgraded. {} boards restored", boards);
}

// =============================================================================
// API ENDPOINTS
// =============================================================================

#[update]
fn upload_board(board: BoardInput) -> Result<BoardId, GameOfLifeError> {
    benchmark!(UploadBoard);
    let now = ic_cdk::api::time();
    SERVICE.with(|s| s.borrow_mut().upload_board(board, now))
}

#[update]
fn get_next_state(id: BoardId) -> Result<BoardView, GameOfLifeError> {
    benchmark!(NextState);
    let now = ic_cdk::api::time();
    SERVICE.with(|s| s.borrow_mut().get_next_state(id, now))
}

#[update]
fn get_final_state(id: BoardId, max_attempts: Option<u32>) -> Result<FinalStateResult, GameOfLifeError> {
    benchmark!(FinalState);
    let now = ic_cdk::api::time();
    SERVICE.with(|s| s.borrow_mut().get_final_state(id, max_attempts, now))
}

#[query]
fn get_board(id: BoardId) -> Result<BoardView, GameOfLifeError> {
    SERVICE.with(|s| s.borrow().get_board(id))
}

#[query]
fn get_settings() -> GameOfLifeSettings {
    SERVICE.with(|s| s.borrow().settings().clone())
}

#[query]
fn get_cache_stats() -> CacheStats {
    SERVICE.with(|s| s.borrow().engine().cache().stats())
}

#[query]
fn greet(name: String) -> String {
    format!("Welcome to Game of Life, {}! Upload a board and watch it evolve.", name)
}

// =============================================================================
// BENCHMARK ENDPOINTS
// =============================================================================

#[query]
fn get_benchmark_report() -> BenchmarkReport {
    benchmarks::report(ic_cdk::api::time())
}

#[update]
fn reset_benchmarks() {
    benchmarks::reset(ic_cdk::api::time());
}

ic_cdk::export_candid!();
