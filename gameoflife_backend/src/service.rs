//! Board lifecycle: upload, single step, iterate to final state.
//!
//! The service owns the compute engine (and with it the memo cache) and a
//! board store. Timestamps are passed in by the caller so the service never
//! touches the IC system API directly.

use crate::engine::ComputeEngine;
use crate::error::GameOfLifeError;
use crate::grid::{BoardLimits, Grid};
use crate::resolver::FinalStateResolver;
use crate::storage::{BoardStore, StoredBoard};
use crate::types::{BoardId, BoardInput, BoardView, FinalStateResult, GameOfLifeSettings};
use crate::{log_info, log_warn};

pub struct GameOfLifeService<S: BoardStore> {
    store: S,
    engine: ComputeEngine,
    resolver: FinalStateResolver,
    settings: GameOfLifeSettings,
}

impl<S: BoardStore> GameOfLifeService<S> {
    pub fn new(store: S, settings: GameOfLifeSettings) -> Self {
        Self {
            store,
            engine: ComputeEngine::from_settings(&settings),
            resolver: FinalStateResolver::new(settings.max_allowed_attempts),
            settings,
        }
    }

    pub fn settings(&self) -> &GameOfLifeSettings {
        &self.settings
    }

    pub fn engine(&self) -> &ComputeEngine {
        &self.engine
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Swap in new limits. Rebuilds the engine, which drops the memo cache.
    pub fn apply_settings(&mut self, settings: GameOfLifeSettings) -> Result<(), GameOfLifeError> {
        settings.validate()?;
        self.engine = ComputeEngine::from_settings(&settings);
        self.resolver = FinalStateResolver::new(settings.max_allowed_attempts);
        self.settings = settings;
        Ok(())
    }

    // =========================================================================
    // OPERATIONS
    // =========================================================================

    pub fn upload_board(&mut self, input: BoardInput, now_ns: u64) -> Result<BoardId, GameOfLifeError> {
        let limits = BoardLimits::from(&self.settings);
        let grid = match &input {
            BoardInput::Cells(rows) => Grid::validate(rows, &limits),
            BoardInput::Bits(rows) => Grid::validate(rows, &limits),
        }
        .inspect_err(|e| log_warn!("Upload failed: {}", e))?;

        let id = self.store.allocate_id();
        self.store.save(StoredBoard::new(id, &grid, now_ns));

        log_info!("Board uploaded successfully. ID: {} ({}x{})", id, grid.rows(), grid.cols());
        Ok(id)
    }

    /// Advance the stored board one generation and persist it. An all-dead
    /// board is returned as-is without counting a generation.
    pub fn get_next_state(&mut self, id: BoardId, now_ns: u64) -> Result<BoardView, GameOfLifeError> {
        let (mut board, grid) = self
            .load(id)
            .inspect_err(|e| log_warn!("Next state request failed: {}", e))?;

        if grid.is_all_dead() {
            return Ok(board.view());
        }

        let next = self
            .engine
            .compute_next_state(&grid)
            .inspect_err(|e| log_warn!("Next state request failed for ID {}: {}", id, e))?;

        board.advance(&next, 1, now_ns);
        self.store.save(board.clone());

        log_info!("Next state computed successfully for ID: {} (generation {})", id, board.generation);
        Ok(board.view())
    }

    /// Iterate until a generation repeats. On success the final generation is
    /// persisted; on failure the stored board is left untouched.
    ///
    /// A board that is already all dead is settled, the same as in
    /// `get_next_state`: it comes back with `attempts == 0` and its generation
    /// is neither advanced nor re-saved.
    pub fn get_final_state(
        &mut self,
        id: BoardId,
        max_attempts: Option<u32>,
        now_ns: u64,
    ) -> Result<FinalStateResult, GameOfLifeError> {
        self.resolve_and_store(id, max_attempts, now_ns)
            .inspect_err(|e| log_warn!("Final state request failed: {}", e))
    }

    pub fn get_board(&self, id: BoardId) -> Result<BoardView, GameOfLifeError> {
        self.load(id).map(|(board, _)| board.view())
    }

    // =========================================================================
    // HELPERS
    // =========================================================================

    fn resolve_and_store(
        &mut self,
        id: BoardId,
        max_attempts: Option<u32>,
        now_ns: u64,
    ) -> Result<FinalStateResult, GameOfLifeError> {
        let max_attempts = max_attempts.unwrap_or(self.settings.default_max_attempts);
        self.resolver.check_attempts(max_attempts)?;

        let (mut board, grid) = self.load(id)?;
        if grid.is_all_dead() {
            return Ok(FinalStateResult {
                board: board.view(),
                completed: true,
                attempts: 0,
            });
        }

        let resolution = self.resolver.resolve(&self.engine, grid, max_attempts)?;

        board.advance(&resolution.final_grid, resolution.attempts as u64, now_ns);
        self.store.save(board.clone());

        log_info!("Final state reached for ID: {} in {} attempts.", id, resolution.attempts);
        Ok(FinalStateResult {
            board: board.view(),
            completed: resolution.completed,
            attempts: resolution.attempts,
        })
    }

    fn load(&self, id: BoardId) -> Result<(StoredBoard, Grid), GameOfLifeError> {
        if id == 0 {
            return Err(GameOfLifeError::InvalidBoardId);
        }
        let board = self.store.get(id).ok_or(GameOfLifeError::BoardNotFound { id })?;
        let grid = board.grid()?;
        Ok((board, grid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ResolutionError, ValidationError};
    use std::collections::BTreeMap;

    /// Heap-only store for exercising the service without stable memory.
    #[derive(Default)]
    struct MemoryStore {
        boards: BTreeMap<BoardId, StoredBoard>,
        next_id: BoardId,
        saves: usize,
    }

    impl BoardStore for MemoryStore {
        fn allocate_id(&mut self) -> BoardId {
            self.next_id += 1;
            self.next_id
        }

        fn save(&mut self, board: StoredBoard) {
            self.saves += 1;
            self.boards.insert(board.id, board);
        }

        fn get(&self, id: BoardId) -> Option<StoredBoard> {
            self.boards.get(&id).cloned()
        }

        fn len(&self) -> u64 {
            self.boards.len() as u64
        }
    }

    fn service() -> GameOfLifeService<MemoryStore> {
        GameOfLifeService::new(MemoryStore::default(), GameOfLifeSettings::default())
    }

    fn bits(raw: &[&[u8]]) -> BoardInput {
        BoardInput::Bits(raw.iter().map(|r| r.to_vec()).collect())
    }

    fn rows(raw: &[&[u8]]) -> Vec<Vec<bool>> {
        raw.iter().map(|r| r.iter().map(|&c| c == 1).collect()).collect()
    }

    #[test]
    fn test_upload_saves_board_and_returns_id() {
        let mut svc = service();
        let id = svc.upload_board(bits(&[&[0, 1, 0], &[0, 0, 1], &[1, 1, 1]]), 5).unwrap();

        assert_eq!(id, 1);
        assert_eq!(svc.store().saves, 1);
        let view = svc.get_board(id).unwrap();
        assert_eq!(view.generation, 0);
        assert_eq!(view.updated_at_ns, 5);
    }

    #[test]
    fn test_upload_rejections_are_typed() {
        let mut svc = service();

        assert_eq!(
            svc.upload_board(BoardInput::Cells(vec![]), 0),
            Err(GameOfLifeError::Validation(ValidationError::NullOrEmptyBoard))
        );
        assert_eq!(
            svc.upload_board(bits(&[&[0, 1], &[0, 1, 0]]), 0),
            Err(GameOfLifeError::Validation(ValidationError::InconsistentRowSize { row: 1 }))
        );
        assert_eq!(
            svc.upload_board(bits(&[&[0, 0], &[0, 0]]), 0),
            Err(GameOfLifeError::Validation(ValidationError::EmptyBoard))
        );
        assert_eq!(
            svc.upload_board(bits(&[&[0, 3]]), 0),
            Err(GameOfLifeError::Validation(ValidationError::InvalidCellValue { row: 0, col: 1 }))
        );
        assert_eq!(svc.store().saves, 0);
    }

    #[test]
    fn test_upload_respects_configured_limits() {
        let mut svc = service();
        svc.apply_settings(GameOfLifeSettings {
            max_board_width: 2,
            max_board_height: 2,
            ..GameOfLifeSettings::default()
        })
        .unwrap();

        assert_eq!(
            svc.upload_board(BoardInput::Cells(vec![vec![true; 3]; 2]), 0),
            Err(GameOfLifeError::Validation(ValidationError::BoardSizeExceeded {
                max_height: 2,
                max_width: 2
            }))
        );
    }

    #[test]
    fn test_next_state_persists_and_bumps_generation() {
        let mut svc = service();
        let id = svc.upload_board(bits(&[&[0, 1, 0], &[0, 0, 1], &[1, 1, 1]]), 0).unwrap();

        let view = svc.get_next_state(id, 100).unwrap();

        assert_eq!(view.cells, rows(&[&[0, 0, 0], &[1, 0, 1], &[0, 1, 1]]));
        assert_eq!(view.generation, 1);
        assert_eq!(svc.get_board(id).unwrap(), view);
    }

    #[test]
    fn test_next_state_of_dead_board_is_unchanged() {
        let mut svc = service();
        // Two cells die after one step
        let id = svc.upload_board(bits(&[&[1, 1]]), 0).unwrap();
        svc.get_next_state(id, 1).unwrap();
        let saves = svc.store().saves;

        let view = svc.get_next_state(id, 2).unwrap();

        assert_eq!(view.cells, rows(&[&[0, 0]]));
        assert_eq!(view.generation, 1);
        assert_eq!(svc.store().saves, saves, "dead board must not be re-saved");
    }

    #[test]
    fn test_unknown_and_invalid_ids() {
        let mut svc = service();
        assert_eq!(svc.get_next_state(0, 0), Err(GameOfLifeError::InvalidBoardId));
        assert_eq!(svc.get_next_state(9, 0), Err(GameOfLifeError::BoardNotFound { id: 9 }));
        assert_eq!(svc.get_final_state(0, Some(5), 0), Err(GameOfLifeError::InvalidBoardId));
        assert_eq!(svc.get_final_state(9, Some(5), 0), Err(GameOfLifeError::BoardNotFound { id: 9 }));
        assert_eq!(svc.get_board(9), Err(GameOfLifeError::BoardNotFound { id: 9 }));
    }

    #[test]
    fn test_final_state_of_blinker() {
        let mut svc = service();
        let id = svc.upload_board(bits(&[&[0, 0, 0], &[1, 1, 1], &[0, 0, 0]]), 0).unwrap();

        let result = svc.get_final_state(id, Some(5), 50).unwrap();

        assert!(result.completed);
        assert_eq!(result.attempts, 2);
        assert_eq!(result.board.cells, rows(&[&[0, 0, 0], &[1, 1, 1], &[0, 0, 0]]));
        assert_eq!(result.board.generation, 2);
        assert_eq!(svc.get_board(id).unwrap().generation, 2);
    }

    #[test]
    fn test_final_state_attempt_range_checked_before_lookup() {
        let mut svc = service();
        let expected = Err(GameOfLifeError::Resolution(ResolutionError::InvalidMaxAttempts {
            min: 1,
            max: 1000,
        }));

        assert_eq!(svc.get_final_state(9, Some(0), 0), expected);
        assert_eq!(svc.get_final_state(9, Some(1001), 0), expected);
    }

    #[test]
    fn test_final_state_failure_leaves_board_untouched() {
        let mut svc = service();
        let id = svc.upload_board(bits(&[&[0, 0, 0], &[1, 1, 1], &[0, 0, 0]]), 0).unwrap();
        let before = svc.get_board(id).unwrap();

        assert_eq!(
            svc.get_final_state(id, Some(2), 10),
            Err(GameOfLifeError::Resolution(ResolutionError::NoFinalStateReached { attempts: 2 }))
        );
        assert_eq!(svc.get_board(id).unwrap(), before);
    }

    #[test]
    fn test_final_state_checks_attempts_before_id() {
        let mut svc = service();
        assert!(matches!(
            svc.get_final_state(0, Some(0), 0),
            Err(GameOfLifeError::Resolution(ResolutionError::InvalidMaxAttempts { .. }))
        ));
        assert_eq!(svc.get_final_state(0, Some(1), 0), Err(GameOfLifeError::InvalidBoardId));
    }

    #[test]
    fn test_dead_board_is_settled_for_both_endpoints() {
        let mut svc = service();
        let id = svc.upload_board(bits(&[&[1, 1]]), 0).unwrap();
        svc.get_next_state(id, 1).unwrap();
        let saves = svc.store().saves;

        let next = svc.get_next_state(id, 2).unwrap();
        let result = svc.get_final_state(id, Some(5), 3).unwrap();

        assert_eq!(next.generation, 1);
        assert!(result.completed);
        assert_eq!(result.attempts, 0);
        assert_eq!(result.board, next);
        assert_eq!(svc.get_board(id).unwrap().generation, 1);
        assert_eq!(svc.store().saves, saves);
    }

    #[test]
    fn test_final_state_with_maximal_attempt_settings() {
        let mut svc = service();
        svc.apply_settings(GameOfLifeSettings {
            default_max_attempts: u32::MAX,
            max_allowed_attempts: u32::MAX,
            ..GameOfLifeSettings::default()
        })
        .unwrap();
        let id = svc
            .upload_board(bits(&[&[0, 0, 0, 0], &[0, 1, 1, 0], &[0, 1, 1, 0], &[0, 0, 0, 0]]), 0)
            .unwrap();

        let result = svc.get_final_state(id, None, 1).unwrap();

        assert_eq!(result.attempts, 1);
        assert_eq!(result.board.generation, 1);
    }

    #[test]
    fn test_final_state_uses_default_attempts() {
        let mut svc = service();
        svc.apply_settings(GameOfLifeSettings {
            default_max_attempts: 2,
            ..GameOfLifeSettings::default()
        })
        .unwrap();
        let id = svc.upload_board(bits(&[&[0, 0, 0], &[1, 1, 1], &[0, 0, 0]]), 0).unwrap();

        assert!(matches!(
            svc.get_final_state(id, None, 0),
            Err(GameOfLifeError::Resolution(ResolutionError::NoFinalStateReached { attempts: 2 }))
        ));
    }

    #[test]
    fn test_invalid_settings_rejected_and_previous_kept() {
        let mut svc = service();
        let bad = GameOfLifeSettings {
            default_max_attempts: 2000,
            ..GameOfLifeSettings::default()
        };

        assert!(matches!(
            svc.apply_settings(bad),
            Err(GameOfLifeError::InvalidSettings { .. })
        ));
        assert_eq!(svc.settings(), &GameOfLifeSettings::default());
    }

    #[test]
    fn test_memo_cache_shared_across_boards() {
        let mut svc = service();
        let glider: &[&[u8]] = &[&[0, 1, 0], &[0, 0, 1], &[1, 1, 1]];
        let a = svc.upload_board(bits(glider), 0).unwrap();
        let b = svc.upload_board(bits(glider), 0).unwrap();

        svc.get_next_state(a, 1).unwrap();
        svc.get_next_state(b, 1).unwrap();

        let stats = svc.engine().cache().stats();
        assert_eq!((stats.hits, stats.misses), (1, 1));
    }
}
