//! Immutable board representation and validation of caller-supplied boards.

use std::fmt;

use crate::error::ValidationError;
use crate::types::{GameOfLifeSettings, DEFAULT_MAX_BOARD_HEIGHT, DEFAULT_MAX_BOARD_WIDTH};

// =============================================================================
// CELL NORMALIZATION
// =============================================================================

/// A transport encoding of a single cell. `None` means "not a valid cell value".
pub trait CellValue {
    fn to_alive(&self) -> Option<bool>;
}

impl CellValue for bool {
    #[inline]
    fn to_alive(&self) -> Option<bool> {
        Some(*self)
    }
}

impl CellValue for u8 {
    #[inline]
    fn to_alive(&self) -> Option<bool> {
        match self {
            0 => Some(false),
            1 => Some(true),
            _ => None,
        }
    }
}

impl CellValue for i32 {
    #[inline]
    fn to_alive(&self) -> Option<bool> {
        match self {
            0 => Some(false),
            1 => Some(true),
            _ => None,
        }
    }
}

// =============================================================================
// LIMITS
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoardLimits {
    pub max_height: usize,
    pub max_width: usize,
}

impl Default for BoardLimits {
    fn default() -> Self {
        Self {
            max_height: DEFAULT_MAX_BOARD_HEIGHT as usize,
            max_width: DEFAULT_MAX_BOARD_WIDTH as usize,
        }
    }
}

impl From<&GameOfLifeSettings> for BoardLimits {
    fn from(settings: &GameOfLifeSettings) -> Self {
        Self {
            max_height: settings.max_board_height as usize,
            max_width: settings.max_board_width as usize,
        }
    }
}

impl BoardLimits {
    fn exceeded(&self) -> ValidationError {
        ValidationError::BoardSizeExceeded {
            max_height: self.max_height as u32,
            max_width: self.max_width as u32,
        }
    }
}

// =============================================================================
// GRID
// =============================================================================

/// One generation: a `rows x cols` boolean matrix stored row-major.
///
/// Fields are private, so every `Grid` in existence satisfies the shape
/// invariants (non-zero dimensions, `cells.len() == rows * cols`). A new
/// generation is always a new value.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<bool>,
}

impl Grid {
    /// Upload-time validation: structural checks plus at least one live cell.
    pub fn validate<T: CellValue>(raw: &[Vec<T>], limits: &BoardLimits) -> Result<Self, ValidationError> {
        let grid = Self::from_rows(raw, limits)?;
        if grid.is_all_dead() {
            return Err(ValidationError::EmptyBoard);
        }
        Ok(grid)
    }

    /// Structural validation only. All-dead boards are accepted here since they
    /// are legitimate intermediate generations.
    pub fn from_rows<T: CellValue>(raw: &[Vec<T>], limits: &BoardLimits) -> Result<Self, ValidationError> {
        let cols = match raw.first() {
            Some(first) if !first.is_empty() => first.len(),
            _ => return Err(ValidationError::NullOrEmptyBoard),
        };
        let rows = raw.len();

        if rows > limits.max_height || cols > limits.max_width {
            return Err(limits.exceeded());
        }

        for (i, row) in raw.iter().enumerate() {
            if row.len() != cols {
                return Err(ValidationError::InconsistentRowSize { row: i as u32 });
            }
        }

        let mut cells = Vec::with_capacity(rows * cols);
        for (i, row) in raw.iter().enumerate() {
            for (j, value) in row.iter().enumerate() {
                let alive = value.to_alive().ok_or(ValidationError::InvalidCellValue {
                    row: i as u32,
                    col: j as u32,
                })?;
                cells.push(alive);
            }
        }

        Ok(Self { rows, cols, cells })
    }

    /// Rebuild from a flat row-major cell vector (storage format).
    pub fn from_flat(rows: usize, cols: usize, cells: Vec<bool>) -> Result<Self, ValidationError> {
        if rows == 0 || cols == 0 {
            return Err(ValidationError::NullOrEmptyBoard);
        }
        if cells.len() != rows * cols {
            // First row that can't be filled completely
            let row = (cells.len() / cols).min(rows - 1);
            return Err(ValidationError::InconsistentRowSize { row: row as u32 });
        }
        Ok(Self { rows, cols, cells })
    }

    /// Shape-preserving constructor for the engine. Caller guarantees the length.
    pub(crate) fn with_cells(rows: usize, cols: usize, cells: Vec<bool>) -> Self {
        debug_assert_eq!(cells.len(), rows * cols);
        Self { rows, cols, cells }
    }

    /// Re-check a grid against (possibly reconfigured) size limits.
    pub fn check_limits(&self, limits: &BoardLimits) -> Result<(), ValidationError> {
        if self.rows > limits.max_height || self.cols > limits.max_width {
            return Err(limits.exceeded());
        }
        Ok(())
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Row-major cell sequence
    #[inline]
    pub fn cells(&self) -> &[bool] {
        &self.cells
    }

    #[inline]
    pub fn row(&self, row: usize) -> &[bool] {
        let start = row * self.cols;
        &self.cells[start..start + self.cols]
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<bool> {
        if row < self.rows && col < self.cols {
            Some(self.cells[row * self.cols + col])
        } else {
            None
        }
    }

    /// Unchecked access for the hot loop; `row`/`col` must be in bounds.
    #[inline(always)]
    pub(crate) fn alive_at(&self, row: usize, col: usize) -> bool {
        self.cells[row * self.cols + col]
    }

    pub fn alive_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    pub fn is_all_dead(&self) -> bool {
        !self.cells.iter().any(|&c| c)
    }

    pub fn to_rows(&self) -> Vec<Vec<bool>> {
        self.cells.chunks(self.cols).map(<[bool]>::to_vec).collect()
    }

    pub fn into_cells(self) -> Vec<bool> {
        self.cells
    }
}

/// `#` for alive, `.` for dead, one line per row.
impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.cells.chunks(self.cols).enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            for &cell in row {
                f.write_str(if cell { "#" } else { "." })?;
            }
        }
        Ok(())
    }
}
