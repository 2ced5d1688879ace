//! Index-space geometry and edge-length tiling.
//!
//! ## Purpose
//!
//! This module describes the logical N x M recurrence matrix without ever
//! materializing it: its shape, the diagonals that run through it, and the
//! tiling of the index space into rectangular blocks of side `edge_length`.
//! Blocks are the unit of work handed to compute units by the selector.
//!
//! ## Key concepts
//!
//! * **Rows** index the x-vectors, **columns** index the y-vectors.
//! * A **diagonal offset** is `d = column - row`; the main diagonal is `d = 0`.
//! * The **Theiler band** is the set of cells with `|row - column| <= t`. Because
//!   the band is a union of whole diagonals, a diagonal is either entirely in
//!   the band or entirely outside it.
//! * **Tiling** cuts rows and columns at multiples of `edge_length`. Block
//!   `(bi, bj)` covers rows `[bi*E, min((bi+1)*E, N))` and the analogous columns.
//!
//! ## Invariants
//!
//! * Blocks are half-open rectangles and never empty.
//! * The blocks of a [`Tiling`] cover the index space exactly once.
//! * Block indices are enumerated in row-major order.

use core::fmt;

use crate::primitives::errors::{Result, RqaError};

// ============================================================================
// Matrix Shape
// ============================================================================

/// Shape of the logical recurrence matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatrixShape {
    /// Number of x-vectors (rows).
    pub rows: usize,

    /// Number of y-vectors (columns).
    pub cols: usize,
}

impl MatrixShape {
    /// Create a new shape.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    /// Returns `true` if the matrix has no cells.
    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    /// Total number of cells, Theiler band included.
    pub fn cells(&self) -> u64 {
        self.rows as u64 * self.cols as u64
    }

    /// Smallest diagonal offset present in the matrix.
    pub fn min_offset(&self) -> isize {
        1 - self.rows as isize
    }

    /// Largest diagonal offset present in the matrix.
    pub fn max_offset(&self) -> isize {
        self.cols as isize - 1
    }

    /// Row range `[start, end)` traversed by diagonal `offset`.
    pub fn diagonal_rows(&self, offset: isize) -> (usize, usize) {
        let start = if offset < 0 { offset.unsigned_abs() } else { 0 };
        let end = if offset >= 0 {
            self.rows.min(self.cols.saturating_sub(offset as usize))
        } else {
            self.rows.min(self.cols + offset.unsigned_abs())
        };
        (start, end.max(start))
    }

    /// Number of cells on diagonal `offset`.
    pub fn diagonal_length(&self, offset: isize) -> usize {
        let (start, end) = self.diagonal_rows(offset);
        end - start
    }

    /// Returns `true` if diagonal `offset` lies inside the Theiler band.
    #[inline]
    pub fn in_theiler_band(offset: isize, theiler_corrector: usize) -> bool {
        offset.unsigned_abs() <= theiler_corrector
    }

    /// Number of cells outside the Theiler band.
    pub fn eligible_cells(&self, theiler_corrector: usize) -> u64 {
        if self.is_empty() {
            return 0;
        }
        (self.min_offset()..=self.max_offset())
            .filter(|&d| !Self::in_theiler_band(d, theiler_corrector))
            .map(|d| self.diagonal_length(d) as u64)
            .sum()
    }
}

// ============================================================================
// Index Block
// ============================================================================

/// Half-open rectangular sub-block `[row_start, row_end) x [col_start, col_end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexBlock {
    /// First row (inclusive).
    pub row_start: usize,

    /// Last row (exclusive).
    pub row_end: usize,

    /// First column (inclusive).
    pub col_start: usize,

    /// Last column (exclusive).
    pub col_end: usize,
}

impl IndexBlock {
    /// Create a block, rejecting empty or inverted ranges.
    pub fn new(row_start: usize, row_end: usize, col_start: usize, col_end: usize) -> Result<Self> {
        if row_start >= row_end || col_start >= col_end {
            return Err(RqaError::invalid(
                "index_block",
                format!(
                    "empty block [{}..{}) x [{}..{})",
                    row_start, row_end, col_start, col_end
                ),
            ));
        }
        Ok(Self {
            row_start,
            row_end,
            col_start,
            col_end,
        })
    }

    /// Number of rows in the block.
    #[inline]
    pub fn rows(&self) -> usize {
        self.row_end - self.row_start
    }

    /// Number of columns in the block.
    #[inline]
    pub fn cols(&self) -> usize {
        self.col_end - self.col_start
    }

    /// Number of cells in the block.
    #[inline]
    pub fn cells(&self) -> usize {
        self.rows() * self.cols()
    }

    /// Inclusive range of diagonal offsets crossing the block.
    pub fn offsets(&self) -> (isize, isize) {
        (
            self.col_start as isize - (self.row_end as isize - 1),
            self.col_end as isize - 1 - self.row_start as isize,
        )
    }
}

impl fmt::Display for IndexBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}..{}) x [{}..{})",
            self.row_start, self.row_end, self.col_start, self.col_end
        )
    }
}

// ============================================================================
// Tiling
// ============================================================================

/// Partition of a [`MatrixShape`] into blocks of side `edge_length`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tiling {
    /// Shape being tiled.
    pub shape: MatrixShape,

    /// Side length of a full block.
    pub edge_length: usize,
}

impl Tiling {
    /// Create a tiling; `edge_length` must be at least 1.
    pub fn new(shape: MatrixShape, edge_length: usize) -> Result<Self> {
        if edge_length == 0 {
            return Err(RqaError::invalid("edge_length", "must be at least 1"));
        }
        Ok(Self { shape, edge_length })
    }

    /// Number of block rows.
    pub fn row_blocks(&self) -> usize {
        self.shape.rows.div_ceil(self.edge_length)
    }

    /// Number of block columns.
    pub fn col_blocks(&self) -> usize {
        self.shape.cols.div_ceil(self.edge_length)
    }

    /// Total number of blocks.
    pub fn block_count(&self) -> usize {
        self.row_blocks() * self.col_blocks()
    }

    /// Block at grid position `(bi, bj)`.
    pub fn block_at(&self, bi: usize, bj: usize) -> Option<IndexBlock> {
        if bi >= self.row_blocks() || bj >= self.col_blocks() {
            return None;
        }
        let e = self.edge_length;
        Some(IndexBlock {
            row_start: bi * e,
            row_end: ((bi + 1) * e).min(self.shape.rows),
            col_start: bj * e,
            col_end: ((bj + 1) * e).min(self.shape.cols),
        })
    }

    /// Block with row-major index `index`.
    pub fn block(&self, index: usize) -> Option<IndexBlock> {
        let col_blocks = self.col_blocks();
        if col_blocks == 0 {
            return None;
        }
        self.block_at(index / col_blocks, index % col_blocks)
    }

    /// Iterate all blocks in row-major order.
    pub fn blocks(&self) -> impl Iterator<Item = IndexBlock> + '_ {
        (0..self.block_count()).filter_map(move |i| self.block(i))
    }

    /// Row-major grid index of `block`, if it is exactly one tile of this tiling.
    pub fn grid_index(&self, block: &IndexBlock) -> Option<usize> {
        let e = self.edge_length;
        if block.row_start % e != 0 || block.col_start % e != 0 {
            return None;
        }
        let (bi, bj) = (block.row_start / e, block.col_start / e);
        match self.block_at(bi, bj) {
            Some(tile) if tile == *block => Some(bi * self.col_blocks() + bj),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eligible_cells_excludes_band() {
        let shape = MatrixShape::new(5, 5);
        assert_eq!(shape.eligible_cells(0), 20);
        assert_eq!(shape.eligible_cells(1), 12);
        assert_eq!(shape.eligible_cells(4), 0);
    }

    #[test]
    fn diagonal_lengths_cover_rectangular_matrix() {
        let shape = MatrixShape::new(3, 5);
        let total: usize = (shape.min_offset()..=shape.max_offset())
            .map(|d| shape.diagonal_length(d))
            .sum();
        assert_eq!(total, 15);
        assert_eq!(shape.diagonal_rows(-2), (2, 3));
        assert_eq!(shape.diagonal_rows(3), (0, 2));
    }

    #[test]
    fn tiling_covers_ragged_edges() {
        let tiling = Tiling::new(MatrixShape::new(7, 5), 3).unwrap();
        assert_eq!(tiling.row_blocks(), 3);
        assert_eq!(tiling.col_blocks(), 2);
        let cells: usize = tiling.blocks().map(|b| b.cells()).sum();
        assert_eq!(cells, 35);
        let last = tiling.block(5).unwrap();
        assert_eq!(last, IndexBlock::new(6, 7, 3, 5).unwrap());
        assert_eq!(tiling.grid_index(&last), Some(5));
    }

    #[test]
    fn offsets_span_the_block_corners() {
        let block = IndexBlock::new(3, 6, 0, 3).unwrap();
        assert_eq!(block.offsets(), (-5, -1));
    }

    #[test]
    fn zero_edge_length_is_rejected() {
        assert!(Tiling::new(MatrixShape::new(2, 2), 0).is_err());
    }
}
