//! Block-level recurrence discovery strategies.
//!
//! ## Purpose
//!
//! A variant computes one [`IndexBlock`] of the logical recurrence matrix and
//! reduces it to a [`BlockOutput`]: the lines that start and end inside the
//! block, plus one boundary [`RunSegment`] per diagonal and column piece that
//! may continue into a neighbouring block. The engine's merger threads those
//! segments across blocks.
//!
//! ## Design notes
//!
//! Ten variants are spanned by three axes and dispatched through a single
//! [`Variant`] value:
//!
//! * **Materialization**: `None` evaluates every cell on demand, `Bit` stores
//!   the recurrence bit of each cell (1 bit per cell), `Byte` stores a cell
//!   code (recurrent, not recurrent, excluded) in one byte per cell.
//! * **Orientation**: `Row` visits the block row by row, `Column` column by
//!   column. Both visit every diagonal and every column in increasing row
//!   order, which is all the trackers require.
//! * **Recycling**: `Recycle` keeps a single row or column buffer alive in a
//!   [`VariantScratch`] owned by the worker and reuses it for every line and
//!   every block. `Fresh` allocates a buffer for the whole block. Without
//!   materialization there is no buffer, so `None` is always `Fresh`.
//!
//! Every variant feeds cells to the same [`accumulate_block`] machinery in the
//! same row order per line, so all ten produce identical outputs.
//!
//! ## Key concepts
//!
//! ### Early exit
//!
//! The recurrence test accumulates metric components one at a time and stops
//! as soon as the finished partial distance exceeds the radius. Accumulators
//! only grow, so the decision equals `distance <= radius`.
//!
//! ### Theiler band
//!
//! Cells with `|row - col| <= theiler_corrector` are never evaluated. They
//! belong to diagonals that are excluded whole, and they break vertical runs
//! of both recurrent and non-recurrent cells.

use core::fmt;
use core::ops::Range;

use num_traits::Float;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::math::embedding::EmbeddedVectors;
use crate::math::metric::Metric;
use crate::primitives::lines::LineDistributions;
use crate::primitives::partition::{IndexBlock, MatrixShape};
use crate::primitives::runs::{RunSegment, RunTracker};

// ============================================================================
// Variant Axes
// ============================================================================

/// How the recurrence values of a block are stored before line tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Materialization {
    /// Evaluate each cell on demand.
    None,

    /// One bit per cell.
    Bit,

    /// One byte per cell.
    #[default]
    Byte,
}

/// Traversal order inside a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Orientation {
    /// Row by row.
    Row,

    /// Column by column.
    #[default]
    Column,
}

/// Buffer lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Recycling {
    /// Reuse one line buffer across lines and blocks.
    #[default]
    Recycle,

    /// Allocate one buffer per block.
    Fresh,
}

/// Which evaluation form of the metric variants use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DistanceSource {
    /// Read components from the raw series.
    Series,

    /// Read components from flattened embedded vectors.
    #[default]
    Vectors,
}

/// One combination of the three variant axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Variant {
    /// Storage of cell values.
    pub materialization: Materialization,

    /// Traversal order.
    pub orientation: Orientation,

    /// Buffer lifetime.
    pub recycling: Recycling,
}

impl Default for Variant {
    fn default() -> Self {
        Self::new(Materialization::Byte, Orientation::Column, Recycling::Recycle)
    }
}

impl Variant {
    /// Create a variant. Without materialization recycling is meaningless and
    /// is normalized to `Fresh`.
    pub const fn new(
        materialization: Materialization,
        orientation: Orientation,
        recycling: Recycling,
    ) -> Self {
        let recycling = match materialization {
            Materialization::None => Recycling::Fresh,
            _ => recycling,
        };
        Self {
            materialization,
            orientation,
            recycling,
        }
    }

    /// All ten distinct variants.
    pub fn all() -> [Variant; 10] {
        use Materialization as M;
        use Orientation as O;
        use Recycling as R;
        [
            Variant::new(M::None, O::Row, R::Fresh),
            Variant::new(M::None, O::Column, R::Fresh),
            Variant::new(M::Bit, O::Row, R::Recycle),
            Variant::new(M::Bit, O::Row, R::Fresh),
            Variant::new(M::Bit, O::Column, R::Recycle),
            Variant::new(M::Bit, O::Column, R::Fresh),
            Variant::new(M::Byte, O::Row, R::Recycle),
            Variant::new(M::Byte, O::Row, R::Fresh),
            Variant::new(M::Byte, O::Column, R::Recycle),
            Variant::new(M::Byte, O::Column, R::Fresh),
        ]
    }

    /// Compute one block.
    pub fn compute<T: Float>(
        &self,
        ctx: &BlockContext<'_, T>,
        block: IndexBlock,
        scratch: &mut VariantScratch,
    ) -> BlockOutput {
        let orientation = self.orientation;
        match (self.materialization, self.recycling) {
            (Materialization::None, _) => {
                accumulate_block(block, ctx.theiler_corrector, orientation, |i, j| ctx.cell(i, j))
            }
            (Materialization::Byte, Recycling::Fresh) => byte_fresh(ctx, block, orientation),
            (Materialization::Byte, Recycling::Recycle) => {
                byte_recycle(ctx, block, orientation, &mut scratch.bytes)
            }
            (Materialization::Bit, Recycling::Fresh) => bit_fresh(ctx, block, orientation),
            (Materialization::Bit, Recycling::Recycle) => {
                bit_recycle(ctx, block, orientation, &mut scratch.bits)
            }
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = match self.materialization {
            Materialization::None => "none",
            Materialization::Bit => "bit",
            Materialization::Byte => "byte",
        };
        let o = match self.orientation {
            Orientation::Row => "row",
            Orientation::Column => "column",
        };
        match (self.materialization, self.recycling) {
            (Materialization::None, _) => write!(f, "{}-{}", m, o),
            (_, Recycling::Recycle) => write!(f, "{}-{}-recycle", m, o),
            (_, Recycling::Fresh) => write!(f, "{}-{}-fresh", m, o),
        }
    }
}

// ============================================================================
// Block Context
// ============================================================================

/// Classification of one matrix cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    /// Within the radius and outside the Theiler band.
    Recurrent,

    /// Beyond the radius and outside the Theiler band.
    NonRecurrent,

    /// Inside the Theiler band.
    Excluded,
}

impl Cell {
    /// Byte code stored by byte-materialized variants.
    #[inline]
    pub fn code(self) -> u8 {
        match self {
            Cell::NonRecurrent => 0,
            Cell::Recurrent => 1,
            Cell::Excluded => 2,
        }
    }

    /// Inverse of [`Cell::code`]; unknown codes read as excluded.
    #[inline]
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Cell::NonRecurrent,
            1 => Cell::Recurrent,
            _ => Cell::Excluded,
        }
    }
}

/// Read-only inputs shared by every block of a run.
#[derive(Debug, Clone, Copy)]
pub struct BlockContext<'a, T> {
    /// Raw x series (rows).
    pub x_series: &'a [T],

    /// Raw y series (columns).
    pub y_series: &'a [T],

    /// Embedded x vectors.
    pub x_vectors: &'a EmbeddedVectors<T>,

    /// Embedded y vectors.
    pub y_vectors: &'a EmbeddedVectors<T>,

    /// Distance metric.
    pub metric: Metric,

    /// Resolved radius.
    pub radius: T,

    /// Theiler corrector.
    pub theiler_corrector: usize,

    /// Evaluation form of the metric.
    pub source: DistanceSource,
}

impl<'a, T: Float> BlockContext<'a, T> {
    /// Shape of the full matrix.
    pub fn shape(&self) -> MatrixShape {
        MatrixShape::new(self.x_vectors.len(), self.y_vectors.len())
    }

    /// Returns `true` if `(row, col)` lies in the Theiler band.
    #[inline]
    pub fn is_excluded(&self, row: usize, col: usize) -> bool {
        row.abs_diff(col) <= self.theiler_corrector
    }

    /// Returns `true` if the distance of `(row, col)` is within the radius.
    ///
    /// Ignores the Theiler band.
    #[inline]
    pub fn is_recurrent(&self, row: usize, col: usize) -> bool {
        let metric = self.metric;
        let dimension = self.x_vectors.dimension();
        let mut acc = T::zero();
        match self.source {
            DistanceSource::Series => {
                let delay = self.x_vectors.delay();
                for k in 0..dimension {
                    let offset = k * delay;
                    let diff = self.x_series[row + offset] - self.y_series[col + offset];
                    acc = metric.combine(acc, diff);
                    if metric.finish(acc) > self.radius {
                        return false;
                    }
                }
            }
            DistanceSource::Vectors => {
                let a = self.x_vectors.vector(row);
                let b = self.y_vectors.vector(col);
                for (&ak, &bk) in a.iter().zip(b) {
                    acc = metric.combine(acc, ak - bk);
                    if metric.finish(acc) > self.radius {
                        return false;
                    }
                }
            }
        }
        metric.finish(acc) <= self.radius
    }

    /// Classify `(row, col)`.
    #[inline]
    pub fn cell(&self, row: usize, col: usize) -> Cell {
        if self.is_excluded(row, col) {
            Cell::Excluded
        } else if self.is_recurrent(row, col) {
            Cell::Recurrent
        } else {
            Cell::NonRecurrent
        }
    }
}

// ============================================================================
// Block Output
// ============================================================================

/// Reduced result of one block.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockOutput {
    /// The block this output covers.
    pub block: IndexBlock,

    /// Recurrent points and lines closed on both sides inside the block.
    pub interior: LineDistributions,

    /// Boundary segment of every non-excluded diagonal crossing the block.
    pub diagonal_segments: Vec<(isize, RunSegment)>,

    /// Boundary segment of every column piece (recurrent runs).
    pub vertical_segments: Vec<(usize, RunSegment)>,

    /// Boundary segment of every column piece (non-recurrent runs).
    pub white_segments: Vec<(usize, RunSegment)>,
}

/// Per-worker reusable buffers for recycling variants.
#[derive(Debug, Clone, Default)]
pub struct VariantScratch {
    /// Byte line buffer.
    pub bytes: Vec<u8>,

    /// Bit line buffer.
    pub bits: Vec<u64>,
}

impl VariantScratch {
    /// Create empty buffers.
    pub fn new() -> Self {
        Self::default()
    }
}

// ============================================================================
// Accumulation
// ============================================================================

struct BlockAccumulator {
    block: IndexBlock,
    min_offset: isize,
    diagonals: Vec<RunTracker>,
    verticals: Vec<RunTracker>,
    whites: Vec<RunTracker>,
    interior: LineDistributions,
}

impl BlockAccumulator {
    fn new(block: IndexBlock) -> Self {
        let (min_offset, max_offset) = block.offsets();
        let diagonal_count = (max_offset - min_offset + 1) as usize;
        Self {
            block,
            min_offset,
            diagonals: vec![RunTracker::default(); diagonal_count],
            verticals: vec![RunTracker::default(); block.cols()],
            whites: vec![RunTracker::default(); block.cols()],
            interior: LineDistributions::new(),
        }
    }

    #[inline]
    fn push(&mut self, row: usize, col: usize, cell: Cell) {
        let local_col = col - self.block.col_start;
        if cell == Cell::Excluded {
            self.verticals[local_col].push(row, false, &mut self.interior.vertical);
            self.whites[local_col].push(row, false, &mut self.interior.white_vertical);
            return;
        }

        let recurrent = cell == Cell::Recurrent;
        if recurrent {
            self.interior.recurrence_points += 1;
        }
        let diagonal = (col as isize - row as isize - self.min_offset) as usize;
        self.diagonals[diagonal].push(row, recurrent, &mut self.interior.diagonal);
        self.verticals[local_col].push(row, recurrent, &mut self.interior.vertical);
        self.whites[local_col].push(row, !recurrent, &mut self.interior.white_vertical);
    }

    fn finish(self) -> BlockOutput {
        let min_offset = self.min_offset;
        let col_start = self.block.col_start;
        BlockOutput {
            block: self.block,
            interior: self.interior,
            diagonal_segments: self
                .diagonals
                .iter()
                .enumerate()
                .filter(|(_, t)| !t.is_empty())
                .map(|(k, t)| (min_offset + k as isize, t.finish()))
                .collect(),
            vertical_segments: self
                .verticals
                .iter()
                .enumerate()
                .map(|(k, t)| (col_start + k, t.finish()))
                .collect(),
            white_segments: self
                .whites
                .iter()
                .enumerate()
                .map(|(k, t)| (col_start + k, t.finish()))
                .collect(),
        }
    }
}

#[inline]
fn outer_range(block: &IndexBlock, orientation: Orientation) -> Range<usize> {
    match orientation {
        Orientation::Row => block.row_start..block.row_end,
        Orientation::Column => block.col_start..block.col_end,
    }
}

#[inline]
fn inner_range(block: &IndexBlock, orientation: Orientation) -> Range<usize> {
    match orientation {
        Orientation::Row => block.col_start..block.col_end,
        Orientation::Column => block.row_start..block.row_end,
    }
}

/// `(row, col)` of the cell at `outer`/`inner` for the given orientation.
#[inline]
fn coords(orientation: Orientation, outer: usize, inner: usize) -> (usize, usize) {
    match orientation {
        Orientation::Row => (outer, inner),
        Orientation::Column => (inner, outer),
    }
}

/// Reduce a block to its output given a cell classifier.
///
/// Cells are visited in `orientation` order; `cell_at` receives global
/// `(row, col)` indices.
pub fn accumulate_block<F>(
    block: IndexBlock,
    theiler_corrector: usize,
    orientation: Orientation,
    mut cell_at: F,
) -> BlockOutput
where
    F: FnMut(usize, usize) -> Cell,
{
    let mut acc = BlockAccumulator::new(block);
    for outer in outer_range(&block, orientation) {
        for inner in inner_range(&block, orientation) {
            let (i, j) = coords(orientation, outer, inner);
            let cell = cell_at(i, j);
            debug_assert!(
                (cell == Cell::Excluded) == (i.abs_diff(j) <= theiler_corrector),
                "classifier disagrees with the Theiler band at ({i}, {j})"
            );
            acc.push(i, j, cell);
        }
    }
    acc.finish()
}

// ============================================================================
// Materializing Variants
// ============================================================================

fn byte_fresh<T: Float>(
    ctx: &BlockContext<'_, T>,
    block: IndexBlock,
    orientation: Orientation,
) -> BlockOutput {
    let inner_len = inner_range(&block, orientation).len();
    let mut buffer = vec![0u8; block.cells()];
    for (a, outer) in outer_range(&block, orientation).enumerate() {
        let line = &mut buffer[a * inner_len..(a + 1) * inner_len];
        for (slot, inner) in line.iter_mut().zip(inner_range(&block, orientation)) {
            let (i, j) = coords(orientation, outer, inner);
            *slot = ctx.cell(i, j).code();
        }
    }

    let mut acc = BlockAccumulator::new(block);
    for (a, outer) in outer_range(&block, orientation).enumerate() {
        let line = &buffer[a * inner_len..(a + 1) * inner_len];
        for (&code, inner) in line.iter().zip(inner_range(&block, orientation)) {
            let (i, j) = coords(orientation, outer, inner);
            acc.push(i, j, Cell::from_code(code));
        }
    }
    acc.finish()
}

fn byte_recycle<T: Float>(
    ctx: &BlockContext<'_, T>,
    block: IndexBlock,
    orientation: Orientation,
    buffer: &mut Vec<u8>,
) -> BlockOutput {
    let inner_len = inner_range(&block, orientation).len();
    buffer.clear();
    buffer.resize(inner_len, 0);

    let mut acc = BlockAccumulator::new(block);
    for outer in outer_range(&block, orientation) {
        for (slot, inner) in buffer.iter_mut().zip(inner_range(&block, orientation)) {
            let (i, j) = coords(orientation, outer, inner);
            *slot = ctx.cell(i, j).code();
        }
        for (&code, inner) in buffer.iter().zip(inner_range(&block, orientation)) {
            let (i, j) = coords(orientation, outer, inner);
            acc.push(i, j, Cell::from_code(code));
        }
    }
    acc.finish()
}

#[inline]
fn set_bit(words: &mut [u64], k: usize) {
    words[k / 64] |= 1u64 << (k % 64);
}

#[inline]
fn get_bit(words: &[u64], k: usize) -> bool {
    words[k / 64] & (1u64 << (k % 64)) != 0
}

/// Rebuild the cell from a stored recurrence bit; the band is recomputed.
#[inline]
fn bit_cell<T: Float>(ctx: &BlockContext<'_, T>, i: usize, j: usize, bit: bool) -> Cell {
    if ctx.is_excluded(i, j) {
        Cell::Excluded
    } else if bit {
        Cell::Recurrent
    } else {
        Cell::NonRecurrent
    }
}

fn bit_fresh<T: Float>(
    ctx: &BlockContext<'_, T>,
    block: IndexBlock,
    orientation: Orientation,
) -> BlockOutput {
    let inner_len = inner_range(&block, orientation).len();
    let mut words = vec![0u64; block.cells().div_ceil(64)];
    for (a, outer) in outer_range(&block, orientation).enumerate() {
        for (b, inner) in inner_range(&block, orientation).enumerate() {
            let (i, j) = coords(orientation, outer, inner);
            if !ctx.is_excluded(i, j) && ctx.is_recurrent(i, j) {
                set_bit(&mut words, a * inner_len + b);
            }
        }
    }

    let mut acc = BlockAccumulator::new(block);
    for (a, outer) in outer_range(&block, orientation).enumerate() {
        for (b, inner) in inner_range(&block, orientation).enumerate() {
            let (i, j) = coords(orientation, outer, inner);
            acc.push(i, j, bit_cell(ctx, i, j, get_bit(&words, a * inner_len + b)));
        }
    }
    acc.finish()
}

fn bit_recycle<T: Float>(
    ctx: &BlockContext<'_, T>,
    block: IndexBlock,
    orientation: Orientation,
    words: &mut Vec<u64>,
) -> BlockOutput {
    let inner_len = inner_range(&block, orientation).len();
    words.clear();
    words.resize(inner_len.div_ceil(64), 0);

    let mut acc = BlockAccumulator::new(block);
    for outer in outer_range(&block, orientation) {
        words.fill(0);
        for (b, inner) in inner_range(&block, orientation).enumerate() {
            let (i, j) = coords(orientation, outer, inner);
            if !ctx.is_excluded(i, j) && ctx.is_recurrent(i, j) {
                set_bit(words, b);
            }
        }
        for (b, inner) in inner_range(&block, orientation).enumerate() {
            let (i, j) = coords(orientation, outer, inner);
            acc.push(i, j, bit_cell(ctx, i, j, get_bit(words, b)));
        }
    }
    acc.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::embedding::EmbeddedVectors;
    use crate::math::embedding::EmbeddingParameters;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn series(n: usize, seed: u64) -> Vec<f64> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect()
    }

    #[test]
    fn there_are_ten_distinct_variants() {
        let all = Variant::all();
        for (a, va) in all.iter().enumerate() {
            for vb in &all[a + 1..] {
                assert_ne!(va, vb);
            }
        }
        assert_eq!(
            Variant::new(Materialization::None, Orientation::Row, Recycling::Recycle),
            Variant::new(Materialization::None, Orientation::Row, Recycling::Fresh)
        );
        assert_eq!(Variant::all()[2].to_string(), "bit-row-recycle");
        assert_eq!(Variant::all()[1].to_string(), "none-column");
    }

    #[test]
    fn all_variants_agree_on_a_ragged_block() {
        let s = series(90, 3);
        let params = EmbeddingParameters::new(3, 2).unwrap();
        let v = EmbeddedVectors::from_series(&s, params);
        let block = IndexBlock::new(5, 45, 20, 83).unwrap();

        for source in [DistanceSource::Series, DistanceSource::Vectors] {
            let ctx = BlockContext {
                x_series: &s,
                y_series: &s,
                x_vectors: &v,
                y_vectors: &v,
                metric: Metric::Euclidean,
                radius: 0.6,
                theiler_corrector: 3,
                source,
            };
            let mut scratch = VariantScratch::new();
            let reference = Variant::all()[0].compute(&ctx, block, &mut scratch);
            assert!(reference.interior.recurrence_points > 0);
            for variant in Variant::all() {
                // Leave a differently shaped line buffer behind first.
                let warmup = IndexBlock::new(0, 7, 0, 80).unwrap();
                let _ = variant.compute(&ctx, warmup, &mut scratch);
                assert_eq!(variant.compute(&ctx, block, &mut scratch), reference, "{}", variant);
            }
        }
    }

    #[test]
    fn early_exit_matches_full_distance_at_the_boundary() {
        let s = [0.0_f64, 3.0, 0.0, 4.0];
        let params = EmbeddingParameters::new(2, 1).unwrap();
        let v = EmbeddedVectors::from_series(&s, params);
        // vectors: (0,3), (3,0), (0,4)
        let mut ctx = BlockContext {
            x_series: &s,
            y_series: &s,
            x_vectors: &v,
            y_vectors: &v,
            metric: Metric::Euclidean,
            radius: 18.0_f64.sqrt(),
            theiler_corrector: 0,
            source: DistanceSource::Vectors,
        };
        let d = Metric::Euclidean.distance_from_vectors(v.as_flat(), v.as_flat(), 2, 0, 1);
        assert_eq!(ctx.is_recurrent(0, 1), d <= ctx.radius);
        ctx.radius = 1.0;
        assert!(ctx.is_recurrent(0, 2));
        assert!(!ctx.is_recurrent(1, 2));
    }

    #[test]
    fn excluded_diagonals_have_no_segments() {
        let s = series(12, 1);
        let params = EmbeddingParameters::new(1, 1).unwrap();
        let v = EmbeddedVectors::from_series(&s, params);
        let ctx = BlockContext {
            x_series: &s,
            y_series: &s,
            x_vectors: &v,
            y_vectors: &v,
            metric: Metric::Maximum,
            radius: 10.0,
            theiler_corrector: 1,
            source: DistanceSource::Vectors,
        };
        let block = IndexBlock::new(0, 4, 0, 4).unwrap();
        let out = Variant::default().compute(&ctx, block, &mut VariantScratch::new());
        let offsets: Vec<isize> = out.diagonal_segments.iter().map(|(d, _)| *d).collect();
        assert_eq!(offsets, vec![-3, -2, 2, 3]);
        // Everything outside the band is recurrent with this radius.
        assert_eq!(out.interior.recurrence_points, 6);
        assert_eq!(out.vertical_segments.len(), 4);
    }
}
