//! Cross-block carry threading.
//!
//! ## Purpose
//!
//! Blocks report the lines they could close locally plus one [`RunSegment`]
//! per diagonal and column piece. The [`CarryMerger`] stitches those pieces
//! back into whole lines. Every diagonal and every column of the matrix is a
//! *lane*; each lane folds its segments in row order and emits the lengths of
//! the lines that span block boundaries.
//!
//! ## Design notes
//!
//! * Blocks may arrive in any order. A segment that is not yet contiguous with
//!   its lane waits in a per-lane queue and is folded as soon as the gap
//!   closes, so carries resolve while dispatch is still running.
//! * Diagonal carries flow from upper-left to lower-right, vertical carries
//!   top to bottom. Both reduce to "increasing start row" inside a lane.
//! * Diagonals inside the Theiler band have no lane.
//!
//! ## Invariants
//!
//! * Segments of one lane never overlap; overlap means a block was delivered
//!   twice and is reported as [`RqaError::Planning`].
//! * At [`CarryMerger::finish`] every lane must be folded to its end row.

use std::collections::BTreeMap;

use crate::algorithms::variants::BlockOutput;
use crate::primitives::errors::{Result, RqaError};
use crate::primitives::lines::{LineDistributions, LineHistogram};
use crate::primitives::partition::MatrixShape;
use crate::primitives::runs::RunSegment;

// ============================================================================
// Lane
// ============================================================================

#[derive(Debug, Clone)]
struct Lane {
    next_row: usize,
    end_row: usize,
    open: usize,
    pending: BTreeMap<usize, RunSegment>,
}

impl Lane {
    fn new(start_row: usize, end_row: usize) -> Self {
        Self {
            next_row: start_row,
            end_row,
            open: 0,
            pending: BTreeMap::new(),
        }
    }

    fn accept(&mut self, segment: RunSegment, histogram: &mut LineHistogram) -> Result<()> {
        if segment.start_row < self.next_row
            || segment.end_row() > self.end_row
            || self.pending.contains_key(&segment.start_row)
        {
            return Err(RqaError::Planning(format!(
                "segment at rows [{}..{}) overlaps collected data",
                segment.start_row,
                segment.end_row()
            )));
        }
        if segment.start_row > self.next_row {
            self.pending.insert(segment.start_row, segment);
            return Ok(());
        }

        self.fold(segment, histogram);
        while let Some(next) = self.pending.remove(&self.next_row) {
            self.fold(next, histogram);
        }
        Ok(())
    }

    #[inline]
    fn fold(&mut self, segment: RunSegment, histogram: &mut LineHistogram) {
        if segment.is_full() {
            self.open += segment.len;
        } else {
            histogram.record(self.open + segment.head);
            self.open = segment.tail;
        }
        self.next_row = segment.end_row();
    }

    fn is_complete(&self) -> bool {
        self.next_row == self.end_row && self.pending.is_empty()
    }
}

// ============================================================================
// Carry Merger
// ============================================================================

/// Incremental collector of block outputs.
#[derive(Debug, Clone)]
pub struct CarryMerger {
    shape: MatrixShape,
    theiler_corrector: usize,
    min_offset: isize,
    diagonals: Vec<Option<Lane>>,
    verticals: Vec<Lane>,
    whites: Vec<Lane>,
    distributions: LineDistributions,
    blocks: usize,
}

impl CarryMerger {
    /// Prepare one lane per eligible diagonal and per column of `shape`.
    pub fn new(shape: MatrixShape, theiler_corrector: usize) -> Self {
        let (diagonals, verticals, whites) = if shape.is_empty() {
            (Vec::new(), Vec::new(), Vec::new())
        } else {
            let diagonals = (shape.min_offset()..=shape.max_offset())
                .map(|d| {
                    if MatrixShape::in_theiler_band(d, theiler_corrector) {
                        None
                    } else {
                        let (start, end) = shape.diagonal_rows(d);
                        Some(Lane::new(start, end))
                    }
                })
                .collect();
            let column = Lane::new(0, shape.rows);
            (diagonals, vec![column.clone(); shape.cols], vec![column; shape.cols])
        };

        Self {
            shape,
            theiler_corrector,
            min_offset: shape.min_offset(),
            diagonals,
            verticals,
            whites,
            distributions: LineDistributions::new(),
            blocks: 0,
        }
    }

    /// Number of blocks accepted so far.
    pub fn blocks(&self) -> usize {
        self.blocks
    }

    /// Fold one block output into the running distributions.
    pub fn accept(&mut self, output: BlockOutput) -> Result<()> {
        let block = output.block;
        if block.row_end > self.shape.rows || block.col_end > self.shape.cols {
            return Err(RqaError::Planning(format!(
                "block {} lies outside the {} x {} matrix",
                block, self.shape.rows, self.shape.cols
            )));
        }

        let dist = &mut self.distributions;
        for (offset, segment) in output.diagonal_segments {
            let lane = usize::try_from(offset - self.min_offset)
                .ok()
                .and_then(|k| self.diagonals.get_mut(k))
                .and_then(Option::as_mut)
                .ok_or_else(|| {
                    RqaError::Planning(format!(
                        "block {} reported diagonal {} which has no lane (Theiler corrector {})",
                        block, offset, self.theiler_corrector
                    ))
                })?;
            lane.accept(segment, &mut dist.diagonal)?;
        }
        for (col, segment) in output.vertical_segments {
            Self::column_lane(&mut self.verticals, col)?.accept(segment, &mut dist.vertical)?;
        }
        for (col, segment) in output.white_segments {
            Self::column_lane(&mut self.whites, col)?
                .accept(segment, &mut dist.white_vertical)?;
        }

        dist.merge(&output.interior);
        self.blocks += 1;
        Ok(())
    }

    fn column_lane(lanes: &mut [Lane], col: usize) -> Result<&mut Lane> {
        lanes
            .get_mut(col)
            .ok_or_else(|| RqaError::Planning(format!("column {} is out of range", col)))
    }

    /// Close every lane and return the finished distributions.
    pub fn finish(self) -> Result<LineDistributions> {
        let mut dist = self.distributions;
        let lanes = self
            .diagonals
            .into_iter()
            .flatten()
            .map(|lane| (lane, 0))
            .chain(self.verticals.into_iter().map(|lane| (lane, 1)))
            .chain(self.whites.into_iter().map(|lane| (lane, 2)));

        for (lane, kind) in lanes {
            if !lane.is_complete() {
                return Err(RqaError::Planning(format!(
                    "lane stopped at row {} of {}; blocks are missing",
                    lane.next_row, lane.end_row
                )));
            }
            let histogram = match kind {
                0 => &mut dist.diagonal,
                1 => &mut dist.vertical,
                _ => &mut dist.white_vertical,
            };
            histogram.record(lane.open);
        }
        Ok(dist)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::baseline::Baseline;
    use crate::algorithms::variants::{BlockContext, DistanceSource, Variant, VariantScratch};
    use crate::math::embedding::embed;
    use crate::math::metric::Metric;
    use crate::primitives::partition::Tiling;

    fn series() -> Vec<f64> {
        (0..40).map(|i| ((i * 7 % 11) as f64).sin()).collect()
    }

    #[test]
    fn reverse_order_matches_baseline() {
        let s = series();
        let v = embed(&s, 2, 1).unwrap();
        let ctx = BlockContext {
            x_series: &s,
            y_series: &s,
            x_vectors: &v,
            y_vectors: &v,
            metric: Metric::Euclidean,
            radius: 0.4,
            theiler_corrector: 1,
            source: DistanceSource::Vectors,
        };
        let tiling = Tiling::new(ctx.shape(), 5).unwrap();
        let mut merger = CarryMerger::new(ctx.shape(), 1);
        let mut scratch = VariantScratch::new();
        let mut blocks: Vec<_> = tiling.blocks().collect();
        blocks.reverse();
        for block in blocks {
            merger
                .accept(Variant::default().compute(&ctx, block, &mut scratch))
                .unwrap();
        }
        assert_eq!(merger.blocks(), tiling.block_count());
        let merged = merger.finish().unwrap();
        assert_eq!(merged, Baseline::distributions(&v, &v, Metric::Euclidean, 0.4, 1));
    }

    #[test]
    fn duplicate_and_missing_blocks_are_planning_errors() {
        let s = series();
        let v = embed(&s, 1, 1).unwrap();
        let ctx = BlockContext {
            x_series: &s,
            y_series: &s,
            x_vectors: &v,
            y_vectors: &v,
            metric: Metric::Maximum,
            radius: 0.2,
            theiler_corrector: 0,
            source: DistanceSource::Series,
        };
        let tiling = Tiling::new(ctx.shape(), 16).unwrap();
        let mut scratch = VariantScratch::new();
        let first = tiling.block(0).unwrap();
        let output = Variant::default().compute(&ctx, first, &mut scratch);

        let mut merger = CarryMerger::new(ctx.shape(), 0);
        merger.accept(output.clone()).unwrap();
        assert!(matches!(merger.accept(output), Err(RqaError::Planning(_))));

        let mut merger = CarryMerger::new(ctx.shape(), 0);
        merger
            .accept(Variant::default().compute(&ctx, first, &mut scratch))
            .unwrap();
        assert!(matches!(merger.finish(), Err(RqaError::Planning(_))));
    }

    #[test]
    fn empty_shape_finishes_empty() {
        let merger = CarryMerger::new(MatrixShape::new(0, 0), 1);
        assert_eq!(merger.finish().unwrap(), LineDistributions::new());
    }
}
