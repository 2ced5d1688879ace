//! Run-length tracking along a single line of the recurrence matrix.
//!
//! ## Purpose
//!
//! A block sees only a piece of each diagonal and each column that crosses it.
//! Lines that touch the block's entry or exit edge may continue into a
//! neighbouring block, so they cannot be counted locally. A [`RunTracker`]
//! records the cells of one such piece in order, flushes the lines that are
//! closed on both sides into a histogram, and keeps the two edge runs aside.
//! At the end of the block the tracker is reduced to a [`RunSegment`], the
//! carry message consumed by the engine's merger.
//!
//! ## Key concepts
//!
//! * **head**: length of the run starting at the segment's first cell.
//! * **tail**: length of the run ending at the segment's last cell.
//! * **full**: every cell of the segment is a hit; then `head == tail == len`.
//!
//! Folding segments of one line in row order reproduces exactly the line
//! lengths a single uninterrupted scan would have found:
//!
//! ```text
//! open = 0
//! for each segment:
//!     if full: open += len
//!     else:    emit(open + head); open = tail
//! emit(open)
//! ```
//!
//! ## Invariants
//!
//! * Cells are pushed in strictly increasing row order.
//! * `head <= len`, `tail <= len`, and `head + tail <= len` unless full.

use crate::primitives::lines::LineHistogram;

/// Boundary summary of one contiguous piece of a diagonal or column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunSegment {
    /// Global row of the first cell of the piece.
    pub start_row: usize,

    /// Number of cells in the piece.
    pub len: usize,

    /// Length of the run touching the first cell.
    pub head: usize,

    /// Length of the run touching the last cell.
    pub tail: usize,
}

impl RunSegment {
    /// Returns `true` if every cell of the piece is a hit.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.head == self.len
    }

    /// Row just past the last cell of the piece.
    #[inline]
    pub fn end_row(&self) -> usize {
        self.start_row + self.len
    }
}

/// Incremental run tracker for one piece of a line.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunTracker {
    start_row: usize,
    len: usize,
    head: usize,
    current: usize,
    broken: bool,
}

impl RunTracker {
    /// Push the next cell of the piece.
    ///
    /// Runs closed on both sides inside the piece go straight to `histogram`.
    #[inline]
    pub fn push(&mut self, row: usize, hit: bool, histogram: &mut LineHistogram) {
        if self.len == 0 {
            self.start_row = row;
        }
        debug_assert_eq!(row, self.start_row + self.len, "cells must be contiguous");
        self.len += 1;

        if hit {
            self.current += 1;
            return;
        }

        if self.broken {
            histogram.record(self.current);
        } else {
            self.head = self.current;
            self.broken = true;
        }
        self.current = 0;
    }

    /// Returns `true` if no cell was pushed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Reduce the tracker to its boundary summary.
    pub fn finish(&self) -> RunSegment {
        if self.broken {
            RunSegment {
                start_row: self.start_row,
                len: self.len,
                head: self.head,
                tail: self.current,
            }
        } else {
            RunSegment {
                start_row: self.start_row,
                len: self.len,
                head: self.len,
                tail: self.len,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(cells: &[bool], start_row: usize) -> (RunSegment, LineHistogram) {
        let mut histogram = LineHistogram::new();
        let mut tracker = RunTracker::default();
        for (k, &hit) in cells.iter().enumerate() {
            tracker.push(start_row + k, hit, &mut histogram);
        }
        (tracker.finish(), histogram)
    }

    #[test]
    fn interior_runs_are_flushed_edges_are_kept() {
        let (seg, h) = track(&[true, false, true, true, false, true, true, true], 4);
        assert_eq!(seg.start_row, 4);
        assert_eq!(seg.len, 8);
        assert_eq!(seg.head, 1);
        assert_eq!(seg.tail, 3);
        assert_eq!(h.count(2), 1);
        assert_eq!(h.lines_from(1), 1);
    }

    #[test]
    fn full_piece_reports_len_as_head_and_tail() {
        let (seg, h) = track(&[true, true, true], 0);
        assert!(seg.is_full());
        assert_eq!(seg.tail, 3);
        assert!(h.is_empty());
    }

    #[test]
    fn empty_piece_has_zero_runs() {
        let (seg, h) = track(&[false, false], 0);
        assert!(!seg.is_full());
        assert_eq!((seg.head, seg.tail), (0, 0));
        assert!(h.is_empty());
    }
}
