//! Reference computation of the full recurrence matrix.
//!
//! ## Purpose
//!
//! The baseline builds the whole N x M matrix with the plain
//! `distance_from_vectors(..) <= radius` test and walks every diagonal and
//! every column from end to end. It shares no tiling, run-segment or buffer
//! code with the variants, so it serves as an independent oracle for them.
//!
//! ## Design notes
//!
//! * O(N * M) time and memory. Intended for tests and small inputs.
//! * Cells in the Theiler band are stored as non-recurrent and skipped by the
//!   line walks exactly as the variants skip them.

use num_traits::Float;

use crate::math::embedding::EmbeddedVectors;
use crate::math::metric::Metric;
use crate::primitives::lines::{LineDistributions, LineHistogram};
use crate::primitives::partition::MatrixShape;

/// Fully materialized recurrence matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceMatrix {
    shape: MatrixShape,
    theiler_corrector: usize,
    cells: Vec<bool>,
}

impl RecurrenceMatrix {
    /// Evaluate every cell.
    pub fn compute<T: Float>(
        x: &EmbeddedVectors<T>,
        y: &EmbeddedVectors<T>,
        metric: Metric,
        radius: T,
        theiler_corrector: usize,
    ) -> Self {
        let shape = MatrixShape::new(x.len(), y.len());
        let dimension = x.dimension();
        let mut cells = Vec::with_capacity(shape.rows * shape.cols);
        for i in 0..shape.rows {
            for j in 0..shape.cols {
                let excluded = i.abs_diff(j) <= theiler_corrector;
                let recurrent = !excluded
                    && metric.distance_from_vectors(x.as_flat(), y.as_flat(), dimension, i, j)
                        <= radius;
                cells.push(recurrent);
            }
        }
        Self {
            shape,
            theiler_corrector,
            cells,
        }
    }

    /// Matrix shape.
    pub fn shape(&self) -> MatrixShape {
        self.shape
    }

    /// Recurrence value of `(i, j)`; always `false` inside the Theiler band.
    pub fn get(&self, i: usize, j: usize) -> bool {
        self.cells[i * self.shape.cols + j]
    }

    /// Returns `true` if `(i, j)` lies in the Theiler band.
    pub fn is_excluded(&self, i: usize, j: usize) -> bool {
        i.abs_diff(j) <= self.theiler_corrector
    }

    /// Number of recurrent cells.
    pub fn recurrence_points(&self) -> u64 {
        self.cells.iter().filter(|&&c| c).count() as u64
    }

    /// Line-length distributions of the matrix.
    pub fn line_distributions(&self) -> LineDistributions {
        let MatrixShape { rows, cols } = self.shape;
        let mut out = LineDistributions {
            recurrence_points: self.recurrence_points(),
            ..LineDistributions::new()
        };
        if self.shape.is_empty() {
            return out;
        }

        for offset in self.shape.min_offset()..=self.shape.max_offset() {
            if MatrixShape::in_theiler_band(offset, self.theiler_corrector) {
                continue;
            }
            let (start, end) = self.shape.diagonal_rows(offset);
            walk(
                (start..end).map(|i| self.get(i, (i as isize + offset) as usize)),
                &mut out.diagonal,
            );
        }

        for j in 0..cols {
            walk((0..rows).map(|i| self.get(i, j)), &mut out.vertical);
            walk(
                (0..rows).map(|i| !self.is_excluded(i, j) && !self.get(i, j)),
                &mut out.white_vertical,
            );
        }
        out
    }
}

/// Record every maximal run of `true` in `cells`.
fn walk(cells: impl Iterator<Item = bool>, histogram: &mut LineHistogram) {
    let mut run = 0;
    for hit in cells {
        if hit {
            run += 1;
        } else {
            histogram.record(run);
            run = 0;
        }
    }
    histogram.record(run);
}

/// Oracle entry points. See `Baseline::run` for the full-result form.
#[derive(Debug, Clone, Copy, Default)]
pub struct Baseline;

impl Baseline {
    /// Distributions of the full matrix for already embedded inputs.
    pub fn distributions<T: Float>(
        x: &EmbeddedVectors<T>,
        y: &EmbeddedVectors<T>,
        metric: Metric,
        radius: T,
        theiler_corrector: usize,
    ) -> LineDistributions {
        RecurrenceMatrix::compute(x, y, metric, radius, theiler_corrector).line_distributions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::embedding::embed;

    #[test]
    fn period_two_matrix_by_hand() {
        let series = [1.0_f64, 2.0, 1.0, 2.0, 1.0, 2.0, 1.0, 2.0];
        let v = embed(&series, 2, 1).unwrap();
        let m = RecurrenceMatrix::compute(&v, &v, Metric::Euclidean, 0.5, 0);
        assert_eq!(m.shape(), MatrixShape::new(7, 7));
        // Same phase iff i and j have equal parity; the main diagonal is excluded.
        assert_eq!(m.recurrence_points(), 18);
        for i in 0..7 {
            for j in 0..7 {
                assert_eq!(m.get(i, j), i != j && (i + j) % 2 == 0);
            }
        }

        let dist = m.line_distributions();
        // Recurrent diagonals are the even offsets +-2, +-4, +-6, each a full line.
        assert_eq!(dist.diagonal.count(5), 2);
        assert_eq!(dist.diagonal.count(3), 2);
        assert_eq!(dist.diagonal.count(1), 2);
        assert_eq!(dist.diagonal.points_from(1), 18);
        // Vertical runs are isolated points.
        assert_eq!(dist.vertical.count(1), 18);
        assert_eq!(dist.vertical.longest(), 1);
    }

    #[test]
    fn white_lines_stop_at_the_band() {
        let series: Vec<f64> = (0..6).map(|i| i as f64 * 10.0).collect();
        let v = embed(&series, 1, 1).unwrap();
        let dist = Baseline::distributions(&v, &v, Metric::Taxicab, 1.0, 0);
        assert_eq!(dist.recurrence_points, 0);
        assert!(dist.diagonal.is_empty());
        // Column j splits into runs of length j and 5 - j around the diagonal.
        let expected: LineHistogram = (0..6usize).flat_map(|j| [j, 5 - j]).collect();
        assert_eq!(dist.white_vertical, expected);
    }
}
