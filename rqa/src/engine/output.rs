//! Output types for RQA runs.
//!
//! ## Purpose
//!
//! This module defines [`RqaResult`], the immutable record produced once at
//! the end of a run. It carries the scalar measures, the raw line-length
//! distributions they were derived from, and the parameters needed to
//! interpret them.
//!
//! ## Design notes
//!
//! * Results are generic over `Float` for the effective radius only; every
//!   measure is reported as `f64`.
//! * Implements `Display` for a human-readable report.
//!
//! ## Visibility
//!
//! [`RqaResult`] is part of the public API and is the result type returned by
//! every adapter.

use core::fmt;

use num_traits::Float;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::evaluation::aggregator::{LineMinimums, RqaMeasures};
use crate::primitives::lines::LineDistributions;

// ============================================================================
// Result Structure
// ============================================================================

/// Result of an RQA run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RqaResult<T> {
    /// Scalar RQA measures.
    pub measures: RqaMeasures,

    /// Line-length distributions the measures were computed from.
    pub distributions: LineDistributions,

    /// Radius actually used; the resolved radius under a recurrence-rate criterion.
    pub effective_radius: T,

    /// Number of x-vectors (matrix rows).
    pub rows: usize,

    /// Number of y-vectors (matrix columns).
    pub cols: usize,

    /// Theiler corrector of the run.
    pub theiler_corrector: usize,

    /// Minimum line lengths of the run.
    pub minimums: LineMinimums,
}

impl<T: Float> RqaResult<T> {
    /// Recurrence rate (RR).
    pub fn recurrence_rate(&self) -> f64 {
        self.measures.recurrence_rate
    }

    /// Determinism (DET).
    pub fn determinism(&self) -> f64 {
        self.measures.determinism
    }

    /// Laminarity (LAM).
    pub fn laminarity(&self) -> f64 {
        self.measures.laminarity
    }

    /// Returns `true` if no cell was recurrent.
    pub fn is_empty(&self) -> bool {
        self.measures.recurrence_points == 0
    }
}

// ============================================================================
// Display Implementation
// ============================================================================

impl<T: Float + fmt::Display> fmt::Display for RqaResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Summary:")?;
        writeln!(f, "  Matrix: {} x {}", self.rows, self.cols)?;
        writeln!(f, "  Effective radius: {}", self.effective_radius)?;
        writeln!(f, "  Theiler corrector: {}", self.theiler_corrector)?;
        writeln!(
            f,
            "  Minimum line lengths: diagonal {}, vertical {}, white vertical {}",
            self.minimums.diagonal, self.minimums.vertical, self.minimums.white_vertical
        )?;
        writeln!(f)?;
        writeln!(f, "{}", self.measures)?;
        writeln!(f)?;

        writeln!(f, "Line Distributions:")?;
        writeln!(
            f,
            "{:>8} {:>12} {:>12} {:>12}",
            "Length", "Diagonal", "Vertical", "White"
        )?;
        writeln!(f, "{:-<47}", "")?;

        let longest = self
            .measures
            .longest_diagonal_line
            .max(self.measures.longest_vertical_line)
            .max(self.measures.longest_white_vertical_line);
        let d = &self.distributions;
        let rows: Vec<usize> = (1..=longest)
            .filter(|&l| d.diagonal.count(l) + d.vertical.count(l) + d.white_vertical.count(l) > 0)
            .collect();

        // Show the first 10 and last 10 non-empty lengths.
        let n = rows.len();
        for (k, &length) in rows.iter().enumerate() {
            if n > 20 && k == 10 {
                writeln!(f, "{:>8}", "...")?;
            }
            if n > 20 && (10..n - 10).contains(&k) {
                continue;
            }
            writeln!(
                f,
                "{:>8} {:>12} {:>12} {:>12}",
                length,
                d.diagonal.count(length),
                d.vertical.count(length),
                d.white_vertical.count(length)
            )?;
        }

        Ok(())
    }
}
