//! Line-length histograms.
//!
//! ## Purpose
//!
//! Every RQA measure is a function of three line-length histograms: diagonal
//! lines, vertical lines and white (non-recurrent) vertical lines, plus the
//! number of recurrent points. This module holds those sufficient statistics
//! and the operations needed to accumulate them incrementally.
//!
//! ## Invariants
//!
//! * Histogram keys are positive line lengths; zero-length lines are never
//!   recorded.
//! * Merging is commutative and associative, so partial histograms can be
//!   combined in any order.

use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Line Histogram
// ============================================================================

/// Mapping from line length to the number of lines of that length.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LineHistogram {
    counts: BTreeMap<usize, u64>,
}

impl LineHistogram {
    /// Create an empty histogram.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one line of `length`; zero lengths are ignored.
    #[inline]
    pub fn record(&mut self, length: usize) {
        self.record_many(length, 1);
    }

    /// Record `count` lines of `length`.
    #[inline]
    pub fn record_many(&mut self, length: usize, count: u64) {
        if length > 0 && count > 0 {
            *self.counts.entry(length).or_insert(0) += count;
        }
    }

    /// Number of lines of exactly `length`.
    pub fn count(&self, length: usize) -> u64 {
        self.counts.get(&length).copied().unwrap_or(0)
    }

    /// Add every entry of `other` into `self`.
    pub fn merge(&mut self, other: &LineHistogram) {
        for (&length, &count) in &other.counts {
            self.record_many(length, count);
        }
    }

    /// Iterate `(length, count)` pairs in ascending length order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, u64)> + '_ {
        self.counts.iter().map(|(&l, &c)| (l, c))
    }

    /// Iterate entries with length at least `min_length`.
    pub fn iter_from(&self, min_length: usize) -> impl Iterator<Item = (usize, u64)> + '_ {
        self.counts.range(min_length.max(1)..).map(|(&l, &c)| (l, c))
    }

    /// Returns `true` if no line was recorded.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Length of the longest recorded line, or 0.
    pub fn longest(&self) -> usize {
        self.counts.keys().next_back().copied().unwrap_or(0)
    }

    /// Number of lines with length at least `min_length`.
    pub fn lines_from(&self, min_length: usize) -> u64 {
        self.iter_from(min_length).map(|(_, c)| c).sum()
    }

    /// Number of points covered by lines with length at least `min_length`.
    pub fn points_from(&self, min_length: usize) -> u64 {
        self.iter_from(min_length).map(|(l, c)| l as u64 * c).sum()
    }
}

impl FromIterator<usize> for LineHistogram {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut histogram = LineHistogram::new();
        for length in iter {
            histogram.record(length);
        }
        histogram
    }
}

// ============================================================================
// Line Distributions
// ============================================================================

/// Sufficient statistics of a recurrence matrix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LineDistributions {
    /// Recurrent cells outside the Theiler band.
    pub recurrence_points: u64,

    /// Diagonal line lengths (Theiler band excluded).
    pub diagonal: LineHistogram,

    /// Vertical line lengths.
    pub vertical: LineHistogram,

    /// White vertical line lengths (runs of non-recurrent cells).
    pub white_vertical: LineHistogram,
}

impl LineDistributions {
    /// Create empty distributions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add every count of `other` into `self`.
    pub fn merge(&mut self, other: &LineDistributions) {
        self.recurrence_points += other.recurrence_points;
        self.diagonal.merge(&other.diagonal);
        self.vertical.merge(&other.vertical);
        self.white_vertical.merge(&other.white_vertical);
    }
}
