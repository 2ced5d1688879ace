//! RQA measures from line-length distributions.
//!
//! ## Purpose
//!
//! This module computes every scalar RQA measure from the finalized
//! [`LineDistributions`] of a run. It is a pure function of the histograms,
//! the number of eligible cells and the minimum line lengths.
//!
//! ## Key concepts
//!
//! With `P(l)` the number of diagonal lines of length `l`, `V(v)` the vertical
//! counterpart, `l_min`/`v_min` the minimum lengths and `R` the number of
//! recurrent points:
//!
//! * **RR**   = `R / eligible_cells`
//! * **DET**  = `sum_{l >= l_min} l P(l) / R`
//! * **L**    = `sum_{l >= l_min} l P(l) / sum_{l >= l_min} P(l)`
//! * **ENTR** = `-sum_{l >= l_min} p(l) ln p(l)`, `p(l) = P(l) / sum P(l)`
//! * **LAM**  = `sum_{v >= v_min} v V(v) / R`
//! * **TT**   = `sum_{v >= v_min} v V(v) / sum_{v >= v_min} V(v)`
//! * **DIV**  = `1 / L_max`
//!
//! White vertical lines use the same average, maximum and entropy formulas
//! with their own minimum length. Longest lines are taken over all lengths.
//!
//! ## Edge cases
//!
//! Every quotient with a zero denominator is defined as 0, including
//! divergence when no diagonal line exists. No measure is ever NaN.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::primitives::lines::{LineDistributions, LineHistogram};

// ============================================================================
// Minimum Line Lengths
// ============================================================================

/// Minimum lengths of the lines counted by each measure family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LineMinimums {
    /// Minimum diagonal line length (DET, L, ENTR).
    pub diagonal: usize,

    /// Minimum vertical line length (LAM, TT).
    pub vertical: usize,

    /// Minimum white vertical line length.
    pub white_vertical: usize,
}

impl Default for LineMinimums {
    fn default() -> Self {
        Self {
            diagonal: 2,
            vertical: 2,
            white_vertical: 2,
        }
    }
}

// ============================================================================
// Measures
// ============================================================================

/// Scalar RQA measures of one run.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RqaMeasures {
    /// Recurrent cells outside the Theiler band.
    pub recurrence_points: u64,

    /// Cells outside the Theiler band.
    pub total_cells: u64,

    /// Recurrence rate (RR).
    pub recurrence_rate: f64,

    /// Determinism (DET).
    pub determinism: f64,

    /// Average diagonal line length (L).
    pub average_diagonal_line_length: f64,

    /// Longest diagonal line (L_max).
    pub longest_diagonal_line: usize,

    /// Divergence (DIV), 0 when there is no diagonal line.
    pub divergence: f64,

    /// Entropy of diagonal lines (ENTR).
    pub entropy_diagonal_lines: f64,

    /// Number of diagonal lines of at least the minimum length.
    pub number_of_diagonal_lines: u64,

    /// Laminarity (LAM).
    pub laminarity: f64,

    /// Trapping time (TT).
    pub trapping_time: f64,

    /// Longest vertical line (V_max).
    pub longest_vertical_line: usize,

    /// Entropy of vertical lines.
    pub entropy_vertical_lines: f64,

    /// Number of vertical lines of at least the minimum length.
    pub number_of_vertical_lines: u64,

    /// Average white vertical line length.
    pub average_white_vertical_line_length: f64,

    /// Longest white vertical line.
    pub longest_white_vertical_line: usize,

    /// Entropy of white vertical lines.
    pub entropy_white_vertical_lines: f64,

    /// Number of white vertical lines of at least the minimum length.
    pub number_of_white_vertical_lines: u64,

    /// DET / RR.
    pub ratio_determinism_recurrence_rate: f64,

    /// LAM / DET.
    pub ratio_laminarity_determinism: f64,
}

/// Quotient that is 0 when the denominator is 0.
#[inline]
fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Shannon entropy (natural log) of the lines with length at least `min_length`.
fn entropy(histogram: &LineHistogram, min_length: usize) -> f64 {
    let total = histogram.lines_from(min_length) as f64;
    if total == 0.0 {
        return 0.0;
    }
    let sum: f64 = histogram
        .iter_from(min_length)
        .map(|(_, count)| {
            let p = count as f64 / total;
            p * p.ln()
        })
        .sum();
    0.0 - sum
}

/// Computes [`RqaMeasures`] from finalized distributions.
pub struct Aggregator;

impl Aggregator {
    /// Compute all measures.
    pub fn aggregate(
        distributions: &LineDistributions,
        total_cells: u64,
        minimums: &LineMinimums,
    ) -> RqaMeasures {
        let points = distributions.recurrence_points as f64;
        let diagonal = &distributions.diagonal;
        let vertical = &distributions.vertical;
        let white = &distributions.white_vertical;

        let recurrence_rate = ratio(points, total_cells as f64);

        let diagonal_points = diagonal.points_from(minimums.diagonal) as f64;
        let diagonal_lines = diagonal.lines_from(minimums.diagonal);
        let determinism = ratio(diagonal_points, points);
        let longest_diagonal_line = diagonal.longest();

        let vertical_points = vertical.points_from(minimums.vertical) as f64;
        let vertical_lines = vertical.lines_from(minimums.vertical);
        let laminarity = ratio(vertical_points, points);

        let white_points = white.points_from(minimums.white_vertical) as f64;
        let white_lines = white.lines_from(minimums.white_vertical);

        RqaMeasures {
            recurrence_points: distributions.recurrence_points,
            total_cells,
            recurrence_rate,
            determinism,
            average_diagonal_line_length: ratio(diagonal_points, diagonal_lines as f64),
            longest_diagonal_line,
            divergence: ratio(1.0, longest_diagonal_line as f64),
            entropy_diagonal_lines: entropy(diagonal, minimums.diagonal),
            number_of_diagonal_lines: diagonal_lines,
            laminarity,
            trapping_time: ratio(vertical_points, vertical_lines as f64),
            longest_vertical_line: vertical.longest(),
            entropy_vertical_lines: entropy(vertical, minimums.vertical),
            number_of_vertical_lines: vertical_lines,
            average_white_vertical_line_length: ratio(white_points, white_lines as f64),
            longest_white_vertical_line: white.longest(),
            entropy_white_vertical_lines: entropy(white, minimums.white_vertical),
            number_of_white_vertical_lines: white_lines,
            ratio_determinism_recurrence_rate: ratio(determinism, recurrence_rate),
            ratio_laminarity_determinism: ratio(laminarity, determinism),
        }
    }
}

impl fmt::Display for RqaMeasures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "RQA Measures:")?;
        writeln!(
            f,
            "  Recurrence points:                 {} of {}",
            self.recurrence_points, self.total_cells
        )?;
        writeln!(f, "  Recurrence rate (RR):              {:.6}", self.recurrence_rate)?;
        writeln!(f, "  Determinism (DET):                 {:.6}", self.determinism)?;
        writeln!(
            f,
            "  Average diagonal line length (L):  {:.6}",
            self.average_diagonal_line_length
        )?;
        writeln!(f, "  Longest diagonal line (L_max):     {}", self.longest_diagonal_line)?;
        writeln!(f, "  Divergence (DIV):                  {:.6}", self.divergence)?;
        writeln!(f, "  Entropy diagonal lines (L_entr):   {:.6}", self.entropy_diagonal_lines)?;
        writeln!(f, "  Laminarity (LAM):                  {:.6}", self.laminarity)?;
        writeln!(f, "  Trapping time (TT):                {:.6}", self.trapping_time)?;
        writeln!(f, "  Longest vertical line (V_max):     {}", self.longest_vertical_line)?;
        writeln!(f, "  Entropy vertical lines (V_entr):   {:.6}", self.entropy_vertical_lines)?;
        writeln!(
            f,
            "  Average white vertical line (W):   {:.6}",
            self.average_white_vertical_line_length
        )?;
        writeln!(
            f,
            "  Longest white vertical line:       {}",
            self.longest_white_vertical_line
        )?;
        writeln!(
            f,
            "  Entropy white vertical lines:      {:.6}",
            self.entropy_white_vertical_lines
        )?;
        writeln!(
            f,
            "  Ratio DET/RR:                      {:.6}",
            self.ratio_determinism_recurrence_rate
        )?;
        write!(
            f,
            "  Ratio LAM/DET:                     {:.6}",
            self.ratio_laminarity_determinism
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn distributions() -> LineDistributions {
        LineDistributions {
            recurrence_points: 20,
            diagonal: [1, 1, 2, 2, 4, 6].into_iter().collect(),
            vertical: [1, 3, 3, 2].into_iter().collect(),
            white_vertical: [5, 1, 5].into_iter().collect(),
        }
    }

    #[test]
    fn measures_from_hand_built_histograms() {
        let m = Aggregator::aggregate(&distributions(), 80, &LineMinimums::default());
        assert_relative_eq!(m.recurrence_rate, 0.25);
        // Diagonal lines >= 2: 2, 2, 4, 6 -> 14 points in 4 lines.
        assert_relative_eq!(m.determinism, 14.0 / 20.0);
        assert_relative_eq!(m.average_diagonal_line_length, 3.5);
        assert_eq!(m.longest_diagonal_line, 6);
        assert_relative_eq!(m.divergence, 1.0 / 6.0);
        assert_eq!(m.number_of_diagonal_lines, 4);
        // p = (0.5, 0.25, 0.25)
        let expected = -(0.5_f64 * 0.5_f64.ln() + 2.0 * 0.25 * 0.25_f64.ln());
        assert_relative_eq!(m.entropy_diagonal_lines, expected, epsilon = 1e-12);
        // Vertical lines >= 2: 3, 3, 2 -> 8 points in 3 lines.
        assert_relative_eq!(m.laminarity, 8.0 / 20.0);
        assert_relative_eq!(m.trapping_time, 8.0 / 3.0);
        assert_eq!(m.longest_vertical_line, 3);
        assert_relative_eq!(m.average_white_vertical_line_length, 5.0);
        assert_eq!(m.longest_white_vertical_line, 5);
        assert_relative_eq!(m.entropy_white_vertical_lines, 0.0);
        assert_relative_eq!(m.ratio_determinism_recurrence_rate, 0.7 / 0.25);
        assert_relative_eq!(m.ratio_laminarity_determinism, 0.4 / 0.7);
    }

    #[test]
    fn empty_distributions_give_zeros_not_nan() {
        let m = Aggregator::aggregate(&LineDistributions::new(), 0, &LineMinimums::default());
        assert_eq!(m, RqaMeasures::default());
        let m = Aggregator::aggregate(&LineDistributions::new(), 42, &LineMinimums::default());
        assert_eq!(m.recurrence_rate, 0.0);
        assert_eq!(m.divergence, 0.0);
        assert_eq!(m.total_cells, 42);
    }

    #[test]
    fn minimum_of_one_counts_isolated_points() {
        let minimums = LineMinimums {
            diagonal: 1,
            vertical: 1,
            white_vertical: 1,
        };
        let m = Aggregator::aggregate(&distributions(), 80, &minimums);
        assert_relative_eq!(m.determinism, 16.0 / 20.0);
        assert_eq!(m.number_of_white_vertical_lines, 3);
    }

    #[test]
    fn display_lists_the_headline_measures() {
        let text = Aggregator::aggregate(&distributions(), 80, &LineMinimums::default()).to_string();
        let rr = text.lines().find(|l| l.contains("(RR)")).unwrap();
        assert!(rr.ends_with("0.250000"));
        let l_max = text.lines().find(|l| l.contains("(L_max)")).unwrap();
        assert!(l_max.ends_with(" 6"));
    }
}
