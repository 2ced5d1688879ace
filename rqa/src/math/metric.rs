//! Distance metrics between embedded vectors.
//!
//! ## Purpose
//!
//! This module provides the three Minkowski-family metrics used to compare
//! delay vectors: Taxicab (L1), Euclidean (L2) and Maximum (L-infinity).
//!
//! ## Design notes
//!
//! * A metric is a plain `Copy` enum; there is no per-metric state.
//! * Every metric is expressed as a component accumulator ([`Metric::combine`])
//!   and a finisher ([`Metric::finish`]). Both evaluation forms below are
//!   built on this pair and walk the components in the same order, so they
//!   return bit-identical values.
//! * The metric itself never short-circuits. Callers that only need to know
//!   whether a distance is within a radius may stop early using the same
//!   accumulator; see `algorithms::variants`.
//!
//! ## Key concepts
//!
//! ### Evaluation forms
//!
//! * [`Metric::distance_from_series`] reads components straight from the raw
//!   series using the embedding dimension and delay, so no vectors need to be
//!   materialized.
//! * [`Metric::distance_from_vectors`] reads components from flattened,
//!   pre-embedded storage (`dimension` values per vector).
//!
//! ## Invariants
//!
//! * Distances are non-negative for finite inputs.
//! * `d(a, b) == d(b, a)` and `d(a, a) == 0`.

use core::fmt;
use core::str::FromStr;

use num_traits::Float;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::primitives::errors::RqaError;

/// Distance metric between delay vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Metric {
    /// Sum of absolute component differences (L1).
    Taxicab,

    /// Square root of the sum of squared component differences (L2).
    #[default]
    Euclidean,

    /// Largest absolute component difference (L-infinity).
    Maximum,
}

impl Metric {
    /// All supported metrics.
    pub const ALL: [Metric; 3] = [Metric::Taxicab, Metric::Euclidean, Metric::Maximum];

    /// Fold one component difference into the running accumulator.
    #[inline(always)]
    pub fn combine<T: Float>(self, acc: T, diff: T) -> T {
        match self {
            Metric::Taxicab => acc + diff.abs(),
            Metric::Euclidean => acc + diff * diff,
            Metric::Maximum => acc.max(diff.abs()),
        }
    }

    /// Turn an accumulator into a distance.
    #[inline(always)]
    pub fn finish<T: Float>(self, acc: T) -> T {
        match self {
            Metric::Euclidean => acc.sqrt(),
            Metric::Taxicab | Metric::Maximum => acc,
        }
    }

    /// Distance between the delay vectors starting at `ix` in `x` and `iy` in `y`.
    ///
    /// # Panics
    ///
    /// Panics if either vector runs past the end of its series.
    #[inline]
    pub fn distance_from_series<T: Float>(
        self,
        x: &[T],
        y: &[T],
        dimension: usize,
        delay: usize,
        ix: usize,
        iy: usize,
    ) -> T {
        let mut acc = T::zero();
        for k in 0..dimension {
            let offset = k * delay;
            acc = self.combine(acc, x[ix + offset] - y[iy + offset]);
        }
        self.finish(acc)
    }

    /// Distance between vector `ix` of `x` and vector `iy` of `y` in flattened storage.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of range.
    #[inline]
    pub fn distance_from_vectors<T: Float>(
        self,
        x: &[T],
        y: &[T],
        dimension: usize,
        ix: usize,
        iy: usize,
    ) -> T {
        let a = &x[ix * dimension..(ix + 1) * dimension];
        let b = &y[iy * dimension..(iy + 1) * dimension];
        let mut acc = T::zero();
        for (&ak, &bk) in a.iter().zip(b) {
            acc = self.combine(acc, ak - bk);
        }
        self.finish(acc)
    }

    /// Stable lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            Metric::Taxicab => "taxicab",
            Metric::Euclidean => "euclidean",
            Metric::Maximum => "maximum",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = RqaError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_lowercase().as_str() {
            "taxicab" | "manhattan" | "l1" => Ok(Metric::Taxicab),
            "euclidean" | "l2" => Ok(Metric::Euclidean),
            "maximum" | "chebyshev" | "supremum" | "linf" => Ok(Metric::Maximum),
            _ => Err(RqaError::invalid(
                "metric",
                format!(
                    "unknown metric `{}`; valid options: taxicab, euclidean, maximum",
                    name
                ),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn metrics_on_a_known_pair() {
        let x = [0.0_f64, 0.0];
        let y = [3.0_f64, -4.0];
        assert_relative_eq!(Metric::Taxicab.distance_from_vectors(&x, &y, 2, 0, 0), 7.0);
        assert_relative_eq!(Metric::Euclidean.distance_from_vectors(&x, &y, 2, 0, 0), 5.0);
        assert_relative_eq!(Metric::Maximum.distance_from_vectors(&x, &y, 2, 0, 0), 4.0);
    }

    #[test]
    fn series_and_vector_forms_agree_bitwise() {
        let series: Vec<f64> = (0..40).map(|i| (i as f64 * 0.37).sin() * 3.1).collect();
        let (dimension, delay) = (3, 4);
        let count = series.len() - (dimension - 1) * delay;
        let flat: Vec<f64> = (0..count)
            .flat_map(|i| (0..dimension).map(move |k| (i, k)))
            .map(|(i, k)| series[i + k * delay])
            .collect();

        for metric in Metric::ALL {
            for ix in 0..count {
                for iy in 0..count {
                    let a = metric.distance_from_series(&series, &series, dimension, delay, ix, iy);
                    let b = metric.distance_from_vectors(&flat, &flat, dimension, ix, iy);
                    assert_eq!(a.to_bits(), b.to_bits(), "{} at ({}, {})", metric, ix, iy);
                }
            }
        }
    }

    #[test]
    fn symmetric_and_zero_on_identity() {
        let v = [1.5_f32, -2.0, 0.25, 4.0];
        for metric in Metric::ALL {
            assert_eq!(metric.distance_from_vectors(&v, &v, 2, 1, 1), 0.0);
            assert_eq!(
                metric.distance_from_vectors(&v, &v, 2, 0, 1),
                metric.distance_from_vectors(&v, &v, 2, 1, 0)
            );
        }
    }

    #[test]
    fn parses_names() {
        assert_eq!("L1".parse::<Metric>().unwrap(), Metric::Taxicab);
        assert_eq!("chebyshev".parse::<Metric>().unwrap(), Metric::Maximum);
        assert!("cosine".parse::<Metric>().is_err());
    }
}
