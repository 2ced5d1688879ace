//! Time-delay embedding of scalar series.
//!
//! ## Purpose
//!
//! This module reconstructs state vectors from a scalar series using delay
//! coordinates. Vector `i` is the tuple
//! `(s[i], s[i + delay], ..., s[i + (dimension - 1) * delay])`.
//!
//! ## Design notes
//!
//! * Vectors are stored flattened, `dimension` values per vector, so metric
//!   evaluation walks contiguous memory.
//! * The series itself is only borrowed during embedding; the vector set owns
//!   its copy of the components.
//! * [`embed`] is strict and rejects parameters that produce no vectors.
//!   Full runs check [`EmbeddingParameters::vector_count`] first and treat
//!   a zero count as an empty matrix instead.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use num_traits::Float;

use crate::primitives::errors::{Result, RqaError};

// ============================================================================
// Embedding Parameters
// ============================================================================

/// Embedding dimension and time delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EmbeddingParameters {
    /// Number of delay coordinates per vector.
    pub dimension: usize,

    /// Sample distance between consecutive coordinates.
    pub delay: usize,
}

impl Default for EmbeddingParameters {
    fn default() -> Self {
        Self {
            dimension: 2,
            delay: 2,
        }
    }
}

impl EmbeddingParameters {
    /// Create parameters, rejecting a dimension or delay below 1.
    pub fn new(dimension: usize, delay: usize) -> Result<Self> {
        let params = Self { dimension, delay };
        params.validate()?;
        Ok(params)
    }

    /// Check that dimension and delay are at least 1.
    pub fn validate(&self) -> Result<()> {
        if self.dimension < 1 {
            return Err(RqaError::invalid(
                "embedding_dimension",
                format!("must be at least 1, got {}", self.dimension),
            ));
        }
        if self.delay < 1 {
            return Err(RqaError::invalid(
                "time_delay",
                format!("must be at least 1, got {}", self.delay),
            ));
        }
        Ok(())
    }

    /// Sample span of one vector, `(dimension - 1) * delay`.
    #[inline]
    pub fn span(&self) -> usize {
        self.dimension.saturating_sub(1) * self.delay
    }

    /// Number of vectors a series of `series_len` samples yields.
    #[inline]
    pub fn vector_count(&self, series_len: usize) -> usize {
        series_len.saturating_sub(self.span())
    }
}

// ============================================================================
// Embedded Vectors
// ============================================================================

/// Ordered set of delay vectors in flattened storage.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedVectors<T> {
    data: Vec<T>,
    params: EmbeddingParameters,
    count: usize,
}

impl<T: Float> EmbeddedVectors<T> {
    /// Number of vectors.
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    /// Returns `true` if the set holds no vectors.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Components per vector.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.params.dimension
    }

    /// Time delay used to build the set.
    #[inline]
    pub fn delay(&self) -> usize {
        self.params.delay
    }

    /// Components of vector `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= len()`.
    #[inline]
    pub fn vector(&self, i: usize) -> &[T] {
        let d = self.params.dimension;
        &self.data[i * d..(i + 1) * d]
    }

    /// Index into the source series of the first component of vector `i`.
    #[inline]
    pub fn start_index(&self, i: usize) -> usize {
        i
    }

    /// Flattened storage, `len() * dimension()` values.
    #[inline]
    pub fn as_flat(&self) -> &[T] {
        &self.data
    }

    /// Iterate vectors in order.
    pub fn iter(&self) -> impl Iterator<Item = &[T]> + '_ {
        self.data.chunks_exact(self.params.dimension.max(1))
    }

    /// Empty set with the given parameters.
    pub(crate) fn empty(params: EmbeddingParameters) -> Self {
        Self {
            data: Vec::new(),
            params,
            count: 0,
        }
    }

    /// Build the vector set without rejecting a zero count.
    pub(crate) fn from_series(series: &[T], params: EmbeddingParameters) -> Self {
        let count = params.vector_count(series.len());
        if count == 0 {
            return Self::empty(params);
        }
        let mut data = Vec::with_capacity(count * params.dimension);
        for i in 0..count {
            for k in 0..params.dimension {
                data.push(series[i + k * params.delay]);
            }
        }
        Self {
            data,
            params,
            count,
        }
    }
}

/// Embed `series` with the given dimension and delay.
///
/// Fails with [`RqaError::InvalidParameter`] if `dimension < 1`, `delay < 1`,
/// or the series is too short to yield a single vector.
pub fn embed<T: Float>(series: &[T], dimension: usize, delay: usize) -> Result<EmbeddedVectors<T>> {
    let params = EmbeddingParameters::new(dimension, delay)?;
    let vectors = EmbeddedVectors::from_series(series, params);
    if vectors.is_empty() {
        return Err(RqaError::invalid(
            "time_series",
            format!(
                "{} samples yield no vectors for dimension {} and delay {}",
                series.len(),
                dimension,
                delay
            ),
        ));
    }
    Ok(vectors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vectors_follow_delay_coordinates() {
        let series: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let vectors = embed(&series, 3, 2).unwrap();
        assert_eq!(vectors.len(), 6);
        assert_eq!(vectors.vector(0), &[0.0, 2.0, 4.0]);
        assert_eq!(vectors.vector(5), &[5.0, 7.0, 9.0]);
        assert_eq!(vectors.start_index(5), 5);
        assert_eq!(vectors.iter().count(), 6);
    }

    #[test]
    fn dimension_one_is_the_series() {
        let series = [3.0_f32, 1.0, 4.0];
        let vectors = embed(&series, 1, 5).unwrap();
        assert_eq!(vectors.as_flat(), &series);
    }

    #[test]
    fn rejects_bad_parameters() {
        let series = [1.0_f64; 8];
        assert!(embed(&series, 0, 1).unwrap_err().is_invalid_parameter());
        assert!(embed(&series, 2, 0).unwrap_err().is_invalid_parameter());
        assert!(embed(&series, 5, 2).unwrap_err().is_invalid_parameter());
        assert!(embed::<f64>(&[], 1, 1).is_err());
    }

    #[test]
    fn vector_count_saturates() {
        let params = EmbeddingParameters::new(4, 3).unwrap();
        assert_eq!(params.vector_count(9), 0);
        assert_eq!(params.vector_count(10), 1);
    }
}
