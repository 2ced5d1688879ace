//! Analysis settings and run preparation.
//!
//! ## Purpose
//!
//! [`RqaConfig`] holds every analysis parameter of a run; [`Settings`] pairs
//! it with borrowed input series. [`Settings::prepare`] validates both,
//! embeds the series and resolves the neighbourhood radius, producing the
//! [`PreparedRun`] that the engine and the baseline consume.
//!
//! ## Design notes
//!
//! * Series are borrowed, never copied. Auto-recurrence aliases `y` to `x`,
//!   and the prepared run then holds a single vector set for both axes.
//! * Settings are immutable for the duration of a run.
//! * A series too short to embed is not an error here: it yields an empty
//!   matrix, and every measure of the run is zero.

use num_traits::Float;
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::algorithms::criterion::NeighbourhoodCriterion;
use crate::engine::validator::Validator;
use crate::evaluation::aggregator::LineMinimums;
use crate::math::embedding::{EmbeddedVectors, EmbeddingParameters};
use crate::math::metric::Metric;
use crate::primitives::errors::Result;
use crate::primitives::partition::MatrixShape;

// ============================================================================
// Configuration
// ============================================================================

/// Analysis parameters of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RqaConfig<T> {
    /// Embedding dimension and time delay.
    pub embedding: EmbeddingParameters,

    /// Distance metric (also the similarity measure).
    pub metric: Metric,

    /// Neighbourhood criterion.
    pub criterion: NeighbourhoodCriterion<T>,

    /// Cells with `|i - j| <= theiler_corrector` are excluded.
    pub theiler_corrector: usize,

    /// Minimum line lengths.
    pub minimums: LineMinimums,
}

impl<T: Float> Default for RqaConfig<T> {
    fn default() -> Self {
        Self {
            embedding: EmbeddingParameters::default(),
            metric: Metric::default(),
            criterion: NeighbourhoodCriterion::default(),
            theiler_corrector: 1,
            minimums: LineMinimums::default(),
        }
    }
}

// ============================================================================
// Settings
// ============================================================================

/// Input series and analysis parameters of one run.
#[derive(Debug, Clone, Copy)]
pub struct Settings<'a, T> {
    /// Series indexing the matrix rows.
    pub x: &'a [T],

    /// Series indexing the matrix columns.
    pub y: &'a [T],

    /// Analysis parameters.
    pub config: RqaConfig<T>,
}

impl<'a, T: Float> Settings<'a, T> {
    /// Auto-recurrence of `series`.
    pub fn auto(series: &'a [T], config: RqaConfig<T>) -> Self {
        Self {
            x: series,
            y: series,
            config,
        }
    }

    /// Cross-recurrence of `x` against `y`.
    pub fn cross(x: &'a [T], y: &'a [T], config: RqaConfig<T>) -> Self {
        Self { x, y, config }
    }

    /// Returns `true` if both axes refer to the same series.
    pub fn is_auto(&self) -> bool {
        core::ptr::eq(self.x, self.y)
    }

    /// Validate, embed and resolve the radius.
    pub fn prepare(&self) -> Result<PreparedRun<T>> {
        Validator::validate_config(&self.config)?;
        Validator::validate_series("x", self.x)?;
        if !self.is_auto() {
            Validator::validate_series("y", self.y)?;
        }

        let config = &self.config;
        let x_vectors = EmbeddedVectors::from_series(self.x, config.embedding);
        let y_vectors = if self.is_auto() {
            None
        } else {
            Some(EmbeddedVectors::from_series(self.y, config.embedding))
        };
        let y_ref = y_vectors.as_ref().unwrap_or(&x_vectors);

        let shape = MatrixShape::new(x_vectors.len(), y_ref.len());
        let total_cells = shape.eligible_cells(config.theiler_corrector);
        let radius = match config.criterion {
            NeighbourhoodCriterion::FixedRadius(c) => c.radius,
            NeighbourhoodCriterion::RecurrenceRate(_) if total_cells == 0 => T::zero(),
            NeighbourhoodCriterion::RecurrenceRate(_) => config.criterion.resolve_radius(
                &x_vectors,
                y_ref,
                config.metric,
                config.theiler_corrector,
            )?,
        };

        debug!(
            rows = shape.rows,
            cols = shape.cols,
            total_cells,
            radius = radius.to_f64().unwrap_or(f64::NAN),
            metric = %config.metric,
            "prepared run"
        );

        Ok(PreparedRun {
            x_vectors,
            y_vectors,
            radius,
            shape,
            total_cells,
        })
    }
}

// ============================================================================
// Prepared Run
// ============================================================================

/// Embedded inputs and resolved radius of a run.
#[derive(Debug, Clone)]
pub struct PreparedRun<T> {
    /// Row vectors.
    pub x_vectors: EmbeddedVectors<T>,

    y_vectors: Option<EmbeddedVectors<T>>,

    /// Radius the run thresholds against.
    pub radius: T,

    /// Matrix shape.
    pub shape: MatrixShape,

    /// Cells outside the Theiler band.
    pub total_cells: u64,
}

impl<T: Float> PreparedRun<T> {
    /// Column vectors; the row vectors for auto-recurrence.
    pub fn y_vectors(&self) -> &EmbeddedVectors<T> {
        self.y_vectors.as_ref().unwrap_or(&self.x_vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::errors::RqaError;

    #[test]
    fn auto_settings_share_one_vector_set() {
        let series: Vec<f64> = (0..20).map(|i| (i as f64).cos()).collect();
        let settings = Settings::auto(&series, RqaConfig::default());
        assert!(settings.is_auto());
        let run = settings.prepare().unwrap();
        assert_eq!(run.shape, MatrixShape::new(18, 18));
        assert!(core::ptr::eq(run.y_vectors(), &run.x_vectors));
        assert_eq!(run.radius, 1.0);
    }

    #[test]
    fn cross_settings_have_rectangular_shape() {
        let x = [0.0_f32; 10];
        let y = [0.0_f32; 7];
        let run = Settings::cross(&x, &y, RqaConfig::default()).prepare().unwrap();
        assert_eq!(run.shape, MatrixShape::new(8, 5));
    }

    #[test]
    fn short_series_prepares_an_empty_matrix() {
        let config = RqaConfig {
            criterion: NeighbourhoodCriterion::recurrence_rate(0.3),
            ..RqaConfig::default()
        };
        let run = Settings::auto(&[1.0_f64, 2.0], config).prepare().unwrap();
        assert!(run.shape.is_empty());
        assert_eq!(run.total_cells, 0);
        assert_eq!(run.radius, 0.0);
    }

    #[test]
    fn non_finite_y_is_rejected() {
        let x = [0.0_f64; 6];
        let y = [0.0, f64::INFINITY, 0.0];
        let err = Settings::cross(&x, &y, RqaConfig::default()).prepare().unwrap_err();
        assert!(matches!(err, RqaError::NonFiniteValue { series: "y", index: 1, .. }));
    }
}
