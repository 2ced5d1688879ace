//! Baseline adapter: full-matrix reference RQA.
//!
//! ## Purpose
//!
//! This adapter runs an analysis by materializing the whole recurrence matrix
//! and walking every diagonal and column from end to end. It shares no tiling
//! or carry code with the tiled adapter, so it is the reference every variant
//! is checked against.
//!
//! ## Design notes
//!
//! * O(N * M) memory. Use it for tests and small series.
//! * Validation happens at `build()`; the series are checked at `run()`.
//!
//! ## Visibility
//!
//! Reached through `Rqa::new().adapter(Baseline)`. Direct use of
//! [`BaselineRqaBuilder`] is possible but not the primary interface.

use num_traits::Float;

use crate::algorithms::baseline::Baseline;
use crate::algorithms::criterion::NeighbourhoodCriterion;
use crate::engine::output::RqaResult;
use crate::engine::settings::{RqaConfig, Settings};
use crate::engine::validator::Validator;
use crate::math::metric::Metric;
use crate::primitives::errors::{Result, RqaError};

// ============================================================================
// Baseline RQA Builder
// ============================================================================

/// Builder for the full-matrix reference processor.
#[derive(Debug, Clone)]
pub struct BaselineRqaBuilder<T> {
    /// Analysis parameters.
    pub config: RqaConfig<T>,

    /// Deferred error from adapter conversion.
    pub deferred_error: Option<RqaError>,

    /// Tracks if any parameter was set multiple times (for validation).
    pub(crate) duplicate_param: Option<&'static str>,
}

impl<T: Float> Default for BaselineRqaBuilder<T> {
    fn default() -> Self {
        Self {
            config: RqaConfig::default(),
            deferred_error: None,
            duplicate_param: None,
        }
    }
}

impl<T: Float> BaselineRqaBuilder<T> {
    /// Set the embedding dimension.
    pub fn embedding_dimension(mut self, dimension: usize) -> Self {
        self.config.embedding.dimension = dimension;
        self
    }

    /// Set the time delay.
    pub fn time_delay(mut self, delay: usize) -> Self {
        self.config.embedding.delay = delay;
        self
    }

    /// Set the distance metric.
    pub fn metric(mut self, metric: Metric) -> Self {
        self.config.metric = metric;
        self
    }

    /// Use a fixed radius.
    pub fn radius(mut self, radius: T) -> Self {
        self.config.criterion = NeighbourhoodCriterion::fixed_radius(radius);
        self
    }

    /// Resolve the radius for a target recurrence rate.
    pub fn recurrence_rate(mut self, target: f64) -> Self {
        self.config.criterion = NeighbourhoodCriterion::recurrence_rate(target);
        self
    }

    /// Set the Theiler corrector.
    pub fn theiler_corrector(mut self, corrector: usize) -> Self {
        self.config.theiler_corrector = corrector;
        self
    }

    /// Set the minimum diagonal line length.
    pub fn min_diagonal_line_length(mut self, length: usize) -> Self {
        self.config.minimums.diagonal = length;
        self
    }

    /// Set the minimum vertical line length.
    pub fn min_vertical_line_length(mut self, length: usize) -> Self {
        self.config.minimums.vertical = length;
        self
    }

    /// Set the minimum white vertical line length.
    pub fn min_white_vertical_line_length(mut self, length: usize) -> Self {
        self.config.minimums.white_vertical = length;
        self
    }

    /// Build the processor.
    pub fn build(self) -> Result<BaselineRqa<T>> {
        if let Some(err) = self.deferred_error {
            return Err(err);
        }
        Validator::validate_no_duplicates(self.duplicate_param)?;
        Validator::validate_config(&self.config)?;
        Ok(BaselineRqa {
            config: self.config,
        })
    }
}

// ============================================================================
// Baseline RQA Processor
// ============================================================================

/// Full-matrix reference processor.
#[derive(Debug, Clone, Copy)]
pub struct BaselineRqa<T> {
    config: RqaConfig<T>,
}

impl<T: Float> BaselineRqa<T> {
    /// Auto-recurrence analysis of `series`.
    pub fn run(&self, series: &[T]) -> Result<RqaResult<T>> {
        Baseline::run(&Settings::auto(series, self.config))
    }

    /// Cross-recurrence analysis of `x` against `y`.
    pub fn run_cross(&self, x: &[T], y: &[T]) -> Result<RqaResult<T>> {
        Baseline::run(&Settings::cross(x, y, self.config))
    }

    /// Analysis parameters.
    pub fn config(&self) -> &RqaConfig<T> {
        &self.config
    }
}
