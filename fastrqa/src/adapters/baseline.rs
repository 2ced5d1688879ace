//! Baseline adapter accepting extended inputs.
//!
//! The full-matrix reference has nothing to parallelize; this wrapper only
//! lets it take the same inputs as the extended tiled adapter, so both can be
//! compared on ndarray data without conversions.

use num_traits::Float;

use rqa::internals::adapters::{BaselineRqa, BaselineRqaBuilder};
use rqa::internals::engine::{RqaConfig, RqaResult};
use rqa::internals::math::Metric;
use rqa::internals::primitives::Result;

use crate::input::SeriesInput;

/// Builder for the full-matrix reference processor.
#[derive(Debug, Clone)]
pub struct ExtendedBaselineRqaBuilder<T: Float> {
    /// Base builder from the rqa crate
    pub base: BaselineRqaBuilder<T>,
}

impl<T: Float> Default for ExtendedBaselineRqaBuilder<T> {
    fn default() -> Self {
        Self {
            base: BaselineRqaBuilder::default(),
        }
    }
}

impl<T: Float> ExtendedBaselineRqaBuilder<T> {
    /// Set the embedding dimension.
    pub fn embedding_dimension(mut self, dimension: usize) -> Self {
        self.base = self.base.embedding_dimension(dimension);
        self
    }

    /// Set the time delay.
    pub fn time_delay(mut self, delay: usize) -> Self {
        self.base = self.base.time_delay(delay);
        self
    }

    /// Set the distance metric.
    pub fn metric(mut self, metric: Metric) -> Self {
        self.base = self.base.metric(metric);
        self
    }

    /// Use a fixed radius.
    pub fn radius(mut self, radius: T) -> Self {
        self.base = self.base.radius(radius);
        self
    }

    /// Resolve the radius for a target recurrence rate.
    pub fn recurrence_rate(mut self, target: f64) -> Self {
        self.base = self.base.recurrence_rate(target);
        self
    }

    /// Set the Theiler corrector.
    pub fn theiler_corrector(mut self, corrector: usize) -> Self {
        self.base = self.base.theiler_corrector(corrector);
        self
    }

    /// Set the minimum diagonal line length.
    pub fn min_diagonal_line_length(mut self, length: usize) -> Self {
        self.base = self.base.min_diagonal_line_length(length);
        self
    }

    /// Set the minimum vertical line length.
    pub fn min_vertical_line_length(mut self, length: usize) -> Self {
        self.base = self.base.min_vertical_line_length(length);
        self
    }

    /// Set the minimum white vertical line length.
    pub fn min_white_vertical_line_length(mut self, length: usize) -> Self {
        self.base = self.base.min_white_vertical_line_length(length);
        self
    }

    /// Build the processor.
    pub fn build(self) -> Result<ExtendedBaselineRqa<T>> {
        Ok(ExtendedBaselineRqa {
            processor: self.base.build()?,
        })
    }
}

/// Full-matrix reference processor.
#[derive(Debug, Clone, Copy)]
pub struct ExtendedBaselineRqa<T> {
    processor: BaselineRqa<T>,
}

impl<T: Float> ExtendedBaselineRqa<T> {
    /// Auto-recurrence analysis of `series`.
    pub fn run<I>(&self, series: &I) -> Result<RqaResult<T>>
    where
        I: SeriesInput<T> + ?Sized,
    {
        self.processor.run(series.as_series_slice()?)
    }

    /// Cross-recurrence analysis of `x` against `y`.
    pub fn run_cross<I1, I2>(&self, x: &I1, y: &I2) -> Result<RqaResult<T>>
    where
        I1: SeriesInput<T> + ?Sized,
        I2: SeriesInput<T> + ?Sized,
    {
        self.processor
            .run_cross(x.as_series_slice()?, y.as_series_slice()?)
    }

    /// Analysis parameters.
    pub fn config(&self) -> &RqaConfig<T> {
        self.processor.config()
    }
}
