//! Tiled adapter with parallel and accelerated execution.
//!
//! ## Purpose
//!
//! This module wraps the `rqa` tiled adapter. The analysis itself (tiling,
//! variants, carry merging, aggregation) is unchanged; what changes is how
//! blocks reach the compute units:
//!
//! * **Parallel** (default): blocks are computed on rayon's work-stealing pool
//!   and merged incrementally on the calling thread.
//! * **GPU** (feature `gpu`): a [`GpuUnit`](crate::engine::gpu::GpuUnit) is
//!   added to the compute units.
//!
//! ## Design notes
//!
//! * Validation is delegated to the base builder.
//! * Input accepts slices, vectors and contiguous ndarray views.
//! * Results are identical for every combination of `parallel` and `gpu`.
//!
//! ## Visibility
//!
//! Reached through `Rqa::new().adapter(Tiled)` from this crate's prelude.

use std::sync::Arc;
use std::time::Instant;

use num_traits::Float;

use rqa::internals::adapters::{TiledRqa, TiledRqaBuilder};
use rqa::internals::algorithms::{DistanceSource, Variant};
use rqa::internals::engine::{ComputeUnit, DispatchFn, RqaResult, SelectionPolicy};
use rqa::internals::math::Metric;
use rqa::internals::primitives::{CancellationToken, Result, RqaError};

use crate::engine::executor::dispatch_parallel;
use crate::input::SeriesInput;

// ============================================================================
// Extended Tiled RQA Builder
// ============================================================================

/// Builder for the tiled processor with parallel and GPU support.
#[derive(Debug, Clone)]
pub struct ExtendedTiledRqaBuilder<T: Float> {
    /// Base builder from the rqa crate
    pub base: TiledRqaBuilder<T>,

    /// Whether to dispatch blocks in parallel
    pub parallel: bool,

    /// Whether to add a GPU compute unit
    pub gpu: bool,
}

impl<T: Float> Default for ExtendedTiledRqaBuilder<T> {
    fn default() -> Self {
        Self {
            base: TiledRqaBuilder::default(),
            parallel: true,
            gpu: false,
        }
    }
}

impl<T: Float> ExtendedTiledRqaBuilder<T> {
    /// Set parallel dispatch.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Add a GPU compute unit.
    ///
    /// The unit is appended to the configured units, or replaces the default
    /// CPU unit when none were configured. With several units, pick a policy
    /// other than `Single` so the GPU receives blocks.
    pub fn gpu(mut self, gpu: bool) -> Self {
        self.gpu = gpu;
        self
    }

    // ========================================================================
    // Shared Setters
    // ========================================================================

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

    // ========================================================================
    // Engine Setters
    // ========================================================================

    /// Set the block edge length.
    pub fn edge_length(mut self, edge_length: usize) -> Self {
        self.base = self.base.edge_length(edge_length);
        self
    }

    /// Set the block distribution policy.
    pub fn policy(mut self, policy: SelectionPolicy) -> Self {
        self.base = self.base.policy(policy);
        self
    }

    /// Run a single variant on every unit.
    pub fn variant(mut self, variant: Variant) -> Self {
        self.base = self.base.variant(variant);
        self
    }

    /// Cycle `variants` across compute units.
    pub fn variants(mut self, variants: Vec<Variant>) -> Self {
        self.base = self.base.variants(variants);
        self
    }

    /// Set the evaluation form of the metric.
    pub fn distance_source(mut self, source: DistanceSource) -> Self {
        self.base = self.base.distance_source(source);
        self
    }

    /// Attach a cancellation token.
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.base = self.base.cancellation(token);
        self
    }

    /// Abort runs that have not finished by `deadline`.
    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.base = self.base.deadline(deadline);
        self
    }

    /// Replace the compute units.
    pub fn units(mut self, units: Vec<Arc<dyn ComputeUnit<T>>>) -> Self {
        self.base = self.base.units(units);
        self
    }
}

impl<T: Float + Send + Sync + 'static> ExtendedTiledRqaBuilder<T> {
    // ========================================================================
    // Build Method
    // ========================================================================

    /// Build the processor.
    pub fn build(self) -> Result<ExtendedTiledRqa<T>> {
        // Check for deferred errors from adapter conversion
        if let Some(ref err) = self.base.deferred_error {
            return Err(err.clone());
        }
        if self.gpu && !cfg!(feature = "gpu") {
            return Err(RqaError::invalid(
                "gpu",
                "requires the `gpu` feature of fastrqa",
            ));
        }

        let mut builder = self.base;
        builder.custom_dispatch = if self.parallel {
            Some(dispatch_parallel::<T> as DispatchFn<T>)
        } else {
            None
        };
        if self.gpu {
            if let Some(gpu) = gpu_unit::<T>() {
                let mut units = builder.units.take().unwrap_or_default();
                units.push(gpu);
                builder.units = Some(units);
            }
        }

        // Validation is centralized in the rqa crate
        let processor = builder.build()?;
        Ok(ExtendedTiledRqa {
            processor,
            parallel: self.parallel,
        })
    }
}

#[cfg(feature = "gpu")]
fn gpu_unit<T: Float + Send + Sync + 'static>() -> Option<Arc<dyn ComputeUnit<T>>> {
    Some(Arc::new(crate::engine::gpu::GpuUnit::new()))
}

#[cfg(not(feature = "gpu"))]
fn gpu_unit<T: Float>() -> Option<Arc<dyn ComputeUnit<T>>> {
    None
}

// ============================================================================
// Extended Tiled RQA Processor
// ============================================================================

/// Tiled processor with parallel and GPU support.
#[derive(Debug, Clone)]
pub struct ExtendedTiledRqa<T: Float> {
    processor: TiledRqa<T>,
    parallel: bool,
}

impl<T: Float + Send + Sync + 'static> ExtendedTiledRqa<T> {
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

    /// Whether blocks are dispatched in parallel.
    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    /// The underlying `rqa` processor.
    pub fn processor(&self) -> &TiledRqa<T> {
        &self.processor
    }
}
