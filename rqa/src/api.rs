//! High-level API for recurrence quantification analysis.
//!
//! ## Purpose
//!
//! This module provides the primary user-facing entry point. It implements a
//! fluent builder for configuring the analysis and choosing an execution
//! adapter (Baseline or Tiled).
//!
//! ## Design notes
//!
//! * **Ergonomic**: Fluent builder with the conventional RQA defaults.
//! * **Polymorphic**: Marker types transition to specialized adapter builders.
//! * **Validated**: Parameters are validated when the adapter is built.
//! * **Type-Safe**: Generic over `Float` types for flexible precision.
//!
//! ## Key concepts
//!
//! ### Execution Adapters
//!
//! * **Baseline**: Full-matrix reference computation.
//! * **Tiled**: Block-wise computation through the execution engine.
//!
//! ### Configuration Flow
//!
//! 1. Create an [`RqaBuilder`] via `Rqa::new()`.
//! 2. Chain configuration methods (`.embedding_dimension()`, `.radius()`, etc.).
//! 3. Select an adapter via `.adapter(Adapter::Tiled)` to get an execution builder.
//! 4. `.build()?` and `.run(&series)?`.
//!
//! ## Visibility
//!
//! This is the primary public API. Types re-exported here are considered stable.

use std::sync::Arc;
use std::time::Instant;

use num_traits::Float;

// Internal adapters
use crate::adapters::baseline::BaselineRqaBuilder;
use crate::adapters::tiled::TiledRqaBuilder;
pub use crate::engine::executor::DispatchFn;
use crate::engine::settings::RqaConfig;
use crate::math::embedding::EmbeddingParameters;

// Publicly re-exported types
pub use crate::algorithms::baseline::Baseline;
pub use crate::algorithms::criterion::{
    FixedRadius, NeighbourhoodCriterion, RecurrenceRate, RecurrenceRateConfig,
};
pub use crate::algorithms::variants::{
    DistanceSource, Materialization, Orientation, Recycling, Variant,
};
pub use crate::engine::executor::{EngineConfig, EngineState};
pub use crate::engine::output::RqaResult;
pub use crate::engine::selector::SelectionPolicy;
pub use crate::engine::units::{ComputeUnit, ComputeUnitInfo, CpuUnit, UnitKind};
pub use crate::evaluation::aggregator::{LineMinimums, RqaMeasures};
pub use crate::math::metric::Metric;
pub use crate::primitives::cancel::CancellationToken;
pub use crate::primitives::errors::{Result, RqaError};
pub use crate::primitives::lines::{LineDistributions, LineHistogram};

/// Marker types for selecting execution adapters.
#[allow(non_snake_case)]
pub mod Adapter {
    pub use super::{Baseline, Tiled};
}

/// Fluent builder for configuring RQA parameters and execution modes.
#[derive(Debug, Clone)]
pub struct RqaBuilder<T: Float> {
    /// Embedding dimension.
    pub embedding_dimension: Option<usize>,

    /// Time delay.
    pub time_delay: Option<usize>,

    /// Distance metric.
    pub metric: Option<Metric>,

    /// Neighbourhood criterion (fixed radius or recurrence rate).
    pub criterion: Option<NeighbourhoodCriterion<T>>,

    /// Theiler corrector.
    pub theiler_corrector: Option<usize>,

    /// Minimum diagonal line length.
    pub min_diagonal_line_length: Option<usize>,

    /// Minimum vertical line length.
    pub min_vertical_line_length: Option<usize>,

    /// Minimum white vertical line length.
    pub min_white_vertical_line_length: Option<usize>,

    /// Block edge length (Tiled only).
    pub edge_length: Option<usize>,

    /// Block distribution policy (Tiled only).
    pub policy: Option<SelectionPolicy>,

    /// Variants cycled across compute units (Tiled only).
    pub variants: Option<Vec<Variant>>,

    /// Evaluation form of the metric (Tiled only).
    pub distance_source: Option<DistanceSource>,

    /// Cancellation token (Tiled only).
    pub cancellation: Option<CancellationToken>,

    /// Run deadline (Tiled only).
    pub deadline: Option<Instant>,

    /// Compute units (Tiled only).
    pub units: Option<Vec<Arc<dyn ComputeUnit<T>>>>,

    /// Custom dispatcher (e.g., for parallel execution).
    pub custom_dispatch: Option<DispatchFn<T>>,

    /// Tracks if any parameter was set multiple times (for validation).
    pub(crate) duplicate_param: Option<&'static str>,
}

impl<T: Float> Default for RqaBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Float> RqaBuilder<T> {
    /// Select an execution adapter to transition to an execution builder.
    pub fn adapter<A>(self, _adapter: A) -> A::Output
    where
        A: RqaAdapter<T>,
    {
        A::convert(self)
    }

    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            embedding_dimension: None,
            time_delay: None,
            metric: None,
            criterion: None,
            theiler_corrector: None,
            min_diagonal_line_length: None,
            min_vertical_line_length: None,
            min_white_vertical_line_length: None,
            edge_length: None,
            policy: None,
            variants: None,
            distance_source: None,
            cancellation: None,
            deadline: None,
            units: None,
            custom_dispatch: None,
            duplicate_param: None,
        }
    }

    /// Set the embedding dimension.
    pub fn embedding_dimension(mut self, dimension: usize) -> Self {
        if self.embedding_dimension.is_some() {
            self.duplicate_param = Some("embedding_dimension");
        }
        self.embedding_dimension = Some(dimension);
        self
    }

    /// Set the time delay.
    pub fn time_delay(mut self, delay: usize) -> Self {
        if self.time_delay.is_some() {
            self.duplicate_param = Some("time_delay");
        }
        self.time_delay = Some(delay);
        self
    }

    /// Set the distance metric.
    pub fn metric(mut self, metric: Metric) -> Self {
        if self.metric.is_some() {
            self.duplicate_param = Some("metric");
        }
        self.metric = Some(metric);
        self
    }

    /// Set the neighbourhood criterion.
    pub fn criterion(mut self, criterion: NeighbourhoodCriterion<T>) -> Self {
        if self.criterion.is_some() {
            self.duplicate_param = Some("criterion");
        }
        self.criterion = Some(criterion);
        self
    }

    /// Use a fixed radius.
    pub fn radius(self, radius: T) -> Self {
        self.criterion(NeighbourhoodCriterion::fixed_radius(radius))
    }

    /// Resolve the radius for a target recurrence rate.
    pub fn recurrence_rate(self, target: f64) -> Self {
        self.criterion(NeighbourhoodCriterion::recurrence_rate(target))
    }

    /// Set the Theiler corrector.
    pub fn theiler_corrector(mut self, corrector: usize) -> Self {
        if self.theiler_corrector.is_some() {
            self.duplicate_param = Some("theiler_corrector");
        }
        self.theiler_corrector = Some(corrector);
        self
    }

    /// Set the minimum diagonal line length.
    pub fn min_diagonal_line_length(mut self, length: usize) -> Self {
        if self.min_diagonal_line_length.is_some() {
            self.duplicate_param = Some("min_diagonal_line_length");
        }
        self.min_diagonal_line_length = Some(length);
        self
    }

    /// Set the minimum vertical line length.
    pub fn min_vertical_line_length(mut self, length: usize) -> Self {
        if self.min_vertical_line_length.is_some() {
            self.duplicate_param = Some("min_vertical_line_length");
        }
        self.min_vertical_line_length = Some(length);
        self
    }

    /// Set the minimum white vertical line length.
    pub fn min_white_vertical_line_length(mut self, length: usize) -> Self {
        if self.min_white_vertical_line_length.is_some() {
            self.duplicate_param = Some("min_white_vertical_line_length");
        }
        self.min_white_vertical_line_length = Some(length);
        self
    }

    /// Set the block edge length (Tiled only).
    pub fn edge_length(mut self, edge_length: usize) -> Self {
        if self.edge_length.is_some() {
            self.duplicate_param = Some("edge_length");
        }
        self.edge_length = Some(edge_length);
        self
    }

    /// Set the block distribution policy (Tiled only).
    pub fn policy(mut self, policy: SelectionPolicy) -> Self {
        if self.policy.is_some() {
            self.duplicate_param = Some("policy");
        }
        self.policy = Some(policy);
        self
    }

    /// Run every compute unit with `variant` (Tiled only).
    pub fn variant(self, variant: Variant) -> Self {
        self.variants(vec![variant])
    }

    /// Cycle `variants` across the compute units (Tiled only).
    pub fn variants(mut self, variants: Vec<Variant>) -> Self {
        if self.variants.is_some() {
            self.duplicate_param = Some("variants");
        }
        self.variants = Some(variants);
        self
    }

    /// Set the evaluation form of the metric (Tiled only).
    pub fn distance_source(mut self, source: DistanceSource) -> Self {
        if self.distance_source.is_some() {
            self.duplicate_param = Some("distance_source");
        }
        self.distance_source = Some(source);
        self
    }

    /// Abort runs when `token` is cancelled (Tiled only).
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        if self.cancellation.is_some() {
            self.duplicate_param = Some("cancellation");
        }
        self.cancellation = Some(token);
        self
    }

    /// Abort runs still going at `deadline` (Tiled only).
    pub fn deadline(mut self, deadline: Instant) -> Self {
        if self.deadline.is_some() {
            self.duplicate_param = Some("deadline");
        }
        self.deadline = Some(deadline);
        self
    }

    /// Set the compute units (Tiled only).
    pub fn units(mut self, units: Vec<Arc<dyn ComputeUnit<T>>>) -> Self {
        if self.units.is_some() {
            self.duplicate_param = Some("units");
        }
        self.units = Some(units);
        self
    }

    /// Set a custom dispatcher for execution.
    pub fn custom_dispatch(mut self, dispatch: DispatchFn<T>) -> Self {
        if self.custom_dispatch.is_some() {
            self.duplicate_param = Some("custom_dispatch");
        }
        self.custom_dispatch = Some(dispatch);
        self
    }

    /// Name of the first engine-only option that was set, if any.
    fn engine_option(&self) -> Option<&'static str> {
        [
            ("edge_length", self.edge_length.is_some()),
            ("policy", self.policy.is_some()),
            ("variants", self.variants.is_some()),
            ("distance_source", self.distance_source.is_some()),
            ("cancellation", self.cancellation.is_some()),
            ("deadline", self.deadline.is_some()),
            ("units", self.units.is_some()),
            ("custom_dispatch", self.custom_dispatch.is_some()),
        ]
        .into_iter()
        .find_map(|(name, set)| set.then_some(name))
    }

    fn analysis_config(&self) -> RqaConfig<T> {
        let defaults = RqaConfig::default();
        RqaConfig {
            embedding: EmbeddingParameters {
                dimension: self
                    .embedding_dimension
                    .unwrap_or(defaults.embedding.dimension),
                delay: self.time_delay.unwrap_or(defaults.embedding.delay),
            },
            metric: self.metric.unwrap_or(defaults.metric),
            criterion: self.criterion.unwrap_or(defaults.criterion),
            theiler_corrector: self
                .theiler_corrector
                .unwrap_or(defaults.theiler_corrector),
            minimums: LineMinimums {
                diagonal: self
                    .min_diagonal_line_length
                    .unwrap_or(defaults.minimums.diagonal),
                vertical: self
                    .min_vertical_line_length
                    .unwrap_or(defaults.minimums.vertical),
                white_vertical: self
                    .min_white_vertical_line_length
                    .unwrap_or(defaults.minimums.white_vertical),
            },
        }
    }
}

/// Trait for transitioning from a generic builder to an execution builder.
pub trait RqaAdapter<T: Float> {
    /// The output execution builder.
    type Output;

    /// Convert a generic [`RqaBuilder`] into a specialized execution builder.
    fn convert(builder: RqaBuilder<T>) -> Self::Output;
}

impl<T: Float> RqaAdapter<T> for Baseline {
    type Output = BaselineRqaBuilder<T>;

    fn convert(builder: RqaBuilder<T>) -> Self::Output {
        let deferred_error = builder.engine_option().map(|name| {
            RqaError::invalid(name, "only applies to the Tiled adapter")
        });
        BaselineRqaBuilder {
            config: builder.analysis_config(),
            deferred_error,
            duplicate_param: builder.duplicate_param,
        }
    }
}

/// Marker for block-wise execution through the engine.
#[derive(Debug, Clone, Copy)]
pub struct Tiled;

impl<T: Float> RqaAdapter<T> for Tiled {
    type Output = TiledRqaBuilder<T>;

    fn convert(builder: RqaBuilder<T>) -> Self::Output {
        let mut result = TiledRqaBuilder {
            config: builder.analysis_config(),
            ..TiledRqaBuilder::default()
        };

        // Override with user-provided values
        if let Some(edge_length) = builder.edge_length {
            result.engine.edge_length = edge_length;
        }
        if let Some(policy) = builder.policy {
            result.engine.policy = policy;
        }
        if let Some(variants) = builder.variants {
            result.engine.variants = variants;
        }
        if let Some(source) = builder.distance_source {
            result.engine.distance_source = source;
        }
        result.engine.cancellation = builder.cancellation;
        result.engine.deadline = builder.deadline;
        result.units = builder.units;
        result.custom_dispatch = builder.custom_dispatch;
        result.duplicate_param = builder.duplicate_param;

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_rqa_conventions() {
        let builder = RqaBuilder::<f64>::new().adapter(Tiled);
        assert_eq!(builder.config, RqaConfig::default());
        assert_eq!(builder.config.embedding.dimension, 2);
        assert_eq!(builder.config.embedding.delay, 2);
        assert_eq!(builder.config.theiler_corrector, 1);
        assert_eq!(builder.engine.edge_length, 512);
    }

    #[test]
    fn criterion_setters_share_one_slot() {
        let err = RqaBuilder::<f64>::new()
            .radius(0.5)
            .recurrence_rate(0.1)
            .adapter(Tiled)
            .build()
            .unwrap_err();
        assert_eq!(err, RqaError::DuplicateParameter { parameter: "criterion" });
    }

    #[test]
    fn engine_options_are_rejected_by_baseline() {
        let err = RqaBuilder::<f32>::new()
            .edge_length(64)
            .adapter(Adapter::Baseline)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            RqaError::InvalidParameter { parameter: "edge_length", .. }
        ));
    }

    #[test]
    fn invalid_values_fail_at_build() {
        let err = RqaBuilder::<f64>::new()
            .embedding_dimension(0)
            .adapter(Tiled)
            .build()
            .unwrap_err();
        assert!(err.is_invalid_parameter());

        let err = RqaBuilder::<f64>::new()
            .radius(-1.0)
            .adapter(Baseline)
            .build()
            .unwrap_err();
        assert!(err.is_invalid_parameter());
    }

    #[test]
    fn engine_hooks_reject_duplicates() {
        let token = CancellationToken::new();
        let err = RqaBuilder::<f64>::new()
            .cancellation(token.clone())
            .cancellation(token)
            .adapter(Tiled)
            .build()
            .unwrap_err();
        assert_eq!(err, RqaError::DuplicateParameter { parameter: "cancellation" });

        let dispatch: DispatchFn<f64> = crate::engine::executor::dispatch_sequential::<f64>;
        let err = RqaBuilder::<f64>::new()
            .custom_dispatch(dispatch)
            .custom_dispatch(dispatch)
            .adapter(Tiled)
            .build()
            .unwrap_err();
        assert_eq!(err, RqaError::DuplicateParameter { parameter: "custom_dispatch" });
    }

    #[test]
    fn recurrence_rate_search_bounds_are_configurable() {
        let config = RecurrenceRateConfig {
            tolerance: 0.02,
            max_iterations: 30,
            ..RecurrenceRateConfig::default()
        };
        let criterion = RecurrenceRate::with_config(0.1, config).unwrap();
        let builder = RqaBuilder::<f64>::new()
            .criterion(NeighbourhoodCriterion::RecurrenceRate(criterion))
            .adapter(Tiled);
        assert!(builder.deferred_error.is_none());
        assert_eq!(
            builder.config.criterion,
            NeighbourhoodCriterion::RecurrenceRate(criterion)
        );
    }
}
