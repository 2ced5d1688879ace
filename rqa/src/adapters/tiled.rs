//! Tiled adapter: block-wise RQA through the execution engine.
//!
//! ## Purpose
//!
//! This adapter runs an analysis without materializing the recurrence matrix.
//! The matrix is tiled into blocks of side `edge_length`, each block is
//! computed by a variant on a compute unit, and cross-block lines are
//! stitched together by the engine's carry merger.
//!
//! ## Design notes
//!
//! * Memory is bounded by the block size, not by N * M.
//! * A fresh [`Engine`] is created for every run; the processor itself is
//!   immutable and can be shared.
//! * Dispatch is sequential unless a custom dispatcher is installed, which is
//!   how extension crates add parallel execution.
//!
//! ## Key concepts
//!
//! ### Variants and units
//!
//! Every compute unit runs one variant; with several units the variants are
//! cycled by unit index. Results are identical whichever variant runs.
//!
//! ## Visibility
//!
//! Reached through `Rqa::new().adapter(Tiled)`.

use std::sync::Arc;
use std::time::Instant;

use num_traits::Float;

use crate::algorithms::criterion::NeighbourhoodCriterion;
use crate::algorithms::variants::{DistanceSource, Variant};
use crate::engine::executor::{DispatchFn, Engine, EngineConfig};
use crate::engine::output::RqaResult;
use crate::engine::selector::SelectionPolicy;
use crate::engine::settings::{RqaConfig, Settings};
use crate::engine::units::{ComputeUnit, ComputeUnitInfo};
use crate::engine::validator::Validator;
use crate::math::metric::Metric;
use crate::primitives::cancel::CancellationToken;
use crate::primitives::errors::{Result, RqaError};

// ============================================================================
// Tiled RQA Builder
// ============================================================================

/// Builder for the tiled processor.
#[derive(Debug, Clone)]
pub struct TiledRqaBuilder<T: Float> {
    /// Analysis parameters.
    pub config: RqaConfig<T>,

    /// Execution parameters.
    pub engine: EngineConfig,

    /// Compute units; a single CPU unit when unset.
    pub units: Option<Vec<Arc<dyn ComputeUnit<T>>>>,

    /// Custom dispatcher (e.g., for parallel execution).
    pub custom_dispatch: Option<DispatchFn<T>>,

    /// Deferred error from adapter conversion.
    pub deferred_error: Option<RqaError>,

    /// Tracks if any parameter was set multiple times (for validation).
    pub(crate) duplicate_param: Option<&'static str>,
}

impl<T: Float> Default for TiledRqaBuilder<T> {
    fn default() -> Self {
        Self {
            config: RqaConfig::default(),
            engine: EngineConfig::default(),
            units: None,
            custom_dispatch: None,
            deferred_error: None,
            duplicate_param: None,
        }
    }
}

impl<T: Float> TiledRqaBuilder<T> {
    // ========================================================================
    // Shared Setters
    // ========================================================================

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

    // ========================================================================
    // Tiled-Specific Setters
    // ========================================================================

    /// Set the block edge length.
    pub fn edge_length(mut self, edge_length: usize) -> Self {
        self.engine.edge_length = edge_length;
        self
    }

    /// Set the block distribution policy.
    pub fn policy(mut self, policy: SelectionPolicy) -> Self {
        self.engine.policy = policy;
        self
    }

    /// Run every unit with `variant`.
    pub fn variant(mut self, variant: Variant) -> Self {
        self.engine.variants = vec![variant];
        self
    }

    /// Cycle `variants` across the compute units.
    pub fn variants(mut self, variants: Vec<Variant>) -> Self {
        self.engine.variants = variants;
        self
    }

    /// Set the evaluation form of the metric.
    pub fn distance_source(mut self, source: DistanceSource) -> Self {
        self.engine.distance_source = source;
        self
    }

    /// Abort runs when `token` is cancelled.
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.engine.cancellation = Some(token);
        self
    }

    /// Abort runs that are still going at `deadline`.
    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.engine.deadline = Some(deadline);
        self
    }

    /// Set the compute units.
    pub fn units(mut self, units: Vec<Arc<dyn ComputeUnit<T>>>) -> Self {
        self.units = Some(units);
        self
    }

    /// Set a custom dispatcher.
    pub fn custom_dispatch(mut self, dispatch: DispatchFn<T>) -> Self {
        self.custom_dispatch = Some(dispatch);
        self
    }

    // ========================================================================
    // Build Method
    // ========================================================================

    /// Build the processor.
    pub fn build(self) -> Result<TiledRqa<T>> {
        if let Some(err) = self.deferred_error {
            return Err(err);
        }
        Validator::validate_no_duplicates(self.duplicate_param)?;
        Validator::validate_config(&self.config)?;
        Validator::validate_edge_length(self.engine.edge_length)?;
        Validator::validate_variants(&self.engine.variants)?;
        if let Some(units) = &self.units {
            let infos: Vec<ComputeUnitInfo> = units.iter().map(|u| u.info().clone()).collect();
            Validator::validate_units(&infos)?;
        }

        Ok(TiledRqa {
            config: self.config,
            engine: self.engine,
            units: self.units,
            custom_dispatch: self.custom_dispatch,
        })
    }
}

// ============================================================================
// Tiled RQA Processor
// ============================================================================

/// Tiled processor.
#[derive(Debug, Clone)]
pub struct TiledRqa<T: Float> {
    config: RqaConfig<T>,
    engine: EngineConfig,
    units: Option<Vec<Arc<dyn ComputeUnit<T>>>>,
    custom_dispatch: Option<DispatchFn<T>>,
}

impl<T: Float + Send + Sync + 'static> TiledRqa<T> {
    /// A fresh engine configured for this processor.
    pub fn engine(&self) -> Engine<T> {
        let engine = Engine::new(self.engine.clone()).custom_dispatch(self.custom_dispatch);
        match &self.units {
            Some(units) => engine.with_units(units.clone()),
            None => engine,
        }
    }

    /// Auto-recurrence analysis of `series`.
    pub fn run(&self, series: &[T]) -> Result<RqaResult<T>> {
        self.engine().run(&Settings::auto(series, self.config))
    }

    /// Cross-recurrence analysis of `x` against `y`.
    pub fn run_cross(&self, x: &[T], y: &[T]) -> Result<RqaResult<T>> {
        self.engine().run(&Settings::cross(x, y, self.config))
    }

    /// Analysis parameters.
    pub fn config(&self) -> &RqaConfig<T> {
        &self.config
    }

    /// Execution parameters.
    pub fn engine_config(&self) -> &EngineConfig {
        &self.engine
    }
}
