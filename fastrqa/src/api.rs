//! High-level API for RQA with parallel execution support.
//!
//! ## Purpose
//!
//! This module provides the user-facing API of the crate. It reuses the
//! `rqa` crate's `RqaBuilder` and adds its own `Baseline` and `Tiled` marker
//! types, which return Extended* adapter builders.
//!
//! ## Key concepts
//!
//! ### Builder Pattern
//! ```text
//! Rqa::<f64>::new()
//!     .embedding_dimension(3)
//!     .radius(0.2)
//!     .adapter(Tiled)   // ExtendedTiledRqaBuilder with parallel=true
//!     .gpu(false)
//!     .build()?
//!     .run(&series)
//! ```
//!
//! ### Adapter Selection
//! * **Tiled**: Block-wise engine run (parallel by default)
//! * **Baseline**: Full-matrix reference
//!
//! ## Visibility
//!
//! Types and traits defined here are the primary public API.

use num_traits::Float;

use crate::adapters::baseline::ExtendedBaselineRqaBuilder;
use crate::adapters::tiled::ExtendedTiledRqaBuilder;

// ============================================================================
// Re-exports from rqa crate
// ============================================================================

// Import base marker types for delegation
use rqa::internals::algorithms::Baseline as BaseBaseline;
use rqa::prelude::Tiled as BaseTiled;

pub use rqa::internals::api::{RqaAdapter, RqaBuilder};

pub use rqa::prelude::{
    CancellationToken, ComputeUnit, ComputeUnitInfo, CpuUnit, DistanceSource, EngineConfig,
    EngineState, FixedRadius, LineDistributions, LineHistogram, LineMinimums, Materialization,
    Metric, NeighbourhoodCriterion, Orientation, RecurrenceRate, RecurrenceRateConfig,
    Recycling, Result, RqaError, RqaMeasures, RqaResult, SelectionPolicy, UnitKind, Variant,
};

// ============================================================================
// Adapter Module
// ============================================================================

/// Adapter selection namespace.
#[allow(non_snake_case)]
pub mod Adapter {
    pub use super::{Baseline, Tiled};
}

// ============================================================================
// Adapter Marker Types
// ============================================================================

/// Marker type for the full-matrix reference adapter.
#[derive(Debug, Clone, Copy)]
pub struct Baseline;

impl<T: Float> RqaAdapter<T> for Baseline {
    type Output = ExtendedBaselineRqaBuilder<T>;

    fn convert(builder: RqaBuilder<T>) -> Self::Output {
        // Delegate to base implementation to create base builder
        let base = <BaseBaseline as RqaAdapter<T>>::convert(builder);
        ExtendedBaselineRqaBuilder { base }
    }
}

/// Marker type for the tiled adapter.
///
/// Blocks are dispatched in parallel by default.
#[derive(Debug, Clone, Copy)]
pub struct Tiled;

impl<T: Float> RqaAdapter<T> for Tiled {
    type Output = ExtendedTiledRqaBuilder<T>;

    fn convert(builder: RqaBuilder<T>) -> Self::Output {
        // Delegate to base implementation to create base builder
        let base = <BaseTiled as RqaAdapter<T>>::convert(builder);

        // Wrap with extension fields
        ExtendedTiledRqaBuilder {
            base,
            parallel: true,
            gpu: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiled_marker_defaults_to_parallel() {
        let builder = RqaBuilder::<f64>::new().edge_length(32).adapter(Tiled);
        assert!(builder.parallel);
        assert!(!builder.gpu);
        assert_eq!(builder.base.engine.edge_length, 32);
    }

    #[test]
    fn baseline_marker_keeps_engine_option_check() {
        let err = RqaBuilder::<f64>::new()
            .edge_length(32)
            .adapter(Adapter::Baseline)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            RqaError::InvalidParameter { parameter: "edge_length", .. }
        ));
    }

    #[cfg(not(feature = "gpu"))]
    #[test]
    fn gpu_without_feature_is_rejected() {
        let err = RqaBuilder::<f32>::new()
            .adapter(Tiled)
            .gpu(true)
            .build()
            .unwrap_err();
        assert!(matches!(err, RqaError::InvalidParameter { parameter: "gpu", .. }));
    }
}
