//! # rqa
//!
//! Recurrence quantification analysis (RQA) of scalar time series.
//!
//! The crate delay-embeds one or two series, decides recurrence between every
//! pair of embedded vectors with a fixed radius or a target recurrence rate,
//! and reduces the recurrence matrix to diagonal, vertical and white vertical
//! line-length distributions. The classical RQA measures (recurrence rate,
//! determinism, laminarity, trapping time, entropies, ...) are computed from
//! those distributions.
//!
//! The matrix is never materialized by the tiled adapter. It is cut into
//! square blocks, each block is computed by one of ten interchangeable
//! variants, and lines crossing block boundaries are stitched back together
//! by a carry merger. A full-matrix baseline is kept as the reference.
//!
//! ## Quick Start
//!
//! ```rust
//! use rqa::prelude::*;
//!
//! let series: Vec<f64> = (0..200).map(|i| (i as f64 * 0.2).sin()).collect();
//!
//! let rqa = Rqa::new()
//!     .embedding_dimension(3)
//!     .time_delay(2)
//!     .metric(Metric::Euclidean)
//!     .radius(0.3)
//!     .theiler_corrector(1)
//!     .adapter(Tiled)
//!     .edge_length(64)
//!     .build()?;
//!
//! let result = rqa.run(&series)?;
//! assert!(result.recurrence_rate() > 0.0);
//! # Result::<()>::Ok(())
//! ```
//!
//! ## Execution Adapters
//!
//! | Adapter    | Memory     | Use case                                   |
//! |------------|------------|--------------------------------------------|
//! | `Tiled`    | O(edge^2)  | Default; any series length                 |
//! | `Baseline` | O(N * M)   | Small inputs; reference for the variants   |
//!
//! ## Cross Recurrence
//!
//! `run_cross(&x, &y)` analyses x-vectors (rows) against y-vectors (columns).
//! The Theiler band applies to `|i - j|` in both modes.
//!
//! ## Features
//!
//! * `serde`: `Serialize`/`Deserialize` on configuration and result types.
//!
//! ## Architecture
//!
//! ```text
//! Layer 7: API (RqaBuilder, adapter markers)
//!   ↓
//! Layer 6: Adapters (baseline, tiled)
//!   ↓
//! Layer 5: Engine (settings, validator, units, selector, merger, executor, output)
//!   ↓
//! Layer 4: Evaluation (aggregator)
//!   ↓
//! Layer 3: Algorithms (criterion, variants, baseline)
//!   ↓
//! Layer 2: Math (metric, embedding)
//!   ↓
//! Layer 1: Primitives (errors, partition, lines, runs, cancel)
//! ```

// Layer 1: Primitives
mod primitives;

// Layer 2: Math
mod math;

// Layer 3: Algorithms
mod algorithms;

// Layer 4: Evaluation
mod evaluation;

// Layer 5: Engine
mod engine;

// Layer 6: Adapters
mod adapters;

// Layer 7: API
mod api;

/// Building blocks for extension crates.
///
/// These items let other crates install dispatchers, implement compute units
/// and drive the engine directly. They are less stable than the prelude.
pub mod internals {
    /// Layer 1 items.
    pub mod primitives {
        pub use crate::primitives::cancel::{CancellationToken, RunGuard};
        pub use crate::primitives::errors::{Result, RqaError};
        pub use crate::primitives::lines::{LineDistributions, LineHistogram};
        pub use crate::primitives::partition::{IndexBlock, MatrixShape, Tiling};
        pub use crate::primitives::runs::{RunSegment, RunTracker};
    }

    /// Layer 2 items.
    pub mod math {
        pub use crate::math::embedding::{embed, EmbeddedVectors, EmbeddingParameters};
        pub use crate::math::metric::Metric;
    }

    /// Layer 3 items.
    pub mod algorithms {
        pub use crate::algorithms::baseline::{Baseline, RecurrenceMatrix};
        pub use crate::algorithms::criterion::{
            FixedRadius, NeighbourhoodCriterion, RadiusResolution, RecurrenceRate,
            RecurrenceRateConfig,
        };
        pub use crate::algorithms::variants::{
            accumulate_block, BlockContext, BlockOutput, Cell, DistanceSource, Materialization,
            Orientation, Recycling, Variant, VariantScratch,
        };
    }

    /// Layer 4 items.
    pub mod evaluation {
        pub use crate::evaluation::aggregator::{Aggregator, LineMinimums, RqaMeasures};
    }

    /// Layer 5 items.
    pub mod engine {
        pub use crate::engine::executor::{
            dispatch_sequential, DispatchFn, DispatchJob, Engine, EngineConfig, EngineState,
        };
        pub use crate::engine::merger::CarryMerger;
        pub use crate::engine::output::RqaResult;
        pub use crate::engine::selector::{Assignment, Plan, SelectionPolicy, Selector};
        pub use crate::engine::settings::{PreparedRun, RqaConfig, Settings};
        pub use crate::engine::units::{ComputeUnit, ComputeUnitInfo, CpuUnit, UnitKind};
        pub use crate::engine::validator::Validator;
    }

    /// Layer 6 items.
    pub mod adapters {
        pub use crate::adapters::baseline::{BaselineRqa, BaselineRqaBuilder};
        pub use crate::adapters::tiled::{TiledRqa, TiledRqaBuilder};
    }

    /// Layer 7 items.
    pub mod api {
        pub use crate::api::{RqaAdapter, RqaBuilder};
    }
}

/// Standard imports.
pub mod prelude {
    pub use crate::api::{
        Adapter, Baseline, CancellationToken, ComputeUnit, ComputeUnitInfo, CpuUnit,
        DistanceSource, EngineConfig, EngineState, FixedRadius, LineDistributions,
        LineHistogram, LineMinimums, Materialization, Metric, NeighbourhoodCriterion,
        Orientation, RecurrenceRate, RecurrenceRateConfig, Recycling, Result, RqaBuilder as Rqa,
        RqaError, RqaMeasures, RqaResult, SelectionPolicy, Tiled, UnitKind, Variant,
    };
}
