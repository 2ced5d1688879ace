//! # fastrqa
//!
//! Parallel and GPU-accelerated recurrence quantification analysis built on
//! the [`rqa`] crate.
//!
//! The analysis (embedding, neighbourhood criteria, block variants, carry
//! merging, measures) is exactly the one implemented by `rqa`. This crate
//! changes how blocks are executed:
//!
//! * blocks are dispatched on rayon's work-stealing pool and merged on the
//!   calling thread as they complete,
//! * an optional `wgpu` compute unit classifies whole blocks on the GPU,
//! * series can be passed as slices, vectors or contiguous ndarray arrays.
//!
//! ## Quick Start
//!
//! ```rust
//! use fastrqa::prelude::*;
//! use ndarray::Array1;
//!
//! let series = Array1::from_iter((0..500).map(|i| (i as f64 * 0.1).sin()));
//!
//! let rqa = Rqa::new()
//!     .embedding_dimension(3)
//!     .time_delay(4)
//!     .radius(0.2)
//!     .adapter(Tiled)
//!     .edge_length(128)
//!     .build()?;
//!
//! let result = rqa.run(&series)?;
//! println!("{}", result.measures);
//! # Result::<()>::Ok(())
//! ```
//!
//! ## Features
//!
//! * `cpu` (default): rayon-based parallel dispatch.
//! * `gpu`: `wgpu` compute unit, enabled per run with `.gpu(true)`.
//! * `serde`: forwards to `rqa/serde`.
//!
//! ## Architecture
//!
//! ```text
//! Layer 7: API (markers Baseline, Tiled)
//!   ↓
//! Layer 6: Adapters (ExtendedTiledRqa, ExtendedBaselineRqa)
//!   ↓
//! Layer 5: Engine extensions (dispatch_parallel, GpuUnit)
//!   ↓
//! rqa (engine, evaluation, algorithms, math, primitives)
//! ```

// Layer 5: Engine extensions
mod engine;

// Layer 6: Adapters
mod adapters;

// Layer 7: API
mod api;

// Input abstraction
mod input;

/// Building blocks for callers that drive the `rqa` engine directly.
pub mod internals {
    /// Engine extensions.
    pub mod engine {
        pub use crate::engine::executor::dispatch_parallel;
        #[cfg(feature = "gpu")]
        pub use crate::engine::gpu::GpuUnit;
    }

    /// Extended adapters.
    pub mod adapters {
        pub use crate::adapters::baseline::{ExtendedBaselineRqa, ExtendedBaselineRqaBuilder};
        pub use crate::adapters::tiled::{ExtendedTiledRqa, ExtendedTiledRqaBuilder};
    }

    /// Input abstraction.
    pub mod input {
        pub use crate::input::SeriesInput;
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
    pub use crate::input::SeriesInput;
}
