//! Layer 6: Adapters
//!
//! Execution adapters extending the `rqa` adapters:
//!
//! - **Tiled**: Block-wise computation, parallel by default, optional GPU unit
//! - **Baseline**: Full-matrix reference with the same input types
//!
//! # Architecture
//!
//! ```text
//! Layer 7: API
//!   ↓
//! Layer 6: Adapters ← You are here
//!   ↓
//! Layer 5: Engine (dispatch_parallel, GpuUnit) + rqa engine
//!   ↓
//! Layers 1-4: rqa (primitives, math, algorithms, evaluation)
//! ```

/// Full-matrix reference adapter.
pub mod baseline;

/// Tiled adapter.
///
/// Provides:
/// - Parallel block dispatch (via rayon, enabled by default)
/// - Sequential dispatch (when parallel=false)
/// - GPU compute unit (feature `gpu`)
pub mod tiled;
