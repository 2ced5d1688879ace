//! Layer 6: Adapters
//!
//! High-level execution adapters for RQA.
//!
//! This layer provides user-facing processors that adapt the engine layer to
//! different execution strategies:
//!
//! - **Baseline**: Full-matrix reference computation
//! - **Tiled**: Block-wise computation with cross-block carry
//!
//! # Choosing an Adapter
//!
//! - **Tiled**: Default choice; memory bounded by the block size
//! - **Baseline**: Small series, or as a reference when validating variants
//!
//! # Architecture
//!
//! ```text
//! Layer 7: API
//!   ↓
//! Layer 6: Adapters ← You are here
//!   ↓
//! Layer 5: Engine (settings, selector, merger, executor, output)
//!   ↓
//! Layer 4: Evaluation (aggregator)
//!   ↓
//! Layer 3: Algorithms (criterion, variants, baseline)
//!   ↓
//! Layer 2: Math (metric, embedding)
//!   ↓
//! Layer 1: Primitives (errors, partition, lines, runs, cancel)
//! ```

/// Full-matrix reference adapter.
pub mod baseline;

/// Tiled adapter.
///
/// Provides:
/// - Sequential block dispatch (always available)
/// - Pluggable dispatch and compute units
/// - Cancellation and deadlines
pub mod tiled;
