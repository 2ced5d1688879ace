//! Layer 1: Primitives
//!
//! Core building blocks and types.
//!
//! This layer provides the primitive abstractions, data structures, and
//! utility functions used throughout the crate. It has zero internal
//! dependencies outside itself.
//!
//! # Module Organization
//!
//! - **errors**: Shared error type (RqaError)
//! - **partition**: Matrix shape, index blocks and edge-length tiling
//! - **lines**: Line-length histograms and distributions
//! - **runs**: Run tracking and boundary segments for cross-block carry
//! - **cancel**: Cancellation token and deadline guard
//!
//! # Architecture
//!
//! ```text
//! Layer 7: API
//!   ↓
//! Layer 6: Adapters
//!   ↓
//! Layer 5: Engine (settings, selector, merger, executor, output)
//!   ↓
//! Layer 4: Evaluation (aggregator)
//!   ↓
//! Layer 3: Algorithms (criterion, variants, baseline)
//!   ↓
//! Layer 2: Math (metric, embedding)
//!   ↓
//! Layer 1: Primitives ← You are here
//! ```

/// Shared error types.
///
/// Provides:
/// - Unified `RqaError` enum
/// - Crate-wide `Result` alias
pub mod errors;

/// Index-space geometry.
///
/// Provides:
/// - Matrix shape and diagonal geometry
/// - Half-open index blocks
/// - Edge-length tiling in row-major order
pub mod partition;

/// Line-length statistics.
///
/// Provides:
/// - `LineHistogram` keyed by line length
/// - `LineDistributions` (diagonal, vertical, white vertical)
pub mod lines;

/// Run tracking.
///
/// Provides:
/// - `RunTracker` for one piece of a diagonal or column
/// - `RunSegment` boundary summaries exchanged between blocks
pub mod runs;

/// Cancellation.
///
/// Provides:
/// - `CancellationToken` shared with the caller
/// - `RunGuard` combining token and deadline
pub mod cancel;
