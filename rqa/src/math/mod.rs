//! Layer 2: Math
//!
//! Pure mathematical functions.
//!
//! This layer provides the geometry RQA is built on:
//! - Distance metrics between delay vectors
//! - Time-delay embedding of scalar series
//!
//! These are reusable building blocks with no scheduling or aggregation logic.
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
//! Layer 2: Math ← You are here
//!   ↓
//! Layer 1: Primitives (errors, partition, lines, runs, cancel)
//! ```

/// Distance metrics.
///
/// Provides:
/// - Taxicab, Euclidean and Maximum metrics
/// - Series-direct and vector-storage evaluation forms
/// - Component accumulator used for early exit
pub mod metric;

/// Time-delay embedding.
///
/// Provides:
/// - Embedding parameters and vector counts
/// - Flattened embedded vector storage
pub mod embedding;
