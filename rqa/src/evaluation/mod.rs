//! Layer 4: Evaluation
//!
//! Post-processing of line statistics.
//!
//! This layer turns finalized line-length distributions into RQA measures.
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
//! Layer 4: Evaluation ← You are here
//!   ↓
//! Layer 3: Algorithms (criterion, variants, baseline)
//!   ↓
//! Layer 2: Math (metric, embedding)
//!   ↓
//! Layer 1: Primitives (errors, partition, lines, runs, cancel)
//! ```

/// RQA measure computation.
///
/// Provides:
/// - Recurrence rate, determinism, laminarity and trapping time
/// - Line-length averages, maxima and entropies
/// - Zero-safe ratios
pub mod aggregator;
