//! Layer 3: Algorithms
//!
//! Core RQA algorithms.
//!
//! This layer decides recurrence and discovers lines. It contains the
//! "business logic" of RQA but is orchestrated by the engine layer.
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
//! Layer 3: Algorithms ← You are here
//!   ↓
//! Layer 2: Math (metric, embedding)
//!   ↓
//! Layer 1: Primitives (errors, partition, lines, runs, cancel)
//! ```

/// Neighbourhood criteria.
///
/// Provides:
/// - Fixed-radius thresholding
/// - Recurrence-rate radius resolution with seeded sampling
pub mod criterion;

/// Block recurrence discovery.
///
/// Provides:
/// - The ten materialization/orientation/recycling variants
/// - Block context with early-exit recurrence test
/// - Block outputs carrying boundary run segments
pub mod variants;

/// Reference oracle.
///
/// Provides:
/// - Full recurrence matrix materialization
/// - Independent line walks for validation
pub mod baseline;
