//! Layer 5: Engine
//!
//! Planning, dispatch and collection of tiled RQA runs.
//!
//! This layer prepares a run from its settings, assigns index blocks to
//! compute units, threads the cross-block carries of the variants' outputs
//! and produces the final result.
//!
//! # Module Organization
//!
//! - **settings**: Analysis configuration and run preparation
//! - **validator**: Input and configuration validation rules
//! - **units**: Compute unit trait and the CPU unit
//! - **selector**: Block assignment plans
//! - **merger**: Cross-block carry threading
//! - **executor**: The engine state machine
//! - **output**: Result type
//!
//! # Architecture
//!
//! ```text
//! Layer 7: API
//!   ↓
//! Layer 6: Adapters
//!   ↓
//! Layer 5: Engine ← You are here
//!   ↓
//! Layer 4: Evaluation (aggregator)
//!   ↓
//! Layer 3: Algorithms (criterion, variants, baseline)
//!   ↓
//! Layer 2: Math (metric, embedding)
//!   ↓
//! Layer 1: Primitives (errors, partition, lines, runs, cancel)
//! ```

/// Analysis configuration and run preparation.
///
/// Provides:
/// - `RqaConfig` with the conventional RQA defaults
/// - Auto- and cross-recurrence `Settings`
/// - Embedding and radius resolution ahead of a run
pub mod settings;

/// Validation utilities.
///
/// Provides:
/// - Checks for non-finite samples
/// - Configuration bound validation
/// - Engine and compute unit validation
pub mod validator;

/// Compute units.
pub mod units;

/// Block assignment plans.
///
/// Provides:
/// - Single, even, proportional and explicit policies
/// - Coverage and no-overlap verification
pub mod selector;

/// Cross-block carry threading.
pub mod merger;

/// Engine state machine and dispatch hook.
///
/// Provides:
/// - The `Engine` with observable state transitions
/// - Sequential dispatch and the `DispatchFn` extension point
/// - The full-matrix `Baseline::run`
pub mod executor;

/// Output types for RQA runs.
pub mod output;
