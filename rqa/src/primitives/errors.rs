//! Error types for RQA computations.
//!
//! ## Purpose
//!
//! This module defines the single error enum shared by every layer of the
//! crate. Each variant maps to one failure class of a run: malformed
//! parameters, a recurrence-rate search that did not converge, an invalid
//! assignment plan, a failed block computation, or an aborted run.
//!
//! ## Design notes
//!
//! * Errors are surfaced immediately; nothing in the crate retries.
//! * Numerical edge cases (no recurrent points, a series too short to embed
//!   during a full run) are not errors and never appear here.
//! * Messages include the offending values so callers can report them as-is.
//!
//! ## Visibility
//!
//! [`RqaError`] is part of the public API and is returned by every fallible
//! operation.

use thiserror::Error;

use crate::primitives::partition::IndexBlock;

/// Result type alias for RQA operations.
pub type Result<T> = core::result::Result<T, RqaError>;

/// Errors that can occur while configuring or running an RQA computation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RqaError {
    /// Malformed embedding, metric, criterion, Theiler or engine parameter.
    #[error("Invalid parameter `{parameter}`: {reason}")]
    InvalidParameter {
        /// Name of the rejected parameter.
        parameter: &'static str,
        /// Human-readable reason.
        reason: String,
    },

    /// A series sample is NaN or infinite.
    #[error("Non-finite value in series `{series}` at index {index}: {value}")]
    NonFiniteValue {
        /// Which series (`x` or `y`).
        series: &'static str,
        /// Index of the offending sample.
        index: usize,
        /// The sample, widened to `f64`.
        value: f64,
    },

    /// The recurrence-rate criterion failed to find a radius within tolerance.
    #[error(
        "Recurrence rate search for target {target} did not converge after {iterations} iterations \
         (best radius {best_radius}, best rate {best_rate})"
    )]
    Convergence {
        /// Requested recurrence rate.
        target: f64,
        /// Radius whose sampled rate came closest to the target.
        best_radius: f64,
        /// Sampled recurrence rate at `best_radius`.
        best_rate: f64,
        /// Number of refinement steps performed.
        iterations: usize,
    },

    /// The selector produced a non-covering or overlapping assignment.
    #[error("Invalid assignment plan: {0}")]
    Planning(String),

    /// A block computation failed on its compute unit.
    #[error("Block {block} failed on compute unit `{unit}`: {reason}")]
    BlockComputation {
        /// The block that failed.
        block: IndexBlock,
        /// Name of the compute unit the block was bound to.
        unit: String,
        /// Failure description reported by the unit.
        reason: String,
    },

    /// The caller cancelled the run.
    #[error("RQA run cancelled")]
    Cancelled,

    /// The run did not finish before its deadline.
    #[error("RQA run exceeded its deadline")]
    DeadlineExceeded,

    /// A builder parameter was configured more than once.
    #[error("Parameter `{parameter}` was set more than once")]
    DuplicateParameter {
        /// Name of the duplicated parameter.
        parameter: &'static str,
    },
}

impl RqaError {
    /// Shorthand for [`RqaError::InvalidParameter`].
    pub fn invalid(parameter: &'static str, reason: impl Into<String>) -> Self {
        RqaError::InvalidParameter {
            parameter,
            reason: reason.into(),
        }
    }

    /// Returns `true` for errors raised by parameter validation.
    pub fn is_invalid_parameter(&self) -> bool {
        matches!(
            self,
            RqaError::InvalidParameter { .. }
                | RqaError::NonFiniteValue { .. }
                | RqaError::DuplicateParameter { .. }
        )
    }
}
