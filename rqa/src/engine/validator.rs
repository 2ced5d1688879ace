//! Input validation for RQA configuration and data.
//!
//! ## Purpose
//!
//! This module provides the validation functions for RQA configuration
//! parameters and input series. It ensures that all inputs meet the
//! requirements of a run before any distance is evaluated.
//!
//! ## Design notes
//!
//! * All validation is performed upfront before the engine starts planning.
//! * Validation is fail-fast: returns on first error encountered.
//! * Error messages include specific values and context for debugging.
//! * Checks are ordered from cheap to expensive.
//!
//! ## Validated parameters
//!
//! * **Input series**: All samples finite
//! * **Embedding**: Dimension and delay at least 1
//! * **Criterion**: Radius finite and non-negative; target rate in [0, 1]
//! * **Minimum line lengths**: At least 1
//! * **Edge length**: At least 1
//! * **Variants**: At least one
//! * **Compute units**: At least one, capacities finite and non-negative
//!
//! ## Non-goals
//!
//! * Short series are not rejected here. A series that yields no vectors
//!   produces an empty matrix and a zeroed result.
//!
//! ## Visibility
//!
//! This module is an internal implementation detail used by the builders
//! and the engine. It may change without notice.

use num_traits::Float;

use crate::algorithms::variants::Variant;
use crate::engine::settings::RqaConfig;
use crate::engine::units::ComputeUnitInfo;
use crate::primitives::errors::{Result, RqaError};

// ============================================================================
// Validator
// ============================================================================

/// Validation utility for RQA configuration and input data.
pub struct Validator;

impl Validator {
    // ========================================================================
    // Core Input Validation
    // ========================================================================

    /// Validate that every sample of `series` is finite.
    pub fn validate_series<T: Float>(name: &'static str, series: &[T]) -> Result<()> {
        for (index, value) in series.iter().enumerate() {
            if !value.is_finite() {
                return Err(RqaError::NonFiniteValue {
                    series: name,
                    index,
                    value: value.to_f64().unwrap_or(f64::NAN),
                });
            }
        }
        Ok(())
    }

    // ========================================================================
    // Parameter Validation
    // ========================================================================

    /// Validate a full analysis configuration.
    pub fn validate_config<T: Float>(config: &RqaConfig<T>) -> Result<()> {
        config.embedding.validate()?;
        config.criterion.validate()?;
        Self::validate_min_line_length("min_diagonal_line_length", config.minimums.diagonal)?;
        Self::validate_min_line_length("min_vertical_line_length", config.minimums.vertical)?;
        Self::validate_min_line_length(
            "min_white_vertical_line_length",
            config.minimums.white_vertical,
        )?;
        Ok(())
    }

    /// Validate a minimum line length.
    pub fn validate_min_line_length(parameter: &'static str, length: usize) -> Result<()> {
        if length < 1 {
            return Err(RqaError::invalid(parameter, "must be at least 1"));
        }
        Ok(())
    }

    // ========================================================================
    // Engine Validation
    // ========================================================================

    /// Validate the tiling edge length.
    pub fn validate_edge_length(edge_length: usize) -> Result<()> {
        if edge_length < 1 {
            return Err(RqaError::invalid("edge_length", "must be at least 1"));
        }
        Ok(())
    }

    /// Validate the list of variants bound to compute units.
    pub fn validate_variants(variants: &[Variant]) -> Result<()> {
        if variants.is_empty() {
            return Err(RqaError::invalid("variants", "at least one variant is required"));
        }
        Ok(())
    }

    /// Validate the available compute units.
    pub fn validate_units(units: &[ComputeUnitInfo]) -> Result<()> {
        if units.is_empty() {
            return Err(RqaError::invalid(
                "compute_units",
                "at least one compute unit is required",
            ));
        }
        for unit in units {
            if !unit.capacity.is_finite() || unit.capacity < 0.0 {
                return Err(RqaError::invalid(
                    "capacity",
                    format!(
                        "compute unit `{}` has capacity {}; must be finite and non-negative",
                        unit.name, unit.capacity
                    ),
                ));
            }
        }
        Ok(())
    }

    /// Validate that no parameter was set multiple times.
    pub fn validate_no_duplicates(duplicate_param: Option<&'static str>) -> Result<()> {
        if let Some(parameter) = duplicate_param {
            return Err(RqaError::DuplicateParameter { parameter });
        }
        Ok(())
    }
}
