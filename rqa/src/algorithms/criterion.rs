//! Neighbourhood criteria deciding recurrence from a distance.
//!
//! ## Purpose
//!
//! A criterion turns distances into the boolean recurrence relation. Two
//! criteria are supported:
//!
//! * **Fixed radius**: a cell is recurrent iff `distance <= radius`.
//! * **Recurrence rate**: the radius is chosen so that approximately a target
//!   fraction of the eligible cells are recurrent. Once resolved, the run
//!   proceeds exactly as a fixed-radius run with the resolved radius.
//!
//! ## Key concepts
//!
//! ### Radius resolution
//!
//! Resolution draws distances over cells outside the Theiler band. When the
//! number of eligible cells does not exceed `max_samples` every cell is used,
//! which makes the sampled rate equal to the true rate. Otherwise cells are
//! drawn uniformly with a `ChaCha8Rng` seeded from the configuration, so two
//! resolutions of the same input always agree.
//!
//! The sampled distances are sorted and the search bisects over that order:
//! each step picks a candidate radius, measures the sampled rate with one
//! binary search, and moves towards the target. A radius of zero is tried
//! first. If no candidate lands within `tolerance` after `max_iterations`
//! steps, the search fails with the closest radius it saw.
//!
//! ## Invariants
//!
//! * Resolution is deterministic for a fixed seed.
//! * The resolved radius is one of the sampled distances, or zero.

use core::cmp::Ordering;

use num_traits::Float;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::math::embedding::EmbeddedVectors;
use crate::math::metric::Metric;
use crate::primitives::errors::{Result, RqaError};
use crate::primitives::partition::MatrixShape;

// ============================================================================
// Fixed Radius
// ============================================================================

/// Threshold a distance against a fixed radius.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FixedRadius<T> {
    /// Largest distance still considered recurrent.
    pub radius: T,
}

impl<T: Float> FixedRadius<T> {
    /// Create a criterion; the radius must be finite and non-negative.
    pub fn new(radius: T) -> Result<Self> {
        let criterion = Self { radius };
        criterion.validate()?;
        Ok(criterion)
    }

    /// Check the radius.
    pub fn validate(&self) -> Result<()> {
        if !self.radius.is_finite() || self.radius < T::zero() {
            return Err(RqaError::invalid(
                "radius",
                format!(
                    "must be finite and non-negative, got {}",
                    self.radius.to_f64().unwrap_or(f64::NAN)
                ),
            ));
        }
        Ok(())
    }

    /// Returns `true` if `distance` is recurrent.
    #[inline]
    pub fn test(&self, distance: T) -> bool {
        distance <= self.radius
    }
}

// ============================================================================
// Recurrence Rate
// ============================================================================

/// Bounds and seed for recurrence-rate radius resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RecurrenceRateConfig {
    /// Largest accepted `|sampled_rate - target|`.
    pub tolerance: f64,

    /// Maximum number of bisection steps.
    pub max_iterations: usize,

    /// Maximum number of distances drawn.
    pub max_samples: usize,

    /// Seed of the sampling generator.
    pub seed: u64,
}

impl Default for RecurrenceRateConfig {
    fn default() -> Self {
        Self {
            tolerance: 0.01,
            max_iterations: 20,
            max_samples: 250_000,
            seed: 42,
        }
    }
}

/// Target a fraction of recurrent cells.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RecurrenceRate {
    /// Desired recurrence rate in `[0, 1]`.
    pub target: f64,

    /// Search bounds.
    pub config: RecurrenceRateConfig,
}

/// Outcome of a successful radius resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusResolution<T> {
    /// Resolved radius.
    pub radius: T,

    /// Recurrence rate of the sample at `radius`.
    pub rate: f64,

    /// Bisection steps performed.
    pub iterations: usize,

    /// Number of distances drawn.
    pub samples: usize,
}

impl RecurrenceRate {
    /// Create a criterion with default search bounds.
    pub fn new(target: f64) -> Result<Self> {
        Self::with_config(target, RecurrenceRateConfig::default())
    }

    /// Create a criterion with explicit search bounds.
    pub fn with_config(target: f64, config: RecurrenceRateConfig) -> Result<Self> {
        let criterion = Self { target, config };
        criterion.validate()?;
        Ok(criterion)
    }

    /// Check target and search bounds.
    pub fn validate(&self) -> Result<()> {
        if !self.target.is_finite() || !(0.0..=1.0).contains(&self.target) {
            return Err(RqaError::invalid(
                "recurrence_rate",
                format!("must lie in [0, 1], got {}", self.target),
            ));
        }
        let c = &self.config;
        if !c.tolerance.is_finite() || c.tolerance <= 0.0 {
            return Err(RqaError::invalid(
                "tolerance",
                format!("must be finite and positive, got {}", c.tolerance),
            ));
        }
        if c.max_iterations == 0 {
            return Err(RqaError::invalid("max_iterations", "must be at least 1"));
        }
        if c.max_samples == 0 {
            return Err(RqaError::invalid("max_samples", "must be at least 1"));
        }
        Ok(())
    }

    /// Find a radius whose sampled recurrence rate is within tolerance of the target.
    pub fn resolve<T: Float>(
        &self,
        x: &EmbeddedVectors<T>,
        y: &EmbeddedVectors<T>,
        metric: Metric,
        theiler_corrector: usize,
    ) -> Result<RadiusResolution<T>> {
        let mut distances = self.sample_distances(x, y, metric, theiler_corrector);
        let samples = distances.len();
        if samples == 0 {
            return Ok(RadiusResolution {
                radius: T::zero(),
                rate: 0.0,
                iterations: 0,
                samples,
            });
        }
        distances.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

        let rate_at =
            |radius: T| distances.partition_point(|&d| d <= radius) as f64 / samples as f64;
        let target = self.target;
        let tolerance = self.config.tolerance;

        let zero_rate = rate_at(T::zero());
        let mut best = (T::zero(), zero_rate);
        if (zero_rate - target).abs() <= tolerance {
            return Ok(RadiusResolution {
                radius: T::zero(),
                rate: zero_rate,
                iterations: 0,
                samples,
            });
        }

        let (mut lo, mut hi) = (0usize, samples - 1);
        let mut iterations = 0;
        while lo <= hi && iterations < self.config.max_iterations {
            iterations += 1;
            let mid = lo + (hi - lo) / 2;
            let radius = distances[mid];
            let rate = rate_at(radius);
            if (rate - target).abs() < (best.1 - target).abs() {
                best = (radius, rate);
            }
            if (rate - target).abs() <= tolerance {
                debug!(target, rate, iterations, samples, "resolved recurrence-rate radius");
                return Ok(RadiusResolution {
                    radius,
                    rate,
                    iterations,
                    samples,
                });
            }
            if rate < target {
                lo = mid + 1;
            } else if mid == 0 {
                break;
            } else {
                hi = mid - 1;
            }
        }

        Err(RqaError::Convergence {
            target,
            best_radius: best.0.to_f64().unwrap_or(f64::NAN),
            best_rate: best.1,
            iterations,
        })
    }

    fn sample_distances<T: Float>(
        &self,
        x: &EmbeddedVectors<T>,
        y: &EmbeddedVectors<T>,
        metric: Metric,
        theiler_corrector: usize,
    ) -> Vec<T> {
        let shape = MatrixShape::new(x.len(), y.len());
        let eligible = shape.eligible_cells(theiler_corrector);
        if eligible == 0 {
            return Vec::new();
        }

        let dimension = x.dimension();
        let (xs, ys) = (x.as_flat(), y.as_flat());
        let distance = |i: usize, j: usize| metric.distance_from_vectors(xs, ys, dimension, i, j);
        let excluded = |i: usize, j: usize| i.abs_diff(j) <= theiler_corrector;

        let max_samples = self.config.max_samples;
        if eligible <= max_samples as u64 {
            let mut out = Vec::with_capacity(eligible as usize);
            for i in 0..shape.rows {
                for j in 0..shape.cols {
                    if !excluded(i, j) {
                        out.push(distance(i, j));
                    }
                }
            }
            return out;
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        let mut out = Vec::with_capacity(max_samples);
        let max_attempts = max_samples.saturating_mul(64);
        let mut attempts = 0;
        while out.len() < max_samples && attempts < max_attempts {
            attempts += 1;
            let i = rng.gen_range(0..shape.rows);
            let j = rng.gen_range(0..shape.cols);
            if !excluded(i, j) {
                out.push(distance(i, j));
            }
        }
        out
    }
}

// ============================================================================
// Neighbourhood Criterion
// ============================================================================

/// Rule deciding whether a distance is recurrent.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum NeighbourhoodCriterion<T> {
    /// Fixed threshold.
    FixedRadius(FixedRadius<T>),

    /// Adaptive threshold targeting a recurrence rate.
    RecurrenceRate(RecurrenceRate),
}

impl<T: Float> Default for NeighbourhoodCriterion<T> {
    fn default() -> Self {
        NeighbourhoodCriterion::FixedRadius(FixedRadius { radius: T::one() })
    }
}

impl<T: Float> NeighbourhoodCriterion<T> {
    /// Fixed-radius criterion.
    pub fn fixed_radius(radius: T) -> Self {
        NeighbourhoodCriterion::FixedRadius(FixedRadius { radius })
    }

    /// Recurrence-rate criterion with default search bounds.
    pub fn recurrence_rate(target: f64) -> Self {
        NeighbourhoodCriterion::RecurrenceRate(RecurrenceRate {
            target,
            config: RecurrenceRateConfig::default(),
        })
    }

    /// Check the criterion's parameters.
    pub fn validate(&self) -> Result<()> {
        match self {
            NeighbourhoodCriterion::FixedRadius(c) => c.validate(),
            NeighbourhoodCriterion::RecurrenceRate(c) => c.validate(),
        }
    }

    /// Radius the run thresholds against.
    pub fn resolve_radius(
        &self,
        x: &EmbeddedVectors<T>,
        y: &EmbeddedVectors<T>,
        metric: Metric,
        theiler_corrector: usize,
    ) -> Result<T> {
        match self {
            NeighbourhoodCriterion::FixedRadius(c) => Ok(c.radius),
            NeighbourhoodCriterion::RecurrenceRate(c) => {
                c.resolve(x, y, metric, theiler_corrector).map(|r| r.radius)
            }
        }
    }
}
