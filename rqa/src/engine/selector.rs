//! Assignment of index blocks to compute units.
//!
//! ## Purpose
//!
//! The selector turns a [`Tiling`] of the recurrence matrix into a [`Plan`]:
//! one [`Assignment`] per block, binding it to exactly one compute unit and
//! the variant that unit runs. The engine consumes the plan without looking
//! at how it was made.
//!
//! ## Key concepts
//!
//! ### Policies
//!
//! * **Single**: every block goes to the first unit.
//! * **Even**: blocks are split by count; the first `total % units` units
//!   receive one extra block.
//! * **Proportional**: blocks are split by the units' capacity hints using
//!   the largest-remainder method, ties going to the lower unit index.
//! * **Explicit**: the caller states the number of blocks per unit.
//!
//! Each unit receives a contiguous run of blocks in row-major order, so a
//! unit sweeps neighbouring tiles and the carry between them resolves early.
//!
//! ### Variant binding
//!
//! Unit `k` runs `variants[k % variants.len()]` for all its blocks.
//!
//! ## Invariants
//!
//! * Every block of the tiling is assigned exactly once.
//! * Every assignment names an existing unit.
//!
//! [`Plan::verify`] checks both and reports [`RqaError::Planning`].

use num_traits::ToPrimitive;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::algorithms::variants::Variant;
use crate::engine::units::ComputeUnitInfo;
use crate::engine::validator::Validator;
use crate::primitives::errors::{Result, RqaError};
use crate::primitives::partition::{IndexBlock, Tiling};

// ============================================================================
// Policy
// ============================================================================

/// How blocks are distributed across compute units.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SelectionPolicy {
    /// All blocks on the first unit.
    #[default]
    Single,

    /// Equal block counts per unit.
    Even,

    /// Block counts weighted by unit capacity.
    Proportional,

    /// Explicit block count per unit, in unit order.
    Explicit(Vec<usize>),
}

// ============================================================================
// Plan
// ============================================================================

/// One block bound to one unit and variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment {
    /// Block to compute.
    pub block: IndexBlock,

    /// Index of the compute unit.
    pub unit: usize,

    /// Variant the unit runs for this block.
    pub variant: Variant,
}

/// Complete assignment of a tiling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    /// Tiling the plan covers.
    pub tiling: Tiling,

    /// Number of compute units the plan may address.
    pub unit_count: usize,

    /// Assignments in dispatch order.
    pub assignments: Vec<Assignment>,
}

impl Plan {
    /// Check full coverage and the absence of double assignment.
    pub fn verify(&self) -> Result<()> {
        let expected = self.tiling.block_count();
        let mut seen = vec![false; expected];
        for assignment in &self.assignments {
            if assignment.unit >= self.unit_count {
                return Err(RqaError::Planning(format!(
                    "block {} is bound to unit {} but only {} units exist",
                    assignment.block, assignment.unit, self.unit_count
                )));
            }
            let index = self.tiling.grid_index(&assignment.block).ok_or_else(|| {
                RqaError::Planning(format!(
                    "block {} is not a tile of edge length {}",
                    assignment.block, self.tiling.edge_length
                ))
            })?;
            if seen[index] {
                return Err(RqaError::Planning(format!(
                    "block {} is assigned more than once",
                    assignment.block
                )));
            }
            seen[index] = true;
        }
        if let Some(missing) = seen.iter().position(|&s| !s) {
            let block = self
                .tiling
                .block(missing)
                .map(|b| b.to_string())
                .unwrap_or_default();
            return Err(RqaError::Planning(format!("block {} is not assigned", block)));
        }
        Ok(())
    }

    /// Number of blocks per unit.
    pub fn unit_loads(&self) -> Vec<usize> {
        let mut loads = vec![0; self.unit_count];
        for a in &self.assignments {
            if let Some(load) = loads.get_mut(a.unit) {
                *load += 1;
            }
        }
        loads
    }

    /// Number of assigned blocks.
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    /// Returns `true` if there is nothing to compute.
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

// ============================================================================
// Selector
// ============================================================================

/// Builds assignment plans.
pub struct Selector;

impl Selector {
    /// Assign every block of `tiling` to one of `units`.
    pub fn select(
        tiling: Tiling,
        units: &[ComputeUnitInfo],
        variants: &[Variant],
        policy: &SelectionPolicy,
    ) -> Result<Plan> {
        Validator::validate_units(units)?;
        Validator::validate_variants(variants)?;

        let total = tiling.block_count();
        let counts = match policy {
            SelectionPolicy::Single => Self::single(total, units.len()),
            SelectionPolicy::Even => Self::even(total, units.len()),
            SelectionPolicy::Proportional => Self::proportional(total, units)?,
            SelectionPolicy::Explicit(counts) => Self::explicit(total, units.len(), counts)?,
        };

        let mut blocks = tiling.blocks();
        let mut assignments = Vec::with_capacity(total);
        for (unit, &count) in counts.iter().enumerate() {
            let variant = variants[unit % variants.len()];
            for block in blocks.by_ref().take(count) {
                assignments.push(Assignment {
                    block,
                    unit,
                    variant,
                });
            }
        }

        let plan = Plan {
            tiling,
            unit_count: units.len(),
            assignments,
        };
        plan.verify()?;
        Ok(plan)
    }

    fn single(total: usize, units: usize) -> Vec<usize> {
        let mut counts = vec![0; units];
        counts[0] = total;
        counts
    }

    fn even(total: usize, units: usize) -> Vec<usize> {
        let (base, extra) = (total / units, total % units);
        (0..units).map(|k| base + usize::from(k < extra)).collect()
    }

    fn proportional(total: usize, units: &[ComputeUnitInfo]) -> Result<Vec<usize>> {
        let capacity: f64 = units.iter().map(|u| u.capacity).sum();
        if capacity <= 0.0 {
            return Err(RqaError::Planning(
                "proportional selection needs a positive total capacity".into(),
            ));
        }

        let quotas: Vec<f64> = units
            .iter()
            .map(|u| total as f64 * u.capacity / capacity)
            .collect();
        let mut counts: Vec<usize> = quotas
            .iter()
            .map(|q| q.floor().to_usize().unwrap_or(0))
            .collect();

        let assigned: usize = counts.iter().sum();
        let mut order: Vec<usize> = (0..units.len()).collect();
        order.sort_by(|&a, &b| {
            let ra = quotas[a] - quotas[a].floor();
            let rb = quotas[b] - quotas[b].floor();
            rb.total_cmp(&ra).then(a.cmp(&b))
        });
        for &k in order.iter().cycle().take(total.saturating_sub(assigned)) {
            counts[k] += 1;
        }
        Ok(counts)
    }

    fn explicit(total: usize, units: usize, counts: &[usize]) -> Result<Vec<usize>> {
        if counts.len() != units {
            return Err(RqaError::Planning(format!(
                "explicit sizing names {} units but {} are available",
                counts.len(),
                units
            )));
        }
        let sum: usize = counts.iter().sum();
        if sum != total {
            return Err(RqaError::Planning(format!(
                "explicit sizing assigns {} blocks but the tiling has {}",
                sum, total
            )));
        }
        Ok(counts.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::partition::MatrixShape;

    fn units(capacities: &[f64]) -> Vec<ComputeUnitInfo> {
        capacities
            .iter()
            .enumerate()
            .map(|(k, &c)| ComputeUnitInfo::cpu(format!("cpu-{k}")).with_capacity(c))
            .collect()
    }

    fn tiling(rows: usize, cols: usize, edge: usize) -> Tiling {
        Tiling::new(MatrixShape::new(rows, cols), edge).unwrap()
    }

    #[test]
    fn even_split_gives_remainder_to_first_units() {
        let plan = Selector::select(
            tiling(10, 10, 3),
            &units(&[1.0, 1.0, 1.0]),
            &[Variant::default()],
            &SelectionPolicy::Even,
        )
        .unwrap();
        assert_eq!(plan.len(), 16);
        assert_eq!(plan.unit_loads(), vec![6, 5, 5]);
    }

    #[test]
    fn proportional_split_follows_capacity() {
        let plan = Selector::select(
            tiling(8, 8, 2),
            &units(&[3.0, 1.0]),
            &[Variant::default()],
            &SelectionPolicy::Proportional,
        )
        .unwrap();
        assert_eq!(plan.unit_loads(), vec![12, 4]);

        let plan = Selector::select(
            tiling(5, 2, 1),
            &units(&[1.0, 1.0, 1.0]),
            &[Variant::default()],
            &SelectionPolicy::Proportional,
        )
        .unwrap();
        assert_eq!(plan.unit_loads(), vec![4, 3, 3]);
    }

    #[test]
    fn explicit_sizing_must_cover_the_tiling() {
        let err = Selector::select(
            tiling(4, 4, 2),
            &units(&[1.0, 1.0]),
            &[Variant::default()],
            &SelectionPolicy::Explicit(vec![1, 2]),
        )
        .unwrap_err();
        assert!(matches!(err, RqaError::Planning(_)));

        let plan = Selector::select(
            tiling(4, 4, 2),
            &units(&[1.0, 1.0]),
            &[Variant::default()],
            &SelectionPolicy::Explicit(vec![1, 3]),
        )
        .unwrap();
        assert_eq!(plan.unit_loads(), vec![1, 3]);
    }

    #[test]
    fn units_cycle_through_variants() {
        let variants = Variant::all();
        let plan = Selector::select(
            tiling(6, 6, 2),
            &units(&[1.0; 3]),
            &variants[..2],
            &SelectionPolicy::Even,
        )
        .unwrap();
        for a in &plan.assignments {
            assert_eq!(a.variant, variants[a.unit % 2]);
        }
    }

    #[test]
    fn verify_rejects_overlap_and_gaps() {
        let mut plan = Selector::select(
            tiling(4, 4, 2),
            &units(&[1.0]),
            &[Variant::default()],
            &SelectionPolicy::Single,
        )
        .unwrap();
        assert!(plan.verify().is_ok());

        let first = plan.assignments[0];
        plan.assignments[1] = first;
        assert!(matches!(plan.verify(), Err(RqaError::Planning(_))));

        plan.assignments.remove(1);
        assert!(matches!(plan.verify(), Err(RqaError::Planning(_))));
    }

    #[test]
    fn empty_tiling_yields_empty_plan() {
        let plan = Selector::select(
            tiling(0, 0, 4),
            &units(&[1.0, 2.0]),
            &[Variant::default()],
            &SelectionPolicy::Proportional,
        )
        .unwrap();
        assert!(plan.is_empty());
    }
}
