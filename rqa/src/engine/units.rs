//! Compute units that execute variants on index blocks.
//!
//! ## Purpose
//!
//! A compute unit is one place a block can be computed: the calling CPU, a
//! worker pool, or an accelerator. The selector reads each unit's
//! [`ComputeUnitInfo`] to build a plan, and the dispatcher hands each
//! assigned block to the unit bound to it through [`ComputeUnit::compute`].
//!
//! ## Design notes
//!
//! * Units are shared across worker threads, hence `Send + Sync`.
//! * Per-worker buffers live in the caller's [`VariantScratch`], so units
//!   themselves hold no mutable state.
//! * A failing unit reports [`RqaError::BlockComputation`]; the engine then
//!   fails the whole run.

use core::fmt;

use num_traits::Float;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::algorithms::variants::{BlockContext, BlockOutput, Variant, VariantScratch};
use crate::primitives::errors::Result;
use crate::primitives::partition::IndexBlock;

#[cfg(test)]
use crate::primitives::errors::RqaError;

// ============================================================================
// Unit Description
// ============================================================================

/// Kind of hardware a unit runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum UnitKind {
    /// General-purpose processor.
    #[default]
    Cpu,

    /// Accelerated device such as a GPU.
    Accelerator,
}

/// Description of a compute unit, as seen by the selector.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ComputeUnitInfo {
    /// Human-readable name, used in logs and errors.
    pub name: String,

    /// Hardware kind.
    pub kind: UnitKind,

    /// Relative throughput hint for proportional selection.
    pub capacity: f64,
}

impl ComputeUnitInfo {
    /// Describe a CPU unit of capacity 1.
    pub fn cpu(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: UnitKind::Cpu,
            capacity: 1.0,
        }
    }

    /// Set the capacity hint.
    pub fn with_capacity(mut self, capacity: f64) -> Self {
        self.capacity = capacity;
        self
    }
}

impl fmt::Display for ComputeUnitInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            UnitKind::Cpu => "cpu",
            UnitKind::Accelerator => "accelerator",
        };
        write!(f, "{} ({}, capacity {})", self.name, kind, self.capacity)
    }
}

// ============================================================================
// Compute Unit Trait
// ============================================================================

/// A place where blocks are computed.
pub trait ComputeUnit<T: Float>: Send + Sync + fmt::Debug {
    /// Description used for planning.
    fn info(&self) -> &ComputeUnitInfo;

    /// Compute `block` with `variant`.
    fn compute(
        &self,
        ctx: &BlockContext<'_, T>,
        block: IndexBlock,
        variant: Variant,
        scratch: &mut VariantScratch,
    ) -> Result<BlockOutput>;
}

/// Runs variants on the calling thread.
#[derive(Debug, Clone)]
pub struct CpuUnit {
    info: ComputeUnitInfo,
}

impl CpuUnit {
    /// Create a unit named `name` with capacity 1.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            info: ComputeUnitInfo::cpu(name),
        }
    }

    /// Create a unit with an explicit capacity hint.
    pub fn with_capacity(name: impl Into<String>, capacity: f64) -> Self {
        Self {
            info: ComputeUnitInfo::cpu(name).with_capacity(capacity),
        }
    }
}

impl Default for CpuUnit {
    fn default() -> Self {
        Self::new("cpu")
    }
}

impl<T: Float + Send + Sync> ComputeUnit<T> for CpuUnit {
    fn info(&self) -> &ComputeUnitInfo {
        &self.info
    }

    fn compute(
        &self,
        ctx: &BlockContext<'_, T>,
        block: IndexBlock,
        variant: Variant,
        scratch: &mut VariantScratch,
    ) -> Result<BlockOutput> {
        Ok(variant.compute(ctx, block, scratch))
    }
}

/// Unit that fails every block. Used to exercise failure handling.
#[cfg(test)]
#[derive(Debug)]
pub(crate) struct FailingUnit {
    pub(crate) info: ComputeUnitInfo,
}

#[cfg(test)]
impl<T: Float + Send + Sync> ComputeUnit<T> for FailingUnit {
    fn info(&self) -> &ComputeUnitInfo {
        &self.info
    }

    fn compute(
        &self,
        _ctx: &BlockContext<'_, T>,
        block: IndexBlock,
        _variant: Variant,
        _scratch: &mut VariantScratch,
    ) -> Result<BlockOutput> {
        Err(RqaError::BlockComputation {
            block,
            unit: self.info.name.clone(),
            reason: "device lost".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_unit_describes_itself() {
        let unit = CpuUnit::with_capacity("worker-0", 2.5);
        let info = ComputeUnit::<f64>::info(&unit);
        assert_eq!(info.kind, UnitKind::Cpu);
        assert_eq!(info.capacity, 2.5);
        assert_eq!(info.to_string(), "worker-0 (cpu, capacity 2.5)");
    }
}
