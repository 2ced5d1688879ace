//! Execution engine for tiled RQA runs.
//!
//! ## Purpose
//!
//! This module provides the [`Engine`], the state machine that turns
//! [`Settings`] into an [`RqaResult`] without ever materializing the whole
//! recurrence matrix. It plans the work with the selector, dispatches blocks
//! to compute units, threads cross-block carries through the merger, and
//! hands the finished distributions to the aggregator.
//!
//! ## Key concepts
//!
//! ### States
//!
//! ```text
//! Idle -> Planning -> Dispatching -> Collecting -> Aggregated -> Done
//!            |             |              |
//!            +-------------+--------------+--> Failed
//! ```
//!
//! * **Planning**: validate, embed, resolve the radius, build the [`Plan`].
//! * **Dispatching**: compute every assigned block. Outputs are streamed into
//!   the [`CarryMerger`] as they arrive, so carries resolve during dispatch.
//! * **Collecting**: close every lane once the last block is in.
//! * **Aggregated**: distributions are final.
//! * **Done**: measures computed, result returned.
//!
//! Any error ends the run in `Failed`. Partial distributions are dropped and
//! no result is returned.
//!
//! ### Dispatch hook
//!
//! Dispatch is a plain function pointer, [`DispatchFn`]. The default,
//! [`dispatch_sequential`], runs blocks in plan order on the calling thread.
//! Extension crates install parallel or accelerated dispatchers through
//! [`Engine::custom_dispatch`] without the engine knowing about threads.
//!
//! ## Invariants
//!
//! * The sink passed to a dispatcher is only called from the thread that
//!   called [`Engine::run`].
//! * Cancellation and the deadline are checked before every block.
//!
//! ## Visibility
//!
//! [`Engine`], [`EngineConfig`] and [`DispatchFn`] are public so extension
//! crates can drive the engine; most callers use the tiled adapter instead.

use std::sync::Arc;
use std::time::Instant;

use num_traits::Float;
use tracing::{debug, info, instrument, warn};

use crate::algorithms::baseline::Baseline;
use crate::algorithms::variants::{
    BlockContext, BlockOutput, DistanceSource, Variant, VariantScratch,
};
use crate::engine::merger::CarryMerger;
use crate::engine::output::RqaResult;
use crate::engine::selector::{Assignment, Plan, SelectionPolicy, Selector};
use crate::engine::settings::{PreparedRun, RqaConfig, Settings};
use crate::engine::units::{ComputeUnit, ComputeUnitInfo, CpuUnit};
use crate::engine::validator::Validator;
use crate::evaluation::aggregator::Aggregator;
use crate::primitives::cancel::{CancellationToken, RunGuard};
use crate::primitives::errors::{Result, RqaError};
use crate::primitives::lines::LineDistributions;
use crate::primitives::partition::Tiling;

// ============================================================================
// Engine State
// ============================================================================

/// Lifecycle state of an [`Engine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EngineState {
    /// Not running.
    #[default]
    Idle,

    /// Building the assignment plan.
    Planning,

    /// Computing blocks.
    Dispatching,

    /// Resolving the remaining carries.
    Collecting,

    /// Distributions finalized.
    Aggregated,

    /// Result produced.
    Done,

    /// Run aborted; no result.
    Failed,
}

// ============================================================================
// Configuration
// ============================================================================

/// Execution parameters of the engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Side length of an index block.
    pub edge_length: usize,

    /// Block distribution policy.
    pub policy: SelectionPolicy,

    /// Variants bound to compute units, cycled by unit index.
    pub variants: Vec<Variant>,

    /// Evaluation form of the metric.
    pub distance_source: DistanceSource,

    /// Caller-held cancellation token.
    pub cancellation: Option<CancellationToken>,

    /// Wall-clock deadline.
    pub deadline: Option<Instant>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            edge_length: 512,
            policy: SelectionPolicy::default(),
            variants: vec![Variant::default()],
            distance_source: DistanceSource::default(),
            cancellation: None,
            deadline: None,
        }
    }
}

// ============================================================================
// Dispatch
// ============================================================================

/// Everything a dispatcher needs to compute the blocks of a plan.
pub struct DispatchJob<'a, T> {
    /// Shared read-only inputs.
    pub context: &'a BlockContext<'a, T>,

    /// Blocks to compute and their bindings.
    pub plan: &'a Plan,

    /// Compute units addressed by the plan.
    pub units: &'a [Arc<dyn ComputeUnit<T>>],

    /// Cancellation and deadline.
    pub guard: &'a RunGuard,
}

impl<T: Float> DispatchJob<'_, T> {
    /// Compute one assignment on its unit, after checking the guard.
    pub fn compute(
        &self,
        assignment: &Assignment,
        scratch: &mut VariantScratch,
    ) -> Result<BlockOutput> {
        self.guard.check()?;
        let unit = self.units.get(assignment.unit).ok_or_else(|| {
            RqaError::Planning(format!("no compute unit with index {}", assignment.unit))
        })?;
        unit.compute(self.context, assignment.block, assignment.variant, scratch)
    }
}

/// Signature of a block dispatcher.
///
/// The dispatcher must compute every assignment of `job.plan` and pass each
/// output to `sink` from the calling thread. The first error aborts.
pub type DispatchFn<T> =
    fn(&DispatchJob<'_, T>, &mut dyn FnMut(BlockOutput) -> Result<()>) -> Result<()>;

/// Compute blocks in plan order on the calling thread.
pub fn dispatch_sequential<T: Float>(
    job: &DispatchJob<'_, T>,
    sink: &mut dyn FnMut(BlockOutput) -> Result<()>,
) -> Result<()> {
    let mut scratch = VariantScratch::new();
    for assignment in &job.plan.assignments {
        sink(job.compute(assignment, &mut scratch)?)?;
    }
    Ok(())
}

// ============================================================================
// Engine
// ============================================================================

/// Tiled RQA execution engine.
#[derive(Debug)]
pub struct Engine<T: Float> {
    config: EngineConfig,
    units: Vec<Arc<dyn ComputeUnit<T>>>,
    dispatch: Option<DispatchFn<T>>,
    state: EngineState,
    transitions: Vec<EngineState>,
}

impl<T: Float + Send + Sync + 'static> Engine<T> {
    /// Create an engine with a single CPU unit.
    pub fn new(config: EngineConfig) -> Self {
        let cpu: Arc<dyn ComputeUnit<T>> = Arc::new(CpuUnit::default());
        Self {
            config,
            units: vec![cpu],
            dispatch: None,
            state: EngineState::Idle,
            transitions: vec![EngineState::Idle],
        }
    }
}

impl<T: Float> Engine<T> {
    /// Replace the compute units.
    pub fn with_units(mut self, units: Vec<Arc<dyn ComputeUnit<T>>>) -> Self {
        self.units = units;
        self
    }

    /// Install a custom dispatcher; `None` restores sequential dispatch.
    pub fn custom_dispatch(mut self, dispatch: Option<DispatchFn<T>>) -> Self {
        self.dispatch = dispatch;
        self
    }

    /// Current state.
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// States visited by the last run, in order.
    pub fn transitions(&self) -> &[EngineState] {
        &self.transitions
    }

    /// Execution parameters.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn transition(&mut self, next: EngineState) {
        debug!(from = ?self.state, to = ?next, "engine transition");
        self.state = next;
        self.transitions.push(next);
    }

    /// Run the analysis described by `settings`.
    #[instrument(skip_all, fields(n = settings.x.len(), m = settings.y.len()))]
    pub fn run(&mut self, settings: &Settings<'_, T>) -> Result<RqaResult<T>> {
        self.state = EngineState::Idle;
        self.transitions.clear();
        self.transitions.push(EngineState::Idle);

        match self.execute(settings) {
            Ok(result) => Ok(result),
            Err(err) => {
                warn!(state = ?self.state, error = %err, "run failed");
                self.transition(EngineState::Failed);
                Err(err)
            }
        }
    }

    fn execute(&mut self, settings: &Settings<'_, T>) -> Result<RqaResult<T>> {
        self.transition(EngineState::Planning);
        Validator::validate_edge_length(self.config.edge_length)?;
        Validator::validate_variants(&self.config.variants)?;

        let guard = RunGuard::new(self.config.cancellation.clone(), self.config.deadline);
        let prepared = settings.prepare()?;
        guard.check()?;

        let infos: Vec<ComputeUnitInfo> = self.units.iter().map(|u| u.info().clone()).collect();
        let tiling = Tiling::new(prepared.shape, self.config.edge_length)?;
        let plan = Selector::select(tiling, &infos, &self.config.variants, &self.config.policy)?;
        info!(
            rows = prepared.shape.rows,
            cols = prepared.shape.cols,
            blocks = plan.len(),
            edge_length = self.config.edge_length,
            loads = ?plan.unit_loads(),
            "assignment plan ready"
        );

        self.transition(EngineState::Dispatching);
        let config = &settings.config;
        let mut merger = CarryMerger::new(prepared.shape, config.theiler_corrector);
        {
            let context = BlockContext {
                x_series: settings.x,
                y_series: settings.y,
                x_vectors: &prepared.x_vectors,
                y_vectors: prepared.y_vectors(),
                metric: config.metric,
                radius: prepared.radius,
                theiler_corrector: config.theiler_corrector,
                source: self.config.distance_source,
            };
            let job = DispatchJob {
                context: &context,
                plan: &plan,
                units: &self.units,
                guard: &guard,
            };
            let dispatch = self.dispatch.unwrap_or(dispatch_sequential::<T>);
            dispatch(&job, &mut |output: BlockOutput| merger.accept(output))?;
        }

        self.transition(EngineState::Collecting);
        let distributions = merger.finish()?;

        self.transition(EngineState::Aggregated);
        let result = finalize(&prepared, distributions, config);

        self.transition(EngineState::Done);
        Ok(result)
    }
}

fn finalize<T: Float>(
    prepared: &PreparedRun<T>,
    distributions: LineDistributions,
    config: &RqaConfig<T>,
) -> RqaResult<T> {
    let measures = Aggregator::aggregate(&distributions, prepared.total_cells, &config.minimums);
    RqaResult {
        measures,
        distributions,
        effective_radius: prepared.radius,
        rows: prepared.shape.rows,
        cols: prepared.shape.cols,
        theiler_corrector: config.theiler_corrector,
        minimums: config.minimums,
    }
}

// ============================================================================
// Baseline Run
// ============================================================================

impl Baseline {
    /// Full-matrix run of `settings`, used as the reference for every variant.
    pub fn run<T: Float>(settings: &Settings<'_, T>) -> Result<RqaResult<T>> {
        let prepared = settings.prepare()?;
        let config = &settings.config;
        let distributions = Baseline::distributions(
            &prepared.x_vectors,
            prepared.y_vectors(),
            config.metric,
            prepared.radius,
            config.theiler_corrector,
        );
        Ok(finalize(&prepared, distributions, config))
    }
}
