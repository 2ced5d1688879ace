//! Parallel block dispatcher for tiled RQA runs.
//!
//! ## Purpose
//!
//! This module provides the parallel dispatch function that is injected into
//! the `rqa` crate's execution engine. Blocks of the assignment plan are
//! computed on rayon's work-stealing pool while the calling thread merges
//! finished outputs, so cross-block carries resolve as soon as the blocks on
//! both sides of a boundary are done.
//!
//! ## Design notes
//!
//! * **Implementation**: Drop-in replacement for `dispatch_sequential`.
//! * **Parallelism**: `rayon` parallel iterator over the plan's assignments.
//! * **Buffers**: One `VariantScratch` per rayon job split, reused across blocks.
//! * **Collecting**: Outputs travel over an `mpsc` channel and reach the
//!   merger on the thread that called `Engine::run`.
//! * **Generics**: Generic over `Float` types.
//!
//! ## Invariants
//!
//! * Every assignment is computed at most once.
//! * The sink is only invoked from the calling thread.
//! * After the first error no new block is started; the first error is returned.
//!
//! ## Non-goals
//!
//! * This module does not plan the work (handled by `rqa`'s selector).
//! * This module does not thread carries (handled by `rqa`'s merger).

#[cfg(feature = "cpu")]
use std::sync::atomic::{AtomicBool, Ordering};
#[cfg(feature = "cpu")]
use std::sync::mpsc;
#[cfg(feature = "cpu")]
use std::thread;

#[cfg(feature = "cpu")]
use rayon::prelude::*;

use num_traits::Float;
#[cfg(feature = "cpu")]
use tracing::debug;

use rqa::internals::algorithms::BlockOutput;
#[cfg(feature = "cpu")]
use rqa::internals::algorithms::VariantScratch;
use rqa::internals::engine::{dispatch_sequential, DispatchJob};
use rqa::internals::primitives::Result;

// ============================================================================
// Parallel Dispatch Function
// ============================================================================

/// Compute the blocks of `job` in parallel and feed them to `sink`.
#[cfg(feature = "cpu")]
pub fn dispatch_parallel<T>(
    job: &DispatchJob<'_, T>,
    sink: &mut dyn FnMut(BlockOutput) -> Result<()>,
) -> Result<()>
where
    T: Float + Send + Sync,
{
    let assignments = &job.plan.assignments;
    if assignments.len() < 2 {
        return dispatch_sequential(job, sink);
    }
    debug!(
        blocks = assignments.len(),
        threads = rayon::current_num_threads(),
        "parallel dispatch"
    );

    let abort = AtomicBool::new(false);
    let (tx, rx) = mpsc::channel::<Result<BlockOutput>>();

    thread::scope(|scope| {
        let abort = &abort;
        scope.spawn(move || {
            assignments.par_iter().for_each_init(
                || (tx.clone(), VariantScratch::default()),
                |(tx, scratch), assignment| {
                    if abort.load(Ordering::Relaxed) {
                        return;
                    }
                    let outcome = job.compute(assignment, scratch);
                    if outcome.is_err() {
                        abort.store(true, Ordering::Relaxed);
                    }
                    // The receiver only hangs up after an error.
                    let _ = tx.send(outcome);
                },
            );
        });

        let mut first_error = None;
        for outcome in rx {
            if first_error.is_some() {
                continue;
            }
            if let Err(err) = outcome.and_then(|output| sink(output)) {
                abort.store(true, Ordering::Relaxed);
                first_error = Some(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    })
}

/// Fallback when the `cpu` feature is disabled.
#[cfg(not(feature = "cpu"))]
pub fn dispatch_parallel<T: Float>(
    job: &DispatchJob<'_, T>,
    sink: &mut dyn FnMut(BlockOutput) -> Result<()>,
) -> Result<()> {
    dispatch_sequential(job, sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use rqa::internals::algorithms::{BlockContext, Variant, VariantScratch};
    use rqa::internals::engine::{
        ComputeUnit, ComputeUnitInfo, CpuUnit, Engine, EngineConfig, RqaConfig, SelectionPolicy,
        Settings,
    };
    use rqa::internals::primitives::{IndexBlock, RqaError};
    use rqa::prelude::{Baseline, CancellationToken, NeighbourhoodCriterion};

    fn series(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| (i as f64 * 0.29).sin() + 0.2 * (i as f64 * 0.07).cos())
            .collect()
    }

    fn config() -> RqaConfig<f64> {
        RqaConfig {
            criterion: NeighbourhoodCriterion::fixed_radius(0.2),
            theiler_corrector: 2,
            ..RqaConfig::default()
        }
    }

    #[derive(Debug)]
    struct BrokenUnit {
        info: ComputeUnitInfo,
        fail_row: usize,
    }

    impl ComputeUnit<f64> for BrokenUnit {
        fn info(&self) -> &ComputeUnitInfo {
            &self.info
        }

        fn compute(
            &self,
            ctx: &BlockContext<'_, f64>,
            block: IndexBlock,
            variant: Variant,
            scratch: &mut VariantScratch,
        ) -> Result<BlockOutput> {
            if block.row_start == self.fail_row {
                return Err(RqaError::BlockComputation {
                    block,
                    unit: self.info.name.clone(),
                    reason: "injected".into(),
                });
            }
            Ok(variant.compute(ctx, block, scratch))
        }
    }

    #[test]
    fn parallel_dispatch_matches_baseline() {
        let s = series(300);
        let settings = Settings::auto(&s, config());
        let units: Vec<Arc<dyn ComputeUnit<f64>>> = (0..3)
            .map(|k| Arc::new(CpuUnit::new(format!("cpu-{k}"))) as Arc<dyn ComputeUnit<f64>>)
            .collect();
        let mut engine = Engine::new(EngineConfig {
            edge_length: 23,
            policy: SelectionPolicy::Even,
            variants: Variant::all().to_vec(),
            ..EngineConfig::default()
        })
        .with_units(units)
        .custom_dispatch(Some(dispatch_parallel::<f64>));

        let result = engine.run(&settings).unwrap();
        assert_eq!(result, Baseline::run(&settings).unwrap());
    }

    #[test]
    fn first_error_aborts_the_run() {
        let s = series(200);
        let settings = Settings::auto(&s, config());
        let unit: Arc<dyn ComputeUnit<f64>> = Arc::new(BrokenUnit {
            info: ComputeUnitInfo::cpu("broken"),
            fail_row: 40,
        });
        let mut engine = Engine::new(EngineConfig {
            edge_length: 20,
            ..EngineConfig::default()
        })
        .with_units(vec![unit])
        .custom_dispatch(Some(dispatch_parallel::<f64>));

        let err = engine.run(&settings).unwrap_err();
        assert!(matches!(err, RqaError::BlockComputation { ref reason, .. } if reason == "injected"));
    }

    #[test]
    fn cancelled_token_stops_parallel_dispatch() {
        let s = series(120);
        let settings = Settings::auto(&s, config());
        let token = CancellationToken::new();
        token.cancel();
        let mut engine = Engine::new(EngineConfig {
            edge_length: 10,
            cancellation: Some(token),
            ..EngineConfig::default()
        })
        .custom_dispatch(Some(dispatch_parallel::<f64>));
        assert_eq!(engine.run(&settings), Err(RqaError::Cancelled));
    }
}
