//! Engine behaviour through the public extension points: custom compute
//! units, custom dispatchers and cancellation from inside a run.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rqa::internals::algorithms::{BlockContext, BlockOutput, VariantScratch};
use rqa::internals::engine::{DispatchJob, Engine, RqaConfig, Settings};
use rqa::internals::primitives::IndexBlock;
use rqa::prelude::*;

fn series() -> Vec<f64> {
    (0..75).map(|i| (i as f64 * 0.41).sin() * (1.0 + 0.01 * i as f64)).collect()
}

fn config() -> RqaConfig<f64> {
    RqaConfig {
        criterion: NeighbourhoodCriterion::fixed_radius(0.25),
        ..RqaConfig::default()
    }
}

/// Counts the blocks it computes and cancels a token after `cancel_after`.
#[derive(Debug)]
struct CountingUnit {
    info: ComputeUnitInfo,
    computed: AtomicUsize,
    cancel_after: Option<(usize, CancellationToken)>,
}

impl CountingUnit {
    fn new(name: &str) -> Self {
        Self {
            info: ComputeUnitInfo::cpu(name),
            computed: AtomicUsize::new(0),
            cancel_after: None,
        }
    }
}

impl ComputeUnit<f64> for CountingUnit {
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
        let done = self.computed.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((limit, token)) = &self.cancel_after {
            if done >= *limit {
                token.cancel();
            }
        }
        Ok(variant.compute(ctx, block, scratch))
    }
}

fn dispatch_reversed(
    job: &DispatchJob<'_, f64>,
    sink: &mut dyn FnMut(BlockOutput) -> Result<()>,
) -> Result<()> {
    let mut scratch = VariantScratch::default();
    for assignment in job.plan.assignments.iter().rev() {
        sink(job.compute(assignment, &mut scratch)?)?;
    }
    Ok(())
}

#[test]
fn custom_units_compute_every_block_once() {
    let s = series();
    let settings = Settings::auto(&s, config());
    let a = Arc::new(CountingUnit::new("a"));
    let b = Arc::new(CountingUnit::new("b"));
    let units: Vec<Arc<dyn ComputeUnit<f64>>> = vec![a.clone(), b.clone()];

    let mut engine = Engine::new(EngineConfig {
        edge_length: 10,
        policy: SelectionPolicy::Even,
        ..EngineConfig::default()
    })
    .with_units(units);
    let result = engine.run(&settings).unwrap();

    // 73 vectors in blocks of 10: 8 x 8 blocks, split 32 / 32.
    assert_eq!(a.computed.load(Ordering::SeqCst), 32);
    assert_eq!(b.computed.load(Ordering::SeqCst), 32);
    assert_eq!(result, Baseline::run(&settings).unwrap());
    assert_eq!(engine.state(), EngineState::Done);
}

#[test]
fn dispatch_order_does_not_change_the_result() {
    let s = series();
    let settings = Settings::auto(&s, config());
    let engine_config = EngineConfig {
        edge_length: 6,
        variants: Variant::all().to_vec(),
        ..EngineConfig::default()
    };

    let forward = Engine::new(engine_config.clone()).run(&settings).unwrap();
    let reversed = Engine::new(engine_config)
        .custom_dispatch(Some(dispatch_reversed))
        .run(&settings)
        .unwrap();
    assert_eq!(forward, reversed);
}

#[test]
fn cancelling_mid_run_stops_dispatch() {
    let s = series();
    let settings = Settings::auto(&s, config());
    let token = CancellationToken::new();
    let unit = Arc::new(CountingUnit {
        cancel_after: Some((5, token.clone())),
        ..CountingUnit::new("cancelling")
    });
    let units: Vec<Arc<dyn ComputeUnit<f64>>> = vec![unit.clone()];

    let mut engine = Engine::new(EngineConfig {
        edge_length: 8,
        cancellation: Some(token),
        ..EngineConfig::default()
    })
    .with_units(units);

    assert_eq!(engine.run(&settings), Err(RqaError::Cancelled));
    assert_eq!(unit.computed.load(Ordering::SeqCst), 5);
    assert_eq!(
        engine.transitions(),
        &[
            EngineState::Idle,
            EngineState::Planning,
            EngineState::Dispatching,
            EngineState::Failed,
        ]
    );
}

#[test]
fn planning_errors_fail_before_dispatch() {
    let s = series();
    let settings = Settings::auto(&s, config());
    let unit = Arc::new(CountingUnit::new("only"));
    let units: Vec<Arc<dyn ComputeUnit<f64>>> = vec![unit.clone()];

    let mut engine = Engine::new(EngineConfig {
        edge_length: 10,
        policy: SelectionPolicy::Explicit(vec![3]),
        ..EngineConfig::default()
    })
    .with_units(units);

    assert!(matches!(engine.run(&settings), Err(RqaError::Planning(_))));
    assert_eq!(unit.computed.load(Ordering::SeqCst), 0);
    assert_eq!(
        engine.transitions(),
        &[EngineState::Idle, EngineState::Planning, EngineState::Failed]
    );
}

#[test]
fn result_reports_run_metadata() {
    let s = series();
    let result = Rqa::new()
        .radius(0.25)
        .theiler_corrector(2)
        .min_diagonal_line_length(3)
        .adapter(Tiled)
        .build()
        .unwrap()
        .run(&s)
        .unwrap();
    assert_eq!((result.rows, result.cols), (73, 73));
    assert_eq!(result.theiler_corrector, 2);
    assert_eq!(result.minimums.diagonal, 3);
    assert_eq!(result.effective_radius, 0.25);

    let report = result.to_string();
    assert!(report.contains("Recurrence rate (RR)"));
}
