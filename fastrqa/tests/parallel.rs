//! Parallel dispatch must reproduce sequential dispatch and the baseline.

use std::sync::Arc;

use approx::assert_relative_eq;
use ndarray::Array1;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use fastrqa::prelude::*;

fn logistic_map(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut x: f64 = rng.gen_range(0.2..0.8);
    (0..n)
        .map(|_| {
            x = 3.9 * x * (1.0 - x);
            x
        })
        .collect()
}

#[test]
fn parallel_sequential_and_baseline_agree() {
    let series = logistic_map(400, 3);
    let configure = |builder: Rqa<f64>| {
        builder
            .embedding_dimension(3)
            .time_delay(1)
            .metric(Metric::Euclidean)
            .radius(0.1)
            .theiler_corrector(1)
    };

    let baseline = configure(Rqa::new())
        .adapter(Baseline)
        .build()
        .unwrap()
        .run(&series)
        .unwrap();

    for parallel in [true, false] {
        for edge_length in [16, 37, 512] {
            let rqa = configure(Rqa::new())
                .adapter(Tiled)
                .edge_length(edge_length)
                .variants(Variant::all().to_vec())
                .parallel(parallel)
                .build()
                .unwrap();
            assert_eq!(rqa.is_parallel(), parallel);
            assert_eq!(rqa.run(&series).unwrap(), baseline);
        }
    }
}

#[test]
fn many_units_under_every_policy() {
    let series = logistic_map(260, 9);
    let units: Vec<Arc<dyn ComputeUnit<f64>>> = (0..4)
        .map(|k| {
            Arc::new(CpuUnit::with_capacity(format!("worker-{k}"), 1.0 + k as f64))
                as Arc<dyn ComputeUnit<f64>>
        })
        .collect();
    let baseline = Rqa::new()
        .radius(0.05)
        .adapter(Baseline)
        .build()
        .unwrap()
        .run(&series)
        .unwrap();

    for policy in [
        SelectionPolicy::Single,
        SelectionPolicy::Even,
        SelectionPolicy::Proportional,
    ] {
        let result = Rqa::new()
            .radius(0.05)
            .adapter(Tiled)
            .edge_length(19)
            .policy(policy)
            .variants(Variant::all().to_vec())
            .units(units.clone())
            .build()
            .unwrap()
            .run(&series)
            .unwrap();
        assert_eq!(result, baseline);
    }
}

#[test]
fn recurrence_rate_runs_in_parallel() {
    let series = logistic_map(300, 21);
    let result = Rqa::new()
        .embedding_dimension(2)
        .time_delay(1)
        .recurrence_rate(0.05)
        .adapter(Tiled)
        .edge_length(50)
        .build()
        .unwrap()
        .run(&series)
        .unwrap();
    assert!((result.recurrence_rate() - 0.05).abs() <= 0.01);
    assert!(result.measures.determinism > 0.0);
}

#[test]
fn cross_recurrence_with_ndarray_inputs() {
    let x = Array1::from(logistic_map(180, 4));
    let y = Array1::from(logistic_map(120, 5));

    let tiled = Rqa::new()
        .radius(0.08)
        .adapter(Tiled)
        .edge_length(25)
        .build()
        .unwrap()
        .run_cross(&x, &y)
        .unwrap();
    let baseline = Rqa::new()
        .radius(0.08)
        .adapter(Baseline)
        .build()
        .unwrap()
        .run_cross(&x, &y)
        .unwrap();
    assert_eq!(tiled, baseline);
    assert_eq!((tiled.rows, tiled.cols), (178, 118));
}

#[test]
fn single_precision_matches_baseline() {
    let series: Vec<f32> = logistic_map(200, 8).into_iter().map(|v| v as f32).collect();
    let tiled = Rqa::new()
        .radius(0.1_f32)
        .metric(Metric::Maximum)
        .adapter(Tiled)
        .edge_length(21)
        .build()
        .unwrap()
        .run(&series)
        .unwrap();
    let baseline = Rqa::new()
        .radius(0.1_f32)
        .metric(Metric::Maximum)
        .adapter(Baseline)
        .build()
        .unwrap()
        .run(&series)
        .unwrap();
    assert_eq!(tiled.distributions, baseline.distributions);
    assert_relative_eq!(tiled.measures.determinism, baseline.measures.determinism);
}

#[test]
fn cancellation_is_honoured() {
    let series = logistic_map(150, 2);
    let token = CancellationToken::new();
    let rqa = Rqa::new()
        .radius(0.1)
        .adapter(Tiled)
        .edge_length(10)
        .cancellation(token.clone())
        .build()
        .unwrap();

    assert!(rqa.run(&series).is_ok());
    token.cancel();
    assert_eq!(rqa.run(&series), Err(RqaError::Cancelled));
}

#[test]
fn non_contiguous_input_is_rejected() {
    let a = Array1::from(logistic_map(100, 6));
    let strided = a.slice(ndarray::s![..;3]);
    let err = Rqa::new()
        .adapter(Tiled)
        .build()
        .unwrap()
        .run(&strided)
        .unwrap_err();
    assert!(err.is_invalid_parameter());
}
