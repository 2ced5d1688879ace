//! Every variant, edge length, distance source and unit layout must reproduce
//! the full-matrix baseline exactly.

use std::sync::Arc;

use approx::assert_relative_eq;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rqa::prelude::*;

fn noisy_sine(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n)
        .map(|i| (i as f64 * 0.3).sin() + rng.gen_range(-0.2..0.2))
        .collect()
}

fn assert_same(actual: &RqaResult<f64>, expected: &RqaResult<f64>) {
    assert_eq!(actual.distributions, expected.distributions);
    assert_eq!(actual.effective_radius, expected.effective_radius);
    assert_eq!((actual.rows, actual.cols), (expected.rows, expected.cols));

    let (a, e) = (&actual.measures, &expected.measures);
    assert_eq!(a.recurrence_points, e.recurrence_points);
    assert_eq!(a.total_cells, e.total_cells);
    assert_eq!(a.longest_diagonal_line, e.longest_diagonal_line);
    assert_eq!(a.longest_vertical_line, e.longest_vertical_line);
    assert_eq!(a.longest_white_vertical_line, e.longest_white_vertical_line);
    assert_eq!(a.number_of_diagonal_lines, e.number_of_diagonal_lines);
    assert_eq!(a.number_of_vertical_lines, e.number_of_vertical_lines);

    let pairs = [
        (a.recurrence_rate, e.recurrence_rate),
        (a.determinism, e.determinism),
        (a.average_diagonal_line_length, e.average_diagonal_line_length),
        (a.divergence, e.divergence),
        (a.entropy_diagonal_lines, e.entropy_diagonal_lines),
        (a.laminarity, e.laminarity),
        (a.trapping_time, e.trapping_time),
        (a.entropy_vertical_lines, e.entropy_vertical_lines),
        (a.average_white_vertical_line_length, e.average_white_vertical_line_length),
        (a.entropy_white_vertical_lines, e.entropy_white_vertical_lines),
        (a.ratio_determinism_recurrence_rate, e.ratio_determinism_recurrence_rate),
        (a.ratio_laminarity_determinism, e.ratio_laminarity_determinism),
    ];
    for (x, y) in pairs {
        assert_relative_eq!(x, y, max_relative = 1e-9);
    }
}

fn baseline(series: &[f64], metric: Metric, radius: f64, theiler: usize) -> RqaResult<f64> {
    Rqa::new()
        .embedding_dimension(3)
        .time_delay(2)
        .metric(metric)
        .radius(radius)
        .theiler_corrector(theiler)
        .adapter(Baseline)
        .build()
        .unwrap()
        .run(series)
        .unwrap()
}

#[test]
fn all_variants_match_baseline() {
    let series = noisy_sine(90, 1);
    for metric in Metric::ALL {
        for theiler in [0, 1, 4] {
            let expected = baseline(&series, metric, 0.45, theiler);
            assert!(expected.measures.recurrence_points > 0);
            for variant in Variant::all() {
                for edge_length in [1, 7, 16, 200] {
                    for source in [DistanceSource::Series, DistanceSource::Vectors] {
                        let actual = Rqa::new()
                            .embedding_dimension(3)
                            .time_delay(2)
                            .metric(metric)
                            .radius(0.45)
                            .theiler_corrector(theiler)
                            .adapter(Tiled)
                            .variant(variant)
                            .edge_length(edge_length)
                            .distance_source(source)
                            .build()
                            .unwrap()
                            .run(&series)
                            .unwrap();
                        assert_same(&actual, &expected);
                    }
                }
            }
        }
    }
}

#[test]
fn mixed_units_and_variants_match_baseline() {
    let series = noisy_sine(120, 2);
    let expected = baseline(&series, Metric::Euclidean, 0.4, 2);

    let units: Vec<Arc<dyn ComputeUnit<f64>>> = vec![
        Arc::new(CpuUnit::with_capacity("a", 1.0)),
        Arc::new(CpuUnit::with_capacity("b", 2.5)),
        Arc::new(CpuUnit::with_capacity("c", 0.5)),
    ];
    for policy in [
        SelectionPolicy::Single,
        SelectionPolicy::Even,
        SelectionPolicy::Proportional,
        SelectionPolicy::Explicit(vec![40, 0, 9]),
    ] {
        let actual = Rqa::new()
            .embedding_dimension(3)
            .time_delay(2)
            .radius(0.4)
            .theiler_corrector(2)
            .adapter(Tiled)
            .edge_length(17)
            .policy(policy)
            .variants(Variant::all().to_vec())
            .units(units.clone())
            .build()
            .unwrap()
            .run(&series)
            .unwrap();
        assert_same(&actual, &expected);
    }
}

#[test]
fn cross_recurrence_matches_baseline() {
    let x = noisy_sine(70, 3);
    let y: Vec<f64> = noisy_sine(45, 4).iter().map(|v| v * 0.9).collect();

    let expected = Rqa::new()
        .radius(0.5)
        .adapter(Baseline)
        .build()
        .unwrap()
        .run_cross(&x, &y)
        .unwrap();
    assert_eq!((expected.rows, expected.cols), (68, 43));

    for variant in Variant::all() {
        for edge_length in [5, 13, 64] {
            let actual = Rqa::new()
                .radius(0.5)
                .adapter(Tiled)
                .variant(variant)
                .edge_length(edge_length)
                .build()
                .unwrap()
                .run_cross(&x, &y)
                .unwrap();
            assert_same(&actual, &expected);
        }
    }

    // Swapping the series transposes the matrix: same points, different columns.
    let swapped = Rqa::new()
        .radius(0.5)
        .adapter(Baseline)
        .build()
        .unwrap()
        .run_cross(&y, &x)
        .unwrap();
    assert_eq!(swapped.measures.recurrence_points, expected.measures.recurrence_points);
    assert_eq!(swapped.distributions.diagonal, expected.distributions.diagonal);
}

#[test]
fn single_precision_variants_agree() {
    let series: Vec<f32> = noisy_sine(64, 5).iter().map(|&v| v as f32).collect();
    let expected = Rqa::new()
        .radius(0.35_f32)
        .metric(Metric::Taxicab)
        .adapter(Baseline)
        .build()
        .unwrap()
        .run(&series)
        .unwrap();
    for variant in Variant::all() {
        let actual = Rqa::new()
            .radius(0.35_f32)
            .metric(Metric::Taxicab)
            .adapter(Tiled)
            .variant(variant)
            .edge_length(9)
            .distance_source(DistanceSource::Series)
            .build()
            .unwrap()
            .run(&series)
            .unwrap();
        assert_eq!(actual, expected);
    }
}
