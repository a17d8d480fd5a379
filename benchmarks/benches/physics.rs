//! Contact solver benchmarks (criterion - wall-clock time).
//!
//! Run all:    cargo bench --manifest-path benchmarks/Cargo.toml --bench physics
//! Filter:     cargo bench --manifest-path benchmarks/Cargo.toml --bench physics -- stack

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rein::{SolverConfig, solve_contacts};
use rein_bench::*;

// ---------------------------------------------------------------------------
// Solver
// ---------------------------------------------------------------------------

fn bench_solver(c: &mut Criterion) {
    let config = SolverConfig::default();

    {
        let mut group = c.benchmark_group("solver/sliding_boxes");
        for &n in &[10, 50, 100, 500] {
            group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
                b.iter_batched(
                    || setup_sliding_boxes(n).expect("scene setup"),
                    |(world, mut contacts)| solve_contacts(&mut contacts, &world, DT, &config),
                    criterion::BatchSize::SmallInput,
                );
            });
        }
        group.finish();
    }

    {
        let mut group = c.benchmark_group("solver/stack");
        for &n in &[2, 8, 32] {
            group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
                b.iter_batched(
                    || setup_stack(n).expect("scene setup"),
                    |(world, mut contacts)| solve_contacts(&mut contacts, &world, DT, &config),
                    criterion::BatchSize::SmallInput,
                );
            });
        }
        group.finish();
    }

    {
        let mut group = c.benchmark_group("solver/iterations");
        for &niterations in &[1, 5, 10, 20] {
            let config = SolverConfig {
                niterations,
                ..SolverConfig::default()
            };
            group.bench_with_input(
                BenchmarkId::from_parameter(niterations),
                &niterations,
                |b, _| {
                    b.iter_batched(
                        || setup_sliding_boxes(100).expect("scene setup"),
                        |(world, mut contacts)| solve_contacts(&mut contacts, &world, DT, &config),
                        criterion::BatchSize::SmallInput,
                    );
                },
            );
        }
        group.finish();
    }
}

// ---------------------------------------------------------------------------
// Vehicles
// ---------------------------------------------------------------------------

fn bench_vehicles(c: &mut Criterion) {
    let config = SolverConfig::default();
    let mut group = c.benchmark_group("vehicle/tires");
    for &n in &[1, 10, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter_batched(
                || setup_vehicles(n).expect("scene setup"),
                |(world, mut contacts)| solve_contacts(&mut contacts, &world, DT, &config),
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

criterion_group!(benches, bench_solver, bench_vehicles);
criterion_main!(benches);
