//! Performance benchmarks for queuesim_core using Criterion.rs.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use queuesim_core::runner::{initialize_simulation, run_until_empty, simulation_schedule};
use queuesim_core::scenario::{build_scenario, EngineParams};
use queuesim_core::streams::{JobStream, PoissonStream};

fn bench_simulation_run(c: &mut Criterion) {
    let scenarios = vec![("small", 500), ("medium", 5_000), ("large", 20_000)];

    let mut group = c.benchmark_group("simulation_run");
    for (name, num_jobs) in scenarios {
        group.bench_with_input(
            BenchmarkId::from_parameter(name),
            &num_jobs,
            |b, &num_jobs| {
                b.iter(|| {
                    let params = EngineParams::default()
                        .with_total_nodes(128)
                        .with_scheduler(true);
                    let streams: Vec<Box<dyn JobStream>> = vec![Box::new(
                        PoissonStream::new("bench", 20.0, 0.5, 16, 42).with_max_jobs(num_jobs),
                    )];
                    let mut world = build_scenario(&params, streams).expect("valid scenario");
                    initialize_simulation(&mut world);
                    let mut schedule = simulation_schedule();
                    black_box(run_until_empty(&mut world, &mut schedule, 10_000_000));
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_simulation_run);
criterion_main!(benches);
