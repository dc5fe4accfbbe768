mod support;

use queuesim_core::scenario::EngineParams;
use queuesim_core::streams::{JobStream, PoissonStream};
use queuesim_core::telemetry::SimTelemetry;

use support::world::{run_to_completion, run_with_invariant_checks};

fn mixed_workload(seed: u64) -> Vec<Box<dyn JobStream>> {
    vec![
        Box::new(PoissonStream::new("narrow", 5.0, 0.5, 1, seed).with_max_jobs(150)),
        Box::new(PoissonStream::new("medium", 2.0, 0.25, 8, seed ^ 0xABCD).with_max_jobs(80)),
        Box::new(PoissonStream::new("wide", 0.5, 0.2, 24, seed ^ 0x1234).with_max_jobs(30)),
    ]
}

/// A contended mixed workload with backfill: the pool accounting and the
/// one-container-per-job rule must hold after every single event.
#[test]
fn contended_backfill_run_upholds_invariants() {
    let params = EngineParams::default()
        .with_total_nodes(32)
        .with_scheduler(true);
    let world = run_with_invariant_checks(&params, mixed_workload(42));

    let telemetry = world.resource::<SimTelemetry>();
    assert_eq!(telemetry.completed.len(), 150 + 80 + 30);
    assert_eq!(telemetry.num_rejected(), 0);
}

/// Same property with the buffer and a tight queue in the mix.
#[test]
fn buffered_run_upholds_invariants() {
    let params = EngineParams::default()
        .with_total_nodes(32)
        .with_queue_limit(4)
        .with_queue_buffer(true)
        .with_scheduler(true);
    let world = run_with_invariant_checks(&params, mixed_workload(7));

    let telemetry = world.resource::<SimTelemetry>();
    // Buffering absorbs every over-limit arrival; nothing is dropped.
    assert_eq!(telemetry.completed.len(), 150 + 80 + 30);
    assert_eq!(telemetry.num_overflow, 0);
}

/// Identical streams and parameters replay the exact same run.
#[test]
fn identical_runs_are_deterministic() {
    let params = EngineParams::default()
        .with_total_nodes(32)
        .with_scheduler(true);

    let first = run_to_completion(&params, mixed_workload(42));
    let second = run_to_completion(&params, mixed_workload(42));

    let first_telemetry = first.resource::<SimTelemetry>();
    let second_telemetry = second.resource::<SimTelemetry>();

    let first_runs: Vec<(u64, u64, u64)> = first_telemetry
        .completed
        .iter()
        .map(|r| (r.job_id, r.started_at, r.finished_at))
        .collect();
    let second_runs: Vec<(u64, u64, u64)> = second_telemetry
        .completed
        .iter()
        .map(|r| (r.job_id, r.started_at, r.finished_at))
        .collect();
    assert_eq!(first_runs, second_runs);
    assert_eq!(first_telemetry.trace.len(), second_telemetry.trace.len());
}

/// Trace timestamps never go backwards: events are processed in
/// non-decreasing time order.
#[test]
fn trace_timestamps_are_non_decreasing() {
    let params = EngineParams::default().with_total_nodes(16);
    let world = run_to_completion(
        &params,
        vec![Box::new(
            PoissonStream::new("main", 4.0, 0.5, 4, 99).with_max_jobs(200),
        )],
    );

    let telemetry = world.resource::<SimTelemetry>();
    let mut last = 0;
    for record in &telemetry.trace {
        assert!(record.at >= last);
        last = record.at;
    }
}
