//! Metrics extraction from simulation results.
//!
//! Aggregates the engine's telemetry into per-run summary statistics:
//! per-source job counts, wait/turnaround timing percentiles, rejection
//! counts, and time-weighted node utilization derived from the trace.

use std::collections::BTreeMap;

use bevy_ecs::prelude::World;
use queuesim_core::nodes::NodePool;
use queuesim_core::telemetry::{SimTelemetry, TraceRecord};

/// Per-source aggregate over one run.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SourceSummary {
    pub source: String,
    pub completed_jobs: usize,
    pub rejected_jobs: usize,
    pub avg_wait_ms: f64,
    pub median_wait_ms: f64,
    pub p90_wait_ms: f64,
    pub avg_turnaround_ms: f64,
}

/// Aggregated metrics from a single simulation run.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SimulationResult {
    /// Every job the streams produced: completed plus rejected.
    pub total_jobs: usize,
    pub completed_jobs: usize,
    pub rejected_infeasible: u64,
    pub rejected_overflow: u64,
    pub avg_wait_ms: f64,
    pub median_wait_ms: f64,
    pub p90_wait_ms: f64,
    pub avg_turnaround_ms: f64,
    pub median_turnaround_ms: f64,
    pub p90_turnaround_ms: f64,
    /// Time-weighted busy fraction of the node pool over the traced run.
    pub utilization: f64,
    /// Timestamp of the last traced action.
    pub makespan_ms: u64,
    pub per_source: Vec<SourceSummary>,
}

impl SimulationResult {
    /// Calculate (average, median, p90) from a vector of values.
    fn calculate_stats(values: &[u64]) -> (f64, f64, f64) {
        if values.is_empty() {
            return (0.0, 0.0, 0.0);
        }

        let mut sorted = values.to_vec();
        sorted.sort();

        let avg = sorted.iter().sum::<u64>() as f64 / sorted.len() as f64;
        let median = if sorted.len() % 2 == 0 {
            (sorted[sorted.len() / 2 - 1] + sorted[sorted.len() / 2]) as f64 / 2.0
        } else {
            sorted[sorted.len() / 2] as f64
        };
        let p90_idx = ((sorted.len() - 1) as f64 * 0.9) as usize;
        let p90 = sorted[p90_idx.min(sorted.len() - 1)] as f64;

        (avg, median, p90)
    }
}

fn utilization_from_trace(trace: &[TraceRecord], total_nodes: u32) -> (f64, u64) {
    let Some(last) = trace.last() else {
        return (0.0, 0);
    };
    let makespan_ms = last.at;
    if makespan_ms == 0 || total_nodes == 0 {
        return (0.0, makespan_ms);
    }

    // Busy-node milliseconds: each record's busy count holds until the next.
    let mut busy_node_ms: u128 = 0;
    for pair in trace.windows(2) {
        busy_node_ms += u128::from(pair[0].busy_nodes) * u128::from(pair[1].at - pair[0].at);
    }
    let capacity = u128::from(total_nodes) * u128::from(makespan_ms);
    (busy_node_ms as f64 / capacity as f64, makespan_ms)
}

/// Extract summary statistics from a completed simulation world.
pub fn extract_metrics(world: &World) -> SimulationResult {
    let total_nodes = world.resource::<NodePool>().total_count();
    let telemetry = world.resource::<SimTelemetry>();

    let waits: Vec<u64> = telemetry
        .completed
        .iter()
        .map(|record| record.wait_time_ms())
        .collect();
    let turnarounds: Vec<u64> = telemetry
        .completed
        .iter()
        .map(|record| record.turnaround_ms())
        .collect();

    let (avg_wait_ms, median_wait_ms, p90_wait_ms) = SimulationResult::calculate_stats(&waits);
    let (avg_turnaround_ms, median_turnaround_ms, p90_turnaround_ms) =
        SimulationResult::calculate_stats(&turnarounds);
    let (utilization, makespan_ms) = utilization_from_trace(&telemetry.trace, total_nodes);

    let mut completed_by_source: BTreeMap<&str, Vec<u64>> = BTreeMap::new();
    let mut turnaround_by_source: BTreeMap<&str, Vec<u64>> = BTreeMap::new();
    for record in &telemetry.completed {
        completed_by_source
            .entry(record.source.as_str())
            .or_default()
            .push(record.wait_time_ms());
        turnaround_by_source
            .entry(record.source.as_str())
            .or_default()
            .push(record.turnaround_ms());
    }
    let mut rejected_by_source: BTreeMap<&str, usize> = BTreeMap::new();
    for rejection in &telemetry.rejections {
        *rejected_by_source
            .entry(rejection.source.as_str())
            .or_default() += 1;
    }

    let mut sources: Vec<&str> = completed_by_source
        .keys()
        .chain(rejected_by_source.keys())
        .copied()
        .collect();
    sources.sort_unstable();
    sources.dedup();

    let per_source = sources
        .into_iter()
        .map(|source| {
            let waits = completed_by_source.get(source).cloned().unwrap_or_default();
            let turnarounds = turnaround_by_source
                .get(source)
                .cloned()
                .unwrap_or_default();
            let (avg_wait_ms, median_wait_ms, p90_wait_ms) =
                SimulationResult::calculate_stats(&waits);
            let (avg_turnaround_ms, _, _) = SimulationResult::calculate_stats(&turnarounds);
            SourceSummary {
                source: source.to_string(),
                completed_jobs: waits.len(),
                rejected_jobs: rejected_by_source.get(source).copied().unwrap_or(0),
                avg_wait_ms,
                median_wait_ms,
                p90_wait_ms,
                avg_turnaround_ms,
            }
        })
        .collect();

    SimulationResult {
        total_jobs: telemetry.completed.len() + telemetry.rejections.len(),
        completed_jobs: telemetry.completed.len(),
        rejected_infeasible: telemetry.num_infeasible,
        rejected_overflow: telemetry.num_overflow,
        avg_wait_ms,
        median_wait_ms,
        p90_wait_ms,
        avg_turnaround_ms,
        median_turnaround_ms,
        p90_turnaround_ms,
        utilization,
        makespan_ms,
        per_source,
    }
}
