use queuesim_core::telemetry::{SimTelemetry, TraceAction};

use crate::metrics::SimulationResult;
use crate::parameters::ParameterSet;

pub(crate) fn export_jobs_impl(
    telemetry: &SimTelemetry,
    file: std::fs::File,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut wtr = csv::Writer::from_writer(file);

    wtr.write_record([
        "job_id",
        "source",
        "arrived_at",
        "started_at",
        "finished_at",
        "num_nodes",
        "wall_time_ms",
        "execution_time_ms",
        "wait_time_ms",
        "turnaround_ms",
    ])?;

    for record in &telemetry.completed {
        wtr.write_record([
            &record.job_id.to_string(),
            &record.source,
            &record.arrived_at.to_string(),
            &record.started_at.to_string(),
            &record.finished_at.to_string(),
            &record.num_nodes.to_string(),
            &record.wall_time_ms.to_string(),
            &record.execution_time_ms.to_string(),
            &record.wait_time_ms().to_string(),
            &record.turnaround_ms().to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

fn trace_action_str(action: TraceAction) -> &'static str {
    match action {
        TraceAction::Held => "held",
        TraceAction::Queued => "queued",
        TraceAction::Started => "started",
        TraceAction::Finished => "finished",
        TraceAction::Rejected => "rejected",
    }
}

pub(crate) fn export_trace_impl(
    telemetry: &SimTelemetry,
    file: std::fs::File,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut wtr = csv::Writer::from_writer(file);

    wtr.write_record([
        "at",
        "action",
        "num_jobs_in_buffer",
        "num_jobs_in_queue",
        "num_jobs_executing",
        "busy_nodes",
    ])?;

    for record in &telemetry.trace {
        wtr.write_record([
            &record.at.to_string(),
            trace_action_str(record.action),
            &record.num_jobs_in_buffer.to_string(),
            &record.num_jobs_in_queue.to_string(),
            &record.num_jobs_executing.to_string(),
            &record.busy_nodes.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

pub(crate) fn export_results_impl(
    results: &[SimulationResult],
    parameter_sets: &[ParameterSet],
    file: std::fs::File,
) -> Result<(), Box<dyn std::error::Error>> {
    if results.len() != parameter_sets.len() {
        return Err(format!(
            "Results length ({}) doesn't match parameter_sets length ({})",
            results.len(),
            parameter_sets.len()
        )
        .into());
    }

    let mut wtr = csv::Writer::from_writer(file);

    wtr.write_record([
        "experiment_id",
        "run_id",
        "seed",
        "total_nodes",
        "use_scheduler",
        "use_queue_buffer",
        "queue_limit",
        "arrival_rate_per_sec",
        "execution_rate_per_sec",
        "nodes_per_job",
        "num_jobs",
        "total_jobs",
        "completed_jobs",
        "rejected_infeasible",
        "rejected_overflow",
        "avg_wait_ms",
        "median_wait_ms",
        "p90_wait_ms",
        "avg_turnaround_ms",
        "median_turnaround_ms",
        "p90_turnaround_ms",
        "utilization",
        "makespan_ms",
    ])?;

    for (result, param_set) in results.iter().zip(parameter_sets.iter()) {
        wtr.write_record([
            &param_set.experiment_id,
            &param_set.run_id.to_string(),
            &param_set.seed.to_string(),
            &param_set.total_nodes.to_string(),
            &param_set.use_scheduler.to_string(),
            &param_set.use_queue_buffer.to_string(),
            &param_set
                .queue_limit
                .map(|limit| limit.to_string())
                .unwrap_or_default(),
            &param_set.arrival_rate_per_sec.to_string(),
            &param_set.execution_rate_per_sec.to_string(),
            &param_set.nodes_per_job.to_string(),
            &param_set.num_jobs.to_string(),
            &result.total_jobs.to_string(),
            &result.completed_jobs.to_string(),
            &result.rejected_infeasible.to_string(),
            &result.rejected_overflow.to_string(),
            &result.avg_wait_ms.to_string(),
            &result.median_wait_ms.to_string(),
            &result.p90_wait_ms.to_string(),
            &result.avg_turnaround_ms.to_string(),
            &result.median_turnaround_ms.to_string(),
            &result.p90_turnaround_ms.to_string(),
            &result.utilization.to_string(),
            &result.makespan_ms.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
