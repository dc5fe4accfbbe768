//! Result export utilities.
//!
//! Per-job output records and trace logs go to CSV; sweep results go to CSV,
//! JSON or Parquet.

use std::path::Path;

use queuesim_core::telemetry::SimTelemetry;

use crate::metrics::SimulationResult;
use crate::parameters::ParameterSet;

#[path = "export/csv.rs"]
mod csv;
#[path = "export/json.rs"]
mod json;
#[path = "export/parquet.rs"]
mod parquet;
#[path = "export/writer_utils.rs"]
mod writer_utils;

/// Write one row per completed job from a finished run.
pub fn export_jobs_to_csv(
    telemetry: &SimTelemetry,
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = writer_utils::create_output_file(path)?;
    csv::export_jobs_impl(telemetry, file)
}

/// Write one row per traced action from a finished run.
pub fn export_trace_to_csv(
    telemetry: &SimTelemetry,
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = writer_utils::create_output_file(path)?;
    csv::export_trace_impl(telemetry, file)
}

/// Export sweep results with their parameters to CSV. Results and parameter
/// sets are paired by index.
pub fn export_results_to_csv(
    results: &[SimulationResult],
    parameter_sets: &[ParameterSet],
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    writer_utils::ensure_not_empty(results)?;
    let file = writer_utils::create_output_file(path)?;
    csv::export_results_impl(results, parameter_sets, file)
}

/// Export sweep results to JSON.
pub fn export_results_to_json(
    results: &[SimulationResult],
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = writer_utils::create_output_file(path)?;
    json::export_results_impl(results, file)
}

/// Export sweep results to Parquet.
pub fn export_results_to_parquet(
    results: &[SimulationResult],
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    writer_utils::ensure_not_empty(results)?;
    let file = writer_utils::create_output_file(path)?;
    parquet::export_results_impl(results, file)
}

#[cfg(test)]
mod tests {
    use queuesim_core::telemetry::CompletedJobRecord;
    use tempfile::NamedTempFile;

    use super::*;
    use crate::metrics::SourceSummary;

    fn sample_result() -> SimulationResult {
        SimulationResult {
            total_jobs: 100,
            completed_jobs: 95,
            rejected_infeasible: 2,
            rejected_overflow: 3,
            avg_wait_ms: 1000.0,
            median_wait_ms: 800.0,
            p90_wait_ms: 2500.0,
            avg_turnaround_ms: 4000.0,
            median_turnaround_ms: 3500.0,
            p90_turnaround_ms: 9000.0,
            utilization: 0.71,
            makespan_ms: 120_000,
            per_source: vec![SourceSummary {
                source: "main".to_string(),
                completed_jobs: 95,
                rejected_jobs: 5,
                avg_wait_ms: 1000.0,
                median_wait_ms: 800.0,
                p90_wait_ms: 2500.0,
                avg_turnaround_ms: 4000.0,
            }],
        }
    }

    #[test]
    fn test_export_results_to_json() {
        let results = vec![sample_result()];
        let file = NamedTempFile::new().unwrap();
        export_results_to_json(&results, file.path()).unwrap();

        let contents = std::fs::read_to_string(file.path()).unwrap();
        assert!(contents.contains("utilization"));
        assert!(contents.contains("per_source"));
    }

    #[test]
    fn test_export_jobs_to_csv() {
        let mut telemetry = SimTelemetry::default();
        telemetry.completed.push(CompletedJobRecord {
            job_id: 0,
            source: "main".to_string(),
            arrived_at: 0,
            started_at: 100,
            finished_at: 1100,
            num_nodes: 4,
            wall_time_ms: 1000,
            execution_time_ms: 1000,
        });

        let file = NamedTempFile::new().unwrap();
        export_jobs_to_csv(&telemetry, file.path()).unwrap();

        let contents = std::fs::read_to_string(file.path()).unwrap();
        assert!(contents.starts_with("job_id,source"));
        assert!(contents.contains("main"));
    }

    #[test]
    fn test_export_results_to_parquet() {
        let results = vec![sample_result()];
        let file = NamedTempFile::new().unwrap();
        export_results_to_parquet(&results, file.path()).unwrap();

        let bytes = std::fs::read(file.path()).unwrap();
        assert!(!bytes.is_empty());
    }

    #[test]
    fn empty_results_refuse_to_export() {
        let file = NamedTempFile::new().unwrap();
        assert!(export_results_to_parquet(&[], file.path()).is_err());
    }
}
