use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;

use crate::metrics::SimulationResult;

pub(crate) fn export_results_impl(
    results: &[SimulationResult],
    file: std::fs::File,
) -> Result<(), Box<dyn std::error::Error>> {
    let batch = build_record_batch(results)?;
    let props = WriterProperties::builder().build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(&batch)?;
    writer.close()?;

    Ok(())
}

fn build_record_batch(
    results: &[SimulationResult],
) -> Result<RecordBatch, arrow::error::ArrowError> {
    let schema = Arc::new(parquet_schema());
    let arrays = build_arrays(results);

    RecordBatch::try_new(schema, arrays)
}

fn parquet_schema() -> Schema {
    Schema::new(vec![
        Field::new("total_jobs", DataType::UInt64, false),
        Field::new("completed_jobs", DataType::UInt64, false),
        Field::new("rejected_infeasible", DataType::UInt64, false),
        Field::new("rejected_overflow", DataType::UInt64, false),
        Field::new("avg_wait_ms", DataType::Float64, false),
        Field::new("median_wait_ms", DataType::Float64, false),
        Field::new("p90_wait_ms", DataType::Float64, false),
        Field::new("avg_turnaround_ms", DataType::Float64, false),
        Field::new("median_turnaround_ms", DataType::Float64, false),
        Field::new("p90_turnaround_ms", DataType::Float64, false),
        Field::new("utilization", DataType::Float64, false),
        Field::new("makespan_ms", DataType::UInt64, false),
    ])
}

fn build_arrays(results: &[SimulationResult]) -> Vec<ArrayRef> {
    vec![
        Arc::new(UInt64Array::from(
            results
                .iter()
                .map(|r| r.total_jobs as u64)
                .collect::<Vec<_>>(),
        )),
        Arc::new(UInt64Array::from(
            results
                .iter()
                .map(|r| r.completed_jobs as u64)
                .collect::<Vec<_>>(),
        )),
        Arc::new(UInt64Array::from(
            results
                .iter()
                .map(|r| r.rejected_infeasible)
                .collect::<Vec<_>>(),
        )),
        Arc::new(UInt64Array::from(
            results
                .iter()
                .map(|r| r.rejected_overflow)
                .collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(
            results.iter().map(|r| r.avg_wait_ms).collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(
            results.iter().map(|r| r.median_wait_ms).collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(
            results.iter().map(|r| r.p90_wait_ms).collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(
            results
                .iter()
                .map(|r| r.avg_turnaround_ms)
                .collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(
            results
                .iter()
                .map(|r| r.median_turnaround_ms)
                .collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(
            results
                .iter()
                .map(|r| r.p90_turnaround_ms)
                .collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(
            results.iter().map(|r| r.utilization).collect::<Vec<_>>(),
        )),
        Arc::new(UInt64Array::from(
            results.iter().map(|r| r.makespan_ms).collect::<Vec<_>>(),
        )),
    ]
}
