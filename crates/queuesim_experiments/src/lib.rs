//! Experiment harness for the cluster queue simulator.
//!
//! This crate runs batches of simulations with varying parameters, extracts
//! summary statistics, and exports per-job records, trace logs and sweep
//! results to CSV/JSON/Parquet.
//!
//! # Quick Start
//!
//! ```no_run
//! use queuesim_experiments::{run_parallel_experiments, ParameterSpace};
//!
//! // Define parameter space (grid search)
//! let space = ParameterSpace::grid()
//!     .arrival_rates(vec![5.0, 10.0, 20.0])
//!     .schedulers(vec![false, true]);
//!
//! // Generate parameter sets and run them in parallel
//! let parameter_sets = space.generate();
//! let results = run_parallel_experiments(parameter_sets, None);
//! ```
//!
//! # Architecture
//!
//! - [`parameters`]: parameter variation framework (grid search, sampling)
//! - [`runner`]: parallel simulation execution using rayon
//! - [`metrics`]: summary statistics extraction from finished runs
//! - [`export`]: job/trace/result export to CSV, JSON and Parquet

pub mod export;
pub mod metrics;
pub mod parameters;
pub mod runner;

pub use export::{
    export_jobs_to_csv, export_results_to_csv, export_results_to_json, export_results_to_parquet,
    export_trace_to_csv,
};
pub use metrics::{extract_metrics, SimulationResult, SourceSummary};
pub use parameters::{ParameterSet, ParameterSpace};
pub use runner::{run_parallel_experiments, run_single_simulation, run_simulation_world};
