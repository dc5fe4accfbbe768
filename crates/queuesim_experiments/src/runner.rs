//! Parallel simulation execution using rayon.
//!
//! Each run builds its own fresh world, so simulations share no state and
//! parameter sweeps parallelize trivially.

use bevy_ecs::prelude::World;
use indicatif::{ProgressBar, ProgressStyle};
use queuesim_core::runner::{initialize_simulation, run_until_empty, simulation_schedule};
use queuesim_core::scenario::{build_scenario, ConfigurationError};
use rayon::prelude::*;

use crate::metrics::{extract_metrics, SimulationResult};
use crate::parameters::ParameterSet;

/// Generous ceiling on events per run; a run hitting it indicates a bug.
const MAX_STEPS: usize = 2_000_000;

/// Run one parameter set to completion and return the finished world, for
/// callers that want raw telemetry rather than summary metrics.
pub fn run_simulation_world(param_set: &ParameterSet) -> Result<World, ConfigurationError> {
    let mut world = build_scenario(&param_set.engine_params(), param_set.streams())?;
    initialize_simulation(&mut world);

    let mut schedule = simulation_schedule();
    let _steps = run_until_empty(&mut world, &mut schedule, MAX_STEPS);
    Ok(world)
}

/// Run a single simulation with the given parameter set and extract metrics.
pub fn run_single_simulation(param_set: &ParameterSet) -> SimulationResult {
    let world = run_simulation_world(param_set)
        .expect("parameter sets always describe a valid scenario");
    extract_metrics(&world)
}

/// Run multiple simulations in parallel.
///
/// Uses rayon to execute simulations concurrently across available CPU
/// cores. Results come back in the same order as the input parameter sets.
pub fn run_parallel_experiments(
    parameter_sets: Vec<ParameterSet>,
    num_threads: Option<usize>,
) -> Vec<SimulationResult> {
    run_parallel_experiments_with_progress(parameter_sets, num_threads, true)
}

/// Run multiple simulations in parallel with optional progress bar.
pub fn run_parallel_experiments_with_progress(
    parameter_sets: Vec<ParameterSet>,
    num_threads: Option<usize>,
    show_progress: bool,
) -> Vec<SimulationResult> {
    let total = parameter_sets.len();
    let pb = if show_progress && total > 0 {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
                )
                .unwrap()
                .progress_chars("#>-"),
        );
        Some(bar)
    } else {
        None
    };

    let pool = if let Some(threads) = num_threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .expect("Failed to create thread pool")
    } else {
        rayon::ThreadPoolBuilder::new()
            .build()
            .expect("Failed to create thread pool")
    };

    let pb_clone = pb.clone();
    let results = pool.install(|| {
        parameter_sets
            .par_iter()
            .map(|param_set| {
                let result = run_single_simulation(param_set);
                if let Some(ref progress_bar) = pb_clone {
                    progress_bar.inc(1);
                }
                result
            })
            .collect()
    });

    if let Some(ref progress_bar) = pb {
        progress_bar.finish_with_message("Completed");
    }

    results
}
