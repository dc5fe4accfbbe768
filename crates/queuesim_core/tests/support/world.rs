#![allow(dead_code)]

use bevy_ecs::prelude::World;
use queuesim_core::ecs::{ExecutingSet, Job, JobState};
use queuesim_core::nodes::NodePool;
use queuesim_core::queue::{HoldingBuffer, JobQueue};
use queuesim_core::runner::{
    initialize_simulation, run_until_empty, run_until_empty_with_hook, simulation_schedule,
};
use queuesim_core::scenario::{build_scenario, EngineParams};
use queuesim_core::streams::JobStream;

pub const MAX_STEPS: usize = 100_000;

/// Build, seed and run a scenario to completion.
pub fn run_to_completion(params: &EngineParams, streams: Vec<Box<dyn JobStream>>) -> World {
    let mut world = build_scenario(params, streams).expect("valid scenario");
    initialize_simulation(&mut world);
    let mut schedule = simulation_schedule();
    let steps = run_until_empty(&mut world, &mut schedule, MAX_STEPS);
    assert!(steps < MAX_STEPS, "runner did not converge");
    world
}

/// Same, but asserts the resource-accounting and container-occupancy
/// invariants after every processed event.
pub fn run_with_invariant_checks(
    params: &EngineParams,
    streams: Vec<Box<dyn JobStream>>,
) -> World {
    let mut world = build_scenario(params, streams).expect("valid scenario");
    initialize_simulation(&mut world);
    let mut schedule = simulation_schedule();
    let steps = run_until_empty_with_hook(&mut world, &mut schedule, MAX_STEPS, |world, _event| {
        assert_invariants(world);
    });
    assert!(steps < MAX_STEPS, "runner did not converge");
    world
}

/// `0 <= free <= total`, allocation bookkeeping matches the jobs holding
/// nodes, the queue never exceeds its limit, and every job sits in exactly
/// the container its state claims.
pub fn assert_invariants(world: &World) {
    let pool = world.resource::<NodePool>();
    let queue = world.resource::<JobQueue>();
    let executing = world.resource::<ExecutingSet>();
    let buffer = world.get_resource::<HoldingBuffer>();

    assert!(pool.free_count() <= pool.total_count());
    if let Some(limit) = queue.limit() {
        assert!(queue.len() <= limit, "queue exceeded its limit");
    }

    let mut allocated = 0u32;
    for entity_ref in world.iter_entities() {
        let Some(job) = entity_ref.get::<Job>() else {
            continue;
        };
        let entity = entity_ref.id();
        let in_queue = queue.peek_ordered().iter().any(|e| e.entity == entity);
        let in_buffer = buffer.map_or(false, |b| b.contains(entity));
        let in_executing = executing.contains(entity);

        match job.state {
            JobState::Generated => {
                assert!(!in_queue && !in_buffer && !in_executing);
            }
            JobState::Holding => {
                assert!(in_buffer && !in_queue && !in_executing);
            }
            JobState::Pending => {
                assert!(in_queue && !in_buffer && !in_executing);
            }
            JobState::Starting => {
                assert!(!in_queue && !in_buffer);
                allocated += job.num_nodes;
            }
            JobState::Executing => {
                assert!(in_executing && !in_queue && !in_buffer);
                allocated += job.num_nodes;
            }
            JobState::Finished | JobState::Rejected => {
                assert!(!in_queue && !in_buffer && !in_executing);
            }
        }
    }
    assert_eq!(
        pool.busy_count(),
        allocated,
        "busy nodes must equal the sum requested by jobs holding allocations"
    );
}

/// All jobs in the finished world, sorted by id.
pub fn jobs_sorted_by_id(world: &mut World) -> Vec<Job> {
    let mut jobs: Vec<Job> = world.query::<&Job>().iter(world).copied().collect();
    jobs.sort_by_key(|job| job.id);
    jobs
}
