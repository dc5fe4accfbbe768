use bevy_ecs::prelude::{Query, Res, ResMut};
use log::warn;

use crate::backfill::{compute_reservation, may_backfill, ProjectedRelease};
use crate::clock::{CurrentEvent, EventKind, EventSubject, SimulationClock};
use crate::ecs::{Job, JobState};
use crate::nodes::NodePool;
use crate::queue::{HoldingBuffer, JobQueue, QueuedEntry};
use crate::scenario::SchedulerConfig;

/// The scheduling decision point, fired on every capacity change.
///
/// First the queue head starts, repeatedly, while it fits in the free nodes.
/// When the head blocks and the backfill scheduler is enabled, later jobs are
/// scanned once in queue order and started if the head's reservation provably
/// cannot slip. Without the scheduler the blocked head blocks everything.
pub fn scheduling_tick_system(
    mut clock: ResMut<SimulationClock>,
    event: Res<CurrentEvent>,
    config: Res<SchedulerConfig>,
    mut pool: ResMut<NodePool>,
    mut queue: ResMut<JobQueue>,
    buffer: Option<Res<HoldingBuffer>>,
    mut jobs: Query<&mut Job>,
) {
    if event.0.kind != EventKind::SchedulingTick {
        return;
    }
    let now = clock.now();
    let mut started_any = false;

    while let Some(entry) = queue.pop_next_eligible(pool.free_count()) {
        if !start_job(&mut clock, &mut pool, &mut queue, &mut jobs, entry, now) {
            break;
        }
        started_any = true;
    }

    if config.use_scheduler {
        if let Some(head) = queue.peek_ordered().first().copied() {
            let mut releases = projected_releases(&jobs, now);
            let candidates: Vec<QueuedEntry> =
                queue.peek_ordered().iter().skip(1).copied().collect();
            for candidate in candidates {
                let free = pool.free_count();
                let reservation = compute_reservation(head.num_nodes, now, free, &mut releases);
                if !may_backfill(&candidate, now, free, reservation) {
                    continue;
                }
                if queue.remove(candidate.entity).is_none() {
                    continue;
                }
                if start_job(&mut clock, &mut pool, &mut queue, &mut jobs, candidate, now) {
                    started_any = true;
                    releases.push(ProjectedRelease {
                        at_ms: now.saturating_add(candidate.wall_time_ms),
                        num_nodes: candidate.num_nodes,
                    });
                }
            }
        }
    }

    if started_any && buffer.is_some() {
        // Queue slots were freed; buffered jobs may move up.
        clock.schedule_at(now, EventKind::BufferRelease, None);
    }
}

/// Requested-wall-time projections for every job holding an allocation.
fn projected_releases(jobs: &Query<&mut Job>, now: u64) -> Vec<ProjectedRelease> {
    jobs.iter()
        .filter(|job| matches!(job.state, JobState::Starting | JobState::Executing))
        .map(|job| ProjectedRelease {
            at_ms: job.started_at.unwrap_or(now).saturating_add(job.wall_time_ms),
            num_nodes: job.num_nodes,
        })
        .collect()
}

fn start_job(
    clock: &mut SimulationClock,
    pool: &mut NodePool,
    queue: &mut JobQueue,
    jobs: &mut Query<&mut Job>,
    entry: QueuedEntry,
    now: u64,
) -> bool {
    // Defensive: the scheduler only selects jobs that fit, so this allocation
    // must succeed; on failure the job goes back to the head untouched.
    if !pool.try_allocate(entry.num_nodes) {
        warn!(
            "allocation of {} nodes failed with {} free; job re-queued at head",
            entry.num_nodes,
            pool.free_count()
        );
        queue.push_front(entry);
        return false;
    }
    let Ok(mut job) = jobs.get_mut(entry.entity) else {
        pool.release(entry.num_nodes);
        return false;
    };
    job.state = JobState::Starting;
    clock.schedule_at(
        now,
        EventKind::StartExecution,
        Some(EventSubject::Job(entry.entity)),
    );
    true
}
