use bevy_ecs::prelude::{Query, Res, ResMut};
use log::debug;

use crate::clock::{CurrentEvent, EventKind, EventSubject, SimulationClock};
use crate::ecs::{ExecutingSet, Job, JobState};
use crate::nodes::NodePool;
use crate::queue::{HoldingBuffer, JobQueue};
use crate::streams::StreamSet;
use crate::telemetry::{CompletedJobRecord, SimTelemetry, TraceAction, TraceRecord};

/// Completes a job: returns its nodes, writes the output record, and wakes
/// the buffer and the scheduler because capacity just changed.
pub fn finish_execution_system(
    mut clock: ResMut<SimulationClock>,
    event: Res<CurrentEvent>,
    mut jobs: Query<&mut Job>,
    mut pool: ResMut<NodePool>,
    mut executing: ResMut<ExecutingSet>,
    streams: Res<StreamSet>,
    queue: Res<JobQueue>,
    buffer: Option<Res<HoldingBuffer>>,
    mut telemetry: ResMut<SimTelemetry>,
) {
    if event.0.kind != EventKind::FinishExecution {
        return;
    }
    let Some(EventSubject::Job(entity)) = event.0.subject else {
        return;
    };
    let Ok(mut job) = jobs.get_mut(entity) else {
        return;
    };
    if job.state != JobState::Executing {
        return;
    }
    let now = clock.now();

    pool.release(job.num_nodes);
    job.state = JobState::Finished;
    job.finished_at = Some(now);
    executing.remove(entity);

    telemetry.completed.push(CompletedJobRecord {
        job_id: job.id,
        source: streams.label(job.stream).to_string(),
        arrived_at: job.arrived_at,
        started_at: job.started_at.unwrap_or(job.arrived_at),
        finished_at: now,
        num_nodes: job.num_nodes,
        wall_time_ms: job.wall_time_ms,
        execution_time_ms: job.execution_time_ms,
    });
    telemetry.record_trace(TraceRecord {
        at: now,
        action: TraceAction::Finished,
        num_jobs_in_buffer: buffer.as_deref().map_or(0, HoldingBuffer::len),
        num_jobs_in_queue: queue.len(),
        num_jobs_executing: executing.len(),
        busy_nodes: pool.busy_count(),
    });
    debug!("job {} finished ({} nodes free)", job.id, pool.free_count());

    if buffer.is_some() {
        clock.schedule_at(now, EventKind::BufferRelease, None);
    }
    clock.schedule_at(now, EventKind::SchedulingTick, None);
}
