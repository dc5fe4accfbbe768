use bevy_ecs::prelude::{Query, Res, ResMut};
use log::debug;

use crate::clock::{CurrentEvent, EventKind, EventSubject, SimulationClock};
use crate::ecs::{ExecutingSet, Job, JobState};
use crate::nodes::NodePool;
use crate::queue::{HoldingBuffer, JobQueue};
use crate::telemetry::{SimTelemetry, TraceAction, TraceRecord};

/// Confirms commencement of a job whose nodes were reserved this instant:
/// stamps the start time and schedules completion after the true execution
/// time.
pub fn start_execution_system(
    mut clock: ResMut<SimulationClock>,
    event: Res<CurrentEvent>,
    mut jobs: Query<&mut Job>,
    mut executing: ResMut<ExecutingSet>,
    pool: Res<NodePool>,
    queue: Res<JobQueue>,
    buffer: Option<Res<HoldingBuffer>>,
    mut telemetry: ResMut<SimTelemetry>,
) {
    if event.0.kind != EventKind::StartExecution {
        return;
    }
    let Some(EventSubject::Job(entity)) = event.0.subject else {
        return;
    };
    let Ok(mut job) = jobs.get_mut(entity) else {
        return;
    };
    if job.state != JobState::Starting {
        return;
    }
    let now = clock.now();

    job.state = JobState::Executing;
    job.started_at = Some(now);
    executing.insert(entity);
    clock.schedule_at(
        now.saturating_add(job.execution_time_ms),
        EventKind::FinishExecution,
        Some(EventSubject::Job(entity)),
    );
    telemetry.record_trace(TraceRecord {
        at: now,
        action: TraceAction::Started,
        num_jobs_in_buffer: buffer.as_deref().map_or(0, HoldingBuffer::len),
        num_jobs_in_queue: queue.len(),
        num_jobs_executing: executing.len(),
        busy_nodes: pool.busy_count(),
    });
    debug!(
        "job {} started on {} nodes ({} free)",
        job.id,
        job.num_nodes,
        pool.free_count()
    );
}
