use bevy_ecs::prelude::{Query, Res, ResMut};
use log::debug;

use crate::clock::{CurrentEvent, EventKind, EventSubject, SimulationClock};
use crate::ecs::{ExecutingSet, Job, JobState};
use crate::nodes::NodePool;
use crate::queue::{AdmitOutcome, HoldingBuffer, JobQueue, QueuedEntry};
use crate::streams::StreamSet;
use crate::telemetry::{RejectedJobRecord, RejectionKind, SimTelemetry, TraceAction, TraceRecord};

/// Applies the queue's capacity rule and discipline to a generated job.
/// With buffering enabled an over-limit job falls back to the holding
/// buffer; with buffering disabled it is dropped for good.
pub fn queue_admit_system(
    mut clock: ResMut<SimulationClock>,
    event: Res<CurrentEvent>,
    mut queue: ResMut<JobQueue>,
    mut jobs: Query<&mut Job>,
    streams: Res<StreamSet>,
    pool: Res<NodePool>,
    executing: Res<ExecutingSet>,
    mut buffer: Option<ResMut<HoldingBuffer>>,
    mut telemetry: ResMut<SimTelemetry>,
) {
    if event.0.kind != EventKind::QueueAdmit {
        return;
    }
    let Some(EventSubject::Job(entity)) = event.0.subject else {
        return;
    };
    let Ok(mut job) = jobs.get_mut(entity) else {
        return;
    };
    if job.state != JobState::Generated {
        return;
    }
    let now = clock.now();

    // The queue may have filled since the arrival routed this job here;
    // with a buffer configured that is a staging case, not a drop.
    if queue.at_capacity() {
        if let Some(buffer) = buffer.as_mut() {
            job.state = JobState::Holding;
            buffer.push(entity);
            telemetry.record_trace(TraceRecord {
                at: now,
                action: TraceAction::Held,
                num_jobs_in_buffer: buffer.len(),
                num_jobs_in_queue: queue.len(),
                num_jobs_executing: executing.len(),
                busy_nodes: pool.busy_count(),
            });
            debug!("job {} held ({} buffered)", job.id, buffer.len());
            return;
        }
    }

    let entry = QueuedEntry {
        entity,
        num_nodes: job.num_nodes,
        wall_time_ms: job.wall_time_ms,
        arrival_seq: job.id,
    };
    match queue.admit(entry) {
        AdmitOutcome::Queued => {
            job.state = JobState::Pending;
            job.queued_at = Some(now);
            telemetry.record_trace(TraceRecord {
                at: now,
                action: TraceAction::Queued,
                num_jobs_in_buffer: buffer.as_deref().map_or(0, HoldingBuffer::len),
                num_jobs_in_queue: queue.len(),
                num_jobs_executing: executing.len(),
                busy_nodes: pool.busy_count(),
            });
            clock.schedule_at(now, EventKind::SchedulingTick, None);
            debug!("job {} queued ({} waiting)", job.id, queue.len());
        }
        AdmitOutcome::Rejected => {
            job.state = JobState::Rejected;
            telemetry.num_overflow += 1;
            telemetry.rejections.push(RejectedJobRecord {
                job_id: job.id,
                source: streams.label(job.stream).to_string(),
                at: now,
                kind: RejectionKind::QueueOverflow,
            });
            telemetry.record_trace(TraceRecord {
                at: now,
                action: TraceAction::Rejected,
                num_jobs_in_buffer: buffer.as_deref().map_or(0, HoldingBuffer::len),
                num_jobs_in_queue: queue.len(),
                num_jobs_executing: executing.len(),
                busy_nodes: pool.busy_count(),
            });
            debug!("job {} dropped: queue at limit {:?}", job.id, queue.limit());
        }
    }
}
