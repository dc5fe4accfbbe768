use bevy_ecs::prelude::{Commands, Res, ResMut};
use log::debug;

use crate::clock::{CurrentEvent, EventKind, EventSubject, SimulationClock};
use crate::ecs::{ExecutingSet, Job, JobState};
use crate::nodes::NodePool;
use crate::queue::{HoldingBuffer, JobQueue};
use crate::scenario::JobIdCounter;
use crate::streams::StreamSet;
use crate::telemetry::{RejectedJobRecord, RejectionKind, SimTelemetry, TraceAction, TraceRecord};

/// Materializes the pending request of the arriving stream, primes the
/// stream's next arrival, and routes the new job: immediate rejection when it
/// can never fit, the holding buffer when one is configured and the queue
/// cannot take it, queue admission otherwise.
pub fn arrival_system(
    mut commands: Commands,
    mut clock: ResMut<SimulationClock>,
    event: Res<CurrentEvent>,
    mut streams: ResMut<StreamSet>,
    mut ids: ResMut<JobIdCounter>,
    pool: Res<NodePool>,
    queue: Res<JobQueue>,
    executing: Res<ExecutingSet>,
    mut buffer: Option<ResMut<HoldingBuffer>>,
    mut telemetry: ResMut<SimTelemetry>,
) {
    if event.0.kind != EventKind::Arrival {
        return;
    }
    let Some(EventSubject::Stream(stream_index)) = event.0.subject else {
        return;
    };
    let Some(request) = streams.take_pending(stream_index) else {
        return;
    };
    let now = clock.now();

    // Keep the lazy producer primed: its next request gets its own event.
    if let Some(next_arrival) = streams.refill(stream_index) {
        clock.schedule_at(
            next_arrival.max(now),
            EventKind::Arrival,
            Some(EventSubject::Stream(stream_index)),
        );
    }

    let id = ids.next_id();
    let mut job = Job::new(id, stream_index, &request, now);

    if job.num_nodes > pool.total_count() {
        // The pool can never satisfy this job; keeping it queued would block
        // the head forever.
        job.state = JobState::Rejected;
        commands.spawn(job);
        telemetry.num_infeasible += 1;
        telemetry.rejections.push(RejectedJobRecord {
            job_id: id,
            source: streams.label(stream_index).to_string(),
            at: now,
            kind: RejectionKind::Infeasible,
        });
        telemetry.record_trace(TraceRecord {
            at: now,
            action: TraceAction::Rejected,
            num_jobs_in_buffer: buffer.as_deref().map_or(0, HoldingBuffer::len),
            num_jobs_in_queue: queue.len(),
            num_jobs_executing: executing.len(),
            busy_nodes: pool.busy_count(),
        });
        debug!(
            "job {id} rejected as infeasible: wants {} of {} nodes",
            request.num_nodes,
            pool.total_count()
        );
        return;
    }

    let hold = buffer.is_some()
        && match queue.limit() {
            Some(limit) => queue.len() >= limit,
            // No explicit limit: stage the job whenever the system cannot
            // take it right now.
            None => !queue.is_empty() || !pool.can_fit(job.num_nodes),
        };

    if hold {
        job.state = JobState::Holding;
        let entity = commands.spawn(job).id();
        if let Some(buffer) = buffer.as_mut() {
            buffer.push(entity);
        }
        telemetry.record_trace(TraceRecord {
            at: now,
            action: TraceAction::Held,
            num_jobs_in_buffer: buffer.as_deref().map_or(0, HoldingBuffer::len),
            num_jobs_in_queue: queue.len(),
            num_jobs_executing: executing.len(),
            busy_nodes: pool.busy_count(),
        });
        debug!("job {id} held ({} buffered)", buffer.as_deref().map_or(0, HoldingBuffer::len));
    } else {
        let entity = commands.spawn(job).id();
        clock.schedule_at(now, EventKind::QueueAdmit, Some(EventSubject::Job(entity)));
    }
}
