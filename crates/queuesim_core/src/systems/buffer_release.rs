use bevy_ecs::prelude::{Query, Res, ResMut};
use log::debug;

use crate::clock::{CurrentEvent, EventKind, SimulationClock};
use crate::ecs::{ExecutingSet, Job, JobState};
use crate::nodes::NodePool;
use crate::queue::{AdmitOutcome, HoldingBuffer, JobQueue, QueuedEntry};
use crate::telemetry::{SimTelemetry, TraceAction, TraceRecord};

/// Moves buffered jobs into the queue, oldest first, while capacity allows.
/// Fired whenever queue or pool capacity was freed.
pub fn buffer_release_system(
    mut clock: ResMut<SimulationClock>,
    event: Res<CurrentEvent>,
    mut queue: ResMut<JobQueue>,
    mut buffer: Option<ResMut<HoldingBuffer>>,
    mut jobs: Query<&mut Job>,
    pool: Res<NodePool>,
    executing: Res<ExecutingSet>,
    mut telemetry: ResMut<SimTelemetry>,
) {
    if event.0.kind != EventKind::BufferRelease {
        return;
    }
    let Some(buffer) = buffer.as_mut() else {
        return;
    };
    let now = clock.now();
    let mut admitted = false;

    loop {
        let Some(entity) = buffer.peek_oldest() else {
            break;
        };
        let Ok(held) = jobs.get(entity) else {
            // The entity is gone; drop the stale reference.
            buffer.pop_oldest();
            continue;
        };
        let entry = QueuedEntry {
            entity,
            num_nodes: held.num_nodes,
            wall_time_ms: held.wall_time_ms,
            arrival_seq: held.id,
        };
        let has_room = match queue.limit() {
            Some(limit) => queue.len() < limit,
            None => queue.is_empty() && pool.can_fit(held.num_nodes),
        };
        if !has_room {
            break;
        }

        buffer.pop_oldest();
        if queue.admit(entry) != AdmitOutcome::Queued {
            break;
        }
        if let Ok(mut job) = jobs.get_mut(entity) {
            job.state = JobState::Pending;
            job.buffer_exited_at = Some(now);
            job.queued_at = Some(now);
            debug!("job {} released from buffer", job.id);
        }
        admitted = true;
        telemetry.record_trace(TraceRecord {
            at: now,
            action: TraceAction::Queued,
            num_jobs_in_buffer: buffer.len(),
            num_jobs_in_queue: queue.len(),
            num_jobs_executing: executing.len(),
            busy_nodes: pool.busy_count(),
        });
    }

    if admitted {
        clock.schedule_at(now, EventKind::SchedulingTick, None);
    }
}
