//! Telemetry: per-job output records, rejection records and the run trace.

use bevy_ecs::prelude::Resource;
use serde::Serialize;

/// One finished job, recorded when its nodes are released.
/// Timestamps are simulation ms; use the helper methods for derived KPIs.
#[derive(Debug, Clone, Serialize)]
pub struct CompletedJobRecord {
    pub job_id: u64,
    pub source: String,
    pub arrived_at: u64,
    pub started_at: u64,
    pub finished_at: u64,
    pub num_nodes: u32,
    pub wall_time_ms: u64,
    pub execution_time_ms: u64,
}

impl CompletedJobRecord {
    /// Time from arrival to execution start.
    pub fn wait_time_ms(&self) -> u64 {
        self.started_at.saturating_sub(self.arrived_at)
    }

    /// Time from arrival to completion.
    pub fn turnaround_ms(&self) -> u64 {
        self.finished_at.saturating_sub(self.arrived_at)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RejectionKind {
    /// The job requested more nodes than the pool holds.
    Infeasible,
    /// The queue was at its limit with buffering disabled.
    QueueOverflow,
}

#[derive(Debug, Clone, Serialize)]
pub struct RejectedJobRecord {
    pub job_id: u64,
    pub source: String,
    pub at: u64,
    pub kind: RejectionKind,
}

/// What just happened, for the periodic trace log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TraceAction {
    Held,
    Queued,
    Started,
    Finished,
    Rejected,
}

/// Snapshot of the system taken after each state-changing event.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TraceRecord {
    pub at: u64,
    pub action: TraceAction,
    pub num_jobs_in_buffer: usize,
    pub num_jobs_in_queue: usize,
    pub num_jobs_executing: usize,
    pub busy_nodes: u32,
}

/// Collects simulation telemetry. Insert as a resource before running.
#[derive(Debug, Default, Resource)]
pub struct SimTelemetry {
    pub completed: Vec<CompletedJobRecord>,
    pub rejections: Vec<RejectedJobRecord>,
    pub trace: Vec<TraceRecord>,
    pub num_infeasible: u64,
    pub num_overflow: u64,
}

impl SimTelemetry {
    pub fn record_trace(&mut self, record: TraceRecord) {
        self.trace.push(record);
    }

    pub fn num_rejected(&self) -> u64 {
        self.num_infeasible + self.num_overflow
    }
}
