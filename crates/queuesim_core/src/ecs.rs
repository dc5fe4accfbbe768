use bevy_ecs::prelude::{Component, Entity, Resource};

use crate::streams::JobRequest;

/// Lifecycle states. The path is linear with one fork: `Holding` is entered
/// only when a holding buffer is configured and the queue cannot take the
/// job; `Rejected` is terminal for jobs that never reach the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Generated,
    Holding,
    Pending,
    Starting,
    Executing,
    Finished,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Component)]
pub struct Job {
    pub id: u64,
    /// Index into the stream table; resolves to the source label.
    pub stream: usize,
    pub num_nodes: u32,
    /// Requested wall time, used for every scheduling decision.
    pub wall_time_ms: u64,
    /// True execution time, used to schedule completion. May differ from
    /// `wall_time_ms` to model inaccurate user estimates.
    pub execution_time_ms: u64,
    pub state: JobState,
    pub arrived_at: u64,
    /// Simulation time the job left the holding buffer, when it was held.
    pub buffer_exited_at: Option<u64>,
    pub queued_at: Option<u64>,
    pub started_at: Option<u64>,
    pub finished_at: Option<u64>,
}

impl Job {
    pub fn new(id: u64, stream: usize, request: &JobRequest, arrived_at: u64) -> Self {
        Self {
            id,
            stream,
            num_nodes: request.num_nodes,
            wall_time_ms: request.wall_time_ms,
            execution_time_ms: request.execution_time_ms,
            state: JobState::Generated,
            arrived_at,
            buffer_exited_at: None,
            queued_at: None,
            started_at: None,
            finished_at: None,
        }
    }

    /// Time spent between arrival and execution start.
    pub fn wait_time_ms(&self) -> Option<u64> {
        self.started_at.map(|s| s.saturating_sub(self.arrived_at))
    }

    /// Time spent between arrival and completion.
    pub fn turnaround_ms(&self) -> Option<u64> {
        self.finished_at.map(|f| f.saturating_sub(self.arrived_at))
    }
}

/// Jobs currently holding a node allocation. Together with the queue and the
/// holding buffer this makes every active job referenced by exactly one
/// container.
#[derive(Debug, Default, Resource)]
pub struct ExecutingSet {
    jobs: Vec<Entity>,
}

impl ExecutingSet {
    pub fn insert(&mut self, entity: Entity) {
        self.jobs.push(entity);
    }

    pub fn remove(&mut self, entity: Entity) {
        self.jobs.retain(|e| *e != entity);
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.jobs.contains(&entity)
    }

    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.jobs.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> JobRequest {
        JobRequest {
            arrival_ms: 100,
            num_nodes: 4,
            wall_time_ms: 2000,
            execution_time_ms: 1500,
        }
    }

    #[test]
    fn new_job_starts_generated_with_arrival_stamp() {
        let job = Job::new(7, 0, &request(), 100);
        assert_eq!(job.state, JobState::Generated);
        assert_eq!(job.arrived_at, 100);
        assert_eq!(job.queued_at, None);
        assert_eq!(job.wait_time_ms(), None);
    }

    #[test]
    fn wait_and_turnaround_derive_from_stamps() {
        let mut job = Job::new(7, 0, &request(), 100);
        job.started_at = Some(400);
        job.finished_at = Some(1900);
        assert_eq!(job.wait_time_ms(), Some(300));
        assert_eq!(job.turnaround_ms(), Some(1800));
    }
}
