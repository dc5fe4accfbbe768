use std::collections::VecDeque;

use bevy_ecs::prelude::{Entity, Resource};
use serde::{Deserialize, Serialize};

/// Comparator applied by the `Priority` discipline. The tie-break is always
/// arrival order, which keeps `Priority` a stable refinement of FIFO.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriorityPolicy {
    ShortestJobFirst,
    FewestNodesFirst,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueueDiscipline {
    #[default]
    Fifo,
    Priority(PriorityPolicy),
}

/// One queued job: the entity plus the fields ordering and eligibility need,
/// so the queue never has to chase component lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueuedEntry {
    pub entity: Entity,
    pub num_nodes: u32,
    pub wall_time_ms: u64,
    /// Global arrival order; the stable tie-break for every discipline.
    pub arrival_seq: u64,
}

impl QueuedEntry {
    fn priority_key(&self, policy: PriorityPolicy) -> (u64, u64) {
        match policy {
            PriorityPolicy::ShortestJobFirst => (self.wall_time_ms, self.arrival_seq),
            PriorityPolicy::FewestNodesFirst => (u64::from(self.num_nodes), self.arrival_seq),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmitOutcome {
    Queued,
    /// Capacity rule rejected the job; only possible with a limit set and
    /// buffering disabled.
    Rejected,
}

/// Jobs awaiting execution. Priority disciplines reorder on admission, so
/// popping stays O(1) at the head.
#[derive(Debug, Resource)]
pub struct JobQueue {
    entries: Vec<QueuedEntry>,
    discipline: QueueDiscipline,
    limit: Option<usize>,
    num_rejected: u64,
}

impl JobQueue {
    pub fn new(discipline: QueueDiscipline, limit: Option<usize>) -> Self {
        Self {
            entries: Vec::new(),
            discipline,
            limit,
            num_rejected: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn at_capacity(&self) -> bool {
        self.limit.is_some_and(|limit| self.entries.len() >= limit)
    }

    /// Jobs dropped by the capacity rule since construction.
    pub fn num_rejected(&self) -> u64 {
        self.num_rejected
    }

    pub fn admit(&mut self, entry: QueuedEntry) -> AdmitOutcome {
        if self.at_capacity() {
            self.num_rejected += 1;
            return AdmitOutcome::Rejected;
        }
        let index = self.insertion_index(&entry);
        self.entries.insert(index, entry);
        AdmitOutcome::Queued
    }

    fn insertion_index(&self, entry: &QueuedEntry) -> usize {
        match self.discipline {
            QueueDiscipline::Fifo => self.entries.len(),
            QueueDiscipline::Priority(policy) => {
                let key = entry.priority_key(policy);
                self.entries
                    .iter()
                    .position(|existing| existing.priority_key(policy) > key)
                    .unwrap_or(self.entries.len())
            }
        }
    }

    /// Remove and return the head, but only if it fits in `free_nodes`.
    /// A blocked head blocks everything behind it; relaxing that is the
    /// backfill scheduler's job.
    pub fn pop_next_eligible(&mut self, free_nodes: u32) -> Option<QueuedEntry> {
        let head = self.entries.first()?;
        if head.num_nodes > free_nodes {
            return None;
        }
        Some(self.entries.remove(0))
    }

    /// Full ordering, head first, for schedulers that scan past the head.
    pub fn peek_ordered(&self) -> &[QueuedEntry] {
        &self.entries
    }

    /// Extract a specific job, preserving the order of the rest.
    pub fn remove(&mut self, entity: Entity) -> Option<QueuedEntry> {
        let index = self.entries.iter().position(|e| e.entity == entity)?;
        Some(self.entries.remove(index))
    }

    /// Re-insert a job at the head. Only used by the defensive path when an
    /// allocation the scheduler believed feasible fails.
    pub fn push_front(&mut self, entry: QueuedEntry) {
        self.entries.insert(0, entry);
    }
}

/// Unbounded FIFO staging area for jobs that arrived while the queue was at
/// capacity. Present only when `use_queue_buffer` is configured.
#[derive(Debug, Default, Resource)]
pub struct HoldingBuffer {
    jobs: VecDeque<Entity>,
}

impl HoldingBuffer {
    pub fn push(&mut self, entity: Entity) {
        self.jobs.push_back(entity);
    }

    pub fn peek_oldest(&self) -> Option<Entity> {
        self.jobs.front().copied()
    }

    pub fn pop_oldest(&mut self) -> Option<Entity> {
        self.jobs.pop_front()
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.jobs.contains(&entity)
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

    fn entry(seq: u64, num_nodes: u32, wall_time_ms: u64) -> QueuedEntry {
        QueuedEntry {
            entity: Entity::from_raw(seq as u32),
            num_nodes,
            wall_time_ms,
            arrival_seq: seq,
        }
    }

    #[test]
    fn fifo_keeps_arrival_order() {
        let mut queue = JobQueue::new(QueueDiscipline::Fifo, None);
        queue.admit(entry(0, 8, 100));
        queue.admit(entry(1, 2, 10));
        queue.admit(entry(2, 4, 50));

        let order: Vec<u64> = queue.peek_ordered().iter().map(|e| e.arrival_seq).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn shortest_job_first_reorders_on_admission() {
        let mut queue = JobQueue::new(
            QueueDiscipline::Priority(PriorityPolicy::ShortestJobFirst),
            None,
        );
        queue.admit(entry(0, 1, 100));
        queue.admit(entry(1, 1, 10));
        queue.admit(entry(2, 1, 10));
        queue.admit(entry(3, 1, 50));

        let order: Vec<u64> = queue.peek_ordered().iter().map(|e| e.arrival_seq).collect();
        // Equal wall times keep arrival order.
        assert_eq!(order, vec![1, 2, 3, 0]);
    }

    #[test]
    fn fewest_nodes_first_reorders_on_admission() {
        let mut queue = JobQueue::new(
            QueueDiscipline::Priority(PriorityPolicy::FewestNodesFirst),
            None,
        );
        queue.admit(entry(0, 8, 10));
        queue.admit(entry(1, 2, 100));

        let order: Vec<u64> = queue.peek_ordered().iter().map(|e| e.arrival_seq).collect();
        assert_eq!(order, vec![1, 0]);
    }

    #[test]
    fn capacity_limit_rejects_and_counts() {
        let mut queue = JobQueue::new(QueueDiscipline::Fifo, Some(1));
        assert_eq!(queue.admit(entry(0, 1, 10)), AdmitOutcome::Queued);
        assert_eq!(queue.admit(entry(1, 1, 10)), AdmitOutcome::Rejected);
        assert_eq!(queue.admit(entry(2, 1, 10)), AdmitOutcome::Rejected);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.num_rejected(), 2);
    }

    #[test]
    fn pop_next_eligible_respects_head_of_line() {
        let mut queue = JobQueue::new(QueueDiscipline::Fifo, None);
        queue.admit(entry(0, 8, 10));
        queue.admit(entry(1, 1, 10));

        // Head needs 8 nodes; a fitting job behind it must not pop.
        assert!(queue.pop_next_eligible(4).is_none());
        assert_eq!(queue.len(), 2);

        let head = queue.pop_next_eligible(8).expect("head fits");
        assert_eq!(head.arrival_seq, 0);
    }

    #[test]
    fn remove_extracts_without_disturbing_order() {
        let mut queue = JobQueue::new(QueueDiscipline::Fifo, None);
        queue.admit(entry(0, 8, 10));
        queue.admit(entry(1, 1, 10));
        queue.admit(entry(2, 2, 10));

        let taken = queue.remove(Entity::from_raw(1)).expect("present");
        assert_eq!(taken.arrival_seq, 1);
        let order: Vec<u64> = queue.peek_ordered().iter().map(|e| e.arrival_seq).collect();
        assert_eq!(order, vec![0, 2]);
    }

    #[test]
    fn holding_buffer_is_fifo() {
        let mut buffer = HoldingBuffer::default();
        buffer.push(Entity::from_raw(1));
        buffer.push(Entity::from_raw(2));
        assert_eq!(buffer.pop_oldest(), Some(Entity::from_raw(1)));
        assert_eq!(buffer.pop_oldest(), Some(Entity::from_raw(2)));
        assert!(buffer.is_empty());
    }
}
