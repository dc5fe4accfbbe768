use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::queue::QueueDiscipline;

/// Simulation end time in milliseconds. When set, the runner stops once the
/// next event would be at or past this timestamp, so events beyond the limit
/// are never processed.
#[derive(Debug, Clone, Copy, Resource)]
pub struct SimulationEndTimeMs(pub u64);

/// Whether the backfill scheduler looks past a blocked queue head.
/// Off means strict head-of-line blocking.
#[derive(Debug, Clone, Copy, Default, Resource)]
pub struct SchedulerConfig {
    pub use_scheduler: bool,
}

/// Monotonic job id allocator; ids double as the global arrival order.
#[derive(Debug, Default, Resource)]
pub struct JobIdCounter {
    next: u64,
}

impl JobIdCounter {
    pub fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// Parameters for building a simulation scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineParams {
    /// Size of the node pool; must be positive.
    pub total_nodes: u32,
    /// Maximum queue length. `None` means unlimited.
    pub queue_limit: Option<usize>,
    /// Stage arrivals in an unbounded holding buffer instead of rejecting
    /// them when the queue cannot take them.
    pub use_queue_buffer: bool,
    /// Enable the EASY backfill scheduler.
    pub use_scheduler: bool,
    /// Optional run cutoff in simulation ms.
    pub time_limit_ms: Option<u64>,
    pub discipline: QueueDiscipline,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            total_nodes: 64,
            queue_limit: None,
            use_queue_buffer: false,
            use_scheduler: false,
            time_limit_ms: None,
            discipline: QueueDiscipline::Fifo,
        }
    }
}

impl EngineParams {
    pub fn with_total_nodes(mut self, total_nodes: u32) -> Self {
        self.total_nodes = total_nodes;
        self
    }

    pub fn with_queue_limit(mut self, queue_limit: usize) -> Self {
        self.queue_limit = Some(queue_limit);
        self
    }

    pub fn with_queue_buffer(mut self, use_queue_buffer: bool) -> Self {
        self.use_queue_buffer = use_queue_buffer;
        self
    }

    pub fn with_scheduler(mut self, use_scheduler: bool) -> Self {
        self.use_scheduler = use_scheduler;
        self
    }

    pub fn with_time_limit_ms(mut self, time_limit_ms: u64) -> Self {
        self.time_limit_ms = Some(time_limit_ms);
        self
    }

    pub fn with_discipline(mut self, discipline: QueueDiscipline) -> Self {
        self.discipline = discipline;
        self
    }
}
