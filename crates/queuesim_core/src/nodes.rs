use bevy_ecs::prelude::Resource;

/// The fixed pool of compute nodes. Allocation is all-or-nothing and always
/// paired with exactly one release per job; `0 <= free <= total` holds at all
/// times. Breaking the pairing indicates a scheduler bug and panics.
#[derive(Debug, Resource)]
pub struct NodePool {
    total: u32,
    free: u32,
}

impl NodePool {
    pub fn new(total: u32) -> Self {
        Self { total, free: total }
    }

    pub fn total_count(&self) -> u32 {
        self.total
    }

    pub fn free_count(&self) -> u32 {
        self.free
    }

    pub fn busy_count(&self) -> u32 {
        self.total - self.free
    }

    pub fn can_fit(&self, num_nodes: u32) -> bool {
        num_nodes <= self.free
    }

    /// Reserve `num_nodes` if they are all available. A failed allocation
    /// leaves the pool untouched.
    pub fn try_allocate(&mut self, num_nodes: u32) -> bool {
        if num_nodes > self.free {
            return false;
        }
        self.free -= num_nodes;
        true
    }

    /// Return `num_nodes` to the pool.
    pub fn release(&mut self, num_nodes: u32) {
        let free = self.free.checked_add(num_nodes).filter(|f| *f <= self.total);
        match free {
            Some(free) => self.free = free,
            None => panic!(
                "node release exceeds outstanding allocations: {} + {num_nodes} > {}",
                self.free, self.total
            ),
        }
    }
}
