//! EASY-style backfill bookkeeping.
//!
//! When the head of the queue cannot start, it holds an implicit reservation:
//! the earliest instant enough nodes are projected to be free for it. Later
//! jobs may start ahead of it only when that reservation provably cannot
//! slip. Projections use requested wall times, not true execution times,
//! matching how production schedulers see the world.

use crate::queue::QueuedEntry;

/// Projected release of one allocated job: its requested wall time counted
/// from its start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectedRelease {
    pub at_ms: u64,
    pub num_nodes: u32,
}

/// The head-of-queue reservation: the shadow time at which the head fits,
/// and the node surplus left over at that instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    pub shadow_time_ms: u64,
    pub extra_nodes: u32,
}

/// Compute the head job's reservation from the projected releases of all
/// currently allocated jobs. `releases` is sorted in place by release time.
pub fn compute_reservation(
    head_nodes: u32,
    now_ms: u64,
    free_nodes: u32,
    releases: &mut [ProjectedRelease],
) -> Reservation {
    if free_nodes >= head_nodes {
        return Reservation {
            shadow_time_ms: now_ms,
            extra_nodes: free_nodes - head_nodes,
        };
    }

    releases.sort_by_key(|release| release.at_ms);

    let mut available = free_nodes;
    for release in releases.iter() {
        available += release.num_nodes;
        if available >= head_nodes {
            return Reservation {
                shadow_time_ms: release.at_ms.max(now_ms),
                extra_nodes: available - head_nodes,
            };
        }
    }

    // Unreachable for feasible heads: infeasible jobs are rejected at
    // arrival, so draining every allocation always covers the head.
    Reservation {
        shadow_time_ms: u64::MAX,
        extra_nodes: 0,
    }
}

/// Whether `candidate` may start right now without delaying the head's
/// reservation: it must fit in the free nodes, and either complete (by its
/// requested wall time) before the shadow time or stay within the node
/// surplus the reservation leaves untouched.
pub fn may_backfill(
    candidate: &QueuedEntry,
    now_ms: u64,
    free_nodes: u32,
    reservation: Reservation,
) -> bool {
    if candidate.num_nodes > free_nodes {
        return false;
    }
    now_ms.saturating_add(candidate.wall_time_ms) <= reservation.shadow_time_ms
        || candidate.num_nodes <= reservation.extra_nodes
}
