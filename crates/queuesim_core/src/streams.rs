//! Arrival streams: lazy producers of job requests consumed by the engine.
//!
//! A stream yields requests with non-decreasing arrival timestamps and is
//! bounded by a job count, a time limit, or both; an unbounded stream is a
//! configuration error caught at scenario build. Variants: Poisson process,
//! deterministic fixed interval, and file replay.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use bevy_ecs::prelude::Resource;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// One job the engine should materialize at `arrival_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobRequest {
    pub arrival_ms: u64,
    pub num_nodes: u32,
    /// Requested wall time, the scheduler's view of the duration.
    pub wall_time_ms: u64,
    /// True duration the job will actually occupy its nodes.
    pub execution_time_ms: u64,
}

/// Lazy, finite-or-infinite producer of job requests.
pub trait JobStream: Send + Sync {
    fn next_request(&mut self) -> Option<JobRequest>;

    fn label(&self) -> &str;

    /// True when at least one of the job-count / time-limit bounds is set.
    fn is_bounded(&self) -> bool;
}

/// Job-count and time-limit bounds shared by the generating streams.
#[derive(Debug, Clone, Copy, Default)]
struct StreamBounds {
    max_jobs: Option<u64>,
    time_limit_ms: Option<u64>,
}

impl StreamBounds {
    fn allows(&self, produced: u64, arrival_ms: u64) -> bool {
        if self.max_jobs.is_some_and(|max| produced >= max) {
            return false;
        }
        if self.time_limit_ms.is_some_and(|limit| arrival_ms >= limit) {
            return false;
        }
        true
    }

    fn is_set(&self) -> bool {
        self.max_jobs.is_some() || self.time_limit_ms.is_some()
    }
}

fn exponential_sample_ms(rng: &mut StdRng, rate_per_sec: f64) -> f64 {
    // Sample from exponential: -ln(U) / lambda, where U is uniform [0,1)
    let u: f64 = rng.gen();
    let u = u.max(1e-10); // Avoid log(0)
    -u.ln() / rate_per_sec * 1000.0
}

/// Poisson-process arrivals with exponential execution times, the classic
/// M/M/c workload.
#[derive(Debug)]
pub struct PoissonStream {
    label: String,
    arrival_rate_per_sec: f64,
    execution_rate_per_sec: f64,
    num_nodes: u32,
    /// Requested wall time as a multiple of the sampled execution time;
    /// > 1.0 models users padding their estimates.
    wall_time_factor: f64,
    bounds: StreamBounds,
    rng: StdRng,
    next_arrival_ms: f64,
    produced: u64,
}

impl PoissonStream {
    pub fn new(
        label: impl Into<String>,
        arrival_rate_per_sec: f64,
        execution_rate_per_sec: f64,
        num_nodes: u32,
        seed: u64,
    ) -> Self {
        Self {
            label: label.into(),
            arrival_rate_per_sec: arrival_rate_per_sec.max(0.0),
            execution_rate_per_sec: execution_rate_per_sec.max(0.0),
            num_nodes,
            wall_time_factor: 1.0,
            bounds: StreamBounds::default(),
            rng: StdRng::seed_from_u64(seed),
            next_arrival_ms: 0.0,
            produced: 0,
        }
    }

    pub fn with_max_jobs(mut self, max_jobs: u64) -> Self {
        self.bounds.max_jobs = Some(max_jobs);
        self
    }

    pub fn with_time_limit_ms(mut self, time_limit_ms: u64) -> Self {
        self.bounds.time_limit_ms = Some(time_limit_ms);
        self
    }

    pub fn with_wall_time_factor(mut self, factor: f64) -> Self {
        self.wall_time_factor = factor.max(1.0);
        self
    }
}

impl JobStream for PoissonStream {
    fn next_request(&mut self) -> Option<JobRequest> {
        if self.arrival_rate_per_sec <= 0.0 || self.execution_rate_per_sec <= 0.0 {
            return None;
        }
        self.next_arrival_ms += exponential_sample_ms(&mut self.rng, self.arrival_rate_per_sec);
        let arrival_ms = self.next_arrival_ms as u64;
        if !self.bounds.allows(self.produced, arrival_ms) {
            return None;
        }

        let execution_ms = exponential_sample_ms(&mut self.rng, self.execution_rate_per_sec);
        let wall_ms = execution_ms * self.wall_time_factor;
        self.produced += 1;
        Some(JobRequest {
            arrival_ms,
            num_nodes: self.num_nodes,
            wall_time_ms: (wall_ms as u64).max(1),
            execution_time_ms: (execution_ms as u64).max(1),
        })
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn is_bounded(&self) -> bool {
        self.bounds.is_set()
    }
}

/// Fixed-interval arrivals with fixed node counts and durations.
#[derive(Debug)]
pub struct DeterministicStream {
    label: String,
    interval_ms: u64,
    start_at_ms: u64,
    num_nodes: u32,
    wall_time_ms: u64,
    execution_time_ms: u64,
    bounds: StreamBounds,
    produced: u64,
}

impl DeterministicStream {
    pub fn new(
        label: impl Into<String>,
        interval_ms: u64,
        num_nodes: u32,
        execution_time_ms: u64,
    ) -> Self {
        Self {
            label: label.into(),
            interval_ms,
            start_at_ms: 0,
            num_nodes,
            wall_time_ms: execution_time_ms,
            execution_time_ms,
            bounds: StreamBounds::default(),
            produced: 0,
        }
    }

    /// First arrival timestamp; defaults to 0.
    pub fn starting_at_ms(mut self, start_at_ms: u64) -> Self {
        self.start_at_ms = start_at_ms;
        self
    }

    /// Requested wall time, when it should differ from the true duration.
    pub fn with_wall_time_ms(mut self, wall_time_ms: u64) -> Self {
        self.wall_time_ms = wall_time_ms;
        self
    }

    pub fn with_max_jobs(mut self, max_jobs: u64) -> Self {
        self.bounds.max_jobs = Some(max_jobs);
        self
    }

    pub fn with_time_limit_ms(mut self, time_limit_ms: u64) -> Self {
        self.bounds.time_limit_ms = Some(time_limit_ms);
        self
    }
}

impl JobStream for DeterministicStream {
    fn next_request(&mut self) -> Option<JobRequest> {
        let arrival_ms = self.start_at_ms + self.produced * self.interval_ms;
        if !self.bounds.allows(self.produced, arrival_ms) {
            return None;
        }
        self.produced += 1;
        Some(JobRequest {
            arrival_ms,
            num_nodes: self.num_nodes,
            wall_time_ms: self.wall_time_ms,
            execution_time_ms: self.execution_time_ms,
        })
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn is_bounded(&self) -> bool {
        self.bounds.is_set()
    }
}

/// Replays `arrival_ms,execution_ms,num_nodes[,wall_ms]` lines from a file.
/// Malformed lines are skipped; arrivals are clamped to be non-decreasing.
/// The whole file is drained upfront, so the stream is always bounded.
#[derive(Debug)]
pub struct FileReplayStream {
    label: String,
    requests: Vec<JobRequest>,
    cursor: usize,
}

impl FileReplayStream {
    pub fn from_path(path: impl AsRef<Path>, label: impl Into<String>) -> io::Result<Self> {
        let file = File::open(path)?;
        let mut requests = Vec::new();
        let mut last_arrival_ms = 0u64;
        for line in BufReader::new(file).lines() {
            let line = line?;
            let Some(request) = parse_replay_line(&line) else {
                continue;
            };
            let arrival_ms = request.arrival_ms.max(last_arrival_ms);
            last_arrival_ms = arrival_ms;
            requests.push(JobRequest {
                arrival_ms,
                ..request
            });
        }
        Ok(Self {
            label: label.into(),
            requests,
            cursor: 0,
        })
    }

    /// Drop replayed requests arriving at or after `time_limit_ms`.
    pub fn with_time_limit_ms(mut self, time_limit_ms: u64) -> Self {
        self.requests.retain(|r| r.arrival_ms < time_limit_ms);
        self
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

fn parse_replay_line(line: &str) -> Option<JobRequest> {
    let mut fields = line.split(',').map(str::trim);
    let arrival_ms = fields.next()?.parse::<f64>().ok()?;
    let execution_ms = fields.next()?.parse::<f64>().ok()?;
    let num_nodes = fields.next()?.parse::<f64>().ok()?;
    let wall_ms = match fields.next() {
        Some(field) => field.parse::<f64>().ok()?,
        None => execution_ms,
    };
    if arrival_ms < 0.0 || execution_ms < 0.0 || wall_ms < 0.0 || num_nodes < 1.0 {
        return None;
    }
    Some(JobRequest {
        arrival_ms: arrival_ms as u64,
        num_nodes: num_nodes as u32,
        wall_time_ms: (wall_ms as u64).max(1),
        execution_time_ms: (execution_ms as u64).max(1),
    })
}

impl JobStream for FileReplayStream {
    fn next_request(&mut self) -> Option<JobRequest> {
        let request = self.requests.get(self.cursor).copied()?;
        self.cursor += 1;
        Some(request)
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn is_bounded(&self) -> bool {
        true
    }
}

struct StreamSlot {
    stream: Box<dyn JobStream>,
    /// The request whose `Arrival` event is already on the clock.
    pending: Option<JobRequest>,
}

/// The engine-facing table of arrival streams. Producers never touch
/// simulation state; the engine pulls one pending request per stream and
/// schedules its arrival.
#[derive(Resource)]
pub struct StreamSet {
    slots: Vec<StreamSlot>,
}

impl StreamSet {
    pub fn new(streams: Vec<Box<dyn JobStream>>) -> Self {
        Self {
            slots: streams
                .into_iter()
                .map(|stream| StreamSlot {
                    stream,
                    pending: None,
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn label(&self, index: usize) -> &str {
        self.slots[index].stream.label()
    }

    pub fn labels(&self) -> Vec<String> {
        self.slots
            .iter()
            .map(|slot| slot.stream.label().to_string())
            .collect()
    }

    /// Take the request whose arrival event just fired.
    pub fn take_pending(&mut self, index: usize) -> Option<JobRequest> {
        self.slots.get_mut(index)?.pending.take()
    }

    /// Pull the stream's next request into the pending slot; returns its
    /// arrival timestamp so the caller can schedule the event.
    pub fn refill(&mut self, index: usize) -> Option<u64> {
        let slot = self.slots.get_mut(index)?;
        let request = slot.stream.next_request()?;
        let arrival_ms = request.arrival_ms;
        slot.pending = Some(request);
        Some(arrival_ms)
    }
}
