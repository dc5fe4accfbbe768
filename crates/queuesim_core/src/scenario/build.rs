use std::fmt;

use bevy_ecs::prelude::World;

use crate::clock::SimulationClock;
use crate::ecs::ExecutingSet;
use crate::nodes::NodePool;
use crate::queue::{HoldingBuffer, JobQueue};
use crate::scenario::params::{EngineParams, JobIdCounter, SchedulerConfig, SimulationEndTimeMs};
use crate::streams::{JobStream, StreamSet};
use crate::telemetry::SimTelemetry;

/// Fatal configuration problems, caught before any event is processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// `total_nodes` must be positive.
    EmptyNodePool,
    /// A run needs at least one arrival stream.
    NoStreams,
    /// Every stream must carry a job-count or time-limit bound.
    UnboundedStream(String),
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationError::EmptyNodePool => {
                write!(f, "total_nodes must be positive")
            }
            ConfigurationError::NoStreams => {
                write!(f, "at least one arrival stream is required")
            }
            ConfigurationError::UnboundedStream(label) => {
                write!(
                    f,
                    "stream '{label}' has neither a job count nor a time limit"
                )
            }
        }
    }
}

impl std::error::Error for ConfigurationError {}

/// Build a fresh world holding every engine resource. One world per run;
/// nothing leaks between runs.
pub fn build_scenario(
    params: &EngineParams,
    streams: Vec<Box<dyn JobStream>>,
) -> Result<World, ConfigurationError> {
    if params.total_nodes == 0 {
        return Err(ConfigurationError::EmptyNodePool);
    }
    if streams.is_empty() {
        return Err(ConfigurationError::NoStreams);
    }
    if let Some(unbounded) = streams.iter().find(|s| !s.is_bounded()) {
        return Err(ConfigurationError::UnboundedStream(
            unbounded.label().to_string(),
        ));
    }

    let mut world = World::new();
    world.insert_resource(SimulationClock::default());
    world.insert_resource(NodePool::new(params.total_nodes));
    world.insert_resource(JobQueue::new(params.discipline, params.queue_limit));
    world.insert_resource(ExecutingSet::default());
    world.insert_resource(StreamSet::new(streams));
    world.insert_resource(SimTelemetry::default());
    world.insert_resource(JobIdCounter::default());
    world.insert_resource(SchedulerConfig {
        use_scheduler: params.use_scheduler,
    });
    if params.use_queue_buffer {
        world.insert_resource(HoldingBuffer::default());
    }
    if let Some(time_limit_ms) = params.time_limit_ms {
        world.insert_resource(SimulationEndTimeMs(time_limit_ms));
    }
    Ok(world)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streams::DeterministicStream;

    fn bounded_stream() -> Box<dyn JobStream> {
        Box::new(DeterministicStream::new("main", 1000, 1, 100).with_max_jobs(1))
    }

    #[test]
    fn build_inserts_engine_resources() {
        let params = EngineParams::default()
            .with_total_nodes(8)
            .with_queue_buffer(true)
            .with_time_limit_ms(10_000);
        let world = build_scenario(&params, vec![bounded_stream()]).expect("valid scenario");

        assert!(world.get_resource::<NodePool>().is_some());
        assert!(world.get_resource::<JobQueue>().is_some());
        assert!(world.get_resource::<HoldingBuffer>().is_some());
        assert!(world.get_resource::<SimulationEndTimeMs>().is_some());
    }

    #[test]
    fn buffer_resource_absent_when_disabled() {
        let params = EngineParams::default().with_total_nodes(8);
        let world = build_scenario(&params, vec![bounded_stream()]).expect("valid scenario");
        assert!(world.get_resource::<HoldingBuffer>().is_none());
        assert!(world.get_resource::<SimulationEndTimeMs>().is_none());
    }

    #[test]
    fn zero_nodes_is_a_configuration_error() {
        let params = EngineParams::default().with_total_nodes(0);
        let err = build_scenario(&params, vec![bounded_stream()]).unwrap_err();
        assert_eq!(err, ConfigurationError::EmptyNodePool);
    }

    #[test]
    fn missing_streams_is_a_configuration_error() {
        let params = EngineParams::default();
        let err = build_scenario(&params, Vec::new()).unwrap_err();
        assert_eq!(err, ConfigurationError::NoStreams);
    }

    #[test]
    fn unbounded_stream_is_a_configuration_error() {
        let params = EngineParams::default();
        let unbounded: Box<dyn JobStream> =
            Box::new(DeterministicStream::new("endless", 1000, 1, 100));
        let err = build_scenario(&params, vec![unbounded]).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::UnboundedStream("endless".to_string())
        );
    }
}
