//! Scenario setup: engine parameters, validation and world construction.

mod build;
mod params;

pub use build::{build_scenario, ConfigurationError};
pub use params::{EngineParams, JobIdCounter, SchedulerConfig, SimulationEndTimeMs};
