pub mod backfill;
pub mod clock;
pub mod ecs;
pub mod nodes;
pub mod queue;
pub mod runner;
pub mod scenario;
pub mod streams;
pub mod systems;
pub mod telemetry;
