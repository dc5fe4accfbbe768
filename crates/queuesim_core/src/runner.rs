//! Simulation runner: advances the clock and routes events into the ECS.
//!
//! Clock progression and event routing happen here, outside systems. Each
//! step pops the next event from [SimulationClock], inserts it as
//! [CurrentEvent], then runs the schedule.

use bevy_ecs::prelude::Res;
use bevy_ecs::prelude::{Schedule, World};
use bevy_ecs::schedule::{apply_deferred, IntoSystemConfigs};
use bevy_ecs::world::Mut;

use crate::clock::{CurrentEvent, Event, EventKind, EventSubject, SimulationClock};
use crate::scenario::SimulationEndTimeMs;
use crate::streams::StreamSet;
use crate::systems::{
    arrival::arrival_system, buffer_release::buffer_release_system,
    finish_execution::finish_execution_system, queue_admit::queue_admit_system,
    scheduling_tick::scheduling_tick_system, start_execution::start_execution_system,
};

// Condition functions for each event kind
fn is_arrival(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::Arrival)
        .unwrap_or(false)
}

fn is_buffer_release(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::BufferRelease)
        .unwrap_or(false)
}

fn is_queue_admit(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::QueueAdmit)
        .unwrap_or(false)
}

fn is_start_execution(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::StartExecution)
        .unwrap_or(false)
}

fn is_finish_execution(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::FinishExecution)
        .unwrap_or(false)
}

fn is_scheduling_tick(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::SchedulingTick)
        .unwrap_or(false)
}

/// Runs one simulation step: pops the next event, inserts it as
/// [CurrentEvent], then runs the schedule. Returns `true` if an event was
/// processed, `false` if the clock was empty or if the next event is at or
/// past [SimulationEndTimeMs] (when that resource is present).
pub fn run_next_event(world: &mut World, schedule: &mut Schedule) -> bool {
    let stop_at = world.get_resource::<SimulationEndTimeMs>().map(|e| e.0);
    let next_ts = world
        .get_resource::<SimulationClock>()
        .and_then(|c| c.next_event_time());
    if let (Some(end_ms), Some(ts)) = (stop_at, next_ts) {
        if ts >= end_ms {
            return false;
        }
    }

    let event = match world.resource_mut::<SimulationClock>().pop_next() {
        Some(e) => e,
        None => return false,
    };
    world.insert_resource(CurrentEvent(event));

    schedule.run(world);
    true
}

/// Runs one simulation step and invokes `hook` after the schedule completes.
pub fn run_next_event_with_hook<F>(world: &mut World, schedule: &mut Schedule, mut hook: F) -> bool
where
    F: FnMut(&World, &Event),
{
    let stop_at = world.get_resource::<SimulationEndTimeMs>().map(|e| e.0);
    let next_ts = world
        .get_resource::<SimulationClock>()
        .and_then(|c| c.next_event_time());
    if let (Some(end_ms), Some(ts)) = (stop_at, next_ts) {
        if ts >= end_ms {
            return false;
        }
    }

    let event = match world.resource_mut::<SimulationClock>().pop_next() {
        Some(e) => e,
        None => return false,
    };
    world.insert_resource(CurrentEvent(event));

    schedule.run(world);
    hook(world, &event);
    true
}

/// Runs simulation steps until the event queue is empty or `max_steps` is
/// reached. Returns the number of steps executed.
pub fn run_until_empty(world: &mut World, schedule: &mut Schedule, max_steps: usize) -> usize {
    let mut steps = 0;
    while steps < max_steps && run_next_event(world, schedule) {
        steps += 1;
    }
    steps
}

/// Runs simulation steps until empty and invokes `hook` after each step.
pub fn run_until_empty_with_hook<F>(
    world: &mut World,
    schedule: &mut Schedule,
    max_steps: usize,
    mut hook: F,
) -> usize
where
    F: FnMut(&World, &Event),
{
    let mut steps = 0;
    while steps < max_steps && run_next_event_with_hook(world, schedule, &mut hook) {
        steps += 1;
    }
    steps
}

/// Builds the default simulation schedule: one system per event kind plus
/// [apply_deferred] so that jobs spawned on arrival are applied before the
/// next step.
pub fn simulation_schedule() -> Schedule {
    let mut schedule = Schedule::default();

    schedule.add_systems((
        // Arrival
        arrival_system.run_if(is_arrival),
        // QueueAdmit
        queue_admit_system.run_if(is_queue_admit),
        // BufferRelease
        buffer_release_system.run_if(is_buffer_release),
        // SchedulingTick
        scheduling_tick_system.run_if(is_scheduling_tick),
        // StartExecution
        start_execution_system.run_if(is_start_execution),
        // FinishExecution
        finish_execution_system.run_if(is_finish_execution),
        // Always run apply_deferred to ensure spawned jobs are available
        apply_deferred,
    ));

    schedule
}

/// Seeds the clock with each stream's first arrival. Call after building the
/// scenario and before running events.
pub fn initialize_simulation(world: &mut World) {
    world.resource_scope(|world, mut streams: Mut<StreamSet>| {
        let mut clock = world.resource_mut::<SimulationClock>();
        for index in 0..streams.len() {
            if let Some(arrival_ms) = streams.refill(index) {
                clock.schedule_at(
                    arrival_ms,
                    EventKind::Arrival,
                    Some(EventSubject::Stream(index)),
                );
            }
        }
    });
}
