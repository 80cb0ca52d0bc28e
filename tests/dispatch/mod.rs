//! Test organization:
//! - pipeline.rs: each gate of the request pipeline in isolation
//! - tasks.rs: the long-running task path end to end
//! - scenarios.rs: full end-to-end scenarios with literal values

mod scenarios;
mod tasks;

use picomcp_core::{ManualClock, NoopDelay, ThreadRng};
use picomcp_dispatch::{Dispatcher, DispatcherConfig};
use std::sync::Arc;

/// A dispatcher wired entirely to a manual clock, with generous rate
/// limits so individual tests can tighten what they exercise.
pub fn harness() -> (Dispatcher, Arc<ManualClock>) {
    let clock = ManualClock::shared();
    let dispatcher = DispatcherConfig::builder()
        .clock(clock.clone())
        .rng(ThreadRng::shared())
        .delay(NoopDelay::shared())
        .sessions(4, 60_000)
        .rate_limit(1_000.0, 1_000.0)
        .breaker(3, 500, 1)
        .max_tasks(4)
        .build();
    (dispatcher, clock)
}
