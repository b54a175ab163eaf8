//! Robot time. Wall-clock on the robot, stepped by the robot loop in simulation.

use std::{cell::Cell, time::{Duration, Instant}};

use crate::robot;

thread_local! {
    static EPOCH: Instant = Instant::now();
    static SIM_TIME: Cell<Duration> = const { Cell::new(Duration::ZERO) };
}

/// Time since the robot program started.
pub fn now() -> Duration {
    if robot::is_real() {
        EPOCH.with(Instant::elapsed)
    } else {
        SIM_TIME.with(Cell::get)
    }
}

pub mod sim {
    use super::*;

    pub fn advance(dt: Duration) {
        SIM_TIME.with(|time| time.set(time.get() + dt));
    }

    pub fn reset() {
        SIM_TIME.with(|time| time.set(Duration::ZERO));
    }
}
