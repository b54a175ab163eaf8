//! Simulated hardware and a match driver for running the robot off-robot.

use std::{thread, time::Duration};

use frc_command::{
    clock,
    driver_station::{sim, RobotMode},
    robot::{RobotRunner, ITERATION_PERIOD},
    CommandScheduler, Result,
};
use log::info;
use serde::Serialize;

use crate::robot::Robot;

pub mod motor;
pub mod spark;

/// How long each enabled period of a simulated match lasts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchPlan {
    pub autonomous: Duration,
    pub teleop: Duration,
    /// Sleep out each loop so the match runs at wall-clock speed.
    pub realtime: bool,
}

impl Default for MatchPlan {
    fn default() -> Self {
        Self {
            autonomous: Duration::from_secs(15),
            teleop: Duration::from_secs(135),
            realtime: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchSummary {
    pub auto: String,
    pub loops: u64,
    /// Simulated seconds.
    pub elapsed: f64,
    pub peak_current_draw: f64,
    pub arm_position: f64,
    pub elevator_position: f64,
    pub algae_arm_position: f64,
    /// Commands still scheduled when autonomous ended.
    pub running_at_auto_end: Vec<String>,
}

fn loops_in(period: Duration) -> u64 {
    (period.as_nanos() / ITERATION_PERIOD.as_nanos()) as u64
}

/// Plays a match: one disabled loop, autonomous, teleop, then disabled again.
pub fn run_match(runner: &mut RobotRunner<Robot>, plan: &MatchPlan) -> Result<MatchSummary> {
    let started = clock::now();
    let mut loops = 0;
    let mut peak_current_draw: f64 = 0.0;
    let mut running_at_auto_end = Vec::new();
    let mut auto = String::new();

    let phases = [
        (RobotMode::Disabled, 1),
        (RobotMode::Autonomous, loops_in(plan.autonomous)),
        (RobotMode::Teleop, loops_in(plan.teleop)),
        (RobotMode::Disabled, 1),
    ];
    // Nobody is holding the controllers in a simulated match.
    sim::reset_joysticks();
    for (mode, count) in phases {
        sim::set_mode(mode);
        for _ in 0..count {
            runner.step()?;
            loops += 1;
            peak_current_draw =
                peak_current_draw.max(runner.robot().container().simulation_total_current_draw());
            if plan.realtime {
                thread::sleep(ITERATION_PERIOD);
            }
        }
        if mode == RobotMode::Autonomous {
            if let Some(command) = runner.robot().autonomous_command() {
                auto = command.name();
            }
            running_at_auto_end = CommandScheduler::scheduled_names();
            info!("autonomous over; still running {running_at_auto_end:?}");
        }
    }

    let container = runner.robot().container();
    let algae_arm_position = container.algae().borrow().arm_position();
    let coral = container.coral().borrow();
    Ok(MatchSummary {
        auto,
        loops,
        elapsed: (clock::now() - started).as_secs_f64(),
        peak_current_draw,
        arm_position: coral.arm_position(),
        elevator_position: coral.elevator_position(),
        algae_arm_position,
        running_at_auto_end,
    })
}
