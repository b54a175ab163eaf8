use std::{thread, time::{Duration, Instant}};

use log::info;

use crate::{
    clock,
    driver_station::{self, RobotMode},
    Result,
};

/// Returns true if the code is running on a real robot and not in simulation.
pub const fn is_real() -> bool {
    cfg!(all(target_arch = "arm", target_os = "linux", target_env = "gnu"))
}

/// Returns true if the code is running in simulation and not on a real robot.
pub const fn is_sim() -> bool {
    !is_real()
}

pub trait ScheduledRobot {
    fn periodic(&mut self) -> Result {
        Ok(())
    }
    fn sim_periodic(&mut self) -> Result {
        Ok(())
    }
    fn disabled_init(&mut self) -> Result {
        Ok(())
    }
    fn disabled_periodic(&mut self) -> Result {
        Ok(())
    }
    fn disabled_exit(&mut self) -> Result {
        Ok(())
    }
    fn autonomous_init(&mut self) -> Result {
        Ok(())
    }
    fn autonomous_periodic(&mut self) -> Result {
        Ok(())
    }
    fn autonomous_exit(&mut self) -> Result {
        Ok(())
    }
    fn teleop_init(&mut self) -> Result {
        Ok(())
    }
    fn teleop_periodic(&mut self) -> Result {
        Ok(())
    }
    fn teleop_exit(&mut self) -> Result {
        Ok(())
    }
    fn test_init(&mut self) -> Result {
        Ok(())
    }
    fn test_periodic(&mut self) -> Result {
        Ok(())
    }
    fn test_exit(&mut self) -> Result {
        Ok(())
    }
}

pub const ITERATION_PERIOD: Duration = Duration::from_millis(20);

/// Drives a [`ScheduledRobot`] one loop iteration at a time, calling the
/// mode hooks as the driver station changes mode.
pub struct RobotRunner<R> {
    robot: R,
    previous_mode: Option<RobotMode>,
}

impl<R: ScheduledRobot> RobotRunner<R> {
    pub fn new(robot: R) -> Self {
        Self {
            robot,
            previous_mode: None,
        }
    }

    pub fn robot(&self) -> &R {
        &self.robot
    }

    pub fn robot_mut(&mut self) -> &mut R {
        &mut self.robot
    }

    pub fn step(&mut self) -> Result {
        let robot = &mut self.robot;
        let current_mode = driver_station::mode();

        if self.previous_mode != Some(current_mode) {
            match self.previous_mode {
                Some(RobotMode::Disabled) => robot.disabled_exit()?,
                Some(RobotMode::Autonomous) => robot.autonomous_exit()?,
                Some(RobotMode::Teleop) => robot.teleop_exit()?,
                Some(RobotMode::Test) => robot.test_exit()?,
                None => {}
            }
            info!("entering {current_mode:?}");
            match current_mode {
                RobotMode::Disabled => robot.disabled_init()?,
                RobotMode::Autonomous => robot.autonomous_init()?,
                RobotMode::Teleop => robot.teleop_init()?,
                RobotMode::Test => robot.test_init()?,
            }
        }
        self.previous_mode = Some(current_mode);

        match current_mode {
            RobotMode::Disabled => robot.disabled_periodic()?,
            RobotMode::Autonomous => robot.autonomous_periodic()?,
            RobotMode::Teleop => robot.teleop_periodic()?,
            RobotMode::Test => robot.test_periodic()?,
        }

        robot.periodic()?;
        if is_sim() {
            robot.sim_periodic()?;
            clock::sim::advance(ITERATION_PERIOD);
        }

        Ok(())
    }

    pub fn into_inner(self) -> R {
        self.robot
    }
}

/// Runs the robot forever at [`ITERATION_PERIOD`].
pub fn start_robot(robot: impl ScheduledRobot) -> Result {
    let mut runner = RobotRunner::new(robot);
    let mut next = Instant::now();

    loop {
        runner.step()?;

        next += ITERATION_PERIOD;
        let now = Instant::now();
        if next > now {
            thread::sleep(next - now);
        } else {
            log::warn!("loop overrun by {:?}", now - next);
            next = now;
        }
    }
}
