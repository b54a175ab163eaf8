use frc_command::{
    command::CommandRefExt, dashboard, robot::ScheduledRobot, CommandRef, CommandScheduler, Result,
};
use log::{error, info};

use crate::{config::RobotConfig, container::RobotContainer, error::RobotError};

pub const TOTAL_CURRENT_DRAW_KEY: &str = "Sim/Total Current Draw";

pub struct Robot {
    container: RobotContainer,
    autonomous_command: Option<CommandRef>,
}

impl Robot {
    pub fn new(config: RobotConfig) -> std::result::Result<Self, RobotError> {
        Ok(Self {
            container: RobotContainer::new(config)?,
            autonomous_command: None,
        })
    }

    pub fn container(&self) -> &RobotContainer {
        &self.container
    }

    pub fn autonomous_command(&self) -> Option<&CommandRef> {
        self.autonomous_command.as_ref()
    }
}

impl ScheduledRobot for Robot {
    fn periodic(&mut self) -> Result {
        CommandScheduler::run()
    }

    fn sim_periodic(&mut self) -> Result {
        dashboard::put_number(
            TOTAL_CURRENT_DRAW_KEY,
            self.container.simulation_total_current_draw(),
        );
        Ok(())
    }

    fn autonomous_init(&mut self) -> Result {
        match self.container.autonomous_command() {
            Ok(command) => {
                info!("starting auto {}", command.name());
                command.schedule()?;
                self.autonomous_command = Some(command);
            }
            Err(err) => error!("no autonomous this match: {}", snafu::Report::from_error(err)),
        }
        Ok(())
    }

    fn teleop_init(&mut self) -> Result {
        // Stop the auto if it is still running when teleop starts.
        if let Some(command) = self.autonomous_command.take() {
            command.cancel()?;
        }
        Ok(())
    }

    fn test_init(&mut self) -> Result {
        CommandScheduler::cancel_all()
    }
}
