use std::{cell::RefCell, rc::Rc};

use frc_command::{
    command::Command, controller::CommandXboxController, math::apply_deadband, Result,
    SubsystemRef,
};

use crate::subsystems::DriveSubsystem;

/// Teleop driving: the left stick translates and the right stick's X axis
/// turns. Stick forward and stick left are negative on an Xbox controller.
pub struct DriveWithJoystickCommand {
    drive: Rc<RefCell<DriveSubsystem>>,
    controller: CommandXboxController,
    deadband: f64,
    field_relative: bool,
    requirements: Vec<SubsystemRef>,
}

impl DriveWithJoystickCommand {
    pub fn new(
        drive: Rc<RefCell<DriveSubsystem>>,
        controller: CommandXboxController,
        deadband: f64,
        field_relative: bool,
    ) -> Self {
        Self {
            requirements: vec![SubsystemRef::of(&drive)],
            drive,
            controller,
            deadband,
            field_relative,
        }
    }

    fn axis(&self, value: f64) -> f64 {
        -apply_deadband(value, self.deadband, 1.0)
    }
}

impl Command for DriveWithJoystickCommand {
    fn requirements(&self) -> &[SubsystemRef] {
        &self.requirements
    }

    fn execute(&mut self) -> Result {
        let x_speed = self.axis(self.controller.left_y());
        let y_speed = self.axis(self.controller.left_x());
        let rot = self.axis(self.controller.right_x());
        self.drive
            .borrow_mut()
            .drive(x_speed, y_speed, rot, self.field_relative);
        Ok(())
    }

    fn name(&self) -> &str {
        "Drive With Joystick"
    }
}
