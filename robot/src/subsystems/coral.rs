use std::{cell::RefCell, rc::Rc};

use frc_command::{
    command::{CommandExt, FunctionalCommand, WrapperCommand},
    dashboard,
    robot::ITERATION_PERIOD,
    subsystem::{Subsystem, SubsystemRefExt},
};

use crate::{
    config::{CoralConfig, CoralPosition},
    constants::coral::{ARM_LIMITS, ELEVATOR_LIMITS},
    sim::{motor::DcMotor, spark::SimSpark},
};

/// Named arm and elevator positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Setpoint {
    FeederStation,
    Level1,
    Level2,
    Level3,
    Level4,
}

/// Coral arm, elevator and tube intake.
#[derive(Debug)]
pub struct CoralSubsystem {
    config: CoralConfig,
    arm: SimSpark,
    elevator: SimSpark,
    intake: SimSpark,
    target: CoralPosition,
    was_reset_by_limit: bool,
}

impl CoralSubsystem {
    pub fn new(config: CoralConfig) -> Self {
        let target = config.setpoints.position(Setpoint::FeederStation);
        Self {
            arm: SimSpark::new(DcMotor::neo(1), config.arm_kp).with_limits(ARM_LIMITS),
            elevator: SimSpark::new(DcMotor::neo_vortex(1), config.elevator_kp)
                .with_limits(ELEVATOR_LIMITS),
            intake: SimSpark::new(DcMotor::neo_550(1), 0.0),
            target,
            was_reset_by_limit: false,
            config,
        }
    }

    pub fn set_setpoint(&mut self, setpoint: Setpoint) {
        self.target = self.config.setpoints.position(setpoint);
    }

    pub fn target(&self) -> CoralPosition {
        self.target
    }

    pub fn set_intake_power(&mut self, power: f64) {
        self.intake.set(power);
    }

    pub fn intake_output(&self) -> f64 {
        self.intake.applied_output()
    }

    pub fn arm_position(&self) -> f64 {
        self.arm.position()
    }

    pub fn elevator_position(&self) -> f64 {
        self.elevator.position()
    }

    /// Amps drawn by the coral mechanisms during the last simulated step.
    pub fn simulation_current_draw(&self) -> f64 {
        self.arm.current() + self.elevator.current() + self.intake.current()
    }

    fn move_to_setpoint(&mut self) {
        self.arm.set_position_reference(self.target.arm);
        self.elevator.set_position_reference(self.target.elevator);
    }

    /// Zeroes the elevator encoder once each time the carriage lands on the
    /// bottom limit switch.
    fn zero_elevator_on_limit_switch(&mut self) {
        if !self.was_reset_by_limit && self.elevator.at_reverse_limit() {
            self.elevator.set_encoder_position(0.0);
            self.was_reset_by_limit = true;
        } else if !self.elevator.at_reverse_limit() {
            self.was_reset_by_limit = false;
        }
    }

    fn publish_telemetry(&self) {
        dashboard::put_number("Coral/Arm/Target Position", self.target.arm);
        dashboard::put_number("Coral/Arm/Actual Position", self.arm.position());
        dashboard::put_number("Coral/Elevator/Target Position", self.target.elevator);
        dashboard::put_number("Coral/Elevator/Actual Position", self.elevator.position());
        dashboard::put_number("Coral/Intake/Applied Output", self.intake.applied_output());
    }

    pub fn set_setpoint_command(
        this: &Rc<RefCell<Self>>,
        setpoint: Setpoint,
    ) -> WrapperCommand<FunctionalCommand> {
        this.run_once(move |coral| coral.set_setpoint(setpoint))
            .with_name(format!("Coral Setpoint {setpoint:?}"))
    }

    /// Runs the intake forward while scheduled.
    pub fn run_intake_command(this: &Rc<RefCell<Self>>) -> WrapperCommand<FunctionalCommand> {
        let power = this.borrow().config.intake_forward;
        this.start_end(move |coral| coral.set_intake_power(power), |coral| coral.set_intake_power(0.0))
            .with_name("Coral Intake")
    }

    pub fn reverse_intake_command(this: &Rc<RefCell<Self>>) -> WrapperCommand<FunctionalCommand> {
        let power = this.borrow().config.intake_reverse;
        this.start_end(move |coral| coral.set_intake_power(power), |coral| coral.set_intake_power(0.0))
            .with_name("Coral Outtake")
    }
}

impl Subsystem for CoralSubsystem {
    fn periodic(&mut self) {
        self.move_to_setpoint();
        self.zero_elevator_on_limit_switch();
        self.publish_telemetry();
    }

    fn sim_periodic(&mut self) {
        let dt = ITERATION_PERIOD.as_secs_f64();
        self.arm.update(dt);
        self.elevator.update(dt);
        self.intake.update(dt);
    }
}
