use std::{cell::RefCell, rc::Rc};

use frc_command::{
    command::{CommandExt, FunctionalCommand, WrapperCommand},
    dashboard,
    robot::ITERATION_PERIOD,
    subsystem::{Subsystem, SubsystemRefExt},
};

use crate::{
    config::AlgaeConfig,
    constants::algae::ARM_LIMITS,
    sim::{motor::DcMotor, spark::SimSpark},
};

/// Algae ball intake on a pivoting arm.
#[derive(Debug)]
pub struct AlgaeSubsystem {
    config: AlgaeConfig,
    arm: SimSpark,
    intake: SimSpark,
    arm_target: f64,
    /// Whether the idle command tucks the arm away or keeps holding a ball.
    stow_when_idle: bool,
}

impl AlgaeSubsystem {
    pub fn new(config: AlgaeConfig) -> Self {
        Self {
            arm: SimSpark::new(DcMotor::neo(1), config.arm_kp).with_limits(ARM_LIMITS),
            intake: SimSpark::new(DcMotor::neo(1), 0.0),
            arm_target: config.arm_stow,
            stow_when_idle: true,
            config,
        }
    }

    pub fn set_intake_power(&mut self, power: f64) {
        self.intake.set(power);
    }

    pub fn set_arm_target(&mut self, target: f64) {
        self.arm_target = target;
    }

    pub fn arm_target(&self) -> f64 {
        self.arm_target
    }

    pub fn arm_position(&self) -> f64 {
        self.arm.position()
    }

    pub fn intake_output(&self) -> f64 {
        self.intake.applied_output()
    }

    pub fn stow_when_idle(&self) -> bool {
        self.stow_when_idle
    }

    pub fn simulation_current_draw(&self) -> f64 {
        self.arm.current() + self.intake.current()
    }

    fn intake(&mut self) {
        self.stow_when_idle = false;
        self.set_intake_power(self.config.intake_forward);
        self.set_arm_target(self.config.arm_down);
    }

    fn eject(&mut self) {
        self.stow_when_idle = true;
        self.set_intake_power(self.config.intake_reverse);
        self.set_arm_target(self.config.arm_hold);
    }

    fn idle(&mut self) {
        if self.stow_when_idle {
            self.set_intake_power(0.0);
            self.set_arm_target(self.config.arm_stow);
        } else {
            self.set_intake_power(self.config.intake_hold);
            self.set_arm_target(self.config.arm_hold);
        }
    }

    /// Pulls a ball in with the arm down. Leaves the arm out when released.
    pub fn run_intake_command(this: &Rc<RefCell<Self>>) -> WrapperCommand<FunctionalCommand> {
        this.run(Self::intake).with_name("Algae Intake")
    }

    /// Spits a ball out at hold height. Stows the arm when released.
    pub fn reverse_intake_command(this: &Rc<RefCell<Self>>) -> WrapperCommand<FunctionalCommand> {
        this.run(Self::eject).with_name("Algae Outtake")
    }

    pub fn stow_command(this: &Rc<RefCell<Self>>) -> WrapperCommand<FunctionalCommand> {
        this.run_once(|algae| algae.stow_when_idle = true)
            .with_name("Algae Stow")
    }

    /// Default command: stowed and stopped, or holding a ball.
    pub fn idle_command(this: &Rc<RefCell<Self>>) -> WrapperCommand<FunctionalCommand> {
        this.run(Self::idle).with_name("Algae Idle")
    }
}

impl Subsystem for AlgaeSubsystem {
    fn periodic(&mut self) {
        self.arm.set_position_reference(self.arm_target);

        dashboard::put_number("Algae/Arm/Target Position", self.arm_target);
        dashboard::put_number("Algae/Arm/Actual Position", self.arm.position());
        dashboard::put_number("Algae/Intake/Applied Output", self.intake.applied_output());
        dashboard::put_boolean("Algae/Stow When Idle", self.stow_when_idle);
    }

    fn sim_periodic(&mut self) {
        let dt = ITERATION_PERIOD.as_secs_f64();
        self.arm.update(dt);
        self.intake.update(dt);
    }
}

#[cfg(test)]
mod tests {
    use frc_command::{
        command::CommandRefExt,
        driver_station::{sim, RobotMode},
        CommandRef, CommandScheduler,
    };

    use super::*;

    fn registered() -> Rc<RefCell<AlgaeSubsystem>> {
        sim::set_mode(RobotMode::Teleop);
        CommandScheduler::register(AlgaeSubsystem::new(AlgaeConfig::default()))
    }

    #[test]
    fn idle_after_intake_holds_the_ball() {
        let algae = registered();
        CommandScheduler::set_default_command(&algae, AlgaeSubsystem::idle_command(&algae)).unwrap();

        let intake = CommandRef::from(AlgaeSubsystem::run_intake_command(&algae));
        intake.schedule().unwrap();
        CommandScheduler::run().unwrap();
        assert!(!algae.borrow().stow_when_idle());
        assert_eq!(algae.borrow().arm_target(), 0.0);

        intake.cancel().unwrap();
        CommandScheduler::run().unwrap();
        CommandScheduler::run().unwrap();
        assert_eq!(algae.borrow().arm_target(), 11.5);
        assert_eq!(algae.borrow().intake.mode(), crate::sim::spark::ControlMode::DutyCycle(0.25));
    }

    #[test]
    fn idle_after_eject_stows() {
        let algae = registered();
        CommandScheduler::set_default_command(&algae, AlgaeSubsystem::idle_command(&algae)).unwrap();

        let eject = CommandRef::from(AlgaeSubsystem::reverse_intake_command(&algae));
        eject.schedule().unwrap();
        CommandScheduler::run().unwrap();
        assert_eq!(algae.borrow().arm_target(), 11.5);

        eject.cancel().unwrap();
        CommandScheduler::run().unwrap();
        CommandScheduler::run().unwrap();
        assert_eq!(algae.borrow().arm_target(), 18.5);
        assert_eq!(algae.borrow().intake.mode(), crate::sim::spark::ControlMode::DutyCycle(0.0));
    }

    #[test]
    fn stow_command_only_flips_state() {
        let algae = registered();
        algae.borrow_mut().intake();
        CommandRef::from(AlgaeSubsystem::stow_command(&algae)).schedule().unwrap();
        assert!(algae.borrow().stow_when_idle());
        assert_eq!(algae.borrow().arm_target(), 0.0);
    }

    #[test]
    fn arm_reaches_stow_in_simulation() {
        let mut algae = AlgaeSubsystem::new(AlgaeConfig::default());
        for _ in 0..250 {
            algae.periodic();
            algae.sim_periodic();
        }
        assert!((algae.arm_position() - 18.5).abs() < 1.0);
        assert!(algae.simulation_current_draw() < 5.0);
    }
}
