//! Wires subsystems, controllers, autonomous routines and default commands
//! together. Very little logic lives in [`crate::robot::Robot`]; the shape of
//! the robot is declared here.

use std::{cell::RefCell, rc::Rc};

use frc_command::{
    auto::{AutoBuilder, AutoRoutine, NamedCommands, NONE_OPTION},
    command::{CommandExt, FunctionalCommand},
    controller::CommandXboxController,
    dashboard::SendableChooser,
    subsystem::Subsystem,
    CommandRef, CommandScheduler,
};
use log::info;
use snafu::ResultExt;

use crate::{
    commands::DriveWithJoystickCommand,
    config::RobotConfig,
    error::{AutoSnafu, CommandSnafu, DefaultCommandSnafu, RobotError},
    subsystems::{AlgaeSubsystem, CoralSubsystem, DriveSubsystem, Setpoint},
};

pub const AUTO_CHOOSER_KEY: &str = "Auto Chooser";

pub struct RobotContainer {
    config: RobotConfig,
    drive: Rc<RefCell<DriveSubsystem>>,
    coral: Rc<RefCell<CoralSubsystem>>,
    algae: Rc<RefCell<AlgaeSubsystem>>,
    driver_controller: CommandXboxController,
    manip_controller: CommandXboxController,
    auto_builder: AutoBuilder,
    auto_chooser: SendableChooser<Option<AutoRoutine>>,
}

impl RobotContainer {
    pub fn new(config: RobotConfig) -> Result<Self, RobotError> {
        let drive = DriveSubsystem::new(config.drive.clone()).register();
        let coral = CoralSubsystem::new(config.coral.clone()).register();
        let algae = AlgaeSubsystem::new(config.algae.clone()).register();

        register_named_commands(&coral, &algae);

        let auto_builder = AutoBuilder::new(&config.auto.deploy_dir);
        let mut auto_chooser = auto_builder.build_auto_chooser().context(AutoSnafu)?;
        auto_chooser.publish(AUTO_CHOOSER_KEY);

        let container = Self {
            driver_controller: CommandXboxController::new(config.operator.driver_controller_port),
            manip_controller: CommandXboxController::new(config.operator.manip_controller_port),
            config,
            drive,
            coral,
            algae,
            auto_builder,
            auto_chooser,
        };
        container.configure_button_bindings()?;
        container.configure_default_commands()?;
        info!(
            "robot container ready with {} button bindings and autos {:?}",
            CommandScheduler::button_event_loop().borrow().len(),
            container.auto_chooser.option_names()
        );
        Ok(container)
    }

    fn configure_button_bindings(&self) -> Result<(), RobotError> {
        let driver = &self.driver_controller;
        let manip = &self.manip_controller;
        let threshold = self.config.operator.trigger_button_threshold;

        driver
            .left_stick()
            .while_true(DriveSubsystem::set_x_command(&self.drive));

        let drive = self.drive.clone();
        driver.y().on_true(
            FunctionalCommand::instant(
                move || {
                    drive.borrow_mut().zero_gyro();
                    Ok(())
                },
                Vec::new(),
            )
            .with_name("Zero Gyro"),
        );

        manip
            .right_bumper()
            .while_true(CoralSubsystem::run_intake_command(&self.coral));
        manip
            .left_bumper()
            .while_true(CoralSubsystem::reverse_intake_command(&self.coral));

        // Human player station, and tuck the algae arm away once idle.
        manip.b().on_true(
            CoralSubsystem::set_setpoint_command(&self.coral, Setpoint::FeederStation)
                .along_with(AlgaeSubsystem::stow_command(&self.algae))
                .context(CommandSnafu)?,
        );

        manip
            .a()
            .on_true(CoralSubsystem::set_setpoint_command(&self.coral, Setpoint::Level2));
        manip
            .x()
            .on_true(CoralSubsystem::set_setpoint_command(&self.coral, Setpoint::Level3));
        manip
            .y()
            .on_true(CoralSubsystem::set_setpoint_command(&self.coral, Setpoint::Level4));

        manip
            .right_trigger(threshold)
            .while_true(AlgaeSubsystem::run_intake_command(&self.algae));
        manip
            .left_trigger(threshold)
            .while_true(AlgaeSubsystem::reverse_intake_command(&self.algae));

        driver
            .start()
            .on_true(DriveSubsystem::zero_heading_command(&self.drive));

        Ok(())
    }

    fn configure_default_commands(&self) -> Result<(), RobotError> {
        CommandScheduler::set_default_command(
            &self.drive,
            DriveWithJoystickCommand::new(
                self.drive.clone(),
                self.driver_controller,
                self.config.operator.drive_deadband,
                self.config.drive.field_relative,
            ),
        )
        .context(DefaultCommandSnafu { subsystem: "drive" })?;

        CommandScheduler::set_default_command(&self.algae, AlgaeSubsystem::idle_command(&self.algae))
            .context(DefaultCommandSnafu { subsystem: "algae" })?;

        Ok(())
    }

    /// Amps drawn by every simulated mechanism.
    pub fn simulation_total_current_draw(&self) -> f64 {
        self.coral.borrow().simulation_current_draw() + self.algae.borrow().simulation_current_draw()
    }

    /// The command for the auto picked on the dashboard. Picking nothing, or
    /// "None", gives a command that does nothing.
    pub fn autonomous_command(&self) -> Result<CommandRef, RobotError> {
        let name = self
            .auto_chooser
            .selected_name()
            .unwrap_or_else(|| NONE_OPTION.to_owned());
        match self.auto_chooser.selected().flatten() {
            Some(routine) => {
                let command = self
                    .auto_builder
                    .build_auto(&name, &routine)
                    .context(AutoSnafu)?;
                Ok(CommandRef::from(command))
            }
            None => Ok(CommandRef::from(FunctionalCommand::none().with_name(NONE_OPTION))),
        }
    }

    pub fn auto_chooser(&self) -> &SendableChooser<Option<AutoRoutine>> {
        &self.auto_chooser
    }

    pub fn config(&self) -> &RobotConfig {
        &self.config
    }

    pub fn drive(&self) -> &Rc<RefCell<DriveSubsystem>> {
        &self.drive
    }

    pub fn coral(&self) -> &Rc<RefCell<CoralSubsystem>> {
        &self.coral
    }

    pub fn algae(&self) -> &Rc<RefCell<AlgaeSubsystem>> {
        &self.algae
    }
}

/// Actions that `.auto` files may refer to by name.
fn register_named_commands(coral: &Rc<RefCell<CoralSubsystem>>, algae: &Rc<RefCell<AlgaeSubsystem>>) {
    let a = algae.clone();
    NamedCommands::register_command("Grab Algae", move || AlgaeSubsystem::run_intake_command(&a));
    let a = algae.clone();
    NamedCommands::register_command("Spit Out Algae", move || {
        AlgaeSubsystem::reverse_intake_command(&a)
    });

    let c = coral.clone();
    NamedCommands::register_command("Grab Coral", move || CoralSubsystem::run_intake_command(&c));
    let c = coral.clone();
    NamedCommands::register_command("Spit Out Coral", move || {
        CoralSubsystem::reverse_intake_command(&c)
    });

    for (name, setpoint) in [
        ("Coral Station", Setpoint::FeederStation),
        ("L2", Setpoint::Level2),
        ("L3", Setpoint::Level3),
        ("L4", Setpoint::Level4),
    ] {
        let c = coral.clone();
        NamedCommands::register_command(name, move || {
            CoralSubsystem::set_setpoint_command(&c, setpoint)
        });
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, path::Path};

    use frc_command::{
        command::CommandRefExt,
        controller::{XboxAxis, XboxButton},
        dashboard,
        driver_station::{sim, RobotMode},
    };

    use super::*;
    use crate::config::CoralPosition;

    const LOW_CORAL: &str = r#"{
        "version": "2025.0",
        "command": {
            "type": "sequential",
            "data": {
                "commands": [
                    { "type": "named", "data": { "name": "L2" } },
                    { "type": "wait", "data": { "waitTime": 0.1 } }
                ]
            }
        },
        "resetOdom": false,
        "folder": null,
        "choreoAuto": false
    }"#;

    fn container_with_autos(deploy: &Path) -> RobotContainer {
        let autos = deploy.join("pathplanner").join("autos");
        fs::create_dir_all(&autos).unwrap();
        fs::write(autos.join("Low Coral.auto"), LOW_CORAL).unwrap();

        let mut config = RobotConfig::default();
        config.auto.deploy_dir = deploy.to_owned();
        sim::set_mode(RobotMode::Teleop);
        RobotContainer::new(config).unwrap()
    }

    fn container() -> RobotContainer {
        let mut config = RobotConfig::default();
        config.auto.deploy_dir = "does/not/exist".into();
        sim::set_mode(RobotMode::Teleop);
        RobotContainer::new(config).unwrap()
    }

    fn press(port: usize, button: XboxButton) {
        sim::set_button(port, button as u8, true);
        CommandScheduler::run().unwrap();
    }

    fn release(port: usize, button: XboxButton) {
        sim::set_button(port, button as u8, false);
        CommandScheduler::run().unwrap();
    }

    #[test]
    fn registers_every_named_command() {
        let _container = container();
        assert_eq!(
            NamedCommands::names(),
            [
                "Coral Station",
                "Grab Algae",
                "Grab Coral",
                "L2",
                "L3",
                "L4",
                "Spit Out Algae",
                "Spit Out Coral",
            ]
        );
    }

    #[test]
    fn binds_the_season_button_table() {
        let _container = container();
        // Nine buttons, plus a sampler and a binding for each analog trigger.
        assert_eq!(CommandScheduler::button_event_loop().borrow().len(), 13);
    }

    #[test]
    fn default_commands_are_installed() {
        let container = container();
        let drive = CommandScheduler::default_command(container.drive()).unwrap();
        assert_eq!(drive.name(), "Drive With Joystick");
        let algae = CommandScheduler::default_command(container.algae()).unwrap();
        assert_eq!(algae.name(), "Algae Idle");
        assert!(CommandScheduler::default_command(container.coral()).is_none());
    }

    #[test]
    fn setpoint_buttons_move_coral() {
        let container = container();
        press(1, XboxButton::Y);
        assert_eq!(container.coral().borrow().target(), CoralPosition { arm: 19.0, elevator: 150.0 });
        release(1, XboxButton::Y);

        press(1, XboxButton::X);
        assert_eq!(container.coral().borrow().target(), CoralPosition { arm: 2.0, elevator: 100.0 });
        release(1, XboxButton::X);

        press(1, XboxButton::A);
        assert_eq!(container.coral().borrow().target(), CoralPosition { arm: 2.0, elevator: 0.0 });
    }

    #[test]
    fn feeder_button_also_stows_algae() {
        let container = container();
        sim::set_axis(1, XboxAxis::RightTrigger as usize, 0.9);
        CommandScheduler::run().unwrap();
        CommandScheduler::run().unwrap();
        assert!(!container.algae().borrow().stow_when_idle());
        sim::set_axis(1, XboxAxis::RightTrigger as usize, 0.0);
        CommandScheduler::run().unwrap();

        press(1, XboxButton::Y);
        release(1, XboxButton::Y);
        press(1, XboxButton::B);
        assert_eq!(container.coral().borrow().target(), CoralPosition { arm: 33.0, elevator: 0.0 });
        assert!(container.algae().borrow().stow_when_idle());
    }

    #[test]
    fn bumpers_hold_coral_intake() {
        let _container = container();
        press(1, XboxButton::RightBumper);
        assert_eq!(CommandScheduler::scheduled_names(), ["Algae Idle", "Coral Intake", "Drive With Joystick"]);
        release(1, XboxButton::RightBumper);
        assert!(!CommandScheduler::scheduled_names().contains(&"Coral Intake".to_owned()));

        press(1, XboxButton::LeftBumper);
        assert!(CommandScheduler::scheduled_names().contains(&"Coral Outtake".to_owned()));
    }

    #[test]
    fn left_trigger_ejects_algae() {
        let container = container();
        sim::set_axis(1, XboxAxis::LeftTrigger as usize, 0.5);
        CommandScheduler::run().unwrap();
        CommandScheduler::run().unwrap();
        assert_eq!(container.algae().borrow().arm_target(), 11.5);
        assert!(CommandScheduler::scheduled_names().contains(&"Algae Outtake".to_owned()));
    }

    #[test]
    fn driver_sticks_and_buttons_reach_drive() {
        let container = container();
        container.drive().borrow_mut().drive(0.0, 0.0, 1.0, false);
        CommandScheduler::run().unwrap();
        assert!(container.drive().borrow().heading().radians().abs() > 0.0);

        press(0, XboxButton::Y);
        assert_eq!(container.drive().borrow().heading().radians(), 0.0);
        release(0, XboxButton::Y);

        press(0, XboxButton::LeftStick);
        CommandScheduler::run().unwrap();
        let angles = container.drive().borrow().module_states().map(|s| s.angle.degrees());
        assert!((angles[0] - 45.0).abs() < 1e-9);
        assert!((angles[1] + 45.0).abs() < 1e-9);
        release(0, XboxButton::LeftStick);

        sim::set_axis(0, XboxAxis::LeftY as usize, -1.0);
        CommandScheduler::run().unwrap();
        CommandScheduler::run().unwrap();
        let speed = container.drive().borrow().module_states()[0].speed;
        assert!((speed - 4.8).abs() < 1e-9);
    }

    #[test]
    fn start_zeroes_heading() {
        let container = container();
        container.drive().borrow_mut().drive(0.0, 0.0, 0.5, false);
        CommandScheduler::run().unwrap();
        assert!(container.drive().borrow().heading().radians() > 0.0);
        press(0, XboxButton::Start);
        assert_eq!(container.drive().borrow().heading().radians(), 0.0);
    }

    #[test]
    fn total_current_sums_mechanisms() {
        let container = container();
        CommandScheduler::run().unwrap();
        let total = container.simulation_total_current_draw();
        let parts = container.coral().borrow().simulation_current_draw()
            + container.algae().borrow().simulation_current_draw();
        assert_eq!(total, parts);
        assert!(total > 0.0);
    }

    #[test]
    fn no_selection_gives_do_nothing_auto() {
        let container = container();
        assert_eq!(container.auto_chooser().option_names(), ["None"]);
        let auto = container.autonomous_command().unwrap();
        assert_eq!(auto.name(), "None");
    }

    #[test]
    fn selected_auto_runs_named_commands() {
        let dir = tempfile::tempdir().unwrap();
        let container = container_with_autos(dir.path());
        assert_eq!(container.auto_chooser().option_names(), ["None", "Low Coral"]);

        dashboard::put_string(format!("{AUTO_CHOOSER_KEY}/selected"), "Low Coral");
        let auto = container.autonomous_command().unwrap();
        assert_eq!(auto.name(), "Low Coral");

        sim::set_mode(RobotMode::Autonomous);
        auto.schedule().unwrap();
        CommandScheduler::run().unwrap();
        assert_eq!(container.coral().borrow().target(), CoralPosition { arm: 2.0, elevator: 0.0 });
        assert!(auto.is_scheduled());
    }
}
