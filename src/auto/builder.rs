use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use log::{error, info, warn};
use snafu::ResultExt;

use super::{
    AutoError, AutoRoutine, AutoStep, ComposeSnafu, InvalidWaitTimeSnafu, NamedCommands, ReadSnafu,
};
use crate::{
    command::{
        Command, CommandExt, FunctionalCommand, ParallelCommandGroup, ParallelDeadlineGroup,
        ParallelRaceGroup, SequentialCommandGroup, WaitCommand,
    },
    dashboard::SendableChooser,
};

pub const AUTO_EXTENSION: &str = "auto";
pub const NONE_OPTION: &str = "None";

/// Builds the command that follows a named path.
pub type PathCommandFactory = Box<dyn Fn(&str) -> Result<Box<dyn Command>, AutoError>>;

/// Turns `.auto` files under `<deploy>/pathplanner/autos` into commands.
pub struct AutoBuilder {
    deploy_dir: PathBuf,
    path_factory: Option<PathCommandFactory>,
}

impl AutoBuilder {
    pub fn new(deploy_dir: impl Into<PathBuf>) -> Self {
        Self {
            deploy_dir: deploy_dir.into(),
            path_factory: None,
        }
    }

    pub fn with_path_factory(mut self, factory: PathCommandFactory) -> Self {
        self.path_factory = Some(factory);
        self
    }

    pub fn autos_dir(&self) -> PathBuf {
        self.deploy_dir.join("pathplanner").join("autos")
    }

    /// Names of every `.auto` file in the autos directory, sorted. A missing
    /// directory has no autos.
    pub fn all_auto_names(&self) -> Result<Vec<String>, AutoError> {
        let dir = self.autos_dir();
        if !dir.is_dir() {
            warn!("no autos directory at {}", dir.display());
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&dir).context(ReadSnafu { path: &dir })? {
            let path = entry.context(ReadSnafu { path: &dir })?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(AUTO_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn load(&self, name: &str) -> Result<AutoRoutine, AutoError> {
        let path = self.auto_path(name);
        if !path.is_file() {
            return Err(AutoError::NoSuchAuto {
                name: name.to_owned(),
                dir: self.autos_dir(),
            });
        }
        AutoRoutine::load(&path)
    }

    fn auto_path(&self, name: &str) -> PathBuf {
        self.autos_dir().join(format!("{name}.{AUTO_EXTENSION}"))
    }

    /// A chooser holding every loadable auto, with a do-nothing default.
    /// Autos that fail to load are logged and left out.
    pub fn build_auto_chooser(&self) -> Result<SendableChooser<Option<AutoRoutine>>, AutoError> {
        let mut chooser = SendableChooser::new();
        chooser.set_default_option(NONE_OPTION, None);

        for name in self.all_auto_names()? {
            match self.load(&name) {
                Ok(routine) => {
                    self.warn_missing_commands(&name, &routine);
                    chooser.add_option(name, Some(routine));
                }
                Err(err) => error!("skipping auto {name}: {err}"),
            }
        }
        info!("auto chooser has {} options", chooser.option_names().len());
        Ok(chooser)
    }

    fn warn_missing_commands(&self, name: &str, routine: &AutoRoutine) {
        for missing in routine
            .command
            .named_commands()
            .into_iter()
            .filter(|n| !NamedCommands::has_command(n))
        {
            warn!("auto {name} uses unregistered named command {missing}");
        }
        if self.path_factory.is_none() && !routine.command.paths().is_empty() {
            warn!("auto {name} follows paths but no path follower is configured");
        }
    }

    /// Builds the command for a whole routine, named after it.
    pub fn build_auto(&self, name: &str, routine: &AutoRoutine) -> Result<Box<dyn Command>, AutoError> {
        Ok(Box::new(self.build_step(&routine.command)?.with_name(name)))
    }

    /// Loads the named auto from disk and builds it.
    pub fn build_auto_by_name(&self, name: &str) -> Result<Box<dyn Command>, AutoError> {
        let routine = self.load(name)?;
        self.build_auto(name, &routine)
    }

    pub fn build_step(&self, step: &AutoStep) -> Result<Box<dyn Command>, AutoError> {
        let command: Box<dyn Command> = match step {
            AutoStep::Wait { wait_time } => {
                let wait = Duration::try_from_secs_f64(wait_time.max(0.0))
                    .context(InvalidWaitTimeSnafu { seconds: *wait_time })?;
                Box::new(WaitCommand::new(wait))
            }
            AutoStep::Named { name: Some(name) } => NamedCommands::get_command(name),
            AutoStep::Named { name: None } | AutoStep::Path { path_name: None } => {
                Box::new(FunctionalCommand::none())
            }
            AutoStep::Path {
                path_name: Some(path),
            } => match &self.path_factory {
                Some(factory) => factory(path)?,
                None => {
                    return Err(AutoError::PathFollowingUnavailable { path: path.clone() })
                }
            },
            AutoStep::Sequential { commands } => {
                Box::new(SequentialCommandGroup::new(self.build_all(commands)?))
            }
            AutoStep::Parallel { commands } => Box::new(
                ParallelCommandGroup::new(self.build_all(commands)?).context(ComposeSnafu)?,
            ),
            AutoStep::Race { commands } => Box::new(
                ParallelRaceGroup::new(self.build_all(commands)?).context(ComposeSnafu)?,
            ),
            AutoStep::Deadline { commands } => {
                let mut commands = self.build_all(commands)?.into_iter();
                match commands.next() {
                    Some(deadline) => Box::new(
                        ParallelDeadlineGroup::new(deadline, commands.collect())
                            .context(ComposeSnafu)?,
                    ),
                    None => Box::new(FunctionalCommand::none()),
                }
            }
        };
        Ok(command)
    }

    fn build_all(&self, steps: &[AutoStep]) -> Result<Vec<Box<dyn Command>>, AutoError> {
        steps.iter().map(|step| self.build_step(step)).collect()
    }

    pub fn deploy_dir(&self) -> &Path {
        &self.deploy_dir
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use crate::{
        clock,
        command::CommandRefExt,
        dashboard,
        driver_station::{self, RobotMode},
        subsystem::{Subsystem, SubsystemRefExt},
        CommandRef, CommandScheduler,
    };

    #[derive(Debug, Default)]
    struct Claw {
        grabs: u32,
    }

    impl Subsystem for Claw {}

    fn write_auto(deploy: &Path, name: &str, body: &str) {
        let dir = deploy.join("pathplanner").join("autos");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(format!("{name}.auto")), body).unwrap();
    }

    const GRAB_TWICE: &str = r#"{ "command": { "type": "sequential", "data": { "commands": [
        { "type": "named", "data": { "name": "Grab" } },
        { "type": "wait", "data": { "waitTime": 0.1 } },
        { "type": "named", "data": { "name": "Grab" } }
    ] } } }"#;

    #[test]
    fn chooser_lists_autos_with_none_default() {
        let deploy = tempfile::tempdir().unwrap();
        write_auto(deploy.path(), "Grab Twice", GRAB_TWICE);
        write_auto(deploy.path(), "Broken", "{ not json");
        fs::write(deploy.path().join("pathplanner/autos/notes.txt"), "ignored").unwrap();

        let builder = AutoBuilder::new(deploy.path());
        assert_eq!(builder.all_auto_names().unwrap(), vec!["Broken", "Grab Twice"]);

        let mut chooser = builder.build_auto_chooser().unwrap();
        chooser.publish("Auto Chooser");
        assert_eq!(chooser.option_names(), vec!["None", "Grab Twice"]);
        assert_eq!(chooser.selected(), Some(None));

        dashboard::put_string("Auto Chooser/selected", "Grab Twice");
        assert!(chooser.selected().flatten().is_some());
    }

    #[test]
    fn missing_autos_dir_is_empty() {
        let deploy = tempfile::tempdir().unwrap();
        let builder = AutoBuilder::new(deploy.path().join("nowhere"));
        assert!(builder.all_auto_names().unwrap().is_empty());
        assert!(matches!(
            builder.load("Anything"),
            Err(AutoError::NoSuchAuto { .. })
        ));
    }

    #[test]
    fn built_auto_runs_named_commands() {
        driver_station::sim::set_mode(RobotMode::Autonomous);
        let claw = Claw::default().register();
        NamedCommands::register_command("Grab", {
            let claw = claw.clone();
            move || claw.run_once(|c| c.grabs += 1)
        });

        let deploy = tempfile::tempdir().unwrap();
        write_auto(deploy.path(), "Grab Twice", GRAB_TWICE);
        let builder = AutoBuilder::new(deploy.path());
        let auto = CommandRef::from(builder.build_auto_by_name("Grab Twice").unwrap());
        assert_eq!(auto.name(), "Grab Twice");

        auto.schedule().unwrap();
        for _ in 0..20 {
            CommandScheduler::run().unwrap();
            clock::sim::advance(Duration::from_millis(20));
        }
        assert_eq!(claw.borrow().grabs, 2);
        assert!(!auto.is_scheduled());
    }

    #[test]
    fn path_steps_need_a_follower() {
        let builder = AutoBuilder::new("deploy");
        let step = AutoStep::Path {
            path_name: Some("Start To Reef".into()),
        };
        assert!(matches!(
            builder.build_step(&step),
            Err(AutoError::PathFollowingUnavailable { .. })
        ));

        let followed = Rc::new(RefCell::new(Vec::new()));
        let builder = AutoBuilder::new("deploy").with_path_factory(Box::new({
            let followed = followed.clone();
            move |path| {
                followed.borrow_mut().push(path.to_owned());
                Ok(Box::new(FunctionalCommand::none()) as Box<dyn Command>)
            }
        }));
        builder.build_step(&step).unwrap();
        assert_eq!(*followed.borrow(), vec!["Start To Reef"]);
    }

    #[test]
    fn oversized_wait_is_an_error() {
        let routine: AutoRoutine =
            serde_json::from_str(r#"{"command":{"type":"wait","data":{"waitTime":1e20}}}"#).unwrap();
        assert!(matches!(
            AutoBuilder::new("deploy").build_auto("Huge", &routine),
            Err(AutoError::InvalidWaitTime { .. })
        ));

        let step = AutoStep::Wait { wait_time: -2.0 };
        AutoBuilder::new("deploy").build_step(&step).unwrap();
    }

    #[test]
    fn parallel_named_commands_sharing_a_subsystem_fail_to_compose() {
        let claw = Claw::default().register();
        NamedCommands::register_command("Open", {
            let claw = claw.clone();
            move || claw.run_once(|_| {})
        });
        NamedCommands::register_command("Close", {
            let claw = claw.clone();
            move || claw.run_once(|_| {})
        });
        let step = AutoStep::Parallel {
            commands: vec![
                AutoStep::Named { name: Some("Open".into()) },
                AutoStep::Named { name: Some("Close".into()) },
            ],
        };
        assert!(matches!(
            AutoBuilder::new("deploy").build_step(&step),
            Err(AutoError::Compose { .. })
        ));
    }
}
