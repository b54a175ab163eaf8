//! A small command-based robot framework.
//!
//! Subsystems own hardware, commands act on subsystems, triggers schedule
//! commands, and the [`CommandScheduler`] runs everything once per robot loop.
//! All scheduler, dashboard and driver-station state is local to the robot
//! thread.

use std::{
    cell::{Cell, RefCell},
    fmt,
    hash::{Hash, Hasher},
    ops::Deref,
    rc::Rc,
};

use command::{Command, InterruptionBehavior};
use event::EventLoop;
use hashbrown::{HashMap, HashSet};
use log::{debug, trace};
use snafu::Snafu;
use subsystem::Subsystem;

pub mod auto;
pub mod clock;
pub mod command;
pub mod controller;
pub mod dashboard;
pub mod driver_station;
pub mod event;
pub mod math;
pub mod robot;
pub mod subsystem;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum CommandError {
    #[snafu(display("Multiple commands in a parallel composition cannot require {subsystem}."))]
    ConflictingRequirements { subsystem: String },
}

pub type Result<T = (), E = CommandError> = core::result::Result<T, E>;

/// Shared handles compare and hash by allocation, not by value.
macro_rules! shared_handle {
    ($(#[$meta:meta])* $handle:ident => $inner:ident, $busy:literal) => {
        $(#[$meta])*
        #[derive(Clone)]
        pub struct $handle(Rc<RefCell<dyn $inner>>);

        impl $handle {
            pub fn name(&self) -> String {
                match self.0.try_borrow() {
                    Ok(inner) => inner.name().to_owned(),
                    Err(_) => String::from($busy),
                }
            }

            fn addr(&self) -> *const () {
                Rc::as_ptr(&self.0).cast()
            }
        }

        impl PartialEq for $handle {
            fn eq(&self, other: &Self) -> bool {
                self.addr() == other.addr()
            }
        }

        impl Eq for $handle {}

        impl Hash for $handle {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.addr().hash(state);
            }
        }

        impl fmt::Debug for $handle {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:?})", stringify!($handle), self.name())
            }
        }

        impl From<Rc<RefCell<dyn $inner>>> for $handle {
            fn from(inner: Rc<RefCell<dyn $inner>>) -> Self {
                Self(inner)
            }
        }

        impl Deref for $handle {
            type Target = Rc<RefCell<dyn $inner>>;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }
    };
}

shared_handle!(
    /// A registered subsystem.
    SubsystemRef => Subsystem, "<busy subsystem>"
);

shared_handle!(
    /// A command the scheduler can track.
    CommandRef => Command, "<running command>"
);

impl SubsystemRef {
    pub fn of<S: Subsystem + 'static>(subsystem: &Rc<RefCell<S>>) -> Self {
        let subsystem: Rc<RefCell<dyn Subsystem>> = subsystem.clone();
        Self(subsystem)
    }
}

impl<T: Command + 'static> From<T> for CommandRef {
    fn from(command: T) -> Self {
        Self(Rc::new(RefCell::new(command)))
    }
}

#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum SetDefaultCommandError {
    #[snafu(display("Default commands must require their subsystem."))]
    MustRequireSubsystem,
    #[snafu(display("Cannot set the default command on a subsystem that is not registered."))]
    NotRegistered,
}

#[derive(Default)]
struct CommandSchedulerState {
    subsystems: RefCell<HashMap<SubsystemRef, Option<CommandRef>>>,
    in_run_loop: Cell<bool>,
    to_schedule: RefCell<Vec<CommandRef>>,
    to_cancel: RefCell<Vec<CommandRef>>,
    /// In scheduling order, which is also execution order.
    scheduled_commands: RefCell<Vec<CommandRef>>,
    requirements: RefCell<HashMap<SubsystemRef, CommandRef>>,
    button_loop: Rc<RefCell<EventLoop>>,
    ending_commands: RefCell<HashSet<CommandRef>>,
}

impl CommandSchedulerState {
    #[inline]
    fn is_scheduled(&self, command: &CommandRef) -> bool {
        self.scheduled_commands.borrow().contains(command)
    }

    fn requiring(&self, subsystem: &SubsystemRef) -> Option<CommandRef> {
        self.requirements.borrow().get(subsystem).cloned()
    }

    fn init_command(&self, command: CommandRef, requirements: HashSet<SubsystemRef>) -> Result {
        self.requirements
            .borrow_mut()
            .extend(requirements.into_iter().map(|r| (r, command.clone())));

        self.scheduled_commands.borrow_mut().push(command.clone());
        debug!("scheduled {}", command.name());
        let res = command.0.borrow_mut().initialize();
        if res.is_err() {
            self.release(&command);
        }
        res
    }

    fn release(&self, command: &CommandRef) {
        self.scheduled_commands
            .borrow_mut()
            .retain(|scheduled| scheduled != command);
        self.requirements
            .borrow_mut()
            .retain(|_, holder| holder != command);
    }

    /// Ends a scheduled command and releases its requirements.
    fn end_command(&self, command: &CommandRef, interrupted: bool) -> Result {
        self.ending_commands.borrow_mut().insert(command.clone());
        let res = command.0.borrow_mut().end(interrupted);
        self.ending_commands.borrow_mut().remove(command);
        self.release(command);

        if interrupted {
            debug!("interrupted {}", command.name());
        } else {
            debug!("finished {}", command.name());
        }
        res
    }

    fn cancel(&self, command: &CommandRef) -> Result {
        if self.ending_commands.borrow().contains(command) {
            return Ok(());
        }

        if self.in_run_loop.get() {
            self.to_cancel.borrow_mut().push(command.clone());
            return Ok(());
        }

        if !self.is_scheduled(command) {
            return Ok(());
        }

        self.end_command(command, true)
    }

    fn schedule_now(&self, command: CommandRef) -> Result {
        if self.is_scheduled(&command) {
            return Ok(());
        }

        if !command.0.borrow().runs_when_disabled() && driver_station::is_disabled() {
            trace!("not scheduling {} while disabled", command.name());
            return Ok(());
        }

        let requirements = CommandScheduler::requirements_of(&*command.0.borrow());

        let requiring_commands = {
            let held = self.requirements.borrow();
            let mut holders = Vec::new();
            for requirement in &requirements {
                if let Some(holder) = held.get(requirement) {
                    if !holders.contains(holder) {
                        holders.push(holder.clone());
                    }
                }
            }
            holders
        };

        for requiring in &requiring_commands {
            if requiring.0.borrow().interruption_behavior() == InterruptionBehavior::CancelIncoming {
                debug!(
                    "{} was not scheduled because {} cancels incoming commands",
                    command.name(),
                    requiring.name()
                );
                return Ok(());
            }
        }

        for requiring in &requiring_commands {
            self.cancel(requiring)?;
        }

        self.init_command(command, requirements)
    }
}

thread_local! {
    static STATE: CommandSchedulerState = CommandSchedulerState::default();
}

pub struct CommandScheduler;

impl CommandScheduler {
    /// Register a subsystem with the scheduler.
    pub fn register<S: Subsystem + 'static>(subsystem: S) -> Rc<RefCell<S>> {
        let subsystem = Rc::new(RefCell::new(subsystem));
        STATE.with(|state| {
            state
                .subsystems
                .borrow_mut()
                .insert(SubsystemRef::of(&subsystem), None);
        });
        subsystem
    }

    /// Schedule a command to run.
    pub fn schedule(command: CommandRef) -> Result {
        STATE.with(|state| {
            if state.in_run_loop.get() {
                state.to_schedule.borrow_mut().push(command);
                return Ok(());
            }

            state.schedule_now(command)
        })
    }

    pub fn cancel(command: &CommandRef) -> Result {
        STATE.with(|state| state.cancel(command))
    }

    pub fn set_default_command<S>(
        subsystem: &Rc<RefCell<S>>,
        command: impl Command + 'static,
    ) -> Result<(), SetDefaultCommandError>
    where
        S: Subsystem + 'static,
    {
        STATE.with(|state| {
            let key = SubsystemRef::of(subsystem);
            let requirements = CommandScheduler::requirements_of(&command);
            if !requirements.contains(&key) {
                return Err(SetDefaultCommandError::MustRequireSubsystem);
            }

            if command.interruption_behavior() == InterruptionBehavior::CancelIncoming {
                log::warn!(
                    "default command {} cancels incoming commands; nothing else can use {}",
                    command.name(),
                    key.name()
                );
            }

            let mut subsystems = state.subsystems.borrow_mut();
            let slot = subsystems
                .get_mut(&key)
                .ok_or(SetDefaultCommandError::NotRegistered)?;
            slot.replace(CommandRef::from(command));

            Ok(())
        })
    }

    pub fn remove_default_command<S>(subsystem: &Rc<RefCell<S>>) -> Option<CommandRef>
    where
        S: Subsystem + 'static,
    {
        STATE.with(|state| {
            state
                .subsystems
                .borrow_mut()
                .get_mut(&SubsystemRef::of(subsystem))?
                .take()
        })
    }

    pub fn default_command<S>(subsystem: &Rc<RefCell<S>>) -> Option<CommandRef>
    where
        S: Subsystem + 'static,
    {
        STATE.with(|state| {
            state
                .subsystems
                .borrow()
                .get(&SubsystemRef::of(subsystem))
                .cloned()
                .flatten()
        })
    }

    /// The command currently holding `subsystem`, if any.
    pub fn requiring<S>(subsystem: &Rc<RefCell<S>>) -> Option<CommandRef>
    where
        S: Subsystem + 'static,
    {
        STATE.with(|state| state.requiring(&SubsystemRef::of(subsystem)))
    }

    pub fn run() -> Result {
        STATE.with(|state| {
            for subsystem in state.subsystems.borrow().keys() {
                let mut subsystem = subsystem.0.borrow_mut();
                subsystem.periodic();
                if robot::is_sim() {
                    subsystem.sim_periodic();
                }
            }

            let button_loop = state.button_loop.clone();
            button_loop.borrow_mut().poll();

            state.in_run_loop.set(true);
            let disabled = driver_station::is_disabled();

            let scheduled_commands = state.scheduled_commands.borrow().clone();

            let mut res = Ok(());
            for command in scheduled_commands {
                if disabled && !command.0.borrow().runs_when_disabled() {
                    res = state.end_command(&command, true);
                    if res.is_err() {
                        break;
                    }
                    continue;
                }

                let finished = {
                    let mut command = command.0.borrow_mut();
                    command.execute().and_then(|_| command.is_finished())
                };
                match finished {
                    Ok(true) => res = state.end_command(&command, false),
                    Ok(false) => {}
                    Err(err) => res = Err(err),
                }
                if res.is_err() {
                    break;
                }
            }

            state.in_run_loop.set(false);
            res?;

            let to_schedule = state.to_schedule.take();
            for command in to_schedule {
                state.schedule_now(command)?;
            }

            let to_cancel = state.to_cancel.take();
            for command in to_cancel {
                state.cancel(&command)?;
            }

            // Add default commands for un-required registered subsystems.
            let defaults = state
                .subsystems
                .borrow()
                .iter()
                .filter_map(|(subsystem, command)| {
                    let command = command.as_ref()?;
                    (!state.requirements.borrow().contains_key(subsystem)).then(|| command.clone())
                })
                .collect::<Vec<_>>();
            for default_command in defaults {
                state.schedule_now(default_command)?;
            }

            Ok(())
        })
    }

    fn requirements_of(command: &dyn Command) -> HashSet<SubsystemRef> {
        command.requirements().iter().cloned().collect()
    }

    pub fn cancel_all() -> Result {
        STATE.with(|state| {
            let scheduled_commands = state.scheduled_commands.borrow().clone();

            for command in scheduled_commands {
                state.cancel(&command)?;
            }

            Ok(())
        })
    }

    pub fn button_event_loop() -> Rc<RefCell<EventLoop>> {
        STATE.with(|state| state.button_loop.clone())
    }

    pub fn is_scheduled(command: &CommandRef) -> bool {
        STATE.with(|state| state.is_scheduled(command))
    }

    /// Names of every scheduled command, sorted.
    pub fn scheduled_names() -> Vec<String> {
        STATE.with(|state| {
            let mut names = state
                .scheduled_commands
                .borrow()
                .iter()
                .map(CommandRef::name)
                .collect::<Vec<_>>();
            names.sort();
            names
        })
    }
}
