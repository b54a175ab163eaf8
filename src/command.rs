use std::time::Duration;

use crate::{
    clock, CommandRef, CommandScheduler, Result, SubsystemRef,
};

pub mod button;
pub mod group;

pub use group::{
    ParallelCommandGroup, ParallelDeadlineGroup, ParallelRaceGroup, SequentialCommandGroup,
};

/// An action the robot can perform. Runs when scheduled, until it is interrupted or it finishes.
pub trait Command {
    fn requirements(&self) -> &[SubsystemRef];

    /// The initial subroutine of a command. Called once when the command is initially scheduled.
    fn initialize(&mut self) -> Result {
        Ok(())
    }
    fn execute(&mut self) -> Result {
        Ok(())
    }
    #[allow(unused_variables)]
    fn end(&mut self, interrupted: bool) -> Result {
        Ok(())
    }

    fn is_finished(&self) -> Result<bool> {
        Ok(false)
    }

    fn runs_when_disabled(&self) -> bool {
        false
    }

    fn interruption_behavior(&self) -> InterruptionBehavior {
        InterruptionBehavior::default()
    }

    fn name(&self) -> &str {
        let full = core::any::type_name::<Self>();
        let base = full.split('<').next().unwrap_or(full);
        base.rsplit("::").next().unwrap_or(base)
    }
}

impl<C: Command + ?Sized> Command for Box<C> {
    fn requirements(&self) -> &[SubsystemRef] {
        (**self).requirements()
    }
    fn initialize(&mut self) -> Result {
        (**self).initialize()
    }
    fn execute(&mut self) -> Result {
        (**self).execute()
    }
    fn end(&mut self, interrupted: bool) -> Result {
        (**self).end(interrupted)
    }
    fn is_finished(&self) -> Result<bool> {
        (**self).is_finished()
    }
    fn runs_when_disabled(&self) -> bool {
        (**self).runs_when_disabled()
    }
    fn interruption_behavior(&self) -> InterruptionBehavior {
        (**self).interruption_behavior()
    }
    fn name(&self) -> &str {
        (**self).name()
    }
}

pub trait CommandRefExt {
    fn schedule(&self) -> Result;
    fn cancel(&self) -> Result;
    fn is_scheduled(&self) -> bool;
}

impl CommandRefExt for CommandRef {
    fn schedule(&self) -> Result {
        CommandScheduler::schedule(self.clone())
    }

    fn cancel(&self) -> Result {
        CommandScheduler::cancel(self)
    }

    fn is_scheduled(&self) -> bool {
        CommandScheduler::is_scheduled(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterruptionBehavior {
    #[default]
    CancelSelf,
    CancelIncoming,
}

pub struct FunctionalCommand {
    on_init: Box<dyn FnMut() -> Result>,
    on_execute: Box<dyn FnMut() -> Result>,
    on_end: Box<dyn FnMut(bool) -> Result>,
    is_finished: Box<dyn Fn() -> Result<bool>>,
    requirements: Vec<SubsystemRef>,
}

impl FunctionalCommand {
    pub fn new(
        on_init: impl FnMut() -> Result + 'static,
        on_execute: impl FnMut() -> Result + 'static,
        on_end: impl FnMut(bool) -> Result + 'static,
        is_finished: impl Fn() -> Result<bool> + 'static,
        requirements: Vec<SubsystemRef>,
    ) -> Self {
        Self {
            on_init: Box::new(on_init),
            on_execute: Box::new(on_execute),
            on_end: Box::new(on_end),
            is_finished: Box::new(is_finished),
            requirements,
        }
    }

    /// Runs `action` once on initialize and finishes immediately.
    pub fn instant(action: impl FnMut() -> Result + 'static, requirements: Vec<SubsystemRef>) -> Self {
        Self::new(action, || Ok(()), |_| Ok(()), || Ok(true), requirements)
    }

    /// Does nothing and finishes immediately.
    pub fn none() -> Self {
        Self::instant(|| Ok(()), Vec::new())
    }
}

impl Command for FunctionalCommand {
    fn requirements(&self) -> &[SubsystemRef] {
        &self.requirements
    }

    fn initialize(&mut self) -> Result {
        (self.on_init)()
    }

    fn execute(&mut self) -> Result {
        (self.on_execute)()
    }

    fn end(&mut self, interrupted: bool) -> Result {
        (self.on_end)(interrupted)
    }

    fn is_finished(&self) -> Result<bool> {
        (self.is_finished)()
    }
}

/// Finishes once the given time has passed on the robot clock.
pub struct WaitCommand {
    duration: Duration,
    started: Duration,
}

impl WaitCommand {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            started: Duration::ZERO,
        }
    }
}

impl Command for WaitCommand {
    fn requirements(&self) -> &[SubsystemRef] {
        &[]
    }

    fn initialize(&mut self) -> Result {
        self.started = clock::now();
        Ok(())
    }

    fn is_finished(&self) -> Result<bool> {
        Ok(clock::now().saturating_sub(self.started) >= self.duration)
    }

    fn runs_when_disabled(&self) -> bool {
        true
    }
}

/// Overrides the name, disabled behavior or interruption behavior of a command.
pub struct WrapperCommand<C> {
    inner: C,
    name: Option<String>,
    runs_when_disabled: Option<bool>,
    interruption_behavior: Option<InterruptionBehavior>,
}

impl<C: Command> WrapperCommand<C> {
    fn new(inner: C) -> Self {
        Self {
            inner,
            name: None,
            runs_when_disabled: None,
            interruption_behavior: None,
        }
    }
}

impl<C: Command> Command for WrapperCommand<C> {
    fn requirements(&self) -> &[SubsystemRef] {
        self.inner.requirements()
    }
    fn initialize(&mut self) -> Result {
        self.inner.initialize()
    }
    fn execute(&mut self) -> Result {
        self.inner.execute()
    }
    fn end(&mut self, interrupted: bool) -> Result {
        self.inner.end(interrupted)
    }
    fn is_finished(&self) -> Result<bool> {
        self.inner.is_finished()
    }
    fn runs_when_disabled(&self) -> bool {
        self.runs_when_disabled
            .unwrap_or_else(|| self.inner.runs_when_disabled())
    }
    fn interruption_behavior(&self) -> InterruptionBehavior {
        self.interruption_behavior
            .unwrap_or_else(|| self.inner.interruption_behavior())
    }
    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_else(|| self.inner.name())
    }
}

/// Ends the inner command when it finishes or when the timeout elapses.
pub struct TimeoutCommand<C> {
    inner: C,
    timeout: Duration,
    started: Duration,
}

impl<C: Command> Command for TimeoutCommand<C> {
    fn requirements(&self) -> &[SubsystemRef] {
        self.inner.requirements()
    }
    fn initialize(&mut self) -> Result {
        self.started = clock::now();
        self.inner.initialize()
    }
    fn execute(&mut self) -> Result {
        self.inner.execute()
    }
    fn end(&mut self, interrupted: bool) -> Result {
        let timed_out = clock::now().saturating_sub(self.started) >= self.timeout;
        self.inner.end(interrupted || timed_out)
    }
    fn is_finished(&self) -> Result<bool> {
        Ok(self.inner.is_finished()?
            || clock::now().saturating_sub(self.started) >= self.timeout)
    }
    fn runs_when_disabled(&self) -> bool {
        self.inner.runs_when_disabled()
    }
    fn interruption_behavior(&self) -> InterruptionBehavior {
        self.inner.interruption_behavior()
    }
    fn name(&self) -> &str {
        self.inner.name()
    }
}

/// Restarts the inner command every time it finishes.
pub struct RepeatCommand<C> {
    inner: C,
}

impl<C: Command> Command for RepeatCommand<C> {
    fn requirements(&self) -> &[SubsystemRef] {
        self.inner.requirements()
    }
    fn initialize(&mut self) -> Result {
        self.inner.initialize()
    }
    fn execute(&mut self) -> Result {
        self.inner.execute()?;
        if self.inner.is_finished()? {
            self.inner.end(false)?;
            self.inner.initialize()?;
        }
        Ok(())
    }
    fn end(&mut self, interrupted: bool) -> Result {
        self.inner.end(interrupted)
    }
    fn runs_when_disabled(&self) -> bool {
        self.inner.runs_when_disabled()
    }
    fn interruption_behavior(&self) -> InterruptionBehavior {
        self.inner.interruption_behavior()
    }
    fn name(&self) -> &str {
        self.inner.name()
    }
}

/// Decorators and compositions available on every command.
pub trait CommandExt: Command + Sized + 'static {
    fn with_name(self, name: impl Into<String>) -> WrapperCommand<Self> {
        let mut wrapper = WrapperCommand::new(self);
        wrapper.name = Some(name.into());
        wrapper
    }

    fn ignoring_disable(self, runs_when_disabled: bool) -> WrapperCommand<Self> {
        let mut wrapper = WrapperCommand::new(self);
        wrapper.runs_when_disabled = Some(runs_when_disabled);
        wrapper
    }

    fn with_interruption_behavior(self, behavior: InterruptionBehavior) -> WrapperCommand<Self> {
        let mut wrapper = WrapperCommand::new(self);
        wrapper.interruption_behavior = Some(behavior);
        wrapper
    }

    fn with_timeout(self, timeout: Duration) -> TimeoutCommand<Self> {
        TimeoutCommand {
            inner: self,
            timeout,
            started: Duration::ZERO,
        }
    }

    fn repeatedly(self) -> RepeatCommand<Self> {
        RepeatCommand { inner: self }
    }

    fn and_then(self, next: impl Command + 'static) -> SequentialCommandGroup {
        SequentialCommandGroup::new(vec![Box::new(self), Box::new(next)])
    }

    fn along_with(self, other: impl Command + 'static) -> Result<ParallelCommandGroup> {
        ParallelCommandGroup::new(vec![Box::new(self), Box::new(other)])
    }

    fn race_with(self, other: impl Command + 'static) -> Result<ParallelRaceGroup> {
        ParallelRaceGroup::new(vec![Box::new(self), Box::new(other)])
    }

    /// Runs `other` alongside this command, which acts as the deadline.
    fn deadline_with(self, other: impl Command + 'static) -> Result<ParallelDeadlineGroup> {
        ParallelDeadlineGroup::new(Box::new(self), vec![Box::new(other)])
    }
}

impl<C: Command + 'static> CommandExt for C {}

#[macro_export]
macro_rules! run {
    ($on_execute:block) => {
        $crate::command::FunctionalCommand::new(
            || Ok(()),
            move || $on_execute,
            |_| Ok(()),
            || Ok(false),
            ::std::vec![],
        )
    };
    ($on_execute:block, $($requirement:expr),+ $(,)?) => {
        $crate::command::FunctionalCommand::new(
            || Ok(()),
            move || $on_execute,
            |_| Ok(()),
            || Ok(false),
            ::std::vec![$($requirement),+],
        )
    };
}

#[macro_export]
macro_rules! run_once {
    ($on_init:block) => {
        $crate::command::FunctionalCommand::new(move || $on_init, || Ok(()), |_| Ok(()), || Ok(true), ::std::vec![])
    };
    ($on_init:block, $($requirement:expr),+ $(,)?) => {
        $crate::command::FunctionalCommand::new(
            move || $on_init,
            || Ok(()),
            |_| Ok(()),
            || Ok(true),
            ::std::vec![$($requirement),+],
        )
    };
}

#[macro_export]
macro_rules! start_end {
    ($start:block, $end:block) => {
        $crate::command::FunctionalCommand::new(move || $start, || Ok(()), move |_| $end, || Ok(false), ::std::vec![])
    };
    ($start:block, $end:block, $($requirement:expr),+ $(,)?) => {
        $crate::command::FunctionalCommand::new(
            move || $start,
            || Ok(()),
            move |_| $end,
            || Ok(false),
            ::std::vec![$($requirement),+],
        )
    };
}

#[macro_export]
macro_rules! run_end {
    ($execute:block, $end:block) => {
        $crate::command::FunctionalCommand::new(|| Ok(()), move || $execute, move |_| $end, || Ok(false), ::std::vec![])
    };
    ($execute:block, $end:block, $($requirement:expr),+ $(,)?) => {
        $crate::command::FunctionalCommand::new(
            || Ok(()),
            move || $execute,
            move |_| $end,
            || Ok(false),
            ::std::vec![$($requirement),+],
        )
    };
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use super::*;
    use crate::{clock, driver_station::{self, RobotMode}};

    #[test]
    fn wait_command_tracks_robot_clock() {
        let mut wait = WaitCommand::new(Duration::from_millis(100));
        wait.initialize().unwrap();
        assert!(!wait.is_finished().unwrap());
        clock::sim::advance(Duration::from_millis(60));
        assert!(!wait.is_finished().unwrap());
        clock::sim::advance(Duration::from_millis(40));
        assert!(wait.is_finished().unwrap());
    }

    #[test]
    fn timeout_interrupts_inner_command() {
        let interrupted = Rc::new(Cell::new(None));
        let inner = FunctionalCommand::new(
            || Ok(()),
            || Ok(()),
            {
                let interrupted = interrupted.clone();
                move |i| {
                    interrupted.set(Some(i));
                    Ok(())
                }
            },
            || Ok(false),
            vec![],
        );
        let mut command = inner.with_timeout(Duration::from_millis(40));
        command.initialize().unwrap();
        assert!(!command.is_finished().unwrap());
        clock::sim::advance(Duration::from_millis(40));
        assert!(command.is_finished().unwrap());
        command.end(false).unwrap();
        assert_eq!(interrupted.get(), Some(true));
    }

    #[test]
    fn wrapper_overrides_name_and_disabled_behavior() {
        let command = FunctionalCommand::none().with_name("Zero Gyro").ignoring_disable(true);
        assert_eq!(command.name(), "Zero Gyro");
        assert!(command.runs_when_disabled());
        assert_eq!(FunctionalCommand::none().name(), "FunctionalCommand");
    }

    #[test]
    fn repeated_command_restarts_when_finished() {
        driver_station::sim::set_mode(RobotMode::Teleop);
        let starts = Rc::new(Cell::new(0));
        let command = CommandRef::from(
            FunctionalCommand::instant(
                {
                    let starts = starts.clone();
                    move || {
                        starts.set(starts.get() + 1);
                        Ok(())
                    }
                },
                vec![],
            )
            .repeatedly(),
        );
        command.schedule().unwrap();
        CommandScheduler::run().unwrap();
        CommandScheduler::run().unwrap();
        assert!(command.is_scheduled());
        assert_eq!(starts.get(), 3);
    }
}
