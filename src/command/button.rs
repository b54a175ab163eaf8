use std::{cell::RefCell, rc::Rc, time::Duration};

use log::error;

use super::CommandRefExt;
use crate::{
    event::{BooleanEvent, EventLoop},
    CommandRef, CommandScheduler,
};

/// What a binding does to its command on an edge of the condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Schedule,
    Cancel,
    Toggle,
}

impl Action {
    fn apply(self, command: &CommandRef) {
        let (verb, res) = match self {
            Action::Schedule => ("schedule", command.schedule()),
            Action::Cancel => ("cancel", command.cancel()),
            Action::Toggle if command.is_scheduled() => ("cancel", command.cancel()),
            Action::Toggle => ("schedule", command.schedule()),
        };
        if let Err(err) = res {
            error!("failed to {verb} {}: {err}", command.name());
        }
    }
}

/// A boolean condition that schedules commands when it changes.
pub struct Trigger {
    event_loop: Rc<RefCell<EventLoop>>,
    condition: Rc<dyn Fn() -> bool>,
}

impl Trigger {
    pub fn new_with_loop(
        event_loop: Rc<RefCell<EventLoop>>,
        condition: impl Fn() -> bool + 'static,
    ) -> Self {
        Self {
            event_loop,
            condition: Rc::new(condition),
        }
    }

    /// A trigger polled by the scheduler's button loop.
    pub fn new(condition: impl Fn() -> bool + 'static) -> Self {
        Self::new_with_loop(CommandScheduler::button_event_loop(), condition)
    }

    /// Binds `command` to the condition's edges. The condition is sampled
    /// now, so a trigger that is already held does not fire on the first poll.
    fn bind(self, command: impl Into<CommandRef>, rising: Option<Action>, falling: Option<Action>) -> Self {
        let command = command.into();
        let condition = self.condition.clone();
        let mut previous = condition();
        self.event_loop.borrow_mut().bind(move || {
            let present = condition();
            let action = match (previous, present) {
                (false, true) => rising,
                (true, false) => falling,
                _ => None,
            };
            if let Some(action) = action {
                action.apply(&command);
            }
            previous = present;
        });
        self
    }

    pub fn on_true(self, command: impl Into<CommandRef>) -> Self {
        self.bind(command, Some(Action::Schedule), None)
    }

    pub fn on_false(self, command: impl Into<CommandRef>) -> Self {
        self.bind(command, None, Some(Action::Schedule))
    }

    /// Schedules on press and cancels on release.
    pub fn while_true(self, command: impl Into<CommandRef>) -> Self {
        self.bind(command, Some(Action::Schedule), Some(Action::Cancel))
    }

    pub fn while_false(self, command: impl Into<CommandRef>) -> Self {
        self.bind(command, Some(Action::Cancel), Some(Action::Schedule))
    }

    pub fn toggle_on_true(self, command: impl Into<CommandRef>) -> Self {
        self.bind(command, Some(Action::Toggle), None)
    }

    pub fn toggle_on_false(self, command: impl Into<CommandRef>) -> Self {
        self.bind(command, None, Some(Action::Toggle))
    }

    pub fn is_active(&self) -> bool {
        (self.condition)()
    }

    fn derive(&self, condition: impl Fn() -> bool + 'static) -> Self {
        Self::new_with_loop(self.event_loop.clone(), condition)
    }

    pub fn and(&self, other: &Self) -> Self {
        let (a, b) = (self.condition.clone(), other.condition.clone());
        self.derive(move || a() && b())
    }

    pub fn or(&self, other: &Self) -> Self {
        let (a, b) = (self.condition.clone(), other.condition.clone());
        self.derive(move || a() || b())
    }

    pub fn negate(&self) -> Self {
        let condition = self.condition.clone();
        self.derive(move || !condition())
    }

    /// Active once the condition has held for `hold`.
    pub fn debounce(&self, hold: Duration) -> Self {
        let condition = self.condition.clone();
        BooleanEvent::new(self.event_loop.clone(), move || condition())
            .debounce(hold)
            .into()
    }
}
