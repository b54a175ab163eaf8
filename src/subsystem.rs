use std::{cell::RefCell, fmt::Debug, rc::Rc};

use crate::{
    command::FunctionalCommand, run, run_end, run_once, start_end, CommandScheduler, SubsystemRef,
};

/// A collection of robot parts and other hardware that act together as a whole.
pub trait Subsystem: Debug {
    fn name(&self) -> &str {
        let full = core::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }

    /// This method will be called once per scheduler run
    fn periodic(&mut self) {}
    /// This method will be called once per scheduler run, but only during simulation
    fn sim_periodic(&mut self) {}

    fn register(self) -> Rc<RefCell<Self>>
    where
        Self: Sized + 'static,
    {
        CommandScheduler::register(self)
    }
}

/// Command factories for a shared subsystem. Every command produced here
/// requires the subsystem and lends it to the closure each time it runs.
pub trait SubsystemRefExt<T> {
    /// Runs `action` once and finishes.
    fn run_once(&self, action: impl FnMut(&mut T) + 'static) -> FunctionalCommand;
    /// Runs `action` every loop until interrupted.
    fn run(&self, action: impl FnMut(&mut T) + 'static) -> FunctionalCommand;
    fn start_end(
        &self,
        start: impl FnMut(&mut T) + 'static,
        end: impl FnMut(&mut T) + 'static,
    ) -> FunctionalCommand;
    fn run_end(
        &self,
        run: impl FnMut(&mut T) + 'static,
        end: impl FnMut(&mut T) + 'static,
    ) -> FunctionalCommand;
}

impl<T> SubsystemRefExt<T> for Rc<RefCell<T>>
where
    T: Subsystem + 'static,
{
    fn run_once(&self, mut action: impl FnMut(&mut T) + 'static) -> FunctionalCommand {
        let subsystem = self.clone();
        run_once!(
            {
                action(&mut subsystem.borrow_mut());
                Ok(())
            },
            SubsystemRef::of(self)
        )
    }

    fn run(&self, mut action: impl FnMut(&mut T) + 'static) -> FunctionalCommand {
        let subsystem = self.clone();
        run!(
            {
                action(&mut subsystem.borrow_mut());
                Ok(())
            },
            SubsystemRef::of(self)
        )
    }

    fn start_end(
        &self,
        mut start: impl FnMut(&mut T) + 'static,
        mut end: impl FnMut(&mut T) + 'static,
    ) -> FunctionalCommand {
        let (on_start, on_end) = (self.clone(), self.clone());
        start_end!(
            {
                start(&mut on_start.borrow_mut());
                Ok(())
            },
            {
                end(&mut on_end.borrow_mut());
                Ok(())
            },
            SubsystemRef::of(self)
        )
    }

    fn run_end(
        &self,
        mut run: impl FnMut(&mut T) + 'static,
        mut end: impl FnMut(&mut T) + 'static,
    ) -> FunctionalCommand {
        let (on_run, on_end) = (self.clone(), self.clone());
        run_end!(
            {
                run(&mut on_run.borrow_mut());
                Ok(())
            },
            {
                end(&mut on_end.borrow_mut());
                Ok(())
            },
            SubsystemRef::of(self)
        )
    }
}
