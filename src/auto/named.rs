use std::{cell::RefCell, rc::Rc};

use hashbrown::HashMap;
use log::{debug, warn};

use crate::command::{Command, CommandExt, FunctionalCommand};

type Factory = Rc<dyn Fn() -> Box<dyn Command>>;

thread_local! {
    static REGISTRY: RefCell<HashMap<String, Factory>> = RefCell::new(HashMap::new());
}

/// Commands that autonomous routines refer to by name.
///
/// A name maps to a factory, so every reference in a routine gets its own
/// command instance.
pub struct NamedCommands;

impl NamedCommands {
    /// Registers `factory` under `name`, replacing any earlier registration.
    pub fn register_command<C>(name: impl Into<String>, factory: impl Fn() -> C + 'static)
    where
        C: Command + 'static,
    {
        let name = name.into();
        debug!("registering named command {name}");
        let factory: Factory = Rc::new(move || Box::new(factory()) as Box<dyn Command>);
        REGISTRY.with(|registry| registry.borrow_mut().insert(name, factory));
    }

    pub fn has_command(name: &str) -> bool {
        REGISTRY.with(|registry| registry.borrow().contains_key(name))
    }

    /// Builds the command registered under `name`. Unknown names build a
    /// command that does nothing.
    pub fn get_command(name: &str) -> Box<dyn Command> {
        let factory = REGISTRY.with(|registry| registry.borrow().get(name).cloned());
        match factory {
            Some(factory) => Box::new(factory().with_name(name)),
            None => {
                warn!("named command {name} is not registered; it will do nothing");
                Box::new(FunctionalCommand::none().with_name(name))
            }
        }
    }

    /// Registered names, sorted.
    pub fn names() -> Vec<String> {
        let mut names = REGISTRY.with(|registry| registry.borrow().keys().cloned().collect::<Vec<_>>());
        names.sort();
        names
    }

    pub fn clear() {
        REGISTRY.with(|registry| registry.borrow_mut().clear());
    }
}
