//! Commands built out of other commands.
//!
//! A composition owns its children outright; the scheduler only ever sees the
//! composition, which requires the union of its children's requirements.

use hashbrown::HashSet;

use super::{Command, InterruptionBehavior};
use crate::{CommandError, Result, SubsystemRef};

fn union_requirements(commands: &[Box<dyn Command>]) -> Vec<SubsystemRef> {
    let mut seen = HashSet::new();
    let mut requirements = Vec::new();
    for requirement in commands.iter().flat_map(|c| c.requirements()) {
        if seen.insert(requirement.clone()) {
            requirements.push(requirement.clone());
        }
    }
    requirements
}

fn disjoint_requirements(commands: &[Box<dyn Command>]) -> Result<Vec<SubsystemRef>> {
    let mut seen = HashSet::new();
    for requirement in commands.iter().flat_map(|c| c.requirements()) {
        if !seen.insert(requirement.clone()) {
            return Err(CommandError::ConflictingRequirements {
                subsystem: requirement.name(),
            });
        }
    }
    Ok(union_requirements(commands))
}

fn all_run_when_disabled(commands: &[Box<dyn Command>]) -> bool {
    commands.iter().all(|c| c.runs_when_disabled())
}

fn combined_interruption_behavior(commands: &[Box<dyn Command>]) -> InterruptionBehavior {
    if commands
        .iter()
        .any(|c| c.interruption_behavior() == InterruptionBehavior::CancelIncoming)
    {
        InterruptionBehavior::CancelIncoming
    } else {
        InterruptionBehavior::CancelSelf
    }
}

/// Runs commands one after another.
pub struct SequentialCommandGroup {
    commands: Vec<Box<dyn Command>>,
    requirements: Vec<SubsystemRef>,
    current: usize,
}

impl SequentialCommandGroup {
    pub fn new(commands: Vec<Box<dyn Command>>) -> Self {
        Self {
            requirements: union_requirements(&commands),
            current: commands.len(),
            commands,
        }
    }
}

impl Command for SequentialCommandGroup {
    fn requirements(&self) -> &[SubsystemRef] {
        &self.requirements
    }

    fn initialize(&mut self) -> Result {
        self.current = 0;
        if let Some(first) = self.commands.first_mut() {
            first.initialize()?;
        }
        Ok(())
    }

    fn execute(&mut self) -> Result {
        let Some(command) = self.commands.get_mut(self.current) else {
            return Ok(());
        };
        command.execute()?;
        if command.is_finished()? {
            command.end(false)?;
            self.current += 1;
            if let Some(next) = self.commands.get_mut(self.current) {
                next.initialize()?;
            }
        }
        Ok(())
    }

    fn end(&mut self, interrupted: bool) -> Result {
        if interrupted {
            if let Some(command) = self.commands.get_mut(self.current) {
                command.end(true)?;
            }
        }
        self.current = self.commands.len();
        Ok(())
    }

    fn is_finished(&self) -> Result<bool> {
        Ok(self.current >= self.commands.len())
    }

    fn runs_when_disabled(&self) -> bool {
        all_run_when_disabled(&self.commands)
    }

    fn interruption_behavior(&self) -> InterruptionBehavior {
        combined_interruption_behavior(&self.commands)
    }
}

/// Runs commands together and finishes once all of them have finished.
pub struct ParallelCommandGroup {
    commands: Vec<Box<dyn Command>>,
    running: Vec<bool>,
    requirements: Vec<SubsystemRef>,
}

impl ParallelCommandGroup {
    pub fn new(commands: Vec<Box<dyn Command>>) -> Result<Self> {
        Ok(Self {
            requirements: disjoint_requirements(&commands)?,
            running: vec![false; commands.len()],
            commands,
        })
    }
}

impl Command for ParallelCommandGroup {
    fn requirements(&self) -> &[SubsystemRef] {
        &self.requirements
    }

    fn initialize(&mut self) -> Result {
        for (command, running) in self.commands.iter_mut().zip(&mut self.running) {
            command.initialize()?;
            *running = true;
        }
        Ok(())
    }

    fn execute(&mut self) -> Result {
        for (command, running) in self.commands.iter_mut().zip(&mut self.running) {
            if !*running {
                continue;
            }
            command.execute()?;
            if command.is_finished()? {
                command.end(false)?;
                *running = false;
            }
        }
        Ok(())
    }

    fn end(&mut self, interrupted: bool) -> Result {
        for (command, running) in self.commands.iter_mut().zip(&mut self.running) {
            if *running && interrupted {
                command.end(true)?;
            }
            *running = false;
        }
        Ok(())
    }

    fn is_finished(&self) -> Result<bool> {
        Ok(!self.running.contains(&true))
    }

    fn runs_when_disabled(&self) -> bool {
        all_run_when_disabled(&self.commands)
    }

    fn interruption_behavior(&self) -> InterruptionBehavior {
        combined_interruption_behavior(&self.commands)
    }
}

/// Runs commands together and finishes as soon as any one of them finishes.
pub struct ParallelRaceGroup {
    commands: Vec<Box<dyn Command>>,
    requirements: Vec<SubsystemRef>,
    finished: bool,
}

impl ParallelRaceGroup {
    pub fn new(commands: Vec<Box<dyn Command>>) -> Result<Self> {
        Ok(Self {
            requirements: disjoint_requirements(&commands)?,
            commands,
            finished: false,
        })
    }
}

impl Command for ParallelRaceGroup {
    fn requirements(&self) -> &[SubsystemRef] {
        &self.requirements
    }

    fn initialize(&mut self) -> Result {
        self.finished = false;
        for command in &mut self.commands {
            command.initialize()?;
        }
        Ok(())
    }

    fn execute(&mut self) -> Result {
        for command in &mut self.commands {
            command.execute()?;
            if command.is_finished()? {
                self.finished = true;
            }
        }
        Ok(())
    }

    fn end(&mut self, _interrupted: bool) -> Result {
        for command in &mut self.commands {
            let interrupted = !command.is_finished()?;
            command.end(interrupted)?;
        }
        Ok(())
    }

    fn is_finished(&self) -> Result<bool> {
        Ok(self.finished || self.commands.is_empty())
    }

    fn runs_when_disabled(&self) -> bool {
        all_run_when_disabled(&self.commands)
    }

    fn interruption_behavior(&self) -> InterruptionBehavior {
        combined_interruption_behavior(&self.commands)
    }
}

/// Runs commands together until the first one, the deadline, finishes.
pub struct ParallelDeadlineGroup {
    commands: Vec<Box<dyn Command>>,
    running: Vec<bool>,
    requirements: Vec<SubsystemRef>,
}

impl ParallelDeadlineGroup {
    pub fn new(deadline: Box<dyn Command>, others: Vec<Box<dyn Command>>) -> Result<Self> {
        let mut commands = Vec::with_capacity(others.len() + 1);
        commands.push(deadline);
        commands.extend(others);
        Ok(Self {
            requirements: disjoint_requirements(&commands)?,
            running: vec![false; commands.len()],
            commands,
        })
    }
}

impl Command for ParallelDeadlineGroup {
    fn requirements(&self) -> &[SubsystemRef] {
        &self.requirements
    }

    fn initialize(&mut self) -> Result {
        for (command, running) in self.commands.iter_mut().zip(&mut self.running) {
            command.initialize()?;
            *running = true;
        }
        Ok(())
    }

    fn execute(&mut self) -> Result {
        for (command, running) in self.commands.iter_mut().zip(&mut self.running) {
            if !*running {
                continue;
            }
            command.execute()?;
            if command.is_finished()? {
                command.end(false)?;
                *running = false;
            }
        }
        Ok(())
    }

    fn end(&mut self, _interrupted: bool) -> Result {
        for (command, running) in self.commands.iter_mut().zip(&mut self.running) {
            if *running {
                command.end(true)?;
            }
            *running = false;
        }
        Ok(())
    }

    fn is_finished(&self) -> Result<bool> {
        Ok(!self.running[0])
    }

    fn runs_when_disabled(&self) -> bool {
        all_run_when_disabled(&self.commands)
    }

    fn interruption_behavior(&self) -> InterruptionBehavior {
        combined_interruption_behavior(&self.commands)
    }
}
