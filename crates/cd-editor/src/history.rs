//! Undo/Redo history.
//!
//! Strictly linear: executing or recording a new command drops everything
//! that could have been redone.

use crate::commands::Command;
use cd_core::model::Diagram;

#[derive(Debug, Default)]
pub struct CommandManager {
    undo_stack: Vec<Command>,
    redo_stack: Vec<Command>,
    /// Maximum undo depth; `None` keeps everything.
    limit: Option<usize>,
}

impl CommandManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// History that forgets its oldest entry once `limit` is exceeded.
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// Run `command` and make it the newest undo step.
    pub fn execute(&mut self, diagram: &mut Diagram, mut command: Command) {
        log::debug!("execute: {}", command.description());
        command.execute(diagram);
        self.push(command);
    }

    /// Record a command whose effect is already applied (a live drag).
    /// Its `execute` must be idempotent with the current state, since redo
    /// will run it.
    pub fn push_without_executing(&mut self, command: Command) {
        log::debug!("record: {}", command.description());
        self.push(command);
    }

    fn push(&mut self, command: Command) {
        self.undo_stack.push(command);
        if let Some(limit) = self.limit {
            while self.undo_stack.len() > limit {
                self.undo_stack.remove(0);
            }
        }
        self.redo_stack.clear();
    }

    /// Undo the newest command. Returns its description, or `None` when
    /// there is nothing to undo.
    pub fn undo(&mut self, diagram: &mut Diagram) -> Option<String> {
        let mut command = self.undo_stack.pop()?;
        let desc = command.description();
        log::debug!("undo: {desc}");
        command.undo(diagram);
        self.redo_stack.push(command);
        Some(desc)
    }

    /// Re-run the most recently undone command.
    pub fn redo(&mut self, diagram: &mut Diagram) -> Option<String> {
        let mut command = self.redo_stack.pop()?;
        let desc = command.description();
        log::debug!("redo: {desc}");
        command.execute(diagram);
        self.undo_stack.push(command);
        Some(desc)
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Label of the step `undo` would revert.
    pub fn undo_description(&self) -> Option<String> {
        self.undo_stack.last().map(Command::description)
    }

    pub fn redo_description(&self) -> Option<String> {
        self.redo_stack.last().map(Command::description)
    }
}
