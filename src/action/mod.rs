//! Transactional graph mutation.
//!
//! An [`Action`] is an ordered list of labelled [`Command`]s. Actions compose by appending,
//! which concatenates their steps and never reorders them. The [`UndoStack`] is the only
//! path through which a session's graph is mutated: it runs an action's commands in order,
//! records it in a linear history and reverts it back-to-front on undo.

mod command;
mod diagnostics;
mod undo_stack;

pub use command::{Command, ValueSource};
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use undo_stack::UndoStack;

/// One labelled command inside an action.
#[derive(Debug, Clone)]
pub struct Step {
    pub label: String,
    pub command: Command,
}

/// An ordered, composable batch of invertible commands, applied as one undo step.
#[derive(Debug, Clone, Default)]
pub struct Action {
    steps: Vec<Step>,
}

impl Action {
    pub fn new() -> Self {
        Self::default()
    }

    /// An action holding a single command labelled with its description.
    pub fn single(command: Command) -> Self {
        let mut action = Self::new();
        action.push(command);
        action
    }

    pub fn add_command(&mut self, label: impl Into<String>, command: Command) {
        self.steps.push(Step {
            label: label.into(),
            command,
        });
    }

    /// Adds a command labelled with its own description.
    pub fn push(&mut self, command: Command) {
        let label = command.description();
        self.add_command(label, command);
    }

    /// Appends all steps of `other` after the steps of `self`.
    pub fn append(&mut self, other: Action) {
        self.steps.extend(other.steps);
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|s| s.label.as_str())
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub(crate) fn steps_mut(&mut self) -> &mut [Step] {
        &mut self.steps
    }

    pub(crate) fn into_steps(self) -> Vec<Step> {
        self.steps
    }

    pub(crate) fn from_steps(steps: Vec<Step>) -> Self {
        Self { steps }
    }
}
