use super::{Action, Diagnostics};
use crate::error::GraphError;
use crate::graph::Graph;

const TRACING_TARGET: &str = "renketsu::action";

/// Linear undo/redo history of executed actions.
///
/// `history[..position]` is the undoable part, `history[position..]` the redoable tail.
/// Executing a new action drops the redoable tail.
#[derive(Debug, Default)]
pub struct UndoStack {
    history: Vec<Action>,
    position: usize,
    limit: Option<usize>,
}

impl UndoStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// A stack that keeps at most `limit` actions, dropping the oldest first.
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// Runs every command of `action` in order and records the result.
    ///
    /// With `halt_on_error`, the first failing command stops the action. Commands that
    /// already ran are **not** rolled back: execution is best-effort, not atomic. Whatever did
    /// apply is pushed to the history as one entry, so a single [`UndoStack::undo`] reverts
    /// exactly that. Failures are reported as error diagnostics.
    pub fn execute(&mut self, graph: &mut Graph, action: Action, halt_on_error: bool) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        let total = action.len();
        let mut applied = Vec::with_capacity(total);

        for mut step in action.into_steps() {
            match step.command.apply(graph) {
                Ok(()) => {
                    tracing::trace!(target: TRACING_TARGET, label = %step.label, "Applied command");
                    applied.push(step);
                }
                Err(e) => {
                    tracing::warn!(
                        target: TRACING_TARGET,
                        label = %step.label,
                        error = %e,
                        "Command failed"
                    );
                    diagnostics.add_error(format!("{}: {}", step.label, e));
                    if halt_on_error {
                        break;
                    }
                }
            }
        }

        tracing::debug!(
            target: TRACING_TARGET,
            applied = applied.len(),
            total,
            "Executed action"
        );

        if !applied.is_empty() {
            self.history.truncate(self.position);
            self.history.push(Action::from_steps(applied));
            self.position += 1;
            self.enforce_limit();
        }

        diagnostics
    }

    fn enforce_limit(&mut self) {
        let Some(limit) = self.limit else {
            return;
        };
        let excess = self.history.len().saturating_sub(limit);
        if excess > 0 {
            self.history.drain(..excess);
            self.position = self.position.saturating_sub(excess);
        }
    }

    /// Reverts the action at the cursor, running its commands back-to-front.
    /// Returns `false` if there is nothing to undo.
    ///
    /// If a command fails to revert, the commands already reverted are applied again and the
    /// cursor does not move, so the entry stays whole.
    pub fn undo(&mut self, graph: &mut Graph) -> Result<bool, GraphError> {
        if self.position == 0 {
            return Ok(false);
        }
        let steps = self.history[self.position - 1].steps_mut();
        for index in (0..steps.len()).rev() {
            if let Err(e) = steps[index].command.revert(graph) {
                tracing::warn!(
                    target: TRACING_TARGET,
                    label = %steps[index].label,
                    error = %e,
                    "Undo failed"
                );
                for step in &mut steps[index + 1..] {
                    let _ = step.command.apply(graph);
                }
                return Err(e);
            }
        }
        tracing::debug!(target: TRACING_TARGET, steps = steps.len(), "Undid action");
        self.position -= 1;
        Ok(true)
    }

    /// Re-applies the next undone action. Returns `false` if there is nothing to redo.
    ///
    /// A failing command reverts the ones already re-applied; the cursor stays put.
    pub fn redo(&mut self, graph: &mut Graph) -> Result<bool, GraphError> {
        if self.position == self.history.len() {
            return Ok(false);
        }
        let steps = self.history[self.position].steps_mut();
        for index in 0..steps.len() {
            if let Err(e) = steps[index].command.apply(graph) {
                tracing::warn!(
                    target: TRACING_TARGET,
                    label = %steps[index].label,
                    error = %e,
                    "Redo failed"
                );
                for step in steps[..index].iter_mut().rev() {
                    let _ = step.command.revert(graph);
                }
                return Err(e);
            }
        }
        tracing::debug!(target: TRACING_TARGET, steps = steps.len(), "Redid action");
        self.position += 1;
        Ok(true)
    }

    pub fn can_undo(&self) -> bool {
        self.position > 0
    }

    pub fn can_redo(&self) -> bool {
        self.position < self.history.len()
    }

    /// Number of recorded actions, undone ones included.
    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Index of the cursor: the number of currently applied actions.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn history(&self) -> &[Action] {
        &self.history
    }

    pub fn clear(&mut self) {
        self.history.clear();
        self.position = 0;
    }
}
