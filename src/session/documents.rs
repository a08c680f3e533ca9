use super::{Session, TRACING_TARGET};
use crate::action::{Action, Command, Diagnostics};
use crate::error::LoadError;
use crate::graph::{Graph, NodeId, Selection};
use crate::io::{self, NodeDocument, PasteContext, PastePlan};
use crate::value::TypedValue;
use serde_json::Value as JsonValue;
use std::fs;
use std::path::Path;

/// What a paste or import did: its diagnostics and the nodes it created.
#[derive(Debug, Clone, Default)]
pub struct PasteOutcome {
    pub diagnostics: Diagnostics,
    pub selection: Selection,
}

impl Session {
    fn paste_context(&self) -> PasteContext<'_> {
        PasteContext {
            metadata: &self.metadata,
            values: &self.values,
            resolver: &*self.resolver,
            policy: self.config.connection_policy,
        }
    }

    fn apply_plan(&mut self, plan: PastePlan, halt_on_error: bool) -> PasteOutcome {
        let PastePlan {
            action,
            mut diagnostics,
            ids,
        } = plan;
        if !action.is_empty() {
            diagnostics.append(self.execute_with(action, halt_on_error));
        }
        let selection = ids
            .into_iter()
            .filter(|id| self.graph.find_node(*id).is_some())
            .collect();
        PasteOutcome {
            diagnostics,
            selection,
        }
    }

    /// The graph a selection lives in: the root graph when empty, otherwise the graph
    /// directly containing its first node.
    fn scope_of(&self, selection: &Selection) -> &Graph {
        selection
            .iter()
            .next()
            .and_then(|id| self.graph.owner_of(id))
            .unwrap_or(&self.graph)
    }

    /// Serializes the selection, or the whole root graph for an empty selection.
    pub fn to_document(&self, selection: &Selection) -> NodeDocument {
        io::write_graph(self.scope_of(selection), selection)
    }

    /// Recreates `document` inside `network` as one action.
    pub fn paste_document(
        &mut self,
        network: Option<NodeId>,
        document: &NodeDocument,
    ) -> Result<PasteOutcome, LoadError> {
        let plan = self.paste_context().plan(network, document)?;
        let halt_on_error = self.config.halt_on_error;
        Ok(self.apply_plan(plan, halt_on_error))
    }

    /// Pastes a JSON document given as text.
    pub fn paste(
        &mut self,
        network: Option<NodeId>,
        content: &str,
    ) -> Result<PasteOutcome, LoadError> {
        let document = NodeDocument::from_json_str(content)?;
        self.paste_document(network, &document)
    }

    /// Pastes a JSON document given as a value.
    pub fn from_json(
        &mut self,
        network: Option<NodeId>,
        json: &JsonValue,
    ) -> Result<PasteOutcome, LoadError> {
        let document: NodeDocument = serde_json::from_value(json.clone())?;
        self.paste_document(network, &document)
    }

    /// Stores the serialized selection in the session clipboard and returns it.
    pub fn copy(&mut self, selection: &Selection) -> Result<String, serde_json::Error> {
        let content = self.to_document(selection).to_json_string()?;
        self.clipboard = Some(content.clone());
        Ok(content)
    }

    /// Copies the selection, then removes it as one action.
    pub fn cut(&mut self, selection: &Selection) -> Result<Diagnostics, serde_json::Error> {
        self.copy(selection)?;
        Ok(self.remove(selection))
    }

    pub fn clipboard(&self) -> Option<&str> {
        self.clipboard.as_deref()
    }

    /// Pastes the clipboard content. Does nothing if the clipboard is empty.
    pub fn paste_clipboard(&mut self, network: Option<NodeId>) -> Result<PasteOutcome, LoadError> {
        match self.clipboard.clone() {
            Some(content) => self.paste(network, &content),
            None => Ok(PasteOutcome::default()),
        }
    }

    /// Creates a network node whose content is read from the document at `path`.
    ///
    /// The network remembers `path` as its source. Runs as one action without halting on
    /// errors; the outcome's selection holds just the new network node.
    pub fn import_network(
        &mut self,
        network: Option<NodeId>,
        path: &str,
        name: &str,
        blind_data: TypedValue,
    ) -> Result<PasteOutcome, LoadError> {
        let id = NodeId::mint();
        let mut plan = self.paste_context().plan_import(id, path)?;

        let mut action = Action::single(Command::create_node(
            network,
            id,
            self.metadata.network(),
            name,
            blind_data,
        ));
        action.append(std::mem::take(&mut plan.action));
        plan.action = action;

        tracing::info!(target: TRACING_TARGET, path, node_id = %id, "Importing network");
        Ok(self.apply_plan(plan, false))
    }

    /// Writes the root graph to `path` as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), LoadError> {
        let path = path.as_ref();
        let content = self.to_document(&Selection::new()).to_json_string()?;
        fs::write(path, content).map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        tracing::info!(target: TRACING_TARGET, path = %path.display(), "Saved document");
        Ok(())
    }

    /// Replaces the root graph with the document at `path`.
    ///
    /// The graph and the history are cleared; the load itself is not undoable. On error the
    /// session is left unchanged.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<Diagnostics, LoadError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let document = NodeDocument::from_json_str(&content)?;
        let diagnostics = self.replace_with(&document)?;
        tracing::info!(
            target: TRACING_TARGET,
            path = %path.display(),
            nodes = self.graph.total_len(),
            diagnostics = diagnostics.len(),
            "Loaded document"
        );
        Ok(diagnostics)
    }

    /// Replaces the root graph with `document`, leaving an empty history.
    pub fn replace_with(&mut self, document: &NodeDocument) -> Result<Diagnostics, LoadError> {
        let plan = self.paste_context().plan(None, document)?;
        self.graph.clear();
        self.undo_stack.clear();
        let halt_on_error = self.config.halt_on_error;
        let outcome = self.apply_plan(plan, halt_on_error);
        self.undo_stack.clear();
        Ok(outcome.diagnostics)
    }
}
