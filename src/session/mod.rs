//! The editing session: one root graph, its undo history and the registries it is read
//! against.
//!
//! Every mutating operation of a [`Session`] builds exactly one [`Action`] and runs it
//! through the session's [`UndoStack`], so each operation is one undo step. Operations
//! report failed commands as [`Diagnostics`] instead of returning early; whatever part of
//! an action did apply stays applied and stays undoable.

use crate::action::{Action, Command, Diagnostics, UndoStack, ValueSource};
use crate::error::{EvaluationError, GraphError};
use crate::evaluator;
use crate::graph::{Graph, MetadataHandle, MetadataRegistry, NodeId, Port, PortRef, Selection};
use crate::io::{FsResolver, SourceResolver};
use crate::value::{PortValue, Position, TypedValue, ValueRegistry};

mod config;
mod documents;

pub use config::SessionConfig;
pub use documents::PasteOutcome;

const TRACING_TARGET: &str = "renketsu::session";

pub struct Session {
    graph: Graph,
    undo_stack: UndoStack,
    metadata: MetadataRegistry,
    values: ValueRegistry,
    resolver: Box<dyn SourceResolver>,
    config: SessionConfig,
    clipboard: Option<String>,
}

pub struct SessionBuilder {
    metadata: MetadataRegistry,
    values: ValueRegistry,
    config: SessionConfig,
    resolver: Option<Box<dyn SourceResolver>>,
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self {
            metadata: MetadataRegistry::new(),
            values: ValueRegistry::with_defaults(),
            config: SessionConfig::default(),
            resolver: None,
        }
    }

    pub fn with_metadata(mut self, metadata: MetadataHandle) -> Self {
        self.metadata.register(metadata);
        self
    }

    pub fn with_value_type<T: PortValue>(mut self) -> Self {
        self.values.register::<T>();
        self
    }

    /// Replaces both registries wholesale.
    pub fn with_registries(mut self, metadata: MetadataRegistry, values: ValueRegistry) -> Self {
        self.metadata = metadata;
        self.values = values;
        self
    }

    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Overrides how network `source` references are read. Defaults to the filesystem,
    /// rooted at [`SessionConfig::source_root`].
    pub fn with_resolver(mut self, resolver: impl SourceResolver + 'static) -> Self {
        self.resolver = Some(Box::new(resolver));
        self
    }

    pub fn build(self) -> Session {
        let resolver: Box<dyn SourceResolver> = match self.resolver {
            Some(resolver) => resolver,
            None => Box::new(FsResolver::new(self.config.source_root.clone())),
        };
        Session {
            graph: Graph::new(),
            undo_stack: UndoStack::with_limit(self.config.history_limit),
            metadata: self.metadata,
            values: self.values,
            resolver,
            config: self.config,
            clipboard: None,
        }
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    /// The root graph.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn undo_stack(&self) -> &UndoStack {
        &self.undo_stack
    }

    pub fn metadata(&self) -> &MetadataRegistry {
        &self.metadata
    }

    pub fn values(&self) -> &ValueRegistry {
        &self.values
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Runs `action` with the configured halt-on-error mode.
    pub fn execute(&mut self, action: Action) -> Diagnostics {
        self.execute_with(action, self.config.halt_on_error)
    }

    pub fn execute_with(&mut self, action: Action, halt_on_error: bool) -> Diagnostics {
        self.undo_stack
            .execute(&mut self.graph, action, halt_on_error)
    }

    pub fn undo(&mut self) -> Result<bool, GraphError> {
        let undone = self.undo_stack.undo(&mut self.graph)?;
        tracing::debug!(target: TRACING_TARGET, undone, "Undo");
        Ok(undone)
    }

    pub fn redo(&mut self) -> Result<bool, GraphError> {
        let redone = self.undo_stack.redo(&mut self.graph)?;
        tracing::debug!(target: TRACING_TARGET, redone, "Redo");
        Ok(redone)
    }

    /// Creates a node inside `network` (the root graph for `None`) and returns its id.
    pub fn create_node(
        &mut self,
        network: Option<NodeId>,
        metadata: &MetadataHandle,
        name: &str,
        blind_data: TypedValue,
    ) -> Result<NodeId, Diagnostics> {
        let id = NodeId::mint();
        let command = Command::create_node(network, id, metadata.clone(), name, blind_data);
        let diagnostics = self.execute(Action::single(command));
        if diagnostics.errored() {
            Err(diagnostics)
        } else {
            Ok(id)
        }
    }

    /// Creates an empty network node.
    pub fn create_network(
        &mut self,
        network: Option<NodeId>,
        name: &str,
    ) -> Result<NodeId, Diagnostics> {
        let metadata = self.metadata.network();
        self.create_node(network, &metadata, name, TypedValue::empty())
    }

    pub fn remove_node(&mut self, id: NodeId) -> Diagnostics {
        self.execute(Action::single(Command::remove_node(id)))
    }

    /// Removes every selected node as one action. Nodes nested in a selected network go
    /// with it.
    pub fn remove(&mut self, selection: &Selection) -> Diagnostics {
        let mut action = Action::new();
        for id in selection.iter() {
            if !self.has_selected_ancestor(id, selection) {
                action.push(Command::remove_node(id));
            }
        }
        if action.is_empty() {
            return Diagnostics::new();
        }
        self.execute(action)
    }

    fn has_selected_ancestor(&self, mut id: NodeId, selection: &Selection) -> bool {
        while let Some(Some(parent)) = self.graph.parent_of(id) {
            if selection.contains(parent) {
                return true;
            }
            id = parent;
        }
        false
    }

    /// Connects an output port to an input port of the same graph.
    pub fn connect(&mut self, from: PortRef, to: PortRef) -> Diagnostics {
        match self.port_names(from, to) {
            Ok((out_port, in_port)) => self.connect_by_name(from.node, &out_port, to.node, &in_port),
            Err(e) => rejected(e),
        }
    }

    pub fn connect_by_name(
        &mut self,
        out_node: NodeId,
        out_port: &str,
        in_node: NodeId,
        in_port: &str,
    ) -> Diagnostics {
        let policy = self.config.connection_policy;
        self.execute(Action::single(Command::connect(
            out_node, out_port, in_node, in_port, policy,
        )))
    }

    pub fn disconnect(&mut self, from: PortRef, to: PortRef) -> Diagnostics {
        match self.port_names(from, to) {
            Ok((out_port, in_port)) => {
                self.disconnect_by_name(from.node, &out_port, to.node, &in_port)
            }
            Err(e) => rejected(e),
        }
    }

    pub fn disconnect_by_name(
        &mut self,
        out_node: NodeId,
        out_port: &str,
        in_node: NodeId,
        in_port: &str,
    ) -> Diagnostics {
        self.execute(Action::single(Command::disconnect(
            out_node, out_port, in_node, in_port,
        )))
    }

    fn port_names(&self, from: PortRef, to: PortRef) -> Result<(String, String), GraphError> {
        let owner = self
            .graph
            .owner_of(from.node)
            .ok_or(GraphError::NodeNotFound(from.node))?;
        let name = |port: PortRef| {
            owner
                .port(port)
                .map(|p| p.name().to_string())
                .ok_or_else(|| GraphError::PortNotFound {
                    node: port.node,
                    port: format!("#{}", port.port),
                })
        };
        Ok((name(from)?, name(to)?))
    }

    pub fn set_value(&mut self, node: NodeId, port: &str, value: TypedValue) -> Diagnostics {
        self.execute(Action::single(Command::set_value(
            node,
            port,
            ValueSource::Typed(value),
        )))
    }

    pub fn rename_node(&mut self, node: NodeId, name: &str) -> Diagnostics {
        self.execute(Action::single(Command::rename_node(node, name)))
    }

    pub fn set_blind_data(&mut self, node: NodeId, value: TypedValue) -> Diagnostics {
        self.execute(Action::single(Command::set_blind_data(node, value)))
    }

    /// Swaps the type of `node`, keeping the values of ports that survive the change.
    ///
    /// The node's connections are dropped first and re-made afterwards for every edge whose
    /// endpoints still exist with compatible types.
    pub fn change_metadata(&mut self, node: NodeId, metadata: &MetadataHandle) -> Diagnostics {
        let Some(owner) = self.graph.owner_of(node) else {
            return rejected(GraphError::NodeNotFound(node));
        };

        let declared_after = |port: &Port| -> Option<TypedValue> {
            if port.node() != node {
                return Some(port.declared().clone());
            }
            metadata
                .port(port.name())
                .filter(|(_, definition)| definition.category == port.category())
                .map(|(_, definition)| definition.default.clone())
        };

        let policy = self.config.connection_policy;
        let mut action = Action::new();
        let mut reconnect = Vec::new();
        for (from, to) in owner.connections().touching(node) {
            let (Some(output), Some(input)) = (owner.port(from), owner.port(to)) else {
                continue;
            };
            action.push(Command::disconnect(
                from.node,
                output.name(),
                to.node,
                input.name(),
            ));
            if let (Some(a), Some(b)) = (declared_after(output), declared_after(input)) {
                if a.is_compatible(&b) {
                    reconnect.push(Command::connect(
                        from.node,
                        output.name(),
                        to.node,
                        input.name(),
                        policy,
                    ));
                }
            }
        }

        action.push(Command::change_metadata(node, metadata.clone()));
        for command in reconnect {
            action.push(command);
        }
        self.execute(action)
    }

    /// Moves nodes by updating their position blind data, as one action.
    ///
    /// Nodes already at the requested position are skipped. If nothing moves, no action is
    /// executed and the history is left untouched.
    pub fn move_nodes(
        &mut self,
        positions: impl IntoIterator<Item = (NodeId, Position)>,
    ) -> Diagnostics {
        let mut action = Action::new();
        for (id, position) in positions {
            let unchanged = self
                .graph
                .find_node(id)
                .and_then(|n| n.blind_data_as::<Position>())
                .is_some_and(|current| *current == position);
            if !unchanged {
                action.push(Command::set_blind_data(id, TypedValue::new(position)));
            }
        }
        if action.is_empty() {
            return Diagnostics::new();
        }
        self.execute(action)
    }

    /// Evaluates `node` and everything upstream of it in the graph that contains it.
    pub fn evaluate(&mut self, node: NodeId) -> Result<(), EvaluationError> {
        let graph = self
            .graph
            .owner_of_mut(node)
            .ok_or(EvaluationError::NodeNotFound(node))?;
        evaluator::evaluate(graph, node)
    }
}

impl Default for Session {
    fn default() -> Self {
        Session::builder().build()
    }
}

fn rejected(error: GraphError) -> Diagnostics {
    tracing::warn!(target: TRACING_TARGET, error = %error, "Operation rejected");
    let mut diagnostics = Diagnostics::new();
    diagnostics.add_error(error.to_string());
    diagnostics
}
