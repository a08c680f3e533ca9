//! Pull-based evaluation of node compute callbacks.
//!
//! Evaluating a node first evaluates every node feeding its connected inputs, copies the
//! upstream output values into those inputs and then runs the node's compute callback.
//! Each node is computed at most once per [`Evaluator`]. Results are derived data: they are
//! written straight into output ports and are not recorded in the undo history.

use crate::error::{EvaluationError, ValueError};
use crate::graph::{Graph, Node, NodeId, PortCategory, PortRef};
use crate::value::{PortValue, TypedValue};
use ahash::AHashSet;

const TRACING_TARGET: &str = "renketsu::evaluator";

/// The view of one node handed to its compute callback.
pub struct ComputeContext<'a> {
    node: &'a mut Node,
}

impl<'a> ComputeContext<'a> {
    pub fn node_id(&self) -> NodeId {
        self.node.id()
    }

    pub fn node_name(&self) -> &str {
        self.node.name()
    }

    /// Raw value of any port of the node.
    pub fn value(&self, port: &str) -> Result<&TypedValue, EvaluationError> {
        self.node
            .find_port(port)
            .map(|p| p.value())
            .ok_or_else(|| EvaluationError::PortNotFound {
                node: self.node.id(),
                port: port.to_string(),
                category: "any",
            })
    }

    /// Typed value of a port.
    pub fn get<T: PortValue>(&self, port: &str) -> Result<&T, EvaluationError> {
        let value = self.value(port)?;
        value.try_get::<T>().ok_or_else(|| {
            EvaluationError::Value(ValueError::TypeMismatch {
                expected: T::type_name().to_string(),
                found: value.type_name().to_string(),
            })
        })
    }

    /// Stores a typed value into an output port.
    pub fn set<T: PortValue>(&mut self, port: &str, value: T) -> Result<(), EvaluationError> {
        self.set_value(port, TypedValue::new(value))
    }

    pub fn set_value(&mut self, port: &str, value: TypedValue) -> Result<(), EvaluationError> {
        let id = self.node.id();
        let index = self
            .node
            .port_ref(port, Some(PortCategory::Output))
            .ok_or_else(|| EvaluationError::PortNotFound {
                node: id,
                port: port.to_string(),
                category: "output",
            })?
            .port;
        let target = self
            .node
            .port_mut(index)
            .ok_or_else(|| EvaluationError::PortNotFound {
                node: id,
                port: port.to_string(),
                category: "output",
            })?;
        target.set_value(value)?;
        Ok(())
    }

    /// Builds a compute failure for this node.
    pub fn fail(&self, message: impl Into<String>) -> EvaluationError {
        EvaluationError::Compute {
            node: self.node.id(),
            message: message.into(),
        }
    }
}

/// Evaluates nodes of one graph, memoizing within its own lifetime.
pub struct Evaluator<'g> {
    graph: &'g mut Graph,
    visiting: AHashSet<NodeId>,
    done: AHashSet<NodeId>,
}

impl<'g> Evaluator<'g> {
    pub fn new(graph: &'g mut Graph) -> Self {
        Self {
            graph,
            visiting: AHashSet::new(),
            done: AHashSet::new(),
        }
    }

    /// Evaluates `id` and everything upstream of it.
    pub fn evaluate(&mut self, id: NodeId) -> Result<(), EvaluationError> {
        self.evaluate_node(id)
    }

    /// Evaluates every node of the graph, in graph order.
    pub fn evaluate_all(&mut self) -> Result<(), EvaluationError> {
        let ids: Vec<NodeId> = self.graph.iter().map(Node::id).collect();
        for id in ids {
            self.evaluate_node(id)?;
        }
        Ok(())
    }

    /// Number of nodes computed so far.
    pub fn computed(&self) -> usize {
        self.done.len()
    }

    fn evaluate_node(&mut self, id: NodeId) -> Result<(), EvaluationError> {
        if self.done.contains(&id) {
            return Ok(());
        }
        if !self.visiting.insert(id) {
            return Err(EvaluationError::Cycle(id));
        }

        let node = self.graph.node(id).ok_or(EvaluationError::NodeNotFound(id))?;
        let upstream: Vec<(PortRef, PortRef)> = node
            .inputs()
            .filter_map(|input| {
                let input = input.port_ref();
                self.graph
                    .connections()
                    .source_of(input)
                    .map(|source| (source, input))
            })
            .collect();

        for (source, input) in upstream {
            self.evaluate_node(source.node)?;
            let value = self
                .graph
                .port(source)
                .map(|p| p.value().clone())
                .unwrap_or_default();
            if let Some(port) = self.graph.port_mut(input) {
                port.set_value(value)?;
            }
        }

        let node = self
            .graph
            .node_mut(id)
            .ok_or(EvaluationError::NodeNotFound(id))?;
        if let Some(compute) = node.metadata().compute().cloned() {
            let mut context = ComputeContext { node };
            compute(&mut context)?;
            tracing::trace!(target: TRACING_TARGET, node_id = %id, "Computed node");
        }

        self.visiting.remove(&id);
        self.done.insert(id);
        Ok(())
    }
}

/// Evaluates a single node of `graph` and its upstream dependencies.
pub fn evaluate(graph: &mut Graph, id: NodeId) -> Result<(), EvaluationError> {
    Evaluator::new(graph).evaluate(id)
}
