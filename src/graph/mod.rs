//! Graph topology: nodes, ports and the connections between them.
//!
//! A [`Graph`] owns an ordered sequence of [`Node`]s and a [`Connections`] index. Network
//! nodes own a nested graph of their own, so the structure is a tree of graphs. Nodes are
//! addressed by their stable [`NodeId`]; positional indices are only valid until the next
//! mutation.

use crate::error::GraphError;
use serde::{Deserialize, Serialize};
use std::ops::Index;

mod connections;
mod id;
mod metadata;
mod node;
mod port;
mod selection;

pub use connections::Connections;
pub use id::{NodeId, PortRef};
pub use metadata::{
    ComputeFn, Metadata, MetadataBuilder, MetadataHandle, MetadataRegistry, NETWORK_TYPE,
};
pub use node::{Network, Node, NodeKind};
pub use port::{Port, PortCategory, PortDefinition};
pub use selection::Selection;

/// What connecting a second source into an already-driven input does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionPolicy {
    /// Fail with [`GraphError::InputAlreadyConnected`]; callers disconnect first.
    #[default]
    Reject,
    /// Drop the existing edge and connect the new source.
    Replace,
}

/// A node taken out of a graph together with everything needed to put it back.
#[derive(Debug, Clone)]
pub struct RemovedNode {
    pub index: usize,
    pub node: Node,
    pub connections: Vec<(PortRef, PortRef)>,
}

#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    connections: Connections,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of nodes directly in this graph.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Number of nodes in this graph and every nested network.
    pub fn total_len(&self) -> usize {
        self.nodes
            .iter()
            .map(|n| 1 + n.try_as_network().map_or(0, |net| net.graph().total_len()))
            .sum()
    }

    pub fn clear(&mut self) {
        self.connections.clear();
        self.nodes.clear();
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.nodes.iter()
    }

    /// Constructs a node of the given type with a freshly minted id and appends it.
    pub fn add(&mut self, metadata: &MetadataHandle, name: &str) -> &mut Node {
        let index = self.nodes.len();
        self.nodes
            .push(Node::new(NodeId::mint(), metadata.clone(), name));
        &mut self.nodes[index]
    }

    /// Inserts an already-built node at `index` (appending when `None` or out of range).
    pub(crate) fn insert(
        &mut self,
        node: Node,
        index: Option<usize>,
    ) -> Result<&mut Node, GraphError> {
        if self.contains(node.id()) {
            return Err(GraphError::DuplicateNode(node.id()));
        }
        let index = index
            .filter(|i| *i <= self.nodes.len())
            .unwrap_or(self.nodes.len());
        self.nodes.insert(index, node);
        Ok(&mut self.nodes[index])
    }

    /// Removes a node and every connection touching any of its ports.
    pub fn erase(&mut self, id: NodeId) -> Option<RemovedNode> {
        let index = self.position(id)?;
        let connections = self.connections.remove_node(id);
        let node = self.nodes.remove(index);
        Some(RemovedNode {
            index,
            node,
            connections,
        })
    }

    /// Puts back a node removed by [`Graph::erase`], including its connections.
    pub(crate) fn restore(&mut self, removed: RemovedNode) -> Result<(), GraphError> {
        self.insert(removed.node, Some(removed.index))?;
        for (from, to) in removed.connections {
            self.connections.insert(from, to);
        }
        Ok(())
    }

    pub fn position(&self, id: NodeId) -> Option<usize> {
        self.nodes.iter().position(|n| n.id() == id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.position(id).is_some()
    }

    /// Node directly in this graph.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id() == id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id() == id)
    }

    /// Node anywhere in this graph or its nested networks.
    pub fn find_node(&self, id: NodeId) -> Option<&Node> {
        self.node(id).or_else(|| {
            self.nodes
                .iter()
                .filter_map(Node::try_as_network)
                .find_map(|net| net.graph().find_node(id))
        })
    }

    pub fn find_node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        if let Some(index) = self.position(id) {
            return self.nodes.get_mut(index);
        }
        self.nodes
            .iter_mut()
            .filter_map(Node::try_as_network_mut)
            .find_map(|net| net.graph_mut().find_node_mut(id))
    }

    /// The graph (this one or a nested one) that directly contains `id`.
    pub fn owner_of(&self, id: NodeId) -> Option<&Graph> {
        if self.contains(id) {
            return Some(self);
        }
        self.nodes
            .iter()
            .filter_map(Node::try_as_network)
            .find_map(|net| net.graph().owner_of(id))
    }

    pub fn owner_of_mut(&mut self, id: NodeId) -> Option<&mut Graph> {
        if self.contains(id) {
            return Some(self);
        }
        self.nodes
            .iter_mut()
            .filter_map(Node::try_as_network_mut)
            .find_map(|net| net.graph_mut().owner_of_mut(id))
    }

    /// Locates the graph directly containing `id`: `Some(None)` for this graph,
    /// `Some(Some(network))` for the nested graph of `network`.
    pub fn parent_of(&self, id: NodeId) -> Option<Option<NodeId>> {
        if self.contains(id) {
            return Some(None);
        }
        self.nodes.iter().find_map(|n| {
            let nested = n.try_as_network()?.graph().parent_of(id)?;
            Some(Some(nested.unwrap_or(n.id())))
        })
    }

    /// This graph for `None`, otherwise the nested graph of the given network node.
    pub fn subgraph(&self, network: Option<NodeId>) -> Result<&Graph, GraphError> {
        let Some(id) = network else {
            return Ok(self);
        };
        self.find_node(id)
            .ok_or(GraphError::NodeNotFound(id))?
            .try_as_network()
            .map(Network::graph)
            .ok_or(GraphError::NotANetwork(id))
    }

    pub fn subgraph_mut(&mut self, network: Option<NodeId>) -> Result<&mut Graph, GraphError> {
        let Some(id) = network else {
            return Ok(self);
        };
        self.find_node_mut(id)
            .ok_or(GraphError::NodeNotFound(id))?
            .try_as_network_mut()
            .map(Network::graph_mut)
            .ok_or(GraphError::NotANetwork(id))
    }

    pub fn port(&self, port: PortRef) -> Option<&Port> {
        self.node(port.node).and_then(|n| n.port(port.port))
    }

    pub(crate) fn port_mut(&mut self, port: PortRef) -> Option<&mut Port> {
        self.node_mut(port.node).and_then(|n| n.port_mut(port.port))
    }

    fn require_port(&self, port: PortRef) -> Result<&Port, GraphError> {
        let node = self
            .node(port.node)
            .ok_or(GraphError::NodeNotFound(port.node))?;
        node.port(port.port).ok_or_else(|| GraphError::PortNotFound {
            node: port.node,
            port: format!("#{}", port.port),
        })
    }

    /// Resolves a port of a node in this graph by name.
    pub fn resolve_port(
        &self,
        node: NodeId,
        name: &str,
        category: Option<PortCategory>,
    ) -> Result<PortRef, GraphError> {
        self.node(node)
            .ok_or(GraphError::NodeNotFound(node))?
            .port_ref(name, category)
            .ok_or_else(|| GraphError::PortNotFound {
                node,
                port: name.to_string(),
            })
    }

    pub fn connections(&self) -> &Connections {
        &self.connections
    }

    /// Connects an output to an input of nodes in this graph.
    ///
    /// Fails with [`GraphError::InvalidConnection`] if `from` is not an output or `to` is not
    /// an input, and with [`GraphError::IncompatibleTypes`] if both ports are typed with
    /// different types. A second source into a driven input is handled per `policy`; the
    /// replaced source, if any, is returned.
    pub fn connect(
        &mut self,
        from: PortRef,
        to: PortRef,
        policy: ConnectionPolicy,
    ) -> Result<Option<PortRef>, GraphError> {
        let source = self.require_port(from)?;
        let target = self.require_port(to)?;

        if source.category() != PortCategory::Output {
            return Err(GraphError::InvalidConnection {
                from,
                to,
                message: "the origin of a connection must be an output port".to_string(),
            });
        }
        if target.category() != PortCategory::Input {
            return Err(GraphError::InvalidConnection {
                from,
                to,
                message: "the target of a connection must be an input port".to_string(),
            });
        }
        if !source.declared().is_compatible(target.declared()) {
            return Err(GraphError::IncompatibleTypes {
                from,
                to,
                from_type: source.declared().type_name().to_string(),
                to_type: target.declared().type_name().to_string(),
            });
        }

        if let Some(existing) = self.connections.source_of(to) {
            if policy == ConnectionPolicy::Reject {
                return Err(GraphError::InputAlreadyConnected {
                    input: to,
                    existing,
                });
            }
        }

        Ok(self.connections.insert(from, to))
    }

    pub fn disconnect(&mut self, from: PortRef, to: PortRef) -> Result<(), GraphError> {
        if self.connections.remove(from, to) {
            Ok(())
        } else {
            Err(GraphError::NotConnected { from, to })
        }
    }

    fn assert_category(&self, port: PortRef, category: PortCategory, query: &str) {
        let actual = self.port(port).map(Port::category);
        assert!(
            actual == Some(category),
            "{} can only be run on {} ports, but {} is {:?}",
            query,
            category,
            port,
            actual
        );
    }

    /// The output feeding `input`, if connected.
    ///
    /// # Panics
    ///
    /// Panics if `input` is not an input port of this graph.
    pub fn connected_from(&self, input: PortRef) -> Option<PortRef> {
        self.assert_category(input, PortCategory::Input, "connected_from");
        self.connections.source_of(input)
    }

    /// Every input fed by `output`, in index order.
    ///
    /// # Panics
    ///
    /// Panics if `output` is not an output port of this graph.
    pub fn connected_to(&self, output: PortRef) -> Vec<PortRef> {
        self.assert_category(output, PortCategory::Output, "connected_to");
        self.connections.targets_of(output).collect()
    }

    /// Mutable variant of [`Graph::connected_from`], returning the port itself.
    pub fn connected_from_mut(&mut self, input: PortRef) -> Option<&mut Port> {
        let source = self.connected_from(input)?;
        self.port_mut(source)
    }

    /// Mutable variant of [`Graph::connected_to`], returning the ports themselves.
    pub fn connected_to_mut(&mut self, output: PortRef) -> Vec<&mut Port> {
        let targets = self.connected_to(output);
        let mut ports: Vec<&mut Port> = self
            .nodes
            .iter_mut()
            .flat_map(|n| n.port_mut_iter())
            .filter(|p| targets.contains(&p.port_ref()))
            .collect();
        ports.sort_by_key(|p| p.port_ref());
        ports
    }
}

impl Index<usize> for Graph {
    type Output = Node;

    fn index(&self, index: usize) -> &Node {
        &self.nodes[index]
    }
}

impl<'a> IntoIterator for &'a Graph {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}
