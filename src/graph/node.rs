use super::{Graph, MetadataHandle, NodeId, Port, PortCategory, PortRef};
use crate::value::{PortValue, TypedValue};

/// Variant-specific node state.
#[derive(Debug, Clone)]
pub enum NodeKind {
    Plain,
    Network(Box<Network>),
}

/// A node that owns a nested graph.
///
/// When `source` is set, the nested content is understood to come from that external
/// document and the in-memory graph is only a cache of it.
#[derive(Debug, Clone, Default)]
pub struct Network {
    graph: Graph,
    source: Option<String>,
}

impl Network {
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub(crate) fn set_source(&mut self, source: Option<String>) {
        self.source = source;
    }
}

/// A named instance of a node type, owning its ports.
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    name: String,
    metadata: MetadataHandle,
    ports: Vec<Port>,
    blind_data: TypedValue,
    kind: NodeKind,
}

impl Node {
    pub(crate) fn new(id: NodeId, metadata: MetadataHandle, name: &str) -> Self {
        let ports = Self::ports_for(id, &metadata);
        let kind = if metadata.is_network() {
            NodeKind::Network(Box::default())
        } else {
            NodeKind::Plain
        };
        Self {
            id,
            name: name.to_string(),
            metadata,
            ports,
            blind_data: TypedValue::empty(),
            kind,
        }
    }

    fn ports_for(id: NodeId, metadata: &MetadataHandle) -> Vec<Port> {
        metadata
            .ports()
            .iter()
            .enumerate()
            .map(|(index, definition)| Port::from_definition(id, index, definition))
            .collect()
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn metadata(&self) -> &MetadataHandle {
        &self.metadata
    }

    pub fn type_name(&self) -> &str {
        self.metadata.type_name()
    }

    /// Swaps the node type, returning the previous metadata and ports.
    pub(crate) fn replace_metadata(
        &mut self,
        metadata: MetadataHandle,
        ports: Option<Vec<Port>>,
    ) -> (MetadataHandle, Vec<Port>) {
        let ports = ports.unwrap_or_else(|| Self::ports_for(self.id, &metadata));
        let old_metadata = std::mem::replace(&mut self.metadata, metadata);
        let old_ports = std::mem::replace(&mut self.ports, ports);
        (old_metadata, old_ports)
    }

    /// Builds the port list `metadata` would give this node, keeping the current value of
    /// every port that survives with the same name, category and a compatible type.
    pub(crate) fn carried_ports(&self, metadata: &MetadataHandle) -> Vec<Port> {
        let mut ports = Self::ports_for(self.id, metadata);
        for port in &mut ports {
            let Some(old) = self.find_port(port.name()) else {
                continue;
            };
            if old.category() == port.category() && !old.value().is_empty() {
                // incompatible values fall back to the new default
                let _ = port.set_value(old.value().clone());
            }
        }
        ports
    }

    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    pub fn port_count(&self) -> usize {
        self.ports.len()
    }

    pub fn port(&self, index: usize) -> Option<&Port> {
        self.ports.get(index)
    }

    pub(crate) fn port_mut(&mut self, index: usize) -> Option<&mut Port> {
        self.ports.get_mut(index)
    }

    pub(crate) fn port_mut_iter(&mut self) -> impl Iterator<Item = &mut Port> {
        self.ports.iter_mut()
    }

    pub fn find_port(&self, name: &str) -> Option<&Port> {
        self.ports.iter().find(|p| p.name() == name)
    }

    /// Reference to the named port, optionally restricted to one category.
    pub fn port_ref(&self, name: &str, category: Option<PortCategory>) -> Option<PortRef> {
        self.ports
            .iter()
            .find(|p| p.name() == name && category.is_none_or(|c| p.category() == c))
            .map(Port::port_ref)
    }

    pub fn inputs(&self) -> impl Iterator<Item = &Port> {
        self.ports
            .iter()
            .filter(|p| p.category() == PortCategory::Input)
    }

    pub fn outputs(&self) -> impl Iterator<Item = &Port> {
        self.ports
            .iter()
            .filter(|p| p.category() == PortCategory::Output)
    }

    /// Opaque host data (e.g. editor position). Stored, never interpreted.
    pub fn blind_data(&self) -> &TypedValue {
        &self.blind_data
    }

    pub fn has_blind_data(&self) -> bool {
        !self.blind_data.is_empty()
    }

    pub fn blind_data_as<T: PortValue>(&self) -> Option<&T> {
        self.blind_data.try_get::<T>()
    }

    pub(crate) fn set_blind_data(&mut self, value: TypedValue) -> TypedValue {
        std::mem::replace(&mut self.blind_data, value)
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn is_network(&self) -> bool {
        matches!(self.kind, NodeKind::Network(_))
    }

    pub fn try_as_network(&self) -> Option<&Network> {
        match &self.kind {
            NodeKind::Network(network) => Some(network),
            NodeKind::Plain => None,
        }
    }

    pub fn try_as_network_mut(&mut self) -> Option<&mut Network> {
        match &mut self.kind {
            NodeKind::Network(network) => Some(network),
            NodeKind::Plain => None,
        }
    }

    /// # Panics
    ///
    /// Panics if the node is not a network.
    pub fn as_network(&self) -> &Network {
        match &self.kind {
            NodeKind::Network(network) => network,
            NodeKind::Plain => panic!("node {} ('{}') is not a network", self.id, self.name),
        }
    }

    /// # Panics
    ///
    /// Panics if the node is not a network.
    pub fn as_network_mut(&mut self) -> &mut Network {
        match &mut self.kind {
            NodeKind::Network(network) => network,
            NodeKind::Plain => panic!("node {} ('{}') is not a network", self.id, self.name),
        }
    }
}
