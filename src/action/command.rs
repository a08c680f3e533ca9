use crate::error::{GraphError, ValueError};
use crate::graph::{
    ConnectionPolicy, Graph, MetadataHandle, Node, NodeId, Port, PortCategory, PortRef,
    RemovedNode,
};
use crate::value::{TypedValue, VOID_TYPE_NAME};
use serde_json::Value as JsonValue;

/// A value to store into a port: either already typed, or JSON to be interpreted against the
/// port's declared type once the node exists.
#[derive(Debug, Clone)]
pub enum ValueSource {
    Typed(TypedValue),
    Json(JsonValue),
}

/// An invertible unit of graph mutation.
///
/// Commands address nodes by id and ports by name, so they can be queued before the nodes
/// they touch exist (as a paste does). Whatever is needed to invert a command is captured
/// when it is applied; `revert` is only valid after a successful `apply`.
#[derive(Debug, Clone)]
pub enum Command {
    CreateNode {
        network: Option<NodeId>,
        id: NodeId,
        metadata: MetadataHandle,
        name: String,
        blind_data: TypedValue,
    },
    RemoveNode {
        id: NodeId,
        removed: Option<(Option<NodeId>, RemovedNode)>,
    },
    Connect {
        out_node: NodeId,
        out_port: String,
        in_node: NodeId,
        in_port: String,
        policy: ConnectionPolicy,
        applied: Option<(PortRef, PortRef, Option<PortRef>)>,
    },
    Disconnect {
        out_node: NodeId,
        out_port: String,
        in_node: NodeId,
        in_port: String,
        applied: Option<(PortRef, PortRef)>,
    },
    SetValue {
        node: NodeId,
        port: String,
        value: ValueSource,
        previous: Option<TypedValue>,
    },
    SetBlindData {
        node: NodeId,
        value: TypedValue,
        previous: Option<TypedValue>,
    },
    RenameNode {
        node: NodeId,
        name: String,
        previous: Option<String>,
    },
    ChangeMetadata {
        node: NodeId,
        metadata: MetadataHandle,
        previous: Option<(MetadataHandle, Vec<Port>)>,
    },
    SetSource {
        node: NodeId,
        source: Option<String>,
        previous: Option<Option<String>>,
    },
}

impl Command {
    pub fn create_node(
        network: Option<NodeId>,
        id: NodeId,
        metadata: MetadataHandle,
        name: &str,
        blind_data: TypedValue,
    ) -> Self {
        Command::CreateNode {
            network,
            id,
            metadata,
            name: name.to_string(),
            blind_data,
        }
    }

    pub fn remove_node(id: NodeId) -> Self {
        Command::RemoveNode { id, removed: None }
    }

    pub fn connect(
        out_node: NodeId,
        out_port: &str,
        in_node: NodeId,
        in_port: &str,
        policy: ConnectionPolicy,
    ) -> Self {
        Command::Connect {
            out_node,
            out_port: out_port.to_string(),
            in_node,
            in_port: in_port.to_string(),
            policy,
            applied: None,
        }
    }

    pub fn disconnect(out_node: NodeId, out_port: &str, in_node: NodeId, in_port: &str) -> Self {
        Command::Disconnect {
            out_node,
            out_port: out_port.to_string(),
            in_node,
            in_port: in_port.to_string(),
            applied: None,
        }
    }

    pub fn set_value(node: NodeId, port: &str, value: ValueSource) -> Self {
        Command::SetValue {
            node,
            port: port.to_string(),
            value,
            previous: None,
        }
    }

    pub fn set_blind_data(node: NodeId, value: TypedValue) -> Self {
        Command::SetBlindData {
            node,
            value,
            previous: None,
        }
    }

    pub fn rename_node(node: NodeId, name: &str) -> Self {
        Command::RenameNode {
            node,
            name: name.to_string(),
            previous: None,
        }
    }

    pub fn change_metadata(node: NodeId, metadata: MetadataHandle) -> Self {
        Command::ChangeMetadata {
            node,
            metadata,
            previous: None,
        }
    }

    pub fn set_source(node: NodeId, source: Option<String>) -> Self {
        Command::SetSource {
            node,
            source,
            previous: None,
        }
    }

    /// A human-readable description, used as the default step label.
    pub fn description(&self) -> String {
        match self {
            Command::CreateNode { name, metadata, .. } => {
                format!("Create node '{}' ({})", name, metadata.type_name())
            }
            Command::RemoveNode { id, .. } => format!("Remove node {}", id),
            Command::Connect {
                out_node,
                out_port,
                in_node,
                in_port,
                ..
            } => format!(
                "Connect {}/{} -> {}/{}",
                out_node, out_port, in_node, in_port
            ),
            Command::Disconnect {
                out_node,
                out_port,
                in_node,
                in_port,
                ..
            } => format!(
                "Disconnect {}/{} -> {}/{}",
                out_node, out_port, in_node, in_port
            ),
            Command::SetValue { node, port, .. } => format!("Set value of {}/{}", node, port),
            Command::SetBlindData { node, .. } => format!("Set blind data of {}", node),
            Command::RenameNode { node, name, .. } => format!("Rename {} to '{}'", node, name),
            Command::ChangeMetadata { node, metadata, .. } => {
                format!("Change type of {} to {}", node, metadata.type_name())
            }
            Command::SetSource { node, source, .. } => match source {
                Some(source) => format!("Set source of {} to '{}'", node, source),
                None => format!("Clear source of {}", node),
            },
        }
    }

    /// Applies the command, capturing whatever `revert` needs.
    pub fn apply(&mut self, graph: &mut Graph) -> Result<(), GraphError> {
        match self {
            Command::CreateNode {
                network,
                id,
                metadata,
                name,
                blind_data,
            } => {
                let mut node = Node::new(*id, metadata.clone(), name);
                node.set_blind_data(blind_data.clone());
                graph.subgraph_mut(*network)?.insert(node, None)?;
            }

            Command::RemoveNode { id, removed } => {
                let parent = graph.parent_of(*id).ok_or(GraphError::NodeNotFound(*id))?;
                let node = graph
                    .subgraph_mut(parent)?
                    .erase(*id)
                    .ok_or(GraphError::NodeNotFound(*id))?;
                *removed = Some((parent, node));
            }

            Command::Connect {
                out_node,
                out_port,
                in_node,
                in_port,
                policy,
                applied,
            } => {
                let owner = owner_mut(graph, *out_node)?;
                let from = owner.resolve_port(*out_node, out_port, None)?;
                let to = owner.resolve_port(*in_node, in_port, None)?;
                let replaced = owner.connect(from, to, *policy)?;
                *applied = Some((from, to, replaced));
            }

            Command::Disconnect {
                out_node,
                out_port,
                in_node,
                in_port,
                applied,
            } => {
                let owner = owner_mut(graph, *out_node)?;
                let from = owner.resolve_port(*out_node, out_port, Some(PortCategory::Output))?;
                let to = owner.resolve_port(*in_node, in_port, Some(PortCategory::Input))?;
                owner.disconnect(from, to)?;
                *applied = Some((from, to));
            }

            Command::SetValue {
                node,
                port,
                value,
                previous,
            } => {
                let target = port_by_name(graph, *node, port)?;
                let new_value = match value {
                    ValueSource::Typed(value) => value.clone(),
                    ValueSource::Json(json) => interpret_json(target, json)?,
                };
                let old = target.value().clone();
                target.set_value(new_value)?;
                *previous = Some(old);
            }

            Command::SetBlindData {
                node,
                value,
                previous,
            } => {
                let target = node_mut(graph, *node)?;
                *previous = Some(target.set_blind_data(value.clone()));
            }

            Command::RenameNode {
                node,
                name,
                previous,
            } => {
                let target = node_mut(graph, *node)?;
                *previous = Some(target.name().to_string());
                target.set_name(name);
            }

            Command::ChangeMetadata {
                node,
                metadata,
                previous,
            } => {
                let target = node_mut(graph, *node)?;
                if target.is_network() != metadata.is_network() {
                    return Err(GraphError::MetadataChange {
                        node: *node,
                        message: "cannot convert between network and plain node types"
                            .to_string(),
                    });
                }
                let ports = target.carried_ports(metadata);
                *previous = Some(target.replace_metadata(metadata.clone(), Some(ports)));
            }

            Command::SetSource {
                node,
                source,
                previous,
            } => {
                let network = node_mut(graph, *node)?
                    .try_as_network_mut()
                    .ok_or(GraphError::NotANetwork(*node))?;
                *previous = Some(network.source().map(str::to_string));
                network.set_source(source.clone());
            }
        }
        Ok(())
    }

    /// Inverts a previously applied command.
    ///
    /// The captured state is kept until the next `apply`, so a revert that fails leaves the
    /// command revertible.
    ///
    /// # Panics
    ///
    /// Panics if the command was never successfully applied.
    pub fn revert(&mut self, graph: &mut Graph) -> Result<(), GraphError> {
        match self {
            Command::CreateNode { network, id, .. } => {
                graph
                    .subgraph_mut(*network)?
                    .erase(*id)
                    .ok_or(GraphError::NodeNotFound(*id))?;
            }

            Command::RemoveNode { removed, .. } => {
                let (parent, node) = removed.clone().expect("revert of an unapplied RemoveNode");
                graph.subgraph_mut(parent)?.restore(node)?;
            }

            Command::Connect {
                out_node, applied, ..
            } => {
                let (from, to, replaced) = applied.clone().expect("revert of an unapplied Connect");
                let owner = owner_mut(graph, *out_node)?;
                owner.disconnect(from, to)?;
                if let Some(old) = replaced {
                    owner.connect(old, to, ConnectionPolicy::Reject)?;
                }
            }

            Command::Disconnect {
                out_node, applied, ..
            } => {
                let (from, to) = applied.clone().expect("revert of an unapplied Disconnect");
                owner_mut(graph, *out_node)?.connect(from, to, ConnectionPolicy::Reject)?;
            }

            Command::SetValue {
                node,
                port,
                previous,
                ..
            } => {
                let old = previous.clone().expect("revert of an unapplied SetValue");
                port_by_name(graph, *node, port)?.set_value(old)?;
            }

            Command::SetBlindData { node, previous, .. } => {
                let old = previous.clone().expect("revert of an unapplied SetBlindData");
                node_mut(graph, *node)?.set_blind_data(old);
            }

            Command::RenameNode { node, previous, .. } => {
                let old = previous.clone().expect("revert of an unapplied RenameNode");
                node_mut(graph, *node)?.set_name(&old);
            }

            Command::ChangeMetadata { node, previous, .. } => {
                let (metadata, ports) = previous
                    .clone()
                    .expect("revert of an unapplied ChangeMetadata");
                node_mut(graph, *node)?.replace_metadata(metadata, Some(ports));
            }

            Command::SetSource { node, previous, .. } => {
                let old = previous.clone().expect("revert of an unapplied SetSource");
                node_mut(graph, *node)?
                    .try_as_network_mut()
                    .ok_or(GraphError::NotANetwork(*node))?
                    .set_source(old);
            }
        }
        Ok(())
    }
}

fn node_mut(graph: &mut Graph, id: NodeId) -> Result<&mut Node, GraphError> {
    graph.find_node_mut(id).ok_or(GraphError::NodeNotFound(id))
}

fn owner_mut(graph: &mut Graph, id: NodeId) -> Result<&mut Graph, GraphError> {
    graph.owner_of_mut(id).ok_or(GraphError::NodeNotFound(id))
}

fn port_by_name<'g>(graph: &'g mut Graph, node: NodeId, port: &str) -> Result<&'g mut Port, GraphError> {
    let target = node_mut(graph, node)?;
    let index = target
        .find_port(port)
        .map(Port::index)
        .ok_or_else(|| GraphError::PortNotFound {
            node,
            port: port.to_string(),
        })?;
    target.port_mut(index).ok_or_else(|| GraphError::PortNotFound {
        node,
        port: port.to_string(),
    })
}

/// Reads JSON as the port's declared type, falling back to the type currently held by a
/// void port.
fn interpret_json(port: &Port, json: &JsonValue) -> Result<TypedValue, ValueError> {
    let template = if port.declared().is_empty() {
        port.value()
    } else {
        port.declared()
    };
    if template.is_empty() {
        return Err(ValueError::Deserialize {
            type_name: VOID_TYPE_NAME.to_string(),
            message: format!(
                "port '{}' is void and holds no value to take the type from",
                port.name()
            ),
        });
    }
    template.with_json(json)
}
