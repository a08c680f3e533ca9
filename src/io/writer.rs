use super::TRACING_TARGET;
use super::document::{ConnectionDocument, NodeDocument, TypedValueDocument};
use crate::graph::{Graph, NETWORK_TYPE, Node, NodeId, PortCategory, Selection};
use crate::value::TypedValue;
use ahash::AHashMap;
use indexmap::IndexMap;

/// Serializes the nodes of `graph` to a network document.
///
/// An empty selection writes the whole graph. Otherwise only the selected nodes that live
/// directly in `graph` are written, and connections leaving the selection are dropped.
pub fn write_graph(graph: &Graph, selection: &Selection) -> NodeDocument {
    let nodes = graph
        .iter()
        .filter(|n| selection.is_empty() || selection.contains(n.id()));
    let (nodes, connections) = write_content(graph, nodes);

    NodeDocument {
        type_name: Some(NETWORK_TYPE.to_string()),
        nodes: Some(nodes),
        connections: Some(connections),
        ..Default::default()
    }
}

/// Serializes a single node of `owner`, including the content of a network node.
pub fn write_node(owner: &Graph, node: &Node) -> NodeDocument {
    let mut document = NodeDocument {
        name: Some(node.name().to_string()),
        type_name: Some(node.type_name().to_string()),
        ports: write_ports(owner, node),
        blind_data: write_blind_data(node),
        ..Default::default()
    };

    if let Some(network) = node.try_as_network() {
        match network.source() {
            Some(source) => document.source = Some(source.to_string()),
            None => {
                let (nodes, connections) =
                    write_content(network.graph(), network.graph().iter());
                document.nodes = Some(nodes);
                document.connections = Some(connections);
            }
        }
    }

    document
}

fn write_content<'g>(
    graph: &'g Graph,
    nodes: impl Iterator<Item = &'g Node>,
) -> (IndexMap<String, NodeDocument>, Vec<ConnectionDocument>) {
    let mut counters: AHashMap<&str, usize> = AHashMap::new();
    let mut keys: AHashMap<NodeId, String> = AHashMap::new();
    let mut documents = IndexMap::new();

    for node in nodes {
        let key = synthetic_key(node.type_name(), &mut counters);
        keys.insert(node.id(), key.clone());
        documents.insert(key, write_node(graph, node));
    }

    let connections = graph
        .connections()
        .iter()
        .filter_map(|(from, to)| {
            let out_node = keys.get(&from.node)?;
            let in_node = keys.get(&to.node)?;
            Some(ConnectionDocument {
                out_node: out_node.clone(),
                out_port: graph.port(from)?.name().to_string(),
                in_node: in_node.clone(),
                in_port: graph.port(to)?.name().to_string(),
            })
        })
        .collect();

    (documents, connections)
}

/// `math/add` becomes `add_0`, `add_1`, ...
fn synthetic_key<'a>(type_name: &'a str, counters: &mut AHashMap<&'a str, usize>) -> String {
    let short = type_name.rsplit('/').next().unwrap_or(type_name);
    let counter = counters.entry(short).or_insert(0);
    let key = format!("{}_{}", short, counter);
    *counter += 1;
    key
}

/// Values of unconnected inputs that hold a saveable value.
///
/// A void port has no declared type to read a bare value back as, so its value is written
/// typed, the same way blind data is.
fn write_ports(owner: &Graph, node: &Node) -> IndexMap<String, serde_json::Value> {
    node.ports()
        .iter()
        .filter(|p| p.category() == PortCategory::Input)
        .filter(|p| owner.connections().source_of(p.port_ref()).is_none())
        .filter_map(|p| {
            let value = if p.is_void() {
                let typed = write_typed(p.value())?;
                serde_json::to_value(typed).ok()?
            } else {
                p.value().to_json()?
            };
            Some((p.name().to_string(), value))
        })
        .collect()
}

fn write_typed(value: &TypedValue) -> Option<TypedValueDocument> {
    if value.is_empty() {
        return None;
    }
    Some(TypedValueDocument {
        type_name: value.type_name().to_string(),
        value: value.to_json()?,
    })
}

fn write_blind_data(node: &Node) -> Option<TypedValueDocument> {
    let blind_data = node.blind_data();
    if blind_data.is_empty() {
        return None;
    }
    match blind_data.try_to_json() {
        Ok(value) => Some(TypedValueDocument {
            type_name: blind_data.type_name().to_string(),
            value,
        }),
        Err(e) => {
            tracing::warn!(
                target: TRACING_TARGET,
                node_id = %node.id(),
                error = %e,
                "Skipping blind data"
            );
            None
        }
    }
}
