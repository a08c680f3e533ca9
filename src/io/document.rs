use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A serialized node or network.
///
/// The same schema serves a plain node, an inline network (`nodes` + `connections`) and a
/// network by reference (`source`). Maps keep insertion order so written documents read
/// back in the order they were written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,

    /// Values of unconnected input ports, keyed by port name. Void ports hold a
    /// [`TypedValueDocument`], typed ports the bare value.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub ports: IndexMap<String, JsonValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blind_data: Option<BlindDataDocument>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Nested nodes keyed by document-local synthetic names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<IndexMap<String, NodeDocument>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connections: Option<Vec<ConnectionDocument>>,
}

impl NodeDocument {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// True if the document carries inline network content.
    pub fn has_content(&self) -> bool {
        self.nodes.is_some() || self.connections.is_some()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.as_ref().map_or(0, IndexMap::len)
    }

    pub fn connection_count(&self) -> usize {
        self.connections.as_ref().map_or(0, Vec::len)
    }
}

/// A value whose type is not implied by where it is stored: the registered type name plus
/// the value's JSON projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedValueDocument {
    #[serde(rename = "type")]
    pub type_name: String,
    pub value: JsonValue,
}

pub type BlindDataDocument = TypedValueDocument;

/// One connection between two nodes of the same document, by synthetic node key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDocument {
    pub out_node: String,
    pub out_port: String,
    pub in_node: String,
    pub in_port: String,
}
