use crate::graph::{NodeId, PortRef};
use thiserror::Error;

/// Errors raised while constructing or (de)serializing typed values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValueError {
    #[error("Unknown value type '{0}' - no factory registered under this name")]
    UnknownType(String),

    #[error("Type mismatch: expected '{expected}', but found '{found}'")]
    TypeMismatch { expected: String, found: String },

    #[error("Failed to read a '{type_name}' value from JSON: {message}")]
    Deserialize { type_name: String, message: String },

    #[error("Value of type '{0}' cannot be serialized")]
    NotSaveable(String),
}

/// Errors raised by structural graph mutations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Invalid connection {from} -> {to}: {message}")]
    InvalidConnection {
        from: PortRef,
        to: PortRef,
        message: String,
    },

    #[error("Node {0} not found")]
    NodeNotFound(NodeId),

    #[error("Node {node} has no port named '{port}'")]
    PortNotFound { node: NodeId, port: String },

    #[error("Input {input} is already connected from {existing}")]
    InputAlreadyConnected { input: PortRef, existing: PortRef },

    #[error("Ports {from} and {to} are not connected")]
    NotConnected { from: PortRef, to: PortRef },

    #[error("Cannot connect {from} ('{from_type}') to {to} ('{to_type}'): incompatible value types")]
    IncompatibleTypes {
        from: PortRef,
        to: PortRef,
        from_type: String,
        to_type: String,
    },

    #[error("Node {0} is not a network")]
    NotANetwork(NodeId),

    #[error("Cannot change the type of node {node}: {message}")]
    MetadataChange { node: NodeId, message: String },

    #[error("Node {0} already exists in the graph")]
    DuplicateNode(NodeId),

    #[error(transparent)]
    Value(#[from] ValueError),
}

/// Errors that abort a load, paste or import as a whole.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Could not read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse document JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Referenced source '{path}' could not be resolved: {message}")]
    Source { path: String, message: String },
}

/// Errors that can occur while evaluating node compute callbacks.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    #[error("Dependency cycle detected at node {0}")]
    Cycle(NodeId),

    #[error("Node {0} not found")]
    NodeNotFound(NodeId),

    #[error("Node {node} has no {category} port named '{port}'")]
    PortNotFound {
        node: NodeId,
        port: String,
        category: &'static str,
    },

    #[error("Compute of node {node} failed: {message}")]
    Compute { node: NodeId, message: String },

    #[error(transparent)]
    Value(#[from] ValueError),
}

/// Errors that can occur when reading a session configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid node type definition '{type_name}': {message}")]
    Definition { type_name: String, message: String },
}
