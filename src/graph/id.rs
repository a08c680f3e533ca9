use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Stable, process-wide unique node identifier.
///
/// Identity is never positional: a node keeps its id for its whole lifetime, including
/// while it sits in the undo history after a removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(u64);

impl NodeId {
    pub(crate) const MIN: NodeId = NodeId(0);
    pub(crate) const MAX: NodeId = NodeId(u64::MAX);

    /// Mints a fresh id, distinct from every id minted before in this process.
    pub fn mint() -> Self {
        Self(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Addresses one port: the owning node and the port's index in the node's port list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PortRef {
    pub node: NodeId,
    pub port: usize,
}

impl PortRef {
    pub(crate) const MIN: PortRef = PortRef {
        node: NodeId::MIN,
        port: 0,
    };
    pub(crate) const MAX: PortRef = PortRef {
        node: NodeId::MAX,
        port: usize::MAX,
    };

    pub fn new(node: NodeId, port: usize) -> Self {
        Self { node, port }
    }
}

impl fmt::Display for PortRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.node, self.port)
    }
}
