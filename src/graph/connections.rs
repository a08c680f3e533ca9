use super::{NodeId, PortRef};
use std::collections::{BTreeMap, BTreeSet};

/// Bidirectional index of output -> input edges.
///
/// `by_source` is an ordered set of `(output, input)` pairs, so the fan-out of an output is a
/// range query. `by_target` maps each input to its single source.
#[derive(Debug, Clone, Default)]
pub struct Connections {
    by_source: BTreeSet<(PortRef, PortRef)>,
    by_target: BTreeMap<PortRef, PortRef>,
}

impl Connections {
    /// Inserts an edge, dropping any edge previously driving `to`. Returns the dropped source.
    pub(crate) fn insert(&mut self, from: PortRef, to: PortRef) -> Option<PortRef> {
        let previous = self.by_target.insert(to, from);
        if let Some(old) = previous {
            self.by_source.remove(&(old, to));
        }
        self.by_source.insert((from, to));
        previous
    }

    pub(crate) fn remove(&mut self, from: PortRef, to: PortRef) -> bool {
        if !self.by_source.remove(&(from, to)) {
            return false;
        }
        self.by_target.remove(&to);
        true
    }

    /// Removes every edge touching `node`, returning them in index order.
    pub(crate) fn remove_node(&mut self, node: NodeId) -> Vec<(PortRef, PortRef)> {
        let touching: Vec<_> = self
            .by_source
            .iter()
            .filter(|(from, to)| from.node == node || to.node == node)
            .copied()
            .collect();
        for (from, to) in &touching {
            self.remove(*from, *to);
        }
        touching
    }

    /// All edges touching `node`, in index order.
    pub fn touching(&self, node: NodeId) -> Vec<(PortRef, PortRef)> {
        self.by_source
            .iter()
            .filter(|(from, to)| from.node == node || to.node == node)
            .copied()
            .collect()
    }

    /// Source driving `input`, if any. Does not check the port category.
    pub fn source_of(&self, input: PortRef) -> Option<PortRef> {
        self.by_target.get(&input).copied()
    }

    /// Inputs driven by `output`, in index order. Does not check the port category.
    pub fn targets_of(&self, output: PortRef) -> impl Iterator<Item = PortRef> + '_ {
        self.by_source
            .range((output, PortRef::MIN)..=(output, PortRef::MAX))
            .map(|(_, to)| *to)
    }

    pub fn contains(&self, from: PortRef, to: PortRef) -> bool {
        self.by_source.contains(&(from, to))
    }

    pub fn iter(&self) -> impl Iterator<Item = (PortRef, PortRef)> + '_ {
        self.by_source.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.by_source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_source.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.by_source.clear();
        self.by_target.clear();
    }
}
