//! Core topology data structures.

use hn_core::{ElemId, NodeId};

/// Which end of a flow element a node is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortKind {
    /// Inlet end: positive mass flux leaves the node.
    Inlet,
    /// Outlet end: positive mass flux enters the node.
    Outlet,
}

impl PortKind {
    /// Sign of the element's mass flux in the attached node's mass balance.
    pub fn flux_sign(self) -> f64 {
        match self {
            PortKind::Inlet => -1.0,
            PortKind::Outlet => 1.0,
        }
    }
}

/// A flow element's connectivity: exactly two distinct nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Element {
    pub id: ElemId,
    pub inlet: NodeId,
    pub outlet: NodeId,
}

/// One entry of a node's adjacency list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Incidence {
    pub elem: ElemId,
    pub port: PortKind,
}

/// The topology: a validated, immutable set of flow elements and the nodes they join.
///
/// Nodes carry no state beyond connectivity. For each node the incident
/// elements are stored in a compact offset + flat list layout, sorted by
/// element index.
#[derive(Debug, Clone)]
pub struct Topology {
    pub(crate) node_count: usize,
    pub(crate) elements: Vec<Element>,

    /// Node i's incidences are in node_incidences[node_offsets[i]..node_offsets[i+1]].
    pub(crate) node_offsets: Vec<usize>,
    pub(crate) node_incidences: Vec<Incidence>,
}

impl Topology {
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Return all elements in index order.
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Get an element by ID (returns None if ID out of bounds).
    pub fn element(&self, id: ElemId) -> Option<&Element> {
        self.elements.get(id.idx())
    }

    /// Iterate over all node IDs in index order.
    pub fn node_ids(&self) -> impl ExactSizeIterator<Item = NodeId> + '_ {
        (0..self.node_count as u32).map(NodeId::from_index)
    }

    /// Elements incident to a node, with the end they attach by.
    pub fn incidences(&self, node: NodeId) -> &[Incidence] {
        let idx = node.idx();
        if idx >= self.node_count {
            return &[];
        }
        let start = self.node_offsets[idx];
        let end = self.node_offsets[idx + 1];
        &self.node_incidences[start..end]
    }

    /// Number of elements attached to a node.
    pub fn degree(&self, node: NodeId) -> usize {
        self.incidences(node).len()
    }

    /// Largest node degree in the network.
    pub fn max_degree(&self) -> usize {
        self.node_ids().map(|n| self.degree(n)).max().unwrap_or(0)
    }
}
