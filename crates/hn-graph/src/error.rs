//! Topology error types.

use hn_core::{ElemId, HnError, NodeId};

pub type GraphResult<T> = Result<T, GraphError>;

/// Topology construction and validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// The network has fewer nodes than a solvable system needs.
    TooFewNodes { count: usize, min: usize },

    /// An element connects a node to itself.
    SelfLoop { elem: ElemId, node: NodeId },

    /// An element references a node beyond the declared node count.
    NodeOutOfRange {
        elem: ElemId,
        node: NodeId,
        node_count: usize,
    },

    /// A node index too large to be stored as a `NodeId`.
    NodeIndexOverflow { elem: ElemId, index: u32 },

    /// A node index inside the node range is not touched by any element.
    IsolatedNode { node: NodeId },

    /// The network splits into several unconnected parts.
    Disconnected { components: usize },
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphError::TooFewNodes { count, min } => {
                write!(f, "Network has {} nodes (at least {} required)", count, min)
            }
            GraphError::SelfLoop { elem, node } => {
                write!(f, "Element {} connects node {} to itself", elem, node)
            }
            GraphError::NodeOutOfRange {
                elem,
                node,
                node_count,
            } => {
                write!(
                    f,
                    "Element {} references node {} but the network declares {} nodes",
                    elem, node, node_count
                )
            }
            GraphError::NodeIndexOverflow { elem, index } => {
                write!(f, "Element {} references unrepresentable node index {}", elem, index)
            }
            GraphError::IsolatedNode { node } => {
                write!(f, "Node {} is not connected to any element", node)
            }
            GraphError::Disconnected { components } => {
                write!(
                    f,
                    "Network consists of {} unconnected parts (expected 1)",
                    components
                )
            }
        }
    }
}

impl std::error::Error for GraphError {}

impl From<GraphError> for HnError {
    fn from(err: GraphError) -> Self {
        HnError::Topology {
            what: err.to_string(),
        }
    }
}
