//! Topology validation logic.

use hn_core::NodeId;
use petgraph::algo::connected_components;
use petgraph::graph::{NodeIndex, UnGraph};

use crate::error::{GraphError, GraphResult};
use crate::graph::Element;

/// Smallest network that yields a meaningful system: one element, two nodes.
pub(crate) const MIN_NODE_COUNT: usize = 2;

/// Validate element endpoints: node range, distinct ends, minimum size.
pub(crate) fn validate_elements(elements: &[Element], node_count: usize) -> GraphResult<()> {
    if node_count < MIN_NODE_COUNT || elements.is_empty() {
        return Err(GraphError::TooFewNodes {
            count: node_count,
            min: MIN_NODE_COUNT,
        });
    }

    for elem in elements {
        if elem.inlet == elem.outlet {
            return Err(GraphError::SelfLoop {
                elem: elem.id,
                node: elem.inlet,
            });
        }
        for node in [elem.inlet, elem.outlet] {
            if node.idx() >= node_count {
                return Err(GraphError::NodeOutOfRange {
                    elem: elem.id,
                    node,
                    node_count,
                });
            }
        }
    }

    Ok(())
}

/// Every node in range must be touched by at least one element.
///
/// Expects endpoints already checked against `node_count`. Works on the
/// sorted endpoint list so that its cost never depends on `node_count`.
pub(crate) fn validate_coverage(node_count: usize, elements: &[Element]) -> GraphResult<()> {
    let mut used: Vec<usize> = elements
        .iter()
        .flat_map(|e| [e.inlet.idx(), e.outlet.idx()])
        .collect();
    used.sort_unstable();
    used.dedup();

    let covered = used
        .iter()
        .enumerate()
        .take_while(|&(expected, &node)| expected == node)
        .count();
    if covered < node_count {
        return Err(GraphError::IsolatedNode {
            node: NodeId::from_index(covered as u32),
        });
    }
    Ok(())
}

/// The network must form a single connected part; one reference pressure
/// can only fix the pressure level of one part.
pub(crate) fn validate_connectivity(node_count: usize, elements: &[Element]) -> GraphResult<()> {
    let mut graph = UnGraph::<(), ()>::with_capacity(node_count, elements.len());
    for _ in 0..node_count {
        graph.add_node(());
    }
    for elem in elements {
        graph.add_edge(
            NodeIndex::new(elem.inlet.idx()),
            NodeIndex::new(elem.outlet.idx()),
            (),
        );
    }

    let components = connected_components(&graph);
    if components != 1 {
        return Err(GraphError::Disconnected { components });
    }
    Ok(())
}
