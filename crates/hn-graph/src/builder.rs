//! Incremental topology builder.

use hn_core::{ElemId, NodeId};

use crate::error::{GraphError, GraphResult};
use crate::graph::{Element, Incidence, PortKind, Topology};
use crate::validate;

/// Builder for constructing a topology from flow-element endpoints.
///
/// Nodes are not added explicitly: the node count is derived as the largest
/// referenced node index + 1, unless a count is declared with
/// [`TopologyBuilder::with_node_count`].
#[derive(Debug, Default)]
pub struct TopologyBuilder {
    /// Raw (inlet, outlet) node indices, checked in `build()`.
    endpoints: Vec<(u32, u32)>,
    declared_node_count: Option<usize>,
}

impl TopologyBuilder {
    /// Create a new empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the expected node count. Elements referencing nodes beyond it
    /// are rejected by `build()`.
    pub fn with_node_count(mut self, node_count: usize) -> Self {
        self.declared_node_count = Some(node_count);
        self
    }

    /// Add a flow element between two node indices and return its ID.
    ///
    /// Indices are not checked until `build()`.
    pub fn add_element(&mut self, inlet: u32, outlet: u32) -> ElemId {
        let id = ElemId::from_index(self.endpoints.len() as u32);
        self.endpoints.push((inlet, outlet));
        id
    }

    /// Number of elements added so far.
    pub fn element_count(&self) -> usize {
        self.endpoints.len()
    }

    /// Validate and freeze into an immutable `Topology`.
    ///
    /// Node coverage is checked before any per-node storage is allocated.
    pub fn build(self) -> GraphResult<Topology> {
        let elements = Self::resolve_endpoints(&self.endpoints)?;
        let derived = elements
            .iter()
            .map(|e| e.inlet.idx().max(e.outlet.idx()) + 1)
            .max()
            .unwrap_or(0);
        let node_count = self.declared_node_count.unwrap_or(derived);

        validate::validate_elements(&elements, node_count)?;
        validate::validate_coverage(node_count, &elements)?;
        validate::validate_connectivity(node_count, &elements)?;

        let (node_offsets, node_incidences) = Self::build_adjacency(node_count, &elements);

        Ok(Topology {
            node_count,
            elements,
            node_offsets,
            node_incidences,
        })
    }

    fn resolve_endpoints(endpoints: &[(u32, u32)]) -> GraphResult<Vec<Element>> {
        endpoints
            .iter()
            .enumerate()
            .map(|(i, &(inlet, outlet))| -> GraphResult<Element> {
                let elem = ElemId::from_index(i as u32);
                let node = |index: u32| {
                    NodeId::try_from_index(index)
                        .ok_or(GraphError::NodeIndexOverflow { elem, index })
                };
                Ok(Element {
                    id: elem,
                    inlet: node(inlet)?,
                    outlet: node(outlet)?,
                })
            })
            .collect()
    }

    /// Build compact adjacency lists: for each node, its incident elements.
    ///
    /// Elements are visited in index order, so each node's list is sorted.
    fn build_adjacency(node_count: usize, elements: &[Element]) -> (Vec<usize>, Vec<Incidence>) {
        let mut per_node: Vec<Vec<Incidence>> = vec![Vec::new(); node_count];
        for elem in elements {
            per_node[elem.inlet.idx()].push(Incidence {
                elem: elem.id,
                port: PortKind::Inlet,
            });
            per_node[elem.outlet.idx()].push(Incidence {
                elem: elem.id,
                port: PortKind::Outlet,
            });
        }

        let mut offsets = Vec::with_capacity(node_count + 1);
        let mut flat = Vec::with_capacity(2 * elements.len());
        offsets.push(0);
        for list in per_node {
            flat.extend(list);
            offsets.push(flat.len());
        }

        (offsets, flat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_basic() {
        let mut builder = TopologyBuilder::new();
        let e0 = builder.add_element(0, 1);
        let e1 = builder.add_element(1, 0);

        assert_eq!(e0.index(), 0);
        assert_eq!(e1.index(), 1);
        assert_eq!(builder.element_count(), 2);
    }

    #[test]
    fn node_count_is_derived() {
        let mut builder = TopologyBuilder::new();
        builder.add_element(0, 2);
        builder.add_element(2, 1);
        builder.add_element(1, 0);
        let topo = builder.build().unwrap();
        assert_eq!(topo.node_count(), 3);
    }

    #[test]
    fn adjacency_lists_both_ends() {
        let mut builder = TopologyBuilder::new();
        let e0 = builder.add_element(0, 1);
        let e1 = builder.add_element(1, 0);
        let topo = builder.build().unwrap();

        let n0 = topo.incidences(NodeId::from_index(0));
        assert_eq!(
            n0,
            &[
                Incidence {
                    elem: e0,
                    port: PortKind::Inlet
                },
                Incidence {
                    elem: e1,
                    port: PortKind::Outlet
                },
            ]
        );
    }

    #[test]
    fn declared_node_count_rejects_overflow() {
        let mut builder = TopologyBuilder::new().with_node_count(2);
        builder.add_element(0, 1);
        builder.add_element(1, 2);
        let err = builder.build().unwrap_err();
        assert!(matches!(err, GraphError::NodeOutOfRange { node_count: 2, .. }));
    }

    #[test]
    fn declared_node_count_larger_than_used_is_isolated() {
        let mut builder = TopologyBuilder::new().with_node_count(3);
        builder.add_element(0, 1);
        builder.add_element(1, 0);
        let err = builder.build().unwrap_err();
        assert_eq!(
            err,
            GraphError::IsolatedNode {
                node: NodeId::from_index(2)
            }
        );
    }

    #[test]
    fn unrepresentable_node_index_is_an_error() {
        let mut builder = TopologyBuilder::new();
        builder.add_element(0, 1);
        let e1 = builder.add_element(1, u32::MAX);
        assert_eq!(
            builder.build().unwrap_err(),
            GraphError::NodeIndexOverflow {
                elem: e1,
                index: u32::MAX
            }
        );
    }

    #[test]
    fn sparse_node_indices_report_the_first_gap() {
        let mut builder = TopologyBuilder::new();
        builder.add_element(0, 1);
        builder.add_element(1, 4_000_000_000);
        builder.add_element(4_000_000_000, 0);
        assert_eq!(
            builder.build().unwrap_err(),
            GraphError::IsolatedNode {
                node: NodeId::from_index(2)
            }
        );
    }

    #[test]
    fn huge_declared_node_count_is_isolated() {
        let mut builder = TopologyBuilder::new().with_node_count(usize::MAX);
        builder.add_element(0, 1);
        builder.add_element(1, 0);
        assert!(matches!(
            builder.build(),
            Err(GraphError::IsolatedNode { .. })
        ));
    }
}
