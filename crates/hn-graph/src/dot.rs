//! Graphviz export of a topology.

use hn_core::ElemId;
use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};

use crate::graph::Topology;

/// How an element is drawn in the exported graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeStyle {
    /// Text shown on the edge; empty for none.
    pub label: String,
    /// Highlight color; `None` keeps the default.
    pub color: Option<&'static str>,
}

impl Topology {
    /// Render the network as a Graphviz digraph.
    ///
    /// Nodes are labelled 1-based; each element becomes an edge from its inlet
    /// to its outlet node, styled by `style`.
    pub fn to_dot<F>(&self, style: F) -> String
    where
        F: Fn(ElemId) -> EdgeStyle,
    {
        let mut graph: DiGraph<String, EdgeStyleLabel> =
            DiGraph::with_capacity(self.node_count, self.elements.len());
        for node in self.node_ids() {
            graph.add_node((node.index() + 1).to_string());
        }
        for elem in &self.elements {
            graph.add_edge(
                NodeIndex::new(elem.inlet.idx()),
                NodeIndex::new(elem.outlet.idx()),
                EdgeStyleLabel(style(elem.id)),
            );
        }

        let dot = Dot::with_attr_getters(
            &graph,
            &[Config::EdgeNoLabel],
            &|_, edge| edge_attributes(&edge.weight().0),
            &|_, _| String::new(),
        );
        format!("{}", dot)
    }
}

/// Display wrapper so edge weights satisfy `Dot`'s formatting bounds.
struct EdgeStyleLabel(EdgeStyle);

impl std::fmt::Display for EdgeStyleLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0.label)
    }
}

fn edge_attributes(style: &EdgeStyle) -> String {
    let mut attrs = Vec::new();
    if !style.label.is_empty() {
        attrs.push(format!("label = \"{}\" fontsize = 7", style.label));
    }
    if let Some(color) = style.color {
        attrs.push(format!("color = {} weight = 200", color));
    }
    attrs.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TopologyBuilder;

    #[test]
    fn dot_lists_every_element() {
        let mut builder = TopologyBuilder::new();
        let pump = builder.add_element(0, 1);
        builder.add_element(1, 2);
        builder.add_element(2, 0);
        let topo = builder.build().unwrap();

        let dot = topo.to_dot(|id| {
            if id == pump {
                EdgeStyle {
                    label: "pump".into(),
                    color: Some("red"),
                }
            } else {
                EdgeStyle::default()
            }
        });

        assert!(dot.starts_with("digraph"));
        assert_eq!(dot.matches("->").count(), 3);
        assert_eq!(dot.matches("pump").count(), 1);
        assert!(dot.contains("color = red"));
    }
}
