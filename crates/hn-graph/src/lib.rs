//! hn-graph: topology layer for hydronet.
//!
//! Provides:
//! - Core topology data structures (Element, PortKind, Topology)
//! - Incremental topology builder with validation
//! - Compact node → element adjacency for residual assembly
//! - Graphviz export
//!
//! # Example
//!
//! ```
//! use hn_graph::TopologyBuilder;
//!
//! let mut builder = TopologyBuilder::new();
//! builder.add_element(0, 1);
//! builder.add_element(1, 0);
//! let topology = builder.build().unwrap();
//!
//! assert_eq!(topology.node_count(), 2);
//! assert_eq!(topology.element_count(), 2);
//! ```

pub mod builder;
pub mod dot;
pub mod error;
pub mod graph;
pub(crate) mod validate;

// Re-exports for ergonomics
pub use builder::TopologyBuilder;
pub use dot::EdgeStyle;
pub use error::{GraphError, GraphResult};
pub use graph::{Element, Incidence, PortKind, Topology};
