//! Network definition and residual evaluation.

use hn_components::{ElementKind, FlowElement, Pipe, Pump};
use hn_core::{ElemId, NodeId};
use hn_graph::{EdgeStyle, Topology, TopologyBuilder};

use crate::config::SolverConfig;
use crate::error::{SolverError, SolverResult};

/// Placement of the unknowns in the solution vector.
///
/// Mass fluxes come first (one per element, in element order), followed by
/// the node pressures. Equation rows use the same order: element `e` owns
/// row `e`, node `n` owns row `E + n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownLayout {
    elements: usize,
    nodes: usize,
}

impl UnknownLayout {
    pub fn new(elements: usize, nodes: usize) -> Self {
        Self { elements, nodes }
    }

    /// Total number of unknowns (and equations).
    pub fn len(&self) -> usize {
        self.elements + self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn element_count(&self) -> usize {
        self.elements
    }

    pub fn node_count(&self) -> usize {
        self.nodes
    }

    pub fn mass_flux(&self, elem: ElemId) -> usize {
        elem.idx()
    }

    pub fn pressure(&self, node: NodeId) -> usize {
        self.elements + node.idx()
    }

    pub fn is_mass_flux(&self, index: usize) -> bool {
        index < self.elements
    }

    /// Split a solution vector into (mass fluxes, pressures).
    pub fn split<'a>(&self, y: &'a [f64]) -> (&'a [f64], &'a [f64]) {
        y.split_at(self.elements)
    }
}

/// An element together with the node indices it connects.
#[derive(Debug)]
pub struct ElementDescriptor {
    pub inlet: u32,
    pub outlet: u32,
    pub element: Box<dyn FlowElement>,
}

impl ElementDescriptor {
    pub fn new(inlet: u32, outlet: u32, element: impl FlowElement + 'static) -> Self {
        Self {
            inlet,
            outlet,
            element: Box::new(element),
        }
    }
}

/// A validated network: topology plus one model per element.
#[derive(Debug)]
pub struct Network {
    topology: Topology,
    elements: Vec<Box<dyn FlowElement>>,
    layout: UnknownLayout,
    mass_flux_scale: f64,
    reference_pressure: f64,
}

impl Network {
    /// Build a network from element descriptors; the node count is derived
    /// from the largest node index referenced.
    pub fn build(descriptors: impl IntoIterator<Item = ElementDescriptor>) -> SolverResult<Self> {
        let mut builder = NetworkBuilder::new();
        for d in descriptors {
            builder.add_boxed(d.inlet, d.outlet, d.element);
        }
        builder.build()
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn layout(&self) -> UnknownLayout {
        self.layout
    }

    pub fn element_count(&self) -> usize {
        self.layout.element_count()
    }

    pub fn node_count(&self) -> usize {
        self.layout.node_count()
    }

    pub fn element(&self, id: ElemId) -> Option<&dyn FlowElement> {
        self.elements.get(id.idx()).map(|e| &**e)
    }

    pub fn mass_flux_scale(&self) -> f64 {
        self.mass_flux_scale
    }

    pub fn reference_pressure(&self) -> f64 {
        self.reference_pressure
    }

    /// Take over the residual scaling from a solver configuration.
    pub(crate) fn apply_config(&mut self, config: &SolverConfig) {
        self.mass_flux_scale = config.mass_flux_scale;
        self.reference_pressure = config.reference_pressure;
    }

    /// Evaluate the residual vector `g = G(y)`.
    ///
    /// Node rows are in scaled mass flux units; element rows are whatever the
    /// element's system function returns. Neither argument may alias the other.
    pub fn update_residual(&self, y: &[f64], g: &mut [f64]) {
        debug_assert_eq!(y.len(), self.layout.len());
        debug_assert_eq!(g.len(), self.layout.len());

        let (mass, pressures) = self.layout.split(y);
        let (elem_rows, node_rows) = g.split_at_mut(self.layout.element_count());

        for node in self.topology.node_ids() {
            node_rows[node.idx()] = self
                .topology
                .incidences(node)
                .iter()
                .map(|inc| inc.port.flux_sign() * mass[inc.elem.idx()])
                .sum();
        }
        node_rows[0] += pressures[0] - self.reference_pressure;

        for (row, (elem, model)) in elem_rows
            .iter_mut()
            .zip(self.topology.elements().iter().zip(&self.elements))
        {
            *row = model.system_function(
                mass[elem.id.idx()] / self.mass_flux_scale,
                pressures[elem.inlet.idx()],
                pressures[elem.outlet.idx()],
            );
        }
    }

    /// Signed mass flux sum per node (scaled units), without the gauge term.
    pub fn node_imbalance(&self, y: &[f64]) -> Vec<f64> {
        let (mass, _) = self.layout.split(y);
        self.topology
            .node_ids()
            .map(|node| {
                self.topology
                    .incidences(node)
                    .iter()
                    .map(|inc| inc.port.flux_sign() * mass[inc.elem.idx()])
                    .sum()
            })
            .collect()
    }

    /// Graphviz rendering with pumps highlighted.
    pub fn to_dot(&self) -> String {
        self.topology.to_dot(|id| match self.elements[id.idx()].kind() {
            ElementKind::Pump => EdgeStyle {
                label: ElementKind::Pump.to_string(),
                color: Some("red"),
            },
            ElementKind::Pipe => EdgeStyle::default(),
        })
    }
}

/// Incremental network construction.
#[derive(Debug, Default)]
pub struct NetworkBuilder {
    topology: TopologyBuilder,
    elements: Vec<Box<dyn FlowElement>>,
}

impl NetworkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the node count up front so that unused indices are reported.
    pub fn with_node_count(mut self, node_count: usize) -> Self {
        self.topology = self.topology.with_node_count(node_count);
        self
    }

    pub fn add_element(
        &mut self,
        inlet: u32,
        outlet: u32,
        element: impl FlowElement + 'static,
    ) -> ElemId {
        self.add_boxed(inlet, outlet, Box::new(element))
    }

    pub fn add_boxed(
        &mut self,
        inlet: u32,
        outlet: u32,
        element: Box<dyn FlowElement>,
    ) -> ElemId {
        let id = self.topology.add_element(inlet, outlet);
        self.elements.push(element);
        id
    }

    /// Add a pipe with the given quadratic resistance (Pa·s²/kg²).
    pub fn add_pipe(
        &mut self,
        inlet: u32,
        outlet: u32,
        resistance: f64,
    ) -> SolverResult<ElemId> {
        let pipe = Pipe::new(resistance)?;
        Ok(self.add_element(inlet, outlet, pipe))
    }

    pub fn add_pump(
        &mut self,
        inlet: u32,
        outlet: u32,
        pump: Pump,
    ) -> ElemId {
        self.add_element(inlet, outlet, pump)
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn build(self) -> SolverResult<Network> {
        let topology = self.topology.build()?;
        if topology.element_count() != self.elements.len() {
            return Err(SolverError::ProblemSetup {
                what: format!(
                    "{} elements in topology but {} element models",
                    topology.element_count(),
                    self.elements.len()
                ),
            });
        }
        let layout = UnknownLayout::new(topology.element_count(), topology.node_count());
        let defaults = SolverConfig::default();
        Ok(Network {
            topology,
            elements: self.elements,
            layout,
            mass_flux_scale: defaults.mass_flux_scale,
            reference_pressure: defaults.reference_pressure,
        })
    }
}
