//! Physical view of a solution vector.

use hn_core::units::{MassRate, Pressure, kgps, pa};
use hn_core::{ElemId, NodeId};

use crate::network::Network;

/// Solution state for a hydraulic network.
#[derive(Clone, Debug)]
pub struct NetworkSolution {
    /// Element mass fluxes, indexed by element (kg/s)
    pub mass_fluxes: Vec<MassRate>,
    /// Node pressures, indexed by node (Pa)
    pub pressures: Vec<Pressure>,
    /// RMS residual at the reported iterate
    pub residual_norm: f64,
    /// Newton steps taken by the last solve
    pub iterations: usize,
}

impl NetworkSolution {
    /// Unpack `[mdot_0·s, .., mdot_E·s, p_0, .., p_N]` into physical quantities.
    pub(crate) fn unpack(network: &Network, y: &[f64], residual_norm: f64, iterations: usize) -> Self {
        let (mass, pressures) = network.layout().split(y);
        let scale = network.mass_flux_scale();
        Self {
            mass_fluxes: mass.iter().map(|m| kgps(m / scale)).collect(),
            pressures: pressures.iter().map(|&p| pa(p)).collect(),
            residual_norm,
            iterations,
        }
    }

    pub fn mass_flux(&self, elem: ElemId) -> Option<MassRate> {
        self.mass_fluxes.get(elem.idx()).copied()
    }

    pub fn pressure(&self, node: NodeId) -> Option<Pressure> {
        self.pressures.get(node.idx()).copied()
    }
}
