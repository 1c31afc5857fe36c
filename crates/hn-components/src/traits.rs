//! Core trait for flow element models.

use crate::error::{ComponentError, ComponentResult};
use std::fmt;

/// Closed set of element kinds, for reporting and graph export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Pipe,
    Pump,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKind::Pipe => f.write_str("pipe"),
            ElementKind::Pump => f.write_str("pump"),
        }
    }
}

/// Trait for elements that connect an inlet node to an outlet node.
///
/// Elements are deterministic functions of mass flux and end pressures; they
/// hold parameters only and never mutate during a solve.
///
/// Units: mass flux in kg/s (positive inlet → outlet), pressures in Pa.
pub trait FlowElement: Send + Sync + fmt::Debug {
    /// Element kind for reporting.
    fn kind(&self) -> ElementKind;

    /// Residual of the element's physical law.
    ///
    /// Returns zero exactly when `(mdot, p_inlet, p_outlet)` satisfy the law.
    /// Continuous and differentiable almost everywhere.
    fn system_function(&self, mdot: f64, p_inlet: f64, p_outlet: f64) -> f64;

    /// Optional: mass flux that zeroes `system_function` for the given pressures.
    ///
    /// Default implementation returns NotSupported.
    fn mass_flux(&self, _p_inlet: f64, _p_outlet: f64) -> ComponentResult<f64> {
        Err(ComponentError::NotSupported {
            what: "mass_flux not implemented for this element",
        })
    }

    /// Optional: derivative of `mass_flux` with respect to the inlet pressure.
    ///
    /// The derivative with respect to the outlet pressure is the negative of it.
    /// Default implementation returns NotSupported.
    fn dmdot_dp(&self, _p_inlet: f64, _p_outlet: f64) -> ComponentResult<f64> {
        Err(ComponentError::NotSupported {
            what: "dmdot_dp not implemented for this element",
        })
    }
}
