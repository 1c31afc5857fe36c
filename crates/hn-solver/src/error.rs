//! Error types for solver operations.

use crate::factor::FactorStage;
use hn_components::ComponentError;
use hn_core::error::HnError;
use hn_graph::GraphError;
use thiserror::Error;

/// Errors that can occur while building or solving a network.
#[derive(Error, Debug)]
pub enum SolverError {
    #[error("Invalid topology: {0}")]
    InvalidTopology(#[from] GraphError),

    #[error("Element error: {0}")]
    Component(#[from] ComponentError),

    #[error("Problem setup error: {what}")]
    ProblemSetup { what: String },

    #[error("Singular Jacobian at iteration {iteration}")]
    SingularJacobian { iteration: usize },

    #[error("No convergence after {iterations} iterations, residual = {residual_norm}")]
    NonConvergence {
        iterations: usize,
        residual_norm: f64,
    },

    #[error("Residual is not finite at iteration {iteration}")]
    NonFiniteResidual { iteration: usize },

    #[error("Sparse LU {stage} factorization failed: {what}")]
    SparseFactorization { stage: FactorStage, what: String },
}

pub type SolverResult<T> = Result<T, SolverError>;

impl From<SolverError> for HnError {
    fn from(e: SolverError) -> Self {
        match e {
            SolverError::InvalidTopology(g) => g.into(),
            SolverError::Component(c) => c.into(),
            other => HnError::Solver {
                what: other.to_string(),
            },
        }
    }
}
