//! Steady-state hydraulic network solver.
//!
//! This crate provides a Newton-Raphson solver for networks of flow elements
//! (pipes, pumps). The unknowns are the mass flux through every element and the
//! pressure at every node; the equations are a mass balance per node and the
//! pressure-loss law of every element. Node 0 additionally carries a reference
//! pressure constraint, which removes the additive pressure offset.
//!
//! The Jacobian is approximated with finite differences, either column by
//! column into a dense matrix (factorized with partial-pivoting LU) or by
//! perturbing graph-colored column groups of a sparse matrix (factorized with
//! a sparse LU whose symbolic analysis is reused across iterations).
//!
//! # Example
//!
//! ```
//! use hn_components::Pump;
//! use hn_solver::{NetworkBuilder, NewtonSolver, SolverConfig};
//!
//! let mut builder = NetworkBuilder::new();
//! builder.add_pump(0, 1, Pump::default());
//! builder.add_pipe(1, 0, 1000.0).unwrap();
//! let network = builder.build().unwrap();
//!
//! let mut solver = NewtonSolver::new(network, SolverConfig::default()).unwrap();
//! let summary = solver.solve().unwrap();
//! assert!(summary.residual_norm < 1.0);
//! ```

pub mod coloring;
pub mod config;
pub mod error;
pub mod factor;
pub mod jacobian;
pub mod network;
pub mod newton;
pub mod solution;
pub mod sparsity;

pub use coloring::ColorGroups;
pub use config::{Damping, JacobianStrategy, SolverConfig};
pub use error::{SolverError, SolverResult};
pub use factor::{DenseLu, FactorError, FactorStage, Factorizer, SparseLu};
pub use jacobian::{ColoredAssembler, DenseAssembler, JacobianAssembler, SparseJacobian};
pub use network::{ElementDescriptor, Network, NetworkBuilder, UnknownLayout};
pub use newton::{FailureReason, NewtonSolver, NewtonState, SolveSummary};
pub use solution::NetworkSolution;
pub use sparsity::{CsrIndex, SparsityPattern};
