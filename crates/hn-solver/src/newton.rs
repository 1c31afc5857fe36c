//! Newton-Raphson driver for the network equations.

use hn_core::numeric::rms_norm;
use hn_core::units::{MassRate, Pressure, kgps, pa};
use hn_core::{ElemId, NodeId};
use tracing::{debug, info, trace, warn};

use crate::config::{Damping, JacobianStrategy, SolverConfig};
use crate::error::{SolverError, SolverResult};
use crate::factor::{DenseLu, FactorError, FactorStage, Factorizer, SparseLu};
use crate::jacobian::{ColoredAssembler, DenseAssembler, JacobianAssembler};
use crate::network::{Network, UnknownLayout};
use crate::solution::NetworkSolution;
use crate::sparsity::SparsityPattern;

/// Offset keeping the clamp denominator away from zero.
const DAMPING_DENOMINATOR_OFFSET: f64 = 1e-6;

/// Outcome of a successful solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveSummary {
    /// Newton steps taken (0 if the starting point already met the threshold)
    pub iterations: usize,
    /// RMS residual at the returned solution
    pub residual_norm: f64,
}

/// Why a solve stopped without converging.
#[derive(Debug, Clone, PartialEq)]
pub enum FailureReason {
    Singular {
        iteration: usize,
    },
    MaxIterations {
        iterations: usize,
        residual_norm: f64,
    },
    /// The residual evaluated to NaN or infinity.
    NonFinite {
        iteration: usize,
    },
    Factorization {
        iteration: usize,
        stage: FactorStage,
        what: String,
    },
}

impl FailureReason {
    fn at(iteration: usize, err: FactorError) -> Self {
        match err {
            FactorError::Backend { stage, what } => FailureReason::Factorization {
                iteration,
                stage,
                what,
            },
            FactorError::Singular | FactorError::NotFactorized => {
                FailureReason::Singular { iteration }
            }
        }
    }

    pub fn to_error(&self) -> SolverError {
        match self {
            FailureReason::Singular { iteration } => SolverError::SingularJacobian {
                iteration: *iteration,
            },
            FailureReason::MaxIterations {
                iterations,
                residual_norm,
            } => SolverError::NonConvergence {
                iterations: *iterations,
                residual_norm: *residual_norm,
            },
            FailureReason::NonFinite { iteration } => SolverError::NonFiniteResidual {
                iteration: *iteration,
            },
            FailureReason::Factorization { stage, what, .. } => SolverError::SparseFactorization {
                stage: *stage,
                what: what.clone(),
            },
        }
    }
}

/// Solver lifecycle.
///
/// `Converged` and `Failed` are terminal until [`NewtonSolver::reset`];
/// solving again from `Converged` re-checks the residual and returns
/// immediately, solving again from `Failed` re-reports the failure.
#[derive(Debug, Clone, PartialEq)]
pub enum NewtonState {
    Init,
    Iterating { iteration: usize },
    Converged(SolveSummary),
    Failed(FailureReason),
}

enum LinearBackend {
    Dense {
        assembler: DenseAssembler,
        lu: DenseLu,
    },
    Sparse {
        assembler: ColoredAssembler,
        lu: SparseLu,
    },
}

impl LinearBackend {
    fn new(network: &Network, config: &SolverConfig) -> SolverResult<Self> {
        let n = network.layout().len();
        match config.strategy {
            JacobianStrategy::Dense => Ok(LinearBackend::Dense {
                assembler: DenseAssembler::new(n, config.jacobian_eps),
                lu: DenseLu::new(),
            }),
            JacobianStrategy::SparseColored => {
                let pattern = SparsityPattern::from_network(network);
                debug_assert!(pattern.is_symmetric());
                let assembler = ColoredAssembler::new(&pattern, config.jacobian_eps);
                let lu = SparseLu::new(assembler.jacobian().index()).map_err(|e| match e {
                    FactorError::Backend { stage, what } => {
                        SolverError::SparseFactorization { stage, what }
                    }
                    other => SolverError::ProblemSetup {
                        what: other.to_string(),
                    },
                })?;
                debug!(
                    unknowns = n,
                    nnz = pattern.nnz(),
                    colors = assembler.colors().color_count(),
                    "sparse Jacobian prepared"
                );
                Ok(LinearBackend::Sparse { assembler, lu })
            }
        }
    }

    fn assembler(&self) -> &dyn JacobianAssembler {
        match self {
            LinearBackend::Dense { assembler, .. } => assembler as &dyn JacobianAssembler,
            LinearBackend::Sparse { assembler, .. } => assembler as &dyn JacobianAssembler,
        }
    }

    fn assemble(&mut self, network: &Network, y: &mut [f64], g: &[f64], work: &mut [f64]) {
        match self {
            LinearBackend::Dense { assembler, .. } => assembler.assemble(network, y, g, work),
            LinearBackend::Sparse { assembler, .. } => assembler.assemble(network, y, g, work),
        }
    }

    fn factorize(&mut self) -> Result<(), FactorError> {
        match self {
            LinearBackend::Dense { assembler, lu } => lu.factorize(assembler.matrix()),
            LinearBackend::Sparse { assembler, lu } => lu.factorize(assembler.jacobian()),
        }
    }

    fn solve_in_place(&self, rhs: &mut [f64]) -> Result<(), FactorError> {
        match self {
            LinearBackend::Dense { lu, .. } => lu.solve_in_place(rhs),
            LinearBackend::Sparse { lu, .. } => lu.solve_in_place(rhs),
        }
    }
}

/// Fraction of the Newton step to apply.
pub(crate) fn step_scale(
    damping: Option<Damping>,
    layout: UnknownLayout,
    y: &[f64],
    delta: &[f64],
) -> f64 {
    match damping {
        None => 1.0,
        Some(Damping::ClampNegative { floor }) => {
            let mut scale = 1.0_f64;
            for i in 0..layout.element_count() {
                let (yi, di) = (y[i], delta[i]);
                if yi > floor && yi + di < 0.0 {
                    scale = scale.min((floor - yi) / (di - DAMPING_DENOMINATOR_OFFSET));
                }
            }
            scale
        }
    }
}

/// Newton-Raphson solver owning a network and its solution vector.
pub struct NewtonSolver {
    network: Network,
    config: SolverConfig,
    backend: LinearBackend,
    y: Vec<f64>,
    g: Vec<f64>,
    work: Vec<f64>,
    delta: Vec<f64>,
    residual_norm: f64,
    iterations: usize,
    state: NewtonState,
}

impl NewtonSolver {
    /// Prepare a solver: fixes the unknown layout, analyses the sparsity
    /// pattern (sparse strategy) and sets every unknown to the initial guess.
    pub fn new(mut network: Network, config: SolverConfig) -> SolverResult<Self> {
        config.validate()?;
        network.apply_config(&config);
        let n = network.layout().len();
        let backend = LinearBackend::new(&network, &config)?;
        Ok(Self {
            y: vec![config.initial_guess; n],
            g: vec![0.0; n],
            work: vec![0.0; n],
            delta: vec![0.0; n],
            residual_norm: f64::INFINITY,
            iterations: 0,
            state: NewtonState::Init,
            network,
            config,
            backend,
        })
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn state(&self) -> &NewtonState {
        &self.state
    }

    /// Current unknowns in canonical order (scaled mass fluxes, then pressures).
    pub fn unknowns(&self) -> &[f64] {
        &self.y
    }

    /// Residual at the last evaluated iterate.
    pub fn residual(&self) -> &[f64] {
        &self.g
    }

    /// Residual evaluations spent per Jacobian assembly.
    pub fn evaluations_per_jacobian(&self) -> usize {
        self.backend.assembler().evaluations_per_assembly()
    }

    /// Jacobian of the last assembly.
    pub fn jacobian(&self) -> &dyn JacobianAssembler {
        self.backend.assembler()
    }

    /// Return to `Init` with every unknown at the initial guess.
    pub fn reset(&mut self) {
        self.y.fill(self.config.initial_guess);
        self.g.fill(0.0);
        self.residual_norm = f64::INFINITY;
        self.iterations = 0;
        self.state = NewtonState::Init;
    }

    /// Iterate until the RMS residual drops below the threshold.
    pub fn solve(&mut self) -> SolverResult<SolveSummary> {
        if let NewtonState::Failed(reason) = &self.state {
            return Err(reason.to_error());
        }

        let layout = self.network.layout();
        let mut iteration = 0;
        loop {
            self.state = NewtonState::Iterating { iteration };
            self.network.update_residual(&self.y, &mut self.g);
            let norm = rms_norm(&self.g);
            self.residual_norm = norm;
            debug!(iteration, residual = norm, "newton iteration");
            trace!(y = ?self.y, "unknowns");

            if !norm.is_finite() {
                return Err(self.fail(FailureReason::NonFinite { iteration }));
            }
            if norm < self.config.residual_threshold {
                let summary = SolveSummary {
                    iterations: iteration,
                    residual_norm: norm,
                };
                self.iterations = iteration;
                self.state = NewtonState::Converged(summary);
                info!(iterations = iteration, residual = norm, "network converged");
                return Ok(summary);
            }
            if iteration >= self.config.max_iterations {
                return Err(self.fail(FailureReason::MaxIterations {
                    iterations: iteration,
                    residual_norm: norm,
                }));
            }

            self.backend
                .assemble(&self.network, &mut self.y, &self.g, &mut self.work);
            for (d, g) in self.delta.iter_mut().zip(&self.g) {
                *d = -g;
            }
            if let Err(e) = self.backend.factorize() {
                return Err(self.fail(FailureReason::at(iteration, e)));
            }
            if let Err(e) = self.backend.solve_in_place(&mut self.delta) {
                return Err(self.fail(FailureReason::at(iteration, e)));
            }
            if self.config.verify_linear_solve {
                self.log_linear_residual(iteration);
            }

            let scale = step_scale(self.config.damping, layout, &self.y, &self.delta);
            if scale < 1.0 {
                debug!(iteration, scale, "damped newton step");
            }
            for (y, d) in self.y.iter_mut().zip(&self.delta) {
                *y += scale * d;
            }
            iteration += 1;
            self.iterations = iteration;
        }
    }

    fn fail(&mut self, reason: FailureReason) -> SolverError {
        warn!(?reason, "newton solve failed");
        let err = reason.to_error();
        self.state = NewtonState::Failed(reason);
        err
    }

    /// Log `max |J·Δ + G|`.
    fn log_linear_residual(&mut self, iteration: usize) {
        self.backend
            .assembler()
            .multiply(&self.delta, &mut self.work);
        let max_error = self
            .work
            .iter()
            .zip(&self.g)
            .map(|(jd, g)| (jd + g).abs())
            .fold(0.0_f64, f64::max);
        debug!(iteration, max_error, "linear solve check");
    }

    /// Physical view of the current iterate.
    pub fn solution(&self) -> NetworkSolution {
        NetworkSolution::unpack(&self.network, &self.y, self.residual_norm, self.iterations)
    }

    pub fn mass_flux(&self, elem: ElemId) -> Option<MassRate> {
        (elem.idx() < self.network.element_count()).then(|| {
            let i = self.network.layout().mass_flux(elem);
            kgps(self.y[i] / self.network.mass_flux_scale())
        })
    }

    pub fn pressure(&self, node: NodeId) -> Option<Pressure> {
        (node.idx() < self.network.node_count())
            .then(|| pa(self.y[self.network.layout().pressure(node)]))
    }
}

impl std::fmt::Debug for NewtonSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewtonSolver")
            .field("unknowns", &self.y.len())
            .field("strategy", &self.config.strategy)
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::NetworkBuilder;
    use hn_components::Pump;

    fn pump_loop() -> Network {
        let mut b = NetworkBuilder::new();
        b.add_pump(0, 1, Pump::default());
        b.add_pipe(1, 0, 1000.0).unwrap();
        b.build().unwrap()
    }

    #[test]
    fn clamp_scales_sign_flip_onto_floor() {
        let layout = UnknownLayout::new(2, 1);
        let y = [100.0, 50.0, 0.0];
        let delta = [-300.0, 10.0, 1e6];
        let s = step_scale(Some(Damping::clamp_negative()), layout, &y, &delta);
        let landed = y[0] + s * delta[0];
        assert!(s > 0.0 && s < 1.0);
        assert!((landed - 0.01).abs() < 1e-3);
        // pressures are never clamped
        let pressure_drop = [0.0, 0.0, -1e6];
        let s = step_scale(Some(Damping::clamp_negative()), layout, &y, &pressure_drop);
        assert_eq!(s, 1.0);
        assert_eq!(step_scale(None, layout, &y, &delta), 1.0);
    }

    #[test]
    fn clamp_ignores_already_negative_flux() {
        let layout = UnknownLayout::new(1, 1);
        let s = step_scale(Some(Damping::clamp_negative()), layout, &[-5.0, 0.0], &[-10.0, 0.0]);
        assert_eq!(s, 1.0);
    }

    #[test]
    fn pump_loop_converges_and_stays_converged() {
        let mut solver = NewtonSolver::new(pump_loop(), SolverConfig::default()).unwrap();
        assert_eq!(solver.state(), &NewtonState::Init);

        let summary = solver.solve().unwrap();
        assert!(summary.residual_norm < 1.0);
        assert!(matches!(solver.state(), NewtonState::Converged(_)));

        // same flux through both elements
        let m0 = solver.mass_flux(ElemId::from_index(0)).unwrap().value;
        let m1 = solver.mass_flux(ElemId::from_index(1)).unwrap().value;
        assert!((m0 - m1).abs() < 1e-6);
        assert!(m0 > 0.0);
        assert!(solver.mass_flux(ElemId::from_index(2)).is_none());

        let again = solver.solve().unwrap();
        assert_eq!(again.iterations, 0);
    }

    #[test]
    fn failure_is_terminal_until_reset() {
        let cfg = SolverConfig::default().with_max_iterations(0);
        let mut solver = NewtonSolver::new(pump_loop(), cfg).unwrap();
        let err = solver.solve().unwrap_err();
        assert!(matches!(err, SolverError::NonConvergence { iterations: 0, .. }));
        assert!(matches!(
            solver.state(),
            NewtonState::Failed(FailureReason::MaxIterations { .. })
        ));
        assert!(matches!(
            solver.solve(),
            Err(SolverError::NonConvergence { .. })
        ));

        solver.reset();
        assert_eq!(solver.state(), &NewtonState::Init);
        assert!(solver.unknowns().iter().all(|&v| v == 200.0));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut cfg = SolverConfig::default();
        cfg.mass_flux_scale = 0.0;
        assert!(matches!(
            NewtonSolver::new(pump_loop(), cfg),
            Err(SolverError::ProblemSetup { .. })
        ));
    }
}
