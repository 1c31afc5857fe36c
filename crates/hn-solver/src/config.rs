//! Solver configuration.

use crate::error::{SolverError, SolverResult};

/// How the Jacobian is assembled and factorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JacobianStrategy {
    /// One residual evaluation per column, dense partial-pivoting LU.
    Dense,
    /// One residual evaluation per color group, sparse LU.
    #[default]
    SparseColored,
}

/// Optional step control applied to each Newton correction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Damping {
    /// Shrink the whole step when it would drive a positive mass flux negative,
    /// so that flux lands on `floor` (scaled units) instead.
    ClampNegative { floor: f64 },
}

impl Damping {
    /// Clamp onto a floor of 0.01 scaled units (10 g/s).
    pub fn clamp_negative() -> Self {
        Damping::ClampNegative { floor: 0.01 }
    }
}

/// Newton solver configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    /// Maximum Newton iterations
    pub max_iterations: usize,
    /// Convergence threshold on the RMS residual (scaled units)
    pub residual_threshold: f64,
    /// Finite-difference step (Pa for pressures, scaled kg/s for mass fluxes)
    pub jacobian_eps: f64,
    /// Factor between kg/s and the mass flux unknowns
    pub mass_flux_scale: f64,
    /// Value every unknown starts from (scaled units)
    pub initial_guess: f64,
    /// Pressure node 0 is pinned to (Pa)
    pub reference_pressure: f64,
    /// Jacobian assembly/factorization path
    pub strategy: JacobianStrategy,
    /// Step control; `None` applies the full Newton step
    pub damping: Option<Damping>,
    /// Multiply back each correction and log how well J·Δ = -G holds
    pub verify_linear_solve: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        let mass_flux_scale = 1000.0;
        Self {
            max_iterations: 100,
            residual_threshold: 1.0,
            jacobian_eps: 1e-6,
            mass_flux_scale,
            initial_guess: 0.2 * mass_flux_scale,
            reference_pressure: 0.0,
            strategy: JacobianStrategy::default(),
            damping: None,
            verify_linear_solve: false,
        }
    }
}

impl SolverConfig {
    pub fn with_strategy(mut self, strategy: JacobianStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_damping(mut self, damping: Damping) -> Self {
        self.damping = Some(damping);
        self
    }

    pub fn with_initial_guess(mut self, initial_guess: f64) -> Self {
        self.initial_guess = initial_guess;
        self
    }

    pub fn with_reference_pressure(mut self, reference_pressure: f64) -> Self {
        self.reference_pressure = reference_pressure;
        self
    }

    pub fn with_verify_linear_solve(mut self, verify: bool) -> Self {
        self.verify_linear_solve = verify;
        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> SolverResult<()> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(self.residual_threshold) {
            return Err(setup("residual_threshold must be positive"));
        }
        if !positive(self.jacobian_eps) {
            return Err(setup("jacobian_eps must be positive"));
        }
        if !positive(self.mass_flux_scale) {
            return Err(setup("mass_flux_scale must be positive"));
        }
        if !self.initial_guess.is_finite() || !self.reference_pressure.is_finite() {
            return Err(setup("initial_guess and reference_pressure must be finite"));
        }
        if let Some(Damping::ClampNegative { floor }) = self.damping {
            if !floor.is_finite() || floor < 0.0 {
                return Err(setup("damping floor must be non-negative"));
            }
        }
        Ok(())
    }
}

fn setup(what: &str) -> SolverError {
    SolverError::ProblemSetup {
        what: what.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_setup() {
        let cfg = SolverConfig::default();
        assert_eq!(cfg.max_iterations, 100);
        assert_eq!(cfg.residual_threshold, 1.0);
        assert_eq!(cfg.initial_guess, 200.0);
        assert_eq!(cfg.strategy, JacobianStrategy::SparseColored);
        assert!(cfg.damping.is_none());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn builder_setters() {
        let cfg = SolverConfig::default()
            .with_strategy(JacobianStrategy::Dense)
            .with_max_iterations(7)
            .with_damping(Damping::clamp_negative());
        assert_eq!(cfg.strategy, JacobianStrategy::Dense);
        assert_eq!(cfg.max_iterations, 7);
        assert_eq!(cfg.damping, Some(Damping::ClampNegative { floor: 0.01 }));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut cfg = SolverConfig::default();
        cfg.jacobian_eps = 0.0;
        assert!(cfg.validate().is_err());

        let cfg = SolverConfig::default().with_damping(Damping::ClampNegative { floor: -1.0 });
        assert!(cfg.validate().is_err());
    }
}
