//! Pipe element with a quadratic resistance law.

use crate::common::{EPSILON_PRESSURE, check_finite, check_positive};
use crate::error::ComponentResult;
use crate::traits::{ElementKind, FlowElement};

/// Penalty factor applied to reverse flow, Pa/(kg/s)².
pub const REVERSE_FLOW_PENALTY: f64 = 1.0e5;

/// Pipe with a lumped quadratic pressure loss.
///
/// ## Model
///
/// ```text
/// mdot >= 0:  G = p_inlet - p_outlet - R * mdot²
/// mdot <  0:  G = REVERSE_FLOW_PENALTY * mdot²
/// ```
///
/// Reverse flow is not forbidden outright; the steep penalty pushes the
/// Newton iteration back towards non-negative flux.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipe {
    /// Resistance coefficient R, Pa/(kg/s)²
    pub resistance: f64,
}

impl Pipe {
    /// Create a new pipe.
    ///
    /// # Errors
    /// Returns error if the resistance is not finite and positive.
    pub fn new(resistance: f64) -> ComponentResult<Self> {
        check_positive(resistance, "pipe resistance must be positive")?;
        Ok(Self { resistance })
    }

    /// Pressure loss for a forward mass flux.
    pub fn pressure_loss(&self, mdot: f64) -> f64 {
        self.resistance * mdot * mdot
    }
}

impl FlowElement for Pipe {
    fn kind(&self) -> ElementKind {
        ElementKind::Pipe
    }

    fn system_function(&self, mdot: f64, p_inlet: f64, p_outlet: f64) -> f64 {
        if mdot < 0.0 {
            mdot * mdot * REVERSE_FLOW_PENALTY
        } else {
            p_inlet - p_outlet - self.pressure_loss(mdot)
        }
    }

    /// `sqrt(Δp / R)` for a positive pressure difference, zero otherwise.
    fn mass_flux(&self, p_inlet: f64, p_outlet: f64) -> ComponentResult<f64> {
        let dp = p_inlet - p_outlet;
        check_finite(dp, "pipe pressure difference")?;
        if dp <= 0.0 {
            return Ok(0.0);
        }
        Ok((dp / self.resistance).sqrt())
    }

    /// `1 / (2 sqrt(R Δp))`; the pole at Δp = 0 is cut off at `EPSILON_PRESSURE`.
    fn dmdot_dp(&self, p_inlet: f64, p_outlet: f64) -> ComponentResult<f64> {
        let dp = p_inlet - p_outlet;
        check_finite(dp, "pipe pressure difference")?;
        if dp <= 0.0 {
            return Ok(0.0);
        }
        let dp = dp.max(EPSILON_PRESSURE);
        Ok(0.5 / (self.resistance * dp).sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn pipe_rejects_bad_resistance() {
        assert!(Pipe::new(0.0).is_err());
        assert!(Pipe::new(-10.0).is_err());
        assert!(Pipe::new(f64::NAN).is_err());
        assert!(Pipe::new(1400.0).is_ok());
    }

    #[test]
    fn forward_flow_residual() {
        let pipe = Pipe::new(2000.0).unwrap();
        // 0.7 kg/s needs 980 Pa
        let r = pipe.system_function(0.7, 1100.0, 0.0);
        assert!((r - 120.0).abs() < 1e-9);
    }

    #[test]
    fn reverse_flow_is_penalized_without_pressure_dependence() {
        let pipe = Pipe::new(1000.0).unwrap();
        let a = pipe.system_function(-0.1, 0.0, 500.0);
        let b = pipe.system_function(-0.1, 900.0, 10.0);
        assert!((a - 1000.0).abs() < 1e-9);
        assert_eq!(a, b);
    }

    #[test]
    fn mass_flux_inverts_system_function() {
        let pipe = Pipe::new(1400.0).unwrap();
        let mdot = pipe.mass_flux(1500.0, 200.0).unwrap();
        assert!(pipe.system_function(mdot, 1500.0, 200.0).abs() < 1e-9);
        assert_eq!(pipe.mass_flux(100.0, 200.0).unwrap(), 0.0);
    }

    #[test]
    fn dmdot_dp_matches_finite_difference() {
        let pipe = Pipe::new(2400.0).unwrap();
        let (p_in, p_out) = (900.0, 300.0);
        let h = 1e-3;
        let fd = (pipe.mass_flux(p_in + h, p_out).unwrap()
            - pipe.mass_flux(p_in - h, p_out).unwrap())
            / (2.0 * h);
        let analytic = pipe.dmdot_dp(p_in, p_out).unwrap();
        assert!((fd - analytic).abs() < 1e-8 * analytic.abs().max(1.0));
    }

    proptest! {
        #[test]
        fn zero_flow_means_no_loss(p_in in -1e6..1e6_f64, p_out in -1e6..1e6_f64, r in 1.0..1e5_f64) {
            let pipe = Pipe::new(r).unwrap();
            prop_assert_eq!(pipe.system_function(0.0, p_in, p_out), p_in - p_out);
        }

        #[test]
        fn loss_grows_with_flow(m1 in 0.0..10.0_f64, m2 in 0.0..10.0_f64) {
            let pipe = Pipe::new(1400.0).unwrap();
            let (lo, hi) = if m1 <= m2 { (m1, m2) } else { (m2, m1) };
            prop_assert!(pipe.system_function(hi, 0.0, 0.0) <= pipe.system_function(lo, 0.0, 0.0));
        }
    }
}
