//! Pump element model.

use crate::common::{check_finite, check_positive};
use crate::error::ComponentResult;
use crate::traits::{ElementKind, FlowElement};
use hn_core::units::{MassRate, Pressure, kgps, pa};

/// Constant part of the reverse-flow penalty, Pa.
pub const REVERSE_FLOW_OFFSET: f64 = 1.0e4;

/// Quartic reverse-flow penalty coefficient, Pa/(kg/s)⁴.
pub const REVERSE_FLOW_QUARTIC: f64 = 1.0e8;

/// Default shut-off head (Pa).
pub const DEFAULT_MAX_HEAD: f64 = 2000.0;

/// Default flow at which the head reaches zero (kg/s).
pub const DEFAULT_RATED_FLOW: f64 = 1.5;

/// Centrifugal pump with a quadratic droop curve.
///
/// ## Model
///
/// The pump adds pressure Δp(mdot) between inlet and outlet:
///
/// ```text
/// G = p_inlet - p_outlet + Δp(mdot)
///
/// mdot <  0:                Δp = H + REVERSE_FLOW_OFFSET + REVERSE_FLOW_QUARTIC * mdot⁴
/// 0 <= mdot < mdot_rated:   Δp = H * (1 - (mdot / mdot_rated)²)
/// mdot >= mdot_rated:       Δp = 0
/// ```
///
/// Reverse flow is discouraged much more strongly than in pipes.
#[derive(Clone, Debug, PartialEq)]
pub struct Pump {
    /// Shut-off head H (Pa), the pressure rise at zero flow
    pub max_head: f64,
    /// Flow at which the head drops to zero (kg/s)
    pub rated_flow: f64,
}

impl Default for Pump {
    fn default() -> Self {
        Self {
            max_head: DEFAULT_MAX_HEAD,
            rated_flow: DEFAULT_RATED_FLOW,
        }
    }
}

impl Pump {
    /// Create a new pump.
    ///
    /// # Errors
    /// Returns error if head or rated flow are not finite and positive.
    pub fn new(max_head: Pressure, rated_flow: MassRate) -> ComponentResult<Self> {
        check_positive(max_head.value, "pump head must be positive")?;
        check_positive(rated_flow.value, "pump rated flow must be positive")?;
        Ok(Self {
            max_head: max_head.value,
            rated_flow: rated_flow.value,
        })
    }

    /// Shut-off head as a unit-carrying quantity.
    pub fn head(&self) -> Pressure {
        pa(self.max_head)
    }

    /// Rated flow as a unit-carrying quantity.
    pub fn rated(&self) -> MassRate {
        kgps(self.rated_flow)
    }

    /// Pressure rise delivered at the given mass flux.
    pub fn added_pressure(&self, mdot: f64) -> f64 {
        if mdot < 0.0 {
            self.max_head + REVERSE_FLOW_OFFSET + REVERSE_FLOW_QUARTIC * mdot.powi(4)
        } else if mdot < self.rated_flow {
            let x = mdot / self.rated_flow;
            self.max_head * (1.0 - x * x)
        } else {
            0.0
        }
    }
}

impl FlowElement for Pump {
    fn kind(&self) -> ElementKind {
        ElementKind::Pump
    }

    fn system_function(&self, mdot: f64, p_inlet: f64, p_outlet: f64) -> f64 {
        p_inlet - p_outlet + self.added_pressure(mdot)
    }

    /// Inverse of the pump curve for the required rise `p_outlet - p_inlet`.
    ///
    /// Rises at or below zero give the rated flow. Rises inside the gap between
    /// the shut-off head and the reverse-flow offset have no root and give zero.
    fn mass_flux(&self, p_inlet: f64, p_outlet: f64) -> ComponentResult<f64> {
        let rise = p_outlet - p_inlet;
        check_finite(rise, "pump pressure rise")?;
        if rise <= 0.0 {
            return Ok(self.rated_flow);
        }
        if rise <= self.max_head {
            return Ok(self.rated_flow * (1.0 - rise / self.max_head).sqrt());
        }
        let excess = rise - self.max_head - REVERSE_FLOW_OFFSET;
        if excess <= 0.0 {
            return Ok(0.0);
        }
        Ok(-(excess / REVERSE_FLOW_QUARTIC).powf(0.25))
    }

    fn dmdot_dp(&self, p_inlet: f64, p_outlet: f64) -> ComponentResult<f64> {
        let rise = p_outlet - p_inlet;
        check_finite(rise, "pump pressure rise")?;
        if rise <= 0.0 {
            return Ok(0.0);
        }
        if rise < self.max_head {
            let d = self.rated_flow / (2.0 * self.max_head * (1.0 - rise / self.max_head).sqrt());
            check_finite(d, "pump flow derivative")?;
            return Ok(d);
        }
        let excess = rise - self.max_head - REVERSE_FLOW_OFFSET;
        if excess <= 0.0 {
            return Ok(0.0);
        }
        let d = 0.25 / REVERSE_FLOW_QUARTIC * (excess / REVERSE_FLOW_QUARTIC).powf(-0.75);
        check_finite(d, "pump flow derivative")?;
        Ok(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn pump_creation() {
        assert!(Pump::new(pa(2000.0), kgps(1.5)).is_ok());
        assert!(Pump::new(pa(0.0), kgps(1.5)).is_err());
        assert!(Pump::new(pa(2000.0), kgps(-1.0)).is_err());
    }

    #[test]
    fn default_curve_endpoints() {
        let pump = Pump::default();
        assert_eq!(pump.added_pressure(0.0), DEFAULT_MAX_HEAD);
        assert_eq!(pump.added_pressure(DEFAULT_RATED_FLOW), 0.0);
        assert_eq!(pump.added_pressure(10.0), 0.0);
        assert_eq!(pump.head(), pa(DEFAULT_MAX_HEAD));
        assert_eq!(pump.rated(), kgps(DEFAULT_RATED_FLOW));
    }

    #[test]
    fn pump_adds_pressure() {
        let pump = Pump::default();
        // at half rated flow: 2000 * (1 - 0.25) = 1500 Pa rise
        let r = pump.system_function(0.75, 0.0, 1500.0);
        assert!(r.abs() < 1e-9);
    }

    #[test]
    fn reverse_flow_penalty_exceeds_shutoff_head() {
        let pump = Pump::default();
        let p = pump.added_pressure(-0.1);
        assert!(p > pump.max_head + REVERSE_FLOW_OFFSET);
        assert!(pump.added_pressure(-0.2) > p);
    }

    #[test]
    fn mass_flux_inverts_droop_curve() {
        let pump = Pump::default();
        let mdot = pump.mass_flux(0.0, 1037.0).unwrap();
        assert!(mdot > 0.0 && mdot < pump.rated_flow);
        assert!(pump.system_function(mdot, 0.0, 1037.0).abs() < 1e-9);
        assert_eq!(pump.mass_flux(500.0, 100.0).unwrap(), pump.rated_flow);
    }

    #[test]
    fn mass_flux_inverts_reverse_branch() {
        let pump = Pump::default();
        let rise = pump.max_head + REVERSE_FLOW_OFFSET + 1.0e4;
        let mdot = pump.mass_flux(0.0, rise).unwrap();
        assert!(mdot < 0.0);
        assert!(pump.system_function(mdot, 0.0, rise).abs() < 1e-6);
    }

    #[test]
    fn dmdot_dp_matches_finite_difference() {
        let pump = Pump::default();
        let (p_in, p_out) = (0.0, 900.0);
        let h = 1e-3;
        let fd = (pump.mass_flux(p_in + h, p_out).unwrap()
            - pump.mass_flux(p_in - h, p_out).unwrap())
            / (2.0 * h);
        let analytic = pump.dmdot_dp(p_in, p_out).unwrap();
        assert!(analytic > 0.0);
        assert!((fd - analytic).abs() < 1e-8);
    }

    proptest! {
        #[test]
        fn head_is_non_increasing_in_rated_regime(m1 in 0.0..1.5_f64, m2 in 0.0..1.5_f64) {
            let pump = Pump::default();
            let (lo, hi) = if m1 <= m2 { (m1, m2) } else { (m2, m1) };
            prop_assert!(pump.added_pressure(hi) <= pump.added_pressure(lo));
        }

        #[test]
        fn no_head_at_or_above_rated_flow(extra in 0.0..100.0_f64, head in 1.0..1e5_f64, rated in 0.01..10.0_f64) {
            let pump = Pump::new(pa(head), kgps(rated)).unwrap();
            prop_assert_eq!(pump.added_pressure(rated + extra), 0.0);
        }
    }
}
