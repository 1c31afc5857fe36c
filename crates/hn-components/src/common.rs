//! Common utilities for flow element calculations.

use crate::error::{ComponentError, ComponentResult};
use hn_core::numeric::ensure_finite;

/// Pressure differences below this are treated as zero (Pa)
pub const EPSILON_PRESSURE: f64 = 1e-3;

/// Ensure a value is finite, returning ComponentError if not.
pub fn check_finite(value: f64, what: &'static str) -> ComponentResult<()> {
    ensure_finite(value, what).map_err(|_| ComponentError::NonPhysical { what })?;
    Ok(())
}

/// Ensure a parameter is finite and strictly positive.
pub fn check_positive(value: f64, what: &'static str) -> ComponentResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ComponentError::InvalidArg { what });
    }
    Ok(())
}
