use crate::HnError;

/// Floating point type used throughout system
pub type Real = f64;

/// Absolute/relative tolerance pair
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, HnError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(HnError::NonFinite { what, value: v })
    }
}

/// Root-mean-square norm of a vector. Zero for an empty slice.
pub fn rms_norm(values: &[Real]) -> Real {
    if values.is_empty() {
        return 0.0;
    }
    let sum_sq: Real = values.iter().map(|v| v * v).sum();
    (sum_sq / values.len() as Real).sqrt()
}
