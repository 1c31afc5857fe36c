//! LU factorization backends for the Newton correction.

use std::fmt;

use faer::linalg::solvers::Solve;
use faer::sparse::linalg::solvers::{Lu, SymbolicLu};
use faer::sparse::{SparseColMatRef, SymbolicSparseColMatRef};
use faer::MatMut;
use nalgebra::linalg::LU;
use nalgebra::{DMatrix, DVector, Dyn};
use thiserror::Error;

use crate::jacobian::SparseJacobian;
use crate::sparsity::CsrIndex;

/// Phase of a sparse LU factorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactorStage {
    Symbolic,
    Numeric,
}

impl fmt::Display for FactorStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactorStage::Symbolic => f.write_str("symbolic"),
            FactorStage::Numeric => f.write_str("numeric"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FactorError {
    #[error("matrix is singular")]
    Singular,

    #[error("solve requested before factorization")]
    NotFactorized,

    #[error("{stage} factorization failed: {what}")]
    Backend { stage: FactorStage, what: String },
}

/// A factorization that is recomputed for every new matrix and then used
/// to solve `A·x = b` in place.
pub trait Factorizer {
    type Matrix: ?Sized;

    fn factorize(&mut self, matrix: &Self::Matrix) -> Result<(), FactorError>;

    /// Overwrite `rhs` with the solution.
    fn solve_in_place(&self, rhs: &mut [f64]) -> Result<(), FactorError>;
}

/// Dense LU with partial pivoting.
#[derive(Debug, Default)]
pub struct DenseLu {
    lu: Option<LU<f64, Dyn, Dyn>>,
}

impl DenseLu {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Factorizer for DenseLu {
    type Matrix = DMatrix<f64>;

    fn factorize(&mut self, matrix: &DMatrix<f64>) -> Result<(), FactorError> {
        self.lu = None;
        if matrix.iter().any(|v| !v.is_finite()) {
            return Err(FactorError::Singular);
        }
        let lu = matrix.clone().lu();
        if !lu.is_invertible() {
            return Err(FactorError::Singular);
        }
        self.lu = Some(lu);
        Ok(())
    }

    fn solve_in_place(&self, rhs: &mut [f64]) -> Result<(), FactorError> {
        let lu = self.lu.as_ref().ok_or(FactorError::NotFactorized)?;
        let mut b = DVector::from_column_slice(rhs);
        if !lu.solve_mut(&mut b) || b.iter().any(|v| !v.is_finite()) {
            return Err(FactorError::Singular);
        }
        rhs.copy_from_slice(b.as_slice());
        Ok(())
    }
}

/// Sparse LU over a fixed pattern.
///
/// The symbolic analysis is computed once, from the pattern, and reused for
/// every numeric factorization. Both are owned `faer` values and are freed
/// when the `SparseLu` is dropped, on success and error paths alike.
pub struct SparseLu {
    dim: usize,
    col_ptr: Vec<usize>,
    row_idx: Vec<usize>,
    symbolic: SymbolicLu<usize>,
    numeric: Option<Lu<usize, f64>>,
}

impl SparseLu {
    pub fn new(index: &CsrIndex) -> Result<Self, FactorError> {
        let dim = index.dim();
        let col_ptr = index.ia_t.clone();
        let row_idx = index.ja_t.clone();
        let structure = SymbolicSparseColMatRef::new_checked(dim, dim, &col_ptr, None, &row_idx);
        let symbolic = SymbolicLu::try_new(structure).map_err(|e| FactorError::Backend {
            stage: FactorStage::Symbolic,
            what: format!("{e:?}"),
        })?;
        tracing::debug!(dim, nnz = row_idx.len(), "sparse LU symbolic analysis done");
        Ok(Self {
            dim,
            col_ptr,
            row_idx,
            symbolic,
            numeric: None,
        })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }
}

impl fmt::Debug for SparseLu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SparseLu")
            .field("dim", &self.dim)
            .field("nnz", &self.row_idx.len())
            .field("factorized", &self.numeric.is_some())
            .finish()
    }
}

impl Factorizer for SparseLu {
    type Matrix = SparseJacobian;

    fn factorize(&mut self, matrix: &SparseJacobian) -> Result<(), FactorError> {
        self.numeric = None;
        let values = matrix.values();
        if values.iter().any(|v| !v.is_finite()) || matrix.has_empty_line() {
            return Err(FactorError::Singular);
        }
        let structure = SymbolicSparseColMatRef::new_checked(
            self.dim,
            self.dim,
            &self.col_ptr,
            None,
            &self.row_idx,
        );
        let mat = SparseColMatRef::new(structure, values);
        let lu = Lu::try_new_with_symbolic(self.symbolic.clone(), mat).map_err(|e| {
            FactorError::Backend {
                stage: FactorStage::Numeric,
                what: format!("{e:?}"),
            }
        })?;
        self.numeric = Some(lu);
        Ok(())
    }

    fn solve_in_place(&self, rhs: &mut [f64]) -> Result<(), FactorError> {
        let lu = self.numeric.as_ref().ok_or(FactorError::NotFactorized)?;
        lu.solve_in_place(MatMut::from_column_major_slice_mut(rhs, self.dim, 1));
        if rhs.iter().any(|v| !v.is_finite()) {
            return Err(FactorError::Singular);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sparsity::SparsityPattern;

    fn tridiagonal(n: usize) -> SparsityPattern {
        SparsityPattern::from_entries(
            n,
            (0..n).flat_map(|i| [(i, i), (i, i.saturating_sub(1)), (i, (i + 1).min(n - 1))]),
        )
    }

    #[test]
    fn dense_solves_small_system() {
        let a = DMatrix::from_row_slice(3, 3, &[4.0, 1.0, 0.0, 1.0, 3.0, 1.0, 0.0, 1.0, 2.0]);
        let mut lu = DenseLu::new();
        lu.factorize(&a).unwrap();
        let mut b = [1.0, 2.0, 3.0];
        lu.solve_in_place(&mut b).unwrap();
        let x = DVector::from_column_slice(&b);
        let r = &a * x - DVector::from_column_slice(&[1.0, 2.0, 3.0]);
        assert!(r.amax() < 1e-12);
    }

    #[test]
    fn dense_reports_singular() {
        let a = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 4.0]);
        let mut lu = DenseLu::new();
        assert_eq!(lu.factorize(&a), Err(FactorError::Singular));
        let zero = DMatrix::zeros(2, 2);
        assert_eq!(lu.factorize(&zero), Err(FactorError::Singular));
        assert_eq!(lu.solve_in_place(&mut [0.0, 0.0]), Err(FactorError::NotFactorized));
    }

    #[test]
    fn sparse_solves_tridiagonal() {
        let n = 6;
        let pattern = tridiagonal(n);
        let mut jac = SparseJacobian::new(pattern.to_csr());
        for i in 0..n {
            jac.set(i, i, 4.0);
            if i > 0 {
                jac.set(i, i - 1, -1.0);
            }
            if i + 1 < n {
                jac.set(i, i + 1, -1.0);
            }
        }
        let mut lu = SparseLu::new(jac.index()).unwrap();
        assert_eq!(lu.dim(), n);

        let rhs: Vec<f64> = (0..n).map(|i| i as f64 + 1.0).collect();
        let mut x = rhs.clone();
        lu.factorize(&jac).unwrap();
        lu.solve_in_place(&mut x).unwrap();

        let mut back = vec![0.0; n];
        jac.multiply(&x, &mut back);
        for (u, v) in back.iter().zip(&rhs) {
            assert!((u - v).abs() < 1e-10);
        }

        // same symbolic analysis, new values
        for i in 0..n {
            jac.set(i, i, 5.0);
        }
        let mut y = rhs.clone();
        lu.factorize(&jac).unwrap();
        lu.solve_in_place(&mut y).unwrap();
        jac.multiply(&y, &mut back);
        for (u, v) in back.iter().zip(&rhs) {
            assert!((u - v).abs() < 1e-10);
        }
    }

    #[test]
    fn sparse_reports_empty_row_as_singular() {
        let pattern = tridiagonal(3);
        let mut jac = SparseJacobian::new(pattern.to_csr());
        jac.set(0, 0, 1.0);
        jac.set(1, 1, 1.0);
        let mut lu = SparseLu::new(jac.index()).unwrap();
        assert_eq!(lu.factorize(&jac), Err(FactorError::Singular));
        assert_eq!(lu.solve_in_place(&mut [1.0, 1.0, 1.0]), Err(FactorError::NotFactorized));
    }
}
