//! Finite-difference Jacobian assembly.
//!
//! Column `j` of the Jacobian is approximated with a one-sided difference
//! `(G(y + h·e_j) - G(y)) / h`. The step `h` is the configured epsilon, except
//! for mass flux unknowns above epsilon, which are perturbed downward so the
//! difference stays inside the element's current flow regime.

use nalgebra::DMatrix;

use crate::coloring::ColorGroups;
use crate::network::{Network, UnknownLayout};
use crate::sparsity::{CsrIndex, SparsityPattern};

/// Signed finite-difference step for unknown `j`.
pub fn perturbation(layout: UnknownLayout, y: &[f64], j: usize, eps: f64) -> f64 {
    if layout.is_mass_flux(j) && y[j] > eps {
        -eps
    } else {
        eps
    }
}

/// Jacobian storage filled by finite differences.
pub trait JacobianAssembler {
    /// Fill the Jacobian at `y`, given `g_y = G(y)`.
    ///
    /// `y` is perturbed in place and restored exactly before returning;
    /// `work` is scratch space of the system dimension.
    fn assemble(&mut self, network: &Network, y: &mut [f64], g_y: &[f64], work: &mut [f64]);

    fn dim(&self) -> usize;

    /// Entry `(row, col)`; zero outside the stored pattern.
    fn get(&self, row: usize, col: usize) -> f64;

    /// `out = J · x`
    fn multiply(&self, x: &[f64], out: &mut [f64]);

    /// Residual evaluations spent by one `assemble` call.
    fn evaluations_per_assembly(&self) -> usize;
}

/// Column-by-column differences into a dense matrix.
#[derive(Debug, Clone)]
pub struct DenseAssembler {
    matrix: DMatrix<f64>,
    eps: f64,
}

impl DenseAssembler {
    pub fn new(dim: usize, eps: f64) -> Self {
        Self {
            matrix: DMatrix::zeros(dim, dim),
            eps,
        }
    }

    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }
}

impl JacobianAssembler for DenseAssembler {
    fn assemble(&mut self, network: &Network, y: &mut [f64], g_y: &[f64], work: &mut [f64]) {
        let layout = network.layout();
        for j in 0..y.len() {
            let h = perturbation(layout, y, j, self.eps);
            let saved = y[j];
            y[j] = saved + h;
            network.update_residual(y, work);
            y[j] = saved;

            for (i, (perturbed, base)) in work.iter().zip(g_y).enumerate() {
                self.matrix[(i, j)] = (perturbed - base) / h;
            }
        }
    }

    fn dim(&self) -> usize {
        self.matrix.nrows()
    }

    fn get(&self, row: usize, col: usize) -> f64 {
        self.matrix[(row, col)]
    }

    fn multiply(&self, x: &[f64], out: &mut [f64]) {
        for (i, o) in out.iter_mut().enumerate() {
            *o = self.matrix.row(i).iter().zip(x).map(|(a, b)| a * b).sum();
        }
    }

    fn evaluations_per_assembly(&self) -> usize {
        self.dim()
    }
}

/// Sparse Jacobian values over a fixed pattern, stored column by column.
#[derive(Debug, Clone)]
pub struct SparseJacobian {
    index: CsrIndex,
    values: Vec<f64>,
}

impl SparseJacobian {
    pub fn new(index: CsrIndex) -> Self {
        let values = vec![0.0; index.nnz()];
        Self { index, values }
    }

    pub fn index(&self) -> &CsrIndex {
        &self.index
    }

    /// Values in compressed column order (`index.ia_t` / `index.ja_t`).
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.index
            .col_major_position(row, col)
            .map_or(0.0, |k| self.values[k])
    }

    /// Overwrite a structurally present entry; returns false otherwise.
    pub fn set(&mut self, row: usize, col: usize, value: f64) -> bool {
        match self.index.col_major_position(row, col) {
            Some(k) => {
                self.values[k] = value;
                true
            }
            None => false,
        }
    }

    pub fn multiply(&self, x: &[f64], out: &mut [f64]) {
        out.fill(0.0);
        for (col, &xc) in x.iter().enumerate() {
            let (start, end) = (self.index.ia_t[col], self.index.ia_t[col + 1]);
            for k in start..end {
                out[self.index.ja_t[k]] += self.values[k] * xc;
            }
        }
    }

    /// True when some row or column holds only zeros.
    pub fn has_empty_line(&self) -> bool {
        let n = self.index.dim();
        let mut row_used = vec![false; n];
        let mut col_used = vec![false; n];
        for col in 0..n {
            for k in self.index.ia_t[col]..self.index.ia_t[col + 1] {
                if self.values[k] != 0.0 {
                    col_used[col] = true;
                    row_used[self.index.ja_t[k]] = true;
                }
            }
        }
        !(row_used.iter().all(|&u| u) && col_used.iter().all(|&u| u))
    }
}

/// Compressed differences: one residual evaluation per color group.
#[derive(Debug, Clone)]
pub struct ColoredAssembler {
    jacobian: SparseJacobian,
    colors: ColorGroups,
    eps: f64,
    steps: Vec<f64>,
    saved: Vec<f64>,
}

impl ColoredAssembler {
    pub fn new(pattern: &SparsityPattern, eps: f64) -> Self {
        let index = pattern.to_csr();
        let colors = ColorGroups::greedy(&index);
        let n = index.dim();
        Self {
            jacobian: SparseJacobian::new(index),
            colors,
            eps,
            steps: vec![0.0; n],
            saved: vec![0.0; n],
        }
    }

    pub fn colors(&self) -> &ColorGroups {
        &self.colors
    }

    pub fn jacobian(&self) -> &SparseJacobian {
        &self.jacobian
    }
}

impl JacobianAssembler for ColoredAssembler {
    fn assemble(&mut self, network: &Network, y: &mut [f64], g_y: &[f64], work: &mut [f64]) {
        let layout = network.layout();
        for group in self.colors.groups() {
            for &j in group {
                let h = perturbation(layout, y, j, self.eps);
                self.steps[j] = h;
                self.saved[j] = y[j];
                y[j] += h;
            }

            network.update_residual(y, work);

            let index = &self.jacobian.index;
            for &j in group {
                for k in index.ia_t[j]..index.ia_t[j + 1] {
                    let row = index.ja_t[k];
                    self.jacobian.values[k] = (work[row] - g_y[row]) / self.steps[j];
                }
                y[j] = self.saved[j];
            }
        }
    }

    fn dim(&self) -> usize {
        self.jacobian.index.dim()
    }

    fn get(&self, row: usize, col: usize) -> f64 {
        self.jacobian.get(row, col)
    }

    fn multiply(&self, x: &[f64], out: &mut [f64]) {
        self.jacobian.multiply(x, out);
    }

    fn evaluations_per_assembly(&self) -> usize {
        self.colors.color_count()
    }
}
