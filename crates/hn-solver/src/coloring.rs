//! Column grouping for compressed finite-difference Jacobians.

use crate::sparsity::CsrIndex;

/// Partition of Jacobian columns into structurally orthogonal groups.
///
/// No two columns of one group have a structural non-zero in the same row,
/// so a single residual evaluation with all of a group's columns perturbed
/// recovers every one of their entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorGroups {
    groups: Vec<Vec<usize>>,
    color_of: Vec<usize>,
}

impl ColorGroups {
    /// Greedy coloring in column index order.
    ///
    /// Column `i` takes the lowest color not already used by a column that
    /// shares a structural row with it.
    pub fn greedy(csr: &CsrIndex) -> Self {
        let n = csr.dim();
        let mut color_of = vec![usize::MAX; n];
        // taken[c] == i marks color c as unavailable for column i
        let mut taken: Vec<usize> = Vec::new();
        let mut groups: Vec<Vec<usize>> = Vec::new();

        for i in 0..n {
            for &row in csr.col(i) {
                for &k in csr.row(row) {
                    let c = color_of[k];
                    if k != i && c != usize::MAX {
                        taken[c] = i;
                    }
                }
            }
            let color = (0..groups.len())
                .find(|&c| taken[c] != i)
                .unwrap_or(groups.len());
            if color == groups.len() {
                groups.push(Vec::new());
                taken.push(usize::MAX);
            }
            color_of[i] = color;
            groups[color].push(i);
        }

        Self { groups, color_of }
    }

    pub fn color_count(&self) -> usize {
        self.groups.len()
    }

    pub fn groups(&self) -> &[Vec<usize>] {
        &self.groups
    }

    pub fn color_of(&self, col: usize) -> usize {
        self.color_of[col]
    }

    /// Check that the groups partition all columns and that no two columns
    /// of a group share a structural row.
    pub fn is_valid_for(&self, csr: &CsrIndex) -> bool {
        let n = csr.dim();
        let mut seen = vec![false; n];
        for group in &self.groups {
            for &col in group {
                if col >= n || seen[col] {
                    return false;
                }
                seen[col] = true;
            }
        }
        if !seen.iter().all(|&s| s) {
            return false;
        }

        let mut row_owner = vec![usize::MAX; n];
        for (color, group) in self.groups.iter().enumerate() {
            for &col in group {
                for &row in csr.col(col) {
                    if row_owner[row] == color {
                        return false;
                    }
                    row_owner[row] = color;
                }
            }
        }
        true
    }
}
