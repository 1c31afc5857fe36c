//! Structural sparsity of the network Jacobian.

use crate::network::Network;

/// Set of structurally non-zero Jacobian positions.
///
/// Rows are stored as sorted, duplicate-free column lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparsityPattern {
    rows: Vec<Vec<usize>>,
}

impl SparsityPattern {
    /// Build a pattern from explicit (row, col) entries.
    pub fn from_entries(dim: usize, entries: impl IntoIterator<Item = (usize, usize)>) -> Self {
        let mut rows = vec![Vec::new(); dim];
        for (r, c) in entries {
            debug_assert!(r < dim && c < dim);
            rows[r].push(c);
        }
        for row in &mut rows {
            row.sort_unstable();
            row.dedup();
        }
        Self { rows }
    }

    /// Pattern implied by the network topology.
    ///
    /// - node row: every incident element's mass flux column
    /// - node 0 row: additionally its own pressure column (reference constraint)
    /// - element row: its own mass flux column plus the inlet and outlet
    ///   pressure columns
    pub fn from_network(network: &Network) -> Self {
        let layout = network.layout();
        let topology = network.topology();
        let mut entries = Vec::with_capacity(6 * topology.element_count() + 1);

        for elem in topology.elements() {
            let row = layout.mass_flux(elem.id);
            let node_rows = [layout.pressure(elem.inlet), layout.pressure(elem.outlet)];
            entries.push((row, row));
            for col in node_rows {
                entries.push((row, col));
            }
            // node rows share numbering with pressure columns
            for node_row in node_rows {
                entries.push((node_row, row));
            }
        }
        if let Some(gauge) = topology.node_ids().next() {
            let p0 = layout.pressure(gauge);
            entries.push((p0, p0));
        }

        Self::from_entries(layout.len(), entries)
    }

    pub fn dim(&self) -> usize {
        self.rows.len()
    }

    pub fn nnz(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    pub fn row(&self, row: usize) -> &[usize] {
        &self.rows[row]
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.rows
            .get(row)
            .is_some_and(|cols| cols.binary_search(&col).is_ok())
    }

    pub fn is_symmetric(&self) -> bool {
        self.rows
            .iter()
            .enumerate()
            .all(|(r, cols)| cols.iter().all(|&c| self.contains(c, r)))
    }

    /// Compressed row and column index arrays.
    pub fn to_csr(&self) -> CsrIndex {
        let n = self.dim();
        let mut ia = Vec::with_capacity(n + 1);
        let mut ja = Vec::with_capacity(self.nnz());
        ia.push(0);
        for cols in &self.rows {
            ja.extend_from_slice(cols);
            ia.push(ja.len());
        }

        // Transpose by counting entries per column.
        let mut ia_t = vec![0usize; n + 1];
        for &c in &ja {
            ia_t[c + 1] += 1;
        }
        for i in 0..n {
            ia_t[i + 1] += ia_t[i];
        }
        let mut next = ia_t.clone();
        let mut ja_t = vec![0usize; ja.len()];
        for r in 0..n {
            for &c in &ja[ia[r]..ia[r + 1]] {
                ja_t[next[c]] = r;
                next[c] += 1;
            }
        }

        CsrIndex { ia, ja, ia_t, ja_t }
    }
}

/// Row-compressed index arrays of a pattern and of its transpose.
///
/// `ia`/`ja` list the columns of every row; `ia_t`/`ja_t` list the rows of
/// every column, i.e. the pattern in compressed column form. Index lists are
/// sorted within each row (column).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrIndex {
    pub ia: Vec<usize>,
    pub ja: Vec<usize>,
    pub ia_t: Vec<usize>,
    pub ja_t: Vec<usize>,
}

impl CsrIndex {
    pub fn dim(&self) -> usize {
        self.ia.len() - 1
    }

    pub fn nnz(&self) -> usize {
        self.ja.len()
    }

    pub fn row(&self, row: usize) -> &[usize] {
        &self.ja[self.ia[row]..self.ia[row + 1]]
    }

    pub fn col(&self, col: usize) -> &[usize] {
        &self.ja_t[self.ia_t[col]..self.ia_t[col + 1]]
    }

    /// Position of `(row, col)` in column-major storage, if structurally present.
    pub fn col_major_position(&self, row: usize, col: usize) -> Option<usize> {
        let start = self.ia_t[col];
        self.col(col)
            .binary_search(&row)
            .ok()
            .map(|offset| start + offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::NetworkBuilder;
    use hn_components::Pump;

    fn triangle() -> Network {
        let mut b = NetworkBuilder::new();
        b.add_pump(0, 1, Pump::default());
        b.add_pipe(1, 2, 100.0).unwrap();
        b.add_pipe(2, 0, 100.0).unwrap();
        b.build().unwrap()
    }

    #[test]
    fn network_pattern_entries() {
        let pattern = SparsityPattern::from_network(&triangle());
        // unknowns: m0 m1 m2 | p0 p1 p2
        assert_eq!(pattern.dim(), 6);
        assert_eq!(pattern.row(0), &[0, 3, 4]);
        assert_eq!(pattern.row(1), &[1, 4, 5]);
        assert_eq!(pattern.row(2), &[2, 3, 5]);
        assert_eq!(pattern.row(3), &[0, 2, 3]);
        assert_eq!(pattern.row(4), &[0, 1]);
        assert_eq!(pattern.row(5), &[1, 2]);
        assert_eq!(pattern.nnz(), 16);
        assert!(pattern.is_symmetric());
    }

    #[test]
    fn duplicates_are_merged() {
        let pattern = SparsityPattern::from_entries(2, [(0, 1), (0, 1), (1, 0), (0, 0)]);
        assert_eq!(pattern.row(0), &[0, 1]);
        assert_eq!(pattern.nnz(), 3);
    }

    #[test]
    fn asymmetric_pattern_detected() {
        let pattern = SparsityPattern::from_entries(2, [(0, 0), (0, 1), (1, 1)]);
        assert!(!pattern.is_symmetric());
    }

    #[test]
    fn csr_transpose_matches_pattern() {
        let pattern = SparsityPattern::from_entries(3, [(0, 0), (0, 2), (1, 1), (2, 0), (2, 1)]);
        let csr = pattern.to_csr();
        assert_eq!(csr.ia, vec![0, 2, 3, 5]);
        assert_eq!(csr.ja, vec![0, 2, 1, 0, 1]);
        assert_eq!(csr.ia_t, vec![0, 2, 4, 5]);
        assert_eq!(csr.ja_t, vec![0, 2, 1, 2, 0]);
        assert_eq!(csr.col(1), &[1, 2]);
        assert_eq!(csr.col_major_position(2, 1), Some(3));
        assert_eq!(csr.col_major_position(1, 0), None);
    }
}
