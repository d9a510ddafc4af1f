use nalgebra::DMatrix;

use crate::error::CounterbalanceError;

/// Represents a Latin square, which is a matrix where each row is a trial ordering and each
/// cell holds the index of the trial presented at that position.
///
/// The grid is not validated on construction. Use [`LatinSquare::is_valid`] to check the
/// Latin property before relying on it.
///
/// # Fields
///
/// * `cells` - The matrix of trial indices
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct LatinSquare {
    cells: DMatrix<usize>,
}

impl LatinSquare {
    /// Builds the cyclic square of order `n`, where cell `(i, j)` holds `(i + j) mod n`.
    pub fn cyclic(n: usize) -> Self {
        Self { cells: DMatrix::from_fn(n, n, |i, j| (i + j) % n) }
    }

    pub fn from_matrix(cells: &DMatrix<usize>) -> Self {
        Self { cells: cells.clone() }
    }

    /// Builds a grid from explicit rows. Every row must have the same length.
    pub fn from_rows(rows: &[Vec<usize>]) -> Result<Self, CounterbalanceError> {
        let ncols = rows.first().map_or(0, Vec::len);
        if let Some(pos) = rows.iter().position(|row| row.len() != ncols) {
            return Err(CounterbalanceError::MalformedSquare(format!(
                "row {} has {} entries, expected {}",
                pos,
                rows[pos].len(),
                ncols
            )));
        }
        let flat: Vec<usize> = rows.iter().flatten().copied().collect();
        Ok(Self { cells: DMatrix::from_row_slice(rows.len(), ncols, &flat) })
    }

    pub fn cells(&self) -> &DMatrix<usize> {
        &self.cells
    }

    /// Number of rows, which for a proper square is also its order N.
    pub fn order(&self) -> usize {
        self.cells.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.cells.ncols()
    }

    pub fn row(&self, i: usize) -> Vec<usize> {
        self.cells.row(i).iter().copied().collect()
    }

    /// Rows in order, each usable as a position -> source-trial permutation.
    pub fn rows(&self) -> impl Iterator<Item = Vec<usize>> + '_ {
        self.cells.row_iter().map(|row| row.iter().copied().collect())
    }

    pub fn swap_rows(&mut self, a: usize, b: usize) {
        self.cells.swap_rows(a, b);
    }

    pub fn swap_columns(&mut self, a: usize, b: usize) {
        self.cells.swap_columns(a, b);
    }

    /// Checks that the grid is square and that every row and every column holds each of
    /// `0..N` exactly once.
    pub fn is_valid(&self) -> bool {
        let n = self.cells.nrows();
        if n != self.cells.ncols() {
            return false;
        }
        (0..n).all(|i| {
            is_permutation(self.cells.row(i).iter(), n) && is_permutation(self.cells.column(i).iter(), n)
        })
    }
}

// Assumes exactly n values are supplied, so no duplicates and no out-of-range entries
// means every symbol in 0..n is present.
fn is_permutation<'a>(values: impl Iterator<Item = &'a usize>, n: usize) -> bool {
    let mut seen = vec![false; n];
    for &value in values {
        if value >= n || seen[value] {
            return false;
        }
        seen[value] = true;
    }
    true
}
