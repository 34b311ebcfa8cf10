use nalgebra::DMatrix;
use serde::{Serialize, Serializer};

/// A square matrix over the residues of a selection.
///
/// Writes go through [`PairwiseMatrix::set_symmetric`], so the matrix is symmetric by
/// construction. Row and column `i` correspond to residue `i` of the selection's
/// residue order. Serializes as row-major nested arrays; non-finite entries become
/// JSON `null`.
#[derive(Debug, Clone, PartialEq)]
pub struct PairwiseMatrix {
    data: DMatrix<f64>,
}

impl PairwiseMatrix {
    pub fn zeros(size: usize) -> Self {
        Self {
            data: DMatrix::zeros(size, size),
        }
    }

    pub fn size(&self) -> usize {
        self.data.nrows()
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[(i, j)]
    }

    #[inline]
    pub fn set_symmetric(&mut self, i: usize, j: usize, value: f64) {
        self.data[(i, j)] = value;
        self.data[(j, i)] = value;
    }

    /// Checks symmetry within `tolerance`, treating two NaNs as equal.
    pub fn is_symmetric(&self, tolerance: f64) -> bool {
        let n = self.size();
        (0..n).all(|i| {
            (i + 1..n).all(|j| {
                let (a, b) = (self.get(i, j), self.get(j, i));
                (a.is_nan() && b.is_nan()) || (a - b).abs() <= tolerance
            })
        })
    }

    pub fn rows(&self) -> Vec<Vec<f64>> {
        self.data
            .row_iter()
            .map(|row| row.iter().copied().collect())
            .collect()
    }
}

impl Serialize for PairwiseMatrix {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.rows().serialize(serializer)
    }
}
