//! Symmetric distance matrix stored as a strict lower triangle.

use crate::error::MsaError;
use crate::pair::Pair;
use serde::{Deserialize, Serialize};

/// A symmetric `N x N` score matrix over `N` OTUs, stored as the strict lower
/// triangle (`N(N-1)/2` cells). The diagonal is implicitly `0.0` and is never
/// materialized. Produced by the pairwise engine; consumed read-only by
/// neighbor-joining.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceMatrix {
    n: usize,
    cells: Vec<f64>,
}

impl DistanceMatrix {
    /// Builds an all-zero matrix over `n` OTUs, to be filled in by the
    /// pairwise engine.
    pub fn zeros(n: usize) -> Self {
        Self {
            n,
            cells: vec![0.0; n * n.saturating_sub(1) / 2],
        }
    }

    pub fn n(&self) -> usize {
        self.n
    }

    /// Symmetric read: `get(i, j) == get(j, i)`, and `get(i, i) == 0.0`.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        if i == j {
            return 0.0;
        }
        self.cells[Pair::new(i, j).triangle_index()]
    }

    /// Sets the score for the unordered pair `(i, j)`.
    pub fn set(&mut self, i: usize, j: usize, score: f64) {
        let index = Pair::new(i, j).triangle_index();
        self.cells[index] = score;
    }

    /// Checks every stored cell is finite, as required before neighbor-
    /// joining consumes this matrix (spec's `DegenerateDistance` failure).
    pub fn validate_finite(&self) -> Result<(), MsaError> {
        for max in 1..self.n {
            for min in 0..max {
                let value = self.get(min, max);
                if !value.is_finite() {
                    return Err(MsaError::DegenerateDistance(min, max));
                }
            }
        }
        Ok(())
    }
}
