//! Growable active distance matrix over the OTU id space `0..2N-1`.
//!
//! Unlike [`msa_core::DistanceMatrix`] (fixed `N`, strict lower triangle),
//! neighbor-joining needs to both read the original `N x N` pairwise scores
//! *and* write new rows for internal OTUs as they're created. This type is
//! full (not triangular) and pre-sized to `2N-1` so a freshly allocated
//! internal OTU id is always already a valid row/column index -- no resizing
//! mid-run.

use msa_core::{DistanceMatrix, Otu};

/// Square matrix over `0..capacity` OTU ids, symmetric by construction
/// (every write lands in both `(a, b)` and `(b, a)`). Only cells whose ids
/// are in the caller-tracked active set are meaningful at any point in time;
/// the rest are stale leftovers from already-joined OTUs.
#[derive(Debug, Clone)]
pub struct ActiveMatrix {
    capacity: usize,
    cells: Vec<f64>,
}

impl ActiveMatrix {
    /// Builds the matrix for `n` leaves, seeded from the pairwise distance
    /// matrix. Capacity is `2n-1`, the final OTU count the tree will reach.
    pub fn from_distance_matrix(distances: &DistanceMatrix) -> Self {
        let n = distances.n();
        let capacity = (2 * n).saturating_sub(1).max(n);
        let mut cells = vec![0.0; capacity * capacity];
        for i in 0..n {
            for j in 0..n {
                if i != j {
                    cells[i * capacity + j] = distances.get(i, j);
                }
            }
        }
        Self { capacity, cells }
    }

    pub fn get(&self, a: Otu, b: Otu) -> f64 {
        if a == b {
            return 0.0;
        }
        self.cells[a * self.capacity + b]
    }

    /// Writes `(a, b)` and `(b, a)` together, preserving symmetry.
    pub fn set(&mut self, a: Otu, b: Otu, value: f64) {
        self.cells[a * self.capacity + b] = value;
        self.cells[b * self.capacity + a] = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_from_the_pairwise_distance_matrix() {
        let mut distances = DistanceMatrix::zeros(3);
        distances.set(0, 1, 5.0);
        distances.set(0, 2, 7.0);
        distances.set(1, 2, 9.0);

        let active = ActiveMatrix::from_distance_matrix(&distances);
        assert_eq!(active.get(0, 1), 5.0);
        assert_eq!(active.get(1, 0), 5.0);
        assert_eq!(active.get(0, 2), 7.0);
        assert_eq!(active.get(1, 2), 9.0);
    }

    #[test]
    fn set_is_symmetric_and_new_rows_are_addressable() {
        let distances = DistanceMatrix::zeros(3); // capacity = 5, OTU 3 and 4 unused yet
        let mut active = ActiveMatrix::from_distance_matrix(&distances);
        active.set(3, 2, 1.5);
        assert_eq!(active.get(3, 2), 1.5);
        assert_eq!(active.get(2, 3), 1.5);
    }
}
