//! Canonical pair type and the deterministic workload partition over the
//! `N(N-1)/2` pair space.

use serde::{Deserialize, Serialize};

/// An unordered pair of database indices, canonicalized as `(min, max)` on
/// construction so `Pair::new(i, j) == Pair::new(j, i)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pair {
    min: usize,
    max: usize,
}

impl Pair {
    /// Builds the canonical `(min, max)` form. Panics if `i == j`: a pair
    /// compares a database entry against itself, which is never part of the
    /// `N(N-1)/2` pair space.
    pub fn new(i: usize, j: usize) -> Self {
        assert_ne!(i, j, "pair indices must differ");
        if i < j {
            Self { min: i, max: j }
        } else {
            Self { min: j, max: i }
        }
    }

    pub fn min(&self) -> usize {
        self.min
    }

    pub fn max(&self) -> usize {
        self.max
    }

    /// The cartesian index into the strict-lower-triangle distance matrix
    /// storage: `max * (max - 1) / 2 + min`.
    pub fn triangle_index(&self) -> usize {
        self.max * (self.max - 1) / 2 + self.min
    }
}

/// Enumerates all `N(N-1)/2` pairs for a database of cardinality `n`, in
/// canonical order: `max` ascending, `min` ascending within each `max`. This
/// is the same order the distance matrix's triangle index assumes, so the
/// `k`-th pair yielded here lands at triangle index `k`.
pub fn enumerate_all(n: usize) -> impl Iterator<Item = Pair> {
    (1..n).flat_map(|max| (0..max).map(move |min| Pair { min, max }))
}

/// The deterministic subset of pairs assigned to `rank` out of `world_size`
/// total ranks: every `k`-th pair in canonical order with `k ≡ rank (mod
/// world_size)`. Order within the rank is preserved so later result
/// placement is positional (see `msa_pairwise::engine`).
pub fn partition_for_rank(n: usize, rank: usize, world_size: usize) -> Vec<Pair> {
    assert!(world_size > 0, "world_size must be at least 1");
    assert!(rank < world_size, "rank must be in 0..world_size");

    enumerate_all(n)
        .enumerate()
        .filter_map(|(k, pair)| (k % world_size == rank).then_some(pair))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn canonicalizes_regardless_of_argument_order() {
        assert_eq!(Pair::new(3, 1), Pair::new(1, 3));
        assert_eq!(Pair::new(3, 1).min(), 1);
        assert_eq!(Pair::new(3, 1).max(), 3);
    }

    #[test]
    #[should_panic]
    fn rejects_self_pair() {
        Pair::new(2, 2);
    }

    #[test]
    fn enumerate_all_matches_triangle_indices() {
        let pairs: Vec<Pair> = enumerate_all(4).collect();
        assert_eq!(pairs.len(), 6); // 4*3/2
        for (k, pair) in pairs.iter().enumerate() {
            assert_eq!(pair.triangle_index(), k);
        }
    }

    #[test]
    fn partition_is_balanced_within_one_pair() {
        let n = 10; // 45 pairs
        let world_size = 4;
        let counts: Vec<usize> = (0..world_size)
            .map(|r| partition_for_rank(n, r, world_size).len())
            .collect();
        let min = *counts.iter().min().unwrap();
        let max = *counts.iter().max().unwrap();
        assert!(max - min <= 1);
        assert_eq!(counts.iter().sum::<usize>(), 45);
    }

    #[test]
    fn partition_is_a_disjoint_cover_of_all_pairs() {
        let n = 9;
        let world_size = 3;
        let mut seen = HashSet::new();
        for r in 0..world_size {
            for pair in partition_for_rank(n, r, world_size) {
                assert!(seen.insert(pair), "pair assigned to more than one rank");
            }
        }
        assert_eq!(seen.len(), n * (n - 1) / 2);
    }

    proptest! {
        #[test]
        fn pair_canonicalization_is_symmetric(i in 0usize..200, j in 0usize..200) {
            prop_assume!(i != j);
            prop_assert_eq!(Pair::new(i, j), Pair::new(j, i));
        }
    }
}
