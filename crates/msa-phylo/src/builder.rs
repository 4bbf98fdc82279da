//! Iterative star-contraction neighbor-joining, distributed by striping the
//! active OTU set's rows across ranks (spec.md section 4.4).
//!
//! Each rank holds a full replica of the active matrix (section 5: "reads
//! are satisfied from the post-broadcast local replica, guaranteeing
//! single-writer discipline without locks"). A rank only ever *writes* the
//! rows it owns; after a join, the owner of the merged row broadcasts it so
//! every other rank's replica stays current.

use crate::matrix::ActiveMatrix;
use msa_core::error::MsaError;
use msa_core::guide_tree::Otu;
use msa_core::{DistanceMatrix, GuideTree};
use msa_transport::{elevate_error, ClusterInfo, Collective, CollectiveOutcome};

/// The builder's state machine, mirrored on `msa_pairwise::engine::EngineState`
/// for the same reason: purely observational within a rank, but named so a
/// fault's log line carries the phase it interrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderState {
    Idle,
    Reducing,
    Joining,
    Done,
}

/// The locally (or globally, post-allreduce) best join candidate: the pair
/// maximizing the Q-criterion, spec.md section 4.4 step 3's tie-break
/// (smaller `u`, then smaller `v`) baked into [`better`] rather than left to
/// a derived `Ord` -- `f64` isn't `Ord`, and the tie-break only applies when
/// two `Q` values compare exactly equal, not via a lexicographic fallback.
///
/// Public (rather than crate-private) only because it appears in the
/// `Collective<Candidate>` bound on [`run`]; callers never construct one
/// directly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    q: f64,
    u: Otu,
    v: Otu,
}

impl Default for Candidate {
    /// The identity element for [`better`]'s reduction: any real candidate
    /// has a finite `Q` and so always wins over this sentinel.
    fn default() -> Self {
        Self {
            q: f64::NEG_INFINITY,
            u: usize::MAX,
            v: usize::MAX,
        }
    }
}

/// Picks the better of two candidates: larger `Q` wins; on an exact tie,
/// smaller `u` wins, then smaller `v`. This is the spec's Open Question
/// resolved (see DESIGN.md): the source's `closest` reducer picks the
/// *larger* of two compared values, which this implementation reproduces by
/// maximizing `Q` directly rather than minimizing it.
fn better(a: Candidate, b: Candidate) -> Candidate {
    if a.q > b.q {
        a
    } else if b.q > a.q {
        b
    } else if a.u != b.u {
        if a.u < b.u {
            a
        } else {
            b
        }
    } else if a.v <= b.v {
        a
    } else {
        b
    }
}

/// Runs neighbor-joining to completion: rank-collective, every error
/// surfaced by any rank is elevated before it escapes (same discipline as
/// `msa_pairwise::engine::run`).
pub fn run<C>(distances: &DistanceMatrix, transport: &C) -> Result<GuideTree, MsaError>
where
    C: ClusterInfo + Collective<Vec<f64>> + Collective<Candidate> + Collective<CollectiveOutcome>,
{
    let mut state = BuilderState::Idle;
    let result = run_inner(distances, transport, &mut state);

    match &result {
        Ok(_) => {
            elevate_error(transport, Ok(()))?;
        }
        Err(error) => {
            log::warn!(
                "neighbor-joining faulted in state {:?} on rank {}: {}",
                state,
                transport.rank(),
                error
            );
            transport.barrier();
            elevate_error(transport, Err(error))?;
        }
    }

    result
}

fn run_inner<C>(
    distances: &DistanceMatrix,
    transport: &C,
    state: &mut BuilderState,
) -> Result<GuideTree, MsaError>
where
    C: ClusterInfo + Collective<Vec<f64>> + Collective<Candidate>,
{
    let n = distances.n();
    if n < 2 {
        return Err(MsaError::EmptyDatabase);
    }
    distances.validate_finite()?;

    if n == 2 {
        let mut tree = GuideTree::new(n);
        // `d` is the raw pairwise score (spec.md section 4.1), not a
        // dissimilarity -- identical sequences give a large `d`, hence a
        // large branch length here, not zero.
        let d = distances.get(0, 1);
        let w = tree.join(0, 1, d / 2.0, d / 2.0);
        tree.set_root(w);
        *state = BuilderState::Done;
        return Ok(tree);
    }

    let rank = transport.rank();
    let world_size = transport.size();

    let mut matrix = ActiveMatrix::from_distance_matrix(distances);
    let mut active: Vec<Otu> = (0..n).collect();
    let mut tree = GuideTree::new(n);
    let mut next_otu = n;

    while active.len() > 2 {
        *state = BuilderState::Reducing;
        let k = active.len();

        // Step 1: row sums, striped by position in the (globally identical)
        // sorted active list -- spec.md: "row sums are local ... scanned
        // only over the rank's owned rows".
        let mut partial_sums = vec![0.0; k];
        for (idx, &u) in active.iter().enumerate() {
            if idx % world_size == rank {
                partial_sums[idx] = active.iter().map(|&v| matrix.get(u, v)).sum();
            }
        }
        let sums = transport.allreduce(partial_sums, |a, b| {
            a.into_iter().zip(b).map(|(x, y)| x + y).collect()
        });

        // Step 2+3: local reduction to the best (u, v) among this rank's
        // owned rows.
        let mut local_best = Candidate::default();
        for (idx_u, &u) in active.iter().enumerate() {
            if idx_u % world_size != rank {
                continue;
            }
            for (idx_v, &v) in active.iter().enumerate() {
                if v <= u {
                    continue;
                }
                let q = (k as f64 - 2.0) * matrix.get(u, v) - sums[idx_u] - sums[idx_v];
                local_best = better(local_best, Candidate { q, u, v });
            }
        }

        // Step 4: cluster-wide all-reduce to the global winner.
        let winner = transport.allreduce(local_best, better);
        let (u, v) = (winner.u, winner.v);
        let idx_u = active.iter().position(|&x| x == u).expect("winner.u is active");
        let idx_v = active.iter().position(|&x| x == v).expect("winner.v is active");
        let s_u = sums[idx_u];
        let s_v = sums[idx_v];
        let d_uv = matrix.get(u, v);

        *state = BuilderState::Joining;

        // Step 5: new internal OTU and branch lengths.
        let w = next_otu;
        next_otu += 1;
        let d_uw = d_uv / 2.0 + (s_u - s_v) / (2.0 * (k as f64 - 2.0));
        let d_vw = d_uv - d_uw;
        tree.join(u, v, d_uw, d_vw);

        // Step 6: merged row, computed and broadcast by row u's owner.
        let owner = idx_u % world_size;
        let remaining: Vec<Otu> = active.iter().copied().filter(|&z| z != u && z != v).collect();
        let merged_row = if rank == owner {
            remaining
                .iter()
                .map(|&z| (matrix.get(u, z) + matrix.get(v, z) - d_uv) / 2.0)
                .collect()
        } else {
            vec![0.0; remaining.len()]
        };
        let merged_row = transport.broadcast(merged_row, owner);
        for (&z, &value) in remaining.iter().zip(merged_row.iter()) {
            matrix.set(w, z, value);
        }

        // Step 7: contract the active set.
        active.retain(|&x| x != u && x != v);
        active.push(w);
        active.sort_unstable();

        log::debug!(
            "rank {}/{} joined ({}, {}) -> {} at Q={:.4}, {} OTUs remain",
            rank,
            world_size,
            u,
            v,
            w,
            winner.q,
            active.len()
        );
    }

    debug_assert_eq!(active.len(), 2);
    let (u, v) = (active[0], active[1]);
    let d_uv = matrix.get(u, v);
    let root = tree.join(u, v, d_uv / 2.0, d_uv / 2.0);
    tree.set_root(root);

    *state = BuilderState::Done;
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use msa_transport::LocalTransport;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn any_finite_nonnegative_distance_matrix_yields_two_n_minus_one_nodes(
            n in 2usize..8,
            seed in 0u64..10_000,
        ) {
            // A cheap deterministic pseudo-random fill (no external RNG
            // dependency needed for this property): distinct, finite,
            // non-negative, symmetric by construction since `set` only
            // takes one (i, j) and `DistanceMatrix` mirrors it.
            let mut distances = DistanceMatrix::zeros(n);
            let mut state = seed.wrapping_add(1);
            for i in 1..n {
                for j in 0..i {
                    state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
                    let value = ((state >> 33) % 1000) as f64 / 10.0;
                    distances.set(j, i, value);
                }
            }

            let tree = run(&distances, &LocalTransport).unwrap();
            prop_assert_eq!(tree.len(), 2 * n - 1);
            prop_assert!(tree.is_complete());
            for leaf in 0..n {
                prop_assert!(tree.node(leaf).unwrap().is_leaf());
            }
        }
    }

    #[test]
    fn empty_or_singleton_database_fails_fast() {
        let distances = DistanceMatrix::zeros(1);
        assert!(matches!(
            run(&distances, &LocalTransport),
            Err(MsaError::EmptyDatabase)
        ));
    }

    #[test]
    fn degenerate_distance_fails_before_any_join() {
        let mut distances = DistanceMatrix::zeros(3);
        distances.set(0, 1, f64::NAN);
        assert!(matches!(
            run(&distances, &LocalTransport),
            Err(MsaError::DegenerateDistance(0, 1))
        ));
    }

    #[test]
    fn two_leaves_join_directly_at_the_root() {
        let mut distances = DistanceMatrix::zeros(2);
        distances.set(0, 1, 10.0);
        let tree = run(&distances, &LocalTransport).unwrap();

        assert_eq!(tree.len(), 3); // 2 leaves + 1 internal OTU
        assert_eq!(tree.root(), Some(2));
        let root = tree.node(2).unwrap();
        assert_eq!(root.branch_length_left, 5.0);
        assert_eq!(root.branch_length_right, 5.0);
    }

    #[test]
    fn produces_exactly_two_n_minus_one_nodes() {
        let mut distances = DistanceMatrix::zeros(5);
        let scores = [
            (0, 1, 2.0), (0, 2, 4.0), (0, 3, 6.0), (0, 4, 6.0),
            (1, 2, 4.0), (1, 3, 6.0), (1, 4, 6.0),
            (2, 3, 6.0), (2, 4, 6.0),
            (3, 4, 4.0),
        ];
        for (i, j, d) in scores {
            distances.set(i, j, d);
        }

        let tree = run(&distances, &LocalTransport).unwrap();
        assert_eq!(tree.len(), 2 * 5 - 1);
        assert!(tree.is_complete());
        for leaf in 0..5 {
            assert!(tree.node(leaf).unwrap().is_leaf());
        }
    }

    #[test]
    fn three_sequences_join_the_closest_pair_first() {
        // D[0,1] small, D[0,2] and D[1,2] larger -- 0 and 1 should join
        // before either joins 2.
        let mut distances = DistanceMatrix::zeros(3);
        distances.set(0, 1, 2.0);
        distances.set(0, 2, 10.0);
        distances.set(1, 2, 10.0);

        let tree = run(&distances, &LocalTransport).unwrap();
        let root = tree.node(tree.root().unwrap()).unwrap();
        let children: Vec<Otu> = [root.left, root.right].into_iter().flatten().collect();
        // With only 3 leaves the last join is the root directly (k=3 -> k=2
        // is a single step), so a direct 0/1-first assertion needs k>=4; this
        // asserts the tree is at least well-formed for the 3-leaf edge case.
        assert_eq!(children.len(), 2);
        assert_eq!(root.subtree_leaves, 3);
    }

    #[test]
    fn branch_lengths_are_non_negative_for_additive_input() {
        // A perfect 4-leaf additive tree: ((0:1,1:1):1,(2:1,3:1):1)
        let mut distances = DistanceMatrix::zeros(4);
        distances.set(0, 1, 2.0);
        distances.set(2, 3, 2.0);
        distances.set(0, 2, 4.0);
        distances.set(0, 3, 4.0);
        distances.set(1, 2, 4.0);
        distances.set(1, 3, 4.0);

        let tree = run(&distances, &LocalTransport).unwrap();
        for otu in 0..tree.len() {
            let node = tree.node(otu).unwrap();
            if !node.is_leaf() {
                assert!(node.branch_length_left >= -1e-6);
                assert!(node.branch_length_right >= -1e-6);
            }
        }
    }
}
