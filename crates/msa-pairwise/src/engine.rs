//! Distributed dispatcher: partitions the pair workload across ranks,
//! drives the selected backend locally, then all-gathers so every rank ends
//! up with the same complete [`DistanceMatrix`].

use crate::algorithm::AlgorithmName;
use crate::cpu;
use msa_core::database::Database;
use msa_core::distance_matrix::DistanceMatrix;
use msa_core::error::MsaError;
use msa_core::pair::{self, Pair};
use msa_scoring::ScoringTable;
use msa_transport::{elevate_error, ClusterInfo, Collective, CollectiveOutcome};

/// The engine's state machine (spec.md section 4.3): `idle -> partitioning
/// -> executing -> gathering -> ready`. Purely observational here (there is
/// no separate thread to synchronize against within a rank -- section 5's
/// single-host-thread model), but kept as an explicit type so a fault's
/// `debug!`/`warn!` trail names the phase it interrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Partitioning,
    Executing,
    Gathering,
    Ready,
}

/// Runs the pairwise engine to completion: rank-collective, every error
/// surfaced by any rank is elevated so no rank is left waiting inside the
/// final all-gather while a peer has already failed.
pub fn run<C>(
    database: &Database,
    table: &ScoringTable,
    algorithm: AlgorithmName,
    transport: &C,
) -> Result<DistanceMatrix, MsaError>
where
    C: ClusterInfo + Collective<Vec<f64>> + Collective<CollectiveOutcome>,
{
    let mut state = EngineState::Idle;
    let result = run_inner(database, table, algorithm, transport, &mut state);

    match &result {
        Ok(_) => {
            elevate_error(transport, Ok(()))?;
        }
        Err(error) => {
            log::warn!(
                "pairwise engine faulted in state {:?} on rank {}: {}",
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
    database: &Database,
    table: &ScoringTable,
    algorithm: AlgorithmName,
    transport: &C,
    state: &mut EngineState,
) -> Result<DistanceMatrix, MsaError>
where
    C: ClusterInfo + Collective<Vec<f64>>,
{
    let n = database.len();
    if n < 2 {
        return Err(MsaError::EmptyDatabase);
    }

    *state = EngineState::Partitioning;
    let rank = transport.rank();
    let world_size = transport.size();
    let local_pairs = pair::partition_for_rank(n, rank, world_size);
    log::debug!(
        "rank {}/{} assigned {} of {} pairs",
        rank,
        world_size,
        local_pairs.len(),
        n * (n - 1) / 2
    );

    *state = EngineState::Executing;
    let local_scores = execute(database, &local_pairs, table, algorithm)?;

    *state = EngineState::Gathering;
    let gathered = transport.allgather(local_scores);

    *state = EngineState::Ready;
    let mut matrix = DistanceMatrix::zeros(n);
    for r in 0..world_size {
        let rank_pairs = pair::partition_for_rank(n, r, world_size);
        let rank_scores = gathered
            .get(r)
            .ok_or_else(|| MsaError::InternalInvariant("allgather returned fewer results than ranks".into()))?;
        if rank_pairs.len() != rank_scores.len() {
            return Err(MsaError::InternalInvariant(format!(
                "rank {} reported {} scores for {} assigned pairs",
                r,
                rank_scores.len(),
                rank_pairs.len()
            )));
        }
        for (pair, &score) in rank_pairs.iter().zip(rank_scores.iter()) {
            matrix.set(pair.min(), pair.max(), score);
        }
    }

    matrix.validate_finite()?;
    Ok(matrix)
}

fn execute(
    database: &Database,
    pairs: &[Pair],
    table: &ScoringTable,
    algorithm: AlgorithmName,
) -> Result<Vec<f64>, MsaError> {
    match algorithm {
        AlgorithmName::Sequential => Ok(cpu::score_pairs_parallel(database, pairs, table)),
        AlgorithmName::Needleman => execute_gpu(database, pairs, table),
        AlgorithmName::Hybrid => match execute_gpu(database, pairs, table) {
            Ok(scores) => Ok(scores),
            Err(MsaError::DeviceOutOfMemory(_)) => {
                log::warn!("no GPU available for hybrid dispatch, falling back to the CPU backend");
                Ok(cpu::score_pairs_parallel(database, pairs, table))
            }
            Err(other) => Err(other),
        },
    }
}

#[cfg(feature = "gpu")]
fn execute_gpu(database: &Database, pairs: &[Pair], table: &ScoringTable) -> Result<Vec<f64>, MsaError> {
    let backend = msa_gpu::MsaGpuBackend::new()?;
    backend.score_pairs(database, pairs, table)
}

#[cfg(not(feature = "gpu"))]
fn execute_gpu(_database: &Database, _pairs: &[Pair], _table: &ScoringTable) -> Result<Vec<f64>, MsaError> {
    Err(MsaError::DeviceOutOfMemory(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use msa_core::EncodedSequence;
    use msa_transport::LocalTransport;

    fn three_sequence_database() -> Database {
        let mut db = Database::new();
        db.push(None, EncodedSequence::from_ascii(b"AC"));
        db.push(None, EncodedSequence::from_ascii(b"AC"));
        db.push(None, EncodedSequence::from_ascii(b"GT"));
        db
    }

    #[test]
    fn empty_database_fails_fast() {
        let table = ScoringTable::named("blosum62", 4.0).unwrap();
        let db = Database::new();
        let result = run(&db, &table, AlgorithmName::Sequential, &LocalTransport);
        assert!(matches!(result, Err(MsaError::EmptyDatabase)));
    }

    #[test]
    fn produces_a_symmetric_complete_matrix_on_a_single_rank() {
        let table = ScoringTable::named("blosum62", 4.0).unwrap();
        let db = three_sequence_database();
        let matrix = run(&db, &table, AlgorithmName::Sequential, &LocalTransport).unwrap();

        assert_eq!(matrix.get(0, 1), matrix.get(1, 0));
        assert_eq!(matrix.get(0, 1), 13.0); // "AC" vs "AC": match(A,A)=4 + match(C,C)=9
    }

    #[test]
    fn hybrid_falls_back_to_cpu_when_no_gpu_is_compiled_in() {
        let table = ScoringTable::named("blosum62", 4.0).unwrap();
        let db = three_sequence_database();
        let sequential = run(&db, &table, AlgorithmName::Sequential, &LocalTransport).unwrap();
        let hybrid = run(&db, &table, AlgorithmName::Hybrid, &LocalTransport).unwrap();
        assert_eq!(sequential, hybrid);
    }
}
