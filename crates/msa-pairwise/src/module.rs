//! Pipeline-stage adapter: wraps [`crate::engine::run`] as an
//! `msa_pipeline::Module<C>`, consuming the `Database` conduit and producing
//! the `DistanceMatrix` conduit.

use crate::algorithm::AlgorithmName;
use msa_core::error::MsaError;
use msa_pipeline::{Conduit, ConduitKind, Module, PipelineIo};
use msa_transport::{ClusterInfo, Collective, CollectiveOutcome};

/// The `Database -> DistanceMatrix` stage of the `load -> pairwise ->
/// phylogeny` chain.
pub struct PairwiseStage;

impl<C> Module<C> for PairwiseStage
where
    C: ClusterInfo + Collective<Vec<f64>> + Collective<CollectiveOutcome>,
{
    fn name(&self) -> &str {
        "pairwise"
    }

    fn expects(&self) -> ConduitKind {
        ConduitKind::Database
    }

    fn produces(&self) -> ConduitKind {
        ConduitKind::DistanceMatrix
    }

    /// Rejects a negative gap penalty before any pair is scored -- spec.md
    /// section 3's scoring-table invariant ("non-negative gap penalty") is a
    /// data precondition this stage enforces rather than `msa-scoring`
    /// itself, since `ScoringTable::named` is also used in contexts (tests,
    /// the device view) where that check would just be friction.
    fn check(&self, io: &PipelineIo<C>) -> bool {
        io.scoring_table.gap_penalty() >= 0.0
    }

    fn run(&self, io: &mut PipelineIo<C>, input: Conduit) -> Result<Conduit, MsaError> {
        let database = input.into_database()?;
        let algorithm = AlgorithmName::from_str(&io.config.algorithm_name)?;
        let matrix = crate::engine::run(&database, &io.scoring_table, algorithm, &io.transport)?;
        Ok(Conduit::DistanceMatrix(matrix))
    }
}
