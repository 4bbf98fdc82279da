//! Pipeline-stage adapter: wraps [`crate::builder::run`] as an
//! `msa_pipeline::Module<C>`, consuming the `DistanceMatrix` conduit and
//! producing the `GuideTree` conduit.

use msa_core::error::MsaError;
use msa_pipeline::{Conduit, ConduitKind, Module, PipelineIo};
use msa_transport::{ClusterInfo, Collective, CollectiveOutcome};

use crate::builder::Candidate;

/// The `DistanceMatrix -> GuideTree` stage of the `load -> pairwise ->
/// phylogeny` chain.
pub struct PhyloStage;

impl<C> Module<C> for PhyloStage
where
    C: ClusterInfo + Collective<Vec<f64>> + Collective<Candidate> + Collective<CollectiveOutcome>,
{
    fn name(&self) -> &str {
        "phylogeny"
    }

    fn expects(&self) -> ConduitKind {
        ConduitKind::DistanceMatrix
    }

    fn produces(&self) -> ConduitKind {
        ConduitKind::GuideTree
    }

    /// Neighbor-joining has no configuration to pre-validate beyond the
    /// conduit's type, which `PipelineRunner::new` already checks -- this
    /// always passes.
    fn check(&self, _io: &PipelineIo<C>) -> bool {
        true
    }

    fn run(&self, io: &mut PipelineIo<C>, input: Conduit) -> Result<Conduit, MsaError> {
        let distances = input.into_distance_matrix()?;
        let tree = crate::builder::run(&distances, &io.transport)?;
        Ok(Conduit::GuideTree(tree))
    }
}
