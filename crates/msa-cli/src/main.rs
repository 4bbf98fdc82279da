//! Thin CLI entry point for the distributed pairwise distance/guide-tree
//! engine: argument parsing, logging setup, a demo sequence loader, and
//! wiring the `load -> pairwise -> phylogeny` pipeline end to end.
//!
//! The business logic this binary surfaces (argument semantics, file
//! formats, an embedding API) is out of the core's scope per spec.md
//! section 1; this binary exists only as harness scaffolding around it.

mod loader;

use anyhow::Context;
use clap::Parser;
use msa_core::error::MsaError;
use msa_pipeline::{Conduit, PipelineConfig, PipelineIo, PipelineRunner};
use msa_scoring::ScoringTable;
use msa_transport::LocalTransport;
use std::path::PathBuf;

/// Computes all pairwise distances for a set of sequences and builds a
/// neighbor-joining guide tree.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to a `>`-delimited sequence file (see `msa_cli::loader`; not the
    /// spec'd FASTA parser, which is out of this binary's scope).
    input: PathBuf,

    /// Scoring table name: one of `msa_scoring::ScoringTable::list()`, or
    /// `default` (resolves to `blosum62`).
    #[arg(long, default_value = "default")]
    table: String,

    /// Pairwise algorithm: `needleman`, `sequential`, `hybrid`, or `default`
    /// (resolves to `hybrid`).
    #[arg(long, default_value = "default")]
    algorithm: String,

    /// Linear gap penalty, subtracted once per indel column.
    #[arg(long, default_value_t = 4.0)]
    gap_penalty: f64,

    /// Informational only: `LocalTransport` is always rank 0 of size 1
    /// unless this binary is built with the `cluster` feature and launched
    /// under an MPI job starter, in which case the real world size comes
    /// from the MPI environment and this flag is ignored.
    #[arg(long, default_value_t = 1)]
    world_size: usize,

    /// Optional path to write the guide tree as pretty-printed JSON.
    /// Persisted state is explicitly out of the core's scope (spec.md
    /// section 6: "a caller may serialize the distance matrix and tree in
    /// any format -- not part of this spec"); this is that caller-side
    /// convenience, grounded in the harness workspace's
    /// `ExecutionEngine::save_checkpoint` use of `serde_json::to_string_pretty`.
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    match run(&args) {
        Ok(summary) => {
            println!("{summary}");
            std::process::exit(0);
        }
        Err(error) => {
            let exit_code = error
                .downcast_ref::<MsaError>()
                .map(MsaError::exit_code)
                .unwrap_or(1);
            eprintln!("error: {error:#}");
            std::process::exit(exit_code);
        }
    }
}

fn run(args: &Args) -> anyhow::Result<String> {
    if args.world_size > 1 {
        log::warn!(
            "--world-size {} requested but this binary was not built with the `cluster` feature; \
             running as a single rank",
            args.world_size
        );
    }

    let database =
        loader::load_database(&args.input).with_context(|| format!("loading {}", args.input.display()))?;
    log::info!(
        "loaded {} sequences from {}",
        database.len(),
        args.input.display()
    );

    let scoring_table = ScoringTable::named(&args.table, args.gap_penalty)?;
    let transport = LocalTransport;

    let modules: Vec<Box<dyn msa_pipeline::Module<LocalTransport>>> = vec![
        Box::new(msa_pairwise::PairwiseStage),
        Box::new(msa_phylo::module::PhyloStage),
    ];
    let runner = PipelineRunner::new(modules)?.with_middleware(Box::new(msa_pipeline::LoggingMiddleware));

    let mut io = PipelineIo {
        config: PipelineConfig {
            table_name: args.table.clone(),
            algorithm_name: args.algorithm.clone(),
            gap_penalty: args.gap_penalty,
        },
        transport,
        scoring_table,
    };

    let output = runner.run(&mut io, Conduit::Database(database))?;
    let tree = output.into_guide_tree()?;

    if let Some(path) = &args.output {
        let json = serde_json::to_string_pretty(&tree)
            .map_err(|e| MsaError::InternalInvariant(format!("guide tree is not serializable: {e}")))?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        log::info!("wrote guide tree to {}", path.display());
    }

    Ok(summarize(&tree))
}

fn summarize(tree: &msa_core::GuideTree) -> String {
    let root = tree.root().expect("a completed guide tree always has a root");
    format!(
        "guide tree: {} leaves, {} nodes total, root OTU {}",
        tree.n_leaves(),
        tree.len(),
        root
    )
}
