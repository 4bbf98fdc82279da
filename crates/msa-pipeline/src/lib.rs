//! Typed module chain for the load -> pairwise -> phylogeny run.
//!
//! Grounded in the harness workspace's `BenchmarkRunner::run_all` (a fixed
//! ordered list of stages, each producing a result the runner collects) and
//! `asbb_core::operation_registry`'s string-keyed, hot-swappable dispatch,
//! generalized to spec.md section 4.5's typed conduit hand-off: each module
//! declares the [`ConduitKind`] it expects from its predecessor and the kind
//! it produces, checked once at [`PipelineRunner::new`] rather than at every
//! `run` call, so a misconfigured chain fails before any stage has run.

use msa_core::error::MsaError;
use msa_core::{Database, DistanceMatrix, GuideTree};
use msa_scoring::ScoringTable;

/// A typed value moved from one pipeline stage to the next. Exactly one
/// conduit kind crosses any given edge; a module's `run` both consumes one
/// variant and produces one (possibly different) variant.
#[derive(Debug, Clone)]
pub enum Conduit {
    Database(Database),
    DistanceMatrix(DistanceMatrix),
    GuideTree(GuideTree),
}

/// The discriminant of a [`Conduit`], used to check stage composition
/// without requiring `Conduit` itself to implement equality over its
/// (non-`PartialEq`) payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConduitKind {
    Database,
    DistanceMatrix,
    GuideTree,
}

impl Conduit {
    pub fn kind(&self) -> ConduitKind {
        match self {
            Conduit::Database(_) => ConduitKind::Database,
            Conduit::DistanceMatrix(_) => ConduitKind::DistanceMatrix,
            Conduit::GuideTree(_) => ConduitKind::GuideTree,
        }
    }

    pub fn into_database(self) -> Result<Database, MsaError> {
        match self {
            Conduit::Database(d) => Ok(d),
            other => Err(unexpected_conduit(ConduitKind::Database, other.kind())),
        }
    }

    pub fn into_distance_matrix(self) -> Result<DistanceMatrix, MsaError> {
        match self {
            Conduit::DistanceMatrix(d) => Ok(d),
            other => Err(unexpected_conduit(ConduitKind::DistanceMatrix, other.kind())),
        }
    }

    pub fn into_guide_tree(self) -> Result<GuideTree, MsaError> {
        match self {
            Conduit::GuideTree(t) => Ok(t),
            other => Err(unexpected_conduit(ConduitKind::GuideTree, other.kind())),
        }
    }
}

fn unexpected_conduit(expected: ConduitKind, got: ConduitKind) -> MsaError {
    MsaError::InternalInvariant(format!(
        "conduit type mismatch: expected {:?}, got {:?} (should have been caught at PipelineRunner::new)",
        expected, got
    ))
}

/// The current configuration a module's [`Module::check`] validates against:
/// the table/algorithm names and gap penalty selected for this run. `msa-cli`
/// is the only producer of a `PipelineConfig` in this workspace; it is kept
/// here (rather than in the CLI crate) so library-crate modules can validate
/// against it without depending on the binary crate.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub table_name: String,
    pub algorithm_name: String,
    pub gap_penalty: f64,
}

/// A module's view of the run: its resolved configuration plus the cluster
/// transport it drives collectives through. Generic over the transport type
/// `C` so pipeline construction never forces a concrete transport on
/// modules that don't need one (see `msa_transport::Collective`).
pub struct PipelineIo<C> {
    pub config: PipelineConfig,
    pub transport: C,
    pub scoring_table: ScoringTable,
}

/// One stage of the pipeline. `expects`/`produces` are declared once and
/// checked at construction; `check` is the per-run pre-flight validation
/// against the resolved [`PipelineConfig`].
pub trait Module<C> {
    fn name(&self) -> &str;
    fn expects(&self) -> ConduitKind;
    fn produces(&self) -> ConduitKind;
    fn check(&self, io: &PipelineIo<C>) -> bool;
    fn run(&self, io: &mut PipelineIo<C>, input: Conduit) -> Result<Conduit, MsaError>;
}

/// A decorator around a module's `run`, composed like an onion layer: a
/// middleware may short-circuit (return without calling `next`) or bubble
/// through to the wrapped stage.
pub trait Middleware<C> {
    fn around(
        &self,
        module: &dyn Module<C>,
        io: &mut PipelineIo<C>,
        input: Conduit,
        next: &mut dyn FnMut(&mut PipelineIo<C>, Conduit) -> Result<Conduit, MsaError>,
    ) -> Result<Conduit, MsaError>;
}

/// Logs entry/exit of every wrapped stage. The one concrete middleware this
/// crate ships, grounded in the harness workspace's
/// `BenchmarkRunner::run_all`, which prints a line per benchmark as it runs.
pub struct LoggingMiddleware;

impl<C> Middleware<C> for LoggingMiddleware {
    fn around(
        &self,
        module: &dyn Module<C>,
        io: &mut PipelineIo<C>,
        input: Conduit,
        next: &mut dyn FnMut(&mut PipelineIo<C>, Conduit) -> Result<Conduit, MsaError>,
    ) -> Result<Conduit, MsaError> {
        log::info!("pipeline stage '{}' starting", module.name());
        let result = next(io, input);
        match &result {
            Ok(_) => log::info!("pipeline stage '{}' completed", module.name()),
            Err(e) => log::warn!("pipeline stage '{}' failed: {}", module.name(), e),
        }
        result
    }
}

/// An ordered chain of modules, each stage's conduit moved into the next.
/// Composition is verified once at construction: every module's `expects`
/// must match its predecessor's `produces` (the first module's `expects`
/// must match the conduit the caller hands to [`PipelineRunner::run`]).
pub struct PipelineRunner<C> {
    modules: Vec<Box<dyn Module<C>>>,
    middlewares: Vec<Box<dyn Middleware<C>>>,
}

impl<C> PipelineRunner<C> {
    /// Builds a runner, failing with `PipelineInvalid` if any adjacent pair
    /// of modules declares mismatched conduit kinds.
    pub fn new(modules: Vec<Box<dyn Module<C>>>) -> Result<Self, MsaError> {
        for window in modules.windows(2) {
            let (prev, next) = (&window[0], &window[1]);
            if prev.produces() != next.expects() {
                return Err(MsaError::PipelineInvalid(format!(
                    "module '{}' produces {:?} but '{}' expects {:?}",
                    prev.name(),
                    prev.produces(),
                    next.name(),
                    next.expects()
                )));
            }
        }
        Ok(Self {
            modules,
            middlewares: Vec::new(),
        })
    }

    pub fn with_middleware(mut self, middleware: Box<dyn Middleware<C>>) -> Self {
        self.middlewares.push(middleware);
        self
    }

    /// Runs every stage in order. If any `check` fails, the whole run fails
    /// with `PipelineInvalid` before any stage's `run` executes (spec.md
    /// section 4.5: "If any check returns false the runner fails... before
    /// producing side effects").
    pub fn run(&self, io: &mut PipelineIo<C>, initial: Conduit) -> Result<Conduit, MsaError> {
        if let Some(first) = self.modules.first() {
            if first.expects() != initial.kind() {
                return Err(MsaError::PipelineInvalid(format!(
                    "pipeline expects initial conduit {:?} but got {:?}",
                    first.expects(),
                    initial.kind()
                )));
            }
        }

        for module in &self.modules {
            if !module.check(io) {
                return Err(MsaError::PipelineInvalid(format!(
                    "module '{}' failed pre-flight check",
                    module.name()
                )));
            }
        }

        let mut conduit = initial;
        for module in &self.modules {
            conduit = self.run_stage(module.as_ref(), io, conduit)?;
        }
        Ok(conduit)
    }

    fn run_stage(
        &self,
        module: &dyn Module<C>,
        io: &mut PipelineIo<C>,
        input: Conduit,
    ) -> Result<Conduit, MsaError> {
        fn invoke<C>(
            middlewares: &[Box<dyn Middleware<C>>],
            idx: usize,
            module: &dyn Module<C>,
            io: &mut PipelineIo<C>,
            input: Conduit,
        ) -> Result<Conduit, MsaError> {
            match middlewares.get(idx) {
                Some(mw) => {
                    let mut next = |io: &mut PipelineIo<C>, input: Conduit| {
                        invoke(middlewares, idx + 1, module, io, input)
                    };
                    mw.around(module, io, input, &mut next)
                }
                None => module.run(io, input),
            }
        }
        invoke(&self.middlewares, 0, module, io, input)
    }
}
