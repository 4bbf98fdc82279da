//! Shared error taxonomy for the MSA distance/tree engine
//!
//! Every crate in the workspace returns `Result<_, MsaError>` (or wraps one in
//! `anyhow` at a CLI boundary). A single enum lets the CLI map errors to exit
//! codes without downcasting, and lets collective call sites elevate a
//! single-rank error into a value every rank can observe before returning.

use thiserror::Error;

/// The error taxonomy from spec section 7.
///
/// Propagation is fail-fast: any error raised inside a pipeline stage aborts
/// the pipeline and is surfaced to the caller unchanged. Errors that
/// originate on a single rank must be elevated to a collective error (see
/// `msa_transport::elevate_error`) before they escape the core, so no rank
/// is left waiting in a collective while its peers already unwound.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MsaError {
    #[error("unknown algorithm '{0}'")]
    UnknownAlgorithm(String),

    #[error("unknown scoring table '{0}'")]
    UnknownTable(String),

    #[error("unknown parser '{0}'")]
    UnknownParser(String),

    #[error("database is empty or has fewer than 2 sequences")]
    EmptyDatabase,

    #[error("degenerate distance matrix: non-finite value at ({0}, {1})")]
    DegenerateDistance(usize, usize),

    #[error("device out of memory while allocating {0} bytes")]
    DeviceOutOfMemory(usize),

    #[error("transport error: {0}")]
    TransportError(String),

    #[error("pipeline invalid: {0}")]
    PipelineInvalid(String),

    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),
}

impl MsaError {
    /// Exit code mapping from spec section 6/7, centralized here so the CLI
    /// never has to duplicate the table.
    pub fn exit_code(&self) -> i32 {
        match self {
            MsaError::UnknownAlgorithm(_)
            | MsaError::UnknownTable(_)
            | MsaError::UnknownParser(_)
            | MsaError::EmptyDatabase
            | MsaError::PipelineInvalid(_) => 1,
            MsaError::TransportError(_) => 2,
            MsaError::DeviceOutOfMemory(_) | MsaError::DegenerateDistance(_, _) => 3,
            MsaError::InternalInvariant(_) => 3,
        }
    }

    /// Whether this error marks the process as non-recoverable (spec section 7:
    /// "Invariant checks are non-recoverable and mark the process").
    pub fn is_fatal_invariant(&self) -> bool {
        matches!(self, MsaError::InternalInvariant(_))
    }
}

pub type Result<T> = std::result::Result<T, MsaError>;
