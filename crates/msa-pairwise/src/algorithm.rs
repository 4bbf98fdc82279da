//! The closed set of pairwise algorithms.
//!
//! The spec's algorithm set is fixed and known at compile time, so this is a
//! small closed enum rather than the harness workspace's open string-keyed
//! `OperationRegistry` of trait objects — there is no runtime registration
//! API here for anything to call into, just a name-to-variant lookup that
//! still gives the CLI hot-swappable runtime selection via `--algorithm`.

use msa_core::error::MsaError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlgorithmName {
    /// GPU Needleman-Wunsch, falling back to the CPU backend where no GPU
    /// is compiled in (the `gpu` feature is off, or the device failed to
    /// initialize).
    Needleman,
    /// CPU-only, intra-rank parallel via rayon.
    Sequential,
    /// Picks `Needleman` when a GPU is available, `Sequential` otherwise.
    Hybrid,
}

impl AlgorithmName {
    /// Case-sensitive lookup; `"default"` resolves to `Hybrid`, matching the
    /// external-interface rule that `default` is accepted for algorithm and
    /// table names alike.
    pub fn from_str(name: &str) -> Result<Self, MsaError> {
        match name {
            "needleman" => Ok(Self::Needleman),
            "sequential" => Ok(Self::Sequential),
            "hybrid" | "default" => Ok(Self::Hybrid),
            other => Err(MsaError::UnknownAlgorithm(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Needleman => "needleman",
            Self::Sequential => "sequential",
            Self::Hybrid => "hybrid",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_known_name() {
        assert_eq!(AlgorithmName::from_str("needleman").unwrap(), AlgorithmName::Needleman);
        assert_eq!(AlgorithmName::from_str("sequential").unwrap(), AlgorithmName::Sequential);
        assert_eq!(AlgorithmName::from_str("hybrid").unwrap(), AlgorithmName::Hybrid);
        assert_eq!(AlgorithmName::from_str("default").unwrap(), AlgorithmName::Hybrid);
    }

    #[test]
    fn rejects_unknown_names() {
        assert!(matches!(
            AlgorithmName::from_str("needlemanwunsch"),
            Err(MsaError::UnknownAlgorithm(_))
        ));
    }

    #[test]
    fn as_str_round_trips() {
        for name in [AlgorithmName::Needleman, AlgorithmName::Sequential, AlgorithmName::Hybrid] {
            assert_eq!(AlgorithmName::from_str(name.as_str()).unwrap(), name);
        }
    }
}
