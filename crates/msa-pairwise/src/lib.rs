//! Distributed pairwise distance-matrix engine: algorithm registry, CPU and
//! GPU Needleman-Wunsch backends, rank partitioning and all-gather.

pub mod algorithm;
pub mod cpu;
pub mod engine;
pub mod module;

pub use algorithm::AlgorithmName;
pub use engine::EngineState;
pub use module::PairwiseStage;
