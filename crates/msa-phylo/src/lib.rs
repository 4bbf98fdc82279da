//! Distributed neighbor-joining guide-tree builder.
//!
//! Consumes the pairwise engine's [`msa_core::DistanceMatrix`] and produces a
//! rooted binary [`msa_core::GuideTree`] via iterative star-contraction,
//! striping row ownership across ranks exactly as spec.md section 4.4
//! describes.

pub mod builder;
mod matrix;
pub mod module;

pub use builder::{run, BuilderState};
