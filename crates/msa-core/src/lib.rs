//! Core data model for the distributed pairwise distance/guide-tree engine:
//! the protein alphabet, packed sequence encoding, the sequence database,
//! the pair generator, the triangular distance matrix, the guide tree, and
//! the shared error taxonomy every other crate in the workspace returns.

pub mod alphabet;
pub mod database;
pub mod distance_matrix;
pub mod encoding;
pub mod error;
pub mod guide_tree;
pub mod pair;

pub use database::{Database, DatabaseEntry, DatabaseSummary};
pub use distance_matrix::DistanceMatrix;
pub use encoding::EncodedSequence;
pub use error::{MsaError, Result};
pub use guide_tree::{GuideTree, GuideTreeNode, Otu};
pub use pair::Pair;
