//! Ramus Core Library
//!
//! Alignment engines, distance methods, tree builders, IO codecs, and
//! unified sequence types for Ramus.

pub mod align;
pub mod cluster;
pub mod compare;
pub mod distance;
pub mod io;
pub mod ml;
pub mod nj;
pub mod tree;
pub mod types;

// Re-export commonly used types and functions
pub use align::{align_many, AlignError, PairwiseAlignment, ScoringParams};
pub use cluster::upgma;
pub use compare::{compare_trees, TreeComparison};
pub use distance::{identity_matrix, jukes_cantor, DistanceMatrix};
pub use io::read_tree_file;
pub use ml::ml_tree;
pub use nj::neighbor_joining;
pub use tree::TreeNode;
pub use types::{Alignment, SequenceRecord, SequenceSet};

/// Version information for the Ramus core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
