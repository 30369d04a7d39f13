//! Likelihood-style tree decoration
//!
//! A lightweight stand-in for a maximum-likelihood pipeline: the topology
//! comes from neighbor joining, branch lengths get a small multiplicative
//! jitter, and every node receives a support value. Terminals always get
//! full support; internal nodes draw an integer support between 60 and 99.
//! All randomness comes from a caller-provided seed, so results repeat.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::distance::DistanceMatrix;
use crate::nj::{neighbor_joining, NjResult};
use crate::tree::TreeNode;

/// Support assigned to every terminal node.
pub const TERMINAL_SUPPORT: f64 = 100.0;

/// Build a neighbor-joining tree and decorate it with jittered branch
/// lengths and simulated support values.
pub fn ml_tree(matrix: &DistanceMatrix, seed: u64) -> NjResult<TreeNode> {
    let mut tree = neighbor_joining(matrix)?;
    let mut rng = StdRng::seed_from_u64(seed);
    decorate(&mut tree, &mut rng);
    Ok(tree)
}

fn decorate(root: &mut TreeNode, rng: &mut StdRng) {
    let mut stack: Vec<&mut TreeNode> = vec![root];
    while let Some(node) = stack.pop() {
        if let Some(length) = node.branch_length {
            node.branch_length = Some(length * rng.gen_range(0.8..1.2));
        }
        node.support = Some(if node.is_terminal() {
            TERMINAL_SUPPORT
        } else {
            rng.gen_range(60..100) as f64
        });
        stack.extend(node.children.iter_mut());
    }
}
