//! UPGMA hierarchical clustering
//!
//! Agglomerates a labeled distance matrix into a rooted tree. Each merge
//! joins the closest pair of live clusters, records the merge height as
//! half their distance, and replaces the pair with a leaf-count-weighted
//! average row. Merged nodes are named by joining their children's names
//! with `+`, so the root for labels A, B, C might be named `B+A+C`.

use std::collections::HashSet;

use log::debug;
use thiserror::Error;

use crate::distance::DistanceMatrix;
use crate::tree::TreeNode;

#[derive(Debug, Error, PartialEq)]
pub enum ClusterError {
    #[error("Cannot cluster an empty distance matrix")]
    EmptyMatrix,
    #[error("Duplicate label in distance matrix: {0}")]
    DuplicateLabel(String),
}

pub type ClusterResult<T> = Result<T, ClusterError>;

/// A live cluster: its subtree so far plus the number of leaves under it,
/// which weights the distance update on merge.
struct ClusterEntry {
    node: TreeNode,
    leaf_count: usize,
}

/// Build a rooted ultrametric tree from a distance matrix by UPGMA.
///
/// Pair selection scans the lower triangle in row-major order and keeps
/// the strictly smallest value seen, so the first of several equal minima
/// wins and results are deterministic. A single-label matrix yields that
/// label as a lone leaf.
pub fn upgma(matrix: &DistanceMatrix) -> ClusterResult<TreeNode> {
    let dim = matrix.dim();
    if dim == 0 {
        return Err(ClusterError::EmptyMatrix);
    }
    let mut seen = HashSet::new();
    for label in matrix.labels() {
        if !seen.insert(label.as_str()) {
            return Err(ClusterError::DuplicateLabel(label.clone()));
        }
    }

    let mut clusters: Vec<ClusterEntry> = matrix
        .labels()
        .iter()
        .map(|label| ClusterEntry {
            node: TreeNode::leaf(label.clone()),
            leaf_count: 1,
        })
        .collect();
    let mut work: Vec<Vec<f64>> = (0..dim)
        .map(|i| (0..dim).map(|j| matrix.get(i, j)).collect())
        .collect();

    while clusters.len() > 1 {
        let (x, y, min_val) = closest_pair(&work);
        let height = min_val / 2.0;
        let merged_name = format!("{}+{}", label_of(&clusters[x].node), label_of(&clusters[y].node));
        debug!("merging {} at height {}", merged_name, height);

        // Weighted-average distances from the merged cluster to every
        // survivor, in surviving index order.
        let cx = clusters[x].leaf_count as f64;
        let cy = clusters[y].leaf_count as f64;
        let mut merged_row = Vec::with_capacity(work.len() - 2);
        for k in 0..work.len() {
            if k != x && k != y {
                merged_row.push((work[x][k] * cx + work[y][k] * cy) / (cx + cy));
            }
        }

        // Drop the higher index first so the lower one stays valid.
        let (hi, lo) = if x > y { (x, y) } else { (y, x) };
        let removed_hi = clusters.remove(hi);
        let removed_lo = clusters.remove(lo);
        let (left, right) = if x == hi {
            (removed_hi, removed_lo)
        } else {
            (removed_lo, removed_hi)
        };

        let merged_count = left.leaf_count + right.leaf_count;
        let node = TreeNode::internal(vec![left.node, right.node])
            .with_name(merged_name)
            .with_branch_length(height);

        for idx in [hi, lo] {
            work.remove(idx);
            for row in work.iter_mut() {
                row.remove(idx);
            }
        }
        for (row, &d) in work.iter_mut().zip(merged_row.iter()) {
            row.push(d);
        }
        let mut appended = merged_row;
        appended.push(0.0);
        work.push(appended);

        clusters.push(ClusterEntry {
            node,
            leaf_count: merged_count,
        });
    }

    match clusters.pop() {
        Some(entry) => Ok(entry.node),
        None => Err(ClusterError::EmptyMatrix),
    }
}

/// First strictly smallest entry of the lower triangle in row-major scan
/// order. Falls back to (0, 1) when no finite entry exists.
fn closest_pair(work: &[Vec<f64>]) -> (usize, usize, f64) {
    let mut min_val = f64::INFINITY;
    let (mut x, mut y) = (0, 1);
    for i in 0..work.len() {
        for j in 0..i {
            if work[i][j] < min_val {
                min_val = work[i][j];
                x = i;
                y = j;
            }
        }
    }
    (x, y, min_val)
}

fn label_of(node: &TreeNode) -> &str {
    node.name.as_deref().unwrap_or("")
}
