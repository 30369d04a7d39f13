//! Neighbor-joining tree construction
//!
//! Saitou-Nei neighbor joining over a labeled distance matrix. Joins pick
//! the minimum of the Q criterion among active rows, branch lengths are
//! clamped to be non-negative, and internal nodes are named `Node{k}`
//! with `k` continuing past the leaf count.

use bitvec::prelude::*;
use thiserror::Error;

use crate::distance::DistanceMatrix;
use crate::tree::TreeNode;

#[derive(Debug, Error, PartialEq)]
pub enum NjError {
    #[error("Cannot build a tree from an empty distance matrix")]
    EmptyMatrix,
    #[error("No joinable pair among the active rows")]
    NoPair,
}

pub type NjResult<T> = Result<T, NjError>;

/// Build an unrooted-style binary tree by neighbor joining.
///
/// The returned root is the final join of the last two active clusters,
/// with the joined distance split evenly between them. A single-label
/// matrix yields a lone leaf.
pub fn neighbor_joining(matrix: &DistanceMatrix) -> NjResult<TreeNode> {
    let n = matrix.dim();
    if n == 0 {
        return Err(NjError::EmptyMatrix);
    }
    if n == 1 {
        return Ok(TreeNode::leaf(matrix.labels()[0].clone()));
    }

    let mut dist = matrix.clone();
    let mut active: BitVec = BitVec::repeat(true, n);
    let mut nodes: Vec<Option<TreeNode>> = matrix
        .labels()
        .iter()
        .map(|label| Some(TreeNode::leaf(label.clone())))
        .collect();
    let mut row_sums: Vec<f64> = (0..n)
        .map(|i| (0..n).map(|j| dist.get(i, j)).sum())
        .collect();
    let mut next_internal = n;

    for _ in 0..(n - 2) {
        let (i, j, d_ij) =
            select_min_q_pair(&dist, &active, &row_sums).ok_or(NjError::NoPair)?;
        let (len_i, len_j) =
            branch_lengths(d_ij, &row_sums, i, j, active.count_ones());

        join_nodes(&mut nodes, i, j, len_i, len_j, format!("Node{}", next_internal));
        next_internal += 1;
        active.set(j, false);
        update_distances(&mut dist, &mut row_sums, &active, i, j);
    }

    final_join(&mut nodes, &dist, &active, format!("Node{}", next_internal))
}

/// Minimum-Q pair among active rows, together with its distance. The first
/// of several equally minimal pairs wins.
fn select_min_q_pair(
    dist: &DistanceMatrix,
    active: &BitVec,
    row_sums: &[f64],
) -> Option<(usize, usize, f64)> {
    let n_active = active.count_ones() as f64;

    (0..dist.dim())
        .filter(|&i| active[i])
        .flat_map(|i| {
            (0..i).filter(move |&j| active[j]).map(move |j| {
                let d_ij = dist.get(i, j);
                let q_ij = (n_active - 2.0) * d_ij - row_sums[i] - row_sums[j];
                (i, j, q_ij, d_ij)
            })
        })
        .min_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, j, _, d)| (i, j, d))
}

/// Branch lengths from the joined pair to their new parent, clamped to be
/// non-negative.
fn branch_lengths(d_ij: f64, row_sums: &[f64], i: usize, j: usize, active_count: usize) -> (f64, f64) {
    let n = active_count as f64;
    let len_i = (0.5 * d_ij + (row_sums[i] - row_sums[j]) / (2.0 * (n - 2.0))).max(0.0);
    let len_j = (d_ij - len_i).max(0.0);
    (len_i, len_j)
}

/// Replace slot `i` with the join of `i` and `j`; slot `j` becomes empty.
fn join_nodes(nodes: &mut [Option<TreeNode>], i: usize, j: usize, len_i: f64, len_j: f64, name: String) {
    let left = nodes[i].take();
    let right = nodes[j].take();
    if let (Some(mut left), Some(mut right)) = (left, right) {
        left.branch_length = Some(len_i);
        right.branch_length = Some(len_j);
        nodes[i] = Some(TreeNode::internal(vec![left, right]).with_name(name));
    }
}

/// Fold distances from the retired pair into the surviving slot `i` and
/// apply the matching row-sum deltas. `j` must already be inactive.
fn update_distances(
    dist: &mut DistanceMatrix,
    row_sums: &mut [f64],
    active: &BitVec,
    i: usize,
    j: usize,
) {
    let d_ij = dist.get(i, j);

    for k in active.iter_ones() {
        if k == i {
            continue;
        }
        let d_ik = dist.get(i, k);
        let d_jk = dist.get(j, k);
        let d_new = 0.5 * (d_ik + d_jk - d_ij);

        row_sums[i] += d_new - d_ik - d_jk;
        row_sums[k] += d_new - d_ik - d_jk;

        dist.set(i, k, d_new);
    }

    row_sums[j] = 0.0;
}

/// Join the last two active clusters, splitting their distance evenly.
fn final_join(
    nodes: &mut [Option<TreeNode>],
    dist: &DistanceMatrix,
    active: &BitVec,
    name: String,
) -> NjResult<TreeNode> {
    let mut remaining = active.iter_ones();
    let (i, j) = match (remaining.next(), remaining.next()) {
        (Some(i), Some(j)) => (i, j),
        _ => return Err(NjError::NoPair),
    };
    let d_ij = dist.get(i, j);

    match (nodes[i].take(), nodes[j].take()) {
        (Some(mut left), Some(mut right)) => {
            left.branch_length = Some(d_ij / 2.0);
            right.branch_length = Some(d_ij / 2.0);
            Ok(TreeNode::internal(vec![left, right]).with_name(name))
        }
        _ => Err(NjError::NoPair),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    fn matrix_of(labels: &[&str], lower: &[(usize, usize, f64)]) -> DistanceMatrix {
        let mut matrix = DistanceMatrix::zeroed(labels.iter().map(|s| s.to_string()).collect());
        for &(i, j, d) in lower {
            matrix.set(i, j, d);
        }
        matrix
    }

    #[test]
    fn test_empty_matrix_is_an_error() {
        let matrix = DistanceMatrix::zeroed(Vec::new());
        assert_eq!(neighbor_joining(&matrix).unwrap_err(), NjError::EmptyMatrix);
    }

    #[test]
    fn test_one_taxon_yields_lone_leaf() {
        let matrix = DistanceMatrix::zeroed(vec!["A".to_string()]);
        let tree = neighbor_joining(&matrix).unwrap();
        assert!(tree.is_terminal());
        assert_eq!(tree.name.as_deref(), Some("A"));
    }

    #[test]
    fn test_two_taxa_split_distance_evenly() {
        let matrix = matrix_of(&["A", "B"], &[(1, 0, 0.6)]);
        let tree = neighbor_joining(&matrix).unwrap();

        assert_eq!(tree.name.as_deref(), Some("Node2"));
        assert_eq!(tree.children.len(), 2);
        assert!((tree.children[0].branch_length.unwrap() - 0.3).abs() < EPS);
        assert!((tree.children[1].branch_length.unwrap() - 0.3).abs() < EPS);
    }

    #[test]
    fn test_three_equidistant_taxa() {
        let matrix = matrix_of(&["A", "B", "C"], &[(1, 0, 0.2), (2, 0, 0.2), (2, 1, 0.2)]);
        let tree = neighbor_joining(&matrix).unwrap();

        let mut leaves = tree.terminal_names();
        leaves.sort();
        assert_eq!(leaves, vec!["A", "B", "C"]);

        for node in tree.nodes() {
            if let Some(length) = node.branch_length {
                assert!(length >= 0.0);
            }
        }
        // First join pairs (B, A) at 0.1 each; the root splits the folded
        // distance 0.1 between the join and C.
        let inner = &tree.children[0];
        assert_eq!(inner.name.as_deref(), Some("Node3"));
        assert!((inner.branch_length.unwrap() - 0.05).abs() < EPS);
        assert!((tree.children[1].branch_length.unwrap() - 0.05).abs() < EPS);
        assert!((inner.children[0].branch_length.unwrap() - 0.1).abs() < EPS);
    }

    #[test]
    fn test_internal_names_continue_past_leaf_count() {
        let matrix = matrix_of(
            &["A", "B", "C", "D"],
            &[
                (1, 0, 0.2),
                (2, 0, 0.5),
                (2, 1, 0.5),
                (3, 0, 0.6),
                (3, 1, 0.6),
                (3, 2, 0.3),
            ],
        );
        let tree = neighbor_joining(&matrix).unwrap();
        let mut internal_names: Vec<String> = tree
            .nodes()
            .filter(|n| !n.is_terminal())
            .filter_map(|n| n.name.clone())
            .collect();
        internal_names.sort();
        assert_eq!(internal_names, vec!["Node4", "Node5", "Node6"]);
    }

    #[test]
    fn test_deterministic_across_runs() {
        let matrix = matrix_of(&["A", "B", "C"], &[(1, 0, 0.1), (2, 0, 0.3), (2, 1, 0.35)]);
        let first = neighbor_joining(&matrix).unwrap();
        let second = neighbor_joining(&matrix).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_additive_matrix_recovers_exact_branch_lengths() {
        // Tree ((A:2,B:3):1,C:4,D:5) in additive distances.
        let matrix = matrix_of(
            &["A", "B", "C", "D"],
            &[
                (1, 0, 5.0),
                (2, 0, 7.0),
                (2, 1, 8.0),
                (3, 0, 8.0),
                (3, 1, 9.0),
                (3, 2, 9.0),
            ],
        );
        let tree = neighbor_joining(&matrix).unwrap();

        let mut leaf_lengths: Vec<(String, f64)> = tree
            .terminals()
            .map(|n| {
                (
                    n.name.clone().unwrap_or_default(),
                    n.branch_length.unwrap_or_default(),
                )
            })
            .collect();
        leaf_lengths.sort_by(|a, b| a.0.cmp(&b.0));

        let expect = [("A", 2.0), ("B", 3.0), ("C", 4.0), ("D", 5.0)];
        for ((name, length), (want_name, want_length)) in leaf_lengths.iter().zip(expect.iter()) {
            assert_eq!(name, want_name);
            assert!(
                (length - want_length).abs() < EPS,
                "{} got {}",
                name,
                length
            );
        }
    }
}
