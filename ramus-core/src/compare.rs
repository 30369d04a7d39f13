//! Tree comparison
//!
//! Quantitative comparison of two phylogenetic trees sharing some or all
//! of their terminals. The report covers terminal overlap, a clade-set
//! distance, topology summaries, branch-length and support statistics,
//! and a composite similarity score. Comparison never fails: sections
//! whose inputs are missing degrade to an explicit unavailable marker.
//!
//! The clade-set distance counts symmetric differences between the sets
//! of terminal-name groups under internal nodes. It treats the trees as
//! rooted and does not collapse the root split, so it is a simplified
//! relative of Robinson-Foulds rather than the textbook unrooted metric.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::tree::TreeNode;

/// Shared and tree-specific terminal names, sorted for stable output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminalReport {
    pub common: Vec<String>,
    pub unique_tree1: Vec<String>,
    pub unique_tree2: Vec<String>,
    pub total_common: usize,
    pub total_unique_tree1: usize,
    pub total_unique_tree2: usize,
}

/// Symmetric-difference distance over clade terminal sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CladeDistance {
    pub distance: usize,
    pub max_distance: usize,
    pub normalized: f64,
    pub common_clades: usize,
    pub unique_clades_tree1: usize,
    pub unique_clades_tree2: usize,
}

/// Internal node counts and maximum root-to-terminal depths in edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyReport {
    pub internal_nodes_tree1: usize,
    pub internal_nodes_tree2: usize,
    pub max_depth_tree1: usize,
    pub max_depth_tree2: usize,
    pub depth_difference: usize,
}

/// Five-number summary over the values recorded on one tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

/// Absolute differences between the per-tree summaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatDifference {
    pub mean_diff: f64,
    pub median_diff: f64,
}

/// Numeric comparison section that degrades instead of failing when one
/// or both trees carry no values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ValueStats {
    Available {
        tree1: SummaryStats,
        tree2: SummaryStats,
        difference: StatDifference,
    },
    Unavailable {
        reason: String,
    },
}

/// Composite similarity: 60% terminal overlap, 40% clade agreement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityScore {
    pub terminal_similarity: f64,
    pub topological_similarity: f64,
    pub overall_similarity: f64,
    pub similarity_percentage: f64,
}

/// Full comparison report between two trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeComparison {
    pub terminals: TerminalReport,
    pub clade_distance: CladeDistance,
    pub topology: TopologyReport,
    pub branch_lengths: ValueStats,
    pub support_values: ValueStats,
    pub similarity: SimilarityScore,
}

/// Compare two trees. Total: every degraded input shows up as an
/// unavailable section or a zero score rather than an error.
pub fn compare_trees(tree1: &TreeNode, tree2: &TreeNode) -> TreeComparison {
    let names1 = tree1.terminal_name_set();
    let names2 = tree2.terminal_name_set();

    let terminals = terminal_report(&names1, &names2);
    let clade_distance = clade_report(tree1, tree2);
    let topology = topology_report(tree1, tree2);
    let branch_lengths = value_stats(
        collect_values(tree1, |n| n.branch_length),
        collect_values(tree2, |n| n.branch_length),
        "Branch length",
    );
    let support_values = value_stats(
        collect_values(tree1, |n| n.support),
        collect_values(tree2, |n| n.support),
        "Support value",
    );
    let similarity = similarity_score(
        terminals.total_common,
        names1.len(),
        names2.len(),
        clade_distance.normalized,
    );

    TreeComparison {
        terminals,
        clade_distance,
        topology,
        branch_lengths,
        support_values,
        similarity,
    }
}

fn terminal_report(names1: &HashSet<String>, names2: &HashSet<String>) -> TerminalReport {
    let mut common: Vec<String> = names1.intersection(names2).cloned().collect();
    let mut unique_tree1: Vec<String> = names1.difference(names2).cloned().collect();
    let mut unique_tree2: Vec<String> = names2.difference(names1).cloned().collect();
    common.sort();
    unique_tree1.sort();
    unique_tree2.sort();

    TerminalReport {
        total_common: common.len(),
        total_unique_tree1: unique_tree1.len(),
        total_unique_tree2: unique_tree2.len(),
        common,
        unique_tree1,
        unique_tree2,
    }
}

/// Terminal-name groups under internal nodes with at least two named
/// terminals, the root included. Names are sorted within each group so
/// equal groups compare equal across trees.
fn clade_sets(tree: &TreeNode) -> HashSet<Vec<String>> {
    let mut clades = HashSet::new();
    for node in tree.nodes() {
        if node.is_terminal() {
            continue;
        }
        let mut names = node.terminal_names();
        if names.len() < 2 {
            continue;
        }
        names.sort();
        clades.insert(names);
    }
    clades
}

fn clade_report(tree1: &TreeNode, tree2: &TreeNode) -> CladeDistance {
    let clades1 = clade_sets(tree1);
    let clades2 = clade_sets(tree2);

    let common = clades1.intersection(&clades2).count();
    let unique1 = clades1.len() - common;
    let unique2 = clades2.len() - common;
    let distance = unique1 + unique2;
    let max_distance = clades1.len() + clades2.len();
    let normalized = if max_distance == 0 {
        0.0
    } else {
        distance as f64 / max_distance as f64
    };

    CladeDistance {
        distance,
        max_distance,
        normalized,
        common_clades: common,
        unique_clades_tree1: unique1,
        unique_clades_tree2: unique2,
    }
}

fn topology_report(tree1: &TreeNode, tree2: &TreeNode) -> TopologyReport {
    let depth1 = tree1.max_depth();
    let depth2 = tree2.max_depth();
    TopologyReport {
        internal_nodes_tree1: tree1.count_internal(),
        internal_nodes_tree2: tree2.count_internal(),
        max_depth_tree1: depth1,
        max_depth_tree2: depth2,
        depth_difference: depth1.abs_diff(depth2),
    }
}

fn collect_values(tree: &TreeNode, get: impl Fn(&TreeNode) -> Option<f64>) -> Vec<f64> {
    tree.nodes().filter_map(get).collect()
}

fn value_stats(values1: Vec<f64>, values2: Vec<f64>, what: &str) -> ValueStats {
    if values1.is_empty() || values2.is_empty() {
        return ValueStats::Unavailable {
            reason: format!("{} information not available in one or both trees", what),
        };
    }

    let tree1 = summarize(&values1);
    let tree2 = summarize(&values2);
    let difference = StatDifference {
        mean_diff: (tree1.mean - tree2.mean).abs(),
        median_diff: (tree1.median - tree2.median).abs(),
    };
    ValueStats::Available {
        tree1,
        tree2,
        difference,
    }
}

fn summarize(values: &[f64]) -> SummaryStats {
    let count = values.len();
    let mean = values.iter().sum::<f64>() / count as f64;

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let median = if count % 2 == 0 {
        (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
    } else {
        sorted[count / 2]
    };

    let min = sorted[0];
    let max = sorted[count - 1];

    SummaryStats {
        count,
        mean,
        median,
        min,
        max,
    }
}

fn similarity_score(
    common: usize,
    count1: usize,
    count2: usize,
    normalized_clade_distance: f64,
) -> SimilarityScore {
    let terminal_similarity = if common == 0 {
        0.0
    } else {
        common as f64 / count1.max(count2) as f64
    };
    let topological_similarity = 1.0 - normalized_clade_distance;
    let overall = terminal_similarity * 0.6 + topological_similarity * 0.4;

    SimilarityScore {
        terminal_similarity: round3(terminal_similarity),
        topological_similarity: round3(topological_similarity),
        overall_similarity: round3(overall),
        similarity_percentage: round1(overall * 100.0),
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
