//! Phylogenetic tree representation
//!
//! Trees are plain owned node hierarchies. A node with no children is a
//! terminal (leaf). Branch lengths and support values are optional so the
//! same type serves ultrametric cluster trees, neighbor-joining trees, and
//! trees parsed from Newick text.

use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeNode {
    pub name: Option<String>,
    pub branch_length: Option<f64>,
    pub support: Option<f64>,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// A terminal node carrying only a name.
    pub fn leaf(name: String) -> Self {
        Self {
            name: Some(name),
            branch_length: None,
            support: None,
            children: Vec::new(),
        }
    }

    /// An internal node over the given children.
    pub fn internal(children: Vec<TreeNode>) -> Self {
        Self {
            name: None,
            branch_length: None,
            support: None,
            children,
        }
    }

    pub fn with_name(mut self, name: String) -> Self {
        self.name = Some(name);
        self
    }

    pub fn with_branch_length(mut self, length: f64) -> Self {
        self.branch_length = Some(length);
        self
    }

    pub fn with_support(mut self, support: f64) -> Self {
        self.support = Some(support);
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.children.is_empty()
    }

    /// Pre-order iterator over this node and all descendants.
    ///
    /// Uses an explicit stack, so arbitrarily deep trees do not overflow
    /// the call stack. Children are visited left to right.
    pub fn nodes(&self) -> Nodes<'_> {
        Nodes { stack: vec![self] }
    }

    /// Terminal nodes in pre-order (left to right).
    pub fn terminals(&self) -> impl Iterator<Item = &TreeNode> {
        self.nodes().filter(|n| n.is_terminal())
    }

    /// Names of all terminals in pre-order. Unnamed terminals are skipped.
    pub fn terminal_names(&self) -> Vec<String> {
        self.terminals().filter_map(|n| n.name.clone()).collect()
    }

    /// Set of terminal names, for membership queries.
    pub fn terminal_name_set(&self) -> HashSet<String> {
        self.terminals().filter_map(|n| n.name.clone()).collect()
    }

    pub fn count_nodes(&self) -> usize {
        self.nodes().count()
    }

    pub fn count_terminals(&self) -> usize {
        self.terminals().count()
    }

    pub fn count_internal(&self) -> usize {
        self.nodes().filter(|n| !n.is_terminal()).count()
    }

    /// Longest root-to-terminal path, counted in edges.
    pub fn max_depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            if node.is_terminal() {
                deepest = deepest.max(depth);
            }
            for child in &node.children {
                stack.push((child, depth + 1));
            }
        }
        deepest
    }

    /// Edges from the root to the first terminal in pre-order, i.e. down
    /// the chain of first children.
    pub fn depth_to_first_terminal(&self) -> usize {
        let mut depth = 0;
        let mut node = self;
        while let Some(first) = node.children.first() {
            node = first;
            depth += 1;
        }
        depth
    }
}

// The derived drop glue recurses once per level and overflows on deep
// chains, so descendants are drained iteratively instead.
impl Drop for TreeNode {
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.children);
        while let Some(mut node) = stack.pop() {
            stack.append(&mut node.children);
        }
    }
}

pub struct Nodes<'a> {
    stack: Vec<&'a TreeNode>,
}

impl<'a> Iterator for Nodes<'a> {
    type Item = &'a TreeNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        for child in node.children.iter().rev() {
            self.stack.push(child);
        }
        Some(node)
    }
}
