//! Nested JSON tree layout
//!
//! The rendering-friendly tree shape: every node carries a concrete name
//! (unnamed nodes get a generated `Node_{k}` placeholder), a branch length
//! defaulting to 0, an explicit-null confidence, and a terminal flag.
//! Internal nodes carry a `children` array; the root additionally carries
//! summary metadata.
//!
//! The metadata `max_depth` counts edges from the root to the first
//! terminal in pre-order, not to the deepest one. Renderers use it as a
//! column count for ladder layouts, so the leftmost path is what matters.

use serde::{Deserialize, Serialize};

use crate::tree::TreeNode;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeJson {
    pub name: String,
    pub branch_length: f64,
    pub confidence: Option<f64>,
    pub is_terminal: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TreeJson>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<TreeMetadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeMetadata {
    pub total_terminals: usize,
    pub total_nodes: usize,
    pub max_depth: usize,
}

/// Convert a tree into the nested JSON layout, attaching metadata to the
/// root. Placeholder names are unique within one conversion.
pub fn tree_to_json(tree: &TreeNode) -> TreeJson {
    enum Task<'a> {
        Visit(&'a TreeNode),
        Assemble(&'a TreeNode, usize),
    }

    let mut placeholder = 0usize;
    let mut tasks = vec![Task::Visit(tree)];
    let mut done: Vec<TreeJson> = Vec::new();

    while let Some(task) = tasks.pop() {
        match task {
            Task::Visit(node) => {
                if node.is_terminal() {
                    done.push(convert_node(node, None, &mut placeholder));
                } else {
                    tasks.push(Task::Assemble(node, node.children.len()));
                    for child in node.children.iter().rev() {
                        tasks.push(Task::Visit(child));
                    }
                }
            }
            Task::Assemble(node, count) => {
                let children = done.split_off(done.len() - count);
                done.push(convert_node(node, Some(children), &mut placeholder));
            }
        }
    }

    let mut root = match done.pop() {
        Some(root) => root,
        // A visit always produces exactly one entry; this arm is inert.
        None => convert_node(tree, None, &mut placeholder),
    };
    root.metadata = Some(TreeMetadata {
        total_terminals: tree.count_terminals(),
        total_nodes: tree.count_nodes(),
        max_depth: tree.depth_to_first_terminal(),
    });
    root
}

/// Convert the JSON layout back into a tree. Placeholder names are kept
/// as ordinary node names; metadata is dropped.
pub fn json_to_tree(json: &TreeJson) -> TreeNode {
    enum Task<'a> {
        Visit(&'a TreeJson),
        Assemble(&'a TreeJson, usize),
    }

    let mut tasks = vec![Task::Visit(json)];
    let mut done: Vec<TreeNode> = Vec::new();

    while let Some(task) = tasks.pop() {
        match task {
            Task::Visit(node) => match &node.children {
                Some(children) if !children.is_empty() => {
                    tasks.push(Task::Assemble(node, children.len()));
                    for child in children.iter().rev() {
                        tasks.push(Task::Visit(child));
                    }
                }
                _ => done.push(revert_node(node, Vec::new())),
            },
            Task::Assemble(node, count) => {
                let children = done.split_off(done.len() - count);
                done.push(revert_node(node, children));
            }
        }
    }

    match done.pop() {
        Some(root) => root,
        None => revert_node(json, Vec::new()),
    }
}

fn convert_node(
    node: &TreeNode,
    children: Option<Vec<TreeJson>>,
    placeholder: &mut usize,
) -> TreeJson {
    let name = match &node.name {
        Some(name) => name.clone(),
        None => {
            *placeholder += 1;
            format!("Node_{}", placeholder)
        }
    };
    TreeJson {
        name,
        branch_length: node.branch_length.unwrap_or(0.0),
        confidence: node.support,
        is_terminal: node.is_terminal(),
        children,
        metadata: None,
    }
}

fn revert_node(json: &TreeJson, children: Vec<TreeNode>) -> TreeNode {
    let mut node = TreeNode::internal(children);
    node.name = Some(json.name.clone());
    node.branch_length = Some(json.branch_length);
    node.support = json.confidence;
    node
}
