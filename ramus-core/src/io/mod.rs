//! File format I/O
//!
//! Parsers and writers for the formats the toolkit speaks: FASTA for
//! sequence input, Newick for tree text, and a nested JSON layout for
//! tree rendering clients.

pub mod fasta;
pub mod json;
pub mod newick;

pub use fasta::{FastaError, FastaParser};
pub use json::{TreeJson, TreeMetadata};
pub use newick::{NewickError, NewickResult};

use anyhow::Result;
use std::path::Path;

use crate::tree::TreeNode;

/// Read a tree file, picking the codec from the extension. `.json` files
/// use the nested JSON layout; everything else is treated as Newick.
pub fn read_tree_file<P: AsRef<Path>>(path: P) -> Result<TreeNode> {
    let path_str = path.as_ref().to_string_lossy().to_lowercase();

    if path_str.ends_with(".json") {
        let text = std::fs::read_to_string(&path)?;
        let json: TreeJson = serde_json::from_str(&text)?;
        Ok(json::json_to_tree(&json))
    } else {
        newick::read_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_tree_file_newick() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "((A:1,B:2):0.5,C:3);").unwrap();

        let tree = read_tree_file(file.path()).unwrap();
        assert_eq!(tree.terminal_names(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_read_tree_file_json() {
        let tree = newick::parse("((A,B),C);").unwrap();
        let json = json::tree_to_json(&tree);

        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "{}", serde_json::to_string(&json).unwrap()).unwrap();

        let back = read_tree_file(file.path()).unwrap();
        assert_eq!(back.terminal_names(), vec!["A", "B", "C"]);
    }
}
