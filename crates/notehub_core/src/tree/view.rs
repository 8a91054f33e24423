//! Display types for the tree.

use serde::Serialize;
use ts_rs::TS;

use crate::types::{Node, NodeKind};

/// A node in the tree for display.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TreeNode {
    /// Last path segment
    pub name: String,
    /// Full slash-delimited path
    pub path: String,
    pub kind: NodeKind,
    /// False for folders whose listing has not been fetched
    pub loaded: bool,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub(crate) fn from_node(node: &Node, children: Vec<TreeNode>) -> Self {
        Self {
            name: node.name.clone(),
            path: node.path.clone(),
            kind: node.kind,
            loaded: node.is_file() || node.children.is_loaded(),
            children,
        }
    }
}

/// Helper function to format a tree node for display
pub fn format_tree_node(node: &TreeNode, prefix: &str) -> String {
    let mut result = String::new();

    result.push_str(&node.name);
    if node.kind == NodeKind::Folder {
        result.push('/');
        if !node.loaded {
            result.push_str(" …");
        }
    }
    result.push('\n');

    let child_count = node.children.len();
    for (i, child) in node.children.iter().enumerate() {
        let is_last_child = i == child_count - 1;
        let connector = if is_last_child { "└── " } else { "├── " };
        let child_prefix = if is_last_child { "    " } else { "│   " };

        result.push_str(prefix);
        result.push_str(connector);
        result.push_str(&format_tree_node(
            child,
            &format!("{}{}", prefix, child_prefix),
        ));
    }

    result
}

/// Format a forest under a single label line.
pub fn format_tree(label: &str, nodes: &[TreeNode]) -> String {
    let root = TreeNode {
        name: label.to_string(),
        path: String::new(),
        kind: NodeKind::File,
        loaded: true,
        children: nodes.to_vec(),
    };
    format_tree_node(&root, "")
}
