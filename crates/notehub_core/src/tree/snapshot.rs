//! Immutable snapshots of the listed portion of the remote tree.

use std::collections::{HashMap, HashSet};

use crate::types::{Children, Node, parent_of};

use super::view::TreeNode;

/// The listed portion of the remote tree at one point in time.
///
/// Nodes are indexed by path; folders refer to their children by path, so
/// updating any folder is a single index operation wherever it lives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeSnapshot {
    nodes: HashMap<String, Node>,
    /// Ordered root listing; `None` until the root has been listed
    roots: Option<Vec<String>>,
}

impl TreeSnapshot {
    pub fn node(&self, path: &str) -> Option<&Node> {
        self.nodes.get(path)
    }

    /// Ordered root paths, if the root has been listed.
    pub fn roots(&self) -> Option<&[String]> {
        self.roots.as_deref()
    }

    /// Number of nodes held.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether the listing of `path` (`""` for the root) is materialized.
    pub fn is_loaded(&self, path: &str) -> bool {
        if path.is_empty() {
            return self.roots.is_some();
        }
        self.nodes
            .get(path)
            .is_some_and(|node| node.children.is_loaded())
    }

    /// Direct children of `path` in listing order, or `None` if not loaded.
    pub fn children(&self, path: &str) -> Option<Vec<&Node>> {
        let paths = if path.is_empty() {
            self.roots.as_deref()?
        } else {
            match &self.nodes.get(path)?.children {
                Children::Loaded(paths) => paths.as_slice(),
                _ => return None,
            }
        };
        Some(paths.iter().filter_map(|p| self.nodes.get(p)).collect())
    }

    /// Nested view of everything loaded, starting at the root listing.
    pub fn view(&self) -> Vec<TreeNode> {
        self.roots
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter_map(|path| self.view_of(path))
            .collect()
    }

    /// Nested view of the subtree at `path`.
    pub fn view_of(&self, path: &str) -> Option<TreeNode> {
        let node = self.nodes.get(path)?;
        let children = node
            .children
            .paths()
            .iter()
            .filter_map(|child| self.view_of(child))
            .collect();
        Some(TreeNode::from_node(node, children))
    }

    /// Install a fresh listing of `parent`, replacing whatever was there.
    ///
    /// Ignored unless `parent` is the root or a known folder; entries that
    /// do not sit directly under `parent` are skipped.
    pub(crate) fn install(&mut self, parent: &str, mut listing: Vec<Node>) {
        if !self.is_folder(parent) {
            return;
        }
        listing.retain(|node| parent_of(&node.path) == parent);
        self.drop_descendants(parent);
        let paths = listing.iter().map(|n| n.path.clone()).collect();
        for node in listing {
            self.nodes.insert(node.path.clone(), node);
        }
        self.set_children(parent, paths);
    }

    /// Merge a fresh listing of `parent` into the current one.
    ///
    /// A child folder whose version token is unchanged keeps its loaded
    /// subtree. Changed entries lose their descendants, vanished entries
    /// are removed with theirs. Ignored unless `parent` is the root or a
    /// known folder.
    pub(crate) fn merge(&mut self, parent: &str, mut listing: Vec<Node>) {
        if !self.is_folder(parent) {
            return;
        }
        listing.retain(|node| parent_of(&node.path) == parent);
        let fresh: HashSet<&str> = listing.iter().map(|n| n.path.as_str()).collect();
        let stale: Vec<String> = self
            .children(parent)
            .unwrap_or_default()
            .into_iter()
            .map(|n| n.path.clone())
            .filter(|p| !fresh.contains(p.as_str()))
            .collect();
        for path in stale {
            self.remove(&path);
        }

        let mut paths = Vec::with_capacity(listing.len());
        for node in listing {
            paths.push(node.path.clone());
            let unchanged = self.nodes.get(&node.path).is_some_and(|old| {
                old.kind == node.kind && old.version_token == node.version_token
            });
            if unchanged {
                continue;
            }
            self.drop_descendants(&node.path);
            self.nodes.insert(node.path.clone(), node);
        }
        self.set_children(parent, paths);
    }

    /// Replace a known node with a fresh copy, dropping its descendants.
    ///
    /// Used when a path changes kind, or to refresh a file's token.
    pub(crate) fn replace(&mut self, node: Node) {
        if !self.nodes.contains_key(&node.path) {
            return;
        }
        self.drop_descendants(&node.path);
        self.nodes.insert(node.path.clone(), node);
    }

    /// Mark `path` unloaded and forget everything beneath it.
    pub(crate) fn invalidate(&mut self, path: &str) {
        self.drop_descendants(path);
        if path.is_empty() {
            self.roots = None;
        } else if let Some(node) = self.nodes.get_mut(path)
            && node.is_folder()
        {
            node.children = Children::Unloaded;
        }
    }

    /// Remove `path` and its descendants, unlinking it from its parent.
    pub(crate) fn remove(&mut self, path: &str) {
        self.drop_descendants(path);
        self.nodes.remove(path);

        let parent = parent_of(path);
        let siblings = if parent.is_empty() {
            self.roots.as_mut()
        } else {
            match self.nodes.get_mut(parent).map(|n| &mut n.children) {
                Some(Children::Loaded(paths)) => Some(paths),
                _ => None,
            }
        };
        if let Some(siblings) = siblings {
            siblings.retain(|p| p != path);
        }
    }

    /// The root, or a folder known to the snapshot.
    fn is_folder(&self, path: &str) -> bool {
        path.is_empty() || self.nodes.get(path).is_some_and(Node::is_folder)
    }

    fn set_children(&mut self, parent: &str, paths: Vec<String>) {
        if parent.is_empty() {
            self.roots = Some(paths);
        } else if let Some(node) = self.nodes.get_mut(parent)
            && node.is_folder()
        {
            node.children = Children::Loaded(paths);
        }
    }

    fn drop_descendants(&mut self, path: &str) {
        if path.is_empty() {
            self.nodes.clear();
            return;
        }
        let prefix = format!("{}/", path);
        self.nodes.retain(|p, _| !p.starts_with(&prefix));
    }
}
