//! Core value types shared by the store, the tree cache and the controllers.
//!
//! - [`VersionToken`] - opaque blob identifier used as a write/delete precondition
//! - [`Node`] - an entry of the remote tree as held by the tree cache
//! - [`RemoteFile`] - the decoded content of a file plus its token
//! - [`SaveAttempt`] - one pending write, consumed by a single store call

use std::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Opaque identifier of the exact stored state of one path.
///
/// For the GitHub backend this is the blob `sha`. Tokens are only ever
/// compared for equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(transparent)]
pub struct VersionToken(String);

impl VersionToken {
    /// Wrap a backend-provided token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token string as sent back to the backend.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form, like an abbreviated commit id
        let short: String = self.0.chars().take(7).collect();
        f.write_str(&short)
    }
}

impl From<&str> for VersionToken {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

/// Kind of a remote tree entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    File,
    Folder,
}

/// Children of a node in the tree cache.
///
/// Children are stored as paths; the nodes themselves live in the cache's
/// path index.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Children {
    /// Folder whose listing has not been fetched yet.
    #[default]
    Unloaded,
    /// Fully materialized, ordered listing of direct children.
    Loaded(Vec<String>),
    /// Files never have children.
    None,
}

impl Children {
    /// Whether the listing has been fetched.
    pub fn is_loaded(&self) -> bool {
        matches!(self, Children::Loaded(_))
    }

    /// Child paths, empty unless loaded.
    pub fn paths(&self) -> &[String] {
        match self {
            Children::Loaded(paths) => paths,
            _ => &[],
        }
    }
}

/// An entry in the remote tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Slash-delimited path, unique within one snapshot
    pub path: String,
    /// Last path segment
    pub name: String,
    pub kind: NodeKind,
    /// Absent for entries that were never stored remotely
    pub version_token: Option<VersionToken>,
    pub children: Children,
}

impl Node {
    /// A file node as returned by a listing.
    pub fn file(path: impl Into<String>, token: Option<VersionToken>) -> Self {
        let path = path.into();
        Self {
            name: name_of(&path).to_string(),
            path,
            kind: NodeKind::File,
            version_token: token,
            children: Children::None,
        }
    }

    /// A folder node whose children have not been listed yet.
    pub fn folder(path: impl Into<String>, token: Option<VersionToken>) -> Self {
        let path = path.into();
        Self {
            name: name_of(&path).to_string(),
            path,
            kind: NodeKind::Folder,
            version_token: token,
            children: Children::Unloaded,
        }
    }

    pub fn is_folder(&self) -> bool {
        self.kind == NodeKind::Folder
    }

    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }
}

/// Last segment of a slash-delimited path.
pub fn name_of(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Parent of a slash-delimited path (`""` for top-level entries).
pub fn parent_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Normalize a user-supplied remote path: trims surrounding slashes and
/// collapses empty segments. The root is `""`.
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Join a folder path and a child name.
pub fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}

/// Decoded content of a remote file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub path: String,
    pub content: String,
    pub version_token: VersionToken,
}

/// One pending write.
///
/// Produced by a controller, consumed by exactly one
/// [`RemoteStore::submit`](crate::store::RemoteStore::submit) call.
#[derive(Debug, Clone)]
pub struct SaveAttempt {
    pub path: String,
    pub content: String,
    /// `None` means "create new"
    pub preceding_token: Option<VersionToken>,
}

/// A full-text search match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SearchHit {
    pub name: String,
    pub path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_helpers() {
        assert_eq!(name_of("Notes/sub/a.md"), "a.md");
        assert_eq!(name_of("a.md"), "a.md");
        assert_eq!(parent_of("Notes/sub/a.md"), "Notes/sub");
        assert_eq!(parent_of("a.md"), "");
        assert_eq!(join_path("", "a.md"), "a.md");
        assert_eq!(join_path("Notes", "a.md"), "Notes/a.md");
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/Notes//a.md/"), "Notes/a.md");
        assert_eq!(normalize_path("./Daily"), "Daily");
        assert_eq!(normalize_path("/"), "");
        assert_eq!(normalize_path(""), "");
    }

    #[test]
    fn test_node_constructors() {
        let file = Node::file("Notes/a.md", Some("abc".into()));
        assert_eq!(file.name, "a.md");
        assert!(file.is_file());
        assert_eq!(file.children, Children::None);

        let folder = Node::folder("Notes", None);
        assert!(folder.is_folder());
        assert!(!folder.children.is_loaded());
        assert!(folder.children.paths().is_empty());
    }

    #[test]
    fn test_version_token_display_is_abbreviated() {
        let token = VersionToken::new("3d21ec53a331a6f037a91c368710b99387d012c1");
        assert_eq!(token.to_string(), "3d21ec5");
        assert_eq!(VersionToken::new("ab").to_string(), "ab");
    }
}
