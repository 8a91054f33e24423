//! Tree cache module.
//!
//! [`TreeCache`] mirrors the portion of the remote tree a user has browsed.
//! Folders are listed lazily, one level per [`TreeCache::expand`], and the
//! results are merged into an immutable [`TreeSnapshot`] that is swapped
//! wholesale on every change. Readers always see a complete tree.
//!
//! Staleness is never detected automatically; callers resolve it with
//! [`TreeCache::reload`] (merge, keeping unchanged subtrees) or
//! [`TreeCache::invalidate`] (collapse).

mod snapshot;
mod view;

pub use snapshot::TreeSnapshot;
pub use view::{TreeNode, format_tree, format_tree_node};

use std::sync::{Arc, RwLock};

use futures_util::future::join_all;

use crate::error::{NotehubError, Result};
use crate::store::RemoteStore;
use crate::transport::{BoxFuture, Transport};
use crate::types::{Node, normalize_path};

/// In-memory mirror of the listed portion of the remote tree.
pub struct TreeCache<T: Transport> {
    store: RemoteStore<T>,
    current: RwLock<Arc<TreeSnapshot>>,
}

impl<T: Transport> TreeCache<T> {
    pub fn new(store: RemoteStore<T>) -> Self {
        Self {
            store,
            current: RwLock::new(Arc::new(TreeSnapshot::default())),
        }
    }

    /// The current snapshot. Cheap; never blocks on I/O.
    pub fn snapshot(&self) -> Arc<TreeSnapshot> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    pub fn node(&self, path: &str) -> Option<Node> {
        self.snapshot().node(&normalize_path(path)).cloned()
    }

    /// Loaded children of `path`, or `None` if it has not been expanded.
    pub fn children(&self, path: &str) -> Option<Vec<Node>> {
        self.snapshot()
            .children(&normalize_path(path))
            .map(|nodes| nodes.into_iter().cloned().collect())
    }

    /// Nested view of everything loaded.
    pub fn view(&self) -> Vec<TreeNode> {
        self.snapshot().view()
    }

    /// List the repository root and install it.
    pub async fn load_root(&self) -> Result<()> {
        let listing = self.store.list("").await?;
        self.update(|snapshot| snapshot.install("", listing));
        Ok(())
    }

    /// Materialize the children of the folder at `path`.
    ///
    /// Already-loaded folders are left as they are; expanding a file does
    /// nothing. The folder must already be known to the cache.
    pub async fn expand(&self, path: &str) -> Result<()> {
        let path = normalize_path(path);
        let snapshot = self.snapshot();
        if path.is_empty() {
            if snapshot.is_loaded("") {
                return Ok(());
            }
            return self.load_root().await;
        }

        match snapshot.node(&path) {
            None => return Err(NotehubError::NotFound(path)),
            Some(node) if node.is_file() || node.children.is_loaded() => return Ok(()),
            Some(_) => {}
        }
        drop(snapshot);

        let listing = self.store.list(&path).await?;
        self.update(|snapshot| {
            // Skip if the folder was dropped or loaded while we were listing
            let still_wanted = snapshot
                .node(&path)
                .is_some_and(|n| n.is_folder() && !n.children.is_loaded());
            if still_wanted {
                snapshot.install(&path, listing);
            }
        });
        Ok(())
    }

    /// Expand `path` and every folder beneath it, `depth` levels deep.
    ///
    /// Sibling folders are listed concurrently.
    pub async fn expand_to_depth(&self, path: &str, depth: usize) -> Result<()> {
        self.expand_level(normalize_path(path), depth).await
    }

    fn expand_level<'a>(&'a self, path: String, depth: usize) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            if depth == 0 {
                return Ok(());
            }
            self.expand(&path).await?;

            let folders: Vec<String> = self
                .children(&path)
                .unwrap_or_default()
                .into_iter()
                .filter(Node::is_folder)
                .map(|n| n.path)
                .collect();

            let results = join_all(
                folders
                    .into_iter()
                    .map(|folder| self.expand_level(folder, depth - 1)),
            )
            .await;
            results.into_iter().collect()
        })
    }

    /// Re-list `path` (`""` for the root) and merge the result.
    ///
    /// Child folders whose version token did not change keep their loaded
    /// subtrees. A path that no longer exists is dropped from the cache; a
    /// file only has its version token refreshed. The path must already be
    /// known to the cache.
    pub async fn reload(&self, path: &str) -> Result<()> {
        let path = normalize_path(path);
        if !path.is_empty() && self.snapshot().node(&path).is_none() {
            return Err(NotehubError::NotFound(path));
        }

        match self.store.list(&path).await {
            Ok(listing) => {
                let is_file = !path.is_empty()
                    && matches!(listing.as_slice(), [only] if only.path == path && only.is_file());
                self.update(|snapshot| {
                    if is_file {
                        if let Some(node) = listing.into_iter().next() {
                            snapshot.replace(node);
                        }
                        return;
                    }
                    // A file that became a folder
                    if snapshot.node(&path).is_some_and(Node::is_file) {
                        snapshot.replace(Node::folder(path.clone(), None));
                    }
                    snapshot.merge(&path, listing);
                });
                Ok(())
            }
            Err(NotehubError::NotFound(_)) if !path.is_empty() => {
                log::debug!("'{}' vanished remotely, dropping it from the tree", path);
                self.update(|snapshot| snapshot.remove(&path));
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Collapse `path`: mark it unloaded and forget its descendants.
    pub fn invalidate(&self, path: &str) {
        let path = normalize_path(path);
        self.update(|snapshot| snapshot.invalidate(&path));
    }

    /// Replace the current snapshot with a modified copy.
    ///
    /// The lock only guards the pointer swap and is never held across an
    /// await.
    fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut TreeSnapshot),
    {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        let mut next = TreeSnapshot::clone(&guard);
        f(&mut next);
        *guard = Arc::new(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::store_with;
    use futures_lite::future::block_on;

    #[test]
    fn test_expand_is_lazy() {
        let (store, backend) = store_with(&[("Notes/a.md", "a"), ("Notes/sub/b.md", "b")]);
        let cache = TreeCache::new(store);

        block_on(cache.load_root()).unwrap();
        assert!(cache.children("Notes").is_none());

        block_on(cache.expand("Notes")).unwrap();
        let requests = backend.request_count();
        block_on(cache.expand("Notes")).unwrap();
        assert_eq!(backend.request_count(), requests);

        let names: Vec<String> = cache
            .children("Notes")
            .unwrap()
            .into_iter()
            .map(|n| n.name)
            .collect();
        assert_eq!(names, vec!["a.md", "sub"]);
    }

    #[test]
    fn test_snapshots_are_replaced_not_patched() {
        let (store, _backend) = store_with(&[("Notes/a.md", "a")]);
        let cache = TreeCache::new(store);
        block_on(cache.load_root()).unwrap();

        let before = cache.snapshot();
        block_on(cache.expand("Notes")).unwrap();
        assert!(!before.is_loaded("Notes"));
        assert!(cache.snapshot().is_loaded("Notes"));
    }

    #[test]
    fn test_expand_unknown_folder() {
        let (store, _backend) = store_with(&[("Notes/a.md", "a")]);
        let cache = TreeCache::new(store);
        assert!(matches!(
            block_on(cache.expand("Notes")),
            Err(NotehubError::NotFound(_))
        ));
    }

    #[test]
    fn test_reload_keeps_unchanged_subtrees() {
        let (store, backend) = store_with(&[
            ("Notes/sub/a.md", "a"),
            ("Other/b.md", "b"),
        ]);
        let cache = TreeCache::new(store);
        block_on(cache.expand_to_depth("", 3)).unwrap();
        assert!(cache.snapshot().is_loaded("Notes/sub"));

        backend.put_file("Other/c.md", "c");
        block_on(cache.reload("")).unwrap();

        let snapshot = cache.snapshot();
        assert!(snapshot.is_loaded("Notes/sub"));
        assert!(!snapshot.is_loaded("Other"));
    }

    #[test]
    fn test_reload_drops_vanished_folder() {
        let (store, backend) = store_with(&[("Notes/a.md", "a"), ("Other/b.md", "b")]);
        let cache = TreeCache::new(store);
        block_on(cache.expand_to_depth("", 2)).unwrap();

        backend.remove_file("Notes/a.md");
        block_on(cache.reload("Notes")).unwrap();

        assert!(cache.node("Notes").is_none());
        assert_eq!(cache.snapshot().roots().unwrap(), &["Other"]);
    }

    #[test]
    fn test_reload_file_refreshes_token_only() {
        let (store, backend) = store_with(&[("Notes/a.md", "a"), ("Notes/b.md", "b")]);
        let cache = TreeCache::new(store);
        block_on(cache.expand_to_depth("", 2)).unwrap();

        let token = backend.put_file("Notes/a.md", "a, edited");
        block_on(cache.reload("Notes/a.md")).unwrap();

        let node = cache.node("Notes/a.md").unwrap();
        assert_eq!(node.children, crate::types::Children::None);
        assert_eq!(node.version_token, Some(token));
        assert_eq!(cache.children("Notes").unwrap().len(), 2);
        // Rendering terminates
        assert_eq!(cache.view()[0].children[0].children.len(), 0);
    }

    #[test]
    fn test_reload_unknown_path_leaves_cache_alone() {
        let (store, _backend) = store_with(&[("Notes/sub/a.md", "a")]);
        let cache = TreeCache::new(store);
        block_on(cache.load_root()).unwrap();
        let before = cache.snapshot();

        assert!(matches!(
            block_on(cache.reload("Notes/sub")),
            Err(NotehubError::NotFound(_))
        ));
        assert_eq!(*cache.snapshot(), *before);
        assert!(cache.node("Notes/sub/a.md").is_none());
    }

    #[test]
    fn test_reload_file_that_became_folder() {
        let (store, backend) = store_with(&[("Notes/x.md", "plain")]);
        let cache = TreeCache::new(store);
        block_on(cache.expand_to_depth("", 2)).unwrap();
        assert!(cache.node("Notes/x.md").unwrap().is_file());

        backend.remove_file("Notes/x.md");
        backend.put_file("Notes/x.md/inner.md", "i");
        block_on(cache.reload("Notes/x.md")).unwrap();

        assert!(cache.node("Notes/x.md").unwrap().is_folder());
        assert_eq!(cache.children("Notes/x.md").unwrap()[0].path, "Notes/x.md/inner.md");
    }

    #[test]
    fn test_invalidate_collapses() {
        let (store, _backend) = store_with(&[("Notes/a.md", "a")]);
        let cache = TreeCache::new(store);
        block_on(cache.expand_to_depth("", 2)).unwrap();

        cache.invalidate("Notes");
        assert!(cache.children("Notes").is_none());
        assert!(cache.node("Notes/a.md").is_none());
        assert!(!cache.view()[0].loaded);
    }
}
