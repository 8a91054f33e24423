//! Recursive directory operations.
//!
//! The contents API has no directories of its own: a folder exists while a
//! file lives beneath it. Deleting a folder therefore means deleting every
//! file under it, and creating one means writing a `.keep` placeholder.

use futures_util::future::join_all;

use super::{RemoteStore, commit};
use crate::error::{NotehubError, Result};
use crate::transport::{BoxFuture, Transport};
use crate::types::{join_path, normalize_path};

/// Placeholder file name that keeps an otherwise empty folder alive.
pub const KEEP_FILE: &str = ".keep";

/// Files removed so far and the first failure, if any.
type Progress = (usize, Option<NotehubError>);

impl<T: Transport> RemoteStore<T> {
    /// Delete `path` and everything beneath it, returning the number of
    /// files removed.
    ///
    /// Siblings are deleted concurrently; every branch runs to completion
    /// before the first failure is reported as
    /// [`NotehubError::PartialDeletion`]. Nothing is rolled back. A path
    /// that no longer exists counts as already deleted, so the operation is
    /// idempotent.
    pub async fn delete_subtree(&self, path: &str) -> Result<usize> {
        let path = normalize_path(path);
        if path.is_empty() {
            return Err(NotehubError::Unsupported(
                "refusing to delete the repository root".to_string(),
            ));
        }

        let (removed, failure) = self.remove_tree(path.clone()).await;
        match failure {
            None => {
                log::info!("Deleted subtree '{}' ({} file(s))", path, removed);
                Ok(removed)
            }
            Some(source) => Err(NotehubError::PartialDeletion {
                path,
                removed,
                source: Box::new(source),
            }),
        }
    }

    fn remove_tree<'a>(&'a self, path: String) -> BoxFuture<'a, Progress> {
        Box::pin(async move {
            let entries = match self.list_entries(&path, false).await {
                Ok(entries) => entries,
                Err(NotehubError::NotFound(_)) => return (0, None),
                Err(e) => return (0, Some(e)),
            };

            let branches = entries.into_iter().map(|node| async move {
                if node.is_folder() {
                    return self.remove_tree(node.path).await;
                }
                let Some(token) = node.version_token else {
                    return (0, Some(NotehubError::Conflict(node.path)));
                };
                match self.remove(&node.path, &token, &commit::delete(&node.path)).await {
                    Ok(()) => (1, None),
                    // Someone else got there first
                    Err(NotehubError::NotFound(_)) => (0, None),
                    Err(e) => (0, Some(e)),
                }
            });

            join_all(branches)
                .await
                .into_iter()
                .fold((0, None), |(removed, first), (n, failure)| {
                    (removed + n, first.or(failure))
                })
        })
    }

    /// Create a folder by writing an empty `.keep` file into it.
    ///
    /// A folder whose placeholder already exists is left untouched.
    pub async fn create_directory(&self, path: &str) -> Result<()> {
        let path = normalize_path(path);
        let keep = join_path(&path, KEEP_FILE);

        match self.read(&keep).await {
            Ok(_) => return Ok(()),
            Err(NotehubError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }

        match self
            .write(&keep, "", &commit::create_directory(&path), None)
            .await
        {
            Ok(_) | Err(NotehubError::AlreadyExists(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }
}
