//! File and folder commands

use std::path::PathBuf;

use tokio::io::AsyncReadExt;

use notehub_core::store::commit;
use notehub_core::transport::HttpTransport;
use notehub_core::tree::{TreeCache, format_tree, format_tree_node};
use notehub_core::types::{NodeKind, normalize_path};
use notehub_core::{NotehubError, Result};

use crate::cli::{Session, report};

pub async fn handle_ls(session: &Session, path: &str) -> bool {
    match session.store.list(path).await {
        Ok(nodes) => {
            if nodes.is_empty() {
                println!("(empty)");
            }
            for node in nodes {
                match node.kind {
                    NodeKind::Folder => println!("{}/", node.name),
                    NodeKind::File => println!("{}", node.name),
                }
            }
            true
        }
        Err(e) => {
            report(&e);
            false
        }
    }
}

pub async fn handle_tree(session: &Session, path: &str, depth: usize) -> bool {
    let path = normalize_path(path);
    let cache = TreeCache::new(session.store.clone());

    if let Err(e) = load_tree(&cache, &path, depth).await {
        report(&e);
        return false;
    }

    if path.is_empty() {
        print!(
            "{}",
            format_tree(&session.store.credentials().full_name(), &cache.view())
        );
    } else if let Some(node) = cache.snapshot().view_of(&path) {
        print!("{}", format_tree_node(&node, ""));
    } else {
        report(&NotehubError::NotFound(path));
        return false;
    }
    true
}

/// Expand every ancestor of `path` so the cache knows it, then expand
/// `depth` levels from there.
async fn load_tree(cache: &TreeCache<HttpTransport>, path: &str, depth: usize) -> Result<()> {
    let mut prefix = String::new();
    cache.expand("").await?;
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        if !prefix.is_empty() {
            prefix.push('/');
        }
        prefix.push_str(segment);
        if prefix.len() < path.len() {
            cache.expand(&prefix).await?;
        }
    }
    cache.expand_to_depth(path, depth).await
}

pub async fn handle_cat(session: &Session, path: &str) -> bool {
    match session.store.read(path).await {
        Ok(file) => {
            print!("{}", file.content);
            if !file.content.is_empty() && !file.content.ends_with('\n') {
                println!();
            }
            true
        }
        Err(NotehubError::Unsupported(message)) => {
            eprintln!("✗ Cannot show '{}': {}", path, message);
            false
        }
        Err(e) => {
            report(&e);
            false
        }
    }
}

pub async fn handle_put(
    session: &Session,
    path: &str,
    file: Option<PathBuf>,
    message: Option<String>,
) -> bool {
    let content = match read_input(file).await {
        Ok(content) => content,
        Err(e) => {
            report(&e);
            return false;
        }
    };

    let preceding = match session.store.read(path).await {
        Ok(file) => Some(file.version_token),
        Err(NotehubError::NotFound(_)) => None,
        Err(e) => {
            report(&e);
            return false;
        }
    };
    let message = message.unwrap_or_else(|| commit::for_write(path, preceding.is_some()));

    match session
        .store
        .write(path, &content, &message, preceding.as_ref())
        .await
    {
        Ok(token) => {
            let verb = if preceding.is_some() { "Updated" } else { "Created" };
            println!("✓ {} {} ({})", verb, path, short(token.as_str()));
            true
        }
        Err(e) => {
            report(&e);
            false
        }
    }
}

async fn read_input(file: Option<PathBuf>) -> Result<String> {
    match file {
        Some(file) => Ok(std::fs::read_to_string(file)?),
        None => {
            let mut content = String::new();
            tokio::io::stdin().read_to_string(&mut content).await?;
            Ok(content)
        }
    }
}

pub async fn handle_rm(session: &Session, path: &str, recursive: bool) -> bool {
    if recursive {
        return match session.store.delete_subtree(path).await {
            Ok(removed) => {
                println!("✓ Removed {} ({} file(s))", path, removed);
                true
            }
            Err(e) => {
                report(&e);
                false
            }
        };
    }

    let result = async {
        let file = session.store.read(path).await?;
        session
            .store
            .remove(&file.path, &file.version_token, &commit::delete(&file.path))
            .await
    }
    .await;

    match result {
        Ok(()) => {
            println!("✓ Removed {}", path);
            true
        }
        Err(NotehubError::Unsupported(message)) => {
            eprintln!("✗ Cannot remove '{}': {}", path, message);
            eprintln!("  Use --recursive to delete a folder");
            false
        }
        Err(e) => {
            report(&e);
            false
        }
    }
}

pub async fn handle_mkdir(session: &Session, path: &str) -> bool {
    match session.store.create_directory(path).await {
        Ok(()) => {
            println!("✓ Created {}/", normalize_path(path));
            true
        }
        Err(e) => {
            report(&e);
            false
        }
    }
}

/// Abbreviated version token for display.
pub fn short(token: &str) -> &str {
    token.get(..7).unwrap_or(token)
}
