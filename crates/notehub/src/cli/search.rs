//! Search command handler

use crate::cli::Session;

/// Search the repository. Backend failures degrade to "no results".
pub async fn handle_search(session: &Session, query: &str) -> bool {
    let hits = session.store.search(query).await;

    if hits.is_empty() {
        println!("No matches for '{}'", query.trim());
        return true;
    }

    println!("Found {} match(es):", hits.len());
    for hit in hits {
        println!("  {}", hit.path);
    }
    true
}
