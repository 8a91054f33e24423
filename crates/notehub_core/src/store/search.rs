//! Advisory full-text search through the backend's code search.

use serde::Deserialize;

use super::RemoteStore;
use crate::error::{NotehubError, Result};
use crate::transport::{Method, Transport};
use crate::types::SearchHit;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchHit>,
}

impl<T: Transport> RemoteStore<T> {
    /// Search Markdown files of the repository.
    ///
    /// Ranking is the backend's. Search is advisory: any failure is logged
    /// and yields no results.
    pub async fn search(&self, query: &str) -> Vec<SearchHit> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        match self.try_search(query).await {
            Ok(hits) => hits,
            Err(e) => {
                log::warn!("Search for '{}' failed: {}", query, e);
                Vec::new()
            }
        }
    }

    async fn try_search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let q = format!(
            "{} repo:{} extension:md",
            query,
            self.credentials.full_name()
        );
        let url = format!(
            "{}/search/code?q={}",
            self.credentials.api_base_url(),
            urlencoding::encode(&q)
        );

        let response = self.transport.send(self.request(Method::Get, url)).await?;
        if !response.is_success() {
            return Err(NotehubError::Unavailable(format!(
                "search returned HTTP {}",
                response.status
            )));
        }

        let parsed: SearchResponse = serde_json::from_value(response.body)
            .map_err(|e| NotehubError::Unavailable(format!("Unexpected search response: {}", e)))?;
        Ok(parsed.items)
    }
}
